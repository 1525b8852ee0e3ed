//! Rank-reducer: one surviving speed result per channel name

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumString};

use crate::models::{RankedEntry, SpeedResult};

/// How the survivor of a name group is chosen
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RankStrategy {
    /// Highest `(speed_kbps, resolution_px)`; the first row wins exact ties
    #[default]
    Composite,
    /// Max speed per group, then overwritten by the first row with the
    /// highest resolution. Speed never decides the survivor.
    LegacyDoublePass,
}

impl RankStrategy {
    /// Whether `candidate` should replace the current survivor
    fn prefers(self, candidate: &SpeedResult, current: &SpeedResult) -> bool {
        match self {
            RankStrategy::Composite => {
                candidate.speed_kbps > current.speed_kbps
                    || (candidate.speed_kbps == current.speed_kbps
                        && candidate.resolution_px > current.resolution_px)
            }
            RankStrategy::LegacyDoublePass => candidate.resolution_px > current.resolution_px,
        }
    }
}

/// Keep one entry per distinct name and sort by name (code point order)
pub fn reduce(results: Vec<SpeedResult>, strategy: RankStrategy) -> Vec<RankedEntry> {
    let mut slot_by_name: HashMap<String, usize> = HashMap::new();
    let mut survivors: Vec<RankedEntry> = Vec::new();

    for result in results {
        match slot_by_name.get(&result.name) {
            Some(&slot) => {
                if strategy.prefers(&result, &survivors[slot]) {
                    survivors[slot] = result;
                }
            }
            None => {
                slot_by_name.insert(result.name.clone(), survivors.len());
                survivors.push(result);
            }
        }
    }

    survivors.sort_by(|a, b| a.name.cmp(&b.name));
    survivors
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::{BTreeSet, HashSet};
    use std::str::FromStr;

    fn result(name: &str, url: &str, speed: f64, resolution: u32) -> SpeedResult {
        SpeedResult {
            name: name.to_string(),
            stream_url: url.to_string(),
            speed_kbps: speed,
            resolution_px: resolution,
        }
    }

    #[test]
    fn test_fastest_source_wins() {
        let ranked = reduce(
            vec![
                result("CCTV-1", "http://a/1.m3u8", 50.0, 0),
                result("CCTV-1", "http://b/1.m3u8", 80.0, 0),
            ],
            RankStrategy::Composite,
        );
        assert_eq!(ranked, vec![result("CCTV-1", "http://b/1.m3u8", 80.0, 0)]);
    }

    #[test]
    fn test_composite_breaks_speed_ties_by_resolution_then_order() {
        let ranked = reduce(
            vec![
                result("X", "http://a", 40.0, 720),
                result("X", "http://b", 40.0, 1080),
                result("X", "http://c", 40.0, 1080),
            ],
            RankStrategy::Composite,
        );
        assert_eq!(ranked, vec![result("X", "http://b", 40.0, 1080)]);
    }

    #[test]
    fn test_legacy_double_pass_ignores_speed() {
        let rows = vec![
            result("X", "http://fast", 900.0, 0),
            result("X", "http://sharp", 20.0, 1080),
            result("X", "http://sharp-too", 500.0, 1080),
            result("Y", "http://y1", 15.0, 0),
            result("Y", "http://y2", 99.0, 0),
        ];
        let ranked = reduce(rows, RankStrategy::LegacyDoublePass);
        assert_eq!(
            ranked,
            vec![
                result("X", "http://sharp", 20.0, 1080),
                result("Y", "http://y1", 15.0, 0),
            ]
        );
    }

    #[test]
    fn test_one_row_per_name_sorted_by_code_point() {
        let rows = vec![
            result("湖南卫视", "u1", 30.0, 0),
            result("CCTV-2", "u2", 30.0, 0),
            result("CCTV-10", "u3", 30.0, 0),
            result("CCTV-2", "u4", 31.0, 0),
            result("BTV", "u5", 12.0, 0),
        ];
        let ranked = reduce(rows.clone(), RankStrategy::Composite);

        let names: Vec<&str> = ranked.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["BTV", "CCTV-10", "CCTV-2", "湖南卫视"]);

        let distinct: HashSet<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(ranked.len(), distinct.len());
    }

    #[test]
    fn test_empty_input() {
        assert!(reduce(Vec::new(), RankStrategy::Composite).is_empty());
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(RankStrategy::LegacyDoublePass.to_string(), "legacy_double_pass");
        assert_eq!(
            RankStrategy::from_str("composite").unwrap(),
            RankStrategy::Composite
        );
    }

    fn arbitrary_rows() -> impl Strategy<Value = Vec<SpeedResult>> {
        let names = vec!["CCTV-1", "CCTV-2", "CCTV-10", "BTV", "湖南卫视", "东方卫视"];
        proptest::collection::vec(
            (
                proptest::sample::select(names),
                0u32..500,
                proptest::sample::select(vec![0u32, 576, 720, 1080]),
            ),
            0..40,
        )
        .prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (name, speed, resolution))| {
                    let url = format!("http://{i}/1.m3u8");
                    result(name, &url, f64::from(speed) / 4.0, resolution)
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn reduce_keeps_one_sorted_row_per_distinct_name(rows in arbitrary_rows()) {
            let distinct: Vec<String> = rows
                .iter()
                .map(|r| r.name.clone())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();

            for strategy in [RankStrategy::Composite, RankStrategy::LegacyDoublePass] {
                let ranked = reduce(rows.clone(), strategy);
                let names: Vec<String> = ranked.iter().map(|r| r.name.clone()).collect();
                prop_assert_eq!(&names, &distinct);
                for entry in &ranked {
                    prop_assert!(rows.contains(entry));
                }
            }
        }
    }
}
