//! Cron-driven job loop

use chrono::{DateTime, Local};
use cron::Schedule;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::runner::{JobKind, JobRunner};
use crate::errors::{AppError, AppResult};
use crate::utils::cron_helper::{next_fire_after, validate_cron_expression};

struct ScheduledJob {
    kind: JobKind,
    schedule: Schedule,
    next_run: Option<DateTime<Local>>,
}

/// Evaluates cron schedules and runs due jobs one after another
pub struct JobScheduler {
    runner: JobRunner,
    jobs: Vec<ScheduledJob>,
    poll_interval: Duration,
}

impl JobScheduler {
    /// Build the publish, discovery and harvest jobs from the runner's
    /// schedule configuration
    pub fn new(runner: JobRunner) -> AppResult<Self> {
        Self::starting_at(runner, Local::now())
    }

    fn starting_at(runner: JobRunner, now: DateTime<Local>) -> AppResult<Self> {
        let schedule = runner.config().schedule.clone();
        let mut jobs = Vec::new();
        for (kind, expression) in [
            (JobKind::Publish, &schedule.publish_cron),
            (JobKind::Discovery, &schedule.discovery_cron),
            (JobKind::Harvest, &schedule.harvest_cron),
        ] {
            let parsed = validate_cron_expression(expression).map_err(AppError::configuration)?;
            let next_run = next_fire_after(&parsed, &now);
            jobs.push(ScheduledJob {
                kind,
                schedule: parsed,
                next_run,
            });
        }

        Ok(Self {
            runner,
            jobs,
            poll_interval: schedule.poll_interval.max(Duration::from_millis(100)),
        })
    }

    /// Jobs whose fire time has passed, in configuration order. Each due
    /// job is rescheduled after `now`, so missed runs collapse into one.
    fn due_jobs(&mut self, now: DateTime<Local>) -> Vec<JobKind> {
        let mut due = Vec::new();
        for job in &mut self.jobs {
            if job.next_run.is_some_and(|next| next <= now) {
                due.push(job.kind);
                job.next_run = next_fire_after(&job.schedule, &now);
            }
        }
        due
    }

    /// Run until the token is cancelled. Job errors are logged and the loop
    /// keeps going.
    pub async fn run(mut self, cancellation_token: CancellationToken) -> AppResult<()> {
        info!("Starting job scheduler");
        for job in &self.jobs {
            match job.next_run {
                Some(next) => info!(
                    "{} job next runs at {}",
                    job.kind,
                    next.format("%Y-%m-%d %H:%M:%S")
                ),
                None => info!("{} job has no upcoming runs", job.kind),
            }
        }

        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    for kind in self.due_jobs(Local::now()) {
                        debug!("{} job is due", kind);
                        tokio::select! {
                            result = self.runner.run_job(kind) => {
                                if let Err(e) = result {
                                    error!("{} job failed: {}", kind, e);
                                }
                            }
                            _ = cancellation_token.cancelled() => {
                                info!("Job scheduler cancelled during {} job", kind);
                                return Ok(());
                            }
                        }
                    }
                }
                _ = cancellation_token.cancelled() => {
                    info!("Job scheduler received cancellation signal, shutting down");
                    break;
                }
            }
        }

        info!("Job scheduler stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use chrono::TimeZone;

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, mo, d, h, mi, s).earliest().unwrap()
    }

    fn scheduler_at(now: DateTime<Local>) -> JobScheduler {
        JobScheduler::starting_at(JobRunner::new(Config::default()), now).unwrap()
    }

    #[test]
    fn test_daily_jobs_fire_once_per_day() {
        // 2025-03-11 is a Tuesday
        let mut scheduler = scheduler_at(local(2025, 3, 11, 3, 0, 0));

        assert!(scheduler.due_jobs(local(2025, 3, 11, 3, 59, 59)).is_empty());
        assert_eq!(
            scheduler.due_jobs(local(2025, 3, 11, 4, 0, 0)),
            vec![JobKind::Publish]
        );
        assert!(scheduler.due_jobs(local(2025, 3, 11, 4, 0, 1)).is_empty());
        assert_eq!(
            scheduler.due_jobs(local(2025, 3, 11, 5, 0, 0)),
            vec![JobKind::Discovery]
        );
    }

    #[test]
    fn test_missed_runs_collapse_and_keep_order() {
        let mut scheduler = scheduler_at(local(2025, 3, 11, 3, 0, 0));

        // Next Monday after a long pause: every job is due exactly once
        assert_eq!(
            scheduler.due_jobs(local(2025, 3, 17, 6, 0, 0)),
            vec![JobKind::Publish, JobKind::Discovery, JobKind::Harvest]
        );
        assert!(scheduler.due_jobs(local(2025, 3, 17, 6, 0, 1)).is_empty());
    }

    #[test]
    fn test_invalid_cron_is_a_configuration_error() {
        let mut config = Config::default();
        config.schedule.harvest_cron = "weekly".to_string();
        assert!(matches!(
            JobScheduler::new(JobRunner::new(config)),
            Err(AppError::Configuration { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_stops_loop() {
        let scheduler = JobScheduler::new(JobRunner::new(Config::default())).unwrap();
        let token = CancellationToken::new();
        let handle = tokio::spawn(scheduler.run(token.clone()));

        tokio::time::sleep(Duration::from_secs(3)).await;
        token.cancel();
        assert!(handle.await.unwrap().is_ok());
    }
}
