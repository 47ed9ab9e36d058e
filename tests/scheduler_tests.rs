use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc, Weekday};
use chrono_tz::America::Chicago;

use gridiron_sync::clock::SystemClock;
use gridiron_sync::scheduler::{Cadence, JobOutcome, JobScheduler, HISTORY_CAPACITY};

fn scheduler() -> JobScheduler {
    JobScheduler::new(Chicago, Arc::new(SystemClock))
}

#[test]
fn fixed_intervals_pass_through_next_delay() {
    let cadence = Cadence::Every(Duration::from_secs(1800));
    let now = Utc.with_ymd_and_hms(2025, 10, 11, 12, 0, 0).unwrap();
    assert_eq!(cadence.next_delay(now, Chicago), Duration::from_secs(1800));
}

#[test]
fn daily_cadence_fires_at_the_local_wall_time() {
    let cadence = Cadence::DailyAt { hour: 6, minute: 0 };

    // 12:00Z on Oct 11 is 07:00 in Chicago, one hour past today's fire:
    // the next one is tomorrow, 23 hours out.
    let after = Utc.with_ymd_and_hms(2025, 10, 11, 12, 0, 0).unwrap();
    assert_eq!(
        cadence.next_delay(after, Chicago),
        Duration::from_secs(23 * 3600)
    );

    // 10:00Z is 05:00 local, one hour before today's fire.
    let before = Utc.with_ymd_and_hms(2025, 10, 11, 10, 0, 0).unwrap();
    assert_eq!(cadence.next_delay(before, Chicago), Duration::from_secs(3600));
}

#[test]
fn weekly_cadence_steps_to_the_right_weekday() {
    let cadence = Cadence::WeeklyAt {
        weekday: Weekday::Sun,
        hour: 23,
        minute: 0,
    };
    // Saturday 07:00 local; Sunday 23:00 is 40 hours away.
    let now = Utc.with_ymd_and_hms(2025, 10, 11, 12, 0, 0).unwrap();
    assert_eq!(
        cadence.next_delay(now, Chicago),
        Duration::from_secs(40 * 3600)
    );
}

#[test]
fn history_keeps_only_the_most_recent_runs() {
    let scheduler = scheduler();
    for i in 0..55 {
        scheduler.record_run(
            &format!("job-{}", i),
            JobOutcome::Completed {
                added: 0,
                updated: 0,
                errors: 0,
            },
        );
    }

    assert_eq!(scheduler.history_len(), HISTORY_CAPACITY);

    let history = scheduler.history(HISTORY_CAPACITY);
    // Newest first; the five oldest runs have been evicted.
    assert_eq!(history[0].job, "job-54");
    assert_eq!(history.last().map(|r| r.job.as_str()), Some("job-5"));
    assert!(history.iter().all(|run| run.job != "job-4"));
}

#[test]
fn history_limit_truncates_from_the_newest_end() {
    let scheduler = scheduler();
    for i in 0..10 {
        scheduler.record_run(&format!("job-{}", i), JobOutcome::Skipped);
    }
    let recent = scheduler.history(3);
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0].job, "job-9");
    assert_eq!(recent[2].job, "job-7");
}

#[tokio::test]
async fn registering_a_duplicate_name_is_a_noop() {
    let scheduler = scheduler();
    scheduler.register("nightly", Cadence::Every(Duration::from_secs(3600)), || async {
        JobOutcome::Skipped
    });
    scheduler.register("nightly", Cadence::Every(Duration::from_secs(60)), || async {
        JobOutcome::Skipped
    });

    assert_eq!(scheduler.job_count(), 1);
    let status = scheduler.job_status();
    assert_eq!(status[0].name, "nightly");
    // The original cadence survives.
    assert_eq!(status[0].cadence, "every:1h");
    assert!(status[0].enabled);
}

#[tokio::test]
async fn registered_jobs_fire_and_land_in_history() {
    let scheduler = scheduler();
    let runs = Arc::new(AtomicU32::new(0));
    let counter = runs.clone();
    scheduler.register("ticker", Cadence::Every(Duration::from_millis(20)), move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            JobOutcome::Completed {
                added: 1,
                updated: 0,
                errors: 0,
            }
        }
    });

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(runs.load(Ordering::SeqCst) >= 1);
    assert!(scheduler.history_len() >= 1);
    let history = scheduler.history(HISTORY_CAPACITY);
    assert!(history.iter().all(|run| run.job == "ticker"));
    let status = scheduler.job_status();
    assert!(status[0].run_count >= 1);
    assert!(status[0].last_run.is_some());
}

#[tokio::test]
async fn a_failing_job_does_not_stop_the_others() {
    let scheduler = scheduler();
    scheduler.register("flaky", Cadence::Every(Duration::from_millis(20)), || async {
        JobOutcome::Failed("upstream unavailable".to_string())
    });
    scheduler.register("steady", Cadence::Every(Duration::from_millis(20)), || async {
        JobOutcome::Completed {
            added: 0,
            updated: 1,
            errors: 0,
        }
    });

    tokio::time::sleep(Duration::from_millis(200)).await;

    let history = scheduler.history(HISTORY_CAPACITY);
    assert!(history.iter().any(|run| run.job == "flaky"));
    assert!(history
        .iter()
        .any(|run| run.job == "steady" && matches!(run.outcome, JobOutcome::Completed { .. })));
    assert_eq!(scheduler.job_count(), 2);
}

#[tokio::test]
async fn a_panicking_run_is_recorded_as_failed() {
    let scheduler = scheduler();
    scheduler.register("explosive", Cadence::Every(Duration::from_millis(20)), || async {
        panic!("boom")
    });

    tokio::time::sleep(Duration::from_millis(200)).await;

    let history = scheduler.history(HISTORY_CAPACITY);
    assert!(history.iter().any(|run| {
        matches!(&run.outcome, JobOutcome::Failed(reason) if reason.contains("panicked"))
    }));
    // The job's loop survives its own panic.
    assert_eq!(scheduler.job_count(), 1);
}

#[tokio::test]
async fn disabled_jobs_skip_their_triggers() {
    let scheduler = scheduler();
    let runs = Arc::new(AtomicU32::new(0));
    let counter = runs.clone();
    scheduler.register("paused", Cadence::Every(Duration::from_millis(20)), move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            JobOutcome::Skipped
        }
    });

    assert!(scheduler.set_enabled("paused", false));
    assert!(!scheduler.set_enabled("unknown", false));

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 0);

    let status = scheduler.job_status();
    assert!(!status[0].enabled);
}

#[tokio::test]
async fn shutdown_clears_the_registry_and_stops_triggers() {
    let scheduler = scheduler();
    scheduler.register("quiet", Cadence::Every(Duration::from_secs(3600)), || async {
        JobOutcome::Skipped
    });

    scheduler.shutdown();
    assert_eq!(scheduler.job_count(), 0);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(scheduler.history_len(), 0);
}
