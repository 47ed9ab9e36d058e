use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Datelike, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use tokio::sync::watch;
use tracing::{error, info};

use crate::clock::Clock;

/// Bounded run-history capacity; oldest entries evict first.
pub const HISTORY_CAPACITY: usize = 50;

/// When a job fires, expressed against a fixed timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    Every(Duration),
    DailyAt { hour: u32, minute: u32 },
    WeeklyAt { weekday: Weekday, hour: u32, minute: u32 },
}

impl Cadence {
    /// Parse a cadence expression: `every:30m` | `every:4h` | `daily:06:00` |
    /// `weekly:sun:23:00`.
    pub fn parse(raw: &str) -> Result<Cadence, String> {
        let parts: Vec<&str> = raw.trim().split(':').collect();
        match parts.as_slice() {
            ["every", spec] => parse_every(spec),
            ["daily", hour, minute] => {
                let (hour, minute) = parse_hhmm(hour, minute)?;
                Ok(Cadence::DailyAt { hour, minute })
            }
            ["weekly", day, hour, minute] => {
                let weekday: Weekday = day
                    .parse()
                    .map_err(|_| format!("unrecognized weekday {:?}", day))?;
                let (hour, minute) = parse_hhmm(hour, minute)?;
                Ok(Cadence::WeeklyAt { weekday, hour, minute })
            }
            _ => Err(format!("unrecognized cadence expression {:?}", raw)),
        }
    }

    /// Time until the next fire, measured from `now_utc` in `tz`.
    pub fn next_delay(&self, now_utc: DateTime<Utc>, tz: Tz) -> Duration {
        match *self {
            Cadence::Every(d) => d,
            Cadence::DailyAt { hour, minute } => next_local(now_utc, tz, None, hour, minute),
            Cadence::WeeklyAt { weekday, hour, minute } => {
                next_local(now_utc, tz, Some(weekday), hour, minute)
            }
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Cadence::Every(d) => {
                let secs = d.as_secs();
                if secs % 3600 == 0 {
                    write!(f, "every:{}h", secs / 3600)
                } else if secs % 60 == 0 {
                    write!(f, "every:{}m", secs / 60)
                } else {
                    write!(f, "every:{}s", secs)
                }
            }
            Cadence::DailyAt { hour, minute } => write!(f, "daily:{:02}:{:02}", hour, minute),
            Cadence::WeeklyAt { weekday, hour, minute } => {
                write!(f, "weekly:{}:{:02}:{:02}", weekday, hour, minute)
            }
        }
    }
}

fn parse_every(spec: &str) -> Result<Cadence, String> {
    let spec = spec.trim();
    let Some(unit) = spec.chars().last() else {
        return Err("empty interval".to_string());
    };
    let amount: u64 = spec[..spec.len() - 1]
        .parse()
        .map_err(|_| format!("unrecognized interval {:?}", spec))?;
    if amount == 0 {
        return Err("interval must be positive".to_string());
    }
    let seconds = match unit {
        's' => amount,
        'm' => amount * 60,
        'h' => amount * 3600,
        _ => return Err(format!("unrecognized interval unit {:?}", unit)),
    };
    Ok(Cadence::Every(Duration::from_secs(seconds)))
}

fn parse_hhmm(hour: &str, minute: &str) -> Result<(u32, u32), String> {
    let hour: u32 = hour.parse().map_err(|_| format!("bad hour {:?}", hour))?;
    let minute: u32 = minute
        .parse()
        .map_err(|_| format!("bad minute {:?}", minute))?;
    if hour > 23 || minute > 59 {
        return Err(format!("{:02}:{:02} is not a valid time of day", hour, minute));
    }
    Ok((hour, minute))
}

fn next_local(
    now_utc: DateTime<Utc>,
    tz: Tz,
    weekday: Option<Weekday>,
    hour: u32,
    minute: u32,
) -> Duration {
    let now_local = now_utc.with_timezone(&tz);
    let mut date = now_local.date_naive();
    // Two weeks is enough to step over any weekday plus a DST gap.
    for _ in 0..14 {
        let day_matches = weekday.map(|w| date.weekday() == w).unwrap_or(true);
        if day_matches {
            if let Some(naive) = date.and_hms_opt(hour, minute, 0) {
                if let Some(target) = tz.from_local_datetime(&naive).earliest() {
                    if target > now_local {
                        return (target - now_local).to_std().unwrap_or(Duration::ZERO);
                    }
                }
            }
        }
        date = match date.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }
    Duration::from_secs(60)
}

/// How one job run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Completed { added: u32, updated: u32, errors: u32 },
    /// The job's gate said there was nothing to do; no external calls made.
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct JobRun {
    pub job: String,
    pub timestamp: DateTime<Utc>,
    pub outcome: JobOutcome,
}

#[derive(Debug, Clone)]
pub struct JobStatus {
    pub name: String,
    pub cadence: String,
    pub enabled: bool,
    pub run_count: u64,
    pub last_run: Option<DateTime<Utc>>,
}

struct JobEntry {
    cadence: Cadence,
    enabled: Arc<AtomicBool>,
    run_count: Arc<AtomicU64>,
    last_run: Arc<Mutex<Option<DateTime<Utc>>>>,
    _handle: tokio::task::JoinHandle<()>,
}

/// Registry of named recurring jobs. Each job runs in its own task, so an
/// error or panic in one run is recorded and the other jobs keep firing; a
/// single job's runs never overlap because its loop awaits each run.
pub struct JobScheduler {
    tz: Tz,
    clock: Arc<dyn Clock>,
    jobs: Mutex<HashMap<String, JobEntry>>,
    history: Arc<Mutex<VecDeque<JobRun>>>,
    shutdown: watch::Sender<bool>,
}

impl JobScheduler {
    pub fn new(tz: Tz, clock: Arc<dyn Clock>) -> Self {
        let (shutdown, _) = watch::channel(false);
        JobScheduler {
            tz,
            clock,
            jobs: Mutex::new(HashMap::new()),
            history: Arc::new(Mutex::new(VecDeque::new())),
            shutdown,
        }
    }

    /// Register a named job. Registering the same name again is a no-op.
    pub fn register<F, Fut>(&self, name: &str, cadence: Cadence, job: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = JobOutcome> + Send + 'static,
    {
        let mut jobs = self.jobs.lock().unwrap();
        if jobs.contains_key(name) {
            info!(job = %name, "Job already registered; skipping");
            return;
        }

        let enabled = Arc::new(AtomicBool::new(true));
        let run_count = Arc::new(AtomicU64::new(0));
        let last_run = Arc::new(Mutex::new(None));

        let task_name = name.to_string();
        let tz = self.tz;
        let clock = self.clock.clone();
        let history = self.history.clone();
        let task_enabled = enabled.clone();
        let task_run_count = run_count.clone();
        let task_last_run = last_run.clone();
        let mut shutdown_rx = self.shutdown.subscribe();

        let handle = tokio::spawn(async move {
            loop {
                let delay = cadence.next_delay(clock.now_utc(), tz);
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = shutdown_rx.changed() => break,
                }
                if !task_enabled.load(Ordering::SeqCst) {
                    continue;
                }

                let started = clock.now_utc();
                // Run in a child task so a panic is contained as a failed run.
                let outcome = match tokio::spawn(job()).await {
                    Ok(outcome) => outcome,
                    Err(e) => JobOutcome::Failed(format!("job run panicked: {}", e)),
                };
                if let JobOutcome::Failed(reason) = &outcome {
                    error!(job = %task_name, error = %reason, "Job run failed");
                }

                task_run_count.fetch_add(1, Ordering::SeqCst);
                *task_last_run.lock().unwrap() = Some(started);
                push_run(
                    &history,
                    JobRun {
                        job: task_name.clone(),
                        timestamp: started,
                        outcome,
                    },
                );
            }
        });

        info!(job = %name, cadence = %cadence, "Scheduled job");
        jobs.insert(
            name.to_string(),
            JobEntry {
                cadence,
                enabled,
                run_count,
                last_run,
                _handle: handle,
            },
        );
    }

    /// Record a run that happened outside a registered job's loop (manual
    /// triggers). Also bumps the job's counters when the name is registered.
    pub fn record_run(&self, job: &str, outcome: JobOutcome) {
        let timestamp = self.clock.now_utc();
        if let Some(entry) = self.jobs.lock().unwrap().get(job) {
            entry.run_count.fetch_add(1, Ordering::SeqCst);
            *entry.last_run.lock().unwrap() = Some(timestamp);
        }
        push_run(
            &self.history,
            JobRun {
                job: job.to_string(),
                timestamp,
                outcome,
            },
        );
    }

    /// Enable or disable a job without unregistering it. Returns false when
    /// the name is unknown.
    pub fn set_enabled(&self, name: &str, enabled: bool) -> bool {
        match self.jobs.lock().unwrap().get(name) {
            Some(entry) => {
                entry.enabled.store(enabled, Ordering::SeqCst);
                info!(job = %name, enabled, "Job toggled");
                true
            }
            None => false,
        }
    }

    pub fn job_status(&self) -> Vec<JobStatus> {
        let mut statuses: Vec<JobStatus> = self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .map(|(name, entry)| JobStatus {
                name: name.clone(),
                cadence: entry.cadence.to_string(),
                enabled: entry.enabled.load(Ordering::SeqCst),
                run_count: entry.run_count.load(Ordering::SeqCst),
                last_run: *entry.last_run.lock().unwrap(),
            })
            .collect();
        statuses.sort_by(|a, b| a.name.cmp(&b.name));
        statuses
    }

    /// Most recent runs first, at most `limit` of them.
    pub fn history(&self, limit: usize) -> Vec<JobRun> {
        self.history
            .lock()
            .unwrap()
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn history_len(&self) -> usize {
        self.history.lock().unwrap().len()
    }

    pub fn job_count(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }

    /// Stop future triggers for every job and clear the registry. An
    /// in-flight run is left to finish; its loop exits on the next tick.
    pub fn shutdown(&self) {
        info!("Shutting down job scheduler");
        let _ = self.shutdown.send(true);
        self.jobs.lock().unwrap().clear();
    }
}

fn push_run(history: &Mutex<VecDeque<JobRun>>, run: JobRun) {
    let mut history = history.lock().unwrap();
    history.push_back(run);
    while history.len() > HISTORY_CAPACITY {
        history.pop_front();
    }
}
