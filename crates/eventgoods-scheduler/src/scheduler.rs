//! The background scheduler: registry, firing loop, lifecycle.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, FixedOffset, Utc};
use tokio::sync::{Mutex, RwLock, watch};
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::SchedulerError;
use crate::types::{Firing, JobDefinition, JobInfo, ScheduledJob, SchedulerInfo, stamp};

/// Minimum sleep duration between scheduler checks.
const MIN_SLEEP_SECS: u64 = 1;

/// Maximum sleep duration between scheduler checks.
const MAX_SLEEP_SECS: u64 = 60;

/// Type alias for the executor invoked on each firing.
pub type FiringExecutor =
    Arc<dyn Fn(Firing) -> Pin<Box<dyn Future<Output = Result<(), String>> + Send>> + Send + Sync>;

/// Calendar-triggered recurring job scheduler.
///
/// Jobs are keyed by id with replace-existing semantics. Firings run
/// sequentially inside one background task, so two firings of the same id
/// can never overlap; a run that outlasts the next trigger instant causes
/// that firing to be skipped and the fire time to be recomputed from the
/// completion time. The component is constructed and started explicitly by
/// the process entry point.
pub struct Scheduler {
    zone: FixedOffset,
    jobs: Arc<RwLock<Vec<ScheduledJob>>>,
    shutdown: Mutex<watch::Sender<bool>>,
    running: Arc<AtomicBool>,
}

impl Scheduler {
    /// Create a scheduler firing in the given fixed zone. Nothing runs
    /// until `start` is called.
    pub fn new(zone: FixedOffset) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            zone,
            jobs: Arc::new(RwLock::new(Vec::new())),
            shutdown: Mutex::new(shutdown),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Register a monthly job, replacing any prior definition with the
    /// same id.
    pub async fn add_job(&self, def: JobDefinition) -> Result<(), SchedulerError> {
        def.validate()?;
        let next_fire = def.next_fire_after(now_in(self.zone));

        let mut jobs = self.jobs.write().await;
        let entry = ScheduledJob {
            def: def.clone(),
            next_fire,
            last_fire: None,
            last_error: None,
        };
        match jobs.iter_mut().find(|j| j.def.id == def.id) {
            Some(existing) => *existing = entry,
            None => jobs.push(entry),
        }

        info!(
            id = %def.id,
            day = def.day,
            hour = def.hour,
            minute = def.minute,
            next_fire = %stamp(next_fire),
            "monthly job registered"
        );
        Ok(())
    }

    /// Remove a job by id. Returns false if no such job was registered.
    pub async fn remove_job(&self, id: &str) -> bool {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|j| j.def.id != id);
        let removed = jobs.len() < before;
        if removed {
            info!(id, "job removed");
        }
        removed
    }

    /// Activate background firing. Idempotent: calling while already
    /// running is a no-op.
    pub async fn start(&self, executor: FiringExecutor) {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("scheduler already running");
            return;
        }

        let (tx, rx) = watch::channel(false);
        *self.shutdown.lock().await = tx;

        let jobs = self.jobs.clone();
        let running = self.running.clone();
        let zone = self.zone;
        tokio::spawn(async move {
            run_loop(jobs, zone, executor, rx).await;
            running.store(false, Ordering::SeqCst);
        });

        info!("scheduler started");
    }

    /// Signal the background loop to stop after the current firing.
    pub async fn stop(&self) {
        if self.running.load(Ordering::SeqCst) {
            let _ = self.shutdown.lock().await.send(true);
            info!("scheduler stop requested");
        }
    }

    /// Whether the background loop is active.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Read-only snapshot for observability; never mutates state.
    pub async fn get_info(&self) -> SchedulerInfo {
        let is_running = self.is_running();
        let jobs = self.jobs.read().await;
        SchedulerInfo {
            is_running,
            jobs: jobs
                .iter()
                .map(|j| JobInfo {
                    id: j.def.id.clone(),
                    next_fire_time: is_running.then(|| stamp(j.next_fire)),
                    last_fire_time: j.last_fire.map(stamp),
                    last_error: j.last_error.clone(),
                })
                .collect(),
        }
    }
}

fn now_in(zone: FixedOffset) -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&zone)
}

/// The scheduler loop: fire due jobs sequentially, then sleep until the
/// next fire or shutdown.
async fn run_loop(
    jobs: Arc<RwLock<Vec<ScheduledJob>>>,
    zone: FixedOffset,
    executor: FiringExecutor,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    info!("scheduler loop starting");

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let due_ids: Vec<String> = {
            let now = now_in(zone);
            let jobs = jobs.read().await;
            jobs.iter()
                .filter(|j| j.next_fire <= now)
                .map(|j| j.def.id.clone())
                .collect()
        };

        for id in due_ids {
            if *shutdown_rx.borrow() {
                break;
            }
            fire_job(&jobs, zone, &executor, &id).await;
        }

        let duration = sleep_duration(&jobs, zone).await;
        tokio::select! {
            _ = shutdown_rx.changed() => {}
            _ = sleep(duration) => {}
        }
    }

    info!("scheduler loop stopped");
}

/// Execute one firing and reschedule the job from its completion time.
async fn fire_job(
    jobs: &Arc<RwLock<Vec<ScheduledJob>>>,
    zone: FixedOffset,
    executor: &FiringExecutor,
    id: &str,
) {
    let fired_at = now_in(zone);
    info!(id, fired_at = %stamp(fired_at), "firing monthly job");

    let result = executor(Firing {
        job_id: id.to_string(),
        fired_at,
    })
    .await;

    let mut jobs = jobs.write().await;
    // The job may have been removed while the firing ran.
    let Some(job) = jobs.iter_mut().find(|j| j.def.id == id) else {
        return;
    };

    job.last_fire = Some(fired_at);
    match result {
        Ok(()) => {
            job.last_error = None;
            info!(id, "firing completed");
        }
        Err(detail) => {
            error!(id, error = %detail, "firing failed; job stays registered");
            job.last_error = Some(detail);
        }
    }

    // Rescheduling from completion time skips any trigger instant the run
    // itself outlasted.
    job.next_fire = job.def.next_fire_after(now_in(zone));
    debug!(id, next_fire = %stamp(job.next_fire), "job rescheduled");
}

/// How long to sleep before the next due-job check, clamped to
/// [MIN_SLEEP_SECS, MAX_SLEEP_SECS].
async fn sleep_duration(
    jobs: &Arc<RwLock<Vec<ScheduledJob>>>,
    zone: FixedOffset,
) -> std::time::Duration {
    let now = now_in(zone);
    let jobs = jobs.read().await;
    let next_due = jobs.iter().map(|j| j.next_fire).min();

    let secs = match next_due {
        Some(next) => {
            let diff = (next - now).num_seconds();
            (diff.max(MIN_SLEEP_SECS as i64) as u64).min(MAX_SLEEP_SECS)
        }
        None => MAX_SLEEP_SECS,
    };

    std::time::Duration::from_secs(secs)
}
