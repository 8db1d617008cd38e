//! # Stage Executor System
//!
//! Runs stage jobs off the driver thread: generation stages mutate chunk
//! volumes and mesh builds produce geometry, neither of which may stall the
//! tick loop.
//!
//! ## Architecture Overview
//!
//! The executor consists of:
//! - `StageExecutor`: Coordinator owning the worker pool and the overflow
//!   queue
//! - `WorkerChannel`: One worker thread plus its job and outcome channels
//! - `StageJob` / `StageOutcome`: The unit of work and its completion report
//!   (see the `job` module)
//!
//! ## Dispatch Policies
//!
//! Two dispatch policies coexist:
//! - **Pooled** (`submit`): jobs go to a fixed set of worker threads,
//!   round-robin, at most `MAX_JOBS_IN_FLIGHT` per worker; excess jobs wait
//!   in a FIFO queue that `process_queued_jobs` drains as workers free up.
//! - **Detached** (`submit_detached`): the job gets a dedicated thread that
//!   starts immediately, regardless of pool pressure.
//!
//! Both policies deliver their outcomes to the same place: the driver calls
//! `drain_outcomes` once per tick and applies what arrived. Neither policy
//! preempts a running job; cancellation is cooperative through the job's
//! token, checked before the work starts.
//!
//! ## Job Lifecycle
//! 1. Jobs are submitted via `submit()` (pooled) or `submit_detached()`
//! 2. A pooled job lands on an available worker channel, or the queue
//! 3. Workers run jobs and send outcomes back on their channel
//! 4. Outcomes are collected on the driver thread in `drain_outcomes()`
//! 5. `process_queued_jobs()` promotes queued jobs onto freed workers
//! 6. The cycle continues until all chunks settle

pub mod job;

use log::info;
use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};

use job::{StageJob, StageOutcome};

/// A communication channel between the driver thread and one worker thread.
///
/// # Fields
/// - `job_sender`: Sends jobs from the driver to the worker
/// - `outcome_receiver`: Receives finished outcomes from the worker
/// - `jobs_in_flight`: Number of jobs currently on this worker
/// - `_worker`: Handle to the worker thread (kept alive by this struct)
struct WorkerChannel {
    job_sender: Sender<StageJob>,
    outcome_receiver: Receiver<StageOutcome>,
    jobs_in_flight: usize,
    _worker: JoinHandle<()>,
}

/// Maximum number of jobs that can be in flight per worker channel.
///
/// This is set to 1 so each worker runs exactly one stage at a time and the
/// queue keeps chunk work in submission order.
pub const MAX_JOBS_IN_FLIGHT: usize = 1;

/// Manages a pool of worker threads plus detached dispatch for stage jobs.
///
/// The executor is responsible for:
/// - Creating and keeping alive the worker threads
/// - Distributing pooled jobs across available workers
/// - Queueing pooled jobs when every worker is busy
/// - Spawning dedicated threads for detached jobs
/// - Collecting outcomes from both policies for the driver
pub struct StageExecutor {
    channels: Vec<WorkerChannel>,
    queued_jobs: VecDeque<StageJob>,
    current_channel: usize,
    detached_sender: Sender<StageOutcome>,
    detached_receiver: Receiver<StageOutcome>,
    detached_in_flight: usize,
}

impl StageExecutor {
    /// Creates an executor with the specified number of worker threads.
    ///
    /// # Arguments
    /// * `num_workers` - Worker threads to create. Zero is allowed when only
    ///   detached dispatch will be used; pooled submissions then queue until
    ///   the process exits, so drivers should clamp this when pooling.
    pub fn new(num_workers: usize) -> Self {
        info!(
            "Starting {} stage workers (available parallelism: {:?})",
            num_workers,
            thread::available_parallelism()
        );

        let mut channels = Vec::with_capacity(num_workers);
        for _ in 0..num_workers {
            let (job_tx, job_rx) = channel::<StageJob>();
            let (outcome_tx, outcome_rx) = channel::<StageOutcome>();

            let worker = thread::spawn(move || {
                while let Ok(job) = job_rx.recv() {
                    let outcome = job.run();
                    let _ = outcome_tx.send(outcome);
                }
            });

            channels.push(WorkerChannel {
                job_sender: job_tx,
                outcome_receiver: outcome_rx,
                jobs_in_flight: 0,
                _worker: worker,
            });
        }

        let (detached_tx, detached_rx) = channel::<StageOutcome>();

        StageExecutor {
            channels,
            queued_jobs: VecDeque::new(),
            current_channel: 0,
            detached_sender: detached_tx,
            detached_receiver: detached_rx,
            detached_in_flight: 0,
        }
    }

    /// Attempts to send a job to a specific worker channel.
    ///
    /// # Returns
    /// - `Ok(())` if the job was handed to the worker
    /// - `Err(job)` if the send failed (worker disconnected), returning the
    ///   job for requeueing
    fn try_send_job(&mut self, job: StageJob, channel_idx: usize) -> Result<(), StageJob> {
        match self.channels[channel_idx].job_sender.send(job) {
            Ok(_) => {
                self.channels[channel_idx].jobs_in_flight += 1;
                Ok(())
            }
            Err(send_error) => Err(send_error.0),
        }
    }

    /// Finds a worker channel that can accept a new job.
    ///
    /// Round-robin starting from the channel after the last dispatch, skipping
    /// channels at their in-flight limit.
    fn find_available_channel(&self) -> Option<usize> {
        if self.channels.is_empty() {
            return None;
        }

        if self
            .channels
            .iter()
            .all(|channel| channel.jobs_in_flight >= MAX_JOBS_IN_FLIGHT)
        {
            return None;
        }

        let start_channel = self.current_channel;
        let mut current = start_channel;

        loop {
            if self.channels[current].jobs_in_flight < MAX_JOBS_IN_FLIGHT {
                return Some(current);
            }
            current = (current + 1) % self.channels.len();
            if current == start_channel {
                // Unreachable given the all-full check above.
                info!("All worker channels are full, but missed the first check");
                return None;
            }
        }
    }

    /// Submits a job to the worker pool.
    ///
    /// The job starts as soon as a worker is free; if every worker is busy it
    /// waits in the overflow queue until `process_queued_jobs` promotes it.
    ///
    /// # Returns
    /// - `true` if the job was immediately handed to a worker
    /// - `false` if the job was queued
    pub fn submit(&mut self, job: StageJob) -> bool {
        if self.channels.is_empty() {
            self.queued_jobs.push_back(job);
            return false;
        }

        match self.find_available_channel() {
            Some(channel_idx) => match self.try_send_job(job, channel_idx) {
                Ok(_) => {
                    self.current_channel = (channel_idx + 1) % self.channels.len();
                    true
                }
                Err(job) => {
                    self.queued_jobs.push_back(job);
                    false
                }
            },
            None => {
                self.queued_jobs.push_back(job);
                false
            }
        }
    }

    /// Runs a job on its own dedicated thread, bypassing the pool.
    ///
    /// The thread starts immediately and reports through the same outcome
    /// drain as pooled jobs.
    pub fn submit_detached(&mut self, job: StageJob) {
        let sender = self.detached_sender.clone();
        self.detached_in_flight += 1;
        thread::spawn(move || {
            let outcome = job.run();
            let _ = sender.send(outcome);
        });
    }

    /// Promotes queued jobs onto workers that have freed up.
    ///
    /// Call once per tick. Processes the queue in FIFO order and stops at the
    /// first job that cannot be placed.
    pub fn process_queued_jobs(&mut self) {
        if self.queued_jobs.is_empty() {
            return;
        }

        match self.find_available_channel() {
            None => {} // Every worker is busy; keep the jobs queued.
            Some(mut channel_idx) => {
                while let Some(job) = self.queued_jobs.pop_front() {
                    match self.try_send_job(job, channel_idx) {
                        Ok(_) => match self.find_available_channel() {
                            Some(next_idx) => channel_idx = next_idx,
                            None => break,
                        },
                        Err(job) => {
                            // Worker disconnected; put the job back and stop.
                            self.queued_jobs.push_front(job);
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Collects every outcome that has arrived since the last drain.
    ///
    /// Must be called from the driver thread. Outcomes from pooled and
    /// detached jobs are returned together, in no particular order across
    /// workers.
    pub fn drain_outcomes(&mut self) -> Vec<StageOutcome> {
        let mut outcomes = Vec::new();

        for channel in &mut self.channels {
            while let Ok(outcome) = channel.outcome_receiver.try_recv() {
                channel.jobs_in_flight -= 1;
                outcomes.push(outcome);
            }
        }

        while let Ok(outcome) = self.detached_receiver.try_recv() {
            self.detached_in_flight -= 1;
            outcomes.push(outcome);
        }

        outcomes
    }

    /// Whether no job is running, queued, or awaiting drain.
    pub fn is_idle(&self) -> bool {
        self.queued_jobs.is_empty()
            && self.detached_in_flight == 0
            && self
                .channels
                .iter()
                .all(|channel| channel.jobs_in_flight == 0)
    }
}
