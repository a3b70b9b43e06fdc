//! Multi-threaded AstroBWT miner.
//!
//! One [`JobBoard`] holds the current job; it is replaced whole, never
//! edited. Each worker thread owns one [`Scratch`] for its lifetime, walks
//! its own slice of the 32-bit nonce space and reports every digest that
//! meets the job's share target over a single `mpsc` channel.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, RwLock};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::core::types::*;
use crate::pow::{Algorithm, Scratch};

/// How long an idle worker sleeps before looking for a job again
const IDLE_POLL: Duration = Duration::from_millis(20);

/// Nonce width in bytes; nonces are written little-endian
pub const NONCE_SIZE: usize = 4;

/// Mining configuration
#[derive(Debug, Clone)]
pub struct MinerConfig {
    /// Number of mining threads
    pub threads: usize,
    pub algorithm: Algorithm,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            algorithm: Algorithm::AstroBwtV3,
        }
    }
}

#[derive(Debug)]
pub enum MinerError {
    InvalidJob(String),
    InvalidInput(String),
    /// A worker thread died; carries the worker index
    WorkerPanicked(usize),
    /// Mining ended before any share was found
    NoShare,
    /// Known-answer checks failed; carries the failure count
    SelfTestFailed(usize),
}

impl std::fmt::Display for MinerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MinerError::InvalidJob(e) => write!(f, "invalid job: {}", e),
            MinerError::InvalidInput(e) => write!(f, "invalid input: {}", e),
            MinerError::WorkerPanicked(i) => write!(f, "mining worker {} panicked", i),
            MinerError::NoShare => write!(f, "mining stopped before a share was found"),
            MinerError::SelfTestFailed(n) => write!(f, "{} self-test checks failed", n),
        }
    }
}

impl std::error::Error for MinerError {}

/// A hashing blob with a nonce slot and a share target
#[derive(Debug, Clone)]
pub struct Job {
    pub id: u64,
    blob: Vec<u8>,
    nonce_offset: usize,
    target_bits: u32,
}

impl Job {
    pub fn new(id: u64, blob: Vec<u8>, nonce_offset: usize, target_bits: u32) -> Result<Self, MinerError> {
        if nonce_offset.checked_add(NONCE_SIZE).map_or(true, |end| end > blob.len()) {
            return Err(MinerError::InvalidJob(format!(
                "nonce at offset {} does not fit a {}-byte blob",
                nonce_offset,
                blob.len()
            )));
        }
        if target_bits > 256 {
            return Err(MinerError::InvalidJob(format!(
                "target of {} bits exceeds the 256-bit digest",
                target_bits
            )));
        }
        Ok(Self {
            id,
            blob,
            nonce_offset,
            target_bits,
        })
    }

    pub fn blob(&self) -> &[u8] {
        &self.blob
    }

    pub fn target_bits(&self) -> u32 {
        self.target_bits
    }

    /// Store `nonce` into the nonce slot of `input`, a copy of the blob.
    pub fn write_nonce(&self, input: &mut [u8], nonce: u32) {
        input[self.nonce_offset..self.nonce_offset + NONCE_SIZE].copy_from_slice(&nonce.to_le_bytes());
    }

    /// The blob with `nonce` filled in
    pub fn input_for(&self, nonce: u32) -> Vec<u8> {
        let mut input = self.blob.clone();
        self.write_nonce(&mut input, nonce);
        input
    }

    pub fn meets_target(&self, hash: &Hash256) -> bool {
        leading_zero_bits(hash) >= self.target_bits
    }
}

/// A digest that met its job's share target
#[derive(Debug, Clone)]
pub struct Share {
    pub job_id: u64,
    pub nonce: u32,
    pub hash: Hash256,
    pub worker: usize,
}

/// The current job, shared by all workers.
pub struct JobBoard {
    current: RwLock<Option<Arc<Job>>>,
    generation: AtomicU64,
}

impl JobBoard {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Replace the current job. Returns the new generation.
    pub fn publish(&self, job: Job) -> u64 {
        self.set(Some(Arc::new(job)))
    }

    /// Withdraw the current job; workers go idle.
    pub fn clear(&self) -> u64 {
        self.set(None)
    }

    fn set(&self, job: Option<Arc<Job>>) -> u64 {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        *current = job;
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> Option<Arc<Job>> {
        self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Bumped on every publish or clear
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

impl Default for JobBoard {
    fn default() -> Self {
        Self::new()
    }
}

/// First nonce of worker `index` out of `threads`
pub fn nonce_start(index: usize, threads: usize) -> u32 {
    let range = u32::MAX / threads.max(1) as u32;
    (index as u32).wrapping_mul(range)
}

/// Running worker pool
pub struct Miner {
    stop: Arc<AtomicBool>,
    hashes: Arc<AtomicU64>,
    handles: Vec<JoinHandle<()>>,
    started: Instant,
}

impl Miner {
    /// Spawn `config.threads` workers mining whatever `board` holds.
    ///
    /// Workers run until `stop` is set or the share receiver is dropped.
    pub fn start(config: &MinerConfig, board: Arc<JobBoard>, shares: Sender<Share>, stop: Arc<AtomicBool>) -> Self {
        let threads = config.threads.max(1);
        tracing::info!("⛏️  Starting {} mining threads ({})", threads, config.algorithm);

        let hashes = Arc::new(AtomicU64::new(0));
        let handles = (0..threads)
            .map(|index| {
                let worker = Worker {
                    index,
                    first_nonce: nonce_start(index, threads),
                    nonce_range: u32::MAX / threads as u32,
                    algorithm: config.algorithm,
                    board: board.clone(),
                    shares: shares.clone(),
                    stop: stop.clone(),
                    hashes: hashes.clone(),
                };
                std::thread::spawn(move || worker.run())
            })
            .collect();

        Self {
            stop,
            hashes,
            handles,
            started: Instant::now(),
        }
    }

    /// Hashes computed so far by all workers
    pub fn hashes(&self) -> u64 {
        self.hashes.load(Ordering::Relaxed)
    }

    pub fn hashrate(&self) -> f64 {
        let elapsed = self.started.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.hashes() as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Stop all workers and wait for them. Returns the total hash count.
    pub fn stop(self) -> Result<u64, MinerError> {
        self.stop.store(true, Ordering::SeqCst);
        let mut panicked = None;
        for (index, handle) in self.handles.into_iter().enumerate() {
            if handle.join().is_err() && panicked.is_none() {
                panicked = Some(index);
            }
        }

        let hashes = self.hashes.load(Ordering::Relaxed);
        let elapsed = self.started.elapsed().as_secs_f64();
        tracing::info!(
            "⛏️  Mining stopped: {} hashes in {:.1}s ({:.1} H/s)",
            hashes,
            elapsed,
            if elapsed > 0.0 { hashes as f64 / elapsed } else { 0.0 },
        );

        match panicked {
            Some(index) => Err(MinerError::WorkerPanicked(index)),
            None => Ok(hashes),
        }
    }
}

struct Worker {
    index: usize,
    first_nonce: u32,
    nonce_range: u32,
    algorithm: Algorithm,
    board: Arc<JobBoard>,
    shares: Sender<Share>,
    stop: Arc<AtomicBool>,
    hashes: Arc<AtomicU64>,
}

impl Worker {
    fn run(self) {
        let mut scratch = Scratch::new();
        let mut generation = None;
        let mut job: Option<Arc<Job>> = None;
        let mut input = Vec::new();
        let mut nonce = self.first_nonce;
        let mut tried: u32 = 0;

        loop {
            if self.stop.load(Ordering::Relaxed) {
                return;
            }

            let current_generation = self.board.generation();
            if generation != Some(current_generation) {
                generation = Some(current_generation);
                job = self.board.current();
                nonce = self.first_nonce;
                tried = 0;
                if let Some(job) = &job {
                    input.clear();
                    input.extend_from_slice(job.blob());
                    tracing::debug!(
                        "  Worker {} on job {} (target {} bits, ~{:.0} expected hashes)",
                        self.index,
                        job.id,
                        job.target_bits(),
                        estimated_hashes_for_difficulty(job.target_bits()),
                    );
                }
            }

            let active = match &job {
                Some(job) if tried < self.nonce_range => job,
                _ => {
                    std::thread::sleep(IDLE_POLL);
                    continue;
                }
            };

            active.write_nonce(&mut input, nonce);
            let hash = self.algorithm.hash(&input, &mut scratch);
            self.hashes.fetch_add(1, Ordering::Relaxed);

            if active.meets_target(&hash) {
                tracing::info!(
                    "⛏️  Share found! job={} nonce={} hash={}",
                    active.id,
                    nonce,
                    hex::encode(hash),
                );
                let share = Share {
                    job_id: active.id,
                    nonce,
                    hash,
                    worker: self.index,
                };
                if self.shares.send(share).is_err() {
                    return;
                }
            }

            nonce = nonce.wrapping_add(1);
            tried += 1;
            if tried == self.nonce_range {
                tracing::debug!("  Worker {} exhausted its nonce range on job {}", self.index, active.id);
            }
        }
    }
}

/// Mine `job` until the first share, or until `stop` is set.
pub fn mine_once(job: Job, config: &MinerConfig, stop: Arc<AtomicBool>) -> Result<Share, MinerError> {
    tracing::info!(
        "⛏️  Mining job {} (target: {} bits, ~{:.0} expected hashes, {} threads)...",
        job.id,
        job.target_bits(),
        estimated_hashes_for_difficulty(job.target_bits()),
        config.threads,
    );

    let board = Arc::new(JobBoard::new());
    board.publish(job);
    let (tx, rx) = mpsc::channel();
    let miner = Miner::start(config, board, tx, stop.clone());

    // Wake up periodically so an external stop ends the wait.
    let share = loop {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(share) => break Some(share),
            Err(mpsc::RecvTimeoutError::Timeout) if !stop.load(Ordering::Relaxed) => continue,
            Err(_) => break None,
        }
    };
    drop(rx);
    miner.stop()?;
    share.ok_or(MinerError::NoShare)
}

/// Result of a timed hashing run
#[derive(Debug, Clone)]
pub struct BenchReport {
    pub hashes: u64,
    pub elapsed: Duration,
    pub hashrate: f64,
}

/// Hash a job no digest can satisfy for `duration`, or until `stop` is set.
pub fn bench(config: &MinerConfig, duration: Duration, stop: Arc<AtomicBool>) -> Result<BenchReport, MinerError> {
    let blob: Vec<u8> = (0..76).map(|_| rand::random::<u8>()).collect();
    let job = Job::new(0, blob, 39, 256)?;

    let board = Arc::new(JobBoard::new());
    board.publish(job);
    let (tx, _rx) = mpsc::channel();
    let start = Instant::now();
    let miner = Miner::start(config, board, tx, stop.clone());

    while start.elapsed() < duration && !stop.load(Ordering::Relaxed) {
        std::thread::sleep(Duration::from_millis(50));
    }
    let hashes = miner.stop()?;
    let elapsed = start.elapsed();
    let hashrate = hashes as f64 / elapsed.as_secs_f64().max(f64::EPSILON);

    Ok(BenchReport {
        hashes,
        elapsed,
        hashrate,
    })
}
