use clap::{Parser, Subcommand};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use astrobwt::core::types::estimated_hashes_for_difficulty;
use astrobwt::miner::{self, Job, JobBoard, Miner, MinerConfig, MinerError};
use astrobwt::pow::{self, stats, vectors, Algorithm, Scratch};

#[derive(Parser)]
#[command(name = "astrobwt", version = "0.1.0")]
#[command(about = "AstroBWT v3 proof-of-work hasher and CPU miner")]
struct Cli {
    /// PoW variant: astrobwt-v3 or stage1
    #[arg(long, global = true, default_value = "astrobwt-v3")]
    algo: Algorithm,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hash one input and print the digest
    Hash {
        input: String,
        /// Treat INPUT as hex instead of text
        #[arg(long = "hex")]
        is_hex: bool,
    },
    /// Mine a blob until enough shares are found
    Mine {
        /// Hex-encoded hashing blob
        #[arg(short, long)]
        blob: String,
        /// Byte offset of the 4-byte little-endian nonce
        #[arg(short, long, default_value_t = 39)]
        nonce_offset: usize,
        /// Leading zero bits a share needs
        #[arg(long, default_value_t = 8)]
        target_bits: u32,
        #[arg(short, long, default_value_t = 0)]
        threads: usize,
        /// Stop after this many shares
        #[arg(short, long, default_value_t = 1)]
        count: u64,
    },
    /// Measure the hashrate
    Bench {
        #[arg(short, long, default_value_t = 0)]
        threads: usize,
        #[arg(short, long, default_value_t = 10)]
        seconds: u64,
    },
    /// Check the known-answer vectors
    Selftest,
}

fn resolve_threads(threads: usize) -> usize {
    if threads == 0 { num_cpus::get().max(1) } else { threads }
}

fn install_stop_handler() -> Arc<AtomicBool> {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_clone = stop.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!("\n🛑 Shutting down gracefully...");
        stop_clone.store(true, Ordering::SeqCst);
    }) {
        tracing::warn!("⚠️  Ctrl-C handler unavailable: {}", e);
    }
    stop
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("astrobwt=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), MinerError> {
    let algorithm = cli.algo;

    match cli.command {
        Commands::Hash { input, is_hex } => {
            let bytes = if is_hex {
                hex::decode(input.trim()).map_err(|e| MinerError::InvalidInput(e.to_string()))?
            } else {
                input.into_bytes()
            };
            let mut scratch = Scratch::acquire();
            let start = Instant::now();
            let digest = algorithm.hash(&bytes, &mut scratch);
            let elapsed = start.elapsed();
            scratch.release();
            println!("{}", hex::encode(digest));
            tracing::debug!("{} hash of {} bytes in {:.1?}", algorithm, bytes.len(), elapsed);
        }

        Commands::Mine { blob, nonce_offset, target_bits, threads, count } => {
            let blob = hex::decode(blob.trim()).map_err(|e| MinerError::InvalidInput(e.to_string()))?;
            let job = Job::new(1, blob, nonce_offset, target_bits)?;
            let config = MinerConfig { threads: resolve_threads(threads), algorithm };
            let stop = install_stop_handler();

            println!("⛏️  Mining with {} ({} threads)", algorithm, config.threads);
            println!("  Target:    {} bits (~{:.0} expected hashes)",
                target_bits, estimated_hashes_for_difficulty(target_bits));

            let board = Arc::new(JobBoard::new());
            board.publish(job);
            let (tx, rx) = mpsc::channel();
            let miner = Miner::start(&config, board, tx, stop.clone());

            let start = Instant::now();
            let mut found = 0u64;
            while found < count && !stop.load(Ordering::Relaxed) {
                match rx.recv_timeout(Duration::from_secs(1)) {
                    Ok(share) => {
                        found += 1;
                        println!("  ✅ #{}: nonce={} hash={} (worker {})",
                            found, share.nonce, hex::encode(share.hash), share.worker);
                    }
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        tracing::debug!("  {} hashes, {:.1} H/s", miner.hashes(), miner.hashrate());
                    }
                    Err(mpsc::RecvTimeoutError::Disconnected) => break,
                }
            }
            drop(rx);
            let hashes = miner.stop()?;
            let el = start.elapsed().as_secs_f64();
            println!("\n  {} shares | {} hashes | {:.1}s | {:.1} H/s",
                found, hashes, el, hashes as f64 / el.max(f64::EPSILON));
            if found == 0 {
                return Err(MinerError::NoShare);
            }
        }

        Commands::Bench { threads, seconds } => {
            let config = MinerConfig { threads: resolve_threads(threads), algorithm };
            let stop = install_stop_handler();
            println!("🧪 Benchmarking {} for {}s on {} threads", algorithm, seconds, config.threads);
            let report = miner::bench(&config, Duration::from_secs(seconds), stop)?;
            println!("  {} hashes | {:.1}s | {:.1} H/s | {:.1} H/s per thread",
                report.hashes, report.elapsed.as_secs_f64(), report.hashrate,
                report.hashrate / config.threads as f64);
            if let Some(s) = stats::snapshot() {
                print_stats(&s);
            }
        }

        Commands::Selftest => {
            let mut scratch = Scratch::acquire();
            let failures = vectors::check(&mut scratch);
            for v in vectors::ASTROBWT_V3 {
                let label = v.label();
                if failures.iter().any(|f| f.label == label) {
                    println!("  ❌ astrobwt-v3 {}", label);
                } else {
                    println!("  ✅ astrobwt-v3 {}", label);
                }
            }
            for f in &failures {
                eprintln!("  {}: expected {} got {}", f.label, f.expected, hex::encode(f.actual));
            }

            let mut rng = rand::thread_rng();
            let mut input = [0u8; 400];
            let mut stage_mismatches = 0;
            for _ in 0..16 {
                rng.fill(&mut input[..]);
                if pow::pow_optimized(&input, &mut scratch) != pow::pow16(&input) {
                    stage_mismatches += 1;
                    eprintln!("  stage1 mismatch on {}", hex::encode(input));
                }
            }
            if stage_mismatches == 0 {
                println!("  ✅ stage1 matches the reference on 16 random inputs");
            }
            scratch.release();

            if let Some(s) = stats::snapshot() {
                print_stats(&s);
            }

            let total = failures.len() + stage_mismatches;
            if total > 0 {
                return Err(MinerError::SelfTestFailed(total));
            }
            println!("✅ All self-test checks passed");
        }
    }
    Ok(())
}

fn print_stats(s: &stats::OpStats) {
    println!("📊 {} v3 evaluations", s.evaluations());
    for (tries, n) in &s.tries {
        println!("  tries={} x{}", tries, n);
    }
    let mut ops: Vec<(usize, u64)> = s.ops.iter().copied().enumerate().collect();
    ops.sort_by(|a, b| b.1.cmp(&a.1));
    for (op, n) in ops.iter().take(8) {
        println!("  op {:3}: {}", op, n);
    }
}
