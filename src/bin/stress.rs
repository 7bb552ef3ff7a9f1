use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use ringpipe::ring::RingBuffer;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Pushes a u64 sequence through an SPSC ring as fast as possible and checks
/// that the consumer sees every value exactly once, in order.
#[derive(Parser, Debug)]
#[command(name = "stress", version)]
struct Args {
    #[arg(long, default_value_t = 64 * 1024)]
    capacity: usize,

    #[arg(long, default_value_t = 5)]
    seconds: u64,

    /// Items per slice push/pop. 0 uses single-item operations.
    #[arg(long, default_value_t = 0)]
    batch: usize,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    let mut ring = RingBuffer::<u64>::new(args.capacity).context("Failed to create SPSC ring buffer")?;
    let (mut prod, mut cons) = ring.split();
    let producer_done = AtomicBool::new(false);
    let batch = args.batch;

    info!(capacity = args.capacity, batch, seconds = args.seconds, "SPSC stress test");
    let started = Instant::now();

    let (written, read) = std::thread::scope(|scope| {
        let writer_running = running.clone();
        let producer_done = &producer_done;
        let writer = scope.spawn(move || {
            let mut next = 0u64;
            let mut chunk = Vec::with_capacity(batch);

            while writer_running.load(Ordering::Relaxed) {
                if batch == 0 {
                    if prod.try_push(next).is_ok() {
                        next += 1;
                    }
                } else {
                    chunk.clear();
                    chunk.extend(next..next + batch as u64);
                    next += prod.try_push_slice(&chunk) as u64;
                }
            }

            producer_done.store(true, Ordering::Release);
            next
        });

        let reader = scope.spawn(move || -> Result<u64> {
            let mut expected = 0u64;
            let mut out = vec![0u64; batch];

            loop {
                let done = producer_done.load(Ordering::Acquire);

                if batch == 0 {
                    while let Some(value) = cons.try_pop() {
                        if value != expected {
                            bail!("Out of order: expected {}, got {}", expected, value);
                        }
                        expected += 1;
                    }
                } else {
                    loop {
                        let n = cons.pop_into(&mut out);
                        if n == 0 {
                            break;
                        }
                        for &value in &out[..n] {
                            if value != expected {
                                bail!("Out of order: expected {}, got {}", expected, value);
                            }
                            expected += 1;
                        }
                    }
                }

                // Everything pushed before `done` was set is visible now.
                if done && cons.is_empty() {
                    return Ok(expected);
                }
            }
        });

        std::thread::sleep(Duration::from_secs(args.seconds));
        running.store(false, Ordering::SeqCst);

        let written = writer.join().map_err(|_| anyhow!("Writer thread panicked"))?;
        let read = reader.join().map_err(|_| anyhow!("Reader thread panicked"))??;
        Ok::<_, anyhow::Error>((written, read))
    })?;

    let elapsed = started.elapsed().as_secs_f64();
    if written != read {
        bail!("Lost items: wrote {}, read {}", written, read);
    }

    info!(
        written,
        read,
        throughput = %format!("{:.2}M items/sec", written as f64 / elapsed / 1_000_000.0),
        "results"
    );

    Ok(())
}
