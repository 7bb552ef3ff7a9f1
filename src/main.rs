use anyhow::{Context, Result, anyhow};
use clap::Parser;
use ringpipe::consumer::{Dispatcher, DrainStats, Sink};
use ringpipe::ring::RingBuffer;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Bytes the simulated receiver keeps replaying.
const MESSAGE: &[u8] = b"$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n";

const MAX_LINE: usize = 128;

/// Simulated UART receive path: an interrupt-like thread pushes bytes into a
/// ring buffer while the main loop drains them into a line assembler.
#[derive(Parser, Debug)]
#[command(name = "ringpipe", version)]
struct Args {
    /// Usable slots in the receive buffer.
    #[arg(long, default_value_t = 256)]
    capacity: usize,

    /// Delay between received bytes. 87us is one byte at 115200 baud.
    #[arg(long, default_value_t = 87)]
    byte_interval_us: u64,

    /// Seconds between status lines.
    #[arg(long, default_value_t = 5)]
    report_secs: u64,
}

struct LineSink {
    line: Vec<u8>,
    lines: Arc<AtomicU64>,
}

impl LineSink {
    fn new(lines: Arc<AtomicU64>) -> Self {
        Self {
            line: Vec::with_capacity(MAX_LINE),
            lines,
        }
    }
}

impl Sink<u8> for LineSink {
    fn accept(&mut self, byte: &u8) -> bool {
        match *byte {
            b'\r' => true,
            b'\n' => {
                debug!(line = %String::from_utf8_lossy(&self.line), "line received");
                self.lines.fetch_add(1, Ordering::Relaxed);
                self.line.clear();
                true
            }
            b if self.line.len() < MAX_LINE => {
                self.line.push(b);
                true
            }
            // Overlong line: resynchronize on the next terminator.
            _ => {
                self.line.clear();
                false
            }
        }
    }

    fn name(&self) -> &str {
        "lines"
    }
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

    let mut ring = RingBuffer::<u8>::new(args.capacity).context("Failed to create receive buffer")?;
    let lines = Arc::new(AtomicU64::new(0));
    let mut dispatcher = Dispatcher::new();
    dispatcher.add_sink(LineSink::new(lines.clone()));

    let byte_interval = Duration::from_micros(args.byte_interval_us);
    let report_every = Duration::from_secs(args.report_secs.max(1));

    info!(capacity = args.capacity, ?byte_interval, "receive path running, press Ctrl+C to stop");

    let (mut rx_isr, mut rx_main) = ring.split();

    let (received, overruns, totals) = thread::scope(|scope| {
        let isr_running = running.clone();
        let isr = scope.spawn(move || {
            let mut received = 0u64;
            let mut overruns = 0u64;
            for &byte in MESSAGE.iter().cycle() {
                if !isr_running.load(Ordering::Relaxed) {
                    break;
                }
                // Reject-on-full: the newest byte is lost, like a UART overrun.
                match rx_isr.try_push(byte) {
                    Ok(()) => received += 1,
                    Err(_) => overruns += 1,
                }
                thread::sleep(byte_interval);
            }
            (received, overruns)
        });

        let mut totals = DrainStats::default();
        let mut last_report = Instant::now();

        while running.load(Ordering::SeqCst) {
            totals.merge(dispatcher.drain(rx_main.drain()));

            if last_report.elapsed() >= report_every {
                info!(
                    bytes = totals.items_read,
                    lines = lines.load(Ordering::Relaxed),
                    queued = rx_main.len(),
                    "status"
                );
                last_report = Instant::now();
            }

            thread::sleep(Duration::from_millis(10));
        }

        let (received, overruns) = isr.join().map_err(|_| anyhow!("Receive thread panicked"))?;
        totals.merge(dispatcher.drain(rx_main.drain()));
        Ok::<_, anyhow::Error>((received, overruns, totals))
    })?;

    if overruns > 0 {
        warn!(overruns, "receive buffer overran, increase --capacity");
    }
    info!(
        received,
        drained = totals.items_read,
        lines = lines.load(Ordering::Relaxed),
        success_rate = totals.success_rate(),
        "shutting down"
    );
    debug!(?ring, "receive buffer at shutdown");

    Ok(())
}
