//! Burst-latency probe: rounds of back-to-back log calls with the worker
//! draining behind, reporting per-batch wall-cost percentiles.

use std::time::Duration;

use hotlog::{fatal, log, Logger};
use minstant::Instant;

const ROUND: usize = 256;
const NUM_LOG: usize = 128;

fn main() {
  let path = std::env::temp_dir().join("hotlog_burst.log");
  let mut logger = match Logger::with_config(&path, 1 << 20, None) {
    Ok(logger) => logger,
    Err(e) => fatal!("could not start logger at {}: {}", path.display(), e),
  };

  let mut batch_ns = Vec::<u64>::with_capacity(ROUND);

  for _ in 0..ROUND {
    let start = Instant::now();
    for seq in 0..NUM_LOG as u64 {
      let seq = std::hint::black_box(seq);
      log!(logger, "curr % u %\n", seq, seq);
    }
    batch_ns.push(start.elapsed().as_nanos() as u64);

    // let the worker catch up between bursts
    std::thread::park_timeout(Duration::from_micros(500));
  }

  let total_logs = (ROUND * NUM_LOG) as f64;
  let total_ns: u64 = batch_ns.iter().sum();
  let min = *batch_ns.iter().min().unwrap();
  let max = *batch_ns.iter().max().unwrap();
  let p50 = percentile(batch_ns.clone(), 0.50);
  let p90 = percentile(batch_ns.clone(), 0.90);
  let p99 = percentile(batch_ns.clone(), 0.99);

  println!("== burst bench ==");
  println!("ROUND={} NUM_LOG={} total_ns={}", ROUND, NUM_LOG, total_ns);
  println!("avg per log: {:.1} ns", total_ns as f64 / total_logs);
  println!(
    "batch ns: min={} p50={} p90={} p99={} max={}",
    min, p50, p90, p99, max
  );

  drop(logger);
  println!("log written to {}", path.display());
}

fn percentile(mut v: Vec<u64>, p: f64) -> u64 {
  v.sort_unstable();
  let n = v.len();
  let idx = ((n as f64 - 1.0) * p).floor() as usize;
  v[idx.min(n - 1)]
}
