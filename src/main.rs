//! End-to-end demo: one logger, every supported argument kind, clean drain
//! on drop.

use hotlog::time::time_str;
use hotlog::{fatal, log, require, Logger};

fn main() {
  let path = std::env::temp_dir().join("hotlog_demo.log");
  require!(!path.as_os_str().is_empty(), "empty demo log path");

  let mut logger = match Logger::with_config(&path, 64 * 1024, None) {
    Ok(logger) => logger,
    Err(e) => fatal!("could not start logger at {}: {}", path.display(), e),
  };

  log!(logger, "% demo starting\n", time_str());

  log!(logger, "char % int % long % wide %\n", 'a', -12, 345i64, -6isize);
  log!(logger, "uint % ulong % uwide %\n", 7u32, 8u64, 9usize);
  log!(logger, "float % double % bool %\n", 2.5f32, 3.25, true);
  log!(logger, "fill: % lots @ % (%)\n", 250u32, 101.5, "IOC");
  log!(logger, "progress 100%% complete\n");

  for seq in 0..10u64 {
    log!(logger, "tick %\n", seq);
  }

  drop(logger);
  println!("wrote demo log to {}", path.display());
}
