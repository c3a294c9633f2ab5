//! Latency-sensitive, allocation-free logging pipeline for trading hot
//! paths.
//!
//! The calling thread never blocks on disk I/O, locks or the allocator: a
//! `log!` call scans its template once, encodes each argument into a tagged
//! [`LogRecord`](record::LogRecord) and commits it to a fixed-capacity
//! lock-free SPSC ring. A dedicated worker thread, optionally pinned to a
//! core, drains the ring and writes the textual stream to a file.
//!
//! ```no_run
//! use hotlog::{log, Logger};
//!
//! let mut logger = Logger::new("/tmp/engine.log").unwrap();
//! log!(logger, "order % filled at %\n", 42u64, 101.25);
//! // dropping the logger drains the queue before the file is closed
//! ```

pub mod fatal;
pub mod log;
pub mod record;
pub mod spsc;
pub mod thread;
pub mod time;

pub use crate::log::{Logger, LOG_QUEUE_CAPACITY};
pub use crate::record::{LogArg, LogRecord, Loggable};
