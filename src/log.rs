//! Asynchronous file logger.
//!
//! The producer side turns a printf-style template and its arguments into a
//! stream of [`LogRecord`]s and commits them to an SPSC ring queue; a single
//! dedicated worker thread drains the queue and writes each record's textual
//! form to an append-only file. The calling thread never touches the file,
//! takes no lock, and allocates nothing.
//!
//! Template grammar: `%%` emits a literal `%`; a bare `%` consumes the next
//! argument; everything else is pushed as individual characters. Argument
//! count mismatches are call-site bugs and panic.
//!
//! Shutdown is drain-then-stop: dropping the logger publishes the stop flag,
//! rings the worker's doorbell and joins it. The worker runs one more drain
//! after observing the flag, so every record committed before the drop is in
//! the file when the drop returns.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};

use crate::record::{LogArg, LogRecord};
use crate::spsc;
use crate::thread;
use crate::time;

/// Default ring capacity, in records.
pub const LOG_QUEUE_CAPACITY: usize = 8 * 1024 * 1024;

/// How long the worker waits on its doorbell when the queue is empty.
const IDLE_BACKOFF: Duration = Duration::from_millis(10);

/// A latency-sensitive logger draining to a file on a background thread.
///
/// One instance owns one queue, one sink and one worker. The handle is the
/// single producer of its queue: `log` takes `&mut self`, and the handle can
/// move between threads but not be shared by them.
///
/// # Example
///
/// ```no_run
/// let mut logger = hotlog::Logger::new("/tmp/engine.log").unwrap();
/// hotlog::log!(logger, "fill qty % at px %\n", 250u32, 99.875);
/// ```
pub struct Logger {
  tx: spsc::Producer<LogRecord>,
  wake: Sender<()>,
  running: Arc<AtomicBool>,
  worker: Option<JoinHandle<()>>,
  path: PathBuf,
}

impl Logger {
  /// Opens `path` for writing and starts an unpinned worker with the
  /// default queue capacity.
  pub fn new<P: AsRef<Path>>(path: P) -> io::Result<Self> {
    Self::with_config(path, LOG_QUEUE_CAPACITY, None)
  }

  /// Opens `path` for writing and starts the drain worker, optionally
  /// pinned to `core_id`.
  ///
  /// Fails if the sink cannot be created, the worker cannot be spawned, or
  /// a requested pin is refused. `capacity` is rounded up to a power of two
  /// and fixed for the logger's lifetime.
  pub fn with_config<P: AsRef<Path>>(
    path: P,
    capacity: usize,
    core_id: Option<usize>,
  ) -> io::Result<Self> {
    let path = path.as_ref().to_path_buf();
    let file = File::create(&path)?;

    let (tx, rx) = spsc::ring::<LogRecord>(capacity);
    let (wake, doorbell) = crossbeam_channel::bounded::<()>(1);
    let running = Arc::new(AtomicBool::new(true));

    let flag = Arc::clone(&running);
    let sink_path = path.clone();
    let worker = thread::spawn(core_id, "hotlog/worker", move || {
      if let Err(e) = drain_loop(rx, file, flag, doorbell) {
        eprintln!("log drain error for {}: {:?}", sink_path.display(), e);
      }
    })?;

    Ok(Self {
      tx,
      wake,
      running,
      worker: Some(worker),
      path,
    })
  }

  /// Scans `template` once and commits the resulting records in order.
  ///
  /// Prefer the [`log!`](crate::log!) macro, which encodes the arguments.
  ///
  /// # Panics
  ///
  /// Panics if a `%` has no remaining argument, if arguments are left over
  /// once the template is exhausted, or if the queue is full (the producer
  /// has outrun the worker by more than the queue capacity).
  pub fn log(&mut self, template: &str, args: &[LogArg<'_>]) {
    let mut args = args.iter();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
      if c == '%' {
        if chars.peek() == Some(&'%') {
          chars.next();
          self.push(LogRecord::Char('%'));
          continue;
        }
        match args.next() {
          Some(arg) => self.push_arg(arg),
          None => panic!("missing arguments for log template {:?}", template),
        }
      } else {
        self.push(LogRecord::Char(c));
      }
    }

    if args.next().is_some() {
      panic!("extra arguments for log template {:?}", template);
    }
  }

  #[inline(always)]
  fn push_arg(&mut self, arg: &LogArg<'_>) {
    match *arg {
      LogArg::Scalar(rec) => self.push(rec),
      LogArg::Text(s) => {
        for c in s.chars() {
          self.push(LogRecord::Char(c));
        }
      }
    }
  }

  #[inline(always)]
  fn push(&mut self, rec: LogRecord) {
    if self.tx.push_with(|slot| *slot = rec).is_err() {
      panic!(
        "log queue overrun: {} unread records, capacity {}",
        self.tx.len(),
        self.tx.capacity()
      );
    }
    let _ = self.wake.try_send(());
  }

  /// Records committed but not yet drained. Approximate, monitoring only.
  #[inline]
  pub fn pending(&self) -> usize {
    self.tx.len()
  }

  /// The sink path this logger writes to.
  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl Drop for Logger {
  fn drop(&mut self) {
    eprintln!(
      "{} flushing and closing log {}",
      time::time_str(),
      self.path.display()
    );

    self.running.store(false, Ordering::Release);
    let _ = self.wake.try_send(());
    if let Some(worker) = self.worker.take() {
      let _ = worker.join();
    }
  }
}

/// Worker loop: drain, flush, then sleep on the doorbell until rung.
///
/// A sink write error ends the loop; there is no retry path.
fn drain_loop(
  mut rx: spsc::Consumer<LogRecord>,
  file: File,
  running: Arc<AtomicBool>,
  doorbell: Receiver<()>,
) -> io::Result<()> {
  let mut out = BufWriter::new(file);

  loop {
    let mut wrote = false;
    while let Some(&rec) = rx.peek() {
      write!(out, "{}", rec)?;
      rx.advance();
      wrote = true;
    }
    if wrote {
      out.flush()?;
    }

    if !running.load(Ordering::Acquire) {
      // the stop flag is stored after the producer's last commit, so one
      // more drain after observing it picks up everything outstanding
      while let Some(&rec) = rx.peek() {
        write!(out, "{}", rec)?;
        rx.advance();
      }
      out.flush()?;
      return Ok(());
    }

    let _ = doorbell.recv_timeout(IDLE_BACKOFF);
  }
}


/// Formats and commits one log line: `log!(logger, "px %\n", 101.5)`.
///
/// Each argument must implement [`Loggable`](crate::record::Loggable);
/// anything outside that set is a compile error.
#[macro_export]
macro_rules! log {
  ($logger:expr, $template:expr $(,)?) => {
    $logger.log($template, &[])
  };
  ($logger:expr, $template:expr, $($arg:expr),+ $(,)?) => {
    $logger.log($template, &[$($crate::record::Loggable::to_arg(&$arg)),+])
  };
}
