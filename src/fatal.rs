//! Abort-with-message primitives for unrecoverable setup failures.
//!
//! These sit at the process boundary: library code reports setup problems
//! as `io::Result`, and binaries decide whether that is fatal. Nothing in
//! the logging hot path calls them.

/// Prints the message to stderr and exits the process with status 1.
#[macro_export]
macro_rules! fatal {
  ($($arg:tt)*) => {{
    eprintln!($($arg)*);
    ::std::process::exit(1)
  }};
}

/// Exits the process with the message unless the condition holds.
#[macro_export]
macro_rules! require {
  ($cond:expr, $($arg:tt)*) => {{
    if !$cond {
      $crate::fatal!($($arg)*);
    }
  }};
}
