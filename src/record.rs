//! The queued log record and the closed set of types that can produce one.
//!
//! A [`LogRecord`] is one loggable scalar: a discriminant plus the single
//! active payload, readable only through the variant that was written. It is
//! a pure value type, 16 bytes, `Copy`, so queue slots are filled and drained
//! by plain copies with nothing to destruct.
//!
//! [`Loggable`] is the static capability check on `log` arguments: it is
//! implemented for exactly the supported kinds and nothing else, so an
//! unsupported argument type is rejected at compile time rather than at run
//! time. There is no trait object anywhere on the path.

use std::fmt;

/// One queued scalar, tagged by kind.
///
/// The two `Wide` kinds carry the platform-width integers (`isize`/`usize`);
/// they render identically to their fixed-width siblings but keep their own
/// tag so the drained stream reflects what the call site handed over.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum LogRecord {
  Char(char),
  Int32(i32),
  Int64(i64),
  Int64Wide(i64),
  UInt32(u32),
  UInt64(u64),
  UInt64Wide(u64),
  Float32(f32),
  Float64(f64),
}

impl fmt::Display for LogRecord {
  /// Renders the active payload in its native textual form, nothing else.
  /// All literal text around it comes from the log template.
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match *self {
      LogRecord::Char(v) => fmt::Display::fmt(&v, f),
      LogRecord::Int32(v) => fmt::Display::fmt(&v, f),
      LogRecord::Int64(v) => fmt::Display::fmt(&v, f),
      LogRecord::Int64Wide(v) => fmt::Display::fmt(&v, f),
      LogRecord::UInt32(v) => fmt::Display::fmt(&v, f),
      LogRecord::UInt64(v) => fmt::Display::fmt(&v, f),
      LogRecord::UInt64Wide(v) => fmt::Display::fmt(&v, f),
      LogRecord::Float32(v) => fmt::Display::fmt(&v, f),
      LogRecord::Float64(v) => fmt::Display::fmt(&v, f),
    }
  }
}

/// One substitution argument, as encoded at the call site.
///
/// Scalars become a single record; text is borrowed and decomposed into
/// `Char` records by the logger, one push per character, in order. Either
/// way the encoding itself allocates nothing.
#[derive(Copy, Clone, Debug)]
pub enum LogArg<'a> {
  Scalar(LogRecord),
  Text(&'a str),
}

/// Types admissible as `log` arguments.
///
/// Implemented for `char`, the six integer kinds, the two float kinds,
/// `bool` (encoded as `Int32` 0/1) and string slices. Nothing else.
pub trait Loggable {
  fn to_arg(&self) -> LogArg<'_>;
}

macro_rules! loggable_scalar {
  ($($ty:ty => $kind:ident),+ $(,)?) => {
    $(
      impl Loggable for $ty {
        #[inline(always)]
        fn to_arg(&self) -> LogArg<'_> {
          LogArg::Scalar(LogRecord::$kind(*self as _))
        }
      }
    )+
  };
}

loggable_scalar! {
  i32 => Int32,
  i64 => Int64,
  isize => Int64Wide,
  u32 => UInt32,
  u64 => UInt64,
  usize => UInt64Wide,
  f32 => Float32,
  f64 => Float64,
}

impl Loggable for char {
  #[inline(always)]
  fn to_arg(&self) -> LogArg<'_> {
    LogArg::Scalar(LogRecord::Char(*self))
  }
}

impl Loggable for bool {
  #[inline(always)]
  fn to_arg(&self) -> LogArg<'_> {
    LogArg::Scalar(LogRecord::Int32(*self as i32))
  }
}

impl Loggable for &str {
  #[inline(always)]
  fn to_arg(&self) -> LogArg<'_> {
    LogArg::Text(*self)
  }
}

impl Loggable for String {
  #[inline(always)]
  fn to_arg(&self) -> LogArg<'_> {
    LogArg::Text(self.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::{LogArg, LogRecord, Loggable};

  #[test]
  fn renders_native_textual_form() {
    assert_eq!(LogRecord::Char('x').to_string(), "x");
    assert_eq!(LogRecord::Int32(-42).to_string(), "-42");
    assert_eq!(LogRecord::Int64(1_000_000_007).to_string(), "1000000007");
    assert_eq!(LogRecord::Int64Wide(-9).to_string(), "-9");
    assert_eq!(LogRecord::UInt32(7).to_string(), "7");
    assert_eq!(LogRecord::UInt64(u64::MAX).to_string(), u64::MAX.to_string());
    assert_eq!(LogRecord::UInt64Wide(3).to_string(), "3");
    assert_eq!(LogRecord::Float32(2.5).to_string(), "2.5");
    assert_eq!(LogRecord::Float64(-0.125).to_string(), "-0.125");
  }

  #[test]
  fn bool_encodes_as_int32() {
    match true.to_arg() {
      LogArg::Scalar(rec) => assert_eq!(rec, LogRecord::Int32(1)),
      other => panic!("unexpected encoding: {:?}", other),
    }
    match false.to_arg() {
      LogArg::Scalar(rec) => assert_eq!(rec, LogRecord::Int32(0)),
      other => panic!("unexpected encoding: {:?}", other),
    }
  }

  #[test]
  fn platform_widths_take_wide_kinds() {
    match 5isize.to_arg() {
      LogArg::Scalar(rec) => assert_eq!(rec, LogRecord::Int64Wide(5)),
      other => panic!("unexpected encoding: {:?}", other),
    }
    match 5usize.to_arg() {
      LogArg::Scalar(rec) => assert_eq!(rec, LogRecord::UInt64Wide(5)),
      other => panic!("unexpected encoding: {:?}", other),
    }
  }

  #[test]
  fn strings_stay_borrowed_text() {
    let owned = String::from("mid");
    for arg in ["hft", owned.as_str()].iter().map(|s| s.to_arg()) {
      match arg {
        LogArg::Text(_) => {}
        other => panic!("unexpected encoding: {:?}", other),
      }
    }
    match owned.to_arg() {
      LogArg::Text(s) => assert_eq!(s, "mid"),
      other => panic!("unexpected encoding: {:?}", other),
    }
  }
}
