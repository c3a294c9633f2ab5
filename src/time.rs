//! Wall-clock helpers for diagnostics and demo output.
//!
//! Nothing here runs on the logging hot path; the logger only reaches for
//! [`time_str`] when announcing shutdown on stderr.

use std::time::{SystemTime, UNIX_EPOCH};

pub type Nanos = i64;

pub const NANOS_PER_MICRO: Nanos = 1_000;
pub const MICROS_PER_MILLI: Nanos = 1_000;
pub const MILLIS_PER_SEC: Nanos = 1_000;
pub const NANOS_PER_MILLI: Nanos = NANOS_PER_MICRO * MICROS_PER_MILLI;
pub const NANOS_PER_SEC: Nanos = NANOS_PER_MILLI * MILLIS_PER_SEC;

/// Nanoseconds since the unix epoch.
#[inline]
pub fn get_ns() -> Nanos {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map(|d| d.as_nanos() as Nanos)
    .unwrap_or(0)
}

/// Local wall-clock time as `YYYY-MM-DD HH:MM:SS`.
#[cfg(unix)]
pub fn time_str() -> String {
  let sec = get_ns() / NANOS_PER_SEC;

  let mut tm: libc::tm = unsafe { std::mem::zeroed() };
  let tt = sec as libc::time_t;
  unsafe { libc::localtime_r(&tt as *const libc::time_t, &mut tm as *mut libc::tm) };

  let mut buf = [0u8; 19];
  four_digits(&mut buf[0..4], (tm.tm_year + 1900) as u32);
  buf[4] = b'-';
  two_digits(&mut buf[5..7], (tm.tm_mon + 1) as u32);
  buf[7] = b'-';
  two_digits(&mut buf[8..10], tm.tm_mday as u32);
  buf[10] = b' ';
  two_digits(&mut buf[11..13], tm.tm_hour as u32);
  buf[13] = b':';
  two_digits(&mut buf[14..16], tm.tm_min as u32);
  buf[16] = b':';
  two_digits(&mut buf[17..19], tm.tm_sec as u32);

  String::from_utf8_lossy(&buf).into_owned()
}

/// Fallback without `localtime_r`: seconds since the unix epoch.
#[cfg(not(unix))]
pub fn time_str() -> String {
  format!("{}", get_ns() / NANOS_PER_SEC)
}

#[cfg(unix)]
#[inline(always)]
fn two_digits(dst: &mut [u8], x: u32) {
  dst[0] = b'0' + ((x / 10) % 10) as u8;
  dst[1] = b'0' + (x % 10) as u8;
}

#[cfg(unix)]
#[inline(always)]
fn four_digits(dst: &mut [u8], x: u32) {
  dst[0] = b'0' + ((x / 1000) % 10) as u8;
  dst[1] = b'0' + ((x / 100) % 10) as u8;
  dst[2] = b'0' + ((x / 10) % 10) as u8;
  dst[3] = b'0' + (x % 10) as u8;
}

#[cfg(test)]
mod tests {
  use super::{get_ns, time_str, NANOS_PER_SEC};

  #[test]
  fn get_ns_is_monotonic_enough() {
    let a = get_ns();
    let b = get_ns();
    assert!(b >= a);
    assert!(a > 1_500_000_000 * NANOS_PER_SEC); // later than 2017
  }

  #[cfg(unix)]
  #[test]
  fn time_str_shape() {
    let s = time_str();
    assert_eq!(s.len(), 19);

    let bytes = s.as_bytes();
    assert_eq!(bytes[4], b'-');
    assert_eq!(bytes[7], b'-');
    assert_eq!(bytes[10], b' ');
    assert_eq!(bytes[13], b':');
    assert_eq!(bytes[16], b':');
    for i in [0, 1, 2, 3, 5, 6, 8, 9, 11, 12, 14, 15, 17, 18] {
      assert!(bytes[i].is_ascii_digit(), "non-digit in {:?}", s);
    }
  }
}
