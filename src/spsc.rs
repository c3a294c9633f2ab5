//! Single-producer single-consumer ring queue using cached indices.
//!
//! This is the hand-off between the logging hot path and the drain worker.
//!
//! # Design
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ Shared:                                                     │
//! │   tail: CachePadded<AtomicUsize>   ← Producer writes        │
//! │   head: CachePadded<AtomicUsize>   ← Consumer writes        │
//! │   buffer: *mut T                                            │
//! └─────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────┐     ┌─────────────────────┐
//! │ Producer:           │     │ Consumer:           │
//! │   local_tail        │     │   local_head        │
//! │   cached_head       │     │   cached_tail       │
//! └─────────────────────┘     └─────────────────────┘
//! ```
//!
//! Producer and consumer each maintain a cached copy of the other's index,
//! only refreshing from the atomic when the cache indicates the queue is
//! full (producer) or empty (consumer). Head and tail sit on separate cache
//! lines to avoid false sharing.
//!
//! A release fence after the slot write and before the tail store makes the
//! written value visible to the consumer no later than the advanced cursor,
//! so a committed slot is never observed half-written. The mirror-image
//! fences guard the consumer's head advance.
//!
//! A full queue refuses the push. Unread slots are never overwritten.
//!
//! # Example
//!
//! ```
//! let (mut tx, mut rx) = hotlog::spsc::ring::<u64>(1024);
//!
//! tx.push(42).unwrap();
//! assert_eq!(rx.pop(), Some(42));
//! ```

use std::fmt;
use std::mem::ManuallyDrop;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;

/// Creates a bounded SPSC ring queue with the given capacity.
///
/// Capacity is rounded up to the next power of two and is fixed for the
/// lifetime of the pair.
///
/// # Panics
///
/// Panics if `capacity` is zero.
pub fn ring<T>(capacity: usize) -> (Producer<T>, Consumer<T>) {
  assert!(capacity > 0, "capacity must be non-zero");

  let capacity = capacity.next_power_of_two();
  let mask = capacity - 1;

  let mut slots = ManuallyDrop::new(Vec::<T>::with_capacity(capacity));
  let buffer = slots.as_mut_ptr();

  let shared = Arc::new(Shared {
    tail: CachePadded::new(AtomicUsize::new(0)),
    head: CachePadded::new(AtomicUsize::new(0)),
    buffer,
    mask,
  });

  (
    Producer {
      local_tail: 0,
      cached_head: 0,
      buffer,
      mask,
      shared: Arc::clone(&shared),
    },
    Consumer {
      local_head: 0,
      cached_tail: 0,
      buffer,
      mask,
      shared,
    },
  )
}

#[repr(C)]
struct Shared<T> {
  tail: CachePadded<AtomicUsize>,
  head: CachePadded<AtomicUsize>,
  buffer: *mut T,
  mask: usize,
}

unsafe impl<T: Send> Send for Shared<T> {}
unsafe impl<T: Send> Sync for Shared<T> {}

impl<T> Drop for Shared<T> {
  fn drop(&mut self) {
    let head = self.head.load(Ordering::Relaxed);
    let tail = self.tail.load(Ordering::Relaxed);

    let mut i = head;
    while i != tail {
      unsafe { self.buffer.add(i & self.mask).drop_in_place() };
      i = i.wrapping_add(1);
    }

    unsafe {
      let capacity = self.mask + 1;
      let _ = Vec::from_raw_parts(self.buffer, 0, capacity);
    }
  }
}

/// The producer endpoint of the ring queue.
///
/// This endpoint can only push values into the queue. It belongs to exactly
/// one thread at a time; there is no contract for concurrent producers.
#[repr(C)]
pub struct Producer<T> {
  local_tail: usize,
  cached_head: usize,
  buffer: *mut T,
  mask: usize,
  shared: Arc<Shared<T>>,
}

unsafe impl<T: Send> Send for Producer<T> {}

impl<T> Producer<T> {
  /// Pushes a value into the queue.
  ///
  /// Returns `Err(value)` if the queue is full, returning ownership of the
  /// value to the caller. The next unread slot is never overwritten.
  #[inline]
  pub fn push(&mut self, value: T) -> Result<(), T> {
    let tail = self.local_tail;

    if tail.wrapping_sub(self.cached_head) > self.mask {
      self.cached_head = self.shared.head.load(Ordering::Relaxed);

      std::sync::atomic::fence(Ordering::Acquire);
      if tail.wrapping_sub(self.cached_head) > self.mask {
        return Err(value);
      }
    }

    unsafe { self.buffer.add(tail & self.mask).write(value) };
    self.commit(tail);

    Ok(())
  }

  /// Writes the next slot in place through `f`, then commits it.
  ///
  /// Equivalent to [`push`](Self::push) but lets the caller fill the
  /// reserved slot directly instead of moving a value in. Returns `Err(())`
  /// if the queue is full, in which case `f` is not called.
  ///
  /// The slot handed to `f` may hold a stale, already-consumed value;
  /// `f` must overwrite it completely.
  #[inline]
  pub fn push_with<F: FnMut(&mut T)>(&mut self, mut f: F) -> Result<(), ()> {
    let tail = self.local_tail;

    if tail.wrapping_sub(self.cached_head) > self.mask {
      self.cached_head = self.shared.head.load(Ordering::Relaxed);

      std::sync::atomic::fence(Ordering::Acquire);
      if tail.wrapping_sub(self.cached_head) > self.mask {
        return Err(());
      }
    }

    unsafe {
      let slot = self.buffer.add(tail & self.mask);
      f(&mut *slot);
    }
    self.commit(tail);

    Ok(())
  }

  // Publish the slot at `tail`: value write first, fence, then cursor.
  #[inline]
  fn commit(&mut self, tail: usize) {
    let new_tail = tail.wrapping_add(1);
    std::sync::atomic::fence(Ordering::Release);

    self.shared.tail.store(new_tail, Ordering::Relaxed);
    self.local_tail = new_tail;
  }

  /// Returns the capacity of the queue.
  #[inline]
  pub fn capacity(&self) -> usize {
    self.mask + 1
  }

  /// Number of committed-but-unread elements.
  ///
  /// Computed from the shared cursors with relaxed loads; approximate, for
  /// monitoring only. Neither side makes correctness decisions from it.
  #[inline]
  pub fn len(&self) -> usize {
    let tail = self.shared.tail.load(Ordering::Relaxed);
    let head = self.shared.head.load(Ordering::Relaxed);
    tail.wrapping_sub(head)
  }

  /// Returns `true` if [`len`](Self::len) is zero.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl<T> fmt::Debug for Producer<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Producer")
      .field("capacity", &self.capacity())
      .finish_non_exhaustive()
  }
}

/// The consumer endpoint of the ring queue.
///
/// This endpoint can only inspect and pop values. Single consumer only.
#[repr(C)]
pub struct Consumer<T> {
  local_head: usize,
  cached_tail: usize,
  buffer: *mut T,
  mask: usize,
  shared: Arc<Shared<T>>,
}

unsafe impl<T: Send> Send for Consumer<T> {}

impl<T> Consumer<T> {
  /// Pops a value from the queue.
  ///
  /// Returns `None` if the queue is empty.
  #[inline]
  pub fn pop(&mut self) -> Option<T> {
    let head = self.local_head;

    if head == self.cached_tail {
      self.cached_tail = self.shared.tail.load(Ordering::Relaxed);
      std::sync::atomic::fence(Ordering::Acquire);

      if head == self.cached_tail {
        return None;
      }
    }

    let value = unsafe { self.buffer.add(head & self.mask).read() };
    self.release(head);

    Some(value)
  }

  /// Returns a reference to the next readable slot without consuming it.
  ///
  /// Returns `None` if the queue is empty. A `Some` result stays valid
  /// until [`advance`](Self::advance) is called.
  #[inline]
  pub fn peek(&mut self) -> Option<&T> {
    let head = self.local_head;

    if head == self.cached_tail {
      self.cached_tail = self.shared.tail.load(Ordering::Relaxed);
      std::sync::atomic::fence(Ordering::Acquire);

      if head == self.cached_tail {
        return None;
      }
    }

    Some(unsafe { &*self.buffer.add(head & self.mask) })
  }

  /// Releases the slot last returned by [`peek`](Self::peek).
  ///
  /// Drops the slot value in place and hands the slot back to the
  /// producer. Intended to follow a successful `peek` whose value has been
  /// fully consumed; with no readable slot it is a no-op, so the read
  /// cursor can never pass the write cursor.
  #[inline]
  pub fn advance(&mut self) {
    let head = self.local_head;

    if head == self.cached_tail {
      self.cached_tail = self.shared.tail.load(Ordering::Relaxed);
      std::sync::atomic::fence(Ordering::Acquire);

      if head == self.cached_tail {
        return;
      }
    }

    unsafe { self.buffer.add(head & self.mask).drop_in_place() };
    self.release(head);
  }

  // Hand the slot at `head` back: value read first, fence, then cursor.
  #[inline]
  fn release(&mut self, head: usize) {
    let new_head = head.wrapping_add(1);
    std::sync::atomic::fence(Ordering::Release);

    self.shared.head.store(new_head, Ordering::Relaxed);
    self.local_head = new_head;
  }

  /// Returns the capacity of the queue.
  #[inline]
  pub fn capacity(&self) -> usize {
    self.mask + 1
  }

  /// Number of committed-but-unread elements. Approximate, monitoring only.
  #[inline]
  pub fn len(&self) -> usize {
    let tail = self.shared.tail.load(Ordering::Relaxed);
    let head = self.shared.head.load(Ordering::Relaxed);
    tail.wrapping_sub(head)
  }

  /// Returns `true` if [`len`](Self::len) is zero.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl<T> fmt::Debug for Consumer<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Consumer")
      .field("capacity", &self.capacity())
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::ring;

  #[test]
  fn fifo_within_capacity() {
    let (mut tx, mut rx) = ring::<u32>(8);

    for i in 0..8 {
      tx.push(i).unwrap();
    }
    for i in 0..8 {
      assert_eq!(rx.pop(), Some(i));
    }
    assert_eq!(rx.pop(), None);
  }

  #[test]
  fn full_queue_refuses_push() {
    let (mut tx, mut rx) = ring::<u32>(4);

    for i in 0..4 {
      tx.push(i).unwrap();
    }
    assert_eq!(tx.push(99), Err(99));
    assert_eq!(tx.len(), 4);

    // one slot freed, one push admitted again
    assert_eq!(rx.pop(), Some(0));
    tx.push(99).unwrap();
    assert_eq!(tx.push(100), Err(100));
  }

  #[test]
  fn pop_on_empty_is_none_and_stays_none() {
    let (_tx, mut rx) = ring::<u64>(4);

    for _ in 0..16 {
      assert_eq!(rx.pop(), None);
    }
  }

  #[test]
  fn peek_then_advance() {
    let (mut tx, mut rx) = ring::<&'static str>(4);

    assert!(rx.peek().is_none());
    tx.push("a").unwrap();
    tx.push("b").unwrap();

    assert_eq!(rx.peek(), Some(&"a"));
    assert_eq!(rx.peek(), Some(&"a"));
    rx.advance();
    assert_eq!(rx.peek(), Some(&"b"));
    rx.advance();
    assert!(rx.peek().is_none());
  }

  #[test]
  fn advance_on_empty_is_a_no_op() {
    use std::sync::Arc;

    let (mut tx, mut rx) = ring::<Arc<String>>(4);

    // nothing readable: must not touch a slot or move the read cursor
    rx.advance();
    rx.advance();

    tx.push(Arc::new(String::from("a"))).unwrap();
    assert_eq!(rx.len(), 1);
    assert_eq!(rx.pop().unwrap().as_str(), "a");

    rx.advance();
    assert!(rx.peek().is_none());
    assert_eq!(rx.len(), 0);

    tx.push(Arc::new(String::from("b"))).unwrap();
    assert_eq!(rx.peek().map(|v| v.as_str()), Some("b"));
    rx.advance();
    assert!(rx.pop().is_none());
  }

  #[test]
  fn push_with_fills_reserved_slot() {
    let (mut tx, mut rx) = ring::<u64>(2);

    tx.push_with(|slot| *slot = 7).unwrap();
    tx.push_with(|slot| *slot = 8).unwrap();
    assert!(tx.push_with(|slot| *slot = 9).is_err());

    assert_eq!(rx.pop(), Some(7));
    assert_eq!(rx.pop(), Some(8));
  }

  #[test]
  fn len_tracks_occupancy() {
    let (mut tx, mut rx) = ring::<u8>(8);

    assert_eq!(tx.len(), 0);
    assert!(tx.is_empty());

    for i in 0..5 {
      tx.push(i).unwrap();
    }
    assert_eq!(tx.len(), 5);
    assert_eq!(rx.len(), 5);

    rx.pop().unwrap();
    rx.pop().unwrap();
    assert_eq!(tx.len(), 3);
    assert!(!rx.is_empty());
  }

  #[test]
  fn capacity_rounds_to_power_of_two() {
    let (tx, _rx) = ring::<u8>(100);
    assert_eq!(tx.capacity(), 128);

    let (tx, _rx) = ring::<u8>(64);
    assert_eq!(tx.capacity(), 64);
  }

  #[test]
  fn undrained_values_are_dropped_with_queue() {
    use std::sync::Arc;

    let marker = Arc::new(());
    {
      let (mut tx, _rx) = ring::<Arc<()>>(4);
      tx.push(Arc::clone(&marker)).unwrap();
      tx.push(Arc::clone(&marker)).unwrap();
    }
    assert_eq!(Arc::strong_count(&marker), 1);
  }

  #[test]
  fn cross_thread_handoff_preserves_order() {
    const N: u64 = 100_000;

    let (mut tx, mut rx) = ring::<u64>(1024);

    let producer = std::thread::spawn(move || {
      for i in 0..N {
        while tx.push(i).is_err() {
          std::hint::spin_loop();
        }
      }
    });

    let mut expected = 0;
    while expected < N {
      if let Some(v) = rx.pop() {
        assert_eq!(v, expected);
        expected += 1;
      } else {
        std::hint::spin_loop();
      }
    }

    producer.join().unwrap();
    assert_eq!(rx.pop(), None);
  }
}
