//! Lock-Free Ring Buffer for Hook Delivery
//!
//! SPSC (Single Producer, Single Consumer) ring buffer that decouples the
//! hook service's callback thread from timeline mutation.
//!
//! Architecture:
//! - Producer (hook callback thread): never blocks, pushes raw events as
//!   the OS delivers them
//! - Consumer (session drain thread): pops batches, runs the normalizer,
//!   appends to the timeline
//!
//! The design uses the `rtrb` crate for the core ring buffer implementation.
//! If the buffer fills (the drain thread has stalled), events are dropped
//! and counted rather than blocking the hook callback.

use rtrb::{Consumer, Producer, RingBuffer};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::raw::RawHookEvent;

/// Default ring buffer capacity (must be power of 2)
pub const DEFAULT_CAPACITY: usize = 4096;

/// Ring buffer statistics for monitoring
#[derive(Debug, Default)]
pub struct HookBufferStats {
    /// Total events pushed
    pub events_pushed: AtomicU64,
    /// Events dropped due to full buffer
    pub events_dropped: AtomicU64,
    /// Events successfully consumed
    pub events_consumed: AtomicU64,
}

/// Lock-free buffer connecting the hook service (producer) to the
/// session drain thread (consumer).
pub struct HookEventBuffer {
    producer: Producer<RawHookEvent>,
    consumer: Consumer<RawHookEvent>,
    stats: Arc<HookBufferStats>,
}

impl HookEventBuffer {
    /// Create a new ring buffer with default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a new ring buffer with specified capacity
    ///
    /// # Panics
    /// Panics if capacity is not a power of 2
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(
            capacity.is_power_of_two(),
            "Ring buffer capacity must be a power of 2"
        );

        let (producer, consumer) = RingBuffer::new(capacity);

        Self {
            producer,
            consumer,
            stats: Arc::new(HookBufferStats::default()),
        }
    }

    /// Split into producer and consumer halves.
    ///
    /// The producer goes to the hook service; the consumer to the drain
    /// thread.
    pub fn split(self) -> (HookEventProducer, HookEventConsumer) {
        (
            HookEventProducer {
                inner: self.producer,
                stats: Arc::clone(&self.stats),
            },
            HookEventConsumer {
                inner: self.consumer,
                stats: self.stats,
            },
        )
    }
}

impl Default for HookEventBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer half of the ring buffer (for the hook callback thread)
pub struct HookEventProducer {
    inner: Producer<RawHookEvent>,
    stats: Arc<HookBufferStats>,
}

impl HookEventProducer {
    /// Push a raw event into the ring buffer.
    ///
    /// Lock-free and never blocks. If the buffer is full the event is
    /// dropped and the drop counter is incremented.
    ///
    /// Returns true if the event was successfully pushed, false if dropped.
    #[inline]
    pub fn push(&mut self, event: RawHookEvent) -> bool {
        match self.inner.push(event) {
            Ok(()) => {
                self.stats.events_pushed.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(_) => {
                self.stats.events_dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Check if the buffer is full
    #[inline]
    pub fn is_full(&self) -> bool {
        self.inner.is_full()
    }

    /// Shared statistics handle
    pub fn stats(&self) -> Arc<HookBufferStats> {
        Arc::clone(&self.stats)
    }
}

/// Consumer half of the ring buffer (for the session drain thread)
pub struct HookEventConsumer {
    inner: Consumer<RawHookEvent>,
    stats: Arc<HookBufferStats>,
}

impl HookEventConsumer {
    /// Pop a single raw event, if one is available.
    #[inline]
    pub fn pop(&mut self) -> Option<RawHookEvent> {
        match self.inner.pop() {
            Ok(event) => {
                self.stats.events_consumed.fetch_add(1, Ordering::Relaxed);
                Some(event)
            }
            Err(_) => None,
        }
    }

    /// Check if there are events available
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Pop up to `max_count` events at once (batch processing)
    pub fn pop_batch(&mut self, max_count: usize) -> Vec<RawHookEvent> {
        let mut batch = Vec::with_capacity(max_count.min(64));
        for _ in 0..max_count {
            match self.pop() {
                Some(event) => batch.push(event),
                None => break,
            }
        }
        batch
    }

    /// Shared statistics handle
    pub fn stats(&self) -> Arc<HookBufferStats> {
        Arc::clone(&self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::raw::{MouseButton, RawKey};

    fn key_event(c: char, pressed: bool) -> RawHookEvent {
        RawHookEvent::Key {
            key: RawKey::Char(c),
            pressed,
        }
    }

    #[test]
    fn test_push_and_pop() {
        let (mut producer, mut consumer) = HookEventBuffer::with_capacity(16).split();

        assert!(producer.push(key_event('a', true)));
        assert!(producer.push(key_event('a', false)));

        assert_eq!(consumer.pop(), Some(key_event('a', true)));
        assert_eq!(consumer.pop(), Some(key_event('a', false)));
        assert_eq!(consumer.pop(), None);
    }

    #[test]
    fn test_fifo_ordering() {
        let (mut producer, mut consumer) = HookEventBuffer::with_capacity(16).split();

        for c in ['a', 'b', 'c', 'd'] {
            producer.push(key_event(c, true));
        }

        for c in ['a', 'b', 'c', 'd'] {
            assert_eq!(consumer.pop(), Some(key_event(c, true)));
        }
    }

    #[test]
    fn test_full_buffer_drops_events() {
        let (mut producer, consumer) = HookEventBuffer::with_capacity(2).split();

        assert!(producer.push(key_event('a', true)));
        assert!(producer.push(key_event('b', true)));
        assert!(producer.is_full());

        // Third push is dropped, not blocked
        assert!(!producer.push(key_event('c', true)));

        let stats = consumer.stats();
        assert_eq!(stats.events_pushed.load(Ordering::Relaxed), 2);
        assert_eq!(stats.events_dropped.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_pop_batch() {
        let (mut producer, mut consumer) = HookEventBuffer::with_capacity(16).split();

        for i in 0..10 {
            producer.push(RawHookEvent::Mouse {
                button: MouseButton::Left,
                x: i as f64,
                y: 0.0,
                pressed: true,
            });
        }

        let batch = consumer.pop_batch(4);
        assert_eq!(batch.len(), 4);

        let rest = consumer.pop_batch(100);
        assert_eq!(rest.len(), 6);
        assert!(consumer.is_empty());
    }

    #[test]
    fn test_stats_track_consumption() {
        let (mut producer, mut consumer) = HookEventBuffer::with_capacity(16).split();

        producer.push(key_event('x', true));
        producer.push(key_event('x', false));
        consumer.pop_batch(10);

        let stats = consumer.stats();
        assert_eq!(stats.events_consumed.load(Ordering::Relaxed), 2);
    }

    #[test]
    #[should_panic(expected = "power of 2")]
    fn test_non_power_of_two_capacity_panics() {
        HookEventBuffer::with_capacity(1000);
    }

    #[test]
    fn test_cross_thread_delivery() {
        let (mut producer, mut consumer) = HookEventBuffer::with_capacity(64).split();

        let handle = std::thread::spawn(move || {
            for i in 0..50 {
                producer.push(RawHookEvent::Mouse {
                    button: MouseButton::Right,
                    x: i as f64,
                    y: i as f64,
                    pressed: i % 2 == 0,
                });
            }
        });

        handle.join().unwrap();

        let mut count = 0;
        while consumer.pop().is_some() {
            count += 1;
        }
        assert_eq!(count, 50);
    }
}
