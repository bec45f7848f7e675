//! Fixed-capacity byte ring used to stage inbound connection data.
//!
//! The ring never grows. When it is full, new bytes are dropped and
//! reported; bytes already held are never overwritten. Removing from an
//! empty ring is a caller error and fails with [`RingError::Underflow`].

use std::fmt;
use tracing::warn;

/// Outcome of a single [`RingBuffer::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Push {
    /// Byte was appended at the tail.
    Stored,
    /// Ring was full, byte was discarded.
    Dropped,
}

/// Errors raised by ring operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingError {
    /// `pop` was called on an empty ring.
    Underflow,
    /// A ring cannot be created with this capacity.
    InvalidCapacity {
        capacity: usize,
        reason: &'static str,
    },
}

impl fmt::Display for RingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RingError::Underflow => write!(f, "Buffer underflow"),
            RingError::InvalidCapacity { capacity, reason } => {
                write!(f, "Invalid capacity {capacity}: {reason}")
            }
        }
    }
}

impl std::error::Error for RingError {}

/// Circular FIFO over a fixed-length byte array.
///
/// `tail` is always `(head + count) % capacity`; slots outside the
/// `[head, head + count)` window hold stale bytes.
#[derive(Debug)]
pub struct RingBuffer {
    storage: Vec<u8>,
    head: usize,
    tail: usize,
    count: usize,
    /// Bytes discarded by overflow since creation.
    dropped: u64,
}

impl RingBuffer {
    /// Create an empty ring holding at most `capacity` bytes.
    pub fn new(capacity: usize) -> Result<Self, RingError> {
        if capacity == 0 {
            return Err(RingError::InvalidCapacity {
                capacity,
                reason: "capacity must be greater than zero",
            });
        }

        Ok(Self {
            storage: vec![0u8; capacity],
            head: 0,
            tail: 0,
            count: 0,
            dropped: 0,
        })
    }

    /// Append one byte, or drop it if the ring is full.
    pub fn push(&mut self, byte: u8) -> Push {
        if self.is_full() {
            self.dropped += 1;
            warn!(capacity = self.capacity(), byte, "Buffer overflow");
            return Push::Dropped;
        }

        self.storage[self.tail] = byte;
        self.tail = (self.tail + 1) % self.capacity();
        self.count += 1;
        Push::Stored
    }

    /// Remove and return the oldest byte.
    pub fn pop(&mut self) -> Result<u8, RingError> {
        if self.is_empty() {
            return Err(RingError::Underflow);
        }

        let byte = self.storage[self.head];
        self.head = (self.head + 1) % self.capacity();
        self.count -= 1;
        Ok(byte)
    }

    /// Push every byte of `data` in order.
    ///
    /// Returns how many bytes were stored. Overflow on one byte does not
    /// stop the remaining ones from being offered.
    pub fn extend(&mut self, data: &[u8]) -> usize {
        data.iter()
            .filter(|&&byte| self.push(byte) == Push::Stored)
            .count()
    }

    /// Number of bytes currently held.
    pub fn size(&self) -> usize {
        self.count
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count == self.capacity()
    }

    /// Total bytes discarded because the ring was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut ring = RingBuffer::new(8).unwrap();

        for byte in b"abcde" {
            assert_eq!(ring.push(*byte), Push::Stored);
        }
        assert_eq!(ring.size(), 5);

        let drained: Vec<u8> = (0..5).map(|_| ring.pop().unwrap()).collect();
        assert_eq!(drained, b"abcde");
        assert_eq!(ring.size(), 0);
    }

    #[test]
    fn test_overflow_drops_newest() {
        let mut ring = RingBuffer::new(3).unwrap();
        assert_eq!(ring.extend(b"xyz"), 3);
        assert!(ring.is_full());

        assert_eq!(ring.push(b'!'), Push::Dropped);
        assert_eq!(ring.size(), 3);
        assert_eq!(ring.dropped(), 1);

        // Existing contents are untouched
        assert_eq!(ring.pop(), Ok(b'x'));
        assert_eq!(ring.pop(), Ok(b'y'));
        assert_eq!(ring.pop(), Ok(b'z'));
        assert_eq!(ring.pop(), Err(RingError::Underflow));
    }

    #[test]
    fn test_extend_continues_past_overflow() {
        let mut ring = RingBuffer::new(4).unwrap();

        let stored = ring.extend(b"0123456789");
        assert_eq!(stored, 4);
        assert_eq!(ring.size(), 4);
        assert_eq!(ring.dropped(), 6);
    }

    #[test]
    fn test_underflow_on_empty() {
        let mut ring = RingBuffer::new(2).unwrap();
        assert_eq!(ring.pop(), Err(RingError::Underflow));

        ring.push(1);
        assert_eq!(ring.pop(), Ok(1));
        assert_eq!(ring.pop(), Err(RingError::Underflow));
        assert_eq!(ring.size(), 0);
    }

    #[test]
    fn test_wraparound() {
        let mut ring = RingBuffer::new(4).unwrap();

        ring.extend(b"abc");
        assert_eq!(ring.pop(), Ok(b'a'));
        assert_eq!(ring.pop(), Ok(b'b'));

        // Tail wraps past the end of storage
        assert_eq!(ring.extend(b"def"), 3);
        assert!(ring.is_full());
        assert_eq!(ring.push(b'g'), Push::Dropped);

        let drained: Vec<u8> = (0..4).map(|_| ring.pop().unwrap()).collect();
        assert_eq!(drained, b"cdef");
        assert!(ring.is_empty());
    }

    #[test]
    fn test_round_trip_restores_empty() {
        let mut ring = RingBuffer::new(16).unwrap();
        let data = b"Hello from client!"[..16].to_vec();

        assert_eq!(ring.extend(&data), data.len());
        let out: Vec<u8> = (0..data.len()).map(|_| ring.pop().unwrap()).collect();

        assert_eq!(out, data);
        assert_eq!(ring.size(), 0);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = RingBuffer::new(0).unwrap_err();
        assert!(matches!(err, RingError::InvalidCapacity { capacity: 0, .. }));
    }
}
