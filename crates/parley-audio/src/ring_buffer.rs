//! Bounded SPSC sample queue between the capture callback and the consumer.
//!
//! The capture thread is the sole producer and must never block: when the
//! ring is full, incoming samples are dropped and counted rather than queued.

use rtrb::{Consumer, Producer, RingBuffer};

pub struct AudioRingBuffer {
    capacity: usize,
}

impl AudioRingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    pub fn split(self) -> (AudioProducer, AudioConsumer) {
        let (producer, consumer) = RingBuffer::<i16>::new(self.capacity);
        (AudioProducer { inner: producer }, AudioConsumer { inner: consumer })
    }
}

pub struct AudioProducer {
    inner: Producer<i16>,
}

impl AudioProducer {
    /// Write as many samples as fit, returning the number written.
    /// A short write means the consumer is behind; the remainder is dropped.
    pub fn write(&mut self, samples: &[i16]) -> usize {
        let n = samples.len().min(self.inner.slots());
        if n == 0 {
            return 0;
        }
        match self.inner.write_chunk_uninit(n) {
            Ok(chunk) => chunk.fill_from_iter(samples[..n].iter().copied()),
            Err(_) => 0,
        }
    }
}

pub struct AudioConsumer {
    inner: Consumer<i16>,
}

impl AudioConsumer {
    /// Drain up to `max` samples into `out` without blocking.
    pub fn read(&mut self, out: &mut Vec<i16>, max: usize) -> usize {
        let n = self.inner.slots().min(max);
        if n == 0 {
            return 0;
        }
        match self.inner.read_chunk(n) {
            Ok(chunk) => {
                out.extend(chunk);
                n
            }
            Err(_) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_preserves_order() {
        let (mut prod, mut cons) = AudioRingBuffer::new(16).split();
        assert_eq!(prod.write(&[1, 2, 3, 4]), 4);

        let mut out = Vec::new();
        assert_eq!(cons.read(&mut out, 16), 4);
        assert_eq!(out, vec![1, 2, 3, 4]);
    }

    #[test]
    fn overflow_drops_excess_samples() {
        let (mut prod, mut cons) = AudioRingBuffer::new(4).split();
        assert_eq!(prod.write(&[1, 2, 3, 4, 5, 6]), 4);

        let mut out = Vec::new();
        cons.read(&mut out, 16);
        // The oldest samples survive; the overflow was dropped at write time.
        assert_eq!(out, vec![1, 2, 3, 4]);
    }

    #[test]
    fn read_is_bounded_by_max() {
        let (mut prod, mut cons) = AudioRingBuffer::new(16).split();
        prod.write(&[7; 10]);

        let mut out = Vec::new();
        assert_eq!(cons.read(&mut out, 4), 4);
        assert_eq!(out.len(), 4);
        assert_eq!(cons.read(&mut out, 16), 6);
        assert_eq!(out.len(), 10);
    }
}
