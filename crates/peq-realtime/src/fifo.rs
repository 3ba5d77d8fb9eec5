//! Block FIFO from the audio thread to the editor
//!
//! SPSC ring of fixed-size sample blocks on top of `rtrb`. The producer never
//! overwrites unread data: a push into a full ring is dropped and counted.

use peq_core::{PeqError, PeqResult, Sample};
use peq_viz::BlockSource;
use portable_atomic::{AtomicU64, Ordering};
use rtrb::{Consumer, Producer, RingBuffer};
use std::sync::Arc;

/// Blocks held before pushes start failing
pub const DEFAULT_CAPACITY_BLOCKS: usize = 32;

/// Constructor for a producer/consumer pair
#[derive(Debug, Clone, Copy)]
pub struct BlockFifo;

impl BlockFifo {
    /// Allocate room for `capacity_blocks` blocks of `block_size` samples
    pub fn prepare(
        block_size: usize,
        capacity_blocks: usize,
    ) -> PeqResult<(BlockProducer, BlockConsumer)> {
        if block_size == 0 {
            return Err(PeqError::InvalidBlockSize(block_size));
        }
        if capacity_blocks == 0 {
            return Err(PeqError::InvalidConfig("FIFO needs at least one block".into()));
        }

        let (producer, consumer) = RingBuffer::new(block_size * capacity_blocks);
        let dropped = Arc::new(AtomicU64::new(0));
        Ok((
            BlockProducer {
                producer,
                block_size,
                capacity_blocks,
                dropped: Arc::clone(&dropped),
            },
            BlockConsumer {
                consumer,
                block_size,
                dropped,
            },
        ))
    }
}

/// Audio-thread side
#[derive(Debug)]
pub struct BlockProducer {
    producer: Producer<Sample>,
    block_size: usize,
    capacity_blocks: usize,
    dropped: Arc<AtomicU64>,
}

impl BlockProducer {
    /// Copy one block in. Fails (and counts a drop) when the ring is full or
    /// `block` has the wrong length. Never blocks or allocates.
    pub fn push(&mut self, block: &[Sample]) -> bool {
        if block.len() != self.block_size {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        match self.producer.write_chunk_uninit(self.block_size) {
            Ok(chunk) => {
                chunk.fill_from_iter(block.iter().copied());
                true
            }
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Complete blocks waiting to be read
    pub fn available_count(&self) -> usize {
        self.capacity_blocks - self.free_count()
    }

    /// Blocks that can still be pushed
    pub fn free_count(&self) -> usize {
        self.producer.slots() / self.block_size
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn capacity_blocks(&self) -> usize {
        self.capacity_blocks
    }

    pub fn dropped_blocks(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Editor side
#[derive(Debug)]
pub struct BlockConsumer {
    consumer: Consumer<Sample>,
    block_size: usize,
    dropped: Arc<AtomicU64>,
}

impl BlockConsumer {
    /// Copy the oldest unread block into `out`
    pub fn pop(&mut self, out: &mut [Sample]) -> bool {
        if out.len() != self.block_size {
            return false;
        }
        let Ok(chunk) = self.consumer.read_chunk(self.block_size) else {
            return false;
        };
        let (first, second) = chunk.as_slices();
        out[..first.len()].copy_from_slice(first);
        out[first.len()..].copy_from_slice(second);
        chunk.commit_all();
        true
    }

    /// Complete blocks waiting to be read
    pub fn available_count(&self) -> usize {
        self.consumer.slots() / self.block_size
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn dropped_blocks(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl BlockSource for BlockConsumer {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn pop_block(&mut self, out: &mut [Sample]) -> bool {
        self.pop(out)
    }
}

/// Packs host buffers of any length into fixed blocks for one channel
#[derive(Debug, Default)]
pub struct ChannelSampleFifo {
    producer: Option<BlockProducer>,
    block: Vec<Sample>,
    filled: usize,
}

impl ChannelSampleFifo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the ring and the staging block; returns the reading side
    pub fn prepare(&mut self, block_size: usize, capacity_blocks: usize) -> PeqResult<BlockConsumer> {
        let (producer, consumer) = BlockFifo::prepare(block_size, capacity_blocks)?;
        self.producer = Some(producer);
        self.block = vec![0.0; block_size];
        self.filled = 0;
        Ok(consumer)
    }

    /// Append samples, pushing every block that fills up. No-op until prepared.
    pub fn update(&mut self, samples: &[Sample]) {
        let Some(producer) = self.producer.as_mut() else {
            return;
        };
        let mut remaining = samples;
        while !remaining.is_empty() {
            let take = remaining.len().min(self.block.len() - self.filled);
            self.block[self.filled..self.filled + take].copy_from_slice(&remaining[..take]);
            self.filled += take;
            remaining = &remaining[take..];

            if self.filled == self.block.len() {
                producer.push(&self.block);
                self.filled = 0;
            }
        }
    }

    pub fn is_prepared(&self) -> bool {
        self.producer.is_some()
    }

    pub fn block_size(&self) -> usize {
        self.block.len()
    }

    pub fn available_count(&self) -> usize {
        self.producer.as_ref().map_or(0, BlockProducer::available_count)
    }

    pub fn dropped_blocks(&self) -> u64 {
        self.producer.as_ref().map_or(0, BlockProducer::dropped_blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(start: f64, len: usize) -> Vec<Sample> {
        (0..len).map(|i| start + i as f64).collect()
    }

    #[test]
    fn test_prepare_rejects_bad_sizes() {
        assert_eq!(
            BlockFifo::prepare(0, 4).unwrap_err(),
            PeqError::InvalidBlockSize(0)
        );
        assert!(BlockFifo::prepare(64, 0).is_err());
    }

    #[test]
    fn test_order_preserved() {
        let (mut producer, mut consumer) = BlockFifo::prepare(4, 8).unwrap();
        for b in 0..5 {
            assert!(producer.push(&block(b as f64 * 10.0, 4)));
        }
        assert_eq!(producer.available_count(), 5);
        assert_eq!(consumer.available_count(), 5);

        let mut out = [0.0; 4];
        for b in 0..5 {
            assert!(consumer.pop(&mut out));
            assert_eq!(out.to_vec(), block(b as f64 * 10.0, 4));
        }
        assert!(!consumer.pop(&mut out));
    }

    #[test]
    fn test_full_push_fails_without_corruption() {
        let (mut producer, mut consumer) = BlockFifo::prepare(3, 2).unwrap();
        assert!(producer.push(&[1.0, 2.0, 3.0]));
        assert!(producer.push(&[4.0, 5.0, 6.0]));
        assert!(!producer.push(&[7.0, 8.0, 9.0]));
        assert_eq!(producer.dropped_blocks(), 1);
        assert_eq!(consumer.dropped_blocks(), 1);

        let mut out = [0.0; 3];
        assert!(consumer.pop(&mut out));
        assert_eq!(out, [1.0, 2.0, 3.0]);
        assert!(consumer.pop(&mut out));
        assert_eq!(out, [4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_wrap_around() {
        let (mut producer, mut consumer) = BlockFifo::prepare(4, 3).unwrap();
        let mut out = [0.0; 4];
        for b in 0..20 {
            assert!(producer.push(&block(b as f64, 4)));
            assert!(consumer.pop(&mut out));
            assert_eq!(out.to_vec(), block(b as f64, 4));
        }
        assert_eq!(producer.dropped_blocks(), 0);
    }

    #[test]
    fn test_wrong_length_is_rejected() {
        let (mut producer, mut consumer) = BlockFifo::prepare(4, 2).unwrap();
        assert!(!producer.push(&[1.0, 2.0]));
        assert_eq!(producer.dropped_blocks(), 1);
        assert_eq!(consumer.available_count(), 0);
        let mut short = [0.0; 2];
        assert!(!consumer.pop(&mut short));
    }

    #[test]
    fn test_channel_fifo_accumulates() {
        let mut fifo = ChannelSampleFifo::new();
        fifo.update(&[1.0; 100]);
        assert!(!fifo.is_prepared());

        let mut consumer = fifo.prepare(8, 4).unwrap();
        assert_eq!(fifo.block_size(), 8);
        fifo.update(&block(0.0, 5));
        assert_eq!(consumer.available_count(), 0);
        fifo.update(&block(5.0, 13));
        assert_eq!(consumer.available_count(), 2);

        let mut out = [0.0; 8];
        assert!(consumer.pop(&mut out));
        assert_eq!(out.to_vec(), block(0.0, 8));
        assert!(consumer.pop(&mut out));
        assert_eq!(out.to_vec(), block(8.0, 8));
    }

    #[test]
    fn test_threaded_stream() {
        let (mut producer, mut consumer) = BlockFifo::prepare(16, 4).unwrap();
        let writer = std::thread::spawn(move || {
            let mut pushed = 0u64;
            let mut next = 0.0;
            while pushed < 500 {
                if producer.push(&block(next, 16)) {
                    next += 16.0;
                    pushed += 1;
                } else {
                    std::thread::yield_now();
                }
            }
        });

        let mut expected = 0.0;
        let mut out = [0.0; 16];
        let mut popped = 0;
        while popped < 500 {
            if consumer.pop(&mut out) {
                assert_eq!(out[0], expected);
                assert_eq!(out[15], expected + 15.0);
                expected += 16.0;
                popped += 1;
            } else {
                std::thread::yield_now();
            }
        }
        writer.join().unwrap();
    }
}
