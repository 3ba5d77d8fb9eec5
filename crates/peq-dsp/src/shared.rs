//! Lock-free coefficient publication
//!
//! A [`CoefficientCell`] holds one biquad coefficient set behind a sequence
//! counter. Writers flip the counter odd, store the five words and flip it
//! even again; readers retry until they observe the same even counter before
//! and after reading. A reader therefore sees either the complete old set or
//! the complete new set, never a mix. No allocation, no locks. Each cell
//! has exactly one writer.

use portable_atomic::{AtomicU64, Ordering, fence};

use crate::biquad::BiquadCoeffs;

/// Sequence-locked biquad coefficient slot
#[derive(Debug)]
pub struct CoefficientCell {
    seq: AtomicU64,
    words: [AtomicU64; 5],
}

impl CoefficientCell {
    pub fn new(coeffs: BiquadCoeffs) -> Self {
        let words = Self::to_words(&coeffs);
        Self {
            seq: AtomicU64::new(0),
            words: words.map(AtomicU64::new),
        }
    }

    #[inline]
    fn to_words(coeffs: &BiquadCoeffs) -> [u64; 5] {
        [
            coeffs.b0.to_bits(),
            coeffs.b1.to_bits(),
            coeffs.b2.to_bits(),
            coeffs.a1.to_bits(),
            coeffs.a2.to_bits(),
        ]
    }

    #[inline]
    fn from_words(words: [u64; 5]) -> BiquadCoeffs {
        BiquadCoeffs {
            b0: f64::from_bits(words[0]),
            b1: f64::from_bits(words[1]),
            b2: f64::from_bits(words[2]),
            a1: f64::from_bits(words[3]),
            a2: f64::from_bits(words[4]),
        }
    }

    /// Replace the whole coefficient set
    ///
    /// One writer per cell. Readers spin while a store is in flight, so the
    /// writer must be the thread that also reads on the audio path, or a
    /// thread that is never preempted mid-store. A second writer is only
    /// serialized by the odd/even claim on `seq`, not made wait-free.
    pub fn store(&self, coeffs: BiquadCoeffs) {
        let mut seq = self.seq.load(Ordering::Relaxed);
        loop {
            if seq & 1 == 1 {
                std::hint::spin_loop();
                seq = self.seq.load(Ordering::Relaxed);
                continue;
            }
            match self
                .seq
                .compare_exchange_weak(seq, seq + 1, Ordering::Acquire, Ordering::Relaxed)
            {
                Ok(_) => break,
                Err(actual) => seq = actual,
            }
        }
        fence(Ordering::Release);

        for (slot, word) in self.words.iter().zip(Self::to_words(&coeffs)) {
            slot.store(word, Ordering::Relaxed);
        }

        self.seq.store(seq + 2, Ordering::Release);
    }

    /// Read a complete coefficient set
    pub fn load(&self) -> BiquadCoeffs {
        loop {
            let before = self.seq.load(Ordering::Acquire);
            if before & 1 == 0 {
                let words = [
                    self.words[0].load(Ordering::Relaxed),
                    self.words[1].load(Ordering::Relaxed),
                    self.words[2].load(Ordering::Relaxed),
                    self.words[3].load(Ordering::Relaxed),
                    self.words[4].load(Ordering::Relaxed),
                ];
                fence(Ordering::Acquire);
                if self.seq.load(Ordering::Relaxed) == before {
                    return Self::from_words(words);
                }
            }
            std::hint::spin_loop();
        }
    }

    /// Number of completed stores
    pub fn version(&self) -> u64 {
        self.seq.load(Ordering::Acquire) / 2
    }
}

impl Default for CoefficientCell {
    fn default() -> Self {
        Self::new(BiquadCoeffs::bypass())
    }
}
