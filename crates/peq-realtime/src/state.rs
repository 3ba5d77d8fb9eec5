//! Lock-Free Parameter State
//!
//! - Seven atomic parameters written by the UI or host automation
//! - Version counter plus in-flight writer count for consistent snapshots
//! - Dirty flag polled by the editor timer

use peq_core::{ChainSettings, ParamId};
use portable_atomic::{AtomicBool, AtomicF64, AtomicU32, AtomicU64, Ordering, fence};

/// Snapshot read passes before settling for the last one
const MAX_SNAPSHOT_ATTEMPTS: usize = 8;

/// Live parameter values shared between threads
#[derive(Debug)]
pub struct ParameterStore {
    values: [AtomicF64; ParamId::COUNT],
    /// Bumped after every completed write
    version: AtomicU64,
    /// Writes in progress
    writers: AtomicU32,
    changed: AtomicBool,
}

impl ParameterStore {
    /// Every parameter at its default, flagged as changed so the first
    /// editor tick draws the curve
    pub fn new() -> Self {
        Self {
            values: ParamId::ALL.map(|id| AtomicF64::new(id.range().default)),
            version: AtomicU64::new(0),
            writers: AtomicU32::new(0),
            changed: AtomicBool::new(true),
        }
    }

    pub fn from_settings(settings: &ChainSettings) -> Self {
        let store = Self::new();
        store.apply(settings);
        store
    }

    /// Clamp and snap `value` into the parameter's range, store it and mark
    /// the state dirty. Returns the stored value.
    pub fn set(&self, param: ParamId, value: f64) -> f64 {
        let value = param.range().snap(value);
        self.writers.fetch_add(1, Ordering::AcqRel);
        self.values[param.index()].store(value, Ordering::Release);
        self.version.fetch_add(1, Ordering::Release);
        self.writers.fetch_sub(1, Ordering::Release);
        self.changed.store(true, Ordering::Release);
        value
    }

    /// Host automation path: `normalized` in 0-1
    pub fn set_normalized(&self, param: ParamId, normalized: f64) -> f64 {
        self.set(param, param.range().denormalize(normalized))
    }

    #[inline]
    pub fn get(&self, param: ParamId) -> f64 {
        self.values[param.index()].load(Ordering::Acquire)
    }

    pub fn get_normalized(&self, param: ParamId) -> f64 {
        param.range().normalize(self.get(param))
    }

    /// Write every field of `settings`
    pub fn apply(&self, settings: &ChainSettings) {
        for (param, value) in ParamId::ALL.into_iter().zip(settings.to_values()) {
            self.set(param, value);
        }
    }

    pub fn reset_to_defaults(&self) {
        for param in ParamId::ALL {
            self.set(param, param.range().default);
        }
    }

    /// One read pass over all parameters that no write overlapped.
    /// Never blocks: after a bounded number of torn passes the last one is
    /// returned as is.
    pub fn snapshot(&self) -> ChainSettings {
        let mut values = [0.0; ParamId::COUNT];
        for _ in 0..MAX_SNAPSHOT_ATTEMPTS {
            let before = self.version.load(Ordering::Acquire);
            let busy = self.writers.load(Ordering::Acquire) != 0;
            self.read_values(&mut values);
            fence(Ordering::Acquire);
            let quiet = self.writers.load(Ordering::Relaxed) == 0;
            if !busy && quiet && self.version.load(Ordering::Relaxed) == before {
                return ChainSettings::from_values(&values);
            }
            std::hint::spin_loop();
        }
        ChainSettings::from_values(&values)
    }

    fn read_values(&self, out: &mut [f64; ParamId::COUNT]) {
        for (slot, value) in out.iter_mut().zip(&self.values) {
            *slot = value.load(Ordering::Acquire);
        }
    }

    /// Completed writes since construction
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Test-and-clear of the dirty flag
    pub fn take_changed(&self) -> bool {
        self.changed.swap(false, Ordering::AcqRel)
    }

    /// Peek at the dirty flag without clearing it
    pub fn is_changed(&self) -> bool {
        self.changed.load(Ordering::Acquire)
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}
