//! Acceleration-extrema side channel
//!
//! The force pass emits one [`ExtremumRecord`] per particle into a bounded
//! [`ExtremaChannel`]. After the pass has joined, the driver drains exactly N
//! records and folds them into the run's [`GlobalExtremum`].
//!
//! Capacity is explicit. Producers block on a full channel instead of
//! dropping records, and any drain that does not see exactly N records is
//! reported as an invariant violation.

use std::fs;
use std::path::Path;

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::error::{Result, SimError};
use crate::simulation::params::MAX_WORK_GROUP_WIDTH;
use crate::simulation::states::ParticleSet;

/// Largest signed partial acceleration seen while summing one particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtremumRecord {
    pub value: f64,
    pub flag: bool,
}

/// Bounded FIFO between the force work items and the host drain.
pub struct ExtremaChannel {
    tx: Sender<ExtremumRecord>,
    rx: Receiver<ExtremumRecord>,
    capacity: usize,
}

impl ExtremaChannel {
    /// Channel sized in whole work groups of `width`, enough to hold
    /// `records_per_step` records without the drain running
    ///
    /// `width` must lie in `1..=MAX_WORK_GROUP_WIDTH`.
    pub fn new(width: usize, records_per_step: usize) -> Result<Self> {
        if width == 0 || width > MAX_WORK_GROUP_WIDTH {
            return Err(SimError::InvalidParameter(format!(
                "work-group width must be in 1..={MAX_WORK_GROUP_WIDTH}, got {width}"
            )));
        }
        let groups = records_per_step.div_ceil(width).max(1);
        let capacity = width.checked_mul(groups).ok_or_else(|| {
            SimError::InvalidParameter(format!(
                "extrema channel for {records_per_step} records of width {width} overflows"
            ))
        })?;
        Ok(Self::with_capacity(capacity))
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        Self { tx, rx, capacity }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records currently buffered
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Writer handle for the parallel producers
    pub fn producer(&self) -> ExtremaProducer {
        ExtremaProducer { tx: self.tx.clone() }
    }

    /// Take exactly `expected` records and return their maximum value
    ///
    /// Fewer buffered records is an underflow, any record left behind is an
    /// overflow. Both are fatal for the run.
    pub fn drain(&self, expected: usize) -> Result<f64> {
        let mut step_max = 0.0_f64;
        for drained in 0..expected {
            match self.rx.try_recv() {
                Ok(record) => {
                    if record.value > step_max {
                        step_max = record.value;
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {
                    return Err(SimError::ChannelUnderflow { expected, drained });
                }
            }
        }

        let extra = self.rx.len();
        if extra > 0 {
            return Err(SimError::ChannelOverflow { expected, extra });
        }
        Ok(step_max)
    }

    /// End-of-run check; anything still buffered is an overflow
    pub fn close(&self) -> Result<()> {
        let extra = self.rx.len();
        if extra > 0 {
            return Err(SimError::ChannelOverflow { expected: 0, extra });
        }
        Ok(())
    }
}

/// Cloneable, thread-safe write end of an [`ExtremaChannel`].
#[derive(Clone)]
pub struct ExtremaProducer {
    tx: Sender<ExtremumRecord>,
}

impl ExtremaProducer {
    /// Blocks while the channel is full
    pub fn write(&self, particle: usize, record: ExtremumRecord) -> Result<()> {
        self.tx
            .send(record)
            .map_err(|_| SimError::ChannelDisconnected { particle })
    }
}

/// Running max |acceleration component| over every particle and step of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GlobalExtremum {
    max: f64,
}

impl GlobalExtremum {
    pub fn new() -> Self {
        Self::default()
    }

    /// Monotone: smaller or NaN values leave it unchanged
    pub fn fold(&mut self, value: f64) {
        if value > self.max {
            self.max = value;
        }
    }

    pub fn value(&self) -> f64 {
        self.max
    }

    /// Write the value twice, one per line
    pub fn persist(&self, path: &Path) -> Result<()> {
        let text = format!("{v}\n{v}\n", v = self.max);
        fs::write(path, text).map_err(|source| SimError::OutputIo {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Host-side scan of the final accelerations: larger of max and -min over all
/// components, both starting at zero
pub fn rescan_extremum(set: &ParticleSet) -> f64 {
    let (max, min) = set
        .particles()
        .iter()
        .flat_map(|p| p.acc.iter().copied())
        .fold((0.0_f64, 0.0_f64), |(max, min), a| (max.max(a), min.min(a)));
    if -min > max { -min } else { max }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::states::{NVec3, Particle};
    use std::time::Duration;

    fn record(value: f64) -> ExtremumRecord {
        ExtremumRecord { value, flag: true }
    }

    #[test]
    fn capacity_rounds_up_to_whole_groups() {
        assert_eq!(ExtremaChannel::new(512, 1).unwrap().capacity(), 512);
        assert_eq!(ExtremaChannel::new(512, 512).unwrap().capacity(), 512);
        assert_eq!(ExtremaChannel::new(512, 513).unwrap().capacity(), 1024);
        assert_eq!(ExtremaChannel::new(512, 16000).unwrap().capacity(), 16384);
    }

    #[test]
    fn out_of_range_width_is_an_error() {
        assert!(matches!(ExtremaChannel::new(0, 4), Err(SimError::InvalidParameter(_))));
        assert!(matches!(
            ExtremaChannel::new(MAX_WORK_GROUP_WIDTH + 1, 2),
            Err(SimError::InvalidParameter(_))
        ));
        assert!(matches!(ExtremaChannel::new(usize::MAX, 2), Err(SimError::InvalidParameter(_))));
        assert!(matches!(
            ExtremaChannel::new(MAX_WORK_GROUP_WIDTH, usize::MAX),
            Err(SimError::InvalidParameter(_))
        ));
    }

    #[test]
    fn drain_exact_count_returns_max() {
        let ch = ExtremaChannel::new(4, 3).unwrap();
        let w = ch.producer();
        for (i, v) in [0.5, 2.0, 1.5].into_iter().enumerate() {
            w.write(i, record(v)).unwrap();
        }
        assert_eq!(ch.drain(3).unwrap(), 2.0);
        assert!(ch.is_empty());
    }

    #[test]
    fn draining_more_than_produced_is_underflow() {
        let ch = ExtremaChannel::new(4, 4).unwrap();
        let w = ch.producer();
        w.write(0, record(1.0)).unwrap();
        w.write(1, record(1.0)).unwrap();
        let err = ch.drain(3).unwrap_err();
        assert!(matches!(err, SimError::ChannelUnderflow { expected: 3, drained: 2 }));
    }

    #[test]
    fn draining_fewer_than_produced_is_overflow() {
        let ch = ExtremaChannel::new(4, 4).unwrap();
        let w = ch.producer();
        for i in 0..3 {
            w.write(i, record(1.0)).unwrap();
        }
        let err = ch.drain(2).unwrap_err();
        assert!(matches!(err, SimError::ChannelOverflow { expected: 2, extra: 1 }));
    }

    #[test]
    fn full_channel_blocks_producer_until_drained() {
        let ch = ExtremaChannel::with_capacity(2);
        let w = ch.producer();
        w.write(0, record(1.0)).unwrap();
        w.write(1, record(2.0)).unwrap();

        let handle = std::thread::spawn(move || w.write(2, record(3.0)));
        std::thread::sleep(Duration::from_millis(50));
        assert!(!handle.is_finished(), "producer should stall on a full channel");
        assert_eq!(ch.len(), 2);

        assert_eq!(ch.rx.recv().unwrap().value, 1.0);
        handle.join().unwrap().unwrap();
        assert_eq!(ch.drain(2).unwrap(), 3.0);
    }

    #[test]
    fn close_rejects_leftovers() {
        let ch = ExtremaChannel::new(2, 2).unwrap();
        ch.producer().write(0, record(1.0)).unwrap();
        assert!(ch.close().is_err());
        assert!(ExtremaChannel::new(2, 2).unwrap().close().is_ok());
    }

    #[test]
    fn global_extremum_is_monotone() {
        let mut g = GlobalExtremum::new();
        g.fold(2.0);
        g.fold(1.0);
        g.fold(f64::NAN);
        assert_eq!(g.value(), 2.0);
        g.fold(3.5);
        assert_eq!(g.value(), 3.5);
    }

    #[test]
    fn rescan_uses_negated_minimum() {
        let mut a = Particle::at_rest(NVec3::zeros(), 1.0);
        a.acc = NVec3::new(1.0, -4.0, 0.5);
        let mut b = Particle::at_rest(NVec3::zeros(), 1.0);
        b.acc = NVec3::new(3.0, 0.0, 0.0);
        let set = ParticleSet::from_particles(vec![a, b]);
        assert_eq!(rescan_extremum(&set), 4.0);
    }
}
