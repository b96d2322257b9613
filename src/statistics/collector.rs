//! Per-step timing, throughput and energy reporting
//!
//! Throughput comes from a fixed analytic operation count rather than from
//! instruction counting. The first two sampled steps are treated as warm-up
//! and kept out of the running mean and standard deviation.

use std::fmt;
use std::time::Duration;

use crate::simulation::params::Parameters;
use crate::statistics::format::sig;

/// Sampled steps discarded before throughput statistics start
pub const WARMUP_SAMPLES: usize = 2;

/// Significant digits of every report column
const DIGITS: usize = 5;

/// Estimated GFLOP per step: 29 flops per pair plus 19 per particle
pub fn gflop_per_step(n: usize) -> f64 {
    let n = n as f64;
    1e-9 * ((11.0 + 18.0) * n * n + 19.0 * n)
}

/// One printed line of the console table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    pub step: usize,
    pub time: f64, // simulated time, step * dt
    pub kinetic: f64,
    pub elapsed: f64, // wall-clock seconds for the step
    pub gflops: f64, // instantaneous throughput
}

impl fmt::Display for StepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            " {:<8}{:<8}{:<12}{:<12}{:<12}",
            self.step,
            sig(self.time, DIGITS),
            sig(self.kinetic, DIGITS),
            sig(self.elapsed, DIGITS),
            sig(self.gflops, DIGITS),
        )
    }
}

#[derive(Debug)]
pub struct StatisticsCollector {
    sfreq: usize,
    dt: f64,
    gflop: f64, // per step
    samples: usize,
    averaged: usize, // post-warm-up samples with a finite throughput
    sum: f64,
    sum_sq: f64,
}

impl StatisticsCollector {
    pub fn new(p: &Parameters) -> Self {
        Self {
            sfreq: p.sfreq.max(1),
            dt: p.dt,
            gflop: gflop_per_step(p.n),
            samples: 0,
            averaged: 0,
            sum: 0.0,
            sum_sq: 0.0,
        }
    }

    pub fn gflop(&self) -> f64 {
        self.gflop
    }

    /// Number of sampled steps so far, warm-up included
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Record one finished step; returns the report line on sampled steps
    pub fn record(&mut self, step: usize, kinetic: f64, elapsed: Duration) -> Option<StepReport> {
        if step % self.sfreq != 0 {
            return None;
        }
        self.samples += 1;

        let elapsed = elapsed.as_secs_f64();
        let gflops = self.gflop * self.sfreq as f64 / elapsed;

        if self.samples > WARMUP_SAMPLES {
            if gflops.is_finite() {
                self.averaged += 1;
                self.sum += gflops;
                self.sum_sq += gflops * gflops;
            } else {
                log::debug!("step {step}: throughput not finite (elapsed {elapsed} s), not averaged");
            }
        }

        Some(StepReport {
            step,
            time: step as f64 * self.dt,
            kinetic,
            elapsed,
            gflops,
        })
    }

    /// Mean and standard deviation of throughput over the post-warm-up
    /// samples with a finite throughput; `None` until there is one
    pub fn mean_stddev(&self) -> Option<(f64, f64)> {
        if self.averaged == 0 {
            return None;
        }
        let k = self.averaged as f64;
        let mean = self.sum / k;
        let var = (self.sum_sq / k - mean * mean).max(0.0);
        Some((mean, var.sqrt()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(n: usize, sfreq: usize) -> Parameters {
        Parameters { n, sfreq, dt: 0.1, ..Parameters::default() }
    }

    #[test]
    fn flop_formula() {
        assert_eq!(gflop_per_step(1000), 1e-9 * (29.0 * 1e6 + 19.0 * 1e3));
        assert!((gflop_per_step(16000) - 7.424304).abs() < 1e-9);
    }

    #[test]
    fn only_sampled_steps_report() {
        let mut s = StatisticsCollector::new(&params(10, 3));
        let d = Duration::from_millis(10);
        assert!(s.record(1, 0.0, d).is_none());
        assert!(s.record(2, 0.0, d).is_none());
        let r = s.record(3, 1.5, d).unwrap();
        assert_eq!(r.step, 3);
        assert!((r.time - 0.3).abs() < 1e-12);
        assert_eq!(s.samples(), 1);
    }

    #[test]
    fn warmup_samples_are_excluded() {
        let mut s = StatisticsCollector::new(&params(1000, 1));
        let g = s.gflop();
        // warm-up steps are deliberately slow; they must not move the mean
        s.record(1, 0.0, Duration::from_secs(10));
        s.record(2, 0.0, Duration::from_secs(10));
        assert!(s.mean_stddev().is_none());

        s.record(3, 0.0, Duration::from_millis(500));
        s.record(4, 0.0, Duration::from_millis(250));
        let (mean, dev) = s.mean_stddev().unwrap();
        let (a, b) = (g / 0.5, g / 0.25);
        assert!((mean - (a + b) / 2.0).abs() < 1e-9 * mean);
        assert!((dev - (b - a) / 2.0).abs() < 1e-6 * mean);
    }

    #[test]
    fn zero_elapsed_sample_is_not_averaged() {
        let mut s = StatisticsCollector::new(&params(1000, 1));
        let g = s.gflop();
        s.record(1, 0.0, Duration::from_secs(1));
        s.record(2, 0.0, Duration::from_secs(1));

        let r = s.record(3, 0.0, Duration::ZERO).unwrap();
        assert!(!r.gflops.is_finite());
        assert!(s.mean_stddev().is_none());

        s.record(4, 0.0, Duration::from_millis(500));
        let (mean, dev) = s.mean_stddev().unwrap();
        assert!((mean - g / 0.5).abs() < 1e-9 * mean);
        assert!(dev.abs() < 1e-6 * mean);
        assert_eq!(s.samples(), 4);
    }

    #[test]
    fn report_columns_are_left_aligned() {
        let r = StepReport { step: 1, time: 0.1, kinetic: 123456.0, elapsed: 0.5, gflops: 14.848608 };
        assert_eq!(r.to_string(), " 1       0.1     1.2346e+05  0.5         14.849      ");
    }
}
