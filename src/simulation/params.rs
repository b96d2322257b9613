//! Numerical and physical parameters for the simulation
//!
//! `Parameters` holds the runtime settings resolved from `SimulationConfig`:
//! - particle count, number of steps and fixed step size,
//! - report sampling frequency,
//! - softening and gravitational constant (`eps2`, `G`),
//! - random seed and side-channel work-group width

/// Softening squared of the reference model
pub const SOFTENING_SQUARED: f64 = 1e-14;
/// Gravitational constant of the reference model
pub const GRAVITATIONAL_CONSTANT: f64 = 6.67259e-11;
/// Seed shared by every initializer
pub const DEFAULT_SEED: u64 = 42;
/// Nominal number of extremum records in flight per work group
pub const WORK_GROUP_WIDTH: usize = 512;
/// Largest accepted work-group width
pub const MAX_WORK_GROUP_WIDTH: usize = 1 << 16;

#[allow(non_snake_case)]
#[derive(Debug, Clone)]
pub struct Parameters {
    pub n: usize, // number of particles
    pub nsteps: usize, // number of integration steps
    pub dt: f64, // step size
    pub sfreq: usize, // report every `sfreq` steps
    pub eps2: f64, // softening
    pub G: f64, // gravitational constant
    pub seed: u64, // deterministic seed
    pub width: usize, // work-group width for the extrema channel
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            n: 16000,
            nsteps: 10,
            dt: 0.1,
            sfreq: 1,
            eps2: SOFTENING_SQUARED,
            G: GRAVITATIONAL_CONSTANT,
            seed: DEFAULT_SEED,
            width: WORK_GROUP_WIDTH,
        }
    }
}
