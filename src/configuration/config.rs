//! Configuration types for loading a simulation run from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! run. Every field is optional and falls back to the model defaults, so an
//! empty file (or no file at all) reproduces the reference run.
//!
//! # YAML format
//! An example run matching these types:
//!
//! ```yaml
//! particles: 16000              # number of particles N
//! steps: 10                     # number of integration steps
//! dt: 0.1                       # fixed step size
//! sample_frequency: 1           # print a report line every k steps
//! softening_squared: 1.0e-14    # softening epsilon^2
//! gravitational_constant: 6.67259e-11
//! seed: 42                      # seed for every initializer
//! work_group_width: 512         # extrema records in flight per group
//! output: exec_fpga_info.txt    # two-line extremum artifact
//! ```
//!
//! The file is located through the [`CONFIG_ENV`] environment variable; the
//! command line itself only carries the optional seed-file path.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, SimError};
use crate::simulation::params::{
    Parameters, DEFAULT_SEED, GRAVITATIONAL_CONSTANT, MAX_WORK_GROUP_WIDTH, SOFTENING_SQUARED,
    WORK_GROUP_WIDTH,
};

/// Environment variable naming an optional YAML run configuration
pub const CONFIG_ENV: &str = "GSIM_CONFIG";

/// Default name of the two-line extremum artifact
pub const DEFAULT_OUTPUT: &str = "exec_fpga_info.txt";

/// Top-level run configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub particles: usize, // number of particles
    pub steps: usize, // number of integration steps
    pub dt: f64, // fixed time step
    pub sample_frequency: usize, // report every k steps
    pub softening_squared: f64, // keeps close encounters finite
    pub gravitational_constant: f64,
    pub seed: u64, // deterministic seed to make runs reproducible
    pub work_group_width: usize, // nominal in-flight width of the extrema channel
    pub output: PathBuf, // where the final extremum is persisted
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            particles: 16000,
            steps: 10,
            dt: 0.1,
            sample_frequency: 1,
            softening_squared: SOFTENING_SQUARED,
            gravitational_constant: GRAVITATIONAL_CONSTANT,
            seed: DEFAULT_SEED,
            work_group_width: WORK_GROUP_WIDTH,
            output: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}

impl SimulationConfig {
    /// Parse a YAML document, then validate it
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        // an empty document deserializes to unit, not to an empty mapping
        let cfg: SimulationConfig = if s.trim().is_empty() {
            SimulationConfig::default()
        } else {
            serde_yaml::from_str(s)?
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| SimError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Load from the file named by [`CONFIG_ENV`], or use defaults when unset
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_yaml_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.particles == 0 {
            return Err(SimError::InvalidParameter("particles must be at least 1".into()));
        }
        if self.steps == 0 {
            return Err(SimError::InvalidParameter("steps must be at least 1".into()));
        }
        if self.sample_frequency == 0 {
            return Err(SimError::InvalidParameter("sample_frequency must be at least 1".into()));
        }
        if self.work_group_width == 0 || self.work_group_width > MAX_WORK_GROUP_WIDTH {
            return Err(SimError::InvalidParameter(format!(
                "work_group_width must be in 1..={MAX_WORK_GROUP_WIDTH}, got {}",
                self.work_group_width
            )));
        }
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(SimError::InvalidParameter(format!("dt must be positive, got {}", self.dt)));
        }
        if !self.softening_squared.is_finite() || self.softening_squared < 0.0 {
            return Err(SimError::InvalidParameter(format!(
                "softening_squared must be non-negative, got {}",
                self.softening_squared
            )));
        }
        if !self.gravitational_constant.is_finite() {
            return Err(SimError::InvalidParameter("gravitational_constant must be finite".into()));
        }
        Ok(())
    }

    /// Map the configuration onto the runtime parameter bundle
    pub fn parameters(&self) -> Parameters {
        Parameters {
            n: self.particles,
            nsteps: self.steps,
            dt: self.dt,
            sfreq: self.sample_frequency,
            eps2: self.softening_squared,
            G: self.gravitational_constant,
            seed: self.seed,
            width: self.work_group_width,
        }
    }
}
