pub mod simulation;
pub mod configuration;
pub mod statistics;
pub mod benchmark;
pub mod error;

pub use simulation::states::{Particle, ParticleSet, NVec3};
pub use simulation::params::Parameters;
pub use simulation::store::ParticleStore;
pub use simulation::forces::{ForceKernel, NewtonianGravity3, reference_accelerations};
pub use simulation::integrator::{EnergyAccumulator, IntegrationKernel};
pub use simulation::extrema::{ExtremaChannel, ExtremaProducer, ExtremumRecord, GlobalExtremum};
pub use simulation::engine::{Engine, EngineState, RunSummary, StepOutcome};

pub use configuration::config::{SimulationConfig, CONFIG_ENV};

pub use statistics::collector::{StatisticsCollector, StepReport, gflop_per_step};

pub use benchmark::benchmark::bench_step_curve;

pub use error::{Result, SimError};
