//! Step driver for one simulation run
//!
//! Owns the particle set, both kernels, the extrema channel and the run's
//! global extremum. Lifecycle:
//! `Uninitialized -> Initialized -> Running(1..=nsteps) -> Finalized`.
//!
//! Each step is force pass (join), drift pass (join), kinetic energy and
//! reset, timing, the exact-N drain of the extrema channel, then the report.
//! A failed drain leaves the state at the last completed step.

use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::error::{Result, SimError};
use crate::simulation::extrema::{rescan_extremum, ExtremaChannel, ExtremaProducer, GlobalExtremum};
use crate::simulation::forces::ForceKernel;
use crate::simulation::integrator::{EnergyAccumulator, IntegrationKernel};
use crate::simulation::params::Parameters;
use crate::simulation::states::ParticleSet;
use crate::simulation::store::ParticleStore;
use crate::statistics::collector::{StatisticsCollector, StepReport};
use crate::statistics::format::sig;

const RULE: &str = "------------------------------------------------";
const BANNER: &str = "===============================";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Initialized,
    Running { step: usize }, // last completed step
    Finalized,
}

impl EngineState {
    fn name(self) -> &'static str {
        match self {
            EngineState::Uninitialized => "uninitialized",
            EngineState::Initialized => "initialized",
            EngineState::Running { .. } => "running",
            EngineState::Finalized => "finalized",
        }
    }
}

/// What one call to [`Engine::step`] produced
#[derive(Debug, Clone, Copy)]
pub struct StepOutcome {
    pub step: usize,
    pub kinetic: f64,
    pub elapsed: Duration,
    pub step_extremum: f64, // max over the drained records
    pub report: Option<StepReport>, // set on sampled steps
}

/// End-of-run figures
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    pub steps: usize,
    pub total_time: Duration,
    pub total_gflop: f64,
    pub throughput: Option<(f64, f64)>, // mean, stddev after warm-up
    pub extremum: f64,
    pub kinetic: f64, // last step
}

pub struct Engine {
    params: Parameters,
    state: EngineState,
    set: ParticleSet,
    force: ForceKernel,
    integrate: IntegrationKernel,
    energy: EnergyAccumulator,
    channel: ExtremaChannel,
    producer: ExtremaProducer,
    stats: StatisticsCollector,
    extremum: GlobalExtremum,
    kinetic: f64,
    elapsed: Duration, // sum of step times
}

impl Engine {
    pub fn new(params: Parameters) -> Result<Self> {
        if params.n == 0 {
            return Err(SimError::InvalidParameter("at least one particle is required".into()));
        }
        let channel = ExtremaChannel::new(params.width, params.n)?;
        // the drain runs after the join, so a whole step must fit
        if channel.capacity() < params.n {
            return Err(SimError::ChannelTooSmall {
                capacity: channel.capacity(),
                records: params.n,
            });
        }
        let producer = channel.producer();

        Ok(Self {
            force: ForceKernel::new(&params),
            integrate: IntegrationKernel::new(params.dt),
            energy: EnergyAccumulator::new(),
            stats: StatisticsCollector::new(&params),
            set: ParticleSet::with_len(params.n),
            state: EngineState::Uninitialized,
            extremum: GlobalExtremum::new(),
            kinetic: 0.0,
            elapsed: Duration::ZERO,
            channel,
            producer,
            params,
        })
    }

    /// Engine over an already-built set; `params.n` follows the set length
    pub fn with_particles(mut params: Parameters, set: ParticleSet) -> Result<Self> {
        params.n = set.len();
        let mut engine = Self::new(params)?;
        engine.set = set;
        engine.state = EngineState::Initialized;
        Ok(engine)
    }

    /// Seeded initialization; returns how many positions came from `seed_file`
    pub fn initialize(&mut self, seed_file: Option<&Path>) -> Result<usize> {
        if self.state != EngineState::Uninitialized {
            return Err(self.invalid("initialize"));
        }
        let mut store = ParticleStore::new(self.params.n, self.params.seed);
        let overridden = store.initialize(seed_file);
        self.set = store.into_set();
        self.state = EngineState::Initialized;
        Ok(overridden)
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    pub fn particles(&self) -> &ParticleSet {
        &self.set
    }

    pub fn extremum(&self) -> f64 {
        self.extremum.value()
    }

    /// Advance one step. Any kernel or channel failure ends the run.
    pub fn step(&mut self) -> Result<StepOutcome> {
        let step = match self.state {
            EngineState::Initialized => 1,
            EngineState::Running { step } if step < self.params.nsteps => step + 1,
            _ => return Err(self.invalid("step")),
        };
        let n = self.set.len();

        let ts0 = Instant::now();
        self.force.dispatch(&mut self.set, &self.producer)?;
        self.integrate.dispatch(&mut self.set, &mut self.energy);
        self.kinetic = self.energy.take_kinetic();
        let elapsed = ts0.elapsed();
        self.elapsed += elapsed;

        // the step only counts once all n records are accounted for
        let step_extremum = self.channel.drain(n)?;
        self.state = EngineState::Running { step };
        let report = self.stats.record(step, self.kinetic, elapsed);
        self.extremum.fold(step_extremum);

        // every record already covers its particle's final components
        let rescan = rescan_extremum(&self.set);
        if rescan > step_extremum {
            log::warn!("step {step}: acceleration re-scan {rescan} exceeds drained extremum {step_extremum}");
        }
        self.extremum.fold(rescan);
        log::debug!("step {step}: drained {n} records, step max {step_extremum}, global {}", self.extremum.value());

        Ok(StepOutcome {
            step,
            kinetic: self.kinetic,
            elapsed,
            step_extremum,
            report,
        })
    }

    /// Close the channel and persist the global extremum to `output`
    pub fn finalize(&mut self, output: &Path) -> Result<RunSummary> {
        let steps = match self.state {
            EngineState::Running { step } => step,
            EngineState::Initialized => 0,
            _ => return Err(self.invalid("finalize")),
        };
        self.channel.close()?;
        self.extremum.persist(output)?;
        self.state = EngineState::Finalized;
        log::info!("wrote final extremum {} to {}", self.extremum.value(), output.display());

        Ok(RunSummary {
            steps,
            total_time: self.elapsed,
            total_gflop: self.stats.gflop() * steps as f64,
            throughput: self.stats.mean_stddev(),
            extremum: self.extremum.value(),
            kinetic: self.kinetic,
        })
    }

    /// Every remaining step with console reporting, then finalize
    pub fn run<W: Write>(&mut self, out: &mut W, output: &Path) -> Result<RunSummary> {
        if self.state != EngineState::Initialized {
            return Err(self.invalid("run"));
        }
        log::info!("starting run: {} particles, {} steps", self.params.n, self.params.nsteps);
        write_header(out, &self.params)?;

        let t0 = Instant::now();
        for _ in 0..self.params.nsteps {
            let outcome = self.step()?;
            if let Some(report) = outcome.report {
                writeln!(out, "{report}")?;
            }
        }
        let total = t0.elapsed();

        let mut summary = self.finalize(output)?;
        summary.total_time = total;
        write_footer(out, &summary)?;
        Ok(summary)
    }

    fn invalid(&self, action: &'static str) -> SimError {
        SimError::InvalidState {
            state: self.state.name(),
            action,
        }
    }
}

pub fn write_header<W: Write>(out: &mut W, p: &Parameters) -> Result<()> {
    writeln!(out, "{BANNER}")?;
    writeln!(out, " Initialize Gravity Simulation")?;
    writeln!(out, " nPart = {}; nSteps = {}; dt = {}", p.n, p.nsteps, sig(p.dt, 6))?;
    writeln!(out, "{RULE}")?;
    writeln!(out, " {:<8}{:<8}{:<12}{:<12}{:<12}", "s", "dt", "kenergy", "time (s)", "GFLOPS")?;
    writeln!(out, "{RULE}")?;
    Ok(())
}

pub fn write_footer<W: Write>(out: &mut W, s: &RunSummary) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "# Total Time (s)     : {}", sig(s.total_time.as_secs_f64(), 6))?;
    match s.throughput {
        Some((mean, dev)) => writeln!(out, "# Average Performance : {} +- {}", sig(mean, 6), sig(dev, 6))?,
        None => writeln!(out, "# Average Performance : n/a (needs more than 2 sampled steps)")?,
    }
    writeln!(out, "{BANNER}")?;
    Ok(())
}
