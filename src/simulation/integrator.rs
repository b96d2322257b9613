//! Position update and kinetic-energy accumulation
//!
//! Runs after the force pass has joined. Velocities already carry this step's
//! kick, so the pass is a single drift `x += v * dt` per particle.

use rayon::prelude::*;

use crate::simulation::states::{Particle, ParticleSet};

/// Particles per reduction chunk. Fixed so the summation tree, and therefore
/// the rounding, does not depend on the thread count.
pub const ENERGY_CHUNK: usize = 1024;

/// Per-step sum of `m |v|^2`.
///
/// Fed once per step with the result of a deterministic parallel reduction,
/// read and reset by [`EnergyAccumulator::take_kinetic`].
#[derive(Debug, Default)]
pub struct EnergyAccumulator {
    sum: f64,
}

impl EnergyAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: f64) {
        self.sum += value;
    }

    pub fn value(&self) -> f64 {
        self.sum
    }

    /// `0.5 * sum`, leaving the accumulator at zero for the next step
    pub fn take_kinetic(&mut self) -> f64 {
        let kinetic = 0.5 * self.sum;
        self.sum = 0.0;
        kinetic
    }
}

pub struct IntegrationKernel {
    pub dt: f64,
}

impl IntegrationKernel {
    pub fn new(dt: f64) -> Self {
        Self { dt }
    }

    /// Drift every particle in parallel and add `sum m |v|^2` to `energy`
    pub fn dispatch(&self, set: &mut ParticleSet, energy: &mut EnergyAccumulator) {
        let dt = self.dt;

        // each chunk drifts its particles and returns its own partial sum
        let partials: Vec<f64> = set
            .particles_mut()
            .par_chunks_mut(ENERGY_CHUNK)
            .map(|chunk| chunk.iter_mut().map(|p| drift(p, dt)).sum::<f64>())
            .collect();

        // partials come back in chunk order
        energy.add(partials.iter().sum::<f64>());
    }
}

fn drift(p: &mut Particle, dt: f64) -> f64 {
    p.pos += p.vel * dt;
    p.mass * p.vel.norm_squared()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::states::NVec3;

    fn moving(v: NVec3, m: f64) -> Particle {
        let mut p = Particle::at_rest(NVec3::zeros(), m);
        p.vel = v;
        p
    }

    #[test]
    fn drift_moves_by_velocity_times_dt() {
        let mut set = ParticleSet::from_particles(vec![moving(NVec3::new(1.0, -2.0, 0.5), 1.0)]);
        let mut e = EnergyAccumulator::new();
        IntegrationKernel::new(0.1).dispatch(&mut set, &mut e);
        let pos = set.particles()[0].pos;
        assert!((pos - NVec3::new(0.1, -0.2, 0.05)).norm() < 1e-15);
    }

    #[test]
    fn energy_matches_serial_sum_and_resets() {
        let particles: Vec<Particle> = (0..5000)
            .map(|i| {
                let f = i as f64;
                moving(NVec3::new((f * 0.37).sin(), (f * 0.13).cos(), 0.01 * f), 1.0 + f * 1e-3)
            })
            .collect();
        let mut set = ParticleSet::from_particles(particles);
        let expected = set.kinetic_energy();

        let mut e = EnergyAccumulator::new();
        IntegrationKernel::new(0.1).dispatch(&mut set, &mut e);
        let kinetic = e.take_kinetic();

        assert!((kinetic - expected).abs() <= 1e-9 * expected.abs());
        assert_eq!(e.value(), 0.0);
    }

    #[test]
    fn reduction_is_repeatable() {
        let make = || {
            ParticleSet::from_particles(
                (0..3000).map(|i| moving(NVec3::new(i as f64 * 1e-3, 0.0, 1.0), 0.5)).collect(),
            )
        };
        let (mut a, mut b) = (make(), make());
        let (mut ea, mut eb) = (EnergyAccumulator::new(), EnergyAccumulator::new());
        IntegrationKernel::new(0.1).dispatch(&mut a, &mut ea);
        IntegrationKernel::new(0.1).dispatch(&mut b, &mut eb);
        assert_eq!(ea.value().to_bits(), eb.value().to_bits());
    }
}
