//! Core state types for the N-body simulation.
//!
//! Defines the particle and particle-set structs:
//! - `Particle` using `NVec3` for position, velocity and acceleration
//! - `ParticleSet` holding the fixed-size, index-addressed population
//!
//! A particle's index in the set is its identity for the whole run.

use nalgebra::Vector3;
pub type NVec3 = Vector3<f64>;

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub pos: NVec3, // position
    pub vel: NVec3, // velocity
    pub acc: NVec3, // acceleration from the last force pass
    pub mass: f64, // mass, fixed after initialization
}

impl Particle {
    pub fn at_rest(pos: NVec3, mass: f64) -> Self {
        Self {
            pos,
            vel: NVec3::zeros(),
            acc: NVec3::zeros(),
            mass,
        }
    }
}

impl Default for Particle {
    fn default() -> Self {
        Self::at_rest(NVec3::zeros(), 0.0)
    }
}

/// Fixed population of particles for one run.
///
/// The length is set at construction and never changes; stages mutate the
/// particles in place through [`ParticleSet::particles_mut`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleSet {
    particles: Vec<Particle>,
}

impl ParticleSet {
    /// `n` default particles (origin, at rest, zero mass)
    pub fn with_len(n: usize) -> Self {
        Self {
            particles: vec![Particle::default(); n],
        }
    }

    pub fn from_particles(particles: Vec<Particle>) -> Self {
        Self { particles }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Slice access only, so the population size cannot change
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// Total kinetic energy computed serially, used to cross-check the reduction
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self
            .particles
            .iter()
            .map(|p| p.mass * p.vel.norm_squared())
            .sum::<f64>()
    }
}
