//! Seeded initialization of the particle population
//!
//! Every initializer owns a fresh `StdRng` seeded with the same value, so the
//! state drawn by one never depends on how many numbers another consumed.
//! Two runs with the same N, seed and no override file start identical.

use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::simulation::states::{NVec3, ParticleSet};

/// Scale applied to the [-1, 1) velocity draw
pub const VELOCITY_SCALE: f64 = 1.0e-3;

/// Owner of the particle state during setup.
pub struct ParticleStore {
    set: ParticleSet,
    seed: u64,
}

impl ParticleStore {
    pub fn new(n: usize, seed: u64) -> Self {
        Self {
            set: ParticleSet::with_len(n),
            seed,
        }
    }

    /// Run all four initializers in the reference order
    /// Returns the number of particles whose position came from `seed_file`
    pub fn initialize(&mut self, seed_file: Option<&Path>) -> usize {
        let overridden = self.init_positions(seed_file);
        self.init_velocities();
        self.init_accelerations();
        self.init_masses();
        overridden
    }

    /// Uniform [0, 1) coordinates, then overwrite the first k particles with
    /// complete triples read from `seed_file`
    ///
    /// A file that cannot be read is only a warning: the random positions stay.
    /// Returns k.
    pub fn init_positions(&mut self, seed_file: Option<&Path>) -> usize {
        let mut rng = StdRng::seed_from_u64(self.seed);
        for p in self.set.particles_mut() {
            p.pos = NVec3::new(
                rng.gen_range(0.0..1.0),
                rng.gen_range(0.0..1.0),
                rng.gen_range(0.0..1.0),
            );
        }

        let Some(path) = seed_file else {
            return 0;
        };

        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                log::warn!("Could not open the input file {}: {err}", path.display());
                return 0;
            }
        };

        let values = parse_seed_values(&text);
        let triples = values.chunks_exact(3);
        let mut k = 0;
        for (p, xyz) in self.set.particles_mut().iter_mut().zip(triples) {
            p.pos = NVec3::new(xyz[0], xyz[1], xyz[2]);
            k += 1;
        }
        if k < self.set.len() {
            log::debug!("seed file {} covered {k} of {} particles", path.display(), self.set.len());
        }
        k
    }

    /// Uniform [-1, 1) per component, scaled by [`VELOCITY_SCALE`]
    pub fn init_velocities(&mut self) {
        let mut rng = StdRng::seed_from_u64(self.seed);
        for p in self.set.particles_mut() {
            p.vel = NVec3::new(
                rng.gen_range(-1.0..1.0) * VELOCITY_SCALE,
                rng.gen_range(-1.0..1.0) * VELOCITY_SCALE,
                rng.gen_range(-1.0..1.0) * VELOCITY_SCALE,
            );
        }
    }

    pub fn init_accelerations(&mut self) {
        for p in self.set.particles_mut() {
            p.acc = NVec3::zeros();
        }
    }

    /// Uniform [0, 1) scaled by N, so the total mass grows with N.
    /// The model is not normalized; keep the scaling.
    pub fn init_masses(&mut self) {
        let n = self.set.len() as f64;
        let mut rng = StdRng::seed_from_u64(self.seed);
        for p in self.set.particles_mut() {
            p.mass = n * rng.gen_range(0.0..1.0);
        }
    }

    pub fn particles(&self) -> &ParticleSet {
        &self.set
    }

    /// Hand the populated set over to the engine
    pub fn into_set(self) -> ParticleSet {
        self.set
    }
}

/// Leading whitespace-separated finite floats; stops at the first token that
/// is not one (`nan` and `inf` included)
fn parse_seed_values(text: &str) -> Vec<f64> {
    text.split_whitespace()
        .map_while(|tok| tok.parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_stops_at_first_bad_token() {
        assert_eq!(parse_seed_values("1 2.5\n-3e1 x 4"), vec![1.0, 2.5, -30.0]);
        assert!(parse_seed_values("   \n").is_empty());
        assert!(parse_seed_values("nan inf 0.5").is_empty());
        assert_eq!(parse_seed_values("0.5 1 2 -inf 3"), vec![0.5, 1.0, 2.0]);
        assert_eq!(parse_seed_values("1 2 3 Infinity 4 5"), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn ranges_hold() {
        let mut store = ParticleStore::new(500, 42);
        store.initialize(None);
        for p in store.particles().particles() {
            assert!(p.pos.iter().all(|&c| (0.0..1.0).contains(&c)));
            assert!(p.vel.iter().all(|&c| (-VELOCITY_SCALE..VELOCITY_SCALE).contains(&c)));
            assert_eq!(p.acc, NVec3::zeros());
            assert!((0.0..500.0).contains(&p.mass));
        }
    }

    #[test]
    fn same_seed_same_state() {
        let mut a = ParticleStore::new(64, 42);
        let mut b = ParticleStore::new(64, 42);
        a.initialize(None);
        b.initialize(None);
        assert_eq!(a.particles(), b.particles());

        let mut c = ParticleStore::new(64, 7);
        c.initialize(None);
        assert_ne!(a.particles(), c.particles());
    }

    #[test]
    fn unreadable_seed_file_keeps_random_positions() {
        let mut plain = ParticleStore::new(8, 42);
        plain.init_positions(None);
        let mut missing = ParticleStore::new(8, 42);
        let k = missing.init_positions(Some(Path::new("/no/such/seed/file.txt")));
        assert_eq!(k, 0);
        assert_eq!(plain.particles(), missing.particles());
    }
}
