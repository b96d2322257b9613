//! Direct-sum softened gravity, evaluated in parallel per particle
//!
//! Each work item owns particle `i`: it reads a snapshot of every position
//! and mass, writes only `acc[i]` and `vel[i]`, and emits one extremum record.

use rayon::prelude::*;

use crate::error::Result;
use crate::simulation::extrema::{ExtremaProducer, ExtremumRecord};
use crate::simulation::params::Parameters;
use crate::simulation::states::{NVec3, ParticleSet};

/// Softened Newtonian gravity summed over every pair
#[allow(non_snake_case)]
#[derive(Debug, Clone, Copy)]
pub struct NewtonianGravity3 {
    pub G: f64, // gravitational constant
    pub eps2: f64, // softening
}

impl NewtonianGravity3 {
    pub fn from_params(p: &Parameters) -> Self {
        Self { G: p.G, eps2: p.eps2 }
    }

    /// Acceleration on a particle at `xi` from every `(position, mass)` source,
    /// plus the largest of the running max and negated running min over the
    /// partial axis sums
    ///
    /// An axis whose separation is exactly zero contributes nothing for that
    /// pair; this also removes the self term.
    pub fn accumulate(&self, xi: NVec3, sources: &[(NVec3, f64)]) -> (NVec3, f64) {
        let mut acc = NVec3::zeros();
        let mut acc_max = 0.0_f64;
        let mut acc_min = 0.0_f64;

        for &(xj, mj) in sources {
            // r points from i to j
            let r = xj - xi;

            // |r|^2 + eps^2
            let d2 = r.dot(&r) + self.eps2;
            let inv_r = d2.sqrt().recip();
            let coef = self.G * mj * inv_r * inv_r * inv_r;

            for axis in 0..3 {
                if r[axis] != 0.0 {
                    acc[axis] += r[axis] * coef;
                }
                if acc[axis] > acc_max {
                    acc_max = acc[axis];
                }
                if acc[axis] < acc_min {
                    acc_min = acc[axis];
                }
            }
        }

        let extremum = if -acc_min > acc_max { -acc_min } else { acc_max };
        (acc, extremum)
    }
}

/// Force pass: accelerations, the first velocity update and one extremum
/// record per particle
pub struct ForceKernel {
    pub gravity: NewtonianGravity3,
    pub dt: f64,
}

impl ForceKernel {
    pub fn new(p: &Parameters) -> Self {
        Self {
            gravity: NewtonianGravity3::from_params(p),
            dt: p.dt,
        }
    }

    /// One parallel dispatch over the set; returns once every item has finished
    pub fn dispatch(&self, set: &mut ParticleSet, out: &ExtremaProducer) -> Result<()> {
        // positions and masses are read-only for the whole pass
        let sources: Vec<(NVec3, f64)> = set.particles().iter().map(|p| (p.pos, p.mass)).collect();
        let gravity = self.gravity;
        let dt = self.dt;

        set.particles_mut()
            .par_iter_mut()
            .enumerate()
            .try_for_each(|(i, p)| {
                let (acc, extremum) = gravity.accumulate(p.pos, &sources);
                p.acc = acc;
                p.vel += acc * dt;
                out.write(i, ExtremumRecord { value: extremum, flag: true })
            })
    }
}

/// Serial O(N^2) reference without the zero-separation rule or extrema tracking
pub fn reference_accelerations(gravity: &NewtonianGravity3, set: &ParticleSet) -> Vec<NVec3> {
    let bodies = set.particles();
    bodies
        .iter()
        .enumerate()
        .map(|(i, bi)| {
            let mut a = NVec3::zeros();
            for (j, bj) in bodies.iter().enumerate() {
                if i == j {
                    continue;
                }
                let r = bj.pos - bi.pos;
                let inv_r = (r.dot(&r) + gravity.eps2).sqrt().recip();
                a += gravity.G * bj.mass * inv_r * inv_r * inv_r * r;
            }
            a
        })
        .collect()
}
