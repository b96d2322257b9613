use std::io::Write;
use std::time::Instant;

use crate::error::Result;
use crate::simulation::extrema::ExtremaChannel;
use crate::simulation::forces::ForceKernel;
use crate::simulation::integrator::{EnergyAccumulator, IntegrationKernel};
use crate::simulation::params::Parameters;
use crate::simulation::states::{NVec3, Particle, ParticleSet};

/// Helper to build a manual set of size `n`
fn make_set(n: usize) -> ParticleSet {
    let particles = (0..n)
        .map(|i| {
            let i_f = i as f64;
            // deterministic positions, no rand needed
            let x = NVec3::new(
                (i_f * 0.37).sin() * 5.0,
                (i_f * 0.13).cos() * 5.0,
                (i_f * 0.07).sin() * 5.0,
            );
            Particle::at_rest(x, 1.0)
        })
        .collect();
    ParticleSet::from_particles(particles)
}

/// Time one force pass and one drift pass for each `n`
/// Writes CSV, paste directly into a spreadsheet to graph
pub fn bench_step_curve<W: Write>(ns: &[usize], out: &mut W) -> Result<()> {
    writeln!(out, "N,force_ms,integrate_ms")?;

    for &n in ns {
        let params = Parameters { n, ..Parameters::default() };
        let mut set = make_set(n);
        let channel = ExtremaChannel::new(params.width, n)?;
        let producer = channel.producer();
        let force = ForceKernel::new(&params);
        let integrate = IntegrationKernel::new(params.dt);
        let mut energy = EnergyAccumulator::new();

        // Warm up the thread pool
        force.dispatch(&mut set, &producer)?;
        channel.drain(n)?;

        let t0 = Instant::now();
        force.dispatch(&mut set, &producer)?;
        let force_ms = t0.elapsed().as_secs_f64() * 1000.0;
        channel.drain(n)?;

        let t1 = Instant::now();
        integrate.dispatch(&mut set, &mut energy);
        let integrate_ms = t1.elapsed().as_secs_f64() * 1000.0;
        energy.take_kinetic();

        writeln!(out, "{},{:.6},{:.6}", n, force_ms, integrate_ms)?;
    }
    Ok(())
}
