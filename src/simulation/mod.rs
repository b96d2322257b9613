pub mod states;
pub mod params;
pub mod store;
pub mod forces;
pub mod integrator;
pub mod extrema;
pub mod engine;
