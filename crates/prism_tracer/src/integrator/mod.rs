//! Light transport estimators.
//!
//! An integrator turns one camera ray into one radiance sample. Averaging
//! samples is the caller's job. Integrators are shared by every render worker
//! and keep no per-ray state; randomness comes from the worker's generator.

mod ambient_occlusion;
mod debug;
mod path_trace;

pub use ambient_occlusion::AmbientOcclusionIntegrator;
pub use debug::{DebugIntegrator, DebugMode};
pub use path_trace::{PathTraceIntegrator, MAX_TRAVERSE_DEPTH};

use prism_math::Ray;
use rand::RngCore;

use crate::material::Color;
use crate::scene::Scene;

pub trait Integrator: Send + Sync {
    /// Radiance arriving along `ray`, linear and unclamped.
    ///
    /// Never fails: a ray that hits nothing sees the environment.
    fn gather(&self, scene: &Scene, ray: &Ray, rng: &mut dyn RngCore) -> Color;

    fn name(&self) -> &'static str;
}
