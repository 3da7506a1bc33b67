//! Prism tracer - KD-tree accelerated CPU ray tracing.
//!
//! Geometry from [`prism_core`] is flattened into a world-space triangle
//! list, indexed by a surface area heuristic KD-tree, and rendered with an
//! ambient occlusion or a unidirectional path tracing integrator.
//!
//! ```ignore
//! let scene = Arc::new(Scene::build(&description.entries, &camera, options, environment)?);
//! let renderer = Renderer::new(scene, camera, Arc::new(PathTraceIntegrator));
//! let image = renderer.render_image(UVec2::new(640, 480), 16);
//! image.save("out.png")?;
//! ```

pub mod bsdf;
pub mod camera;
pub mod emitter;
pub mod environment;
pub mod fresnel;
pub mod integrator;
pub mod kd_tree;
pub mod material;
pub mod options;
pub mod region;
pub mod renderer;
pub mod sampling;
pub mod scene;
pub mod triangle;

pub use camera::Camera;
pub use emitter::{Emitter, EmitterSample};
pub use environment::{ConstantEnvironment, EnvironmentSampler, EquirectangularEnvironment, GradientEnvironment};
pub use integrator::{
    AmbientOcclusionIntegrator, DebugIntegrator, DebugMode, Integrator, PathTraceIntegrator,
};
pub use kd_tree::{BuildSettings, KdNode, KdTree, KdTreeStatistics, TraverseResult};
pub use material::{Color, Material, MaterialClass};
pub use options::{Options, OptionsError};
pub use region::{generate_regions, Region};
pub use renderer::{perform_at_point, FrameStats, ImageBuffer, OutputFn, Renderer};
pub use scene::{Scene, SceneError, SurfaceHit};
pub use triangle::{SurfacePoint, Triangle, TriangleHit};

/// Re-export common math types from prism_math
pub use prism_math::{Aabb, Interval, Ray, UVec2, Vec2, Vec3, Vec4};
