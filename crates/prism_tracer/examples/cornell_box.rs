//! Cornell box example.
//!
//! Builds the classic box with a ceiling light, a mirror block and a glass
//! block, renders it with the region scheduler and saves a PNG.
//!
//! Usage: `cornell_box [output.png] [options.json] [pt|ao|debug]`

use std::sync::Arc;

use anyhow::Context;
use prism_core::{Material, Mesh, SceneDescription, Transform};
use prism_math::Quat;
use prism_tracer::{
    AmbientOcclusionIntegrator, Camera, ConstantEnvironment, DebugIntegrator, Integrator, Options,
    PathTraceIntegrator, Renderer, Scene, UVec2, Vec3,
};

const WIDTH: u32 = 400;
const HEIGHT: u32 = 400;
const FRAMES: u32 = 8;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let output = args.get(1).map(String::as_str).unwrap_or("cornell_box.png");

    let options = match args.get(2) {
        Some(path) => {
            let json = std::fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))?;
            Options::from_json_str(&json)?
        }
        None => Options {
            rays_per_pixel: 16,
            ..Options::default()
        },
    };

    let integrator: Arc<dyn Integrator> = match args.get(3).map(String::as_str) {
        Some("ao") => Arc::new(AmbientOcclusionIntegrator),
        Some("debug") => Arc::new(DebugIntegrator::default()),
        _ => Arc::new(PathTraceIntegrator),
    };

    let camera = Camera::new()
        .with_position(Vec3::new(0.0, 1.0, 3.4), Vec3::new(0.0, 1.0, 0.0), Vec3::Y)
        .with_lens(40.0, 0.0, 3.4);

    let description = build_scene();
    let scene = Scene::build(
        &description.entries,
        &camera,
        options,
        Arc::new(ConstantEnvironment::black()),
    )?;

    let renderer = Renderer::new(Arc::new(scene), camera, integrator);

    let start = std::time::Instant::now();
    let image = renderer.render_image(UVec2::new(WIDTH, HEIGHT), FRAMES);
    log::info!("Rendered {} frames in {:.2?}", FRAMES, start.elapsed());

    image.save(output).with_context(|| format!("Failed to save {output}"))?;
    log::info!("Saved to {}", output);
    Ok(())
}

fn build_scene() -> SceneDescription {
    let mut scene = SceneDescription::new("cornell box");

    let white = Arc::new(Material::diffuse("white", Vec3::splat(0.85)));
    let red = Arc::new(Material::diffuse("red", Vec3::new(0.8, 0.1, 0.1)));
    let green = Arc::new(Material::diffuse("green", Vec3::new(0.1, 0.7, 0.1)));
    let light = Arc::new(Material::emissive("light", Vec3::splat(15.0)));
    let mirror = Arc::new(Material::conductor("mirror", Vec3::splat(0.95), 0.1));
    let glass = Arc::new(Material::dielectric("glass", Vec3::ONE, 1.5, 0.0));

    let corner = |x: f32, y: f32, z: f32| Vec3::new(x, y, z);
    let wall = |corners: [Vec3; 4]| Arc::new(Mesh::quad(corners));

    // Floor, ceiling and back wall
    scene.add(
        wall([corner(-1.0, 0.0, 1.0), corner(1.0, 0.0, 1.0), corner(1.0, 0.0, -1.0), corner(-1.0, 0.0, -1.0)]),
        Transform::default(),
        Arc::clone(&white),
    );
    scene.add(
        wall([corner(-1.0, 2.0, -1.0), corner(1.0, 2.0, -1.0), corner(1.0, 2.0, 1.0), corner(-1.0, 2.0, 1.0)]),
        Transform::default(),
        Arc::clone(&white),
    );
    scene.add(
        wall([corner(-1.0, 0.0, -1.0), corner(1.0, 0.0, -1.0), corner(1.0, 2.0, -1.0), corner(-1.0, 2.0, -1.0)]),
        Transform::default(),
        Arc::clone(&white),
    );

    // Side walls
    scene.add(
        wall([corner(-1.0, 0.0, 1.0), corner(-1.0, 0.0, -1.0), corner(-1.0, 2.0, -1.0), corner(-1.0, 2.0, 1.0)]),
        Transform::default(),
        red,
    );
    scene.add(
        wall([corner(1.0, 0.0, -1.0), corner(1.0, 0.0, 1.0), corner(1.0, 2.0, 1.0), corner(1.0, 2.0, -1.0)]),
        Transform::default(),
        green,
    );

    // Ceiling light, just below the ceiling
    scene.add(
        wall([
            corner(-0.25, 1.99, -0.25),
            corner(0.25, 1.99, -0.25),
            corner(0.25, 1.99, 0.25),
            corner(-0.25, 1.99, 0.25),
        ]),
        Transform::default(),
        light,
    );

    let block = Arc::new(Mesh::cuboid(Vec3::new(-0.3, 0.0, -0.3), Vec3::new(0.3, 1.0, 0.3)));
    scene.add(
        Arc::clone(&block),
        Transform {
            translation: Vec3::new(-0.4, 0.0, -0.3),
            rotation: Quat::from_rotation_y(0.3),
            scale: Vec3::ONE,
        },
        mirror,
    );
    scene.add(
        block,
        Transform {
            translation: Vec3::new(0.4, 0.0, 0.3),
            rotation: Quat::from_rotation_y(-0.3),
            scale: Vec3::new(1.0, 0.6, 1.0),
        },
        glass,
    );

    scene
}
