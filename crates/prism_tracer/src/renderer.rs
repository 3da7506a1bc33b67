//! Region-parallel render driver.
//!
//! The scene is read-only while rendering, so every worker shares it without
//! locking. Regions are traced in parallel with rayon, each with its own
//! generator seeded from the options seed, the frame and the region index,
//! which keeps renders reproducible whatever the thread scheduling.
//!
//! Finished pixels go to an output callback that is called concurrently from
//! the worker threads, exactly once per pixel and frame, in no particular
//! order. The color's alpha is the weight the caller should blend it in with
//! (`mix(previous, new, alpha)`), which averages progressive frames.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use prism_math::{UVec2, Vec4};
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;

use crate::camera::Camera;
use crate::integrator::{DebugIntegrator, Integrator};
use crate::material::Color;
use crate::region::{generate_regions, Region};
use crate::scene::Scene;

/// Receives `(pixel, rgba)` from the render workers.
pub type OutputFn<'a> = dyn Fn(UVec2, Vec4) + Send + Sync + 'a;

/// Outcome of one [`Renderer::render_frame`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub frame: u32,
    pub regions_total: usize,
    pub regions_rendered: usize,
    pub elapsed: Duration,
}

impl FrameStats {
    /// False if a stop request skipped some regions.
    pub fn is_complete(&self) -> bool {
        self.regions_rendered == self.regions_total
    }
}

pub struct Renderer {
    scene: Arc<Scene>,
    camera: Camera,
    integrator: Arc<dyn Integrator>,
    running: Arc<AtomicBool>,
}

impl Renderer {
    /// The camera picks up the aperture from the scene options and the
    /// focal distance found at scene build.
    pub fn new(scene: Arc<Scene>, mut camera: Camera, integrator: Arc<dyn Integrator>) -> Self {
        let options = scene.options();
        camera.set_aperture_size(options.aperture_size);
        if let Some(distance) = scene.focal_distance() {
            camera.set_focus_distance(distance);
        }

        let integrator: Arc<dyn Integrator> = if options.debug_rendering {
            log::info!("Debug rendering enabled, replacing {} integrator", integrator.name());
            Arc::new(DebugIntegrator::default())
        } else {
            integrator
        };

        Self {
            scene,
            camera,
            integrator,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn integrator(&self) -> &dyn Integrator {
        self.integrator.as_ref()
    }

    /// Allow regions to be traced again after [`Renderer::stop`].
    pub fn start(&self) {
        self.running.store(true, Ordering::Relaxed);
    }

    /// Skip every region not yet started. Regions in flight finish.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::Relaxed) {
            log::info!("Render stop requested");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Shared flag for stopping the render from another thread.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Trace every region of an `output_size` image once.
    pub fn render_frame(&self, output_size: UVec2, frame: u32, output: &OutputFn) -> FrameStats {
        let start = Instant::now();
        let regions = generate_regions(output_size.x, output_size.y, self.scene.options().render_region_size);
        log::info!(
            "Frame {}: {}x{} in {} regions with {}",
            frame,
            output_size.x,
            output_size.y,
            regions.len(),
            self.integrator.name()
        );

        let regions_rendered = regions
            .par_iter()
            .filter(|region| {
                if !self.is_running() {
                    return false;
                }
                self.render_region(region, output_size, frame, output);
                true
            })
            .count();

        let stats = FrameStats {
            frame,
            regions_total: regions.len(),
            regions_rendered,
            elapsed: start.elapsed(),
        };
        if stats.is_complete() {
            log::info!("Frame {} finished in {:.2?}", frame, stats.elapsed);
        } else {
            log::info!(
                "Frame {} stopped after {} of {} regions",
                frame,
                stats.regions_rendered,
                stats.regions_total
            );
        }
        stats
    }

    fn render_region(&self, region: &Region, output_size: UVec2, frame: u32, output: &OutputFn) {
        let mut rng = SmallRng::seed_from_u64(region_seed(self.scene.options().seed, frame, region.index));
        let alpha = 1.0 / (frame as f32 + 1.0);

        for pixel in region.pixels() {
            let color = perform_at_point(
                &self.scene,
                &self.camera,
                self.integrator.as_ref(),
                output_size,
                pixel,
                &mut rng,
            );
            output(pixel, color.extend(alpha));
        }
    }

    /// Render `frames` progressive frames into a new image.
    ///
    /// Stops early if the renderer is stopped.
    pub fn render_image(&self, output_size: UVec2, frames: u32) -> ImageBuffer {
        let image = Mutex::new(ImageBuffer::new(output_size.x, output_size.y));
        for frame in 0..frames {
            let stats = self.render_frame(output_size, frame, &|pixel, rgba| {
                image
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .accumulate(pixel, rgba);
            });
            if !stats.is_complete() {
                break;
            }
        }
        image.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    /// Synchronous trace of one pixel with a generator seeded from the options.
    pub fn probe(&self, output_size: UVec2, pixel: UVec2) -> Color {
        let mut rng = SmallRng::seed_from_u64(self.scene.options().seed);
        perform_at_point(
            &self.scene,
            &self.camera,
            self.integrator.as_ref(),
            output_size,
            pixel,
            &mut rng,
        )
    }
}

/// Average of `raysPerPixel` samples through `pixel`, outside the region
/// scheduler.
pub fn perform_at_point(
    scene: &Scene,
    camera: &Camera,
    integrator: &dyn Integrator,
    output_size: UVec2,
    pixel: UVec2,
    rng: &mut dyn RngCore,
) -> Color {
    let samples = scene.options().rays_per_pixel.max(1);
    let mut color = Color::ZERO;
    for _ in 0..samples {
        let ray = camera.sample_ray(pixel, output_size, rng);
        color += integrator.gather(scene, &ray, rng);
    }
    color / samples as f32
}

/// Seed of the generator tracing `region_index` in `frame`.
pub fn region_seed(seed: u64, frame: u32, region_index: usize) -> u64 {
    // SplitMix64 finalizer over the combined inputs
    let mut z = seed
        ^ (frame as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (region_index as u64).wrapping_mul(0xD1B5_4A32_D192_ED03);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Apply display gamma (2.2).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.powf(1.0 / 2.2)
    } else {
        0.0
    }
}

/// Convert a linear color to 8-bit RGBA.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let encode = |c: f32| (255.0 * linear_to_gamma(c).clamp(0.0, 1.0)).round() as u8;
    [encode(color.x), encode(color.y), encode(color.z), 255]
}

/// Linear RGBA float image that progressive frames are blended into.
#[derive(Debug, Clone)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[f32; 4]>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with transparent black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0.0; 4]; (width * height) as usize],
        }
    }

    fn offset(&self, pixel: UVec2) -> usize {
        (pixel.y * self.width + pixel.x) as usize
    }

    pub fn get(&self, pixel: UVec2) -> Vec4 {
        Vec4::from_array(self.pixels[self.offset(pixel)])
    }

    pub fn set(&mut self, pixel: UVec2, rgba: Vec4) {
        let offset = self.offset(pixel);
        self.pixels[offset] = rgba.to_array();
    }

    /// Blend `rgba` in with weight `rgba.w`; the stored alpha becomes 1.
    pub fn accumulate(&mut self, pixel: UVec2, rgba: Vec4) {
        debug_assert!(!rgba.is_nan(), "NaN sample at {pixel}");
        let previous = self.get(pixel).truncate();
        let blended = previous.lerp(rgba.truncate(), rgba.w);
        self.set(pixel, blended.extend(1.0));
    }

    /// Raw little-endian `f32` RGBA bytes.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Gamma-encoded 8-bit copy for display or saving.
    pub fn to_rgba8(&self) -> image::RgbaImage {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for p in &self.pixels {
            bytes.extend_from_slice(&color_to_rgba(Color::new(p[0], p[1], p[2])));
        }
        image::RgbaImage::from_raw(self.width, self.height, bytes)
            .unwrap_or_else(|| image::RgbaImage::new(self.width, self.height))
    }

    /// Save as an 8-bit image; the format follows the extension.
    pub fn save(&self, path: impl AsRef<Path>) -> image::ImageResult<()> {
        self.to_rgba8().save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::ConstantEnvironment;
    use crate::integrator::{AmbientOcclusionIntegrator, DebugMode, PathTraceIntegrator};
    use crate::options::Options;
    use crate::scene::tests::floor_quad;
    use prism_core::{Material, Mesh, SceneDescription, Transform};
    use prism_math::Vec3;
    use std::f32::consts::PI;

    const LIGHT_HALF_SIZE: f32 = 2.0;
    const LIGHT_HEIGHT: f32 = 1.0;

    fn looking_down() -> Camera {
        Camera::new().with_position(Vec3::new(0.0, 0.5, 0.0), Vec3::ZERO, Vec3::Z)
    }

    /// Emissive quad above a diffuse floor, optionally with an opaque slab
    /// in between.
    fn lit_floor(occluded: bool, options: Options) -> Arc<Scene> {
        let mut description = SceneDescription::new("lit floor");
        description.add(
            Arc::new(floor_quad(10.0, 0.0)),
            Transform::default(),
            Arc::new(Material::diffuse("floor", Vec3::splat(0.8))),
        );
        description.add(
            Arc::new(floor_quad(LIGHT_HALF_SIZE, LIGHT_HEIGHT)),
            Transform::default(),
            Arc::new(Material::emissive("light", Vec3::splat(10.0))),
        );
        if occluded {
            description.add(
                Arc::new(Mesh::cuboid(Vec3::new(-10.0, 0.7, -10.0), Vec3::new(10.0, 0.8, 10.0))),
                Transform::default(),
                Arc::new(Material::diffuse("blocker", Vec3::splat(0.5))),
            );
        }

        let scene = Scene::build(
            &description.entries,
            &looking_down(),
            options,
            Arc::new(ConstantEnvironment::black()),
        )
        .unwrap();
        Arc::new(scene)
    }

    /// Form factor from a point to a parallel, centered rectangle.
    fn parallel_rectangle_form_factor(half_x: f32, half_y: f32, height: f32) -> f32 {
        let (x, y) = (half_x / height, half_y / height);
        let sx = (1.0 + x * x).sqrt();
        let sy = (1.0 + y * y).sqrt();
        2.0 / PI * (x / sx * (y / sx).atan() + y / sy * (x / sy).atan())
    }

    fn center_pixel(renderer: &Renderer, size: UVec2) -> Vec4 {
        let center = size / 2;
        let result = Mutex::new(None);
        renderer.render_frame(size, 0, &|pixel, rgba| {
            if pixel == center {
                *result.lock().unwrap() = Some(rgba);
            }
        });
        result.into_inner().unwrap().unwrap()
    }

    #[test]
    fn test_ambient_occlusion_matches_form_factor() {
        let options = Options {
            rays_per_pixel: 1024,
            ..Options::default()
        };
        let renderer = Renderer::new(lit_floor(false, options), looking_down(), Arc::new(AmbientOcclusionIntegrator));
        let color = center_pixel(&renderer, UVec2::new(9, 9));

        let expected = 10.0 * parallel_rectangle_form_factor(LIGHT_HALF_SIZE, LIGHT_HALF_SIZE, LIGHT_HEIGHT);
        assert!((expected - 8.309).abs() < 0.01);
        assert!(
            (color.x - expected).abs() < 0.05 * expected,
            "got {}, expected {}",
            color.x,
            expected
        );
        assert_eq!(color.w, 1.0);
    }

    #[test]
    fn test_ambient_occlusion_blocked_light() {
        let options = Options {
            rays_per_pixel: 1024,
            ..Options::default()
        };
        let renderer = Renderer::new(lit_floor(true, options), looking_down(), Arc::new(AmbientOcclusionIntegrator));
        let color = center_pixel(&renderer, UVec2::new(9, 9));
        assert!(color.truncate().length() < 0.01, "{color}");
    }

    #[test]
    fn test_every_pixel_written_once() {
        let options = Options {
            rays_per_pixel: 1,
            render_region_size: 4,
            ..Options::default()
        };
        let renderer = Renderer::new(lit_floor(false, options), looking_down(), Arc::new(PathTraceIntegrator));
        let size = UVec2::new(13, 7);
        let counts = Mutex::new(vec![0u32; 13 * 7]);

        let stats = renderer.render_frame(size, 3, &|pixel, rgba| {
            assert_eq!(rgba.w, 0.25);
            counts.lock().unwrap()[(pixel.y * 13 + pixel.x) as usize] += 1;
        });

        assert!(stats.is_complete());
        assert_eq!(stats.regions_total, 4 * 2);
        assert!(counts.into_inner().unwrap().iter().all(|&c| c == 1));
    }

    #[test]
    fn test_render_is_deterministic() {
        let options = Options {
            rays_per_pixel: 4,
            render_region_size: 3,
            seed: 99,
            ..Options::default()
        };
        let renderer = Renderer::new(lit_floor(false, options), looking_down(), Arc::new(PathTraceIntegrator));
        let size = UVec2::new(8, 8);

        let first = renderer.render_image(size, 2);
        let second = renderer.render_image(size, 2);
        assert_eq!(first.pixels, second.pixels);
        assert!(first.pixels.iter().any(|p| p[0] > 0.0));
    }

    #[test]
    fn test_stop_and_start() {
        let options = Options {
            rays_per_pixel: 1,
            render_region_size: 4,
            ..Options::default()
        };
        let renderer = Renderer::new(lit_floor(false, options), looking_down(), Arc::new(PathTraceIntegrator));
        let size = UVec2::new(256, 256);

        renderer.stop();
        assert!(!renderer.is_running());
        let stats = renderer.render_frame(size, 0, &|_, _| panic!("stopped renderer wrote a pixel"));
        assert_eq!(stats.regions_rendered, 0);

        // Stop from inside the render, as another thread would
        renderer.start();
        let handle = renderer.stop_handle();
        let stats = renderer.render_frame(size, 0, &|_, _| handle.store(false, Ordering::Relaxed));
        assert!(!stats.is_complete());
        assert!(stats.regions_rendered > 0);
    }

    #[test]
    fn test_perform_at_point() {
        let options = Options {
            rays_per_pixel: 8,
            ..Options::default()
        };
        let scene = lit_floor(false, options);
        let camera = looking_down();
        let integrator = DebugIntegrator::new(DebugMode::Depth);
        let mut rng = SmallRng::seed_from_u64(5);

        let color = perform_at_point(&scene, &camera, &integrator, UVec2::new(9, 9), UVec2::new(4, 4), &mut rng);
        // Floor is about 0.5 away
        assert!((color.x - 1.0 / 1.5).abs() < 0.01, "{color}");
    }

    #[test]
    fn test_debug_rendering_option() {
        let options = Options {
            debug_rendering: true,
            ..Options::default()
        };
        let renderer = Renderer::new(lit_floor(false, options), looking_down(), Arc::new(PathTraceIntegrator));
        assert_eq!(renderer.integrator().name(), "debug");
        let normal = renderer.probe(UVec2::new(9, 9), UVec2::new(4, 4));
        assert!((normal - Vec3::new(0.5, 1.0, 0.5)).length() < 1e-4);
    }

    #[test]
    fn test_region_seeds_differ() {
        assert_ne!(region_seed(0, 0, 0), region_seed(0, 0, 1));
        assert_ne!(region_seed(0, 0, 0), region_seed(0, 1, 0));
        assert_ne!(region_seed(0, 0, 0), region_seed(1, 0, 0));
        assert_eq!(region_seed(7, 3, 2), region_seed(7, 3, 2));
    }

    #[test]
    fn test_image_buffer() {
        let mut image = ImageBuffer::new(2, 1);
        let pixel = UVec2::new(1, 0);
        image.accumulate(pixel, Vec4::new(1.0, 0.0, 0.0, 1.0));
        image.accumulate(pixel, Vec4::new(0.0, 0.0, 1.0, 0.5));
        assert_eq!(image.get(pixel), Vec4::new(0.5, 0.0, 0.5, 1.0));

        assert_eq!(image.as_bytes().len(), 2 * 4 * 4);

        let rgba = image.to_rgba8();
        assert_eq!(rgba.dimensions(), (2, 1));
        assert_eq!(rgba.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(rgba.get_pixel(1, 0).0[0], 186);
    }
}
