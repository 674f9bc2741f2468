use std::rc::Rc;
use std::time::Instant;

use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};

use crate::camera::PerspectiveCamera;
use crate::core::{OutputSurface, SurfaceId, Viewport};
use crate::math::Color;
use crate::scene::{Material, MaterialDesc, NodeKind, ResourceKind, ResourceLedger, Scene, Shading};
use crate::traits::{Renderer, RendererFactory};

/// Per-frame counters of the last draw
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub meshes: usize,
    pub triangles: usize,
}

#[derive(Debug, Clone, Copy)]
struct PointLight {
    position: Vec3,
    color: Vec3,
}

#[derive(Debug, Clone, Copy, Default)]
struct Lighting {
    ambient: Vec3,
    points: [Option<PointLight>; MAX_POINT_LIGHTS],
}

const MAX_POINT_LIGHTS: usize = 4;

/// Vertex after projection: pixel position plus depth in [0, 1]
#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    pos: Vec2,
    depth: f32,
}

/// CPU rasterizer - z-buffered, flat shaded, double sided
///
/// Every frame is published on the renderer's output surface, which is what
/// the capture subsystem records from.
pub struct SoftwareRenderer {
    viewport: Viewport,
    surface: Rc<OutputSurface>,
    ledger: ResourceLedger,
    color: Vec<[u8; 4]>,
    depth: Vec<f32>,
    frame_number: u64,
    stats: RenderStats,
    disposed: bool,
}

impl SoftwareRenderer {
    pub fn new(viewport: Viewport, surface: SurfaceId, ledger: &ResourceLedger) -> Self {
        ledger.record_alloc(ResourceKind::Renderer);
        let mut renderer = Self {
            viewport,
            surface: OutputSurface::new(surface),
            ledger: ledger.clone(),
            color: Vec::new(),
            depth: Vec::new(),
            frame_number: 0,
            stats: RenderStats::default(),
            disposed: false,
        };
        renderer.allocate_buffers();
        renderer
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Frames drawn so far
    pub fn frame_count(&self) -> u64 {
        self.frame_number
    }

    fn size(&self) -> (u32, u32) {
        self.viewport.physical_size()
    }

    fn allocate_buffers(&mut self) {
        let len = self.viewport.buffer_size() / 4;
        self.color = vec![[0, 0, 0, 255]; len];
        self.depth = vec![f32::INFINITY; len];
    }

    fn clear(&mut self, background: Color) {
        let rgba = background.to_rgba8();
        self.color.fill(rgba);
        self.depth.fill(f32::INFINITY);
    }

    // === Rasterization ===

    fn project(&self, view_projection: Mat4, point: Vec3) -> Option<ScreenVertex> {
        let clip = view_projection * point.extend(1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        if !(0.0..=1.0).contains(&ndc.z) {
            return None;
        }
        let (width, height) = self.size();
        Some(ScreenVertex {
            pos: Vec2::new(
                (ndc.x * 0.5 + 0.5) * width as f32,
                (0.5 - ndc.y * 0.5) * height as f32,
            ),
            depth: ndc.z,
        })
    }

    fn fill_triangle(&mut self, v: [ScreenVertex; 3], rgba: [u8; 4]) {
        let area = edge(v[0].pos, v[1].pos, v[2].pos);
        if area.abs() < f32::EPSILON {
            return;
        }
        let (width, height) = self.size();

        let min = v[0].pos.min(v[1].pos).min(v[2].pos).floor().max(Vec2::ZERO);
        let max = v[0].pos.max(v[1].pos).max(v[2].pos).ceil();
        let max_x = (max.x as u32).min(width.saturating_sub(1));
        let max_y = (max.y as u32).min(height.saturating_sub(1));

        for y in min.y as u32..=max_y {
            for x in min.x as u32..=max_x {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let w0 = edge(v[1].pos, v[2].pos, p) / area;
                let w1 = edge(v[2].pos, v[0].pos, p) / area;
                let w2 = 1.0 - w0 - w1;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }
                let depth = w0 * v[0].depth + w1 * v[1].depth + w2 * v[2].depth;
                self.plot(x, y, depth, rgba, 0.0);
            }
        }
    }

    fn draw_line(&mut self, a: ScreenVertex, b: ScreenVertex, rgba: [u8; 4]) {
        if !(a.pos.is_finite() && b.pos.is_finite()) {
            return;
        }
        let (width, height) = self.size();
        let delta = b.pos - a.pos;
        let Some((t0, t1)) = clip_line(a.pos, delta, width as f32, height as f32) else {
            return;
        };

        // only the visible part is stepped
        let span = delta * (t1 - t0);
        let steps = span.x.abs().max(span.y.abs()).ceil().clamp(1.0, (width + height) as f32) as u32;

        for i in 0..=steps {
            let t = t0 + (t1 - t0) * (i as f32 / steps as f32);
            let p = a.pos + delta * t;
            if p.x < 0.0 || p.y < 0.0 || p.x >= width as f32 || p.y >= height as f32 {
                continue;
            }
            let depth = a.depth + (b.depth - a.depth) * t;
            self.plot(p.x as u32, p.y as u32, depth, rgba, 1e-4);
        }
    }

    fn plot(&mut self, x: u32, y: u32, depth: f32, rgba: [u8; 4], bias: f32) {
        let (width, _) = self.size();
        let index = (y * width + x) as usize;
        if let Some(stored) = self.depth.get_mut(index) {
            if depth <= *stored + bias {
                *stored = depth;
                self.color[index] = rgba;
            }
        }
    }
}

/// Range of `t` for which `start + delta * t` lies inside `[0, width] x [0, height]`
fn clip_line(start: Vec2, delta: Vec2, width: f32, height: f32) -> Option<(f32, f32)> {
    let mut t0 = 0.0f32;
    let mut t1 = 1.0f32;
    let bounds = [
        (-delta.x, start.x),
        (delta.x, width - start.x),
        (-delta.y, start.y),
        (delta.y, height - start.y),
    ];
    for (p, q) in bounds {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
    }
    (t0 <= t1).then_some((t0, t1))
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

fn collect_lights(scene: &Scene) -> Lighting {
    let mut lighting = Lighting::default();
    let mut next = 0;
    scene.traverse(|_, node, world| match node.kind {
        NodeKind::AmbientLight { color, intensity } => {
            lighting.ambient += Vec3::from(color.to_rgb()) * intensity;
        }
        NodeKind::PointLight { color, intensity } if next < MAX_POINT_LIGHTS => {
            lighting.points[next] = Some(PointLight {
                position: world.transform_point3(Vec3::ZERO),
                color: Vec3::from(color.to_rgb()) * intensity,
            });
            next += 1;
        }
        _ => {}
    });
    lighting
}

fn shade(desc: MaterialDesc, normal: Vec3, centroid: Vec3, lighting: &Lighting) -> [u8; 4] {
    let base = Vec3::from(desc.color.to_rgb());
    let rgb = match desc.shading {
        Shading::Basic => base,
        Shading::Normal => normal * 0.5 + Vec3::splat(0.5),
        Shading::Lambert => {
            let mut light = lighting.ambient;
            for point in lighting.points.iter().flatten() {
                let to_light = (point.position - centroid).normalize_or_zero();
                light += point.color * normal.dot(to_light).max(0.0);
            }
            base * light
        }
    };
    Color::from_rgb(rgb.to_array()).to_rgba8()
}

fn drawable_material(materials: &[Material]) -> Option<MaterialDesc> {
    materials
        .first()
        .filter(|material| !material.is_disposed())
        .map(Material::desc)
}

impl Renderer for SoftwareRenderer {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        if viewport == self.viewport {
            return;
        }
        self.viewport = viewport;
        if !self.disposed {
            self.allocate_buffers();
        }
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera, now: Instant) {
        if self.disposed {
            log::warn!("render called on a disposed renderer");
            return;
        }

        self.clear(scene.background());
        let lighting = collect_lights(scene);
        let view_projection = camera.view_projection();
        let mut stats = RenderStats::default();

        // Collect first so the rasterizer can borrow `self` mutably
        let mut batches = Vec::new();
        scene.traverse(|_, node, world| {
            let Some(mesh) = node.mesh() else {
                return;
            };
            if mesh.geometry.is_disposed() {
                return;
            }
            if let Some(desc) = drawable_material(&mesh.materials) {
                batches.push((mesh.geometry.clone(), desc, world));
            }
        });

        for (geometry, desc, world) in batches {
            let data = geometry.data();
            stats.meshes += 1;

            for triangle in &data.triangles {
                let corners = triangle.map(|i| {
                    world.transform_point3(data.positions.get(i as usize).copied().unwrap_or(Vec3::ZERO))
                });

                let mut normal = (corners[1] - corners[0])
                    .cross(corners[2] - corners[0])
                    .normalize_or_zero();
                if normal.dot(camera.position - corners[0]) < 0.0 {
                    normal = -normal;
                }

                let projected = corners.map(|c| self.project(view_projection, c));
                let [Some(a), Some(b), Some(c)] = projected else {
                    continue;
                };

                let centroid = (corners[0] + corners[1] + corners[2]) / 3.0;
                let rgba = shade(desc, normal, centroid, &lighting);
                if desc.wireframe {
                    self.draw_line(a, b, rgba);
                    self.draw_line(b, c, rgba);
                    self.draw_line(c, a, rgba);
                } else {
                    self.fill_triangle([a, b, c], rgba);
                }
                stats.triangles += 1;
            }
        }

        self.stats = stats;
        let (width, height) = self.size();
        self.surface
            .publish(self.frame_number, now, width, height, bytemuck::cast_slice(&self.color));
        self.frame_number += 1;
    }

    fn surface(&self) -> Rc<OutputSurface> {
        Rc::clone(&self.surface)
    }

    fn pixels(&self) -> (u32, u32, &[u8]) {
        let (width, height) = self.size();
        (width, height, bytemuck::cast_slice(&self.color))
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.surface.close();
        self.color = Vec::new();
        self.depth = Vec::new();
        self.ledger.record_release(ResourceKind::Renderer);
        log::debug!("renderer for surface {:?} disposed", self.surface.id());
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Drop for SoftwareRenderer {
    fn drop(&mut self) {
        if !self.disposed {
            log::warn!("renderer for surface {:?} dropped without dispose", self.surface.id());
        }
    }
}

/// Factory handing out one [`SoftwareRenderer`] per generation
#[derive(Debug, Default, Clone, Copy)]
pub struct SoftwareRendererFactory;

impl RendererFactory for SoftwareRendererFactory {
    fn create(&mut self, viewport: Viewport, surface: SurfaceId, ledger: &ResourceLedger) -> Box<dyn Renderer> {
        Box::new(SoftwareRenderer::new(viewport, surface, ledger))
    }
}
