use std::cell::Cell;
use std::collections::HashMap;
use std::f32::consts::PI;
use std::rc::Rc;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::resources::{ResourceKind, ResourceLedger};

/// Primitive shapes a geometry can be built from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Shape {
    Box {
        width: f32,
        height: f32,
        depth: f32,
    },
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    /// Each detail level splits every face in four
    Icosahedron { radius: f32, detail: u32 },
    Plane { width: f32, height: f32 },
}

/// Triangle mesh data built from a [`Shape`]
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
}

impl Shape {
    pub fn cube(size: f32) -> Self {
        Shape::Box {
            width: size,
            height: size,
            depth: size,
        }
    }

    pub fn sphere(radius: f32) -> Self {
        Shape::Sphere {
            radius,
            width_segments: 32,
            height_segments: 16,
        }
    }

    pub fn build(&self) -> MeshData {
        match *self {
            Shape::Box {
                width,
                height,
                depth,
            } => build_box(width, height, depth),
            Shape::Sphere {
                radius,
                width_segments,
                height_segments,
            } => build_sphere(radius, width_segments.max(3), height_segments.max(2)),
            Shape::Icosahedron { radius, detail } => build_icosahedron(radius, detail.min(5)),
            Shape::Plane { width, height } => build_plane(width, height),
        }
    }
}

fn build_box(width: f32, height: f32, depth: f32) -> MeshData {
    let (x, y, z) = (width * 0.5, height * 0.5, depth * 0.5);
    let positions = vec![
        Vec3::new(-x, -y, -z),
        Vec3::new(x, -y, -z),
        Vec3::new(x, y, -z),
        Vec3::new(-x, y, -z),
        Vec3::new(-x, -y, z),
        Vec3::new(x, -y, z),
        Vec3::new(x, y, z),
        Vec3::new(-x, y, z),
    ];

    // Counter-clockwise when seen from outside
    let triangles = vec![
        [4, 5, 6], [4, 6, 7], // +z
        [1, 0, 3], [1, 3, 2], // -z
        [5, 1, 2], [5, 2, 6], // +x
        [0, 4, 7], [0, 7, 3], // -x
        [7, 6, 2], [7, 2, 3], // +y
        [0, 1, 5], [0, 5, 4], // -y
    ];

    MeshData { positions, triangles }
}

fn build_plane(width: f32, height: f32) -> MeshData {
    let (x, y) = (width * 0.5, height * 0.5);
    MeshData {
        positions: vec![
            Vec3::new(-x, -y, 0.0),
            Vec3::new(x, -y, 0.0),
            Vec3::new(x, y, 0.0),
            Vec3::new(-x, y, 0.0),
        ],
        triangles: vec![[0, 1, 2], [0, 2, 3]],
    }
}

fn build_sphere(radius: f32, width_segments: u32, height_segments: u32) -> MeshData {
    let mut positions = Vec::new();
    let mut triangles = Vec::new();

    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            positions.push(Vec3::new(
                -radius * (u * 2.0 * PI).cos() * (v * PI).sin(),
                radius * (v * PI).cos(),
                radius * (u * 2.0 * PI).sin() * (v * PI).sin(),
            ));
        }
    }

    let row = width_segments + 1;
    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;

            if iy != 0 {
                triangles.push([a, b, d]);
            }
            if iy != height_segments - 1 {
                triangles.push([b, c, d]);
            }
        }
    }

    MeshData { positions, triangles }
}

fn build_icosahedron(radius: f32, detail: u32) -> MeshData {
    let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
    let mut positions: Vec<Vec3> = [
        (-1.0, t, 0.0),
        (1.0, t, 0.0),
        (-1.0, -t, 0.0),
        (1.0, -t, 0.0),
        (0.0, -1.0, t),
        (0.0, 1.0, t),
        (0.0, -1.0, -t),
        (0.0, 1.0, -t),
        (t, 0.0, -1.0),
        (t, 0.0, 1.0),
        (-t, 0.0, -1.0),
        (-t, 0.0, 1.0),
    ]
    .iter()
    .map(|&(x, y, z)| Vec3::new(x, y, z).normalize() * radius)
    .collect();

    let mut triangles: Vec<[u32; 3]> = vec![
        [0, 11, 5], [0, 5, 1], [0, 1, 7], [0, 7, 10], [0, 10, 11],
        [1, 5, 9], [5, 11, 4], [11, 10, 2], [10, 7, 6], [7, 1, 8],
        [3, 9, 4], [3, 4, 2], [3, 2, 6], [3, 6, 8], [3, 8, 9],
        [4, 9, 5], [2, 4, 11], [6, 2, 10], [8, 6, 7], [9, 8, 1],
    ];

    for _ in 0..detail {
        let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
        let mut midpoint = |a: u32, b: u32, positions: &mut Vec<Vec3>| -> u32 {
            let key = (a.min(b), a.max(b));
            *midpoints.entry(key).or_insert_with(|| {
                let mid = (positions[a as usize] + positions[b as usize]) * 0.5;
                positions.push(mid.normalize() * radius);
                (positions.len() - 1) as u32
            })
        };

        let mut next = Vec::with_capacity(triangles.len() * 4);
        for [a, b, c] in triangles {
            let ab = midpoint(a, b, &mut positions);
            let bc = midpoint(b, c, &mut positions);
            let ca = midpoint(c, a, &mut positions);
            next.extend_from_slice(&[[a, ab, ca], [b, bc, ab], [c, ca, bc], [ab, bc, ca]]);
        }
        triangles = next;
    }

    MeshData { positions, triangles }
}

#[derive(Debug)]
struct GeometryInner {
    shape: Shape,
    data: MeshData,
    disposed: Cell<bool>,
    ledger: ResourceLedger,
}

/// Geometry resource handle; clones share one allocation
#[derive(Debug, Clone)]
pub struct Geometry {
    inner: Rc<GeometryInner>,
}

impl Geometry {
    pub(crate) fn allocate(shape: Shape, ledger: &ResourceLedger) -> Self {
        ledger.record_alloc(ResourceKind::Geometry);
        Self {
            inner: Rc::new(GeometryInner {
                shape,
                data: shape.build(),
                disposed: Cell::new(false),
                ledger: ledger.clone(),
            }),
        }
    }

    pub fn shape(&self) -> Shape {
        self.inner.shape
    }

    pub fn data(&self) -> &MeshData {
        &self.inner.data
    }

    pub fn triangle_count(&self) -> usize {
        self.inner.data.triangles.len()
    }

    /// Release the geometry; repeated calls are no-ops
    pub fn dispose(&self) {
        if !self.inner.disposed.replace(true) {
            self.inner.ledger.record_release(ResourceKind::Geometry);
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    pub fn same_resource(&self, other: &Geometry) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}
