use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::resources::{ResourceKind, ResourceLedger};
use crate::math::Color;

/// Shading model of a material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Shading {
    /// Flat color, ignores lights
    Basic,
    /// Color derived from the surface normal, ignores lights
    Normal,
    /// Diffuse, lit by ambient and point lights
    #[default]
    Lambert,
}

/// Material description used to allocate a [`Material`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialDesc {
    pub shading: Shading,
    pub color: Color,
    pub wireframe: bool,
}

impl Default for MaterialDesc {
    fn default() -> Self {
        Self {
            shading: Shading::Lambert,
            color: Color::WHITE,
            wireframe: false,
        }
    }
}

impl MaterialDesc {
    pub fn basic(color: Color) -> Self {
        Self {
            shading: Shading::Basic,
            color,
            wireframe: false,
        }
    }

    pub fn normal() -> Self {
        Self {
            shading: Shading::Normal,
            ..Self::default()
        }
    }

    pub fn lambert(color: Color) -> Self {
        Self {
            shading: Shading::Lambert,
            color,
            wireframe: false,
        }
    }

    pub fn with_wireframe(mut self, wireframe: bool) -> Self {
        self.wireframe = wireframe;
        self
    }
}

#[derive(Debug)]
struct MaterialInner {
    desc: Cell<MaterialDesc>,
    disposed: Cell<bool>,
    ledger: ResourceLedger,
}

/// Material resource handle; clones share one allocation
#[derive(Debug, Clone)]
pub struct Material {
    inner: Rc<MaterialInner>,
}

impl Material {
    pub(crate) fn allocate(desc: MaterialDesc, ledger: &ResourceLedger) -> Self {
        ledger.record_alloc(ResourceKind::Material);
        Self {
            inner: Rc::new(MaterialInner {
                desc: Cell::new(desc),
                disposed: Cell::new(false),
                ledger: ledger.clone(),
            }),
        }
    }

    pub fn desc(&self) -> MaterialDesc {
        self.inner.desc.get()
    }

    /// Materials stay mutable for animation, e.g. color cycling
    pub fn set_color(&self, color: Color) {
        let mut desc = self.inner.desc.get();
        desc.color = color;
        self.inner.desc.set(desc);
    }

    pub fn set_wireframe(&self, wireframe: bool) {
        let mut desc = self.inner.desc.get();
        desc.wireframe = wireframe;
        self.inner.desc.set(desc);
    }

    /// Release the material; repeated calls are no-ops
    pub fn dispose(&self) {
        if !self.inner.disposed.replace(true) {
            self.inner.ledger.record_release(ResourceKind::Material);
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }
}
