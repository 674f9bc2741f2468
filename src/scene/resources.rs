use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Kind of disposable resource tracked by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Geometry,
    Material,
    Renderer,
}

#[derive(Debug, Default)]
struct LedgerCounts {
    allocated: HashMap<ResourceKind, usize>,
    released: HashMap<ResourceKind, usize>,
}

/// Shared allocation/release counters for GPU-side resources
///
/// Cloning shares the counters. A resource records its release once, no
/// matter how many times it is disposed.
#[derive(Debug, Clone, Default)]
pub struct ResourceLedger {
    counts: Rc<RefCell<LedgerCounts>>,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_alloc(&self, kind: ResourceKind) {
        *self.counts.borrow_mut().allocated.entry(kind).or_default() += 1;
    }

    pub(crate) fn record_release(&self, kind: ResourceKind) {
        *self.counts.borrow_mut().released.entry(kind).or_default() += 1;
    }

    pub fn allocated(&self, kind: ResourceKind) -> usize {
        self.counts.borrow().allocated.get(&kind).copied().unwrap_or(0)
    }

    pub fn released(&self, kind: ResourceKind) -> usize {
        self.counts.borrow().released.get(&kind).copied().unwrap_or(0)
    }

    /// Allocated but not yet released
    pub fn live(&self, kind: ResourceKind) -> usize {
        self.allocated(kind).saturating_sub(self.released(kind))
    }

    /// True when every allocation of every kind has been released
    pub fn is_balanced(&self) -> bool {
        [ResourceKind::Geometry, ResourceKind::Material, ResourceKind::Renderer]
            .into_iter()
            .all(|kind| self.live(kind) == 0)
    }
}
