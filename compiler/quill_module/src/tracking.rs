//! Process-wide record of compiled modules.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::collab::Binary;
use crate::session::ModuleName;

/// `(module, binary)` pairs in the order modules finished loading.
///
/// Shared by every clone; nested compilations triggered from hooks record
/// into the same list as their parent.
#[derive(Clone, Debug, Default)]
pub struct CompiledUnits {
    units: Arc<Mutex<Vec<(ModuleName, Binary)>>>,
}

impl CompiledUnits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, module: ModuleName, binary: Binary) {
        self.units.lock().push((module, binary));
    }

    pub fn modules(&self) -> Vec<ModuleName> {
        self.units.lock().iter().map(|(m, _)| *m).collect()
    }

    pub fn len(&self) -> usize {
        self.units.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.lock().is_empty()
    }

    /// Take every recorded unit, leaving the record empty.
    pub fn drain(&self) -> Vec<(ModuleName, Binary)> {
        std::mem::take(&mut *self.units.lock())
    }
}
