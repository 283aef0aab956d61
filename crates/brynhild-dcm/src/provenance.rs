//! Per-key provenance: which layer a value's leaves ultimately came from.

use std::collections::BTreeMap;

/// Where a value (or one of its leaves) was last written from.
///
/// `layer` follows the DCM convention: `-1` means the front (user-override)
/// layer, and `0..N` indexes into `source_layers` from lowest to highest
/// priority.
#[derive(Debug, Clone, PartialEq)]
pub struct Provenance {
    pub layer: i64,
    pub children: BTreeMap<String, Provenance>,
}

impl Provenance {
    pub fn leaf(layer: i64) -> Self {
        Provenance {
            layer,
            children: BTreeMap::new(),
        }
    }

    pub fn with_children(layer: i64, children: BTreeMap<String, Provenance>) -> Self {
        Provenance { layer, children }
    }

    /// `true` if this node (or a descendant) was touched by the front layer.
    pub fn touches_front(&self) -> bool {
        self.layer == -1 || self.children.values().any(Provenance::touches_front)
    }
}
