//! Deep Chain Map: a layered, deep-merging configuration map.
//!
//! Values flow from zero or more append-only source layers (lowest
//! priority first) through an always-winning mutable front layer. Layers
//! may tombstone a key (`!delete`) or disable merging for a subtree
//! (`!replace`); list-valued keys accept deferred operations that replay
//! against whatever the merged list turns out to be.

mod error;
mod map;
mod ops;
mod provenance;
mod value;

pub use error::{DcmError, Result};
pub use map::DeepChainMap;
pub use ops::{apply_list_ops, ListOp};
pub use provenance::Provenance;
pub use value::DcmValue;
