//! Raw class file format
//!
//! Everything here mirrors the on-disk layout one-to-one: names and descriptors are still indices
//! into the constant pool. See [`crate::jvm::model`] for the resolved, editable form.

mod attribute;
mod class;
mod constants;
mod field;
mod method;
mod version;

pub use attribute::*;
pub use class::*;
pub use constants::*;
pub use field::*;
pub use method::*;
pub use version::*;
