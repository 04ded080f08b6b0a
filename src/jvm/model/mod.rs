//! Resolved, editable view of a class
//!
//! Names and descriptors live directly on the nodes, so remapping and patching never have to
//! touch constant pool indices. The pool itself is kept slot-for-slot (see [`ConstantPool`]),
//! which is what lets bytecode and unknown attributes be carried through as raw bytes.

mod annotation;
mod attributes;
mod class;
mod code;
mod member;
mod pool;
mod reader;

pub use annotation::*;
pub use attributes::RawAttribute;
pub use class::*;
pub use code::*;
pub use member::*;
pub use pool::*;
