//! Binary class codec
//!
//! Classes move through two representations:
//!
//!   - [`class_file::ClassFile`] mirrors the binary layout, with everything pointing into the
//!     constant pool by index
//!   - [`model::ClassNode`] resolves all of those indices into names and descriptors, so that the
//!     class can be edited (remapped, patched) without worrying about the pool
//!
//! [`decode`] and [`encode`] go straight between bytes and the editable model.
//!
//! ```
//! use litecompat::jvm::{self, model::{ClassNode, MethodNode}, MethodAccessFlags};
//!
//! # fn make_class() -> Result<(), jvm::Error> {
//! let mut class = ClassNode::new("me/alec/Point", Some("java/lang/Object"));
//! class.methods.push(MethodNode::new(
//!     MethodAccessFlags::PUBLIC | MethodAccessFlags::ABSTRACT,
//!     "norm",
//!     "()D",
//! ));
//!
//! let bytes: Vec<u8> = jvm::encode(&class)?;
//! let decoded = jvm::decode(&bytes)?;
//! assert_eq!(decoded.name, "me/alec/Point");
//! assert_eq!(decoded.methods[0].descriptor, "()D");
//! # Ok(())
//! # }
//! # make_class().unwrap();
//! ```

mod access_flags;
mod binary_format;
pub mod class_file;
mod descriptors;
mod errors;
pub mod model;
mod names;

pub use access_flags::*;
pub use binary_format::*;
pub use class_file::Constant;
pub use descriptors::*;
pub use errors::*;
pub use names::*;

use class_file::ClassFile;
use model::ClassNode;

/// Parse raw class bytes into the editable model
///
/// Fails with [`Error::MalformedClassData`] if the bytes are not a well-formed class file.
pub fn decode(bytes: &[u8]) -> Result<ClassNode, Error> {
    let class_file = ClassFile::from_bytes(bytes)?;
    ClassNode::from_class_file(&class_file)
}

/// Serialize the editable model back into class bytes
///
/// Lengths and counts are recomputed from the model.
pub fn encode(class: &ClassNode) -> Result<Vec<u8>, Error> {
    class.to_class_file()?.to_bytes()
}
