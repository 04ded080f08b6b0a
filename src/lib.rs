//! Run LiteLoader mods on a Fabric-style runtime by remapping their classes on demand
//!
//! A mod is a [`source::ModSource`] holding compiled classes named in an old namespace. The
//! [`provider::ClassProvider`] hands out those classes (and other resources) to a class loader,
//! rewriting each one into the runtime namespace the first time it is asked for.

pub mod container;
pub mod jvm;
pub mod location;
pub mod mappings;
pub mod patch;
pub mod provider;
pub mod remap;
pub mod settings;
pub mod source;
pub mod util;
