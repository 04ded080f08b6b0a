//! Rewriting symbolic references from one namespace into another
//!
//! A [`Remapper`] only answers questions about single names. [`remap_class`] walks a whole
//! [`ClassNode`] and asks it about every class name, descriptor, signature, and member reference
//! it finds.

mod mapping;

pub use mapping::*;

use crate::jvm::model::{
    Annotation, ClassNode, Code, ElementValue, MemberRef, PoolEntry, StackMapFrame,
};
use crate::jvm::{map_class_constant, map_descriptor, map_signature};
use std::convert::Infallible;

/// Symbol remapper contract
///
/// Implementations must be safe to share between threads: registration happens through `&self`.
pub trait Remapper: Send + Sync {
    /// Learn the shape of a class (before it is remapped), so that later lookups on classes
    /// which extend it can resolve inherited members
    fn register_class(&self, class: &ClassNode);

    /// Map an internal class name (eg. `net/minecraft/class_310`)
    fn map_type(&self, name: &str) -> String;

    /// Map the name of a field, identified in the old namespace
    fn map_field_name(&self, owner: &str, name: &str, descriptor: &str) -> String;

    /// Map the name of a method, identified in the old namespace
    fn map_method_name(&self, owner: &str, name: &str, descriptor: &str) -> String;

    fn map_descriptor(&self, descriptor: &str) -> String {
        map_descriptor(descriptor, &mut |name: &str| self.map_type(name))
    }

    fn map_signature(&self, signature: &str) -> String {
        map_signature(signature, &mut |name: &str| self.map_type(name))
    }

    /// Map the name held by a class constant (which is a descriptor for array classes)
    fn map_class_constant(&self, name: &str) -> String {
        map_class_constant(name, &mut |name: &str| self.map_type(name))
    }
}

/// Doesn't remap anything
pub struct IdentityRemapper;

impl Remapper for IdentityRemapper {
    fn register_class(&self, _class: &ClassNode) {}

    fn map_type(&self, name: &str) -> String {
        name.to_owned()
    }

    fn map_field_name(&self, _owner: &str, name: &str, _descriptor: &str) -> String {
        name.to_owned()
    }

    fn map_method_name(&self, _owner: &str, name: &str, _descriptor: &str) -> String {
        name.to_owned()
    }
}

/// Produce a copy of the class with every symbolic reference remapped
///
/// String literals are left alone, as are names the remapper can't know about without more
/// context (bootstrap method names, inner class simple names, annotation element names).
///
/// Attributes carried through raw keep the old namespace. That covers parameter annotations,
/// `AnnotationDefault`, and `EnclosingMethod`, whose method name lives in a standalone name & type
/// entry: only the descriptor of such an entry is remapped, since it has no owner to look the
/// name up against.
pub fn remap_class(remapper: &dyn Remapper, class: &ClassNode) -> ClassNode {
    let mut remapped = class.clone();
    let owner = class.name.as_str();

    for (_, entry) in remapped.constants.iter_mut() {
        remap_pool_entry(remapper, entry);
    }

    remapped.name = remapper.map_type(&class.name);
    remapped.super_name = class.super_name.as_deref().map(|name| remapper.map_type(name));
    remapped.interfaces = class
        .interfaces
        .iter()
        .map(|name| remapper.map_type(name))
        .collect();
    remap_signature(remapper, &mut remapped.signature);
    remap_annotations(remapper, &mut remapped.visible_annotations);
    remap_annotations(remapper, &mut remapped.invisible_annotations);

    for field in &mut remapped.fields {
        field.name = remapper.map_field_name(owner, &field.name, &field.descriptor);
        field.descriptor = remapper.map_descriptor(&field.descriptor);
        remap_signature(remapper, &mut field.signature);
        remap_annotations(remapper, &mut field.visible_annotations);
        remap_annotations(remapper, &mut field.invisible_annotations);
    }

    for method in &mut remapped.methods {
        method.name = remapper.map_method_name(owner, &method.name, &method.descriptor);
        method.descriptor = remapper.map_descriptor(&method.descriptor);
        remap_signature(remapper, &mut method.signature);
        remap_annotations(remapper, &mut method.visible_annotations);
        remap_annotations(remapper, &mut method.invisible_annotations);
        if let Some(code) = &mut method.code {
            remap_code(remapper, code);
        }
    }

    remapped
}

fn remap_pool_entry(remapper: &dyn Remapper, entry: &mut PoolEntry) {
    match entry {
        PoolEntry::Class(name) => *name = remapper.map_class_constant(name),
        PoolEntry::FieldRef(member) => {
            let name = remapper.map_field_name(&member.owner, &member.name, &member.descriptor);
            remap_member_ref(remapper, member, name);
        }
        PoolEntry::MethodRef { member, .. } => {
            let name = remapper.map_method_name(&member.owner, &member.name, &member.descriptor);
            remap_member_ref(remapper, member, name);
        }
        PoolEntry::NameAndType { descriptor, .. }
        | PoolEntry::Dynamic { descriptor, .. }
        | PoolEntry::InvokeDynamic { descriptor, .. } => {
            *descriptor = remapper.map_descriptor(descriptor)
        }
        PoolEntry::MethodType(descriptor) => *descriptor = remapper.map_descriptor(descriptor),
        PoolEntry::Utf8(_)
        | PoolEntry::RawUtf8(_)
        | PoolEntry::RawString(_)
        | PoolEntry::Integer(_)
        | PoolEntry::Float(_)
        | PoolEntry::Long(_)
        | PoolEntry::Double(_)
        | PoolEntry::String(_)
        | PoolEntry::MethodHandle { .. }
        | PoolEntry::Module(_)
        | PoolEntry::Package(_) => (),
    }
}

fn remap_member_ref(remapper: &dyn Remapper, member: &mut MemberRef, name: String) {
    member.owner = remapper.map_class_constant(&member.owner);
    member.name = name;
    member.descriptor = remapper.map_descriptor(&member.descriptor);
}

fn remap_signature(remapper: &dyn Remapper, signature: &mut Option<String>) {
    if let Some(signature) = signature {
        *signature = remapper.map_signature(signature);
    }
}

fn remap_annotations(remapper: &dyn Remapper, annotations: &mut [Annotation]) {
    for annotation in annotations {
        remap_annotation(remapper, annotation);
    }
}

fn remap_annotation(remapper: &dyn Remapper, annotation: &mut Annotation) {
    annotation.descriptor = remapper.map_descriptor(&annotation.descriptor);
    for (_, value) in &mut annotation.elements {
        remap_element_value(remapper, value);
    }
}

fn remap_element_value(remapper: &dyn Remapper, value: &mut ElementValue) {
    match value {
        ElementValue::Const { .. } => (),
        ElementValue::Enum { descriptor, .. } | ElementValue::Class(descriptor) => {
            *descriptor = remapper.map_descriptor(descriptor)
        }
        ElementValue::Annotation(annotation) => remap_annotation(remapper, annotation),
        ElementValue::Array(values) => {
            for value in values {
                remap_element_value(remapper, value);
            }
        }
    }
}

fn remap_code(remapper: &dyn Remapper, code: &mut Code) {
    if let Some(frames) = &mut code.stack_map_frames {
        let remapped: Result<Vec<StackMapFrame<String>>, Infallible> = frames
            .iter()
            .map(|frame| {
                frame.map(&mut |class: &String| Ok(remapper.map_class_constant(class)))
            })
            .collect();
        match remapped {
            Ok(remapped) => *frames = remapped,
            Err(never) => match never {},
        }
    }
    for variable in &mut code.local_variables {
        variable.descriptor = remapper.map_descriptor(&variable.descriptor);
    }
    for variable in &mut code.local_variable_types {
        variable.descriptor = remapper.map_signature(&variable.descriptor);
    }
}
