use crate::jvm::class_file::{ClassFile, Field, Method};
use crate::jvm::model::attributes::Attributes;
use crate::jvm::model::{Annotation, Code, ConstantsPool, RawAttribute};
use crate::jvm::{Error, FieldAccessFlags, MethodAccessFlags};

/// Field of a class, with its name and descriptor resolved
#[derive(Debug, Clone, PartialEq)]
pub struct FieldNode {
    pub access_flags: FieldAccessFlags,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub visible_annotations: Vec<Annotation>,
    pub invisible_annotations: Vec<Annotation>,

    /// Other attributes (eg. `ConstantValue`)
    pub attributes: Vec<RawAttribute>,
}

/// Method of a class, with its name and descriptor resolved
#[derive(Debug, Clone, PartialEq)]
pub struct MethodNode {
    pub access_flags: MethodAccessFlags,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub visible_annotations: Vec<Annotation>,
    pub invisible_annotations: Vec<Annotation>,

    /// Body of the method (absent for `abstract` and `native` methods)
    pub code: Option<Code>,

    /// Other attributes (eg. `Exceptions`)
    pub attributes: Vec<RawAttribute>,
}

impl FieldNode {
    pub fn new(
        access_flags: FieldAccessFlags,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> FieldNode {
        FieldNode {
            access_flags,
            name: name.into(),
            descriptor: descriptor.into(),
            signature: None,
            visible_annotations: vec![],
            invisible_annotations: vec![],
            attributes: vec![],
        }
    }

    pub(crate) fn from_field(class_file: &ClassFile, field: &Field) -> Result<FieldNode, Error> {
        let attributes = Attributes::read(class_file, &field.attributes, false)?;
        Ok(FieldNode {
            access_flags: field.access_flags,
            name: class_file.utf8(field.name_index)?.to_owned(),
            descriptor: class_file.utf8(field.descriptor_index)?.to_owned(),
            signature: attributes.signature,
            visible_annotations: attributes.visible_annotations,
            invisible_annotations: attributes.invisible_annotations,
            attributes: attributes.others,
        })
    }

    pub(crate) fn to_field(&self, constants: &mut ConstantsPool) -> Result<Field, Error> {
        let mut attributes = vec![];
        Attributes::write(
            self.signature.as_deref(),
            &self.visible_annotations,
            &self.invisible_annotations,
            &self.attributes,
            constants,
            &mut attributes,
        )?;
        Ok(Field {
            access_flags: self.access_flags,
            name_index: constants.get_utf8(&self.name)?,
            descriptor_index: constants.get_utf8(&self.descriptor)?,
            attributes,
        })
    }
}

impl MethodNode {
    pub fn new(
        access_flags: MethodAccessFlags,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> MethodNode {
        MethodNode {
            access_flags,
            name: name.into(),
            descriptor: descriptor.into(),
            signature: None,
            visible_annotations: vec![],
            invisible_annotations: vec![],
            code: None,
            attributes: vec![],
        }
    }

    /// Does the method carry a runtime-visible annotation of this type?
    pub fn has_visible_annotation(&self, descriptor: &str) -> bool {
        self.visible_annotations
            .iter()
            .any(|annotation| annotation.descriptor == descriptor)
    }

    pub fn is_static(&self) -> bool {
        self.access_flags.contains(MethodAccessFlags::STATIC)
    }

    pub(crate) fn from_method(
        class_file: &ClassFile,
        method: &Method,
    ) -> Result<MethodNode, Error> {
        let attributes = Attributes::read(class_file, &method.attributes, true)?;
        Ok(MethodNode {
            access_flags: method.access_flags,
            name: class_file.utf8(method.name_index)?.to_owned(),
            descriptor: class_file.utf8(method.descriptor_index)?.to_owned(),
            signature: attributes.signature,
            visible_annotations: attributes.visible_annotations,
            invisible_annotations: attributes.invisible_annotations,
            code: attributes.code,
            attributes: attributes.others,
        })
    }

    pub(crate) fn to_method(&self, constants: &mut ConstantsPool) -> Result<Method, Error> {
        let mut attributes = vec![];
        if let Some(code) = &self.code {
            attributes.push(code.write(constants)?);
        }
        Attributes::write(
            self.signature.as_deref(),
            &self.visible_annotations,
            &self.invisible_annotations,
            &self.attributes,
            constants,
            &mut attributes,
        )?;
        Ok(Method {
            access_flags: self.access_flags,
            name_index: constants.get_utf8(&self.name)?,
            descriptor_index: constants.get_utf8(&self.descriptor)?,
            attributes,
        })
    }
}
