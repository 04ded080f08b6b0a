use crate::jvm::class_file::{ClassConstantIndex, ClassFile, ConstantIndex, Version};
use crate::jvm::model::attributes::Attributes;
use crate::jvm::model::{
    Annotation, ConstantPool, ConstantsPool, FieldNode, MethodNode, RawAttribute,
};
use crate::jvm::{ClassAccessFlags, Error};

/// Editable class, with every constant pool reference resolved into names and descriptors
#[derive(Debug, Clone, PartialEq)]
pub struct ClassNode {
    pub version: Version,
    pub access_flags: ClassAccessFlags,

    /// Internal name of the class (eg. `me/alec/Point`)
    pub name: String,

    /// Internal name of the super class (`None` only for `java/lang/Object` and `module-info`)
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<FieldNode>,
    pub methods: Vec<MethodNode>,
    pub signature: Option<String>,
    pub visible_annotations: Vec<Annotation>,
    pub invisible_annotations: Vec<Annotation>,

    /// Other attributes (eg. `SourceFile`, `InnerClasses`, `BootstrapMethods`)
    pub attributes: Vec<RawAttribute>,

    /// Constant pool the class was decoded from
    ///
    /// Method bodies and raw attributes refer to entries here by slot.
    pub constants: ConstantPool,
}

impl ClassNode {
    /// Make an empty public class
    pub fn new(name: impl Into<String>, super_name: Option<&str>) -> ClassNode {
        ClassNode {
            version: Version::JAVA8,
            access_flags: ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
            name: name.into(),
            super_name: super_name.map(String::from),
            interfaces: vec![],
            fields: vec![],
            methods: vec![],
            signature: None,
            visible_annotations: vec![],
            invisible_annotations: vec![],
            attributes: vec![],
            constants: ConstantPool::new(),
        }
    }

    /// Does the class carry a build-time (invisible) annotation of this type?
    pub fn has_invisible_annotation(&self, descriptor: &str) -> bool {
        self.invisible_annotations
            .iter()
            .any(|annotation| annotation.descriptor == descriptor)
    }

    pub fn from_class_file(class_file: &ClassFile) -> Result<ClassNode, Error> {
        let constants = ConstantPool::from_class_file(class_file)?;
        let super_name = if class_file.super_class.0 == ConstantIndex::NONE {
            None
        } else {
            Some(class_file.class_name(class_file.super_class)?.to_owned())
        };
        let interfaces = class_file
            .interfaces
            .iter()
            .map(|interface| Ok::<_, Error>(class_file.class_name(*interface)?.to_owned()))
            .collect::<Result<Vec<_>, Error>>()?;
        let fields = class_file
            .fields
            .iter()
            .map(|field| FieldNode::from_field(class_file, field))
            .collect::<Result<Vec<_>, Error>>()?;
        let methods = class_file
            .methods
            .iter()
            .map(|method| MethodNode::from_method(class_file, method))
            .collect::<Result<Vec<_>, Error>>()?;
        let attributes = Attributes::read(class_file, &class_file.attributes, false)?;

        Ok(ClassNode {
            version: class_file.version,
            access_flags: class_file.access_flags,
            name: class_file.class_name(class_file.this_class)?.to_owned(),
            super_name,
            interfaces,
            fields,
            methods,
            signature: attributes.signature,
            visible_annotations: attributes.visible_annotations,
            invisible_annotations: attributes.invisible_annotations,
            attributes: attributes.others,
            constants,
        })
    }

    /// Lower the class back into the raw format
    ///
    /// The pool starts with the entries of [`ClassNode::constants`] in their original slots, and
    /// anything new (renamed classes, fresh descriptors) gets appended.
    pub fn to_class_file(&self) -> Result<ClassFile, Error> {
        let mut constants = ConstantsPool::seeded_from(&self.constants)?;

        let this_class = constants.get_class(&self.name)?;
        let super_class = match &self.super_name {
            Some(super_name) => constants.get_class(super_name)?,
            None => ClassConstantIndex(ConstantIndex::NONE),
        };
        let interfaces = self
            .interfaces
            .iter()
            .map(|interface| constants.get_class(interface))
            .collect::<Result<Vec<_>, Error>>()?;
        let fields = self
            .fields
            .iter()
            .map(|field| field.to_field(&mut constants))
            .collect::<Result<Vec<_>, Error>>()?;
        let methods = self
            .methods
            .iter()
            .map(|method| method.to_method(&mut constants))
            .collect::<Result<Vec<_>, Error>>()?;
        let mut attributes = vec![];
        Attributes::write(
            self.signature.as_deref(),
            &self.visible_annotations,
            &self.invisible_annotations,
            &self.attributes,
            &mut constants,
            &mut attributes,
        )?;

        Ok(ClassFile {
            version: self.version,
            constants: constants.into_offset_vec(),
            access_flags: self.access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jvm::model::{
        Code, ElementValue, LocalVariable, PoolEntry, StackMapFrame, VerificationType,
    };
    use crate::jvm::{self, FieldAccessFlags, MethodAccessFlags};

    fn sample_class() -> ClassNode {
        let mut class = ClassNode::new("me/alec/Widget", Some("me/alec/Base"));
        class.interfaces.push(String::from("java/lang/Runnable"));
        class.signature = Some(String::from("Lme/alec/Base<Ljava/lang/String;>;"));

        let mut mixin = Annotation::new("Lorg/spongepowered/asm/mixin/Mixin;");
        mixin.elements.push((
            String::from("value"),
            ElementValue::Array(vec![ElementValue::Class(String::from("Lme/alec/Target;"))]),
        ));
        class.invisible_annotations.push(mixin);

        let mut field = FieldNode::new(FieldAccessFlags::PRIVATE, "count", "I");
        field
            .visible_annotations
            .push(Annotation::new("Ljava/lang/Deprecated;"));
        class.fields.push(field);

        let mut run = MethodNode::new(MethodAccessFlags::PUBLIC, "run", "()V");
        run.code = Some(Code {
            max_stack: 1,
            max_locals: 1,
            bytecode: vec![0x2A, 0x57, 0xB1], // aload_0, pop, return
            exception_table: vec![],
            stack_map_frames: Some(vec![StackMapFrame::Full {
                offset_delta: 2,
                locals: vec![VerificationType::Object(String::from("me/alec/Widget"))],
                stack: vec![],
            }]),
            local_variables: vec![LocalVariable {
                start_pc: 0,
                length: 3,
                name: String::from("this"),
                descriptor: String::from("Lme/alec/Widget;"),
                index: 0,
            }],
            local_variable_types: vec![],
            attributes: vec![],
        });
        class.methods.push(run);
        class
    }

    #[test]
    fn decode_what_was_encoded() {
        let class = sample_class();
        let decoded = jvm::decode(&jvm::encode(&class).unwrap()).unwrap();

        assert_eq!(decoded.name, class.name);
        assert_eq!(decoded.super_name, class.super_name);
        assert_eq!(decoded.interfaces, class.interfaces);
        assert_eq!(decoded.signature, class.signature);
        assert_eq!(decoded.invisible_annotations, class.invisible_annotations);
        assert!(decoded.has_invisible_annotation("Lorg/spongepowered/asm/mixin/Mixin;"));
        assert_eq!(decoded.fields, class.fields);
        assert_eq!(decoded.methods, class.methods);
    }

    #[test]
    fn reencoding_is_stable() {
        let bytes = jvm::encode(&sample_class()).unwrap();
        let again = jvm::encode(&jvm::decode(&bytes).unwrap()).unwrap();
        assert_eq!(bytes, again);
    }

    #[test]
    fn object_has_no_super_class() {
        let class = ClassNode::new("java/lang/Object", None);
        let class_file = class.to_class_file().unwrap();
        assert_eq!(class_file.super_class, ClassConstantIndex(ConstantIndex::NONE));

        let decoded = ClassNode::from_class_file(&class_file).unwrap();
        assert_eq!(decoded.super_name, None);
    }

    #[test]
    fn reject_truncated_attribute() {
        let mut class_file = sample_class().to_class_file().unwrap();
        class_file.attributes[0].info.pop();
        assert!(matches!(
            ClassNode::from_class_file(&class_file),
            Err(Error::MalformedClassData(_))
        ));
    }

    #[test]
    fn unpaired_surrogate_literal_survives() {
        let mut class = sample_class();
        class.constants.push(PoolEntry::String(String::from("ZQZ")));
        let mut bytes = jvm::encode(&class).unwrap();

        // `"\uD800"` as `javac` writes it
        let at = bytes.windows(3).position(|w| w == b"ZQZ").unwrap();
        bytes[at..at + 3].copy_from_slice(&[0xED, 0xA0, 0x80]);

        let decoded = jvm::decode(&bytes).unwrap();
        assert!(decoded
            .constants
            .iter()
            .any(|(_, entry)| matches!(entry, PoolEntry::RawString(_))));
        assert!(decoded
            .constants
            .iter()
            .any(|(_, entry)| entry == &PoolEntry::RawUtf8(vec![0xED, 0xA0, 0x80])));
        assert_eq!(jvm::encode(&decoded).unwrap(), bytes);
    }
}
