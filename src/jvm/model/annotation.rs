use crate::jvm::class_file::ConstantIndex;
use crate::jvm::model::reader::AttributeReader;
use crate::jvm::model::ConstantsPool;
use crate::jvm::{Error, Serialize};

/// Annotation on a class, field, or method
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.16
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Field descriptor of the annotation type (eg. `Lorg/spongepowered/asm/mixin/Mixin;`)
    pub descriptor: String,
    pub elements: Vec<(String, ElementValue)>,
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.16.1
#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    /// Primitive or string constant (`tag` is one of `BCDFIJSZs`)
    Const { tag: u8, value: ConstantIndex },

    Enum { descriptor: String, name: String },

    /// Return descriptor of a class literal (eg. `Ljava/lang/String;` or `V`)
    Class(String),

    Annotation(Annotation),
    Array(Vec<ElementValue>),
}

impl Annotation {
    pub fn new(descriptor: impl Into<String>) -> Annotation {
        Annotation {
            descriptor: descriptor.into(),
            elements: vec![],
        }
    }

    pub(crate) fn read(reader: &mut AttributeReader) -> Result<Annotation, Error> {
        let descriptor = reader.utf8()?;
        let count = reader.u16()?;
        let mut elements = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let name = reader.utf8()?;
            elements.push((name, ElementValue::read(reader)?));
        }
        Ok(Annotation {
            descriptor,
            elements,
        })
    }

    /// Parse the body of a `Runtime(In)VisibleAnnotations` attribute
    pub(crate) fn read_all(reader: &mut AttributeReader) -> Result<Vec<Annotation>, Error> {
        let count = reader.u16()?;
        let mut annotations = Vec::with_capacity(count as usize);
        for _ in 0..count {
            annotations.push(Annotation::read(reader)?);
        }
        Ok(annotations)
    }

    pub(crate) fn write(&self, constants: &mut ConstantsPool, info: &mut Vec<u8>) -> Result<(), Error> {
        constants.get_utf8(&self.descriptor)?.serialize(info)?;
        (self.elements.len() as u16).serialize(info)?;
        for (name, value) in &self.elements {
            constants.get_utf8(name)?.serialize(info)?;
            value.write(constants, info)?;
        }
        Ok(())
    }

    pub(crate) fn write_all(
        annotations: &[Annotation],
        constants: &mut ConstantsPool,
    ) -> Result<Vec<u8>, Error> {
        let mut info = vec![];
        (annotations.len() as u16).serialize(&mut info)?;
        for annotation in annotations {
            annotation.write(constants, &mut info)?;
        }
        Ok(info)
    }
}

impl ElementValue {
    fn read(reader: &mut AttributeReader) -> Result<ElementValue, Error> {
        let value = match reader.u8()? {
            tag @ (b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's') => {
                ElementValue::Const {
                    tag,
                    value: reader.index()?,
                }
            }
            b'e' => ElementValue::Enum {
                descriptor: reader.utf8()?,
                name: reader.utf8()?,
            },
            b'c' => ElementValue::Class(reader.utf8()?),
            b'@' => ElementValue::Annotation(Annotation::read(reader)?),
            b'[' => {
                let count = reader.u16()?;
                let mut values = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    values.push(ElementValue::read(reader)?);
                }
                ElementValue::Array(values)
            }
            tag => {
                return Err(Error::malformed(format!(
                    "invalid annotation element tag {:?}",
                    tag as char
                )))
            }
        };
        Ok(value)
    }

    fn write(&self, constants: &mut ConstantsPool, info: &mut Vec<u8>) -> Result<(), Error> {
        match self {
            ElementValue::Const { tag, value } => {
                tag.serialize(info)?;
                value.serialize(info)?;
            }
            ElementValue::Enum { descriptor, name } => {
                b'e'.serialize(info)?;
                constants.get_utf8(descriptor)?.serialize(info)?;
                constants.get_utf8(name)?.serialize(info)?;
            }
            ElementValue::Class(descriptor) => {
                b'c'.serialize(info)?;
                constants.get_utf8(descriptor)?.serialize(info)?;
            }
            ElementValue::Annotation(annotation) => {
                b'@'.serialize(info)?;
                annotation.write(constants, info)?;
            }
            ElementValue::Array(values) => {
                b'['.serialize(info)?;
                (values.len() as u16).serialize(info)?;
                for value in values {
                    value.write(constants, info)?;
                }
            }
        }
        Ok(())
    }
}
