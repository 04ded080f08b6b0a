use crate::jvm::class_file::{Attribute, ClassFile};
use crate::jvm::model::reader::AttributeReader;
use crate::jvm::model::{Annotation, Code, ConstantsPool};
use crate::jvm::{Error, Serialize};

/// Attribute that is carried through as opaque bytes
///
/// Any pool indices inside `info` stay valid across re-encoding, since pool slots never move.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAttribute {
    pub name: String,
    pub info: Vec<u8>,
}

impl RawAttribute {
    pub(crate) fn write(&self, constants: &mut ConstantsPool) -> Result<Attribute, Error> {
        Ok(Attribute {
            name_index: constants.get_utf8(&self.name)?,
            info: self.info.clone(),
        })
    }
}

const SIGNATURE: &str = "Signature";
const VISIBLE_ANNOTATIONS: &str = "RuntimeVisibleAnnotations";
const INVISIBLE_ANNOTATIONS: &str = "RuntimeInvisibleAnnotations";

/// Attributes shared by classes, fields, and methods, split out of the raw attribute list
#[derive(Default)]
pub(crate) struct Attributes {
    pub signature: Option<String>,
    pub visible_annotations: Vec<Annotation>,
    pub invisible_annotations: Vec<Annotation>,
    pub code: Option<Code>,
    pub others: Vec<RawAttribute>,
}

impl Attributes {
    /// Pick apart the attributes we understand (`Code` only when `with_code` is set)
    pub fn read(
        class_file: &ClassFile,
        attributes: &[Attribute],
        with_code: bool,
    ) -> Result<Attributes, Error> {
        let mut parsed = Attributes::default();
        for attribute in attributes {
            let name = class_file.utf8(attribute.name_index)?;
            let mut reader = AttributeReader::new(class_file, name, &attribute.info);
            match name {
                SIGNATURE => {
                    parsed.signature = Some(reader.utf8()?);
                    reader.finish()?;
                }
                VISIBLE_ANNOTATIONS => {
                    let annotations = Annotation::read_all(&mut reader)?;
                    reader.finish()?;
                    parsed.visible_annotations.extend(annotations);
                }
                INVISIBLE_ANNOTATIONS => {
                    let annotations = Annotation::read_all(&mut reader)?;
                    reader.finish()?;
                    parsed.invisible_annotations.extend(annotations);
                }
                Code::NAME if with_code => {
                    parsed.code = Some(Code::read(class_file, &attribute.info)?);
                }
                _ => parsed.others.push(RawAttribute {
                    name: name.to_owned(),
                    info: attribute.info.clone(),
                }),
            }
        }
        Ok(parsed)
    }

    pub fn write(
        signature: Option<&str>,
        visible_annotations: &[Annotation],
        invisible_annotations: &[Annotation],
        others: &[RawAttribute],
        constants: &mut ConstantsPool,
        out: &mut Vec<Attribute>,
    ) -> Result<(), Error> {
        if let Some(signature) = signature {
            let mut info = vec![];
            constants.get_utf8(signature)?.serialize(&mut info)?;
            out.push(Attribute {
                name_index: constants.get_utf8(SIGNATURE)?,
                info,
            });
        }
        if !visible_annotations.is_empty() {
            let info = Annotation::write_all(visible_annotations, constants)?;
            out.push(Attribute {
                name_index: constants.get_utf8(VISIBLE_ANNOTATIONS)?,
                info,
            });
        }
        if !invisible_annotations.is_empty() {
            let info = Annotation::write_all(invisible_annotations, constants)?;
            out.push(Attribute {
                name_index: constants.get_utf8(INVISIBLE_ANNOTATIONS)?,
                info,
            });
        }
        for attribute in others {
            out.push(attribute.write(constants)?);
        }
        Ok(())
    }
}
