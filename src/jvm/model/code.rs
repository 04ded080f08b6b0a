use crate::jvm::class_file::{Attribute, ClassConstantIndex, ClassFile, ConstantIndex};
use crate::jvm::model::reader::AttributeReader;
use crate::jvm::model::{ConstantsPool, RawAttribute};
use crate::jvm::{Error, Serialize};
use byteorder::WriteBytesExt;

/// Method body
///
/// The bytecode itself is kept as-is: every constant it refers to keeps its slot in the pool.
/// Attributes which name classes by string (stack map frames and local variable tables) are
/// resolved so that they can be remapped.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.3
#[derive(Debug, Clone, PartialEq)]
pub struct Code {
    pub max_stack: u16,
    pub max_locals: u16,
    pub bytecode: Vec<u8>,
    pub exception_table: Vec<ExceptionHandler>,

    /// Frames from the `StackMapTable` attribute (if there was one)
    pub stack_map_frames: Option<Vec<StackMapFrame<String>>>,

    /// Entries of all `LocalVariableTable` attributes
    pub local_variables: Vec<LocalVariable>,

    /// Entries of all `LocalVariableTypeTable` attributes (`descriptor` holds the signature)
    pub local_variable_types: Vec<LocalVariable>,

    /// Other attributes (eg. `LineNumberTable`)
    pub attributes: Vec<RawAttribute>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionHandler {
    /// Start of exception handler range (inclusive)
    pub start_pc: u16,

    /// End of exception handler range (exclusive)
    pub end_pc: u16,

    /// Start of the exception handler
    pub handler_pc: u16,

    /// Class constant of the caught exception (`ConstantIndex::NONE` catches everything)
    pub catch_type: ConstantIndex,
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.13
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariable {
    pub start_pc: u16,
    pub length: u16,
    pub name: String,
    pub descriptor: String,
    pub index: u16,
}

/// These types are from [this hierarchy][0]
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se7/html/jvms-4.html#jvms-4.10.1.2
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub enum VerificationType<Cls> {
    Top,
    Integer,
    Float,
    Double,
    Long,
    Null,

    /// In the constructor, the `this` parameter starts with this type then turns into an object
    /// type after `<init>` is called
    UninitializedThis,

    /// Object type
    Object(Cls),

    /// State of an object after `new` has been called but `<init>` has not been called, tracked
    /// by the offset of the `new` instruction in the method body
    Uninitialized(u16),
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se7/html/jvms-4.html#jvms-4.7.4
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackMapFrame<Cls> {
    /// Frame has the same locals as the previous frame and number of stack items is zero
    /// Tags: 0-63 or 251
    SameLocalsNoStack { offset_delta: u16 },

    /// Frame has the same locals as the previous frame and number of stack items is one
    /// Tags: 64-127 or 247
    SameLocalsOneStack {
        offset_delta: u16,
        stack: VerificationType<Cls>,
    },

    /// Frame is like the previous frame, but without the last `chopped_k` locals
    ///
    /// Note: `chopped_k` must be in the range 1 to 3 inclusive
    /// Tags: 248-250
    ChopLocalsNoStack { offset_delta: u16, chopped_k: u8 },

    /// Frame is like the previous frame, but with 1 to 3 extra locals
    /// Tags: 252-254
    AppendLocalsNoStack {
        offset_delta: u16,
        locals: Vec<VerificationType<Cls>>,
    },

    /// Frame has exactly the locals and stack specified
    /// Tag: 255
    Full {
        offset_delta: u16,
        locals: Vec<VerificationType<Cls>>,
        stack: Vec<VerificationType<Cls>>,
    },
}

impl<C> VerificationType<C> {
    pub fn map<C2, E>(&self, map_class: &mut impl FnMut(&C) -> Result<C2, E>) -> Result<VerificationType<C2>, E> {
        Ok(match self {
            VerificationType::Top => VerificationType::Top,
            VerificationType::Integer => VerificationType::Integer,
            VerificationType::Float => VerificationType::Float,
            VerificationType::Long => VerificationType::Long,
            VerificationType::Double => VerificationType::Double,
            VerificationType::Null => VerificationType::Null,
            VerificationType::UninitializedThis => VerificationType::UninitializedThis,
            VerificationType::Object(cls) => VerificationType::Object(map_class(cls)?),
            VerificationType::Uninitialized(offset) => VerificationType::Uninitialized(*offset),
        })
    }
}

impl<C> StackMapFrame<C> {
    /// Rewrite the class of every object type in the frame
    pub fn map<C2, E>(&self, map_class: &mut impl FnMut(&C) -> Result<C2, E>) -> Result<StackMapFrame<C2>, E> {
        fn map_all<C, C2, E>(
            types: &[VerificationType<C>],
            map_class: &mut impl FnMut(&C) -> Result<C2, E>,
        ) -> Result<Vec<VerificationType<C2>>, E> {
            types.iter().map(|typ| typ.map(map_class)).collect()
        }

        Ok(match self {
            StackMapFrame::SameLocalsNoStack { offset_delta } => StackMapFrame::SameLocalsNoStack {
                offset_delta: *offset_delta,
            },
            StackMapFrame::SameLocalsOneStack {
                offset_delta,
                stack,
            } => StackMapFrame::SameLocalsOneStack {
                offset_delta: *offset_delta,
                stack: stack.map(map_class)?,
            },
            StackMapFrame::ChopLocalsNoStack {
                offset_delta,
                chopped_k,
            } => StackMapFrame::ChopLocalsNoStack {
                offset_delta: *offset_delta,
                chopped_k: *chopped_k,
            },
            StackMapFrame::AppendLocalsNoStack {
                offset_delta,
                locals,
            } => StackMapFrame::AppendLocalsNoStack {
                offset_delta: *offset_delta,
                locals: map_all(locals, map_class)?,
            },
            StackMapFrame::Full {
                offset_delta,
                locals,
                stack,
            } => StackMapFrame::Full {
                offset_delta: *offset_delta,
                locals: map_all(locals, map_class)?,
                stack: map_all(stack, map_class)?,
            },
        })
    }
}

impl Serialize for VerificationType<ClassConstantIndex> {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        match self {
            VerificationType::Top => 0u8.serialize(writer)?,
            VerificationType::Integer => 1u8.serialize(writer)?,
            VerificationType::Float => 2u8.serialize(writer)?,
            VerificationType::Double => 3u8.serialize(writer)?,
            VerificationType::Long => 4u8.serialize(writer)?,
            VerificationType::Null => 5u8.serialize(writer)?,
            VerificationType::UninitializedThis => 6u8.serialize(writer)?,
            VerificationType::Object(cls) => {
                7u8.serialize(writer)?;
                cls.serialize(writer)?;
            }
            VerificationType::Uninitialized(off) => {
                8u8.serialize(writer)?;
                off.serialize(writer)?;
            }
        };
        Ok(())
    }
}

impl Serialize for StackMapFrame<ClassConstantIndex> {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        match self {
            // `same_frame` and `same_frame_extended`
            StackMapFrame::SameLocalsNoStack { offset_delta } => {
                if *offset_delta <= 63 {
                    (*offset_delta as u8).serialize(writer)?;
                } else {
                    251u8.serialize(writer)?;
                    offset_delta.serialize(writer)?;
                }
            }

            // `same_locals_1_stack_item_frame` and `same_locals_1_stack_item_frame_extended`
            StackMapFrame::SameLocalsOneStack {
                offset_delta,
                stack,
            } => {
                if *offset_delta <= 63 {
                    (*offset_delta as u8 + 64).serialize(writer)?;
                } else {
                    247u8.serialize(writer)?;
                    offset_delta.serialize(writer)?;
                }
                stack.serialize(writer)?;
            }

            // `chop_frame`
            StackMapFrame::ChopLocalsNoStack {
                offset_delta,
                chopped_k,
            } => {
                debug_assert!(
                    0 < *chopped_k && *chopped_k < 4,
                    "ChopLocalsNoStack chops 1-3 locals"
                );
                (251 - chopped_k).serialize(writer)?;
                offset_delta.serialize(writer)?;
            }

            // `append_frame`
            StackMapFrame::AppendLocalsNoStack {
                offset_delta,
                locals,
            } => {
                debug_assert!(
                    0 < locals.len() && locals.len() < 4,
                    "AppendLocalsNoStack adds 1-3 locals"
                );
                (251 + locals.len() as u8).serialize(writer)?;
                offset_delta.serialize(writer)?;
                for local in locals {
                    local.serialize(writer)?;
                }
            }

            // `full_frame`
            StackMapFrame::Full {
                offset_delta,
                locals,
                stack,
            } => {
                255u8.serialize(writer)?;
                offset_delta.serialize(writer)?;
                locals.serialize(writer)?;
                stack.serialize(writer)?;
            }
        };
        Ok(())
    }
}

impl VerificationType<String> {
    fn read(reader: &mut AttributeReader) -> Result<Self, Error> {
        let typ = match reader.u8()? {
            0 => VerificationType::Top,
            1 => VerificationType::Integer,
            2 => VerificationType::Float,
            3 => VerificationType::Double,
            4 => VerificationType::Long,
            5 => VerificationType::Null,
            6 => VerificationType::UninitializedThis,
            7 => VerificationType::Object(reader.class_name()?),
            8 => VerificationType::Uninitialized(reader.u16()?),
            tag => {
                return Err(Error::malformed(format!(
                    "invalid verification type tag {}",
                    tag
                )))
            }
        };
        Ok(typ)
    }

    fn read_many(reader: &mut AttributeReader, count: usize) -> Result<Vec<Self>, Error> {
        (0..count).map(|_| VerificationType::read(reader)).collect()
    }
}

impl StackMapFrame<String> {
    fn read(reader: &mut AttributeReader) -> Result<Self, Error> {
        let frame = match reader.u8()? {
            tag @ 0..=63 => StackMapFrame::SameLocalsNoStack {
                offset_delta: tag as u16,
            },
            tag @ 64..=127 => StackMapFrame::SameLocalsOneStack {
                offset_delta: tag as u16 - 64,
                stack: VerificationType::read(reader)?,
            },
            247 => StackMapFrame::SameLocalsOneStack {
                offset_delta: reader.u16()?,
                stack: VerificationType::read(reader)?,
            },
            tag @ 248..=250 => StackMapFrame::ChopLocalsNoStack {
                offset_delta: reader.u16()?,
                chopped_k: 251 - tag,
            },
            251 => StackMapFrame::SameLocalsNoStack {
                offset_delta: reader.u16()?,
            },
            tag @ 252..=254 => StackMapFrame::AppendLocalsNoStack {
                offset_delta: reader.u16()?,
                locals: VerificationType::read_many(reader, (tag - 251) as usize)?,
            },
            255 => {
                let offset_delta = reader.u16()?;
                let locals_count = reader.u16()? as usize;
                let locals = VerificationType::read_many(reader, locals_count)?;
                let stack_count = reader.u16()? as usize;
                let stack = VerificationType::read_many(reader, stack_count)?;
                StackMapFrame::Full {
                    offset_delta,
                    locals,
                    stack,
                }
            }
            tag => {
                return Err(Error::malformed(format!(
                    "reserved stack map frame tag {}",
                    tag
                )))
            }
        };
        Ok(frame)
    }
}

impl LocalVariable {
    fn read_all(reader: &mut AttributeReader) -> Result<Vec<LocalVariable>, Error> {
        let count = reader.u16()?;
        (0..count)
            .map(|_| {
                Ok::<_, Error>(LocalVariable {
                    start_pc: reader.u16()?,
                    length: reader.u16()?,
                    name: reader.utf8()?,
                    descriptor: reader.utf8()?,
                    index: reader.u16()?,
                })
            })
            .collect()
    }

    fn write_all(
        variables: &[LocalVariable],
        constants: &mut ConstantsPool,
    ) -> Result<Vec<u8>, Error> {
        let mut info = vec![];
        (variables.len() as u16).serialize(&mut info)?;
        for variable in variables {
            variable.start_pc.serialize(&mut info)?;
            variable.length.serialize(&mut info)?;
            constants.get_utf8(&variable.name)?.serialize(&mut info)?;
            constants.get_utf8(&variable.descriptor)?.serialize(&mut info)?;
            variable.index.serialize(&mut info)?;
        }
        Ok(info)
    }
}

impl Code {
    pub const NAME: &'static str = "Code";
    const STACK_MAP_TABLE: &'static str = "StackMapTable";
    const LOCAL_VARIABLE_TABLE: &'static str = "LocalVariableTable";
    const LOCAL_VARIABLE_TYPE_TABLE: &'static str = "LocalVariableTypeTable";

    /// Parse the body of a `Code` attribute
    pub(crate) fn read(class_file: &ClassFile, info: &[u8]) -> Result<Code, Error> {
        let mut reader = AttributeReader::new(class_file, Self::NAME, info);
        let max_stack = reader.u16()?;
        let max_locals = reader.u16()?;
        let code_length = reader.u32()?;
        let bytecode = reader.bytes(code_length as usize)?;

        let handler_count = reader.u16()?;
        let mut exception_table = Vec::with_capacity(handler_count as usize);
        for _ in 0..handler_count {
            exception_table.push(ExceptionHandler {
                start_pc: reader.u16()?,
                end_pc: reader.u16()?,
                handler_pc: reader.u16()?,
                catch_type: reader.index()?,
            });
        }

        let mut code = Code {
            max_stack,
            max_locals,
            bytecode,
            exception_table,
            stack_map_frames: None,
            local_variables: vec![],
            local_variable_types: vec![],
            attributes: vec![],
        };

        let attribute_count = reader.u16()?;
        for _ in 0..attribute_count {
            let name = reader.utf8()?;
            let len = reader.u32()?;
            let body = reader.bytes(len as usize)?;
            let mut body_reader = AttributeReader::new(class_file, &name, &body);
            match name.as_str() {
                Self::STACK_MAP_TABLE => {
                    let count = body_reader.u16()?;
                    let frames = (0..count)
                        .map(|_| StackMapFrame::read(&mut body_reader))
                        .collect::<Result<Vec<_>, Error>>()?;
                    body_reader.finish()?;
                    code.stack_map_frames = Some(frames);
                }
                Self::LOCAL_VARIABLE_TABLE => {
                    let variables = LocalVariable::read_all(&mut body_reader)?;
                    body_reader.finish()?;
                    code.local_variables.extend(variables);
                }
                Self::LOCAL_VARIABLE_TYPE_TABLE => {
                    let variables = LocalVariable::read_all(&mut body_reader)?;
                    body_reader.finish()?;
                    code.local_variable_types.extend(variables);
                }
                _ => code.attributes.push(RawAttribute { name, info: body }),
            }
        }
        reader.finish()?;

        Ok(code)
    }

    /// Encode the `Code` attribute, interning names into the pool
    pub(crate) fn write(&self, constants: &mut ConstantsPool) -> Result<Attribute, Error> {
        let mut attributes: Vec<Attribute> = vec![];

        if let Some(frames) = &self.stack_map_frames {
            let mut info = vec![];
            (frames.len() as u16).serialize(&mut info)?;
            for frame in frames {
                frame
                    .map(&mut |class: &String| constants.get_class(class))?
                    .serialize(&mut info)?;
            }
            attributes.push(Attribute {
                name_index: constants.get_utf8(Self::STACK_MAP_TABLE)?,
                info,
            });
        }
        if !self.local_variables.is_empty() {
            let info = LocalVariable::write_all(&self.local_variables, constants)?;
            attributes.push(Attribute {
                name_index: constants.get_utf8(Self::LOCAL_VARIABLE_TABLE)?,
                info,
            });
        }
        if !self.local_variable_types.is_empty() {
            let info = LocalVariable::write_all(&self.local_variable_types, constants)?;
            attributes.push(Attribute {
                name_index: constants.get_utf8(Self::LOCAL_VARIABLE_TYPE_TABLE)?,
                info,
            });
        }
        for attribute in &self.attributes {
            attributes.push(attribute.write(constants)?);
        }

        let mut info = vec![];
        self.max_stack.serialize(&mut info)?;
        self.max_locals.serialize(&mut info)?;
        (self.bytecode.len() as u32).serialize(&mut info)?;
        info.extend_from_slice(&self.bytecode);
        (self.exception_table.len() as u16).serialize(&mut info)?;
        for handler in &self.exception_table {
            handler.start_pc.serialize(&mut info)?;
            handler.end_pc.serialize(&mut info)?;
            handler.handler_pc.serialize(&mut info)?;
            handler.catch_type.serialize(&mut info)?;
        }
        attributes.serialize(&mut info)?;

        Ok(Attribute {
            name_index: constants.get_utf8(Self::NAME)?,
            info,
        })
    }
}
