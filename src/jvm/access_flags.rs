use super::{Deserialize, Serialize};
use bitflags::bitflags;
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::io::Result;

bitflags! {
    /// Access flags on classes
    ///
    /// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.1-200-E.1
    pub struct ClassAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const FINAL = 0x0010;
        const SUPER = 0x0020;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
        const MODULE = 0x8000;
    }
}

bitflags! {
    /// Access flags on methods
    ///
    /// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.6-200-A.1
    pub struct MethodAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const BRIDGE = 0x0040;
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
        const SYNTHETIC = 0x1000;
    }
}

bitflags! {
    /// Access flags on fields
    ///
    /// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.5-200-A.1
    pub struct FieldAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const VOLATILE = 0x0040;
        const TRANSIENT = 0x0080;
        const SYNTHETIC = 0x1000;
        const ENUM = 0x4000;
    }
}

impl MethodAccessFlags {
    /// Flags which together determine the visibility of a method
    pub const VISIBILITY: MethodAccessFlags = MethodAccessFlags::from_bits_truncate(
        MethodAccessFlags::PUBLIC.bits()
            | MethodAccessFlags::PRIVATE.bits()
            | MethodAccessFlags::PROTECTED.bits(),
    );

    /// Replace the visibility of the method, leaving all other flags untouched
    ///
    /// `visibility` should be one of `PUBLIC`, `PROTECTED`, `PRIVATE`, or empty (package private)
    pub fn set_visibility(&mut self, visibility: MethodAccessFlags) {
        self.remove(MethodAccessFlags::VISIBILITY);
        self.insert(visibility & MethodAccessFlags::VISIBILITY);
    }
}

impl Serialize for ClassAccessFlags {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<()> {
        self.bits().serialize(writer)
    }
}

impl Serialize for MethodAccessFlags {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<()> {
        self.bits().serialize(writer)
    }
}

impl Serialize for FieldAccessFlags {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<()> {
        self.bits().serialize(writer)
    }
}

impl Deserialize for ClassAccessFlags {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self> {
        Ok(ClassAccessFlags::from_bits_truncate(u16::deserialize(reader)?))
    }
}

impl Deserialize for MethodAccessFlags {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self> {
        Ok(MethodAccessFlags::from_bits_truncate(u16::deserialize(
            reader,
        )?))
    }
}

impl Deserialize for FieldAccessFlags {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self> {
        Ok(FieldAccessFlags::from_bits_truncate(u16::deserialize(reader)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widen_to_public() {
        let mut flags = MethodAccessFlags::PRIVATE | MethodAccessFlags::FINAL;
        flags.set_visibility(MethodAccessFlags::PUBLIC);
        assert_eq!(flags, MethodAccessFlags::PUBLIC | MethodAccessFlags::FINAL);

        let mut flags = MethodAccessFlags::PROTECTED | MethodAccessFlags::SYNCHRONIZED;
        flags.set_visibility(MethodAccessFlags::PUBLIC);
        assert_eq!(
            flags,
            MethodAccessFlags::PUBLIC | MethodAccessFlags::SYNCHRONIZED
        );
    }

    #[test]
    fn package_private_visibility() {
        let mut flags = MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC;
        flags.set_visibility(MethodAccessFlags::empty());
        assert_eq!(flags, MethodAccessFlags::STATIC);
    }
}
