use std::fmt::{Debug, Display, Error as FmtError, Formatter};

/// Names of classes and interfaces, in their internal (slash separated) form
///
/// Class loaders ask for classes by their dotted name (`a.b.C`) while class files and archives use
/// the internal form (`a/b/C`). Both spellings normalize to the same `BinaryName`.
///
/// See <https://docs.oracle.com/javase/specs/jvms/se16/html/jvms-4.html#jvms-4.2.1>
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct BinaryName(String);

impl BinaryName {
    /// Suffix of class files in an archive
    pub const CLASS_EXTENSION: &'static str = ".class";

    /// Normalize a dotted or slashed class name
    pub fn normalize(name: impl AsRef<str>) -> BinaryName {
        BinaryName(name.as_ref().replace('.', "/"))
    }

    /// Recover the class name from the path of a class file (eg. `a/b/C.class`)
    pub fn from_class_file_path(path: &str) -> Option<BinaryName> {
        path.strip_suffix(Self::CLASS_EXTENSION)
            .filter(|stem| !stem.is_empty())
            .map(BinaryName::normalize)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Dotted form of the name, as used by class loaders
    pub fn to_dotted(&self) -> String {
        self.0.replace('/', ".")
    }

    /// Path of the class file in a mod source
    pub fn class_file_path(&self) -> String {
        format!("{}{}", self.0, Self::CLASS_EXTENSION)
    }
}

impl AsRef<str> for BinaryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Debug for BinaryName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.write_str(&self.0)
    }
}

impl Display for BinaryName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.write_str(&self.0)
    }
}
