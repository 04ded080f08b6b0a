//! Tiny v2 mapping files
//!
//! ```text
//! tiny	2	0	intermediary	named
//! c	net/minecraft/class_437	net/minecraft/client/gui/screen/Screen
//! 	m	()V	method_25426	init
//! 	f	I	field_22789	width
//! ```
//!
//! Member descriptors are always written in the first namespace. Empty names fall back to the
//! name in the first namespace.

use crate::jvm::{map_descriptor, BinaryName};
use crate::remap::MappingRemapper;
use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::fs;
use std::path::Path;

/// Resolve class names between namespaces
pub trait MappingResolver {
    /// Map a class name (dotted or slashed) from `namespace` into the runtime namespace,
    /// returning the internal (slashed) name
    fn map_class_name(&self, namespace: &str, class_name: &str) -> Option<String>;
}

/// Resolver for when everything already runs in a single namespace
pub struct IdentityResolver;

impl MappingResolver for IdentityResolver {
    fn map_class_name(&self, _namespace: &str, class_name: &str) -> Option<String> {
        Some(BinaryName::normalize(class_name).as_str().to_owned())
    }
}

#[derive(Debug)]
pub enum MappingError {
    Io(std::io::Error),
    Syntax { line: usize, message: String },
    UnknownNamespace(String),
}

impl Display for MappingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            MappingError::Io(err) => write!(f, "cannot read mappings: {}", err),
            MappingError::Syntax { line, message } => {
                write!(f, "mappings line {}: {}", line, message)
            }
            MappingError::UnknownNamespace(namespace) => {
                write!(f, "unknown mapping namespace {:?}", namespace)
            }
        }
    }
}

impl std::error::Error for MappingError {}

impl From<std::io::Error> for MappingError {
    fn from(err: std::io::Error) -> MappingError {
        MappingError::Io(err)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberMapping {
    /// Descriptor in the first namespace
    pub descriptor: String,

    /// One name per namespace
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMapping {
    /// One name per namespace
    pub names: Vec<String>,
    pub fields: Vec<MemberMapping>,
    pub methods: Vec<MemberMapping>,
}

/// Parsed mapping file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingSet {
    pub namespaces: Vec<String>,
    pub classes: Vec<ClassMapping>,
}

impl MappingSet {
    pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<MappingSet, MappingError> {
        let contents = fs::read_to_string(path)?;
        MappingSet::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<MappingSet, MappingError> {
        let mut lines = contents.lines().enumerate().map(|(idx, line)| (idx + 1, line));

        let namespaces = match lines.next() {
            Some((_, header)) => {
                let columns: Vec<&str> = header.split('\t').collect();
                if columns.len() < 4 || columns[0] != "tiny" || columns[1] != "2" {
                    return Err(MappingError::Syntax {
                        line: 1,
                        message: String::from("expected a `tiny\\t2\\t<minor>\\t<namespaces>` header"),
                    });
                }
                columns[3..].iter().map(|ns| ns.to_string()).collect::<Vec<_>>()
            }
            None => {
                return Err(MappingError::Syntax {
                    line: 1,
                    message: String::from("empty mapping file"),
                })
            }
        };

        let mut classes: Vec<ClassMapping> = vec![];
        for (line_no, line) in lines {
            let syntax = |message: &str| MappingError::Syntax {
                line: line_no,
                message: message.to_owned(),
            };
            let depth = line.chars().take_while(|c| *c == '\t').count();
            let columns: Vec<&str> = line[depth..].split('\t').collect();

            match (depth, columns[0]) {
                (_, "") => continue,
                (0, "c") => {
                    let names = Self::names(&namespaces, &columns[1..])
                        .ok_or_else(|| syntax("class is missing names"))?;
                    classes.push(ClassMapping {
                        names,
                        fields: vec![],
                        methods: vec![],
                    });
                }
                (1, kind @ ("f" | "m")) => {
                    let class = classes
                        .last_mut()
                        .ok_or_else(|| syntax("member outside of a class"))?;
                    let descriptor = columns
                        .get(1)
                        .ok_or_else(|| syntax("member is missing a descriptor"))?;
                    let names = Self::names(&namespaces, &columns[2..])
                        .ok_or_else(|| syntax("member is missing names"))?;
                    let member = MemberMapping {
                        descriptor: descriptor.to_string(),
                        names,
                    };
                    if kind == "f" {
                        class.fields.push(member);
                    } else {
                        class.methods.push(member);
                    }
                }

                // Comments, parameters, local variables, and properties
                _ => continue,
            }
        }

        Ok(MappingSet {
            namespaces,
            classes,
        })
    }

    /// Fill in empty names with the name from the first namespace
    fn names(namespaces: &[String], columns: &[&str]) -> Option<Vec<String>> {
        let first = columns.first().filter(|name| !name.is_empty())?;
        let names = (0..namespaces.len())
            .map(|idx| match columns.get(idx) {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => first.to_string(),
            })
            .collect();
        Some(names)
    }

    fn namespace_index(&self, namespace: &str) -> Result<usize, MappingError> {
        self.namespaces
            .iter()
            .position(|ns| ns == namespace)
            .ok_or_else(|| MappingError::UnknownNamespace(namespace.to_owned()))
    }

    /// Build a remapper from one namespace into another
    pub fn remapper(&self, from: &str, to: &str) -> Result<MappingRemapper, MappingError> {
        let from = self.namespace_index(from)?;
        let to = self.namespace_index(to)?;

        // Member descriptors are written in the first namespace
        let first_to_from: HashMap<&str, &str> = self
            .classes
            .iter()
            .map(|class| (class.names[0].as_str(), class.names[from].as_str()))
            .collect();
        let descriptor_in_from = |descriptor: &str| {
            map_descriptor(descriptor, &mut |name: &str| {
                first_to_from.get(name).copied().unwrap_or(name).to_owned()
            })
        };

        let mut remapper = MappingRemapper::new();
        for class in &self.classes {
            let owner = &class.names[from];
            remapper.add_class(owner.clone(), class.names[to].clone());
            for field in &class.fields {
                let descriptor = descriptor_in_from(&field.descriptor);
                remapper.add_field(owner, &field.names[from], &descriptor, field.names[to].clone());
            }
            for method in &class.methods {
                let descriptor = descriptor_in_from(&method.descriptor);
                remapper.add_method(owner, &method.names[from], &descriptor, method.names[to].clone());
            }
        }
        Ok(remapper)
    }

    /// Resolver into the `target` namespace
    pub fn resolver(&self, target: &str) -> Result<NamespaceResolver<'_>, MappingError> {
        Ok(NamespaceResolver {
            mappings: self,
            target: self.namespace_index(target)?,
        })
    }
}

/// Resolves class names from any namespace of a [`MappingSet`] into a fixed target namespace
pub struct NamespaceResolver<'a> {
    mappings: &'a MappingSet,
    target: usize,
}

impl<'a> MappingResolver for NamespaceResolver<'a> {
    fn map_class_name(&self, namespace: &str, class_name: &str) -> Option<String> {
        let from = self.mappings.namespace_index(namespace).ok()?;
        let class_name = BinaryName::normalize(class_name);
        self.mappings
            .classes
            .iter()
            .find(|class| class.names[from] == class_name.as_str())
            .map(|class| class.names[self.target].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remap::Remapper;

    const MAPPINGS: &str = "tiny\t2\t0\tofficial\tintermediary\tnamed
c\tdxq\tnet/minecraft/class_437\tnet/minecraft/client/gui/screen/Screen
\tc\tA screen
\tm\t(Ldxq;)V\ta\tmethod_25426\tinit
\t\tp\t1\t\t\tparent
\tf\tI\tb\tfield_22789\twidth
c\tdxr\tnet/minecraft/class_5641\t
";

    #[test]
    fn parse_header_and_members() {
        let mappings = MappingSet::parse(MAPPINGS).unwrap();
        assert_eq!(mappings.namespaces, vec!["official", "intermediary", "named"]);
        assert_eq!(mappings.classes.len(), 2);
        assert_eq!(mappings.classes[0].methods.len(), 1);
        assert_eq!(mappings.classes[0].fields.len(), 1);

        // Missing names fall back to the first namespace
        assert_eq!(mappings.classes[1].names[2], "dxr");
    }

    #[test]
    fn remapper_between_namespaces() {
        let mappings = MappingSet::parse(MAPPINGS).unwrap();
        let remapper = mappings.remapper("intermediary", "named").unwrap();
        assert_eq!(
            remapper.map_type("net/minecraft/class_437"),
            "net/minecraft/client/gui/screen/Screen"
        );
        assert_eq!(
            remapper.map_method_name(
                "net/minecraft/class_437",
                "method_25426",
                "(Lnet/minecraft/class_437;)V"
            ),
            "init"
        );
        assert_eq!(
            remapper.map_field_name("net/minecraft/class_437", "field_22789", "I"),
            "width"
        );
    }

    #[test]
    fn resolve_dotted_names() {
        let mappings = MappingSet::parse(MAPPINGS).unwrap();
        let resolver = mappings.resolver("named").unwrap();
        assert_eq!(
            resolver.map_class_name("intermediary", "net.minecraft.class_437"),
            Some(String::from("net/minecraft/client/gui/screen/Screen"))
        );
        assert_eq!(resolver.map_class_name("intermediary", "net.minecraft.class_1"), None);
        assert_eq!(resolver.map_class_name("mojang", "net.minecraft.class_437"), None);
    }

    #[test]
    fn reject_bad_input() {
        assert!(matches!(
            MappingSet::parse("tiny\t1\tofficial"),
            Err(MappingError::Syntax { line: 1, .. })
        ));
        assert!(matches!(
            MappingSet::parse("tiny\t2\t0\ta\tb\n\tm\t()V\tx\ty\n"),
            Err(MappingError::Syntax { line: 2, .. })
        ));
        let mappings = MappingSet::parse(MAPPINGS).unwrap();
        assert!(matches!(
            mappings.remapper("intermediary", "mojang"),
            Err(MappingError::UnknownNamespace(_))
        ));
    }
}
