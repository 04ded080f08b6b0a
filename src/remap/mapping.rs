use crate::jvm::model::ClassNode;
use crate::remap::Remapper;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Table-driven remapper
///
/// Members are looked up on their owner first, then on the supertypes of every class that has
/// been shown to [`Remapper::register_class`]. This is what lets a mod class calling an inherited
/// method (`me/alec/Gui.method_1` where `method_1` is declared on a game class) get remapped.
#[derive(Debug, Default)]
pub struct MappingRemapper {
    classes: HashMap<String, String>,

    /// Keyed by owner, name, and descriptor (all in the old namespace)
    fields: HashMap<(String, String, String), String>,
    methods: HashMap<(String, String, String), String>,

    /// Direct supertypes (super class and interfaces) of every known class, in the old namespace
    supertypes: RwLock<HashMap<String, Vec<String>>>,
}

impl MappingRemapper {
    pub fn new() -> MappingRemapper {
        MappingRemapper::default()
    }

    pub fn add_class(&mut self, old: impl Into<String>, new: impl Into<String>) {
        self.classes.insert(old.into(), new.into());
    }

    pub fn add_field(&mut self, owner: &str, name: &str, descriptor: &str, new: impl Into<String>) {
        let key = (owner.to_owned(), name.to_owned(), descriptor.to_owned());
        self.fields.insert(key, new.into());
    }

    pub fn add_method(&mut self, owner: &str, name: &str, descriptor: &str, new: impl Into<String>) {
        let key = (owner.to_owned(), name.to_owned(), descriptor.to_owned());
        self.methods.insert(key, new.into());
    }

    /// Record the supertypes of a class which won't be seen through `register_class` (eg. a
    /// game class that only appears in the mappings)
    pub fn add_supertypes(&mut self, class: impl Into<String>, supertypes: Vec<String>) {
        self.supertypes_mut().insert(class.into(), supertypes);
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    // A panic while holding the lock can't leave the map half-updated, so poisoning is ignored
    fn supertypes(&self) -> RwLockReadGuard<'_, HashMap<String, Vec<String>>> {
        self.supertypes
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn supertypes_mut(&self) -> RwLockWriteGuard<'_, HashMap<String, Vec<String>>> {
        self.supertypes
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Breadth first search through the owner and its supertypes
    fn lookup_member(
        &self,
        table: &HashMap<(String, String, String), String>,
        owner: &str,
        name: &str,
        descriptor: &str,
    ) -> Option<String> {
        if table.is_empty() {
            return None;
        }

        let supertypes = self.supertypes();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([owner]);
        while let Some(class) = queue.pop_front() {
            if !visited.insert(class) {
                continue;
            }
            let key = (class.to_owned(), name.to_owned(), descriptor.to_owned());
            if let Some(new) = table.get(&key) {
                return Some(new.clone());
            }
            if let Some(parents) = supertypes.get(class) {
                queue.extend(parents.iter().map(String::as_str));
            }
        }
        None
    }
}

impl Remapper for MappingRemapper {
    fn register_class(&self, class: &ClassNode) {
        let parents = class
            .super_name
            .iter()
            .chain(class.interfaces.iter())
            .cloned()
            .collect();
        self.supertypes_mut().insert(class.name.clone(), parents);
    }

    fn map_type(&self, name: &str) -> String {
        if let Some(new) = self.classes.get(name) {
            return new.clone();
        }

        // Nested classes of a mapped class follow their outer class
        if let Some((outer, inner)) = name.rsplit_once('$') {
            if self.classes.contains_key(outer) {
                return format!("{}${}", self.map_type(outer), inner);
            }
        }

        name.to_owned()
    }

    fn map_field_name(&self, owner: &str, name: &str, descriptor: &str) -> String {
        self.lookup_member(&self.fields, owner, name, descriptor)
            .unwrap_or_else(|| name.to_owned())
    }

    fn map_method_name(&self, owner: &str, name: &str, descriptor: &str) -> String {
        self.lookup_member(&self.methods, owner, name, descriptor)
            .unwrap_or_else(|| name.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remapper() -> MappingRemapper {
        let mut remapper = MappingRemapper::new();
        remapper.add_class("net/minecraft/class_437", "net/minecraft/client/gui/screen/Screen");
        remapper.add_method("net/minecraft/class_437", "method_25426", "()V", "init");
        remapper.add_field("net/minecraft/class_437", "field_22789", "I", "width");
        remapper
    }

    #[test]
    fn map_known_and_unknown_types() {
        let remapper = remapper();
        assert_eq!(
            remapper.map_type("net/minecraft/class_437"),
            "net/minecraft/client/gui/screen/Screen"
        );
        assert_eq!(
            remapper.map_type("net/minecraft/class_437$1"),
            "net/minecraft/client/gui/screen/Screen$1"
        );
        assert_eq!(remapper.map_type("me/alec/Gui"), "me/alec/Gui");
        assert_eq!(
            remapper.map_descriptor("(Lnet/minecraft/class_437;)V"),
            "(Lnet/minecraft/client/gui/screen/Screen;)V"
        );
    }

    #[test]
    fn inherited_members_need_registration() {
        let remapper = remapper();
        assert_eq!(
            remapper.map_method_name("me/alec/Gui", "method_25426", "()V"),
            "method_25426"
        );

        remapper.register_class(&ClassNode::new(
            "me/alec/Gui",
            Some("net/minecraft/class_437"),
        ));
        assert_eq!(
            remapper.map_method_name("me/alec/Gui", "method_25426", "()V"),
            "init"
        );
        assert_eq!(remapper.map_field_name("me/alec/Gui", "field_22789", "I"), "width");

        // Descriptors must match exactly
        assert_eq!(
            remapper.map_method_name("me/alec/Gui", "method_25426", "(I)V"),
            "method_25426"
        );
    }

    #[test]
    fn cyclic_hierarchies_terminate() {
        let mut remapper = remapper();
        remapper.add_supertypes("a/A", vec![String::from("a/B")]);
        remapper.add_supertypes("a/B", vec![String::from("a/A")]);
        assert_eq!(remapper.map_method_name("a/A", "method_25426", "()V"), "method_25426");
    }
}
