use crate::mappings::MappingResolver;
use std::collections::HashSet;
use std::path::PathBuf;

pub struct Settings {
    /// Is the host running in a development environment?
    ///
    /// Only then do methods of mixin classes get widened to `public`.
    pub development_mode: bool,

    /// Where transformed classes (under `class/`) and served resources (under `resource/`) get
    /// mirrored, if anywhere
    pub dump_directory: Option<PathBuf>,

    /// Where class resources get materialized so that they can be handed out as files
    pub temp_directory: PathBuf,

    /// Marker on mixin classes (checked among the invisible annotations)
    pub mixin_descriptor: String,

    /// Marker on mixin methods which replace the target method (checked among the visible
    /// annotations)
    pub overwrite_descriptor: String,

    /// Internal names of base classes whose direct subclasses are configuration screens
    pub config_gui_super_classes: HashSet<String>,
}

impl Settings {
    /// Default dump directory, relative to the working directory
    pub const DEFAULT_DUMP_DIRECTORY: &'static str = ".litecompat.out";

    /// Base classes of configuration screens, as `(namespace, class name)`
    pub const CONFIG_GUI_SUPER_CLASSES: [(&'static str, &'static str); 2] = [
        ("named", "fi/dy/masa/malilib/gui/GuiConfigsBase"),
        ("intermediary", "net.minecraft.class_5641"),
    ];

    pub fn new(temp_directory: impl Into<PathBuf>) -> Settings {
        Settings {
            development_mode: false,
            dump_directory: Some(PathBuf::from(Self::DEFAULT_DUMP_DIRECTORY)),
            temp_directory: temp_directory.into(),
            mixin_descriptor: String::from("Lorg/spongepowered/asm/mixin/Mixin;"),
            overwrite_descriptor: String::from("Lorg/spongepowered/asm/mixin/Overwrite;"),
            config_gui_super_classes: HashSet::new(),
        }
    }

    /// Fill in the config GUI base classes, as they are named at runtime
    ///
    /// Library classes outside the game (the `named` entries) are never remapped, so they are
    /// used as-is. Entries that don't resolve are skipped: that only means fewer candidates.
    pub fn resolve_config_gui_super_classes(&mut self, resolver: &dyn MappingResolver) {
        for (namespace, class_name) in Self::CONFIG_GUI_SUPER_CLASSES {
            let resolved = if namespace == "named" {
                Some(class_name.replace('.', "/"))
            } else {
                resolver.map_class_name(namespace, class_name)
            };
            match resolved {
                Some(resolved) => {
                    self.config_gui_super_classes.insert(resolved);
                }
                None => log::debug!("Config GUI base class {} does not resolve", class_name),
            }
        }
    }
}

impl Default for Settings {
    fn default() -> Settings {
        Settings::new(std::env::temp_dir().join("litecompat"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mappings::IdentityResolver;

    struct NoResolver;

    impl MappingResolver for NoResolver {
        fn map_class_name(&self, _namespace: &str, _class_name: &str) -> Option<String> {
            None
        }
    }

    #[test]
    fn identity_resolution() {
        let mut settings = Settings::new("tmp");
        settings.resolve_config_gui_super_classes(&IdentityResolver);

        let mut classes: Vec<_> = settings.config_gui_super_classes.into_iter().collect();
        classes.sort();
        assert_eq!(
            classes,
            vec!["fi/dy/masa/malilib/gui/GuiConfigsBase", "net/minecraft/class_5641"]
        );
    }

    #[test]
    fn unresolved_classes_are_skipped() {
        let mut settings = Settings::new("tmp");
        settings.resolve_config_gui_super_classes(&NoResolver);
        assert_eq!(
            settings.config_gui_super_classes,
            ["fi/dy/masa/malilib/gui/GuiConfigsBase"]
                .into_iter()
                .map(String::from)
                .collect::<HashSet<_>>()
        );
    }
}
