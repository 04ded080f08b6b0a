//! Compatibility patches, applied to classes after they have been remapped

use crate::jvm::model::ClassNode;
use crate::jvm::{ClassAccessFlags, MethodAccessFlags};
use crate::settings::Settings;

/// Widen the methods of a mixin class to `public`
///
/// Applies only in development mode, and only to non-static methods which either have no visible
/// annotations or are marked as overwrites. Returns the number of methods whose access changed.
pub fn widen_mixin_methods(class: &mut ClassNode, settings: &Settings) -> usize {
    if !settings.development_mode || !class.has_invisible_annotation(&settings.mixin_descriptor) {
        return 0;
    }

    let mut widened = 0;
    for method in &mut class.methods {
        if method.is_static() {
            continue;
        }
        if method.visible_annotations.is_empty()
            || method.has_visible_annotation(&settings.overwrite_descriptor)
        {
            let before = method.access_flags;
            method.access_flags.set_visibility(MethodAccessFlags::PUBLIC);
            if method.access_flags != before {
                widened += 1;
            }
        }
    }
    widened
}

/// Is this (remapped) class a public, concrete, non-mixin subclass of a config screen base?
pub fn is_config_gui_candidate(class: &ClassNode, settings: &Settings) -> bool {
    if class.has_invisible_annotation(&settings.mixin_descriptor) {
        return false;
    }
    let access = class.access_flags & (ClassAccessFlags::PUBLIC | ClassAccessFlags::ABSTRACT);
    if access != ClassAccessFlags::PUBLIC {
        return false;
    }
    match &class.super_name {
        Some(super_name) => settings.config_gui_super_classes.contains(super_name),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jvm::model::{Annotation, MethodNode};

    const MIXIN: &str = "Lorg/spongepowered/asm/mixin/Mixin;";
    const OVERWRITE: &str = "Lorg/spongepowered/asm/mixin/Overwrite;";
    const SCREEN: &str = "net/minecraft/class_5641";

    fn settings(development_mode: bool) -> Settings {
        let mut settings = Settings::new("tmp");
        settings.development_mode = development_mode;
        settings.config_gui_super_classes.insert(String::from(SCREEN));
        settings
    }

    fn method(access_flags: MethodAccessFlags, name: &str, annotation: Option<&str>) -> MethodNode {
        let mut method = MethodNode::new(access_flags, name, "()V");
        if let Some(annotation) = annotation {
            method.visible_annotations.push(Annotation::new(annotation));
        }
        method
    }

    fn mixin_class() -> ClassNode {
        let mut class = ClassNode::new("me/alec/mixin/GuiMixin", Some("java/lang/Object"));
        class.invisible_annotations.push(Annotation::new(MIXIN));
        class.methods = vec![
            method(MethodAccessFlags::PRIVATE, "plain", None),
            method(MethodAccessFlags::PRIVATE, "annotated", Some("Ljava/lang/Deprecated;")),
            method(MethodAccessFlags::PROTECTED, "overwrite", Some(OVERWRITE)),
            method(MethodAccessFlags::PRIVATE | MethodAccessFlags::STATIC, "helper", None),
        ];
        class
    }

    fn access(class: &ClassNode) -> Vec<MethodAccessFlags> {
        class.methods.iter().map(|method| method.access_flags).collect()
    }

    #[test]
    fn widen_only_in_development_mode() {
        let mut class = mixin_class();
        assert_eq!(widen_mixin_methods(&mut class, &settings(false)), 0);
        assert_eq!(access(&class), access(&mixin_class()));

        assert_eq!(widen_mixin_methods(&mut class, &settings(true)), 2);
        assert_eq!(
            access(&class),
            vec![
                MethodAccessFlags::PUBLIC,
                MethodAccessFlags::PRIVATE,
                MethodAccessFlags::PUBLIC,
                MethodAccessFlags::PRIVATE | MethodAccessFlags::STATIC,
            ]
        );
    }

    #[test]
    fn leave_non_mixin_classes_alone() {
        let mut class = mixin_class();
        class.invisible_annotations.clear();
        assert_eq!(widen_mixin_methods(&mut class, &settings(true)), 0);
    }

    #[test]
    fn classify_config_screens() {
        let settings = settings(false);

        let screen = ClassNode::new("me/alec/ConfigScreen", Some(SCREEN));
        assert!(is_config_gui_candidate(&screen, &settings));

        let mut abstract_screen = screen.clone();
        abstract_screen.access_flags |= ClassAccessFlags::ABSTRACT;
        assert!(!is_config_gui_candidate(&abstract_screen, &settings));

        let mut package_private = screen.clone();
        package_private.access_flags = ClassAccessFlags::SUPER;
        assert!(!is_config_gui_candidate(&package_private, &settings));

        let mut mixin = screen.clone();
        mixin.invisible_annotations.push(Annotation::new(MIXIN));
        assert!(!is_config_gui_candidate(&mixin, &settings));

        let unrelated = ClassNode::new("me/alec/Other", Some("java/lang/Object"));
        assert!(!is_config_gui_candidate(&unrelated, &settings));
    }
}
