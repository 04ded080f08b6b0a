//! Serving remapped classes and resources of a mod
//!
//! The [`ClassProvider`] sits between a class loader and a [`ModSource`]. Every class goes
//! through the same pipeline exactly once:
//!
//!   1. read the raw bytes from the mod
//!   2. decode them
//!   3. register the decoded class with the remapper
//!   4. remap it
//!   5. patch it (and check whether it is a config screen)
//!   6. encode it, cache it, and mirror it into the dump directory

mod cache;
mod errors;

pub use errors::*;

use crate::container::ConfigGuiCandidates;
use crate::jvm::{self, model::ClassNode, BinaryName};
use crate::location::Location;
use crate::patch;
use crate::remap::{remap_class, Remapper};
use crate::settings::Settings;
use crate::source::ModSource;
use cache::OnceMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct ClassProvider {
    source: Arc<dyn ModSource>,
    remapper: Arc<dyn Remapper>,
    candidates: Arc<ConfigGuiCandidates>,
    settings: Settings,

    /// Transformed class bytes, keyed by internal class name
    classes: OnceMap<Arc<[u8]>>,

    /// Class resources written out to the temp directory, keyed by internal class name
    materialized: OnceMap<Location>,
}

impl ClassProvider {
    pub fn new(
        source: Arc<dyn ModSource>,
        remapper: Arc<dyn Remapper>,
        candidates: Arc<ConfigGuiCandidates>,
        settings: Settings,
    ) -> ClassProvider {
        log::info!(
            "Class provider ready (development mode: {}, dumps: {})",
            settings.development_mode,
            settings
                .dump_directory
                .as_ref()
                .map_or_else(|| String::from("off"), |dir| dir.display().to_string())
        );
        ClassProvider {
            source,
            remapper,
            candidates,
            settings,
            classes: OnceMap::new(),
            materialized: OnceMap::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Number of classes which have been transformed so far
    pub fn cached_class_count(&self) -> usize {
        self.classes.len()
    }

    /// Transformed bytes of a class (dotted or slashed name)
    ///
    /// Returns `Ok(None)` if the mod has no such class. Each class is transformed at most once
    /// per provider: later calls return the cached bytes.
    pub fn class_bytes(&self, name: &str) -> Result<Option<Arc<[u8]>>, Error> {
        let name = BinaryName::normalize(name);
        self.classes
            .get_or_try_insert_with(name.as_str(), || self.transform(&name))
    }

    /// Decoded form of the transformed class
    ///
    /// This decodes the final bytes again, so it reflects exactly what a class loader would see.
    pub fn class_node(&self, name: &str) -> Result<Option<ClassNode>, Error> {
        let bytes = match self.class_bytes(name)? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };
        jvm::decode(&bytes)
            .map(Some)
            .map_err(|error| Error::MalformedClass {
                name: BinaryName::normalize(name).to_dotted(),
                error,
            })
    }

    /// Location of a resource of the mod
    ///
    /// Class resources (`a/b/C.class`) are transformed and written out once to the temp
    /// directory. Anything else is served straight from the mod.
    pub fn find_resource(&self, name: &str) -> Result<Option<Location>, Error> {
        match BinaryName::from_class_file_path(name) {
            Some(class_name) => self.find_class_resource(&class_name),
            None => self.find_plain_resource(name),
        }
    }

    fn find_class_resource(&self, class_name: &BinaryName) -> Result<Option<Location>, Error> {
        self.materialized
            .get_or_try_insert_with(class_name.as_str(), || -> Result<_, Error> {
                let bytes = match self.class_bytes(class_name.as_str())? {
                    Some(bytes) => bytes,
                    None => return Ok(None),
                };
                let path = relative_to(&self.settings.temp_directory, &class_name.class_file_path());
                write_creating_parents(&path, &bytes)?;
                log::debug!("Materialized {} at {}", class_name, path.display());
                Ok(Some(Location::from_file_path(&path)?))
            })
    }

    fn find_plain_resource(&self, name: &str) -> Result<Option<Location>, Error> {
        if !self.source.exists(name) {
            return Ok(None);
        }
        if let Some(dump_directory) = &self.settings.dump_directory {
            let out = relative_to(&dump_directory.join("resource"), name);
            let copied = self
                .source
                .read_all(name)
                .and_then(|bytes| write_creating_parents(&out, &bytes));
            if let Err(err) = copied {
                log::warn!("Failed to dump resource {} to {}: {}", name, out.display(), err);
            }
        }
        let location = self.source.location(name)?;
        Ok(Some(location.collapse_double_escapes()))
    }

    /// Run the whole pipeline for one class
    fn transform(&self, name: &BinaryName) -> Result<Option<Arc<[u8]>>, Error> {
        let path = name.class_file_path();
        if !self.source.exists(&path) {
            log::debug!("No class {} in mod", name);
            return Ok(None);
        }
        log::debug!("Transforming {}", name);

        let raw_bytes = self.source.read_all(&path)?;
        let raw = jvm::decode(&raw_bytes).map_err(|error| Error::MalformedClass {
            name: name.to_dotted(),
            error,
        })?;

        self.remapper.register_class(&raw);
        let mut remapped = remap_class(self.remapper.as_ref(), &raw);

        if patch::is_config_gui_candidate(&remapped, &self.settings) {
            log::debug!("{} looks like a config screen", remapped.name);
            self.candidates.add(remapped.name.clone());
        }
        let widened = patch::widen_mixin_methods(&mut remapped, &self.settings);
        if widened > 0 {
            log::debug!("Widened {} methods of mixin {}", widened, remapped.name);
        }

        let bytes: Arc<[u8]> = jvm::encode(&remapped)
            .map_err(|error| Error::Encode {
                name: name.to_dotted(),
                error,
            })?
            .into();

        if let Some(dump_directory) = &self.settings.dump_directory {
            let out = relative_to(&dump_directory.join("class"), &path);
            if let Err(err) = write_creating_parents(&out, &bytes) {
                log::warn!("Failed to dump class {} to {}: {}", name, out.display(), err);
            }
        }

        Ok(Some(bytes))
    }
}

/// Join a slash separated path onto a base directory, dropping segments that would escape it
fn relative_to(base: &Path, path: &str) -> PathBuf {
    let mut joined = base.to_owned();
    for segment in path.split('/') {
        if !matches!(segment, "" | "." | "..") {
            joined.push(segment);
        }
    }
    joined
}

fn write_creating_parents(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_stay_inside() {
        let base = Path::new("/tmp/out");
        assert_eq!(relative_to(base, "a/b/C.class"), PathBuf::from("/tmp/out/a/b/C.class"));
        assert_eq!(relative_to(base, "../../etc/passwd"), PathBuf::from("/tmp/out/etc/passwd"));
        assert_eq!(relative_to(base, "/assets//icon.png"), PathBuf::from("/tmp/out/assets/icon.png"));
    }
}
