//! Read-only stores holding the raw classes and resources of a mod

use crate::location::{escape_path, Location};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use zip::result::ZipError;
use zip::ZipArchive;

/// Files of a mod, addressed by slash separated paths (eg. `me/alec/Gui.class`)
pub trait ModSource: Send + Sync {
    fn exists(&self, path: &str) -> bool;

    /// Read the whole entry
    fn read_all(&self, path: &str) -> io::Result<Vec<u8>>;

    /// Location of the entry, in a form a conventional class loader can open
    fn location(&self, path: &str) -> io::Result<Location>;

    /// Paths of all file entries
    fn entries(&self) -> io::Result<Vec<String>>;
}

/// Mod which has been unpacked into a directory
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn open<P: AsRef<Path>>(root: P) -> io::Result<DirectorySource> {
        let root = fs::canonicalize(root)?;
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a directory", root.display()),
            ));
        }
        Ok(DirectorySource { root })
    }

    /// Paths are relative to the root and may never step outside of it
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let mut resolved = self.root.clone();
        for segment in path.split('/') {
            match segment {
                "" | "." => continue,
                ".." => return None,
                segment => resolved.push(segment),
            }
        }
        Some(resolved)
    }

    fn not_found(path: &str) -> io::Error {
        io::Error::new(io::ErrorKind::NotFound, format!("no entry {}", path))
    }

    fn collect_entries(&self, dir: &Path, entries: &mut Vec<String>) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                self.collect_entries(&path, entries)?;
            } else if let Ok(relative) = path.strip_prefix(&self.root) {
                let segments: Vec<_> = relative
                    .components()
                    .map(|component| component.as_os_str().to_string_lossy())
                    .collect();
                entries.push(segments.join("/"));
            }
        }
        Ok(())
    }
}

impl ModSource for DirectorySource {
    fn exists(&self, path: &str) -> bool {
        self.resolve(path).map_or(false, |path| path.is_file())
    }

    fn read_all(&self, path: &str) -> io::Result<Vec<u8>> {
        let resolved = self.resolve(path).ok_or_else(|| Self::not_found(path))?;
        fs::read(resolved)
    }

    fn location(&self, path: &str) -> io::Result<Location> {
        let resolved = self.resolve(path).ok_or_else(|| Self::not_found(path))?;
        Location::from_file_path(&resolved)
    }

    fn entries(&self) -> io::Result<Vec<String>> {
        let mut entries = vec![];
        self.collect_entries(&self.root, &mut entries)?;
        entries.sort();
        Ok(entries)
    }
}

/// Mod packaged as an archive (`.litemod`, `.jar`, `.zip`)
pub struct ArchiveSource {
    path: PathBuf,
    archive: Mutex<ZipArchive<File>>,
}

impl ArchiveSource {
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<ArchiveSource> {
        let path = fs::canonicalize(path)?;
        let archive = ZipArchive::new(File::open(&path)?)?;
        Ok(ArchiveSource {
            path,
            archive: Mutex::new(archive),
        })
    }

    fn archive(&self) -> MutexGuard<'_, ZipArchive<File>> {
        self.archive
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ModSource for ArchiveSource {
    fn exists(&self, path: &str) -> bool {
        let mut archive = self.archive();
        let found = match archive.by_name(path) {
            Ok(entry) => entry.is_file(),
            Err(_) => false,
        };
        found
    }

    fn read_all(&self, path: &str) -> io::Result<Vec<u8>> {
        let mut archive = self.archive();
        let mut entry = archive.by_name(path).map_err(|err| match err {
            ZipError::FileNotFound => {
                io::Error::new(io::ErrorKind::NotFound, format!("no entry {}", path))
            }
            err => io::Error::from(err),
        })?;
        let mut bytes = Vec::with_capacity(entry.size().min(1 << 24) as usize);
        entry.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    /// Nested `jar:` URI, where the archive's own URI gets escaped a second time
    fn location(&self, path: &str) -> io::Result<Location> {
        let archive = Location::from_file_path(&self.path)?;
        Ok(Location::new(format!(
            "jar:{}!/{}",
            escape_path(archive.as_str()),
            escape_path(path)
        )))
    }

    fn entries(&self) -> io::Result<Vec<String>> {
        let archive = self.archive();
        let mut entries: Vec<String> = archive
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .map(String::from)
            .collect();
        entries.sort();
        Ok(entries)
    }
}

/// Open a mod, whether it is a directory or an archive
pub fn open_mod<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn ModSource>> {
    let path = path.as_ref();
    if path.is_dir() {
        Ok(Box::new(DirectorySource::open(path)?))
    } else {
        Ok(Box::new(ArchiveSource::open(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::{FileOptions, ZipWriter};

    fn write_archive(path: &Path) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        zip.add_directory("me/alec/", options).unwrap();
        zip.start_file("me/alec/Gui.class", options).unwrap();
        zip.write_all(&[0xCA, 0xFE, 0xBA, 0xBE]).unwrap();
        zip.start_file("litemod.json", options).unwrap();
        zip.write_all(b"{}").unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn directory_source() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("me/alec")).unwrap();
        fs::write(dir.path().join("me/alec/Gui.class"), [1, 2, 3]).unwrap();

        let source = DirectorySource::open(dir.path()).unwrap();
        assert!(source.exists("me/alec/Gui.class"));
        assert!(!source.exists("me/alec"));
        assert!(!source.exists("../escape.txt"));
        assert_eq!(source.read_all("me/alec/Gui.class").unwrap(), vec![1, 2, 3]);
        assert_eq!(
            source.read_all("missing.txt").unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
        assert_eq!(source.entries().unwrap(), vec!["me/alec/Gui.class"]);
        assert!(source
            .location("me/alec/Gui.class")
            .unwrap()
            .as_str()
            .ends_with("/me/alec/Gui.class"));
    }

    #[test]
    fn archive_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("My Mod.litemod");
        write_archive(&path);

        let source = ArchiveSource::open(&path).unwrap();
        assert!(source.exists("me/alec/Gui.class"));
        assert!(!source.exists("me/alec/"));
        assert!(!source.exists("me/alec/Missing.class"));
        assert_eq!(
            source.read_all("me/alec/Gui.class").unwrap(),
            vec![0xCA, 0xFE, 0xBA, 0xBE]
        );
        assert_eq!(
            source.entries().unwrap(),
            vec!["litemod.json", "me/alec/Gui.class"]
        );

        let location = source.location("litemod.json").unwrap();
        assert!(location.as_str().starts_with("jar:file:///"));
        assert!(location.as_str().ends_with("/My%2520Mod.litemod!/litemod.json"));
    }
}
