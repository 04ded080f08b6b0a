use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io;
use std::path::{Path, PathBuf};

/// Location of a resource, as a URI (eg. `file:///tmp/a/B.class` or `jar:file:///...!/a.png`)
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct Location(String);

impl Location {
    pub fn new(uri: impl Into<String>) -> Location {
        Location(uri.into())
    }

    /// `file:` URI of a path, made absolute against the working directory if need be
    pub fn from_file_path(path: &Path) -> io::Result<Location> {
        let path = absolute(path)?;
        let mut uri_path = path.to_string_lossy().replace('\\', "/");
        if !uri_path.starts_with('/') {
            uri_path.insert(0, '/');
        }
        Ok(Location(format!("file://{}", escape_path(&uri_path))))
    }

    /// Collapse double percent-encoding (`%25XX`) back into single percent-encoding (`%XX`)
    ///
    /// Some path representations (nested `jar:` URIs in particular) escape an already escaped
    /// string, which leaves a location that nothing downstream can open. A `%25` not followed by
    /// two hex digits is an escaped literal `%` and stays as it is.
    pub fn collapse_double_escapes(self) -> Location {
        if !self.0.contains("%25") {
            return self;
        }
        let bytes = self.0.as_bytes();
        let mut collapsed = String::with_capacity(self.0.len());
        let mut idx = 0;
        while idx < bytes.len() {
            let doubled = bytes[idx..].starts_with(b"%25")
                && bytes.get(idx + 3).map_or(false, u8::is_ascii_hexdigit)
                && bytes.get(idx + 4).map_or(false, u8::is_ascii_hexdigit);
            if doubled {
                collapsed.push('%');
                idx += 3;
            } else {
                let end = idx + self.0[idx..].chars().next().map_or(1, char::len_utf8);
                collapsed.push_str(&self.0[idx..end]);
                idx = end;
            }
        }
        Location(collapsed)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Path on disk, for `file:` locations
    pub fn to_file_path(&self) -> Option<PathBuf> {
        let path = self.0.strip_prefix("file://")?;
        unescape(path).map(PathBuf::from)
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Location {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn absolute(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_owned())
    } else {
        Ok(env::current_dir()?.join(path))
    }
}

/// Percent-encode everything except unreserved characters and path punctuation
pub(crate) fn escape_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for byte in path.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' => escaped.push(byte as char),
            b'-' | b'.' | b'_' | b'~' | b'/' | b':' | b'!' | b'$' | b'+' | b'=' | b'@' => {
                escaped.push(byte as char)
            }
            _ => escaped.push_str(&format!("%{:02X}", byte)),
        }
    }
    escaped
}

fn unescape(escaped: &str) -> Option<String> {
    let bytes = escaped.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx] == b'%' {
            let hex = escaped.get(idx + 1..idx + 3)?;
            decoded.push(u8::from_str_radix(hex, 16).ok()?);
            idx += 3;
        } else {
            decoded.push(bytes[idx]);
            idx += 1;
        }
    }
    String::from_utf8(decoded).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_double_escapes() {
        let nested = Location::new("jar:file:///mods/My%2520Mod.litemod!/assets/icon.png");
        assert_eq!(
            nested.collapse_double_escapes().as_str(),
            "jar:file:///mods/My%20Mod.litemod!/assets/icon.png"
        );

        let plain = Location::new("jar:file:///mods/My%20Mod.litemod!/assets/icon.png");
        assert_eq!(plain.clone().collapse_double_escapes(), plain);

        // An escaped literal `%` is left alone
        let percent = Location::from_file_path(Path::new("/mods/assets/100%.txt")).unwrap();
        assert_eq!(percent.as_str(), "file:///mods/assets/100%25.txt");
        let collapsed = percent.clone().collapse_double_escapes();
        assert_eq!(collapsed, percent);
        assert_eq!(
            collapsed.to_file_path(),
            Some(PathBuf::from("/mods/assets/100%.txt"))
        );

        let mixed = Location::new("jar:file:///a%2520b/100%25.zip!/x%25");
        assert_eq!(
            mixed.collapse_double_escapes().as_str(),
            "jar:file:///a%20b/100%25.zip!/x%25"
        );
    }

    #[test]
    fn file_locations() {
        let location = Location::from_file_path(Path::new("/tmp/my mod/a/B.class")).unwrap();
        assert_eq!(location.as_str(), "file:///tmp/my%20mod/a/B.class");
        assert_eq!(
            location.to_file_path(),
            Some(PathBuf::from("/tmp/my mod/a/B.class"))
        );
    }

    #[test]
    fn escape_percent_signs() {
        assert_eq!(escape_path("/a/100%.txt"), "/a/100%25.txt");
        assert_eq!(unescape("/a/100%25.txt").as_deref(), Some("/a/100%.txt"));
        assert_eq!(unescape("/a/%2"), None);
    }
}
