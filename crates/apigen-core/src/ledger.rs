use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use md5::{Digest, Md5};

use crate::error::EmitError;

/// Default ledger file name, placed in the output directory.
pub const DEFAULT_LEDGER_FILE: &str = ".apigen-checksums.json";

/// Lowercase hex MD5 of `content`.
pub fn digest(content: &[u8]) -> String {
    format!("{:x}", Md5::digest(content))
}

/// Persisted mapping of output path to the digest of what was last written
/// there.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChecksumLedger {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl ChecksumLedger {
    /// Load the ledger at `path`. A missing file gives an empty ledger; so
    /// does an unreadable or corrupt one, with a warning.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(err) => {
                    log::warn!(
                        "ignoring corrupt checksum ledger {}: {err}",
                        path.display()
                    );
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                log::warn!(
                    "could not read checksum ledger {}: {err}",
                    path.display()
                );
                BTreeMap::new()
            }
        };
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, digest: impl Into<String>) {
        self.entries.insert(key.into(), digest.into());
    }

    /// Keep only the entries whose key satisfies `keep`. Returns the number
    /// of entries removed.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| keep(key));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> Result<String, EmitError> {
        let mut out = serde_json::to_string_pretty(&self.entries)?;
        out.push('\n');
        Ok(out)
    }

    /// Write the ledger back to its file, creating parent directories.
    pub fn save(&self) -> Result<(), EmitError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| EmitError::io(parent, e))?;
        }
        fs::write(&self.path, self.to_json()?).map_err(|e| EmitError::io(&self.path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_lowercase_hex_md5() {
        assert_eq!(digest(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(digest(b"hello\n"), "b1946ac92492d2347c6235b4d2611184");
        assert_eq!(digest(b"x").len(), 32);
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ChecksumLedger::load(dir.path().join("absent.json"));
        assert!(ledger.is_empty());
    }

    #[test]
    fn corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        fs::write(&path, "{not json").unwrap();
        assert!(ChecksumLedger::load(&path).is_empty());
        fs::write(&path, r#"["a list"]"#).unwrap();
        assert!(ChecksumLedger::load(&path).is_empty());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/ledger.json");
        let mut ledger = ChecksumLedger::load(&path);
        ledger.insert("out/b.py", digest(b"b"));
        ledger.insert("out/a.py", digest(b"a"));
        ledger.save().unwrap();

        let reloaded = ChecksumLedger::load(&path);
        assert_eq!(reloaded, ledger);
        assert_eq!(reloaded.get("out/a.py"), Some(digest(b"a").as_str()));
    }

    #[test]
    fn serialized_keys_are_sorted() {
        let mut ledger = ChecksumLedger::default();
        ledger.insert("z.py", "0cc175b9c0f1b6a831c399e269772661");
        ledger.insert("a.py", "92eb5ffee6ae2fec3ad71c777531578f");
        let json = ledger.to_json().unwrap();
        assert!(json.ends_with("}\n"));
        insta::assert_snapshot!(json.trim_end(), @r#"
        {
          "a.py": "92eb5ffee6ae2fec3ad71c777531578f",
          "z.py": "0cc175b9c0f1b6a831c399e269772661"
        }
        "#);
    }
}
