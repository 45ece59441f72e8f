//! Directory-backed store.
use crate::{KeyValueStore, StoreErrorMarker};
use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
    string::String,
    vec::Vec,
};
use tracing::trace;

/// Errors returned by [FileKv].
#[derive(Debug, thiserror::Error)]
pub enum FileKvError {
    /// Filesystem failure.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The key cannot be used as a file name.
    #[error("invalid key {0:?}: expected [A-Za-z0-9_.-] and no leading dot")]
    InvalidKey(String),
}

impl StoreErrorMarker for FileKvError {}

/// A [KeyValueStore] keeping one file per key inside a directory.
///
/// Writes land in a temporary sibling file that is synced and then renamed over the
/// target, so a concurrent reader sees either the old or the new value in full.
#[derive(Clone, Debug)]
pub struct FileKv {
    dir: PathBuf,
}

impl FileKv {
    /// Opens the store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory holding the key files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &[u8]) -> Result<PathBuf, FileKvError> {
        let valid = !key.is_empty()
            && key[0] != b'.'
            && key
                .iter()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'));
        let name = String::from_utf8_lossy(key);
        if !valid {
            return Err(FileKvError::InvalidKey(name.into_owned()));
        }
        Ok(self.dir.join(name.as_ref()))
    }
}

impl KeyValueStore for FileKv {
    type Error = FileKvError;

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, Self::Error> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<(), Self::Error> {
        let path = self.path_for(key)?;
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let mut file = File::create(&tmp)?;
        file.write_all(value)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp, &path)?;

        trace!(path = %path.display(), len = value.len(), "wrote key file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn missing_key_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let kv = FileKv::open(dir.path()).unwrap();
        assert_eq!(kv.get(b"absent").unwrap(), None);
    }

    #[test]
    fn set_then_get_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let kv = FileKv::open(dir.path().join("nested")).unwrap();
        kv.set(b"fee.json", b"first").unwrap();
        kv.set(b"fee.json", b"second").unwrap();

        let reopened = FileKv::open(kv.dir()).unwrap();
        assert_eq!(reopened.get(b"fee.json").unwrap(), Some(b"second".to_vec()));
        assert!(!kv.dir().join("fee.json.tmp").exists());
    }

    #[rstest]
    #[case::empty(b"")]
    #[case::hidden(b".fee")]
    #[case::traversal(b"../fee")]
    #[case::separator(b"a/b")]
    #[case::non_utf8(b"\xff")]
    fn rejects_bad_keys(#[case] key: &[u8]) {
        let dir = tempfile::tempdir().unwrap();
        let kv = FileKv::open(dir.path()).unwrap();
        assert!(matches!(kv.set(key, b"x"), Err(FileKvError::InvalidKey(_))));
        assert!(matches!(kv.get(key), Err(FileKvError::InvalidKey(_))));
    }
}
