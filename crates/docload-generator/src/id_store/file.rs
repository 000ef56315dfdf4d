use super::{check_range, IdStore, IdStoreError};
use docload_core::{CollectionName, IdLong};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::warn;

type Bits = Arc<Mutex<File>>;

/// Id store that keeps one bit per id in an unnamed temporary file per
/// collection. Files are removed by the OS once the store is dropped.
pub struct FileIdStore {
    max_id: u64,
    dir: Option<PathBuf>,
    collections: RwLock<HashMap<CollectionName, Bits>>,
}

impl FileIdStore {
    /// Store with files in the system temporary directory.
    pub fn new(max_id: u64) -> Result<Self, IdStoreError> {
        Ok(Self {
            max_id,
            dir: None,
            collections: RwLock::new(HashMap::new()),
        })
    }

    /// Store with files in `dir`.
    pub fn in_dir(max_id: u64, dir: impl AsRef<Path>) -> Result<Self, IdStoreError> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            return Err(IdStoreError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("id store directory {} does not exist", dir.display()),
            )));
        }
        Ok(Self {
            max_id,
            dir: Some(dir),
            collections: RwLock::new(HashMap::new()),
        })
    }

    fn bits(&self, collection: &CollectionName) -> Option<Bits> {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(collection)
            .cloned()
    }

    fn bits_or_register(&self, collection: &CollectionName) -> Result<Bits, IdStoreError> {
        if let Some(bits) = self.bits(collection) {
            return Ok(bits);
        }
        let mut collections = self
            .collections
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(bits) = collections.get(collection) {
            return Ok(bits.clone());
        }
        let file = match &self.dir {
            Some(dir) => tempfile::tempfile_in(dir)?,
            None => tempfile::tempfile()?,
        };
        let bits = Arc::new(Mutex::new(file));
        collections.insert(collection.clone(), bits.clone());
        Ok(bits)
    }
}

/// Read the byte at `offset`, treating bytes past the end as zero.
fn read_byte(file: &mut File, offset: u64) -> io::Result<u8> {
    file.seek(SeekFrom::Start(offset))?;
    let mut byte = [0u8; 1];
    match file.read(&mut byte)? {
        0 => Ok(0),
        _ => Ok(byte[0]),
    }
}

impl IdStore for FileIdStore {
    fn store(&self, collection: &CollectionName, id: IdLong) -> Result<(), IdStoreError> {
        let id = check_range(collection, id, self.max_id)?;
        let bits = self.bits_or_register(collection)?;
        let mut file = bits.lock().unwrap_or_else(PoisonError::into_inner);
        let offset = id / 8;
        let byte = read_byte(&mut file, offset)? | (1 << (id % 8));
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(&[byte])?;
        Ok(())
    }

    fn exists(&self, collection: &CollectionName, id: IdLong) -> bool {
        let Ok(id) = u64::try_from(id.value()) else {
            return false;
        };
        let Some(bits) = self.bits(collection) else {
            return false;
        };
        let mut file = bits.lock().unwrap_or_else(PoisonError::into_inner);
        match read_byte(&mut file, id / 8) {
            Ok(byte) => byte & (1 << (id % 8)) != 0,
            Err(e) => {
                warn!(collection = %collection, id, error = %e, "Failed to read id store file");
                false
            }
        }
    }

    fn max_id(&self) -> u64 {
        self.max_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id_store::tests::{collection, exercise_store};
    use tempfile::TempDir;

    #[test]
    fn test_file_store_semantics() {
        exercise_store(Arc::new(FileIdStore::new(1 << 20).unwrap()));
    }

    #[test]
    fn test_file_store_in_dir() {
        let dir = TempDir::new().unwrap();
        let store = FileIdStore::in_dir(1 << 16, dir.path()).unwrap();
        let c = collection("parts");
        store.store(&c, IdLong::new(17)).unwrap();
        assert!(store.exists(&c, IdLong::new(17)));
        assert!(!store.exists(&c, IdLong::new(16)));
        // Beyond the end of the file.
        assert!(!store.exists(&c, IdLong::new(60_000)));
    }

    #[test]
    fn test_missing_dir_rejected() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(FileIdStore::in_dir(10, missing).is_err());
    }
}
