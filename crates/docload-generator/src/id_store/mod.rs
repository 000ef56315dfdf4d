//! Tracking of which numeric ids have been persisted, per collection.
//!
//! An id, once stored, is never cleared. A store of id `k` in collection `C`
//! happens-before any later `exists(C, k)` on the same store; a call racing
//! the store itself may still observe the id as absent.

mod dense;
mod file;
mod sparse;

pub use dense::DenseIdStore;
pub use file::FileIdStore;
pub use sparse::SparseIdStore;

use docload_core::{CollectionName, IdLong};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Default addressable id range of a store.
pub const DEFAULT_MAX_ID: u64 = 1 << 32;

#[derive(Error, Debug)]
pub enum IdStoreError {
    #[error("Id {id} for collection '{collection}' is outside the supported range [0, {max_id})")]
    IdOutOfRange {
        collection: CollectionName,
        id: i64,
        max_id: u64,
    },

    #[error("Id store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Set of persisted ids, partitioned by collection.
///
/// Implementations lock per collection, so operations on different
/// collections never contend.
pub trait IdStore: Send + Sync {
    /// Mark `id` as persisted in `collection`.
    fn store(&self, collection: &CollectionName, id: IdLong) -> Result<(), IdStoreError>;

    /// Whether `id` was stored in `collection`. Unknown collections hold no ids.
    fn exists(&self, collection: &CollectionName, id: IdLong) -> bool;

    /// Exclusive upper bound of storable ids.
    fn max_id(&self) -> u64;

    /// Fail if `id` could not be stored, without storing it.
    fn check(&self, collection: &CollectionName, id: IdLong) -> Result<(), IdStoreError> {
        check_range(collection, id, self.max_id()).map(|_| ())
    }
}

/// Storage strategy for an [`IdStore`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStoreKind {
    /// Growable word array guarded by a read-write lock.
    #[default]
    Dense,
    /// Map of populated words guarded by a mutex.
    Sparse,
    /// Bits kept in an anonymous temporary file.
    File,
}

impl IdStoreKind {
    pub fn build(self, max_id: u64) -> Result<Arc<dyn IdStore>, IdStoreError> {
        let store: Arc<dyn IdStore> = match self {
            IdStoreKind::Dense => Arc::new(DenseIdStore::new(max_id)),
            IdStoreKind::Sparse => Arc::new(SparseIdStore::new(max_id)),
            IdStoreKind::File => Arc::new(FileIdStore::new(max_id)?),
        };
        Ok(store)
    }
}

/// Bit position of an id: (word index, bit mask).
pub(crate) fn bit_position(id: u64) -> (usize, u64) {
    ((id / 64) as usize, 1u64 << (id % 64))
}

/// Validate an id against the store's range, returning it unsigned.
pub(crate) fn check_range(
    collection: &CollectionName,
    id: IdLong,
    max_id: u64,
) -> Result<u64, IdStoreError> {
    match u64::try_from(id.value()) {
        Ok(value) if value < max_id => Ok(value),
        _ => Err(IdStoreError::IdOutOfRange {
            collection: collection.clone(),
            id: id.value(),
            max_id,
        }),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::thread;

    pub(crate) fn collection(name: &str) -> CollectionName {
        CollectionName::new(name).unwrap()
    }

    /// Behaviour every store must share.
    pub(crate) fn exercise_store(store: Arc<dyn IdStore>) {
        let orders = collection("orders");
        let users = collection("users");

        for i in 0..257 {
            store.store(&orders, IdLong::new(i)).unwrap();
        }
        for i in 0..257 {
            assert!(store.exists(&orders, IdLong::new(i)), "id {i} missing");
        }
        assert!(!store.exists(&orders, IdLong::new(500)));

        store.store(&orders, IdLong::new(788)).unwrap();
        assert!(store.exists(&orders, IdLong::new(788)));
        assert!(!store.exists(&orders, IdLong::new(787)));

        // Collections are independent.
        assert!(!store.exists(&users, IdLong::new(1)));
        assert!(!store.exists(&collection("unknown"), IdLong::new(0)));
        assert!(!store.exists(&orders, IdLong::new(-1)));

        // Concurrent stores into overlapping ranges.
        let a = {
            let store = store.clone();
            let users = users.clone();
            thread::spawn(move || {
                for i in 0..127 {
                    store.store(&users, IdLong::new(i)).unwrap();
                }
            })
        };
        let b = {
            let store = store.clone();
            let users = users.clone();
            thread::spawn(move || {
                for i in 127..256 {
                    store.store(&users, IdLong::new(i)).unwrap();
                }
            })
        };
        // Readers racing the writers must never panic.
        let reader = {
            let store = store.clone();
            let users = users.clone();
            thread::spawn(move || {
                for i in 0..256 {
                    let _ = store.exists(&users, IdLong::new(i));
                }
            })
        };
        a.join().unwrap();
        b.join().unwrap();
        reader.join().unwrap();
        for i in 0..256 {
            assert!(store.exists(&users, IdLong::new(i)));
        }
    }

    #[test]
    fn test_out_of_range_is_error() {
        for kind in [IdStoreKind::Dense, IdStoreKind::Sparse, IdStoreKind::File] {
            let store = kind.build(1000).unwrap();
            let orders = collection("orders");
            assert!(store.store(&orders, IdLong::new(999)).is_ok());
            assert!(matches!(
                store.store(&orders, IdLong::new(1000)),
                Err(IdStoreError::IdOutOfRange { id: 1000, .. })
            ));
            assert!(matches!(
                store.store(&orders, IdLong::new(-5)),
                Err(IdStoreError::IdOutOfRange { .. })
            ));
            assert!(!store.exists(&orders, IdLong::new(1000)));
            assert_eq!(store.max_id(), 1000);
            assert!(store.check(&orders, IdLong::new(999)).is_ok());
            assert!(store.check(&orders, IdLong::new(1000)).is_err());
        }
    }

    #[test]
    fn test_bit_position() {
        assert_eq!(bit_position(0), (0, 1));
        assert_eq!(bit_position(63), (0, 1 << 63));
        assert_eq!(bit_position(64), (1, 1));
    }
}
