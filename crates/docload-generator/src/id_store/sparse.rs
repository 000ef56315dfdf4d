use super::{bit_position, check_range, IdStore, IdStoreError};
use docload_core::{CollectionName, IdLong};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

type Words = Arc<Mutex<HashMap<usize, u64>>>;

/// Id store that keeps only populated 64-bit words, for id spaces with
/// large gaps.
pub struct SparseIdStore {
    max_id: u64,
    collections: RwLock<HashMap<CollectionName, Words>>,
}

impl SparseIdStore {
    pub fn new(max_id: u64) -> Self {
        Self {
            max_id,
            collections: RwLock::new(HashMap::new()),
        }
    }

    fn words(&self, collection: &CollectionName) -> Option<Words> {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(collection)
            .cloned()
    }
}

impl IdStore for SparseIdStore {
    fn store(&self, collection: &CollectionName, id: IdLong) -> Result<(), IdStoreError> {
        let id = check_range(collection, id, self.max_id)?;
        let words = match self.words(collection) {
            Some(words) => words,
            None => self
                .collections
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(collection.clone())
                .or_default()
                .clone(),
        };
        let (word, mask) = bit_position(id);
        *words
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(word)
            .or_insert(0) |= mask;
        Ok(())
    }

    fn exists(&self, collection: &CollectionName, id: IdLong) -> bool {
        let Ok(id) = u64::try_from(id.value()) else {
            return false;
        };
        let Some(words) = self.words(collection) else {
            return false;
        };
        let (word, mask) = bit_position(id);
        let words = words.lock().unwrap_or_else(PoisonError::into_inner);
        words.get(&word).is_some_and(|w| w & mask != 0)
    }

    fn max_id(&self) -> u64 {
        self.max_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id_store::tests::{collection, exercise_store};

    #[test]
    fn test_sparse_store_semantics() {
        exercise_store(Arc::new(SparseIdStore::new(1 << 40)));
    }

    #[test]
    fn test_far_apart_ids_use_few_words() {
        let store = SparseIdStore::new(1 << 40);
        let c = collection("events");
        store.store(&c, IdLong::new(3)).unwrap();
        store.store(&c, IdLong::new(1 << 35)).unwrap();
        assert!(store.exists(&c, IdLong::new(1 << 35)));
        assert_eq!(store.words(&c).unwrap().lock().unwrap().len(), 2);
    }
}
