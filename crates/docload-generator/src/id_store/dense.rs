use super::{bit_position, check_range, IdStore, IdStoreError};
use docload_core::{CollectionName, IdLong};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

type Words = Arc<RwLock<Vec<u64>>>;

/// Id store backed by one growable bit array per collection.
pub struct DenseIdStore {
    max_id: u64,
    collections: RwLock<HashMap<CollectionName, Words>>,
}

impl DenseIdStore {
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

    fn words_or_register(&self, collection: &CollectionName) -> Words {
        if let Some(words) = self.words(collection) {
            return words;
        }
        self.collections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(collection.clone())
            .or_default()
            .clone()
    }
}

impl IdStore for DenseIdStore {
    fn store(&self, collection: &CollectionName, id: IdLong) -> Result<(), IdStoreError> {
        let id = check_range(collection, id, self.max_id)?;
        let (word, mask) = bit_position(id);
        let words = self.words_or_register(collection);
        let mut words = words.write().unwrap_or_else(PoisonError::into_inner);
        if word >= words.len() {
            let max_words = self.max_id.div_ceil(64) as usize;
            let grown = (word + 1).max(words.len() * 2).min(max_words);
            words.resize(grown, 0);
        }
        words[word] |= mask;
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
        let words = words.read().unwrap_or_else(PoisonError::into_inner);
        words.get(word).is_some_and(|w| w & mask != 0)
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
    fn test_dense_store_semantics() {
        exercise_store(Arc::new(DenseIdStore::new(1 << 20)));
    }

    #[test]
    fn test_growth_is_capped_at_range() {
        let store = DenseIdStore::new(130);
        let c = collection("items");
        store.store(&c, IdLong::new(129)).unwrap();
        let words = store.words(&c).unwrap();
        assert_eq!(words.read().unwrap().len(), 3);
    }
}
