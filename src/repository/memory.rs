use super::{Entity, PersistenceError, PersistenceResult, Repository, assign_id};
use parking_lot::RwLock;

/// Repository backed by a vector; listing preserves insertion order.
pub struct InMemoryRepository<T> {
    items: RwLock<Vec<T>>,
}

impl<T: Entity> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
        }
    }

    /// Seeds the repository; items without an id get one.
    pub fn with_items(items: impl IntoIterator<Item = T>) -> Self {
        let items = items
            .into_iter()
            .map(|mut item| {
                assign_id(&mut item);
                item
            })
            .collect();
        Self {
            items: RwLock::new(items),
        }
    }
}

impl<T: Entity> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> Repository<T> for InMemoryRepository<T> {
    fn get(&self, id: &str) -> PersistenceResult<Option<T>> {
        let items = self.items.read();
        Ok(items.iter().find(|i| i.id() == Some(id)).cloned())
    }

    fn list(&self) -> PersistenceResult<Vec<T>> {
        Ok(self.items.read().clone())
    }

    fn create(&self, mut item: T) -> PersistenceResult<T> {
        let id = assign_id(&mut item);
        let mut items = self.items.write();
        if items.iter().any(|i| i.id() == Some(id.as_str())) {
            return Err(PersistenceError::Duplicate { kind: T::KIND, id });
        }
        items.push(item.clone());
        Ok(item)
    }

    fn update(&self, id: &str, mut item: T) -> PersistenceResult<T> {
        let mut items = self.items.write();
        let Some(slot) = items.iter_mut().find(|i| i.id() == Some(id)) else {
            return Err(PersistenceError::NotFound {
                kind: T::KIND,
                id: id.to_string(),
            });
        };
        item.set_id(id.to_string());
        *slot = item.clone();
        Ok(item)
    }

    fn delete(&self, id: &str) -> PersistenceResult<bool> {
        let mut items = self.items.write();
        let before = items.len();
        items.retain(|i| i.id() != Some(id));
        Ok(items.len() != before)
    }
}
