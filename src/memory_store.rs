//! An in-process [`Store`] for tests and local development, following the
//! always-available reference-implementation pattern
//! `span_collector::exporter::{NullExporter, StdoutExporter}` use (plain
//! public structs, not gated behind `#[cfg(test)]`, since a lightweight
//! in-memory backend is useful outside the test suite too).

use crate::error::StoreError;
use crate::store::Store;
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

#[derive(Default)]
struct Data {
    lists: std::collections::HashMap<String, VecDeque<Vec<u8>>>,
    sets: std::collections::HashMap<String, HashSet<String>>,
}

/// An in-memory [`Store`], suitable for tests, demos, and single-process
/// development without a real Redis-compatible server.
///
/// Lists follow the same ordering contract as the real store: `append_left`
/// pushes onto the front, `pop_right`/`pop_right_push_left` pop from the
/// back.
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<Data>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    async fn append_left(&self, list: &str, payloads: Vec<Vec<u8>>) -> Result<(), StoreError> {
        let mut data = self.data.lock().unwrap();
        let entry = data.lists.entry(list.to_string()).or_default();
        for payload in payloads {
            entry.push_front(payload);
        }
        Ok(())
    }

    async fn pop_right_push_left(
        &self,
        src: &str,
        dst: &str,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        let mut data = self.data.lock().unwrap();
        let popped = data.lists.get_mut(src).and_then(VecDeque::pop_back);
        if let Some(payload) = &popped {
            data.lists
                .entry(dst.to_string())
                .or_default()
                .push_front(payload.clone());
        }
        Ok(popped)
    }

    async fn pop_right(&self, list: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut data = self.data.lock().unwrap();
        Ok(data.lists.get_mut(list).and_then(VecDeque::pop_back))
    }

    async fn length(&self, list: &str) -> Result<u64, StoreError> {
        let data = self.data.lock().unwrap();
        Ok(data.lists.get(list).map_or(0, |l| l.len() as u64))
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut data = self.data.lock().unwrap();
        let had_list = data.lists.remove(key).is_some_and(|l| !l.is_empty());
        let had_set = data.sets.remove(key).is_some_and(|s| !s.is_empty());
        Ok(had_list || had_set)
    }

    async fn set_add(&self, set: &str, member: &str) -> Result<(), StoreError> {
        let mut data = self.data.lock().unwrap();
        data.sets
            .entry(set.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn set_remove(&self, set: &str, member: &str) -> Result<(), StoreError> {
        let mut data = self.data.lock().unwrap();
        if let Some(members) = data.sets.get_mut(set) {
            members.remove(member);
        }
        Ok(())
    }

    async fn set_members(&self, set: &str) -> Result<Vec<String>, StoreError> {
        let data = self.data.lock().unwrap();
        Ok(data
            .sets
            .get(set)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn append_left_then_pop_right_is_fifo() {
        let store = MemoryStore::new();
        store
            .append_left("q", vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()])
            .await
            .unwrap();
        // append_left pushes each element to the front in order, so the
        // final order (front to back) is c, b, a - popping from the back
        // yields a, b, c: FIFO from the caller's point of view.
        assert_eq!(store.pop_right("q").await.unwrap(), Some(b"a".to_vec()));
        assert_eq!(store.pop_right("q").await.unwrap(), Some(b"b".to_vec()));
        assert_eq!(store.pop_right("q").await.unwrap(), Some(b"c".to_vec()));
        assert_eq!(store.pop_right("q").await.unwrap(), None);
    }

    #[tokio::test]
    async fn pop_right_push_left_moves_one_element() {
        let store = MemoryStore::new();
        store.append_left("src", vec![b"x".to_vec()]).await.unwrap();
        let moved = store.pop_right_push_left("src", "dst").await.unwrap();
        assert_eq!(moved, Some(b"x".to_vec()));
        assert_eq!(store.length("src").await.unwrap(), 0);
        assert_eq!(store.length("dst").await.unwrap(), 1);
        assert_eq!(
            store.pop_right_push_left("src", "dst").await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn sets_add_remove_members() {
        let store = MemoryStore::new();
        store.set_add("s", "a").await.unwrap();
        store.set_add("s", "b").await.unwrap();
        let mut members = store.set_members("s").await.unwrap();
        members.sort();
        assert_eq!(members, vec!["a".to_string(), "b".to_string()]);
        store.set_remove("s", "a").await.unwrap();
        assert_eq!(store.set_members("s").await.unwrap(), vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn delete_reports_whether_anything_was_removed() {
        let store = MemoryStore::new();
        assert!(!store.delete("missing").await.unwrap());
        store.append_left("q", vec![b"x".to_vec()]).await.unwrap();
        assert!(store.delete("q").await.unwrap());
        assert_eq!(store.length("q").await.unwrap(), 0);
    }
}
