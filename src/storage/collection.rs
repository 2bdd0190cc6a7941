//! Generic keyed collection

use dashmap::DashMap;

use super::Record;
use crate::core::{Error, Result};
use crate::types::RecordId;

/// Concurrent map of records of one type
///
/// Reads hand out clones so no shard lock outlives a call. Updates lock one entry,
/// mutate a copy and only commit it when the closure succeeds.
pub struct Collection<T: Record> {
    records: DashMap<RecordId, T>,
}

impl<T: Record> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> Collection<T> {
    /// Empty collection
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when nothing is stored
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Store a new record; an existing id is a conflict
    pub fn insert(&self, record: T) -> Result<T> {
        use dashmap::mapref::entry::Entry;

        match self.records.entry(record.id()) {
            Entry::Occupied(_) => Err(Error::conflict(format!(
                "{} {} already exists",
                T::COLLECTION,
                record.id()
            ))),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                tracing::debug!(collection = T::COLLECTION, id = %record.id(), "record inserted");
                Ok(record)
            }
        }
    }

    /// Record stored under `id`, inserting `make()` first when there is none
    ///
    /// The check and the insert happen under one entry lock, so concurrent
    /// callers all see the same record. `make` must produce a record with `id`.
    pub fn get_or_insert_with<F>(&self, id: RecordId, make: F) -> T
    where
        F: FnOnce() -> T,
    {
        let entry = self.records.entry(id).or_insert_with(|| {
            tracing::debug!(collection = T::COLLECTION, id = %id, "record inserted");
            make()
        });
        entry.value().clone()
    }

    /// Cloned record by id
    pub fn get(&self, id: RecordId) -> Option<T> {
        self.records.get(&id).map(|r| r.value().clone())
    }

    /// Cloned record by id, or `NotFound`
    pub fn require(&self, id: RecordId) -> Result<T> {
        self.get(id)
            .ok_or_else(|| Error::not_found(format!("{} {}", T::COLLECTION, id)))
    }

    /// Mutate a record in place
    ///
    /// `apply` works on a copy; the stored record changes only when it returns
    /// `Ok`. The entry stays locked for the duration, so `apply` must not touch
    /// this same collection.
    pub fn update<F>(&self, id: RecordId, apply: F) -> Result<T>
    where
        F: FnOnce(&mut T) -> Result<()>,
    {
        let mut entry = self
            .records
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("{} {}", T::COLLECTION, id)))?;

        let mut draft = entry.value().clone();
        apply(&mut draft)?;
        *entry.value_mut() = draft.clone();

        tracing::debug!(collection = T::COLLECTION, id = %id, "record updated");
        Ok(draft)
    }

    /// Every record matching `predicate`, in no particular order
    pub fn find<P>(&self, predicate: P) -> Vec<T>
    where
        P: Fn(&T) -> bool,
    {
        self.records
            .iter()
            .filter(|r| predicate(r.value()))
            .map(|r| r.value().clone())
            .collect()
    }

    /// Any one record matching `predicate`
    pub fn find_one<P>(&self, predicate: P) -> Option<T>
    where
        P: Fn(&T) -> bool,
    {
        self.records
            .iter()
            .find(|r| predicate(r.value()))
            .map(|r| r.value().clone())
    }

    /// Number of records matching `predicate`
    pub fn count<P>(&self, predicate: P) -> usize
    where
        P: Fn(&T) -> bool,
    {
        self.records.iter().filter(|r| predicate(r.value())).count()
    }

    /// Up to `n` records, newest first
    pub fn latest(&self, n: usize) -> Vec<T> {
        let mut all = self.find(|_| true);
        all.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        all.truncate(n);
        all
    }

    /// Drop the oldest records until at most `keep` remain; returns how many were removed
    pub fn retain_newest(&self, keep: usize) -> usize {
        self.retain_newest_matching(keep, |_| true)
    }

    /// Like [`retain_newest`](Self::retain_newest), counting only records matching
    /// `predicate`; the others are left alone
    pub fn retain_newest_matching<P>(&self, keep: usize, predicate: P) -> usize
    where
        P: Fn(&T) -> bool,
    {
        let mut keys: Vec<_> = self
            .records
            .iter()
            .filter(|r| predicate(r.value()))
            .map(|r| (r.value().created_at(), *r.key()))
            .collect();
        if keys.len() <= keep {
            return 0;
        }
        keys.sort();

        let excess = keys.len() - keep;
        let removed = keys
            .into_iter()
            .take(excess)
            .filter(|(_, id)| self.records.remove(id).is_some())
            .count();

        if removed > 0 {
            tracing::debug!(collection = T::COLLECTION, removed, "retention trimmed records");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{new_id, Timestamp};
    use chrono::{Duration, Utc};

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        id: RecordId,
        text: String,
        at: Timestamp,
    }

    impl Record for Note {
        const COLLECTION: &'static str = "notes";

        fn id(&self) -> RecordId {
            self.id
        }

        fn created_at(&self) -> Timestamp {
            self.at
        }
    }

    fn note(text: &str, minutes_ago: i64) -> Note {
        Note {
            id: new_id(),
            text: text.to_string(),
            at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn test_insert_and_get() {
        let notes = Collection::new();
        let n = notes.insert(note("a", 0)).unwrap();
        assert_eq!(notes.get(n.id), Some(n.clone()));
        assert_eq!(notes.len(), 1);
        assert!(notes.insert(n).is_err());
    }

    #[test]
    fn test_get_or_insert_keeps_first() {
        let notes = Collection::new();
        let first = note("first", 0);
        let id = first.id;

        assert_eq!(notes.get_or_insert_with(id, || first.clone()).text, "first");
        let again = notes.get_or_insert_with(id, || Note { id, ..note("second", 0) });
        assert_eq!(again.text, "first");
        assert_eq!(notes.len(), 1);
    }

    #[test]
    fn test_require_missing_is_not_found() {
        let notes: Collection<Note> = Collection::new();
        let err = notes.require(new_id()).unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn test_failed_update_leaves_record_untouched() {
        let notes = Collection::new();
        let n = notes.insert(note("before", 0)).unwrap();

        let result = notes.update(n.id, |draft| {
            draft.text = "after".into();
            Err(Error::invalid_input("nope"))
        });
        assert!(result.is_err());
        assert_eq!(notes.get(n.id).unwrap().text, "before");

        let updated = notes
            .update(n.id, |draft| {
                draft.text = "after".into();
                Ok(())
            })
            .unwrap();
        assert_eq!(updated.text, "after");
        assert_eq!(notes.get(n.id).unwrap().text, "after");
    }

    #[test]
    fn test_latest_and_retention() {
        let notes = Collection::new();
        for i in 0..5 {
            notes.insert(note(&i.to_string(), i)).unwrap();
        }

        let latest: Vec<_> = notes.latest(2).into_iter().map(|n| n.text).collect();
        assert_eq!(latest, vec!["0", "1"]);

        assert_eq!(notes.retain_newest(3), 2);
        assert_eq!(notes.len(), 3);
        assert!(notes.find_one(|n| n.text == "4").is_none());
        assert!(notes.find_one(|n| n.text == "0").is_some());
        assert_eq!(notes.retain_newest(10), 0);
    }

    #[test]
    fn test_retention_by_group() {
        let notes = Collection::new();
        for i in 0..4 {
            notes.insert(note("solar", i)).unwrap();
        }
        notes.insert(note("wind", 10)).unwrap();

        assert_eq!(notes.retain_newest_matching(2, |n| n.text == "solar"), 2);
        assert_eq!(notes.count(|n| n.text == "solar"), 2);
        assert_eq!(notes.count(|n| n.text == "wind"), 1);
    }

    #[test]
    fn test_find_and_count() {
        let notes = Collection::new();
        notes.insert(note("solar", 0)).unwrap();
        notes.insert(note("battery", 0)).unwrap();
        notes.insert(note("solar farm", 0)).unwrap();

        assert_eq!(notes.count(|n| n.text.contains("solar")), 2);
        assert_eq!(notes.find(|n| n.text == "battery").len(), 1);
    }
}
