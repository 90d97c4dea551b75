// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::HashSet;
use std::sync::Arc;

use crate::model::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreUpdate {
    pub received: usize,
    pub kept: usize,
    pub duplicates: usize,
}

/// Rows loaded so far for one query, in arrival order.
///
/// Every change swaps in a fresh `Arc<[R]>` and bumps `generation`, so a view
/// cached against an older generation knows to recompute.
#[derive(Debug, Clone)]
pub struct RowStore<R> {
    rows: Arc<[R]>,
    ids: HashSet<String>,
    total: Option<u64>,
    has_more: bool,
    next_offset: usize,
    generation: u64,
}

impl<R: Row> RowStore<R> {
    pub fn new() -> Self {
        Self {
            rows: Arc::from(Vec::new()),
            ids: HashSet::new(),
            total: None,
            has_more: false,
            next_offset: 0,
            generation: 0,
        }
    }

    pub fn rows(&self) -> &Arc<[R]> {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn next_offset(&self) -> usize {
        self.next_offset
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn reset(&mut self) {
        self.rows = Arc::from(Vec::new());
        self.ids.clear();
        self.total = None;
        self.has_more = false;
        self.next_offset = 0;
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn replace(&mut self, rows: Vec<R>, total: u64, has_more: bool) -> StoreUpdate {
        let received = rows.len();
        self.ids.clear();
        let mut kept = Vec::with_capacity(received);
        for row in rows {
            if self.ids.insert(row.row_id().to_owned()) {
                kept.push(row);
            }
        }

        let update = StoreUpdate {
            received,
            kept: kept.len(),
            duplicates: received - kept.len(),
        };
        self.rows = Arc::from(kept);
        self.total = Some(total);
        self.has_more = has_more;
        self.next_offset = received;
        self.generation = self.generation.wrapping_add(1);
        update
    }

    /// Adds a page after the rows already loaded. Rows whose id is already
    /// present are dropped, but the offset still advances by what the server
    /// sent. An empty page ends the list.
    pub fn append(&mut self, rows: Vec<R>, total: u64, has_more: bool) -> StoreUpdate {
        let received = rows.len();
        let mut combined = Vec::with_capacity(self.rows.len() + received);
        combined.extend(self.rows.iter().cloned());
        for row in rows {
            if self.ids.insert(row.row_id().to_owned()) {
                combined.push(row);
            }
        }

        let kept = combined.len() - self.rows.len();
        self.rows = Arc::from(combined);
        self.total = Some(total);
        self.has_more = has_more && received > 0;
        self.next_offset += received;
        self.generation = self.generation.wrapping_add(1);
        StoreUpdate {
            received,
            kept,
            duplicates: received - kept,
        }
    }
}

impl<R: Row> Default for RowStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{RowStore, StoreUpdate};
    use crate::model::Row;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    struct Item(String);

    impl Row for Item {
        fn row_id(&self) -> &str {
            &self.0
        }
    }

    fn items(range: std::ops::Range<usize>) -> Vec<Item> {
        range.map(|index| Item(format!("row-{index}"))).collect()
    }

    #[test]
    fn appends_concatenate_in_arrival_order() {
        let mut store = RowStore::new();
        store.replace(items(0..50), 120, true);
        store.append(items(50..100), 120, true);
        store.append(items(100..120), 120, false);

        assert_eq!(store.rows().as_ref(), items(0..120).as_slice());
        assert_eq!(store.len(), store.next_offset());
        assert_eq!(store.total(), Some(120));
        assert!(!store.has_more());
    }

    #[test]
    fn every_change_produces_a_new_array() {
        let mut store = RowStore::new();
        store.replace(items(0..2), 4, true);
        let before = Arc::clone(store.rows());
        let generation = store.generation();

        store.append(items(2..4), 4, false);
        assert!(!Arc::ptr_eq(&before, store.rows()));
        assert_eq!(before.len(), 2);
        assert!(store.generation() > generation);
    }

    #[test]
    fn empty_append_ends_the_list() {
        let mut store = RowStore::new();
        store.replace(items(0..50), 500, true);
        let update = store.append(Vec::new(), 500, true);

        assert_eq!(update, StoreUpdate::default());
        assert!(!store.has_more());
        assert_eq!(store.next_offset(), 50);
    }

    #[test]
    fn duplicate_rows_are_dropped_but_offset_tracks_server() {
        let mut store = RowStore::new();
        store.replace(items(0..3), 6, true);
        let update = store.append(items(2..5), 6, true);

        assert_eq!(
            update,
            StoreUpdate {
                received: 3,
                kept: 2,
                duplicates: 1
            }
        );
        assert_eq!(store.len(), 5);
        assert_eq!(store.next_offset(), 6);
    }

    #[test]
    fn replace_discards_previous_rows() {
        let mut store = RowStore::new();
        store.replace(items(0..10), 10, false);
        store.replace(items(20..22), 2, false);

        assert_eq!(store.rows().as_ref(), items(20..22).as_slice());
        assert_eq!(store.next_offset(), 2);
    }

    #[test]
    fn replace_drops_repeated_ids_within_first_page() {
        let mut store = RowStore::new();
        let mut page = items(0..4);
        page.push(Item("row-1".to_owned()));
        let update = store.replace(page, 5, true);

        assert_eq!(
            update,
            StoreUpdate {
                received: 5,
                kept: 4,
                duplicates: 1
            }
        );
        assert_eq!(store.rows().as_ref(), items(0..4).as_slice());
        assert_eq!(store.next_offset(), update.received);

        store.append(items(4..6), 7, false);
        assert_eq!(store.next_offset(), 7);
        assert_eq!(store.len(), 6);
    }

    #[test]
    fn reset_clears_everything() {
        let mut store = RowStore::new();
        store.replace(items(0..10), 40, true);
        store.reset();

        assert!(store.is_empty());
        assert_eq!(store.total(), None);
        assert!(!store.has_more());
        assert_eq!(store.next_offset(), 0);

        store.replace(items(0..1), 1, false);
        assert_eq!(store.len(), 1);
    }
}
