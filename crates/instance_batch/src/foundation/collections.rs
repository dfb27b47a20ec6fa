//! Specialized collection types

pub use slotmap::{new_key_type, SecondaryMap, SlotMap};

/// Free list for object pooling
///
/// Released indices are handed out again before the list grows, so a
/// bounded list keeps its indices in `[0, capacity)`.
#[derive(Debug)]
pub struct FreeList<T> {
    items: Vec<Option<T>>,
    free_indices: Vec<usize>,
    capacity: usize,
}

impl<T> FreeList<T> {
    /// Create a free list that never grows past `capacity` live items
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            free_indices: Vec::new(),
            capacity,
        }
    }

    /// Insert an item and return its index, or `None` when full
    pub fn insert(&mut self, item: T) -> Option<usize> {
        if let Some(index) = self.free_indices.pop() {
            self.items[index] = Some(item);
            Some(index)
        } else if self.items.len() < self.capacity {
            let index = self.items.len();
            self.items.push(Some(item));
            Some(index)
        } else {
            None
        }
    }

    /// Remove an item by index
    pub fn remove(&mut self, index: usize) -> Option<T> {
        let item = self.items.get_mut(index)?.take()?;
        self.free_indices.push(index);
        Some(item)
    }

    /// Get an item by index
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)?.as_ref()
    }

    /// Number of live items
    pub fn len(&self) -> usize {
        self.items.len() - self.free_indices.len()
    }

    /// Whether no items are live
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live items in ascending index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| item.as_ref().map(|item| (index, item)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_list_reuses_released_indices() {
        let mut list = FreeList::with_capacity(2);
        assert_eq!(list.insert("a"), Some(0));
        assert_eq!(list.insert("b"), Some(1));
        assert_eq!(list.insert("c"), None);

        assert_eq!(list.remove(0), Some("a"));
        assert_eq!(list.remove(0), None);
        assert_eq!(list.insert("d"), Some(0));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_free_list_iterates_in_index_order() {
        let mut list = FreeList::with_capacity(4);
        for value in 0..4 {
            let _ = list.insert(value);
        }
        let _ = list.remove(1);
        let indices: Vec<usize> = list.iter().map(|(index, _)| index).collect();
        assert_eq!(indices, vec![0, 2, 3]);
    }
}
