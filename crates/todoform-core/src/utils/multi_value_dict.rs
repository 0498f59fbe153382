//! A dictionary that can hold multiple values per key.
//!
//! [`MultiValueDict`] is the storage behind form submissions, where a single
//! field name may appear multiple times. Keys iterate in the order they were
//! first inserted.

use std::collections::HashMap;
use std::hash::Hash;

/// An insertion-ordered dictionary that maps keys to lists of values.
///
/// [`get`](MultiValueDict::get) returns the **last** value for a key, while
/// [`get_list`](MultiValueDict::get_list) returns all values.
///
/// # Examples
///
/// ```
/// use todoform_core::utils::MultiValueDict;
///
/// let mut d = MultiValueDict::new();
/// d.append("color".to_string(), "red");
/// d.append("size".to_string(), "large");
/// d.append("color".to_string(), "blue");
///
/// assert_eq!(d.get(&"color".to_string()), Some(&"blue"));
/// assert_eq!(d.get_list(&"color".to_string()), Some(&vec!["red", "blue"]));
/// assert_eq!(d.keys().collect::<Vec<_>>(), vec!["color", "size"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MultiValueDict<K: Eq + Hash, V> {
    order: Vec<K>,
    inner: HashMap<K, Vec<V>>,
}

impl<K: Eq + Hash, V> Default for MultiValueDict<K, V> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            inner: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone, V> MultiValueDict<K, V> {
    /// Creates an empty `MultiValueDict`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a reference to the **last** value associated with the key,
    /// or `None` if the key is not present.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.inner.get(key).and_then(|v| v.last())
    }

    /// Returns a reference to all values associated with the key,
    /// or `None` if the key is not present.
    pub fn get_list(&self, key: &K) -> Option<&Vec<V>> {
        self.inner.get(key)
    }

    /// Sets the value for a key, replacing any existing values.
    ///
    /// A key that is already present keeps its position.
    pub fn set(&mut self, key: K, value: V) {
        if !self.inner.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.inner.insert(key, vec![value]);
    }

    /// Appends a value to the list for the given key.
    pub fn append(&mut self, key: K, value: V) {
        if let Some(values) = self.inner.get_mut(&key) {
            values.push(value);
        } else {
            self.order.push(key.clone());
            self.inner.insert(key, vec![value]);
        }
    }

    /// Removes a key and returns its values.
    pub fn remove(&mut self, key: &K) -> Option<Vec<V>> {
        let values = self.inner.remove(key)?;
        self.order.retain(|k| k != key);
        Some(values)
    }

    /// Returns an iterator over the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.order.iter()
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns the total number of values across all keys.
    pub fn value_count(&self) -> usize {
        self.inner.values().map(Vec::len).sum()
    }

    /// Returns `true` if the dictionary contains no keys.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns `true` if the dictionary contains the specified key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.contains_key(key)
    }

    /// Returns an iterator over (key, value-list) pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &Vec<V>)> {
        self.order
            .iter()
            .filter_map(|k| self.inner.get(k).map(|values| (k, values)))
    }
}

impl<K: Eq + Hash + Clone, V> IntoIterator for MultiValueDict<K, V> {
    type Item = (K, Vec<V>);
    type IntoIter = std::vec::IntoIter<(K, Vec<V>)>;

    fn into_iter(mut self) -> Self::IntoIter {
        let mut pairs = Vec::with_capacity(self.order.len());
        for key in self.order {
            if let Some(values) = self.inner.remove(&key) {
                pairs.push((key, values));
            }
        }
        pairs.into_iter()
    }
}

impl<K: Eq + Hash + Clone, V> FromIterator<(K, V)> for MultiValueDict<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut d = Self::new();
        for (k, v) in iter {
            d.append(k, v);
        }
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_empty() {
        let d: MultiValueDict<String, String> = MultiValueDict::new();
        assert!(d.is_empty());
        assert_eq!(d.len(), 0);
        assert_eq!(d.value_count(), 0);
    }

    #[test]
    fn test_set_and_get() {
        let mut d = MultiValueDict::new();
        d.set("key", "value");
        assert_eq!(d.get(&"key"), Some(&"value"));
        assert_eq!(d.get_list(&"key"), Some(&vec!["value"]));
    }

    #[test]
    fn test_append_and_get_returns_last() {
        let mut d = MultiValueDict::new();
        d.append("color", "red");
        d.append("color", "blue");
        d.append("color", "green");

        assert_eq!(d.get(&"color"), Some(&"green"));
        assert_eq!(d.get_list(&"color"), Some(&vec!["red", "blue", "green"]));
        assert_eq!(d.len(), 1);
        assert_eq!(d.value_count(), 3);
    }

    #[test]
    fn test_set_replaces_existing_and_keeps_position() {
        let mut d = MultiValueDict::new();
        d.append("k", "a");
        d.append("j", "x");
        d.append("k", "b");
        d.set("k", "c");
        assert_eq!(d.get_list(&"k"), Some(&vec!["c"]));
        assert_eq!(d.keys().copied().collect::<Vec<_>>(), vec!["k", "j"]);
    }

    #[test]
    fn test_keys_follow_first_insertion() {
        let d: MultiValueDict<_, _> = [("b", 1), ("a", 2), ("b", 3), ("c", 4)]
            .into_iter()
            .collect();
        assert_eq!(d.keys().copied().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        let pairs: Vec<_> = d.into_iter().collect();
        assert_eq!(pairs, vec![("b", vec![1, 3]), ("a", vec![2]), ("c", vec![4])]);
    }

    #[test]
    fn test_remove() {
        let mut d = MultiValueDict::new();
        d.append("a", 1);
        d.append("b", 2);
        assert_eq!(d.remove(&"a"), Some(vec![1]));
        assert_eq!(d.remove(&"a"), None);
        assert_eq!(d.keys().copied().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn test_get_missing_key() {
        let d: MultiValueDict<&str, &str> = MultiValueDict::new();
        assert_eq!(d.get(&"missing"), None);
        assert_eq!(d.get_list(&"missing"), None);
        assert!(!d.contains_key(&"missing"));
    }

    #[test]
    fn test_iter() {
        let mut d = MultiValueDict::new();
        d.append("a", 1);
        d.append("a", 2);
        d.append("b", 3);

        let items: Vec<_> = d.iter().map(|(k, v)| (*k, v.clone())).collect();
        assert_eq!(items, vec![("a", vec![1, 2]), ("b", vec![3])]);
    }
}
