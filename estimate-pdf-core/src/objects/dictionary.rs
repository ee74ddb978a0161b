use crate::objects::Object;
use std::collections::BTreeMap;

/// PDF dictionary with keys kept in sorted order so output is reproducible.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dictionary {
    entries: BTreeMap<String, Object>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dictionary with its `/Type` entry already set.
    pub fn typed(type_name: &str) -> Self {
        let mut dict = Self::new();
        dict.set("Type", Object::name(type_name));
        dict
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Object>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Object> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Object> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Object)> {
        self.entries.iter()
    }
}

impl FromIterator<(String, Object)> for Dictionary {
    fn from_iter<T: IntoIterator<Item = (String, Object)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_dictionary() {
        let dict = Dictionary::typed("Catalog");
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.get("Type"), Some(&Object::Name("Catalog".to_string())));
    }

    #[test]
    fn test_set_get_remove() {
        let mut dict = Dictionary::new();
        assert!(dict.is_empty());

        dict.set("Count", 3i64);
        dict.set("Title", "Estimate");
        assert!(dict.contains_key("Count"));
        assert_eq!(dict.get("Count"), Some(&Object::Integer(3)));

        assert_eq!(
            dict.remove("Title"),
            Some(Object::String("Estimate".to_string()))
        );
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn test_iteration_is_sorted() {
        let mut dict = Dictionary::new();
        dict.set("Zeta", 1i64);
        dict.set("Alpha", 2i64);
        dict.set("Mid", 3i64);

        let keys: Vec<&str> = dict.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["Alpha", "Mid", "Zeta"]);
    }

    #[test]
    fn test_from_iterator() {
        let dict: Dictionary = vec![
            ("A".to_string(), Object::Integer(1)),
            ("B".to_string(), Object::Boolean(false)),
        ]
        .into_iter()
        .collect();
        assert_eq!(dict.len(), 2);
    }
}
