//! Reusable SQL fragments carrying their own bound values.

use crate::error::{DbError, DbResult};
use crate::params::substitute;
use crate::value::{Bindings, Value};

/// A small piece of SQL text together with the values its placeholders bind.
///
/// Fragments are produced by [`Expression`](crate::Expression) and spliced
/// into statements. They are never validated here; producers are responsible
/// for the keys they generate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fragment {
    text: String,
    values: Bindings,
}

impl Fragment {
    pub fn new(text: impl Into<String>, values: Bindings) -> Self {
        Self {
            text: text.into(),
            values,
        }
    }

    /// A fragment with no text and no values.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A fragment binding a single key.
    pub fn single(text: impl Into<String>, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut values = Bindings::new();
        values.insert(key.into(), value.into());
        Self::new(text, values)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn values(&self) -> &Bindings {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.values.is_empty()
    }

    pub fn into_parts(self) -> (String, Bindings) {
        (self.text, self.values)
    }

    /// Copy of this fragment with every key renamed to `<key>_<suffix>`, in
    /// both the text and the value map.
    pub fn with_key_suffix(&self, suffix: impl std::fmt::Display) -> Self {
        // Single pass, so `:a` and `:a_1` in one fragment cannot collide.
        let text = substitute(&self.text, |key| {
            self.values
                .contains_key(key)
                .then(|| format!("{key}_{suffix}"))
        });
        let values = self
            .values
            .iter()
            .map(|(key, value)| (format!("{key}_{suffix}"), value.clone()))
            .collect();
        Self { text, values }
    }

    /// Concatenate two fragments. Their key sets must be disjoint.
    pub fn join(mut self, other: Fragment) -> DbResult<Self> {
        if let Some(dup) = other.values.keys().find(|k| self.values.contains_key(*k)) {
            return Err(DbError::DuplicateBindingKey(dup.clone()));
        }
        self.text.push_str(&other.text);
        self.values.extend(other.values);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_renames_text_and_keys() {
        let f = Fragment::single(" UNHEX(:key_abc) ", ":key_abc", "ff").with_key_suffix(2);
        assert_eq!(f.text(), " UNHEX(:key_abc_2) ");
        assert_eq!(f.values().get(":key_abc_2"), Some(&Value::from("ff")));
        assert_eq!(f.values().len(), 1);
    }

    #[test]
    fn suffix_does_not_cascade_between_keys() {
        let mut values = Bindings::new();
        values.insert(":a".into(), Value::Int(1));
        values.insert(":a_1".into(), Value::Int(2));
        let f = Fragment::new(":a + :a_1", values).with_key_suffix(1);
        assert_eq!(f.text(), ":a_1 + :a_1_1");
        assert_eq!(f.values().get(":a_1"), Some(&Value::Int(1)));
        assert_eq!(f.values().get(":a_1_1"), Some(&Value::Int(2)));
    }

    #[test]
    fn join_rejects_shared_keys() {
        let a = Fragment::single("a = :a", ":a", 1);
        let b = Fragment::single(" AND b = :b", ":b", 2);
        let joined = a.clone().join(b).unwrap();
        assert_eq!(joined.text(), "a = :a AND b = :b");
        assert_eq!(joined.values().len(), 2);

        let err = joined.join(a).unwrap_err();
        assert!(matches!(err, DbError::DuplicateBindingKey(k) if k == ":a"));
    }

    #[test]
    fn empty_fragment_is_empty() {
        assert!(Fragment::empty().is_empty());
        assert!(!Fragment::new("''", Bindings::new()).is_empty());
    }
}
