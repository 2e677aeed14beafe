//! Transaction names observed by a call chain.

use std::fmt;

use serde::Serialize;

/// Distinct transaction names in the order they were first observed.
/// Absent names (no transaction at all) are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TransactionNames(Vec<String>);

impl TransactionNames {
    pub fn of(names: impl IntoIterator<Item = Option<String>>) -> Self {
        let mut collected: Vec<String> = Vec::new();
        for name in names.into_iter().flatten() {
            if !collected.contains(&name) {
                collected.push(name);
            }
        }
        Self(collected)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    /// Same names, ignoring order.
    pub fn contains_exactly_in_any_order(&self, expected: &[&str]) -> bool {
        self.len() == expected.len() && expected.iter().all(|name| self.contains(name))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for TransactionNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_of_skips_absent_and_duplicates() {
        let names = TransactionNames::of([
            Some("outer".to_string()),
            None,
            Some("outer".to_string()),
            Some("inner".to_string()),
        ]);
        assert_eq!(names.as_slice(), ["outer", "inner"]);
        assert_eq!(names.to_string(), "[outer, inner]");
    }

    #[test]
    fn test_any_order() {
        let names = TransactionNames::of([Some("a".to_string()), Some("b".to_string())]);
        assert!(names.contains_exactly_in_any_order(&["b", "a"]));
        assert!(!names.contains_exactly_in_any_order(&["a"]));
        assert!(!names.contains_exactly_in_any_order(&["a", "c"]));
        assert!(TransactionNames::of([None]).is_empty());
    }
}
