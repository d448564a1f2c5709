//! Row cursors handed to extractors.

mod row;
mod row_set;

use std::collections::HashMap;
use std::sync::Arc;

pub use row::{Row, extractor};
pub use row_set::RowSet;
pub(crate) use row_set::Cursor;

/// Column names of a result, shared by every row read from it.
#[derive(Debug, Clone)]
pub struct Columns {
    names: Arc<Vec<String>>,
    // keys are ASCII-lowercased
    index: Arc<HashMap<String, usize>>,
}

impl Columns {
    #[must_use]
    pub fn new(names: Vec<String>) -> Self {
        let mut index = HashMap::with_capacity(names.len());
        for (idx, name) in names.iter().enumerate() {
            // first occurrence wins for duplicate labels
            index.entry(name.to_ascii_lowercase()).or_insert(idx);
        }
        Self {
            names: Arc::new(names),
            index: Arc::new(index),
        }
    }

    /// Position of `name`, matched exactly first and then ignoring ASCII case.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names
            .iter()
            .position(|col| col == name)
            .or_else(|| self.index.get(&name.to_ascii_lowercase()).copied())
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::Columns;

    #[test]
    fn lookup_ignores_ascii_case() {
        let columns = Columns::new(vec!["id".into(), "Name".into()]);
        assert_eq!(columns.index_of("name"), Some(1));
        assert_eq!(columns.index_of("ID"), Some(0));
        assert_eq!(columns.index_of("missing"), None);
    }

    #[test]
    fn exact_match_beats_case_folding() {
        let columns = Columns::new(vec!["a".into(), "A".into()]);
        assert_eq!(columns.index_of("A"), Some(1));
        assert_eq!(columns.index_of("a"), Some(0));
    }
}
