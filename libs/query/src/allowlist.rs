//! Known column names for a target table.

use std::collections::HashSet;

/// Ordered set of column names obtained from schema introspection.
///
/// Every dynamic field reference is checked against this set before it is
/// interpolated as an identifier. Order is preserved because the first column
/// doubles as the default sort key.
#[derive(Debug, Clone, Default)]
pub struct ColumnAllowlist {
    columns: Vec<String>,
    index: HashSet<String>,
}

impl ColumnAllowlist {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out = Self::default();
        for column in columns {
            let column = column.into();
            if out.index.insert(column.clone()) {
                out.columns.push(column);
            }
        }
        out
    }

    /// Exact, case-sensitive membership.
    pub fn contains(&self, column: &str) -> bool {
        self.index.contains(column)
    }

    pub fn first(&self) -> Option<&str> {
        self.columns.first().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ColumnAllowlist {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}
