use std::collections::BTreeMap;

use crate::types::SqlValue;

/// Parameters attached to a [`Statement`].
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    /// Values bound to `?` placeholders left to right, 1-indexed.
    Positional(Vec<SqlValue>),
    /// Values bound to `:name` placeholders by name.
    Named(BTreeMap<String, SqlValue>),
}

impl Params {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Params::Positional(values) => values.len(),
            Params::Named(map) => map.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// SQL text plus its parameters.
///
/// A statement is plain data: executing it never changes it, so the same value
/// can be run any number of times.
///
/// ```rust
/// use sql_access::{SqlExt, Statement};
///
/// let by_position = "SELECT name FROM people WHERE id = ?".params_list([1]);
/// let by_name = "SELECT name FROM people WHERE id = :id".params([("id", 1)]);
/// let plain = Statement::from("SELECT name FROM people WHERE id = 1");
/// assert!(plain.params().is_empty());
/// # let _ = (by_position, by_name);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    params: Params,
}

impl Statement {
    /// A statement without parameters.
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Params::Positional(Vec::new()),
        }
    }

    #[must_use]
    pub fn positional<I, V>(sql: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        Self {
            sql: sql.into(),
            params: Params::Positional(params.into_iter().map(Into::into).collect()),
        }
    }

    #[must_use]
    pub fn named<I, K, V>(sql: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<SqlValue>,
    {
        Self {
            sql: sql.into(),
            params: Params::Named(
                params
                    .into_iter()
                    .map(|(name, value)| (name.into(), value.into()))
                    .collect(),
            ),
        }
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }
}

impl From<&str> for Statement {
    fn from(sql: &str) -> Self {
        Statement::new(sql)
    }
}

impl From<String> for Statement {
    fn from(sql: String) -> Self {
        Statement::new(sql)
    }
}

impl From<&Statement> for Statement {
    fn from(stmt: &Statement) -> Self {
        stmt.clone()
    }
}

/// Build statements straight from SQL text.
pub trait SqlExt {
    /// Attach positional parameters.
    fn params_list<I, V>(&self, params: I) -> Statement
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>;

    /// Attach named parameters.
    fn params<I, K, V>(&self, params: I) -> Statement
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<SqlValue>;
}

impl SqlExt for str {
    fn params_list<I, V>(&self, params: I) -> Statement
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        Statement::positional(self, params)
    }

    fn params<I, K, V>(&self, params: I) -> Statement
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<SqlValue>,
    {
        Statement::named(self, params)
    }
}

/// Positional statement with heterogeneous values.
///
/// ```rust
/// let stmt = sql_access::positional!("INSERT INTO people (id, name) VALUES (?, ?)", 7, "Michal");
/// assert_eq!(stmt.params().len(), 2);
/// ```
#[macro_export]
macro_rules! positional {
    ($sql:expr $(, $value:expr)* $(,)?) => {
        $crate::Statement::positional($sql, ::std::vec![$($crate::SqlValue::from($value)),*])
    };
}

/// Named statement with heterogeneous values.
///
/// ```rust
/// let stmt = sql_access::named!(
///     "INSERT INTO people (id, name) VALUES (:id, :name)",
///     id => 3,
///     name => "Michal",
/// );
/// assert_eq!(stmt.params().len(), 2);
/// ```
#[macro_export]
macro_rules! named {
    ($sql:expr $(, $name:ident => $value:expr)* $(,)?) => {
        $crate::Statement::named(
            $sql,
            ::std::vec![$((::std::stringify!($name), $crate::SqlValue::from($value))),*],
        )
    };
}
