//! Placeholder binding.
//!
//! A [`Statement`] carries either positional (`?`) or named (`:name`) parameters.
//! Before execution the single binder here rewrites it into the placeholder
//! dialect of the target backend and produces the ordered value list the
//! driver binds by index. Quoted strings, quoted identifiers, comments,
//! dollar-quoted blocks and `::` casts are skipped by a lightweight state
//! machine.

use std::borrow::Cow;
use std::collections::HashMap;

mod parsers;
mod scanner;

use parsers::{
    is_block_comment_end, is_block_comment_start, is_cast, is_line_comment_start, matches_tag,
    try_start_dollar_quote,
};
use scanner::{State, scan_digits, scan_identifier};

use crate::error::SqlAccessError;
use crate::statement::{Params, Statement};
use crate::types::SqlValue;

/// Target placeholder style for binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// PostgreSQL-style placeholders like `$1`.
    Postgres,
    /// SQLite-style placeholders like `?` or `?1`.
    Sqlite,
}

/// SQL text plus values in bind order, ready for a driver.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatement<'a> {
    pub sql: Cow<'a, str>,
    pub values: Cow<'a, [SqlValue]>,
}

enum Step {
    Keep,
    Replace { text: String, end: usize },
}

/// Bind a statement for the given placeholder style.
///
/// Positional parameters are passed through in order; a count mismatch is left
/// for the driver to report. Every `:name` referenced by a named statement must
/// exist in its parameter map.
///
/// # Errors
/// Returns `SqlAccessError::BindingError` if a named placeholder has no value.
///
/// # Examples
/// ```rust
/// use sql_access::{PlaceholderStyle, Statement, bind};
///
/// let stmt = Statement::named(
///     "SELECT name FROM people WHERE id = :id OR parent = :id",
///     [("id", 2)],
/// );
/// let bound = bind(&stmt, PlaceholderStyle::Postgres)?;
/// assert_eq!(bound.sql, "SELECT name FROM people WHERE id = $1 OR parent = $1");
/// assert_eq!(bound.values.len(), 1);
/// # Ok::<(), sql_access::SqlAccessError>(())
/// ```
pub fn bind(
    statement: &Statement,
    style: PlaceholderStyle,
) -> Result<BoundStatement<'_>, SqlAccessError> {
    match statement.params() {
        Params::Positional(values) => Ok(BoundStatement {
            sql: bind_positional(statement.sql(), style)?,
            values: Cow::Borrowed(values.as_slice()),
        }),
        Params::Named(map) => {
            let mut order: HashMap<String, usize> = HashMap::new();
            let mut values: Vec<SqlValue> = Vec::new();
            let sql = rewrite(statement.sql(), |bytes, idx| {
                if bytes[idx] != b':' || is_cast(bytes, idx) {
                    return Ok(Step::Keep);
                }
                let Some((end, name)) = scan_identifier(bytes, idx + 1) else {
                    return Ok(Step::Keep);
                };
                let number = match order.get(name) {
                    Some(number) => *number,
                    None => {
                        let value = map.get(name).ok_or_else(|| {
                            SqlAccessError::BindingError(format!(
                                "no value supplied for named parameter :{name}"
                            ))
                        })?;
                        values.push(value.clone());
                        order.insert(name.to_string(), values.len());
                        values.len()
                    }
                };
                Ok(Step::Replace {
                    text: numbered_placeholder(style, number),
                    end,
                })
            })?;
            Ok(BoundStatement {
                sql,
                values: Cow::Owned(values),
            })
        }
    }
}

fn bind_positional(sql: &str, style: PlaceholderStyle) -> Result<Cow<'_, str>, SqlAccessError> {
    if style == PlaceholderStyle::Sqlite {
        return Ok(Cow::Borrowed(sql));
    }
    let mut next = 0;
    rewrite(sql, |bytes, idx| {
        if bytes[idx] != b'?' {
            return Ok(Step::Keep);
        }
        if let Some((end, digits)) = scan_digits(bytes, idx + 1) {
            return Ok(Step::Replace {
                text: format!("${digits}"),
                end,
            });
        }
        next += 1;
        Ok(Step::Replace {
            text: numbered_placeholder(style, next),
            end: idx + 1,
        })
    })
}

fn numbered_placeholder(style: PlaceholderStyle, number: usize) -> String {
    match style {
        PlaceholderStyle::Postgres => format!("${number}"),
        PlaceholderStyle::Sqlite => format!("?{number}"),
    }
}

/// True if the SQL already carries a `RETURNING` clause outside literals and comments.
#[must_use]
pub fn has_returning_clause(sql: &str) -> bool {
    const KEYWORD: &[u8] = b"RETURNING";
    let mut found = false;
    let _ = rewrite(sql, |bytes, idx| {
        let end = idx + KEYWORD.len();
        let preceded = idx > 0 && is_word_byte(bytes[idx - 1]);
        let followed = bytes.get(end).is_some_and(|b| is_word_byte(*b));
        if !preceded
            && !followed
            && end <= bytes.len()
            && bytes[idx..end].eq_ignore_ascii_case(KEYWORD)
        {
            found = true;
        }
        Ok(Step::Keep)
    });
    found
}

/// Append a `RETURNING` clause listing `columns`, or `*` when none are named.
///
/// Trailing comments and semicolons are dropped first so the clause cannot end
/// up inside a `--` comment.
#[must_use]
pub fn with_returning_clause(sql: &str, columns: &[&str]) -> String {
    let end = walk(sql, |_, _| Ok(Step::Keep)).map_or(sql.len(), |(_, end)| end);
    let trimmed = sql[..end].trim_end().trim_end_matches(';').trim_end();
    let list = if columns.is_empty() {
        "*".to_string()
    } else {
        columns.join(", ")
    };
    format!("{trimmed} RETURNING {list}")
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Walk `sql`, offering every byte outside literals and comments to `on_code`.
///
/// Returns a borrowed `Cow` when `on_code` never replaces anything.
fn rewrite<F>(sql: &str, on_code: F) -> Result<Cow<'_, str>, SqlAccessError>
where
    F: FnMut(&[u8], usize) -> Result<Step, SqlAccessError>,
{
    walk(sql, on_code).map(|(out, _)| out)
}

/// [`rewrite`], plus the byte offset just past the last non-blank byte that is
/// not part of a comment.
fn walk<F>(sql: &str, mut on_code: F) -> Result<(Cow<'_, str>, usize), SqlAccessError>
where
    F: FnMut(&[u8], usize) -> Result<Step, SqlAccessError>,
{
    let mut out: Option<String> = None;
    let mut copied = 0;
    let mut state = State::Normal;
    let mut idx = 0;
    let mut code_end = 0;
    let bytes = sql.as_bytes();

    while idx < bytes.len() {
        let b = bytes[idx];
        let significant = match state {
            State::Normal => !b.is_ascii_whitespace(),
            State::LineComment | State::BlockComment(_) => false,
            State::SingleQuoted | State::DoubleQuoted | State::DollarQuoted(_) => true,
        };
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                _ if is_line_comment_start(bytes, idx) => {
                    state = State::LineComment;
                    idx += 1;
                    continue;
                }
                _ if is_block_comment_start(bytes, idx) => {
                    state = State::BlockComment(1);
                    idx += 2;
                    continue;
                }
                b'$' if try_start_dollar_quote(bytes, idx).is_some() => {
                    if let Some((tag, advance)) = try_start_dollar_quote(bytes, idx) {
                        state = State::DollarQuoted(tag);
                        idx = advance;
                    }
                }
                _ => {
                    if let Step::Replace { text, end } = on_code(bytes, idx)? {
                        let buf = out.get_or_insert_with(|| String::with_capacity(sql.len() + 8));
                        buf.push_str(&sql[copied..idx]);
                        buf.push_str(&text);
                        copied = end;
                        idx = end;
                        code_end = end;
                        continue;
                    }
                }
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if is_block_comment_end(bytes, idx) {
                    idx += 1;
                    if depth == 1 {
                        state = State::Normal;
                    } else {
                        state = State::BlockComment(depth - 1);
                    }
                }
            }
            State::DollarQuoted(ref tag) => {
                if b == b'$' && matches_tag(bytes, idx, tag) {
                    let tag_len = tag.len();
                    state = State::Normal;
                    idx += tag_len + 1;
                }
            }
        }
        if significant {
            code_end = idx + 1;
        }
        idx += 1;
    }

    let rewritten = match out {
        Some(mut buf) => {
            buf.push_str(&sql[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(sql),
    };
    Ok((rewritten, code_end.min(sql.len())))
}
