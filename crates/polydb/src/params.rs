//! Named parameter hygiene: fresh keys, key validation and placeholder scanning.
//!
//! Placeholders are `:name` tokens where `name` matches `[A-Za-z0-9_]+`.
//! The scanner skips string literals, quoted identifiers, comments, `::` and
//! PL/SQL `:=`, so `TO_CHAR(d, 'HH24:MI:SS')` has no placeholders. MySQL
//! literals may also escape a quote with a backslash (`'it\'s'`); Oracle
//! literals may not.

use crate::dialect::Dialect;
use crate::error::{DbError, DbResult};
use crate::value::Bindings;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Maximum length of a generated key, `:` included. Several engines cap bind
/// variable names, so generated keys stay short.
pub const MAX_KEY_LEN: usize = 16;

const KEY_PREFIX: &str = ":key_";

/// Process-wide counter mixed into every generated key.
static KEY_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a fresh placeholder key like `:key_3f9a0c1b2d7`.
///
/// `salt` is mixed into the hash together with random bytes, the wall clock
/// and a process-wide counter.
pub fn unique_key(salt: &str) -> String {
    let mut hasher = DefaultHasher::new();
    uuid::Uuid::new_v4().as_bytes().hash(&mut hasher);
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default()
        .hash(&mut hasher);
    KEY_COUNTER.fetch_add(1, Ordering::Relaxed).hash(&mut hasher);
    salt.hash(&mut hasher);

    let mut key = format!("{KEY_PREFIX}{:016x}", hasher.finish());
    key.truncate(MAX_KEY_LEN);
    key
}

/// Check a single binding key: `:` prefix and no whitespace.
pub fn validate_key(key: &str) -> DbResult<()> {
    if !key.starts_with(':') || key.len() < 2 || key.chars().any(char::is_whitespace) {
        return Err(DbError::InvalidBindingKey(key.to_string()));
    }
    Ok(())
}

/// Check every key of a binding map.
pub fn validate_bindings(values: &Bindings) -> DbResult<()> {
    values.keys().try_for_each(|k| validate_key(k))
}

/// Check that every placeholder referenced by `sql` has a value.
pub fn ensure_bound(dialect: Dialect, sql: &str, values: &Bindings) -> DbResult<()> {
    match placeholders_for(dialect, sql).find(|p| !values.contains_key(p.key)) {
        Some(p) => Err(DbError::UnboundParameter(p.key.to_string())),
        None => Ok(()),
    }
}

/// A `:name` occurrence in statement text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder<'a> {
    /// The key including its leading `:`.
    pub key: &'a str,
    /// Byte offset of the `:` in the scanned text.
    pub start: usize,
}

fn is_name_byte(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphanumeric()
}

/// Iterate over the placeholders of `sql` in order of appearance. Quotes
/// inside literals are escaped by doubling only.
pub fn placeholders(sql: &str) -> impl Iterator<Item = Placeholder<'_>> {
    scan(sql, false)
}

/// [`placeholders`] with the string escapes of `dialect`.
pub fn placeholders_for(dialect: Dialect, sql: &str) -> impl Iterator<Item = Placeholder<'_>> {
    scan(sql, matches!(dialect, Dialect::MySql))
}

fn scan(sql: &str, backslash_escapes: bool) -> impl Iterator<Item = Placeholder<'_>> {
    let bytes = sql.as_bytes();
    let mut i = 0;
    std::iter::from_fn(move || {
        while i < bytes.len() {
            match bytes[i] {
                quote @ (b'\'' | b'"' | b'`') => {
                    i += 1;
                    while i < bytes.len() {
                        if backslash_escapes && quote != b'`' && bytes[i] == b'\\' {
                            i += 2;
                            continue;
                        }
                        if bytes[i] == quote {
                            // Doubled quote escapes itself.
                            if bytes.get(i + 1) == Some(&quote) {
                                i += 2;
                                continue;
                            }
                            break;
                        }
                        i += 1;
                    }
                    i += 1;
                }
                b'-' if bytes.get(i + 1) == Some(&b'-') => {
                    while i < bytes.len() && bytes[i] != b'\n' {
                        i += 1;
                    }
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    i += 2;
                    while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/'))
                    {
                        i += 1;
                    }
                    i += 2;
                }
                b':' if bytes.get(i + 1) == Some(&b':') => i += 2,
                b':' => {
                    let start = i;
                    i += 1;
                    while i < bytes.len() && is_name_byte(bytes[i]) {
                        i += 1;
                    }
                    if i > start + 1 {
                        return Some(Placeholder {
                            key: &sql[start..i],
                            start,
                        });
                    }
                }
                _ => i += 1,
            }
        }
        None
    })
}

/// Replace every placeholder by the text `render` returns for it. Placeholders
/// without a rendering are left untouched.
pub fn substitute<'a>(sql: &'a str, mut render: impl FnMut(&'a str) -> Option<String>) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut last = 0;
    for p in placeholders(sql) {
        if let Some(text) = render(p.key) {
            out.push_str(&sql[last..p.start]);
            out.push_str(&text);
            last = p.start + p.key.len();
        }
    }
    out.push_str(&sql[last..]);
    out
}
