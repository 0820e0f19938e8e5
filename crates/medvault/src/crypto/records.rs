//! Record-level adapter: applies [`FieldCipher`] to designated attributes of a
//! JSON record at the persistence boundary.
//!
//! Attributes are named with dot-notation paths. Array fields use the `[]`
//! suffix, e.g. `"doses[].schedule"`. Paths that do not exist in a record are
//! skipped, as are `null` values.
//!
//! Because ciphertext is randomised, the storage layer cannot search encrypted
//! attributes. Search fetches candidates by unencrypted criteria, opens them,
//! and filters in memory with [`matches_any`].

use std::convert::Infallible;

use serde_json::Value;

use super::cipher::CipherError;
use super::field::FieldCipher;

/// Segments of a dot-notation attribute path.
#[derive(Debug, PartialEq, Eq)]
enum PathSegment {
    /// Navigate into an object property by name.
    Key(String),
    /// Expand into every element of a JSON array.
    ArrayItem,
}

/// `"doses[].schedule"` → `[Key("doses"), ArrayItem, Key("schedule")]`.
fn parse_path(path: &str) -> Vec<PathSegment> {
    let mut segments = Vec::new();
    for part in path.split('.') {
        if let Some(key) = part.strip_suffix("[]") {
            segments.push(PathSegment::Key(key.to_owned()));
            segments.push(PathSegment::ArrayItem);
        } else {
            segments.push(PathSegment::Key(part.to_owned()));
        }
    }
    segments
}

/// Walk `value` along `segments` and apply `leaf` to every value found.
fn visit<E>(
    value: &mut Value,
    segments: &[PathSegment],
    leaf: &mut dyn FnMut(&mut Value) -> Result<(), E>,
) -> Result<(), E> {
    let Some((head, rest)) = segments.split_first() else {
        return leaf(value);
    };

    match head {
        PathSegment::Key(key) => {
            if let Value::Object(map) = value {
                if let Some(child) = map.get_mut(key) {
                    visit(child, rest, leaf)?;
                }
            }
        }
        PathSegment::ArrayItem => {
            if let Value::Array(items) = value {
                for item in items.iter_mut() {
                    visit(item, rest, leaf)?;
                }
            }
        }
    }
    Ok(())
}

/// Encrypt every designated attribute of `record` in place before it is written.
///
/// Strings are encrypted as-is; numbers and booleans are encrypted in their
/// JSON text form so no scalar at a designated path is stored in the clear.
/// `null`, objects, and arrays at a leaf are left untouched.
///
/// # Errors
///
/// Fails on the first attribute that cannot be encrypted; `record` may then be
/// partially sealed and must not be persisted.
pub fn seal_record(
    cipher: &FieldCipher,
    record: &mut Value,
    paths: &[&str],
) -> Result<(), CipherError> {
    for path in paths {
        visit::<CipherError>(record, &parse_path(path), &mut |leaf: &mut Value| {
            let plaintext = match leaf {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null | Value::Object(_) | Value::Array(_) => return Ok(()),
            };
            *leaf = Value::String(cipher.encrypt(&plaintext)?);
            Ok(())
        })?;
    }
    Ok(())
}

/// Decrypt every designated attribute of `record` in place after it is read.
///
/// Values that fail to decrypt become the placeholder from
/// [`FieldCipher::from_storage`]; this never fails.
pub fn open_record(cipher: &FieldCipher, record: &mut Value, paths: &[&str]) {
    for path in paths {
        let mut open_leaf = |leaf: &mut Value| -> Result<(), Infallible> {
            if let Value::String(stored) = leaf {
                if let Some(plaintext) = cipher.from_storage(Some(stored.as_str())) {
                    *leaf = Value::String(plaintext);
                }
            }
            Ok(())
        };
        let _ = visit(record, &parse_path(path), &mut open_leaf);
    }
}

/// Case-insensitive substring match of `query` against any non-empty field.
pub fn matches_any(query: &str, fields: &[Option<&str>]) -> bool {
    let needle = query.to_lowercase();
    fields
        .iter()
        .flatten()
        .any(|field| !field.is_empty() && field.to_lowercase().contains(&needle))
}
