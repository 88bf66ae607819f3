//! Compound identifier parsing.
//!
//! A Grenton object is addressed as `"CLU-><OBJECT>"`: the left part names
//! the CLU (the remote controller), the right part names a variable or a
//! hardware sub-module on it. An identifier with no separator is a bare
//! variable living on the implicit local context.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidIdentifier {
    #[error("empty grenton_id")]
    Empty,
    #[error("grenton_id {0:?} contains more than one '->' separator")]
    MultipleSeparators(String),
    #[error("grenton_id {0:?} has an empty segment around '->'")]
    EmptySegment(String),
}

/// A parsed `"CLU->OBJECT"` identifier. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrentonId {
    raw: String,
    split: Option<(String, String)>,
}

/// How the identifier's object part must be addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectRef<'a> {
    /// No separator: the whole identifier is a variable on the local context.
    LocalVariable(&'a str),
    /// Object part matches the 3-letters + 4-digits module code pattern;
    /// read via the indexed `get(i)` accessor.
    IndexedModule { clu: &'a str, module: &'a str },
    /// Separator present but no pattern match: a named variable on the CLU.
    ModuleVariable { clu: &'a str, name: &'a str },
}

impl GrentonId {
    /// Parse a compound identifier, rejecting malformed input outright so
    /// a misconfigured device fails at startup instead of on every poll.
    pub fn parse(raw: &str) -> Result<Self, InvalidIdentifier> {
        if raw.is_empty() {
            return Err(InvalidIdentifier::Empty);
        }
        let parts: Vec<&str> = raw.split("->").collect();
        match parts.as_slice() {
            [_] => Ok(Self {
                raw: raw.to_string(),
                split: None,
            }),
            [clu, object] => {
                if clu.is_empty() || object.is_empty() {
                    return Err(InvalidIdentifier::EmptySegment(raw.to_string()));
                }
                Ok(Self {
                    raw: raw.to_string(),
                    split: Some((clu.to_string(), object.to_string())),
                })
            }
            _ => Err(InvalidIdentifier::MultipleSeparators(raw.to_string())),
        }
    }

    /// The identifier exactly as configured.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The object part, or the full identifier when there is no separator.
    pub fn object_or_full(&self) -> &str {
        match &self.split {
            Some((_, object)) => object,
            None => &self.raw,
        }
    }

    /// Classify the identifier for command construction.
    pub fn object_ref(&self) -> ObjectRef<'_> {
        match &self.split {
            None => ObjectRef::LocalVariable(&self.raw),
            Some((clu, object)) => {
                if is_module_code(object) {
                    ObjectRef::IndexedModule {
                        clu,
                        module: object,
                    }
                } else {
                    ObjectRef::ModuleVariable { clu, name: object }
                }
            }
        }
    }

    /// Stable unique id exposed to the hub: `grenton_` + object part
    /// (full identifier for bare variables).
    pub fn unique_id(&self) -> String {
        format!("grenton_{}", self.object_or_full())
    }
}

impl std::fmt::Display for GrentonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Module codes are exactly 3 uppercase ASCII letters followed by 4 digits,
/// e.g. `DIN0000` or `DOU1234`.
fn is_module_code(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 7
        && bytes[..3].iter().all(|b| b.is_ascii_uppercase())
        && bytes[3..].iter().all(|b| b.is_ascii_digit())
}
