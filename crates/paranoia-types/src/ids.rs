//! Namespaced identifiers.
//!
//! Callbacks, temporary tick hooks, modifier hooks, entity kinds, and items
//! are all keyed by a `namespace:path` pair. An identifier without an
//! explicit namespace falls into [`DEFAULT_NAMESPACE`].
//!
//! Identifiers are validated on construction, so a malformed key in a
//! persisted record surfaces as a deserialization error rather than a
//! silently mismatched lookup.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Namespace assumed when an identifier string has no `namespace:` prefix.
pub const DEFAULT_NAMESPACE: &str = "paranoia";

/// Errors produced when parsing an [`Identifier`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    /// The namespace or path part was empty.
    #[error("identifier `{0}` has an empty namespace or path")]
    Empty(String),

    /// The string contained a character outside `[a-z0-9_.-/]`.
    #[error("identifier `{input}` contains invalid character {invalid:?}")]
    InvalidCharacter {
        /// The full input string.
        input: String,
        /// The first offending character.
        invalid: char,
    },
}

/// A validated `namespace:path` key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier {
    namespace: String,
    path: String,
}

impl Identifier {
    /// Build an identifier from its two parts.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError`] if either part is empty or contains a
    /// character outside the allowed set.
    pub fn new(namespace: &str, path: &str) -> Result<Self, IdentifierError> {
        let display = format!("{namespace}:{path}");
        if namespace.is_empty() || path.is_empty() {
            return Err(IdentifierError::Empty(display));
        }
        if let Some(invalid) = namespace.chars().find(|c| !is_namespace_char(*c)) {
            return Err(IdentifierError::InvalidCharacter {
                input: display,
                invalid,
            });
        }
        if let Some(invalid) = path.chars().find(|c| !is_path_char(*c)) {
            return Err(IdentifierError::InvalidCharacter {
                input: display,
                invalid,
            });
        }
        Ok(Self {
            namespace: namespace.to_owned(),
            path: path.to_owned(),
        })
    }

    /// Parse `namespace:path`, or `path` in the default namespace.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError`] if the string is not a valid identifier.
    pub fn parse(input: &str) -> Result<Self, IdentifierError> {
        match input.split_once(':') {
            Some((namespace, path)) => Self::new(namespace, path),
            None => Self::new(DEFAULT_NAMESPACE, input),
        }
    }

    /// The namespace part.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The path part.
    pub fn path(&self) -> &str {
        &self.path
    }
}

const fn is_namespace_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | '.')
}

const fn is_path_char(c: char) -> bool {
    is_namespace_char(c) || c == '/'
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Identifier {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.to_string()
    }
}
