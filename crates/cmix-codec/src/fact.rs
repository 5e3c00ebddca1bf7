//! Facts: typed, user-discoverable strings attached to a contact.
//!
//! A fact renders as its one-letter type prefix followed by the value
//! (`Ualice`, `Ealice@example.com`). A list renders each fact followed by
//! `;`, so the empty list is the empty string.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CodecError, Result};

/// Separator after every fact in a rendered list
pub const FACT_TERMINATOR: char = ';';

/// Kind of a [`Fact`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FactType {
    /// User name
    Username,
    /// Email address
    Email,
    /// Phone number
    Phone,
    /// Display nickname
    Nickname,
}

impl FactType {
    /// One-letter prefix used in the rendered form.
    pub const fn prefix(self) -> char {
        match self {
            Self::Username => 'U',
            Self::Email => 'E',
            Self::Phone => 'P',
            Self::Nickname => 'N',
        }
    }

    /// Inverse of [`FactType::prefix`].
    pub fn from_prefix(prefix: char) -> Result<Self> {
        match prefix {
            'U' => Ok(Self::Username),
            'E' => Ok(Self::Email),
            'P' => Ok(Self::Phone),
            'N' => Ok(Self::Nickname),
            other => Err(CodecError::InvalidFact { reason: format!("unknown fact type {other:?}") }),
        }
    }
}

/// A typed fact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fact {
    fact_type: FactType,
    value: String,
}

impl Fact {
    /// Build a fact.
    ///
    /// # Errors
    ///
    /// - `InvalidFact` if `value` is empty or contains `;`
    pub fn new(fact_type: FactType, value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(CodecError::InvalidFact { reason: "empty value".into() });
        }
        if value.contains(FACT_TERMINATOR) {
            return Err(CodecError::InvalidFact { reason: "value contains ';'".into() });
        }
        Ok(Self { fact_type, value })
    }

    /// Fact type.
    pub const fn fact_type(&self) -> FactType {
        self.fact_type
    }

    /// Fact value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Parse a single rendered fact (`Ualice`).
    pub fn parse(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        let Some(prefix) = chars.next() else {
            return Err(CodecError::InvalidFact { reason: "empty fact".into() });
        };
        Self::new(FactType::from_prefix(prefix)?, chars.as_str())
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.fact_type.prefix(), self.value)
    }
}

/// Ordered list of facts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FactList(Vec<Fact>);

impl FactList {
    /// Empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fact.
    pub fn push(&mut self, fact: Fact) {
        self.0.push(fact);
    }

    /// Facts in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Fact> {
        self.0.iter()
    }

    /// Number of facts.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Canonical rendering: every fact followed by `;`.
    pub fn stringify(&self) -> String {
        let mut out = String::new();
        for fact in &self.0 {
            out.push_str(&fact.to_string());
            out.push(FACT_TERMINATOR);
        }
        out
    }

    /// Parse a canonical rendering.
    ///
    /// # Errors
    ///
    /// - `InvalidFact` if a fact is malformed or the last one is not
    ///   terminated
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(Self::new());
        }
        let Some(body) = s.strip_suffix(FACT_TERMINATOR) else {
            return Err(CodecError::InvalidFact { reason: "unterminated fact list".into() });
        };
        body.split(FACT_TERMINATOR).map(Fact::parse).collect::<Result<Vec<_>>>().map(Self)
    }
}

impl From<Vec<Fact>> for FactList {
    fn from(facts: Vec<Fact>) -> Self {
        Self(facts)
    }
}

impl<'a> IntoIterator for &'a FactList {
    type Item = &'a Fact;
    type IntoIter = std::slice::Iter<'a, Fact>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Serialize for FactList {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.stringify())
    }
}

impl<'de> Deserialize<'de> for FactList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
