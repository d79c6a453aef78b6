//! Secret kind enum and its wire table.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// What a secret's payload holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SecretKind {
    Text,
    Binary,
    Card,
    File,
    #[default]
    Unknown,
}

const ALL: [SecretKind; 5] = [
    SecretKind::Text,
    SecretKind::Binary,
    SecretKind::Card,
    SecretKind::File,
    SecretKind::Unknown,
];

impl SecretKind {
    /// All kinds in declaration order.
    pub fn all() -> impl Iterator<Item = SecretKind> {
        ALL.into_iter()
    }

    /// Wire name of this kind, also used for the database column and printing.
    pub fn as_str(self) -> &'static str {
        match self {
            SecretKind::Text => "text",
            SecretKind::Binary => "binary",
            SecretKind::Card => "card",
            SecretKind::File => "file",
            SecretKind::Unknown => "unknown",
        }
    }

    /// Decode a wire name. Unrecognised names are `Unknown`.
    pub fn from_wire(name: &str) -> Self {
        ALL.into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
            .unwrap_or(SecretKind::Unknown)
    }

    /// Whether the payload may be exported verbatim to a file.
    pub fn is_exportable(self) -> bool {
        matches!(self, SecretKind::Text | SecretKind::Binary)
    }
}

impl fmt::Display for SecretKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecretKind {
    type Err = String;

    /// Strict parse for user input; the wire decoder is lenient instead.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::from_wire(s) {
            SecretKind::Unknown if !s.eq_ignore_ascii_case("unknown") => Err(format!(
                "unknown secret type '{}', expected one of: text, binary, card, file",
                s
            )),
            kind => Ok(kind),
        }
    }
}

impl Serialize for SecretKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SecretKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from_wire(&name))
    }
}
