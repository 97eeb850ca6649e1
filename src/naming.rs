//! Client-facing naming conventions.
//!
//! A convention is a pair of pure functions: `encode` turns a canonical
//! (snake_case) field name into the name clients see, `decode` goes the other
//! way. The same convention must be used for both directions of one request.

use std::fmt;
use std::sync::Arc;

use convert_case::{Case, Casing};
use serde::{Deserialize, Serialize};

type NameFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Casing styles selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameCase {
    /// Client names are canonical names.
    Identity,
    #[default]
    Camel,
    Pascal,
    Snake,
    Kebab,
}

impl NameCase {
    fn apply(self, name: &str) -> String {
        match self {
            NameCase::Identity => name.to_string(),
            NameCase::Camel => name.to_case(Case::Camel),
            NameCase::Pascal => name.to_case(Case::Pascal),
            NameCase::Snake => name.to_case(Case::Snake),
            NameCase::Kebab => name.to_case(Case::Kebab),
        }
    }
}

/// Bidirectional field-name transform.
#[derive(Clone)]
pub struct NamingConvention {
    label: String,
    encode: NameFn,
    decode: NameFn,
}

impl NamingConvention {
    /// Client names equal canonical names.
    pub fn identity() -> Self {
        Self::custom("identity", |name| name.to_string(), |name| name.to_string())
    }

    /// Casing-style rewrite; canonical names are snake_case.
    pub fn from_case(case: NameCase) -> Self {
        if case == NameCase::Identity {
            return Self::identity();
        }
        Self::custom(
            format!("{:?}", case).to_lowercase(),
            move |name| case.apply(name),
            |name| NameCase::Snake.apply(name),
        )
    }

    pub fn camel_case() -> Self {
        Self::from_case(NameCase::Camel)
    }

    /// Build a convention from an arbitrary encode/decode pair.
    pub fn custom<E, D>(label: impl Into<String>, encode: E, decode: D) -> Self
    where
        E: Fn(&str) -> String + Send + Sync + 'static,
        D: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            encode: Arc::new(encode),
            decode: Arc::new(decode),
        }
    }

    /// Canonical name -> client name.
    pub fn encode(&self, canonical: &str) -> String {
        (self.encode)(canonical)
    }

    /// Client name -> canonical name.
    pub fn decode(&self, client: &str) -> String {
        (self.decode)(client)
    }

    /// Resolve a client name against a set of canonical names.
    ///
    /// Decoding is tried first; names that do not survive a decode/encode
    /// round trip (`address_line1`, acronyms) are matched by encoding each
    /// candidate instead.
    pub fn resolve<'a, I>(&self, client: &str, candidates: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let decoded = self.decode(client);
        let mut encoded_match = None;
        for candidate in candidates {
            if candidate == decoded {
                return Some(candidate);
            }
            if encoded_match.is_none() && self.encode(candidate) == client {
                encoded_match = Some(candidate);
            }
        }
        encoded_match
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Default for NamingConvention {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Debug for NamingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamingConvention")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}
