//! Machine hashes naming dynamic field columns.

use super::SchemaDomainError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

#[expect(clippy::expect_used, reason = "static pattern is known to compile")]
static HASH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_]{3,20}$").expect("hash pattern"));

const ALPHABET: &[u8; 26] = b"abcdefghijklmnopqrstuvwxyz";

/// Encodes a positive integer in bijective base 26 using `a..z`.
///
/// `1 → a`, `26 → z`, `27 → aa`, `702 → zz`, `703 → aaa`. Zero encodes to
/// the empty string.
#[must_use]
pub fn int_to_letters(number: u64) -> String {
    let mut letters = Vec::new();
    let mut remaining = number;
    while remaining > 0 {
        let zero_based = remaining - 1;
        let digit = usize::try_from(zero_based.rem_euclid(26)).unwrap_or_default();
        letters.push(ALPHABET.get(digit).copied().unwrap_or(b'a'));
        remaining = zero_based.div_euclid(26);
    }
    letters.reverse();
    letters.into_iter().map(char::from).collect()
}

/// Immutable short key of a company field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldHash(String);

impl FieldHash {
    /// Mints the hash following a company counter value.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaDomainError::CounterOverflow`] when `counter + 1`
    /// overflows.
    pub fn mint(counter: u64) -> Result<Self, SchemaDomainError> {
        let next = counter
            .checked_add(1)
            .ok_or(SchemaDomainError::CounterOverflow(counter))?;
        Ok(Self(int_to_letters(next)))
    }

    /// Validates a hand-supplied or imported hash.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaDomainError::InvalidHash`] unless the value matches
    /// `^[a-z_]{3,20}$`.
    pub fn parse(value: &str) -> Result<Self, SchemaDomainError> {
        if HASH_PATTERN.is_match(value) {
            Ok(Self(value.to_owned()))
        } else {
            Err(SchemaDomainError::InvalidHash(value.to_owned()))
        }
    }

    /// Restores a hash read from storage without re-validation.
    #[must_use]
    pub fn from_persisted(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the hash text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Orders hashes the way they were minted: shorter first, then
    /// alphabetically.
    #[must_use]
    pub fn mint_order(&self) -> (usize, &str) {
        (self.0.len(), &self.0)
    }
}

impl fmt::Display for FieldHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FieldHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
