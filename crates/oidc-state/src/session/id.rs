//! Session identifiers ("state values").

use std::fmt;

use rand::Rng;
use rand::rngs::OsRng;

/// Character set identifiers are drawn from.
pub const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Opaque identifier correlating an `/authorize` request with its callback and token exchange.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh identifier of `len` characters.
    ///
    /// Each character is an independent uniform draw from the OS CSPRNG, so no identifier
    /// can be predicted from earlier ones.
    #[must_use]
    pub fn generate(len: usize) -> Self {
        let id = (0..len)
            .map(|_| char::from(CHARSET[OsRng.gen_range(0..CHARSET.len())]))
            .collect();
        Self(id)
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the underlying string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for SessionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_length_and_charset() {
        let id = SessionId::generate(12);
        assert_eq!(id.as_str().len(), 12);
        assert!(id.as_str().bytes().all(|b| CHARSET.contains(&b)));
    }

    #[test]
    fn test_no_duplicates() {
        let ids: HashSet<SessionId> = (0..10_000).map(|_| SessionId::generate(32)).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_borrow_lookup() {
        let id = SessionId::generate(16);
        let set: HashSet<SessionId> = std::iter::once(id.clone()).collect();
        assert!(set.contains(id.as_str()));
    }
}
