use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier exposed to clients in place of storage keys.
///
/// Minted as a short entity prefix plus 16 hex characters of UUID entropy,
/// e.g. `ord-9f8a6c2d1e4b7a30`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    pub fn new(prefix: &str) -> Self {
        let entropy = Uuid::new_v4().simple().to_string();
        Slug(format!("{}-{}", prefix, &entropy[..16]))
    }

    /// Wrap an identifier received from outside (path segment, token claim).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Slug(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Slug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Slug {
    fn from(raw: &str) -> Self {
        Slug(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_carry_prefix_and_are_unique() {
        let a = Slug::new("ord");
        let b = Slug::new("ord");

        assert!(a.as_str().starts_with("ord-"));
        assert_eq!(a.as_str().len(), "ord-".len() + 16);
        assert_ne!(a, b);
    }

    #[test]
    fn slug_serializes_as_plain_string() {
        let slug = Slug::from_raw("dlv-0123456789abcdef");
        let json = serde_json::to_string(&slug).unwrap();
        assert_eq!(json, "\"dlv-0123456789abcdef\"");
    }
}
