use crate::traits::AvatarResolver;
use sha2::{Digest, Sha256};

/// Gravatar URLs keyed by the SHA-256 of the normalized email.
#[derive(Debug, Clone)]
pub struct Gravatar {
    base: String,
}

impl Gravatar {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }
}

impl Default for Gravatar {
    fn default() -> Self {
        Self::new("https://www.gravatar.com/avatar")
    }
}

impl AvatarResolver for Gravatar {
    fn avatar_url(&self, email: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(email.trim().to_lowercase());
        let digest = hex::encode(hasher.finalize());
        format!("{}/{}?s=140&d=identicon", self.base.trim_end_matches('/'), digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalized_before_hashing() {
        let g = Gravatar::default();
        assert_eq!(g.avatar_url(" Ferris@Example.com "), g.avatar_url("ferris@example.com"));
        assert!(g
            .avatar_url("ferris@example.com")
            .starts_with("https://www.gravatar.com/avatar/"));
    }
}
