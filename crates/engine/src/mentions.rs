use crate::error::Result;
use crate::service::ArticleService;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static MENTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"@([\w-]+)").unwrap());

/// Distinct `@name` tokens in order of first appearance.
pub fn mention_tokens(text: &str) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for caps in MENTION.captures_iter(text) {
        if let Some(name) = caps.get(1).map(|m| m.as_str()) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

impl ArticleService {
    /// Names mentioned in `text` that belong to existing users.
    pub async fn mentioned_users(&self, text: &str) -> Result<Vec<String>> {
        let mut users = Vec::new();
        for name in mention_tokens(text) {
            if self.user_by_name(name).await?.is_some() {
                users.push(name.to_string());
            }
        }
        Ok(users)
    }

    /// Rewrites `@name` into a profile link for every name in `users`. Only
    /// whole tokens match, so `@ann` never rewrites part of `@anna`.
    pub fn link_mentions(&self, text: &str, users: &[String]) -> String {
        if users.is_empty() {
            return text.to_string();
        }
        MENTION
            .replace_all(text, |caps: &Captures| {
                let name = &caps[1];
                if users.iter().any(|u| u == name) {
                    format!(
                        "@<a href='{}'>{}</a>",
                        self.config.member_url(name),
                        name
                    )
                } else {
                    caps[0].to_string()
                }
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seed, service};
    use serde_json::json;
    use storage::{Collection, MemoryStore};

    #[test]
    fn tokens_are_distinct_and_ordered() {
        assert_eq!(
            mention_tokens("@bob hi @ann-lee and @bob again, mail a@b"),
            vec!["bob", "ann-lee", "b"]
        );
        assert!(mention_tokens("no mentions").is_empty());
    }

    #[tokio::test]
    async fn only_existing_users_are_linked_as_whole_tokens() {
        let store = MemoryStore::new();
        seed(&store, Collection::Users, vec![json!({ "id": "u1", "name": "ann" })]).await;
        let svc = service(store);

        let text = "@ann and @anna and @ghost";
        let users = svc.mentioned_users(text).await.unwrap();
        assert_eq!(users, vec!["ann"]);

        assert_eq!(
            svc.link_mentions(text, &users),
            "@<a href='https://forum.example/member/ann'>ann</a> and @anna and @ghost"
        );
    }
}
