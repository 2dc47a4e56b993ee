use config::ConfigError;
use engine::QueryConfig;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

const ENV_PREFIX: &str = "AGORA_";

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub forum: QueryConfig,
    #[serde(default)]
    pub pages: PageSettings,
    /// Overrides for the built-in display labels.
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: String,
}

#[derive(Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
}

/// Page and window sizes of the public listings.
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct PageSettings {
    pub recent_page_size: usize,
    pub recent_window_size: usize,
    pub top_page_size: usize,
    pub hot_size: usize,
    pub random_size: usize,
    pub relevant_size: usize,
    pub tag_page_size: usize,
    pub city_page_size: usize,
    pub user_page_size: usize,
    pub broadcast_page_size: usize,
    pub news_page_size: usize,
    pub interest_page_size: usize,
    pub story_page_size: usize,
    pub list_page_size: usize,
    pub list_window_size: usize,
    /// Upper bound for client-supplied `size`.
    pub max_page_size: usize,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            recent_page_size: 20,
            recent_window_size: 10,
            top_page_size: 20,
            hot_size: 5,
            random_size: 5,
            relevant_size: 9,
            tag_page_size: 20,
            city_page_size: 20,
            user_page_size: 20,
            broadcast_page_size: 10,
            news_page_size: 10,
            interest_page_size: 10,
            story_page_size: 20,
            list_page_size: 20,
            list_window_size: 10,
            max_page_size: 100,
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());
        let env_tree = env_overrides(std::env::vars());

        let s = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.cors_origins", "*")?
            .set_default("database.url", "sqlite://data/agora.db")?
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::File::with_name(&format!("config.{}", run_mode)).required(false))
            .add_source(config::File::from_str(
                &env_tree.to_string(),
                config::FileFormat::Json,
            ))
            .build()?;

        s.try_deserialize()
    }
}

/// `AGORA_FORUM__HOT_WINDOW_DAYS=7` → `{"forum": {"hot_window_days": "7"}}`.
fn env_overrides(vars: impl Iterator<Item = (String, String)>) -> Value {
    let mut root = Map::new();
    for (key, value) in vars {
        let Some(rest) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let path: Vec<String> = rest.split("__").map(str::to_lowercase).collect();
        insert_path(&mut root, &path, value);
    }
    Value::Object(root)
}

fn insert_path(node: &mut Map<String, Value>, path: &[String], value: String) {
    match path {
        [] => {}
        [leaf] => {
            node.insert(leaf.clone(), Value::String(value));
        }
        [head, tail @ ..] => {
            let child = node
                .entry(head.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(map) = child {
                insert_path(map, tail, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(pairs: &[(&str, &str)]) -> impl Iterator<Item = (String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn env_vars_nest_by_double_underscore() {
        let tree = env_overrides(vars(&[
            ("AGORA_SERVER__PORT", "8080"),
            ("AGORA_FORUM__HOT_WINDOW_DAYS", "7"),
            ("AGORA_LABELS__JUST_NOW", "刚刚"),
            ("PATH", "/usr/bin"),
        ]));
        assert_eq!(
            tree,
            json!({
                "server": { "port": "8080" },
                "forum": { "hot_window_days": "7" },
                "labels": { "just_now": "刚刚" },
            })
        );
    }

    #[test]
    fn layered_settings_fill_sections() {
        let toml = r#"
            [server]
            host = "127.0.0.1"
            port = 4000
            cors_origins = "*"

            [database]
            url = "sqlite::memory:"

            [forum]
            serve_path = "https://forum.example"
            relation_mode = "index"

            [pages]
            hot_size = 8
        "#;
        let settings: Settings = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .add_source(config::File::from_str(
                &env_overrides(vars(&[("AGORA_FORUM__HOT_WINDOW_DAYS", "7")])).to_string(),
                config::FileFormat::Json,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.server.port, 4000);
        assert_eq!(settings.forum.hot_window_days, 7);
        assert_eq!(settings.forum.relation_mode, engine::RelationMode::Index);
        assert_eq!(settings.forum.relevant_tag_count, 3);
        assert_eq!(settings.pages.hot_size, 8);
        assert_eq!(settings.pages.recent_page_size, 20);
        assert!(settings.labels.is_empty());
    }
}
