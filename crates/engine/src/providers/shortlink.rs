use crate::traits::ShortLinker;
use anyhow::Result;
use async_trait::async_trait;
use domain::fields;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use storage::{Collection, DocumentStore, Filter, Query};

// #标签#，标签内不含空白和 #
static TAG_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"#([^#\s]{1,50})#").unwrap());

/// Turns bare article URLs and `#tag#` references into Markdown links by
/// looking the targets up in the store. Unknown targets are left untouched.
pub struct StoreShortLinker {
    store: Arc<dyn DocumentStore>,
    serve_path: String,
    article_ref: Regex,
}

impl StoreShortLinker {
    pub fn new(store: Arc<dyn DocumentStore>, serve_path: &str) -> Result<Self> {
        let serve_path = serve_path.trim_end_matches('/').to_string();
        // 前导字符不能是 ( [ " ' =，否则已经是链接
        let article_ref = Regex::new(&format!(
            r#"(^|[^(\["'=/])({}/article/(\d+))"#,
            regex::escape(&serve_path)
        ))?;
        Ok(Self {
            store,
            serve_path,
            article_ref,
        })
    }

    async fn article_titles(&self, ids: Vec<String>) -> Result<HashMap<String, String>> {
        let query = Query::new()
            .filter(Filter::is_in(fields::ID, ids))
            .project(&[fields::ID, fields::article::TITLE]);
        let res = self.store.query(Collection::Articles, &query).await?;
        Ok(res
            .results
            .iter()
            .filter_map(|doc| {
                let id = doc.get(fields::ID)?.as_str()?;
                let title = doc.get(fields::article::TITLE)?.as_str()?;
                Some((id.to_string(), title.to_string()))
            })
            .collect())
    }

    async fn existing_tags(&self, titles: Vec<String>) -> Result<Vec<String>> {
        let query = Query::new()
            .filter(Filter::is_in(fields::tag::TITLE, titles))
            .project(&[fields::tag::TITLE]);
        let res = self.store.query(Collection::Tags, &query).await?;
        Ok(res
            .results
            .iter()
            .filter_map(|doc| doc.get(fields::tag::TITLE).and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }
}

#[async_trait]
impl ShortLinker for StoreShortLinker {
    async fn link_article(&self, content: &str) -> Result<String> {
        let mut ids: Vec<String> = self
            .article_ref
            .captures_iter(content)
            .map(|caps| caps[3].to_string())
            .collect();
        if ids.is_empty() {
            return Ok(content.to_string());
        }
        ids.sort();
        ids.dedup();

        let titles = self.article_titles(ids).await?;
        let linked = self.article_ref.replace_all(content, |caps: &Captures| {
            match titles.get(&caps[3]) {
                Some(title) => format!("{}[{}]({})", &caps[1], title, &caps[2]),
                None => caps[0].to_string(),
            }
        });
        Ok(linked.into_owned())
    }

    async fn link_tag(&self, content: &str) -> Result<String> {
        let mut titles: Vec<String> = TAG_REF
            .captures_iter(content)
            .map(|caps| caps[1].to_string())
            .collect();
        if titles.is_empty() {
            return Ok(content.to_string());
        }
        titles.sort();
        titles.dedup();

        let existing = self.existing_tags(titles).await?;
        let linked = TAG_REF.replace_all(content, |caps: &Captures| {
            let title = &caps[1];
            if existing.iter().any(|t| t == title) {
                format!("[{}]({}/tag/{})", title, self.serve_path, title)
            } else {
                caps[0].to_string()
            }
        });
        Ok(linked.into_owned())
    }
}
