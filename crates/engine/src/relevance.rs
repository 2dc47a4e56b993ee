use crate::assembly::AssembledArticle;
use crate::error::{store_failure, Result};
use crate::service::ArticleService;
use domain::Article;
use rand::Rng;
use std::collections::HashSet;
use tracing::warn;

impl ArticleService {
    /// Articles sharing tags with `article`: up to `relevant_tag_count` of its
    /// tags are picked at random and each contributes up to
    /// `fetch_size / picked` articles. Results keep tag pick order, contain no
    /// duplicates and never include `article` itself. Sparse tags simply
    /// yield fewer results.
    pub async fn relevant_articles<R: Rng + Send>(
        &self,
        article: &Article,
        fetch_size: usize,
        rng: &mut R,
    ) -> Result<Vec<AssembledArticle>> {
        let titles = article.tag_titles();
        let picked = titles.len().min(self.config.relevant_tag_count);
        if picked == 0 {
            return Ok(Vec::new());
        }
        let sub_fetch_size = fetch_size / picked;
        if sub_fetch_size == 0 {
            return Ok(Vec::new());
        }

        let indices = rand::seq::index::sample(rng, titles.len(), picked).into_vec();
        let mut fetched: HashSet<String> = HashSet::from([article.id.clone()]);
        let mut related = Vec::new();

        for idx in indices {
            let title = titles[idx];
            let Some(tag) = self.tag_by_title(title).await? else {
                warn!("Tag [{}] of article [{}] not found", title, article.id);
                continue;
            };
            let ids = self
                .relations
                .article_ids(std::slice::from_ref(&tag.id), 1, sub_fetch_size, &mut fetched)
                .await
                .map_err(|e| {
                    store_failure(
                        format!("Gets relevant articles [article={}, tag={}]", article.id, tag.id),
                        e,
                    )
                })?;
            related.extend(self.articles_by_ids(ids, &[]).await?);
        }

        self.organize_articles(related).await
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::{seed, service};
    use domain::Article;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;
    use std::collections::HashSet;
    use storage::{Collection, MemoryStore};

    /// Tags a..d with ten articles each; neighbouring tags share five
    /// articles. The source article holds every tag.
    async fn store() -> MemoryStore {
        let store = MemoryStore::new();
        let tags = ["a", "b", "c", "d"];
        seed(
            &store,
            Collection::Tags,
            tags.iter().map(|t| json!({ "id": format!("tag-{}", t), "title": t })).collect(),
        )
        .await;

        let mut articles = vec![json!({ "id": "1000000000099", "title": "source", "tags": "a,b,c,d" })];
        let mut relations = Vec::new();
        let mut row = 0;
        for (i, tag) in tags.iter().enumerate() {
            relations.push(json!({
                "id": format!("r{:04}", row),
                "tag_id": format!("tag-{}", tag),
                "article_id": "1000000000099",
            }));
            row += 1;
            for n in 0..10 {
                // 相邻标签共享一半文章
                let article = 1_000_000_000_000u64 + (i * 5 + n) as u64;
                if n >= 5 || i == 0 {
                    articles.push(json!({ "id": article.to_string(), "title": format!("{}-{}", tag, n) }));
                }
                relations.push(json!({
                    "id": format!("r{:04}", row),
                    "tag_id": format!("tag-{}", tag),
                    "article_id": article.to_string(),
                }));
                row += 1;
            }
        }
        seed(&store, Collection::Articles, articles).await;
        seed(&store, Collection::TagArticles, relations).await;
        store
    }

    fn source() -> Article {
        Article {
            id: "1000000000099".to_string(),
            tags: "a,b,c,d".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn bounded_distinct_and_never_the_source() {
        let svc = service(store().await);
        for n in 0..32 {
            let mut rng = StdRng::seed_from_u64(n);
            let related = svc.relevant_articles(&source(), 9, &mut rng).await.unwrap();

            assert!(related.len() <= 9, "seed {}", n);
            let ids: HashSet<_> = related.iter().map(|a| a.article.id.as_str()).collect();
            assert_eq!(ids.len(), related.len(), "duplicate ids for seed {}", n);
            assert!(!ids.contains("1000000000099"), "source returned for seed {}", n);

        }
    }

    #[tokio::test]
    async fn same_seed_same_result() {
        let svc = service(store().await);
        let run = |n: u64| {
            let svc = svc.clone();
            async move {
                let mut rng = StdRng::seed_from_u64(n);
                svc.relevant_articles(&source(), 9, &mut rng)
                    .await
                    .unwrap()
                    .into_iter()
                    .map(|a| a.article.id)
                    .collect::<Vec<_>>()
            }
        };
        assert_eq!(run(7).await, run(7).await);
    }

    #[tokio::test]
    async fn untagged_or_tiny_budget_yields_nothing() {
        let svc = service(store().await);
        let mut rng = StdRng::seed_from_u64(1);

        let untagged = Article {
            id: "x".to_string(),
            ..Default::default()
        };
        assert!(svc.relevant_articles(&untagged, 9, &mut rng).await.unwrap().is_empty());
        assert!(svc.relevant_articles(&source(), 2, &mut rng).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_tags_are_skipped() {
        let svc = service(store().await);
        let mut rng = StdRng::seed_from_u64(3);
        let article = Article {
            id: "y".to_string(),
            tags: "nope".to_string(),
            ..Default::default()
        };
        assert!(svc.relevant_articles(&article, 9, &mut rng).await.unwrap().is_empty());
    }
}
