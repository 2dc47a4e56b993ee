use engine::ViewCounter;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Heat of one article changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeatEvent {
    pub article_id: String,
    pub heat: u32,
}

/// Live "currently reading" counters, one per article. Readers hold a
/// [`Viewing`] guard; the count drops when the guard does.
#[derive(Clone)]
pub struct ViewingRegistry {
    counts: Arc<RwLock<HashMap<String, u32>>>,
    tx: broadcast::Sender<HeatEvent>,
}

impl ViewingRegistry {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            counts: Arc::new(RwLock::new(HashMap::new())),
            tx,
        }
    }

    pub fn enter(&self, article_id: &str) -> Viewing {
        let heat = self.update(article_id, |n| n.saturating_add(1));
        self.publish(article_id, heat);
        Viewing {
            registry: self.clone(),
            article_id: article_id.to_string(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HeatEvent> {
        self.tx.subscribe()
    }

    fn update(&self, article_id: &str, f: impl FnOnce(u32) -> u32) -> u32 {
        // 锁中毒时沿用内部数据，计数只是展示用途
        let mut counts = self.counts.write().unwrap_or_else(|e| e.into_inner());
        let next = f(counts.get(article_id).copied().unwrap_or(0));
        if next == 0 {
            counts.remove(article_id);
        } else {
            counts.insert(article_id.to_string(), next);
        }
        next
    }

    fn publish(&self, article_id: &str, heat: u32) {
        // 没有订阅者时 send 会失败，忽略即可
        let _ = self.tx.send(HeatEvent {
            article_id: article_id.to_string(),
            heat,
        });
    }
}

impl ViewCounter for ViewingRegistry {
    fn viewing(&self, article_id: &str) -> Option<u32> {
        let counts = self.counts.read().unwrap_or_else(|e| e.into_inner());
        counts.get(article_id).copied()
    }
}

/// One open reader of an article.
pub struct Viewing {
    registry: ViewingRegistry,
    article_id: String,
}

impl Drop for Viewing {
    fn drop(&mut self) {
        let heat = self
            .registry
            .update(&self.article_id, |n| n.saturating_sub(1));
        self.registry.publish(&self.article_id, heat);
    }
}
