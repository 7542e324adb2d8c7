//! Ingestion Queue (C4): one FIFO worker per namespace, bounded by a global
//! concurrency permit.
//!
//! A supervisor owns a map `group_id -> bounded channel`; the first
//! submission for a namespace spawns its consumer task, which processes one
//! item at a time, acquiring the global semaphore permit before each
//! extraction call. Channel closure (on `shutdown`) drains in-flight items
//! within the grace window and then lets pending items drop.

use crate::extraction::{AddEpisodeRequest, AddEpisodeResult, ExtractionService};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Semaphore};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const CHANNEL_CAPACITY: usize = 256;

struct QueueItem {
    request: AddEpisodeRequest,
    ack: Option<oneshot::Sender<()>>,
}

#[derive(Debug, Default)]
pub struct QueueStats {
    pub submitted: AtomicU64,
    pub succeeded: AtomicU64,
    pub failed: AtomicU64,
}

pub struct IngestQueue {
    senders: DashMap<String, mpsc::Sender<QueueItem>>,
    semaphore: Arc<Semaphore>,
    extraction: Arc<ExtractionService>,
    stats: Arc<QueueStats>,
}

impl IngestQueue {
    pub fn new(extraction: Arc<ExtractionService>, global_concurrency: usize) -> Self {
        Self {
            senders: DashMap::new(),
            semaphore: Arc::new(Semaphore::new(global_concurrency.max(1))),
            extraction,
            stats: Arc::new(QueueStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<QueueStats> {
        self.stats.clone()
    }

    /// Non-blocking submission: enqueues and returns immediately with a
    /// pre-allocated episode uuid. All processing, including LLM/embedder
    /// calls and graph writes, happens on the namespace's worker task.
    pub fn add_episode(&self, mut request: AddEpisodeRequest) -> Uuid {
        let episode_uuid = request.uuid.unwrap_or_else(Uuid::new_v4);
        request.uuid = Some(episode_uuid);

        let group_key = request.group_id.as_str().to_string();
        let sender = self.sender_for_group(&group_key);
        self.stats.submitted.fetch_add(1, Ordering::Relaxed);

        if let Err(e) = sender.try_send(QueueItem { request, ack: None }) {
            error!("ingestion queue for group {group_key} is full or closed: {e}");
            self.stats.failed.fetch_add(1, Ordering::Relaxed);
        }

        episode_uuid
    }

    /// Same as `add_episode` but resolves once the item has been processed.
    /// Intended for tests that need deterministic ordering assertions.
    pub async fn add_episode_and_wait(&self, mut request: AddEpisodeRequest) -> Uuid {
        let episode_uuid = request.uuid.unwrap_or_else(Uuid::new_v4);
        request.uuid = Some(episode_uuid);

        let group_key = request.group_id.as_str().to_string();
        let sender = self.sender_for_group(&group_key);
        self.stats.submitted.fetch_add(1, Ordering::Relaxed);

        let (tx, rx) = oneshot::channel();
        if sender.send(QueueItem { request, ack: Some(tx) }).await.is_ok() {
            let _ = rx.await;
        }
        episode_uuid
    }

    fn sender_for_group(&self, group_key: &str) -> mpsc::Sender<QueueItem> {
        if let Some(existing) = self.senders.get(group_key) {
            return existing.clone();
        }

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        self.senders.insert(group_key.to_string(), tx.clone());
        self.spawn_worker(group_key.to_string(), rx);
        tx
    }

    fn spawn_worker(&self, group_key: String, mut rx: mpsc::Receiver<QueueItem>) {
        let semaphore = self.semaphore.clone();
        let extraction = self.extraction.clone();
        let stats = self.stats.clone();

        tokio::spawn(async move {
            info!("ingestion worker started for namespace {group_key}");
            while let Some(item) = rx.recv().await {
                let permit = semaphore.clone().acquire_owned().await;
                let episode_name = item.request.name.clone();
                debug!("processing episode {episode_name} in namespace {group_key}");

                let result = extraction.add_episode(item.request).await;
                drop(permit);

                match result {
                    Ok(AddEpisodeResult { episode_uuid, .. }) => {
                        stats.succeeded.fetch_add(1, Ordering::Relaxed);
                        debug!("episode {episode_uuid} processed in namespace {group_key}");
                    }
                    Err(e) => {
                        stats.failed.fetch_add(1, Ordering::Relaxed);
                        warn!("extraction failed for episode {episode_name} in namespace {group_key}: {e}");
                    }
                }

                if let Some(ack) = item.ack {
                    let _ = ack.send(());
                }
            }
            info!("ingestion worker for namespace {group_key} drained, shutting down");
        });
    }

    /// Drop all senders, closing every namespace channel so workers drain
    /// in-flight items and exit. Pending (unsent) items are dropped.
    pub fn shutdown(&self) {
        self.senders.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{GraphError, LlmError};
    use crate::traits::{EmbedderGateway, GenerationRequest, GenerationResponse, GraphStore, LlmGateway};
    use crate::types::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemStore {
        episodes: Mutex<HashMap<Uuid, EpisodicNode>>,
        order: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl GraphStore for MemStore {
        async fn save_episode(&self, episode: &EpisodicNode) -> Result<(), GraphError> {
            self.order.lock().unwrap().push(episode.name.clone());
            self.episodes.lock().unwrap().insert(episode.uuid, episode.clone());
            Ok(())
        }
        async fn get_episode(&self, uuid: Uuid) -> Result<Option<EpisodicNode>, GraphError> {
            Ok(self.episodes.lock().unwrap().get(&uuid).cloned())
        }
        async fn delete_episode(&self, _u: Uuid) -> Result<bool, GraphError> {
            Ok(false)
        }
        async fn list_episodes(&self, _g: &[GroupId], _l: u32) -> Result<Vec<EpisodicNode>, GraphError> {
            Ok(vec![])
        }
        async fn save_entity(&self, _e: &EntityNode) -> Result<(), GraphError> {
            Ok(())
        }
        async fn get_entity(&self, _u: Uuid) -> Result<Option<EntityNode>, GraphError> {
            Ok(None)
        }
        async fn find_entity_by_name(&self, _g: &GroupId, _n: &str) -> Result<Option<EntityNode>, GraphError> {
            Ok(None)
        }
        async fn list_entities(&self, _g: &[GroupId], _l: u32) -> Result<Vec<EntityNode>, GraphError> {
            Ok(vec![])
        }
        async fn save_edge(&self, _e: &EntityEdge) -> Result<(), GraphError> {
            Ok(())
        }
        async fn get_edge(&self, _u: Uuid) -> Result<Option<EntityEdge>, GraphError> {
            Ok(None)
        }
        async fn expire_edge(&self, _u: Uuid, _t: chrono::DateTime<chrono::Utc>) -> Result<(), GraphError> {
            Ok(())
        }
        async fn delete_edge(&self, _u: Uuid) -> Result<bool, GraphError> {
            Ok(false)
        }
        async fn find_current_edges_between(&self, _s: Uuid, _t: Uuid) -> Result<Vec<EntityEdge>, GraphError> {
            Ok(vec![])
        }
        async fn find_edges_by_group(&self, _g: &[GroupId], _l: u32) -> Result<Vec<EntityEdge>, GraphError> {
            Ok(vec![])
        }
        async fn save_mentions(&self, _m: &MentionsEdge) -> Result<(), GraphError> {
            Ok(())
        }
        async fn find_mentions_of_entity(&self, _e: Uuid) -> Result<Vec<MentionsEdge>, GraphError> {
            Ok(vec![])
        }
        async fn run_raw(&self, _q: GraphQuery) -> Result<Vec<PathRelationship>, GraphError> {
            Ok(vec![])
        }
        async fn health_check(&self) -> Result<(), GraphError> {
            Ok(())
        }
    }

    struct NullLlm;
    #[async_trait]
    impl LlmGateway for NullLlm {
        async fn generate(&self, _r: GenerationRequest) -> Result<GenerationResponse, LlmError> {
            Ok(GenerationResponse {
                parsed: Some(serde_json::json!({"entities": [], "facts": []})),
                ..Default::default()
            })
        }
        fn provider_name(&self) -> &'static str {
            "null"
        }
    }

    struct NullEmbedder;
    #[async_trait]
    impl EmbedderGateway for NullEmbedder {
        async fn embed(&self, _t: &str) -> Result<Vec<f32>, LlmError> {
            Ok(vec![0.0])
        }
        fn dimensions(&self) -> usize {
            1
        }
    }

    #[tokio::test]
    async fn processes_same_namespace_in_submission_order() {
        let store = Arc::new(MemStore::default());
        let extraction = Arc::new(ExtractionService::new(store.clone(), Arc::new(NullLlm), Arc::new(NullEmbedder), 0.8));
        let queue = IngestQueue::new(extraction, 2);

        for name in ["e1", "e2", "e3"] {
            queue
                .add_episode_and_wait(AddEpisodeRequest {
                    group_id: GroupId::new("g1"),
                    name: name.to_string(),
                    content: "body".into(),
                    source: EpisodeSource::Text,
                    source_description: String::new(),
                    source_url: None,
                    uuid: None,
                    reference_time: None,
                    entity_types: vec![],
                })
                .await;
        }

        assert_eq!(*store.order.lock().unwrap(), vec!["e1", "e2", "e3"]);
    }
}
