//! In-process realtime store: one document behind a watch channel.

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::watch;

use crate::dao::{
    game_store::{GameStore, Subscription},
    models::{DocumentPatch, GameDocument},
    storage::StorageResult,
};

#[derive(Clone)]
pub struct MemoryGameStore {
    document: Arc<watch::Sender<Option<GameDocument>>>,
}

impl MemoryGameStore {
    /// Empty store; subscribers observe `None` until the first write.
    pub fn new() -> Self {
        let (document, _receiver) = watch::channel(None);
        Self {
            document: Arc::new(document),
        }
    }

    /// Store pre-seeded with a document.
    pub fn with_document(document: GameDocument) -> Self {
        let store = Self::new();
        store.document.send_replace(Some(document));
        store
    }
}

impl Default for MemoryGameStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GameStore for MemoryGameStore {
    fn read(&self) -> BoxFuture<'static, StorageResult<Option<GameDocument>>> {
        let snapshot = self.document.borrow().clone();
        Box::pin(async move { Ok(snapshot) })
    }

    fn subscribe(&self) -> Subscription {
        self.document.subscribe()
    }

    fn update(&self, patch: DocumentPatch) -> BoxFuture<'static, StorageResult<()>> {
        self.document.send_modify(|slot| {
            slot.get_or_insert_with(GameDocument::default).apply(&patch);
        });
        Box::pin(async { Ok(()) })
    }

    fn replace(&self, document: GameDocument) -> BoxFuture<'static, StorageResult<()>> {
        self.document.send_replace(Some(document));
        Box::pin(async { Ok(()) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::GameStatus;

    #[tokio::test]
    async fn read_is_none_until_first_write() {
        let store = MemoryGameStore::new();
        assert!(store.read().await.unwrap().is_none());

        store
            .update(DocumentPatch::default().with_score("alice", 0))
            .await
            .unwrap();

        let doc = store.read().await.unwrap().unwrap();
        assert_eq!(doc.status, GameStatus::Waiting);
        assert_eq!(doc.scores.get("alice"), Some(&0));
    }

    #[tokio::test]
    async fn subscribers_see_current_value_then_changes() {
        let store = MemoryGameStore::with_document(GameDocument::initial(15));
        let mut subscription = store.subscribe();
        assert_eq!(subscription.borrow_and_update().as_ref().unwrap().timer, 15);

        store
            .update(DocumentPatch::default().with_timer(14))
            .await
            .unwrap();

        subscription.changed().await.unwrap();
        assert_eq!(subscription.borrow_and_update().as_ref().unwrap().timer, 14);
    }

    #[tokio::test]
    async fn replace_overwrites_scores() {
        let store = MemoryGameStore::new();
        store
            .update(DocumentPatch::default().with_score("alice", 30))
            .await
            .unwrap();

        store.replace(GameDocument::initial(15)).await.unwrap();

        let doc = store.read().await.unwrap().unwrap();
        assert!(doc.scores.is_empty());
    }
}
