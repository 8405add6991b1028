#[cfg(feature = "firebase-store")]
pub mod firebase;
pub mod memory;

use crate::dao::models::{DocumentPatch, GameDocument};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use tokio::sync::watch;

/// Live view of the shared document. `None` means the store holds no game data yet.
pub type Subscription = watch::Receiver<Option<GameDocument>>;

/// Contract of the realtime store holding the single shared game document.
pub trait GameStore: Send + Sync {
    /// One-shot, point-in-time read.
    fn read(&self) -> BoxFuture<'static, StorageResult<Option<GameDocument>>>;
    /// Receiver holding the current value, notified on every write by any client.
    fn subscribe(&self) -> Subscription;
    /// Merge the given fields into the document (last write wins per field).
    fn update(&self, patch: DocumentPatch) -> BoxFuture<'static, StorageResult<()>>;
    /// Overwrite the whole document.
    fn replace(&self, document: GameDocument) -> BoxFuture<'static, StorageResult<()>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
