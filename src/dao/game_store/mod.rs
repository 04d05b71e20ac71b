pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    models::{GameEntity, GameListItemEntity},
    storage::StorageResult,
};

/// Abstraction over the persistence layer for bingo games.
///
/// A game is stored as a single aggregate, so `save_game` replaces songs, participants and
/// status together.
pub trait GameStore: Send + Sync {
    /// Insert or replace a game.
    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Load a game by id.
    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// List every stored game, oldest first.
    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>>;
    /// Delete a game. Returns whether it existed.
    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    /// Cheap liveness probe.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Rebuild the underlying connection.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
