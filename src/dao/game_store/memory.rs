use std::sync::Arc;

use dashmap::DashMap;
use futures::future::{BoxFuture, ready};
use uuid::Uuid;

use crate::dao::{
    game_store::GameStore,
    models::{GameEntity, GameListItemEntity},
    storage::StorageResult,
};

/// Process-local store used when no database is configured and in tests.
#[derive(Clone, Default)]
pub struct MemoryGameStore {
    games: Arc<DashMap<Uuid, GameEntity>>,
}

impl MemoryGameStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored games.
    pub fn len(&self) -> usize {
        self.games.len()
    }

    /// Whether no game is stored.
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

impl GameStore for MemoryGameStore {
    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.games.insert(game.id, game);
        Box::pin(ready(Ok(())))
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let game = self.games.get(&id).map(|entry| entry.value().clone());
        Box::pin(ready(Ok(game)))
    }

    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>> {
        let mut items: Vec<GameListItemEntity> = self
            .games
            .iter()
            .map(|entry| GameListItemEntity::from(entry.value()))
            .collect();
        items.sort_by_key(|item| item.created_at);
        Box::pin(ready(Ok(items)))
    }

    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let removed = self.games.remove(&id).is_some();
        Box::pin(ready(Ok(removed)))
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(ready(Ok(())))
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(ready(Ok(())))
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use super::*;
    use crate::state::game::{Game, GameSize};

    fn entity(name: &str, created_at: SystemTime) -> GameEntity {
        GameEntity::from(&Game::new(name.into(), GameSize::ThreeByThree, created_at))
    }

    #[tokio::test]
    async fn save_find_delete() {
        let store = MemoryGameStore::new();
        let game = entity("Disco", SystemTime::now());
        let id = game.id;

        store.save_game(game.clone()).await.unwrap();
        assert_eq!(store.find_game(id).await.unwrap(), Some(game));
        assert!(store.delete_game(id).await.unwrap());
        assert!(!store.delete_game(id).await.unwrap());
        assert!(store.find_game(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn listing_is_ordered_by_creation() {
        let store = MemoryGameStore::new();
        let early = SystemTime::UNIX_EPOCH + Duration::from_secs(10);
        let late = early + Duration::from_secs(10);
        store.save_game(entity("Late", late)).await.unwrap();
        store.save_game(entity("Early", early)).await.unwrap();

        let names: Vec<String> = store
            .list_games()
            .await
            .unwrap()
            .into_iter()
            .map(|item| item.name)
            .collect();
        assert_eq!(names, vec!["Early", "Late"]);
        assert_eq!(store.len(), 2);
    }
}
