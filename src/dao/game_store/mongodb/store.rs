use std::{future::Future, sync::Arc};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{Client, Collection, Database, IndexModel, bson::doc, options::IndexOptions};
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{MongoGameDocument, doc_id},
};
use crate::dao::{
    game_store::GameStore,
    models::{GameEntity, GameListItemEntity},
    storage::{StorageError, StorageResult},
};

const GAMES: &str = "games";
const CREATED_AT_INDEX: &str = "game_created_at_idx";

/// One document per game in the `games` collection.
///
/// Saves replace the whole document, so a game's songs, participants and grids
/// always change together.
#[derive(Clone)]
pub struct MongoGameStore {
    config: Arc<MongoConfig>,
    handle: Arc<RwLock<Handle>>,
}

struct Handle {
    // Owns the connection pool behind `database`.
    _client: Client,
    database: Database,
}

impl Handle {
    async fn open(config: &MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;
        Ok(Self {
            _client: client,
            database,
        })
    }
}

impl MongoGameStore {
    /// Connect, then make sure the listing index exists.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let handle = Handle::open(&config).await?;
        let store = Self {
            config: Arc::new(config),
            handle: Arc::new(RwLock::new(handle)),
        };
        store.ensure_created_at_index().await?;
        info!(database = %store.config.database_name, "MongoDB game store ready");
        Ok(store)
    }

    async fn database(&self) -> Database {
        self.handle.read().await.database.clone()
    }

    async fn games(&self) -> Collection<MongoGameDocument> {
        self.database().await.collection(GAMES)
    }

    async fn ensure_created_at_index(&self) -> MongoResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { "created_at": 1 })
            .options(
                IndexOptions::builder()
                    .name(Some(CREATED_AT_INDEX.to_owned()))
                    .build(),
            )
            .build();

        self.games()
            .await
            .create_index(index)
            .await
            .map(|_| ())
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: GAMES,
                index: CREATED_AT_INDEX,
                source,
            })
    }

    async fn replace(&self, game: GameEntity) -> MongoResult<()> {
        let id = game.id;
        let document = MongoGameDocument::from(game);
        self.games()
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveGame { id, source })?;
        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> MongoResult<Option<GameEntity>> {
        self.games()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadGame { id, source })?
            .map(GameEntity::try_from)
            .transpose()
    }

    async fn summaries(&self) -> MongoResult<Vec<GameListItemEntity>> {
        let documents: Vec<MongoGameDocument> = self
            .games()
            .await
            .find(doc! {})
            .sort(doc! { "created_at": 1 })
            .await
            .map_err(|source| MongoDaoError::ListGames { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListGames { source })?;

        Ok(documents
            .into_iter()
            .filter_map(|document| match GameListItemEntity::try_from(document) {
                Ok(item) => Some(item),
                Err(err) => {
                    warn!(error = %err, "skipping unreadable game document");
                    None
                }
            })
            .collect())
    }

    async fn remove(&self, id: Uuid) -> MongoResult<bool> {
        let result = self
            .games()
            .await
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::DeleteGame { id, source })?;
        Ok(result.deleted_count > 0)
    }

    async fn ping(&self) -> MongoResult<()> {
        self.database()
            .await
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(|source| MongoDaoError::HealthPing { source })
    }

    async fn reopen(&self) -> MongoResult<()> {
        let handle = Handle::open(&self.config).await?;
        *self.handle.write().await = handle;
        Ok(())
    }

    fn run<T, F, Fut>(&self, op: F) -> BoxFuture<'static, StorageResult<T>>
    where
        F: FnOnce(Self) -> Fut + Send + 'static,
        Fut: Future<Output = MongoResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.clone();
        Box::pin(async move { op(store).await.map_err(StorageError::from) })
    }
}

impl GameStore for MongoGameStore {
    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.run(move |store| async move { store.replace(game).await })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        self.run(move |store| async move { store.fetch(id).await })
    }

    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>> {
        self.run(|store| async move { store.summaries().await })
    }

    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.run(move |store| async move { store.remove(id).await })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.run(|store| async move { store.ping().await })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.run(|store| async move { store.reopen().await })
    }
}
