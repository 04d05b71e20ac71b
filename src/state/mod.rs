pub mod game;
pub mod grid;
pub mod reconcile;
mod sse;
pub mod status;

use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::time::timeout;
use tracing::warn;
use uuid::Uuid;

use crate::{config::AppConfig, dao::game_store::GameStore, error::ServiceError};

pub use self::sse::SseHub;
use self::game::Game;

/// Shared handle passed to every route and service.
pub type SharedState = Arc<AppState>;
/// Upper bound for waiting on a game's lock and loading it.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Storage handle, admin event hub and per-game locks shared by every request.
pub struct AppState {
    game_store: RwLock<Option<Arc<dyn GameStore>>>,
    events: SseHub,
    game_locks: DashMap<Uuid, Arc<Mutex<()>>>,
    degraded: watch::Sender<bool>,
    config: Arc<AppConfig>,
    operation_timeout: Duration,
}

impl AppState {
    /// Fresh state with no store installed, hence degraded.
    pub fn new(config: AppConfig) -> SharedState {
        Self::with_operation_timeout(config, DEFAULT_OPERATION_TIMEOUT)
    }

    /// Like [`AppState::new`] with a custom bound on waiting for a game.
    pub fn with_operation_timeout(config: AppConfig, operation_timeout: Duration) -> SharedState {
        Arc::new(Self {
            game_store: RwLock::new(None),
            events: SseHub::new(config.sse_capacity()),
            game_locks: DashMap::new(),
            degraded: watch::Sender::new(true),
            config: Arc::new(config),
            operation_timeout,
        })
    }

    /// State with `store` already installed.
    pub async fn with_store(config: AppConfig, store: Arc<dyn GameStore>) -> SharedState {
        let state = Self::new(config);
        state.set_game_store(store).await;
        state
    }

    /// Runtime configuration.
    pub fn config(&self) -> Arc<AppConfig> {
        self.config.clone()
    }

    /// Current game store, if any.
    pub async fn game_store(&self) -> Option<Arc<dyn GameStore>> {
        self.game_store.read().await.clone()
    }

    /// Current game store or [`ServiceError::Degraded`].
    pub async fn require_game_store(&self) -> Result<Arc<dyn GameStore>, ServiceError> {
        self.game_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install `store` and leave degraded mode.
    pub async fn set_game_store(&self, store: Arc<dyn GameStore>) {
        self.game_store.write().await.replace(store);
        self.update_degraded(false).await;
    }

    /// Drop the store and enter degraded mode.
    pub async fn clear_game_store(&self) {
        self.game_store.write().await.take();
        self.update_degraded(true).await;
    }

    /// Whether requests currently run without a game store.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Receiver notified each time the degraded flag flips.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Set the degraded flag. Watchers only wake on an actual change.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            let changed = *current != value;
            *current = value;
            changed
        });
    }

    /// Admin event hub.
    pub fn events(&self) -> &SseHub {
        &self.events
    }

    /// Lock serializing every read-modify-write on one game.
    pub fn game_lock(&self, game_id: Uuid) -> Arc<Mutex<()>> {
        self.game_locks
            .entry(game_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the lock entry of `game_id` unless another task still holds or awaits it.
    ///
    /// Callers must have dropped their own handle from [`AppState::game_lock`] first.
    pub fn release_game_lock(&self, game_id: Uuid) {
        self.game_locks
            .remove_if(&game_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Load a game, let `work` mutate it and persist the result, all under the game's lock.
    ///
    /// Nothing is written when `work` fails, so a rejected operation leaves the stored game
    /// untouched. The timeout bounds waiting for the lock and loading the game; once `work`
    /// has run, the save is awaited to completion so a reported failure never hides a write
    /// that went through. Returns the value produced by `work` together with the saved game.
    pub async fn update_game<F, T>(&self, game_id: Uuid, work: F) -> Result<(T, Game), ServiceError>
    where
        F: FnOnce(&mut Game) -> Result<T, ServiceError> + Send,
        T: Send,
    {
        let store = self.require_game_store().await?;
        let lock = self.game_lock(game_id);

        let loaded = timeout(self.operation_timeout, async {
            let guard = lock.clone().lock_owned().await;
            fetch(store.as_ref(), game_id)
                .await
                .map(|game| (guard, game))
        })
        .await;

        let (_guard, mut game) = match loaded {
            Ok(Ok(locked)) => locked,
            Ok(Err(err)) => {
                drop(lock);
                if matches!(err, ServiceError::NotFound(_)) {
                    self.release_game_lock(game_id);
                }
                return Err(err);
            }
            Err(_) => {
                warn!(
                    %game_id,
                    timeout_ms = self.operation_timeout.as_millis() as u64,
                    "timed out waiting for game"
                );
                return Err(ServiceError::Timeout);
            }
        };

        let value = work(&mut game)?;
        store.save_game((&game).into()).await?;
        Ok((value, game))
    }

    /// Load a game without taking its lock.
    pub async fn load_game(&self, game_id: Uuid) -> Result<Game, ServiceError> {
        let store = self.require_game_store().await?;
        fetch(store.as_ref(), game_id).await
    }
}

async fn fetch(store: &dyn GameStore, game_id: Uuid) -> Result<Game, ServiceError> {
    store
        .find_game(game_id)
        .await?
        .map(Game::from)
        .ok_or_else(|| ServiceError::game_not_found(game_id))
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        dao::{
            game_store::memory::MemoryGameStore,
            models::{GameEntity, GameListItemEntity},
            storage::StorageResult,
        },
        services::game_service,
        state::game::GameSize,
    };

    /// Memory store whose saves take `delay`.
    struct SlowSaves {
        inner: MemoryGameStore,
        delay: Duration,
    }

    impl GameStore for SlowSaves {
        fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
            let inner = self.inner.clone();
            let delay = self.delay;
            Box::pin(async move {
                tokio::time::sleep(delay).await;
                inner.save_game(game).await
            })
        }

        fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
            self.inner.find_game(id)
        }

        fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>> {
            self.inner.list_games()
        }

        fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
            self.inner.delete_game(id)
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.health_check()
        }

        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.try_reconnect()
        }
    }

    async fn memory_state() -> SharedState {
        AppState::with_store(AppConfig::default(), Arc::new(MemoryGameStore::new())).await
    }

    async fn seed(store: &dyn GameStore) -> Uuid {
        let game = Game::new("Seeded".into(), GameSize::ThreeByThree, SystemTime::now());
        let id = game.id;
        store.save_game((&game).into()).await.unwrap();
        id
    }

    #[tokio::test]
    async fn degraded_flag_follows_the_store() {
        let state = AppState::new(AppConfig::default());
        let mut watcher = state.degraded_watcher();
        assert!(state.is_degraded().await);

        state.set_game_store(Arc::new(MemoryGameStore::new())).await;
        assert!(watcher.has_changed().unwrap());
        assert!(!*watcher.borrow_and_update());

        state.update_degraded(false).await;
        assert!(!watcher.has_changed().unwrap());

        state.clear_game_store().await;
        assert!(state.is_degraded().await);
    }

    #[tokio::test]
    async fn unknown_game_is_not_found() {
        let state = memory_state().await;
        let err = state
            .update_game(Uuid::new_v4(), |_| Ok(()))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn unknown_games_leave_no_lock_entries() {
        let state = memory_state().await;
        for _ in 0..100 {
            let _ = state.update_game(Uuid::new_v4(), |_| Ok(())).await;
            let _ = game_service::delete_game(&state, Uuid::new_v4()).await;
        }
        assert!(state.game_locks.is_empty());
    }

    #[tokio::test]
    async fn deleting_a_game_drops_its_lock_entry() {
        let state = memory_state().await;
        let store = state.require_game_store().await.unwrap();
        let id = seed(store.as_ref()).await;

        state.update_game(id, |_| Ok(())).await.unwrap();
        assert_eq!(state.game_locks.len(), 1);

        game_service::delete_game(&state, id).await.unwrap();
        assert!(state.game_locks.is_empty());
    }

    #[tokio::test]
    async fn held_lock_entries_are_not_released() {
        let state = memory_state().await;
        let id = Uuid::new_v4();
        let held = state.game_lock(id);

        state.release_game_lock(id);
        assert!(state.game_locks.contains_key(&id));

        drop(held);
        state.release_game_lock(id);
        assert!(state.game_locks.is_empty());
    }

    #[tokio::test]
    async fn waiting_too_long_for_a_game_times_out_without_writing() {
        let state =
            AppState::with_operation_timeout(AppConfig::default(), Duration::from_millis(20));
        state.set_game_store(Arc::new(MemoryGameStore::new())).await;
        let store = state.require_game_store().await.unwrap();
        let id = seed(store.as_ref()).await;

        let busy = state.game_lock(id).lock_owned().await;
        let err = state
            .update_game(id, |game| {
                game.name = "Renamed".into();
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Timeout));
        drop(busy);

        let stored = store.find_game(id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Seeded");
    }

    #[tokio::test]
    async fn slow_saves_complete_and_report_success() {
        let store = Arc::new(SlowSaves {
            inner: MemoryGameStore::new(),
            delay: Duration::from_millis(80),
        });
        let id = seed(&store.inner).await;
        let state =
            AppState::with_operation_timeout(AppConfig::default(), Duration::from_millis(20));
        state.set_game_store(store.clone()).await;

        let (_, game) = state
            .update_game(id, |game| {
                game.name = "Renamed".into();
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(game.name, "Renamed");

        let stored = store.inner.find_game(id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Renamed");
    }
}
