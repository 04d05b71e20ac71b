use std::{
    collections::{BTreeMap, HashSet},
    time::SystemTime,
};

use indexmap::IndexMap;
use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::{
    reconcile::{self, Reconciliation},
    status::{
        GameStatus, PhaseOperation, StatusChangeRequest, StatusError, TransitionContext,
        TransitionEffect, TransitionPlan, ensure_phase, plan_transition,
    },
};

/// Grid dimensions offered to administrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameSize {
    /// 3x3 grid.
    ThreeByThree,
    /// 4x4 grid.
    FourByFour,
    /// 5x5 grid.
    FiveByFive,
}

impl GameSize {
    /// Side length of the square grid.
    pub fn grid_size(self) -> usize {
        match self {
            GameSize::ThreeByThree => 3,
            GameSize::FourByFour => 4,
            GameSize::FiveByFive => 5,
        }
    }

    /// Number of cells, which is also the minimum number of songs a game needs.
    pub fn required_song_count(self) -> usize {
        let side = self.grid_size();
        side * side
    }
}

/// Minimum number of songs needed before a game of `size` may open entry.
pub fn required_song_count(size: GameSize) -> usize {
    size.required_song_count()
}

/// A song in the game's pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Song {
    /// Stable identifier referenced by grid cells.
    pub id: Uuid,
    /// Track title.
    pub title: String,
    /// Performing artist.
    pub artist: String,
    /// Whether the DJ has played the song.
    pub played: bool,
    /// When the song was marked as played.
    pub played_at: Option<SystemTime>,
}

/// Song definition supplied when replacing a game's pool.
#[derive(Debug, Clone)]
pub struct NewSong {
    /// Track title.
    pub title: String,
    /// Performing artist.
    pub artist: String,
}

/// A player and their grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Stable identifier.
    pub id: Uuid,
    /// Display name, unique within a game.
    pub name: String,
    /// Optional contact address used by external notifiers.
    pub email: Option<String>,
    /// Position to song assignments.
    pub grid: BTreeMap<usize, Uuid>,
    /// Whether every position of the grid holds a song.
    pub is_grid_complete: bool,
    /// Cached bingo result, written by reconciliation only.
    pub has_won: bool,
    /// When the current win was first detected.
    pub won_at: Option<SystemTime>,
    /// Registration timestamp.
    pub created_at: SystemTime,
}

impl Participant {
    fn new(name: String, email: Option<String>, now: SystemTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            grid: BTreeMap::new(),
            is_grid_complete: false,
            has_won: false,
            won_at: None,
            created_at: now,
        }
    }

    fn refresh_completeness(&mut self, grid_size: usize) {
        let cells = grid_size * grid_size;
        self.is_grid_complete =
            self.grid.len() == cells && self.grid.keys().all(|position| *position < cells);
    }
}

/// Rejections raised while mutating a game.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Status rule violation.
    #[error(transparent)]
    Status(#[from] StatusError),
    /// No participant with this id in the game.
    #[error("participant `{0}` not found")]
    ParticipantNotFound(Uuid),
    /// No song with this id in the game.
    #[error("song `{0}` not found in this game")]
    SongNotFound(Uuid),
    /// Position does not exist on the game's grid.
    #[error("position {position} is outside a {grid_size}x{grid_size} grid")]
    PositionOutOfRange {
        /// Requested position.
        position: usize,
        /// Side length of the grid.
        grid_size: usize,
    },
    /// The same song appears twice in one grid.
    #[error("song `{0}` is already used in this grid")]
    DuplicateSong(Uuid),
    /// The same position is assigned twice in one request.
    #[error("position {0} is assigned more than once")]
    DuplicatePosition(usize),
    /// Not enough unused songs remain to fill the empty cells.
    #[error("cannot fill grid: {missing} more song(s) needed")]
    NotEnoughSongs {
        /// Songs still needed.
        missing: usize,
    },
    /// Malformed input (blank names, duplicates, limits).
    #[error("{0}")]
    InvalidInput(String),
}

/// Aggregate root: a game with its song pool and participants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    /// Primary key.
    pub id: Uuid,
    /// Display name of the event.
    pub name: String,
    /// Grid dimensions.
    pub size: GameSize,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Song pool keyed by song id, in insertion order.
    pub songs: IndexMap<Uuid, Song>,
    /// Participants keyed by id, in registration order.
    pub participants: IndexMap<Uuid, Participant>,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last mutation timestamp.
    pub updated_at: SystemTime,
}

impl Game {
    /// Create an empty game in the editing status.
    pub fn new(name: String, size: GameSize, now: SystemTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            size,
            status: GameStatus::Editing,
            songs: IndexMap::new(),
            participants: IndexMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Side length of this game's grid.
    pub fn grid_size(&self) -> usize {
        self.size.grid_size()
    }

    /// Participants whose grid still has empty cells.
    pub fn incomplete_participants(&self) -> Vec<Uuid> {
        self.participants
            .values()
            .filter(|participant| !participant.is_grid_complete)
            .map(|participant| participant.id)
            .collect()
    }

    /// Validate a status change against the current game.
    pub fn plan_status_change(
        &self,
        request: StatusChangeRequest,
    ) -> Result<TransitionPlan, StatusError> {
        let context = TransitionContext {
            status: self.status,
            song_count: self.songs.len(),
            required_song_count: self.size.required_song_count(),
            incomplete_participants: self.incomplete_participants(),
        };
        plan_transition(&context, request)
    }

    /// Apply a planned transition and its effects in one step.
    pub fn apply_transition(
        &mut self,
        plan: &TransitionPlan,
        now: SystemTime,
    ) -> Result<(), StatusError> {
        if self.status != plan.from {
            return Err(StatusError::StatusMismatch {
                expected: plan.from,
                actual: self.status,
            });
        }

        for effect in &plan.effects {
            match effect {
                TransitionEffect::ResetPlayState => {
                    for song in self.songs.values_mut() {
                        song.played = false;
                        song.played_at = None;
                    }
                    for participant in self.participants.values_mut() {
                        participant.has_won = false;
                        participant.won_at = None;
                    }
                }
                TransitionEffect::RemoveParticipants => self.participants.clear(),
            }
        }

        self.status = plan.to;
        self.updated_at = now;
        Ok(())
    }

    /// Replace the whole song pool. Only while editing.
    pub fn replace_songs(
        &mut self,
        songs: Vec<NewSong>,
        now: SystemTime,
    ) -> Result<Reconciliation, GameError> {
        ensure_phase(PhaseOperation::EditSongs, self.status)?;

        let mut seen = HashSet::new();
        let mut pool = IndexMap::with_capacity(songs.len());
        for NewSong { title, artist } in songs {
            let title = title.trim().to_owned();
            let artist = artist.trim().to_owned();
            if title.is_empty() {
                return Err(GameError::InvalidInput("song title must not be empty".into()));
            }
            if !seen.insert((title.to_lowercase(), artist.to_lowercase())) {
                return Err(GameError::InvalidInput(format!(
                    "duplicate song `{title}` by `{artist}`"
                )));
            }
            let song = Song {
                id: Uuid::new_v4(),
                title,
                artist,
                played: false,
                played_at: None,
            };
            pool.insert(song.id, song);
        }

        self.songs = pool;
        self.updated_at = now;
        Ok(self.reconcile_all(now))
    }

    /// Change the grid dimensions. Only while editing.
    pub fn resize(&mut self, size: GameSize, now: SystemTime) -> Result<Reconciliation, GameError> {
        ensure_phase(PhaseOperation::EditSongs, self.status)?;
        self.size = size;
        let grid_size = self.grid_size();
        let cells = grid_size * grid_size;
        for participant in self.participants.values_mut() {
            participant.grid.retain(|position, _| *position < cells);
            participant.refresh_completeness(grid_size);
        }
        self.updated_at = now;
        Ok(self.reconcile_all(now))
    }

    /// Register a participant. Only while entry is open.
    pub fn add_participant(
        &mut self,
        name: String,
        email: Option<String>,
        max_participants: usize,
        now: SystemTime,
    ) -> Result<&Participant, GameError> {
        ensure_phase(PhaseOperation::RegisterParticipant, self.status)?;

        let name = name.trim().to_owned();
        if name.is_empty() {
            return Err(GameError::InvalidInput(
                "participant name must not be empty".into(),
            ));
        }
        if self.participants.len() >= max_participants {
            return Err(GameError::InvalidInput(format!(
                "game already has the maximum of {max_participants} participants"
            )));
        }
        let lowered = name.to_lowercase();
        if self
            .participants
            .values()
            .any(|participant| participant.name.to_lowercase() == lowered)
        {
            return Err(GameError::InvalidInput(format!(
                "participant `{name}` already exists"
            )));
        }

        let participant = Participant::new(name, email, now);
        let id = participant.id;
        self.participants.insert(id, participant);
        self.updated_at = now;

        self.participants
            .get(&id)
            .ok_or(GameError::ParticipantNotFound(id))
    }

    /// Remove a participant regardless of status. Returns whether it existed.
    pub fn remove_participant(&mut self, participant_id: Uuid, now: SystemTime) -> bool {
        let removed = self.participants.shift_remove(&participant_id).is_some();
        if removed {
            self.updated_at = now;
        }
        removed
    }

    /// Replace a participant's whole grid. Partial grids are accepted.
    pub fn assign_grid(
        &mut self,
        participant_id: Uuid,
        cells: Vec<(usize, Uuid)>,
        now: SystemTime,
    ) -> Result<Reconciliation, GameError> {
        ensure_phase(PhaseOperation::EditGrid, self.status)?;
        self.ensure_participant(participant_id)?;

        let grid_size = self.grid_size();
        let mut grid = BTreeMap::new();
        let mut used = HashSet::new();
        for (position, song_id) in cells {
            self.ensure_position(position)?;
            self.ensure_song(song_id)?;
            if !used.insert(song_id) {
                return Err(GameError::DuplicateSong(song_id));
            }
            if grid.insert(position, song_id).is_some() {
                return Err(GameError::DuplicatePosition(position));
            }
        }

        let participant = self.participant_mut(participant_id)?;
        participant.grid = grid;
        participant.refresh_completeness(grid_size);
        self.updated_at = now;
        Ok(self.reconcile_one(participant_id, now))
    }

    /// Set or clear a single grid cell.
    pub fn assign_cell(
        &mut self,
        participant_id: Uuid,
        position: usize,
        song_id: Option<Uuid>,
        now: SystemTime,
    ) -> Result<Reconciliation, GameError> {
        ensure_phase(PhaseOperation::EditGrid, self.status)?;
        self.ensure_position(position)?;
        if let Some(song_id) = song_id {
            self.ensure_song(song_id)?;
        }

        let grid_size = self.grid_size();
        let participant = self.participant_mut(participant_id)?;
        match song_id {
            Some(song_id) => {
                let used_elsewhere = participant
                    .grid
                    .iter()
                    .any(|(other, assigned)| *assigned == song_id && *other != position);
                if used_elsewhere {
                    return Err(GameError::DuplicateSong(song_id));
                }
                participant.grid.insert(position, song_id);
            }
            None => {
                participant.grid.remove(&position);
            }
        }
        participant.refresh_completeness(grid_size);
        self.updated_at = now;
        Ok(self.reconcile_one(participant_id, now))
    }

    /// Fill every empty cell of a participant's grid with random unused songs.
    pub fn fill_grid<R: Rng + ?Sized>(
        &mut self,
        participant_id: Uuid,
        rng: &mut R,
        now: SystemTime,
    ) -> Result<Reconciliation, GameError> {
        ensure_phase(PhaseOperation::EditGrid, self.status)?;

        let grid_size = self.grid_size();
        let cells = grid_size * grid_size;
        let participant = self
            .participants
            .get(&participant_id)
            .ok_or(GameError::ParticipantNotFound(participant_id))?;

        let used: HashSet<Uuid> = participant.grid.values().copied().collect();
        let mut available: Vec<Uuid> = self
            .songs
            .keys()
            .filter(|id| !used.contains(id))
            .copied()
            .collect();
        let empty: Vec<usize> = (0..cells)
            .filter(|position| !participant.grid.contains_key(position))
            .collect();

        if available.len() < empty.len() {
            return Err(GameError::NotEnoughSongs {
                missing: empty.len() - available.len(),
            });
        }

        available.shuffle(rng);
        let participant = self.participant_mut(participant_id)?;
        for (position, song_id) in empty.into_iter().zip(available) {
            participant.grid.insert(position, song_id);
        }
        participant.refresh_completeness(grid_size);
        self.updated_at = now;
        Ok(self.reconcile_one(participant_id, now))
    }

    /// Set or clear a song's played flag and reconcile every participant's win.
    ///
    /// Marking an already played song keeps its original timestamp.
    pub fn mark_song(
        &mut self,
        song_id: Uuid,
        played: bool,
        now: SystemTime,
    ) -> Result<Reconciliation, GameError> {
        ensure_phase(PhaseOperation::MarkSong, self.status)?;

        let song = self
            .songs
            .get_mut(&song_id)
            .ok_or(GameError::SongNotFound(song_id))?;
        if song.played != played {
            song.played = played;
            song.played_at = played.then_some(now);
            self.updated_at = now;
        }

        Ok(self.reconcile_all(now))
    }

    /// Participants currently holding a bingo, earliest winner first.
    pub fn winners(&self) -> Vec<&Participant> {
        let mut winners: Vec<&Participant> = self
            .participants
            .values()
            .filter(|participant| participant.has_won)
            .collect();
        winners.sort_by_key(|participant| participant.won_at);
        winners
    }

    fn reconcile_all(&mut self, now: SystemTime) -> Reconciliation {
        let grid_size = self.grid_size();
        reconcile::reconcile(grid_size, &self.songs, self.participants.values_mut(), now)
    }

    fn reconcile_one(&mut self, participant_id: Uuid, now: SystemTime) -> Reconciliation {
        let grid_size = self.grid_size();
        reconcile::reconcile(
            grid_size,
            &self.songs,
            self.participants.get_mut(&participant_id),
            now,
        )
    }

    fn ensure_participant(&self, participant_id: Uuid) -> Result<(), GameError> {
        if self.participants.contains_key(&participant_id) {
            Ok(())
        } else {
            Err(GameError::ParticipantNotFound(participant_id))
        }
    }

    fn participant_mut(&mut self, participant_id: Uuid) -> Result<&mut Participant, GameError> {
        self.participants
            .get_mut(&participant_id)
            .ok_or(GameError::ParticipantNotFound(participant_id))
    }

    fn ensure_position(&self, position: usize) -> Result<(), GameError> {
        let grid_size = self.grid_size();
        if position < grid_size * grid_size {
            Ok(())
        } else {
            Err(GameError::PositionOutOfRange {
                position,
                grid_size,
            })
        }
    }

    fn ensure_song(&self, song_id: Uuid) -> Result<(), GameError> {
        if self.songs.contains_key(&song_id) {
            Ok(())
        } else {
            Err(GameError::SongNotFound(song_id))
        }
    }
}
