//! Keeps each participant's cached win state consistent with their grid and the
//! played flags of the game's songs.

use std::{collections::HashMap, time::SystemTime};

use indexmap::IndexMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::state::{
    game::{Participant, Song},
    grid::has_bingo,
};

/// Direction of a win state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WinChangeKind {
    /// The participant just completed a line.
    NewWin,
    /// A previously winning line is no longer complete.
    Revoked,
}

/// A participant whose win state changed during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinChange {
    /// Participant that changed.
    pub participant_id: Uuid,
    /// What happened.
    pub kind: WinChangeKind,
}

/// Outcome of a reconciliation pass. Participants without a change are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Changes to persist, in participant order.
    pub updated: Vec<WinChange>,
}

impl Reconciliation {
    /// Participants that just won.
    pub fn new_winners(&self) -> Vec<Uuid> {
        self.ids_of(WinChangeKind::NewWin)
    }

    /// Participants whose win was withdrawn.
    pub fn revoked(&self) -> Vec<Uuid> {
        self.ids_of(WinChangeKind::Revoked)
    }

    /// Whether nothing changed.
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty()
    }

    fn ids_of(&self, kind: WinChangeKind) -> Vec<Uuid> {
        self.updated
            .iter()
            .filter(|change| change.kind == kind)
            .map(|change| change.participant_id)
            .collect()
    }
}

/// Played flags of a participant's grid in position order.
///
/// Empty positions and positions pointing at songs that are no longer in the pool
/// are reported as `None`.
pub fn played_cells(
    participant: &Participant,
    songs: &IndexMap<Uuid, Song>,
    grid_size: usize,
) -> Vec<Option<bool>> {
    (0..grid_size * grid_size)
        .map(|position| {
            participant
                .grid
                .get(&position)
                .and_then(|song_id| songs.get(song_id))
                .map(|song| song.played)
        })
        .collect()
}

/// Recompute the win state of every given participant and update it in place.
///
/// Incomplete grids never win; a stale win on an incomplete grid is revoked.
pub fn reconcile<'a, I>(
    grid_size: usize,
    songs: &IndexMap<Uuid, Song>,
    participants: I,
    now: SystemTime,
) -> Reconciliation
where
    I: IntoIterator<Item = &'a mut Participant>,
{
    let mut updated = Vec::new();

    for participant in participants {
        let wins = participant.is_grid_complete
            && has_bingo(&played_cells(participant, songs, grid_size), grid_size);

        match (participant.has_won, wins) {
            (false, true) => {
                participant.has_won = true;
                participant.won_at = Some(now);
                info!(participant_id = %participant.id, name = %participant.name, "participant has bingo");
                updated.push(WinChange {
                    participant_id: participant.id,
                    kind: WinChangeKind::NewWin,
                });
            }
            (true, false) => {
                participant.has_won = false;
                participant.won_at = None;
                info!(participant_id = %participant.id, name = %participant.name, "bingo revoked");
                updated.push(WinChange {
                    participant_id: participant.id,
                    kind: WinChangeKind::Revoked,
                });
            }
            _ => {}
        }
    }

    debug!(changes = updated.len(), "reconciliation finished");
    Reconciliation { updated }
}

/// Win flag of a participant at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WinSnapshot {
    /// Participant identifier.
    pub id: Uuid,
    /// Whether the participant had a bingo.
    pub has_won: bool,
}

impl From<&Participant> for WinSnapshot {
    fn from(participant: &Participant) -> Self {
        Self {
            id: participant.id,
            has_won: participant.has_won,
        }
    }
}

/// Ids that went from not-won in `previous` to won in `current`, in `current` order.
///
/// Participants missing from `previous` are ignored.
pub fn detect_new_winners(previous: &[WinSnapshot], current: &[WinSnapshot]) -> Vec<Uuid> {
    let before: HashMap<Uuid, bool> = previous
        .iter()
        .map(|snapshot| (snapshot.id, snapshot.has_won))
        .collect();

    current
        .iter()
        .filter(|snapshot| snapshot.has_won && before.get(&snapshot.id) == Some(&false))
        .map(|snapshot| snapshot.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn pool(played: &[bool]) -> IndexMap<Uuid, Song> {
        played
            .iter()
            .enumerate()
            .map(|(i, played)| {
                let song = Song {
                    id: Uuid::new_v4(),
                    title: format!("Song {i}"),
                    artist: "Artist".into(),
                    played: *played,
                    played_at: played.then_some(SystemTime::UNIX_EPOCH),
                };
                (song.id, song)
            })
            .collect()
    }

    fn participant(songs: &IndexMap<Uuid, Song>, complete: bool) -> Participant {
        let grid: BTreeMap<usize, Uuid> = songs.keys().copied().enumerate().collect();
        Participant {
            id: Uuid::new_v4(),
            name: "Ada".into(),
            email: None,
            grid,
            is_grid_complete: complete,
            has_won: false,
            won_at: None,
            created_at: SystemTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn incomplete_grid_never_wins() {
        let songs = pool(&[true; 9]);
        let mut player = participant(&songs, false);
        let outcome = reconcile(3, &songs, [&mut player], SystemTime::now());
        assert!(outcome.is_empty());
        assert!(!player.has_won);
    }

    #[test]
    fn stale_win_on_incomplete_grid_is_revoked() {
        let songs = pool(&[true; 9]);
        let mut player = participant(&songs, false);
        player.has_won = true;
        player.won_at = Some(SystemTime::UNIX_EPOCH);
        let outcome = reconcile(3, &songs, [&mut player], SystemTime::now());
        assert_eq!(outcome.revoked(), vec![player.id]);
        assert_eq!(player.won_at, None);
    }

    #[test]
    fn new_win_and_revocation() {
        let mut songs = pool(&[true, true, true, false, false, false, false, false, false]);
        let mut player = participant(&songs, true);
        let now = SystemTime::now();

        let outcome = reconcile(3, &songs, [&mut player], now);
        assert_eq!(outcome.new_winners(), vec![player.id]);
        assert_eq!(player.won_at, Some(now));

        // Nothing changes on a second pass.
        assert!(reconcile(3, &songs, [&mut player], SystemTime::now()).is_empty());
        assert_eq!(player.won_at, Some(now));

        let first = *songs.keys().next().unwrap();
        songs[&first].played = false;
        let outcome = reconcile(3, &songs, [&mut player], SystemTime::now());
        assert_eq!(outcome.revoked(), vec![player.id]);
        assert!(!player.has_won);
        assert_eq!(player.won_at, None);
    }

    #[test]
    fn deleted_songs_count_as_unplayed() {
        let mut songs = pool(&[true; 9]);
        let mut player = participant(&songs, true);
        // Remove the centre song and one per row so no line survives.
        for index in [8, 4, 0] {
            songs.shift_remove_index(index);
        }

        let cells = played_cells(&player, &songs, 3);
        assert_eq!(cells.iter().filter(|cell| cell.is_none()).count(), 3);

        let outcome = reconcile(3, &songs, [&mut player], SystemTime::now());
        assert!(outcome.is_empty());
        assert!(!player.has_won);
    }

    #[test]
    fn one_bad_participant_does_not_block_others() {
        let songs = pool(&[true, true, true, false, false, false, false, false, false]);
        let mut broken = participant(&songs, true);
        broken.grid.clear();
        let mut healthy = participant(&songs, true);

        let outcome = reconcile(3, &songs, [&mut broken, &mut healthy], SystemTime::now());
        assert_eq!(outcome.new_winners(), vec![healthy.id]);
        assert!(!broken.has_won);
    }

    #[test]
    fn new_winner_diff_reports_only_transitions() {
        let one = Uuid::new_v4();
        let two = Uuid::new_v4();
        let previous = [
            WinSnapshot {
                id: one,
                has_won: false,
            },
            WinSnapshot {
                id: two,
                has_won: true,
            },
        ];
        let current = [
            WinSnapshot {
                id: one,
                has_won: true,
            },
            WinSnapshot {
                id: two,
                has_won: true,
            },
        ];
        assert_eq!(detect_new_winners(&previous, &current), vec![one]);
    }

    #[test]
    fn simultaneous_winners_are_all_reported() {
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let previous: Vec<WinSnapshot> = ids
            .iter()
            .map(|id| WinSnapshot {
                id: *id,
                has_won: false,
            })
            .collect();
        let current: Vec<WinSnapshot> = ids
            .iter()
            .map(|id| WinSnapshot {
                id: *id,
                has_won: true,
            })
            .collect();
        assert_eq!(detect_new_winners(&previous, &current), ids);
    }

    #[test]
    fn unknown_and_revoked_participants_are_not_new_winners() {
        let known = Uuid::new_v4();
        let newcomer = Uuid::new_v4();
        let previous = [WinSnapshot {
            id: known,
            has_won: true,
        }];
        let current = [
            WinSnapshot {
                id: known,
                has_won: false,
            },
            WinSnapshot {
                id: newcomer,
                has_won: true,
            },
        ];
        assert!(detect_new_winners(&previous, &current).is_empty());
    }
}
