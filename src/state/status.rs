use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle status of a bingo game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    /// Songs and grid size are being configured.
    Editing,
    /// Participants register and fill their grids.
    Entry,
    /// Songs are being marked as played; wins are tracked.
    Playing,
    /// The event is over; can be resumed back to playing.
    Finished,
}

impl GameStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [GameStatus; 4] = [
        GameStatus::Editing,
        GameStatus::Entry,
        GameStatus::Playing,
        GameStatus::Finished,
    ];

    /// Stable upper-case label used in messages and the wire format.
    pub fn as_str(self) -> &'static str {
        match self {
            GameStatus::Editing => "EDITING",
            GameStatus::Entry => "ENTRY",
            GameStatus::Playing => "PLAYING",
            GameStatus::Finished => "FINISHED",
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statuses reachable in a single step from `current`.
pub fn allowed_targets(current: GameStatus) -> &'static [GameStatus] {
    match current {
        GameStatus::Editing => &[GameStatus::Entry],
        GameStatus::Entry => &[GameStatus::Editing, GameStatus::Playing],
        GameStatus::Playing => &[GameStatus::Entry, GameStatus::Finished],
        GameStatus::Finished => &[GameStatus::Playing],
    }
}

/// Whether moving from `current` to `target` is an edge of the lifecycle graph.
pub fn is_valid_transition(current: GameStatus, target: GameStatus) -> bool {
    allowed_targets(current).contains(&target)
}

/// Disposition flag a destructive transition must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispositionFlag {
    /// Required on PLAYING -> ENTRY.
    PreservePlayedSongs,
    /// Required on ENTRY -> EDITING.
    PreserveParticipants,
}

impl fmt::Display for DispositionFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispositionFlag::PreservePlayedSongs => f.write_str("preserve_played_songs"),
            DispositionFlag::PreserveParticipants => f.write_str("preserve_participants"),
        }
    }
}

/// Game operation restricted to a single status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOperation {
    /// Replacing the song list or changing the grid size.
    EditSongs,
    /// Registering participants.
    RegisterParticipant,
    /// Writing grid assignments.
    EditGrid,
    /// Toggling a song's played flag.
    MarkSong,
}

impl PhaseOperation {
    /// Status in which the operation is legal.
    pub fn required_status(self) -> GameStatus {
        match self {
            PhaseOperation::EditSongs => GameStatus::Editing,
            PhaseOperation::RegisterParticipant | PhaseOperation::EditGrid => GameStatus::Entry,
            PhaseOperation::MarkSong => GameStatus::Playing,
        }
    }
}

impl fmt::Display for PhaseOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PhaseOperation::EditSongs => "song editing",
            PhaseOperation::RegisterParticipant => "participant registration",
            PhaseOperation::EditGrid => "grid editing",
            PhaseOperation::MarkSong => "song marking",
        };
        f.write_str(label)
    }
}

/// Rejections raised by the status rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusError {
    /// The requested edge is not part of the lifecycle graph.
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: GameStatus,
        /// Requested status.
        to: GameStatus,
    },
    /// Not enough songs to fill a grid of the game's size.
    #[error("not enough songs to open entry: {required} required, {actual} present")]
    InsufficientSongs {
        /// Songs needed (`grid_size²`).
        required: usize,
        /// Songs currently in the game.
        actual: usize,
    },
    /// A destructive transition was requested without its disposition flag.
    #[error("transition from {from} to {to} requires `{flag}` to be specified")]
    MissingDisposition {
        /// Current status.
        from: GameStatus,
        /// Requested status.
        to: GameStatus,
        /// Flag the caller must provide.
        flag: DispositionFlag,
    },
    /// An operation was attempted outside of the status it belongs to.
    #[error("{operation} is only allowed while {required} (game is {actual})")]
    IllegalPhaseOperation {
        /// Attempted operation.
        operation: PhaseOperation,
        /// Status the operation requires.
        required: GameStatus,
        /// Status the game is in.
        actual: GameStatus,
    },
    /// The game changed status between planning and applying a transition.
    #[error("game status changed during transition (expected {expected}, got {actual})")]
    StatusMismatch {
        /// Status recorded in the plan.
        expected: GameStatus,
        /// Status found when applying.
        actual: GameStatus,
    },
}

/// Ensure `operation` is legal while the game is in `actual`.
pub fn ensure_phase(operation: PhaseOperation, actual: GameStatus) -> Result<(), StatusError> {
    let required = operation.required_status();
    if actual == required {
        Ok(())
    } else {
        Err(StatusError::IllegalPhaseOperation {
            operation,
            required,
            actual,
        })
    }
}

/// A status change requested by an administrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChangeRequest {
    /// Status to move to.
    pub target: GameStatus,
    /// Keep played flags and wins when going back from PLAYING to ENTRY.
    pub preserve_played_songs: Option<bool>,
    /// Keep participants when going back from ENTRY to EDITING.
    pub preserve_participants: Option<bool>,
}

impl StatusChangeRequest {
    /// Request a plain transition without disposition flags.
    pub fn to(target: GameStatus) -> Self {
        Self {
            target,
            preserve_played_songs: None,
            preserve_participants: None,
        }
    }
}

/// Side effect applied together with the status write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionEffect {
    /// Clear every played flag and every participant's win.
    ResetPlayState,
    /// Delete every participant and their grids.
    RemoveParticipants,
}

/// Non-blocking notice attached to an accepted transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionWarning {
    /// These participants enter play with an incomplete grid and can never win.
    IncompleteGrids {
        /// Participants whose grid is not complete.
        participant_ids: Vec<Uuid>,
    },
}

/// Minimal view of a game needed to validate a status change.
#[derive(Debug, Clone)]
pub struct TransitionContext {
    /// Current status.
    pub status: GameStatus,
    /// Number of songs in the game.
    pub song_count: usize,
    /// `grid_size²` for the game's size.
    pub required_song_count: usize,
    /// Participants whose grid is incomplete.
    pub incomplete_participants: Vec<Uuid>,
}

/// A validated transition that has not been applied yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionPlan {
    /// Status the game is in when planned.
    pub from: GameStatus,
    /// Status the game moves to.
    pub to: GameStatus,
    /// Effects to apply with the status write.
    pub effects: Vec<TransitionEffect>,
    /// Warnings to surface to the caller.
    pub warnings: Vec<TransitionWarning>,
}

/// Validate `request` against the lifecycle rules and compute its effects.
pub fn plan_transition(
    context: &TransitionContext,
    request: StatusChangeRequest,
) -> Result<TransitionPlan, StatusError> {
    let from = context.status;
    let to = request.target;

    if !is_valid_transition(from, to) {
        return Err(StatusError::InvalidTransition { from, to });
    }

    let mut effects = Vec::new();
    let mut warnings = Vec::new();

    match (from, to) {
        (GameStatus::Editing, GameStatus::Entry) => {
            if context.song_count < context.required_song_count {
                return Err(StatusError::InsufficientSongs {
                    required: context.required_song_count,
                    actual: context.song_count,
                });
            }
        }
        (GameStatus::Entry, GameStatus::Editing) => {
            let preserve = request
                .preserve_participants
                .ok_or(StatusError::MissingDisposition {
                    from,
                    to,
                    flag: DispositionFlag::PreserveParticipants,
                })?;
            if !preserve {
                effects.push(TransitionEffect::RemoveParticipants);
            }
        }
        (GameStatus::Entry, GameStatus::Playing) => {
            if !context.incomplete_participants.is_empty() {
                warnings.push(TransitionWarning::IncompleteGrids {
                    participant_ids: context.incomplete_participants.clone(),
                });
            }
        }
        (GameStatus::Playing, GameStatus::Entry) => {
            let preserve = request
                .preserve_played_songs
                .ok_or(StatusError::MissingDisposition {
                    from,
                    to,
                    flag: DispositionFlag::PreservePlayedSongs,
                })?;
            if !preserve {
                effects.push(TransitionEffect::ResetPlayState);
            }
        }
        _ => {}
    }

    Ok(TransitionPlan {
        from,
        to,
        effects,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(status: GameStatus) -> TransitionContext {
        TransitionContext {
            status,
            song_count: 9,
            required_song_count: 9,
            incomplete_participants: Vec::new(),
        }
    }

    #[test]
    fn transition_table_is_exact() {
        let valid = [
            (GameStatus::Editing, GameStatus::Entry),
            (GameStatus::Entry, GameStatus::Editing),
            (GameStatus::Entry, GameStatus::Playing),
            (GameStatus::Playing, GameStatus::Entry),
            (GameStatus::Playing, GameStatus::Finished),
            (GameStatus::Finished, GameStatus::Playing),
        ];

        let mut valid_count = 0;
        let mut invalid_count = 0;
        for from in GameStatus::ALL {
            for to in GameStatus::ALL {
                let expected = valid.contains(&(from, to));
                assert_eq!(is_valid_transition(from, to), expected, "{from} -> {to}");
                if expected {
                    valid_count += 1;
                } else {
                    invalid_count += 1;
                }
            }
        }
        assert_eq!(valid_count, 6);
        assert_eq!(invalid_count, 10);
    }

    #[test]
    fn self_transitions_are_rejected() {
        for status in GameStatus::ALL {
            assert!(!is_valid_transition(status, status));
            let err = plan_transition(&context(status), StatusChangeRequest::to(status));
            assert_eq!(
                err,
                Err(StatusError::InvalidTransition {
                    from: status,
                    to: status
                })
            );
        }
    }

    #[test]
    fn opening_entry_requires_enough_songs() {
        let ctx = TransitionContext {
            status: GameStatus::Editing,
            song_count: 5,
            required_song_count: 16,
            incomplete_participants: Vec::new(),
        };
        let err = plan_transition(&ctx, StatusChangeRequest::to(GameStatus::Entry)).unwrap_err();
        assert_eq!(
            err,
            StatusError::InsufficientSongs {
                required: 16,
                actual: 5
            }
        );
        assert!(err.to_string().contains("16 required, 5 present"));
    }

    #[test]
    fn opening_entry_with_exact_song_count_succeeds() {
        let plan = plan_transition(
            &context(GameStatus::Editing),
            StatusChangeRequest::to(GameStatus::Entry),
        )
        .unwrap();
        assert_eq!(plan.from, GameStatus::Editing);
        assert_eq!(plan.to, GameStatus::Entry);
        assert!(plan.effects.is_empty());
    }

    #[test]
    fn back_to_entry_requires_played_songs_disposition() {
        let err = plan_transition(
            &context(GameStatus::Playing),
            StatusChangeRequest::to(GameStatus::Entry),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            StatusError::MissingDisposition {
                flag: DispositionFlag::PreservePlayedSongs,
                ..
            }
        ));

        let reset = plan_transition(
            &context(GameStatus::Playing),
            StatusChangeRequest {
                preserve_played_songs: Some(false),
                ..StatusChangeRequest::to(GameStatus::Entry)
            },
        )
        .unwrap();
        assert_eq!(reset.effects, vec![TransitionEffect::ResetPlayState]);

        let keep = plan_transition(
            &context(GameStatus::Playing),
            StatusChangeRequest {
                preserve_played_songs: Some(true),
                ..StatusChangeRequest::to(GameStatus::Entry)
            },
        )
        .unwrap();
        assert!(keep.effects.is_empty());
    }

    #[test]
    fn back_to_editing_requires_participant_disposition() {
        let err = plan_transition(
            &context(GameStatus::Entry),
            StatusChangeRequest::to(GameStatus::Editing),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            StatusError::MissingDisposition {
                flag: DispositionFlag::PreserveParticipants,
                ..
            }
        ));

        let removal = plan_transition(
            &context(GameStatus::Entry),
            StatusChangeRequest {
                preserve_participants: Some(false),
                ..StatusChangeRequest::to(GameStatus::Editing)
            },
        )
        .unwrap();
        assert_eq!(removal.effects, vec![TransitionEffect::RemoveParticipants]);
    }

    #[test]
    fn starting_play_warns_about_incomplete_grids() {
        let straggler = Uuid::new_v4();
        let ctx = TransitionContext {
            incomplete_participants: vec![straggler],
            ..context(GameStatus::Entry)
        };
        let plan = plan_transition(&ctx, StatusChangeRequest::to(GameStatus::Playing)).unwrap();
        assert_eq!(
            plan.warnings,
            vec![TransitionWarning::IncompleteGrids {
                participant_ids: vec![straggler]
            }]
        );
    }

    #[test]
    fn phase_guard_reports_required_status() {
        assert!(ensure_phase(PhaseOperation::MarkSong, GameStatus::Playing).is_ok());
        let err = ensure_phase(PhaseOperation::EditGrid, GameStatus::Playing).unwrap_err();
        assert_eq!(
            err,
            StatusError::IllegalPhaseOperation {
                operation: PhaseOperation::EditGrid,
                required: GameStatus::Entry,
                actual: GameStatus::Playing,
            }
        );
    }
}
