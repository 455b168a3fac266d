//! Optimistic message mutations.
//!
//! A mutation is applied to the local [`MessageList`] immediately, then
//! confirmed or rejected by the gateway. What happens on rejection is the
//! orchestrator's [`OptimisticPolicy`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ServiceError;
use crate::message_list::{MessageList, Removed};
use crate::model::{MessageId, ReadStatus};

/// What to do with an optimistic change the backend rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimisticPolicy {
    /// Restore the pre-mutation state and report the error.
    #[default]
    RollbackOnFailure,
    /// Keep the local change (local-first, eventually consistent) and report the error.
    ApplyPermanently,
}

/// A mutation of one or more messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MutationKind {
    /// Move to archive.
    Archive,
    /// Move to trash.
    Delete,
    /// Set or clear the star.
    Star(bool),
    /// Set read (`true`) or unread.
    MarkRead(bool),
}

impl MutationKind {
    /// Present-tense verb for notices.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Archive => "archive",
            Self::Delete => "delete",
            Self::Star(true) => "star",
            Self::Star(false) => "unstar",
            Self::MarkRead(true) => "mark as read",
            Self::MarkRead(false) => "mark as unread",
        }
    }

    /// Whether the mutation takes messages out of the loaded list.
    #[must_use]
    pub const fn removes(&self) -> bool {
        matches!(self, Self::Archive | Self::Delete)
    }
}

/// Tag for one in-flight mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MutationToken(pub u64);

/// What the orchestrator needs to undo a mutation.
#[derive(Debug, Clone)]
enum Snapshot {
    Removed(Vec<Removed>),
    Starred(Vec<(MessageId, bool)>),
    Status(Vec<(MessageId, ReadStatus)>),
}

#[derive(Debug, Clone)]
struct Pending {
    kind: MutationKind,
    ids: Vec<MessageId>,
    snapshot: Snapshot,
}

/// Result of reconciling a finished mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    /// The backend confirmed the change.
    Confirmed {
        /// What was done.
        kind: MutationKind,
        /// Affected messages.
        count: usize,
    },
    /// The backend rejected the change and it was undone locally.
    RolledBack {
        /// What was attempted.
        kind: MutationKind,
        /// Error to surface.
        error: ServiceError,
    },
    /// The backend rejected the change and the local change was kept.
    KeptAfterFailure {
        /// What was attempted.
        kind: MutationKind,
        /// Error to surface.
        error: ServiceError,
    },
    /// The token was unknown (already reconciled).
    Unknown,
}

/// Applies and reconciles optimistic mutations.
#[derive(Debug, Clone, Default)]
pub struct MutationOrchestrator {
    policy: OptimisticPolicy,
    pending: HashMap<MutationToken, Pending>,
    next_token: u64,
}

impl MutationOrchestrator {
    /// Creates an orchestrator with a fixed failure policy.
    #[must_use]
    pub fn new(policy: OptimisticPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// The failure policy.
    #[must_use]
    pub const fn policy(&self) -> OptimisticPolicy {
        self.policy
    }

    /// Number of mutations awaiting the backend.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if `id` is part of an unconfirmed mutation.
    #[must_use]
    pub fn is_pending(&self, id: &MessageId) -> bool {
        self.pending.values().any(|p| p.ids.contains(id))
    }

    /// Applies `kind` to the loaded messages among `ids`.
    ///
    /// Returns the token and the ids actually affected, or `None` when none
    /// of the ids is loaded.
    pub fn begin(
        &mut self,
        kind: MutationKind,
        ids: &[MessageId],
        list: &mut MessageList,
    ) -> Option<(MutationToken, Vec<MessageId>)> {
        let ids: Vec<MessageId> = ids.iter().filter(|id| list.contains(id)).cloned().collect();
        if ids.is_empty() {
            debug!(kind = kind.verb(), "nothing to mutate");
            return None;
        }

        let snapshot = match kind {
            MutationKind::Archive | MutationKind::Delete => Snapshot::Removed(list.remove(&ids)),
            MutationKind::Star(value) => Snapshot::Starred(
                ids.iter()
                    .filter_map(|id| {
                        let message = list.get_mut(id)?;
                        let previous = message.is_starred;
                        message.is_starred = value;
                        Some((id.clone(), previous))
                    })
                    .collect(),
            ),
            MutationKind::MarkRead(read) => {
                let status = if read {
                    ReadStatus::Read
                } else {
                    ReadStatus::Unread
                };
                Snapshot::Status(
                    ids.iter()
                        .filter_map(|id| {
                            let message = list.get_mut(id)?;
                            let previous = message.status;
                            message.status = status;
                            Some((id.clone(), previous))
                        })
                        .collect(),
                )
            }
        };

        self.next_token += 1;
        let token = MutationToken(self.next_token);
        self.pending.insert(
            token,
            Pending {
                kind,
                ids: ids.clone(),
                snapshot,
            },
        );
        Some((token, ids))
    }

    /// Reconciles a finished mutation against the local list.
    ///
    /// A rollback only restores fields that still hold the optimistic value,
    /// so a later mutation of the same message is not clobbered.
    pub fn finish(
        &mut self,
        token: MutationToken,
        result: Result<(), ServiceError>,
        list: &mut MessageList,
    ) -> Reconciled {
        let Some(pending) = self.pending.remove(&token) else {
            debug!(token = token.0, "unknown mutation token");
            return Reconciled::Unknown;
        };
        let error = match result {
            Ok(()) => {
                return Reconciled::Confirmed {
                    kind: pending.kind,
                    count: pending.ids.len(),
                };
            }
            Err(error) => error,
        };

        warn!(kind = pending.kind.verb(), error = %error, "mutation rejected");
        if self.policy == OptimisticPolicy::ApplyPermanently {
            return Reconciled::KeptAfterFailure {
                kind: pending.kind,
                error,
            };
        }

        match (pending.kind, pending.snapshot) {
            (_, Snapshot::Removed(removed)) => list.restore(removed),
            (MutationKind::Star(value), Snapshot::Starred(previous)) => {
                for (id, was) in previous {
                    if let Some(message) = list.get_mut(&id)
                        && message.is_starred == value
                    {
                        message.is_starred = was;
                    }
                }
            }
            (MutationKind::MarkRead(read), Snapshot::Status(previous)) => {
                let applied = if read {
                    ReadStatus::Read
                } else {
                    ReadStatus::Unread
                };
                for (id, was) in previous {
                    if let Some(message) = list.get_mut(&id)
                        && message.status == applied
                    {
                        message.status = was;
                    }
                }
            }
            (kind, _) => debug!(kind = kind.verb(), "snapshot does not match mutation"),
        }
        Reconciled::RolledBack {
            kind: pending.kind,
            error,
        }
    }
}
