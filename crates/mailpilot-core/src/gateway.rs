//! Contracts for the remote collaborators the core depends on.
//!
//! The core never implements these; the host wires in real backends and
//! tests wire in scripted ones. Every call may fail with a
//! [`ServiceError`] whose message can be shown to the user.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::model::{MessageId, OutgoingMessage, SentMessage, Tone};

/// Message mutations and sync against the email backend.
pub trait MutationGateway: Send + Sync + 'static {
    /// Sends a draft.
    fn send_message(
        &self,
        payload: OutgoingMessage,
    ) -> impl Future<Output = Result<SentMessage, ServiceError>> + Send;

    /// Moves messages to the archive.
    fn archive_messages(
        &self,
        ids: Vec<MessageId>,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send;

    /// Moves messages to the trash.
    fn delete_messages(
        &self,
        ids: Vec<MessageId>,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send;

    /// Sets or clears the star on messages.
    fn star_messages(
        &self,
        ids: Vec<MessageId>,
        value: bool,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send;

    /// Sets the read status of messages.
    fn mark_read(
        &self,
        ids: Vec<MessageId>,
        read: bool,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send;

    /// Pulls new mail from the provider.
    fn sync(&self) -> impl Future<Output = Result<(), ServiceError>> + Send;

    /// Archives one message.
    fn archive_message(
        &self,
        id: MessageId,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send {
        self.archive_messages(vec![id])
    }

    /// Deletes one message.
    fn delete_message(
        &self,
        id: MessageId,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send {
        self.delete_messages(vec![id])
    }

    /// Stars or unstars one message.
    fn star_message(
        &self,
        id: MessageId,
        value: bool,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send {
        self.star_messages(vec![id], value)
    }
}

/// AI reply suggestions.
pub trait AiSuggestionService: Send + Sync + 'static {
    /// Drafts a reply to `message_id` in the given tone.
    fn suggest(
        &self,
        message_id: MessageId,
        tone: Tone,
    ) -> impl Future<Output = Result<String, ServiceError>> + Send;
}

/// The signed-in account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Default connection used for sends.
    pub connection_id: String,
    /// The user's own address.
    pub email: String,
}

/// Supplies the active session.
pub trait SessionProvider {
    /// Current session, or `None` when signed out.
    fn current_session(&self) -> Option<Session>;
}

impl SessionProvider for Session {
    fn current_session(&self) -> Option<Session> {
        Some(self.clone())
    }
}

impl<T: SessionProvider> SessionProvider for Option<T> {
    fn current_session(&self) -> Option<Session> {
        self.as_ref().and_then(SessionProvider::current_session)
    }
}
