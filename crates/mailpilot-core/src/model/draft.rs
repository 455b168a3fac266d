//! Compose draft model.

use serde::{Deserialize, Serialize};

use super::{Address, MessageId, ThreadId};
use crate::error::ValidationError;

/// How the draft was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComposeMode {
    /// Blank message.
    #[default]
    New,
    /// Reply to the sender.
    Reply,
    /// Reply to the sender and every other recipient.
    ReplyAll,
    /// Forward to new recipients.
    Forward,
}

/// Tone requested from the AI suggestion service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    /// Businesslike.
    #[default]
    Professional,
    /// Relaxed.
    Casual,
    /// Ceremonious.
    Formal,
    /// Warm.
    Friendly,
}

impl Tone {
    /// Convert to the service representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Professional => "professional",
            Self::Casual => "casual",
            Self::Formal => "formal",
            Self::Friendly => "friendly",
        }
    }
}

/// Which recipient list an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientField {
    /// To field.
    #[default]
    To,
    /// Cc field.
    Cc,
    /// Bcc field.
    Bcc,
}

/// The in-progress, unsent email.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Draft {
    /// How the draft was started.
    pub mode: ComposeMode,
    /// Account to send from; falls back to the signed-in account.
    pub connection_id: Option<String>,
    /// Recipients (To), unique by email.
    pub to: Vec<Address>,
    /// CC recipients, unique by email.
    pub cc: Vec<Address>,
    /// BCC recipients, unique by email.
    pub bcc: Vec<Address>,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub body: String,
    /// Rich body, when the editor produced one.
    pub body_html: Option<String>,
    /// Message being replied to or forwarded.
    pub reply_to_message_id: Option<MessageId>,
    /// Thread being replied to.
    pub reply_to_thread_id: Option<ThreadId>,
    /// Tone selected for AI suggestions.
    pub selected_tone: Tone,
}

impl Draft {
    /// Returns the recipient list for a field.
    #[must_use]
    pub fn recipients(&self, field: RecipientField) -> &[Address] {
        match field {
            RecipientField::To => &self.to,
            RecipientField::Cc => &self.cc,
            RecipientField::Bcc => &self.bcc,
        }
    }

    fn recipients_mut(&mut self, field: RecipientField) -> &mut Vec<Address> {
        match field {
            RecipientField::To => &mut self.to,
            RecipientField::Cc => &mut self.cc,
            RecipientField::Bcc => &mut self.bcc,
        }
    }

    /// Appends a recipient, ignoring case-insensitive duplicates.
    ///
    /// Returns `Ok(true)` if the list changed.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidEmail` if the address has no `@`.
    pub fn add_recipient(
        &mut self,
        field: RecipientField,
        recipient: Address,
    ) -> Result<bool, ValidationError> {
        let email = recipient.email.trim();
        if !email.contains('@') {
            return Err(ValidationError::InvalidEmail(recipient.email));
        }
        let list = self.recipients_mut(field);
        if list.iter().any(|existing| existing.same_mailbox(email)) {
            return Ok(false);
        }
        let email = email.to_string();
        list.push(Address { email, ..recipient });
        Ok(true)
    }

    /// Removes a recipient by case-insensitive email match.
    ///
    /// Returns true if the list changed.
    pub fn remove_recipient(&mut self, field: RecipientField, email: &str) -> bool {
        let list = self.recipients_mut(field);
        let before = list.len();
        list.retain(|existing| !existing.same_mailbox(email));
        list.len() != before
    }

    /// Returns true if discarding this draft would lose user input.
    #[must_use]
    pub fn has_unsaved_content(&self) -> bool {
        !self.to.is_empty()
            || !self.cc.is_empty()
            || !self.bcc.is_empty()
            || !self.subject.is_empty()
            || !self.body.is_empty()
    }

    /// Checks the send preconditions.
    ///
    /// Returns every violated precondition, in field order.
    #[must_use]
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.to.is_empty() {
            errors.push(ValidationError::MissingRecipient);
        }
        if self.subject.trim().is_empty() {
            errors.push(ValidationError::EmptySubject);
        }
        errors
    }

    /// Builds the payload handed to the mutation gateway.
    #[must_use]
    pub fn to_outgoing(&self, default_connection: Option<&str>) -> OutgoingMessage {
        OutgoingMessage {
            connection_id: self
                .connection_id
                .clone()
                .or_else(|| default_connection.map(ToString::to_string)),
            to: self.to.clone(),
            cc: self.cc.clone(),
            bcc: self.bcc.clone(),
            subject: self.subject.trim().to_string(),
            body: self.body.clone(),
            body_html: self.body_html.clone(),
            reply_to_message_id: self.reply_to_message_id.clone(),
            reply_to_thread_id: self.reply_to_thread_id.clone(),
        }
    }
}

/// Adds `prefix` to a subject unless it already starts with it (ignoring case).
#[must_use]
pub fn prefixed_subject(prefix: &str, subject: &str) -> String {
    let trimmed = subject.trim_start();
    let already = trimmed
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix));
    if already {
        subject.to_string()
    } else {
        format!("{prefix} {trimmed}")
    }
}

/// Payload for sending a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingMessage {
    /// Account to send from.
    pub connection_id: Option<String>,
    /// Recipients (To).
    pub to: Vec<Address>,
    /// CC recipients.
    pub cc: Vec<Address>,
    /// BCC recipients.
    pub bcc: Vec<Address>,
    /// Subject line, trimmed.
    pub subject: String,
    /// Plain text body.
    pub body: String,
    /// Rich body.
    pub body_html: Option<String>,
    /// Message being replied to.
    pub reply_to_message_id: Option<MessageId>,
    /// Thread being replied to.
    pub reply_to_thread_id: Option<ThreadId>,
}

/// Backend confirmation of a sent message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentMessage {
    /// Id assigned by the backend.
    pub id: MessageId,
    /// Thread the message was filed under.
    pub thread_id: ThreadId,
}
