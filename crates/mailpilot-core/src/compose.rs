//! Compose window and draft lifecycle.
//!
//! At most one draft exists. It is created by [`ComposeState::open_compose`]
//! and destroyed by a successful send or an explicit close. Asynchronous
//! work started for a draft (AI suggestions, sends) is tagged with a token
//! carrying the draft identity and a sequence number, and a result whose
//! token no longer matches the current state is dropped.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ServiceError, ValidationError};
use crate::model::{
    Address, ComposeMode, Draft, Message, MessageId, OutgoingMessage, RecipientField, SentMessage,
    Tone, prefixed_subject,
};

/// Identity of one draft lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DraftId(pub u64);

/// Tag for one asynchronous request issued for a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RequestToken {
    /// Draft the request belongs to.
    pub draft: DraftId,
    /// Monotonic request number.
    pub seq: u64,
}

/// View mode of the compose window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowMode {
    /// No draft.
    #[default]
    Closed,
    /// Docked window.
    Open,
    /// Collapsed to a title bar.
    Minimized,
    /// Covers the dashboard.
    Fullscreen,
}

/// What to do when `open_compose` finds a draft already open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenPolicy {
    /// Discard the current draft without asking.
    Replace,
    /// Refuse while the current draft has unsaved content.
    #[default]
    ConfirmDiscard,
}

/// Parameters for opening the compose window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeOptions {
    /// How the draft starts.
    pub mode: ComposeMode,
    /// Message being replied to or forwarded.
    pub reply_to_message_id: Option<MessageId>,
    /// Explicit recipients; overrides reply seeding.
    pub to: Option<Vec<Address>>,
    /// Explicit subject; overrides the original message's subject.
    pub subject: Option<String>,
    /// Account to send from.
    pub connection_id: Option<String>,
}

impl ComposeOptions {
    /// Options for a blank message.
    #[must_use]
    pub fn new_message() -> Self {
        Self::default()
    }

    /// Options for replying to a message.
    #[must_use]
    pub fn reply(message_id: MessageId) -> Self {
        Self {
            mode: ComposeMode::Reply,
            reply_to_message_id: Some(message_id),
            ..Self::default()
        }
    }
}

/// Result of `open_compose`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// A draft was created.
    Opened(DraftId),
    /// An open draft was discarded and a new one created.
    Replaced {
        /// The discarded draft.
        previous: DraftId,
        /// The new draft.
        current: DraftId,
    },
    /// The open draft has unsaved content; the caller must confirm the discard.
    NeedsDiscardConfirmation,
}

/// Result of `close_compose`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The draft was discarded.
    Closed,
    /// Nothing was open.
    NotOpen,
    /// The draft has unsaved content; the caller must confirm the discard.
    NeedsConfirmation,
}

/// Why `begin_send` refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendRejected {
    /// No draft is open.
    NoDraft,
    /// A send for this draft is already in flight.
    AlreadySending,
    /// Preconditions failed; the errors are also stored on the draft.
    Invalid(Vec<ValidationError>),
}

/// AI suggestion sub-state of a draft.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AiState {
    /// Request currently awaited.
    #[serde(skip)]
    pending: Option<RequestToken>,
    /// Latest suggestion not yet applied or discarded.
    pub suggestion: Option<String>,
    /// Error from the last failed request.
    pub error: Option<String>,
}

impl AiState {
    /// Whether a suggestion request is in flight.
    #[must_use]
    pub const fn is_generating(&self) -> bool {
        self.pending.is_some()
    }
}

/// The open draft with its window and request bookkeeping.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveDraft {
    /// Identity of this draft lifetime.
    pub id: DraftId,
    /// Draft content.
    pub draft: Draft,
    /// Window mode; never `Closed`.
    pub window: WindowMode,
    /// AI suggestion sub-state.
    pub ai: AiState,
    #[serde(skip)]
    pending_send: Option<RequestToken>,
    /// Validation errors shown inline.
    pub errors: Vec<ValidationError>,
    /// Last gateway error for the send.
    pub send_error: Option<String>,
}

impl ActiveDraft {
    /// Whether a send is in flight.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending_send.is_some()
    }
}

/// Compose state: zero or one draft.
#[derive(Debug, Clone, Default)]
pub struct ComposeState {
    active: Option<ActiveDraft>,
    policy: OpenPolicy,
    next_draft: u64,
    next_request: u64,
}

impl ComposeState {
    /// Creates an empty compose state.
    #[must_use]
    pub fn new(policy: OpenPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// The open draft, if any.
    #[must_use]
    pub const fn active(&self) -> Option<&ActiveDraft> {
        self.active.as_ref()
    }

    /// Draft content, if open.
    #[must_use]
    pub fn draft(&self) -> Option<&Draft> {
        self.active.as_ref().map(|a| &a.draft)
    }

    /// Current window mode.
    #[must_use]
    pub fn window_mode(&self) -> WindowMode {
        self.active.as_ref().map_or(WindowMode::Closed, |a| a.window)
    }

    /// Whether a draft is open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.active.is_some()
    }

    /// Whether discarding the draft would lose user input.
    #[must_use]
    pub fn has_unsaved_content(&self) -> bool {
        self.draft().is_some_and(Draft::has_unsaved_content)
    }

    /// Policy applied when opening over an existing draft.
    #[must_use]
    pub const fn policy(&self) -> OpenPolicy {
        self.policy
    }

    /// Opens the compose window with a fresh draft.
    ///
    /// `original` is the message named by `reply_to_message_id`, when the
    /// caller could resolve it. `own_email` is excluded from reply-all
    /// recipients.
    pub fn open_compose(
        &mut self,
        options: ComposeOptions,
        original: Option<&Message>,
        own_email: Option<&str>,
    ) -> OpenOutcome {
        let previous = match &self.active {
            Some(active)
                if self.policy == OpenPolicy::ConfirmDiscard
                    && active.draft.has_unsaved_content() =>
            {
                debug!(draft = active.id.0, "open refused, draft has unsaved content");
                return OpenOutcome::NeedsDiscardConfirmation;
            }
            Some(active) => Some(active.id),
            None => None,
        };

        let draft = seed_draft(options, original, own_email);
        let id = DraftId(self.next_draft);
        self.next_draft += 1;
        info!(draft = id.0, mode = ?draft.mode, "compose opened");
        self.active = Some(ActiveDraft {
            id,
            draft,
            window: WindowMode::Open,
            ai: AiState::default(),
            pending_send: None,
            errors: Vec::new(),
            send_error: None,
        });

        previous.map_or(OpenOutcome::Opened(id), |previous| OpenOutcome::Replaced {
            previous,
            current: id,
        })
    }

    /// Adds a recipient to the open draft.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidEmail` for an address without `@`;
    /// the error is also shown inline on the draft.
    pub fn add_recipient(
        &mut self,
        field: RecipientField,
        recipient: Address,
    ) -> Result<(), ValidationError> {
        let Some(active) = self.active.as_mut() else {
            return Ok(());
        };
        match active.draft.add_recipient(field, recipient) {
            Ok(_) => {
                active.errors.retain(|e| {
                    !matches!(
                        e,
                        ValidationError::MissingRecipient | ValidationError::InvalidEmail(_)
                    )
                });
                Ok(())
            }
            Err(err) => {
                active
                    .errors
                    .retain(|e| !matches!(e, ValidationError::InvalidEmail(_)));
                active.errors.push(err.clone());
                Err(err)
            }
        }
    }

    /// Removes a recipient from the open draft.
    pub fn remove_recipient(&mut self, field: RecipientField, email: &str) {
        if let Some(active) = self.active.as_mut() {
            active.draft.remove_recipient(field, email);
        }
    }

    /// Replaces the subject. A non-blank subject clears its inline error.
    pub fn set_subject(&mut self, subject: impl Into<String>) {
        if let Some(active) = self.active.as_mut() {
            active.draft.subject = subject.into();
            if !active.draft.subject.trim().is_empty() {
                active
                    .errors
                    .retain(|e| !matches!(e, ValidationError::EmptySubject));
            }
        }
    }

    /// Replaces the plain text body.
    pub fn set_body(&mut self, body: impl Into<String>) {
        if let Some(active) = self.active.as_mut() {
            active.draft.body = body.into();
        }
    }

    /// Replaces the rich body.
    pub fn set_body_html(&mut self, html: Option<String>) {
        if let Some(active) = self.active.as_mut() {
            active.draft.body_html = html;
        }
    }

    /// Selects the tone used for AI suggestions.
    pub fn set_tone(&mut self, tone: Tone) {
        if let Some(active) = self.active.as_mut() {
            active.draft.selected_tone = tone;
        }
    }

    /// Collapses the window.
    pub fn minimize_compose(&mut self) {
        if let Some(active) = self.active.as_mut() {
            active.window = WindowMode::Minimized;
        }
    }

    /// Restores a minimized window.
    pub fn maximize_compose(&mut self) {
        if let Some(active) = self.active.as_mut()
            && active.window == WindowMode::Minimized
        {
            active.window = WindowMode::Open;
        }
    }

    /// Switches between fullscreen and the docked window.
    pub fn toggle_fullscreen(&mut self) {
        if let Some(active) = self.active.as_mut() {
            active.window = match active.window {
                WindowMode::Fullscreen => WindowMode::Open,
                _ => WindowMode::Fullscreen,
            };
        }
    }

    /// Closes the window, discarding the draft.
    ///
    /// With `requires_confirmation`, a draft with unsaved content is kept and
    /// `NeedsConfirmation` is returned; call again with `false` once the user
    /// has confirmed. In-flight requests for the draft become stale.
    pub fn close_compose(&mut self, requires_confirmation: bool) -> CloseOutcome {
        match &self.active {
            None => CloseOutcome::NotOpen,
            Some(active) if requires_confirmation && active.draft.has_unsaved_content() => {
                CloseOutcome::NeedsConfirmation
            }
            Some(active) => {
                info!(draft = active.id.0, "compose closed");
                self.active = None;
                CloseOutcome::Closed
            }
        }
    }

    fn next_token(&mut self, draft: DraftId) -> RequestToken {
        self.next_request += 1;
        RequestToken {
            draft,
            seq: self.next_request,
        }
    }

    /// Starts an AI suggestion request, superseding any pending one.
    ///
    /// Returns the token the response must carry, or `None` if no draft is open.
    pub fn request_ai_suggestion(&mut self, tone: Tone) -> Option<RequestToken> {
        let draft = self.active.as_ref()?.id;
        let token = self.next_token(draft);
        let active = self.active.as_mut()?;
        if let Some(previous) = active.ai.pending.replace(token) {
            debug!(seq = previous.seq, "superseding pending AI request");
        }
        active.draft.selected_tone = tone;
        active.ai.error = None;
        Some(token)
    }

    /// Applies an AI response if its token is still current.
    ///
    /// Returns true if the state changed.
    pub fn complete_ai_suggestion(
        &mut self,
        token: RequestToken,
        result: Result<String, ServiceError>,
    ) -> bool {
        let Some(active) = self.active.as_mut() else {
            debug!(seq = token.seq, "dropping AI response, compose closed");
            return false;
        };
        if active.ai.pending != Some(token) {
            debug!(seq = token.seq, "dropping stale AI response");
            return false;
        }
        active.ai.pending = None;
        match result {
            Ok(text) => {
                active.ai.suggestion = Some(text);
                active.ai.error = None;
            }
            Err(err) => {
                warn!(error = %err, "AI suggestion failed");
                active.ai.error = Some(err.user_message());
            }
        }
        true
    }

    /// Overwrites the body with the pending suggestion.
    pub fn apply_ai_suggestion(&mut self) {
        if let Some(active) = self.active.as_mut()
            && let Some(text) = active.ai.suggestion.take()
        {
            active.draft.body = text;
        }
    }

    /// Discards the pending suggestion.
    pub fn clear_ai_suggestion(&mut self) {
        if let Some(active) = self.active.as_mut() {
            active.ai.suggestion = None;
            active.ai.error = None;
        }
    }

    /// Validates the draft and marks a send as in flight.
    ///
    /// # Errors
    ///
    /// Returns `SendRejected` without touching the network when there is no
    /// draft, a send is already pending, or validation fails.
    pub fn begin_send(
        &mut self,
        default_connection: Option<&str>,
    ) -> Result<(RequestToken, OutgoingMessage), SendRejected> {
        let active = self.active.as_ref().ok_or(SendRejected::NoDraft)?;
        if active.pending_send.is_some() {
            return Err(SendRejected::AlreadySending);
        }
        let draft = active.id;
        let token = self.next_token(draft);
        let active = self.active.as_mut().ok_or(SendRejected::NoDraft)?;

        let errors = active.draft.validate();
        if !errors.is_empty() {
            active.errors.clone_from(&errors);
            return Err(SendRejected::Invalid(errors));
        }
        active.errors.clear();
        active.send_error = None;
        active.pending_send = Some(token);
        Ok((token, active.draft.to_outgoing(default_connection)))
    }

    /// Applies a send result if its token is still current.
    ///
    /// Success closes the compose window; failure keeps the draft and
    /// records the error. Returns true if the state changed.
    pub fn complete_send(
        &mut self,
        token: RequestToken,
        result: &Result<SentMessage, ServiceError>,
    ) -> bool {
        let Some(active) = self.active.as_mut() else {
            debug!(seq = token.seq, "dropping send result, compose closed");
            return false;
        };
        if active.pending_send != Some(token) {
            debug!(seq = token.seq, "dropping stale send result");
            return false;
        }
        active.pending_send = None;
        match result {
            Ok(sent) => {
                info!(draft = active.id.0, message = %sent.id, "message sent");
                self.active = None;
            }
            Err(err) => {
                warn!(error = %err, "send failed, keeping draft");
                active.send_error = Some(err.user_message());
            }
        }
        true
    }
}

/// Builds the initial draft content for a compose request.
fn seed_draft(options: ComposeOptions, original: Option<&Message>, own_email: Option<&str>) -> Draft {
    let is_self = |addr: &Address| own_email.is_some_and(|own| addr.same_mailbox(own));
    let mut draft = Draft {
        mode: options.mode,
        connection_id: options.connection_id,
        reply_to_message_id: options.reply_to_message_id,
        ..Draft::default()
    };

    let base_subject = options
        .subject
        .or_else(|| original.map(|m| m.subject.clone()))
        .unwrap_or_default();

    let mut seed_to = Vec::new();
    let mut seed_cc = Vec::new();
    match options.mode {
        ComposeMode::New => draft.subject = base_subject,
        ComposeMode::Reply | ComposeMode::ReplyAll => {
            draft.subject = prefixed_subject("Re:", &base_subject);
            if let Some(message) = original {
                draft.reply_to_thread_id = Some(message.thread_id.clone());
                seed_to.extend(message.from.iter().cloned());
                if options.mode == ComposeMode::ReplyAll {
                    seed_to.extend(message.to.iter().filter(|a| !is_self(a)).cloned());
                    seed_cc.extend(message.cc.iter().filter(|a| !is_self(a)).cloned());
                }
            }
        }
        ComposeMode::Forward => {
            draft.subject = prefixed_subject("Fwd:", &base_subject);
        }
    }

    for address in options.to.unwrap_or(seed_to) {
        // Invalid seeded addresses are dropped rather than failing the open.
        let _ = draft.add_recipient(RecipientField::To, address);
    }
    for address in seed_cc {
        let _ = draft.add_recipient(RecipientField::Cc, address);
    }
    draft
}
