//! The interaction store.
//!
//! [`Store`] owns every piece of interaction state and is mutated only
//! through [`Store::dispatch`] (user intent) and [`Store::apply`]
//! (completed asynchronous work). Both are synchronous and total; the
//! returned [`Effect`]s describe work for the runtime or the host.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::command::{CommandCategory, CommandPalette, PaletteKey, PaletteOutcome};
use crate::compose::{
    ActiveDraft, CloseOutcome, ComposeOptions, ComposeState, OpenOutcome, RequestToken,
    SendRejected, WindowMode,
};
use crate::error::ServiceError;
use crate::gateway::{Session, SessionProvider};
use crate::inbox::InboxState;
use crate::message_list::MessageList;
use crate::model::{
    Address, Filter, Folder, Message, MessageId, OutgoingMessage, RecipientField, SentMessage,
    Sort, Tone,
};
use crate::mutation::{MutationKind, MutationOrchestrator, MutationToken, Reconciled};
use crate::route::{Location, Route};
use crate::settings::Settings;
use crate::ui::{Modal, NoticeLevel, ThemeMode, UiState};

/// User intent, as dispatched by a front end or a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    // Inbox navigation
    /// Switch folder.
    SetActiveFolder {
        /// Target folder.
        folder: Folder,
    },
    /// Switch or clear the label.
    SetActiveLabel {
        /// Label name, `None` to clear.
        label: Option<String>,
    },
    /// Read folder and label from a URL query.
    ApplyRoute {
        /// Decoded query.
        route: Route,
    },
    /// Change the search text.
    SetSearchQuery {
        /// New text.
        query: String,
    },
    /// Clear the search text.
    ClearSearch,
    /// Add a filter.
    AddFilter {
        /// Filter to add.
        filter: Filter,
    },
    /// Remove a filter by id.
    RemoveFilter {
        /// Filter id (`type-value`).
        id: String,
    },
    /// Remove every filter.
    ClearFilters,
    /// Replace the sort.
    SetSort {
        /// New sort.
        sort: Sort,
    },

    // Selection
    /// Open a message in the detail pane, or close it.
    SelectMessage {
        /// Message to open.
        id: Option<MessageId>,
    },
    /// Click on a list item (mode-aware).
    ActivateMessage {
        /// Clicked message.
        id: MessageId,
    },
    /// Flip a message's checkbox.
    ToggleMessageSelection {
        /// Message to flip.
        id: MessageId,
    },
    /// Enter or leave multi-select mode.
    ToggleMultiSelectMode,
    /// Empty the selection.
    ClearSelection,
    /// Select every visible message.
    SelectAllVisible,

    // Message mutations
    /// Archive one message.
    Archive {
        /// Target.
        id: MessageId,
    },
    /// Delete one message.
    Delete {
        /// Target.
        id: MessageId,
    },
    /// Flip the star on one message.
    ToggleStar {
        /// Target.
        id: MessageId,
    },
    /// Set the read status of one message.
    MarkRead {
        /// Target.
        id: MessageId,
        /// `true` for read.
        read: bool,
    },
    /// Archive the selection.
    ArchiveSelected,
    /// Delete the selection.
    DeleteSelected,
    /// Star or unstar the selection.
    StarSelected {
        /// New star value.
        value: bool,
    },
    /// Set the read status of the selection.
    MarkSelectedRead {
        /// `true` for read.
        read: bool,
    },
    /// Pull new mail.
    Sync,
    /// Replace the loaded message list.
    LoadMessages {
        /// Messages in load order.
        messages: Vec<Message>,
    },

    // Compose
    /// Open the compose window.
    OpenCompose {
        /// How to seed the draft.
        #[serde(default)]
        options: ComposeOptions,
    },
    /// Confirm the pending draft discard.
    ConfirmDiscard,
    /// Dismiss the top-most modal without acting.
    CancelModal,
    /// Add a recipient.
    AddRecipient {
        /// Target list.
        field: RecipientField,
        /// Address to add.
        recipient: Address,
    },
    /// Remove a recipient.
    RemoveRecipient {
        /// Target list.
        field: RecipientField,
        /// Address to remove.
        email: String,
    },
    /// Replace the subject.
    SetSubject {
        /// New subject.
        subject: String,
    },
    /// Replace the plain text body.
    SetBody {
        /// New body.
        body: String,
    },
    /// Replace the rich body.
    SetBodyHtml {
        /// New HTML, `None` to drop it.
        html: Option<String>,
    },
    /// Select the AI tone.
    SetTone {
        /// New tone.
        tone: Tone,
    },
    /// Collapse the compose window.
    MinimizeCompose,
    /// Restore a collapsed compose window.
    MaximizeCompose,
    /// Switch fullscreen on or off.
    ToggleFullscreen,
    /// Close the compose window.
    CloseCompose {
        /// Ask before discarding unsaved content.
        #[serde(default)]
        requires_confirmation: bool,
    },
    /// Ask the AI service for a reply.
    RequestAiSuggestion {
        /// Message being replied to.
        message_id: MessageId,
        /// Tone to write in.
        tone: Tone,
    },
    /// Copy the suggestion into the body.
    ApplyAiSuggestion,
    /// Drop the suggestion.
    ClearAiSuggestion,
    /// Send the draft.
    Send,

    // Command palette
    /// Show or hide the palette (`Cmd/Ctrl+K`).
    TogglePalette,
    /// Change the palette query.
    SetPaletteQuery {
        /// New query.
        query: String,
    },
    /// Key press while the palette is open.
    PaletteKey {
        /// The key.
        key: PaletteKey,
    },
    /// Run a command by id (pointer click or alternate front end).
    RunCommand {
        /// Command id.
        id: String,
    },
    /// Hide the palette.
    ClosePalette,

    // Chrome
    /// Collapse or expand the sidebar.
    ToggleSidebar,
    /// Show or hide the mobile drawer.
    SetMobileSidebar {
        /// Visibility.
        open: bool,
    },
    /// Change the theme.
    SetTheme {
        /// New theme.
        theme: ThemeMode,
    },
    /// Show a modal.
    OpenModal {
        /// Modal to show.
        modal: Modal,
    },
    /// Dismiss a banner.
    DismissNotice {
        /// Banner id.
        id: u64,
    },
    /// Go to another page.
    Navigate {
        /// Destination.
        location: Location,
    },
    /// End the session.
    SignOut,
}

/// Work requested by the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    /// Send a draft through the gateway.
    SendMessage {
        /// Token the result must carry.
        token: RequestToken,
        /// Payload.
        payload: OutgoingMessage,
    },
    /// Run an optimistic mutation through the gateway.
    Mutate {
        /// Token the result must carry.
        token: MutationToken,
        /// What to do.
        kind: MutationKind,
        /// Affected messages.
        ids: Vec<MessageId>,
    },
    /// Ask the AI service for a suggestion.
    RequestAi {
        /// Token the result must carry.
        token: RequestToken,
        /// Message being replied to.
        message_id: MessageId,
        /// Tone to write in.
        tone: Tone,
    },
    /// Pull new mail.
    Sync,
    /// Change the host's page or URL.
    Navigate {
        /// Destination.
        location: Location,
    },
    /// Tear down the session in the host.
    SignOut,
    /// Save the theme to the settings file.
    PersistTheme {
        /// Theme to save.
        theme: ThemeMode,
    },
}

impl Effect {
    /// Whether the effect is handled by the host rather than the runtime.
    #[must_use]
    pub const fn is_host(&self) -> bool {
        matches!(
            self,
            Self::Navigate { .. } | Self::SignOut | Self::PersistTheme { .. }
        )
    }
}

/// Completion of an asynchronous effect.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A send finished.
    SendFinished {
        /// Token from the effect.
        token: RequestToken,
        /// Gateway result.
        result: Result<SentMessage, ServiceError>,
    },
    /// A mutation finished.
    MutationFinished {
        /// Token from the effect.
        token: MutationToken,
        /// Gateway result.
        result: Result<(), ServiceError>,
    },
    /// An AI request finished.
    AiFinished {
        /// Token from the effect.
        token: RequestToken,
        /// Service result.
        result: Result<String, ServiceError>,
    },
    /// A sync finished.
    SyncFinished {
        /// Gateway result.
        result: Result<(), ServiceError>,
        /// Completion time.
        at: DateTime<Utc>,
    },
}

/// The whole interaction state.
#[derive(Debug, Clone)]
pub struct Store {
    ui: UiState,
    inbox: InboxState,
    compose: ComposeState,
    palette: CommandPalette,
    messages: MessageList,
    mutations: MutationOrchestrator,
    session: Option<Session>,
    is_syncing: bool,
    last_synced_at: Option<DateTime<Utc>>,
    pending_open: Option<ComposeOptions>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(&Settings::default(), &None::<Session>)
    }
}

impl Store {
    /// Creates a store configured from settings, for the current session.
    #[must_use]
    pub fn new(settings: &Settings, session: &impl SessionProvider) -> Self {
        Self {
            ui: UiState::new(settings.theme_mode),
            inbox: InboxState::new(settings.default_sort),
            compose: ComposeState::new(settings.open_policy),
            palette: CommandPalette::default(),
            messages: MessageList::default(),
            mutations: MutationOrchestrator::new(settings.optimistic_policy),
            session: session.current_session(),
            is_syncing: false,
            last_synced_at: None,
            pending_open: None,
        }
    }

    /// Interface chrome.
    #[must_use]
    pub const fn ui(&self) -> &UiState {
        &self.ui
    }

    /// Inbox view state.
    #[must_use]
    pub const fn inbox(&self) -> &InboxState {
        &self.inbox
    }

    /// Compose state.
    #[must_use]
    pub const fn compose(&self) -> &ComposeState {
        &self.compose
    }

    /// Command palette.
    #[must_use]
    pub const fn palette(&self) -> &CommandPalette {
        &self.palette
    }

    /// Loaded messages.
    #[must_use]
    pub const fn messages(&self) -> &MessageList {
        &self.messages
    }

    /// Optimistic mutation bookkeeping.
    #[must_use]
    pub const fn mutations(&self) -> &MutationOrchestrator {
        &self.mutations
    }

    /// Signed-in account.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Replaces the session, e.g. after sign-in.
    pub fn set_session(&mut self, session: Option<Session>) {
        self.session = session;
    }

    /// Whether a sync is in flight.
    #[must_use]
    pub const fn is_syncing(&self) -> bool {
        self.is_syncing
    }

    /// Completion time of the last successful sync.
    #[must_use]
    pub const fn last_synced_at(&self) -> Option<DateTime<Utc>> {
        self.last_synced_at
    }

    /// Messages visible under the current inbox state.
    #[must_use]
    pub fn visible_messages(&self) -> Vec<&Message> {
        self.messages.visible(&self.inbox)
    }

    /// Applies a user action.
    #[allow(clippy::too_many_lines)] // One arm per action reads best as a flat match
    pub fn dispatch(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::SetActiveFolder { folder } => {
                self.inbox.set_active_folder(folder);
                return vec![Effect::Navigate {
                    location: Location::Mailbox {
                        route: Route::folder(folder),
                    },
                }];
            }
            Action::SetActiveLabel { label } => {
                self.inbox.set_active_label(label);
                let route = self.inbox.active_label().map_or_else(
                    || Route::folder(self.inbox.active_folder()),
                    Route::label,
                );
                return vec![Effect::Navigate {
                    location: Location::Mailbox { route },
                }];
            }
            Action::ApplyRoute { route } => self.apply_route(route),
            Action::SetSearchQuery { query } => self.inbox.set_search_query(query),
            Action::ClearSearch => self.inbox.clear_search(),
            Action::AddFilter { filter } => {
                self.inbox.add_filter(filter);
            }
            Action::RemoveFilter { id } => {
                self.inbox.remove_filter(&id);
            }
            Action::ClearFilters => self.inbox.clear_filters(),
            Action::SetSort { sort } => self.inbox.set_sort(sort),

            Action::SelectMessage { id: None } => self.inbox.select_message(None),
            Action::SelectMessage { id: Some(id) } => {
                if self.messages.contains(&id) {
                    self.inbox.select_message(Some(id.clone()));
                    return self.mark_opened(&id);
                }
                debug!(%id, "select ignored, message not loaded");
            }
            Action::ActivateMessage { id } => {
                if !self.messages.contains(&id) {
                    debug!(%id, "activate ignored, message not loaded");
                } else if self.inbox.activate_message(id.clone()) {
                    return self.mark_opened(&id);
                }
            }
            Action::ToggleMessageSelection { id } => {
                if self.messages.contains(&id) {
                    self.inbox.toggle_message_selection(id);
                } else {
                    debug!(%id, "toggle ignored, message not loaded");
                }
            }
            Action::ToggleMultiSelectMode => self.inbox.toggle_multi_select_mode(),
            Action::ClearSelection => self.inbox.clear_selection(),
            Action::SelectAllVisible => {
                let ids = self.messages.visible_ids(&self.inbox);
                self.inbox.select_all(ids);
            }

            Action::Archive { id } => return self.mutate(MutationKind::Archive, &[id]),
            Action::Delete { id } => return self.mutate(MutationKind::Delete, &[id]),
            Action::ToggleStar { id } => {
                let Some(starred) = self.messages.get(&id).map(|m| m.is_starred) else {
                    debug!(%id, "star ignored, message not loaded");
                    return Vec::new();
                };
                return self.mutate(MutationKind::Star(!starred), &[id]);
            }
            Action::MarkRead { id, read } => return self.mutate(MutationKind::MarkRead(read), &[id]),
            Action::ArchiveSelected => return self.mutate_selection(MutationKind::Archive),
            Action::DeleteSelected => return self.mutate_selection(MutationKind::Delete),
            Action::StarSelected { value } => {
                return self.mutate_selection(MutationKind::Star(value));
            }
            Action::MarkSelectedRead { read } => {
                return self.mutate_selection(MutationKind::MarkRead(read));
            }
            Action::Sync => {
                if self.is_syncing {
                    debug!("sync already in flight");
                    return Vec::new();
                }
                self.is_syncing = true;
                return vec![Effect::Sync];
            }
            Action::LoadMessages { messages } => {
                self.messages.replace(messages);
                self.prune_selection();
            }

            Action::OpenCompose { options } => self.open_compose(options),
            Action::ConfirmDiscard => self.confirm_discard(),
            Action::CancelModal => {
                if self.ui.pop_modal() == Some(Modal::DiscardDraft) {
                    self.pending_open = None;
                }
            }
            Action::AddRecipient { field, recipient } => {
                if let Err(err) = self.compose.add_recipient(field, recipient) {
                    debug!(error = %err, "recipient rejected");
                }
            }
            Action::RemoveRecipient { field, email } => {
                self.compose.remove_recipient(field, &email);
            }
            Action::SetSubject { subject } => self.compose.set_subject(subject),
            Action::SetBody { body } => self.compose.set_body(body),
            Action::SetBodyHtml { html } => self.compose.set_body_html(html),
            Action::SetTone { tone } => self.compose.set_tone(tone),
            Action::MinimizeCompose => self.compose.minimize_compose(),
            Action::MaximizeCompose => self.compose.maximize_compose(),
            Action::ToggleFullscreen => self.compose.toggle_fullscreen(),
            Action::CloseCompose {
                requires_confirmation,
            } => match self.compose.close_compose(requires_confirmation) {
                CloseOutcome::NeedsConfirmation => {
                    self.pending_open = None;
                    self.ui.push_modal(Modal::DiscardDraft);
                }
                CloseOutcome::Closed => self.dismiss_discard_prompt(),
                CloseOutcome::NotOpen => {}
            },
            Action::RequestAiSuggestion { message_id, tone } => {
                if let Some(token) = self.compose.request_ai_suggestion(tone) {
                    return vec![Effect::RequestAi {
                        token,
                        message_id,
                        tone,
                    }];
                }
                debug!("AI request ignored, compose closed");
            }
            Action::ApplyAiSuggestion => self.compose.apply_ai_suggestion(),
            Action::ClearAiSuggestion => self.compose.clear_ai_suggestion(),
            Action::Send => return self.send(),

            Action::TogglePalette => {
                self.ui.command_palette_open = !self.ui.command_palette_open;
                if self.ui.command_palette_open {
                    self.palette.reset();
                }
            }
            Action::SetPaletteQuery { query } => self.palette.set_query(query),
            Action::PaletteKey { key } if !self.ui.command_palette_open => {
                debug!(?key, "palette closed, key ignored");
            }
            Action::PaletteKey { key } => match self.palette.handle_key(key) {
                PaletteOutcome::None => {}
                PaletteOutcome::Close => self.ui.command_palette_open = false,
                PaletteOutcome::Run(action) => {
                    self.ui.command_palette_open = false;
                    return self.dispatch(action);
                }
            },
            Action::RunCommand { id } => {
                let Some(action) = self.palette.registry().get(&id).map(|c| c.action.clone())
                else {
                    warn!(%id, "unknown command");
                    return Vec::new();
                };
                self.ui.command_palette_open = false;
                return self.dispatch(action);
            }
            Action::ClosePalette => self.ui.command_palette_open = false,

            Action::ToggleSidebar => self.ui.toggle_sidebar(),
            Action::SetMobileSidebar { open } => self.ui.set_mobile_sidebar(open),
            Action::SetTheme { theme } => {
                self.ui.theme = theme;
                return vec![Effect::PersistTheme { theme }];
            }
            Action::OpenModal {
                modal: Modal::DiscardDraft,
            } => debug!("discard prompt is only raised by compose"),
            Action::OpenModal { modal } => self.ui.push_modal(modal),
            Action::DismissNotice { id } => self.ui.dismiss_notice(id),
            Action::Navigate { location } => {
                if let Location::Mailbox { route } = &location {
                    self.apply_route(route.clone());
                }
                self.ui.set_mobile_sidebar(false);
                return vec![Effect::Navigate { location }];
            }
            Action::SignOut => {
                self.compose.close_compose(false);
                self.dismiss_discard_prompt();
                self.ui.command_palette_open = false;
                self.inbox.clear_selection();
                self.inbox.select_message(None);
                self.session = None;
                info!("signed out");
                return vec![Effect::SignOut];
            }
        }
        Vec::new()
    }

    /// Applies the completion of an effect.
    pub fn apply(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::SendFinished { token, result } => {
                if self.compose.complete_send(token, &result) {
                    match result {
                        Ok(_) => {
                            self.ui.notify(NoticeLevel::Info, "Message sent");
                        }
                        Err(err) => {
                            self.ui.notify(
                                NoticeLevel::Error,
                                format!("Could not send: {}", err.user_message()),
                            );
                        }
                    }
                }
            }
            Event::MutationFinished { token, result } => {
                match self.mutations.finish(token, result, &mut self.messages) {
                    Reconciled::Confirmed { kind, count } => {
                        debug!(kind = kind.verb(), count, "mutation confirmed");
                    }
                    Reconciled::RolledBack { kind, error } => {
                        self.ui.notify(
                            NoticeLevel::Error,
                            format!(
                                "Could not {}: {} Your changes were undone.",
                                kind.verb(),
                                sentence(&error.user_message())
                            ),
                        );
                    }
                    Reconciled::KeptAfterFailure { kind, error } => {
                        self.ui.notify(
                            NoticeLevel::Error,
                            format!("Could not {}: {}", kind.verb(), error.user_message()),
                        );
                    }
                    Reconciled::Unknown => {}
                }
            }
            Event::AiFinished { token, result } => {
                self.compose.complete_ai_suggestion(token, result);
            }
            Event::SyncFinished { result, at } => {
                self.is_syncing = false;
                match result {
                    Ok(()) => {
                        info!("sync finished");
                        self.last_synced_at = Some(at);
                    }
                    Err(err) => {
                        warn!(error = %err, "sync failed");
                        self.ui.notify(
                            NoticeLevel::Error,
                            format!("Sync failed: {}", err.user_message()),
                        );
                    }
                }
            }
        }
        Vec::new()
    }

    /// Serialisable view of the whole state.
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot<'_> {
        StoreSnapshot {
            ui: &self.ui,
            palette: PaletteSnapshot {
                open: self.ui.command_palette_open,
                query: self.palette.query(),
                selected_index: self.palette.selected_index(),
                results: self
                    .palette
                    .filtered()
                    .into_iter()
                    .map(|c| PaletteEntry {
                        id: c.id,
                        title: c.title,
                        subtitle: c.subtitle,
                        category: c.category,
                        shortcut: c.shortcut,
                    })
                    .collect(),
            },
            inbox: &self.inbox,
            visible: self.visible_messages(),
            unread: Folder::ALL
                .iter()
                .map(|&folder| UnreadCount {
                    folder,
                    unread: self.messages.unread_count(folder),
                })
                .collect(),
            compose: ComposeSnapshot {
                window: self.compose.window_mode(),
                has_unsaved_content: self.compose.has_unsaved_content(),
                is_pending: self.compose.active().is_some_and(ActiveDraft::is_pending),
                is_generating_ai: self.compose.active().is_some_and(|a| a.ai.is_generating()),
                active: self.compose.active(),
            },
            is_syncing: self.is_syncing,
            last_synced_at: self.last_synced_at,
            mutations_in_flight: self.mutations.in_flight(),
            session: self.session.as_ref(),
        }
    }

    fn apply_route(&mut self, route: Route) {
        if let Some(folder) = route.folder
            && folder != self.inbox.active_folder()
        {
            self.inbox.set_active_folder(folder);
        }
        if route.label.as_deref() != self.inbox.active_label() {
            self.inbox.set_active_label(route.label);
        }
    }

    /// Marks a just-opened message read.
    fn mark_opened(&mut self, id: &MessageId) -> Vec<Effect> {
        if self.messages.get(id).is_some_and(Message::is_read) {
            return Vec::new();
        }
        self.mutate(MutationKind::MarkRead(true), std::slice::from_ref(id))
    }

    fn mutate(&mut self, kind: MutationKind, ids: &[MessageId]) -> Vec<Effect> {
        let Some((token, ids)) = self.mutations.begin(kind, ids, &mut self.messages) else {
            return Vec::new();
        };
        if kind.removes() {
            self.prune_selection();
        }
        vec![Effect::Mutate { token, kind, ids }]
    }

    fn mutate_selection(&mut self, kind: MutationKind) -> Vec<Effect> {
        let ids: Vec<MessageId> = self.inbox.selection().iter().cloned().collect();
        if ids.is_empty() {
            debug!(kind = kind.verb(), "bulk action with empty selection");
            return Vec::new();
        }
        let effects = self.mutate(kind, &ids);
        self.inbox.clear_selection();
        effects
    }

    fn prune_selection(&mut self) {
        let messages = &self.messages;
        self.inbox.retain_loaded(|id| messages.contains(id));
    }

    fn open_compose(&mut self, options: ComposeOptions) {
        let original = options
            .reply_to_message_id
            .as_ref()
            .and_then(|id| self.messages.get(id));
        let own_email = self.session.as_ref().map(|s| s.email.as_str());
        let retry = options.clone();
        match self.compose.open_compose(options, original, own_email) {
            OpenOutcome::NeedsDiscardConfirmation => {
                self.pending_open = Some(retry);
                self.ui.push_modal(Modal::DiscardDraft);
            }
            OpenOutcome::Opened(_) | OpenOutcome::Replaced { .. } => {
                self.dismiss_discard_prompt();
            }
        }
    }

    /// Closes the discard prompt and forgets the compose request it guarded.
    fn dismiss_discard_prompt(&mut self) {
        self.ui.dismiss_modal(Modal::DiscardDraft);
        self.pending_open = None;
    }

    fn confirm_discard(&mut self) {
        if self.ui.modal() != Some(Modal::DiscardDraft) {
            debug!("no discard to confirm");
            return;
        }
        self.ui.dismiss_modal(Modal::DiscardDraft);
        self.compose.close_compose(false);
        if let Some(options) = self.pending_open.take() {
            self.open_compose(options);
        }
    }

    fn send(&mut self) -> Vec<Effect> {
        let connection = self.session.as_ref().map(|s| s.connection_id.as_str());
        match self.compose.begin_send(connection) {
            Ok((token, payload)) => vec![Effect::SendMessage { token, payload }],
            Err(SendRejected::Invalid(errors)) => {
                debug!(count = errors.len(), "send blocked by validation");
                Vec::new()
            }
            Err(reason) => {
                debug!(?reason, "send ignored");
                Vec::new()
            }
        }
    }
}

/// Ends a message with a period so another sentence can follow.
fn sentence(text: &str) -> String {
    let text = text.trim_end();
    if text.ends_with(['.', '!', '?']) {
        text.to_string()
    } else {
        format!("{text}.")
    }
}

/// Borrowed, serialisable view of a [`Store`].
#[derive(Debug, Serialize)]
pub struct StoreSnapshot<'a> {
    /// Interface chrome.
    pub ui: &'a UiState,
    /// Command palette.
    pub palette: PaletteSnapshot<'a>,
    /// Inbox view state.
    pub inbox: &'a InboxState,
    /// Visible messages in display order.
    pub visible: Vec<&'a Message>,
    /// Unread count per folder.
    pub unread: Vec<UnreadCount>,
    /// Compose window.
    pub compose: ComposeSnapshot<'a>,
    /// Whether a sync is in flight.
    pub is_syncing: bool,
    /// Last successful sync.
    pub last_synced_at: Option<DateTime<Utc>>,
    /// Unconfirmed mutations.
    pub mutations_in_flight: usize,
    /// Signed-in account.
    pub session: Option<&'a Session>,
}

/// Palette part of a snapshot.
#[derive(Debug, Serialize)]
pub struct PaletteSnapshot<'a> {
    /// Visibility.
    pub open: bool,
    /// Query text.
    pub query: &'a str,
    /// Cursor into `results`.
    pub selected_index: usize,
    /// Filtered commands.
    pub results: Vec<PaletteEntry>,
}

/// One palette row.
#[derive(Debug, Serialize)]
pub struct PaletteEntry {
    /// Command id.
    pub id: &'static str,
    /// Title.
    pub title: &'static str,
    /// Secondary line.
    pub subtitle: Option<&'static str>,
    /// Section.
    pub category: CommandCategory,
    /// Shortcut hint.
    pub shortcut: Option<&'static str>,
}

/// Unread messages in a folder.
#[derive(Debug, Serialize)]
pub struct UnreadCount {
    /// Folder.
    pub folder: Folder,
    /// Unread messages.
    pub unread: usize,
}

/// Compose part of a snapshot.
#[derive(Debug, Serialize)]
pub struct ComposeSnapshot<'a> {
    /// Window mode.
    pub window: WindowMode,
    /// Whether closing would lose input.
    pub has_unsaved_content: bool,
    /// Whether a send is in flight.
    pub is_pending: bool,
    /// Whether an AI request is in flight.
    pub is_generating_ai: bool,
    /// The open draft.
    pub active: Option<&'a ActiveDraft>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::compose::OpenPolicy;
    use crate::error::ValidationError;
    use crate::message_list::fixtures::message;
    use crate::model::{ComposeMode, ReadStatus, ThreadId};
    use crate::mutation::OptimisticPolicy;
    use crate::ui::Notice;

    fn session() -> Session {
        Session {
            connection_id: "conn-1".into(),
            email: "me@example.com".into(),
        }
    }

    fn store_with(policy: OptimisticPolicy) -> Store {
        let settings = Settings {
            optimistic_policy: policy,
            ..Settings::default()
        };
        let mut store = Store::new(&settings, &session());
        store.dispatch(Action::LoadMessages {
            messages: (1..=5).map(|i| message(&format!("m{i}"), i)).collect(),
        });
        store
    }

    fn id(s: &str) -> MessageId {
        MessageId::new(s)
    }

    fn select(store: &mut Store, ids: &[&str]) {
        for s in ids {
            store.dispatch(Action::ToggleMessageSelection { id: id(s) });
        }
    }

    fn only_mutation(effects: &[Effect]) -> (MutationToken, MutationKind, Vec<MessageId>) {
        match effects {
            [Effect::Mutate { token, kind, ids }] => (*token, *kind, ids.clone()),
            other => panic!("expected one mutation, got {other:?}"),
        }
    }

    fn last_notice(store: &Store) -> &Notice {
        store.ui().notices().last().unwrap()
    }

    #[test]
    fn test_bulk_archive_success_removes_and_clears_selection() {
        let mut store = store_with(OptimisticPolicy::RollbackOnFailure);
        select(&mut store, &["m1", "m2", "m3"]);

        let effects = store.dispatch(Action::ArchiveSelected);
        let (token, kind, ids) = only_mutation(&effects);
        assert_eq!(kind, MutationKind::Archive);
        assert_eq!(ids.len(), 3);
        assert!(store.inbox().selection().is_empty());
        assert_eq!(store.messages().len(), 2);

        store.apply(Event::MutationFinished {
            token,
            result: Ok(()),
        });

        assert_eq!(store.messages().len(), 2);
        assert!(store.inbox().selection().is_empty());
        assert!(store.ui().notices().is_empty());
    }

    #[test]
    fn test_bulk_archive_failure_rolls_back_with_banner() {
        let mut store = store_with(OptimisticPolicy::RollbackOnFailure);
        select(&mut store, &["m1", "m2", "m3"]);
        let (token, _, _) = only_mutation(&store.dispatch(Action::ArchiveSelected));

        store.apply(Event::MutationFinished {
            token,
            result: Err(ServiceError::rejected("Server unavailable")),
        });

        assert_eq!(store.messages().len(), 5);
        for s in ["m1", "m2", "m3"] {
            assert!(store.messages().contains(&id(s)));
        }
        assert!(store.inbox().selection().is_empty());
        let notice = last_notice(&store);
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(
            notice.text,
            "Could not archive: Server unavailable. Your changes were undone."
        );
    }

    #[test]
    fn test_bulk_archive_failure_kept_when_applied_permanently() {
        let mut store = store_with(OptimisticPolicy::ApplyPermanently);
        select(&mut store, &["m1", "m2", "m3"]);
        let (token, _, _) = only_mutation(&store.dispatch(Action::ArchiveSelected));

        store.apply(Event::MutationFinished {
            token,
            result: Err(ServiceError::rejected("Server unavailable")),
        });

        assert_eq!(store.messages().len(), 2);
        assert_eq!(last_notice(&store).level, NoticeLevel::Error);
    }

    #[test]
    fn test_archive_prunes_detail_pane() {
        let mut store = store_with(OptimisticPolicy::RollbackOnFailure);
        store.dispatch(Action::SelectMessage { id: Some(id("m2")) });
        store.dispatch(Action::Archive { id: id("m2") });
        assert_eq!(store.inbox().selected_message(), None);
    }

    #[test]
    fn test_toggle_unloaded_id_is_ignored() {
        let mut store = store_with(OptimisticPolicy::RollbackOnFailure);
        store.dispatch(Action::ToggleMessageSelection { id: id("ghost") });
        assert!(store.inbox().selection().is_empty());
        assert!(!store.inbox().is_multi_select());
    }

    #[test]
    fn test_opening_unread_message_marks_it_read() {
        let mut store = store_with(OptimisticPolicy::RollbackOnFailure);
        let effects = store.dispatch(Action::ActivateMessage { id: id("m1") });
        let (_, kind, ids) = only_mutation(&effects);
        assert_eq!(kind, MutationKind::MarkRead(true));
        assert_eq!(ids, vec![id("m1")]);
        assert_eq!(store.messages().get(&id("m1")).unwrap().status, ReadStatus::Read);

        store.dispatch(Action::SelectMessage { id: None });
        assert!(store.dispatch(Action::SelectMessage { id: Some(id("m1")) }).is_empty());
    }

    #[test]
    fn test_activate_in_multi_select_toggles() {
        let mut store = store_with(OptimisticPolicy::RollbackOnFailure);
        store.dispatch(Action::ToggleMultiSelectMode);
        let effects = store.dispatch(Action::ActivateMessage { id: id("m1") });
        assert!(effects.is_empty());
        assert!(store.inbox().is_selected(&id("m1")));
        assert_eq!(store.inbox().selected_message(), None);
    }

    #[test]
    fn test_toggle_star_flips_current_value() {
        let mut store = store_with(OptimisticPolicy::RollbackOnFailure);
        let (_, kind, _) = only_mutation(&store.dispatch(Action::ToggleStar { id: id("m4") }));
        assert_eq!(kind, MutationKind::Star(true));
        let (_, kind, _) = only_mutation(&store.dispatch(Action::ToggleStar { id: id("m4") }));
        assert_eq!(kind, MutationKind::Star(false));
    }

    #[test]
    fn test_select_all_visible_respects_folder() {
        let mut store = store_with(OptimisticPolicy::RollbackOnFailure);
        store.dispatch(Action::SelectAllVisible);
        assert_eq!(store.inbox().selection().len(), 5);

        store.dispatch(Action::SetActiveFolder {
            folder: Folder::Sent,
        });
        store.dispatch(Action::SelectAllVisible);
        assert!(store.inbox().selection().is_empty());
    }

    #[test]
    fn test_set_active_folder_navigates() {
        let mut store = Store::default();
        let effects = store.dispatch(Action::SetActiveFolder {
            folder: Folder::Archive,
        });
        assert_eq!(
            effects,
            vec![Effect::Navigate {
                location: Location::Mailbox {
                    route: Route::folder(Folder::Archive)
                }
            }]
        );
    }

    #[test]
    fn test_apply_route_sets_folder_and_label_without_effects() {
        let mut store = Store::default();
        let effects = store.dispatch(Action::ApplyRoute {
            route: Route::parse("?folder=sent&label=urgent"),
        });
        assert!(effects.is_empty());
        assert_eq!(store.inbox().active_folder(), Folder::Sent);
        assert_eq!(store.inbox().active_label(), Some("urgent"));
    }

    #[test]
    fn test_sync_is_guarded() {
        let mut store = Store::default();
        assert_eq!(store.dispatch(Action::Sync), vec![Effect::Sync]);
        assert!(store.dispatch(Action::Sync).is_empty());
        assert!(store.is_syncing());

        let at = Utc::now();
        store.apply(Event::SyncFinished { result: Ok(()), at });
        assert!(!store.is_syncing());
        assert_eq!(store.last_synced_at(), Some(at));
        assert_eq!(store.dispatch(Action::Sync), vec![Effect::Sync]);
    }

    #[test]
    fn test_sync_failure_posts_notice() {
        let mut store = Store::default();
        store.dispatch(Action::Sync);
        store.apply(Event::SyncFinished {
            result: Err(ServiceError::Unexpected("boom".into())),
            at: Utc::now(),
        });
        assert!(!store.is_syncing());
        assert_eq!(store.last_synced_at(), None);
        assert_eq!(
            last_notice(&store).text,
            "Sync failed: Something went wrong. Please try again."
        );
    }

    #[test]
    fn test_reply_uses_loaded_original() {
        let mut store = store_with(OptimisticPolicy::RollbackOnFailure);
        store.dispatch(Action::OpenCompose {
            options: ComposeOptions::reply(id("m2")),
        });
        let draft = store.compose().draft().unwrap();
        assert_eq!(draft.mode, ComposeMode::Reply);
        assert_eq!(draft.subject, "Re: Subject m2");
        assert_eq!(draft.to[0].email, "m2@example.com");
        assert_eq!(draft.reply_to_thread_id, Some(ThreadId("t-m2".into())));
    }

    #[test]
    fn test_discard_flow_opens_pending_request() {
        let mut store = Store::default();
        store.dispatch(Action::OpenCompose {
            options: ComposeOptions::new_message(),
        });
        store.dispatch(Action::SetBody {
            body: "half written".into(),
        });

        store.dispatch(Action::OpenCompose {
            options: ComposeOptions {
                subject: Some("Second".into()),
                ..ComposeOptions::default()
            },
        });
        assert_eq!(store.ui().modal(), Some(Modal::DiscardDraft));
        assert_eq!(store.compose().draft().unwrap().body, "half written");

        store.dispatch(Action::ConfirmDiscard);
        assert_eq!(store.ui().modal(), None);
        let draft = store.compose().draft().unwrap();
        assert_eq!(draft.subject, "Second");
        assert!(draft.body.is_empty());
    }

    #[test]
    fn test_cancel_modal_keeps_draft() {
        let mut store = Store::default();
        store.dispatch(Action::OpenCompose {
            options: ComposeOptions::new_message(),
        });
        store.dispatch(Action::SetSubject {
            subject: "Keep me".into(),
        });
        store.dispatch(Action::CloseCompose {
            requires_confirmation: true,
        });
        assert_eq!(store.ui().modal(), Some(Modal::DiscardDraft));

        store.dispatch(Action::CancelModal);
        assert_eq!(store.ui().modal(), None);
        assert_eq!(store.compose().draft().unwrap().subject, "Keep me");

        store.dispatch(Action::CloseCompose {
            requires_confirmation: true,
        });
        store.dispatch(Action::ConfirmDiscard);
        assert!(!store.compose().is_open());
    }

    #[test]
    fn test_closed_draft_forgets_pending_compose_request() {
        let mut store = Store::default();
        store.dispatch(Action::OpenCompose {
            options: ComposeOptions::new_message(),
        });
        store.dispatch(Action::SetBody {
            body: "half written".into(),
        });
        store.dispatch(Action::OpenCompose {
            options: ComposeOptions {
                subject: Some("Stale".into()),
                ..ComposeOptions::default()
            },
        });
        assert_eq!(store.ui().modal(), Some(Modal::DiscardDraft));

        store.dispatch(Action::CloseCompose {
            requires_confirmation: false,
        });
        assert_eq!(store.ui().modal(), None);
        assert!(store.pending_open.is_none());

        store.dispatch(Action::OpenModal {
            modal: Modal::DiscardDraft,
        });
        assert_eq!(store.ui().modal(), None);

        store.dispatch(Action::OpenCompose {
            options: ComposeOptions::new_message(),
        });
        store.dispatch(Action::SetBody { body: "x".into() });
        store.dispatch(Action::CloseCompose {
            requires_confirmation: true,
        });
        store.dispatch(Action::ConfirmDiscard);
        assert!(!store.compose().is_open(), "no stale request is reopened");
    }

    #[test]
    fn test_replace_policy_never_asks() {
        let settings = Settings {
            open_policy: OpenPolicy::Replace,
            ..Settings::default()
        };
        let mut store = Store::new(&settings, &session());
        store.dispatch(Action::OpenCompose {
            options: ComposeOptions::new_message(),
        });
        store.dispatch(Action::SetBody { body: "x".into() });
        store.dispatch(Action::OpenCompose {
            options: ComposeOptions::new_message(),
        });
        assert_eq!(store.ui().modal(), None);
        assert!(!store.compose().has_unsaved_content());
    }

    #[test]
    fn test_send_with_empty_to_emits_nothing() {
        let mut store = Store::default();
        store.dispatch(Action::OpenCompose {
            options: ComposeOptions::new_message(),
        });
        store.dispatch(Action::SetSubject {
            subject: "Hi".into(),
        });

        assert!(store.dispatch(Action::Send).is_empty());
        let active = store.compose().active().unwrap();
        assert_eq!(active.errors, vec![ValidationError::MissingRecipient]);
    }

    #[test]
    fn test_send_uses_session_connection_and_closes_on_success() {
        let mut store = store_with(OptimisticPolicy::RollbackOnFailure);
        store.dispatch(Action::OpenCompose {
            options: ComposeOptions::new_message(),
        });
        store.dispatch(Action::AddRecipient {
            field: RecipientField::To,
            recipient: Address::new("bob@x.com"),
        });
        store.dispatch(Action::SetSubject {
            subject: "Hi".into(),
        });

        let effects = store.dispatch(Action::Send);
        let [Effect::SendMessage { token, payload }] = effects.as_slice() else {
            panic!("expected a send, got {effects:?}");
        };
        assert_eq!(payload.connection_id.as_deref(), Some("conn-1"));
        assert!(store.snapshot().compose.is_pending);

        store.apply(Event::SendFinished {
            token: *token,
            result: Ok(SentMessage {
                id: id("sent-1"),
                thread_id: ThreadId("t".into()),
            }),
        });
        assert!(!store.compose().is_open());
        assert_eq!(last_notice(&store).text, "Message sent");
    }

    #[test]
    fn test_stale_ai_result_is_dropped() {
        let mut store = Store::default();
        store.dispatch(Action::OpenCompose {
            options: ComposeOptions::new_message(),
        });
        let casual = store.dispatch(Action::RequestAiSuggestion {
            message_id: id("m1"),
            tone: Tone::Casual,
        });
        let formal = store.dispatch(Action::RequestAiSuggestion {
            message_id: id("m1"),
            tone: Tone::Formal,
        });
        let token = |effects: &[Effect]| match effects {
            [Effect::RequestAi { token, .. }] => *token,
            other => panic!("expected AI request, got {other:?}"),
        };

        store.apply(Event::AiFinished {
            token: token(&formal),
            result: Ok("Dear Sir".into()),
        });
        store.apply(Event::AiFinished {
            token: token(&casual),
            result: Ok("hey".into()),
        });

        let ai = &store.compose().active().unwrap().ai;
        assert_eq!(ai.suggestion.as_deref(), Some("Dear Sir"));
    }

    #[test]
    fn test_palette_toggle_resets_and_enter_runs() {
        let mut store = Store::default();
        store.dispatch(Action::TogglePalette);
        store.dispatch(Action::SetPaletteQuery {
            query: "trash".into(),
        });
        let effects = store.dispatch(Action::PaletteKey {
            key: PaletteKey::Enter,
        });

        assert!(!store.ui().command_palette_open);
        assert_eq!(store.inbox().active_folder(), Folder::Trash);
        assert_eq!(effects.len(), 1);

        store.dispatch(Action::TogglePalette);
        assert!(store.ui().command_palette_open);
        assert_eq!(store.palette().query(), "");
        assert_eq!(store.palette().selected_index(), 0);
    }

    #[test]
    fn test_palette_keys_ignored_while_closed() {
        let mut store = store_with(OptimisticPolicy::RollbackOnFailure);
        assert!(!store.ui().command_palette_open);

        for key in [PaletteKey::ArrowDown, PaletteKey::Enter, PaletteKey::Escape] {
            assert!(store.dispatch(Action::PaletteKey { key }).is_empty());
        }

        assert!(!store.compose().is_open());
        assert!(!store.ui().command_palette_open);
        assert_eq!(store.palette().selected_index(), 0);
        assert_eq!(store.inbox().active_folder(), Folder::Inbox);
        assert!(store.ui().notices().is_empty());
    }

    #[test]
    fn test_run_command_theme_persists() {
        let mut store = Store::default();
        let effects = store.dispatch(Action::RunCommand {
            id: "theme-light".into(),
        });
        assert_eq!(store.ui().theme, ThemeMode::Light);
        assert_eq!(
            effects,
            vec![Effect::PersistTheme {
                theme: ThemeMode::Light
            }]
        );
        assert!(effects[0].is_host());
        assert!(store.dispatch(Action::RunCommand { id: "nope".into() }).is_empty());
    }

    #[test]
    fn test_sign_out_closes_draft_and_selection() {
        let mut store = store_with(OptimisticPolicy::RollbackOnFailure);
        select(&mut store, &["m1"]);
        store.dispatch(Action::OpenCompose {
            options: ComposeOptions::new_message(),
        });
        store.dispatch(Action::SetBody { body: "x".into() });

        let effects = store.dispatch(Action::RunCommand {
            id: "logout".into(),
        });

        assert_eq!(effects, vec![Effect::SignOut]);
        assert!(!store.compose().is_open());
        assert!(store.inbox().selection().is_empty());
        assert!(store.session().is_none());
    }

    #[test]
    fn test_action_json_shape() {
        let action: Action =
            serde_json::from_str(r#"{"type":"set_active_folder","folder":"archive"}"#).unwrap();
        assert_eq!(
            action,
            Action::SetActiveFolder {
                folder: Folder::Archive
            }
        );
        let action: Action = serde_json::from_str(r#"{"type":"open_compose"}"#).unwrap();
        assert_eq!(
            action,
            Action::OpenCompose {
                options: ComposeOptions::default()
            }
        );
    }

    #[test]
    fn test_snapshot_serialises() {
        let store = store_with(OptimisticPolicy::RollbackOnFailure);
        let json = serde_json::to_value(store.snapshot()).unwrap();
        assert_eq!(json["visible"].as_array().unwrap().len(), 5);
        assert_eq!(json["compose"]["window"], "closed");
        assert_eq!(json["palette"]["results"][0]["id"], "compose");
    }
}
