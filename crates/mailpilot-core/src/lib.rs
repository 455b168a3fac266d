//! # mailpilot-core
//!
//! Client-side interaction core for the `MailPilot` email client.
//!
//! This crate provides:
//! - Inbox view state: folder, label, search, filters, sort and selection
//! - The compose window and draft lifecycle, including AI reply suggestions
//! - The command registry and keyboard-driven command palette
//! - Optimistic message mutations with configurable rollback
//! - A single-entry [`Store`] and a tokio [`Runtime`] that executes its effects
//!
//! Remote work goes through the [`MutationGateway`] and
//! [`AiSuggestionService`] contracts, which the host implements.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod compose;
mod error;
pub mod gateway;
pub mod inbox;
pub mod message_list;
pub mod model;
pub mod mutation;
pub mod route;
pub mod runtime;
pub mod settings;
pub mod store;
pub mod ui;

pub use command::{Command, CommandCategory, CommandPalette, CommandRegistry, PaletteKey};
pub use compose::{ComposeOptions, ComposeState, DraftId, OpenPolicy, RequestToken, WindowMode};
pub use error::{Error, Result, ServiceError, ValidationError};
pub use gateway::{AiSuggestionService, MutationGateway, Session, SessionProvider};
pub use inbox::InboxState;
pub use message_list::MessageList;
pub use model::{
    Address, ComposeMode, Draft, Filter, FilterType, Folder, Message, MessageId, OutgoingMessage,
    RecipientField, SentMessage, Sort, SortField, SortOrder, Tone,
};
pub use mutation::{MutationKind, MutationOrchestrator, MutationToken, OptimisticPolicy};
pub use route::{Location, Route, SettingsPage};
pub use runtime::Runtime;
pub use settings::Settings;
pub use store::{Action, Effect, Event, Store, StoreSnapshot};
pub use ui::{Modal, Notice, NoticeLevel, SidebarView, ThemeMode, UiState};
