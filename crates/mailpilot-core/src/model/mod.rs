//! Data models shared by the state components.

mod draft;
mod filter;
mod message;

pub use draft::{
    ComposeMode, Draft, OutgoingMessage, RecipientField, SentMessage, Tone, prefixed_subject,
};
pub use filter::{Filter, FilterType, Sort, SortField, SortOrder};
pub use message::{
    Address, Attachment, Category, Folder, Label, Message, MessageId, Priority, ReadStatus,
    ThreadId,
};
