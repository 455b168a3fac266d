//! Message data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique, stable identifier for a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    /// Creates a message id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Identifier of the conversation a message belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(pub String);

/// Coarse mailbox partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Folder {
    /// Inbox.
    #[default]
    Inbox,
    /// Sent messages.
    Sent,
    /// Drafts.
    Drafts,
    /// Starred messages.
    Starred,
    /// Archive.
    Archive,
    /// Trash/Deleted.
    Trash,
}

impl Folder {
    /// All folders in sidebar order.
    pub const ALL: [Self; 6] = [
        Self::Inbox,
        Self::Sent,
        Self::Drafts,
        Self::Starred,
        Self::Archive,
        Self::Trash,
    ];

    /// Parse from the URL query representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "inbox" => Some(Self::Inbox),
            "sent" => Some(Self::Sent),
            "drafts" => Some(Self::Drafts),
            "starred" => Some(Self::Starred),
            "archive" => Some(Self::Archive),
            "trash" => Some(Self::Trash),
            _ => None,
        }
    }

    /// Convert to the URL query representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inbox => "inbox",
            Self::Sent => "sent",
            Self::Drafts => "drafts",
            Self::Starred => "starred",
            Self::Archive => "archive",
            Self::Trash => "trash",
        }
    }

    /// Human-readable display name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Inbox => "Inbox",
            Self::Sent => "Sent",
            Self::Drafts => "Drafts",
            Self::Starred => "Starred",
            Self::Archive => "Archive",
            Self::Trash => "Trash",
        }
    }
}

/// Read status of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadStatus {
    /// Opened at least once.
    Read,
    /// Never opened.
    #[default]
    Unread,
}

impl ReadStatus {
    /// Parse from filter value representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "read" => Some(Self::Read),
            "unread" => Some(Self::Unread),
            _ => None,
        }
    }
}

/// Priority assigned by the summarization service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Needs attention now.
    Urgent,
    /// Important.
    High,
    /// Regular mail.
    #[default]
    Normal,
    /// Can wait.
    Low,
}

impl Priority {
    /// Parse from filter value representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "urgent" => Some(Self::Urgent),
            "high" => Some(Self::High),
            "normal" => Some(Self::Normal),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    /// Sort rank, higher is more important.
    #[must_use]
    pub const fn rank(&self) -> u8 {
        match self {
            Self::Urgent => 3,
            Self::High => 2,
            Self::Normal => 1,
            Self::Low => 0,
        }
    }
}

/// Category assigned by the summarization service.
///
/// The service may invent categories beyond the well-known ones; those are
/// kept verbatim in [`Category::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Waiting on a reply from the user.
    NeedsReply,
    /// For your information.
    #[default]
    Fyi,
    /// Newsletter or subscription.
    Newsletter,
    /// Marketing mail.
    Promotional,
    /// Any other service-assigned category.
    Other(String),
}

impl Category {
    /// Parse from filter value representation.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "needs_reply" | "needs-reply" => Self::NeedsReply,
            "fyi" => Self::Fyi,
            "newsletter" => Self::Newsletter,
            "promotional" => Self::Promotional,
            other => Self::Other(other.to_string()),
        }
    }
}

/// A label attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Stable label id.
    pub label_id: String,
    /// Display name.
    pub label_name: String,
    /// Display color (CSS color string).
    pub label_color: String,
}

impl Label {
    /// Returns true if this label matches a name or id, ignoring case.
    #[must_use]
    pub fn matches(&self, name_or_id: &str) -> bool {
        self.label_id.eq_ignore_ascii_case(name_or_id)
            || self.label_name.eq_ignore_ascii_case(name_or_id)
    }
}

/// An email address with optional display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Email address.
    pub email: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Address {
    /// Creates an address without a display name.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    /// Creates an address with a display name.
    pub fn named(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: Some(name.into()),
        }
    }

    /// Returns true if both addresses refer to the same mailbox.
    #[must_use]
    pub fn same_mailbox(&self, email: &str) -> bool {
        self.email.trim().eq_ignore_ascii_case(email.trim())
    }

    /// Display name, falling back to the email address.
    #[must_use]
    pub fn display(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

/// Attachment metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// File name.
    pub filename: String,
    /// MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub size: u64,
}

/// A message in the loaded list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier.
    pub id: MessageId,
    /// Conversation this message belongs to.
    pub thread_id: ThreadId,
    /// Folder containing this message.
    pub folder: Folder,
    /// Read status.
    pub status: ReadStatus,
    /// Whether the message is starred.
    pub is_starred: bool,
    /// Service-assigned priority.
    pub priority: Priority,
    /// Service-assigned category.
    pub category: Category,
    /// Labels in display order.
    #[serde(default)]
    pub labels: Vec<Label>,
    /// Attachments.
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Senders.
    pub from: Vec<Address>,
    /// Recipients.
    #[serde(default)]
    pub to: Vec<Address>,
    /// CC recipients.
    #[serde(default)]
    pub cc: Vec<Address>,
    /// BCC recipients.
    #[serde(default)]
    pub bcc: Vec<Address>,
    /// Subject line.
    pub subject: String,
    /// Short preview of message content.
    #[serde(default)]
    pub snippet: String,
    /// AI-generated summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// When the message was received.
    pub received_at: DateTime<Utc>,
}

impl Message {
    /// Returns true if the message has been read.
    #[must_use]
    pub fn is_read(&self) -> bool {
        self.status == ReadStatus::Read
    }

    /// Primary sender, if any.
    #[must_use]
    pub fn sender(&self) -> Option<&Address> {
        self.from.first()
    }

    /// Returns true if the message belongs in the given folder view.
    ///
    /// The starred folder is a view over every starred message.
    #[must_use]
    pub fn in_folder(&self, folder: Folder) -> bool {
        match folder {
            Folder::Starred => self.is_starred || self.folder == Folder::Starred,
            other => self.folder == other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_roundtrip() {
        for folder in Folder::ALL {
            assert_eq!(Folder::parse(folder.as_str()), Some(folder));
        }
        assert_eq!(Folder::parse("INBOX"), Some(Folder::Inbox));
        assert_eq!(Folder::parse("spam"), None);
    }

    #[test]
    fn test_priority_rank_order() {
        assert!(Priority::Urgent.rank() > Priority::High.rank());
        assert!(Priority::High.rank() > Priority::Normal.rank());
        assert!(Priority::Normal.rank() > Priority::Low.rank());
    }

    #[test]
    fn test_category_parse_keeps_unknown() {
        assert_eq!(Category::parse("needs-reply"), Category::NeedsReply);
        assert_eq!(Category::parse("Receipts"), Category::Other("receipts".into()));
    }

    #[test]
    fn test_address_same_mailbox_ignores_case() {
        let addr = Address::named("Alice@Example.com", "Alice");
        assert!(addr.same_mailbox("alice@example.com "));
        assert_eq!(addr.display(), "Alice");
        assert_eq!(Address::new("bob@example.com").display(), "bob@example.com");
    }
}
