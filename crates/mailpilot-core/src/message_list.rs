//! The loaded message collection.
//!
//! Owned by the list-loading side of the application. The interaction core
//! only reads it, except for optimistic patches that the mutation
//! orchestrator applies and reconciles.

use std::collections::HashMap;

use crate::inbox::InboxState;
use crate::model::{Filter, FilterType, Folder, Message, MessageId, ReadStatus};

/// A message removed from the list, with the position it had.
#[derive(Debug, Clone)]
pub struct Removed {
    /// Index in the list at removal time.
    pub index: usize,
    /// The removed message.
    pub message: Message,
}

/// Messages in load order.
#[derive(Debug, Clone, Default)]
pub struct MessageList {
    messages: Vec<Message>,
}

impl MessageList {
    /// Creates a list from loaded messages. Later duplicates of an id are dropped.
    #[must_use]
    pub fn new(messages: Vec<Message>) -> Self {
        let mut list = Self::default();
        list.replace(messages);
        list
    }

    /// Replaces the whole collection.
    pub fn replace(&mut self, messages: Vec<Message>) {
        let mut seen = std::collections::HashSet::new();
        self.messages = messages
            .into_iter()
            .filter(|m| seen.insert(m.id.clone()))
            .collect();
    }

    /// All loaded messages.
    #[must_use]
    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    /// Number of loaded messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if nothing is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns true if a message with this id is loaded.
    #[must_use]
    pub fn contains(&self, id: &MessageId) -> bool {
        self.messages.iter().any(|m| &m.id == id)
    }

    /// Looks up a message.
    #[must_use]
    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| &m.id == id)
    }

    /// Looks up a message for patching.
    pub fn get_mut(&mut self, id: &MessageId) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| &m.id == id)
    }

    /// Removes the given ids, returning what was removed in list order.
    pub fn remove(&mut self, ids: &[MessageId]) -> Vec<Removed> {
        let mut removed = Vec::new();
        let mut index = 0;
        self.messages.retain(|m| {
            let keep = !ids.contains(&m.id);
            if !keep {
                removed.push(Removed {
                    index: index + removed.len(),
                    message: m.clone(),
                });
            }
            if keep {
                index += 1;
            }
            keep
        });
        removed
    }

    /// Puts removed messages back at their old positions.
    ///
    /// Entries whose id has been loaded again in the meantime are skipped.
    pub fn restore(&mut self, mut removed: Vec<Removed>) {
        removed.sort_by_key(|r| r.index);
        for entry in removed {
            if self.contains(&entry.message.id) {
                continue;
            }
            let index = entry.index.min(self.messages.len());
            self.messages.insert(index, entry.message);
        }
    }

    /// Messages visible under the current inbox state, sorted.
    #[must_use]
    pub fn visible(&self, inbox: &InboxState) -> Vec<&Message> {
        let query = inbox.search_query().trim().to_lowercase();
        let groups = group_filters(inbox.filters());

        let mut visible: Vec<&Message> = self
            .messages
            .iter()
            .filter(|m| m.in_folder(inbox.active_folder()))
            .filter(|m| {
                inbox
                    .active_label()
                    .is_none_or(|label| m.labels.iter().any(|l| l.matches(label)))
            })
            .filter(|m| query.is_empty() || matches_query(m, &query))
            .filter(|m| {
                groups
                    .values()
                    .all(|group| group.iter().any(|f| f.matches(m)))
            })
            .collect();

        let sort = inbox.sort();
        // Stable sort keeps load order among equal keys.
        visible.sort_by(|a, b| sort.compare(a, b));
        visible
    }

    /// Ids visible under the current inbox state, in display order.
    #[must_use]
    pub fn visible_ids(&self, inbox: &InboxState) -> Vec<MessageId> {
        self.visible(inbox).into_iter().map(|m| m.id.clone()).collect()
    }

    /// Unread message count for a folder.
    #[must_use]
    pub fn unread_count(&self, folder: Folder) -> usize {
        self.messages
            .iter()
            .filter(|m| m.in_folder(folder) && m.status == ReadStatus::Unread)
            .count()
    }
}

/// Filters of the same type are alternatives; different types must all hold.
fn group_filters(filters: &[Filter]) -> HashMap<FilterType, Vec<&Filter>> {
    let mut groups: HashMap<FilterType, Vec<&Filter>> = HashMap::new();
    for filter in filters {
        groups.entry(filter.filter_type).or_default().push(filter);
    }
    groups
}

fn matches_query(message: &Message, query: &str) -> bool {
    let contains = |s: &str| s.to_lowercase().contains(query);
    contains(&message.subject)
        || contains(&message.snippet)
        || message.summary.as_deref().is_some_and(contains)
        || message.from.iter().any(|addr| {
            contains(&addr.email) || addr.name.as_deref().is_some_and(contains)
        })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{TimeZone, Utc};

    use crate::model::{
        Address, Attachment, Category, Folder, Label, Message, MessageId, Priority, ReadStatus,
        ThreadId,
    };

    /// Builds a message received `minute` minutes after a fixed epoch.
    pub fn message(id: &str, minute: u32) -> Message {
        Message {
            id: MessageId::new(id),
            thread_id: ThreadId(format!("t-{id}")),
            folder: Folder::Inbox,
            status: ReadStatus::Unread,
            is_starred: false,
            priority: Priority::Normal,
            category: Category::Fyi,
            labels: Vec::new(),
            attachments: Vec::new(),
            from: vec![Address::named(format!("{id}@example.com"), format!("Sender {id}"))],
            to: vec![Address::new("me@example.com")],
            cc: Vec::new(),
            bcc: Vec::new(),
            subject: format!("Subject {id}"),
            snippet: String::new(),
            summary: None,
            received_at: Utc
                .with_ymd_and_hms(2026, 1, 8, 9, minute, 0)
                .single()
                .unwrap_or_default(),
        }
    }

    pub fn label(name: &str) -> Label {
        Label {
            label_id: format!("lbl-{name}"),
            label_name: name.to_string(),
            label_color: "#ff0000".to_string(),
        }
    }

    pub fn attachment() -> Attachment {
        Attachment {
            filename: "invoice.pdf".into(),
            mime_type: "application/pdf".into(),
            size: 2048,
        }
    }
}
