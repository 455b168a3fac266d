//! Filter and sort models for the message list.

use serde::{Deserialize, Serialize};

use super::{Category, Message, Priority, ReadStatus};

/// Dimension a filter constrains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    /// Read/unread.
    Status,
    /// Message priority.
    Priority,
    /// Message category.
    Category,
    /// Presence of something (`attachment`, `label`).
    Has,
}

impl FilterType {
    /// Convert to the id prefix representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Priority => "priority",
            Self::Category => "category",
            Self::Has => "has",
        }
    }
}

/// An active list filter.
///
/// Identity is the `id`, derived as `{type}-{value}`; two filters with the
/// same type and value are the same filter whatever their label says.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FilterSpec")]
pub struct Filter {
    /// Derived identifier.
    pub id: String,
    /// Dimension.
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    /// Value within the dimension.
    pub value: String,
    /// Display label.
    pub label: String,
}

/// Wire form of a filter; the id is always recomputed.
#[derive(Deserialize)]
struct FilterSpec {
    #[serde(rename = "type")]
    filter_type: FilterType,
    value: String,
    #[serde(default)]
    label: Option<String>,
}

impl From<FilterSpec> for Filter {
    fn from(spec: FilterSpec) -> Self {
        let label = spec.label.unwrap_or_else(|| spec.value.clone());
        Self::new(spec.filter_type, spec.value, label)
    }
}

impl Filter {
    /// Creates a filter, deriving its id.
    pub fn new(filter_type: FilterType, value: impl Into<String>, label: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            id: Self::make_id(filter_type, &value),
            filter_type,
            value,
            label: label.into(),
        }
    }

    /// Builds the id for a `(type, value)` pair.
    #[must_use]
    pub fn make_id(filter_type: FilterType, value: &str) -> String {
        format!("{}-{value}", filter_type.as_str())
    }

    /// Returns true if the message satisfies this filter.
    #[must_use]
    pub fn matches(&self, message: &Message) -> bool {
        match self.filter_type {
            FilterType::Status => {
                ReadStatus::parse(&self.value).is_some_and(|status| message.status == status)
            }
            FilterType::Priority => {
                Priority::parse(&self.value).is_some_and(|priority| message.priority == priority)
            }
            FilterType::Category => Category::parse(&self.value) == message.category,
            FilterType::Has => match self.value.to_lowercase().as_str() {
                "attachment" | "attachments" => !message.attachments.is_empty(),
                "label" | "labels" => !message.labels.is_empty(),
                _ => false,
            },
        }
    }
}

/// Field the message list is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    /// Received timestamp.
    #[default]
    ReceivedAt,
    /// Priority rank.
    Priority,
    /// Sender display name.
    From,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Smallest first.
    Asc,
    /// Largest first.
    #[default]
    Desc,
}

/// The single active sort. Defaults to newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Sort {
    /// Field to order by.
    pub field: SortField,
    /// Direction.
    pub order: SortOrder,
}

impl Sort {
    /// Creates a sort.
    #[must_use]
    pub const fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }

    /// Compares two messages under this sort.
    #[must_use]
    pub fn compare(&self, a: &Message, b: &Message) -> std::cmp::Ordering {
        let ordering = match self.field {
            SortField::ReceivedAt => a.received_at.cmp(&b.received_at),
            SortField::Priority => a.priority.rank().cmp(&b.priority.rank()),
            SortField::From => sender_key(a).cmp(&sender_key(b)),
        };
        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

fn sender_key(message: &Message) -> String {
    message
        .sender()
        .map(|addr| addr.display().to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_id_is_type_and_value() {
        let filter = Filter::new(FilterType::Priority, "urgent", "Urgent");
        assert_eq!(filter.id, "priority-urgent");
    }

    #[test]
    fn test_filter_deserialize_recomputes_id() {
        let filter: Filter =
            serde_json::from_str(r#"{"id":"bogus","type":"status","value":"unread"}"#).unwrap();
        assert_eq!(filter.id, "status-unread");
        assert_eq!(filter.label, "unread");
    }

    #[test]
    fn test_default_sort_is_newest_first() {
        let sort = Sort::default();
        assert_eq!(sort.field, SortField::ReceivedAt);
        assert_eq!(sort.order, SortOrder::Desc);
    }
}
