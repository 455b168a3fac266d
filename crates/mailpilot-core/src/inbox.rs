//! Inbox view state: folder, label, search, filters, sort and selection.
//!
//! Every operation is synchronous and total. The state only holds message
//! ids; the messages themselves live in [`crate::MessageList`].

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::model::{Filter, Folder, MessageId, Sort};

/// State of the message list view.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InboxState {
    active_folder: Folder,
    active_label: Option<String>,
    search_query: String,
    filters: Vec<Filter>,
    sort: Sort,
    selected_message: Option<MessageId>,
    selection: BTreeSet<MessageId>,
    multi_select: bool,
}

impl InboxState {
    /// Creates an inbox state with the given sort.
    #[must_use]
    pub fn new(sort: Sort) -> Self {
        Self {
            sort,
            ..Self::default()
        }
    }

    /// Active folder.
    #[must_use]
    pub const fn active_folder(&self) -> Folder {
        self.active_folder
    }

    /// Active label, if any.
    #[must_use]
    pub fn active_label(&self) -> Option<&str> {
        self.active_label.as_deref()
    }

    /// Current search text.
    #[must_use]
    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    /// Active filters in insertion order.
    #[must_use]
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Active sort.
    #[must_use]
    pub const fn sort(&self) -> Sort {
        self.sort
    }

    /// Message open in the detail pane.
    #[must_use]
    pub const fn selected_message(&self) -> Option<&MessageId> {
        self.selected_message.as_ref()
    }

    /// Multi-selected message ids.
    #[must_use]
    pub const fn selection(&self) -> &BTreeSet<MessageId> {
        &self.selection
    }

    /// Whether list items render checkboxes.
    #[must_use]
    pub const fn is_multi_select(&self) -> bool {
        self.multi_select
    }

    /// Returns true if `id` is multi-selected.
    #[must_use]
    pub fn is_selected(&self, id: &MessageId) -> bool {
        self.selection.contains(id)
    }

    /// Switches folder. Clears the label and every kind of selection; the
    /// search query is kept.
    pub fn set_active_folder(&mut self, folder: Folder) {
        self.active_folder = folder;
        self.active_label = None;
        self.selected_message = None;
        self.clear_selection();
    }

    /// Switches label (or clears it). Clears every kind of selection.
    pub fn set_active_label(&mut self, label: Option<String>) {
        self.active_label = label.filter(|l| !l.trim().is_empty());
        self.selected_message = None;
        self.clear_selection();
    }

    /// Updates the search text. A changed query clears the selection.
    pub fn set_search_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        if query != self.search_query {
            self.search_query = query;
            self.clear_selection();
        }
    }

    /// Resets to the unfiltered view.
    pub fn clear_search(&mut self) {
        self.set_search_query(String::new());
    }

    /// Adds a filter. Adding an id that is already active is a no-op.
    ///
    /// Returns true if the filter set changed.
    pub fn add_filter(&mut self, filter: Filter) -> bool {
        if self.filters.iter().any(|f| f.id == filter.id) {
            debug!(id = %filter.id, "filter already active");
            return false;
        }
        self.filters.push(filter);
        self.clear_selection();
        true
    }

    /// Removes a filter by id. Missing ids are a no-op.
    ///
    /// Returns true if the filter set changed.
    pub fn remove_filter(&mut self, id: &str) -> bool {
        let before = self.filters.len();
        self.filters.retain(|f| f.id != id);
        let changed = self.filters.len() != before;
        if changed {
            self.clear_selection();
        }
        changed
    }

    /// Removes every filter.
    pub fn clear_filters(&mut self) {
        if !self.filters.is_empty() {
            self.filters.clear();
            self.clear_selection();
        }
    }

    /// Replaces field and order together.
    pub const fn set_sort(&mut self, sort: Sort) {
        self.sort = sort;
    }

    /// Opens a message in the detail pane, or closes the pane with `None`.
    ///
    /// Does not look at multi-select mode; see [`Self::activate_message`].
    pub fn select_message(&mut self, id: Option<MessageId>) {
        self.selected_message = id;
    }

    /// Routes a click on a list item: toggles its checkbox in multi-select
    /// mode, otherwise opens it.
    ///
    /// Returns true if the message was opened.
    pub fn activate_message(&mut self, id: MessageId) -> bool {
        if self.multi_select {
            self.toggle_message_selection(id);
            false
        } else {
            self.select_message(Some(id));
            true
        }
    }

    /// Flips membership of `id`. A non-empty selection turns multi-select on.
    pub fn toggle_message_selection(&mut self, id: MessageId) {
        if !self.selection.remove(&id) {
            self.selection.insert(id);
        }
        if !self.selection.is_empty() {
            self.multi_select = true;
        }
    }

    /// Selects every id in `ids` and turns multi-select on.
    pub fn select_all<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = MessageId>,
    {
        self.selection.extend(ids);
        self.multi_select = true;
    }

    /// Toggles multi-select mode. Leaving it clears the selection.
    pub fn toggle_multi_select_mode(&mut self) {
        if self.multi_select {
            self.clear_selection();
        } else {
            self.multi_select = true;
        }
    }

    /// Empties the selection and leaves multi-select mode.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.multi_select = false;
    }

    /// Drops selected ids for which `is_loaded` is false, including the
    /// detail pane message.
    pub fn retain_loaded<F>(&mut self, is_loaded: F)
    where
        F: Fn(&MessageId) -> bool,
    {
        self.selection.retain(|id| is_loaded(id));
        if self
            .selected_message
            .as_ref()
            .is_some_and(|id| !is_loaded(id))
        {
            self.selected_message = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FilterType, SortField, SortOrder};
    use proptest::prelude::*;

    fn id(s: &str) -> MessageId {
        MessageId::new(s)
    }

    #[test]
    fn test_folder_change_clears_selection_keeps_search() {
        let mut inbox = InboxState::default();
        inbox.set_search_query("invoice");
        inbox.toggle_message_selection(id("m1"));
        inbox.toggle_message_selection(id("m2"));
        inbox.select_message(Some(id("m1")));
        inbox.set_active_label(Some("urgent".into()));

        inbox.set_active_folder(Folder::Archive);

        assert_eq!(inbox.active_folder(), Folder::Archive);
        assert!(inbox.selection().is_empty());
        assert!(!inbox.is_multi_select());
        assert_eq!(inbox.selected_message(), None);
        assert_eq!(inbox.active_label(), None);
        assert_eq!(inbox.search_query(), "invoice");
    }

    #[test]
    fn test_search_change_clears_selection() {
        let mut inbox = InboxState::default();
        inbox.toggle_message_selection(id("m1"));
        inbox.set_search_query("q");
        assert!(inbox.selection().is_empty());

        inbox.toggle_message_selection(id("m1"));
        inbox.set_search_query("q");
        assert_eq!(inbox.selection().len(), 1, "unchanged query keeps selection");

        inbox.clear_search();
        assert_eq!(inbox.search_query(), "");
        assert!(inbox.selection().is_empty());
    }

    #[test]
    fn test_add_filter_is_idempotent() {
        let mut inbox = InboxState::default();
        assert!(inbox.add_filter(Filter::new(FilterType::Status, "unread", "Unread")));
        assert!(!inbox.add_filter(Filter::new(FilterType::Status, "unread", "Not read")));
        assert_eq!(inbox.filters().len(), 1);
        assert_eq!(inbox.filters()[0].label, "Unread");
    }

    #[test]
    fn test_remove_missing_filter_is_noop() {
        let mut inbox = InboxState::default();
        inbox.add_filter(Filter::new(FilterType::Priority, "high", "High"));
        assert!(!inbox.remove_filter("priority-low"));
        assert!(inbox.remove_filter("priority-high"));
        assert!(inbox.filters().is_empty());
    }

    #[test]
    fn test_set_sort_replaces_both_fields() {
        let mut inbox = InboxState::default();
        inbox.set_sort(Sort::new(SortField::Priority, SortOrder::Asc));
        assert_eq!(inbox.sort(), Sort::new(SortField::Priority, SortOrder::Asc));
    }

    #[test]
    fn test_toggle_selection_enters_multi_select() {
        let mut inbox = InboxState::default();
        inbox.toggle_message_selection(id("m1"));
        assert!(inbox.is_multi_select());
        assert!(inbox.is_selected(&id("m1")));

        inbox.toggle_message_selection(id("m1"));
        assert!(inbox.selection().is_empty());
        assert!(inbox.is_multi_select(), "mode stays until explicitly left");
    }

    #[test]
    fn test_leaving_multi_select_clears_selection() {
        let mut inbox = InboxState::default();
        inbox.toggle_multi_select_mode();
        inbox.toggle_message_selection(id("m1"));
        inbox.toggle_message_selection(id("m2"));

        inbox.toggle_multi_select_mode();

        assert!(!inbox.is_multi_select());
        assert!(inbox.selection().is_empty());
    }

    #[test]
    fn test_activate_message_is_mode_aware() {
        let mut inbox = InboxState::default();
        assert!(inbox.activate_message(id("m1")));
        assert_eq!(inbox.selected_message(), Some(&id("m1")));

        inbox.toggle_multi_select_mode();
        assert!(!inbox.activate_message(id("m2")));
        assert!(inbox.is_selected(&id("m2")));
        assert_eq!(inbox.selected_message(), Some(&id("m1")));
    }

    #[test]
    fn test_retain_loaded_prunes_selection_and_detail() {
        let mut inbox = InboxState::default();
        inbox.select_all([id("m1"), id("m2"), id("m3")]);
        inbox.select_message(Some(id("m2")));

        inbox.retain_loaded(|m| m.as_str() != "m2");

        assert_eq!(inbox.selection().len(), 2);
        assert_eq!(inbox.selected_message(), None);
    }

    #[derive(Debug, Clone)]
    enum FilterOp {
        Add(FilterType, u8),
        Remove(FilterType, u8),
        Clear,
    }

    fn filter_op() -> impl Strategy<Value = FilterOp> {
        let kind = prop_oneof![
            Just(FilterType::Status),
            Just(FilterType::Priority),
            Just(FilterType::Category),
            Just(FilterType::Has),
        ];
        prop_oneof![
            4 => (kind.clone(), 0u8..4).prop_map(|(k, v)| FilterOp::Add(k, v)),
            2 => (kind, 0u8..4).prop_map(|(k, v)| FilterOp::Remove(k, v)),
            1 => Just(FilterOp::Clear),
        ]
    }

    proptest! {
        #[test]
        fn prop_filters_unique_per_type_and_value(ops in prop::collection::vec(filter_op(), 0..64)) {
            let mut inbox = InboxState::default();
            for op in ops {
                match op {
                    FilterOp::Add(kind, v) => {
                        inbox.add_filter(Filter::new(kind, v.to_string(), format!("#{v}")));
                    }
                    FilterOp::Remove(kind, v) => {
                        inbox.remove_filter(&Filter::make_id(kind, &v.to_string()));
                    }
                    FilterOp::Clear => inbox.clear_filters(),
                }
            }
            let mut seen = std::collections::HashSet::new();
            for filter in inbox.filters() {
                prop_assert!(seen.insert((filter.filter_type, filter.value.clone())));
            }
        }

        #[test]
        fn prop_folder_change_always_clears_selection(
            ids in prop::collection::vec("[a-z]{1,4}", 0..16),
            multi in any::<bool>(),
            folder in prop::sample::select(Folder::ALL.to_vec()),
        ) {
            let mut inbox = InboxState::default();
            if multi {
                inbox.toggle_multi_select_mode();
            }
            for raw in ids {
                inbox.toggle_message_selection(MessageId::new(raw));
            }
            inbox.set_active_folder(folder);
            prop_assert!(inbox.selection().is_empty());
            prop_assert!(!inbox.is_multi_select());
        }
    }
}
