//! Cross-cutting interface state: palette visibility, modals, sidebar,
//! theme and notices.

use serde::{Deserialize, Serialize};

/// Theme mode (light or dark).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeMode {
    /// Light theme.
    Light,
    /// Dark theme.
    #[default]
    Dark,
    /// Follow the operating system.
    System,
}

/// Sidebar display mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SidebarView {
    /// Full width with labels.
    #[default]
    Default,
    /// Icons only.
    Collapsed,
}

/// Modal dialogs the core can ask the front end to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modal {
    /// "Discard current draft?" confirmation.
    DiscardDraft,
    /// Keyboard shortcut reference.
    KeyboardShortcuts,
}

/// Severity of a notice banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    /// Confirmation of a finished operation.
    Info,
    /// A failed operation.
    Error,
}

/// Dismissable banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Identifier used to dismiss.
    pub id: u64,
    /// Severity.
    pub level: NoticeLevel,
    /// User-facing text.
    pub text: String,
}

/// Most banners kept at once; posting another drops the oldest.
pub const MAX_NOTICES: usize = 5;

/// Transient interface state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UiState {
    /// Whether the command palette is visible.
    pub command_palette_open: bool,
    /// Modal stack; the last entry is on top.
    modals: Vec<Modal>,
    /// Sidebar display mode.
    pub sidebar_view: SidebarView,
    /// Whether the mobile drawer is visible.
    pub mobile_sidebar_open: bool,
    /// Active theme.
    pub theme: ThemeMode,
    notices: Vec<Notice>,
    #[serde(skip)]
    next_notice: u64,
}

impl UiState {
    /// Creates UI state with the given theme.
    #[must_use]
    pub fn new(theme: ThemeMode) -> Self {
        Self {
            theme,
            ..Self::default()
        }
    }

    /// Top-most modal.
    #[must_use]
    pub fn modal(&self) -> Option<Modal> {
        self.modals.last().copied()
    }

    /// Shows a modal above the current one. A modal already on top is not
    /// pushed twice.
    pub fn push_modal(&mut self, modal: Modal) {
        if self.modal() != Some(modal) {
            self.modals.push(modal);
        }
    }

    /// Closes the top-most modal.
    pub fn pop_modal(&mut self) -> Option<Modal> {
        self.modals.pop()
    }

    /// Removes every instance of a modal from the stack.
    pub fn dismiss_modal(&mut self, modal: Modal) {
        self.modals.retain(|m| *m != modal);
    }

    /// Toggles between the full and collapsed sidebar.
    pub const fn toggle_sidebar(&mut self) {
        self.sidebar_view = match self.sidebar_view {
            SidebarView::Default => SidebarView::Collapsed,
            SidebarView::Collapsed => SidebarView::Default,
        };
    }

    /// Shows or hides the mobile drawer.
    pub const fn set_mobile_sidebar(&mut self, open: bool) {
        self.mobile_sidebar_open = open;
    }

    /// Posts a banner and returns its id.
    ///
    /// At most [`MAX_NOTICES`] are kept; info banners are dropped before
    /// errors, oldest first.
    pub fn notify(&mut self, level: NoticeLevel, text: impl Into<String>) -> u64 {
        if self.notices.len() >= MAX_NOTICES {
            let oldest = self
                .notices
                .iter()
                .position(|n| n.level == NoticeLevel::Info)
                .unwrap_or(0);
            self.notices.remove(oldest);
        }
        self.next_notice += 1;
        let id = self.next_notice;
        self.notices.push(Notice {
            id,
            level,
            text: text.into(),
        });
        id
    }

    /// Removes a banner. Unknown ids are ignored.
    pub fn dismiss_notice(&mut self, id: u64) {
        self.notices.retain(|n| n.id != id);
    }

    /// Visible banners, oldest first.
    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modal_stack() {
        let mut ui = UiState::default();
        assert_eq!(ui.modal(), None);
        ui.push_modal(Modal::KeyboardShortcuts);
        ui.push_modal(Modal::DiscardDraft);
        ui.push_modal(Modal::DiscardDraft);
        assert_eq!(ui.modal(), Some(Modal::DiscardDraft));
        assert_eq!(ui.pop_modal(), Some(Modal::DiscardDraft));
        assert_eq!(ui.modal(), Some(Modal::KeyboardShortcuts));
    }

    #[test]
    fn test_sidebar_toggle() {
        let mut ui = UiState::default();
        ui.toggle_sidebar();
        assert_eq!(ui.sidebar_view, SidebarView::Collapsed);
        ui.toggle_sidebar();
        assert_eq!(ui.sidebar_view, SidebarView::Default);
    }

    #[test]
    fn test_notices() {
        let mut ui = UiState::default();
        let first = ui.notify(NoticeLevel::Error, "Send failed");
        let second = ui.notify(NoticeLevel::Info, "Sent");
        assert_ne!(first, second);
        ui.dismiss_notice(first);
        ui.dismiss_notice(999);
        assert_eq!(ui.notices().len(), 1);
        assert_eq!(ui.notices()[0].text, "Sent");
    }

    #[test]
    fn test_notices_are_capped() {
        let mut ui = UiState::default();
        ui.notify(NoticeLevel::Error, "error 0");
        ui.notify(NoticeLevel::Info, "Message sent");
        for i in 1..MAX_NOTICES + 3 {
            ui.notify(NoticeLevel::Error, format!("error {i}"));
        }

        assert_eq!(ui.notices().len(), MAX_NOTICES);
        assert!(ui.notices().iter().all(|n| n.level == NoticeLevel::Error));
        let last = ui.notices().last().map(|n| n.text.as_str());
        assert_eq!(last, Some(format!("error {}", MAX_NOTICES + 2).as_str()));
    }
}
