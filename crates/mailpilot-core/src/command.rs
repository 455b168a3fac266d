//! Command registry and command palette.
//!
//! The registry is a static, ordered table of named actions. The palette
//! filters it by a text query, groups the result by category and keeps a
//! keyboard cursor into the flattened result.

use serde::{Deserialize, Serialize};

use crate::compose::ComposeOptions;
use crate::model::Folder;
use crate::route::{Location, SettingsPage};
use crate::store::Action;
use crate::ui::ThemeMode;

/// Palette section a command is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandCategory {
    /// Mail actions.
    Actions,
    /// Folder and page navigation.
    Navigation,
    /// Smart labels.
    Labels,
    /// Settings pages.
    Settings,
    /// Appearance.
    Theme,
    /// Session.
    Account,
}

impl CommandCategory {
    /// Heading shown above the group.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Actions => "Actions",
            Self::Navigation => "Navigation",
            Self::Labels => "Labels",
            Self::Settings => "Settings",
            Self::Theme => "Theme",
            Self::Account => "Account",
        }
    }
}

/// An executable palette entry.
#[derive(Debug, Clone)]
pub struct Command {
    /// Stable id, usable by tests and alternate front ends.
    pub id: &'static str,
    /// Title.
    pub title: &'static str,
    /// Secondary line.
    pub subtitle: Option<&'static str>,
    /// Section.
    pub category: CommandCategory,
    /// Extra search terms.
    pub keywords: &'static [&'static str],
    /// Shortcut hint.
    pub shortcut: Option<&'static str>,
    /// What running the command dispatches.
    pub action: Action,
}

impl Command {
    /// Returns true if `query` (already lowercased) occurs in the title,
    /// subtitle, category or keywords.
    fn matches(&self, query: &str) -> bool {
        let mut haystack = String::from(self.title);
        for part in self
            .subtitle
            .into_iter()
            .chain(std::iter::once(self.category.display_name()))
            .chain(self.keywords.iter().copied())
        {
            haystack.push(' ');
            haystack.push_str(part);
        }
        haystack.to_lowercase().contains(query)
    }
}

/// Ordered table of commands.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    commands: Vec<Command>,
}

impl CommandRegistry {
    /// Creates a registry from commands in declaration order.
    #[must_use]
    pub const fn new(commands: Vec<Command>) -> Self {
        Self { commands }
    }

    /// Every command in declaration order.
    #[must_use]
    pub fn all(&self) -> &[Command] {
        &self.commands
    }

    /// Looks up a command by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.id == id)
    }

    /// Case-insensitive substring filter. An empty query returns everything.
    #[must_use]
    pub fn filter(&self, query: &str) -> Vec<&Command> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.commands.iter().collect();
        }
        self.commands.iter().filter(|c| c.matches(&query)).collect()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new(default_commands())
    }
}

fn navigate(folder: Folder) -> Action {
    Action::SetActiveFolder { folder }
}

fn settings(section: SettingsPage) -> Action {
    Action::Navigate {
        location: Location::Settings { section },
    }
}

#[allow(clippy::too_many_lines)] // Flat table reads best as one list
fn default_commands() -> Vec<Command> {
    let folder = |id: &'static str,
                  title: &'static str,
                  folder: Folder,
                  shortcut: Option<&'static str>| Command {
        id,
        title,
        subtitle: None,
        category: CommandCategory::Navigation,
        keywords: &["folder", "mailbox", "go"],
        shortcut,
        action: navigate(folder),
    };

    vec![
        Command {
            id: "compose",
            title: "Compose",
            subtitle: Some("Write a new email"),
            category: CommandCategory::Actions,
            keywords: &["new", "write", "email", "draft"],
            shortcut: Some("C"),
            action: Action::OpenCompose {
                options: ComposeOptions::new_message(),
            },
        },
        Command {
            id: "sync",
            title: "Sync mail",
            subtitle: Some("Fetch new messages"),
            category: CommandCategory::Actions,
            keywords: &["refresh", "reload", "fetch"],
            shortcut: None,
            action: Action::Sync,
        },
        folder("inbox", "Inbox", Folder::Inbox, Some("G I")),
        folder("sent", "Sent", Folder::Sent, Some("G S")),
        folder("drafts", "Drafts", Folder::Drafts, Some("G D")),
        folder("starred", "Starred", Folder::Starred, None),
        folder("archive", "Archive", Folder::Archive, None),
        folder("trash", "Trash", Folder::Trash, None),
        Command {
            id: "digest",
            title: "Daily digest",
            subtitle: Some("AI summary of today's mail"),
            category: CommandCategory::Navigation,
            keywords: &["summary", "overview"],
            shortcut: None,
            action: Action::Navigate {
                location: Location::Digest,
            },
        },
        Command {
            id: "urgent",
            title: "Urgent",
            subtitle: Some("Messages flagged urgent"),
            category: CommandCategory::Labels,
            keywords: &["important", "priority"],
            shortcut: None,
            action: Action::SetActiveLabel {
                label: Some("urgent".to_string()),
            },
        },
        Command {
            id: "needs-reply",
            title: "Needs reply",
            subtitle: Some("Messages waiting on you"),
            category: CommandCategory::Labels,
            keywords: &["respond", "answer", "follow up"],
            shortcut: None,
            action: Action::SetActiveLabel {
                label: Some("needs-reply".to_string()),
            },
        },
        Command {
            id: "settings",
            title: "Settings",
            subtitle: Some("Preferences"),
            category: CommandCategory::Settings,
            keywords: &["preferences", "options"],
            shortcut: Some("⌘ ,"),
            action: settings(SettingsPage::General),
        },
        Command {
            id: "account",
            title: "Account",
            subtitle: Some("Profile and security"),
            category: CommandCategory::Settings,
            keywords: &["profile", "user"],
            shortcut: None,
            action: settings(SettingsPage::Account),
        },
        Command {
            id: "connections",
            title: "Connections",
            subtitle: Some("Linked mail accounts"),
            category: CommandCategory::Settings,
            keywords: &["gmail", "outlook", "imap", "link"],
            shortcut: None,
            action: settings(SettingsPage::Connections),
        },
        Command {
            id: "billing",
            title: "Billing",
            subtitle: Some("Plan and invoices"),
            category: CommandCategory::Settings,
            keywords: &["subscription", "payment", "plan"],
            shortcut: None,
            action: settings(SettingsPage::Billing),
        },
        Command {
            id: "labels",
            title: "Labels",
            subtitle: Some("Manage labels"),
            category: CommandCategory::Settings,
            keywords: &["tags"],
            shortcut: None,
            action: settings(SettingsPage::Labels),
        },
        Command {
            id: "theme-light",
            title: "Light mode",
            subtitle: None,
            category: CommandCategory::Theme,
            keywords: &["appearance", "bright"],
            shortcut: None,
            action: Action::SetTheme {
                theme: ThemeMode::Light,
            },
        },
        Command {
            id: "theme-dark",
            title: "Dark mode",
            subtitle: None,
            category: CommandCategory::Theme,
            keywords: &["appearance", "night"],
            shortcut: None,
            action: Action::SetTheme {
                theme: ThemeMode::Dark,
            },
        },
        Command {
            id: "logout",
            title: "Sign out",
            subtitle: None,
            category: CommandCategory::Account,
            keywords: &["logout", "log out", "exit"],
            shortcut: None,
            action: Action::SignOut,
        },
    ]
}

/// Keys the palette reacts to while open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaletteKey {
    /// Move the cursor up, wrapping to the last entry.
    ArrowUp,
    /// Move the cursor down, wrapping to the first entry.
    ArrowDown,
    /// Run the highlighted command.
    Enter,
    /// Close the palette.
    Escape,
}

/// What the caller should do after a palette key press.
#[derive(Debug, Clone, PartialEq)]
pub enum PaletteOutcome {
    /// Nothing beyond re-rendering.
    None,
    /// Close the palette and dispatch the command's action.
    Run(Action),
    /// Close the palette.
    Close,
}

/// Query and cursor over the registry.
#[derive(Debug, Clone, Default)]
pub struct CommandPalette {
    registry: CommandRegistry,
    query: String,
    selected_index: usize,
}

impl CommandPalette {
    /// Creates a palette over a registry.
    #[must_use]
    pub fn new(registry: CommandRegistry) -> Self {
        Self {
            registry,
            query: String::new(),
            selected_index: 0,
        }
    }

    /// The underlying registry.
    #[must_use]
    pub const fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Current query.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Cursor into [`Self::filtered`].
    #[must_use]
    pub const fn selected_index(&self) -> usize {
        self.selected_index
    }

    /// Commands matching the query, in declaration order.
    #[must_use]
    pub fn filtered(&self) -> Vec<&Command> {
        self.registry.filter(&self.query)
    }

    /// Filtered commands grouped by category in first-seen order.
    ///
    /// Concatenating the groups yields [`Self::filtered`] only when each
    /// category is declared contiguously, which holds for the default table.
    #[must_use]
    pub fn grouped(&self) -> Vec<(CommandCategory, Vec<&Command>)> {
        let mut groups: Vec<(CommandCategory, Vec<&Command>)> = Vec::new();
        for command in self.filtered() {
            match groups.iter_mut().find(|(c, _)| *c == command.category) {
                Some((_, members)) => members.push(command),
                None => groups.push((command.category, vec![command])),
            }
        }
        groups
    }

    /// Highlighted command.
    #[must_use]
    pub fn selected(&self) -> Option<&Command> {
        self.filtered().get(self.selected_index).copied()
    }

    /// Replaces the query and moves the cursor to the top.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.selected_index = 0;
    }

    /// Clears query and cursor, as on opening.
    pub fn reset(&mut self) {
        self.set_query(String::new());
    }

    /// Handles a navigation key.
    pub fn handle_key(&mut self, key: PaletteKey) -> PaletteOutcome {
        let len = self.filtered().len();
        match key {
            PaletteKey::ArrowDown => {
                if len > 0 {
                    self.selected_index = (self.selected_index + 1) % len;
                }
                PaletteOutcome::None
            }
            PaletteKey::ArrowUp => {
                if len > 0 {
                    self.selected_index = self
                        .selected_index
                        .min(len - 1)
                        .checked_sub(1)
                        .unwrap_or(len - 1);
                }
                PaletteOutcome::None
            }
            PaletteKey::Enter => self
                .selected()
                .map_or(PaletteOutcome::None, |c| PaletteOutcome::Run(c.action.clone())),
            PaletteKey::Escape => PaletteOutcome::Close,
        }
    }
}
