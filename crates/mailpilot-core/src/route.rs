//! Navigational state encoded in the URL query (`?folder=<name>&label=<name>`).

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::model::Folder;

/// Mailbox location addressed by the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Folder, when present and known.
    pub folder: Option<Folder>,
    /// Label name, when present and non-empty.
    pub label: Option<String>,
}

impl Route {
    /// Route to a folder.
    #[must_use]
    pub const fn folder(folder: Folder) -> Self {
        Self {
            folder: Some(folder),
            label: None,
        }
    }

    /// Route to a label.
    pub fn label(label: impl Into<String>) -> Self {
        Self {
            folder: None,
            label: Some(label.into()),
        }
    }

    /// Parses a query string, with or without the leading `?`.
    ///
    /// Unknown folders and empty values are ignored; the first recognised
    /// value of each key wins.
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut route = Self::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "folder" if route.folder.is_none() => route.folder = Folder::parse(&value),
                "label" if route.label.is_none() && !value.trim().is_empty() => {
                    route.label = Some(value.into_owned());
                }
                _ => {}
            }
        }
        route
    }

    /// Renders the query string, including the leading `?` when non-empty.
    #[must_use]
    pub fn to_query(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        if let Some(folder) = self.folder {
            serializer.append_pair("folder", folder.as_str());
        }
        if let Some(label) = &self.label {
            serializer.append_pair("label", label);
        }
        let encoded = serializer.finish();
        if encoded.is_empty() {
            encoded
        } else {
            format!("?{encoded}")
        }
    }
}

/// Settings pages reachable from the command palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingsPage {
    /// General preferences.
    General,
    /// Profile.
    Account,
    /// Connected mail accounts.
    Connections,
    /// Plan and invoices.
    Billing,
    /// Label management.
    Labels,
}

/// Destination handed to the host router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "page", rename_all = "snake_case")]
pub enum Location {
    /// Message list with a route query.
    Mailbox {
        /// Query state.
        route: Route,
    },
    /// Daily AI digest.
    Digest,
    /// A settings page.
    Settings {
        /// Which page.
        section: SettingsPage,
    },
}

impl Location {
    /// Path plus query, as the host router expects it.
    #[must_use]
    pub fn href(&self) -> String {
        match self {
            Self::Mailbox { route } => format!("/dashboard{}", route.to_query()),
            Self::Digest => "/dashboard/digest".to_string(),
            Self::Settings { section } => match section {
                SettingsPage::General => "/dashboard/settings".to_string(),
                SettingsPage::Account => "/dashboard/settings/account".to_string(),
                SettingsPage::Connections => "/dashboard/settings/connections".to_string(),
                SettingsPage::Billing => "/dashboard/settings/billing".to_string(),
                SettingsPage::Labels => "/dashboard/settings/labels".to_string(),
            },
        }
    }
}
