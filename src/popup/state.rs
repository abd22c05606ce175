use std::sync::Arc;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::types::{FollowsResponse, HelixUser};
use crate::popup::PopupError;

pub const DEFAULT_DATE_FORMAT: &str = "%b %-d, %Y";

// ---------------------------------------------------------------------------
// View state
// ---------------------------------------------------------------------------

/// What the popup should currently render.
#[derive(Debug, Clone)]
pub enum PopupState {
    Loading,
    /// `cause` is `None` when the target user does not exist.
    Error { cause: Option<Arc<PopupError>> },
    Success(UserInfo),
}

impl PopupState {
    pub fn error(cause: PopupError) -> Self {
        Self::Error {
            cause: Some(Arc::new(cause)),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn user(&self) -> Option<&UserInfo> {
        match self {
            Self::Success(info) => Some(info),
            _ => None,
        }
    }
}

/// Everything the popup shows about a loaded user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserInfo {
    pub user_id: String,
    pub username: String,
    pub display_name: String,
    pub created_at: String,
    pub avatar_url: String,
    pub is_following: bool,
    /// Formatted date the user followed the viewed channel.
    pub following_since: Option<String>,
    #[serde(skip)]
    pub followed_at: Option<DateTime<Utc>>,
    pub is_blocked: bool,
}

// ---------------------------------------------------------------------------
// Reduction
// ---------------------------------------------------------------------------

/// Raw results of one load, before reduction.
#[derive(Debug, Default)]
pub(crate) struct LoadedData {
    /// Target user's follow of the viewed channel; `None` without a channel.
    pub channel_follows: Option<FollowsResponse>,
    pub user: Option<HelixUser>,
    /// Viewer's follow of the target user.
    pub viewer_follows: FollowsResponse,
    pub is_blocked: bool,
}

pub(crate) fn reduce(loaded: LoadedData, dates: &DateFormatter) -> PopupState {
    let Some(user) = loaded.user else {
        return PopupState::Error { cause: None };
    };

    let followed_at = loaded
        .channel_follows
        .as_ref()
        .and_then(|follows| follows.data.first())
        .map(|follow| follow.followed_at);

    PopupState::Success(UserInfo {
        user_id: user.id,
        username: user.login,
        display_name: user.display_name,
        created_at: dates.format(&user.created_at),
        avatar_url: user.profile_image_url,
        is_following: loaded.viewer_follows.total == 1,
        following_since: followed_at.as_ref().map(|dt| dates.format(dt)),
        followed_at,
        is_blocked: loaded.is_blocked,
    })
}

// ---------------------------------------------------------------------------
// Date formatting
// ---------------------------------------------------------------------------

/// strftime-style formatter for the dates shown in the popup.
#[derive(Debug, Clone)]
pub struct DateFormatter {
    pattern: String,
}

impl Default for DateFormatter {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl DateFormatter {
    /// Falls back to the default pattern if `pattern` has invalid specifiers.
    pub fn new(pattern: &str) -> Self {
        if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
            tracing::warn!(pattern, "invalid date_format, using default");
            return Self::default();
        }
        Self {
            pattern: pattern.to_string(),
        }
    }

    pub fn format(&self, dt: &DateTime<Utc>) -> String {
        dt.format(&self.pattern).to_string()
    }
}

/// Humanized follow duration, e.g. "2 years, 3 months".
pub fn follow_age(since: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = (now - since).num_days().max(0);
    let units = [
        (days / 365, "year"),
        ((days % 365) / 30, "month"),
        ((days % 365) % 30, "day"),
    ];

    let parts: Vec<String> = units
        .iter()
        .filter(|(n, _)| *n > 0)
        .take(2)
        .map(|(n, unit)| {
            if *n == 1 {
                format!("1 {unit}")
            } else {
                format!("{n} {unit}s")
            }
        })
        .collect();

    if parts.is_empty() {
        "less than a day".to_string()
    } else {
        parts.join(", ")
    }
}
