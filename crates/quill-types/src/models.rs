use serde::{Deserialize, Serialize};

/// Access tier attached to every account. Fixed at registration; the only
/// path that creates one after the fact is the Manager-only admin creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Reader,
    User,
    Author,
    Admin,
    Manager,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Reader,
        Role::User,
        Role::Author,
        Role::Admin,
        Role::Manager,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Reader => "Reader",
            Role::User => "User",
            Role::Author => "Author",
            Role::Admin => "Admin",
            Role::Manager => "Manager",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "Reader" => Some(Role::Reader),
            "User" => Some(Role::User),
            "Author" => Some(Role::Author),
            "Admin" => Some(Role::Admin),
            "Manager" => Some(Role::Manager),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reports start Pending and only move via the manual moderator endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportStatus {
    Pending,
    Reviewed,
    Dismissed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "Pending",
            ReportStatus::Reviewed => "Reviewed",
            ReportStatus::Dismissed => "Dismissed",
        }
    }

    pub fn parse(s: &str) -> Option<ReportStatus> {
        match s {
            "Pending" => Some(ReportStatus::Pending),
            "Reviewed" => Some(ReportStatus::Reviewed),
            "Dismissed" => Some(ReportStatus::Dismissed),
            _ => None,
        }
    }
}

/// A like or a dislike. One row per (user, target); requesting either action
/// while a row exists removes the row instead of flipping it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeAction {
    Like,
    Dislike,
}

impl LikeAction {
    pub fn is_like(&self) -> bool {
        matches!(self, LikeAction::Like)
    }

    /// Past-tense verb used in notification text.
    pub fn verb(&self) -> &'static str {
        match self {
            LikeAction::Like => "liked",
            LikeAction::Dislike => "disliked",
        }
    }
}
