//! The single decision table for role-gated actions. Handlers call `may`
//! before touching storage and never re-derive these rules inline.

use quill_types::models::Role;

/// Shared secrets gating privileged self-registration. Compared in plaintext
/// against the submitted password field itself; reproduced as-is from the
/// system this replaces for behavioral parity.
pub const ADMIN_REGISTRATION_SECRET: &str = "Admin!";
pub const MANAGER_REGISTRATION_SECRET: &str = "Manager!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Publish a new post.
    CreatePost,
    /// Delete a post; needs the post author's role and whether the actor owns it.
    DeletePost { author: Role, own: bool },
    /// Delete an account with the given role.
    DeleteUser { target: Role },
    /// Create an Admin account (distinct from self-registration; role check only).
    CreateAdmin,
    /// Moderation views and report-status changes.
    Moderate,
}

pub fn may(actor: Role, action: Action) -> bool {
    match action {
        Action::CreatePost => matches!(actor, Role::User | Role::Author | Role::Admin),

        Action::DeletePost { author, own } => match actor {
            Role::Manager => true,
            Role::Admin => author == Role::User,
            Role::User | Role::Author => own,
            Role::Reader => false,
        },

        Action::DeleteUser { target } => match actor {
            Role::Manager => target != Role::Manager,
            Role::Admin => target == Role::User,
            _ => false,
        },

        Action::CreateAdmin => actor == Role::Manager,

        Action::Moderate => matches!(actor, Role::Manager | Role::Admin),
    }
}

/// Self-registration gate. Reader/User/Author register freely; Admin and
/// Manager require the matching shared secret as the password.
pub fn may_register(role: Role, password: &str) -> bool {
    match role {
        Role::Admin => password == ADMIN_REGISTRATION_SECRET,
        Role::Manager => password == MANAGER_REGISTRATION_SECRET,
        _ => true,
    }
}
