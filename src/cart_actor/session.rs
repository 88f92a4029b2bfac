//! Per-session authentication state as seen by the cart.

use crate::model::UserId;
use std::fmt::Display;

/// `Anonymous -> Merging -> Authenticated`, and back to `Anonymous` on sign-out.
///
/// `Merging` only exists while a sign-in merge is running inside the session actor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Anonymous,
    Merging(UserId),
    Authenticated(UserId),
}

impl SessionState {
    /// The user whose remote cart is authoritative, if any.
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            SessionState::Anonymous => None,
            SessionState::Merging(user_id) | SessionState::Authenticated(user_id) => Some(user_id),
        }
    }

    pub fn is_merging(&self) -> bool {
        matches!(self, SessionState::Merging(_))
    }
}

impl Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Anonymous => write!(f, "anonymous"),
            SessionState::Merging(user_id) => write!(f, "merging({user_id})"),
            SessionState::Authenticated(user_id) => write!(f, "authenticated({user_id})"),
        }
    }
}
