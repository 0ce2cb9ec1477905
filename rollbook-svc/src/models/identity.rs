//! Request identity and role-based capabilities
//!
//! Identity is resolved once per request from the opaque identity
//! provider (`X-User-Id` / `X-User-Role` headers) and passed explicitly
//! into every handler. Capability logic lives in one place:
//! `allowed_actions`, consulted by the API layer for every gated call.

use serde::{Deserialize, Serialize};

/// Role supplied by the identity collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Submitter,
    Approver,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Submitter => "submitter",
            Role::Approver => "approver",
            Role::Admin => "admin",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "submitter" => Some(Role::Submitter),
            "approver" => Some(Role::Approver),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// What a caller may do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Create/draft/submit own records and batches
    SubmitRecords,
    /// Transition pending records to approved/rejected
    ReviewRecords,
}

/// Capability set per role. Authorization is role-based, not
/// per-record ownership for reviewers.
pub fn allowed_actions(role: Role) -> &'static [ActionKind] {
    match role {
        Role::Submitter => &[ActionKind::SubmitRecords],
        Role::Approver => &[ActionKind::ReviewRecords],
        Role::Admin => &[ActionKind::SubmitRecords, ActionKind::ReviewRecords],
    }
}

/// Identity resolved for the current request
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user_id: String,
    pub role: Role,
}

impl RequestContext {
    pub fn can(&self, action: ActionKind) -> bool {
        allowed_actions(self.role).contains(&action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submitter_cannot_review() {
        let ctx = RequestContext {
            user_id: "u1".to_string(),
            role: Role::Submitter,
        };
        assert!(ctx.can(ActionKind::SubmitRecords));
        assert!(!ctx.can(ActionKind::ReviewRecords));
    }

    #[test]
    fn approver_cannot_submit() {
        assert_eq!(allowed_actions(Role::Approver), &[ActionKind::ReviewRecords]);
    }

    #[test]
    fn admin_holds_both_capability_sets() {
        let ctx = RequestContext {
            user_id: "u2".to_string(),
            role: Role::Admin,
        };
        assert!(ctx.can(ActionKind::SubmitRecords));
        assert!(ctx.can(ActionKind::ReviewRecords));
    }
}
