use std::str::FromStr;

pub use crate::entities::invitations::InvitationStatus;
use crate::errors::domain::DomainError;

/// Statuses a pending invitation may be answered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Accepted,
    Declined,
    Expired,
}

impl Response {
    pub fn status(self) -> InvitationStatus {
        match self {
            Response::Accepted => InvitationStatus::Accepted,
            Response::Declined => InvitationStatus::Declined,
            Response::Expired => InvitationStatus::Expired,
        }
    }
}

impl FromStr for Response {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accepted" | "accept" => Ok(Response::Accepted),
            "declined" | "decline" => Ok(Response::Declined),
            "expired" => Ok(Response::Expired),
            other => Err(DomainError::validation(format!(
                "invitation status must be accepted, declined or expired, got '{other}'"
            ))),
        }
    }
}

/// Rows in these states are removed before a retry is allowed.
pub fn is_purgeable(status: InvitationStatus) -> bool {
    matches!(
        status,
        InvitationStatus::Declined | InvitationStatus::Expired
    )
}
