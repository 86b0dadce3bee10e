//! Adapters for external dependencies.

pub mod endings_sea;
pub mod invitations_sea;
pub mod lobbies_sea;
pub mod profiles_sea;
pub mod rounds_sea;
pub mod scores_sea;
pub mod sessions_sea;
