//! Repository functions for the domain layer.

pub mod endings;
pub mod invitations;
pub mod lobbies;
pub mod profiles;
pub mod rounds;
pub mod scores;
pub mod sessions;
