//! Transactional business operations. Each method runs inside the
//! caller's transaction and returns `AppError`.

pub mod bans;
pub mod endings;
pub mod invitations;
pub mod lobbies;
pub mod rounds;
pub mod scores;
pub mod sessions;
