pub mod battle_endings;
pub mod battle_rounds;
pub mod battle_scores;
pub mod battle_sessions;
pub mod invitations;
pub mod lobbies;
pub mod user_profiles;

pub use battle_endings::Entity as BattleEndings;
pub use battle_endings::Model as BattleEnding;
pub use battle_rounds::Entity as BattleRounds;
pub use battle_rounds::Model as BattleRound;
pub use battle_scores::Entity as BattleScores;
pub use battle_scores::Model as BattleScore;
pub use battle_sessions::Entity as BattleSessions;
pub use battle_sessions::Model as BattleSession;
pub use invitations::Entity as Invitations;
pub use invitations::Model as Invitation;
pub use lobbies::Entity as Lobbies;
pub use lobbies::Model as Lobby;
pub use user_profiles::Entity as UserProfiles;
pub use user_profiles::Model as UserProfile;
