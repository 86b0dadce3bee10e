pub mod lobby_code;
pub mod session_key;
pub mod validated_json;

pub use lobby_code::LobbyCode;
pub use session_key::{SessionPath, SessionUuid};
pub use validated_json::ValidatedJson;
