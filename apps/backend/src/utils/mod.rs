pub mod lobby_code;
