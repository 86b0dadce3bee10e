use time::Duration;

pub const MAX_HEALTH: i32 = 100;
pub const MIN_HEALTH: i32 = 0;

/// Self-damage for a missed question.
pub const INCORRECT_ANSWER_DAMAGE: i32 = 10;

pub const POISON_INITIAL_DAMAGE: i32 = 10;
pub const POISON_DAMAGE_PER_TURN: i32 = 5;
pub const POISON_TURNS: u32 = 3;

pub const REGENERATION_HEAL: i32 = 10;

pub const TIME_REDUCTION_PERCENT: u32 = 30;
pub const MIN_ANSWER_WINDOW_SECS: u32 = 5;

pub const MIND_CONTROL_TURNS: u32 = 1;

/// Early leaves at which a ban is imposed.
pub const EARLY_LEAVE_BAN_THRESHOLD: i32 = 3;
pub const BAN_DURATION: Duration = Duration::hours(24);

pub const LOBBY_CODE_MIN_LEN: usize = 4;
pub const LOBBY_CODE_MAX_LEN: usize = 12;
pub const GENERATED_LOBBY_CODE_LEN: usize = 6;
pub const LOBBY_CODE_GENERATION_ATTEMPTS: usize = 8;
