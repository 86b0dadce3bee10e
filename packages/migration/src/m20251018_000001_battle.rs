use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;
use sea_orm_migration::sea_query::{ColumnDef, ForeignKeyAction, Index, Table};

#[derive(DeriveMigrationName)]
pub struct Migration;

// ----- Iden enums for tables & columns -----
#[derive(Iden)]
enum UserProfiles {
    Table,
    UserId,
    Username,
    Level,
    Mana,
    EarlyLeaves,
    BanUntil,
    WinStreak,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Lobbies {
    Table,
    Id,
    Code,
    HostId,
    HostName,
    HostLevel,
    HostPicture,
    GuestId,
    GuestName,
    GuestLevel,
    GuestPicture,
    HostReady,
    GuestReady,
    Status,
    QuestionTypes,
    StudyMaterialId,
    StudyMaterialTitle,
    Difficulty,
    CreatedAt,
    UpdatedAt,
    StartedAt,
    EndedAt,
}

#[derive(Iden)]
enum Invitations {
    Table,
    Id,
    LobbyCode,
    SenderId,
    SenderName,
    SenderPicture,
    ReceiverId,
    ReceiverName,
    ReceiverPicture,
    Status,
    HostReady,
    GuestReady,
    BattleStarted,
    QuestionTypes,
    StudyMaterialTitle,
    SelectedDifficulty,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum BattleSessions {
    Table,
    Id,
    SessionUuid,
    LobbyCode,
    HostId,
    GuestId,
    CurrentTurn,
    IsActive,
    HostInBattle,
    GuestInBattle,
    BattleStarted,
    ActiveCardEffects,
    DifficultyMode,
    StudyMaterialId,
    QuestionTypes,
    Version,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum BattleRounds {
    Table,
    Id,
    SessionUuid,
    HostCard,
    GuestCard,
    HostAnswerCorrect,
    GuestAnswerCorrect,
    HostCardEffect,
    GuestCardEffect,
    QuestionCountTotal,
    QuestionIdsDone,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum BattleScores {
    Table,
    Id,
    SessionUuid,
    HostHealth,
    GuestHealth,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum BattleEndings {
    Table,
    Id,
    SessionUuid,
    SessionId,
    LobbyCode,
    WinnerId,
    BattleEndReason,
    CreatedAt,
}

fn pk(col: impl IntoIden) -> ColumnDef {
    ColumnDef::new(col)
        .big_integer()
        .not_null()
        .primary_key()
        .auto_increment()
        .to_owned()
}

fn stamp(col: impl IntoIden) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .not_null()
        .to_owned()
}

fn flag(col: impl IntoIden) -> ColumnDef {
    ColumnDef::new(col)
        .boolean()
        .not_null()
        .default(false)
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // user_profiles (owned by the profile service; the battle engine mutates
        // early_leaves, ban_until and win_streak)
        manager
            .create_table(
                Table::create()
                    .table(UserProfiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserProfiles::UserId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserProfiles::Username).string().not_null())
                    .col(
                        ColumnDef::new(UserProfiles::Level)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(UserProfiles::Mana)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(UserProfiles::EarlyLeaves)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(UserProfiles::BanUntil)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(UserProfiles::WinStreak)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(stamp(UserProfiles::CreatedAt))
                    .col(stamp(UserProfiles::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // lobbies
        manager
            .create_table(
                Table::create()
                    .table(Lobbies::Table)
                    .if_not_exists()
                    .col(pk(Lobbies::Id))
                    .col(ColumnDef::new(Lobbies::Code).string().not_null())
                    .col(ColumnDef::new(Lobbies::HostId).big_integer().not_null())
                    .col(ColumnDef::new(Lobbies::HostName).string().not_null())
                    .col(
                        ColumnDef::new(Lobbies::HostLevel)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Lobbies::HostPicture).string().null())
                    .col(ColumnDef::new(Lobbies::GuestId).big_integer().null())
                    .col(ColumnDef::new(Lobbies::GuestName).string().null())
                    .col(ColumnDef::new(Lobbies::GuestLevel).integer().null())
                    .col(ColumnDef::new(Lobbies::GuestPicture).string().null())
                    .col(flag(Lobbies::HostReady))
                    .col(flag(Lobbies::GuestReady))
                    .col(
                        ColumnDef::new(Lobbies::Status)
                            .string()
                            .not_null()
                            .default("waiting"),
                    )
                    .col(ColumnDef::new(Lobbies::QuestionTypes).json().not_null())
                    .col(ColumnDef::new(Lobbies::StudyMaterialId).string().null())
                    .col(ColumnDef::new(Lobbies::StudyMaterialTitle).string().null())
                    .col(ColumnDef::new(Lobbies::Difficulty).string().null())
                    .col(stamp(Lobbies::CreatedAt))
                    .col(stamp(Lobbies::UpdatedAt))
                    .col(
                        ColumnDef::new(Lobbies::StartedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Lobbies::EndedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_lobbies_code")
                    .table(Lobbies::Table)
                    .col(Lobbies::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // invitations
        manager
            .create_table(
                Table::create()
                    .table(Invitations::Table)
                    .if_not_exists()
                    .col(pk(Invitations::Id))
                    .col(ColumnDef::new(Invitations::LobbyCode).string().not_null())
                    .col(
                        ColumnDef::new(Invitations::SenderId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Invitations::SenderName).string().not_null())
                    .col(ColumnDef::new(Invitations::SenderPicture).string().null())
                    .col(ColumnDef::new(Invitations::ReceiverId).big_integer().null())
                    .col(ColumnDef::new(Invitations::ReceiverName).string().null())
                    .col(ColumnDef::new(Invitations::ReceiverPicture).string().null())
                    .col(
                        ColumnDef::new(Invitations::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(flag(Invitations::HostReady))
                    .col(flag(Invitations::GuestReady))
                    .col(flag(Invitations::BattleStarted))
                    .col(
                        ColumnDef::new(Invitations::QuestionTypes)
                            .json()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Invitations::StudyMaterialTitle)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Invitations::SelectedDifficulty)
                            .string()
                            .null(),
                    )
                    .col(stamp(Invitations::CreatedAt))
                    .col(stamp(Invitations::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_invitations_triple")
                    .table(Invitations::Table)
                    .col(Invitations::LobbyCode)
                    .col(Invitations::SenderId)
                    .col(Invitations::ReceiverId)
                    .to_owned(),
            )
            .await?;

        // battle_sessions
        manager
            .create_table(
                Table::create()
                    .table(BattleSessions::Table)
                    .if_not_exists()
                    .col(pk(BattleSessions::Id))
                    .col(
                        ColumnDef::new(BattleSessions::SessionUuid)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(BattleSessions::LobbyCode).string().not_null())
                    .col(ColumnDef::new(BattleSessions::HostId).big_integer().not_null())
                    .col(
                        ColumnDef::new(BattleSessions::GuestId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BattleSessions::CurrentTurn)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(BattleSessions::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(flag(BattleSessions::HostInBattle))
                    .col(flag(BattleSessions::GuestInBattle))
                    .col(flag(BattleSessions::BattleStarted))
                    .col(
                        ColumnDef::new(BattleSessions::ActiveCardEffects)
                            .json()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BattleSessions::DifficultyMode)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(BattleSessions::StudyMaterialId)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(BattleSessions::QuestionTypes)
                            .json()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BattleSessions::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(stamp(BattleSessions::CreatedAt))
                    .col(stamp(BattleSessions::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_battle_sessions_lobby_code")
                    .table(BattleSessions::Table)
                    .col(BattleSessions::LobbyCode)
                    .to_owned(),
            )
            .await?;

        // At most one active session per lobby. Partial indexes are supported by
        // both Postgres and SQLite with identical syntax.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS ux_battle_sessions_active_lobby \
                 ON battle_sessions (lobby_code) WHERE is_active",
            )
            .await?;

        // battle_rounds
        manager
            .create_table(
                Table::create()
                    .table(BattleRounds::Table)
                    .if_not_exists()
                    .col(pk(BattleRounds::Id))
                    .col(
                        ColumnDef::new(BattleRounds::SessionUuid)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(BattleRounds::HostCard).string().null())
                    .col(ColumnDef::new(BattleRounds::GuestCard).string().null())
                    .col(
                        ColumnDef::new(BattleRounds::HostAnswerCorrect)
                            .boolean()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(BattleRounds::GuestAnswerCorrect)
                            .boolean()
                            .null(),
                    )
                    .col(ColumnDef::new(BattleRounds::HostCardEffect).json().null())
                    .col(ColumnDef::new(BattleRounds::GuestCardEffect).json().null())
                    .col(
                        ColumnDef::new(BattleRounds::QuestionCountTotal)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(BattleRounds::QuestionIdsDone)
                            .json()
                            .not_null(),
                    )
                    .col(stamp(BattleRounds::CreatedAt))
                    .col(stamp(BattleRounds::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_battle_rounds_session_uuid")
                            .from(BattleRounds::Table, BattleRounds::SessionUuid)
                            .to(BattleSessions::Table, BattleSessions::SessionUuid)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // battle_scores
        manager
            .create_table(
                Table::create()
                    .table(BattleScores::Table)
                    .if_not_exists()
                    .col(pk(BattleScores::Id))
                    .col(
                        ColumnDef::new(BattleScores::SessionUuid)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(BattleScores::HostHealth)
                            .integer()
                            .not_null()
                            .default(100),
                    )
                    .col(
                        ColumnDef::new(BattleScores::GuestHealth)
                            .integer()
                            .not_null()
                            .default(100),
                    )
                    .col(stamp(BattleScores::CreatedAt))
                    .col(stamp(BattleScores::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_battle_scores_session_uuid")
                            .from(BattleScores::Table, BattleScores::SessionUuid)
                            .to(BattleSessions::Table, BattleSessions::SessionUuid)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // battle_endings: one row per session, its presence means "match over"
        manager
            .create_table(
                Table::create()
                    .table(BattleEndings::Table)
                    .if_not_exists()
                    .col(pk(BattleEndings::Id))
                    .col(
                        ColumnDef::new(BattleEndings::SessionUuid)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(BattleEndings::SessionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BattleEndings::LobbyCode).string().not_null())
                    .col(ColumnDef::new(BattleEndings::WinnerId).big_integer().null())
                    .col(
                        ColumnDef::new(BattleEndings::BattleEndReason)
                            .string()
                            .not_null(),
                    )
                    .col(stamp(BattleEndings::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_battle_endings_session_uuid")
                            .from(BattleEndings::Table, BattleEndings::SessionUuid)
                            .to(BattleSessions::Table, BattleSessions::SessionUuid)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BattleEndings::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BattleScores::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BattleRounds::Table).if_exists().to_owned())
            .await?;
        manager
            .get_connection()
            .execute_unprepared("DROP INDEX IF EXISTS ux_battle_sessions_active_lobby")
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(BattleSessions::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Invitations::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Lobbies::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserProfiles::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}
