//! SeaORM adapter for lobbies - generic over ConnectionTrait.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, NotSet,
    QueryFilter, Set,
};
use time::OffsetDateTime;

use crate::domain::lobby::{LobbyStatus, PlayerProfile};
use crate::entities::lobbies;

pub mod dto;

pub use dto::{LobbyCreate, LobbyUpdate};

pub async fn find_by_code<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    code: &str,
) -> Result<Option<lobbies::Model>, DbErr> {
    lobbies::Entity::find()
        .filter(lobbies::Column::Code.eq(code))
        .one(conn)
        .await
}

pub async fn require_by_code<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    code: &str,
) -> Result<lobbies::Model, DbErr> {
    find_by_code(conn, code)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("Lobby {code} not found")))
}

pub async fn create_lobby<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: LobbyCreate,
) -> Result<lobbies::Model, DbErr> {
    let now = OffsetDateTime::now_utc();
    lobbies::ActiveModel {
        id: NotSet,
        code: Set(dto.code),
        host_id: Set(dto.host.id),
        host_name: Set(dto.host.name),
        host_level: Set(dto.host.level),
        host_picture: Set(dto.host.picture),
        guest_id: Set(None),
        guest_name: Set(None),
        guest_level: Set(None),
        guest_picture: Set(None),
        host_ready: Set(false),
        guest_ready: Set(false),
        status: Set(LobbyStatus::Waiting),
        question_types: Set(dto.settings.question_types_json()),
        study_material_id: Set(dto.settings.study_material_id),
        study_material_title: Set(dto.settings.study_material_title),
        difficulty: Set(dto.settings.difficulty),
        created_at: Set(now),
        updated_at: Set(now),
        started_at: Set(None),
        ended_at: Set(None),
    }
    .insert(conn)
    .await
}

/// Seat `guest` only if the lobby is still waiting with an empty guest seat.
/// Returns the number of rows changed (0 or 1).
pub async fn attach_guest<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    lobby_id: i64,
    guest: &PlayerProfile,
) -> Result<u64, DbErr> {
    let result = lobbies::Entity::update_many()
        .col_expr(lobbies::Column::GuestId, Expr::value(Some(guest.id)))
        .col_expr(lobbies::Column::GuestName, Expr::value(Some(guest.name.clone())))
        .col_expr(lobbies::Column::GuestLevel, Expr::value(Some(guest.level)))
        .col_expr(
            lobbies::Column::GuestPicture,
            Expr::value(guest.picture.clone()),
        )
        .col_expr(lobbies::Column::GuestReady, Expr::value(false))
        .col_expr(
            lobbies::Column::UpdatedAt,
            Expr::value(OffsetDateTime::now_utc()),
        )
        .filter(lobbies::Column::Id.eq(lobby_id))
        .filter(lobbies::Column::Status.eq(LobbyStatus::Waiting.to_value()))
        .filter(lobbies::Column::GuestId.is_null())
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Apply a partial update and return the refreshed row.
pub async fn update_lobby<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: LobbyUpdate,
) -> Result<lobbies::Model, DbErr> {
    let mut update = lobbies::Entity::update_many().col_expr(
        lobbies::Column::UpdatedAt,
        Expr::value(OffsetDateTime::now_utc()),
    );

    if let Some(status) = dto.status {
        update = update.col_expr(lobbies::Column::Status, Expr::value(status.to_value()));
    }
    if let Some(ready) = dto.host_ready {
        update = update.col_expr(lobbies::Column::HostReady, Expr::value(ready));
    }
    if let Some(ready) = dto.guest_ready {
        update = update.col_expr(lobbies::Column::GuestReady, Expr::value(ready));
    }
    if let Some(guest) = dto.guest {
        update = update
            .col_expr(
                lobbies::Column::GuestId,
                Expr::value(guest.as_ref().map(|g| g.id)),
            )
            .col_expr(
                lobbies::Column::GuestName,
                Expr::value(guest.as_ref().map(|g| g.name.clone())),
            )
            .col_expr(
                lobbies::Column::GuestLevel,
                Expr::value(guest.as_ref().map(|g| g.level)),
            )
            .col_expr(
                lobbies::Column::GuestPicture,
                Expr::value(guest.as_ref().and_then(|g| g.picture.clone())),
            );
    }
    if let Some(settings) = dto.settings {
        update = update
            .col_expr(
                lobbies::Column::QuestionTypes,
                Expr::value(settings.question_types_json()),
            )
            .col_expr(
                lobbies::Column::StudyMaterialId,
                Expr::value(settings.study_material_id),
            )
            .col_expr(
                lobbies::Column::StudyMaterialTitle,
                Expr::value(settings.study_material_title),
            )
            .col_expr(
                lobbies::Column::Difficulty,
                Expr::value(settings.difficulty.map(|d| d.to_value())),
            );
    }
    if let Some(at) = dto.started_at {
        update = update.col_expr(lobbies::Column::StartedAt, Expr::value(Some(at)));
    }
    if let Some(at) = dto.ended_at {
        update = update.col_expr(lobbies::Column::EndedAt, Expr::value(Some(at)));
    }

    let result = update
        .filter(lobbies::Column::Id.eq(dto.id))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(DbErr::RecordNotFound(format!("Lobby {} not found", dto.id)));
    }

    lobbies::Entity::find_by_id(dto.id)
        .one(conn)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("Lobby {} not found", dto.id)))
}
