//! SeaORM adapter for invitations - generic over ConnectionTrait.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, NotSet,
    Order, QueryFilter, QueryOrder, Set,
};
use time::OffsetDateTime;

use crate::entities::invitations::{self, InvitationStatus};

pub mod dto;

pub use dto::{InvitationCreate, InvitationMirror};

fn triple(
    lobby_code: &str,
    sender_id: i64,
    receiver_id: i64,
) -> sea_orm::Condition {
    sea_orm::Condition::all()
        .add(invitations::Column::LobbyCode.eq(lobby_code))
        .add(invitations::Column::SenderId.eq(sender_id))
        .add(invitations::Column::ReceiverId.eq(receiver_id))
}

/// Latest row for `(lobby_code, sender, receiver)`.
pub async fn find_latest<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    lobby_code: &str,
    sender_id: i64,
    receiver_id: i64,
) -> Result<Option<invitations::Model>, DbErr> {
    invitations::Entity::find()
        .filter(triple(lobby_code, sender_id, receiver_id))
        .order_by(invitations::Column::Id, Order::Desc)
        .one(conn)
        .await
}

/// Most recent non-terminal row for a lobby (pending or accepted).
pub async fn find_live_for_lobby<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    lobby_code: &str,
) -> Result<Option<invitations::Model>, DbErr> {
    invitations::Entity::find()
        .filter(invitations::Column::LobbyCode.eq(lobby_code))
        .filter(invitations::Column::Status.is_in([
            InvitationStatus::Pending.to_value(),
            InvitationStatus::Accepted.to_value(),
        ]))
        .order_by(invitations::Column::Id, Order::Desc)
        .one(conn)
        .await
}

/// Delete declined and expired rows for the triple. Returns rows removed.
pub async fn purge_stale<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    lobby_code: &str,
    sender_id: i64,
    receiver_id: i64,
) -> Result<u64, DbErr> {
    let result = invitations::Entity::delete_many()
        .filter(triple(lobby_code, sender_id, receiver_id))
        .filter(invitations::Column::Status.is_in([
            InvitationStatus::Declined.to_value(),
            InvitationStatus::Expired.to_value(),
        ]))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Any non-declined row remaining for the triple.
pub async fn find_blocking<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    lobby_code: &str,
    sender_id: i64,
    receiver_id: i64,
) -> Result<Option<invitations::Model>, DbErr> {
    invitations::Entity::find()
        .filter(triple(lobby_code, sender_id, receiver_id))
        .filter(invitations::Column::Status.ne(InvitationStatus::Declined.to_value()))
        .one(conn)
        .await
}

pub async fn create_invitation<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: InvitationCreate,
) -> Result<invitations::Model, DbErr> {
    let now = OffsetDateTime::now_utc();
    let receiver = dto.receiver;
    invitations::ActiveModel {
        id: NotSet,
        lobby_code: Set(dto.lobby_code),
        sender_id: Set(dto.sender.id),
        sender_name: Set(dto.sender.name),
        sender_picture: Set(dto.sender.picture),
        receiver_id: Set(receiver.as_ref().map(|r| r.id)),
        receiver_name: Set(receiver.as_ref().map(|r| r.name.clone())),
        receiver_picture: Set(receiver.and_then(|r| r.picture)),
        status: Set(dto.status),
        host_ready: Set(dto.host_ready),
        guest_ready: Set(dto.guest_ready),
        battle_started: Set(false),
        question_types: Set(dto.settings.question_types_json()),
        study_material_title: Set(dto.settings.study_material_title),
        selected_difficulty: Set(dto.settings.difficulty),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await
}

/// Move a pending row to `to` in one conditional statement. Accepting also
/// sets `guest_ready`. Returns rows changed (0 when no pending row matched).
pub async fn respond_if_pending<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    lobby_code: &str,
    sender_id: i64,
    receiver_id: i64,
    to: InvitationStatus,
) -> Result<u64, DbErr> {
    let mut update = invitations::Entity::update_many()
        .col_expr(invitations::Column::Status, Expr::value(to.to_value()))
        .col_expr(
            invitations::Column::UpdatedAt,
            Expr::value(OffsetDateTime::now_utc()),
        );
    if to == InvitationStatus::Accepted {
        update = update.col_expr(invitations::Column::GuestReady, Expr::value(true));
    }
    let result = update
        .filter(triple(lobby_code, sender_id, receiver_id))
        .filter(invitations::Column::Status.eq(InvitationStatus::Pending.to_value()))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Apply a mirror update to the lobby's live invitation rows.
pub async fn mirror_lobby<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    lobby_code: &str,
    mirror: InvitationMirror,
) -> Result<u64, DbErr> {
    let mut update = invitations::Entity::update_many().col_expr(
        invitations::Column::UpdatedAt,
        Expr::value(OffsetDateTime::now_utc()),
    );
    if let Some(status) = mirror.status {
        update = update.col_expr(invitations::Column::Status, Expr::value(status.to_value()));
    }
    if let Some(v) = mirror.host_ready {
        update = update.col_expr(invitations::Column::HostReady, Expr::value(v));
    }
    if let Some(v) = mirror.guest_ready {
        update = update.col_expr(invitations::Column::GuestReady, Expr::value(v));
    }
    if let Some(v) = mirror.battle_started {
        update = update.col_expr(invitations::Column::BattleStarted, Expr::value(v));
    }
    if mirror.clear_receiver {
        update = update
            .col_expr(invitations::Column::ReceiverId, Expr::value(Option::<i64>::None))
            .col_expr(
                invitations::Column::ReceiverName,
                Expr::value(Option::<String>::None),
            )
            .col_expr(
                invitations::Column::ReceiverPicture,
                Expr::value(Option::<String>::None),
            );
    }
    if let Some(settings) = mirror.settings {
        update = update
            .col_expr(
                invitations::Column::QuestionTypes,
                Expr::value(settings.question_types_json()),
            )
            .col_expr(
                invitations::Column::StudyMaterialTitle,
                Expr::value(settings.study_material_title),
            )
            .col_expr(
                invitations::Column::SelectedDifficulty,
                Expr::value(settings.difficulty.map(|d| d.to_value())),
            );
    }
    let result = update
        .filter(invitations::Column::LobbyCode.eq(lobby_code))
        .filter(invitations::Column::Status.is_in([
            InvitationStatus::Pending.to_value(),
            InvitationStatus::Accepted.to_value(),
        ]))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Mark the live row for the triple accepted on a direct join, with
/// `guest_ready` cleared. Returns rows changed.
pub async fn accept_on_join<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    lobby_code: &str,
    sender_id: i64,
    receiver_id: i64,
    host_ready: bool,
) -> Result<u64, DbErr> {
    let result = invitations::Entity::update_many()
        .col_expr(
            invitations::Column::Status,
            Expr::value(InvitationStatus::Accepted.to_value()),
        )
        .col_expr(invitations::Column::HostReady, Expr::value(host_ready))
        .col_expr(invitations::Column::GuestReady, Expr::value(false))
        .col_expr(
            invitations::Column::UpdatedAt,
            Expr::value(OffsetDateTime::now_utc()),
        )
        .filter(triple(lobby_code, sender_id, receiver_id))
        .filter(invitations::Column::Status.is_in([
            InvitationStatus::Pending.to_value(),
            InvitationStatus::Accepted.to_value(),
        ]))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}
