//! # Handlers
//!
//! Thin adapters from HTTP to the services: extract the caller, call one
//! service operation, pick the status code. Creates answer `201` with the new
//! id, updates, deletes and reorders answer `202`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use domains::models::{
    Background, BoardUpdate, BoardView, CardUpdate, CardView, ChecklistItem, ChecklistItemUpdate, ChecklistUpdate,
    ChecklistView, Comment, CommentUpdate, Credentials, ListUpdate, ListView, LogView, NewBackground, NewBoard,
    NewCard, NewChecklist, NewChecklistItem, NewComment, NewList, NewUser,
};
use domains::traits::TokenPair;

use crate::dto::{BoardsQuery, Created, LogsQuery, OrderRequest};
use crate::error::{ApiError, ID_NOT_MATCHING};
use crate::extract::{Caller, JsonBody, PathId, QueryParams};
use crate::state::AppState;

type ApiResult<T> = Result<T, ApiError>;

fn created(id: Uuid) -> (StatusCode, Json<Created>) {
    (StatusCode::CREATED, Json(Created { id }))
}

fn same_id(path: Uuid, body: Uuid) -> ApiResult<()> {
    if path != body {
        return Err(ApiError::bad_request(ID_NOT_MATCHING, format!("path id {path} differs from body id {body}")));
    }
    Ok(())
}

// --- Users ---

pub async fn register_user(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<NewUser>,
) -> ApiResult<(StatusCode, Json<Created>)> {
    let id = state.services.users.register(input).await?;
    Ok(created(id))
}

pub async fn authenticate(
    State(state): State<AppState>,
    JsonBody(credentials): JsonBody<Credentials>,
) -> ApiResult<Json<TokenPair>> {
    Ok(Json(state.services.users.authenticate(credentials).await?))
}

// --- Boards ---

pub async fn get_boards(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    QueryParams(query): QueryParams<BoardsQuery>,
) -> ApiResult<Json<Vec<BoardView>>> {
    Ok(Json(state.services.boards.get_boards(&ctx, query.archived).await?))
}

pub async fn get_board(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    PathId(id): PathId,
) -> ApiResult<Json<BoardView>> {
    Ok(Json(state.services.boards.get_board(&ctx, id).await?))
}

pub async fn create_board(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    JsonBody(input): JsonBody<NewBoard>,
) -> ApiResult<(StatusCode, Json<Created>)> {
    Ok(created(state.services.boards.create_board(&ctx, input).await?))
}

pub async fn update_board(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    PathId(id): PathId,
    JsonBody(input): JsonBody<BoardUpdate>,
) -> ApiResult<StatusCode> {
    same_id(id, input.id)?;
    state.services.boards.update_board(&ctx, input).await?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn delete_board(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    PathId(id): PathId,
) -> ApiResult<StatusCode> {
    state.services.boards.delete_board(&ctx, id).await?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn reorder_lists(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    PathId(id): PathId,
    JsonBody(order): JsonBody<OrderRequest>,
) -> ApiResult<StatusCode> {
    state.services.boards.reorder_lists(&ctx, id, &order.idsordered).await?;
    Ok(StatusCode::ACCEPTED)
}

// --- Lists ---

pub async fn get_list(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    PathId(id): PathId,
) -> ApiResult<Json<ListView>> {
    Ok(Json(state.services.lists.get_list(&ctx, id).await?))
}

pub async fn create_list(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    JsonBody(input): JsonBody<NewList>,
) -> ApiResult<(StatusCode, Json<Created>)> {
    Ok(created(state.services.lists.create_list(&ctx, input).await?))
}

pub async fn update_list(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    PathId(id): PathId,
    JsonBody(input): JsonBody<ListUpdate>,
) -> ApiResult<StatusCode> {
    same_id(id, input.id)?;
    state.services.lists.update_list(&ctx, input).await?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn delete_list(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    PathId(id): PathId,
) -> ApiResult<StatusCode> {
    state.services.lists.delete_list(&ctx, id).await?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn reorder_cards(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    PathId(id): PathId,
    JsonBody(order): JsonBody<OrderRequest>,
) -> ApiResult<StatusCode> {
    state.services.lists.reorder_cards(&ctx, id, &order.idsordered).await?;
    Ok(StatusCode::ACCEPTED)
}

// --- Cards ---

pub async fn get_card(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    PathId(id): PathId,
) -> ApiResult<Json<CardView>> {
    Ok(Json(state.services.cards.get_card(&ctx, id).await?))
}

pub async fn create_card(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    JsonBody(input): JsonBody<NewCard>,
) -> ApiResult<(StatusCode, Json<Created>)> {
    Ok(created(state.services.cards.create_card(&ctx, input).await?))
}

pub async fn update_card(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    PathId(id): PathId,
    JsonBody(input): JsonBody<CardUpdate>,
) -> ApiResult<StatusCode> {
    same_id(id, input.id)?;
    state.services.cards.update_card(&ctx, input).await?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn delete_card(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    PathId(id): PathId,
) -> ApiResult<StatusCode> {
    state.services.cards.delete_card(&ctx, id).await?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn get_card_comments(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    PathId(id): PathId,
) -> ApiResult<Json<Vec<Comment>>> {
    Ok(Json(state.services.comments.get_comments(&ctx, id).await?))
}

// --- Comments ---

pub async fn get_comment(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    PathId(id): PathId,
) -> ApiResult<Json<Comment>> {
    Ok(Json(state.services.comments.get_comment(&ctx, id).await?))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    JsonBody(input): JsonBody<NewComment>,
) -> ApiResult<(StatusCode, Json<Created>)> {
    Ok(created(state.services.comments.create_comment(&ctx, input).await?))
}

pub async fn update_comment(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    PathId(id): PathId,
    JsonBody(input): JsonBody<CommentUpdate>,
) -> ApiResult<StatusCode> {
    same_id(id, input.id)?;
    state.services.comments.update_comment(&ctx, input).await?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    PathId(id): PathId,
) -> ApiResult<StatusCode> {
    state.services.comments.delete_comment(&ctx, id).await?;
    Ok(StatusCode::ACCEPTED)
}

// --- Checklists ---

pub async fn get_checklist(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    PathId(id): PathId,
) -> ApiResult<Json<ChecklistView>> {
    Ok(Json(state.services.checklists.get_checklist(&ctx, id).await?))
}

pub async fn create_checklist(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    JsonBody(input): JsonBody<NewChecklist>,
) -> ApiResult<(StatusCode, Json<Created>)> {
    Ok(created(state.services.checklists.create_checklist(&ctx, input).await?))
}

pub async fn update_checklist(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    PathId(id): PathId,
    JsonBody(input): JsonBody<ChecklistUpdate>,
) -> ApiResult<StatusCode> {
    same_id(id, input.id)?;
    state.services.checklists.update_checklist(&ctx, input).await?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn delete_checklist(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    PathId(id): PathId,
) -> ApiResult<StatusCode> {
    state.services.checklists.delete_checklist(&ctx, id).await?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn reorder_checklist_items(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    PathId(id): PathId,
    JsonBody(order): JsonBody<OrderRequest>,
) -> ApiResult<StatusCode> {
    state.services.checklists.reorder_items(&ctx, id, &order.idsordered).await?;
    Ok(StatusCode::ACCEPTED)
}

// --- Checklist items ---

pub async fn get_checklist_item(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    PathId(id): PathId,
) -> ApiResult<Json<ChecklistItem>> {
    Ok(Json(state.services.checklists.get_checklist_item(&ctx, id).await?))
}

pub async fn create_checklist_item(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    JsonBody(input): JsonBody<NewChecklistItem>,
) -> ApiResult<(StatusCode, Json<Created>)> {
    Ok(created(state.services.checklists.create_checklist_item(&ctx, input).await?))
}

pub async fn update_checklist_item(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    PathId(id): PathId,
    JsonBody(input): JsonBody<ChecklistItemUpdate>,
) -> ApiResult<StatusCode> {
    same_id(id, input.id)?;
    state.services.checklists.update_checklist_item(&ctx, input).await?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn delete_checklist_item(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    PathId(id): PathId,
) -> ApiResult<StatusCode> {
    state.services.checklists.delete_checklist_item(&ctx, id).await?;
    Ok(StatusCode::ACCEPTED)
}

// --- Backgrounds ---

pub async fn get_backgrounds(State(state): State<AppState>, Caller(ctx): Caller) -> ApiResult<Json<Vec<Background>>> {
    Ok(Json(state.services.backgrounds.get_backgrounds(&ctx).await?))
}

pub async fn get_background(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    PathId(id): PathId,
) -> ApiResult<Json<Background>> {
    Ok(Json(state.services.backgrounds.get_background(&ctx, id).await?))
}

pub async fn create_background(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    JsonBody(input): JsonBody<NewBackground>,
) -> ApiResult<(StatusCode, Json<Created>)> {
    Ok(created(state.services.backgrounds.create_background(&ctx, input).await?))
}

pub async fn delete_background(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    PathId(id): PathId,
) -> ApiResult<StatusCode> {
    state.services.backgrounds.delete_background(&ctx, id).await?;
    Ok(StatusCode::ACCEPTED)
}

// --- Logs ---

pub async fn get_logs(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    QueryParams(query): QueryParams<LogsQuery>,
) -> ApiResult<Json<Vec<LogView>>> {
    Ok(Json(state.services.logs.get_logs(&ctx, query.board_id).await?))
}
