//! HTTP handlers. Each one unpacks the request and calls into [`Board`].

use super::extract::{ApiJson, ApiQuery, CurrentUser};
use crate::board::{
    AddCollaboratorInput, Board, CreateDomainInput, CreateParentTaskInput, CreateTaskInput,
    LoginInput, LoginResponse, Me, PinInput, PostMessageInput, RegisterInput, SetRoleInput,
    TaskQuery, UpdateParentTaskInput, UpdateTaskInput, UserTopicInput,
};
use crate::error::{ApiError, ApiResult};
use crate::topics::TopicCatalog;
use crate::types::{
    BoardColumn, Collaborator, DiscussionMessage, Domain, EntityType, ParentTaskDetail,
    ParentTaskView, TaskView, User, UserTopic,
};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// =============================================================================
// Auth
// =============================================================================

/// Run password hashing work off the async worker threads.
async fn blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(ApiError::internal)?
}

pub async fn register(
    State(board): State<Board>,
    ApiJson(input): ApiJson<RegisterInput>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = blocking(move || board.register(input)).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(board): State<Board>,
    ApiJson(input): ApiJson<LoginInput>,
) -> ApiResult<Json<LoginResponse>> {
    Ok(Json(blocking(move || board.login(input)).await?))
}

pub async fn logout(State(board): State<Board>, user: CurrentUser) -> ApiResult<StatusCode> {
    board.logout(&user.token)?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Users and topics
// =============================================================================

pub async fn me(State(board): State<Board>, user: CurrentUser) -> ApiResult<Json<Me>> {
    Ok(Json(board.me(&user.actor)?))
}

pub async fn list_users(State(board): State<Board>, user: CurrentUser) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(board.list_users(&user.actor)?))
}

pub async fn set_user_role(
    State(board): State<Board>,
    user: CurrentUser,
    Path(user_id): Path<String>,
    ApiJson(input): ApiJson<SetRoleInput>,
) -> ApiResult<Json<User>> {
    Ok(Json(board.set_user_role(&user.actor, &user_id, input)?))
}

pub async fn user_topics(
    State(board): State<Board>,
    user: CurrentUser,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<UserTopic>>> {
    Ok(Json(board.user_topics(&user.actor, &user_id)?))
}

pub async fn add_user_topic(
    State(board): State<Board>,
    user: CurrentUser,
    Path(user_id): Path<String>,
    ApiJson(input): ApiJson<UserTopicInput>,
) -> ApiResult<(StatusCode, Json<Vec<UserTopic>>)> {
    let topics = board.add_user_topic(&user.actor, &user_id, input)?;
    Ok((StatusCode::CREATED, Json(topics)))
}

pub async fn remove_user_topic(
    State(board): State<Board>,
    user: CurrentUser,
    Path(user_id): Path<String>,
    ApiQuery(input): ApiQuery<UserTopicInput>,
) -> ApiResult<Json<Vec<UserTopic>>> {
    Ok(Json(board.remove_user_topic(&user.actor, &user_id, input)?))
}

pub async fn catalog(State(board): State<Board>, _user: CurrentUser) -> Json<TopicCatalog> {
    Json(board.catalog().clone())
}

// =============================================================================
// Domains
// =============================================================================

pub async fn list_domains(State(board): State<Board>, user: CurrentUser) -> ApiResult<Json<Vec<Domain>>> {
    Ok(Json(board.list_domains(&user.actor)?))
}

pub async fn create_domain(
    State(board): State<Board>,
    user: CurrentUser,
    ApiJson(input): ApiJson<CreateDomainInput>,
) -> ApiResult<(StatusCode, Json<Domain>)> {
    Ok((StatusCode::CREATED, Json(board.create_domain(&user.actor, input)?)))
}

pub async fn delete_domain(
    State(board): State<Board>,
    user: CurrentUser,
    Path(domain_id): Path<String>,
) -> ApiResult<StatusCode> {
    board.delete_domain(&user.actor, &domain_id)?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Parent tasks
// =============================================================================

pub async fn list_parent_tasks(
    State(board): State<Board>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<ParentTaskView>>> {
    Ok(Json(board.list_parent_tasks(&user.actor)?))
}

pub async fn create_parent_task(
    State(board): State<Board>,
    user: CurrentUser,
    ApiJson(input): ApiJson<CreateParentTaskInput>,
) -> ApiResult<(StatusCode, Json<ParentTaskView>)> {
    let parent = board.create_parent_task(&user.actor, input)?;
    Ok((StatusCode::CREATED, Json(parent)))
}

pub async fn get_parent_task(
    State(board): State<Board>,
    user: CurrentUser,
    Path(parent_id): Path<String>,
) -> ApiResult<Json<ParentTaskDetail>> {
    Ok(Json(board.get_parent_task(&user.actor, &parent_id)?))
}

pub async fn update_parent_task(
    State(board): State<Board>,
    user: CurrentUser,
    Path(parent_id): Path<String>,
    ApiJson(input): ApiJson<UpdateParentTaskInput>,
) -> ApiResult<Json<ParentTaskView>> {
    Ok(Json(board.update_parent_task(&user.actor, &parent_id, input)?))
}

pub async fn delete_parent_task(
    State(board): State<Board>,
    user: CurrentUser,
    Path(parent_id): Path<String>,
) -> ApiResult<StatusCode> {
    board.delete_parent_task(&user.actor, &parent_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn parent_task_messages(
    State(board): State<Board>,
    user: CurrentUser,
    Path(parent_id): Path<String>,
) -> ApiResult<Json<Vec<DiscussionMessage>>> {
    Ok(Json(board.messages(&user.actor, EntityType::ParentTask, &parent_id)?))
}

pub async fn post_parent_task_message(
    State(board): State<Board>,
    user: CurrentUser,
    Path(parent_id): Path<String>,
    ApiJson(input): ApiJson<PostMessageInput>,
) -> ApiResult<(StatusCode, Json<DiscussionMessage>)> {
    let message = board.post_message(&user.actor, EntityType::ParentTask, &parent_id, input)?;
    Ok((StatusCode::CREATED, Json(message)))
}

// =============================================================================
// Tasks
// =============================================================================

pub async fn list_tasks(
    State(board): State<Board>,
    user: CurrentUser,
    ApiQuery(query): ApiQuery<TaskQuery>,
) -> ApiResult<Json<Vec<TaskView>>> {
    Ok(Json(board.list_tasks(&user.actor, query)?))
}

pub async fn my_tasks(
    State(board): State<Board>,
    user: CurrentUser,
    ApiQuery(query): ApiQuery<TaskQuery>,
) -> ApiResult<Json<Vec<TaskView>>> {
    Ok(Json(board.my_tasks(&user.actor, query)?))
}

pub async fn board_columns(
    State(board): State<Board>,
    user: CurrentUser,
    ApiQuery(query): ApiQuery<TaskQuery>,
) -> ApiResult<Json<Vec<BoardColumn>>> {
    Ok(Json(board.board(&user.actor, query)?))
}

pub async fn create_task(
    State(board): State<Board>,
    user: CurrentUser,
    ApiJson(input): ApiJson<CreateTaskInput>,
) -> ApiResult<(StatusCode, Json<TaskView>)> {
    Ok((StatusCode::CREATED, Json(board.create_task(&user.actor, input)?)))
}

pub async fn get_task(
    State(board): State<Board>,
    user: CurrentUser,
    Path(task_id): Path<String>,
) -> ApiResult<Json<TaskView>> {
    Ok(Json(board.get_task(&user.actor, &task_id)?))
}

pub async fn update_task(
    State(board): State<Board>,
    user: CurrentUser,
    Path(task_id): Path<String>,
    ApiJson(input): ApiJson<UpdateTaskInput>,
) -> ApiResult<Json<TaskView>> {
    Ok(Json(board.update_task(&user.actor, &task_id, input)?))
}

pub async fn delete_task(
    State(board): State<Board>,
    user: CurrentUser,
    Path(task_id): Path<String>,
) -> ApiResult<StatusCode> {
    board.delete_task(&user.actor, &task_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn task_messages(
    State(board): State<Board>,
    user: CurrentUser,
    Path(task_id): Path<String>,
) -> ApiResult<Json<Vec<DiscussionMessage>>> {
    Ok(Json(board.messages(&user.actor, EntityType::Task, &task_id)?))
}

pub async fn post_task_message(
    State(board): State<Board>,
    user: CurrentUser,
    Path(task_id): Path<String>,
    ApiJson(input): ApiJson<PostMessageInput>,
) -> ApiResult<(StatusCode, Json<DiscussionMessage>)> {
    let message = board.post_message(&user.actor, EntityType::Task, &task_id, input)?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn list_collaborators(
    State(board): State<Board>,
    user: CurrentUser,
    Path(task_id): Path<String>,
) -> ApiResult<Json<Vec<Collaborator>>> {
    Ok(Json(board.list_collaborators(&user.actor, &task_id)?))
}

pub async fn add_collaborator(
    State(board): State<Board>,
    user: CurrentUser,
    Path(task_id): Path<String>,
    ApiJson(input): ApiJson<AddCollaboratorInput>,
) -> ApiResult<Json<Vec<Collaborator>>> {
    Ok(Json(board.add_collaborator(&user.actor, &task_id, input)?))
}

pub async fn remove_collaborator(
    State(board): State<Board>,
    user: CurrentUser,
    Path((task_id, user_id)): Path<(String, String)>,
) -> ApiResult<Json<Vec<Collaborator>>> {
    Ok(Json(board.remove_collaborator(&user.actor, &task_id, &user_id)?))
}

// =============================================================================
// Pins
// =============================================================================

pub async fn pinned_tasks(State(board): State<Board>, user: CurrentUser) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(board.pinned_tasks(&user.actor)?))
}

pub async fn pin_task(
    State(board): State<Board>,
    user: CurrentUser,
    ApiJson(input): ApiJson<PinInput>,
) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(board.pin_task(&user.actor, input)?))
}

pub async fn unpin_task(
    State(board): State<Board>,
    user: CurrentUser,
    Path(task_id): Path<String>,
) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(board.unpin_task(&user.actor, &task_id)?))
}
