//! Account handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, put},
    Router,
};
use serde::Deserialize;
use validator::Validate;

use common::{AppError, AppResult, Page, PageRequest};
use domain::{CreateUser, UpdateUser, UserFilter, UserResponse, UserRole};

use crate::extractors::{JsonBody, ValidatedJson};
use crate::state::AppState;

/// Query string for the listing endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<String>,
    /// Substring of name or email
    pub q: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl ListUsersQuery {
    fn page_request(&self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest::new(
            self.page.unwrap_or(defaults.page),
            self.per_page.unwrap_or(defaults.per_page),
        )
    }
}

/// Lookup by exactly one unique field.
#[derive(Debug, Default, Deserialize)]
pub struct LookupQuery {
    pub email: Option<String>,
    pub cpf: Option<String>,
    pub cnpj: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetPasswordRequest {
    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: String,
}

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/lookup", get(lookup_user))
        .route("/:id", get(get_user).patch(update_user).delete(delete_user))
        .route("/:id/password", put(set_password))
}

pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateUser>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = state.users.create_user(payload).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> AppResult<Json<Page<UserResponse>>> {
    let role = query
        .role
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::parse::<UserRole>)
        .transpose()?;

    let page = query.page_request();
    let filter = UserFilter {
        role,
        search: query.q,
        offset: page.offset(),
        limit: page.limit(),
    };
    let (users, total) = state.users.list_users(filter).await?;

    Ok(Json(Page::new(users, page, total).map(UserResponse::from)))
}

pub async fn lookup_user(
    State(state): State<AppState>,
    Query(query): Query<LookupQuery>,
) -> AppResult<Json<UserResponse>> {
    let user = match (query.email, query.cpf, query.cnpj) {
        (Some(email), None, None) => state.users.get_user_by_email(&email).await?,
        (None, Some(cpf), None) => state.users.get_user_by_cpf(&cpf).await?,
        (None, None, Some(cnpj)) => state.users.get_user_by_cnpj(&cnpj).await?,
        _ => {
            return Err(AppError::bad_request(
                "Provide exactly one of 'email', 'cpf' or 'cnpj'",
            ))
        }
    };
    Ok(Json(UserResponse::from(user)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<UserResponse>> {
    let user = state.users.get_user(id).await?;
    Ok(Json(UserResponse::from(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(payload): JsonBody<UpdateUser>,
) -> AppResult<Json<UserResponse>> {
    let user = state.users.update_user(id, payload).await?;
    Ok(Json(UserResponse::from(user)))
}

pub async fn set_password(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<SetPasswordRequest>,
) -> AppResult<StatusCode> {
    state.users.set_password(id, &payload.password).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.users.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
