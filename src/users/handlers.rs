use axum::{
    extract::{
        multipart::MultipartRejection, rejection::QueryRejection, DefaultBodyLimit, Multipart,
        Path, Query, State,
    },
    routing::{get, put},
    Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::extractors::{AuthAdmin, AuthUser},
    error::{ApiError, ApiJson, ApiResult},
    images::services::{store_profile_image, StoredImage, UploadItem},
    response::Envelope,
    state::AppState,
    users::{
        dto::{
            Pagination, ProfileResponse, StatusRequest, UpdatedProfileResponse, UserListResponse,
            UserStatusResponse, UserSummary,
        },
        repo_types::ProfileChanges,
    },
};

pub fn profile_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile))
        .route(
            "/update-profile",
            put(update_profile).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/get-users", get(list_users))
        .route("/:user_id/status", put(change_status))
}

fn user_not_found() -> ApiError {
    ApiError::NotFound("User not found".into())
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Envelope<ProfileResponse>> {
    let user = state
        .users
        .find_by_id(user_id)
        .await
        .map_err(ApiError::internal("Something went wrong"))?
        .ok_or_else(user_not_found)?;

    Ok(Envelope::ok(ProfileResponse {
        user_profile: user.into(),
    }))
}

/// Multipart fields: optional `name`, `phone` and file `profileImage`.
/// Blank fields are ignored; only what is present overwrites the record.
#[instrument(skip(state, multipart))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Envelope<UpdatedProfileResponse>> {
    let mut mp = multipart?;
    let mut changes = ProfileChanges::default();
    let mut image = None;

    while let Some(field) = mp.next_field().await? {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("name") | Some("phone") => {
                let value = field.text().await?;
                let value = value.trim();
                if value.is_empty() {
                    continue;
                }
                if name.as_deref() == Some("name") {
                    changes.name = Some(value.to_string());
                } else {
                    changes.phone = Some(value.to_string());
                }
            }
            Some("profileImage") => {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".into());
                let body = field.bytes().await?;
                // browsers send an empty part when no file was picked
                if !body.is_empty() {
                    image = Some((body, content_type));
                }
            }
            _ => {}
        }
    }

    let stored: Option<StoredImage> = match image {
        Some((body, content_type)) => Some(
            store_profile_image(
                state.storage.as_ref(),
                UploadItem {
                    body,
                    content_type: &content_type,
                },
            )
            .await?,
        ),
        None => None,
    };
    if let Some(img) = &stored {
        info!(%user_id, key = %img.key, "profile image stored");
        changes.profile_image = Some(img.url.clone());
    }

    let result = if changes.is_empty() {
        state.users.find_by_id(user_id).await
    } else {
        state.users.update_profile(user_id, changes).await
    };

    let user = match result {
        Ok(Some(user)) => user,
        Ok(None) => {
            discard_image(&state, stored.as_ref()).await;
            warn!(%user_id, "profile update for unknown user");
            return Err(user_not_found());
        }
        Err(e) => {
            discard_image(&state, stored.as_ref()).await;
            return Err(ApiError::internal("Failed to update profile")(e));
        }
    };

    info!(%user_id, "profile updated");
    Ok(Envelope::ok(UpdatedProfileResponse { user: user.into() })
        .with_message("Profile updated successfully"))
}

async fn discard_image(state: &AppState, stored: Option<&StoredImage>) {
    if let Some(img) = stored {
        if let Err(e) = state.storage.delete_object(&img.key).await {
            error!(error = %e, key = %img.key, "failed to remove orphaned image");
        }
    }
}

#[instrument(skip(state, query))]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    query: Result<Query<Pagination>, QueryRejection>,
) -> ApiResult<Envelope<UserListResponse>> {
    let Query(p) = query?;
    if p.limit.is_some_and(|l| l < 0) || p.offset < 0 {
        return Err(ApiError::Validation(
            "limit and offset must not be negative".into(),
        ));
    }

    let users = state
        .users
        .list(p.limit, p.offset)
        .await
        .map_err(ApiError::internal("Failed to fetch users"))?;

    Ok(Envelope::ok(UserListResponse {
        users: users.into_iter().map(UserSummary::from).collect(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn change_status(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    Path(user_id): Path<String>,
    ApiJson(payload): ApiJson<StatusRequest>,
) -> ApiResult<Envelope<UserStatusResponse>> {
    let status = payload
        .status
        .as_bool()
        .ok_or_else(|| ApiError::Validation("Status must be true or false".into()))?;

    // an id that cannot be a user id is simply a user we do not have
    let user_id = Uuid::parse_str(&user_id).map_err(|_| user_not_found())?;

    let user = state
        .users
        .set_status(user_id, status)
        .await
        .map_err(ApiError::internal("Error updating user status"))?
        .ok_or_else(user_not_found)?;

    info!(%user_id, status, "user status changed");
    Ok(Envelope::ok(UserStatusResponse { user: user.into() }).with_message("User status updated"))
}
