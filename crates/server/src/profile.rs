//! Profile endpoints: onboarding, edits, avatar upload and account deletion.

use axum::{Extension, body::Bytes, extract::State, http::StatusCode};

use api_types::profile::{ProfileNew, ProfileUpdate, ProfileView};
use engine::{Identity, Profile};

use crate::{
    ServerError,
    extract::{Json, Path},
    server::ServerState,
};

pub(crate) fn profile_view(profile: Profile) -> ProfileView {
    ProfileView {
        id: profile.id,
        name: profile.name,
        avatar_url: profile.avatar_url,
        color: profile.color,
        couple_id: profile.couple_id,
        created_at: profile.created_at,
    }
}

pub async fn get(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
) -> Result<Json<ProfileView>, ServerError> {
    let profile = state.engine.profile(&identity).await?;
    Ok(Json(profile_view(profile)))
}

pub async fn create(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Json(payload): Json<ProfileNew>,
) -> Result<(StatusCode, Json<ProfileView>), ServerError> {
    let profile = state
        .engine
        .create_profile(
            &payload.name,
            payload.avatar_url.as_deref(),
            payload.color.as_deref(),
            &identity,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(profile_view(profile))))
}

pub async fn update(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<ProfileView>, ServerError> {
    let update = engine::ProfileUpdate {
        name: payload.name,
        avatar_url: payload.avatar_url,
        color: payload.color,
    };
    let profile = state.engine.update_profile(update, &identity).await?;
    Ok(Json(profile_view(profile)))
}

/// Deletes the caller's profile, their expenses and invitations, and
/// dissolves their couple.
pub async fn delete(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_profile(&identity).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Raw image bytes in the body; the file name comes from the path.
pub async fn upload_avatar(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Path(filename): Path<String>,
    body: Bytes,
) -> Result<Json<ProfileView>, ServerError> {
    let profile = state
        .engine
        .upload_avatar(&filename, &body, &identity)
        .await?;
    Ok(Json(profile_view(profile)))
}
