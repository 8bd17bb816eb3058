//! Pairing endpoints: invitations, acceptance and couple lookup.

use axum::{Extension, extract::State, http::StatusCode};
use uuid::Uuid;

use api_types::{
    invitation::{CoupleCreated, InvitationList, InvitationNew, InvitationView},
    pairing::{CoupleView, PairingState, PartnersResponse},
};
use engine::{Couple, Identity, Invitation, InvitationRecipient};

use crate::{
    ServerError,
    extract::{Json, Path},
    profile::profile_view,
    server::ServerState,
};

fn invitation_view(invitation: Invitation) -> InvitationView {
    InvitationView {
        id: invitation.id,
        sender_id: invitation.sender_id,
        recipient_id: invitation.recipient_id,
        recipient_email: invitation.recipient_email,
        code: invitation.code,
        created_at: invitation.created_at,
        expires_at: invitation.expires_at,
        accepted: invitation.accepted,
        accepted_at: invitation.accepted_at,
    }
}

fn couple_created(couple: Couple) -> CoupleCreated {
    CoupleCreated {
        id: couple.id,
        member_a: couple.member_a,
        member_b: couple.member_b,
        created_at: couple.created_at,
    }
}

fn invitation_list(invitations: Vec<Invitation>) -> InvitationList {
    InvitationList {
        invitations: invitations.into_iter().map(invitation_view).collect(),
    }
}

pub async fn state(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
) -> Result<Json<PairingState>, ServerError> {
    let pairing = match state.engine.pairing_state(&identity).await? {
        engine::PairingState::Unpaired => PairingState::Unpaired,
        engine::PairingState::InvitationSent => PairingState::InvitationSent,
        engine::PairingState::InvitationReceived => PairingState::InvitationReceived,
        engine::PairingState::Paired { couple_id } => PairingState::Paired { couple_id },
    };
    Ok(Json(pairing))
}

pub async fn partners(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
) -> Result<Json<PartnersResponse>, ServerError> {
    let partners = state
        .engine
        .available_partners(&identity)
        .await?
        .into_iter()
        .map(profile_view)
        .collect();
    Ok(Json(PartnersResponse { partners }))
}

pub async fn couple(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
) -> Result<Json<CoupleView>, ServerError> {
    let view = state.engine.couple(&identity).await?;
    Ok(Json(CoupleView {
        id: view.couple.id,
        created_at: view.couple.created_at,
        me: profile_view(view.me),
        partner: profile_view(view.partner),
    }))
}

pub async fn invite(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Json(payload): Json<InvitationNew>,
) -> Result<(StatusCode, Json<InvitationView>), ServerError> {
    let recipient = match (payload.recipient_id, payload.recipient_email) {
        (Some(id), None) => InvitationRecipient::Profile(id),
        (None, Some(email)) => InvitationRecipient::Email(email),
        _ => {
            return Err(ServerError::Generic(
                "exactly one of recipient_id and recipient_email is required".to_string(),
            ));
        }
    };
    let invitation = state
        .engine
        .create_invitation(recipient, &identity)
        .await?;
    Ok((StatusCode::CREATED, Json(invitation_view(invitation))))
}

pub async fn pending(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
) -> Result<Json<InvitationList>, ServerError> {
    let invitations = state.engine.pending_invitations(&identity).await?;
    Ok(Json(invitation_list(invitations)))
}

pub async fn sent(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
) -> Result<Json<InvitationList>, ServerError> {
    let invitations = state.engine.sent_invitations(&identity).await?;
    Ok(Json(invitation_list(invitations)))
}

pub async fn by_code(
    State(state): State<ServerState>,
    Path(code): Path<String>,
) -> Result<Json<InvitationView>, ServerError> {
    let invitation = state.engine.invitation_by_code(&code).await?;
    Ok(Json(invitation_view(invitation)))
}

pub async fn accept(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Path(invitation_id): Path<Uuid>,
) -> Result<Json<CoupleCreated>, ServerError> {
    let couple = state
        .engine
        .accept_invitation(invitation_id, &identity)
        .await?;
    Ok(Json(couple_created(couple)))
}

pub async fn accept_by_code(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Path(code): Path<String>,
) -> Result<Json<CoupleCreated>, ServerError> {
    let couple = state
        .engine
        .accept_invitation_by_code(&code, &identity)
        .await?;
    Ok(Json(couple_created(couple)))
}
