use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::IntoResponse,
};
use engine::EngineError;

use serde::Serialize;
pub use server::{ServerState, router, run_with_listener};

mod balance;
mod expenses;
mod extract;
mod pairing;
mod profile;
mod server;

pub mod types {
    pub mod profile {
        pub use api_types::profile::{ProfileNew, ProfileUpdate, ProfileView};
    }

    pub mod pairing {
        pub use api_types::pairing::{CoupleView, PairingState, PartnersResponse};
    }

    pub mod invitation {
        pub use api_types::invitation::{
            CoupleCreated, InvitationList, InvitationNew, InvitationView,
        };
    }

    pub mod expense {
        pub use api_types::expense::{ExpenseList, ExpenseNew, ExpenseUpdate, ExpenseView};
    }

    pub mod balance {
        pub use api_types::balance::{BalanceView, CategoryTotal, Settlement, SettlementMode};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
    /// Missing or blank identity headers.
    Unauthorized(String),
    /// The request could not be extracted (malformed JSON, a bad path id).
    Rejected(StatusCode, String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_)
        | EngineError::AlreadyPaired(_)
        | EngineError::InvitationAlreadyAccepted(_) => StatusCode::CONFLICT,
        EngineError::InvitationExpired(_) => StatusCode::GONE,
        EngineError::InvalidAmount(_) | EngineError::InvalidField(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        EngineError::InvalidId(_) | EngineError::Storage(_) | EngineError::Database(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::Storage(msg) | EngineError::InvalidId(msg) => {
            tracing::error!("storage error: {msg}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
            ServerError::Unauthorized(err) => (StatusCode::UNAUTHORIZED, err),
            ServerError::Rejected(status, err) => (status, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for ServerError {
    fn from(rejection: PathRejection) -> Self {
        Self::Rejected(rejection.status(), rejection.body_text())
    }
}
