use axum::{
    Router,
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post, put},
};
use axum_extra::{
    TypedHeader,
    headers::{Error as AxumError, Header},
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use std::{path::Path, sync::Arc};

use crate::{ServerError, balance, expenses, pairing, profile};
use engine::{Engine, Identity};

static USER_ID_HEADER: HeaderName = HeaderName::from_static("x-user-id");
static USER_EMAIL_HEADER: HeaderName = HeaderName::from_static("x-user-email");

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// `TypedHeader` for the authenticated user id.
///
/// The identity provider in front of the server puts the opaque user id in
/// "x-user-id".
#[derive(Debug)]
struct UserIdHeader(String);

/// `TypedHeader` for the authenticated user's e-mail ("x-user-email"),
/// optional.
#[derive(Debug)]
struct UserEmailHeader(String);

fn decode_text<'i, I>(values: &mut I) -> Result<String, AxumError>
where
    I: Iterator<Item = &'i HeaderValue>,
{
    let value = values.next().ok_or_else(AxumError::invalid)?;
    let Ok(value) = value.to_str() else {
        return Err(AxumError::invalid());
    };
    Ok(value.to_string())
}

fn encode_text<E: Extend<HeaderValue>>(value: &str, values: &mut E, name: &HeaderName) {
    match HeaderValue::from_str(value) {
        Ok(value) => values.extend(std::iter::once(value)),
        Err(_) => tracing::error!("failed to encode {name} header"),
    }
}

impl Header for UserIdHeader {
    fn name() -> &'static HeaderName {
        &USER_ID_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, AxumError>
    where
        Self: Sized,
        I: Iterator<Item = &'i HeaderValue>,
    {
        decode_text(values).map(UserIdHeader)
    }

    fn encode<E: Extend<HeaderValue>>(&self, values: &mut E) {
        encode_text(&self.0, values, &USER_ID_HEADER);
    }
}

impl Header for UserEmailHeader {
    fn name() -> &'static HeaderName {
        &USER_EMAIL_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, AxumError>
    where
        Self: Sized,
        I: Iterator<Item = &'i HeaderValue>,
    {
        decode_text(values).map(UserEmailHeader)
    }

    fn encode<E: Extend<HeaderValue>>(&self, values: &mut E) {
        encode_text(&self.0, values, &USER_EMAIL_HEADER);
    }
}

/// Turns the identity headers into a request-scoped [`Identity`].
async fn identify(
    user_id: Option<TypedHeader<UserIdHeader>>,
    email: Option<TypedHeader<UserEmailHeader>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Some(TypedHeader(UserIdHeader(user_id))) = user_id else {
        return Err(ServerError::Unauthorized(
            "missing x-user-id header".to_string(),
        ));
    };
    let email = email.map(|TypedHeader(UserEmailHeader(email))| email);
    let identity = Identity::new(&user_id, email.as_deref())
        .map_err(|err| ServerError::Unauthorized(err.to_string()))?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Builds the API router. Uploaded avatars under `avatars_dir` are served
/// without authentication at `/avatars`.
pub fn router(state: ServerState, avatars_dir: &Path) -> Router {
    Router::new()
        .route(
            "/profile",
            get(profile::get)
                .post(profile::create)
                .patch(profile::update)
                .delete(profile::delete),
        )
        .route("/profile/avatar/{filename}", put(profile::upload_avatar))
        .route("/pairing", get(pairing::state))
        .route("/partners", get(pairing::partners))
        .route("/couple", get(pairing::couple))
        .route("/invitations", post(pairing::invite))
        .route("/invitations/pending", get(pairing::pending))
        .route("/invitations/sent", get(pairing::sent))
        .route("/invitations/code/{code}", get(pairing::by_code))
        .route(
            "/invitations/code/{code}/accept",
            post(pairing::accept_by_code),
        )
        .route("/invitations/{id}/accept", post(pairing::accept))
        .route("/expenses", get(expenses::list).post(expenses::create))
        .route(
            "/expenses/{id}",
            patch(expenses::update).delete(expenses::delete),
        )
        .route("/balance", get(balance::get))
        .route_layer(middleware::from_fn(identify))
        .nest_service("/avatars", ServeDir::new(avatars_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    avatars_dir: &Path,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
    };

    axum::serve(listener, router(state, avatars_dir)).await
}
