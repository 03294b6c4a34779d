//! Request handlers

use super::route::{PathParams, Route};
use super::AppState;
use crate::error::ProxyError;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use tracing::{error, info_span, warn, Instrument};
use uuid::Uuid;

static LANDING_PAGE: &[u8] = include_bytes!("../../assets/index.html");

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response();
        response.headers_mut().insert(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        );
        response
    }
}

/// Single entry point: every path is dispatched by its suffix
pub(super) async fn dispatch(State(state): State<AppState>, uri: Uri) -> Response {
    let path = uri.path().to_string();
    let route = Route::classify(&path);
    let span = info_span!("request", id = %Uuid::new_v4(), path = %path, route = ?route);

    async move {
        let result = match route {
            Route::Script => script(&state, &path).await,
            Route::Binary => binary(&state, &path).await,
            Route::Bundle => bundle(&state, &path).await,
            Route::Favicon => Ok(Bytes::new()),
            Route::Landing => Ok(Bytes::from_static(LANDING_PAGE)),
        };

        match result {
            Ok(body) => artifact(route, body),
            Err(e) if e.is_upstream() => {
                warn!(error = %e, "upstream request failed");
                e.into_response()
            }
            Err(e) => {
                error!(error = %e, "request failed");
                e.into_response()
            }
        }
    }
    .instrument(span)
    .await
}

async fn script(state: &AppState, path: &str) -> Result<Bytes, ProxyError> {
    let version = PathParams::extract(path).version.unwrap_or_default();
    Ok(state.runtimes.get(&version).await?.script)
}

async fn binary(state: &AppState, path: &str) -> Result<Bytes, ProxyError> {
    let version = PathParams::extract(path).version.unwrap_or_default();
    Ok(state.runtimes.get(&version).await?.binary)
}

async fn bundle(state: &AppState, path: &str) -> Result<Bytes, ProxyError> {
    let params = PathParams::extract(path);
    state
        .bundles
        .fetch(
            params.org.as_deref().unwrap_or_default(),
            params.repo.as_deref().unwrap_or_default(),
            params.release.as_deref().unwrap_or_default(),
        )
        .await
}

fn artifact(route: Route, body: Bytes) -> Response {
    let mut response = body.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(route.content_type()),
    );
    if let Some(cache_control) = route.cache_control() {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(cache_control));
    }
    response
}
