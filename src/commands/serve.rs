use std::collections::HashMap;
use std::net::SocketAddr;

use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Json, Router};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::controllers::paste::{PasteStore, URL_LANGUAGE};
use crate::error::AppError;
use crate::types::api::SaveForm;
use crate::App;

/// The manual for the program in man page form.
const MAN_PAGE: &str = include_str!("../../assets/man.txt");

pub async fn run(app: App) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], app.config.port));
    let router = router(app);

    info!("listening on {addr}");
    axum::Server::bind(&addr)
        .serve(router.into_make_service())
        .await?;

    Ok(())
}

pub fn router(app: App) -> Router {
    let max_upload_size = app.config.limits.max_upload_size;
    Router::new()
        .route("/", get(index).post(save_paste))
        .route("/:id", get(get_paste).delete(delete_paste))
        .route("/:id/raw", get(get_raw))
        .route("/:id/download", get(download_paste))
        .layer(DefaultBodyLimit::max(max_upload_size))
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}

async fn index() -> &'static str {
    MAN_PAGE
}

async fn save_paste(
    State(store): State<PasteStore>,
    Form(form): Form<SaveForm>,
) -> crate::AppResult<Response> {
    // nothing to save, back to the start page
    if form.p.is_empty() {
        return Ok(Redirect::to("/").into_response());
    }

    let saved = store.save(&form.p, &form.expiry, &form.lang).await?;
    let path = format!("/{}", saved.id);

    Ok((StatusCode::CREATED, [(header::LOCATION, path)], Json(saved)).into_response())
}

async fn get_paste(
    State(store): State<PasteStore>,
    Path(id): Path<String>,
) -> crate::AppResult<Response> {
    let paste = store.get(&id).await?;
    if paste.language == URL_LANGUAGE {
        // links that can't go in a Location header are shown as text instead
        if let Ok(location) = HeaderValue::try_from(&paste.content) {
            let redirect = (StatusCode::PERMANENT_REDIRECT, [(header::LOCATION, location)]);
            return Ok(redirect.into_response());
        }
    }
    Ok(paste.content.into_response())
}

async fn get_raw(
    State(store): State<PasteStore>,
    Path(id): Path<String>,
) -> crate::AppResult<impl IntoResponse> {
    let paste = store.get(&id).await?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        paste.content,
    ))
}

async fn download_paste(
    State(store): State<PasteStore>,
    Path(id): Path<String>,
) -> crate::AppResult<impl IntoResponse> {
    let paste = store.get(&id).await?;
    // ids are alphanumeric, safe to put in a header as is
    let disposition = format!("attachment; filename={id}");
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_owned()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        paste.content,
    ))
}

async fn delete_paste(
    State(store): State<PasteStore>,
    Query(params): Query<HashMap<String, String>>,
    Path(id): Path<String>,
) -> crate::AppResult<impl IntoResponse> {
    let delete_key = params
        .get("delete_key")
        .ok_or_else(|| AppError::MissingDeleteKey)?;

    store.delete(&id, delete_key).await?;
    Ok(StatusCode::NO_CONTENT)
}
