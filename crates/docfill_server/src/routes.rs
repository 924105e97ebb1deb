//! HTTP handlers.

use std::collections::HashMap;

use axum::{
    extract::{Form, Path, Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Json, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use docfill_core::GenerateRequest;
use docfill_templates::FieldDefinition;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::i18n::{Table, LANG_COOKIE};
use crate::AppState;

/// Lifetime of the language cookie.
const LANG_COOKIE_MAX_AGE_DAYS: i64 = 365;

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub lang: String,
    pub t: Table,
    pub templates: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FillResponse {
    pub lang: String,
    pub t: Table,
    pub tpl: String,
    pub fields: Vec<FieldDefinition>,
}

#[derive(Debug, Deserialize)]
pub struct SetLangQuery {
    pub lang: Option<String>,
}

/// Language for a request, from its cookie and `Accept-Language` header.
fn request_lang(state: &AppState, jar: &CookieJar, headers: &HeaderMap) -> String {
    let cookie = jar.get(LANG_COOKIE).map(|c| c.value());
    let accept = headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok());
    state.translations.resolve(cookie, accept)
}

/// GET /
pub async fn index(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> ApiResult<Json<IndexResponse>> {
    let lang = request_lang(&state, &jar, &headers);
    let templates = state.service.load_templates().await?;

    Ok(Json(IndexResponse {
        t: state.translations.table(&lang),
        lang,
        templates,
    }))
}

/// GET /fill/:tpl
pub async fn fill(
    State(state): State<AppState>,
    Path(tpl): Path<String>,
    jar: CookieJar,
    headers: HeaderMap,
) -> ApiResult<Json<FillResponse>> {
    let lang = request_lang(&state, &jar, &headers);
    let fields = state.service.load_field_schema(&tpl).await?;
    debug!("Serving {} field(s) for {}", fields.len(), tpl);

    Ok(Json(FillResponse {
        t: state.translations.table(&lang),
        lang,
        tpl,
        fields,
    }))
}

/// POST /generate
pub async fn generate(
    State(state): State<AppState>,
    Form(form): Form<HashMap<String, String>>,
) -> ApiResult<Response> {
    let request = GenerateRequest::from_form(form)?;
    let artifact = state.service.generate(&request).await?;
    info!("Serving {} ({})", artifact.file_name, artifact.media_type);

    let disposition = format!("attachment; filename=\"{}\"", artifact.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, artifact.media_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    )
        .into_response())
}

/// GET /set_lang?lang=xx
pub async fn set_lang(
    State(state): State<AppState>,
    Query(query): Query<SetLangQuery>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Response {
    let lang = query
        .lang
        .filter(|l| state.translations.is_available(l))
        .unwrap_or_else(|| state.translations.default_lang().to_string());
    let target = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .filter(|r| !r.is_empty())
        .unwrap_or("/")
        .to_string();

    let cookie = Cookie::build((LANG_COOKIE, lang))
        .path("/")
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(LANG_COOKIE_MAX_AGE_DAYS));
    (jar.add(cookie), Redirect::temporary(&target)).into_response()
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
