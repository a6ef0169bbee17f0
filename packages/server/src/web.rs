//! HTTP routes
//!
//! `GET /`는 응답 전에 수집을 한 번 실행합니다. 수집 실패는 기록만 되고
//! 이미 저장된 공고로 페이지를 그립니다. 수집 중에는 저장소 연결을 잡지 않으므로
//! 느린 수집이 검색 요청을 막지 않습니다.
use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use supportfund::{
    NoticeSource, Store,
    core::{ingest_or_log, today_kst},
};
use thiserror::Error;

use crate::render::render_index;

pub struct AppState<S> {
    store: Store,
    source: Arc<S>,
}

impl<S> AppState<S> {
    pub fn new(store: Store, source: S) -> Self {
        Self {
            store,
            source: Arc::new(source),
        }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            source: Arc::clone(&self.source),
        }
    }
}

pub fn router<S>(state: AppState<S>) -> Router
where
    S: NoticeSource + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(index::<S>))
        .route("/search", get(search::<S>))
        .route("/health", get(health))
        .with_state(state)
}

#[derive(Deserialize, Debug)]
pub struct SearchParams {
    #[serde(default)]
    keyword: String,
}

#[derive(Debug, Error)]
enum PageError {
    #[error("store error: {0}")]
    Store(#[from] supportfund::Error),
    #[error("render error: {0}")]
    Render(#[from] tinytemplate::error::Error),
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Failed to build the page");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "공고 목록을 불러오지 못했습니다.",
        )
            .into_response()
    }
}

async fn index<S>(State(state): State<AppState<S>>) -> Result<Html<String>, PageError>
where
    S: NoticeSource + Send + Sync + 'static,
{
    ingest_or_log(state.source.as_ref(), &state.store).await;
    let mut session = state.store.session().await?;
    let announcements = session.list_recent().await?;
    Ok(Html(render_index(&announcements, None, today_kst())?))
}

async fn search<S>(
    State(state): State<AppState<S>>,
    Query(params): Query<SearchParams>,
) -> Result<Html<String>, PageError>
where
    S: NoticeSource + Send + Sync + 'static,
{
    let mut session = state.store.session().await?;
    let announcements = session.search(&params.keyword).await?;
    Ok(Html(render_index(
        &announcements,
        Some(&params.keyword),
        today_kst(),
    )?))
}

async fn health() -> StatusCode {
    StatusCode::OK
}
