//! Axum handlers for the `/api/research...` surface (spec.md §6), grounded in
//! the teacher's handler-per-route style: thin functions that validate,
//! delegate to a collaborator, and map the result into a DTO.

use super::dto::{
    validate_create_request, CountryDto, CreateJobRequest, CreateJobResponse, DeleteResponse,
    HealthResponse, HealthServices, JobView,
};
use crate::core::app_state::AppState;
use crate::core::config::COUNTRIES;
use crate::core::types::Job;
use crate::error::{AppError, AppResult};
use crate::export;
use crate::rate_limit::RateLimitOutcome;
use axum::extract::{ConnectInfo, Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use uuid::Uuid;

pub async fn create_job(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(request): Json<CreateJobRequest>,
) -> AppResult<Json<CreateJobResponse>> {
    match state.rate_limiter.check(addr.ip()).await {
        RateLimitOutcome::Limited { retry_after_secs } => {
            return Err(AppError::RateLimited { retry_after_secs });
        }
        RateLimitOutcome::Allowed => {}
    }

    validate_create_request(&request.url, &request.country)?;

    let options = match request.options {
        Some(input) => input.into_options()?,
        None => crate::core::types::JobOptions::default(),
    };

    let job = Job::new(request.url, request.country, request.language, options, Some(addr.ip().to_string()));
    let job_id = job.id;

    state.store.insert(job).await;

    let orchestrator = state.orchestrator.clone();
    let store = state.store.clone();
    tokio::spawn(async move {
        orchestrator.run(store, job_id).await;
    });

    Ok(Json(CreateJobResponse { job_id, status: "processing" }))
}

pub async fn get_job(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> AppResult<Json<JobView>> {
    let job = state.store.get(id).await.ok_or(AppError::NotFound)?;
    Ok(Json(JobView::from(&job)))
}

pub async fn delete_job(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> AppResult<Json<DeleteResponse>> {
    let job = state.store.remove(id).await.ok_or(AppError::NotFound)?;
    Ok(Json(DeleteResponse { message: "job deleted", job_id: job.id }))
}

pub async fn export_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Response> {
    let job = state.store.get(id).await.ok_or(AppError::NotFound)?;
    let result = job.data.as_ref().ok_or_else(|| AppError::InvalidInput("job has not completed".into()))?;

    let format = params.get("format").map(|s| s.as_str()).unwrap_or("json");
    match format {
        "csv" => {
            let csv = export::to_csv(result);
            Ok((
                [("content-type", "text/csv"), ("content-disposition", "attachment; filename=\"keywords.csv\"")],
                csv,
            )
                .into_response())
        }
        "json" => {
            let json = export::to_json(result)?;
            Ok((
                [("content-type", "application/json"), ("content-disposition", "attachment; filename=\"keywords.json\"")],
                json,
            )
                .into_response())
        }
        other => Err(AppError::InvalidInput(format!("unknown export format: {other}"))),
    }
}

pub async fn list_countries() -> Json<Vec<CountryDto>> {
    Json(
        COUNTRIES
            .iter()
            .map(|c| CountryDto { code: c.code, name: c.name, default_language: c.default_language, currency: c.currency })
            .collect(),
    )
}

pub async fn list_languages() -> Json<&'static [&'static str]> {
    Json(crate::core::config::SUPPORTED_LANGUAGES)
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime: state.uptime_secs(),
        services: HealthServices { metrics: state.metrics_configured, ai: state.ai.is_available() },
    })
}
