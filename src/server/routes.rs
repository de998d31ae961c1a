//! REST API routes, mounted under `/api`.
//!
//! - `GET /health`
//! - `GET /persona`, `/specialties`, `/approach`, `/hipaa`
//! - `GET /resources`, `GET /resources/{category}`
//! - `GET|PUT /patient/contact`, `GET|PUT /patient/medical`
//! - `GET /patient/summary`, `GET /patient/export`
//! - `GET|POST /consultations`
//! - `GET|PUT /settings/llm`
//! - `GET /audit` (`?format=csv` for CSV)

use super::error::Result;
use super::extract::ApiJson;
use crate::app::AppContext;
use crate::core::catalog::{
    self, Approach, HipaaNotice, HomePage, Resource, ResourceLibrary, Specialties,
};
use crate::core::AuditAction;
use crate::domain::model::{
    ConsultationRecord, ConsultationRequest, PatientContactInfo, PatientMedicalInfo,
    PatientSummary,
};
use crate::llm::{LlmSettingsUpdate, ProviderStatus};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub type SharedContext = Arc<AppContext>;

pub fn create_router() -> Router<SharedContext> {
    Router::new()
        .route("/health", get(health_check))
        .route("/persona", get(persona))
        .route("/specialties", get(specialties))
        .route("/approach", get(approach))
        .route("/resources", get(resources))
        .route("/resources/{category}", get(resources_for_category))
        .route("/hipaa", get(hipaa))
        .route("/patient/contact", get(get_contact).put(put_contact))
        .route("/patient/medical", get(get_medical).put(put_medical))
        .route("/patient/summary", get(summary))
        .route("/patient/export", get(export))
        .route(
            "/consultations",
            get(list_consultations).post(create_consultation),
        )
        .route("/settings/llm", get(get_settings).put(put_settings))
        .route("/audit", get(audit))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Debug, Serialize)]
pub struct PersonaView {
    name: String,
    credentials: String,
    practice_name: String,
    introduction: String,
    summary: String,
    home: HomePage,
}

async fn persona(State(ctx): State<SharedContext>) -> Json<PersonaView> {
    let persona = &ctx.persona;
    Json(PersonaView {
        name: persona.name.clone(),
        credentials: persona.credentials.clone(),
        practice_name: persona.practice_name.clone(),
        introduction: persona.formal_introduction(),
        summary: persona.sidebar_summary(),
        home: catalog::home(persona),
    })
}

async fn specialties(State(ctx): State<SharedContext>) -> Json<Specialties> {
    Json(catalog::specialties(&ctx.persona))
}

async fn approach(State(ctx): State<SharedContext>) -> Json<Approach> {
    Json(catalog::approach(&ctx.persona))
}

async fn resources(State(ctx): State<SharedContext>) -> Json<ResourceLibrary> {
    Json(catalog::resource_library(&ctx.persona))
}

async fn resources_for_category(Path(category): Path<String>) -> Result<Json<Vec<Resource>>> {
    Ok(Json(catalog::education_resources(&category)?))
}

async fn hipaa() -> Json<HipaaNotice> {
    Json(catalog::hipaa_notice())
}

async fn get_contact(State(ctx): State<SharedContext>) -> Result<Json<PatientContactInfo>> {
    let contact = ctx.session.snapshot().await.contact;
    ctx.audit
        .record(AuditAction::RecordViewed, "contact via api")
        .await?;
    Ok(Json(contact))
}

async fn put_contact(
    State(ctx): State<SharedContext>,
    ApiJson(contact): ApiJson<PatientContactInfo>,
) -> Result<Json<PatientContactInfo>> {
    Ok(Json(ctx.session.update_contact(contact).await?))
}

async fn get_medical(State(ctx): State<SharedContext>) -> Result<Json<PatientMedicalInfo>> {
    let medical = ctx.session.snapshot().await.medical;
    ctx.audit
        .record(AuditAction::RecordViewed, "medical history via api")
        .await?;
    Ok(Json(medical))
}

async fn put_medical(
    State(ctx): State<SharedContext>,
    ApiJson(medical): ApiJson<PatientMedicalInfo>,
) -> Result<Json<PatientMedicalInfo>> {
    Ok(Json(ctx.session.update_medical(medical).await?))
}

#[derive(Debug, Serialize)]
pub struct SummaryView {
    intake_complete: bool,
    summary: PatientSummary,
    rendered: String,
}

async fn summary(State(ctx): State<SharedContext>) -> Result<Json<SummaryView>> {
    let summary = ctx.session.view_summary("api").await?;
    Ok(Json(SummaryView {
        intake_complete: ctx.session.intake_complete().await,
        rendered: summary.render(),
        summary,
    }))
}

async fn export(State(ctx): State<SharedContext>) -> Result<Response> {
    let archive = ctx.export_archive().await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/zip"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"patient-record.zip\"",
            ),
        ],
        archive,
    )
        .into_response())
}

async fn list_consultations(
    State(ctx): State<SharedContext>,
) -> Result<Json<Vec<ConsultationRecord>>> {
    let records = ctx.session.consultations().await;
    ctx.audit
        .record(
            AuditAction::RecordViewed,
            format!("consultations via api count={}", records.len()),
        )
        .await?;
    Ok(Json(records))
}

async fn create_consultation(
    State(ctx): State<SharedContext>,
    ApiJson(request): ApiJson<ConsultationRequest>,
) -> Result<(StatusCode, Json<ConsultationRecord>)> {
    let record = ctx.consult(request).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[derive(Debug, Serialize)]
pub struct SettingsView {
    providers: Vec<ProviderStatus>,
    active_services: Vec<&'static str>,
    ai_features: Vec<String>,
}

async fn settings_view(ctx: &AppContext, providers: Vec<ProviderStatus>) -> SettingsView {
    SettingsView {
        active_services: providers
            .iter()
            .filter(|p| p.configured)
            .map(|p| p.label)
            .collect(),
        providers,
        ai_features: ctx.ai_features().await,
    }
}

async fn get_settings(State(ctx): State<SharedContext>) -> Json<SettingsView> {
    let providers = ctx.settings_status().await;
    Json(settings_view(&ctx, providers).await)
}

async fn put_settings(
    State(ctx): State<SharedContext>,
    ApiJson(update): ApiJson<LlmSettingsUpdate>,
) -> Result<Json<SettingsView>> {
    let providers = ctx.update_settings(update).await?;
    Ok(Json(settings_view(&ctx, providers).await))
}

#[derive(Debug, Default, Deserialize)]
pub struct AuditQuery {
    format: Option<String>,
}

async fn audit(
    State(ctx): State<SharedContext>,
    Query(query): Query<AuditQuery>,
) -> Result<Response> {
    let response = match query.format.as_deref() {
        Some(format) if format.eq_ignore_ascii_case("csv") => (
            [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
            ctx.audit.export_csv().await?,
        )
            .into_response(),
        _ => Json(ctx.audit.events().await?).into_response(),
    };
    ctx.audit
        .record(AuditAction::RecordViewed, "audit trail via api")
        .await?;
    Ok(response)
}
