//! Application wiring shared by the CLI and the HTTP server.

#[cfg(feature = "cli")]
pub mod commands;

use crate::adapters::LocalStorage;
use crate::config::AppConfig;
use crate::core::catalog;
use crate::core::export::build_archive;
use crate::core::{AuditAction, AuditLog, ConsultationEngine, ConsultationPipeline, SessionStore};
use crate::domain::model::{ConsultationRecord, ConsultationRequest};
use crate::domain::persona::Persona;
use crate::llm::{LlmRouter, LlmSettings, LlmSettingsUpdate, ProviderStatus};
use crate::utils::error::Result;
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct AppContext {
    pub config: AppConfig,
    pub persona: Arc<Persona>,
    pub storage: LocalStorage,
    pub audit: Arc<AuditLog<LocalStorage>>,
    pub session: Arc<SessionStore<LocalStorage>>,
    settings: RwLock<LlmSettings>,
}

impl AppContext {
    pub async fn bootstrap(config: AppConfig, settings: LlmSettings) -> Result<Self> {
        let storage = LocalStorage::new(config.data_dir());
        let audit = Arc::new(AuditLog::new(
            storage.clone(),
            config.audit.file.clone(),
            config.audit.enabled,
        ));
        let session = Arc::new(SessionStore::load(storage.clone(), audit.clone()).await?);
        let persona = Arc::new(Persona::default().with_overrides(
            config.persona.credentials.as_deref(),
            config.persona.practice_name.as_deref(),
        ));

        tracing::debug!("Data directory: {}", storage.base_path().display());
        if settings.any_configured() {
            tracing::info!(
                "Active AI Services: {}",
                settings.active_services().join(", ")
            );
        } else {
            tracing::warn!("No AI services configured. Some features may be limited.");
        }

        Ok(Self {
            config,
            persona,
            storage,
            audit,
            session,
            settings: RwLock::new(settings),
        })
    }

    /// Runs one consultation with the provider keys in effect right now.
    pub async fn consult(&self, request: ConsultationRequest) -> Result<ConsultationRecord> {
        let settings = self.settings.read().await.clone();
        let router = LlmRouter::from_settings(&settings, &self.config.llm)?;
        let pipeline = ConsultationPipeline::new(
            self.persona.clone(),
            self.session.clone(),
            router,
            &self.config.llm,
        );
        ConsultationEngine::new(pipeline).run(request).await
    }

    pub async fn export_archive(&self) -> Result<Vec<u8>> {
        let session = self.session.snapshot().await;
        let archive = build_archive(&session)?;
        self.audit
            .record(
                AuditAction::RecordExported,
                format!("consultations={}", session.consultations.len()),
            )
            .await?;
        Ok(archive)
    }

    pub async fn settings_status(&self) -> Vec<ProviderStatus> {
        self.settings.read().await.status()
    }

    pub async fn any_provider_configured(&self) -> bool {
        self.settings.read().await.any_configured()
    }

    pub async fn ai_features(&self) -> Vec<String> {
        catalog::ai_features(self.any_provider_configured().await)
    }

    /// Keys stay in memory; the audit trail records provider names only.
    pub async fn update_settings(&self, update: LlmSettingsUpdate) -> Result<Vec<ProviderStatus>> {
        let mut settings = self.settings.write().await;
        let changed = settings.apply(update);
        let status = settings.status();
        let active = settings.active_services();
        drop(settings);

        if !changed.is_empty() {
            let names: Vec<String> = changed.iter().map(|p| p.to_string()).collect();
            self.audit
                .record(
                    AuditAction::SettingsUpdated,
                    format!("providers={}", names.join(",")),
                )
                .await?;
        }
        if active.is_empty() {
            tracing::warn!("No AI services configured. Some features may be limited.");
        } else {
            tracing::info!("Active AI Services: {}", active.join(", "));
        }
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Provider;
    use tempfile::TempDir;

    async fn context(dir: &TempDir) -> AppContext {
        let mut config = AppConfig::default();
        config.storage.data_dir = dir.path().display().to_string();
        AppContext::bootstrap(config, LlmSettings::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_update_settings_audits_provider_names_only() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir).await;
        assert!(ctx.ai_features().await.is_empty());

        let status = ctx
            .update_settings(LlmSettingsUpdate {
                xai_api_key: Some("xai-secret-4242".to_string()),
                ..LlmSettingsUpdate::default()
            })
            .await
            .unwrap();
        assert!(status.iter().any(|s| s.provider == Provider::Xai && s.configured));
        assert_eq!(ctx.ai_features().await.len(), 5);

        let events = ctx.audit.events().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].detail, "providers=xai");
        assert!(!std::fs::read_to_string(dir.path().join("audit.log"))
            .unwrap()
            .contains("secret"));
    }

    #[tokio::test]
    async fn test_unchanged_settings_are_not_audited() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir).await;
        ctx.update_settings(LlmSettingsUpdate::default()).await.unwrap();
        assert!(ctx.audit.events().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_export_is_audited() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir).await;
        let archive = ctx.export_archive().await.unwrap();
        assert!(!archive.is_empty());

        let events = ctx.audit.events().await.unwrap();
        assert_eq!(events[0].action, AuditAction::RecordExported);
        assert_eq!(events[0].detail, "consultations=0");
    }
}
