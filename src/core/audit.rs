//! Append-only access log for protected health information.
//!
//! Every read or change of patient data goes through [`AuditLog::record`].
//! Details hold field names and counts, never the values themselves.

use crate::domain::ports::Storage;
use crate::utils::error::{ConsultError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    ContactUpdated,
    MedicalHistoryUpdated,
    RecordViewed,
    ConsultationRequested,
    ConsultationDeclined,
    ConsultationCompleted,
    SettingsUpdated,
    RecordExported,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuditAction::ContactUpdated => "contact_updated",
            AuditAction::MedicalHistoryUpdated => "medical_history_updated",
            AuditAction::RecordViewed => "record_viewed",
            AuditAction::ConsultationRequested => "consultation_requested",
            AuditAction::ConsultationDeclined => "consultation_declined",
            AuditAction::ConsultationCompleted => "consultation_completed",
            AuditAction::SettingsUpdated => "settings_updated",
            AuditAction::RecordExported => "record_exported",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    pub detail: String,
}

pub struct AuditLog<S: Storage> {
    storage: S,
    file: String,
    enabled: bool,
    write_lock: Mutex<()>,
}

impl<S: Storage> AuditLog<S> {
    pub fn new(storage: S, file: impl Into<String>, enabled: bool) -> Self {
        Self {
            storage,
            file: file.into(),
            enabled,
            write_lock: Mutex::new(()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub async fn record(&self, action: AuditAction, detail: impl Into<String>) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let event = AuditEvent {
            timestamp: Utc::now(),
            action,
            detail: detail.into(),
        };
        let mut line = serde_json::to_vec(&event)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        self.storage.append_file(&self.file, &line).await?;
        tracing::debug!(action = %event.action, "audit event recorded");
        Ok(())
    }

    pub async fn events(&self) -> Result<Vec<AuditEvent>> {
        if !self.storage.exists(&self.file).await {
            return Ok(Vec::new());
        }
        let bytes = self.storage.read_file(&self.file).await?;
        let content = String::from_utf8(bytes).map_err(|e| ConsultError::ConfigError {
            message: format!("Audit log is not valid UTF-8: {}", e),
        })?;

        let mut events = Vec::new();
        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditEvent>(line) {
                Ok(event) => events.push(event),
                Err(e) => tracing::warn!("Skipping malformed audit line {}: {}", index + 1, e),
            }
        }
        Ok(events)
    }

    pub async fn export_csv(&self) -> Result<String> {
        let events = self.events().await?;
        render_csv(&events)
    }
}

pub fn render_csv(events: &[AuditEvent]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["timestamp", "action", "detail"])?;
    for event in events {
        writer.write_record([
            event.timestamp.to_rfc3339(),
            event.action.to_string(),
            event.detail.clone(),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ConsultError::IoError(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| ConsultError::ConfigError {
        message: format!("CSV output is not valid UTF-8: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::LocalStorage;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_events_are_read_back_in_order() {
        let dir = TempDir::new().unwrap();
        let log = AuditLog::new(LocalStorage::new(dir.path()), "audit.log", true);

        log.record(AuditAction::ContactUpdated, "fields=first_name,last_name")
            .await
            .unwrap();
        log.record(AuditAction::RecordViewed, "summary").await.unwrap();

        let events = log.events().await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].action, AuditAction::ContactUpdated);
        assert_eq!(events[1].detail, "summary");
    }

    #[tokio::test]
    async fn test_disabled_log_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());
        let log = AuditLog::new(storage.clone(), "audit.log", false);

        log.record(AuditAction::RecordExported, "zip").await.unwrap();

        assert!(!storage.exists("audit.log").await);
        assert!(log.events().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());
        storage
            .append_file("audit.log", b"not json\n\n")
            .await
            .unwrap();
        let log = AuditLog::new(storage, "audit.log", true);
        log.record(AuditAction::SettingsUpdated, "providers=1").await.unwrap();

        let events = log.events().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, AuditAction::SettingsUpdated);
    }

    #[test]
    fn test_render_csv_quotes_commas() {
        let event = AuditEvent {
            timestamp: DateTime::parse_from_rfc3339("2025-02-12T09:30:00Z")
                .unwrap()
                .with_timezone(&Utc),
            action: AuditAction::ContactUpdated,
            detail: "fields=first_name,last_name".to_string(),
        };
        let csv = render_csv(&[event]).unwrap();
        assert_eq!(
            csv,
            "timestamp,action,detail\n\
             2025-02-12T09:30:00+00:00,contact_updated,\"fields=first_name,last_name\"\n"
        );
    }
}
