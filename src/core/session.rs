use crate::core::audit::{AuditAction, AuditLog};
use crate::domain::model::{
    ConsultationRecord, PatientContactInfo, PatientMedicalInfo, PatientSummary, Session,
};
use crate::domain::ports::Storage;
use crate::utils::error::Result;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const SESSION_FILE: &str = "session.json";

/// The patient's intake data and consultation history, persisted as one
/// JSON document. All mutations rewrite the file while holding the lock.
pub struct SessionStore<S: Storage> {
    storage: S,
    file: String,
    state: RwLock<Session>,
    audit: Arc<AuditLog<S>>,
}

impl<S: Storage> SessionStore<S> {
    pub async fn load(storage: S, audit: Arc<AuditLog<S>>) -> Result<Self> {
        Self::load_from(storage, SESSION_FILE, audit).await
    }

    pub async fn load_from(storage: S, file: &str, audit: Arc<AuditLog<S>>) -> Result<Self> {
        let session = if storage.exists(file).await {
            let bytes = storage.read_file(file).await?;
            let session: Session = serde_json::from_slice(&bytes)?;
            tracing::debug!(
                "Loaded session with {} consultations from {}",
                session.consultations.len(),
                storage.location(file)
            );
            session
        } else {
            tracing::debug!("No session at {}, starting empty", storage.location(file));
            Session::default()
        };

        Ok(Self {
            storage,
            file: file.to_string(),
            state: RwLock::new(session),
            audit,
        })
    }

    pub fn audit(&self) -> &Arc<AuditLog<S>> {
        &self.audit
    }

    pub async fn snapshot(&self) -> Session {
        self.state.read().await.clone()
    }

    pub async fn intake_complete(&self) -> bool {
        self.state.read().await.intake_complete()
    }

    pub async fn update_contact(&self, contact: PatientContactInfo) -> Result<PatientContactInfo> {
        let contact = contact.validated(Utc::now().date_naive())?;
        let provided = provided_contact_fields(&contact);

        let mut state = self.state.write().await;
        state.contact = contact.clone();
        self.persist(&state).await?;
        drop(state);

        self.audit
            .record(AuditAction::ContactUpdated, format!("fields={}", provided))
            .await?;
        tracing::info!("Patient contact information saved");
        Ok(contact)
    }

    pub async fn update_medical(&self, medical: PatientMedicalInfo) -> Result<PatientMedicalInfo> {
        let medical = medical.normalized()?;
        let counts = medical.entry_counts();

        let mut state = self.state.write().await;
        state.medical = medical.clone();
        self.persist(&state).await?;
        drop(state);

        self.audit
            .record(AuditAction::MedicalHistoryUpdated, counts)
            .await?;
        tracing::info!("Medical history saved");
        Ok(medical)
    }

    pub async fn add_consultation(&self, record: ConsultationRecord) -> Result<()> {
        let mut state = self.state.write().await;
        state.consultations.push(record);
        self.persist(&state).await
    }

    pub async fn consultations(&self) -> Vec<ConsultationRecord> {
        self.state.read().await.consultations.clone()
    }

    /// Reads the summary for display; the access itself is audited.
    pub async fn view_summary(&self, purpose: &str) -> Result<PatientSummary> {
        let summary = self.state.read().await.summary();
        self.audit
            .record(AuditAction::RecordViewed, format!("summary via {}", purpose))
            .await?;
        Ok(summary)
    }

    async fn persist(&self, session: &Session) -> Result<()> {
        let data = serde_json::to_vec_pretty(session)?;
        self.storage.write_file(&self.file, &data).await
    }
}

fn provided_contact_fields(contact: &PatientContactInfo) -> String {
    let fields = [
        ("first_name", contact.first_name.as_str()),
        ("last_name", contact.last_name.as_str()),
        ("email", contact.email.as_str()),
        ("phone", contact.phone.as_str()),
        ("address", contact.address.as_str()),
        ("city", contact.city.as_str()),
        ("state", contact.state.as_str()),
        ("zip_code", contact.zip_code.as_str()),
        ("emergency_contact_name", contact.emergency_contact_name.as_str()),
        ("emergency_contact_phone", contact.emergency_contact_phone.as_str()),
    ];
    let mut names: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(name, _)| *name)
        .collect();
    if contact.date_of_birth.is_some() {
        names.push("date_of_birth");
    }
    names.join(",")
}
