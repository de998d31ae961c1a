use crate::domain::model::{ConsultationRecord, Session};
use crate::utils::error::{ConsultError, Result};
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const CONTACT_ENTRY: &str = "contact.json";
pub const MEDICAL_ENTRY: &str = "medical_history.json";
pub const CONSULTATIONS_ENTRY: &str = "consultations.json";
pub const CONSULTATIONS_CSV_ENTRY: &str = "consultations.csv";

pub fn consultations_csv(records: &[ConsultationRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "id",
        "created_at",
        "priority",
        "source",
        "primary_concern",
        "assessment",
        "recommendations",
    ])?;
    for record in records {
        writer.write_record([
            record.id.to_string(),
            record.created_at.to_rfc3339(),
            record.priority.to_string(),
            record
                .provider
                .clone()
                .unwrap_or_else(|| "offline".to_string()),
            record.primary_concern.clone(),
            record.assessment.clone(),
            record.recommendations.join("; "),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ConsultError::IoError(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| ConsultError::ConfigError {
        message: format!("CSV output is not valid UTF-8: {}", e),
    })
}

/// Packs the full patient record into a zip archive held in memory.
pub fn build_archive(session: &Session) -> Result<Vec<u8>> {
    let contact = serde_json::to_string_pretty(&session.contact)?;
    let medical = serde_json::to_string_pretty(&session.medical)?;
    let consultations = serde_json::to_string_pretty(&session.consultations)?;
    let csv = consultations_csv(&session.consultations)?;

    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, content) in [
        (CONTACT_ENTRY, contact),
        (MEDICAL_ENTRY, medical),
        (CONSULTATIONS_ENTRY, consultations),
        (CONSULTATIONS_CSV_ENTRY, csv),
    ] {
        zip.start_file::<_, ()>(name, FileOptions::default())?;
        zip.write_all(content.as_bytes())?;
    }
    let cursor = zip.finish()?;

    tracing::debug!(
        "Built patient archive with {} consultations",
        session.consultations.len()
    );
    Ok(cursor.into_inner())
}
