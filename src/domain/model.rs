use crate::domain::persona::PriorityLevel;
use crate::utils::error::{ConsultError, Result};
use crate::utils::validation::{validate_email, validate_phone, validate_range, Validate};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Conditions the medical history form asks about, in display order.
pub const FAMILY_HISTORY_CONDITIONS: [&str; 8] = [
    "Heart Disease",
    "Diabetes",
    "Cancer",
    "Stroke",
    "High Blood Pressure",
    "Mental Health Conditions",
    "Autoimmune Disorders",
    "Other Significant Conditions",
];

/// Items shown in a summary before it is cut off with "(and others)".
pub const SUMMARY_ITEM_LIMIT: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientContactInfo {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,
}

impl PatientContactInfo {
    /// Pre-filled date of birth offered by an empty intake form.
    pub fn suggested_date_of_birth(today: NaiveDate) -> NaiveDate {
        today - Duration::days(365 * 30)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    pub fn has_name(&self) -> bool {
        !self.first_name.trim().is_empty() && !self.last_name.trim().is_empty()
    }

    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        let dob = self.date_of_birth?;
        let mut age = today.year() - dob.year();
        if (today.month(), today.day()) < (dob.month(), dob.day()) {
            age -= 1;
        }
        u32::try_from(age).ok()
    }

    /// Names of required fields that are still blank, in form order.
    pub fn missing_required_fields(&self) -> Vec<String> {
        let mut missing = Vec::new();
        let blank = |value: &str| value.trim().is_empty();
        if blank(&self.first_name) {
            missing.push("first_name".to_string());
        }
        if blank(&self.last_name) {
            missing.push("last_name".to_string());
        }
        if blank(&self.email) {
            missing.push("email".to_string());
        }
        if blank(&self.phone) {
            missing.push("phone".to_string());
        }
        if self.date_of_birth.is_none() {
            missing.push("date_of_birth".to_string());
        }
        missing
    }

    fn trimmed(mut self) -> Self {
        for field in [
            &mut self.first_name,
            &mut self.last_name,
            &mut self.email,
            &mut self.phone,
            &mut self.address,
            &mut self.city,
            &mut self.state,
            &mut self.zip_code,
            &mut self.emergency_contact_name,
            &mut self.emergency_contact_phone,
        ] {
            *field = field.trim().to_string();
        }
        self
    }

    /// Validates against `today` and returns the normalized record.
    pub fn validated(self, today: NaiveDate) -> Result<Self> {
        let contact = self.trimmed();
        let missing = contact.missing_required_fields();
        if !missing.is_empty() {
            return Err(ConsultError::MissingFieldsError { fields: missing });
        }

        validate_email("email", &contact.email)?;
        validate_phone("phone", &contact.phone)?;
        if !contact.emergency_contact_phone.is_empty() {
            validate_phone("emergency_contact_phone", &contact.emergency_contact_phone)?;
        }
        if let Some(dob) = contact.date_of_birth {
            if dob > today {
                return Err(ConsultError::ValidationError {
                    field: "date_of_birth".to_string(),
                    message: format!("{} is in the future", dob),
                });
            }
        }
        Ok(contact)
    }
}

impl Validate for PatientContactInfo {
    fn validate(&self) -> Result<()> {
        self.clone().validated(Utc::now().date_naive()).map(|_| ())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientMedicalInfo {
    pub primary_care_physician: String,
    pub current_medications: Vec<String>,
    pub allergies: Vec<String>,
    pub chronic_conditions: Vec<String>,
    pub past_surgeries: Vec<String>,
    pub family_history: BTreeMap<String, String>,
}

/// Splits free text into one entry per non-blank line.
pub fn parse_entries(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn clean_entries(entries: Vec<String>) -> Vec<String> {
    entries
        .iter()
        .flat_map(|entry| parse_entries(entry))
        .collect()
}

/// Maps a user-supplied condition name onto its canonical form.
pub fn canonical_condition(name: &str) -> Option<&'static str> {
    let wanted = name.trim();
    FAMILY_HISTORY_CONDITIONS
        .iter()
        .copied()
        .find(|condition| condition.eq_ignore_ascii_case(wanted))
}

impl PatientMedicalInfo {
    pub fn new(
        primary_care_physician: &str,
        current_medications: Vec<String>,
        allergies: Vec<String>,
        chronic_conditions: Vec<String>,
        past_surgeries: Vec<String>,
    ) -> Self {
        Self {
            primary_care_physician: primary_care_physician.trim().to_string(),
            current_medications: clean_entries(current_medications),
            allergies: clean_entries(allergies),
            chronic_conditions: clean_entries(chronic_conditions),
            past_surgeries: clean_entries(past_surgeries),
            family_history: BTreeMap::new(),
        }
    }

    /// Blank entries are dropped; unknown conditions are rejected.
    pub fn with_family_history<I, K, V>(mut self, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut history = BTreeMap::new();
        for (condition, member) in entries {
            let member = member.as_ref().trim();
            if member.is_empty() {
                continue;
            }
            let canonical = canonical_condition(condition.as_ref()).ok_or_else(|| {
                ConsultError::ValidationError {
                    field: "family_history".to_string(),
                    message: format!(
                        "Unknown condition '{}'. Expected one of: {}",
                        condition.as_ref(),
                        FAMILY_HISTORY_CONDITIONS.join(", ")
                    ),
                }
            })?;
            history.insert(canonical.to_string(), member.to_string());
        }
        self.family_history = history;
        Ok(self)
    }

    /// Re-applies the same cleaning rules to an already-built record.
    pub fn normalized(self) -> Result<Self> {
        let family_history = self.family_history.clone();
        Self::new(
            &self.primary_care_physician,
            self.current_medications,
            self.allergies,
            self.chronic_conditions,
            self.past_surgeries,
        )
        .with_family_history(family_history)
    }

    pub fn entry_counts(&self) -> String {
        format!(
            "medications={} allergies={} conditions={} surgeries={} family_history={}",
            self.current_medications.len(),
            self.allergies.len(),
            self.chronic_conditions.len(),
            self.past_surgeries.len(),
            self.family_history.len()
        )
    }
}

/// Joins up to [`SUMMARY_ITEM_LIMIT`] items and reports whether more exist.
pub fn truncated_list(items: &[String]) -> Option<(String, bool)> {
    if items.is_empty() {
        return None;
    }
    let shown: Vec<&str> = items
        .iter()
        .take(SUMMARY_ITEM_LIMIT)
        .map(String::as_str)
        .collect();
    Some((shown.join(", "), items.len() > SUMMARY_ITEM_LIMIT))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatientSummary {
    pub name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub email: String,
    pub phone: String,
    pub conditions: Option<String>,
    pub more_conditions: bool,
    pub medications: Option<String>,
    pub more_medications: bool,
}

impl PatientSummary {
    pub fn new(contact: &PatientContactInfo, medical: &PatientMedicalInfo) -> Self {
        let (conditions, more_conditions) = match truncated_list(&medical.chronic_conditions) {
            Some((list, more)) => (Some(list), more),
            None => (None, false),
        };
        let (medications, more_medications) = match truncated_list(&medical.current_medications) {
            Some((list, more)) => (Some(list), more),
            None => (None, false),
        };
        Self {
            name: contact.full_name(),
            date_of_birth: contact.date_of_birth,
            email: contact.email.clone(),
            phone: contact.phone.clone(),
            conditions,
            more_conditions,
            medications,
            more_medications,
        }
    }

    pub fn render(&self) -> String {
        let dob = self
            .date_of_birth
            .map(|d| d.to_string())
            .unwrap_or_else(|| "Not provided".to_string());
        let mut lines = vec![
            format!("Name: {}", self.name),
            format!("Date of Birth: {}", dob),
            format!("Email: {}", self.email),
            format!("Phone: {}", self.phone),
        ];
        if let Some(conditions) = &self.conditions {
            lines.push(format!("Current Medical Conditions: {}", conditions));
            if self.more_conditions {
                lines.push("(and others)".to_string());
            }
        }
        if let Some(medications) = &self.medications {
            lines.push(format!("Current Medications: {}", medications));
            if self.more_medications {
                lines.push("(and others)".to_string());
            }
        }
        lines.join("\n")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsultationRequest {
    #[serde(default)]
    pub primary_concern: String,
    #[serde(default)]
    pub query_type: Option<String>,
    #[serde(default)]
    pub symptom_duration: Option<String>,
    #[serde(default)]
    pub severity: Option<i32>,
}

impl ConsultationRequest {
    pub fn new(primary_concern: impl Into<String>) -> Self {
        Self {
            primary_concern: primary_concern.into(),
            ..Self::default()
        }
    }

    /// Text used for triage: the explicit category if given, else the concern.
    pub fn triage_text(&self) -> &str {
        self.query_type
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .unwrap_or(self.primary_concern.as_str())
    }
}

impl Validate for ConsultationRequest {
    fn validate(&self) -> Result<()> {
        if self.primary_concern.trim().is_empty() {
            return Err(ConsultError::MissingFieldsError {
                fields: vec!["primary_concern".to_string()],
            });
        }
        if let Some(severity) = self.severity {
            validate_range("severity", severity, 1, 10)?;
        }
        Ok(())
    }
}

/// A request that passed screening, tagged with its triage priority.
#[derive(Debug, Clone)]
pub struct ScreenedRequest {
    pub request: ConsultationRequest,
    pub priority: PriorityLevel,
    pub patient_context: String,
}

#[derive(Debug, Clone)]
pub struct Assessment {
    pub screened: ScreenedRequest,
    pub assessment: String,
    pub recommendations: Vec<String>,
    pub provider: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsultationRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub priority: PriorityLevel,
    pub primary_concern: String,
    pub assessment: String,
    pub recommendations: Vec<String>,
    pub response: String,
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    pub contact: PatientContactInfo,
    pub medical: PatientMedicalInfo,
    pub consultations: Vec<ConsultationRecord>,
}

impl Session {
    pub fn intake_complete(&self) -> bool {
        self.contact.has_name()
    }

    pub fn summary(&self) -> PatientSummary {
        PatientSummary::new(&self.contact, &self.medical)
    }
}
