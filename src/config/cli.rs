use crate::domain::model::{
    parse_entries, ConsultationRequest, PatientContactInfo, PatientMedicalInfo,
};
use crate::utils::error::{ConsultError, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "consult-desk")]
#[command(about = "Patient intake and AI-assisted consultations with a clinical persona")]
pub struct Cli {
    /// Configuration file (defaults to ./consult.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Overrides storage.data_dir
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Save patient contact information
    Intake(IntakeArgs),
    /// Save medical history
    History(HistoryArgs),
    /// Request a consultation
    Consult(ConsultArgs),
    /// Show the patient summary
    Summary,
    /// Show which LLM providers are configured
    Settings,
    /// Practitioner introduction and home page
    About,
    Specialties,
    Approach,
    /// Patient education resources
    Resources {
        #[arg(long)]
        category: Option<String>,
    },
    /// HIPAA notice and safeguards
    Hipaa,
    /// Write the patient record archive
    Export {
        #[arg(long, default_value = "patient-record.zip")]
        output: PathBuf,
    },
    /// Show the access audit trail
    Audit {
        #[arg(long, help = "Print as CSV")]
        csv: bool,
    },
    /// Run the HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
}

/// Each flag overrides the stored value; omitted flags keep it.
#[derive(Debug, Default, Args)]
pub struct IntakeArgs {
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    pub dob: Option<NaiveDate>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub city: Option<String>,
    #[arg(long)]
    pub state: Option<String>,
    #[arg(long)]
    pub zip_code: Option<String>,
    #[arg(long)]
    pub emergency_contact_name: Option<String>,
    #[arg(long)]
    pub emergency_contact_phone: Option<String>,
}

impl IntakeArgs {
    pub fn merge_into(self, mut contact: PatientContactInfo) -> PatientContactInfo {
        let pairs = [
            (self.first_name, &mut contact.first_name),
            (self.last_name, &mut contact.last_name),
            (self.email, &mut contact.email),
            (self.phone, &mut contact.phone),
            (self.address, &mut contact.address),
            (self.city, &mut contact.city),
            (self.state, &mut contact.state),
            (self.zip_code, &mut contact.zip_code),
            (self.emergency_contact_name, &mut contact.emergency_contact_name),
            (self.emergency_contact_phone, &mut contact.emergency_contact_phone),
        ];
        for (value, slot) in pairs {
            if let Some(value) = value {
                *slot = value;
            }
        }
        if self.dob.is_some() {
            contact.date_of_birth = self.dob;
        }
        contact
    }
}

/// Lists given on the command line replace the stored list.
#[derive(Debug, Default, Args)]
pub struct HistoryArgs {
    #[arg(long)]
    pub physician: Option<String>,
    #[arg(long = "medication")]
    pub medications: Vec<String>,
    /// File with one medication per line
    #[arg(long)]
    pub medications_file: Option<PathBuf>,
    #[arg(long = "allergy")]
    pub allergies: Vec<String>,
    #[arg(long = "condition")]
    pub conditions: Vec<String>,
    #[arg(long = "surgery")]
    pub surgeries: Vec<String>,
    /// Condition=Family member, e.g. "Heart Disease=Father"
    #[arg(long = "family")]
    pub family: Vec<String>,
}

fn replace_if_given(given: Vec<String>, stored: Vec<String>) -> Vec<String> {
    if given.is_empty() {
        stored
    } else {
        given
    }
}

fn parse_family_entry(entry: &str) -> Result<(String, String)> {
    entry
        .split_once('=')
        .map(|(condition, member)| (condition.trim().to_string(), member.trim().to_string()))
        .ok_or_else(|| ConsultError::ValidationError {
            field: "family".to_string(),
            message: format!("Expected Condition=Member, got '{}'", entry),
        })
}

impl HistoryArgs {
    pub fn merge_into(self, stored: PatientMedicalInfo) -> Result<PatientMedicalInfo> {
        let mut medications = self.medications;
        if let Some(path) = &self.medications_file {
            medications.extend(parse_entries(&std::fs::read_to_string(path)?));
        }

        let physician = self
            .physician
            .unwrap_or_else(|| stored.primary_care_physician.clone());
        let medical = PatientMedicalInfo::new(
            &physician,
            replace_if_given(medications, stored.current_medications),
            replace_if_given(self.allergies, stored.allergies),
            replace_if_given(self.conditions, stored.chronic_conditions),
            replace_if_given(self.surgeries, stored.past_surgeries),
        );

        if self.family.is_empty() {
            medical.with_family_history(stored.family_history)
        } else {
            let entries = self
                .family
                .iter()
                .map(|entry| parse_family_entry(entry))
                .collect::<Result<Vec<_>>>()?;
            medical.with_family_history(entries)
        }
    }
}

#[derive(Debug, Args)]
pub struct ConsultArgs {
    #[arg(long)]
    pub concern: String,
    /// Category used for triage, e.g. "Clinical emergencies"
    #[arg(long)]
    pub query_type: Option<String>,
    #[arg(long)]
    pub duration: Option<String>,
    /// 1 (mild) to 10 (severe)
    #[arg(long)]
    pub severity: Option<i32>,
}

impl From<ConsultArgs> for ConsultationRequest {
    fn from(args: ConsultArgs) -> Self {
        Self {
            primary_concern: args.concern,
            query_type: args.query_type,
            symptom_duration: args.duration,
            severity: args.severity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_consult_command() {
        let cli = Cli::try_parse_from([
            "consult-desk",
            "--data-dir",
            "/tmp/data",
            "consult",
            "--concern",
            "Trouble sleeping",
            "--severity",
            "4",
        ])
        .unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/data")));
        match cli.command {
            Command::Consult(args) => {
                let request = ConsultationRequest::from(args);
                assert_eq!(request.primary_concern, "Trouble sleeping");
                assert_eq!(request.severity, Some(4));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_invalid_dob_is_rejected_by_parser() {
        let result = Cli::try_parse_from(["consult-desk", "intake", "--dob", "03/04/1990"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_intake_merge_keeps_unspecified_fields() {
        let stored = PatientContactInfo {
            first_name: "Ada".to_string(),
            email: "ada@example.org".to_string(),
            ..PatientContactInfo::default()
        };
        let args = IntakeArgs {
            email: Some("ada@lovelace.org".to_string()),
            dob: NaiveDate::from_ymd_opt(1990, 3, 4),
            ..IntakeArgs::default()
        };
        let merged = args.merge_into(stored);
        assert_eq!(merged.first_name, "Ada");
        assert_eq!(merged.email, "ada@lovelace.org");
        assert_eq!(merged.date_of_birth, NaiveDate::from_ymd_opt(1990, 3, 4));
    }

    #[test]
    fn test_history_merge_replaces_only_given_lists() {
        let stored = PatientMedicalInfo::new(
            "Dr. Reyes",
            vec!["Metformin".to_string()],
            vec!["Penicillin".to_string()],
            vec![],
            vec![],
        )
        .with_family_history([("Diabetes", "Mother")])
        .unwrap();

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"Lisinopril 10mg\n\nAtorvastatin\n").unwrap();

        let args = HistoryArgs {
            medications_file: Some(file.path().to_path_buf()),
            family: vec!["heart disease = Father".to_string()],
            ..HistoryArgs::default()
        };
        let merged = args.merge_into(stored).unwrap();
        assert_eq!(merged.primary_care_physician, "Dr. Reyes");
        assert_eq!(merged.current_medications, vec!["Lisinopril 10mg", "Atorvastatin"]);
        assert_eq!(merged.allergies, vec!["Penicillin"]);
        assert_eq!(merged.family_history.len(), 1);
        assert_eq!(merged.family_history["Heart Disease"], "Father");
    }

    #[test]
    fn test_malformed_family_entry() {
        let args = HistoryArgs {
            family: vec!["Stroke".to_string()],
            ..HistoryArgs::default()
        };
        assert!(args.merge_into(PatientMedicalInfo::default()).is_err());
    }
}
