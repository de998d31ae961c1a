//! Static practice content: specialties, methodology, patient education,
//! the HIPAA notice and the AI feature list.

use crate::domain::persona::Persona;
use crate::utils::error::{ConsultError, Result};
use serde::Serialize;

pub const EDUCATION_CATEGORIES: [&str; 6] = [
    "Functional Medicine Basics",
    "Nutritional Approaches",
    "Stress Management",
    "Hormone Balance",
    "Gut Health",
    "Sleep Optimization",
];

pub const TREATMENT_APPROACHES: [&str; 5] = [
    "Integrative Medicine Protocols",
    "Functional Nutrition Plans",
    "Targeted Supplementation",
    "Lifestyle Modification Programs",
    "Mind-Body Interventions",
];

pub const RESEARCH_TOPICS: [&str; 4] = [
    "Functional Medicine Approaches to Chronic Conditions",
    "Integrative Protocols for Stress-Related Disorders",
    "Nutritional Interventions for Inflammatory Conditions",
    "Mind-Body Medicine in Clinical Practice",
];

/// Listed only while at least one provider key is configured.
pub const AI_INTEGRATION_FEATURES: [&str; 5] = [
    "Automated clinical note generation",
    "Medical literature search assistance",
    "Treatment plan optimization",
    "Follow-up reminder system",
    "Patient education material generation",
];

pub const PRIVACY_OFFICER: &str = "privacy@optimumwellness.org";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principle {
    pub value: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HomePage {
    pub title: String,
    pub introduction: String,
    pub focus_areas: Vec<String>,
    pub principles: Vec<Principle>,
    pub call_to_action: String,
}

pub fn home(persona: &Persona) -> HomePage {
    HomePage {
        title: format!("Welcome to {}'s Professional Consultation", persona.name),
        introduction: "This platform provides access to professional medical consultation with a focus on:"
            .to_string(),
        focus_areas: persona.primary_domains.clone(),
        principles: persona
            .core_values
            .iter()
            .take(4)
            .map(|value| Principle {
                value: value.clone(),
                description: "Ensuring the highest standards of care".to_string(),
            })
            .collect(),
        call_to_action:
            "To begin the consultation process, please complete the Patient Intake forms first."
                .to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Specialty {
    pub name: String,
    pub description: String,
    pub services: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FocusArea {
    pub name: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Specialties {
    pub primary: Vec<Specialty>,
    pub secondary: Vec<FocusArea>,
}

pub fn specialties(persona: &Persona) -> Specialties {
    Specialties {
        primary: persona
            .primary_domains
            .iter()
            .map(|domain| Specialty {
                name: domain.clone(),
                description: format!(
                    "Comprehensive {} services with an evidence-based, integrative approach.",
                    domain
                ),
                services: "Services include assessment, treatment planning, and ongoing management."
                    .to_string(),
            })
            .collect(),
        secondary: persona
            .secondary_domains
            .iter()
            .map(|domain| FocusArea {
                name: domain.clone(),
                note: "Integrated within primary care approaches".to_string(),
            })
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Approach {
    pub summary: String,
    /// Highest priority first.
    pub knowledge_priorities: Vec<String>,
    pub inclusive_care: Vec<String>,
}

pub fn approach(persona: &Persona) -> Approach {
    Approach {
        summary: format!(
            "{}'s practice is built on a hierarchical approach to medical knowledge:",
            persona.name
        ),
        knowledge_priorities: persona.knowledge_priorities.clone(),
        inclusive_care: persona.dei_focus.clone(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

impl Resource {
    pub fn request_label(&self) -> String {
        format!("Request {}", self.kind)
    }
}

pub fn education_category(name: &str) -> Option<&'static str> {
    let wanted = name.trim();
    EDUCATION_CATEGORIES
        .iter()
        .copied()
        .find(|category| category.eq_ignore_ascii_case(wanted))
}

/// Three resources per category; unknown categories are an error.
pub fn education_resources(category: &str) -> Result<Vec<Resource>> {
    let category = education_category(category).ok_or_else(|| ConsultError::NotFoundError {
        what: format!("education category '{}'", category),
    })?;

    let resource = |title: String, kind: &str, description: &str| Resource {
        title,
        kind: kind.to_string(),
        description: description.to_string(),
    };
    Ok(vec![
        resource(
            format!("{} Primer", category),
            "PDF Guide",
            "A comprehensive introduction to key concepts and approaches.",
        ),
        resource(
            format!("Understanding Your {} Assessment", category),
            "Video",
            "A visual explanation of assessment methods and interpretation.",
        ),
        resource(
            format!("{} FAQ", category),
            "Article",
            "Answers to commonly asked questions about this topic.",
        ),
    ])
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreatmentApproach {
    pub name: String,
    pub notes: Vec<String>,
}

pub fn treatment_approaches() -> Vec<TreatmentApproach> {
    TREATMENT_APPROACHES
        .iter()
        .map(|name| TreatmentApproach {
            name: name.to_string(),
            notes: vec![
                format!(
                    "Information about {} will be provided following your initial consultation.",
                    name
                ),
                "These resources are customized based on your specific health needs and goals."
                    .to_string(),
            ],
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceLibrary {
    pub education_categories: Vec<String>,
    pub treatment_approaches: Vec<TreatmentApproach>,
    pub research_topics: Vec<String>,
    pub research_note: String,
}

pub fn resource_library(persona: &Persona) -> ResourceLibrary {
    ResourceLibrary {
        education_categories: EDUCATION_CATEGORIES.iter().map(|c| c.to_string()).collect(),
        treatment_approaches: treatment_approaches(),
        research_topics: RESEARCH_TOPICS.iter().map(|t| t.to_string()).collect(),
        research_note: format!(
            "{} regularly contributes to academic and clinical research. \
             Recent publications and research participation are available upon request.",
            persona.name
        ),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HipaaNotice {
    pub title: String,
    pub statement: String,
    pub safeguards: Vec<String>,
    pub privacy_officer: String,
    pub technical_safeguards: Vec<String>,
    pub physical_safeguards: Vec<String>,
    pub administrative_safeguards: Vec<String>,
    pub consultation_privacy: String,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn hipaa_notice() -> HipaaNotice {
    HipaaNotice {
        title: "HIPAA Compliance Notice".to_string(),
        statement: "This application complies with the Health Insurance Portability and \
                    Accountability Act (HIPAA) of 1996:"
            .to_string(),
        safeguards: owned(&[
            "All patient data is encrypted in transit and at rest",
            "Access controls restrict unauthorized viewing of protected health information (PHI)",
            "Audit logs track all data access and modifications",
            "Data retention policies comply with medical record requirements",
            "Regular security assessments are conducted to ensure compliance",
        ]),
        privacy_officer: PRIVACY_OFFICER.to_string(),
        technical_safeguards: owned(&[
            "End-to-end encryption for all patient data",
            "Role-based access controls",
            "Automatic session timeouts",
            "Secure authentication mechanisms",
            "Comprehensive audit logging",
        ]),
        physical_safeguards: owned(&[
            "Secure cloud infrastructure",
            "Redundant data storage with encryption",
            "Disaster recovery protocols",
        ]),
        administrative_safeguards: owned(&[
            "Regular security assessments",
            "Staff training on PHI handling",
            "Breach notification procedures",
            "Business Associate Agreements with all vendors",
        ]),
        consultation_privacy: "This consultation is protected under HIPAA guidelines. Information \
                               shared during this session is confidential and will be securely \
                               stored in your electronic medical record."
            .to_string(),
    }
}

pub fn ai_features(any_provider_configured: bool) -> Vec<String> {
    if any_provider_configured {
        owned(&AI_INTEGRATION_FEATURES)
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_lists_first_four_core_values() {
        let page = home(&Persona::default());
        assert_eq!(page.focus_areas.len(), 6);
        let values: Vec<&str> = page.principles.iter().map(|p| p.value.as_str()).collect();
        assert_eq!(
            values,
            vec![
                "Patient Protection",
                "Clinical Excellence",
                "Evidence-Based Practice",
                "Professional Distance"
            ]
        );
    }

    #[test]
    fn test_specialties() {
        let specialties = specialties(&Persona::default());
        assert_eq!(specialties.primary[0].name, "Psychiatric Care");
        assert_eq!(
            specialties.primary[0].description,
            "Comprehensive Psychiatric Care services with an evidence-based, integrative approach."
        );
        assert_eq!(specialties.secondary.len(), 6);
        assert_eq!(
            specialties.secondary[3].note,
            "Integrated within primary care approaches"
        );
    }

    #[test]
    fn test_education_resources_for_category() {
        let resources = education_resources("gut health").unwrap();
        let titles: Vec<&str> = resources.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Gut Health Primer",
                "Understanding Your Gut Health Assessment",
                "Gut Health FAQ"
            ]
        );
        assert_eq!(resources[1].request_label(), "Request Video");
    }

    #[test]
    fn test_unknown_category_is_not_found() {
        assert!(matches!(
            education_resources("Astrology"),
            Err(ConsultError::NotFoundError { .. })
        ));
    }

    #[test]
    fn test_resource_serializes_kind_as_type() {
        let resources = education_resources("Sleep Optimization").unwrap();
        let json = serde_json::to_value(&resources[0]).unwrap();
        assert_eq!(json["type"], "PDF Guide");
    }

    #[test]
    fn test_hipaa_notice() {
        let notice = hipaa_notice();
        assert_eq!(notice.safeguards.len(), 5);
        assert_eq!(notice.privacy_officer, "privacy@optimumwellness.org");
        assert_eq!(notice.administrative_safeguards.len(), 4);
    }

    #[test]
    fn test_ai_features_require_a_provider() {
        assert!(ai_features(false).is_empty());
        assert_eq!(ai_features(true).len(), 5);
    }
}
