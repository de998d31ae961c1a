//! The practitioner persona every consultation is constrained by.
//!
//! A [`Persona`] carries the practitioner's credentials, directives and
//! specialty domains, plus the priority matrix used to triage incoming
//! requests. Responses are shaped by [`Persona::format_clinical_response`]
//! and LLM calls are framed by [`Persona::system_prompt`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityLevel {
    High,
    Medium,
    Low,
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PriorityLevel::High => "High",
            PriorityLevel::Medium => "Medium",
            PriorityLevel::Low => "Low",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseFormat {
    pub steps: Vec<String>,
    pub style: BTreeMap<String, String>,
}

impl ResponseFormat {
    fn new(steps: &[&str], style: &[(&str, &str)]) -> Self {
        Self {
            steps: strings(steps),
            style: style
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    pub credentials: String,
    pub practice_name: String,

    pub professional_boundaries: Vec<String>,
    pub patient_advocacy: Vec<String>,
    pub communication_framework: Vec<String>,
    pub knowledge_priorities: Vec<String>,

    pub must_always: Vec<String>,
    pub must_never: Vec<String>,

    pub clinical_format: ResponseFormat,
    pub professional_format: ResponseFormat,

    pub primary_domains: Vec<String>,
    pub secondary_domains: Vec<String>,
    pub core_values: Vec<String>,
    pub dei_focus: Vec<String>,
    pub professional_development: Vec<String>,

    /// Checked in order; the first level with a matching category wins.
    pub priority_matrix: Vec<(PriorityLevel, Vec<String>)>,

    pub inappropriate_terms: Vec<String>,

    #[serde(skip)]
    term_patterns: OnceLock<Vec<(String, Regex)>>,
}

fn term_pattern(term: &str) -> String {
    let term = term.trim().to_lowercase();
    let mut forms = vec![format!("{}(?:s|es|d|ed|ly|ing)?", regex::escape(&term))];
    if let Some(stem) = term.strip_suffix('e') {
        forms.push(format!("{}ing", regex::escape(stem)));
    }
    format!(r"\b(?:{})\b", forms.join("|"))
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            name: "Dr. Jackson".to_string(),
            credentials: "DNP, APRN, FNP-C, CFMP".to_string(),
            practice_name: "Optimum Anti-Aging and Wellness".to_string(),

            professional_boundaries: strings(&[
                "Maintain strict formal tone in all interactions",
                "Avoid casual language or colloquialisms",
                "Use precise medical terminology when appropriate",
                "Never engage in personal discussions outside medical context",
                "Respond with clinical precision and emotional distance",
            ]),
            patient_advocacy: strings(&[
                "Always prioritize patient interests above all else",
                "Challenge any perceived threats to patient wellbeing",
                "Maintain unwavering protective stance for patient rights",
                "Question potential conflicts with patient interests",
                "Respond firmly to any patient care compromises",
            ]),
            communication_framework: strings(&[
                "Structure responses in formal, clinical format",
                "Prioritize clarity over relatability",
                "Use evidence-based citations when possible",
                "Maintain professional distance while ensuring understanding",
                "Respond with 'We' in clinical context, 'I' in professional opinions",
            ]),
            knowledge_priorities: strings(&[
                "Evidence-based research",
                "Clinical guidelines",
                "Professional experience",
                "Holistic wellness approaches",
                "Integrative medicine perspectives",
            ]),

            must_always: strings(&[
                "Lead with credentials in introductions",
                "Frame responses through clinical lens first",
                "Protect patient confidentiality aggressively",
                "Advocate for comprehensive care approaches",
                "Include holistic wellness perspectives",
                "Maintain strict professional boundaries",
            ]),
            must_never: strings(&[
                "Share personal experiences/opinions",
                "Use casual or informal language",
                "Compromise on patient advocacy",
                "Rush clinical judgments",
                "Dismiss alternative medicine perspectives",
                "Break professional distance",
            ]),

            clinical_format: ResponseFormat::new(
                &[
                    "Acknowledge presentation",
                    "Gather necessary information",
                    "Present evidence-based assessment",
                    "Provide comprehensive recommendations",
                    "Confirm understanding",
                    "Document follow-up plan",
                ],
                &[
                    ("tone", "formal"),
                    ("terminology", "medical"),
                    ("structure", "systematic"),
                ],
            ),
            professional_format: ResponseFormat::new(
                &[
                    "Use formal medical terminology",
                    "Include relevant credentials",
                    "Reference current research",
                    "Maintain clinical distance",
                    "Provide clear action items",
                ],
                &[
                    ("tone", "authoritative"),
                    ("terminology", "precise"),
                    ("structure", "concise"),
                ],
            ),

            primary_domains: strings(&[
                "Psychiatric Care",
                "Wellness Optimization",
                "Anti-aging Medicine",
                "Functional Medicine",
                "Integrative Health",
                "Preventive Care",
            ]),
            secondary_domains: strings(&[
                "Nutritional Medicine",
                "Stress Management",
                "Hormonal Balance",
                "Gut Health",
                "Oxidative Stress",
                "Professional Development",
            ]),
            core_values: strings(&[
                "Patient Protection",
                "Clinical Excellence",
                "Evidence-Based Practice",
                "Professional Distance",
                "Continuous Education",
                "Inclusive Care",
            ]),
            dei_focus: strings(&[
                "Maintain awareness of healthcare disparities",
                "Provide culturally competent care",
                "Consider LGBTQ+ health perspectives",
                "Implement inclusive language",
                "Address systemic healthcare barriers",
            ]),
            professional_development: strings(&[
                "Continue education emphasis",
                "Share scholarly resources",
                "Maintain certification standards",
                "Update clinical knowledge",
                "Integrate new research",
            ]),

            priority_matrix: vec![
                (
                    PriorityLevel::High,
                    strings(&[
                        "Patient safety concerns",
                        "Clinical emergencies",
                        "Advocacy needs",
                        "Treatment planning",
                        "Professional consultations",
                    ]),
                ),
                (
                    PriorityLevel::Medium,
                    strings(&[
                        "Wellness optimization",
                        "Preventive care",
                        "Education materials",
                        "Protocol development",
                        "Research integration",
                    ]),
                ),
                (
                    PriorityLevel::Low,
                    strings(&[
                        "Administrative matters",
                        "Non-clinical requests",
                        "General inquiries",
                        "Networking",
                        "Social interactions",
                    ]),
                ),
            ],

            inappropriate_terms: strings(&["personal", "friendship", "date", "casual", "non-medical"]),
            term_patterns: OnceLock::new(),
        }
    }
}

impl Persona {
    /// Applies the practice-specific overrides from configuration.
    pub fn with_overrides(mut self, credentials: Option<&str>, practice_name: Option<&str>) -> Self {
        if let Some(credentials) = credentials.filter(|c| !c.trim().is_empty()) {
            self.credentials = credentials.trim().to_string();
        }
        if let Some(practice) = practice_name.filter(|p| !p.trim().is_empty()) {
            self.practice_name = practice.trim().to_string();
        }
        self
    }

    pub fn display_name(&self) -> String {
        format!("{}, {}", self.name, self.credentials)
    }

    pub fn formal_introduction(&self) -> String {
        format!("{}\n{}", self.display_name(), self.practice_name)
    }

    /// Falls back to [`PriorityLevel::Medium`] when no category matches.
    pub fn prioritize(&self, query_type: &str) -> PriorityLevel {
        let query = query_type.to_lowercase();
        self.priority_matrix
            .iter()
            .find(|(_, items)| items.iter().any(|item| query.contains(&item.to_lowercase())))
            .map(|(level, _)| *level)
            .unwrap_or(PriorityLevel::Medium)
    }

    pub fn format_clinical_response(
        &self,
        query: &str,
        assessment: &str,
        recommendations: &[String],
    ) -> String {
        let mut response = String::from("Clinical Assessment:\n\n");
        response.push_str(&format!("Presenting Information: {}\n\n", query));
        response.push_str(&format!("Professional Assessment: {}\n\n", assessment));
        response.push_str("Recommendations:\n");
        for (i, rec) in recommendations.iter().enumerate() {
            response.push_str(&format!("{}. {}\n", i + 1, rec));
        }
        response.push_str("\nPlease confirm your understanding of these recommendations.");
        response
    }

    /// Returns the first inappropriate term found as a word or common inflection
    /// ("dating", "personally"), if any.
    pub fn boundary_violation(&self, query: &str) -> Option<&str> {
        let query = query.to_lowercase();
        self.term_patterns
            .get_or_init(|| {
                self.inappropriate_terms
                    .iter()
                    .filter_map(|term| {
                        Regex::new(&term_pattern(term))
                            .ok()
                            .map(|re| (term.clone(), re))
                    })
                    .collect()
            })
            .iter()
            .find(|(_, re)| re.is_match(&query))
            .map(|(term, _)| term.as_str())
    }

    pub fn is_appropriate_query(&self, query: &str) -> bool {
        self.boundary_violation(query).is_none()
    }

    pub fn sidebar_summary(&self) -> String {
        let domains: Vec<&str> = self
            .primary_domains
            .iter()
            .take(3)
            .map(String::as_str)
            .collect();
        format!("Specializing in {} and more.", domains.join(", "))
    }

    /// Instructions that keep an LLM inside the persona's boundaries.
    pub fn system_prompt(&self) -> String {
        let bullets = |items: &[String]| -> String {
            items
                .iter()
                .map(|item| format!("- {}", item))
                .collect::<Vec<_>>()
                .join("\n")
        };
        let style = self
            .clinical_format
            .style
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join(", ");
        let steps = self
            .clinical_format
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| format!("{}. {}", i + 1, step))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "You are {intro_name} of {practice}.\n\n\
             PROFESSIONAL BOUNDARIES\n{boundaries}\n\n\
             PATIENT ADVOCACY\n{advocacy}\n\n\
             COMMUNICATION FRAMEWORK\n{communication}\n\n\
             YOU MUST ALWAYS\n{always}\n\n\
             YOU MUST NEVER\n{never}\n\n\
             KNOWLEDGE PRIORITIES (highest first)\n{knowledge}\n\n\
             RESPONSE STRUCTURE ({style})\n{steps}\n\n\
             Reply with a single assessment paragraph, then a line reading \
             \"Recommendations:\" followed by one recommendation per line prefixed with \"- \". \
             Do not diagnose definitively; recommend in-person evaluation where warranted.",
            intro_name = self.display_name(),
            practice = self.practice_name,
            boundaries = bullets(&self.professional_boundaries),
            advocacy = bullets(&self.patient_advocacy),
            communication = bullets(&self.communication_framework),
            always = bullets(&self.must_always),
            never = bullets(&self.must_never),
            knowledge = bullets(&self.knowledge_priorities),
            style = style,
            steps = steps,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formal_introduction() {
        let persona = Persona::default();
        assert_eq!(
            persona.formal_introduction(),
            "Dr. Jackson, DNP, APRN, FNP-C, CFMP\nOptimum Anti-Aging and Wellness"
        );
    }

    #[test]
    fn test_overrides_ignore_blank_values() {
        let persona = Persona::default().with_overrides(Some("  "), Some("Riverside Clinic"));
        assert_eq!(persona.credentials, "DNP, APRN, FNP-C, CFMP");
        assert_eq!(persona.practice_name, "Riverside Clinic");
    }

    #[test]
    fn test_prioritize_matches_categories_case_insensitively() {
        let persona = Persona::default();
        assert_eq!(
            persona.prioritize("PATIENT SAFETY CONCERNS about dosage"),
            PriorityLevel::High
        );
        assert_eq!(persona.prioritize("wellness optimization plan"), PriorityLevel::Medium);
        assert_eq!(persona.prioritize("networking event"), PriorityLevel::Low);
    }

    #[test]
    fn test_prioritize_defaults_to_medium() {
        let persona = Persona::default();
        assert_eq!(persona.prioritize("persistent headache"), PriorityLevel::Medium);
        assert_eq!(persona.prioritize(""), PriorityLevel::Medium);
    }

    #[test]
    fn test_prioritize_prefers_higher_level_on_overlap() {
        let persona = Persona::default();
        let query = "general inquiries regarding treatment planning";
        assert_eq!(persona.prioritize(query), PriorityLevel::High);
    }

    #[test]
    fn test_format_clinical_response() {
        let persona = Persona::default();
        let response = persona.format_clinical_response(
            "Fatigue for three weeks",
            "Presentation is consistent with several treatable causes.",
            &["Obtain a complete blood count".to_string(), "Review sleep hygiene".to_string()],
        );
        assert_eq!(
            response,
            "Clinical Assessment:\n\n\
             Presenting Information: Fatigue for three weeks\n\n\
             Professional Assessment: Presentation is consistent with several treatable causes.\n\n\
             Recommendations:\n\
             1. Obtain a complete blood count\n\
             2. Review sleep hygiene\n\n\
             Please confirm your understanding of these recommendations."
        );
    }

    #[test]
    fn test_format_clinical_response_without_recommendations() {
        let response = Persona::default().format_clinical_response("q", "a", &[]);
        assert!(response.ends_with(
            "Recommendations:\n\nPlease confirm your understanding of these recommendations."
        ));
    }

    #[test]
    fn test_inappropriate_queries_are_detected() {
        let persona = Persona::default();
        assert!(!persona.is_appropriate_query("Can we talk on a personal level?"));
        assert!(!persona.is_appropriate_query("Would you like to go on a DATE?"));
        assert!(!persona.is_appropriate_query("This is a non-medical question"));
        assert_eq!(persona.boundary_violation("just a casual chat"), Some("casual"));
    }

    #[test]
    fn test_terms_inside_other_words_are_allowed() {
        let persona = Persona::default();
        assert!(persona.is_appropriate_query("I need to update my medication list"));
        assert!(persona.is_appropriate_query("Personality changes after starting sertraline"));
        assert!(persona.is_appropriate_query("Chronic fatigue and joint pain"));
    }

    #[test]
    fn test_inflected_terms_are_detected() {
        let persona = Persona::default();
        assert_eq!(persona.boundary_violation("Are you dating anyone?"), Some("date"));
        assert_eq!(
            persona.boundary_violation("I'd like to know you personally"),
            Some("personal")
        );
        assert_eq!(persona.boundary_violation("Casually speaking"), Some("casual"));
        assert_eq!(persona.boundary_violation("Our friendships"), Some("friendship"));
        assert!(persona.is_appropriate_query("Dosage was updated last week"));
    }

    #[test]
    fn test_sidebar_summary_uses_first_three_domains() {
        assert_eq!(
            Persona::default().sidebar_summary(),
            "Specializing in Psychiatric Care, Wellness Optimization, Anti-aging Medicine and more."
        );
    }

    #[test]
    fn test_system_prompt_carries_boundaries() {
        let prompt = Persona::default().system_prompt();
        assert!(prompt.starts_with("You are Dr. Jackson, DNP, APRN, FNP-C, CFMP"));
        assert!(prompt.contains("- Break professional distance"));
        assert!(prompt.contains("1. Acknowledge presentation"));
        assert!(prompt.contains("structure: systematic"));
        assert!(prompt.contains("Recommendations:"));
    }
}
