use crate::domain::model::{ConsultationRequest, Session};
use crate::domain::persona::PriorityLevel;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

/// De-identified clinical context: contact details never reach a provider.
pub fn patient_context(session: &Session, today: NaiveDate) -> String {
    let medical = &session.medical;
    let list = |items: &[String]| {
        if items.is_empty() {
            "none reported".to_string()
        } else {
            items.join("; ")
        }
    };

    let age = session
        .contact
        .age_on(today)
        .map(|age| format!("{} years", age))
        .unwrap_or_else(|| "not provided".to_string());
    let family = if medical.family_history.is_empty() {
        "none reported".to_string()
    } else {
        medical
            .family_history
            .iter()
            .map(|(condition, member)| format!("{} ({})", condition, member))
            .collect::<Vec<_>>()
            .join("; ")
    };

    [
        format!("Age: {}", age),
        format!("Chronic conditions: {}", list(&medical.chronic_conditions)),
        format!("Current medications: {}", list(&medical.current_medications)),
        format!("Allergies: {}", list(&medical.allergies)),
        format!("Surgical history: {}", list(&medical.past_surgeries)),
        format!("Family history: {}", family),
    ]
    .join("\n")
}

pub fn consultation_prompt(
    request: &ConsultationRequest,
    priority: PriorityLevel,
    patient_context: &str,
) -> String {
    let mut prompt = format!(
        "Triage priority: {}\n\nPATIENT CONTEXT\n{}\n\nPRIMARY CONCERN\n{}\n",
        priority,
        patient_context,
        request.primary_concern.trim()
    );
    if let Some(duration) = request
        .symptom_duration
        .as_deref()
        .filter(|d| !d.trim().is_empty())
    {
        prompt.push_str(&format!("Symptom duration: {}\n", duration.trim()));
    }
    if let Some(severity) = request.severity {
        prompt.push_str(&format!("Patient-rated severity: {}/10\n", severity));
    }
    prompt
}

fn bullet_prefix() -> &'static Regex {
    static BULLET: OnceLock<Regex> = OnceLock::new();
    BULLET.get_or_init(|| Regex::new(r"^\s*(?:[-*•]|\d+[.)])\s*").expect("bullet pattern"))
}

fn heading_text(line: &str) -> String {
    line.trim()
        .trim_start_matches('#')
        .trim_matches('*')
        .trim()
        .to_lowercase()
}

fn strip_label(text: &str) -> &str {
    for label in ["professional assessment:", "assessment:"] {
        if text.len() >= label.len()
            && text.is_char_boundary(label.len())
            && text[..label.len()].eq_ignore_ascii_case(label)
        {
            return text[label.len()..].trim_start();
        }
    }
    text
}

/// Splits a model reply into its assessment paragraph and recommendation
/// list. Without a "Recommendations" heading the whole reply is the
/// assessment.
pub fn parse_reply(reply: &str) -> (String, Vec<String>) {
    let lines: Vec<&str> = reply.lines().collect();
    let heading = lines
        .iter()
        .position(|line| heading_text(line).starts_with("recommendations"));

    let (assessment_lines, recommendation_lines) = match heading {
        Some(index) => (&lines[..index], &lines[index + 1..]),
        None => (&lines[..], &[][..]),
    };

    let assessment = assessment_lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let assessment = strip_label(strip_emphasis(&assessment));
    let assessment = strip_emphasis(assessment).to_string();

    let recommendations = recommendation_lines
        .iter()
        .map(|line| bullet_prefix().replace(line, "").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();

    (assessment, recommendations)
}

// Markdown emphasis around a leading label, e.g. "**Assessment:**".
fn strip_emphasis(text: &str) -> &str {
    text.trim_start_matches('*').trim_start()
}
