use crate::app::AppContext;
use crate::config::cli::{HistoryArgs, IntakeArgs};
use crate::config::Command;
use crate::core::catalog::{self, Approach, HipaaNotice, HomePage, Resource, Specialties};
use crate::core::AuditAction;
use crate::domain::model::{ConsultationRecord, ConsultationRequest, PatientContactInfo};
use crate::domain::persona::Persona;
use crate::llm::{Provider, ProviderStatus};
use crate::utils::error::Result;
use chrono::Utc;
use std::path::Path;

/// Executes every command except `serve`, which owns the process.
pub async fn run(ctx: &AppContext, command: Command) -> Result<()> {
    match command {
        Command::Intake(args) => intake(ctx, args).await,
        Command::History(args) => history(ctx, args).await,
        Command::Consult(args) => consult(ctx, args.into()).await,
        Command::Summary => summary(ctx).await,
        Command::Settings => settings(ctx).await,
        Command::About => {
            println!("{}", render_about(&ctx.persona));
            Ok(())
        }
        Command::Specialties => {
            println!("{}", render_specialties(&catalog::specialties(&ctx.persona)));
            Ok(())
        }
        Command::Approach => {
            println!("{}", render_approach(&catalog::approach(&ctx.persona)));
            Ok(())
        }
        Command::Resources { category } => resources(ctx, category.as_deref()),
        Command::Hipaa => {
            println!("{}", render_hipaa(&catalog::hipaa_notice()));
            Ok(())
        }
        Command::Export { output } => export(ctx, &output).await,
        Command::Audit { csv } => audit(ctx, csv).await,
        Command::Serve { .. } => Ok(()),
    }
}

async fn intake(ctx: &AppContext, args: IntakeArgs) -> Result<()> {
    let stored = ctx.session.snapshot().await.contact;
    let merged = args.merge_into(stored);
    if merged.date_of_birth.is_none() {
        let suggested = PatientContactInfo::suggested_date_of_birth(Utc::now().date_naive());
        eprintln!("Date of birth is required, e.g. --dob {}", suggested);
    }

    ctx.session.update_contact(merged).await?;
    println!("✅ Patient information saved successfully.");
    println!("Please proceed to Medical History to complete your intake.");
    Ok(())
}

async fn history(ctx: &AppContext, args: HistoryArgs) -> Result<()> {
    let stored = ctx.session.snapshot().await.medical;
    let medical = args.merge_into(stored)?;
    ctx.session.update_medical(medical).await?;
    println!("✅ Medical history saved successfully.");
    println!("Your intake forms are complete. You may now proceed to consultation.");
    Ok(())
}

async fn consult(ctx: &AppContext, request: ConsultationRequest) -> Result<()> {
    let record = ctx.consult(request).await?;
    println!("{}", render_consultation(&record));
    Ok(())
}

async fn summary(ctx: &AppContext) -> Result<()> {
    let summary = ctx.session.view_summary("cli").await?;
    println!("Patient Information Summary\n\n{}", summary.render());
    Ok(())
}

async fn settings(ctx: &AppContext) -> Result<()> {
    let status = ctx.settings_status().await;
    println!("{}", render_settings(&status, &ctx.ai_features().await));
    println!("\n{}", key_source_hint());
    Ok(())
}

fn key_source_hint() -> String {
    let vars: Vec<&str> = Provider::ALL.iter().map(|p| p.env_var()).collect();
    format!(
        "Keys are read from {} or a .env file at startup. \
         A running server accepts changes through PUT /api/settings/llm.",
        vars.join(", ")
    )
}

fn resources(ctx: &AppContext, category: Option<&str>) -> Result<()> {
    let output = match category {
        Some(category) => render_resources(category, &catalog::education_resources(category)?),
        None => render_library(&catalog::resource_library(&ctx.persona)),
    };
    println!("{}", output);
    Ok(())
}

async fn export(ctx: &AppContext, output: &Path) -> Result<()> {
    let archive = ctx.export_archive().await?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(output, &archive).await?;
    println!("📁 Patient record exported to: {}", output.display());
    Ok(())
}

async fn audit(ctx: &AppContext, csv: bool) -> Result<()> {
    if csv {
        print!("{}", ctx.audit.export_csv().await?);
        return Ok(());
    }
    let events = ctx.audit.events().await?;
    if events.is_empty() {
        println!("No audit events recorded.");
    }
    for event in events {
        println!(
            "{}  {:<24} {}",
            event.timestamp.format("%Y-%m-%d %H:%M:%S"),
            event.action.to_string(),
            event.detail
        );
    }
    ctx.audit
        .record(AuditAction::RecordViewed, "audit trail via cli")
        .await
}

pub fn render_about(persona: &Persona) -> String {
    let page: HomePage = catalog::home(persona);
    let mut out = vec![
        persona.formal_introduction(),
        String::new(),
        page.title,
        String::new(),
        page.introduction,
    ];
    out.extend(page.focus_areas.iter().map(|area| format!("  - {}", area)));
    out.push(String::new());
    out.push(format!(
        "{}'s practice is founded on these core principles:",
        persona.name
    ));
    out.extend(
        page.principles
            .iter()
            .map(|p| format!("  - {}: {}", p.value, p.description)),
    );
    out.push(String::new());
    out.push(page.call_to_action);
    out.push(String::new());
    out.push(persona.sidebar_summary());
    out.push(format!("Today's Date: {}", Utc::now().format("%B %d, %Y")));
    out.join("\n")
}

pub fn render_specialties(specialties: &Specialties) -> String {
    let mut out = vec!["Primary Specialties".to_string()];
    for specialty in &specialties.primary {
        out.push(format!("  {}", specialty.name));
        out.push(format!("    {}", specialty.description));
        out.push(format!("    {}", specialty.services));
    }
    out.push(String::new());
    out.push("Additional Focus Areas".to_string());
    for area in &specialties.secondary {
        out.push(format!("  {}: {}", area.name, area.note));
    }
    out.join("\n")
}

pub fn render_approach(approach: &Approach) -> String {
    let mut out = vec!["Evidence-Based Approach".to_string(), approach.summary.clone()];
    out.extend(
        approach
            .knowledge_priorities
            .iter()
            .enumerate()
            .map(|(i, p)| format!("  {}. {}", i + 1, p)),
    );
    out.push(String::new());
    out.push("Inclusive Care Framework".to_string());
    out.extend(approach.inclusive_care.iter().map(|f| format!("  - {}", f)));
    out.join("\n")
}

pub fn render_resources(category: &str, resources: &[Resource]) -> String {
    let heading = catalog::education_category(category).unwrap_or(category);
    let mut out = vec![format!("{} Resources", heading)];
    for resource in resources {
        out.push(format!("  {}", resource.title));
        out.push(format!("    Type: {}", resource.kind));
        out.push(format!("    Description: {}", resource.description));
        out.push(format!("    [{}]", resource.request_label()));
    }
    out.join("\n")
}

fn render_library(library: &catalog::ResourceLibrary) -> String {
    let mut out = vec!["Patient Education Categories".to_string()];
    out.extend(
        library
            .education_categories
            .iter()
            .map(|c| format!("  - {}", c)),
    );
    out.push(String::new());
    out.push("Treatment Approaches".to_string());
    for approach in &library.treatment_approaches {
        out.push(format!("  {}", approach.name));
        out.extend(approach.notes.iter().map(|n| format!("    {}", n)));
    }
    out.push(String::new());
    out.push("Research & Publications".to_string());
    out.extend(library.research_topics.iter().map(|t| format!("  - {}", t)));
    out.push(library.research_note.clone());
    out.join("\n")
}

pub fn render_hipaa(notice: &HipaaNotice) -> String {
    let section = |title: &str, items: &[String]| -> String {
        let mut lines = vec![format!("{}:", title)];
        lines.extend(items.iter().map(|i| format!("  - {}", i)));
        lines.join("\n")
    };
    [
        notice.title.clone(),
        notice.statement.clone(),
        notice
            .safeguards
            .iter()
            .map(|s| format!("  - {}", s))
            .collect::<Vec<_>>()
            .join("\n"),
        format!("Privacy Officer Contact: {}", notice.privacy_officer),
        String::new(),
        section("Technical Safeguards", &notice.technical_safeguards),
        section("Physical Safeguards", &notice.physical_safeguards),
        section("Administrative Safeguards", &notice.administrative_safeguards),
    ]
    .join("\n")
}

pub fn render_settings(status: &[ProviderStatus], features: &[String]) -> String {
    let mut out = vec!["AI Integration Settings".to_string()];
    for provider in status {
        let state = match &provider.key_hint {
            Some(hint) => format!("configured ({})", hint),
            None => "not configured".to_string(),
        };
        out.push(format!("  {:<20} {}", provider.label, state));
    }

    let active: Vec<&str> = status
        .iter()
        .filter(|s| s.configured)
        .map(|s| s.label)
        .collect();
    out.push(String::new());
    if active.is_empty() {
        out.push("No AI services configured. Some features may be limited.".to_string());
    } else {
        out.push(format!("Active AI Services: {}", active.join(", ")));
    }

    if !features.is_empty() {
        out.push(String::new());
        out.push("AI Integration Features".to_string());
        out.extend(features.iter().map(|f| format!("  - {}", f)));
    }
    out.join("\n")
}

pub fn render_consultation(record: &ConsultationRecord) -> String {
    let source = record.provider.as_deref().unwrap_or("offline guidance");
    format!(
        "Priority: {}    Source: {}    Reference: {}\n\n{}",
        record.priority, source, record.id, record.response
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::llm::LlmSettings;
    use tempfile::TempDir;

    #[test]
    fn test_render_settings_lists_active_services() {
        let status = vec![
            ProviderStatus {
                provider: Provider::Anthropic,
                label: "Anthropic (Claude)",
                configured: true,
                key_hint: Some("****abcd".to_string()),
            },
            ProviderStatus {
                provider: Provider::Xai,
                label: "XAI",
                configured: false,
                key_hint: None,
            },
        ];
        let output = render_settings(&status, &catalog::ai_features(true));
        assert!(output.contains("configured (****abcd)"));
        assert!(output.contains("Active AI Services: Anthropic (Claude)"));
        assert!(output.contains("  - Automated clinical note generation"));
    }

    #[tokio::test]
    async fn test_settings_command_is_read_only() {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.storage.data_dir = dir.path().display().to_string();
        let mut settings = LlmSettings::default();
        settings.set_key(Provider::Meta, "meta-key-9911");
        let ctx = AppContext::bootstrap(config, settings).await.unwrap();

        run(&ctx, Command::Settings).await.unwrap();
        assert!(ctx.audit.events().await.unwrap().is_empty());
        assert!(ctx.any_provider_configured().await);
        assert!(key_source_hint().contains("META_API_KEY"));
    }

    #[test]
    fn test_render_settings_without_providers() {
        let output = render_settings(&[], &[]);
        assert!(output.ends_with("No AI services configured. Some features may be limited."));
    }

    #[test]
    fn test_render_resources_uses_canonical_heading() {
        let resources = catalog::education_resources("hormone balance").unwrap();
        let output = render_resources("hormone balance", &resources);
        assert!(output.starts_with("Hormone Balance Resources"));
        assert!(output.contains("[Request PDF Guide]"));
    }

    #[test]
    fn test_render_about_starts_with_credentials() {
        let output = render_about(&Persona::default());
        assert!(output.starts_with("Dr. Jackson, DNP, APRN, FNP-C, CFMP"));
        assert!(output.contains("  - Patient Protection: Ensuring the highest standards of care"));
    }

    #[test]
    fn test_render_approach_numbers_priorities() {
        let output = render_approach(&catalog::approach(&Persona::default()));
        assert!(output.contains("  1. Evidence-based research"));
        assert!(output.contains("  - Provide culturally competent care"));
    }
}
