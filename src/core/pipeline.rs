use crate::config::LlmConfig;
use crate::core::audit::AuditAction;
use crate::core::session::SessionStore;
use crate::domain::model::{Assessment, ConsultationRecord, ConsultationRequest, ScreenedRequest};
use crate::domain::persona::{Persona, PriorityLevel};
use crate::domain::ports::{CompletionRequest, Pipeline, Storage};
use crate::llm::prompt::{consultation_prompt, parse_reply, patient_context};
use crate::llm::LlmRouter;
use crate::utils::error::{ConsultError, Result};
use crate::utils::validation::Validate;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Built-in assessment used when no provider can answer.
pub fn offline_guidance(priority: PriorityLevel) -> (String, Vec<String>) {
    let (assessment, recommendations) = match priority {
        PriorityLevel::High => (
            "The presenting concern has been triaged as high priority and warrants prompt \
             clinical evaluation. A remote review cannot substitute for direct examination.",
            vec![
                "If symptoms are severe or worsening, contact emergency services (911) or proceed to the nearest emergency department immediately",
                "Schedule an urgent in-person evaluation with your care team",
                "Bring a current list of medications, supplements and allergies to the visit",
            ],
        ),
        PriorityLevel::Medium => (
            "The presenting concern is appropriate for a structured clinical review that \
             integrates evidence-based and holistic wellness perspectives.",
            vec![
                "Schedule a comprehensive consultation to review your history and current symptoms",
                "Maintain a symptom journal noting onset, duration, severity and triggers",
                "Continue current medications as prescribed unless directed otherwise",
            ],
        ),
        PriorityLevel::Low => (
            "The request has been noted and does not indicate an urgent clinical need.",
            vec![
                "Direct administrative questions to the practice office",
                "Review the patient education resources for general guidance",
            ],
        ),
    };
    (
        assessment.to_string(),
        recommendations.into_iter().map(String::from).collect(),
    )
}

pub struct ConsultationPipeline<S: Storage> {
    persona: Arc<Persona>,
    session: Arc<SessionStore<S>>,
    router: LlmRouter,
    offline_fallback: bool,
    max_tokens: u32,
}

impl<S: Storage> ConsultationPipeline<S> {
    pub fn new(
        persona: Arc<Persona>,
        session: Arc<SessionStore<S>>,
        router: LlmRouter,
        config: &LlmConfig,
    ) -> Self {
        Self {
            persona,
            session,
            router,
            offline_fallback: config.offline_fallback,
            max_tokens: config.max_tokens,
        }
    }

    fn offline(&self, screened: ScreenedRequest) -> Assessment {
        let (assessment, recommendations) = offline_guidance(screened.priority);
        Assessment {
            screened,
            assessment,
            recommendations,
            provider: None,
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for ConsultationPipeline<S> {
    async fn screen(&self, request: ConsultationRequest) -> Result<ScreenedRequest> {
        request.validate()?;

        let session = self.session.snapshot().await;
        if !session.intake_complete() {
            return Err(ConsultError::IntakeIncompleteError {
                message: "patient first and last name are required".to_string(),
            });
        }

        let audit = self.session.audit();
        let screened_text = format!(
            "{} {}",
            request.primary_concern,
            request.query_type.as_deref().unwrap_or_default()
        );
        if let Some(term) = self.persona.boundary_violation(&screened_text) {
            audit
                .record(AuditAction::ConsultationDeclined, format!("term={}", term))
                .await?;
            return Err(ConsultError::QueryDeclinedError {
                reason: format!("'{}' is outside the clinical relationship", term),
            });
        }

        let priority = self.persona.prioritize(request.triage_text());
        tracing::debug!("Request triaged as {} priority", priority);
        audit
            .record(
                AuditAction::ConsultationRequested,
                format!("priority={}", priority),
            )
            .await?;

        Ok(ScreenedRequest {
            patient_context: patient_context(&session, Utc::now().date_naive()),
            request,
            priority,
        })
    }

    async fn assess(&self, screened: ScreenedRequest) -> Result<Assessment> {
        if self.router.is_empty() {
            tracing::info!("No AI services configured, using offline guidance");
            return Ok(self.offline(screened));
        }

        let completion_request = CompletionRequest {
            system: self.persona.system_prompt(),
            prompt: consultation_prompt(
                &screened.request,
                screened.priority,
                &screened.patient_context,
            ),
            max_tokens: self.max_tokens,
        };

        let reply = self
            .router
            .complete(&completion_request)
            .await
            .and_then(|completion| {
                let (assessment, recommendations) = parse_reply(&completion.text);
                if assessment.is_empty() && recommendations.is_empty() {
                    return Err(ConsultError::ProviderError {
                        provider: completion.provider,
                        status: 200,
                        message: "empty reply".to_string(),
                    });
                }
                Ok((completion.provider, assessment, recommendations))
            });

        // the reply is recorded as given; template text is only used offline
        let (provider, assessment, recommendations) = match reply {
            Ok(reply) => reply,
            Err(e) if self.offline_fallback => {
                tracing::warn!("No usable provider reply ({}), using offline guidance", e);
                return Ok(self.offline(screened));
            }
            Err(e) => return Err(e),
        };

        Ok(Assessment {
            screened,
            assessment,
            recommendations,
            provider: Some(provider),
        })
    }

    async fn record(&self, assessment: Assessment) -> Result<ConsultationRecord> {
        let request = &assessment.screened.request;
        let response = self.persona.format_clinical_response(
            request.primary_concern.trim(),
            &assessment.assessment,
            &assessment.recommendations,
        );

        let record = ConsultationRecord {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            priority: assessment.screened.priority,
            primary_concern: request.primary_concern.trim().to_string(),
            assessment: assessment.assessment,
            recommendations: assessment.recommendations,
            response,
            provider: assessment.provider,
        };

        self.session.add_consultation(record.clone()).await?;
        self.session
            .audit()
            .record(
                AuditAction::ConsultationCompleted,
                format!(
                    "id={} priority={} source={}",
                    record.id,
                    record.priority,
                    record.provider.as_deref().unwrap_or("offline")
                ),
            )
            .await?;

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::audit::AuditLog;
    use crate::domain::model::PatientContactInfo;
    use crate::domain::ports::CompletionClient;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                ConsultError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }

        async fn append_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.entry(path.to_string()).or_default().extend_from_slice(data);
            Ok(())
        }

        async fn exists(&self, path: &str) -> bool {
            self.files.lock().await.contains_key(path)
        }

        fn location(&self, path: &str) -> String {
            format!("memory://{}", path)
        }
    }

    struct ScriptedClient {
        reply: std::result::Result<&'static str, u16>,
    }

    #[async_trait::async_trait]
    impl CompletionClient for ScriptedClient {
        fn provider_label(&self) -> &str {
            "Scripted"
        }

        async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
            match self.reply {
                Ok(text) => Ok(text.to_string()),
                Err(status) => Err(ConsultError::ProviderError {
                    provider: "Scripted".to_string(),
                    status,
                    message: "failure".to_string(),
                }),
            }
        }
    }

    async fn session(with_intake: bool) -> Arc<SessionStore<MockStorage>> {
        let storage = MockStorage::new();
        let audit = Arc::new(AuditLog::new(storage.clone(), "audit.log", true));
        let store = SessionStore::load(storage, audit).await.unwrap();
        if with_intake {
            store
                .update_contact(PatientContactInfo {
                    first_name: "Maya".to_string(),
                    last_name: "Chen".to_string(),
                    date_of_birth: NaiveDate::from_ymd_opt(1982, 4, 2),
                    email: "maya@example.org".to_string(),
                    phone: "555-123-4567".to_string(),
                    ..PatientContactInfo::default()
                })
                .await
                .unwrap();
        }
        Arc::new(store)
    }

    fn pipeline(
        session: Arc<SessionStore<MockStorage>>,
        clients: Vec<Box<dyn CompletionClient>>,
        offline_fallback: bool,
    ) -> ConsultationPipeline<MockStorage> {
        let config = LlmConfig {
            offline_fallback,
            ..LlmConfig::default()
        };
        ConsultationPipeline::new(
            Arc::new(Persona::default()),
            session,
            LlmRouter::new(clients),
            &config,
        )
    }

    #[tokio::test]
    async fn test_screen_requires_intake() {
        let pipeline = pipeline(session(false).await, vec![], true);
        let err = pipeline
            .screen(ConsultationRequest::new("Persistent fatigue"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConsultError::IntakeIncompleteError { .. }));
    }

    #[tokio::test]
    async fn test_screen_declines_and_audits_inappropriate_request() {
        let session = session(true).await;
        let pipeline = pipeline(session.clone(), vec![], true);
        let err = pipeline
            .screen(ConsultationRequest::new("Can we be friends on a personal level?"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConsultError::QueryDeclinedError { .. }));

        let events = session.audit().events().await.unwrap();
        let last = events.last().unwrap();
        assert_eq!(last.action, AuditAction::ConsultationDeclined);
        assert_eq!(last.detail, "term=personal");
    }

    #[tokio::test]
    async fn test_screen_triages_with_query_type() {
        let pipeline = pipeline(session(true).await, vec![], true);
        let mut request = ConsultationRequest::new("Chest pain after exercise");
        request.query_type = Some("Patient safety concerns".to_string());

        let screened = pipeline.screen(request).await.unwrap();
        assert_eq!(screened.priority, PriorityLevel::High);
        assert!(screened.patient_context.contains("Age:"));
        assert!(!screened.patient_context.contains("Chen"));
    }

    #[tokio::test]
    async fn test_offline_consultation_without_providers() {
        let session = session(true).await;
        let pipeline = pipeline(session.clone(), vec![], false);

        let screened = pipeline
            .screen(ConsultationRequest::new("Clinical emergencies: fainting"))
            .await
            .unwrap();
        let assessment = pipeline.assess(screened).await.unwrap();
        assert!(assessment.provider.is_none());
        assert!(assessment.recommendations[0].contains("emergency services"));

        let record = pipeline.record(assessment).await.unwrap();
        assert_eq!(record.priority, PriorityLevel::High);
        assert!(record.response.starts_with("Clinical Assessment:"));
        assert_eq!(session.consultations().await.len(), 1);
    }

    #[tokio::test]
    async fn test_llm_reply_is_parsed_into_record() {
        let session = session(true).await;
        let client = ScriptedClient {
            reply: Ok("Assessment: Sleep onset insomnia is likely.\nRecommendations:\n- Fixed wake time\n- No screens after 9pm"),
        };
        let pipeline = pipeline(session.clone(), vec![Box::new(client)], true);

        let screened = pipeline
            .screen(ConsultationRequest::new("Trouble falling asleep"))
            .await
            .unwrap();
        let record = pipeline
            .record(pipeline.assess(screened).await.unwrap())
            .await
            .unwrap();

        assert_eq!(record.assessment, "Sleep onset insomnia is likely.");
        assert_eq!(record.recommendations, vec!["Fixed wake time", "No screens after 9pm"]);
        assert_eq!(record.provider.as_deref(), Some("Scripted"));
        assert!(record.response.contains("1. Fixed wake time\n2. No screens after 9pm"));

        let actions: Vec<AuditAction> = session
            .audit()
            .events()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.action)
            .collect();
        assert_eq!(
            actions,
            vec![
                AuditAction::ContactUpdated,
                AuditAction::ConsultationRequested,
                AuditAction::ConsultationCompleted
            ]
        );
    }

    #[tokio::test]
    async fn test_provider_failure_respects_offline_fallback() {
        let failing = || -> Vec<Box<dyn CompletionClient>> {
            vec![Box::new(ScriptedClient { reply: Err(503) })]
        };

        let with_fallback = pipeline(session(true).await, failing(), true);
        let screened = with_fallback
            .screen(ConsultationRequest::new("Joint stiffness"))
            .await
            .unwrap();
        let assessment = with_fallback.assess(screened).await.unwrap();
        assert!(assessment.provider.is_none());

        let strict = pipeline(session(true).await, failing(), false);
        let screened = strict
            .screen(ConsultationRequest::new("Joint stiffness"))
            .await
            .unwrap();
        assert!(matches!(
            strict.assess(screened).await,
            Err(ConsultError::ProviderError { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_reply_without_recommendations_is_kept_as_given() {
        let client = ScriptedClient {
            reply: Ok("Symptoms suggest tension-type headache."),
        };
        let pipeline = pipeline(session(true).await, vec![Box::new(client)], true);
        let screened = pipeline
            .screen(ConsultationRequest::new("Afternoon headaches"))
            .await
            .unwrap();

        let assessment = pipeline.assess(screened).await.unwrap();
        assert_eq!(assessment.provider.as_deref(), Some("Scripted"));
        assert_eq!(assessment.assessment, "Symptoms suggest tension-type headache.");
        assert!(assessment.recommendations.is_empty());
    }

    #[tokio::test]
    async fn test_blank_reply_counts_as_provider_failure() {
        let blank = || -> Vec<Box<dyn CompletionClient>> {
            vec![Box::new(ScriptedClient { reply: Ok("  \n") })]
        };

        let with_fallback = pipeline(session(true).await, blank(), true);
        let screened = with_fallback
            .screen(ConsultationRequest::new("Afternoon headaches"))
            .await
            .unwrap();
        assert!(with_fallback.assess(screened).await.unwrap().provider.is_none());

        let strict = pipeline(session(true).await, blank(), false);
        let screened = strict
            .screen(ConsultationRequest::new("Afternoon headaches"))
            .await
            .unwrap();
        assert!(matches!(
            strict.assess(screened).await,
            Err(ConsultError::ProviderError { status: 200, .. })
        ));
    }

    #[test]
    fn test_offline_guidance_by_priority() {
        let (_, high) = offline_guidance(PriorityLevel::High);
        let (_, low) = offline_guidance(PriorityLevel::Low);
        assert!(high[0].contains("911"));
        assert!(!low.iter().any(|r| r.contains("911")));
    }
}
