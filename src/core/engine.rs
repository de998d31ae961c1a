use crate::domain::model::{ConsultationRecord, ConsultationRequest};
use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

/// Drives a request through screening, assessment and recording.
pub struct ConsultationEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> ConsultationEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self, request: ConsultationRequest) -> Result<ConsultationRecord> {
        let started = Instant::now();
        tracing::info!("Starting consultation");

        tracing::debug!("Screening request...");
        let screened = self.pipeline.screen(request).await?;
        tracing::info!("Request accepted with {} priority", screened.priority);

        tracing::debug!("Requesting assessment...");
        let assessment = self.pipeline.assess(screened).await?;
        tracing::info!(
            "Assessment ready from {} with {} recommendations",
            assessment.provider.as_deref().unwrap_or("offline guidance"),
            assessment.recommendations.len()
        );

        tracing::debug!("Recording consultation...");
        let record = self.pipeline.record(assessment).await?;
        tracing::info!(
            "✅ Consultation {} recorded in {:.2?}",
            record.id,
            started.elapsed()
        );

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Assessment, ScreenedRequest};
    use crate::domain::persona::PriorityLevel;
    use crate::utils::error::ConsultError;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct RecordingPipeline {
        stages: Mutex<Vec<&'static str>>,
        decline: bool,
    }

    #[async_trait]
    impl Pipeline for RecordingPipeline {
        async fn screen(&self, request: ConsultationRequest) -> Result<ScreenedRequest> {
            self.stages.lock().unwrap().push("screen");
            if self.decline {
                return Err(ConsultError::QueryDeclinedError {
                    reason: "test".to_string(),
                });
            }
            Ok(ScreenedRequest {
                request,
                priority: PriorityLevel::Low,
                patient_context: String::new(),
            })
        }

        async fn assess(&self, screened: ScreenedRequest) -> Result<Assessment> {
            self.stages.lock().unwrap().push("assess");
            Ok(Assessment {
                screened,
                assessment: "ok".to_string(),
                recommendations: vec![],
                provider: None,
            })
        }

        async fn record(&self, assessment: Assessment) -> Result<ConsultationRecord> {
            self.stages.lock().unwrap().push("record");
            Ok(ConsultationRecord {
                id: Uuid::new_v4(),
                created_at: Utc::now(),
                priority: assessment.screened.priority,
                primary_concern: assessment.screened.request.primary_concern,
                assessment: assessment.assessment,
                recommendations: assessment.recommendations,
                response: String::new(),
                provider: assessment.provider,
            })
        }
    }

    #[tokio::test]
    async fn test_engine_runs_stages_in_order() {
        let engine = ConsultationEngine::new(RecordingPipeline::default());
        let record = engine.run(ConsultationRequest::new("Brain fog")).await.unwrap();
        assert_eq!(record.primary_concern, "Brain fog");
        assert_eq!(
            *engine.pipeline.stages.lock().unwrap(),
            vec!["screen", "assess", "record"]
        );
    }

    #[tokio::test]
    async fn test_engine_stops_at_first_failure() {
        let engine = ConsultationEngine::new(RecordingPipeline {
            decline: true,
            ..RecordingPipeline::default()
        });
        assert!(engine.run(ConsultationRequest::new("x")).await.is_err());
        assert_eq!(*engine.pipeline.stages.lock().unwrap(), vec!["screen"]);
    }
}
