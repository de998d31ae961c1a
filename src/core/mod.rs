pub mod audit;
pub mod catalog;
pub mod engine;
pub mod export;
pub mod pipeline;
pub mod session;

pub use crate::domain::ports::{CompletionClient, Pipeline, Storage};
pub use crate::utils::error::Result;
pub use audit::{AuditAction, AuditEvent, AuditLog};
pub use engine::ConsultationEngine;
pub use pipeline::ConsultationPipeline;
pub use session::SessionStore;
