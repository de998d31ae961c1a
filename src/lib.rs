pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod llm;
pub mod server;
pub mod utils;

pub use crate::adapters::LocalStorage;
pub use crate::app::AppContext;
pub use crate::config::AppConfig;
pub use crate::core::{ConsultationEngine, ConsultationPipeline, SessionStore};
pub use crate::domain::persona::{Persona, PriorityLevel};
pub use crate::llm::{LlmRouter, LlmSettings};
pub use crate::utils::error::{ConsultError, Result};
