// Adapters layer: concrete implementations for external systems.
// LLM HTTP clients live under `crate::llm`.

pub mod storage;

pub use storage::LocalStorage;
