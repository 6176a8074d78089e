//! Pokémon question-answering agent
//!
//! Tool registry, prompt assembly and the chat/tool-call loop.

use thiserror::Error;

pub mod context;
pub mod loop_agent;
pub mod tools;

pub use context::ContextBuilder;
pub use loop_agent::{AgentLoop, FALLBACK_ANSWER, ITERATION_LIMIT_ANSWER};
pub use tools::{PokemonLookupTool, ToolRegistry, ToolTrait};

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("tool failed: {0}")]
    ToolExecution(String),

    #[error("provider error: {0}")]
    Provider(#[from] pokeagent_provider::ProviderError),

    #[error("iteration limit reached")]
    MaxIterations,
}

pub type Result<T> = std::result::Result<T, AgentError>;
