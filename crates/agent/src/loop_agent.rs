//! Agent loop: chat, run requested tools, repeat until the model answers

use tracing::{debug, error, info, warn};

use pokeagent_config::Config;
use pokeagent_provider::{ChatParams, Message, Provider, ToolCallDef};
use pokeagent_session::Conversation;

use crate::context::ContextBuilder;
use crate::tools::{PokemonLookupTool, ToolRegistry};
use crate::{AgentError, Result};

/// Answer when the model finishes without any content
pub const FALLBACK_ANSWER: &str = "No answer provided.";

/// Answer when the model keeps calling tools past the iteration limit
pub const ITERATION_LIMIT_ANSWER: &str = "Agent stopped due to iteration limit.";

pub struct AgentLoop<P: Provider> {
    provider: P,
    tools: ToolRegistry,
    context: ContextBuilder,
    model: String,
    max_iterations: u32,
    max_tokens: u32,
    temperature: f32,
    history_messages: usize,
}

impl<P: Provider> AgentLoop<P> {
    pub fn new(provider: P, tools: ToolRegistry, model: String, max_iterations: u32) -> Self {
        let defaults = ChatParams::default();
        let context = ContextBuilder::new(tools.describe());
        Self {
            provider,
            tools,
            context,
            model,
            max_iterations,
            max_tokens: defaults.max_tokens,
            temperature: defaults.temperature,
            history_messages: 20,
        }
    }

    /// Agent with the Pokémon lookup tool and settings taken from `config`
    pub fn with_config(provider: P, config: &Config) -> Self {
        let mut tools = ToolRegistry::new();
        tools.register(PokemonLookupTool::from_config(config));

        let mut agent = Self::new(
            provider,
            tools,
            config.agent.model.clone(),
            config.agent.max_iterations,
        );
        agent.max_tokens = config.agent.max_tokens;
        agent.temperature = config.agent.temperature;
        agent.history_messages = config.agent.history_messages;
        agent
    }

    /// Number of earlier conversation entries sent with each question
    pub fn set_history_messages(&mut self, max: usize) {
        self.history_messages = max;
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Answer `input` in the context of `conversation` without recording it
    pub async fn ask(&self, conversation: &Conversation, input: &str) -> Result<String> {
        info!("Question in conversation {}", conversation.id);
        debug!("Input: {}", input);

        let history = conversation.history(self.history_messages);
        let messages = self.context.build_messages(history, input);
        self.run_agent_loop(messages).await
    }

    /// Answer `input` and append both turns to `conversation`.
    ///
    /// Never fails: faults become an inline answer so an interactive
    /// session can continue.
    pub async fn process(&self, conversation: &mut Conversation, input: &str) -> String {
        let answer = match self.ask(conversation, input).await {
            Ok(answer) => answer,
            Err(AgentError::MaxIterations) => {
                warn!("Iteration limit of {} reached", self.max_iterations);
                ITERATION_LIMIT_ANSWER.to_string()
            }
            Err(e) => {
                error!("Agent error: {}", e);
                format!("An error occurred: {}", e)
            }
        };

        conversation.push_user(input);
        conversation.push_assistant(answer.clone());
        answer
    }

    async fn run_agent_loop(&self, mut messages: Vec<Message>) -> Result<String> {
        let mut iteration = 0;

        loop {
            iteration += 1;
            if iteration > self.max_iterations {
                return Err(AgentError::MaxIterations);
            }

            debug!("Agent iteration {}", iteration);

            let params = ChatParams {
                model: self.model.clone(),
                messages: messages.clone(),
                tools: self.tools.definitions(),
                max_tokens: self.max_tokens,
                temperature: self.temperature,
            };

            let response = self.provider.chat(params).await?;

            if !response.has_tool_calls() {
                return Ok(response
                    .content
                    .filter(|c| !c.trim().is_empty())
                    .unwrap_or_else(|| FALLBACK_ANSWER.to_string()));
            }

            let tool_call_defs: Vec<ToolCallDef> = response
                .tool_calls
                .iter()
                .map(|tc| ToolCallDef::new(&tc.id, &tc.name, tc.arguments.clone()))
                .collect();

            ContextBuilder::add_assistant_message(
                &mut messages,
                response.content.as_deref(),
                Some(tool_call_defs),
            );

            for tool_call in &response.tool_calls {
                debug!("Executing tool: {}", tool_call.name);

                let result = self
                    .tools
                    .execute(&tool_call.name, tool_call.arguments.clone())
                    .await
                    .unwrap_or_else(|e| {
                        warn!("Tool {} failed: {}", tool_call.name, e);
                        format!("Error: {}", e)
                    });

                ContextBuilder::add_tool_result(
                    &mut messages,
                    &tool_call.id,
                    &tool_call.name,
                    &result,
                );
            }
        }
    }
}
