//! Prompt assembly

use pokeagent_provider::{Message, ToolCallDef};

/// Builds the system prompt and the message list for each turn
pub struct ContextBuilder {
    tool_descriptions: String,
}

impl ContextBuilder {
    /// `tool_descriptions` is usually [`ToolRegistry::describe`](crate::ToolRegistry::describe)
    pub fn new(tool_descriptions: impl Into<String>) -> Self {
        Self {
            tool_descriptions: tool_descriptions.into(),
        }
    }

    pub fn build_system_prompt(&self) -> String {
        let tools = if self.tool_descriptions.is_empty() {
            "(none)".to_string()
        } else {
            self.tool_descriptions.clone()
        };

        format!(
            r#"# pokeagent

You are a helpful assistant that answers questions about Pokémon.

## Tools
{}

## Rules
- Call fetch_pokemon_info once for each Pokémon the question mentions before answering.
- Base facts (types, abilities, stats, height, weight) on the tool output, not on memory.
- Answer in plain sentences. Do not paste raw JSON.
- If a lookup returns an error, tell the user which Pokémon failed and why."#,
            tools
        )
    }

    /// System prompt, then history, then the current input
    pub fn build_messages(&self, history: Vec<Message>, current_message: &str) -> Vec<Message> {
        let mut messages = vec![Message::system(self.build_system_prompt())];
        messages.extend(history);
        messages.push(Message::user(current_message));
        messages
    }

    pub fn add_tool_result(
        messages: &mut Vec<Message>,
        tool_call_id: &str,
        name: &str,
        result: &str,
    ) {
        messages.push(Message::tool(tool_call_id, name, result));
    }

    pub fn add_assistant_message(
        messages: &mut Vec<Message>,
        content: Option<&str>,
        tool_calls: Option<Vec<ToolCallDef>>,
    ) {
        let mut msg = Message::assistant(content.unwrap_or(""));
        msg.tool_calls = tool_calls;
        messages.push(msg);
    }
}
