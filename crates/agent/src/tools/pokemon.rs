//! Pokémon lookup tool

use async_trait::async_trait;
use pokeagent_config::Config;
use pokeagent_pokedex::{DuplicatePolicy, HttpSource, Pokedex, RecordSource};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::ToolTrait;

pub const TOOL_NAME: &str = "fetch_pokemon_info";
pub const TOOL_DESCRIPTION: &str = "Fetch and return key information about a Pokémon.";

/// Exposes [`Pokedex::lookup`] to the model.
///
/// Lookup failures are returned as an `{"error": ...}` document rather than
/// a tool error, so the model can explain them.
pub struct PokemonLookupTool<S = HttpSource> {
    pokedex: Pokedex<S>,
}

impl PokemonLookupTool<HttpSource> {
    pub fn from_config(config: &Config) -> Self {
        let policy = config
            .pokedex
            .duplicate_policy
            .parse::<DuplicatePolicy>()
            .unwrap_or_else(|e| {
                warn!("{}, using '{:?}'", e, DuplicatePolicy::default());
                DuplicatePolicy::default()
            });
        let source = HttpSource::with_timeout(config.fetch_timeout());
        Self::new(Pokedex::with_source(config.index_path(), source).with_policy(policy))
    }
}

impl<S: RecordSource> PokemonLookupTool<S> {
    pub fn new(pokedex: Pokedex<S>) -> Self {
        Self { pokedex }
    }

    pub fn pokedex(&self) -> &Pokedex<S> {
        &self.pokedex
    }
}

#[async_trait]
impl<S: RecordSource + 'static> ToolTrait for PokemonLookupTool<S> {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        TOOL_DESCRIPTION
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "pokemon_name": {
                    "type": "string",
                    "description": "Name of the Pokémon, e.g. \"Pikachu\""
                }
            },
            "required": ["pokemon_name"]
        })
    }

    async fn execute(
        &self,
        args: Value,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        // A bare string is the name itself; anything else without a string
        // `pokemon_name` counts as an empty name
        let name = match &args {
            Value::String(name) => name.as_str(),
            other => other["pokemon_name"].as_str().unwrap_or(""),
        };
        debug!("{} called with '{}'", TOOL_NAME, name);

        let outcome = self.pokedex.lookup(name).await;
        Ok(serde_json::to_string(&outcome)?)
    }
}
