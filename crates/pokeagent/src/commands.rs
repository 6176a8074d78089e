//! pokeagent command implementations

use anyhow::{Context, Result};
use serde::Deserialize;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use pokeagent_agent::{AgentLoop, PokemonLookupTool};
use pokeagent_config::{self, Backend, Config};
use pokeagent_pokedex::IndexEntry;
use pokeagent_provider::OpenAiProvider;
use pokeagent_session::{Conversation, ConversationStore};

/// Read line from stdin; `None` at end of input
fn read_line() -> Result<Option<String>> {
    let mut input = String::new();
    let read = std::io::stdin().read_line(&mut input)?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

/// Masked input, falling back to a plain read when there is no terminal
fn read_password() -> Result<String> {
    match rpassword::read_password() {
        Ok(password) => Ok(password.trim().to_string()),
        Err(_) => Ok(read_line()?.unwrap_or_default()),
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    std::io::stdout().flush()?;
    Ok(read_line()?.unwrap_or_default())
}

/// Provider for the configured backend
fn build_provider(config: &Config) -> Result<OpenAiProvider> {
    let backend = config.backend();
    let api_key = config.api_key();

    if backend.requires_api_key() && api_key.is_none() {
        let hint = backend
            .api_key_env()
            .map(|var| format!(" or set {}", var))
            .unwrap_or_default();
        anyhow::bail!(
            "No API key configured for {}. Run `pokeagent setup`{}",
            backend.as_str(),
            hint
        );
    }

    let provider = OpenAiProvider::new(api_key, config.api_base(), config.default_model());
    if backend.requires_api_key() {
        Ok(provider)
    } else {
        Ok(provider.allow_missing_key())
    }
}

fn default_model_for(backend: Backend) -> &'static str {
    match backend {
        Backend::OpenAi => "gpt-4o",
        Backend::OpenRouter => "openai/gpt-4o",
        Backend::Ollama => "llama3.1",
    }
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    data: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
struct ModelInfo {
    id: String,
}

/// List models, which doubles as an API key check
async fn fetch_models(api_base: &str, api_key: Option<&str>) -> Result<Vec<String>> {
    let client = reqwest::Client::new();
    let mut request = client.get(format!("{}/models", api_base.trim_end_matches('/')));
    if let Some(key) = api_key {
        request = request.header("Authorization", format!("Bearer {}", key));
    }
    let response = request.send().await?;

    if !response.status().is_success() {
        anyhow::bail!("Failed to fetch models: {}", response.status());
    }

    let models: ModelsResponse = response.json().await?;
    Ok(models.data.into_iter().map(|m| m.id).collect())
}

/// Interactive setup wizard
pub async fn setup_command() -> Result<()> {
    println!("pokeagent setup");
    println!("---------------");
    println!();

    let config_path = pokeagent_config::config_path();
    let mut config = Config::load()
        .await
        .with_context(|| format!("Failed to read {}", config_path.display()))?;

    // Step 1: backend
    println!("Step 1: Chat backend");
    println!("  1. OpenAI");
    println!("  2. OpenRouter");
    println!("  3. Ollama (local)");
    let previous = config.backend();
    let backend = match prompt(&format!("Your choice [{}]: ", config.backend().as_str()))?.as_str()
    {
        "" => config.backend(),
        "1" => Backend::OpenAi,
        "2" => Backend::OpenRouter,
        "3" => Backend::Ollama,
        other => other.parse::<Backend>().unwrap_or_else(|e| {
            println!("{}, keeping {}", e, config.backend().as_str());
            config.backend()
        }),
    };
    config.agent.backend = backend;
    println!();

    // Step 2: API key
    let api_base = config.api_base();
    if backend.requires_api_key() {
        println!("Step 2: API key");
        loop {
            print!("Enter your {} API key: ", backend.as_str());
            std::io::stdout().flush()?;
            let key = read_password()?;

            if key.is_empty() {
                if config.api_key().is_some() {
                    println!("Keeping the existing key.");
                    break;
                }
                println!("API key cannot be empty. Please try again.");
                continue;
            }

            print!("Validating API key... ");
            std::io::stdout().flush()?;
            match fetch_models(&api_base, Some(&key)).await {
                Ok(_) => {
                    println!("ok");
                    config.providers.get_mut(backend).api_key = key;
                    break;
                }
                Err(e) => {
                    println!("failed ({})", e);
                    let answer = prompt("Use it anyway? (y/N/retry): ")?.to_lowercase();
                    if answer == "y" || answer == "yes" {
                        config.providers.get_mut(backend).api_key = key;
                        break;
                    } else if answer != "retry" && answer != "r" {
                        anyhow::bail!("Setup cancelled");
                    }
                }
            }
        }
    } else {
        println!("Step 2: {} needs no API key (server at {})", backend.as_str(), api_base);
    }
    println!();

    // Step 3: model
    println!("Step 3: Model");
    let suggested = if previous == backend && !config.agent.model.is_empty() {
        config.agent.model.clone()
    } else {
        default_model_for(backend).to_string()
    };
    let model = prompt(&format!("Model [{}]: ", suggested))?;
    config.agent.model = if model.is_empty() { suggested } else { model };
    println!();

    // Step 4: index
    println!("Step 4: Name index");
    let index_path = prompt(&format!("Index file [{}]: ", config.pokedex.index_path))?;
    if !index_path.is_empty() {
        config.pokedex.index_path = index_path;
    }
    println!();

    config.save().await?;
    println!("Saved to {}", config_path.display());
    println!();

    if !config.index_path().exists() {
        println!("The index file does not exist yet. Create it with: pokeagent index");
    }
    println!("Ask a question with: pokeagent ask -m \"Who is faster, Pikachu or Jigglypuff?\"");

    Ok(())
}

/// Initialize config and data directory
pub async fn init_command() -> Result<()> {
    println!("Initializing pokeagent...");

    let config = pokeagent_config::init().await?;

    println!("Config: {}", pokeagent_config::config_path().display());
    println!();
    println!("Next steps:");
    println!("  1. Run `pokeagent setup`, or add an API key to the config file");
    println!(
        "  2. Download the name index: pokeagent index (writes {})",
        config.index_path().display()
    );
    println!("  3. Ask a question: pokeagent ask -m \"Tell me about Pikachu\"");
    Ok(())
}

/// Ask the agent, once or interactively
pub async fn ask_command(message: Option<String>, session: String, no_save: bool) -> Result<()> {
    let config = Config::load().await?;
    let provider = build_provider(&config)?;
    let agent = AgentLoop::with_config(provider, &config);

    let store = ConversationStore::new(pokeagent_config::conversations_dir());
    let max_entries = config.agent.conversation_max_entries;
    let mut conversation = if no_save {
        Conversation::with_max_entries(&session, max_entries)
    } else {
        store.load_or_new(&session, max_entries).await
    };
    debug!(
        "Conversation {} has {} entries",
        conversation.id,
        conversation.len()
    );

    if let Some(msg) = message {
        let answer = agent.process(&mut conversation, &msg).await;
        println!("{}", answer);
        save_conversation(&store, &conversation, no_save).await;
        return Ok(());
    }

    println!("Ask about any Pokémon. /history shows the conversation, /clear resets it, exit quits.");
    loop {
        print!("\nQuestion: ");
        std::io::stdout().flush()?;

        let input = match read_line()? {
            Some(input) => input,
            None => break,
        };
        match input.as_str() {
            "" => continue,
            "exit" | "quit" => break,
            "/history" => {
                if conversation.is_empty() {
                    println!("(no history)");
                } else {
                    println!("{}", conversation.transcript());
                }
                continue;
            }
            "/clear" => {
                conversation.clear();
                save_conversation(&store, &conversation, no_save).await;
                println!("Conversation cleared.");
                continue;
            }
            _ => {}
        }

        let answer = agent.process(&mut conversation, &input).await;
        println!("Answer: {}", answer);
        save_conversation(&store, &conversation, no_save).await;
    }

    Ok(())
}

async fn save_conversation(store: &ConversationStore, conversation: &Conversation, no_save: bool) {
    if no_save {
        return;
    }
    if let Err(e) = store.save(conversation).await {
        warn!("Failed to save conversation {}: {}", conversation.id, e);
    }
}

/// Run one lookup and print the outcome as JSON
pub async fn lookup_command(name: String) -> Result<()> {
    let config = Config::load().await?;
    let tool = PokemonLookupTool::from_config(&config);

    let outcome = tool.pokedex().lookup(&name).await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

#[derive(Debug, Deserialize)]
struct Listing {
    results: Vec<IndexEntry>,
}

/// Download the PokeAPI listing and write it as the name index
pub async fn index_command(output: Option<PathBuf>, url: Option<String>) -> Result<()> {
    let config = Config::load().await?;
    let output = output.unwrap_or_else(|| config.index_path());
    let url = url.unwrap_or_else(|| config.pokedex.index_source_url.clone());

    info!("Downloading name index from {}", url);
    println!("Downloading {}", url);

    let response = reqwest::get(&url)
        .await
        .with_context(|| format!("Failed to fetch {}", url))?;
    if !response.status().is_success() {
        anyhow::bail!("Failed to fetch {}: HTTP {}", url, response.status());
    }
    let listing: Listing = response
        .json()
        .await
        .with_context(|| format!("Unexpected listing format from {}", url))?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let content = serde_json::to_string_pretty(&listing.results)?;
    tokio::fs::write(&output, content)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "Wrote {} entries to {}",
        listing.results.len(),
        output.display()
    );
    Ok(())
}

/// Show status
pub async fn status_command() -> Result<()> {
    let config_path = pokeagent_config::config_path();

    println!("pokeagent status");
    println!("----------------");
    println!(
        "Config:   {} {}",
        config_path.display(),
        if config_path.exists() {
            "[OK]"
        } else {
            "[Missing]"
        }
    );

    let config = Config::load().await?;
    let index_path = config.index_path();
    println!(
        "Index:    {} {}",
        index_path.display(),
        if index_path.exists() {
            "[OK]"
        } else {
            "[Missing]"
        }
    );
    println!("Backend:  {} ({})", config.backend().as_str(), config.api_base());
    println!("Model:    {}", config.default_model());
    println!(
        "API Key:  {}",
        if !config.backend().requires_api_key() {
            "[Not required]"
        } else if config.has_api_key() {
            "[Set]"
        } else {
            "[Missing]"
        }
    );
    println!(
        "Timeout:  {}",
        config
            .fetch_timeout()
            .map(|t| format!("{}s", t.as_secs()))
            .unwrap_or_else(|| "none".to_string())
    );

    Ok(())
}
