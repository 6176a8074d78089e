//! Conversation lifecycle and store round trips

use pokeagent_session::{Conversation, ConversationStore, Role, DEFAULT_MAX_ENTRIES};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::sleep;

#[test]
fn test_new_conversation() {
    let conversation = Conversation::new("cli:default");
    assert_eq!(conversation.id, "cli:default");
    assert!(conversation.is_empty());
    assert_eq!(conversation.max_entries, DEFAULT_MAX_ENTRIES);
    assert_eq!(conversation.created_at, conversation.updated_at);
}

#[tokio::test]
async fn test_push_updates_timestamp_and_order() {
    let mut conversation = Conversation::new("t");
    let before = conversation.updated_at;
    sleep(Duration::from_millis(10)).await;

    conversation.push_user("Tell me about Pikachu");
    conversation.push_assistant("Pikachu is an Electric type.");

    assert_eq!(conversation.len(), 2);
    assert_eq!(conversation.entries()[0].role, Role::User);
    assert_eq!(conversation.entries()[1].role, Role::Assistant);
    assert!(conversation.updated_at > before);
}

#[test]
fn test_truncation_drops_oldest() {
    let mut conversation = Conversation::with_max_entries("t", 3);
    for i in 0..5 {
        conversation.push_user(format!("message {}", i));
    }
    assert_eq!(conversation.len(), 3);
    assert_eq!(conversation.entries()[0].content, "message 2");
    assert_eq!(conversation.entries()[2].content, "message 4");
}

#[test]
fn test_history_limits_and_maps_roles() {
    let mut conversation = Conversation::new("t");
    conversation.push_user("one");
    conversation.push_assistant("two");
    conversation.push_user("three");

    let all = conversation.history(10);
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].role, "user");
    assert_eq!(all[1].role, "assistant");

    let recent = conversation.history(2);
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].content.as_deref(), Some("two"));
    assert_eq!(recent[1].content.as_deref(), Some("three"));

    assert!(conversation.history(0).is_empty());
}

#[test]
fn test_transcript_lines() {
    let mut conversation = Conversation::new("t");
    assert_eq!(conversation.transcript(), "");

    conversation.push_user("Which is heavier, Snorlax or Pikachu?");
    conversation.push_assistant("Snorlax.");
    assert_eq!(
        conversation.transcript(),
        "User: Which is heavier, Snorlax or Pikachu?\nAssistant: Snorlax."
    );
}

#[test]
fn test_clear() {
    let mut conversation = Conversation::new("t");
    conversation.push_user("hi");
    conversation.clear();
    assert!(conversation.is_empty());
    assert_eq!(conversation.transcript(), "");
}

#[tokio::test]
async fn test_store_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = ConversationStore::new(dir.path().join("conversations"));

    let mut conversation = Conversation::new("cli:default");
    conversation.push_user("Tell me about Eevee");
    conversation.push_assistant("Eevee is a Normal type.");
    store.save(&conversation).await.unwrap();

    assert!(dir.path().join("conversations/cli_default.json").exists());

    let loaded = store.load("cli:default").await.unwrap();
    assert_eq!(loaded.id, "cli:default");
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.entries()[1].content, "Eevee is a Normal type.");
}

#[tokio::test]
async fn test_store_load_missing_is_none() {
    let dir = TempDir::new().unwrap();
    let store = ConversationStore::new(dir.path());
    assert!(store.load("nobody").await.is_none());
}

#[tokio::test]
async fn test_store_load_corrupt_is_none() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
    let store = ConversationStore::new(dir.path());
    assert!(store.load("broken").await.is_none());
}

#[tokio::test]
async fn test_load_or_new_applies_cap() {
    let dir = TempDir::new().unwrap();
    let store = ConversationStore::new(dir.path());

    let mut conversation = Conversation::new("s");
    for i in 0..6 {
        conversation.push_user(format!("q{}", i));
    }
    store.save(&conversation).await.unwrap();

    let loaded = store.load_or_new("s", 4).await;
    assert_eq!(loaded.len(), 4);
    assert_eq!(loaded.max_entries, 4);

    let fresh = store.load_or_new("other", 7).await;
    assert!(fresh.is_empty());
    assert_eq!(fresh.max_entries, 7);
}

#[tokio::test]
async fn test_store_list_and_delete() {
    let dir = TempDir::new().unwrap();
    let store = ConversationStore::new(dir.path());

    assert!(store.list().await.is_empty());

    store.save(&Conversation::new("beta")).await.unwrap();
    store.save(&Conversation::new("alpha")).await.unwrap();
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    assert_eq!(store.list().await, vec!["alpha", "beta"]);

    assert!(store.delete("alpha").await.unwrap());
    assert!(!store.delete("alpha").await.unwrap());
    assert_eq!(store.list().await, vec!["beta"]);
}

#[tokio::test]
async fn test_list_on_missing_dir_is_empty() {
    let dir = TempDir::new().unwrap();
    let store = ConversationStore::new(dir.path().join("absent"));
    assert!(store.list().await.is_empty());
}
