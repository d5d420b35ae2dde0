//! Vector-backed chat memory tests.

mod common;

use std::sync::Arc;

use common::StubEmbedder;
use forage::memory::{AgentVectorMemory, MemoryRecord, MessageRole, VectorMemory};
use forage::vector::InMemoryStore;

fn vector_memory() -> VectorMemory {
    VectorMemory::new(Arc::new(StubEmbedder), Arc::new(InMemoryStore::new()))
}

fn agent_memory() -> AgentVectorMemory {
    AgentVectorMemory::new(Arc::new(StubEmbedder), Arc::new(InMemoryStore::new()))
}

#[tokio::test]
async fn test_retrieve_ranks_by_similarity() {
    let memory = vector_memory();

    let records = vec![
        MemoryRecord::new(MessageRole::User, "how does rust ownership work?"),
        MemoryRecord::new(MessageRole::Assistant, "borrow rules keep memory safe"),
        MemoryRecord::new(MessageRole::User, "notes about the async network parser"),
    ];
    memory.write_records(&records).await.unwrap();

    let context = memory.retrieve("rust ownership", 2).await.unwrap();
    assert_eq!(context.len(), 2);
    assert!(context[0].record.content.contains("ownership"));
    assert!(context[0].score >= context[1].score);
}

#[tokio::test]
async fn test_rewriting_a_record_does_not_duplicate() {
    let memory = vector_memory();

    let mut record = MemoryRecord::new(MessageRole::User, "rust borrow question");
    memory.write_records(std::slice::from_ref(&record)).await.unwrap();

    record.content = "rust borrow question, reworded".to_string();
    memory.write_records(&[record.clone()]).await.unwrap();

    let context = memory.retrieve("rust borrow", 5).await.unwrap();
    assert_eq!(context.len(), 1);
    assert_eq!(context[0].record.uuid, record.uuid);
    assert_eq!(context[0].record.content, "rust borrow question, reworded");
}

#[tokio::test]
async fn test_clear_empties_memory() {
    let memory = vector_memory();

    memory
        .write_records(&[MemoryRecord::new(MessageRole::User, "rust cache question")])
        .await
        .unwrap();
    memory.clear().await.unwrap();

    let context = memory.retrieve("rust cache", 3).await.unwrap();
    assert!(context.is_empty());
}

#[tokio::test]
async fn test_agent_memory_without_topic_returns_nothing() {
    let memory = agent_memory();

    // Only non-user records written, so there is no topic yet.
    memory
        .write_records(&[MemoryRecord::new(
            MessageRole::System,
            "you are a helpful rust assistant",
        )])
        .await
        .unwrap();

    let context = memory.retrieve_context().await.unwrap();
    assert!(context.is_empty());
}

#[tokio::test]
async fn test_agent_memory_keys_off_last_user_message() {
    let memory = agent_memory().with_retrieve_limit(1);

    let first_user = MemoryRecord::new(MessageRole::User, "explain rust ownership");
    let reply = MemoryRecord::new(MessageRole::Assistant, "ownership moves values");
    let second_user = MemoryRecord::new(MessageRole::User, "now the async network parser");

    memory
        .write_records(&[first_user, reply, second_user.clone()])
        .await
        .unwrap();

    let context = memory.retrieve_context().await.unwrap();
    assert_eq!(context.len(), 1);
    // The topic is the last user message; nothing is closer to it than itself.
    assert_eq!(context[0].record.uuid, second_user.uuid);
    assert!(context[0].score > 0.99);
}

#[tokio::test]
async fn test_agent_memory_clear_forgets_topic() {
    let memory = agent_memory();

    memory
        .write_records(&[MemoryRecord::new(MessageRole::User, "rust memory question")])
        .await
        .unwrap();
    memory.clear().await.unwrap();

    let context = memory.retrieve_context().await.unwrap();
    assert!(context.is_empty());
}
