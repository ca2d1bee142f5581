#[path = "../support/mod.rs"]
mod support;

use std::sync::Arc;
use support::StubClient;
use tenfi::analyzer::{create_completion_client, CompletionClient, RigCompletionClient};
use tenfi::config::AnalyzerConfig;
use tenfi::error::{CompletionErrorKind, TenfiError};
use tenfi::models::Facet;

#[test]
fn test_rig_client_builds_for_each_provider() {
    for model in ["claude-sonnet-4-20250514", "gpt-4o", "gemini-2.5-flash", "anthropic/claude-3-5-haiku-latest"] {
        let config = AnalyzerConfig::new(model).with_api_key("test-key");
        let client = RigCompletionClient::new(config).unwrap();
        assert_eq!(client.model_name(), model);
    }
}

#[test]
fn test_client_creation_requires_key() {
    let config = AnalyzerConfig::new("gpt-4o");
    let err = match create_completion_client(&config) {
        Ok(_) => panic!("client created without an API key"),
        Err(err) => err,
    };

    assert_eq!(err.completion_kind(), Some(CompletionErrorKind::Authentication));
    assert!(err.to_string().contains("OPENAI_API_KEY"));
}

#[test]
fn test_blank_key_counts_as_missing() {
    let config = AnalyzerConfig::new("gemini-2.5-flash").with_api_key("   ");
    let err = match create_completion_client(&config) {
        Ok(_) => panic!("client created with a blank API key"),
        Err(err) => err,
    };

    assert!(err.is_authentication_error());
}

#[test]
fn test_invalid_config_is_rejected_before_provider_setup() {
    let config = AnalyzerConfig::new("claude-sonnet-4-20250514")
        .with_api_key("test-key")
        .with_timeout(1);

    assert!(matches!(RigCompletionClient::new(config), Err(TenfiError::Config(_))));
}

#[test]
fn test_unsupported_model_is_a_config_error() {
    let config = AnalyzerConfig::new("mistral-large").with_api_key("test-key");
    let result = create_completion_client(&config);

    assert!(matches!(result, Err(TenfiError::Config(_))));
}

#[tokio::test]
async fn test_trait_object_is_shareable_across_tasks() {
    let client: Arc<dyn CompletionClient> = Arc::new(StubClient::new());

    let handles: Vec<_> = (0..3)
        .map(|_| {
            let client = Arc::clone(&client);
            tokio::spawn(async move {
                client
                    .complete("You are a tenant rights expert. Explain.", 0.2)
                    .await
            })
        })
        .collect();

    for handle in handles {
        let text = handle.await.unwrap().unwrap();
        assert!(text.contains("habitable"));
    }
}

#[tokio::test]
async fn test_calls_are_independent() {
    let stub = StubClient::new();

    let first = stub.complete("Provide a clear, comprehensive summary", 0.2).await.unwrap();
    let second = stub.complete("Provide a clear, comprehensive summary", 0.2).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(stub.call_count(), 2);
    assert_eq!(stub.calls_for(Facet::Summary).len(), 2);
}

#[test]
fn test_provider_errors_are_classified() {
    let cases = [
        ("HTTP 401 Unauthorized", CompletionErrorKind::Authentication),
        ("invalid x-api-key", CompletionErrorKind::Authentication),
        ("429 Too Many Requests: rate limit exceeded", CompletionErrorKind::RateLimited),
        ("response blocked by safety filters", CompletionErrorKind::Rejected),
        ("operation timed out", CompletionErrorKind::Timeout),
        ("connection reset by peer", CompletionErrorKind::Transport),
    ];

    for (message, expected) in cases {
        assert_eq!(CompletionErrorKind::classify(message), expected, "{}", message);
    }
}
