// tests/completion_client.rs
// Completion and embedding clients against a mock OpenAI-compatible server

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ragchat::llm::{ChatModel, CompletionClient, EmbedError, Embedder, HttpEmbedder, LlmError, PromptMessage};

fn client(server: &MockServer) -> CompletionClient {
    CompletionClient::new(
        format!("{}/v1", server.uri()),
        "gemma2:2b",
        "ollama",
        Duration::from_secs(5),
    )
    .expect("client builds")
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

#[tokio::test]
async fn test_chat_sends_model_messages_and_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "ollama"))
        .and(body_partial_json(json!({
            "model": "gemma2:2b",
            "messages": [
                { "role": "system", "content": "You are a music assistant." },
                { "role": "user", "content": "Who wrote Clair de Lune?" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Claude Debussy.")))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client(&server)
        .complete(&[
            PromptMessage::system("You are a music assistant."),
            PromptMessage::user("Who wrote Clair de Lune?"),
        ])
        .await
        .expect("completion succeeds");
    assert_eq!(reply, "Claude Debussy.");
}

#[tokio::test]
async fn test_temperature_only_sent_when_set() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({ "temperature": 0.5 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("warm")))
        .mount(&server)
        .await;

    let reply = client(&server)
        .with_temperature(Some(0.5))
        .chat(&[PromptMessage::user("hi")])
        .await
        .expect("completion succeeds");
    assert_eq!(reply, "warm");
}

#[tokio::test]
async fn test_error_status_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(404).set_body_string("model \"gemma2:2b\" not found"))
        .mount(&server)
        .await;

    let err = client(&server)
        .chat(&[PromptMessage::user("hi")])
        .await
        .unwrap_err();
    match err {
        LlmError::Api { status, body } => {
            assert_eq!(status, 404);
            assert!(body.contains("not found"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_choices() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let err = client(&server)
        .chat(&[PromptMessage::user("hi")])
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::EmptyChoices));
}

#[tokio::test]
async fn test_garbage_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&server)
        .await;

    let err = client(&server)
        .chat(&[PromptMessage::user("hi")])
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::Malformed(_)));
}

#[tokio::test]
async fn test_list_models() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [
                { "id": "gemma2:2b", "object": "model" },
                { "id": "nomic-embed-text", "object": "model" }
            ]
        })))
        .mount(&server)
        .await;

    let models = client(&server).list_models().await.expect("models listed");
    assert_eq!(models, vec!["gemma2:2b", "nomic-embed-text"]);
}

fn embedder(server: &MockServer, dimension: usize) -> HttpEmbedder {
    HttpEmbedder::new(
        format!("{}/v1", server.uri()),
        "nomic-embed-text",
        "ollama",
        dimension,
        Duration::from_secs(5),
    )
    .expect("embedder builds")
    .with_retry_delay(Duration::from_millis(10))
}

fn embedding(values: &[f32]) -> serde_json::Value {
    json!({ "object": "list", "data": [{ "index": 0, "embedding": values }] })
}

#[tokio::test]
async fn test_embedder_retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(body_partial_json(json!({ "model": "nomic-embed-text", "input": "bebop" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(embedding(&[0.1, 0.2, 0.3])))
        .expect(1)
        .mount(&server)
        .await;

    let vector = embedder(&server, 3).embed("bebop").await.expect("embedding after retry");
    assert_eq!(vector, vec![0.1, 0.2, 0.3]);
}

#[tokio::test]
async fn test_embedder_does_not_retry_client_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(400).set_body_string("unknown model"))
        .expect(1)
        .mount(&server)
        .await;

    let err = embedder(&server, 3).embed("bebop").await.unwrap_err();
    assert!(matches!(err, EmbedError::Api { status: 400, .. }));
}

#[tokio::test]
async fn test_embedder_rejects_wrong_dimension() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(embedding(&[1.0, 2.0])))
        .expect(1)
        .mount(&server)
        .await;

    let err = embedder(&server, 1536).embed("bebop").await.unwrap_err();
    assert!(matches!(
        err,
        EmbedError::Dimension {
            expected: 1536,
            actual: 2
        }
    ));
}
