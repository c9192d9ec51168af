//! Integration tests for the Groq client and verdict analyzer
//!
//! Uses wiremock to stand in for the Groq chat-completions endpoint.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scamshield::config::{GroqConfig, ModelConfig, RequestConfig};
use scamshield::groq::{ChatRequest, GroqClient, Message};
use scamshield::verdict::{FinalLabel, ScamCategory, VerdictAnalyzer};

/// Create a client pointed at a mock server
fn create_test_client(base_url: &str) -> GroqClient {
    let config = GroqConfig {
        api_key: "test_key".to_string(),
        base_url: base_url.to_string(),
    };
    GroqClient::new(&config, RequestConfig { timeout_ms: 5000 }).unwrap()
}

fn create_test_analyzer(base_url: &str) -> VerdictAnalyzer {
    VerdictAnalyzer::new(create_test_client(base_url), ModelConfig::default())
}

/// Wrap completion text in a chat-completions response body
fn chat_body(content: &str) -> serde_json::Value {
    json!({
        "choices": [{"message": {"role": "assistant", "content": content}}],
        "usage": {"prompt_tokens": 100, "completion_tokens": 50, "total_tokens": 150}
    })
}

#[cfg(test)]
mod client_tests {
    use super::*;

    #[tokio::test]
    async fn test_chat_returns_trimmed_completion() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .and(header("Authorization", "Bearer test_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("  hello  ")))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let request = ChatRequest::new("llama-3.1-8b-instant", vec![Message::user("hi")]);

        let completion = client.chat(request).await.unwrap();
        assert_eq!(completion, "hello");
    }

    #[tokio::test]
    async fn test_chat_sends_model_and_sampling_params() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .and(body_partial_json(json!({
                "model": "llama-3.1-8b-instant",
                "temperature": 0.25,
                "max_tokens": 400
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("ok")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let request = ChatRequest::new("llama-3.1-8b-instant", vec![Message::user("hi")])
            .with_temperature(0.25)
            .with_max_tokens(400);

        client.chat(request).await.unwrap();
    }

    #[tokio::test]
    async fn test_chat_api_error_carries_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let request = ChatRequest::new("llama-3.1-8b-instant", vec![Message::user("hi")]);

        let err = client.chat(request).await.unwrap_err();
        match err {
            scamshield::error::GroqError::Api { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "rate limited");
            }
            other => panic!("Expected Api error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_chat_empty_choices_is_invalid_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let request = ChatRequest::new("llama-3.1-8b-instant", vec![Message::user("hi")]);

        let err = client.chat(request).await.unwrap_err();
        assert!(matches!(
            err,
            scamshield::error::GroqError::InvalidResponse { .. }
        ));
    }
}

#[cfg(test)]
mod analyze_tests {
    use super::*;

    #[tokio::test]
    async fn test_analyze_parses_structured_verdict() {
        let mock_server = MockServer::start().await;

        let content = json!({
            "probability": 88,
            "category": "bank scam",
            "red_flags": ["asks for OTP", "urgency"],
            "highlighted_phrases": [{"phrase": "share your OTP", "danger": "high"}],
            "psychology_explainer": "Creates panic about account access.",
            "advice": "Never share an OTP with anyone."
        })
        .to_string();

        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(&content)))
            .mount(&mock_server)
            .await;

        let analyzer = create_test_analyzer(&mock_server.uri());
        let verdict = analyzer
            .analyze("Share your OTP to unblock your account")
            .await
            .unwrap();

        assert_eq!(verdict.probability, 88.0);
        assert_eq!(verdict.category, ScamCategory::BankScam);
        assert_eq!(verdict.red_flags.len(), 2);
        assert_eq!(verdict.highlighted_phrases.len(), 1);
        assert_eq!(verdict.advice, "Never share an OTP with anyone.");
    }

    #[tokio::test]
    async fn test_analyze_accepts_prose_around_json() {
        let mock_server = MockServer::start().await;

        let content = format!(
            "Here is my analysis:\n{}\nHope that helps!",
            json!({"probability": 60, "category": "phishing"})
        );

        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(&content)))
            .mount(&mock_server)
            .await;

        let analyzer = create_test_analyzer(&mock_server.uri());
        let verdict = analyzer.analyze("click this link to verify").await.unwrap();

        assert_eq!(verdict.probability, 60.0);
        assert_eq!(verdict.category, ScamCategory::Phishing);
    }

    #[tokio::test]
    async fn test_analyze_server_error_surfaces_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&mock_server)
            .await;

        let analyzer = create_test_analyzer(&mock_server.uri());
        let err = analyzer.analyze("anything at all").await.unwrap_err();

        assert!(matches!(
            err,
            scamshield::error::GroqError::Api { status: 500, .. }
        ));
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_analyze_garbage_completion_is_invalid_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(chat_body("I refuse to answer in JSON")),
            )
            .mount(&mock_server)
            .await;

        let analyzer = create_test_analyzer(&mock_server.uri());
        let err = analyzer.analyze("anything at all").await.unwrap_err();

        assert!(matches!(
            err,
            scamshield::error::GroqError::InvalidResponse { .. }
        ));
        assert!(!err.is_unavailable());
    }

    #[tokio::test]
    async fn test_analyze_non_numeric_probability_is_invalid_response() {
        let mock_server = MockServer::start().await;

        let content = json!({"probability": "high", "category": "phishing"}).to_string();
        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(&content)))
            .mount(&mock_server)
            .await;

        let analyzer = create_test_analyzer(&mock_server.uri());
        let err = analyzer.analyze("anything at all").await.unwrap_err();

        assert!(matches!(
            err,
            scamshield::error::GroqError::InvalidResponse { .. }
        ));
    }

    #[tokio::test]
    async fn test_analyze_missing_api_key_surfaces_error() {
        let config = GroqConfig {
            api_key: String::new(),
            base_url: "http://127.0.0.1:1".to_string(),
        };
        let client = GroqClient::new(&config, RequestConfig { timeout_ms: 1000 }).unwrap();
        let analyzer = VerdictAnalyzer::new(client, ModelConfig::default());

        // No HTTP call is made; the key check short-circuits
        let err = analyzer.analyze("anything at all").await.unwrap_err();
        assert!(matches!(err, scamshield::error::GroqError::MissingApiKey));
    }
}

#[cfg(test)]
mod second_review_tests {
    use super::*;

    #[tokio::test]
    async fn test_second_review_parses_label() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .and(body_partial_json(json!({"temperature": 0.1, "max_tokens": 60})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(chat_body(r#"{"final_label": "safe"}"#)),
            )
            .mount(&mock_server)
            .await;

        let analyzer = create_test_analyzer(&mock_server.uri());
        let label = analyzer
            .second_review("message text", "this is from my real bank")
            .await
            .unwrap();
        assert_eq!(label, FinalLabel::Safe);
    }

    #[tokio::test]
    async fn test_second_review_unknown_label_coerces_to_uncertain() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(chat_body(r#"{"final_label": "probably fine"}"#)),
            )
            .mount(&mock_server)
            .await;

        let analyzer = create_test_analyzer(&mock_server.uri());
        let label = analyzer.second_review("message text", "").await.unwrap();
        assert_eq!(label, FinalLabel::Uncertain);
    }

    #[tokio::test]
    async fn test_second_review_transport_failure_is_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&mock_server)
            .await;

        let analyzer = create_test_analyzer(&mock_server.uri());
        let result = analyzer.second_review("message text", "reason").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_second_review_unparseable_completion_is_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("no json here")))
            .mount(&mock_server)
            .await;

        let analyzer = create_test_analyzer(&mock_server.uri());
        let result = analyzer.second_review("message text", "reason").await;
        assert!(result.is_err());
    }
}
