use serde_json::json;
use smartchat_core::transcript::load_transcript;
use smartchat_core::{ChatSession, ChatSettings, FileStore, TurnOutcome};
use smartchat_types::Role;
use tempfile::tempdir;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn openai_settings(server: &MockServer) -> ChatSettings {
    ChatSettings {
        provider: "openai".to_string(),
        api_key: "test-api-key".to_string(),
        model: "gpt-4o-mini".to_string(),
        context: String::new(),
        clean_markdown: true,
        base_url: Some(server.uri()),
    }
}

fn openai_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {"role": "assistant", "content": text}}]
    }))
}

#[tokio::test]
async fn test_reply_is_cleaned_and_persisted() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(openai_reply("**Hello**"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path());
    let mut session = ChatSession::open(openai_settings(&mock_server), store, "default").unwrap();

    let outcome = session.submit("Hi").await.unwrap();

    assert_eq!(outcome, TurnOutcome::Replied("Hello".to_string()));
    assert_eq!(session.error(), None);

    let reopened = load_transcript(&FileStore::new(dir.path()), "default").unwrap();
    assert_eq!(reopened.len(), 2);
    assert_eq!(reopened[0].role(), Role::User);
    assert_eq!(reopened[0].content(), "Hi");
    assert_eq!(reopened[1].role(), Role::Assistant);
    assert_eq!(reopened[1].content(), "Hello");
}

#[tokio::test]
async fn test_raw_reply_kept_when_cleaning_disabled() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(openai_reply("**Hello**"))
        .mount(&mock_server)
        .await;

    let settings = ChatSettings {
        clean_markdown: false,
        ..openai_settings(&mock_server)
    };
    let dir = tempdir().unwrap();
    let mut session = ChatSession::open(settings, FileStore::new(dir.path()), "default").unwrap();

    let outcome = session.submit("Hi").await.unwrap();
    assert_eq!(outcome, TurnOutcome::Replied("**Hello**".to_string()));
}

#[tokio::test]
async fn test_second_turn_sends_full_history_and_context() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [
                {"role": "system", "content": "Closed on Sundays"},
                {"role": "user", "content": "Hi"},
                {"role": "assistant", "content": "Hello"},
                {"role": "user", "content": "Open Sunday?"}
            ]
        })))
        .respond_with(openai_reply("No."))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(openai_reply("Hello"))
        .mount(&mock_server)
        .await;

    let settings = ChatSettings {
        context: "Closed on Sundays".to_string(),
        ..openai_settings(&mock_server)
    };
    let dir = tempdir().unwrap();
    let mut session = ChatSession::open(settings, FileStore::new(dir.path()), "default").unwrap();

    session.submit("Hi").await.unwrap();
    let outcome = session.submit("Open Sunday?").await.unwrap();

    assert_eq!(outcome, TurnOutcome::Replied("No.".to_string()));
    assert_eq!(session.transcript().len(), 4);
}

#[tokio::test]
async fn test_http_error_sets_indicator_and_keeps_user_message() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": {"message": "bad key"}})),
        )
        .mount(&mock_server)
        .await;

    let dir = tempdir().unwrap();
    let mut session =
        ChatSession::open(openai_settings(&mock_server), FileStore::new(dir.path()), "default")
            .unwrap();

    let outcome = session.submit("Hi").await.unwrap();

    assert_eq!(
        outcome,
        TurnOutcome::Failed("OpenAI API error: bad key".to_string())
    );
    assert_eq!(session.error(), Some("OpenAI API error: bad key"));

    let stored = load_transcript(&FileStore::new(dir.path()), "default").unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].content(), "Hi");
}

#[tokio::test]
async fn test_next_submission_clears_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(openai_reply("Back"))
        .mount(&mock_server)
        .await;

    let dir = tempdir().unwrap();
    let mut session =
        ChatSession::open(openai_settings(&mock_server), FileStore::new(dir.path()), "default")
            .unwrap();

    let first = session.submit("Hi").await.unwrap();
    assert_eq!(
        first,
        TurnOutcome::Failed("OpenAI API error: Internal Server Error".to_string())
    );

    let second = session.submit("Again").await.unwrap();
    assert_eq!(second, TurnOutcome::Replied("Back".to_string()));
    assert_eq!(session.error(), None);
    assert_eq!(session.transcript().len(), 3);
}

#[tokio::test]
async fn test_conversations_are_isolated() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(openai_reply("ok"))
        .mount(&mock_server)
        .await;

    let dir = tempdir().unwrap();
    let mut session =
        ChatSession::open(openai_settings(&mock_server), FileStore::new(dir.path()), "first")
            .unwrap();
    session.submit("one").await.unwrap();

    session.switch_conversation("second").unwrap();
    assert!(session.transcript().is_empty());
    session.submit("two").await.unwrap();

    session.switch_conversation("first").unwrap();
    assert_eq!(session.transcript().len(), 2);
    assert_eq!(session.transcript()[0].content(), "one");
}
