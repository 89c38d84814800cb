//! Primary-path behaviour against an in-process mock of the agent service.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use agentdeck::client::{Clients, GeminiGenerator, TextGenerator};
use agentdeck::config::ConsoleConfig;
use agentdeck::error::ClientError;
use agentdeck::model::{
    AgentDraft, AgentUpdate, Character, FileUpload, KnowledgeKind, LlmSettings, Role,
};
use agentdeck::store::{MemoryStore, SharedStore};
use async_trait::async_trait;
use axum::extract::{FromRequest, Multipart, Path, Query, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq)]
struct UploadField {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    text: String,
}

#[derive(Debug, Clone)]
struct GenerationCall {
    call: String,
    key: Option<String>,
    body: Value,
}

#[derive(Default)]
struct Seen {
    authorization: Mutex<Vec<String>>,
    bodies: Mutex<Vec<Value>>,
    uploads: Mutex<Vec<UploadField>>,
    generations: Mutex<Vec<GenerationCall>>,
}

type Shared = Arc<Seen>;

fn remember_auth(seen: &Seen, headers: &HeaderMap) {
    if let Some(value) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        seen.authorization.lock().push(value.to_string());
    }
}

async fn list_agents(State(seen): State<Shared>, headers: HeaderMap) -> Json<Value> {
    remember_auth(&seen, &headers);
    Json(json!([
        { "id": "a1", "name": "Minimal" },
        {
            "id": "a2",
            "name": "Voll",
            "description": "alles gesetzt",
            "character": { "persona": "p", "goals": ["g"], "constraints": ["c"] },
            "llm": { "provider": "openai", "model": "gpt-4", "temperature": 0.0 },
            "knowledge": [{ "id": "k1", "type": "url", "content": "https://example.com" }],
            "createdAt": "2024-03-01T10:00:00Z",
            "updatedAt": 1709287200000i64
        }
    ]))
}

async fn create_agent(State(seen): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    seen.bodies.lock().push(body.clone());
    Json(json!({
        "id": "a3",
        "name": body["name"],
        "llm": { "model": body["llm"]["model"] },
        "createdAt": "2024-03-01T10:00:00Z"
    }))
}

async fn get_agent(Path(id): Path<String>) -> impl IntoResponse {
    match id.as_str() {
        "a1" => Json(json!({ "id": "a1", "name": "Minimal" })).into_response(),
        "stumm" => Json(json!({
            "id": "stumm",
            "name": "Stumm",
            "character": { "persona": "Schweigsam", "goals": ["Zuhören"] },
            "llm": { "model": "gemini-pro", "temperature": 0.5 }
        }))
        .into_response(),
        _ => (StatusCode::NOT_FOUND, "no such agent").into_response(),
    }
}

async fn patch_agent(
    State(seen): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    seen.bodies.lock().push(body.clone());
    Json(json!({ "id": id, "name": body["name"] }))
}

async fn add_knowledge(State(seen): State<Shared>, request: Request) -> Response {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"));
    if !is_multipart {
        let Json(body) = Json::<Value>::from_request(request, &()).await.unwrap();
        return Json(json!({ "id": "k9", "type": body["type"], "content": body["content"] }))
            .into_response();
    }

    let mut form = Multipart::from_request(request, &()).await.unwrap();
    while let Some(field) = form.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let text = field.text().await.unwrap();
        seen.uploads.lock().push(UploadField {
            name,
            file_name,
            content_type,
            text,
        });
    }
    Json(json!({
        "id": "k10",
        "type": "file",
        "content": "# Notizen",
        "filename": "notes.md",
        "fileType": "text/markdown"
    }))
    .into_response()
}

async fn chat(
    State(seen): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if id == "stumm" {
        return (StatusCode::SERVICE_UNAVAILABLE, "chat offline").into_response();
    }
    seen.bodies.lock().push(body);
    Json(json!({ "id": "m1", "content": "Antwort vom Dienst" })).into_response()
}

async fn generate(
    State(seen): State<Shared>,
    Path(call): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    seen.generations.lock().push(GenerationCall {
        call: call.clone(),
        key: query.get("key").cloned(),
        body,
    });
    if call.starts_with("kaputt") {
        return (StatusCode::TOO_MANY_REQUESTS, "quota exceeded").into_response();
    }
    Json(json!({
        "candidates": [
            { "content": { "parts": [{ "text": "Generiert" }, { "text": "ignoriert" }] } },
            { "content": { "parts": [{ "text": "zweiter Kandidat" }] } }
        ]
    }))
    .into_response()
}

async fn history() -> Json<Value> {
    Json(json!([
        { "id": "h1", "role": "user", "content": "Hi", "timestamp": "2024-03-01T10:00:00Z" },
        { "id": "h2", "content": "Hallo" }
    ]))
}

async fn clear_fails() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn broken_json() -> &'static str {
    "this is not json"
}

struct Unused;

#[async_trait]
impl TextGenerator for Unused {
    fn name(&self) -> &str {
        "unused"
    }

    async fn generate(&self, _text: &str, _llm: &LlmSettings) -> Result<String, ClientError> {
        Err(ClientError::Generation("must not be called".into()))
    }
}

async fn spawn_service(seen: Shared) -> String {
    let app = Router::new()
        .route("/agents", get(list_agents).post(create_agent))
        .route("/agents/{id}", get(get_agent).patch(patch_agent))
        .route("/agents/{id}/knowledge", post(add_knowledge).get(broken_json))
        .route("/agents/{id}/chat", post(chat))
        .route("/agents/{id}/chat/history", get(history).delete(clear_fails))
        .route("/v1beta/models/{call}", post(generate))
        .with_state(seen);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn service_config(url: &str) -> ConsoleConfig {
    ConsoleConfig {
        api_url: format!("{url}/"),
        api_key: Some("geheim".into()),
        generation_url: url.to_string(),
        generation_api_key: Some("schluessel".into()),
        timeout_secs: 5,
        ..ConsoleConfig::default()
    }
}

async fn connect() -> (Clients, SharedStore, Shared) {
    let seen = Shared::default();
    let url = spawn_service(seen.clone()).await;
    let store = MemoryStore::shared();
    let clients =
        Clients::with_generator(&service_config(&url), store.clone(), Arc::new(Unused)).unwrap();
    (clients, store, seen)
}

#[tokio::test]
async fn absent_fields_are_defaulted() {
    let (clients, store, _) = connect().await;
    let agents = clients.agents.list_all().await;
    assert_eq!(agents.len(), 2);

    let minimal = &agents[0];
    assert_eq!(minimal.name, "Minimal");
    assert_eq!(minimal.description, "");
    assert_eq!(minimal.character.persona, "");
    assert!(minimal.character.goals.is_empty());
    assert_eq!(minimal.llm, LlmSettings::default());
    assert!(minimal.knowledge.is_empty());

    let full = &agents[1];
    assert_eq!(full.llm.model, "gpt-4");
    // An explicit zero is kept.
    assert_eq!(full.llm.temperature, 0.0);
    assert_eq!(full.knowledge[0].agent_id, "a2");
    assert_eq!(full.created_at.to_rfc3339(), "2024-03-01T10:00:00+00:00");
    assert_eq!(full.updated_at.timestamp_millis(), 1_709_287_200_000);

    // The primary path does not touch the fallback store.
    assert!(store.list_agents().is_empty());
}

#[tokio::test]
async fn create_posts_the_draft_and_converts_the_reply() {
    let (clients, store, seen) = connect().await;
    let draft = AgentDraft {
        name: "Bot".into(),
        description: "Sortiert Post".into(),
        character: Character {
            persona: "Ordentlich".into(),
            goals: vec!["Sortieren".into()],
            constraints: Vec::new(),
        },
        llm: LlmSettings {
            model: "gemini-1.5-flash".into(),
            temperature: 0.5,
            ..LlmSettings::default()
        },
        knowledge: Vec::new(),
    };

    let created = clients.agents.create(draft).await;
    assert_eq!(
        seen.bodies.lock()[0],
        json!({
            "name": "Bot",
            "description": "Sortiert Post",
            "character": { "persona": "Ordentlich", "goals": ["Sortieren"], "constraints": [] },
            "llm": { "provider": "gemini", "model": "gemini-1.5-flash", "temperature": 0.5 },
            "knowledge": []
        })
    );
    assert_eq!(created.id, "a3");
    assert_eq!(created.name, "Bot");
    assert_eq!(created.llm.model, "gemini-1.5-flash");
    // Fields the service leaves out are defaulted, not copied from the draft.
    assert_eq!(created.llm.provider, "gemini");
    assert_eq!(created.llm.temperature, LlmSettings::default().temperature);
    assert_eq!(created.description, "");
    assert_eq!(created.created_at.to_rfc3339(), "2024-03-01T10:00:00+00:00");
    assert!(store.list_agents().is_empty());
}

#[tokio::test]
async fn upload_sends_a_multipart_form() {
    let (clients, store, seen) = connect().await;
    let upload = FileUpload::new("notes.md", "text/markdown", b"# Notizen".to_vec());

    let item = clients.knowledge.upload_file("a1", upload).await.unwrap();
    assert_eq!(item.id, "k10");
    assert_eq!(item.kind, KnowledgeKind::File);
    assert_eq!(item.agent_id, "a1");
    assert_eq!(item.filename.as_deref(), Some("notes.md"));
    assert_eq!(item.file_type.as_deref(), Some("text/markdown"));

    let fields = seen.uploads.lock().clone();
    assert_eq!(
        fields,
        vec![
            UploadField {
                name: "file".into(),
                file_name: Some("notes.md".into()),
                content_type: Some("text/markdown".into()),
                text: "# Notizen".into(),
            },
            UploadField {
                name: "agentId".into(),
                file_name: None,
                content_type: None,
                text: "a1".into(),
            },
            UploadField {
                name: "type".into(),
                file_name: None,
                content_type: None,
                text: "file".into(),
            },
        ]
    );
    assert!(store.list_agents().is_empty());
}

#[tokio::test]
async fn gemini_request_carries_key_and_generation_config() {
    let seen = Shared::default();
    let url = spawn_service(seen.clone()).await;
    let generator =
        GeminiGenerator::new(url, Some("schluessel".into()), Duration::from_secs(5)).unwrap();
    let llm = LlmSettings {
        temperature: 0.5,
        ..LlmSettings::default()
    };

    let text = generator.generate("Hallo?", &llm).await.unwrap();
    assert_eq!(text, "Generiert");

    let calls = seen.generations.lock().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].call, "gemini-pro:generateContent");
    assert_eq!(calls[0].key.as_deref(), Some("schluessel"));
    assert_eq!(
        calls[0].body,
        json!({
            "contents": [{ "role": "user", "parts": [{ "text": "Hallo?" }] }],
            "generationConfig": {
                "temperature": 0.5,
                "topK": 40,
                "topP": 0.95,
                "maxOutputTokens": 1024
            }
        })
    );
}

#[tokio::test]
async fn gemini_error_status_is_a_generation_error() {
    let seen = Shared::default();
    let url = spawn_service(seen.clone()).await;
    let generator =
        GeminiGenerator::new(url, Some("schluessel".into()), Duration::from_secs(5)).unwrap();
    let llm = LlmSettings {
        model: "kaputt".into(),
        ..LlmSettings::default()
    };

    match generator.generate("Hallo?", &llm).await {
        Err(ClientError::Generation(message)) => {
            assert!(message.contains("429"), "{message}");
            assert!(message.contains("quota exceeded"), "{message}");
        }
        other => panic!("expected a generation error, got {other:?}"),
    }
}

#[tokio::test]
async fn failed_chat_falls_back_to_gemini() {
    let seen = Shared::default();
    let url = spawn_service(seen.clone()).await;
    let store = MemoryStore::shared();
    let clients = Clients::from_config(&service_config(&url), store.clone()).unwrap();

    let reply = clients.chat.send("stumm", "Wie geht's?").await;
    assert_eq!(reply.role, Role::Assistant);
    assert_eq!(reply.content, "Generiert");

    let calls = seen.generations.lock().clone();
    assert_eq!(calls.len(), 1);
    let sent = calls[0].body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(sent.contains("PERSONA:\nSchweigsam"));
    assert!(sent.contains("- Zuhören"));
    assert!(sent.ends_with("User: Wie geht's?\n\nAssistant:"));
    assert_eq!(calls[0].body["generationConfig"]["temperature"], json!(0.5));
    assert_eq!(store.transcript("stumm").len(), 2);
}

#[tokio::test]
async fn requests_carry_the_bearer_token() {
    let (clients, _, seen) = connect().await;
    clients.agents.list_all().await;
    assert_eq!(seen.authorization.lock().clone(), vec!["Bearer geheim".to_string()]);
}

#[tokio::test]
async fn remote_not_found_falls_back_to_the_store() {
    let (clients, _, _) = connect().await;
    assert!(clients.agents.get_by_id("a1").await.is_some());
    assert!(clients.agents.get_by_id("missing").await.is_none());
}

#[tokio::test]
async fn update_sends_only_the_changed_fields() {
    let (clients, _, seen) = connect().await;
    let updated = clients
        .agents
        .update("a1", AgentUpdate::name("Neu"))
        .await
        .unwrap();
    assert_eq!(updated.name, "Neu");
    assert_eq!(seen.bodies.lock()[0], json!({ "name": "Neu" }));
}

#[tokio::test]
async fn knowledge_items_belong_to_the_requested_agent() {
    let (clients, _, _) = connect().await;
    let item = clients.knowledge.add_text("a1", "Notiz").await.unwrap();
    assert_eq!(item.id, "k9");
    assert_eq!(item.agent_id, "a1");
    assert_eq!(item.content, "Notiz");
}

#[tokio::test]
async fn malformed_body_falls_back() {
    let (clients, _, _) = connect().await;
    assert!(clients.knowledge.list("a1").await.is_empty());
}

#[tokio::test]
async fn chat_reply_is_cached_locally() {
    let (clients, store, seen) = connect().await;
    let reply = clients.chat.send("a1", "Wie spät ist es?").await;
    assert_eq!(reply.role, Role::Assistant);
    assert_eq!(reply.content, "Antwort vom Dienst");
    assert_eq!(seen.bodies.lock()[0], json!({ "message": "Wie spät ist es?" }));

    let cached = store.transcript("a1");
    assert_eq!(cached.len(), 2);
    assert_eq!(cached[0].role, Role::User);
    assert_eq!(cached[0].content, "Wie spät ist es?");
    assert_eq!(cached[1], reply);
}

#[tokio::test]
async fn remote_history_defaults_the_role() {
    let (clients, _, _) = connect().await;
    let history = clients.chat.history("a1").await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[1].role, Role::Assistant);
}

#[tokio::test]
async fn history_is_empty_after_clear_even_when_the_remote_delete_fails() {
    let (clients, store, _) = connect().await;
    clients.chat.send("a1", "Hallo").await;
    assert_eq!(clients.chat.history("a1").await.len(), 2);

    assert!(clients.chat.clear("a1").await);
    assert!(clients.chat.history("a1").await.is_empty());
    assert!(store.transcript("a1").is_empty());

    // Until the service accepts the clear, the local transcript is authoritative.
    clients.chat.send("a1", "Neu").await;
    let contents: Vec<String> = clients
        .chat
        .history("a1")
        .await
        .into_iter()
        .map(|message| message.content)
        .collect();
    assert_eq!(contents, vec!["Neu".to_string(), "Antwort vom Dienst".to_string()]);
}
