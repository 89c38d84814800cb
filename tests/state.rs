//! State holders and the console driven without a terminal, in mock-only mode.

use std::sync::Arc;
use std::time::Duration;

use agentdeck::app::{App, Screen};
use agentdeck::client::{Clients, TextGenerator};
use agentdeck::config::{ClientMode, ConsoleConfig};
use agentdeck::error::ClientError;
use agentdeck::forms::{FormField, KnowledgeInputError};
use agentdeck::i18n::Locale;
use agentdeck::model::{AgentDraft, FileUpload, LlmSettings, Role};
use agentdeck::state::{AgentsEvent, AgentsState, ChatEvent, ChatState, KnowledgeEvent, KnowledgeState};
use agentdeck::store::MemoryStore;
use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use pretty_assertions::assert_eq;

struct Echo;

#[async_trait]
impl TextGenerator for Echo {
    fn name(&self) -> &str {
        "echo"
    }

    async fn generate(&self, text: &str, _llm: &LlmSettings) -> Result<String, ClientError> {
        let last = text.lines().rev().find(|line| line.starts_with("User: ")).unwrap_or("");
        Ok(format!("Echo {}", last.trim_start_matches("User: ")))
    }
}

fn config() -> ConsoleConfig {
    ConsoleConfig {
        mode: ClientMode::MockOnly,
        ..ConsoleConfig::default()
    }
}

fn mock_clients() -> Clients {
    Clients::with_generator(&config(), MemoryStore::shared(), Arc::new(Echo)).unwrap()
}

fn draft(name: &str) -> AgentDraft {
    AgentDraft {
        name: name.into(),
        ..AgentDraft::default()
    }
}

fn press(app: &mut App, code: KeyCode) {
    app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
}

fn type_text(app: &mut App, text: &str) {
    for ch in text.chars() {
        press(app, KeyCode::Char(ch));
    }
}

async fn tick_until(app: &mut App, done: impl Fn(&App) -> bool) {
    for _ in 0..200 {
        app.on_tick();
        if done(app) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached");
}

#[tokio::test]
async fn create_and_list_agents() {
    let clients = mock_clients();
    let mut agents = AgentsState::new(clients.agents.clone());

    agents.create(draft("Bot"));
    assert!(agents.loading());
    let event = agents.settle().await;
    assert!(matches!(event, Some(AgentsEvent::Created(ref agent)) if agent.name == "Bot"));
    assert!(!agents.loading());

    agents.refresh();
    agents.settle().await;
    assert_eq!(agents.agents().len(), 1);
}

#[tokio::test]
async fn stale_list_does_not_undo_a_removal() {
    let clients = mock_clients();
    let bot = clients.agents.create(draft("Bot")).await;
    let mut agents = AgentsState::new(clients.agents.clone());
    agents.refresh();
    agents.settle().await;
    assert_eq!(agents.agents().len(), 1);

    agents.refresh();
    agents.remove(&bot.id);
    let event = agents.settle().await;
    assert_eq!(event, Some(AgentsEvent::Removed(bot.id.clone(), true)));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(agents.poll().is_empty());
    assert!(agents.agents().is_empty());
    assert_eq!(agents.requests_issued(), 3);
}

#[tokio::test]
async fn fetching_an_unknown_agent_sets_an_error() {
    let mut agents = AgentsState::new(mock_clients().agents);
    agents.fetch("ghost");
    agents.settle().await;
    assert!(agents.selected().is_none());
    assert_eq!(agents.error(), Some("Agent ghost not found"));
    agents.dismiss_error();
    assert_eq!(agents.error(), None);
}

#[tokio::test]
async fn oversized_upload_is_rejected_without_a_request() {
    let clients = mock_clients();
    let bot = clients.agents.create(draft("Bot")).await;
    let mut knowledge = KnowledgeState::new(clients.knowledge.clone(), bot.id);

    let upload = FileUpload::new("gross.txt", "text/plain", vec![b'a'; 11 * 1024 * 1024]);
    let err = knowledge.upload_file(upload).unwrap_err();
    assert_eq!(err, KnowledgeInputError::TooLarge { size: 11 * 1024 * 1024 });
    assert_eq!(
        err.message(Locale::De.strings()),
        "Datei zu groß (11.0 MB). Maximale Größe: 10MB"
    );
    assert_eq!(knowledge.requests_issued(), 0);
    assert!(!knowledge.loading());
}

#[tokio::test]
async fn knowledge_holder_adds_and_removes() {
    let clients = mock_clients();
    let bot = clients.agents.create(draft("Bot")).await;
    let mut knowledge = KnowledgeState::new(clients.knowledge.clone(), bot.id);

    assert_eq!(knowledge.add_text("   "), Err(KnowledgeInputError::EmptyText));
    knowledge.add_url("  https://example.com/doc  ").unwrap();
    let Some(KnowledgeEvent::Added(item)) = knowledge.settle().await else {
        panic!("expected an added item");
    };
    assert_eq!(item.content, "https://example.com/doc");
    assert_eq!(knowledge.items().len(), 1);

    knowledge.remove(&item.id);
    knowledge.settle().await;
    assert!(knowledge.items().is_empty());

    knowledge.remove(&item.id);
    assert_eq!(knowledge.settle().await, None);
    assert_eq!(knowledge.error(), Some(format!("Knowledge item {} not found", item.id).as_str()));
}

#[tokio::test]
async fn chat_holder_shows_the_message_before_the_reply() {
    let clients = mock_clients();
    let bot = clients.agents.create(draft("Bot")).await;
    let mut chat = ChatState::new(clients.chat.clone(), bot.id);

    assert!(!chat.send("   "));
    assert_eq!(chat.requests_issued(), 0);

    assert!(chat.send("Hallo"));
    assert_eq!(chat.messages().len(), 1);
    assert!(chat.messages()[0].id.starts_with("temp-"));
    // Submission is blocked while a reply is pending.
    assert!(!chat.send("Noch da?"));

    let Some(ChatEvent::Replied { reply, .. }) = chat.settle().await else {
        panic!("expected a reply");
    };
    assert_eq!(reply.content, "Echo Hallo");
    let roles: Vec<Role> = chat.messages().iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant]);
    assert!(!chat.messages()[0].id.starts_with("temp-"));

    chat.reset();
    assert_eq!(chat.settle().await, Some(ChatEvent::Cleared));
    assert!(chat.messages().is_empty());
    chat.refresh();
    chat.settle().await;
    assert!(chat.messages().is_empty());
}

#[tokio::test]
async fn empty_name_blocks_submission() {
    let mut app = App::new(config(), mock_clients());
    tick_until(&mut app, |app| !app.agents.loading()).await;
    let issued = app.agents.requests_issued();

    press(&mut app, KeyCode::Char('n'));
    assert_eq!(app.screen, Screen::AgentForm);
    press(&mut app, KeyCode::Enter);

    assert_eq!(app.screen, Screen::AgentForm);
    let form = app.form.as_ref().unwrap();
    assert_eq!(
        form.errors.message(FormField::Name, app.lang()),
        Some("Name ist erforderlich")
    );
    assert_eq!(form.focused, FormField::Name);
    assert_eq!(app.agents.requests_issued(), issued);
}

#[tokio::test]
async fn creating_an_agent_opens_its_knowledge() {
    let mut app = App::new(config(), mock_clients());
    press(&mut app, KeyCode::Char('n'));
    type_text(&mut app, "Bot");
    press(&mut app, KeyCode::Tab);
    type_text(&mut app, "Hilft beim Testen");
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.screen, Screen::Agents);

    tick_until(&mut app, |app| app.screen == Screen::Knowledge).await;
    assert_eq!(app.agents.agents().len(), 1);
    assert_eq!(app.agents.agents()[0].character.goals.len(), 2);
    assert_eq!(app.knowledge.as_ref().unwrap().agent_name, "Bot");
    assert_eq!(app.status_message, "Agent „Bot“ wurde erstellt");

    press(&mut app, KeyCode::Char('a'));
    assert!(app.overlay.is_some());
    type_text(&mut app, "Wir liefern montags");
    press(&mut app, KeyCode::Enter);
    assert!(app.overlay.is_none());
    tick_until(&mut app, |app| {
        app.knowledge.as_ref().is_some_and(|pane| pane.state.items().len() == 1)
    })
    .await;
}

#[tokio::test]
async fn test_chat_round_trip_through_the_console() {
    let clients = mock_clients();
    clients.agents.create(draft("Bot")).await;
    let mut app = App::new(config(), clients);
    tick_until(&mut app, |app| app.agents.agents().len() == 1).await;

    press(&mut app, KeyCode::Char('t'));
    assert_eq!(app.screen, Screen::Chat);
    tick_until(&mut app, |app| app.chat.as_ref().is_some_and(|pane| !pane.state.loading())).await;
    type_text(&mut app, "Hallo");
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.chat.as_ref().unwrap().composer.buffer(), "");

    tick_until(&mut app, |app| {
        app.chat.as_ref().is_some_and(|pane| pane.state.messages().len() == 2)
    })
    .await;
    assert_eq!(app.chat.as_ref().unwrap().state.messages()[1].content, "Echo Hallo");

    press(&mut app, KeyCode::Esc);
    assert_eq!(app.screen, Screen::Agents);
    assert!(app.chat.is_none());
}

#[tokio::test]
async fn deleting_needs_confirmation() {
    let clients = mock_clients();
    clients.agents.create(draft("Bot")).await;
    let mut app = App::new(config(), clients);
    tick_until(&mut app, |app| app.agents.agents().len() == 1).await;

    press(&mut app, KeyCode::Char('d'));
    assert!(app.overlay.is_some());
    // Cancel is preselected.
    press(&mut app, KeyCode::Enter);
    assert!(app.overlay.is_none());
    assert_eq!(app.agents.agents().len(), 1);

    press(&mut app, KeyCode::Char('d'));
    press(&mut app, KeyCode::Left);
    press(&mut app, KeyCode::Enter);
    tick_until(&mut app, |app| app.agents.agents().is_empty()).await;
}

#[tokio::test]
async fn language_toggle_switches_strings() {
    let mut app = App::new(config(), mock_clients());
    assert_eq!(app.locale, Locale::De);
    press(&mut app, KeyCode::F(2));
    assert_eq!(app.locale, Locale::En);
    assert_eq!(app.lang().status_ready(), "Ready");
}
