// End-to-end chat session scenarios against a live node with collaborator
// doubles behind the retrieval/generation/storage/auth traits.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use uuid::Uuid;

use intelliguide_node::api::server::{create_router, AppState};
use intelliguide_node::api::websocket::registry::SessionRegistry;
use intelliguide_node::auth::{issue_access_token, JwtPrincipalResolver};
use intelliguide_node::rag::{
    ContextRetriever, Passage, RagError, ResponderConfig, RetrievalResponder, TextGenerator,
    FALLBACK_ANSWER,
};
use intelliguide_node::storage::{MemoryChatStore, MemoryUserDirectory, Sender};

const SECRET: &str = "test-secret";

struct StaticRetriever {
    passages: Vec<Passage>,
}

impl Default for StaticRetriever {
    fn default() -> Self {
        Self {
            passages: vec![Passage {
                content: "Section 9 levies CGST on intra-state supplies.".to_string(),
                source: Some("cgst-act.pdf".to_string()),
                score: 0.9,
            }],
        }
    }
}

#[async_trait]
impl ContextRetriever for StaticRetriever {
    async fn query(&self, _text: &str, _k: usize) -> Result<Vec<Passage>, RagError> {
        Ok(self.passages.clone())
    }
}

/// Records every prompt and answers with a sequence number
#[derive(Default)]
struct RecordingGenerator {
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl TextGenerator for RecordingGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, RagError> {
        let mut prompts = self.prompts.lock().unwrap();
        prompts.push(prompt.to_string());
        Ok(format!("answer-{:02}", prompts.len()))
    }
}

struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, RagError> {
        Err(RagError::Transport("connection refused".to_string()))
    }
}

struct TestNode {
    addr: SocketAddr,
    state: Arc<AppState>,
    store: Arc<MemoryChatStore>,
    users: Arc<MemoryUserDirectory>,
}

async fn spawn_node(generator: Arc<dyn TextGenerator>) -> TestNode {
    let users = Arc::new(MemoryUserDirectory::new());
    let store = Arc::new(MemoryChatStore::new());
    let auth = Arc::new(JwtPrincipalResolver::new(SECRET, users.clone()));
    let retriever = Arc::new(StaticRetriever::default());
    let responder = Arc::new(RetrievalResponder::new(
        retriever,
        generator,
        ResponderConfig::default(),
    ));

    let state = Arc::new(AppState {
        registry: SessionRegistry::new(),
        responder,
        store: store.clone(),
        auth,
        history_window: 20,
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = create_router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestNode {
        addr,
        state,
        store,
        users,
    }
}

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect(addr: SocketAddr, chat_id: &str, token: Option<&str>) -> WsClient {
    let mut request = format!("ws://{}/ws/chat/{}", addr, chat_id)
        .into_client_request()
        .unwrap();
    if let Some(token) = token {
        request.headers_mut().insert(
            "Cookie",
            HeaderValue::from_str(&format!("access_token={}", token)).unwrap(),
        );
    }
    let (socket, _) = connect_async(request).await.unwrap();
    socket
}

fn token_for(user_id: &str) -> String {
    issue_access_token(SECRET, user_id, Duration::from_secs(3600)).unwrap()
}

async fn expect_close(socket: &mut WsClient, code: u16) {
    loop {
        match tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for close frame")
        {
            Some(Ok(WsMessage::Close(frame))) => {
                let frame = frame.expect("close frame should carry a code");
                assert_eq!(u16::from(frame.code), code);
                return;
            }
            Some(Ok(WsMessage::Ping(_))) | Some(Ok(WsMessage::Pong(_))) => continue,
            other => panic!("expected close frame, got {:?}", other),
        }
    }
}

async fn expect_text(socket: &mut WsClient) -> String {
    loop {
        match tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for text frame")
        {
            Some(Ok(WsMessage::Text(text))) => return text,
            Some(Ok(WsMessage::Ping(_))) | Some(Ok(WsMessage::Pong(_))) => continue,
            other => panic!("expected text frame, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_unauthenticated_connection_closes_4401() {
    let node = spawn_node(Arc::new(RecordingGenerator::default())).await;

    let chat_id = Uuid::new_v4().to_string();
    let mut socket = connect(node.addr, &chat_id, None).await;

    expect_close(&mut socket, 4401).await;
    assert_eq!(node.state.registry.active_sessions().await, 0);
}

#[tokio::test]
async fn test_malformed_chat_id_closes_4001() {
    let node = spawn_node(Arc::new(RecordingGenerator::default())).await;
    let user = node.users.add_user("meera", "meera@example.com").await;

    let mut socket = connect(node.addr, "not-a-chat-id", Some(&token_for(&user.id))).await;

    expect_close(&mut socket, 4001).await;
    assert_eq!(node.state.registry.active_sessions().await, 0);
}

#[tokio::test]
async fn test_unknown_chat_closes_4004() {
    let node = spawn_node(Arc::new(RecordingGenerator::default())).await;
    let user = node.users.add_user("meera", "meera@example.com").await;

    let chat_id = Uuid::new_v4().to_string();
    let mut socket = connect(node.addr, &chat_id, Some(&token_for(&user.id))).await;

    expect_close(&mut socket, 4004).await;
}

#[tokio::test]
async fn test_foreign_chat_closes_4403_with_no_frames() {
    let node = spawn_node(Arc::new(RecordingGenerator::default())).await;
    let owner = node.users.add_user("owner", "owner@example.com").await;
    let intruder = node.users.add_user("intruder", "intruder@example.com").await;
    let chat = node.store.create_conversation(&owner.id, "New Chat").await;

    let mut socket = connect(node.addr, &chat.id, Some(&token_for(&intruder.id))).await;

    expect_close(&mut socket, 4403).await;
    assert_eq!(node.state.registry.active_sessions().await, 0);
    assert!(node.store.turns(&chat.id).await.is_empty());
}

#[tokio::test]
async fn test_generation_failure_sends_fallback_and_persists_both_turns() {
    let node = spawn_node(Arc::new(FailingGenerator)).await;
    let user = node.users.add_user("ravi", "ravi@example.com").await;
    let chat = node.store.create_conversation(&user.id, "New Chat").await;

    let mut socket = connect(node.addr, &chat.id, Some(&token_for(&user.id))).await;
    socket
        .send(WsMessage::Text("What is the GST rate on cement?".to_string()))
        .await
        .unwrap();

    let reply = expect_text(&mut socket).await;
    assert_eq!(reply, FALLBACK_ANSWER);

    let turns = node.store.turns(&chat.id).await;
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].sender, Sender::User);
    assert_eq!(turns[0].content, "What is the GST rate on cement?");
    assert_eq!(turns[1].sender, Sender::Bot);
    assert_eq!(turns[1].content, FALLBACK_ANSWER);
}

#[tokio::test]
async fn test_turns_interleave_and_window_keeps_last_twenty() {
    let generator = Arc::new(RecordingGenerator::default());
    let node = spawn_node(generator.clone()).await;
    let user = node.users.add_user("asha", "asha@example.com").await;
    let chat = node.store.create_conversation(&user.id, "New Chat").await;

    let mut socket = connect(node.addr, &chat.id, Some(&token_for(&user.id))).await;

    for i in 1..=25 {
        socket
            .send(WsMessage::Text(format!("question-{:02}", i)))
            .await
            .unwrap();
        let reply = expect_text(&mut socket).await;
        assert_eq!(reply, format!("answer-{:02}", i));
    }

    // Exactly 25 user turns and 25 bot turns, strictly interleaved
    let turns = node.store.turns(&chat.id).await;
    assert_eq!(turns.len(), 50);
    for (i, pair) in turns.chunks(2).enumerate() {
        assert_eq!(pair[0].sender, Sender::User);
        assert_eq!(pair[0].content, format!("question-{:02}", i + 1));
        assert_eq!(pair[1].sender, Sender::Bot);
        assert_eq!(pair[1].content, format!("answer-{:02}", i + 1));
    }

    // The 25th prompt saw a history window of the last 20 entries:
    // questions/answers 15 through 24, nothing older
    let prompts = generator.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 25);
    let last = &prompts[24];
    assert!(last.contains("question-15"));
    assert!(last.contains("answer-15"));
    assert!(last.contains("question-24"));
    assert!(!last.contains("question-14"));
    assert!(!last.contains("question-01"));
}

#[tokio::test]
async fn test_second_connection_supersedes_first() {
    let node = spawn_node(Arc::new(RecordingGenerator::default())).await;
    let user = node.users.add_user("dev", "dev@example.com").await;
    let chat = node.store.create_conversation(&user.id, "New Chat").await;
    let token = token_for(&user.id);

    let mut first = connect(node.addr, &chat.id, Some(&token)).await;
    let mut second = connect(node.addr, &chat.id, Some(&token)).await;

    // The first device is told it was superseded
    expect_close(&mut first, 4409).await;

    // The replacement session still answers
    second
        .send(WsMessage::Text("What is CGST?".to_string()))
        .await
        .unwrap();
    let reply = expect_text(&mut second).await;
    assert_eq!(reply, "answer-01");
    assert_eq!(node.state.registry.active_sessions().await, 1);
}

#[tokio::test]
async fn test_disconnect_unregisters_session() {
    let node = spawn_node(Arc::new(RecordingGenerator::default())).await;
    let user = node.users.add_user("dev", "dev@example.com").await;
    let chat = node.store.create_conversation(&user.id, "New Chat").await;

    let mut socket = connect(node.addr, &chat.id, Some(&token_for(&user.id))).await;
    socket
        .send(WsMessage::Text("hello".to_string()))
        .await
        .unwrap();
    expect_text(&mut socket).await;
    assert_eq!(node.state.registry.active_sessions().await, 1);

    socket.close(None).await.unwrap();

    // Cleanup is prompt but not synchronous with the client-side close
    for _ in 0..50 {
        if node.state.registry.active_sessions().await == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("session was not unregistered after disconnect");
}

#[tokio::test]
async fn test_health_reports_active_sessions() {
    let node = spawn_node(Arc::new(RecordingGenerator::default())).await;

    let body: serde_json::Value = reqwest::get(format!("http://{}/health", node.addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["active_sessions"], 0);
}
