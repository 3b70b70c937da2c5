#![allow(dead_code)]

use std::sync::Arc;

use application::{
    ChatService, ChatServiceDependencies, Clock, ManualClock, MessageRouter,
    MessageRouterDependencies, PresenceManager, PresenceManagerDependencies, Reaper,
    ReaperConfig,
};
use axum::{
    body::{to_bytes, Body},
    http::{Request, Response, StatusCode},
    Router,
};
use chrono::FixedOffset;
use domain::ParticipantRepository;
use infrastructure::MemoryStore;
use serde_json::Value;
use tower::ServiceExt;
use web_api::{router, AppState};

/// 2023-11-14T22:13:20Z
pub const START: i64 = 1_700_000_000_000;

pub struct TestApp {
    pub router: Router,
    pub clock: Arc<ManualClock>,
    pub reaper: Arc<Reaper>,
}

pub fn build_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    build_app_with(store.clone(), store)
}

/// 参与者使用自定义仓储，消息写入内存存储
pub fn build_app_with(
    store: Arc<MemoryStore>,
    participants: Arc<dyn ParticipantRepository>,
) -> TestApp {
    let clock = Arc::new(ManualClock::new(START));

    let presence = Arc::new(PresenceManager::new(PresenceManagerDependencies {
        participant_repository: participants,
        clock: clock.clone() as Arc<dyn Clock>,
    }));
    let message_router = Arc::new(MessageRouter::new(MessageRouterDependencies {
        message_repository: store,
        presence: presence.clone(),
        clock: clock.clone() as Arc<dyn Clock>,
        utc_offset: FixedOffset::east_opt(0).expect("offset"),
    }));
    let chat_service = Arc::new(ChatService::new(ChatServiceDependencies {
        presence: presence.clone(),
        router: message_router.clone(),
    }));
    let reaper = Arc::new(Reaper::new(
        presence,
        message_router,
        clock.clone() as Arc<dyn Clock>,
        ReaperConfig::default(),
    ));

    TestApp {
        router: router(AppState::new(chat_service)),
        clock,
        reaper,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn post_json(&self, uri: &str, user: Option<&str>, body: Value) -> StatusCode {
        let mut builder = Request::post(uri).header("content-type", "application/json");
        if let Some(user) = user {
            builder = builder.header("User", user);
        }
        let request = builder.body(Body::from(body.to_string())).expect("request");
        self.send(request).await.status()
    }

    pub async fn register(&self, name: &str) -> StatusCode {
        self.post_json("/participants", None, serde_json::json!({ "name": name }))
            .await
    }

    pub async fn heartbeat(&self, user: Option<&str>) -> StatusCode {
        let mut builder = Request::post("/status");
        if let Some(user) = user {
            builder = builder.header("User", user);
        }
        self.send(builder.body(Body::empty()).expect("request"))
            .await
            .status()
    }

    pub async fn get_json(&self, uri: &str, user: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::get(uri);
        if let Some(user) = user {
            builder = builder.header("User", user);
        }
        let response = self.send(builder.body(Body::empty()).expect("request")).await;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, value)
    }
}
