//! Fixtures shared by the integration tests: the full service stack on top of
//! the in-memory store, plus helpers to drive the HTTP router.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use auth_adapters::{AuthMode, TokenAuthProvider};
use domains::models::{NewBoard, NewCard, NewChecklist, NewChecklistItem, NewComment, NewList, User};
use domains::traits::KanbanStore;
use domains::UserContext;
use services::KanbanServices;
use storage_adapters::{ImageResizer, InMemoryStore};

pub const TOKEN_SECRET: &[u8] = b"integration-secret";

/// Every adapter wired the way the server wires them, minus Postgres.
pub struct Stack {
    pub store: InMemoryStore,
    pub services: KanbanServices,
    pub auth: Arc<TokenAuthProvider>,
}

impl Stack {
    pub fn new() -> Self {
        Self::with_mode(AuthMode::Local)
    }

    pub fn with_mode(mode: AuthMode) -> Self {
        let store = InMemoryStore::new();
        let auth = Arc::new(TokenAuthProvider::new(mode, TOKEN_SECRET, 48));
        let services = KanbanServices::new(Arc::new(store.clone()), Arc::new(ImageResizer::new(8)), auth.clone());
        Self { store, services, auth }
    }

    /// Inserts a user directly, bypassing registration.
    pub async fn user(&self, email: &str) -> UserContext {
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            firstname: "Grace".into(),
            lastname: "Hopper".into(),
            password_hash: String::new(),
            created_at: Utc::now(),
        };
        let mut uow = self.store.begin().await.unwrap();
        uow.insert_user(&user).await.unwrap();
        uow.commit().await.unwrap();
        UserContext::new(user.id, "en")
    }

    pub async fn board(&self, ctx: &UserContext, title: &str) -> Uuid {
        let input = NewBoard { title: title.into(), background_id: None };
        self.services.boards.create_board(ctx, input).await.unwrap()
    }

    pub async fn lists(&self, ctx: &UserContext, board_id: Uuid, titles: &[&str]) -> Vec<Uuid> {
        let mut ids = Vec::with_capacity(titles.len());
        for title in titles {
            let input = NewList { board_id, title: title.to_string() };
            ids.push(self.services.lists.create_list(ctx, input).await.unwrap());
        }
        ids
    }

    pub async fn cards(&self, ctx: &UserContext, list_id: Uuid, titles: &[&str]) -> Vec<Uuid> {
        let mut ids = Vec::with_capacity(titles.len());
        for title in titles {
            let input = NewCard { list_id, title: title.to_string(), description: String::new() };
            ids.push(self.services.cards.create_card(ctx, input).await.unwrap());
        }
        ids
    }

    /// A card carrying one comment and one checklist with `items` items.
    pub async fn decorate_card(&self, ctx: &UserContext, card_id: Uuid, items: &[&str]) -> Uuid {
        let comment = NewComment { card_id, content: "looks good".into() };
        self.services.comments.create_comment(ctx, comment).await.unwrap();
        let checklist = NewChecklist { card_id, title: "Steps".into() };
        let checklist_id = self.services.checklists.create_checklist(ctx, checklist).await.unwrap();
        for title in items {
            let item = NewChecklistItem { checklist_id, title: title.to_string() };
            self.services.checklists.create_checklist_item(ctx, item).await.unwrap();
        }
        checklist_id
    }

    /// Titles and positions of a list's active cards, in position order.
    pub async fn card_order(&self, ctx: &UserContext, list_id: Uuid) -> Vec<(String, i32)> {
        let view = self.services.lists.get_list(ctx, list_id).await.unwrap();
        view.cards.iter().map(|c| (c.card.title.clone(), c.card.position)).collect()
    }

    /// Titles and positions of a board's active lists, in position order.
    pub async fn list_order(&self, ctx: &UserContext, board_id: Uuid) -> Vec<(String, i32)> {
        let view = self.services.boards.get_board(ctx, board_id).await.unwrap();
        view.lists.iter().map(|l| (l.list.title.clone(), l.list.position)).collect()
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "web-axum")]
pub mod http {
    //! Request helpers for `tower::ServiceExt::oneshot` against the router.

    use std::sync::Arc;

    use api_adapters::i18n::StaticCatalog;
    use api_adapters::AppState;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::Stack;

    pub fn router(stack: &Stack) -> Router {
        api_adapters::router(state(stack))
    }

    /// The state [`router`] uses, for tests that change a setting first.
    pub fn state(stack: &Stack) -> AppState {
        AppState::new(
            stack.services.clone(),
            Arc::new(stack.store.clone()),
            stack.auth.clone(),
            Arc::new(StaticCatalog),
        )
    }

    pub struct Call {
        method: Method,
        uri: String,
        body: Option<String>,
        headers: Vec<(&'static str, String)>,
    }

    impl Call {
        pub fn new(method: Method, uri: impl Into<String>) -> Self {
            Self { method, uri: uri.into(), body: None, headers: Vec::new() }
        }

        pub fn get(uri: impl Into<String>) -> Self {
            Self::new(Method::GET, uri)
        }

        pub fn post(uri: impl Into<String>, body: Value) -> Self {
            Self::new(Method::POST, uri).json(body)
        }

        pub fn put(uri: impl Into<String>, body: Value) -> Self {
            Self::new(Method::PUT, uri).json(body)
        }

        pub fn delete(uri: impl Into<String>) -> Self {
            Self::new(Method::DELETE, uri)
        }

        pub fn json(mut self, body: Value) -> Self {
            self.body = Some(body.to_string());
            self
        }

        pub fn raw(mut self, body: &str) -> Self {
            self.body = Some(body.to_string());
            self
        }

        pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
            self.headers.push((name, value.into()));
            self
        }

        /// Authenticates as `user_id` through the bearer token.
        pub fn as_user(self, user_id: uuid::Uuid) -> Self {
            self.header("authorization", format!("Bearer {user_id}"))
        }

        /// Sends the request and returns the status and the body as JSON
        /// (`Value::Null` when the body is empty).
        pub async fn send(self, app: &Router) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(self.method).uri(self.uri);
            if self.body.is_some() {
                builder = builder.header("content-type", "application/json");
            }
            for (name, value) in self.headers {
                builder = builder.header(name, value);
            }
            let request = builder.body(self.body.map(Body::from).unwrap_or_else(Body::empty)).unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
            (status, value)
        }
    }
}
