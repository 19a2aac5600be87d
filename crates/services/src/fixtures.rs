//! Shared setup for the service tests.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use domains::models::{NewBoard, NewCard, NewList, User};
use domains::traits::{KanbanStore, MockAuthProvider, MockImageProcessor};
use domains::UserContext;
use storage_adapters::InMemoryStore;

use crate::KanbanServices;

pub(crate) struct Harness {
    pub store: InMemoryStore,
    pub services: KanbanServices,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_ports(MockImageProcessor::new(), MockAuthProvider::new())
    }

    pub fn with_ports(images: MockImageProcessor, auth: MockAuthProvider) -> Self {
        let store = InMemoryStore::new();
        let services = KanbanServices::new(Arc::new(store.clone()), Arc::new(images), Arc::new(auth));
        Self { store, services }
    }

    pub async fn user(&self, email: &str) -> UserContext {
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            firstname: "Ada".into(),
            lastname: "Lovelace".into(),
            password_hash: String::new(),
            created_at: Utc::now(),
        };
        let mut uow = self.store.begin().await.unwrap();
        uow.insert_user(&user).await.unwrap();
        uow.commit().await.unwrap();
        UserContext::new(user.id, "fr")
    }

    pub async fn board(&self, ctx: &UserContext) -> Uuid {
        let input = NewBoard { title: "Roadmap".into(), background_id: None };
        self.services.boards.create_board(ctx, input).await.unwrap()
    }

    pub async fn lists(&self, ctx: &UserContext, board_id: Uuid, titles: &[&str]) -> Vec<Uuid> {
        let mut ids = Vec::new();
        for title in titles {
            let input = NewList { board_id, title: title.to_string() };
            ids.push(self.services.lists.create_list(ctx, input).await.unwrap());
        }
        ids
    }

    pub async fn cards(&self, ctx: &UserContext, list_id: Uuid, titles: &[&str]) -> Vec<Uuid> {
        let mut ids = Vec::new();
        for title in titles {
            let input = NewCard { list_id, title: title.to_string(), description: String::new() };
            ids.push(self.services.cards.create_card(ctx, input).await.unwrap());
        }
        ids
    }

    /// `(id, position)` of the list's active cards, in position order.
    pub async fn card_positions(&self, ctx: &UserContext, list_id: Uuid) -> Vec<(Uuid, i32)> {
        let view = self.services.lists.get_list(ctx, list_id).await.unwrap();
        view.cards.iter().map(|c| (c.card.id, c.card.position)).collect()
    }
}
