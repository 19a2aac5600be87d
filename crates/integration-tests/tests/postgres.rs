//! The services over `PostgresStore`, against a throwaway Postgres container.
//!
//! Needs a Docker daemon: `cargo test -p integration-tests --features db-postgres --test postgres`.

use std::sync::Arc;

use chrono::Utc;
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::postgres::Postgres;
use tokio::task::JoinSet;
use tokio_test::assert_ok;
use uuid::Uuid;

use auth_adapters::{AuthMode, TokenAuthProvider};
use domains::error::ErrorKind;
use domains::models::{List, ListUpdate, NewBoard, NewCard, NewList, User};
use domains::traits::KanbanStore;
use domains::{Patch, UserContext};
use integration_tests::TOKEN_SECRET;
use services::KanbanServices;
use storage_adapters::{ImageResizer, PoolSettings, PostgresStore};

struct PgStack {
    // Dropping the handle stops the container.
    _node: ContainerAsync<Postgres>,
    store: Arc<PostgresStore>,
    services: KanbanServices,
}

impl PgStack {
    async fn start() -> Self {
        let node = Postgres::default().start().await.expect("postgres container");
        let host = node.get_host().await.unwrap();
        let port = node.get_host_port_ipv4(5432).await.unwrap();
        let url = format!("postgres://postgres:postgres@{host}:{port}/postgres");

        let store = PostgresStore::connect(&url, &PoolSettings::default()).await.unwrap();
        store.migrate().await.unwrap();
        let store = Arc::new(store);
        let auth = Arc::new(TokenAuthProvider::new(AuthMode::Local, TOKEN_SECRET, 48));
        let services = KanbanServices::new(store.clone(), Arc::new(ImageResizer::new(8)), auth);
        Self { _node: node, store, services }
    }

    async fn user(&self, email: &str) -> UserContext {
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

    async fn board(&self, ctx: &UserContext, title: &str) -> Uuid {
        let input = NewBoard { title: title.into(), background_id: None };
        self.services.boards.create_board(ctx, input).await.unwrap()
    }

    async fn lists(&self, ctx: &UserContext, board_id: Uuid, titles: &[&str]) -> Vec<Uuid> {
        let mut ids = Vec::with_capacity(titles.len());
        for title in titles {
            let input = NewList { board_id, title: title.to_string() };
            ids.push(self.services.lists.create_list(ctx, input).await.unwrap());
        }
        ids
    }

    async fn list_order(&self, ctx: &UserContext, board_id: Uuid) -> Vec<(String, i32)> {
        let view = self.services.boards.get_board(ctx, board_id).await.unwrap();
        view.lists.iter().map(|l| (l.list.title.clone(), l.list.position)).collect()
    }

    async fn card_order(&self, ctx: &UserContext, list_id: Uuid) -> Vec<(String, i32)> {
        let view = self.services.lists.get_list(ctx, list_id).await.unwrap();
        view.cards.iter().map(|c| (c.card.title.clone(), c.card.position)).collect()
    }

    async fn find_list(&self, id: Uuid) -> Option<List> {
        let mut uow = self.store.begin().await.unwrap();
        uow.find_list(id).await.unwrap()
    }

    async fn log_count(&self, ctx: &UserContext, board_id: Uuid) -> usize {
        let mut uow = self.store.begin().await.unwrap();
        uow.logs_of_board(ctx.user_id, board_id).await.unwrap().len()
    }
}

fn titled(pairs: &[(&str, i32)]) -> Vec<(String, i32)> {
    pairs.iter().map(|(t, p)| (t.to_string(), *p)).collect()
}

#[tokio::test]
async fn positions_stay_dense_through_create_archive_reorder_and_delete() {
    let pg = PgStack::start().await;
    let ctx = pg.user("grace@example.com").await;
    let board = pg.board(&ctx, "Release").await;
    let lists = pg.lists(&ctx, board, &["A", "B", "C", "D"]).await;
    assert_eq!(pg.list_order(&ctx, board).await, titled(&[("A", 1), ("B", 2), ("C", 3), ("D", 4)]));

    let archive = ListUpdate { id: lists[1], archived_at: Patch::Value(Utc::now()), ..Default::default() };
    assert_ok!(pg.services.lists.update_list(&ctx, archive).await);
    assert_eq!(pg.list_order(&ctx, board).await, titled(&[("A", 1), ("C", 2), ("D", 3)]));

    let order = format!("{},{}", lists[3], lists[0]);
    assert_ok!(pg.services.boards.reorder_lists(&ctx, board, &order).await);
    assert_eq!(pg.list_order(&ctx, board).await, titled(&[("D", 1), ("A", 2), ("C", 3)]));

    assert_ok!(pg.services.lists.delete_list(&ctx, lists[0]).await);
    assert_eq!(pg.list_order(&ctx, board).await, titled(&[("D", 1), ("C", 2)]));

    let restore = ListUpdate { id: lists[1], archived_at: Patch::Null, ..Default::default() };
    assert_ok!(pg.services.lists.update_list(&ctx, restore).await);
    assert_eq!(pg.list_order(&ctx, board).await, titled(&[("D", 1), ("C", 2), ("B", 3)]));

    let target = lists[3];
    let mut cards = Vec::new();
    for title in ["X", "Y", "Z"] {
        let input = NewCard { list_id: target, title: title.into(), description: String::new() };
        cards.push(pg.services.cards.create_card(&ctx, input).await.unwrap());
    }
    assert_ok!(pg.services.cards.delete_card(&ctx, cards[1]).await);
    assert_eq!(pg.card_order(&ctx, target).await, titled(&[("X", 1), ("Z", 2)]));

    let logs = pg.services.logs.get_logs(&ctx, board).await.unwrap();
    assert_eq!(logs[0].entry.action.to_string(), "deletecard");
    assert_eq!(logs.last().map(|l| l.entry.action.to_string()).as_deref(), Some("createboard"));

    assert_ok!(pg.services.boards.delete_board(&ctx, board).await);
    let mut uow = pg.store.begin().await.unwrap();
    assert!(uow.find_board(board).await.unwrap().is_none());
    assert!(uow.find_list(target).await.unwrap().is_none());
    assert!(uow.find_card(cards[0]).await.unwrap().is_none());
    drop(uow);
    assert!(pg.log_count(&ctx, board).await > 0);
}

#[tokio::test]
async fn uncommitted_work_is_rolled_back() {
    let pg = PgStack::start().await;
    let ctx = pg.user("grace@example.com").await;
    let board = pg.board(&ctx, "Release").await;
    let lists = pg.lists(&ctx, board, &["A", "B", "C"]).await;

    let stray = List {
        id: Uuid::new_v4(),
        board_id: board,
        title: "Stray".into(),
        position: 4,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        archived_at: None,
    };
    let mut uow = pg.store.begin().await.unwrap();
    assert!(uow.lock_board(board).await.unwrap().is_some());
    uow.set_list_position(lists[0], 7).await.unwrap();
    uow.insert_list(&stray).await.unwrap();
    drop(uow);

    assert_eq!(pg.find_list(lists[0]).await.map(|l| l.position), Some(1));
    assert!(pg.find_list(stray.id).await.is_none());

    let before = pg.list_order(&ctx, board).await;
    let logs_before = pg.log_count(&ctx, board).await;
    let order = format!("{},{},{}", lists[2], lists[0], lists[2]);
    let err = pg.services.boards.reorder_lists(&ctx, board, &order).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    assert_eq!(pg.list_order(&ctx, board).await, before);
    assert_eq!(pg.log_count(&ctx, board).await, logs_before);
}

#[tokio::test]
async fn concurrent_creates_on_one_board_get_distinct_positions() {
    let pg = PgStack::start().await;
    let ctx = pg.user("grace@example.com").await;
    let board = pg.board(&ctx, "Release").await;

    let first = NewList { board_id: board, title: "First".into() };
    let second = NewList { board_id: board, title: "Second".into() };
    let (a, b) = tokio::join!(
        pg.services.lists.create_list(&ctx, first),
        pg.services.lists.create_list(&ctx, second),
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    let mut positions = vec![pg.find_list(a).await.unwrap().position, pg.find_list(b).await.unwrap().position];
    positions.sort_unstable();
    assert_eq!(positions, vec![1, 2]);

    let mut tasks = JoinSet::new();
    for n in 0..8 {
        let services = pg.services.clone();
        let ctx = ctx.clone();
        tasks.spawn(async move {
            let input = NewList { board_id: board, title: format!("List {n}") };
            services.lists.create_list(&ctx, input).await
        });
    }
    while let Some(created) = tasks.join_next().await {
        assert_ok!(created.unwrap());
    }

    let positions: Vec<i32> = pg.list_order(&ctx, board).await.into_iter().map(|(_, p)| p).collect();
    assert_eq!(positions, (1..=10).collect::<Vec<_>>());
}
