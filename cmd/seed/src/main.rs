//! # seed
//!
//! Fills a development database with one user and a few boards of fake data.
//!
//! ```text
//! seed [email] [password]
//! ```
//!
//! The user is registered unless the email is already taken, in which case the
//! boards are added to the existing account.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use fake::faker::lorem::en::{Sentence, Word};
use fake::Fake;
use secrecy::ExposeSecret;

use auth_adapters::{AuthMode, TokenAuthProvider, DEFAULT_TOKEN_TTL_HOURS};
use configs::Settings;
use domains::models::{NewBoard, NewCard, NewChecklist, NewChecklistItem, NewComment, NewList, NewUser};
use domains::traits::KanbanStore;
use domains::UserContext;
use services::KanbanServices;
use storage_adapters::{ImageResizer, PoolSettings, PostgresStore};

const DEFAULT_EMAIL: &str = "demo@example.com";
const DEFAULT_PASSWORD: &str = "Demo!board2024";
const BOARDS: usize = 2;
const LIST_TITLES: [&str; 3] = ["Todo", "Doing", "Done"];

fn capitalized(word: String) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => word,
    }
}

async fn demo_user(
    services: &KanbanServices,
    store: &PostgresStore,
    email: &str,
    password: &str,
) -> anyhow::Result<UserContext> {
    let input = NewUser {
        email: email.to_string(),
        firstname: "Demo".into(),
        lastname: "User".into(),
        password: password.to_string(),
    };
    match services.users.register(input).await {
        Ok(id) => {
            tracing::info!(%email, "registered demo user");
            Ok(UserContext::new(id, "en"))
        }
        Err(err) => {
            let mut uow = store.begin().await?;
            let Some(existing) = uow.find_user_by_email(&email.trim().to_lowercase()).await? else {
                bail!("cannot register {email}: {err}");
            };
            tracing::info!(%email, "reusing existing user");
            Ok(UserContext::new(existing.id, "en"))
        }
    }
}

async fn seed_board(services: &KanbanServices, ctx: &UserContext) -> anyhow::Result<()> {
    let title = capitalized(Word().fake());
    let board_id = services.boards.create_board(ctx, NewBoard { title, background_id: None }).await?;

    for list_title in LIST_TITLES {
        let list_id = services
            .lists
            .create_list(ctx, NewList { board_id, title: list_title.to_string() })
            .await?;
        for _ in 0..(2..5).fake::<usize>() {
            let card = NewCard { list_id, title: Sentence(2..5).fake(), description: Sentence(6..12).fake() };
            let card_id = services.cards.create_card(ctx, card).await?;

            if (0..3).fake::<u8>() == 0 {
                let content = Sentence(4..10).fake();
                services.comments.create_comment(ctx, NewComment { card_id, content }).await?;
            }
            if (0..3).fake::<u8>() == 0 {
                let checklist_id = services
                    .checklists
                    .create_checklist(ctx, NewChecklist { card_id, title: "Steps".into() })
                    .await?;
                for _ in 0..3 {
                    let item = NewChecklistItem { checklist_id, title: Sentence(2..4).fake() };
                    services.checklists.create_checklist_item(ctx, item).await?;
                }
            }
        }
    }
    tracing::info!(%board_id, "seeded board");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading settings")?;
    tracing_subscriber::fmt().with_env_filter(settings.log.level.as_str()).init();

    let mut args = std::env::args().skip(1);
    let email = args.next().unwrap_or_else(|| DEFAULT_EMAIL.to_string());
    let password = args.next().unwrap_or_else(|| DEFAULT_PASSWORD.to_string());

    let pool = PoolSettings {
        max_connections: 2,
        min_connections: 1,
        acquire_timeout: Duration::from_secs(settings.database.acquire_timeout_secs),
    };
    let store = PostgresStore::connect(settings.database.url.expose_secret(), &pool)
        .await
        .context("connecting to postgres")?;
    store.migrate().await.context("running migrations")?;
    let store = Arc::new(store);

    // Only hashing is needed here; tokens are never issued.
    let auth = Arc::new(TokenAuthProvider::new(AuthMode::Local, &[], DEFAULT_TOKEN_TTL_HOURS));
    let services = KanbanServices::new(store.clone(), Arc::new(ImageResizer::default()), auth);

    let ctx = demo_user(&services, &store, &email, &password).await?;
    for _ in 0..BOARDS {
        seed_board(&services, &ctx).await?;
    }
    tracing::info!(%email, boards = BOARDS, "seed complete");
    Ok(())
}
