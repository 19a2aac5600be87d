//! # BackgroundService
//!
//! Backgrounds are user-owned images that boards may reference. Their log rows
//! carry no board id.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use domains::error::{AppError, Result};
use domains::models::{Background, NewBackground};
use domains::traits::{ImageProcessor, KanbanStore};
use domains::{AuditAction, DataUrl, EntityKind, Mutation, UserContext, Verb};

use crate::audit;
use crate::guard::FORBIDDEN;

pub(crate) const BACKGROUND_IN_USE: &str = "BackgroundUsedInBoard";

#[derive(Clone)]
pub struct BackgroundService {
    store: Arc<dyn KanbanStore>,
    images: Arc<dyn ImageProcessor>,
}

impl BackgroundService {
    pub fn new(store: Arc<dyn KanbanStore>, images: Arc<dyn ImageProcessor>) -> Self {
        Self { store, images }
    }

    pub async fn get_background(&self, ctx: &UserContext, id: Uuid) -> Result<Background> {
        let mut uow = self.store.begin().await?;
        let background = uow
            .find_background(id)
            .await?
            .ok_or_else(|| AppError::not_found(EntityKind::Background, id))?;
        if background.user_id != ctx.user_id {
            return Err(AppError::Forbidden(FORBIDDEN));
        }
        Ok(background)
    }

    pub async fn get_backgrounds(&self, ctx: &UserContext) -> Result<Vec<Background>> {
        let mut uow = self.store.begin().await?;
        uow.backgrounds_of_user(ctx.user_id).await
    }

    /// Decodes, resizes and averages the upload, then stores it.
    pub async fn create_background(&self, ctx: &UserContext, input: NewBackground) -> Result<Uuid> {
        let upload: DataUrl = input.data.parse()?;
        // Image work happens before the transaction opens.
        let processed = self.images.process(upload).await?;

        let mut uow = self.store.begin().await?;
        let background = Background {
            id: Uuid::new_v4(),
            user_id: ctx.user_id,
            data: processed.image.to_string(),
            color: processed.average_color,
            created_at: Utc::now(),
        };
        uow.insert_background(&background).await?;

        let action = AuditAction::new(Verb::Create, EntityKind::Background);
        audit::commit(uow, ctx, Mutation::new(action, background.id, None)).await?;
        Ok(background.id)
    }

    /// Fails with `BackgroundUsedInBoard` while any board still references it.
    pub async fn delete_background(&self, ctx: &UserContext, id: Uuid) -> Result<()> {
        let mut uow = self.store.begin().await?;
        let background = uow
            .find_background(id)
            .await?
            .ok_or_else(|| AppError::not_found(EntityKind::Background, id))?;
        if background.user_id != ctx.user_id {
            return Err(AppError::Forbidden(FORBIDDEN));
        }
        let users = uow.count_boards_with_background(id).await?;
        if users > 0 {
            tracing::warn!(background_id = %id, boards = users, "background still in use");
            return Err(AppError::Forbidden(BACKGROUND_IN_USE));
        }
        uow.delete_background(id).await?;

        let action = AuditAction::new(Verb::Delete, EntityKind::Background);
        audit::commit(uow, ctx, Mutation::new(action, id, None)).await
    }
}

#[cfg(test)]
mod tests {
    use domains::error::ErrorKind;
    use domains::models::{BoardUpdate, NewBoard};
    use domains::traits::{MockAuthProvider, MockImageProcessor, ProcessedImage};
    use domains::Patch;

    use super::*;
    use crate::fixtures::Harness;

    const PNG: &str = "data:image/png;base64,iVBORw0KGgo=";

    fn resizer() -> MockImageProcessor {
        let mut images = MockImageProcessor::new();
        images
            .expect_process()
            .returning(|upload| Ok(ProcessedImage { image: upload, average_color: "#204060".into() }));
        images
    }

    #[tokio::test]
    async fn create_stores_the_processed_image_without_board() {
        let h = Harness::with_ports(resizer(), MockAuthProvider::new());
        let ctx = h.user("ada@example.com").await;

        let id = h
            .services
            .backgrounds
            .create_background(&ctx, NewBackground { data: PNG.into() })
            .await
            .unwrap();

        let stored = h.services.backgrounds.get_background(&ctx, id).await.unwrap();
        assert_eq!(stored.color, "#204060");
        assert_eq!(stored.data, PNG);

        let last = h.store.all_logs().await.pop().unwrap();
        assert_eq!(last.action.to_string(), "createbackground");
        assert_eq!(last.board_id, None);
    }

    #[tokio::test]
    async fn malformed_data_url_never_reaches_the_processor() {
        let mut images = MockImageProcessor::new();
        images.expect_process().never();
        let h = Harness::with_ports(images, MockAuthProvider::new());
        let ctx = h.user("ada@example.com").await;

        let input = NewBackground { data: "not a data url".into() };
        let err = h.services.backgrounds.create_background(&ctx, input).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    }

    #[tokio::test]
    async fn background_in_use_cannot_be_deleted() {
        let h = Harness::with_ports(resizer(), MockAuthProvider::new());
        let ctx = h.user("ada@example.com").await;
        let bg = h
            .services
            .backgrounds
            .create_background(&ctx, NewBackground { data: PNG.into() })
            .await
            .unwrap();
        let board = h
            .services
            .boards
            .create_board(&ctx, NewBoard { title: "Themed".into(), background_id: Some(bg) })
            .await
            .unwrap();

        let err = h.services.backgrounds.delete_background(&ctx, bg).await.unwrap_err();
        assert_eq!(err.message_key(), BACKGROUND_IN_USE);

        let detach = BoardUpdate { id: board, background_id: Patch::Null, ..Default::default() };
        h.services.boards.update_board(&ctx, detach).await.unwrap();
        h.services.backgrounds.delete_background(&ctx, bg).await.unwrap();
        assert_eq!(h.store.row_counts().await.backgrounds, 0);
    }

    #[tokio::test]
    async fn only_the_owner_sees_or_deletes_a_background() {
        let h = Harness::with_ports(resizer(), MockAuthProvider::new());
        let ada = h.user("ada@example.com").await;
        let eve = h.user("eve@example.com").await;
        let bg = h
            .services
            .backgrounds
            .create_background(&ada, NewBackground { data: PNG.into() })
            .await
            .unwrap();

        let err = h.services.backgrounds.get_background(&eve, bg).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        let err = h.services.backgrounds.delete_background(&eve, bg).await.unwrap_err();
        assert_eq!(err.message_key(), FORBIDDEN);
        assert!(h.services.backgrounds.get_backgrounds(&eve).await.unwrap().is_empty());
        assert_eq!(h.services.backgrounds.get_backgrounds(&ada).await.unwrap().len(), 1);
    }
}
