use super::{storage_name, Confirmation, ImageUpload};
use crate::auth::Session;
use crate::error::ServiceError;
use crate::models::{Role, Tip};
use crate::store::{DocumentStore, ObjectStore};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct TipDraft {
    pub title: String,
    pub content: String,
    pub image: Option<ImageUpload>,
    pub published: bool,
}

/// The "tips" blog
pub struct TipService {
    store: Arc<dyn DocumentStore>,
    objects: Arc<dyn ObjectStore>,
}

impl TipService {
    pub fn new(store: Arc<dyn DocumentStore>, objects: Arc<dyn ObjectStore>) -> Self {
        Self { store, objects }
    }

    pub async fn published(&self) -> Result<Vec<Tip>, ServiceError> {
        Ok(self.store.tips().await?)
    }

    pub async fn create(&self, session: &Session, draft: TipDraft) -> Result<Tip, ServiceError> {
        let author = session.require_role(&[Role::Agent, Role::Superadmin])?;
        let mut missing = Vec::new();
        if draft.title.trim().is_empty() {
            missing.push("title");
        }
        if draft.content.trim().is_empty() {
            missing.push("content");
        }
        if !missing.is_empty() {
            return Err(ServiceError::Validation(missing));
        }

        let image_url = match draft.image {
            Some(image) => {
                let path = format!(
                    "tips/{}_{}",
                    Utc::now().timestamp_millis(),
                    storage_name(&image.file_name)
                );
                Some(
                    self.objects
                        .upload(&path, image.bytes, &image.content_type)
                        .await?,
                )
            }
            None => None,
        };

        let mut tip = Tip {
            id: String::new(),
            title: draft.title.trim().to_string(),
            content: draft.content.trim().to_string(),
            image_url,
            author_id: author.uid.clone(),
            author_name: author.display_name.clone(),
            published: draft.published,
            created_at: Utc::now(),
        };
        tip.id = self.store.create_tip(&tip).await?;
        info!("📝 {} wrote tip \"{}\"", author.email, tip.title);
        Ok(tip)
    }

    pub async fn delete(
        &self,
        session: &Session,
        id: &str,
        confirmation: &Confirmation,
    ) -> Result<(), ServiceError> {
        session.require_role(&[Role::Superadmin])?;
        confirmation.check(id)?;
        self.store.delete_tip(id).await?;
        Ok(())
    }
}
