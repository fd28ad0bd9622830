use super::Confirmation;
use crate::auth::Session;
use crate::error::ServiceError;
use crate::models::{ActivationCode, Role, UserProfile, Visit};
use crate::store::DocumentStore;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Superadmin dashboard
pub struct AdminService {
    store: Arc<dyn DocumentStore>,
}

impl AdminService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn users(&self, session: &Session) -> Result<Vec<UserProfile>, ServiceError> {
        session.require_role(&[Role::Superadmin])?;
        Ok(self.store.users().await?)
    }

    pub async fn set_role(&self, session: &Session, uid: &str, role: Role) -> Result<(), ServiceError> {
        let admin = session.require_role(&[Role::Superadmin])?;
        if admin.uid == uid && role != Role::Superadmin {
            return Err(ServiceError::Forbidden("cannot demote yourself"));
        }
        self.store.set_user_role(uid, role).await?;
        info!("{} set role of {} to {:?}", admin.email, uid, role);
        Ok(())
    }

    pub async fn delete_user(
        &self,
        session: &Session,
        uid: &str,
        confirmation: &Confirmation,
    ) -> Result<(), ServiceError> {
        let admin = session.require_role(&[Role::Superadmin])?;
        confirmation.check(uid)?;
        if admin.uid == uid {
            return Err(ServiceError::Forbidden("cannot delete your own account"));
        }
        self.store.delete_user(uid).await?;
        info!("🗑️ {} deleted user {}", admin.email, uid);
        Ok(())
    }

    pub async fn visits(&self, session: &Session) -> Result<Vec<Visit>, ServiceError> {
        session.require_role(&[Role::Superadmin])?;
        Ok(self.store.visits().await?)
    }

    /// Mint a fresh activation code to hand to a new agent
    pub async fn issue_activation_code(&self, session: &Session) -> Result<ActivationCode, ServiceError> {
        session.require_role(&[Role::Superadmin])?;
        let raw = Uuid::new_v4().simple().to_string();
        let code = ActivationCode::new(raw[..8].to_uppercase());
        self.store.create_activation_code(&code).await?;
        Ok(code)
    }
}
