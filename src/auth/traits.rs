use super::types::AuthUser;
use crate::error::AuthError;
use async_trait::async_trait;

pub type AuthResult<T> = Result<T, AuthError>;

/// External authentication provider
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str, display_name: &str) -> AuthResult<AuthUser>;

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthUser>;

    /// Sign in with an id token from a federated provider (e.g. `google.com`)
    async fn sign_in_federated(&self, provider_id: &str, id_token: &str) -> AuthResult<AuthUser>;

    async fn sign_out(&self, user: &AuthUser) -> AuthResult<()>;

    async fn send_password_reset(&self, email: &str) -> AuthResult<()>;

    async fn update_display_name(&self, user: &AuthUser, display_name: &str) -> AuthResult<AuthUser>;

    async fn update_email(&self, user: &AuthUser, email: &str) -> AuthResult<AuthUser>;

    async fn update_password(&self, user: &AuthUser, password: &str) -> AuthResult<()>;
}
