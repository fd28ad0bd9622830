use super::traits::{AuthProvider, AuthResult};
use super::types::{valid_email, AuthUser, MIN_PASSWORD_LEN};
use crate::error::AuthError;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Account {
    uid: String,
    email: String,
    password: Option<String>,
    display_name: String,
}

#[derive(Default)]
struct Accounts {
    by_email: HashMap<String, Account>,
    reset_requests: Vec<String>,
}

/// Auth provider kept in memory, for tests and local runs
#[derive(Default)]
pub struct MemoryAuth {
    accounts: Mutex<Accounts>,
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

fn token() -> String {
    Uuid::new_v4().simple().to_string()
}

impl Account {
    fn user(&self) -> AuthUser {
        AuthUser {
            uid: self.uid.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            id_token: token(),
        }
    }
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emails that asked for a password reset, oldest first
    pub async fn reset_requests(&self) -> Vec<String> {
        self.accounts.lock().await.reset_requests.clone()
    }
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    async fn sign_up(&self, email: &str, password: &str, display_name: &str) -> AuthResult<AuthUser> {
        if !valid_email(email) {
            return Err(AuthError::InvalidEmail);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }
        let key = normalize(email);
        let mut accounts = self.accounts.lock().await;
        if accounts.by_email.contains_key(&key) {
            return Err(AuthError::EmailAlreadyRegistered);
        }
        let account = Account {
            uid: token(),
            email: key.clone(),
            password: Some(password.to_string()),
            display_name: display_name.trim().to_string(),
        };
        let user = account.user();
        accounts.by_email.insert(key, account);
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthUser> {
        if !valid_email(email) {
            return Err(AuthError::InvalidEmail);
        }
        let accounts = self.accounts.lock().await;
        let account = accounts
            .by_email
            .get(&normalize(email))
            .ok_or(AuthError::AccountNotFound)?;
        if account.password.as_deref() != Some(password) {
            return Err(AuthError::WrongPassword);
        }
        Ok(account.user())
    }

    async fn sign_in_federated(&self, provider_id: &str, id_token: &str) -> AuthResult<AuthUser> {
        // Test tokens carry the email directly: "email|Display Name".
        let (email, name) = id_token.split_once('|').unwrap_or((id_token, ""));
        if !valid_email(email) {
            return Err(AuthError::Unexpected(format!(
                "{provider_id} token has no usable email"
            )));
        }
        let key = normalize(email);
        let mut accounts = self.accounts.lock().await;
        let account = accounts.by_email.entry(key.clone()).or_insert_with(|| Account {
            uid: token(),
            email: key,
            password: None,
            display_name: name.to_string(),
        });
        Ok(account.user())
    }

    async fn sign_out(&self, _user: &AuthUser) -> AuthResult<()> {
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> AuthResult<()> {
        if !valid_email(email) {
            return Err(AuthError::InvalidEmail);
        }
        let key = normalize(email);
        let mut accounts = self.accounts.lock().await;
        if !accounts.by_email.contains_key(&key) {
            return Err(AuthError::AccountNotFound);
        }
        accounts.reset_requests.push(key);
        Ok(())
    }

    async fn update_display_name(&self, user: &AuthUser, display_name: &str) -> AuthResult<AuthUser> {
        let mut accounts = self.accounts.lock().await;
        let account = accounts
            .by_email
            .get_mut(&user.email)
            .ok_or(AuthError::AccountNotFound)?;
        account.display_name = display_name.trim().to_string();
        Ok(account.user())
    }

    async fn update_email(&self, user: &AuthUser, email: &str) -> AuthResult<AuthUser> {
        if !valid_email(email) {
            return Err(AuthError::InvalidEmail);
        }
        let key = normalize(email);
        let mut accounts = self.accounts.lock().await;
        if key != user.email && accounts.by_email.contains_key(&key) {
            return Err(AuthError::EmailAlreadyRegistered);
        }
        let mut account = accounts
            .by_email
            .remove(&user.email)
            .ok_or(AuthError::AccountNotFound)?;
        account.email = key.clone();
        let updated = account.user();
        accounts.by_email.insert(key, account);
        Ok(updated)
    }

    async fn update_password(&self, user: &AuthUser, password: &str) -> AuthResult<()> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }
        let mut accounts = self.accounts.lock().await;
        let account = accounts
            .by_email
            .get_mut(&user.email)
            .ok_or(AuthError::AccountNotFound)?;
        account.password = Some(password.to_string());
        Ok(())
    }
}
