use super::traits::{AuthProvider, AuthResult};
use super::types::AuthUser;
use crate::error::AuthError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Identity-Toolkit style REST auth (`{base}/accounts:signUp?key=...`)
pub struct RestAuth {
    client: Client,
    base: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    id_token: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Map a provider error code onto the user-facing auth failures
pub fn map_error_code(code: &str) -> AuthError {
    // Codes can carry a suffix: "WEAK_PASSWORD : Password should be at least 6 characters"
    let code = code.split([' ', ':']).next().unwrap_or(code);
    match code {
        "EMAIL_EXISTS" => AuthError::EmailAlreadyRegistered,
        "INVALID_EMAIL" | "MISSING_EMAIL" => AuthError::InvalidEmail,
        "EMAIL_NOT_FOUND" | "USER_NOT_FOUND" | "USER_DISABLED" => AuthError::AccountNotFound,
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "MISSING_PASSWORD" => {
            AuthError::WrongPassword
        }
        "WEAK_PASSWORD" => AuthError::WeakPassword,
        other => AuthError::Unexpected(other.to_string()),
    }
}

impl From<AccountResponse> for AuthUser {
    fn from(r: AccountResponse) -> Self {
        AuthUser {
            uid: r.local_id,
            email: r.email,
            display_name: r.display_name,
            id_token: r.id_token,
        }
    }
}

impl RestAuth {
    pub fn new(base: &str, api_key: &str, timeout: Duration) -> AuthResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Unexpected(e.to_string()))?;
        Ok(Self {
            client,
            base: base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    async fn call(&self, method: &str, body: Value) -> AuthResult<Value> {
        let url = format!("{}/accounts:{}", self.base, method);
        debug!("auth call accounts:{}", method);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!("Auth request {} failed: {}", method, e);
                AuthError::Unexpected(e.to_string())
            })?;

        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .map_err(|e| AuthError::Unexpected(e.to_string()))?;

        if status.is_success() {
            return Ok(payload);
        }
        match serde_json::from_value::<ErrorEnvelope>(payload) {
            Ok(envelope) => Err(map_error_code(&envelope.error.message)),
            Err(_) => Err(AuthError::Unexpected(format!("auth returned {status}"))),
        }
    }

    async fn account(&self, method: &str, body: Value) -> AuthResult<AuthUser> {
        let payload = self.call(method, body).await?;
        let account: AccountResponse =
            serde_json::from_value(payload).map_err(|e| AuthError::Unexpected(e.to_string()))?;
        Ok(account.into())
    }
}

#[async_trait]
impl AuthProvider for RestAuth {
    async fn sign_up(&self, email: &str, password: &str, display_name: &str) -> AuthResult<AuthUser> {
        let user = self
            .account(
                "signUp",
                json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;
        if display_name.trim().is_empty() {
            return Ok(user);
        }
        self.update_display_name(&user, display_name).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthUser> {
        self.account(
            "signInWithPassword",
            json!({ "email": email, "password": password, "returnSecureToken": true }),
        )
        .await
    }

    async fn sign_in_federated(&self, provider_id: &str, id_token: &str) -> AuthResult<AuthUser> {
        self.account(
            "signInWithIdp",
            json!({
                "postBody": format!("id_token={id_token}&providerId={provider_id}"),
                "requestUri": "http://localhost",
                "returnSecureToken": true,
                "returnIdpCredential": true,
            }),
        )
        .await
    }

    // Tokens are stateless on the provider side; dropping ours is enough.
    async fn sign_out(&self, _user: &AuthUser) -> AuthResult<()> {
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> AuthResult<()> {
        self.call(
            "sendOobCode",
            json!({ "requestType": "PASSWORD_RESET", "email": email }),
        )
        .await?;
        Ok(())
    }

    async fn update_display_name(&self, user: &AuthUser, display_name: &str) -> AuthResult<AuthUser> {
        let updated = self
            .account(
                "update",
                json!({ "idToken": user.id_token, "displayName": display_name, "returnSecureToken": true }),
            )
            .await?;
        Ok(AuthUser {
            uid: user.uid.clone(),
            id_token: if updated.id_token.is_empty() { user.id_token.clone() } else { updated.id_token },
            ..updated
        })
    }

    async fn update_email(&self, user: &AuthUser, email: &str) -> AuthResult<AuthUser> {
        let updated = self
            .account(
                "update",
                json!({ "idToken": user.id_token, "email": email, "returnSecureToken": true }),
            )
            .await?;
        Ok(AuthUser {
            uid: user.uid.clone(),
            display_name: user.display_name.clone(),
            id_token: if updated.id_token.is_empty() { user.id_token.clone() } else { updated.id_token },
            ..updated
        })
    }

    async fn update_password(&self, user: &AuthUser, password: &str) -> AuthResult<()> {
        self.call(
            "update",
            json!({ "idToken": user.id_token, "password": password, "returnSecureToken": true }),
        )
        .await?;
        Ok(())
    }
}
