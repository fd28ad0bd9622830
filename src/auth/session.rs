use super::traits::AuthProvider;
use super::types::{valid_email, AuthUser, Identity, SignUp, MIN_PASSWORD_LEN};
use crate::error::{AuthError, ServiceError, StoreError};
use crate::models::{Role, UserProfile};
use crate::store::DocumentStore;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

/// The signed-in user for one running app.
///
/// Built once at start-up and handed to every service that needs to know who
/// is acting. Identity changes are broadcast on a watch channel; signing out
/// clears both the provider token and the identity.
pub struct Session {
    auth: Arc<dyn AuthProvider>,
    store: Arc<dyn DocumentStore>,
    user: Mutex<Option<AuthUser>>,
    state: watch::Sender<Option<Identity>>,
}

impl Session {
    pub fn new(auth: Arc<dyn AuthProvider>, store: Arc<dyn DocumentStore>) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            auth,
            store,
            user: Mutex::new(None),
            state,
        }
    }

    /// Current identity, if anyone is signed in
    pub fn current(&self) -> Option<Identity> {
        self.state.borrow().clone()
    }

    pub fn require(&self) -> Result<Identity, AuthError> {
        self.current().ok_or(AuthError::NotSignedIn)
    }

    /// Signed-in identity with one of `roles`
    pub fn require_role(&self, roles: &[Role]) -> Result<Identity, ServiceError> {
        let identity = self.require()?;
        if roles.contains(&identity.role) {
            Ok(identity)
        } else {
            Err(ServiceError::Forbidden("role not allowed"))
        }
    }

    /// Receive every auth-state change (sign in, refresh, sign out)
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.state.subscribe()
    }

    pub async fn sign_up(&self, form: SignUp) -> Result<Identity, ServiceError> {
        let mut missing = Vec::new();
        if form.email.trim().is_empty() {
            missing.push("email");
        }
        if form.password.is_empty() {
            missing.push("password");
        }
        if form.display_name.trim().is_empty() {
            missing.push("display_name");
        }
        let code = form
            .activation_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());
        match form.role {
            Role::Superadmin => return Err(ServiceError::Forbidden("superadmin cannot self-register")),
            Role::Agent if code.is_none() => missing.push("activation_code"),
            _ => {}
        }
        if !missing.is_empty() {
            return Err(ServiceError::Validation(missing));
        }
        if !valid_email(&form.email) {
            return Err(AuthError::InvalidEmail.into());
        }
        if form.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword.into());
        }

        let user = self
            .auth
            .sign_up(&form.email, &form.password, &form.display_name)
            .await
            .inspect_err(|e| warn!("Sign-up failed: {}", e))?;

        let profile = UserProfile {
            uid: user.uid.clone(),
            email: user.email.clone(),
            display_name: form.display_name.trim().to_string(),
            phone: form.phone.trim().to_string(),
            role: Role::Client,
            created_at: Some(Utc::now()),
        };
        self.store.put_user(&profile).await?;
        info!("👤 Registered {} ({})", profile.email, profile.uid);
        self.establish(user, Identity::from_profile(&profile)).await;

        if let Some(code) = code {
            self.redeem_activation_code(code).await?;
        }
        self.require().map_err(Into::into)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, ServiceError> {
        if email.trim().is_empty() || password.is_empty() {
            let mut missing = Vec::new();
            if email.trim().is_empty() {
                missing.push("email");
            }
            if password.is_empty() {
                missing.push("password");
            }
            return Err(ServiceError::Validation(missing));
        }
        let user = self
            .auth
            .sign_in(email, password)
            .await
            .inspect_err(|e| warn!("Sign-in failed for {}: {}", email, e))?;
        self.load_profile(user).await
    }

    pub async fn sign_in_federated(&self, provider_id: &str, id_token: &str) -> Result<Identity, ServiceError> {
        let user = self
            .auth
            .sign_in_federated(provider_id, id_token)
            .await
            .inspect_err(|e| warn!("Federated sign-in via {} failed: {}", provider_id, e))?;
        self.load_profile(user).await
    }

    pub async fn sign_out(&self) -> Result<(), ServiceError> {
        let user = self.user.lock().await.take();
        if let Some(user) = &user {
            // The local session goes away even if the provider call fails.
            if let Err(e) = self.auth.sign_out(user).await {
                warn!("Provider sign-out failed: {}", e);
            }
            info!("👋 Signed out {}", user.email);
        }
        self.state.send_replace(None);
        Ok(())
    }

    pub async fn send_password_reset(&self, email: &str) -> Result<(), ServiceError> {
        if email.trim().is_empty() {
            return Err(ServiceError::Validation(vec!["email"]));
        }
        self.auth.send_password_reset(email.trim()).await?;
        Ok(())
    }

    pub async fn update_display_name(&self, display_name: &str) -> Result<Identity, ServiceError> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(ServiceError::Validation(vec!["display_name"]));
        }
        let user = self.auth_user().await?;
        let updated = self.auth.update_display_name(&user, display_name).await?;
        let mut profile = self.profile_of(&updated).await?;
        profile.display_name = display_name.to_string();
        self.store.put_user(&profile).await?;
        self.establish(updated, Identity::from_profile(&profile)).await;
        self.require().map_err(Into::into)
    }

    pub async fn update_email(&self, email: &str) -> Result<Identity, ServiceError> {
        let user = self.auth_user().await?;
        let updated = self.auth.update_email(&user, email.trim()).await?;
        let mut profile = self.profile_of(&updated).await?;
        profile.email = updated.email.clone();
        self.store.put_user(&profile).await?;
        self.establish(updated, Identity::from_profile(&profile)).await;
        self.require().map_err(Into::into)
    }

    pub async fn update_password(&self, password: &str) -> Result<(), ServiceError> {
        let user = self.auth_user().await?;
        self.auth.update_password(&user, password).await?;
        Ok(())
    }

    /// Turn the signed-in client into an agent with a one-time code
    pub async fn redeem_activation_code(&self, code: &str) -> Result<Identity, ServiceError> {
        let identity = self.require()?;
        let code = code.trim();
        if code.is_empty() {
            return Err(ServiceError::Validation(vec!["activation_code"]));
        }
        match self.store.redeem_activation_code(code, &identity.uid).await {
            Ok(()) => {
                info!("🔑 {} redeemed an activation code", identity.email);
                self.refresh().await
            }
            Err(StoreError::NotFound(_) | StoreError::Conflict(_)) => {
                Err(ServiceError::InvalidActivationCode)
            }
            Err(e) => {
                warn!("Activation code redemption failed: {}", e);
                Err(e.into())
            }
        }
    }

    /// Re-read the profile (role changes are made elsewhere) and republish
    pub async fn refresh(&self) -> Result<Identity, ServiceError> {
        let user = self.auth_user().await?;
        let profile = self.profile_of(&user).await?;
        let identity = Identity::from_profile(&profile);
        self.state.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn auth_user(&self) -> Result<AuthUser, AuthError> {
        self.user.lock().await.clone().ok_or(AuthError::NotSignedIn)
    }

    async fn profile_of(&self, user: &AuthUser) -> Result<UserProfile, ServiceError> {
        self.store
            .user(&user.uid)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("users/{}", user.uid)))
    }

    // Accounts created outside the app (federated, console) get a client profile.
    async fn load_profile(&self, user: AuthUser) -> Result<Identity, ServiceError> {
        let profile = match self.store.user(&user.uid).await? {
            Some(profile) => profile,
            None => {
                let profile = UserProfile {
                    uid: user.uid.clone(),
                    email: user.email.clone(),
                    display_name: user.display_name.clone(),
                    phone: String::new(),
                    role: Role::Client,
                    created_at: Some(Utc::now()),
                };
                self.store.put_user(&profile).await?;
                profile
            }
        };
        let identity = Identity::from_profile(&profile);
        info!("🔓 Signed in {} as {:?}", identity.email, identity.role);
        self.establish(user, identity.clone()).await;
        Ok(identity)
    }

    async fn establish(&self, user: AuthUser, identity: Identity) {
        *self.user.lock().await = Some(user);
        self.state.send_replace(Some(identity));
    }
}
