use crate::models::{Role, UserProfile};
use serde::{Deserialize, Serialize};

pub(crate) const MIN_PASSWORD_LEN: usize = 6;

/// `local@domain.tld` shape check, no whitespace
pub(crate) fn valid_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// Account as the auth provider sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    /// Bearer token for follow-up account calls
    pub id_token: String,
}

/// Signed-in identity exposed to the rest of the app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    pub phone: String,
    pub role: Role,
}

impl Identity {
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            uid: profile.uid.clone(),
            email: profile.email.clone(),
            display_name: profile.display_name.clone(),
            phone: profile.phone.clone(),
            role: profile.role,
        }
    }

    pub fn is_superadmin(&self) -> bool {
        self.role == Role::Superadmin
    }
}

/// Registration form
#[derive(Debug, Clone, Default)]
pub struct SignUp {
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub phone: String,
    /// `Client` or `Agent`; agents must bring an activation code
    pub role: Role,
    pub activation_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape_check() {
        assert!(valid_email("ana@correo.pe"));
        assert!(!valid_email("ana@correo"));
        assert!(!valid_email("@correo.pe"));
        assert!(!valid_email("ana perez@correo.pe"));
    }
}
