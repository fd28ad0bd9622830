use thiserror::Error;

/// Failures talking to the document / object store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found: {0}")]
    NotFound(String),

    /// A precondition on the write no longer holds (slot gone, version moved)
    #[error("conflicting write: {0}")]
    Conflict(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("store error: {0}")]
    Backend(String),
}

/// The closed set of auth failures shown to users
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("email already registered")]
    EmailAlreadyRegistered,

    #[error("invalid email")]
    InvalidEmail,

    #[error("account not found")]
    AccountNotFound,

    #[error("wrong password")]
    WrongPassword,

    #[error("weak password")]
    WeakPassword,

    #[error("not signed in")]
    NotSignedIn,

    #[error("unexpected auth error: {0}")]
    Unexpected(String),
}

impl AuthError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::EmailAlreadyRegistered => "Este correo ya está registrado.",
            AuthError::InvalidEmail => "El correo electrónico no es válido.",
            AuthError::AccountNotFound => "No existe una cuenta con este correo.",
            AuthError::WrongPassword => "Contraseña incorrecta.",
            AuthError::WeakPassword => "La contraseña debe tener al menos 6 caracteres.",
            AuthError::NotSignedIn => "Debes iniciar sesión para continuar.",
            AuthError::Unexpected(_) => "Ocurrió un error inesperado. Inténtalo de nuevo.",
        }
    }
}

/// Outcome of a failed visit booking
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("booking requires a signed-in client")]
    NotAuthenticated,

    #[error("no visit slot selected")]
    NoSlotSelected,

    #[error("visit slot is no longer offered")]
    SlotUnavailable,

    #[error("booking failed: {0}")]
    BookingFailed(#[source] StoreError),
}

impl BookingError {
    /// Only collaborator failures are worth another try; the slot being gone is final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BookingError::BookingFailed(_))
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            BookingError::NotAuthenticated => "Inicia sesión para agendar una visita.",
            BookingError::NoSlotSelected => "Selecciona un horario de visita.",
            BookingError::SlotUnavailable => "Ese horario ya no está disponible.",
            BookingError::BookingFailed(_) => "No se pudo agendar la visita. Inténtalo de nuevo.",
        }
    }
}

/// Errors from the dashboard services
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Required form fields that were left empty
    #[error("missing required fields: {}", .0.join(", "))]
    Validation(Vec<&'static str>),

    #[error("not allowed: {0}")]
    Forbidden(&'static str),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("confirmation does not match {0}")]
    ConfirmationMismatch(String),

    #[error("activation code is invalid or already used")]
    InvalidActivationCode,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::Validation(fields) => {
                format!("Completa los campos obligatorios: {}.", fields.join(", "))
            }
            ServiceError::Forbidden(_) => "No tienes permiso para esta acción.".to_string(),
            ServiceError::NotFound(_) => "El elemento ya no existe.".to_string(),
            ServiceError::ConfirmationMismatch(_) => "Confirma la acción para continuar.".to_string(),
            ServiceError::InvalidActivationCode => {
                "El código de activación no es válido o ya fue usado.".to_string()
            }
            ServiceError::Auth(e) => e.user_message().to_string(),
            ServiceError::Store(_) => "No se pudo completar la operación. Inténtalo de nuevo.".to_string(),
        }
    }
}

/// Geocoder failures
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("geocoder returned {0}")]
    Status(u16),
}

/// Invalid environment configuration
#[derive(Debug, Error)]
#[error("invalid value for {key}: {value}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
}
