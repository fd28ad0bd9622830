pub mod admin;
pub mod booking;
pub mod inquiries;
pub mod listings;
pub mod tips;

pub use admin::AdminService;
pub use booking::BookingService;
pub use inquiries::{InquiryForm, InquiryService};
pub use listings::{ImageUpload, ListingDraft, ListingService};
pub use tips::{TipDraft, TipService};

use crate::error::ServiceError;

/// Proof that the user confirmed a destructive action on one specific target.
///
/// Issued by the confirmation dialog and checked by every delete, so a stale
/// dialog can't delete something else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    target: String,
}

impl Confirmation {
    pub fn for_target(id: impl Into<String>) -> Self {
        Self { target: id.into() }
    }

    pub(crate) fn check(&self, id: &str) -> Result<(), ServiceError> {
        if self.target == id {
            Ok(())
        } else {
            Err(ServiceError::ConfirmationMismatch(id.to_string()))
        }
    }
}

// "Casa en La Molina.JPG" -> "casa_en_la_molina.jpg"
pub(crate) fn storage_name(file_name: &str) -> String {
    let cleaned: String = file_name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "imagen".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_names_are_path_safe() {
        assert_eq!(storage_name("Casa en La Molina.JPG"), "casa_en_la_molina.jpg");
        assert_eq!(storage_name("../x/y.png"), ".._x_y.png");
        assert_eq!(storage_name("  "), "imagen");
    }

    #[test]
    fn confirmation_is_bound_to_its_target() {
        let confirm = Confirmation::for_target("p1");
        assert!(confirm.check("p1").is_ok());
        assert!(matches!(
            confirm.check("p2"),
            Err(ServiceError::ConfirmationMismatch(_))
        ));
    }
}
