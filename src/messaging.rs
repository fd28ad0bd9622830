//! WhatsApp deep links for "contact the agent" buttons.

use crate::models::{Listing, UserProfile};
use reqwest::Url;

/// `https://wa.me/{digits}?text={message}`.
///
/// Only ASCII digits of `phone` are kept. Local 8- or 9-digit numbers get
/// `default_prefix` (the country code) in front.
pub fn whatsapp_link(phone: &str, message: &str, default_prefix: &str) -> String {
    let mut digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    let has_plus = phone.trim_start().starts_with('+');
    if !has_plus && matches!(digits.len(), 8 | 9) {
        digits.insert_str(0, default_prefix);
    }

    let mut url = match Url::parse(&format!("https://wa.me/{digits}")) {
        Ok(url) => url,
        // digits only, so this can't really happen
        Err(_) => return format!("https://wa.me/{digits}"),
    };
    if !message.is_empty() {
        url.query_pairs_mut().append_pair("text", message);
    }
    url.to_string()
}

/// Prefilled message asking about a listing
pub fn listing_message(listing: &Listing, public_url: &str) -> String {
    let mut message = format!(
        "Hola {}, me interesa la propiedad \"{}\" ({}).",
        listing.agent_name.trim(),
        listing.title.trim(),
        listing.display_price()
    );
    if !public_url.is_empty() && !listing.id.is_empty() {
        message.push_str(&format!(
            " {}/propiedad/{}",
            public_url.trim_end_matches('/'),
            listing.id
        ));
    }
    message
}

/// "Contact the agent" link for `listing`, or `None` when the agent's
/// profile has no phone number to reach
pub fn contact_link(
    agent: &UserProfile,
    listing: &Listing,
    public_url: &str,
    default_prefix: &str,
) -> Option<String> {
    if !agent.phone.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    let message = listing_message(listing, public_url);
    Some(whatsapp_link(&agent.phone, &message, default_prefix))
}
