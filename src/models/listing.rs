use super::lenient;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// The two currencies a listing can be priced in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Currency {
    #[default]
    Usd,
    Pen,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Pen => "PEN",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Pen => "S/",
        }
    }

    /// Parse a currency tag; `None` for anything that isn't one of ours.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "USD" | "$" | "US$" | "$US" | "DOLARES" | "DÓLARES" => Some(Currency::Usd),
            "PEN" | "S/" | "S/." | "SOLES" => Some(Currency::Pen),
            _ => None,
        }
    }
}

// Unknown tags fall back to dollars, the form's default.
impl From<String> for Currency {
    fn from(raw: String) -> Self {
        Currency::parse(&raw).unwrap_or_default()
    }
}

impl From<Currency> for String {
    fn from(c: Currency) -> Self {
        c.code().to_string()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Transaction type of a listing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operation {
    Sale,
    Rental,
    Anticresis,
    /// Anything else the form wrote, lowercased
    Other(String),
}

impl Operation {
    pub fn as_str(&self) -> &str {
        match self {
            Operation::Sale => "venta",
            Operation::Rental => "alquiler",
            Operation::Anticresis => "anticretico",
            Operation::Other(raw) => raw,
        }
    }
}

impl From<String> for Operation {
    fn from(raw: String) -> Self {
        let lower = raw.trim().to_lowercase();
        match lower.as_str() {
            "venta" | "sale" => Operation::Sale,
            "alquiler" | "rent" | "rental" => Operation::Rental,
            "anticretico" | "anticrético" | "anticresis" => Operation::Anticresis,
            _ => Operation::Other(lower),
        }
    }
}

impl From<&str> for Operation {
    fn from(raw: &str) -> Self {
        Operation::from(raw.to_string())
    }
}

impl From<Operation> for String {
    fn from(o: Operation) -> Self {
        o.as_str().to_string()
    }
}

/// Availability status of a listing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Availability {
    Available,
    Unavailable,
    Draft,
    Other(String),
}

impl Availability {
    pub fn as_str(&self) -> &str {
        match self {
            Availability::Available => "disponible",
            Availability::Unavailable => "tomada",
            Availability::Draft => "borrador",
            Availability::Other(raw) => raw,
        }
    }
}

impl From<String> for Availability {
    fn from(raw: String) -> Self {
        let lower = raw.trim().to_lowercase();
        match lower.as_str() {
            "disponible" | "available" => Availability::Available,
            "tomada" | "tomado" | "no disponible" | "unavailable" => Availability::Unavailable,
            "borrador" | "draft" => Availability::Draft,
            _ => Availability::Other(lower),
        }
    }
}

impl From<&str> for Availability {
    fn from(raw: &str) -> Self {
        Availability::from(raw.to_string())
    }
}

impl From<Availability> for String {
    fn from(a: Availability) -> Self {
        a.as_str().to_string()
    }
}

/// Age classification of the building
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Antiquity {
    New,
    PreSale,
    /// Age brackets such as "1-5 años", kept verbatim
    Bracket(String),
}

impl From<String> for Antiquity {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "estreno" | "nuevo" | "new" => Antiquity::New,
            "preventa" | "pre-venta" | "en planos" | "presale" | "pre-sale" => Antiquity::PreSale,
            _ => Antiquity::Bracket(raw.trim().to_string()),
        }
    }
}

impl From<Antiquity> for String {
    fn from(a: Antiquity) -> Self {
        match a {
            Antiquity::New => "estreno".to_string(),
            Antiquity::PreSale => "preventa".to_string(),
            Antiquity::Bracket(raw) => raw,
        }
    }
}

/// A date/time offered by the owning agent for an in-person viewing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisitSlot {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(deserialize_with = "lenient::text")]
    pub date: String,
    #[serde(deserialize_with = "lenient::text")]
    pub time: String,
}

fn currency_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<Currency, D::Error> {
    let parsed: Option<Currency> = lenient::parsed(d)?;
    Ok(parsed.unwrap_or_default())
}

/// A property listing as stored in the `properties` collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Listing {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(deserialize_with = "lenient::text")]
    pub description: String,
    #[serde(
        rename = "operationType",
        alias = "operation",
        deserialize_with = "lenient::parsed",
        skip_serializing_if = "Option::is_none"
    )]
    pub operation: Option<Operation>,
    #[serde(deserialize_with = "lenient::number")]
    pub price: f64,
    #[serde(deserialize_with = "currency_or_default")]
    pub currency: Currency,
    #[serde(alias = "propertyType", deserialize_with = "lenient::text")]
    pub category: String,
    #[serde(deserialize_with = "lenient::text")]
    pub location: String,
    #[serde(deserialize_with = "lenient::text")]
    pub address: String,
    /// Floor area in square metres
    #[serde(deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_count", skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u32>,
    #[serde(deserialize_with = "lenient::opt_count", skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<u32>,
    #[serde(deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    #[serde(deserialize_with = "lenient::opt_bool", skip_serializing_if = "Option::is_none")]
    pub elevator: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_bool", skip_serializing_if = "Option::is_none")]
    pub parking: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_bool", skip_serializing_if = "Option::is_none")]
    pub duplex: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_bool", skip_serializing_if = "Option::is_none")]
    pub furnished: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_bool", skip_serializing_if = "Option::is_none")]
    pub pool: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_bool", skip_serializing_if = "Option::is_none")]
    pub gym: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_bool", skip_serializing_if = "Option::is_none")]
    pub security: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_bool", skip_serializing_if = "Option::is_none")]
    pub mortgage_eligible: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_bool", skip_serializing_if = "Option::is_none")]
    pub exclusive: Option<bool>,
    #[serde(deserialize_with = "lenient::parsed", skip_serializing_if = "Option::is_none")]
    pub antiquity: Option<Antiquity>,
    #[serde(deserialize_with = "lenient::parsed", skip_serializing_if = "Option::is_none")]
    pub status: Option<Availability>,
    #[serde(deserialize_with = "lenient::list")]
    pub images: Vec<String>,
    #[serde(deserialize_with = "lenient::opt_timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient::text")]
    pub agent_id: String,
    #[serde(deserialize_with = "lenient::text")]
    pub agent_name: String,
    #[serde(deserialize_with = "lenient::counter")]
    pub views: u64,
    #[serde(deserialize_with = "lenient::flag")]
    pub is_promoted: bool,
    #[serde(alias = "availableSlots", deserialize_with = "lenient::list")]
    pub visit_slots: Vec<VisitSlot>,
    #[serde(deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl Listing {
    pub fn is_available(&self) -> bool {
        matches!(self.status, Some(Availability::Available))
    }

    pub fn is_land(&self) -> bool {
        matches!(
            self.category.trim().to_lowercase().as_str(),
            "terreno" | "lote" | "land"
        )
    }

    pub fn bedrooms_or_zero(&self) -> u32 {
        self.bedrooms.unwrap_or(0)
    }

    pub fn bathrooms_or_zero(&self) -> u32 {
        self.bathrooms.unwrap_or(0)
    }

    pub fn slot(&self, slot_id: &str) -> Option<&VisitSlot> {
        self.visit_slots.iter().find(|s| s.id == slot_id)
    }

    /// Price formatted for display, e.g. `$ 120,000`
    pub fn display_price(&self) -> String {
        let whole = self.price.round() as i64;
        let digits = whole.abs().to_string();
        let mut grouped = String::new();
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        let sign = if whole < 0 { "-" } else { "" };
        format!("{} {}{}", self.currency.symbol(), sign, grouped)
    }
}

/// Partial update of a listing; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "operationType", skip_serializing_if = "Option::is_none")]
    pub operation: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevator: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parking: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplex: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub furnished: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gym: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mortgage_eligible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub antiquity: Option<Antiquity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Availability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_promoted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visit_slots: Option<Vec<VisitSlot>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl ListingPatch {
    pub fn status(status: Availability) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn promoted(flag: bool) -> Self {
        Self {
            is_promoted: Some(flag),
            ..Self::default()
        }
    }

    pub fn slots(slots: Vec<VisitSlot>) -> Self {
        Self {
            visit_slots: Some(slots),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, listing: &mut Listing) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *target = v.clone();
            }
        }
        fn set_opt<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                *target = value.clone();
            }
        }

        set(&mut listing.title, &self.title);
        set(&mut listing.description, &self.description);
        set_opt(&mut listing.operation, &self.operation);
        set(&mut listing.price, &self.price);
        set(&mut listing.currency, &self.currency);
        set(&mut listing.category, &self.category);
        set(&mut listing.location, &self.location);
        set(&mut listing.address, &self.address);
        set_opt(&mut listing.area, &self.area);
        set_opt(&mut listing.bedrooms, &self.bedrooms);
        set_opt(&mut listing.bathrooms, &self.bathrooms);
        set_opt(&mut listing.floor, &self.floor);
        set_opt(&mut listing.elevator, &self.elevator);
        set_opt(&mut listing.parking, &self.parking);
        set_opt(&mut listing.duplex, &self.duplex);
        set_opt(&mut listing.furnished, &self.furnished);
        set_opt(&mut listing.pool, &self.pool);
        set_opt(&mut listing.gym, &self.gym);
        set_opt(&mut listing.security, &self.security);
        set_opt(&mut listing.mortgage_eligible, &self.mortgage_eligible);
        set_opt(&mut listing.exclusive, &self.exclusive);
        set_opt(&mut listing.antiquity, &self.antiquity);
        set_opt(&mut listing.status, &self.status);
        set(&mut listing.images, &self.images);
        set(&mut listing.is_promoted, &self.is_promoted);
        set(&mut listing.visit_slots, &self.visit_slots);
        set_opt(&mut listing.latitude, &self.latitude);
        set_opt(&mut listing.longitude, &self.longitude);
    }
}
