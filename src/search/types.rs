use crate::models::{Currency, Operation};
use reqwest::Url;

/// Property-type tag chosen in the search form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyType {
    Apartment,
    House,
    Land,
    Office,
    Commercial,
    /// Tags we have no keyword mapping for; these match everything
    Unknown(String),
}

impl PropertyType {
    pub fn parse(raw: &str) -> Self {
        let lower = raw.trim().to_lowercase();
        match lower.as_str() {
            "departamento" | "depto" | "dpto" | "apartment" => PropertyType::Apartment,
            "casa" | "house" => PropertyType::House,
            "terreno" | "lote" | "land" => PropertyType::Land,
            "oficina" | "office" => PropertyType::Office,
            "local" | "local comercial" | "commercial" => PropertyType::Commercial,
            _ => PropertyType::Unknown(lower),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PropertyType::Apartment => "departamento",
            PropertyType::House => "casa",
            PropertyType::Land => "terreno",
            PropertyType::Office => "oficina",
            PropertyType::Commercial => "local",
            PropertyType::Unknown(raw) => raw,
        }
    }

    /// Lowercase keywords looked for in a listing's title, category and location
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            PropertyType::Apartment => &["departamento", "depto", "dpto", "apartment", "apt"],
            PropertyType::House => &["casa", "house"],
            PropertyType::Land => &["terreno", "lote", "land"],
            PropertyType::Office => &["oficina", "office"],
            PropertyType::Commercial => &["local comercial", "local", "commercial"],
            PropertyType::Unknown(_) => &[],
        }
    }
}

/// Result ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
}

impl SortKey {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "recientes" | "reciente" | "newest" => Some(SortKey::Newest),
            "precio_asc" | "price_asc" | "price-asc" => Some(SortKey::PriceAsc),
            "precio_desc" | "price_desc" | "price-desc" => Some(SortKey::PriceDesc),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Newest => "recientes",
            SortKey::PriceAsc => "precio_asc",
            SortKey::PriceDesc => "precio_desc",
        }
    }
}

/// Search form state. Every `None` / `false` field means "no constraint".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub operation: Option<Operation>,
    pub location: Option<String>,
    pub property_type: Option<PropertyType>,
    /// Currency the price bounds are expressed in
    pub currency: Currency,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub min_bedrooms: Option<u32>,
    pub min_bathrooms: Option<u32>,
    pub floor: Option<String>,
    pub parking: bool,
    pub duplex: bool,
    pub sort: SortKey,
}

fn non_empty(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn truthy(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "true" | "1" | "si" | "sí" | "on")
}

impl FilterCriteria {
    /// Build criteria from a URL query string (`?operacion=venta&dormitorios=2`).
    ///
    /// Unknown keys, empty values and numbers that don't parse are ignored, so
    /// a hand-edited URL never fails, it just constrains less.
    pub fn from_query(query: &str) -> Self {
        let mut criteria = Self::default();
        let query = query.trim().trim_start_matches('?');
        let url = match Url::parse(&format!("http://localhost/?{query}")) {
            Ok(url) => url,
            Err(_) => return criteria,
        };

        for (key, value) in url.query_pairs() {
            let Some(value) = non_empty(&value) else {
                continue;
            };
            match &*key {
                "operacion" | "operation" => criteria.operation = Some(Operation::from(value)),
                "ubicacion" | "location" | "q" => criteria.location = Some(value.to_string()),
                "tipo" | "type" => criteria.property_type = Some(PropertyType::parse(value)),
                "moneda" | "currency" => {
                    if let Some(currency) = Currency::parse(value) {
                        criteria.currency = currency;
                    }
                }
                "precioMin" | "priceMin" => criteria.price_min = parse_amount(value),
                "precioMax" | "priceMax" => criteria.price_max = parse_amount(value),
                "dormitorios" | "bedrooms" => criteria.min_bedrooms = value.parse().ok(),
                "banos" | "baños" | "bathrooms" => criteria.min_bathrooms = value.parse().ok(),
                "piso" | "floor" => criteria.floor = Some(value.to_string()),
                "cochera" | "parking" => criteria.parking = truthy(value),
                "duplex" => criteria.duplex = truthy(value),
                "orden" | "sort" => {
                    if let Some(sort) = SortKey::parse(value) {
                        criteria.sort = sort;
                    }
                }
                _ => {}
            }
        }

        criteria
    }

    /// Canonical query string for these criteria, without the leading `?`.
    pub fn to_query(&self) -> String {
        let mut url = Url::parse("http://localhost/").expect("static URL parses");
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(op) = &self.operation {
                pairs.append_pair("operacion", op.as_str());
            }
            if let Some(location) = &self.location {
                pairs.append_pair("ubicacion", location);
            }
            if let Some(kind) = &self.property_type {
                pairs.append_pair("tipo", kind.as_str());
            }
            if self.price_min.is_some() || self.price_max.is_some() {
                pairs.append_pair("moneda", self.currency.code());
            }
            if let Some(min) = self.price_min {
                pairs.append_pair("precioMin", &min.to_string());
            }
            if let Some(max) = self.price_max {
                pairs.append_pair("precioMax", &max.to_string());
            }
            if let Some(n) = self.min_bedrooms {
                pairs.append_pair("dormitorios", &n.to_string());
            }
            if let Some(n) = self.min_bathrooms {
                pairs.append_pair("banos", &n.to_string());
            }
            if let Some(floor) = &self.floor {
                pairs.append_pair("piso", floor);
            }
            if self.parking {
                pairs.append_pair("cochera", "true");
            }
            if self.duplex {
                pairs.append_pair("duplex", "true");
            }
            if self.sort != SortKey::Newest {
                pairs.append_pair("orden", self.sort.as_str());
            }
        }
        url.query().unwrap_or_default().to_string()
    }

    /// Number of active constraints, shown as a badge on the filter button
    pub fn active_count(&self) -> usize {
        [
            self.operation.is_some(),
            self.location.is_some(),
            self.property_type.is_some(),
            self.price_min.is_some() || self.price_max.is_some(),
            self.min_bedrooms.is_some(),
            self.min_bathrooms.is_some(),
            self.floor.is_some(),
            self.parking,
            self.duplex,
        ]
        .iter()
        .filter(|active| **active)
        .count()
    }
}

// Accepts "120000", "120,000" and "120 000".
fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite() && *n >= 0.0)
}
