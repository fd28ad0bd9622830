use super::currency::convert;
use super::types::{FilterCriteria, PropertyType, SortKey};
use crate::models::{Currency, Listing};

// Slack for bounds that sit exactly on a converted price (380000 PEN vs 100000 USD).
const PRICE_EPSILON: f64 = 1e-6;

/// Narrow `listings` down to the ones matching `criteria`, then order them.
///
/// Pure and infallible: missing fields on a listing are read as zero / empty,
/// missing criteria are no constraint. Promoted listings always come first,
/// each group keeping the order given by `criteria.sort`.
pub fn filter_listings(listings: &[Listing], criteria: &FilterCriteria) -> Vec<Listing> {
    let matched: Vec<Listing> = listings
        .iter()
        .filter(|l| matches(l, criteria))
        .cloned()
        .collect();

    promoted_first(sort_listings(matched, criteria.sort))
}

/// True when a single listing passes every active constraint, availability included
pub fn matches(listing: &Listing, criteria: &FilterCriteria) -> bool {
    matches_operation(listing, criteria)
        && matches_location(listing, criteria)
        && matches_property_type(listing, criteria)
        && matches_price(listing, criteria)
        && matches_rooms(listing, criteria)
        && matches_features(listing, criteria)
        && matches_floor(listing, criteria)
        && listing.is_available()
}

fn matches_operation(listing: &Listing, criteria: &FilterCriteria) -> bool {
    match &criteria.operation {
        None => true,
        Some(wanted) => listing.operation.as_ref() == Some(wanted),
    }
}

fn matches_location(listing: &Listing, criteria: &FilterCriteria) -> bool {
    let needle = match criteria.location.as_deref().map(str::trim) {
        Some(n) if !n.is_empty() => n.to_lowercase(),
        _ => return true,
    };
    [&listing.location, &listing.address, &listing.title]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

fn matches_property_type(listing: &Listing, criteria: &FilterCriteria) -> bool {
    let kind = match &criteria.property_type {
        None | Some(PropertyType::Unknown(_)) => return true,
        Some(kind) => kind,
    };
    if *kind == PropertyType::Land && listing.is_land() {
        return true;
    }
    let haystack = format!(
        "{} {} {}",
        listing.title, listing.category, listing.location
    )
    .to_lowercase();
    kind.keywords().iter().any(|kw| haystack.contains(kw))
}

fn matches_price(listing: &Listing, criteria: &FilterCriteria) -> bool {
    if criteria.price_min.is_none() && criteria.price_max.is_none() {
        return true;
    }
    let price = convert(listing.price, listing.currency, criteria.currency);
    let min = criteria.price_min.unwrap_or(0.0);
    let max = criteria.price_max.unwrap_or(f64::INFINITY);
    price >= min - PRICE_EPSILON && price <= max + PRICE_EPSILON
}

fn matches_rooms(listing: &Listing, criteria: &FilterCriteria) -> bool {
    criteria
        .min_bedrooms
        .map_or(true, |min| listing.bedrooms_or_zero() >= min)
        && criteria
            .min_bathrooms
            .map_or(true, |min| listing.bathrooms_or_zero() >= min)
}

fn matches_features(listing: &Listing, criteria: &FilterCriteria) -> bool {
    (!criteria.parking || listing.parking == Some(true))
        && (!criteria.duplex || listing.duplex == Some(true))
}

fn matches_floor(listing: &Listing, criteria: &FilterCriteria) -> bool {
    let wanted = match criteria.floor.as_deref().map(str::trim) {
        Some(f) if !f.is_empty() => f,
        _ => return true,
    };
    listing
        .floor
        .as_deref()
        .is_some_and(|floor| floor.trim().eq_ignore_ascii_case(wanted))
}

/// Stable sort by `key`.
///
/// Prices are compared in dollars so that mixed-currency results order by
/// actual value rather than by the raw number.
pub fn sort_listings(mut listings: Vec<Listing>, key: SortKey) -> Vec<Listing> {
    let usd = |l: &Listing| convert(l.price, l.currency, Currency::Usd);
    match key {
        // None sorts below any timestamp, so it ends up last when reversed.
        SortKey::Newest => listings.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortKey::PriceAsc => listings.sort_by(|a, b| usd(a).total_cmp(&usd(b))),
        SortKey::PriceDesc => listings.sort_by(|a, b| usd(b).total_cmp(&usd(a))),
    }
    listings
}

/// Move promoted listings ahead of the rest without reordering either group.
pub fn promoted_first(listings: Vec<Listing>) -> Vec<Listing> {
    let (mut promoted, rest): (Vec<_>, Vec<_>) =
        listings.into_iter().partition(|l| l.is_promoted);
    promoted.extend(rest);
    promoted
}

