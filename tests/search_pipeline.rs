mod common;

use common::{ids, listing, sample_listings};
use inmo_market::models::{Currency, Operation};
use inmo_market::search::{filter_listings, FilterCriteria, PropertyType, SortKey, EXCHANGE_RATE};
use serde_json::json;

fn search(query: &str) -> Vec<String> {
    let results = filter_listings(&sample_listings(), &FilterCriteria::from_query(query));
    ids(&results).into_iter().map(String::from).collect()
}

// ---------------------------------------------------------------------------
// Defaults and availability
// ---------------------------------------------------------------------------

#[test]
fn test_no_criteria_returns_every_available_listing() {
    assert_eq!(
        search(""),
        vec!["surco-casa", "barranco-alquiler", "miraflores-depto", "lurin-terreno"]
    );
}

#[test]
fn test_taken_listing_never_appears_even_when_everything_else_matches() {
    assert!(search("operacion=anticretico").is_empty());
    assert!(search("ubicacion=San%20Isidro&tipo=oficina").is_empty());
}

#[test]
fn test_drafts_are_hidden_from_search() {
    assert!(!search("ubicacion=Jes%C3%BAs").contains(&"jesusmaria-borrador".to_string()));
}

#[test]
fn test_listing_without_status_is_not_shown() {
    let listings = vec![listing(json!({ "id": "no-status", "title": "Casa", "price": 1 }))];
    assert!(filter_listings(&listings, &FilterCriteria::default()).is_empty());
}

// ---------------------------------------------------------------------------
// Price bounds across currencies
// ---------------------------------------------------------------------------

fn two_currency_listings() -> Vec<inmo_market::Listing> {
    vec![
        listing(json!({
            "id": "usd", "price": 100000, "currency": "USD", "bedrooms": 2, "status": "disponible"
        })),
        listing(json!({
            "id": "pen", "price": 380000, "currency": "PEN", "bedrooms": 3, "status": "disponible"
        })),
    ]
}

#[test]
fn test_exchange_rate_is_pinned() {
    assert_eq!(EXCHANGE_RATE, 3.80);
}

#[test]
fn test_price_bound_exactly_on_converted_price_is_inclusive() {
    let criteria = FilterCriteria {
        currency: Currency::Usd,
        price_min: Some(90000.0),
        price_max: Some(150000.0),
        ..Default::default()
    };
    let results = filter_listings(&two_currency_listings(), &criteria);
    assert_eq!(ids(&results), vec!["usd", "pen"]);

    let tight = FilterCriteria {
        price_max: Some(100000.0),
        ..criteria
    };
    assert_eq!(filter_listings(&two_currency_listings(), &tight).len(), 2);
}

#[test]
fn test_same_bounds_in_soles_give_the_same_result() {
    let in_dollars = FilterCriteria {
        currency: Currency::Usd,
        price_min: Some(50000.0),
        price_max: Some(200000.0),
        ..Default::default()
    };
    let in_soles = FilterCriteria {
        currency: Currency::Pen,
        price_min: Some(50000.0 * EXCHANGE_RATE),
        price_max: Some(200000.0 * EXCHANGE_RATE),
        ..Default::default()
    };
    let listings = sample_listings();
    let dollars = filter_listings(&listings, &in_dollars);
    assert_eq!(ids(&dollars), vec!["miraflores-depto", "lurin-terreno"]);
    assert_eq!(dollars, filter_listings(&listings, &in_soles));
}

#[test]
fn test_price_filter_converts_listing_currency() {
    // 1,140,000 PEN is 300,000 USD
    assert_eq!(search("moneda=USD&precioMin=250000"), vec!["surco-casa"]);
    assert_eq!(search("moneda=PEN&precioMax=5000"), vec!["barranco-alquiler"]);
}

#[test]
fn test_only_one_bound_leaves_the_other_open() {
    assert_eq!(
        search("precioMax=70000"),
        vec!["barranco-alquiler", "lurin-terreno"]
    );
}

// ---------------------------------------------------------------------------
// Rooms, features, floor, location, operation
// ---------------------------------------------------------------------------

#[test]
fn test_missing_bedrooms_count_as_zero() {
    let listings = vec![listing(json!({ "id": "studio", "status": "disponible" }))];

    let one = FilterCriteria::from_query("dormitorios=1");
    assert!(filter_listings(&listings, &one).is_empty());

    let blank = FilterCriteria::from_query("dormitorios=");
    assert_eq!(filter_listings(&listings, &blank).len(), 1);
}

#[test]
fn test_minimum_rooms_are_inclusive() {
    assert_eq!(
        search("dormitorios=3&banos=2"),
        vec!["surco-casa", "miraflores-depto"]
    );
}

#[test]
fn test_parking_and_duplex_require_the_feature() {
    assert_eq!(search("cochera=true"), vec!["surco-casa", "miraflores-depto"]);
    assert_eq!(search("cochera=true&duplex=si"), vec!["surco-casa"]);
}

#[test]
fn test_floor_matches_exactly() {
    assert_eq!(search("piso=8"), vec!["miraflores-depto"]);
    assert!(search("piso=3").is_empty());
}

#[test]
fn test_location_is_a_case_insensitive_substring() {
    assert_eq!(
        search("ubicacion=LIMA"),
        vec!["surco-casa", "barranco-alquiler", "miraflores-depto"]
    );
    // address counts too
    assert_eq!(search("ubicacion=malec%C3%B3n"), vec!["miraflores-depto"]);
}

#[test]
fn test_operation_filter() {
    assert_eq!(search("operacion=alquiler"), vec!["barranco-alquiler"]);
    assert_eq!(
        search("operation=sale"),
        vec!["surco-casa", "miraflores-depto", "lurin-terreno"]
    );
}

// ---------------------------------------------------------------------------
// Property types
// ---------------------------------------------------------------------------

#[test]
fn test_property_type_keywords() {
    assert_eq!(search("tipo=terreno"), vec!["lurin-terreno"]);
    assert_eq!(search("tipo=casa"), vec!["surco-casa"]);
    assert_eq!(
        search("tipo=departamento"),
        vec!["barranco-alquiler", "miraflores-depto"]
    );
}

#[test]
fn test_apartment_tag_matches_apt_abbreviation() {
    let listings = vec![
        listing(json!({ "id": "apt", "title": "Apt. en Miraflores", "status": "disponible" })),
        listing(json!({ "id": "shop", "title": "Tienda en Gamarra", "status": "disponible" })),
    ];
    let apartments = FilterCriteria::from_query("tipo=dpto");
    assert_eq!(ids(&filter_listings(&listings, &apartments)), vec!["apt"]);

    let commercial = FilterCriteria::from_query("tipo=local");
    assert!(filter_listings(&listings, &commercial).is_empty());
}

#[test]
fn test_unknown_property_type_does_not_constrain() {
    assert_eq!(
        FilterCriteria::from_query("tipo=castillo").property_type,
        Some(PropertyType::Unknown("castillo".to_string()))
    );
    assert_eq!(search("tipo=castillo"), search(""));
}

#[test]
fn test_land_category_matches_without_keyword_in_title() {
    let listings = vec![listing(json!({
        "id": "plot", "title": "Gran oportunidad", "category": "Lote", "status": "disponible"
    }))];
    let criteria = FilterCriteria {
        property_type: Some(PropertyType::Land),
        ..Default::default()
    };
    assert_eq!(filter_listings(&listings, &criteria).len(), 1);
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

#[test]
fn test_price_sort_compares_in_dollars() {
    assert_eq!(
        search("orden=precio_asc"),
        vec!["surco-casa", "barranco-alquiler", "lurin-terreno", "miraflores-depto"]
    );
    assert_eq!(
        search("orden=precio_desc"),
        vec!["surco-casa", "miraflores-depto", "lurin-terreno", "barranco-alquiler"]
    );
}

#[test]
fn test_mixed_currency_sort_uses_value_not_raw_number() {
    let listings = vec![
        listing(json!({ "id": "dollars", "price": 100000, "currency": "USD", "status": "disponible" })),
        listing(json!({ "id": "soles", "price": 200000, "currency": "PEN", "status": "disponible" })),
    ];
    let criteria = FilterCriteria {
        sort: SortKey::PriceAsc,
        ..Default::default()
    };
    assert_eq!(ids(&filter_listings(&listings, &criteria)), vec!["soles", "dollars"]);
}

#[test]
fn test_promoted_listing_comes_first_even_when_older() {
    let listings = vec![
        listing(json!({
            "id": "plain", "title": "Casa", "status": "disponible",
            "createdAt": "2026-10-01T00:00:00Z"
        })),
        listing(json!({
            "id": "promoted", "title": "Casa", "status": "disponible", "isPromoted": true,
            "createdAt": "2026-01-01T00:00:00Z"
        })),
    ];
    let results = filter_listings(&listings, &FilterCriteria::default());
    assert_eq!(ids(&results), vec!["promoted", "plain"]);
}

#[test]
fn test_promotion_keeps_relative_order_within_each_group() {
    let listings = vec![
        listing(json!({ "id": "a", "price": 3, "status": "disponible", "isPromoted": true })),
        listing(json!({ "id": "b", "price": 1, "status": "disponible" })),
        listing(json!({ "id": "c", "price": 2, "status": "disponible", "isPromoted": true })),
        listing(json!({ "id": "d", "price": 4, "status": "disponible" })),
    ];
    let criteria = FilterCriteria {
        sort: SortKey::PriceAsc,
        ..Default::default()
    };
    assert_eq!(ids(&filter_listings(&listings, &criteria)), vec!["c", "a", "b", "d"]);
}

#[test]
fn test_listings_without_date_sort_last_on_newest() {
    let listings = vec![
        listing(json!({ "id": "undated", "status": "disponible" })),
        listing(json!({ "id": "dated", "status": "disponible", "createdAt": 1_700_000_000_000_i64 })),
    ];
    let results = filter_listings(&listings, &FilterCriteria::default());
    assert_eq!(ids(&results), vec!["dated", "undated"]);
}

// ---------------------------------------------------------------------------
// Pipeline properties
// ---------------------------------------------------------------------------

#[test]
fn test_filtering_twice_changes_nothing() {
    for query in ["", "orden=precio_asc", "ubicacion=lima&cochera=1", "moneda=PEN&precioMax=800000"] {
        let criteria = FilterCriteria::from_query(query);
        let once = filter_listings(&sample_listings(), &criteria);
        let twice = filter_listings(&once, &criteria);
        assert_eq!(once, twice, "query {query:?}");
    }
}

#[test]
fn test_adding_a_constraint_never_adds_results() {
    let loose = search("operacion=venta");
    let tight = search("operacion=venta&dormitorios=4");
    assert!(tight.iter().all(|id| loose.contains(id)));
    assert!(tight.len() < loose.len());
}

#[test]
fn test_input_is_not_modified() {
    let listings = sample_listings();
    let before = listings.clone();
    let _ = filter_listings(&listings, &FilterCriteria::from_query("orden=precio_desc"));
    assert_eq!(listings, before);
}

#[test]
fn test_garbage_query_is_the_default_criteria() {
    let criteria = FilterCriteria::from_query("dormitorios=muchos&precioMin=&foo=bar&orden=random");
    assert_eq!(criteria, FilterCriteria::default());
    assert_eq!(criteria.operation, None::<Operation>);
}
