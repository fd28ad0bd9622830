use crate::models::Currency;

/// Soles per US dollar. The single rate used for every cross-currency
/// comparison in the app.
pub const EXCHANGE_RATE: f64 = 3.80;

/// Convert `amount` from one currency to the other using [`EXCHANGE_RATE`].
pub fn convert(amount: f64, from: Currency, to: Currency) -> f64 {
    match (from, to) {
        (Currency::Usd, Currency::Pen) => amount * EXCHANGE_RATE,
        (Currency::Pen, Currency::Usd) => amount / EXCHANGE_RATE,
        _ => amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_currency_is_identity() {
        assert_eq!(convert(123.0, Currency::Pen, Currency::Pen), 123.0);
    }

    #[test]
    fn soles_to_dollars_divides() {
        let usd = convert(380_000.0, Currency::Pen, Currency::Usd);
        assert!((usd - 100_000.0).abs() < 1e-6);
    }

    #[test]
    fn conversion_round_trips_in_both_directions() {
        for amount in [0.0, 1.0, 3.8, 950.5, 100_000.0, 1_140_000.0, 12_345_678.9] {
            for (from, to) in [(Currency::Usd, Currency::Pen), (Currency::Pen, Currency::Usd)] {
                let back = convert(convert(amount, from, to), to, from);
                assert!(
                    (back - amount).abs() <= 1e-9 * amount.max(1.0),
                    "{amount} {from} -> {to} -> {from} gave {back}"
                );
            }
        }
    }
}
