use rust_decimal::{Decimal, RoundingStrategy};

/// Wastage buffer applied to buy-flow estimates (15%).
pub fn wastage_multiplier() -> Decimal {
    Decimal::new(115, 2)
}

/// All monetary rounding is to the nearest whole rupee, half away from zero.
pub fn round_rupees(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Buy-flow estimate: `round(rate_per_gram * grams * 1.15)`.
pub fn buy_estimate(rate_per_gram: Decimal, grams: Decimal) -> Decimal {
    round_rupees(rate_per_gram * grams * wastage_multiplier())
}

/// Programmatic quote with explicit making-charge and tax multipliers,
/// e.g. `quote_with_charges(rate, grams, 0.15, 0.03)`.
pub fn quote_with_charges(
    rate_per_gram: Decimal,
    grams: Decimal,
    making_pct: Decimal,
    tax_pct: Decimal,
) -> Decimal {
    let base = rate_per_gram * grams;
    round_rupees(base * (Decimal::ONE + making_pct) * (Decimal::ONE + tax_pct))
}

/// Formats a whole-rupee amount with the rupee sign and Indian digit
/// grouping: `69000` → `₹69,000`, `1234567` → `₹12,34,567`.
pub fn format_inr(amount: Decimal) -> String {
    let whole = round_rupees(amount);
    let negative = whole.is_sign_negative();
    let digits = whole.abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 2);
    let chars: Vec<char> = digits.chars().collect();
    for (index, ch) in chars.iter().enumerate() {
        if index > 0 {
            let remaining = chars.len() - index;
            // Indian grouping: rightmost group of three, then groups of two.
            if remaining >= 3 && (remaining - 3) % 2 == 0 {
                grouped.push(',');
            }
        }
        grouped.push(*ch);
    }

    if negative {
        format!("-₹{grouped}")
    } else {
        format!("₹{grouped}")
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use std::str::FromStr;

    use super::{buy_estimate, format_inr, quote_with_charges, round_rupees};

    #[test]
    fn buy_estimate_applies_fifteen_percent_wastage() {
        // 6000/g * 10g * 1.15 = 69000
        let price = buy_estimate(Decimal::from(6000), Decimal::from(10));
        assert_eq!(price, Decimal::from(69_000));
    }

    #[test]
    fn buy_estimate_rounds_to_nearest_rupee() {
        // 90/g * 7.3g * 1.15 = 755.535 -> 756
        let price = buy_estimate(Decimal::from(90), Decimal::from_str("7.3").expect("decimal"));
        assert_eq!(price, Decimal::from(756));
    }

    #[test]
    fn round_rupees_is_half_away_from_zero() {
        assert_eq!(round_rupees(Decimal::from_str("10.5").expect("decimal")), Decimal::from(11));
        assert_eq!(round_rupees(Decimal::from_str("10.4").expect("decimal")), Decimal::from(10));
    }

    #[test]
    fn charges_formula_stacks_making_and_tax() {
        // 7000 * 10 * 1.15 * 1.03 = 82915
        let price = quote_with_charges(
            Decimal::from(7000),
            Decimal::from(10),
            Decimal::new(15, 2),
            Decimal::new(3, 2),
        );
        assert_eq!(price, Decimal::from(82_915));
    }

    #[test]
    fn inr_formatting_uses_indian_grouping() {
        assert_eq!(format_inr(Decimal::from(0)), "₹0");
        assert_eq!(format_inr(Decimal::from(999)), "₹999");
        assert_eq!(format_inr(Decimal::from(69_000)), "₹69,000");
        assert_eq!(format_inr(Decimal::from(100_000)), "₹1,00,000");
        assert_eq!(format_inr(Decimal::from(1_234_567)), "₹12,34,567");
        assert_eq!(format_inr(Decimal::from(12_34_56_789)), "₹12,34,56,789");
    }
}
