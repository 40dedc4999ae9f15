//! Cash amounts and display formatting.
//!
//! Balances and prices are `f64` dollars, rounded to whole cents at every
//! write so stored values never accumulate sub-cent drift.

/// Round an amount to the nearest cent.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Format an amount as US dollars: `$1,234.56`, negatives as `-$1,234.56`.
pub fn usd(amount: f64) -> String {
    let total_cents = (amount.abs() * 100.0).round() as i64;
    let dollars = total_cents / 100;
    let cents = total_cents % 100;

    let raw = dollars.to_string();
    let mut grouped = String::with_capacity(raw.len() + raw.len() / 3);
    for (i, ch) in raw.chars().enumerate() {
        if i > 0 && (raw.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && total_cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{cents:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_whole_cents() {
        assert_eq!(round_cents(8500.004), 8500.0);
        assert_eq!(round_cents(159.999), 160.0);
        assert_eq!(round_cents(9300.0), 9300.0);
        assert_eq!(round_cents(0.0), 0.0);
    }

    #[test]
    fn formats_small_amounts() {
        assert_eq!(usd(0.0), "$0.00");
        assert_eq!(usd(7.5), "$7.50");
        assert_eq!(usd(150.0), "$150.00");
        assert_eq!(usd(999.99), "$999.99");
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(usd(10_000.0), "$10,000.00");
        assert_eq!(usd(8_500.0), "$8,500.00");
        assert_eq!(usd(1_234_567.89), "$1,234,567.89");
    }

    #[test]
    fn formats_negatives_with_leading_sign() {
        assert_eq!(usd(-12.34), "-$12.34");
        assert_eq!(usd(-1_000.0), "-$1,000.00");
    }

    #[test]
    fn tiny_negative_rounds_to_plain_zero() {
        assert_eq!(usd(-0.001), "$0.00");
    }
}
