//! Invoice formatting: money, dates, and the human-facing invoice number.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

/// Derive the human-facing invoice number from a sale id:
/// `INV-` + the first 8 hex characters, upper-cased.
pub fn invoice_number(sale_id: Uuid) -> String {
    let hex = sale_id.simple().to_string();
    format!("INV-{}", hex[..8].to_uppercase())
}

/// Format a monetary amount with thousands grouping and exactly two
/// fraction digits, rounding half-away-from-zero at the cent.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let plain = format!("{:.2}", rounded.abs());

    let (int_part, frac_part) = plain
        .split_once('.')
        .unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

/// Format the sale date for the invoice metadata block, e.g.
/// `Mar 05, 2026 14:30`.
pub fn format_sale_date(date: DateTime<Utc>) -> String {
    date.format("%b %d, %Y %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn invoice_number_uses_first_eight_hex_chars_uppercased() {
        let id = Uuid::parse_str("3fa85f64-5717-4562-b3fc-2c963f66afa6").unwrap();
        assert_eq!(invoice_number(id), "INV-3FA85F64");
    }

    #[test]
    fn amounts_group_thousands_and_keep_two_fraction_digits() {
        assert_eq!(format_amount(dec("360000.00")), "360,000.00");
        assert_eq!(format_amount(dec("0")), "0.00");
        assert_eq!(format_amount(dec("999.9")), "999.90");
        assert_eq!(format_amount(dec("1234567.891")), "1,234,567.89");
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(format_amount(dec("2.005")), "2.01");
        assert_eq!(format_amount(dec("-2.005")), "-2.01");
        assert_eq!(format_amount(dec("2.004")), "2.00");
    }

    #[test]
    fn negative_amounts_keep_the_sign_outside_the_grouping() {
        assert_eq!(format_amount(dec("-1234.5")), "-1,234.50");
    }

    #[test]
    fn sale_date_uses_the_invoice_format() {
        let date = Utc.with_ymd_and_hms(2026, 3, 5, 14, 30, 0).unwrap();
        assert_eq!(format_sale_date(date), "Mar 05, 2026 14:30");
    }
}
