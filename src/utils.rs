use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parses Tally's compact `YYYYMMDD` date form.
pub fn parse_tally_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.len() != 8 || !raw.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y%m%d").ok()
}

pub fn format_tally_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Display form used in voucher tables: `DD-MM-YYYY`.
pub fn format_display_date(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

/// Parses a Tally amount such as `-1,25,000.50` into a decimal.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

/// Formats a float with a fixed number of decimals and `,` thousands separators.
pub fn format_amount(value: f64, decimals: usize) -> String {
    group_thousands(&format!("{:.*}", decimals, value))
}

/// Two-decimal, thousands-separated rendering of a decimal amount.
pub fn format_decimal(value: Decimal) -> String {
    group_thousands(&format!("{:.2}", value.round_dp(2)))
}

/// Inserts `,` separators into the integer part of an already formatted number.
pub fn group_thousands(formatted: &str) -> String {
    let (sign, unsigned) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*ch);
    }

    let is_zero = unsigned.chars().all(|c| c == '0' || c == '.');
    let mut out = String::new();
    if !is_zero {
        out.push_str(sign);
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Keeps only alphanumeric characters, for deterministic file names.
pub fn sanitize_identifier(raw: &str) -> String {
    raw.chars().filter(|c| c.is_alphanumeric()).collect()
}

/// Truncates to `max` characters, appending `...` when anything was cut.
pub fn truncate_label(label: &str, max: usize) -> String {
    if label.chars().count() > max {
        let head: String = label.chars().take(max).collect();
        format!("{}...", head)
    } else {
        label.to_string()
    }
}
