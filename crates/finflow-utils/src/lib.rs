//! Utility functions and helpers

use once_cell::sync::OnceCell;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};

/// Format the integer part of a number with thousands separators
pub fn format_number<T: ToString>(n: T) -> String {
    let s = n.to_string();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s.as_str()),
    };
    let mut result = String::new();
    let mut count = 0;
    for c in digits.chars().rev() {
        if count == 3 {
            result.push(',');
            count = 0;
        }
        result.push(c);
        count += 1;
    }
    let grouped: String = result.chars().rev().collect();
    format!("{}{}", sign, grouped)
}

/// Format a money amount as `R 1,234.50` / `-R 300.00`
pub fn format_money(amount: Decimal, symbol: &str, decimal_places: u32) -> String {
    let rounded = amount
        .abs()
        .round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.*}", decimal_places as usize, rounded);
    let (whole, fraction) = match text.split_once('.') {
        Some((w, f)) => (w.to_string(), Some(f.to_string())),
        None => (text, None),
    };
    let sign = if amount.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    match fraction {
        Some(f) => format!("{}{} {}.{}", sign, symbol, format_number(whole), f),
        None => format!("{}{} {}", sign, symbol, format_number(whole)),
    }
}

/// Escape text for interpolation into HTML bodies and attribute values
pub fn escape_html(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    for c in content.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Loose shape check for an email address before it is sent to the auth provider
pub fn is_plausible_email(email: &str) -> bool {
    static EMAIL: OnceCell<Regex> = OnceCell::new();
    let re = EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
    });
    re.is_match(email.trim())
}
