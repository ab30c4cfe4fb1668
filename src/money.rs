// Currency display for prices and quote totals
use rust_decimal::Decimal;

pub const CURRENCY_SYMBOL: char = '₦';

// Renders an amount the way the booking pages show it: currency symbol,
// comma thousands separators and at most two fraction digits with trailing
// zeros dropped (e.g. ₦450,000 or ₦1,234.5).
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp(2).normalize();
    let text = rounded.abs().to_string();
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (text.as_str(), None),
    };

    let mut out = String::with_capacity(text.len() + whole.len() / 3 + 2);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        out.push('-');
    }
    out.push(CURRENCY_SYMBOL);
    out.push_str(&group_thousands(whole));
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

pub fn format_nightly_price(price: Decimal) -> String {
    format!("{}/night", format_amount(price))
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
