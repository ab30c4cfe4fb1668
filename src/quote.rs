// Stay quote: nights and total price for a date range
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::money::format_amount;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StayQuote {
    pub nights: u32,
    pub total: Decimal,
}

impl StayQuote {
    pub const ZERO: StayQuote = StayQuote {
        nights: 0,
        total: Decimal::ZERO,
    };

    pub fn is_zero(&self) -> bool {
        self.nights == 0
    }

    pub fn total_display(&self) -> String {
        format_amount(self.total)
    }
}

/// Computes the quote for a stay.
///
/// A check-out that is not strictly after the check-in yields
/// [`StayQuote::ZERO`]; that keeps the display sane while the user is still
/// editing and is not a validation failure.
pub fn recompute_quote(check_in: NaiveDate, check_out: NaiveDate, price_per_night: Decimal) -> StayQuote {
    if check_out <= check_in {
        return StayQuote::ZERO;
    }

    // Date-only inputs always differ by whole days
    let nights = u32::try_from((check_out - check_in).num_days()).unwrap_or(u32::MAX);
    // A total beyond Decimal's range has no meaningful display
    match price_per_night.checked_mul(Decimal::from(nights)) {
        Some(total) => StayQuote { nights, total },
        None => StayQuote::ZERO,
    }
}

// Like recompute_quote, for form fields that may still be empty
pub fn quote_for(
    check_in: Option<NaiveDate>,
    check_out: Option<NaiveDate>,
    price_per_night: Option<Decimal>,
) -> StayQuote {
    match (check_in, check_out, price_per_night) {
        (Some(check_in), Some(check_out), Some(price)) => recompute_quote(check_in, check_out, price),
        _ => StayQuote::ZERO,
    }
}

pub fn day_after(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(date)
}

// Minimum selectable dates for the two date widgets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateBounds {
    pub check_in_min: NaiveDate,
    pub check_out_min: NaiveDate,
}

impl DateBounds {
    pub fn for_today(today: NaiveDate) -> Self {
        Self {
            check_in_min: today,
            check_out_min: day_after(today),
        }
    }

    // Raises the check-out minimum to the day after the new check-in and
    // snaps a check-out that would no longer be valid forward to it.
    pub fn apply_check_in(
        &mut self,
        check_in: NaiveDate,
        check_out: Option<NaiveDate>,
    ) -> Option<NaiveDate> {
        self.check_out_min = day_after(check_in);
        check_out.map(|check_out| {
            if check_out <= check_in {
                self.check_out_min
            } else {
                check_out
            }
        })
    }
}
