//! Money value object in integer minor units.
//!
//! All monetary values are carried as `i64` minor units (cents) plus an ISO
//! 4217 currency code. Floats never touch money. Charges are non-negative;
//! refunds and downgrade prorations are negative.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::ValidationError;

/// ISO 4217 currency code (three uppercase ASCII letters).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode([u8; 3]);

impl CurrencyCode {
    /// US dollars, the platform default.
    pub const USD: CurrencyCode = CurrencyCode(*b"USD");

    /// Creates a currency code, validating the ISO 4217 shape.
    pub fn new(code: &str) -> Result<Self, ValidationError> {
        let bytes = code.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(|b| b.is_ascii_uppercase()) {
            return Err(ValidationError::invalid_format(
                "currency",
                "expected three uppercase ASCII letters",
            ));
        }
        Ok(Self([bytes[0], bytes[1], bytes[2]]))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        // Validated as ASCII on construction.
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CurrencyCode::new(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.as_str().to_string()
    }
}

/// A signed amount of money in a single currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in minor units (cents). Signed: refunds are negative.
    pub amount_cents: i64,
    /// Currency of the amount.
    pub currency: CurrencyCode,
}

impl Money {
    /// Creates a money value from minor units.
    pub fn from_cents(amount_cents: i64, currency: CurrencyCode) -> Self {
        Self {
            amount_cents,
            currency,
        }
    }

    /// Zero in the given currency.
    pub fn zero(currency: CurrencyCode) -> Self {
        Self::from_cents(0, currency)
    }

    /// Returns true if the amount is strictly negative.
    pub fn is_negative(&self) -> bool {
        self.amount_cents < 0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.amount_cents == 0
    }

    /// Returns the negated amount (charge -> refund and vice versa).
    pub fn negated(&self) -> Self {
        Self::from_cents(-self.amount_cents, self.currency)
    }

    /// Adds two amounts of the same currency.
    ///
    /// # Errors
    ///
    /// Returns an error on currency mismatch or i64 overflow.
    pub fn checked_add(&self, other: &Money) -> Result<Money, ValidationError> {
        if self.currency != other.currency {
            return Err(ValidationError::invalid_format(
                "currency",
                format!("cannot add {} to {}", other.currency, self.currency),
            ));
        }
        let sum = self
            .amount_cents
            .checked_add(other.amount_cents)
            .ok_or_else(|| ValidationError::invalid_format("amount_cents", "addition overflow"))?;
        Ok(Money::from_cents(sum, self.currency))
    }

    /// Multiplies the amount by `numerator / denominator`, rounding the
    /// result to minor units with banker's rounding (round half to even).
    ///
    /// This is the proration primitive: a mid-cycle tier change bills
    /// `delta × remaining_days / total_days`, and half-even keeps repeated
    /// prorations from drifting in one direction.
    ///
    /// # Errors
    ///
    /// Returns an error if the denominator is not positive or the result
    /// overflows i64.
    pub fn mul_ratio_half_even(
        &self,
        numerator: i64,
        denominator: i64,
    ) -> Result<Money, ValidationError> {
        if denominator <= 0 {
            return Err(ValidationError::out_of_range(
                "denominator",
                1,
                i64::MAX,
                denominator,
            ));
        }

        let n = self.amount_cents as i128 * numerator as i128;
        let d = denominator as i128;
        let quotient = n.div_euclid(d);
        let remainder = n.rem_euclid(d); // always in [0, d)

        let rounded = match (2 * remainder).cmp(&d) {
            Ordering::Less => quotient,
            Ordering::Greater => quotient + 1,
            Ordering::Equal => {
                if quotient % 2 == 0 {
                    quotient
                } else {
                    quotient + 1
                }
            }
        };

        let cents = i64::try_from(rounded).map_err(|_| {
            ValidationError::invalid_format("amount_cents", "ratio multiply overflow")
        })?;
        Ok(Money::from_cents(cents, self.currency))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.amount_cents < 0 { "-" } else { "" };
        let abs = self.amount_cents.unsigned_abs();
        write!(f, "{}{}.{:02} {}", sign, abs / 100, abs % 100, self.currency)
    }
}
