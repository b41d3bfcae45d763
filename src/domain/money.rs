use crate::error::FacadeError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The total of an order in major currency units, before and after tax.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderTotal {
    pub excl_tax: Decimal,
    pub incl_tax: Decimal,
}

impl OrderTotal {
    pub fn new(excl_tax: Decimal, incl_tax: Decimal) -> Self {
        Self { excl_tax, incl_tax }
    }

    /// A total where no tax applies.
    pub fn tax_inclusive(incl_tax: Decimal) -> Self {
        Self {
            excl_tax: incl_tax,
            incl_tax,
        }
    }
}

/// An amount in the smallest currency unit (cents for USD), as the gateway expects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MinorUnits(i64);

impl MinorUnits {
    /// Converts a major-unit amount, multiplying by 100 and rounding half to even.
    ///
    /// `10.005` becomes `1000` and `10.015` becomes `1002`. Negative amounts
    /// and amounts beyond `i64` are rejected.
    pub fn from_major(value: Decimal) -> Result<Self, FacadeError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(FacadeError::InvalidAmount {
                amount: value,
                reason: "amount must not be negative",
            });
        }

        let out_of_range = || FacadeError::InvalidAmount {
            amount: value,
            reason: "amount is out of range",
        };

        value
            .checked_mul(Decimal::ONE_HUNDRED)
            .map(|scaled| scaled.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven))
            .and_then(|rounded| rounded.to_i64())
            .map(Self)
            .ok_or_else(out_of_range)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl TryFrom<Decimal> for MinorUnits {
    type Error = FacadeError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::from_major(value)
    }
}

impl From<MinorUnits> for i64 {
    fn from(amount: MinorUnits) -> Self {
        amount.0
    }
}

impl fmt::Display for MinorUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
