//! BAC engine — pure decay and intake arithmetic.
//!
//! DESIGN
//! ======
//! Both operations are deterministic functions of their inputs with no access
//! to the store or the network. Sex arrives as raw text (from the wire or from
//! a stored record) and is parsed here, so an unrecognized category surfaces
//! as `BacError::UnknownSex` instead of leaving the balance untouched.
//!
//! Elapsed time is an explicit parameter: the decay scheduler's period is not
//! baked into the formula.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::frame::ErrorCode;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Grams of ethanol per millilitre.
pub const ETHANOL_DENSITY_G_PER_ML: f64 = 0.789;

/// Lower bound accepted for body weight when a drink is applied, in kilograms.
pub const MIN_WEIGHT_KG: f64 = 10.0;

/// Upper bound accepted for body weight, in kilograms.
pub const MAX_WEIGHT_KG: f64 = 650.0;

/// Largest single drink accepted, in millilitres.
pub const MAX_VOLUME_ML: f64 = 10_000.0;

const SECONDS_PER_HOUR: f64 = 3600.0;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BacError {
    #[error("unrecognized sex category {0:?}, expected Male or Female")]
    UnknownSex(String),
    #[error("invalid {field}: {value}")]
    InvalidInput { field: &'static str, value: f64 },
}

impl ErrorCode for BacError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownSex(_) => "E_UNKNOWN_SEX",
            Self::InvalidInput { .. } => "E_INVALID_FIELD",
        }
    }
}

/// Biological-sex category. Selects the metabolism rate and the body-water
/// distribution ratio; nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Elimination rate in BAC units per hour.
    #[must_use]
    pub fn metabolism_rate(self) -> f64 {
        match self {
            Self::Male => 0.015,
            Self::Female => 0.017,
        }
    }

    /// Widmark distribution ratio.
    #[must_use]
    pub fn distribution_ratio(self) -> f64 {
        match self {
            Self::Male => 0.68,
            Self::Female => 0.55,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }
}

impl FromStr for Sex {
    type Err = BacError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("male") {
            Ok(Self::Male)
        } else if trimmed.eq_ignore_ascii_case("female") {
            Ok(Self::Female)
        } else {
            Err(BacError::UnknownSex(raw.to_string()))
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// OPERATIONS
// =============================================================================

/// Age a balance by `elapsed` at the metabolism rate for `sex`.
///
/// The result is never negative and never above the (clamped) input.
///
/// # Errors
///
/// Returns `UnknownSex` for an unrecognized category and `InvalidInput` for a
/// non-positive or non-finite weight.
pub fn decay(current_bac: f64, weight: f64, sex: &str, elapsed: Duration) -> Result<f64, BacError> {
    let sex: Sex = sex.parse()?;
    check_weight(weight)?;

    let decrease = sex.metabolism_rate() / SECONDS_PER_HOUR * elapsed.as_secs_f64();
    Ok((floor(current_bac) - decrease).max(0.0))
}

/// Add the BAC contributed by one drink of `volume_ml` at `strength_percent`
/// alcohol by volume.
///
/// # Errors
///
/// Returns `UnknownSex` for an unrecognized category, `InvalidInput` when
/// weight, volume, or strength is out of range, and `InvalidInput` for `bac`
/// if the sum overflows.
pub fn consume(
    current_bac: f64,
    weight: f64,
    sex: &str,
    volume_ml: f64,
    strength_percent: f64,
) -> Result<f64, BacError> {
    let sex: Sex = sex.parse()?;
    check_weight(weight)?;
    if weight < MIN_WEIGHT_KG {
        return Err(BacError::InvalidInput { field: "weight", value: weight });
    }
    if !volume_ml.is_finite() || !(0.0..=MAX_VOLUME_ML).contains(&volume_ml) {
        return Err(BacError::InvalidInput { field: "volume", value: volume_ml });
    }
    if !strength_percent.is_finite() || !(0.0..=100.0).contains(&strength_percent) {
        return Err(BacError::InvalidInput { field: "strength", value: strength_percent });
    }

    let grams = volume_ml * (strength_percent / 100.0) * ETHANOL_DENSITY_G_PER_ML;
    let increase = grams / (weight * sex.distribution_ratio() * 1000.0) * 100.0;
    let total = floor(current_bac) + increase;
    if !total.is_finite() {
        return Err(BacError::InvalidInput { field: "bac", value: total });
    }
    Ok(total)
}

/// Time until `bac` reaches zero at the metabolism rate for `sex`.
#[must_use]
pub fn time_until_sober(bac: f64, sex: Sex) -> Duration {
    let hours = floor(bac) / sex.metabolism_rate();
    Duration::try_from_secs_f64(hours * SECONDS_PER_HOUR).unwrap_or(Duration::MAX)
}

fn check_weight(weight: f64) -> Result<(), BacError> {
    if weight.is_finite() && weight > 0.0 && weight <= MAX_WEIGHT_KG {
        Ok(())
    } else {
        Err(BacError::InvalidInput { field: "weight", value: weight })
    }
}

/// Negative and NaN balances read as zero.
fn floor(bac: f64) -> f64 {
    bac.max(0.0)
}

#[cfg(test)]
#[path = "bac_test.rs"]
mod tests;
