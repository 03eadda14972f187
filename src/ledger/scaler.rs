//! Fixed-point integer strings to real amounts
//!
//! Providers report wei, token base units and gas prices as decimal integer
//! strings. Scaling inserts the decimal point textually before parsing so the
//! integer part is never lost to an intermediate integer overflow.

use crate::error::TracerError;
use thiserror::Error;

/// Decimal places of the native currency (wei per ether)
pub const NATIVE_DECIMALS: u32 = 18;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScaleError {
    #[error("malformed amount '{value}' ({decimals} decimals)")]
    Malformed { value: String, decimals: u32 },
}

impl From<ScaleError> for TracerError {
    fn from(err: ScaleError) -> Self {
        match err {
            ScaleError::Malformed { value, decimals } => {
                TracerError::MalformedAmount { value, decimals }
            }
        }
    }
}

/// Interpret `raw` as an integer with `decimals` fractional digits
///
/// # Arguments
/// * `raw` - Non-negative decimal integer string, no decimal point
/// * `decimals` - Number of fractional digits
///
/// # Returns
/// * `Ok(value)` - `raw / 10^decimals`
/// * `Err(ScaleError::Malformed)` - `raw` contains anything but ASCII digits
///
/// # Example
/// ```rust
/// use ethtrace::ledger::scaler::scale;
///
/// assert_eq!(scale("1000000000000000000", 18).unwrap(), 1.0);
/// assert_eq!(scale("1234", 2).unwrap(), 12.34);
/// ```
pub fn scale(raw: &str, decimals: u32) -> Result<f64, ScaleError> {
    let digits = raw.trim();
    if digits.is_empty() {
        return Ok(0.0);
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ScaleError::Malformed {
            value: raw.to_string(),
            decimals,
        });
    }

    let places = decimals as usize;
    let text = if places == 0 {
        digits.to_string()
    } else if digits.len() <= places {
        format!("0.{}{}", "0".repeat(places - digits.len()), digits)
    } else {
        let split = digits.len() - places;
        format!("{}.{}", &digits[..split], &digits[split..])
    };

    text.parse::<f64>().map_err(|_| ScaleError::Malformed {
        value: raw.to_string(),
        decimals,
    })
}
