//! Null-model base probabilities used for PWM generation and the exact
//! score distribution.

use std::{fmt::Display, ops::Index, str::FromStr};

use crate::error::ScanError;

/// Values below this are bumped up before normalization. Keeps the score
/// lattice (and with it the distribution buffers) bounded: the most
/// extreme single-cell score is about 1000*log2(1/0.001).
pub const MIN_BKG: f64 = 0.001;

/// Per-base background probabilities, ordered A, C, G, T.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Background([f64; 4]);

impl Default for Background {
    fn default() -> Self {
        Background::uniform()
    }
}

impl Background {
    pub fn uniform() -> Self {
        Background([0.25; 4])
    }

    /// Validate and normalize four raw probabilities. Entries below
    /// [`MIN_BKG`] cause a uniform bump of all four values; the vector is
    /// then rescaled to sum to 1.
    pub fn from_values(values: &[f64]) -> Result<Self, ScanError> {
        if values.len() < 4 {
            return Err(ScanError::BadBackground(
                "too few background values found (need 4)".to_string(),
            ));
        }
        if values.len() > 4 {
            return Err(ScanError::BadBackground(
                "too many background values provided (need 4)".to_string(),
            ));
        }
        let mut bkg = [values[0], values[1], values[2], values[3]];
        let min = bkg.iter().cloned().fold(f64::INFINITY, f64::min);
        if min < MIN_BKG {
            log::info!(
                "background values smaller than allowed min, adjusting ({min:.2e}<{MIN_BKG:.2e})"
            );
            for b in bkg.iter_mut() {
                *b += MIN_BKG;
            }
        }
        let sum: f64 = bkg.iter().sum();
        if (sum - 1.0).abs() > 0.001 {
            log::info!("background values don't add up to 1.0, adjusting (sum={sum:.3})");
        }
        for b in bkg.iter_mut() {
            *b /= sum;
        }
        Ok(Background(bkg))
    }

    pub fn freqs(&self) -> &[f64; 4] {
        &self.0
    }
}

impl Index<usize> for Background {
    type Output = f64;

    fn index(&self, base: usize) -> &f64 {
        &self.0[base]
    }
}

impl Display for Background {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "A={:.3} C={:.3} G={:.3} T={:.3}",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

impl FromStr for Background {
    type Err = ScanError;

    /// Parses the `-b` argument: four comma-separated probabilities,
    /// spaces allowed around each number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|field| {
                field.trim().parse::<f64>().map_err(|_| {
                    ScanError::BadBackground(format!("invalid background value: {field:?}"))
                })
            })
            .collect::<Result<Vec<f64>, ScanError>>()?;
        Background::from_values(&values)
    }
}
