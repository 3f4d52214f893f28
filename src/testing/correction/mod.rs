//! Benjamini-Hochberg false discovery rate control over a family of p-values.

use anyhow::{Result, anyhow};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Apply Benjamini-Hochberg (BH) procedure for controlling false discovery rate
///
/// The BH procedure controls the false discovery rate (FDR), which is the expected
/// proportion of false positives among all rejected null hypotheses.
///
/// # Arguments
/// * `p_values` - A slice of p-values to adjust
///
/// # Returns
/// * `Result<Vec<f64>>` - Vector of adjusted p-values, in input order
///
/// # Example
/// ```
/// use feature_screen::testing::correction::benjamini_hochberg_correction;
///
/// let p_values = vec![0.01, 0.03, 0.05];
/// let adjusted = benjamini_hochberg_correction(&p_values).unwrap();
/// assert!((adjusted[0] - 0.03).abs() < 1e-12);
/// ```
pub fn benjamini_hochberg_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    let n = p_values.len();
    if n == 0 {
        return Err(anyhow!("Empty p-value array"));
    }

    // Validate p-values; NaN fails the range check too
    for (i, &p) in p_values.iter().enumerate() {
        if !(0.0..=1.0).contains(&p) {
            return Err(anyhow!("Invalid p-value at index {}: {}", i, p));
        }
    }

    // Create index-value pairs and sort by p-value in ascending order
    let mut indexed_p_values: Vec<(usize, f64)> =
        p_values.iter().enumerate().map(|(i, &p)| (i, p)).collect();
    indexed_p_values.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

    let mut adjusted_p_values = vec![0.0; n];
    let mut current_min = 1.0;

    // Process from largest to smallest p-value
    for i in (0..n).rev() {
        let (orig_idx, p_val) = indexed_p_values[i];
        let rank = i + 1;

        let adjustment = (p_val * n as f64 / rank as f64).min(1.0);
        current_min = adjustment.min(current_min);
        adjusted_p_values[orig_idx] = current_min;
    }

    Ok(adjusted_p_values)
}

/// Adjusted p-values together with the rejection decision at `alpha`.
#[derive(Debug, Clone, PartialEq)]
pub struct BhOutcome {
    pub alpha: f64,
    pub adjusted: Vec<f64>,
    pub reject: Vec<bool>,
}

impl BhOutcome {
    pub fn n_rejected(&self) -> usize {
        self.reject.iter().filter(|&&r| r).count()
    }
}

/// Benjamini-Hochberg adjustment plus rejection of every hypothesis whose adjusted p-value is
/// at most `alpha`.
pub fn benjamini_hochberg(p_values: &[f64], alpha: f64) -> Result<BhOutcome> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(anyhow!("Alpha must be between 0 and 1, got {}", alpha));
    }
    let adjusted = benjamini_hochberg_correction(p_values)?;
    let reject = adjusted.iter().map(|&q| q <= alpha).collect();
    Ok(BhOutcome {
        alpha,
        adjusted,
        reject,
    })
}

/// BH adjustment of p-values that carry their own feature identifiers.
///
/// The adjusted values are returned keyed by the identifier each input arrived with, so the
/// pairing does not depend on the position of any other sequence.
#[derive(Debug, Clone)]
pub struct KeyedBh {
    pub alpha: f64,
    pub adjusted: HashMap<String, f64>,
    pub rejected: HashMap<String, bool>,
}

impl KeyedBh {
    pub fn get(&self, feature_id: &str) -> Option<f64> {
        self.adjusted.get(feature_id).copied()
    }

    pub fn len(&self) -> usize {
        self.adjusted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjusted.is_empty()
    }

    pub fn n_rejected(&self) -> usize {
        self.rejected.values().filter(|&&r| r).count()
    }
}

pub fn benjamini_hochberg_keyed(entries: &[(String, f64)], alpha: f64) -> Result<KeyedBh> {
    let p_values: Vec<f64> = entries.iter().map(|(_, p)| *p).collect();
    let outcome = benjamini_hochberg(&p_values, alpha)?;

    let mut adjusted = HashMap::with_capacity(entries.len());
    let mut rejected = HashMap::with_capacity(entries.len());
    for (((id, _), &q), &r) in entries.iter().zip(&outcome.adjusted).zip(&outcome.reject) {
        adjusted.insert(id.clone(), q);
        rejected.insert(id.clone(), r);
    }

    Ok(KeyedBh {
        alpha,
        adjusted,
        rejected,
    })
}
