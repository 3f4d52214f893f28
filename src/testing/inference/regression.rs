//! Single-predictor logistic regression.
//!
//! The model `logit P(y = 1) = b0 + b1 * x` is fitted by Newton-Raphson on the log-likelihood,
//! starting from zero coefficients. Significance of the slope is the two-sided Wald test
//! `z = b1 / SE(b1)`, with the standard error taken from the inverse information matrix at the
//! final estimate.

use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

/// Default iteration cap.
pub const MAX_ITER: usize = 100;

/// Convergence tolerance on the largest coefficient step.
const TOL: f64 = 1e-8;

/// Fitted probabilities within this distance of the outcome on every sample mean the outcome is
/// perfectly predicted.
const PERFECT_PREDICTION_TOL: f64 = 1e-8;

/// Why a feature could not be fitted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitFailure {
    #[error("all predictor values are missing")]
    AllMissing,

    #[error("predictor has {distinct} distinct value(s)")]
    ConstantPredictor { distinct: usize },

    #[error("information matrix is singular at iteration {iteration}")]
    SingularInformation { iteration: usize },

    #[error("perfect separation detected at iteration {iteration}")]
    PerfectSeparation { iteration: usize },

    #[error("no convergence after {iterations} iterations")]
    NotConverged { iterations: usize },

    #[error("non-finite estimate (coefficient {coefficient}, std error {std_error})")]
    NonFiniteEstimate { coefficient: f64, std_error: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogitOptions {
    pub max_iter: usize,
    pub tol: f64,
}

impl Default for LogitOptions {
    fn default() -> Self {
        LogitOptions {
            max_iter: MAX_ITER,
            tol: TOL,
        }
    }
}

/// A successful fit.
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticFit {
    pub intercept: f64,
    pub coefficient: f64,
    pub std_error: f64,
    /// Wald z of the slope.
    pub z_value: f64,
    /// Two-sided Wald p-value of the slope.
    pub p_value: f64,
    pub iterations: usize,
    /// Complete cases used in the fit.
    pub n_obs: usize,
}

/// Per-feature result: either a fit or the reason there is none.
#[derive(Debug, Clone, PartialEq)]
pub enum FitOutcome {
    Fitted(LogisticFit),
    Failed(FitFailure),
}

impl FitOutcome {
    pub fn p_value(&self) -> Option<f64> {
        match self {
            FitOutcome::Fitted(fit) => Some(fit.p_value),
            FitOutcome::Failed(_) => None,
        }
    }
}

/// Number of distinct non-missing values of `x`.
pub fn distinct_finite(x: &[f64]) -> usize {
    let mut values: Vec<f64> = x.iter().copied().filter(|v| v.is_finite()).collect();
    values.sort_by(|a, b| a.total_cmp(b));
    values.dedup();
    values.len()
}

/// Check whether `x` can serve as a predictor at all.
pub fn check_predictor(x: &[f64]) -> Result<(), FitFailure> {
    match distinct_finite(x) {
        0 => Err(FitFailure::AllMissing),
        d if d <= 1 => Err(FitFailure::ConstantPredictor { distinct: d }),
        _ => Ok(()),
    }
}

#[inline]
fn sigmoid(eta: f64) -> f64 {
    if eta >= 0.0 {
        1.0 / (1.0 + (-eta).exp())
    } else {
        let e = eta.exp();
        e / (1.0 + e)
    }
}

/// Fit `y ~ 1 + x`. Samples whose `x` is missing are left out.
///
/// `y` must hold 0/1 values and have the same length as `x`.
pub fn fit_logistic(y: &[u8], x: &[f64], options: &LogitOptions) -> FitOutcome {
    debug_assert_eq!(y.len(), x.len());

    if let Err(failure) = check_predictor(x) {
        return FitOutcome::Failed(failure);
    }

    let (ys, xs): (Vec<f64>, Vec<f64>) = y
        .iter()
        .zip(x.iter())
        .filter(|(_, xi)| xi.is_finite())
        .map(|(&yi, &xi)| (yi as f64, xi))
        .unzip();
    let n_obs = ys.len();

    let design = DMatrix::from_fn(n_obs, 2, |i, j| if j == 0 { 1.0 } else { xs[i] });
    let response = DVector::from_column_slice(&ys);

    match newton_raphson(&design, &response, options) {
        Ok((beta, iterations)) => wald(&design, &beta, iterations, n_obs),
        Err(failure) => FitOutcome::Failed(failure),
    }
}

/// X' W X at coefficients `beta`, together with the fitted probabilities.
fn information(x: &DMatrix<f64>, beta: &DVector<f64>) -> (DMatrix<f64>, DVector<f64>) {
    let eta = x * beta;
    let p = eta.map(sigmoid);

    let mut xw = x.clone();
    for (i, mut row) in xw.row_iter_mut().enumerate() {
        row *= (p[i] * (1.0 - p[i])).sqrt();
    }
    (xw.transpose() * &xw, p)
}

fn newton_raphson(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    options: &LogitOptions,
) -> Result<(DVector<f64>, usize), FitFailure> {
    let mut beta = DVector::zeros(x.ncols());

    for iteration in 1..=options.max_iter {
        let (info, p) = information(x, &beta);
        let score = x.transpose() * (y - &p);

        let inv = info
            .try_inverse()
            .filter(|m| m.iter().all(|v| v.is_finite()))
            .ok_or(FitFailure::SingularInformation { iteration })?;

        let step = inv * score;
        beta += &step;

        let fitted = (x * &beta).map(sigmoid);
        if (&fitted - y).amax() < PERFECT_PREDICTION_TOL {
            return Err(FitFailure::PerfectSeparation { iteration });
        }

        if step.amax() < options.tol {
            return Ok((beta, iteration));
        }
    }

    Err(FitFailure::NotConverged {
        iterations: options.max_iter,
    })
}

fn wald(x: &DMatrix<f64>, beta: &DVector<f64>, iterations: usize, n_obs: usize) -> FitOutcome {
    let (info, _) = information(x, beta);
    let Some(cov) = info.try_inverse() else {
        return FitOutcome::Failed(FitFailure::SingularInformation {
            iteration: iterations,
        });
    };

    let coefficient = beta[1];
    let std_error = cov[(1, 1)].max(0.0).sqrt();
    let z_value = coefficient / std_error;
    if !coefficient.is_finite() || !std_error.is_finite() || !z_value.is_finite() {
        return FitOutcome::Failed(FitFailure::NonFiniteEstimate {
            coefficient,
            std_error,
        });
    }

    let p_value = match Normal::new(0.0, 1.0) {
        Ok(normal) => (2.0 * normal.sf(z_value.abs())).min(1.0),
        Err(_) => f64::NAN,
    };
    if !p_value.is_finite() {
        return FitOutcome::Failed(FitFailure::NonFiniteEstimate {
            coefficient,
            std_error,
        });
    }

    FitOutcome::Fitted(LogisticFit {
        intercept: beta[0],
        coefficient,
        std_error,
        z_value,
        p_value,
        iterations,
        n_obs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn fitted(outcome: FitOutcome) -> LogisticFit {
        match outcome {
            FitOutcome::Fitted(fit) => fit,
            FitOutcome::Failed(reason) => panic!("fit failed: {}", reason),
        }
    }

    #[test]
    fn test_balanced_overlap_has_zero_slope() {
        // x is independent of y: every x value appears once in each group
        let y = [0, 0, 0, 1, 1, 1];
        let x = [1.0, 2.0, 3.0, 1.0, 2.0, 3.0];
        let fit = fitted(fit_logistic(&y, &x, &LogitOptions::default()));
        assert_relative_eq!(fit.coefficient, 0.0, epsilon = 1e-10);
        assert_relative_eq!(fit.intercept, 0.0, epsilon = 1e-10);
        assert_relative_eq!(fit.p_value, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_single_binary_predictor_closed_form() {
        // With a binary predictor the MLE slope is the log odds ratio and
        // SE^2 = 1/a + 1/b + 1/c + 1/d of the 2x2 table.
        // x = 0: 3 controls, 1 case; x = 1: 1 control, 3 cases
        let y = [0, 0, 0, 1, 0, 1, 1, 1];
        let x = [0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        let fit = fitted(fit_logistic(&y, &x, &LogitOptions::default()));

        let log_or = (9.0f64).ln();
        let se = (1.0 / 3.0 + 1.0 + 1.0 + 1.0 / 3.0f64).sqrt();
        assert_relative_eq!(fit.coefficient, log_or, epsilon = 1e-8);
        assert_relative_eq!(fit.std_error, se, epsilon = 1e-8);
        assert_relative_eq!(fit.intercept, -(3.0f64).ln(), epsilon = 1e-8);

        let expected_p = 2.0 * Normal::new(0.0, 1.0).unwrap().sf(log_or / se);
        assert_relative_eq!(fit.p_value, expected_p, epsilon = 1e-10);
        assert_eq!(fit.n_obs, 8);
    }

    #[test]
    fn test_degenerate_predictors() {
        let y = [0, 1, 0, 1];
        assert_eq!(
            fit_logistic(&y, &[7.0; 4], &LogitOptions::default()),
            FitOutcome::Failed(FitFailure::ConstantPredictor { distinct: 1 })
        );
        assert_eq!(
            fit_logistic(&y, &[f64::NAN; 4], &LogitOptions::default()),
            FitOutcome::Failed(FitFailure::AllMissing)
        );
        assert_eq!(
            fit_logistic(&y, &[f64::NAN, 2.0, f64::NAN, 2.0], &LogitOptions::default()),
            FitOutcome::Failed(FitFailure::ConstantPredictor { distinct: 1 })
        );
    }

    #[test]
    fn test_perfect_separation_fails() {
        let y = [0, 0, 0, 1, 1, 1];
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        match fit_logistic(&y, &x, &LogitOptions::default()) {
            FitOutcome::Failed(FitFailure::PerfectSeparation { .. })
            | FitOutcome::Failed(FitFailure::NotConverged { .. })
            | FitOutcome::Failed(FitFailure::SingularInformation { .. }) => {}
            other => panic!("expected a fit failure, got {:?}", other),
        }
    }

    #[test]
    fn test_iteration_cap() {
        let y = [0, 1, 0, 1, 1, 0, 1, 1];
        let x = [0.5, 1.5, 0.7, 2.2, 0.9, 1.1, 3.0, 1.8];
        let options = LogitOptions {
            max_iter: 1,
            ..LogitOptions::default()
        };
        assert_eq!(
            fit_logistic(&y, &x, &options),
            FitOutcome::Failed(FitFailure::NotConverged { iterations: 1 })
        );
        let fit = fitted(fit_logistic(&y, &x, &LogitOptions::default()));
        assert!(fit.iterations > 1 && fit.iterations < MAX_ITER);
        assert!(fit.coefficient > 0.0);
    }

    #[test]
    fn test_missing_rows_are_dropped() {
        let y = [0, 0, 0, 1, 0, 1, 1, 1, 1, 0];
        let x = [0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, f64::NAN, f64::NAN];
        let fit = fitted(fit_logistic(&y, &x, &LogitOptions::default()));
        assert_eq!(fit.n_obs, 8);
        assert_relative_eq!(fit.coefficient, (9.0f64).ln(), epsilon = 1e-8);
    }
}
