use log::{debug, info, warn};

use crate::analysis::{AnalysisOptions, ResultsTable};
use crate::data::FeatureTable;
use crate::testing::correction::{KeyedBh, benjamini_hochberg_keyed};
use crate::testing::inference::{FeatureStatTests, FitFailure, FitOutcome};

/// A feature whose regression could not be fitted.
#[derive(Debug, Clone, PartialEq)]
pub struct ProblematicFeature {
    pub feature_id: String,
    pub reason: FitFailure,
}

/// Diagnostics of the association stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssociationReport {
    pub problematic: Vec<ProblematicFeature>,
    /// Features with a Wald p-value.
    pub n_fitted: usize,
    /// Features that received an FDR-adjusted p-value.
    pub n_corrected: usize,
    /// Features rejected at `alpha` after adjustment.
    pub n_significant: usize,
}

impl AssociationReport {
    pub fn problematic_ids(&self) -> Vec<&str> {
        self.problematic
            .iter()
            .map(|p| p.feature_id.as_str())
            .collect()
    }
}

/// Fit one logistic regression per feature against the outcome and apply a BH correction over
/// all fitted features.
///
/// Fills `LogReg_p_univ` for every feature (undefined for features that could not be fitted) and
/// `LogReg_p_fdr` for every feature that took part in the correction. When no feature yields a
/// p-value the correction is skipped and the FDR column stays empty.
pub fn logistic_regression_univariate(
    table: &FeatureTable,
    features: &[String],
    results: &mut ResultsTable,
    options: &AnalysisOptions,
) -> anyhow::Result<AssociationReport> {
    if !(options.alpha > 0.0 && options.alpha < 1.0) {
        return Err(anyhow::anyhow!(
            "FDR alpha must be between 0 and 1, got {}",
            options.alpha
        ));
    }

    let mut report = AssociationReport::default();
    let mut valid: Vec<(String, f64)> = Vec::new();

    for feature in features {
        let outcome = table.logistic_test(feature, &options.logit)?;
        let row = results.entry(feature);
        row.logreg_p_univ = outcome.p_value();

        match outcome {
            FitOutcome::Fitted(fit) => {
                valid.push((feature.clone(), fit.p_value));
            }
            FitOutcome::Failed(reason) => {
                debug!("Feature '{}' not fitted: {}", feature, reason);
                report.problematic.push(ProblematicFeature {
                    feature_id: feature.clone(),
                    reason,
                });
            }
        }
    }
    report.n_fitted = valid.len();

    match correct_fitted(valid, options.alpha)? {
        Some(keyed) => {
            for (feature, q) in &keyed.adjusted {
                results.entry(feature).logreg_p_fdr = Some(*q);
            }
            report.n_corrected = keyed.len();
            report.n_significant = keyed.n_rejected();
        }
        None => info!("No valid p-values collected; skipping FDR correction"),
    }

    info!(
        "Logistic regression: {} fitted, {} problematic, {} significant at FDR {}",
        report.n_fitted,
        report.problematic.len(),
        report.n_significant,
        options.alpha
    );

    Ok(report)
}

/// BH correction over the usable entries of `fitted`.
///
/// Entries whose p-value is not a finite probability are left out of the family. Adjusted values
/// stay attached to the identifier they arrived with. `None` when nothing is left to correct.
pub fn correct_fitted(
    mut fitted: Vec<(String, f64)>,
    alpha: f64,
) -> anyhow::Result<Option<KeyedBh>> {
    let before = fitted.len();
    fitted.retain(|(_, p)| p.is_finite() && (0.0..=1.0).contains(p));
    if fitted.len() < before {
        warn!(
            "Dropped {} non-finite p-values before FDR correction",
            before - fitted.len()
        );
    }

    if fitted.is_empty() {
        return Ok(None);
    }
    benjamini_hochberg_keyed(&fitted, alpha).map(Some)
}
