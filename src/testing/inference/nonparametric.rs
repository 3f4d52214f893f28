use crate::testing::{Alternative, TestResult};
use num_traits::Float;
use single_utilities::traits::FloatOps;
use statrs::distribution::{ContinuousCDF, Normal};
use std::cmp::Ordering;

/// Largest sample size for which the exact null distribution of U is used when the other sample
/// is larger as well.
const EXACT_MAX_SIZE: usize = 8;

/// How the p-value of a Mann-Whitney test was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MannWhitneyMethod {
    Exact,
    Asymptotic,
}

/// Mann-Whitney U / Wilcoxon rank-sum test of `x` against `y`.
///
/// Missing (non-finite) values are dropped first. The exact null distribution is used when one
/// sample has at most 8 values and there are no ties; otherwise the normal approximation with
/// tie correction and a continuity correction of 0.5. The statistic reported is U of `x`.
///
/// Returns `None` when either sample has no value left.
pub fn mann_whitney<T>(x: &[T], y: &[T], alternative: Alternative) -> Option<TestResult<f64>>
where
    T: FloatOps,
{
    let x: Vec<f64> = finite_values(x);
    let y: Vec<f64> = finite_values(y);
    let nx = x.len();
    let ny = y.len();

    if nx == 0 || ny == 0 {
        return None;
    }

    // Combine samples and assign group labels (0 for x, 1 for y)
    let mut combined: Vec<(f64, usize)> = Vec::with_capacity(nx + ny);
    combined.extend(x.iter().map(|&v| (v, 0)));
    combined.extend(y.iter().map(|&v| (v, 1)));
    combined.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

    // Assign ranks (with ties averaged), collecting tie group sizes
    let mut rank_sum_x = 0.0;
    let mut tie_term = 0.0;
    let mut i = 0;
    while i < combined.len() {
        let val = combined[i].0;
        let mut j = i + 1;
        while j < combined.len() && combined[j].0 == val {
            j += 1;
        }

        let rank = (i + j - 1) as f64 / 2.0 + 1.0;
        for item in &combined[i..j] {
            if item.1 == 0 {
                rank_sum_x += rank;
            }
        }
        let t = (j - i) as f64;
        tie_term += t * t * t - t;

        i = j;
    }

    let n_prod = (nx * ny) as f64;
    let u_x = rank_sum_x - (nx * (nx + 1)) as f64 / 2.0;
    let u_y = n_prod - u_x;

    let u = match alternative {
        Alternative::TwoSided => Float::max(u_x, u_y),
        Alternative::Greater => u_x,
        Alternative::Less => u_y,
    };

    let has_ties = tie_term > 0.0;
    let method = if (nx > EXACT_MAX_SIZE && ny > EXACT_MAX_SIZE) || has_ties {
        MannWhitneyMethod::Asymptotic
    } else {
        MannWhitneyMethod::Exact
    };

    let n = (nx + ny) as f64;
    let mean_u = n_prod / 2.0;
    let var_u = n_prod / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));

    let one_sided = match method {
        MannWhitneyMethod::Exact => exact_sf(u.round() as usize, nx, ny),
        MannWhitneyMethod::Asymptotic => {
            let z = (u - mean_u - 0.5) / var_u.sqrt();
            standard_normal_sf(z)
        }
    };

    let p_value = match alternative {
        Alternative::TwoSided => 2.0 * one_sided,
        _ => one_sided,
    }
    .clamp(0.0, 1.0);

    let z = if var_u > 0.0 {
        (u_x - mean_u) / var_u.sqrt()
    } else {
        0.0
    };
    let effect_size = z / n.sqrt();

    Some(
        TestResult::with_effect_size(u_x, p_value, effect_size)
            .with_standard_error(var_u.sqrt())
            .with_metadata("z_score", z)
            .with_metadata("mean_u", mean_u)
            .with_metadata("var_u", var_u)
            .with_metadata("nx", nx as f64)
            .with_metadata("ny", ny as f64)
            .with_metadata(
                "exact",
                if method == MannWhitneyMethod::Exact { 1.0 } else { 0.0 },
            ),
    )
}

fn finite_values<T: FloatOps>(values: &[T]) -> Vec<f64> {
    values
        .iter()
        .filter_map(|v| v.to_f64())
        .filter(|v| v.is_finite())
        .collect()
}

fn standard_normal_sf(z: f64) -> f64 {
    if z.is_nan() || z == f64::NEG_INFINITY {
        return 1.0;
    }
    if z == f64::INFINITY {
        return 0.0;
    }
    match Normal::new(0.0, 1.0) {
        Ok(normal) => normal.sf(z),
        Err(_) => 1.0,
    }
}

/// Frequencies of every value of U under the null for sample sizes `m` and `n`.
///
/// The counts are the coefficients of the Gaussian binomial `[m + n choose m]_q`, built as the
/// product over `i = 1..=m` of `(1 - q^(n + i)) / (1 - q^i)`. Coefficient `k` only depends on
/// lower coefficients, so everything above degree `m * n` is dropped as it is produced.
pub fn exact_u_frequencies(m: usize, n: usize) -> Vec<f64> {
    let (m, n) = if m <= n { (m, n) } else { (n, m) };
    let max_u = m * n;
    let mut coef = vec![0.0; max_u + 1];
    coef[0] = 1.0;

    for i in 1..=m {
        // multiply by (1 - q^(n + i))
        let shift = n + i;
        for k in (shift..=max_u).rev() {
            coef[k] -= coef[k - shift];
        }
        // divide by (1 - q^i)
        for k in i..=max_u {
            coef[k] += coef[k - i];
        }
    }

    coef
}

/// P(U >= u) under the null.
fn exact_sf(u: usize, nx: usize, ny: usize) -> f64 {
    let freq = exact_u_frequencies(nx, ny);
    let total: f64 = freq.iter().sum();
    if u >= freq.len() {
        return 0.0;
    }
    let upper: f64 = freq[u..].iter().sum();
    (upper / total).clamp(0.0, 1.0)
}
