//! Yeo-Johnson power transform with standardised output.

use super::scaler::FittedStandardScaler;
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

const LAMBDA_BOUNDS: (f64, f64) = (-5.0, 5.0);
const LAMBDA_TOLERANCE: f64 = 1e-6;
const ZERO_EPS: f64 = 1e-10;

/// Applies the Yeo-Johnson transform with parameter `lambda` to one value.
#[must_use]
pub fn yeo_johnson(x: f64, lambda: f64) -> f64 {
    if x >= 0.0 {
        if lambda.abs() < ZERO_EPS {
            x.ln_1p()
        } else {
            ((x + 1.0).powf(lambda) - 1.0) / lambda
        }
    } else if (lambda - 2.0).abs() < ZERO_EPS {
        -(-x).ln_1p()
    } else {
        -((1.0 - x).powf(2.0 - lambda) - 1.0) / (2.0 - lambda)
    }
}

/// Profile log-likelihood of `lambda` for the sample `x`.
fn log_likelihood(x: &[f64], lambda: f64) -> f64 {
    let n = x.len() as f64;
    let transformed: Vec<f64> = x.iter().map(|&v| yeo_johnson(v, lambda)).collect();
    let mean = transformed.iter().sum::<f64>() / n;
    let var = transformed.iter().map(|y| (y - mean).powi(2)).sum::<f64>() / n;
    if var <= 0.0 || !var.is_finite() {
        return f64::NEG_INFINITY;
    }
    let jacobian: f64 = x.iter().map(|v| v.signum() * v.abs().ln_1p()).sum();
    -n / 2.0 * var.ln() + (lambda - 1.0) * jacobian
}

/// Maximum-likelihood `lambda` by golden-section search.
#[must_use]
pub fn fit_lambda(x: &[f64]) -> f64 {
    if x.len() < 2 {
        return 1.0;
    }
    let ratio = (5.0_f64.sqrt() - 1.0) / 2.0;
    let (mut a, mut b) = LAMBDA_BOUNDS;
    let mut c = b - ratio * (b - a);
    let mut d = a + ratio * (b - a);
    let mut fc = log_likelihood(x, c);
    let mut fd = log_likelihood(x, d);

    while (b - a).abs() > LAMBDA_TOLERANCE {
        if fc > fd {
            b = d;
            d = c;
            fd = fc;
            c = b - ratio * (b - a);
            fc = log_likelihood(x, c);
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + ratio * (b - a);
            fd = log_likelihood(x, d);
        }
    }
    (a + b) / 2.0
}

/// Yeo-Johnson fitted per column, followed by standardisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPowerTransformer {
    /// Learned `lambda` per column.
    pub lambdas: Vec<f64>,
    /// Standardisation of the transformed training data.
    pub scaler: FittedStandardScaler,
}

impl FittedPowerTransformer {
    /// Learns one `lambda` per column, then the output scaling.
    #[must_use]
    pub fn fit(data: &Array2<f64>) -> Self {
        let lambdas: Vec<f64> = data
            .axis_iter(Axis(1))
            .map(|c| fit_lambda(&c.to_vec()))
            .collect();
        let transformed = apply(data, &lambdas);
        Self {
            scaler: FittedStandardScaler::fit(&transformed, true),
            lambdas,
        }
    }

    /// Transforms and standardises.
    #[must_use]
    pub fn transform(&self, data: &Array2<f64>) -> Array2<f64> {
        self.scaler.transform(&apply(data, &self.lambdas))
    }
}

fn apply(data: &Array2<f64>, lambdas: &[f64]) -> Array2<f64> {
    let mut out = data.clone();
    for (j, mut column) in out.axis_iter_mut(Axis(1)).enumerate() {
        let lambda = lambdas[j];
        column.mapv_inplace(|x| yeo_johnson(x, lambda));
    }
    out
}
