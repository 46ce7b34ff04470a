//! Standard scaling.

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

/// Per-column scaling learned from training data.
///
/// Columns with zero variance keep a scale of 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedStandardScaler {
    /// Column means (all zero when not centring).
    pub mean: Vec<f64>,
    /// Column standard deviations (population).
    pub scale: Vec<f64>,
    /// Whether the mean is subtracted.
    pub with_mean: bool,
}

impl FittedStandardScaler {
    /// Learns means and standard deviations of each column.
    #[must_use]
    pub fn fit(data: &Array2<f64>, with_mean: bool) -> Self {
        let n = data.nrows().max(1) as f64;
        let mut mean = Vec::with_capacity(data.ncols());
        let mut scale = Vec::with_capacity(data.ncols());

        for column in data.axis_iter(Axis(1)) {
            let mu = column.sum() / n;
            let var = column.iter().map(|x| (x - mu).powi(2)).sum::<f64>() / n;
            let std = var.sqrt();
            mean.push(if with_mean { mu } else { 0.0 });
            scale.push(if std > f64::EPSILON { std } else { 1.0 });
        }

        Self {
            mean,
            scale,
            with_mean,
        }
    }

    /// Applies the learned scaling.
    #[must_use]
    pub fn transform(&self, data: &Array2<f64>) -> Array2<f64> {
        let mut out = data.clone();
        for (j, mut column) in out.axis_iter_mut(Axis(1)).enumerate() {
            let (mu, s) = (self.mean[j], self.scale[j]);
            column.mapv_inplace(|x| (x - mu) / s);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_standard_scaler_centres_and_scales() {
        let data = array![[1.0, 10.0], [3.0, 10.0]];
        let scaler = FittedStandardScaler::fit(&data, true);

        assert_eq!(scaler.mean, vec![2.0, 10.0]);
        assert_eq!(scaler.scale, vec![1.0, 1.0]);
        assert_eq!(scaler.transform(&data), array![[-1.0, 0.0], [1.0, 0.0]]);
    }

    #[test]
    fn test_scaler_without_centring() {
        let data = array![[0.0], [2.0]];
        let scaler = FittedStandardScaler::fit(&data, false);

        assert_eq!(scaler.mean, vec![0.0]);
        assert_eq!(scaler.scale, vec![1.0]);
        assert_eq!(scaler.transform(&array![[4.0]]), array![[4.0]]);
    }

    #[test]
    fn test_scaler_variance_uses_population_std() {
        let data = array![[0.0], [0.0], [6.0], [6.0]];
        let scaler = FittedStandardScaler::fit(&data, true);
        assert_eq!(scaler.scale, vec![3.0]);
    }
}
