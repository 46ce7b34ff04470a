//! SMOTE oversampling followed by edited-nearest-neighbour cleaning.

use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct DistIdx(f64, usize);

impl PartialEq for DistIdx {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for DistIdx {}
impl PartialOrd for DistIdx {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for DistIdx {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0).then(self.1.cmp(&other.1))
    }
}

fn squared_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Indices (into `candidates`) of the `k` rows nearest to `x.row(query)`,
/// excluding the query itself, nearest first.
fn nearest(x: &Array2<f64>, query: usize, candidates: &[usize], k: usize) -> Vec<usize> {
    let mut heap: BinaryHeap<DistIdx> = BinaryHeap::with_capacity(k + 1);
    let point = x.row(query);
    for (pos, &i) in candidates.iter().enumerate() {
        if i == query {
            continue;
        }
        let d = DistIdx(squared_distance(point, x.row(i)), pos);
        if heap.len() < k {
            heap.push(d);
        } else if heap.peek().is_some_and(|top| d < *top) {
            heap.pop();
            heap.push(d);
        }
    }
    heap.into_sorted_vec().into_iter().map(|DistIdx(_, pos)| pos).collect()
}

/// Number of rows per class label, ordered by label.
#[must_use]
pub fn class_counts(y: &Array1<i64>) -> BTreeMap<i64, usize> {
    let mut counts = BTreeMap::new();
    for &label in y {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// Rebalanced features and labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Resampled {
    /// Feature rows.
    pub x: Array2<f64>,
    /// Label per row.
    pub y: Array1<i64>,
}

/// SMOTE+ENN with a fixed seed.
///
/// Every class is oversampled to the majority count, then any row whose
/// nearest neighbours include another class is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmoteEnn {
    /// Neighbours used to synthesise samples.
    pub smote_neighbors: usize,
    /// Neighbours inspected when cleaning.
    pub enn_neighbors: usize,
    /// RNG seed.
    pub random_state: u64,
}

impl SmoteEnn {
    /// Creates the resampler with 5 SMOTE and 3 ENN neighbours.
    #[must_use]
    pub const fn new(random_state: u64) -> Self {
        Self {
            smote_neighbors: 5,
            enn_neighbors: 3,
            random_state,
        }
    }

    /// Oversamples then cleans. Inputs with fewer than two classes are
    /// returned unchanged.
    #[must_use]
    pub fn fit_resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Resampled {
        if class_counts(y).len() < 2 {
            return Resampled {
                x: x.clone(),
                y: y.clone(),
            };
        }
        let over = self.smote(x, y);
        self.enn(&over.x, &over.y)
    }

    /// Synthesises rows until every class matches the majority count.
    #[must_use]
    pub fn smote(&self, x: &Array2<f64>, y: &Array1<i64>) -> Resampled {
        let counts = class_counts(y);
        let majority = counts.values().copied().max().unwrap_or(0);
        let mut rng = StdRng::seed_from_u64(self.random_state);

        let mut rows: Vec<f64> = x.iter().copied().collect();
        let mut labels: Vec<i64> = y.to_vec();

        for (&label, &count) in &counts {
            let needed = majority - count;
            if needed == 0 {
                continue;
            }
            let members: Vec<usize> = y
                .iter()
                .enumerate()
                .filter(|(_, &l)| l == label)
                .map(|(i, _)| i)
                .collect();
            let k = self.smote_neighbors.min(members.len() - 1);
            let neighbours: Vec<Vec<usize>> = members
                .iter()
                .map(|&i| nearest(x, i, &members, k))
                .collect();

            for _ in 0..needed {
                let pick = rng.gen_range(0..members.len());
                let base = x.row(members[pick]);
                if neighbours[pick].is_empty() {
                    rows.extend(base.iter());
                } else {
                    let nn = neighbours[pick][rng.gen_range(0..neighbours[pick].len())];
                    let other = x.row(members[nn]);
                    let gap: f64 = rng.gen();
                    rows.extend(base.iter().zip(other.iter()).map(|(&b, &o)| b + gap * (o - b)));
                }
                labels.push(label);
            }
            debug!(class = label, synthesised = needed, "SMOTE oversampled class");
        }

        let n = labels.len();
        Resampled {
            x: Array2::from_shape_vec((n, x.ncols()), rows).unwrap_or_else(|_| x.clone()),
            y: Array1::from_vec(labels),
        }
    }

    /// Removes every row whose nearest neighbours are not all of its class.
    #[must_use]
    pub fn enn(&self, x: &Array2<f64>, y: &Array1<i64>) -> Resampled {
        let all: Vec<usize> = (0..y.len()).collect();
        let k = self.enn_neighbors.min(all.len().saturating_sub(1));
        let keep: Vec<usize> = all
            .iter()
            .copied()
            .filter(|&i| nearest(x, i, &all, k).iter().all(|&j| y[j] == y[i]))
            .collect();

        debug!(removed = y.len() - keep.len(), "ENN cleaned rows");
        Resampled {
            x: x.select(Axis(0), &keep),
            y: y.select(Axis(0), &keep),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn two_blobs() -> (Array2<f64>, Array1<i64>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..20 {
            rows.extend([f64::from(i) * 0.1, 0.0]);
            labels.push(0);
        }
        for i in 0..5 {
            rows.extend([10.0 + f64::from(i) * 0.1, 10.0]);
            labels.push(1);
        }
        (
            Array2::from_shape_vec((25, 2), rows).unwrap(),
            Array1::from_vec(labels),
        )
    }

    #[test]
    fn test_smote_balances_classes() {
        let (x, y) = two_blobs();
        let out = SmoteEnn::new(42).smote(&x, &y);

        let counts = class_counts(&out.y);
        assert_eq!(counts[&0], 20);
        assert_eq!(counts[&1], 20);
        assert_eq!(out.x.nrows(), 40);
    }

    #[test]
    fn test_synthetic_rows_lie_between_members() {
        let (x, y) = two_blobs();
        let out = SmoteEnn::new(42).smote(&x, &y);

        for row in out.x.rows().into_iter().skip(25) {
            assert!((9.999..=10.401).contains(&row[0]));
            assert_eq!(row[1], 10.0);
        }
    }

    #[test]
    fn test_resample_is_deterministic() {
        let (x, y) = two_blobs();
        let a = SmoteEnn::new(7).fit_resample(&x, &y);
        let b = SmoteEnn::new(7).fit_resample(&x, &y);
        assert_eq!(a, b);
    }

    #[test]
    fn test_enn_removes_mislabelled_point() {
        let x = array![[0.0], [0.1], [0.2], [0.3], [0.15], [5.0], [5.1], [5.2], [5.3]];
        let y = array![0, 0, 0, 0, 1, 1, 1, 1, 1];

        let out = SmoteEnn::new(0).enn(&x, &y);

        assert!(!out.x.column(0).iter().any(|&v| (v - 0.15).abs() < 1e-12));
        assert!(out.y.iter().filter(|&&l| l == 1).count() >= 4);
    }

    #[test]
    fn test_single_class_is_noop() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![1, 1, 1];

        let out = SmoteEnn::new(42).fit_resample(&x, &y);
        assert_eq!(out.x, x);
        assert_eq!(out.y, y);
    }

    #[test]
    fn test_singleton_class_is_duplicated() {
        let x = array![[0.0], [1.0], [2.0], [9.0]];
        let y = array![0, 0, 0, 1];

        let out = SmoteEnn::new(42).smote(&x, &y);
        let synth: Vec<f64> = out.x.column(0).iter().skip(4).copied().collect();
        assert_eq!(synth, vec![9.0, 9.0]);
    }
}
