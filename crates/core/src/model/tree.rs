use crate::pipeline::features::FEATURE_COUNT;
use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};

const LEAF: i64 = -1;

/// One fitted decision tree in flat array layout: node `i` splits on
/// `feature[i]` at `threshold[i]` and goes to `children_left[i]` when
/// `x <= threshold`, otherwise `children_right[i]`. A node whose left child is
/// `-1` is a leaf and `value[i]` holds its output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree<V> {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<V>,
}

impl<V> Tree<V> {
    /// Checks the arrays so `leaf` can index without panicking and always
    /// terminates.
    pub fn validate(&self) -> anyhow::Result<()> {
        let n = self.children_left.len();
        ensure!(n > 0, "tree has no nodes");
        ensure!(
            self.children_right.len() == n
                && self.feature.len() == n
                && self.threshold.len() == n
                && self.value.len() == n,
            "tree arrays differ in length (expected {n} nodes)"
        );

        for i in 0..n {
            let left = self.children_left[i];
            let right = self.children_right[i];
            if left == LEAF {
                continue;
            }
            // Children always point forward, which rules out cycles.
            for child in [left, right] {
                ensure!(
                    child > i as i64 && (child as usize) < n,
                    "node {i} has invalid child {child}"
                );
            }
            let f = self.feature[i];
            ensure!(
                (0..FEATURE_COUNT as i64).contains(&f),
                "node {i} splits on unknown feature index {f}"
            );
        }
        Ok(())
    }

    /// Output of the leaf reached by `x`. Requires a validated tree.
    ///
    /// Inputs are narrowed to `f32` before each split, which is the precision
    /// the trees were fitted and are evaluated at.
    pub fn leaf(&self, x: &[f64; FEATURE_COUNT]) -> &V {
        let mut node = 0usize;
        while self.children_left[node] != LEAF {
            let f = self.feature[node] as usize;
            let v = f64::from(x[f] as f32);
            node = if v <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        &self.value[node]
    }
}

impl Tree<Vec<f64>> {
    pub fn validate_classes(&self, n_classes: usize) -> anyhow::Result<()> {
        self.validate()?;
        for (i, v) in self.value.iter().enumerate() {
            ensure!(
                v.len() == n_classes,
                "node {i} has {} class weights (expected {n_classes})",
                v.len()
            );
        }
        Ok(())
    }

    /// Leaf class weights normalised to a distribution.
    pub fn leaf_distribution(&self, x: &[f64; FEATURE_COUNT]) -> anyhow::Result<[f64; 2]> {
        let weights = self.leaf(x);
        let total: f64 = weights.iter().sum();
        ensure!(total > 0.0, "leaf has zero total weight");
        let w0 = weights.first().context("leaf has no class weights")?;
        let w1 = weights.get(1).context("leaf has one class weight")?;
        Ok([w0 / total, w1 / total])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // temp_c <= 35 -> [9, 1], else humidity <= 30 -> [1, 3] else [2, 2]
    fn stump() -> Tree<Vec<f64>> {
        Tree {
            children_left: vec![1, -1, 3, -1, -1],
            children_right: vec![2, -1, 4, -1, -1],
            feature: vec![0, -2, 2, -2, -2],
            threshold: vec![35.0, -2.0, 30.0, -2.0, -2.0],
            value: vec![
                vec![12.0, 6.0],
                vec![9.0, 1.0],
                vec![3.0, 5.0],
                vec![1.0, 3.0],
                vec![2.0, 2.0],
            ],
        }
    }

    fn x(temp: f64, humidity: f64) -> [f64; FEATURE_COUNT] {
        let mut x = [0.0; FEATURE_COUNT];
        x[0] = temp;
        x[2] = humidity;
        x
    }

    #[test]
    fn walks_to_the_expected_leaf() {
        let t = stump();
        t.validate_classes(2).unwrap();
        assert_eq!(t.leaf_distribution(&x(30.0, 50.0)).unwrap(), [0.9, 0.1]);
        assert_eq!(t.leaf_distribution(&x(35.0, 50.0)).unwrap(), [0.9, 0.1]);
        assert_eq!(t.leaf_distribution(&x(40.0, 20.0)).unwrap(), [0.25, 0.75]);
        assert_eq!(t.leaf_distribution(&x(40.0, 60.0)).unwrap(), [0.5, 0.5]);
    }

    #[test]
    fn splits_compare_in_single_precision() {
        let t = stump();
        // Above 35.0 as f64, but 35.0 once narrowed to f32.
        let just_above = 35.000_000_1;
        assert!(just_above > 35.0);
        assert_eq!(just_above as f32, 35.0_f32);
        assert_eq!(t.leaf_distribution(&x(just_above, 50.0)).unwrap(), [0.9, 0.1]);
        // A gap an f32 can still resolve goes right.
        assert_eq!(t.leaf_distribution(&x(35.001, 20.0)).unwrap(), [0.25, 0.75]);
    }

    #[test]
    fn nan_goes_right() {
        let t = stump();
        assert_eq!(t.leaf_distribution(&x(f64::NAN, f64::NAN)).unwrap(), [0.5, 0.5]);
    }

    #[test]
    fn rejects_backward_children() {
        let mut t = stump();
        t.children_right[2] = 1;
        assert!(t.validate().is_err());
    }

    #[test]
    fn rejects_unknown_feature_index() {
        let mut t = stump();
        t.feature[0] = 11;
        assert!(t.validate().is_err());
    }

    #[test]
    fn rejects_mismatched_lengths() {
        let mut t = stump();
        t.threshold.pop();
        assert!(t.validate().is_err());
    }

    #[test]
    fn rejects_wrong_class_count() {
        let mut t = stump();
        t.value[3] = vec![1.0, 1.0, 1.0];
        assert!(t.validate_classes(2).is_err());
    }
}
