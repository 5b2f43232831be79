pub mod artifact;
pub mod tree;

use crate::pipeline::features::FeatureVector;

pub use artifact::ModelArtifact;

/// Column of `predict_proba` holding the positive ("heatwave") class.
pub const POSITIVE_CLASS: usize = 1;

/// A pre-trained binary classifier, read-only after load.
pub trait HeatwaveClassifier: Send + Sync {
    fn name(&self) -> &str;

    /// Class probabilities `[negative, positive]` for one day.
    fn predict_proba(&self, features: &FeatureVector) -> anyhow::Result<[f64; 2]>;

    fn heatwave_probability(&self, features: &FeatureVector) -> anyhow::Result<f64> {
        Ok(self.predict_proba(features)?[POSITIVE_CLASS])
    }
}

pub(crate) fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
