use crate::model::tree::Tree;
use crate::model::{sigmoid, HeatwaveClassifier};
use crate::pipeline::features::{FeatureVector, FEATURE_COUNT, FEATURE_ORDER};
use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A trained classifier exported to JSON.
///
/// `feature_names` records the column order the estimator was fitted with and
/// must equal `FEATURE_ORDER` exactly; a reordered export is refused at load
/// instead of scoring silently wrong.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub name: String,
    pub feature_names: Vec<String>,
    pub estimator: Estimator,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Estimator {
    LogisticRegression {
        coefficients: Vec<f64>,
        intercept: f64,
        #[serde(default)]
        scaler: Option<StandardScaler>,
    },
    /// Averaged class distributions of the trees' leaves.
    RandomForest { trees: Vec<Tree<Vec<f64>>> },
    /// Binary log-loss boosting: `sigmoid(init + learning_rate * sum(leaves))`.
    GradientBoosting {
        init: f64,
        learning_rate: f64,
        trees: Vec<Tree<f64>>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl ModelArtifact {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read model artifact {}", path.display()))?;
        let artifact = Self::from_json(&text)
            .with_context(|| format!("invalid model artifact {}", path.display()))?;

        tracing::info!(
            model = %artifact.name,
            estimator = artifact.estimator.kind(),
            path = %path.display(),
            "model artifact loaded"
        );
        Ok(artifact)
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let artifact = serde_json::from_str::<Self>(text)
            .context("model artifact is not valid JSON for the artifact schema")?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let got: Vec<&str> = self.feature_names.iter().map(String::as_str).collect();
        ensure!(
            got == FEATURE_ORDER,
            "feature_names must be exactly {FEATURE_ORDER:?} (got {got:?})"
        );

        match &self.estimator {
            Estimator::LogisticRegression {
                coefficients,
                intercept,
                scaler,
            } => {
                ensure!(
                    coefficients.len() == FEATURE_COUNT,
                    "expected {FEATURE_COUNT} coefficients (got {})",
                    coefficients.len()
                );
                ensure!(intercept.is_finite(), "intercept must be finite");
                if let Some(scaler) = scaler {
                    ensure!(
                        scaler.mean.len() == FEATURE_COUNT && scaler.scale.len() == FEATURE_COUNT,
                        "scaler must have {FEATURE_COUNT} means and scales"
                    );
                    ensure!(
                        scaler.scale.iter().all(|s| *s != 0.0),
                        "scaler scale must be non-zero"
                    );
                }
            }
            Estimator::RandomForest { trees } => {
                ensure!(!trees.is_empty(), "random forest has no trees");
                for (i, tree) in trees.iter().enumerate() {
                    tree.validate_classes(2)
                        .with_context(|| format!("random forest tree {i}"))?;
                }
            }
            Estimator::GradientBoosting { trees, .. } => {
                ensure!(!trees.is_empty(), "gradient boosting has no trees");
                for (i, tree) in trees.iter().enumerate() {
                    tree.validate()
                        .with_context(|| format!("gradient boosting tree {i}"))?;
                }
            }
        }
        Ok(())
    }
}

impl Estimator {
    pub fn kind(&self) -> &'static str {
        match self {
            Estimator::LogisticRegression { .. } => "logistic_regression",
            Estimator::RandomForest { .. } => "random_forest",
            Estimator::GradientBoosting { .. } => "gradient_boosting",
        }
    }

    fn predict_proba(&self, x: &[f64; FEATURE_COUNT]) -> anyhow::Result<[f64; 2]> {
        match self {
            Estimator::LogisticRegression {
                coefficients,
                intercept,
                scaler,
            } => {
                let mut z = *intercept;
                for (i, (w, v)) in coefficients.iter().zip(x.iter()).enumerate() {
                    let v = match scaler {
                        Some(s) => (v - s.mean[i]) / s.scale[i],
                        None => *v,
                    };
                    z += w * v;
                }
                let p = sigmoid(z);
                Ok([1.0 - p, p])
            }
            Estimator::RandomForest { trees } => {
                let mut acc = [0.0, 0.0];
                for tree in trees {
                    let d = tree.leaf_distribution(x)?;
                    acc[0] += d[0];
                    acc[1] += d[1];
                }
                let n = trees.len() as f64;
                Ok([acc[0] / n, acc[1] / n])
            }
            Estimator::GradientBoosting {
                init,
                learning_rate,
                trees,
            } => {
                let raw = trees
                    .iter()
                    .fold(*init, |acc, tree| acc + learning_rate * tree.leaf(x));
                let p = sigmoid(raw);
                Ok([1.0 - p, p])
            }
        }
    }
}

impl HeatwaveClassifier for ModelArtifact {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict_proba(&self, features: &FeatureVector) -> anyhow::Result<[f64; 2]> {
        self.estimator.predict_proba(&features.to_array())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn names() -> Vec<&'static str> {
        FEATURE_ORDER.to_vec()
    }

    fn features(temp: f64) -> FeatureVector {
        FeatureVector {
            temp_c: temp,
            feelslike_c: temp + 1.0,
            humidity: 40.0,
            dewpoint_c: temp - 12.0,
            pressure_mb: 1010.0,
            wind_kph: 10.0,
            hour: 14.0,
            month: 7.0,
            temp_rolling_3h: temp,
            temp_rolling_24h: temp,
            daily_temp_range: 8.0,
        }
    }

    fn logistic_on_temp() -> serde_json::Value {
        // Only temp_c carries weight: p = sigmoid(temp_c - 35).
        json!({
            "name": "lr-test",
            "feature_names": names(),
            "estimator": {
                "type": "logistic_regression",
                "coefficients": [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                "intercept": -35.0
            }
        })
    }

    #[test]
    fn logistic_regression_scores_positive_column() {
        let m = ModelArtifact::from_json(&logistic_on_temp().to_string()).unwrap();
        let p = m.predict_proba(&features(35.0)).unwrap();
        assert!((p[1] - 0.5).abs() < 1e-12);
        assert!((p[0] + p[1] - 1.0).abs() < 1e-12);

        let hot = m.heatwave_probability(&features(45.0)).unwrap();
        let mild = m.heatwave_probability(&features(25.0)).unwrap();
        assert!(hot > 0.99);
        assert!(mild < 0.01);
    }

    #[test]
    fn logistic_regression_applies_scaler() {
        let mut v = logistic_on_temp();
        v["estimator"]["intercept"] = json!(0.0);
        let mut mean = vec![0.0; FEATURE_COUNT];
        mean[0] = 30.0;
        v["estimator"]["scaler"] = json!({"mean": mean, "scale": vec![5.0; FEATURE_COUNT]});

        let m = ModelArtifact::from_json(&v.to_string()).unwrap();
        // (40 - 30) / 5 = 2
        let p = m.heatwave_probability(&features(40.0)).unwrap();
        assert!((p - sigmoid(2.0)).abs() < 1e-12);
    }

    #[test]
    fn rejects_permuted_feature_names() {
        let mut v = logistic_on_temp();
        let mut permuted = names();
        permuted.swap(0, 1);
        v["feature_names"] = json!(permuted);
        let err = ModelArtifact::from_json(&v.to_string()).unwrap_err();
        assert!(format!("{err:#}").contains("feature_names"));
    }

    #[test]
    fn rejects_wrong_coefficient_count() {
        let mut v = logistic_on_temp();
        v["estimator"]["coefficients"] = json!([1.0, 2.0]);
        assert!(ModelArtifact::from_json(&v.to_string()).is_err());
    }

    #[test]
    fn random_forest_averages_leaf_distributions() {
        let v = json!({
            "name": "rf-test",
            "feature_names": names(),
            "estimator": {
                "type": "random_forest",
                "trees": [
                    {
                        "children_left": [1, -1, -1],
                        "children_right": [2, -1, -1],
                        "feature": [0, -2, -2],
                        "threshold": [35.0, -2.0, -2.0],
                        "value": [[5.0, 5.0], [4.0, 0.0], [1.0, 3.0]]
                    },
                    {
                        "children_left": [-1],
                        "children_right": [-1],
                        "feature": [-2],
                        "threshold": [-2.0],
                        "value": [[1.0, 1.0]]
                    }
                ]
            }
        });

        let m = ModelArtifact::from_json(&v.to_string()).unwrap();
        assert_eq!(m.estimator.kind(), "random_forest");
        // hot: (0.75 + 0.5) / 2
        let hot = m.predict_proba(&features(40.0)).unwrap();
        assert!((hot[1] - 0.625).abs() < 1e-12);
        // mild: (0.0 + 0.5) / 2
        let mild = m.predict_proba(&features(20.0)).unwrap();
        assert!((mild[1] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn gradient_boosting_sums_leaves_through_sigmoid() {
        let v = json!({
            "name": "gb-test",
            "feature_names": names(),
            "estimator": {
                "type": "gradient_boosting",
                "init": -1.0,
                "learning_rate": 0.5,
                "trees": [
                    {
                        "children_left": [1, -1, -1],
                        "children_right": [2, -1, -1],
                        "feature": [0, -2, -2],
                        "threshold": [35.0, -2.0, -2.0],
                        "value": [0.0, -1.0, 3.0]
                    }
                ]
            }
        });

        let m = ModelArtifact::from_json(&v.to_string()).unwrap();
        let hot = m.heatwave_probability(&features(40.0)).unwrap();
        assert!((hot - sigmoid(-1.0 + 0.5 * 3.0)).abs() < 1e-12);
        let mild = m.heatwave_probability(&features(20.0)).unwrap();
        assert!((mild - sigmoid(-1.0 - 0.5)).abs() < 1e-12);
    }

    #[test]
    fn nan_features_propagate_without_error() {
        let m = ModelArtifact::from_json(&logistic_on_temp().to_string()).unwrap();
        let p = m.heatwave_probability(&features(f64::NAN)).unwrap();
        assert!(p.is_nan());
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(logistic_on_temp().to_string().as_bytes())
            .unwrap();

        let m = ModelArtifact::load(file.path()).unwrap();
        assert_eq!(m.name(), "lr-test");
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = ModelArtifact::load("/definitely/not/here/model.json").unwrap_err();
        assert!(format!("{err:#}").contains("/definitely/not/here/model.json"));
    }

    #[test]
    fn shipped_fixture_loads_and_is_labelled_untrained() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../model/heatwave_model.fixture.json");
        let m = ModelArtifact::load(&path).unwrap();
        assert!(m.name().contains("untrained-fixture"));
        assert_eq!(m.estimator.kind(), "logistic_regression");
    }
}
