//! Model scorers.
//!
//! The pipeline treats the trained model as an opaque scorer: a finalized
//! feature vector goes in, a log1p-scale prediction comes out. The concrete
//! representation lives in the bundle as a tagged [`ScorerSpec`] and is built
//! into a [`Scorer`] trait object once at startup.

use crate::error::FirsatError;
use crate::row::FeatureVector;
use serde::{Deserialize, Serialize};

/// A pre-trained regression scorer. Predictions are on the log1p scale of
/// the target price; callers apply `exp_m1` to get the fair value.
pub trait Scorer: Send + Sync {
    fn kind(&self) -> &'static str;

    fn predict(&self, row: &FeatureVector) -> Result<f64, FirsatError>;
}

/// Serialized scorer variants a bundle may carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScorerSpec {
    TreeEnsemble(TreeEnsemble),
    Constant { value: f64 },
}

impl ScorerSpec {
    pub fn build(&self) -> Box<dyn Scorer> {
        match self {
            Self::TreeEnsemble(ensemble) => Box::new(ensemble.clone()),
            Self::Constant { value } => Box::new(ConstantScorer { value: *value }),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::TreeEnsemble(_) => "tree_ensemble",
            Self::Constant { .. } => "constant",
        }
    }
}

/// Additive regression trees: prediction = base score + sum of leaf values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEnsemble {
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<Tree>,
}

/// One regression tree, nodes stored flat with node 0 as the root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    /// Numeric test: `value < threshold` goes left. A cell that cannot be
    /// read as a number follows `default_left`.
    NumericSplit {
        feature: String,
        threshold: f64,
        left: usize,
        right: usize,
        #[serde(default)]
        default_left: bool,
    },
    /// Category test: equality goes left, everything else right.
    CategorySplit {
        feature: String,
        category: String,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

impl Tree {
    fn score(&self, row: &FeatureVector) -> Result<f64, FirsatError> {
        let mut index = 0usize;
        // A well-formed tree reaches a leaf in fewer steps than it has nodes.
        for _ in 0..=self.nodes.len() {
            let node = self.nodes.get(index).ok_or_else(|| {
                FirsatError::prediction(format!("tree node index {index} out of range"))
            })?;
            match node {
                TreeNode::Leaf { value } => return Ok(*value),
                TreeNode::NumericSplit {
                    feature,
                    threshold,
                    left,
                    right,
                    default_left,
                } => {
                    if row.get(feature).is_none() {
                        return Err(FirsatError::prediction(format!(
                            "scorer references unknown feature '{feature}'"
                        )));
                    }
                    index = match row.get_f64(feature) {
                        Some(v) if v < *threshold => *left,
                        Some(_) => *right,
                        None if *default_left => *left,
                        None => *right,
                    };
                }
                TreeNode::CategorySplit {
                    feature,
                    category,
                    left,
                    right,
                } => {
                    if row.get(feature).is_none() {
                        return Err(FirsatError::prediction(format!(
                            "scorer references unknown feature '{feature}'"
                        )));
                    }
                    index = match row.get_text(feature) {
                        Some(v) if v == *category => *left,
                        _ => *right,
                    };
                }
            }
        }
        Err(FirsatError::prediction(
            "tree traversal did not reach a leaf".to_string(),
        ))
    }
}

impl Scorer for TreeEnsemble {
    fn kind(&self) -> &'static str {
        "tree_ensemble"
    }

    fn predict(&self, row: &FeatureVector) -> Result<f64, FirsatError> {
        let mut total = self.base_score;
        for tree in &self.trees {
            total += tree.score(row)?;
        }
        Ok(total)
    }
}

/// Fixed-output scorer, used by smoke-test bundles.
#[derive(Debug, Clone, Copy)]
pub struct ConstantScorer {
    pub value: f64,
}

impl Scorer for ConstantScorer {
    fn kind(&self) -> &'static str {
        "constant"
    }

    fn predict(&self, _row: &FeatureVector) -> Result<f64, FirsatError> {
        Ok(self.value)
    }
}
