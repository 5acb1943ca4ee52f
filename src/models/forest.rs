// 🌲 Random Forest - Bagged gini decision trees
//
// Trees grow until pure (or until min_samples_split / min_samples_leaf stop
// them). Each split looks at √features candidates; when none of them can
// split, the remaining features are tried before giving up.

use super::Classifier;
use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// ============================================================================
// PARAMETERS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features considered per split (None = √n_features)
    pub max_features: Option<usize>,
    pub bootstrap: bool,
}

impl Default for ForestParams {
    fn default() -> Self {
        ForestParams {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
        }
    }
}

impl ForestParams {
    fn features_per_split(&self, n_features: usize) -> usize {
        self.max_features
            .unwrap_or_else(|| (n_features as f64).sqrt() as usize)
            .clamp(1, n_features.max(1))
    }
}

// ============================================================================
// DECISION TREE
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Leaf {
        p_income: f64,
        samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<Node>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

fn gini(income: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let p = income as f64 / total as f64;
    2.0 * p * (1.0 - p)
}

impl DecisionTree {
    pub fn fit<R: Rng>(
        rows: &[Vec<f64>],
        labels: &[u8],
        indices: Vec<usize>,
        params: &ForestParams,
        rng: &mut R,
    ) -> Self {
        let mut tree = DecisionTree { nodes: Vec::new() };
        tree.grow(rows, labels, indices, 0, params, rng);
        tree
    }

    /// Grow the subtree for `indices`, returning its node id
    fn grow<R: Rng>(
        &mut self,
        rows: &[Vec<f64>],
        labels: &[u8],
        indices: Vec<usize>,
        depth: usize,
        params: &ForestParams,
        rng: &mut R,
    ) -> usize {
        let total = indices.len();
        let income = indices.iter().filter(|&&i| labels[i] == 1).count();
        let leaf = Node::Leaf {
            p_income: if total == 0 { 0.0 } else { income as f64 / total as f64 },
            samples: total,
        };

        let pure = income == 0 || income == total;
        let depth_reached = params.max_depth.map_or(false, |d| depth >= d);
        if pure || depth_reached || total < params.min_samples_split {
            self.nodes.push(leaf);
            return self.nodes.len() - 1;
        }

        let Some(best) = Self::find_split(rows, labels, &indices, params, rng) else {
            self.nodes.push(leaf);
            return self.nodes.len() - 1;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| rows[i][best.feature] <= best.threshold);
        if left_idx.is_empty() || right_idx.is_empty() {
            self.nodes.push(leaf);
            return self.nodes.len() - 1;
        }

        // reserve our slot before the children take theirs
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { p_income: 0.0, samples: total });
        let left = self.grow(rows, labels, left_idx, depth + 1, params, rng);
        let right = self.grow(rows, labels, right_idx, depth + 1, params, rng);
        self.nodes[id] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        id
    }

    fn find_split<R: Rng>(
        rows: &[Vec<f64>],
        labels: &[u8],
        indices: &[usize],
        params: &ForestParams,
        rng: &mut R,
    ) -> Option<BestSplit> {
        let n_features = rows.first().map_or(0, Vec::len);
        let wanted = params.features_per_split(n_features);
        let mut features: Vec<usize> = (0..n_features).collect();
        features.shuffle(rng);

        let total = indices.len();
        let total_income = indices.iter().filter(|&&i| labels[i] == 1).count();
        let mut best: Option<BestSplit> = None;
        let mut values: Vec<(f64, u8)> = Vec::with_capacity(total);

        for (visited, &feature) in features.iter().enumerate() {
            if visited >= wanted && best.is_some() {
                break;
            }

            values.clear();
            values.extend(indices.iter().map(|&i| (rows[i][feature], labels[i])));
            values.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_income = 0usize;
            for pos in 0..total - 1 {
                left_income += usize::from(values[pos].1 == 1);
                let left_n = pos + 1;
                let right_n = total - left_n;

                if values[pos].0 == values[pos + 1].0 {
                    continue;
                }
                if left_n < params.min_samples_leaf || right_n < params.min_samples_leaf {
                    continue;
                }

                let impurity = (left_n as f64 * gini(left_income, left_n)
                    + right_n as f64 * gini(total_income - left_income, right_n))
                    / total as f64;

                if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                    let (lo, hi) = (values[pos].0, values[pos + 1].0);
                    let mid = (lo + hi) / 2.0;
                    best = Some(BestSplit {
                        feature,
                        threshold: if mid < hi { mid } else { lo },
                        impurity,
                    });
                }
            }
        }

        best
    }

    /// p(income) of the leaf the row lands in
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { p_income, .. } => return *p_income,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Node references point forward and splits read existing columns
    fn validate(&self, n_features: usize) -> Result<()> {
        if self.nodes.is_empty() {
            bail!("tree has no nodes");
        }
        for (id, node) in self.nodes.iter().enumerate() {
            if let Node::Split { feature, left, right, .. } = node {
                if *feature >= n_features {
                    bail!("node {} splits on feature {} of {}", id, feature, n_features);
                }
                for child in [*left, *right] {
                    if child <= id || child >= self.nodes.len() {
                        bail!("node {} points at invalid child {}", id, child);
                    }
                }
            }
        }
        Ok(())
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match &nodes[id] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }
}

// ============================================================================
// FOREST
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub params: ForestParams,
    pub n_features: usize,
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn new(params: ForestParams) -> Self {
        RandomForest {
            params,
            n_features: 0,
            trees: Vec::new(),
        }
    }

    pub fn fit(&mut self, rows: &[Vec<f64>], labels: &[u8], seed: u64) -> Result<()> {
        if rows.is_empty() {
            bail!("Cannot fit a forest on zero rows");
        }
        if rows.len() != labels.len() {
            bail!("Row/label count mismatch: {} vs {}", rows.len(), labels.len());
        }

        let n = rows.len();
        self.n_features = rows[0].len();
        let mut master = StdRng::seed_from_u64(seed);

        self.trees = (0..self.params.n_estimators)
            .map(|_| {
                let mut rng = StdRng::seed_from_u64(master.gen());
                let indices: Vec<usize> = if self.params.bootstrap {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                DecisionTree::fit(rows, labels, indices, &self.params, &mut rng)
            })
            .collect();

        tracing::debug!(
            trees = self.trees.len(),
            max_depth = self.trees.iter().map(DecisionTree::depth).max().unwrap_or(0),
            "random forest fitted"
        );
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string(self).context("Failed to serialize forest")?;
        fs::write(path.as_ref(), json)
            .with_context(|| format!("Failed to write forest: {:?}", path.as_ref()))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read forest: {:?}", path.as_ref()))?;
        let forest: RandomForest =
            serde_json::from_str(&content).context("Failed to parse forest JSON")?;
        forest
            .validate()
            .with_context(|| format!("Corrupt forest: {:?}", path.as_ref()))?;
        Ok(forest)
    }

    /// Structural checks on a deserialized forest
    pub fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            bail!("forest has no trees");
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features)
                .with_context(|| format!("tree {}", i))?;
        }
        Ok(())
    }
}

impl Classifier for RandomForest {
    fn predict_proba(&self, features: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict_proba(features)).sum();
        sum / self.trees.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xor_like() -> (Vec<Vec<f64>>, Vec<u8>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for _ in 0..10 {
            rows.push(vec![0.0, 0.0]);
            labels.push(0);
            rows.push(vec![1.0, 1.0]);
            labels.push(0);
            rows.push(vec![0.0, 1.0]);
            labels.push(1);
            rows.push(vec![1.0, 0.0]);
            labels.push(1);
        }
        (rows, labels)
    }

    #[test]
    fn test_single_tree_fits_xor() {
        let (rows, labels) = xor_like();
        let params = ForestParams {
            max_features: Some(2),
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(0);
        let tree = DecisionTree::fit(&rows, &labels, (0..rows.len()).collect(), &params, &mut rng);

        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.predict_proba(&[0.0, 1.0]), 1.0);
        assert_eq!(tree.predict_proba(&[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_pure_node_is_leaf() {
        let rows = vec![vec![1.0], vec![2.0]];
        let labels: Vec<u8> = vec![1, 1];
        let mut rng = StdRng::seed_from_u64(0);
        let tree = DecisionTree::fit(&rows, &labels, vec![0, 1], &ForestParams::default(), &mut rng);
        assert_eq!(tree.nodes.len(), 1);
    }

    #[test]
    fn test_forest_probabilities_and_score() {
        let (rows, labels) = xor_like();
        let mut forest = RandomForest::new(ForestParams {
            n_estimators: 15,
            ..Default::default()
        });
        forest.fit(&rows, &labels, 42).unwrap();

        assert_eq!(forest.trees.len(), 15);
        let p = forest.predict_proba(&[1.0, 0.0]);
        assert!((0.0..=1.0).contains(&p));
        assert!(forest.score(&rows, &labels) >= 0.75);
    }

    #[test]
    fn test_forest_save_load() {
        let (rows, labels) = xor_like();
        let mut forest = RandomForest::new(ForestParams {
            n_estimators: 3,
            ..Default::default()
        });
        forest.fit(&rows, &labels, 7).unwrap();

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("rf_model.json");
        forest.save(&path).unwrap();
        let loaded = RandomForest::load(&path).unwrap();

        for row in &rows {
            assert_eq!(forest.predict_proba(row), loaded.predict_proba(row));
        }
    }

    #[test]
    fn test_load_rejects_broken_trees() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("rf_model.json");

        let mut forest = RandomForest::new(ForestParams::default());
        forest.n_features = 2;
        forest.trees = vec![DecisionTree { nodes: Vec::new() }];
        forest.save(&path).unwrap();
        assert!(RandomForest::load(&path).is_err());

        forest.trees = vec![DecisionTree {
            nodes: vec![
                Node::Split { feature: 5, threshold: 0.5, left: 1, right: 2 },
                Node::Leaf { p_income: 0.0, samples: 1 },
                Node::Leaf { p_income: 1.0, samples: 1 },
            ],
        }];
        forest.save(&path).unwrap();
        let err = RandomForest::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("feature 5 of 2"));

        forest.trees = vec![DecisionTree {
            nodes: vec![Node::Split { feature: 0, threshold: 0.5, left: 0, right: 0 }],
        }];
        forest.save(&path).unwrap();
        assert!(RandomForest::load(&path).is_err());
    }
}
