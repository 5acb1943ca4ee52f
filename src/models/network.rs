// 🕸️ Sequence Network - Tiny embedding classifier trained on-CPU
//
// embedding → encoder → dense(relu)+dropout … → dense(1, sigmoid)
//
// Encoder is either global average pooling over every position or a 1D
// convolution (relu) followed by global max pooling. Padding (id 0) is an
// ordinary token: it has an embedding and takes part in pooling.
//
// Training: Adam, binary cross-entropy, mini-batches, validation rows taken
// from the tail of the input, optional early stopping on validation accuracy
// with best-weight restore.

use crate::metrics::{binary_metrics, log_loss, BinaryMetrics};
use anyhow::{bail, Context, Result};
use ndarray::{s, Array1, Array2, ArrayViewD, ArrayViewMutD, Axis, Zip};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Encoder {
    AveragePooling,
    Convolution { filters: usize, kernel: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseSpec {
    pub units: usize,
    /// Dropout rate applied to this layer's output while training
    pub dropout: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub vocab_size: usize,
    pub max_length: usize,
    pub embedding_dim: usize,
    pub encoder: Encoder,
    pub hidden: Vec<DenseSpec>,
}

impl NetworkConfig {
    fn validate(&self) -> Result<()> {
        if self.vocab_size < 2 {
            bail!("vocab_size must be at least 2 (got {})", self.vocab_size);
        }
        if self.max_length == 0 || self.embedding_dim == 0 {
            bail!("max_length and embedding_dim must be positive");
        }
        if let Encoder::Convolution { filters, kernel } = self.encoder {
            if filters == 0 || kernel == 0 {
                bail!("convolution needs at least one filter and a positive kernel");
            }
            if kernel > self.max_length {
                bail!("kernel {} is wider than max_length {}", kernel, self.max_length);
            }
        }
        if self.hidden.iter().any(|h| h.units == 0 || !(0.0..1.0).contains(&h.dropout)) {
            bail!("hidden layers need units > 0 and dropout in [0, 1)");
        }
        Ok(())
    }

    fn encoder_width(&self) -> usize {
        match self.encoder {
            Encoder::AveragePooling => self.embedding_dim,
            Encoder::Convolution { filters, .. } => filters,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingOptions {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f32,
    pub validation_split: f64,
    /// Stop after this many epochs without a better validation accuracy
    pub early_stopping_patience: Option<usize>,
    pub seed: u64,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        TrainingOptions {
            epochs: 20,
            batch_size: 32,
            learning_rate: 0.001,
            validation_split: 0.2,
            early_stopping_patience: None,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochStats {
    pub epoch: usize,
    pub loss: f64,
    pub accuracy: f64,
    pub val_loss: Option<f64>,
    pub val_accuracy: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochStats>,
    /// 1-based epoch whose weights were kept
    pub best_epoch: usize,
    pub stopped_early: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Evaluation {
    pub loss: f64,
    pub metrics: BinaryMetrics,
}

// ============================================================================
// WEIGHTS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dense {
    /// `inputs × units`
    pub kernel: Array2<f32>,
    pub bias: Array1<f32>,
}

impl Dense {
    fn glorot<R: Rng>(inputs: usize, units: usize, rng: &mut R) -> Self {
        let limit = (6.0 / (inputs + units) as f32).sqrt();
        Dense {
            kernel: Array2::from_shape_fn((inputs, units), |_| rng.gen_range(-limit..limit)),
            bias: Array1::zeros(units),
        }
    }

    fn forward(&self, input: &Array1<f32>) -> Array1<f32> {
        input.dot(&self.kernel) + &self.bias
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Weights {
    /// `vocab_size × embedding_dim`
    pub embedding: Array2<f32>,
    /// `(kernel · embedding_dim) × filters`, empty without convolution
    pub conv_kernel: Array2<f32>,
    pub conv_bias: Array1<f32>,
    /// Hidden layers followed by the single-unit output layer
    pub layers: Vec<Dense>,
}

impl Weights {
    fn zeros_like(&self) -> Weights {
        Weights {
            embedding: Array2::zeros(self.embedding.raw_dim()),
            conv_kernel: Array2::zeros(self.conv_kernel.raw_dim()),
            conv_bias: Array1::zeros(self.conv_bias.raw_dim()),
            layers: self
                .layers
                .iter()
                .map(|l| Dense {
                    kernel: Array2::zeros(l.kernel.raw_dim()),
                    bias: Array1::zeros(l.bias.raw_dim()),
                })
                .collect(),
        }
    }

    fn tensors(&self) -> Vec<ArrayViewD<'_, f32>> {
        let mut out = vec![
            self.embedding.view().into_dyn(),
            self.conv_kernel.view().into_dyn(),
            self.conv_bias.view().into_dyn(),
        ];
        for layer in &self.layers {
            out.push(layer.kernel.view().into_dyn());
            out.push(layer.bias.view().into_dyn());
        }
        out
    }

    fn tensors_mut(&mut self) -> Vec<ArrayViewMutD<'_, f32>> {
        let mut out = vec![
            self.embedding.view_mut().into_dyn(),
            self.conv_kernel.view_mut().into_dyn(),
            self.conv_bias.view_mut().into_dyn(),
        ];
        for layer in &mut self.layers {
            out.push(layer.kernel.view_mut().into_dyn());
            out.push(layer.bias.view_mut().into_dyn());
        }
        out
    }

    fn clear(&mut self) {
        for mut t in self.tensors_mut() {
            t.fill(0.0);
        }
    }

    fn scale(&mut self, factor: f32) {
        for mut t in self.tensors_mut() {
            t.mapv_inplace(|g| g * factor);
        }
    }

    pub fn parameter_count(&self) -> usize {
        self.tensors().iter().map(|t| t.len()).sum()
    }
}

struct Adam {
    lr: f32,
    beta1: f32,
    beta2: f32,
    eps: f32,
    t: i32,
    m: Weights,
    v: Weights,
}

impl Adam {
    fn new(weights: &Weights, lr: f32) -> Self {
        Adam {
            lr,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-7,
            t: 0,
            m: weights.zeros_like(),
            v: weights.zeros_like(),
        }
    }

    fn step(&mut self, weights: &mut Weights, grads: &Weights) {
        self.t += 1;
        let (b1, b2, eps) = (self.beta1, self.beta2, self.eps);
        let lr_t = self.lr * (1.0 - b2.powi(self.t)).sqrt() / (1.0 - b1.powi(self.t));

        let tensors = weights
            .tensors_mut()
            .into_iter()
            .zip(grads.tensors())
            .zip(self.m.tensors_mut())
            .zip(self.v.tensors_mut());
        for (((p, g), m), v) in tensors {
            Zip::from(p).and(g).and(m).and(v).for_each(|p, &g, m, v| {
                *m = b1 * *m + (1.0 - b1) * g;
                *v = b2 * *v + (1.0 - b2) * g * g;
                *p -= lr_t * *m / (v.sqrt() + eps);
            });
        }
    }
}

// ============================================================================
// NETWORK
// ============================================================================

/// Values kept from the forward pass for backprop
struct Trace {
    ids: Vec<usize>,
    /// Convolution only: one flattened window per row
    patches: Option<Array2<f32>>,
    /// Convolution only: winning window per filter (None when relu clipped it)
    argmax: Vec<Option<usize>>,
    /// Input to each dense layer (after dropout)
    inputs: Vec<Array1<f32>>,
    /// Relu output of each hidden layer (before dropout)
    activations: Vec<Array1<f32>>,
    masks: Vec<Array1<f32>>,
    p_income: f32,
}

struct Encoded {
    features: Array1<f32>,
    patches: Option<Array2<f32>>,
    argmax: Vec<Option<usize>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceNetwork {
    pub config: NetworkConfig,
    pub weights: Weights,
}

impl SequenceNetwork {
    pub fn new(config: NetworkConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(seed);
        let d = config.embedding_dim;

        let embedding = Array2::from_shape_fn((config.vocab_size, d), |_| rng.gen_range(-0.05f32..0.05));

        let (conv_kernel, conv_bias) = match config.encoder {
            Encoder::AveragePooling => (Array2::zeros((0, 0)), Array1::zeros(0)),
            Encoder::Convolution { filters, kernel } => {
                let limit = (6.0 / ((kernel * d + kernel * filters) as f32)).sqrt();
                let w = Array2::from_shape_fn((kernel * d, filters), |_| rng.gen_range(-limit..limit));
                (w, Array1::zeros(filters))
            }
        };

        let mut layers = Vec::with_capacity(config.hidden.len() + 1);
        let mut width = config.encoder_width();
        for spec in &config.hidden {
            layers.push(Dense::glorot(width, spec.units, &mut rng));
            width = spec.units;
        }
        layers.push(Dense::glorot(width, 1, &mut rng));

        Ok(SequenceNetwork {
            config,
            weights: Weights {
                embedding,
                conv_kernel,
                conv_bias,
                layers,
            },
        })
    }

    /// Weight shapes agree with the config
    fn check_shapes(&self) -> Result<()> {
        let c = &self.config;
        let w = &self.weights;
        let d = c.embedding_dim;

        if w.embedding.dim() != (c.vocab_size, d) {
            bail!("embedding is {:?}, config wants ({}, {})", w.embedding.dim(), c.vocab_size, d);
        }
        if let Encoder::Convolution { filters, kernel } = c.encoder {
            if w.conv_kernel.dim() != (kernel * d, filters) || w.conv_bias.len() != filters {
                bail!("convolution weights do not match {} filters × {}", filters, kernel);
            }
        }

        let units: Vec<usize> = c.hidden.iter().map(|h| h.units).chain([1]).collect();
        if w.layers.len() != units.len() {
            bail!("{} dense layers, config wants {}", w.layers.len(), units.len());
        }
        let mut width = c.encoder_width();
        for (i, (layer, &u)) in w.layers.iter().zip(&units).enumerate() {
            if layer.kernel.dim() != (width, u) || layer.bias.len() != u {
                bail!("dense layer {} is {:?}, config wants ({}, {})", i, layer.kernel.dim(), width, u);
            }
            width = u;
        }
        Ok(())
    }

    /// Normalise a sequence to `max_length` ids inside the vocabulary
    fn prepare(&self, ids: &[u32]) -> Vec<usize> {
        let vocab = self.config.vocab_size;
        let mut out: Vec<usize> = ids
            .iter()
            .take(self.config.max_length)
            .map(|&id| if (id as usize) < vocab { id as usize } else { 1 })
            .collect();
        out.resize(self.config.max_length, 0);
        out
    }

    fn encode(&self, ids: &[usize]) -> Encoded {
        let d = self.config.embedding_dim;
        let embedding = &self.weights.embedding;
        match self.config.encoder {
            Encoder::AveragePooling => Encoded {
                features: embedding
                    .select(Axis(0), ids)
                    .mean_axis(Axis(0))
                    .unwrap_or_else(|| Array1::zeros(d)),
                patches: None,
                argmax: Vec::new(),
            },
            Encoder::Convolution { filters, kernel } => {
                let windows = ids.len() - kernel + 1;
                // windows past the last real token are all padding and identical
                let real = ids.iter().rposition(|&id| id != 0).map_or(0, |p| p + 1);
                let distinct = windows.min(real + 1);

                let mut patches = Array2::<f32>::zeros((distinct, kernel * d));
                for pos in 0..distinct {
                    for k in 0..kernel {
                        patches
                            .slice_mut(s![pos, k * d..(k + 1) * d])
                            .assign(&embedding.row(ids[pos + k]));
                    }
                }
                let z = patches.dot(&self.weights.conv_kernel) + &self.weights.conv_bias;

                let mut features = Array1::zeros(filters);
                let mut argmax = vec![None; filters];
                for (f, column) in z.columns().into_iter().enumerate() {
                    let (best_pos, best) = column
                        .iter()
                        .enumerate()
                        .fold((0, f32::NEG_INFINITY), |acc, (i, &v)| if v > acc.1 { (i, v) } else { acc });
                    if best > 0.0 {
                        features[f] = best;
                        argmax[f] = Some(best_pos);
                    }
                }
                Encoded {
                    features,
                    patches: Some(patches),
                    argmax,
                }
            }
        }
    }

    fn forward<R: Rng>(&self, ids: Vec<usize>, mut dropout_rng: Option<&mut R>) -> Trace {
        let encoded = self.encode(&ids);
        let n_hidden = self.config.hidden.len();

        let mut inputs = Vec::with_capacity(n_hidden + 1);
        let mut activations = Vec::with_capacity(n_hidden);
        let mut masks = Vec::with_capacity(n_hidden);
        let mut x = encoded.features;

        for (layer, spec) in self.weights.layers[..n_hidden].iter().zip(&self.config.hidden) {
            let a = layer.forward(&x).mapv(|v| v.max(0.0));
            let mask = match dropout_rng.as_deref_mut() {
                Some(rng) if spec.dropout > 0.0 => {
                    let keep = 1.0 - spec.dropout;
                    Array1::from_shape_fn(a.len(), |_| if rng.gen_bool(keep) { (1.0 / keep) as f32 } else { 0.0 })
                }
                _ => Array1::ones(a.len()),
            };
            let dropped = &a * &mask;
            inputs.push(x);
            activations.push(a);
            masks.push(mask);
            x = dropped;
        }

        let z = self.weights.layers[n_hidden].forward(&x)[0];
        inputs.push(x);

        Trace {
            ids,
            patches: encoded.patches,
            argmax: encoded.argmax,
            inputs,
            activations,
            masks,
            p_income: crate::models::logistic::sigmoid(f64::from(z)) as f32,
        }
    }

    /// Accumulate d(loss)/d(weights) for one example into `grads`
    fn backward(&self, trace: &Trace, label: u8, grads: &mut Weights) {
        let n_hidden = self.config.hidden.len();
        // sigmoid + binary cross-entropy
        let mut delta = Array1::from_elem(1, trace.p_income - f32::from(label));

        for idx in (0..=n_hidden).rev() {
            let layer = &self.weights.layers[idx];
            let input = &trace.inputs[idx];
            let g = &mut grads.layers[idx];

            g.bias += &delta;
            g.kernel += &input
                .view()
                .insert_axis(Axis(1))
                .dot(&delta.view().insert_axis(Axis(0)));

            let mut d_input = layer.kernel.dot(&delta);
            if idx > 0 {
                // through dropout and relu of the previous hidden layer
                let prev = idx - 1;
                Zip::from(&mut d_input)
                    .and(&trace.masks[prev])
                    .and(&trace.activations[prev])
                    .for_each(|di, &m, &a| *di = if a > 0.0 { *di * m } else { 0.0 });
            }
            delta = d_input;
        }

        self.backward_encoder(trace, &delta, grads);
    }

    fn backward_encoder(&self, trace: &Trace, d_encoded: &Array1<f32>, grads: &mut Weights) {
        let d = self.config.embedding_dim;
        match self.config.encoder {
            Encoder::AveragePooling => {
                let share = 1.0 / trace.ids.len() as f32;
                for &id in &trace.ids {
                    grads.embedding.row_mut(id).scaled_add(share, d_encoded);
                }
            }
            Encoder::Convolution { filters, kernel } => {
                let Some(patches) = &trace.patches else { return };
                let mut d_z = Array2::<f32>::zeros((patches.nrows(), filters));
                for (f, pos) in trace.argmax.iter().enumerate() {
                    if let Some(pos) = *pos {
                        d_z[[pos, f]] = d_encoded[f];
                    }
                }

                grads.conv_bias += &d_z.sum_axis(Axis(0));
                grads.conv_kernel += &patches.t().dot(&d_z);

                let d_patches = d_z.dot(&self.weights.conv_kernel.t());
                for (pos, row) in d_patches.rows().into_iter().enumerate() {
                    for k in 0..kernel {
                        grads
                            .embedding
                            .row_mut(trace.ids[pos + k])
                            .scaled_add(1.0, &row.slice(s![k * d..(k + 1) * d]));
                    }
                }
            }
        }
    }

    pub fn predict_proba(&self, ids: &[u32]) -> f64 {
        let trace = self.forward::<StdRng>(self.prepare(ids), None);
        f64::from(trace.p_income)
    }

    pub fn evaluate(&self, sequences: &[Vec<u32>], labels: &[u8]) -> Evaluation {
        let probs: Vec<f64> = sequences.iter().map(|s| self.predict_proba(s)).collect();
        let predicted: Vec<u8> = probs.iter().map(|&p| u8::from(p >= 0.5)).collect();
        Evaluation {
            loss: log_loss(labels, &probs),
            metrics: binary_metrics(labels, &predicted),
        }
    }

    pub fn fit(
        &mut self,
        sequences: &[Vec<u32>],
        labels: &[u8],
        options: &TrainingOptions,
    ) -> Result<TrainingHistory> {
        if sequences.len() != labels.len() {
            bail!("Sequence/label count mismatch: {} vs {}", sequences.len(), labels.len());
        }
        if sequences.is_empty() || options.batch_size == 0 {
            bail!("Training needs at least one sequence and a positive batch size");
        }

        let n_val = (sequences.len() as f64 * options.validation_split).floor() as usize;
        let n_train = sequences.len() - n_val;
        if n_train == 0 {
            bail!("validation_split {} leaves no training rows", options.validation_split);
        }
        let (train_x, val_x) = sequences.split_at(n_train);
        let (train_y, val_y) = labels.split_at(n_train);
        let prepared: Vec<Vec<usize>> = train_x.iter().map(|s| self.prepare(s)).collect();

        let mut rng = StdRng::seed_from_u64(options.seed);
        let mut adam = Adam::new(&self.weights, options.learning_rate);
        let mut grads = self.weights.zeros_like();
        let mut order: Vec<usize> = (0..n_train).collect();

        let mut history = TrainingHistory::default();
        let mut best_score = f64::NEG_INFINITY;
        let mut best_weights = self.weights.clone();
        let mut since_best = 0usize;

        for epoch in 1..=options.epochs {
            order.shuffle(&mut rng);
            let mut loss_sum = 0.0f64;
            let mut correct = 0usize;

            for batch in order.chunks(options.batch_size) {
                grads.clear();
                for &i in batch {
                    let trace = self.forward(prepared[i].clone(), Some(&mut rng));
                    let p = f64::from(trace.p_income).clamp(1e-7, 1.0 - 1e-7);
                    loss_sum += if train_y[i] == 1 { -p.ln() } else { -(1.0 - p).ln() };
                    correct += usize::from(u8::from(p >= 0.5) == train_y[i]);
                    self.backward(&trace, train_y[i], &mut grads);
                }
                grads.scale(1.0 / batch.len() as f32);
                adam.step(&mut self.weights, &grads);
            }

            let mut stats = EpochStats {
                epoch,
                loss: loss_sum / n_train as f64,
                accuracy: correct as f64 / n_train as f64,
                val_loss: None,
                val_accuracy: None,
            };
            if n_val > 0 {
                let eval = self.evaluate(val_x, val_y);
                stats.val_loss = Some(eval.loss);
                stats.val_accuracy = Some(eval.metrics.accuracy);
            }

            tracing::info!(
                epoch,
                loss = stats.loss,
                accuracy = stats.accuracy,
                val_accuracy = ?stats.val_accuracy,
                "epoch finished"
            );

            let monitored = stats.val_accuracy.unwrap_or(stats.accuracy);
            history.epochs.push(stats);

            if monitored > best_score {
                best_score = monitored;
                best_weights = self.weights.clone();
                history.best_epoch = epoch;
                since_best = 0;
            } else {
                since_best += 1;
                if options.early_stopping_patience.map_or(false, |p| since_best >= p) {
                    history.stopped_early = true;
                    tracing::info!(epoch, best_epoch = history.best_epoch, "early stopping");
                    break;
                }
            }
        }

        if options.early_stopping_patience.is_some() {
            self.weights = best_weights;
        } else {
            history.best_epoch = history.epochs.len();
        }

        Ok(history)
    }

    pub fn parameter_count(&self) -> usize {
        self.weights.parameter_count()
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string(self).context("Failed to serialize network")?;
        fs::write(path.as_ref(), json)
            .with_context(|| format!("Failed to write network: {:?}", path.as_ref()))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read network: {:?}", path.as_ref()))?;
        let network: SequenceNetwork =
            serde_json::from_str(&content).context("Failed to parse network JSON")?;
        network.config.validate()?;
        network
            .check_shapes()
            .with_context(|| format!("Network weights do not fit their config: {:?}", path.as_ref()))?;
        Ok(network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_data() -> (Vec<Vec<u32>>, Vec<u8>) {
        // token 2 → income, token 3 → expense
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for i in 0..40u32 {
            let filler = 4 + (i % 5);
            if i % 2 == 0 {
                xs.push(vec![filler, 2, filler]);
                ys.push(1);
            } else {
                xs.push(vec![filler, 3, filler]);
                ys.push(0);
            }
        }
        (xs, ys)
    }

    fn avg_config() -> NetworkConfig {
        NetworkConfig {
            vocab_size: 10,
            max_length: 6,
            embedding_dim: 8,
            encoder: Encoder::AveragePooling,
            hidden: vec![DenseSpec { units: 8, dropout: 0.0 }],
        }
    }

    fn conv_config() -> NetworkConfig {
        NetworkConfig {
            encoder: Encoder::Convolution { filters: 6, kernel: 3 },
            hidden: vec![DenseSpec { units: 4, dropout: 0.2 }],
            ..avg_config()
        }
    }

    #[test]
    fn test_config_validation() {
        let mut bad = conv_config();
        bad.encoder = Encoder::Convolution { filters: 2, kernel: 9 };
        assert!(SequenceNetwork::new(bad, 0).is_err());

        let mut bad = avg_config();
        bad.vocab_size = 1;
        assert!(SequenceNetwork::new(bad, 0).is_err());
    }

    #[test]
    fn test_parameter_count() {
        let net = SequenceNetwork::new(conv_config(), 0).unwrap();
        // embedding 80 + conv 6*3*8+6 + dense 6*4+4 + out 4+1
        assert_eq!(net.parameter_count(), 80 + 150 + 28 + 5);
    }

    #[test]
    fn test_predictions_are_probabilities() {
        let net = SequenceNetwork::new(conv_config(), 1).unwrap();
        for seq in [vec![], vec![2, 3], vec![99, 1, 2, 3, 4, 5, 6, 7, 8]] {
            let p = net.predict_proba(&seq);
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn test_average_network_learns_toy_task() {
        let (xs, ys) = toy_data();
        let mut net = SequenceNetwork::new(avg_config(), 3).unwrap();
        let options = TrainingOptions {
            epochs: 60,
            batch_size: 4,
            learning_rate: 0.01,
            validation_split: 0.0,
            ..Default::default()
        };
        let history = net.fit(&xs, &ys, &options).unwrap();

        assert_eq!(history.epochs.len(), 60);
        assert!(net.evaluate(&xs, &ys).metrics.accuracy >= 0.95);
    }

    #[test]
    fn test_conv_network_learns_toy_task() {
        let (xs, ys) = toy_data();
        let mut net = SequenceNetwork::new(conv_config(), 5).unwrap();
        let options = TrainingOptions {
            epochs: 80,
            batch_size: 4,
            learning_rate: 0.01,
            validation_split: 0.0,
            ..Default::default()
        };
        net.fit(&xs, &ys, &options).unwrap();
        assert!(net.evaluate(&xs, &ys).metrics.accuracy >= 0.9);
    }

    #[test]
    fn test_early_stopping_restores_best() {
        let (xs, ys) = toy_data();
        let mut net = SequenceNetwork::new(avg_config(), 9).unwrap();
        let options = TrainingOptions {
            epochs: 200,
            batch_size: 8,
            learning_rate: 0.05,
            validation_split: 0.25,
            early_stopping_patience: Some(3),
            ..Default::default()
        };
        let history = net.fit(&xs, &ys, &options).unwrap();

        assert!(history.stopped_early);
        assert!(history.best_epoch >= 1 && history.best_epoch < history.epochs.len());
        let best = history.epochs[history.best_epoch - 1].val_accuracy.unwrap();
        assert!(history.epochs.iter().all(|e| e.val_accuracy.unwrap() <= best));
    }

    #[test]
    fn test_save_load_keeps_predictions() {
        let net = SequenceNetwork::new(conv_config(), 11).unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("net.json");
        net.save(&path).unwrap();
        let loaded = SequenceNetwork::load(&path).unwrap();
        assert_eq!(net.predict_proba(&[2, 4, 6]), loaded.predict_proba(&[2, 4, 6]));
    }

    #[test]
    fn test_load_rejects_weights_of_another_shape() {
        let mut net = SequenceNetwork::new(avg_config(), 11).unwrap();
        net.config.vocab_size = 12;
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("net.json");
        net.save(&path).unwrap();

        let err = SequenceNetwork::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("embedding is (10, 8)"));
    }

    #[test]
    fn test_conv_gradient_matches_finite_difference() {
        let net = SequenceNetwork::new(conv_config(), 13).unwrap();
        let ids = net.prepare(&[4, 2, 7]);
        let label = 1u8;
        let loss = |n: &SequenceNetwork| {
            let p = f64::from(n.forward::<StdRng>(ids.clone(), None).p_income);
            -p.ln()
        };

        let mut grads = net.weights.zeros_like();
        net.backward(&net.forward::<StdRng>(ids.clone(), None), label, &mut grads);

        // token 2 feeds the first two windows
        let eps = 1e-3f32;
        for j in 0..3 {
            let mut plus = net.clone();
            plus.weights.embedding[[2, j]] += eps;
            let mut minus = net.clone();
            minus.weights.embedding[[2, j]] -= eps;
            let numeric = (loss(&plus) - loss(&minus)) / (2.0 * f64::from(eps));
            let analytic = f64::from(grads.embedding[[2, j]]);
            assert!((numeric - analytic).abs() < 1e-2, "{} vs {}", numeric, analytic);
        }
    }
}
