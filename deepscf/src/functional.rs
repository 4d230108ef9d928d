/* Learned correction functionals.

   A functional maps the descriptor tensor (natm x width, one row per atom)
   to a scalar energy and returns dE/d(descriptor) of the same shape. The
   loaded model is a per-atom feed-forward network, E = sum_a net(x_a),
   read from a JSON artifact:

   {
     "activation": "tanh",
     "input_shift": [...],          optional, one per descriptor column
     "input_scale": [...],          optional
     "layers": [ {"weights": [[...], ...], "bias": [...]}, ... ],
     "output_scale": 1.0            optional
   }

   Weights are row-major out x in; the last layer has a single output and no
   activation.
*/

extern crate nalgebra as na;

use crate::error::{check_shape, DeepScfError, Result};
use na::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub trait CorrectionFunctional: Send + Sync {
    /// Descriptor width the functional was built for, if it is fixed.
    fn input_width(&self) -> Option<usize> {
        None
    }

    fn evaluate(&self, descriptors: &DMatrix<f64>) -> Result<f64> {
        self.evaluate_with_gradient(descriptors).map(|(e, _)| e)
    }

    fn evaluate_with_gradient(&self, descriptors: &DMatrix<f64>) -> Result<(f64, DMatrix<f64>)>;
}

impl<F: CorrectionFunctional + ?Sized> CorrectionFunctional for Box<F> {
    fn input_width(&self) -> Option<usize> {
        (**self).input_width()
    }

    fn evaluate(&self, descriptors: &DMatrix<f64>) -> Result<f64> {
        (**self).evaluate(descriptors)
    }

    fn evaluate_with_gradient(&self, descriptors: &DMatrix<f64>) -> Result<(f64, DMatrix<f64>)> {
        (**self).evaluate_with_gradient(descriptors)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroFunctional;

impl CorrectionFunctional for ZeroFunctional {
    fn evaluate(&self, _descriptors: &DMatrix<f64>) -> Result<f64> {
        Ok(0.0)
    }

    fn evaluate_with_gradient(&self, descriptors: &DMatrix<f64>) -> Result<(f64, DMatrix<f64>)> {
        Ok((0.0, DMatrix::zeros(descriptors.nrows(), descriptors.ncols())))
    }
}

/// `scale * Σ descriptors`.
#[derive(Debug, Clone, Copy)]
pub struct LinearFunctional {
    pub scale: f64,
}

impl CorrectionFunctional for LinearFunctional {
    fn evaluate_with_gradient(&self, descriptors: &DMatrix<f64>) -> Result<(f64, DMatrix<f64>)> {
        let energy = self.scale * descriptors.sum();
        Ok((energy, DMatrix::from_element(descriptors.nrows(), descriptors.ncols(), self.scale)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Tanh,
    Softplus,
    Silu,
}

impl Activation {
    pub fn value(self, x: f64) -> f64 {
        match self {
            Activation::Tanh => x.tanh(),
            // ln(1 + e^x) without overflow
            Activation::Softplus => x.max(0.0) + (-x.abs()).exp().ln_1p(),
            Activation::Silu => x * sigmoid(x),
        }
    }

    pub fn derivative(self, x: f64) -> f64 {
        match self {
            Activation::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
            Activation::Softplus => sigmoid(x),
            Activation::Silu => {
                let s = sigmoid(x);
                s * (1.0 + x * (1.0 - s))
            }
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LayerFile {
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ModelFile {
    activation: Activation,
    #[serde(default)]
    input_shift: Option<Vec<f64>>,
    #[serde(default)]
    input_scale: Option<Vec<f64>>,
    layers: Vec<LayerFile>,
    #[serde(default = "unit_scale")]
    output_scale: f64,
}

fn unit_scale() -> f64 {
    1.0
}

#[derive(Debug, Clone)]
pub struct DenseLayer {
    /// `out × in`.
    pub weights: DMatrix<f64>,
    pub bias: DVector<f64>,
}

impl DenseLayer {
    pub fn new(weights: DMatrix<f64>, bias: DVector<f64>) -> Result<Self> {
        if bias.len() != weights.nrows() {
            return Err(DeepScfError::Config(format!(
                "layer has {} outputs but {} biases",
                weights.nrows(),
                bias.len()
            )));
        }
        Ok(Self { weights, bias })
    }
}

/// Per-atom network `E = output_scale * Σ_a net((x_a - shift) / scale)`.
#[derive(Debug, Clone)]
pub struct AtomicMlp {
    activation: Activation,
    shift: DVector<f64>,
    scale: DVector<f64>,
    layers: Vec<DenseLayer>,
    output_scale: f64,
}

impl AtomicMlp {
    pub fn new(activation: Activation, layers: Vec<DenseLayer>, output_scale: f64) -> Result<Self> {
        let width = layers
            .first()
            .map(|l| l.weights.ncols())
            .ok_or_else(|| DeepScfError::Config("model has no layers".to_string()))?;
        let mlp = Self {
            activation,
            shift: DVector::zeros(width),
            scale: DVector::from_element(width, 1.0),
            layers,
            output_scale,
        };
        mlp.validate()?;
        Ok(mlp)
    }

    pub fn with_normalization(mut self, shift: DVector<f64>, scale: DVector<f64>) -> Result<Self> {
        self.shift = shift;
        self.scale = scale;
        self.validate()?;
        Ok(self)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| DeepScfError::Config(format!("cannot read model {}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let file: ModelFile =
            serde_json::from_str(text).map_err(|e| DeepScfError::Config(format!("invalid model file: {}", e)))?;

        let layers = file
            .layers
            .into_iter()
            .enumerate()
            .map(|(i, layer)| {
                let rows = layer.weights.len();
                let cols = layer.weights.first().map_or(0, Vec::len);
                if rows == 0 || cols == 0 || layer.weights.iter().any(|r| r.len() != cols) {
                    return Err(DeepScfError::Config(format!("layer {} has a ragged or empty weight matrix", i)));
                }
                let weights = DMatrix::from_fn(rows, cols, |r, c| layer.weights[r][c]);
                DenseLayer::new(weights, DVector::from_vec(layer.bias))
            })
            .collect::<Result<Vec<_>>>()?;

        let mlp = Self::new(file.activation, layers, file.output_scale)?;
        let width = mlp.shift.len();
        let shift = file.input_shift.map_or_else(|| DVector::zeros(width), DVector::from_vec);
        let scale = file
            .input_scale
            .map_or_else(|| DVector::from_element(width, 1.0), DVector::from_vec);
        mlp.with_normalization(shift, scale)
    }

    fn validate(&self) -> Result<()> {
        let width = self.shift.len();
        if self.scale.len() != width {
            return Err(DeepScfError::Config(format!(
                "input normalisation has {} shifts and {} scales",
                width,
                self.scale.len()
            )));
        }
        if self.scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
            return Err(DeepScfError::Config("input scales must be finite and non-zero".to_string()));
        }

        let mut fan_in = width;
        for (i, layer) in self.layers.iter().enumerate() {
            if layer.weights.ncols() != fan_in {
                return Err(DeepScfError::Config(format!(
                    "layer {} expects {} inputs but receives {}",
                    i,
                    layer.weights.ncols(),
                    fan_in
                )));
            }
            fan_in = layer.weights.nrows();
        }
        if fan_in != 1 {
            return Err(DeepScfError::Config(format!(
                "the last layer must have one output, found {}",
                fan_in
            )));
        }
        Ok(())
    }

    /// Energy of one atom and its gradient with respect to the raw descriptor.
    fn atom_energy(&self, x: DVector<f64>) -> (f64, DVector<f64>) {
        let mut h = (x - &self.shift).component_div(&self.scale);
        let last = self.layers.len() - 1;

        let mut pre_activations = Vec::with_capacity(last);
        for layer in &self.layers[..last] {
            let z = &layer.weights * &h + &layer.bias;
            h = z.map(|v| self.activation.value(v));
            pre_activations.push(z);
        }
        let output = &self.layers[last].weights * &h + &self.layers[last].bias;
        let energy = self.output_scale * output[0];

        // backward
        let mut grad = self.layers[last].weights.row(0).transpose() * self.output_scale;
        for (layer, z) in self.layers[..last].iter().zip(&pre_activations).rev() {
            let gz = grad.component_mul(&z.map(|v| self.activation.derivative(v)));
            grad = layer.weights.transpose() * gz;
        }

        (energy, grad.component_div(&self.scale))
    }
}

impl CorrectionFunctional for AtomicMlp {
    fn input_width(&self) -> Option<usize> {
        Some(self.shift.len())
    }

    fn evaluate_with_gradient(&self, descriptors: &DMatrix<f64>) -> Result<(f64, DMatrix<f64>)> {
        check_shape("descriptor tensor", descriptors, descriptors.nrows(), self.shift.len())?;

        let mut energy = 0.0;
        let mut grad = DMatrix::zeros(descriptors.nrows(), descriptors.ncols());
        for (a, row) in descriptors.row_iter().enumerate() {
            let (e, g) = self.atom_energy(row.transpose());
            energy += e;
            grad.row_mut(a).copy_from(&g.transpose());
        }

        if !energy.is_finite() || grad.iter().any(|g| !g.is_finite()) {
            return Err(DeepScfError::Numeric("model produced non-finite output".to_string()));
        }
        Ok((energy, grad))
    }
}
