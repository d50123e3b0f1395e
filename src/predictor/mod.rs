mod artifact;

pub use artifact::{DenseLayer, ModelArtifact};

#[cfg(test)]
pub(crate) use artifact::testing;

use tracing::{debug, info};

use crate::error::PredictorError;

/// The loaded waiting-time regression model: scalar visitor count in,
/// scalar predicted minutes out.
///
/// `load` validates the artifact up front (including that every parameter is
/// finite), so `predict` is infallible and stateless once the model exists.
pub struct Predictor {
    layers: Vec<DenseLayer>,
}

impl Predictor {
    pub fn load(bytes: &[u8]) -> Result<Self, PredictorError> {
        let artifact = ModelArtifact::parse(bytes)?;
        info!(layers = artifact.layers.len(), "Prediction model loaded");
        Ok(Self {
            layers: artifact.layers,
        })
    }

    pub async fn load_from_file(path: &str) -> Result<Self, PredictorError> {
        info!("Loading prediction model from {}", path);
        let bytes = tokio::fs::read(path).await?;
        Self::load(&bytes)
    }

    /// One forward pass: ReLU on hidden layers, linear output.
    pub fn predict(&self, input: f32) -> f32 {
        let mut activation = nalgebra::DVector::from_element(1, input);
        let last = self.layers.len() - 1;
        for (i, layer) in self.layers.iter().enumerate() {
            activation = &layer.weights * activation + &layer.biases;
            if i != last {
                activation.apply(|v| *v = v.max(0.0));
            }
        }
        let output = activation[0];
        debug!(input, output, "Ran waiting time inference");
        output
    }
}
