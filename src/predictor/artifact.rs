use nalgebra::{DMatrix, DVector};

use crate::error::PredictorError;

pub const MAGIC: [u8; 4] = *b"QCM1";
pub const FORMAT_VERSION: u16 = 1;

/// Upper bound on a single layer dimension; anything larger is a corrupt
/// artifact rather than a plausible waiting-time model.
const MAX_LAYER_DIM: u32 = 4096;

/// A deserialized model artifact: a stack of dense layers read from the flat
/// little-endian buffer bundled with the application.
///
/// Layout: magic `QCM1`, u16 format version, u16 layer count, then per layer
/// u32 rows, u32 cols, `rows*cols` f32 weights (row-major) and `rows` f32
/// biases. The first layer must accept one input and the last must produce
/// one output.
#[derive(Debug, Clone)]
pub struct ModelArtifact {
    pub layers: Vec<DenseLayer>,
}

#[derive(Debug, Clone)]
pub struct DenseLayer {
    pub weights: DMatrix<f32>,
    pub biases: DVector<f32>,
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], PredictorError> {
        let end = self
            .pos
            .checked_add(n)
            .ok_or(PredictorError::Truncated(self.pos))?;
        if end > self.buf.len() {
            return Err(PredictorError::Truncated(self.pos));
        }
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn read_u16(&mut self) -> Result<u16, PredictorError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn read_u32(&mut self) -> Result<u32, PredictorError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_f32(&mut self) -> Result<f32, PredictorError> {
        let b = self.take(4)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn exhausted(&self) -> bool {
        self.pos == self.buf.len()
    }
}

impl ModelArtifact {
    pub fn parse(bytes: &[u8]) -> Result<Self, PredictorError> {
        let mut cursor = Cursor::new(bytes);

        let magic = cursor.take(4)?;
        if magic != MAGIC.as_slice() {
            return Err(PredictorError::BadMagic([
                magic[0], magic[1], magic[2], magic[3],
            ]));
        }

        let version = cursor.read_u16()?;
        if version != FORMAT_VERSION {
            return Err(PredictorError::UnsupportedVersion(version));
        }

        let layer_count = cursor.read_u16()?;
        if layer_count == 0 {
            return Err(PredictorError::Malformed("no layers".to_string()));
        }

        let mut layers = Vec::with_capacity(layer_count as usize);
        let mut expected_inputs = 1u32;

        for index in 0..layer_count {
            let rows = cursor.read_u32()?;
            let cols = cursor.read_u32()?;

            if rows == 0 || cols == 0 || rows > MAX_LAYER_DIM || cols > MAX_LAYER_DIM {
                return Err(PredictorError::Malformed(format!(
                    "layer {index} dimensions {rows}x{cols} out of range"
                )));
            }
            if cols != expected_inputs {
                return Err(PredictorError::Malformed(format!(
                    "layer {index} expects {cols} inputs, previous layer produces {expected_inputs}"
                )));
            }

            let mut weights = Vec::with_capacity((rows * cols) as usize);
            for _ in 0..rows * cols {
                weights.push(read_finite(&mut cursor, index)?);
            }
            let mut biases = Vec::with_capacity(rows as usize);
            for _ in 0..rows {
                biases.push(read_finite(&mut cursor, index)?);
            }

            layers.push(DenseLayer {
                weights: DMatrix::from_row_slice(rows as usize, cols as usize, &weights),
                biases: DVector::from_vec(biases),
            });
            expected_inputs = rows;
        }

        if expected_inputs != 1 {
            return Err(PredictorError::Malformed(format!(
                "final layer produces {expected_inputs} outputs, expected 1"
            )));
        }
        if !cursor.exhausted() {
            return Err(PredictorError::Malformed(format!(
                "{} trailing bytes after final layer",
                bytes.len() - cursor.pos
            )));
        }

        Ok(Self { layers })
    }
}

fn read_finite(cursor: &mut Cursor<'_>, layer: u16) -> Result<f32, PredictorError> {
    let value = cursor.read_f32()?;
    if !value.is_finite() {
        return Err(PredictorError::Malformed(format!(
            "non-finite parameter in layer {layer}"
        )));
    }
    Ok(value)
}


#[cfg(test)]
mod tests {
    use super::testing::{encode, linear, LayerSpec};
    use super::*;

    #[test]
    fn parses_single_layer_model() {
        let artifact = ModelArtifact::parse(&linear(0.5, 2.0)).unwrap();
        assert_eq!(artifact.layers.len(), 1);
        assert_eq!(artifact.layers[0].weights[(0, 0)], 0.5);
        assert_eq!(artifact.layers[0].biases[0], 2.0);
    }

    #[test]
    fn parses_two_layer_model() {
        let bytes = encode(&[
            LayerSpec {
                rows: 2,
                cols: 1,
                weights: vec![1.0, -1.0],
                biases: vec![0.0, 0.5],
            },
            LayerSpec {
                rows: 1,
                cols: 2,
                weights: vec![0.25, 0.75],
                biases: vec![1.0],
            },
        ]);
        let artifact = ModelArtifact::parse(&bytes).unwrap();
        assert_eq!(artifact.layers.len(), 2);
        assert_eq!(artifact.layers[0].weights.nrows(), 2);
        assert_eq!(artifact.layers[1].weights.ncols(), 2);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = linear(1.0, 0.0);
        bytes[0] = b'X';
        assert!(matches!(
            ModelArtifact::parse(&bytes),
            Err(PredictorError::BadMagic(_))
        ));
    }

    #[test]
    fn rejects_unsupported_version() {
        let mut bytes = linear(1.0, 0.0);
        bytes[4] = 9;
        assert!(matches!(
            ModelArtifact::parse(&bytes),
            Err(PredictorError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn rejects_truncated_buffer() {
        let bytes = linear(1.0, 0.0);
        assert!(matches!(
            ModelArtifact::parse(&bytes[..bytes.len() - 2]),
            Err(PredictorError::Truncated(_))
        ));
    }

    #[test]
    fn rejects_empty_buffer() {
        assert!(matches!(
            ModelArtifact::parse(&[]),
            Err(PredictorError::Truncated(0))
        ));
    }

    #[test]
    fn rejects_zero_layers() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&MAGIC);
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes());
        assert!(matches!(
            ModelArtifact::parse(&bytes),
            Err(PredictorError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_wrong_input_width() {
        let bytes = encode(&[LayerSpec {
            rows: 1,
            cols: 2,
            weights: vec![1.0, 1.0],
            biases: vec![0.0],
        }]);
        assert!(matches!(
            ModelArtifact::parse(&bytes),
            Err(PredictorError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_wide_final_layer() {
        let bytes = encode(&[LayerSpec {
            rows: 2,
            cols: 1,
            weights: vec![1.0, 1.0],
            biases: vec![0.0, 0.0],
        }]);
        assert!(matches!(
            ModelArtifact::parse(&bytes),
            Err(PredictorError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_non_finite_weights() {
        let bytes = linear(f32::NAN, 0.0);
        assert!(matches!(
            ModelArtifact::parse(&bytes),
            Err(PredictorError::Malformed(_))
        ));

        let bytes = linear(1.0, f32::INFINITY);
        assert!(matches!(
            ModelArtifact::parse(&bytes),
            Err(PredictorError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_trailing_bytes() {
        let mut bytes = linear(1.0, 0.0);
        bytes.push(0);
        assert!(matches!(
            ModelArtifact::parse(&bytes),
            Err(PredictorError::Malformed(_))
        ));
    }
}
