use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::RgbImage;
use tract_onnx::prelude::*;

type NnModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Side length of the square input of image classifiers exported by Teachable Machine.
pub const DEFAULT_INPUT_SIZE: u32 = 224;

/// Memory layout of the model input tensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum TensorLayout {
    /// `(1, height, width, 3)`, as exported from Keras.
    Nhwc,
    /// `(1, 3, height, width)`, as exported from PyTorch.
    Nchw,
}

impl TensorLayout {
    fn shape(&self, size: usize) -> [usize; 4] {
        match self {
            TensorLayout::Nhwc => [1, size, size, 3],
            TensorLayout::Nchw => [1, 3, size, size],
        }
    }
}

pub trait Classifier {
    /// Score of every class for one frame, in model output order.
    fn predict(&self, frame: &RgbImage) -> Result<Vec<f32>>;
}

/// Image classifier loaded from an ONNX file.
pub struct OnnxClassifier {
    model: NnModel,
    input_size: u32,
    layout: TensorLayout,
}

impl OnnxClassifier {
    pub fn new(path: impl AsRef<Path>, input_size: u32, layout: TensorLayout) -> Result<Self> {
        let path = path.as_ref();
        let model = load_model(path, input_size, layout)
            .with_context(|| format!("failed to load model {}", path.display()))?;
        log::info!(
            "Loaded model {} ({}x{}, {:?})",
            path.display(),
            input_size,
            input_size,
            layout
        );

        Ok(Self {
            model,
            input_size,
            layout,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, frame: &RgbImage) -> Result<Vec<f32>> {
        let input = preproc(frame, self.input_size, self.layout);
        let outputs = self.model.run(tvec!(input.into()))?;
        let scores = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no output"))?
            .to_array_view::<f32>()?
            .iter()
            .copied()
            .collect();

        Ok(scores)
    }
}

fn load_model(path: &Path, input_size: u32, layout: TensorLayout) -> Result<NnModel> {
    let shape = layout.shape(input_size as usize);
    let input_fact = InferenceFact::dt_shape(
        f32::datum_type(),
        tvec!(shape[0], shape[1], shape[2], shape[3]),
    );
    let model = tract_onnx::onnx()
        .model_for_path(path)?
        .with_input_fact(0, input_fact)?
        .into_optimized()?
        .into_runnable()?;

    Ok(model)
}

/// Resize a frame to the model input and scale its pixel values to `[0, 1]`.
pub fn preproc(frame: &RgbImage, size: u32, layout: TensorLayout) -> Tensor {
    let resized: RgbImage =
        image::imageops::resize(frame, size, size, image::imageops::FilterType::Triangle);
    let pixel = |x: usize, y: usize, c: usize| resized[(x as _, y as _)][c] as f32 / 255.0;
    let size = size as usize;

    match layout {
        TensorLayout::Nhwc => {
            tract_ndarray::Array4::from_shape_fn((1, size, size, 3), |(_, y, x, c)| pixel(x, y, c))
                .into()
        }
        TensorLayout::Nchw => {
            tract_ndarray::Array4::from_shape_fn((1, 3, size, size), |(_, c, y, x)| pixel(x, y, c))
                .into()
        }
    }
}

/// Index of the highest score. Ties go to the first class and NaN scores never win.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    scores
        .iter()
        .enumerate()
        .filter(|(_, score)| !score.is_nan())
        .fold(None, |best: Option<(usize, f32)>, (idx, &score)| match best {
            Some((_, best_score)) if best_score >= score => best,
            _ => Some((idx, score)),
        })
        .map(|(idx, _)| idx)
}

#[cfg(test)]
mod test {
    use image::Rgb;

    use super::*;

    #[test]
    fn test_argmax() {
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), Some(1));
        assert_eq!(argmax(&[0.9]), Some(0));
        assert_eq!(argmax(&[]), None);
        assert_eq!(argmax(&[f32::NAN, 0.2, 0.1]), Some(1));
        assert_eq!(argmax(&[f32::NAN]), None);
        assert_eq!(argmax(&[0.5, 0.5]), Some(0));
    }

    #[test]
    fn test_preproc_nhwc() -> Result<()> {
        let frame = RgbImage::from_pixel(64, 48, Rgb([255, 0, 51]));
        let tensor = preproc(&frame, 32, TensorLayout::Nhwc);
        assert_eq!(tensor.shape(), &[1, 32, 32, 3]);

        let view = tensor.to_array_view::<f32>()?;
        assert_eq!(view[&[0, 5, 7, 0][..]], 1.0);
        assert_eq!(view[&[0, 5, 7, 1][..]], 0.0);
        assert!((view[&[0, 5, 7, 2][..]] - 0.2).abs() < 1e-6);

        Ok(())
    }

    #[test]
    fn test_preproc_nchw() -> Result<()> {
        let frame = RgbImage::from_pixel(10, 10, Rgb([0, 255, 0]));
        let tensor = preproc(&frame, 16, TensorLayout::Nchw);
        assert_eq!(tensor.shape(), &[1, 3, 16, 16]);

        let view = tensor.to_array_view::<f32>()?;
        assert_eq!(view[&[0, 0, 3, 3][..]], 0.0);
        assert_eq!(view[&[0, 1, 3, 3][..]], 1.0);

        Ok(())
    }

    #[test]
    fn test_missing_model_file() {
        let result =
            OnnxClassifier::new("does-not-exist.onnx", DEFAULT_INPUT_SIZE, TensorLayout::Nhwc);
        assert!(result.is_err());
    }
}
