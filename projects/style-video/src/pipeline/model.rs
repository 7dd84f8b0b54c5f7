use crate::config::{ModelConfig, ModelSource};
use crate::pipeline::fetch::{fetch_from_hub, fetch_url};
use crate::pipeline::preprocess::ImageTensor;
use anyhow::{anyhow, Context, Result};
use ort::ndarray::{ArrayD, IxDyn};
use ort::{inputs, session::Session, value::TensorRef};
use std::path::PathBuf;

/// A pretrained arbitrary style-transfer network: `(content, style)` in,
/// stylized content out.
pub trait StyleModel {
    fn stylize(&mut self, content: &ImageTensor, style: &ImageTensor) -> Result<ImageTensor>;
}

pub fn resolve_model_path(config: &ModelConfig) -> Result<PathBuf> {
    match &config.source {
        ModelSource::File(path) => {
            if !path.exists() {
                return Err(anyhow!("Model file not found: {}", path.display()));
            }
            Ok(path.clone())
        }
        ModelSource::Url(url) => fetch_url(url, config.cache_dir.as_deref()),
        ModelSource::Hub { repo, file } => fetch_from_hub(repo, file, config.cache_dir.as_deref()),
    }
}

/// ONNX Runtime session over the style-transfer network.
///
/// The model is an ONNX export of Magenta's arbitrary-image-stylization-v1-256
/// (for example converted with `tf2onnx` from the TF Hub module). Expected
/// signature:
///
/// - input 0: content image, `f32` `[1, H, W, 3]`, RGB in `[0, 1]`
/// - input 1: style image, `f32` `[1, 256, 256, 3]`, RGB in `[0, 1]`
/// - output 0: stylized image, `f32` `[1, H, W, 3]`
///
/// Any other input count is rejected at load.
pub struct OnnxStyleModel {
    session: Session,
    content_input: String,
    style_input: String,
    output_name: String,
}

impl OnnxStyleModel {
    pub fn load(config: &ModelConfig) -> Result<Self> {
        let path = resolve_model_path(config)?;

        let session = Session::builder()
            .context("Failed to create session builder")?
            .commit_from_file(&path)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;

        let input_names: Vec<String> = session
            .inputs()
            .iter()
            .map(|input| input.name().to_string())
            .collect();
        let output_name = session
            .outputs()
            .first()
            .map(|output| output.name().to_string())
            .ok_or_else(|| anyhow!("Model {} has no outputs", path.display()))?;

        let (content_input, style_input) = match input_names.as_slice() {
            [content, style] => (content.clone(), style.clone()),
            other => {
                return Err(anyhow!(
                    "Style model must take exactly 2 inputs (content, style), found {:?}",
                    other
                ))
            }
        };

        tracing::info!(
            "Loaded style model {} (inputs: {}, {}; output: {})",
            path.display(),
            content_input,
            style_input,
            output_name
        );

        Ok(Self {
            session,
            content_input,
            style_input,
            output_name,
        })
    }
}

fn to_array(tensor: &ImageTensor) -> Result<ArrayD<f32>> {
    ArrayD::from_shape_vec(IxDyn(&tensor.shape()), tensor.data().to_vec())
        .map_err(|e| anyhow!("Failed to shape image tensor: {}", e))
}

impl StyleModel for OnnxStyleModel {
    fn stylize(&mut self, content: &ImageTensor, style: &ImageTensor) -> Result<ImageTensor> {
        let content_array = to_array(content)?;
        let style_array = to_array(style)?;
        let content_ref = TensorRef::from_array_view(content_array.view())?;
        let style_ref = TensorRef::from_array_view(style_array.view())?;

        let outputs = self.session.run(inputs![
            self.content_input.as_str() => content_ref,
            self.style_input.as_str() => style_ref
        ])?;

        let stylized = outputs[self.output_name.as_str()]
            .try_extract_array::<f32>()
            .with_context(|| format!("Output '{}' is not an f32 tensor", self.output_name))?;

        let shape = stylized.shape().to_vec();
        let data: Vec<f32> = stylized.iter().copied().collect();
        ImageTensor::from_shape(&shape, data)
    }
}
