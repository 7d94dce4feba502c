//! ONNX Runtime embedding pipeline for sentence-transformers models.
//!
//! Mean-pooled, L2-normalised sentence embeddings. The model directory must
//! contain `model.onnx` and `tokenizer.json`; the multilingual MiniLM models
//! used for Vietnamese clause text produce 384 dimensions.

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::info;

use crate::semantic::{Encoder, normalize};

/// Sequence length the multilingual MiniLM models were trained with.
const MAX_TOKENS: usize = 128;

pub struct Embedder {
    session: Session,
    tokenizer: Tokenizer,
    dim: usize,
    /// BERT exports take `token_type_ids`; XLM-R based ones reject it.
    uses_token_type_ids: bool,
}

impl Embedder {
    /// Load an embedding model from a directory containing `model.onnx` and `tokenizer.json`.
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        anyhow::ensure!(model_path.exists(), "model.onnx not found in {model_dir:?}");
        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer.json not found in {model_dir:?}"
        );

        let session = Session::builder()?.commit_from_file(&model_path)?;
        let dim = infer_dim(session.outputs()[0].dtype()).unwrap_or(384);
        let uses_token_type_ids = session
            .inputs()
            .iter()
            .any(|input| input.name() == "token_type_ids");

        // Queries are encoded one at a time, so there is nothing to pad.
        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("set truncation: {e}"))?;
        tokenizer.with_padding(None);

        info!(dim, uses_token_type_ids, model = %model_path.display(), "loaded embedding model");
        Ok(Self {
            session,
            tokenizer,
            dim,
            uses_token_type_ids,
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Embed one question as a unit-length vector.
    pub fn embed(&mut self, text: &str) -> anyhow::Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;
        let tokens = encoding.len();
        anyhow::ensure!(tokens > 0, "tokenizer produced no tokens");

        let widen = |values: &[u32]| values.iter().map(|&v| i64::from(v)).collect::<Vec<i64>>();
        let mask = widen(encoding.get_attention_mask());
        let shape = [1, tokens as i64];
        let ids = Tensor::from_array((shape, widen(encoding.get_ids()).into_boxed_slice()))?;
        let attention = Tensor::from_array((shape, mask.clone().into_boxed_slice()))?;

        let outputs = if self.uses_token_type_ids {
            let types = Tensor::from_array((shape, widen(encoding.get_type_ids()).into_boxed_slice()))?;
            self.session.run(ort::inputs![
                "input_ids" => ids,
                "attention_mask" => attention,
                "token_type_ids" => types,
            ])?
        } else {
            self.session.run(ort::inputs![
                "input_ids" => ids,
                "attention_mask" => attention,
            ])?
        };

        let (shape, hidden) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = shape;
        anyhow::ensure!(
            matches!(dims, [1, n, d] if *n as usize == tokens && *d as usize == self.dim),
            "unexpected output shape {dims:?} for {tokens} tokens of dim {}",
            self.dim
        );

        let mut pooled = mean_pool(hidden, &mask, self.dim);
        normalize(&mut pooled);
        Ok(pooled)
    }
}

/// Average of the token vectors in `hidden` (row-major `[tokens, dim]`)
/// whose attention mask is set. All zeros when no token is attended.
fn mean_pool(hidden: &[f32], mask: &[i64], dim: usize) -> Vec<f32> {
    let mut pooled = vec![0.0f32; dim];
    let mut attended = 0usize;
    for (token, _) in hidden
        .chunks_exact(dim)
        .zip(mask)
        .filter(|(_, m)| **m != 0)
    {
        pooled.iter_mut().zip(token).for_each(|(p, &x)| *p += x);
        attended += 1;
    }
    if attended > 0 {
        let scale = 1.0 / attended as f32;
        pooled.iter_mut().for_each(|p| *p *= scale);
    }
    pooled
}

/// Last dimension of the model's first output, when it is static.
fn infer_dim(output_type: &ort::value::ValueType) -> Option<usize> {
    match output_type {
        ort::value::ValueType::Tensor { shape, .. } => shape
            .last()
            .and_then(|&d| if d > 0 { Some(d as usize) } else { None }),
        _ => None,
    }
}

/// [`Embedder`] as a shareable [`Encoder`]. Inference needs `&mut Session`,
/// so calls are serialised through a mutex held only for one embedding.
pub struct OnnxEncoder {
    inner: Mutex<Embedder>,
}

impl OnnxEncoder {
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        Ok(Self {
            inner: Mutex::new(Embedder::load(model_dir)?),
        })
    }
}

impl Encoder for OnnxEncoder {
    fn encode(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut embedder = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("embedder mutex poisoned"))?;
        embedder.embed(text)
    }
}
