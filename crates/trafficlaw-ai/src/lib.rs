//! Semantic fallback layer: encoder capability, vector lookup, and ONNX Runtime embeddings.

pub mod semantic;

pub use semantic::{
    DEFAULT_MIN_SCORE, DEFAULT_TOP_K, Encoder, EncoderLoader, SemanticHit, SemanticSearch,
};

#[cfg(feature = "onnx")]
mod embedder;
#[cfg(feature = "onnx")]
pub use embedder::{Embedder, OnnxEncoder};
