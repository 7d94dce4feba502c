//! Nearest-neighbour lookup over a precomputed clause-embedding matrix.
//!
//! The encoder is loaded on first use, at most once per process. Any load or
//! encode failure turns semantic search off for the rest of the process;
//! callers then see empty results and carry on with tag matching alone.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

/// Turns text into a vector comparable with the index rows.
pub trait Encoder: Send + Sync {
    fn encode(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}

/// Deferred encoder construction, run on the first search.
pub type EncoderLoader = Box<dyn Fn() -> anyhow::Result<Box<dyn Encoder>> + Send + Sync>;

pub const DEFAULT_TOP_K: usize = 15;
pub const DEFAULT_MIN_SCORE: f32 = 0.35;

/// One index row that scored above the threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SemanticHit {
    /// Caller-supplied id of the row (a corpus record index).
    pub target: usize,
    pub score: f32,
}

pub struct SemanticSearch {
    matrix: Vec<f32>,
    dim: usize,
    targets: Vec<usize>,
    normalize_query: bool,
    top_k: usize,
    min_score: f32,
    loader: EncoderLoader,
    encoder: OnceLock<Option<Box<dyn Encoder>>>,
    disabled: AtomicBool,
}

impl SemanticSearch {
    /// `matrix` is row-major with one row of width `dim` per entry of `targets`.
    /// With `normalize_query` set, query vectors are L2-normalised before scoring.
    pub fn new(
        matrix: Vec<f32>,
        dim: usize,
        targets: Vec<usize>,
        normalize_query: bool,
        loader: EncoderLoader,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(dim > 0, "embedding dimension must be positive");
        anyhow::ensure!(!targets.is_empty(), "semantic index has no rows");
        anyhow::ensure!(
            matrix.len() == targets.len() * dim,
            "matrix holds {} values, expected {} rows of {dim}",
            matrix.len(),
            targets.len()
        );
        Ok(Self {
            matrix,
            dim,
            targets,
            normalize_query,
            top_k: DEFAULT_TOP_K,
            min_score: DEFAULT_MIN_SCORE,
            loader,
            encoder: OnceLock::new(),
            disabled: AtomicBool::new(false),
        })
    }

    pub fn with_limits(mut self, top_k: usize, min_score: f32) -> Self {
        self.top_k = top_k;
        self.min_score = min_score;
        self
    }

    pub fn rows(&self) -> usize {
        self.targets.len()
    }

    pub fn is_enabled(&self) -> bool {
        !self.disabled.load(Ordering::Acquire)
    }

    /// Rows scoring at least the minimum, best first, at most `top_k`.
    pub fn search(&self, query: &str) -> Vec<SemanticHit> {
        if !self.is_enabled() {
            return Vec::new();
        }
        let Some(encoder) = self.encoder() else {
            return Vec::new();
        };

        let mut query_vec = match encoder.encode(query) {
            Ok(v) => v,
            Err(e) => {
                self.disable(&format!("encode failed: {e:#}"));
                return Vec::new();
            }
        };
        if query_vec.len() != self.dim {
            self.disable(&format!(
                "encoder produced {} dimensions, index has {}",
                query_vec.len(),
                self.dim
            ));
            return Vec::new();
        }
        if self.normalize_query {
            normalize(&mut query_vec);
        }

        let mut hits: Vec<SemanticHit> = self
            .matrix
            .chunks_exact(self.dim)
            .zip(&self.targets)
            .filter_map(|(row, &target)| {
                let score = cosine_sim(&query_vec, row);
                (score >= self.min_score).then_some(SemanticHit { target, score })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(self.top_k);
        hits
    }

    fn encoder(&self) -> Option<&dyn Encoder> {
        let slot = self.encoder.get_or_init(|| match (self.loader)() {
            Ok(encoder) => {
                info!(rows = self.rows(), dim = self.dim, "semantic encoder ready");
                Some(encoder)
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "semantic encoder failed to load");
                None
            }
        });
        match slot {
            Some(encoder) => Some(encoder.as_ref()),
            None => {
                self.disabled.store(true, Ordering::Release);
                None
            }
        }
    }

    fn disable(&self, reason: &str) {
        if !self.disabled.swap(true, Ordering::AcqRel) {
            warn!(reason, "semantic search disabled");
        }
    }
}

/// Unit vectors, so the dot product is the cosine.
fn cosine_sim(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// L2-normalize a vector in place.
pub fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
