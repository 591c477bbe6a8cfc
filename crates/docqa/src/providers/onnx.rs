//! Local sentence-transformers embeddings on ONNX Runtime
//!
//! `model.onnx` and `tokenizer.json` are downloaded from HuggingFace on first
//! use and cached on disk. Defaults to all-mpnet-base-v2 (768 dimensions).

use async_trait::async_trait;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokenizers::Tokenizer;
use tokio::sync::OnceCell;

use crate::config::{EmbeddingConfig, OnnxConfig};
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;

/// Embedder running a sentence-transformers model in-process
pub struct OnnxEmbedder {
    config: OnnxConfig,
    dimensions: usize,
    cache_dir: PathBuf,
    model: OnceCell<Arc<OnnxModel>>,
}

/// Loaded session and tokenizer
struct OnnxModel {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    /// BERT-style exports take `token_type_ids`, MPNet does not
    uses_token_type_ids: bool,
    max_length: usize,
    batch_size: usize,
}

impl OnnxEmbedder {
    /// Create the embedder. Nothing is downloaded or loaded until first use.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let cache_dir = match &config.onnx.cache_dir {
            Some(dir) => dir.clone(),
            None => dirs::cache_dir()
                .ok_or_else(|| {
                    Error::config("no user cache directory; set embeddings.onnx.cache_dir")
                })?
                .join("docqa")
                .join("models"),
        }
        .join(config.onnx.model.replace('/', "--"));

        Ok(Self {
            config: config.onnx.clone(),
            dimensions: config.dimensions,
            cache_dir,
            model: OnceCell::new(),
        })
    }

    /// Directory holding this model's cached files
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn model_url(&self) -> String {
        self.hub_file("onnx/model.onnx")
    }

    pub fn tokenizer_url(&self) -> String {
        self.hub_file("tokenizer.json")
    }

    fn hub_file(&self, file: &str) -> String {
        format!(
            "{}/{}/resolve/main/{}",
            self.config.hub_url.trim_end_matches('/'),
            self.config.model,
            file
        )
    }

    /// Download (if needed) and load the model now instead of on first embed
    pub async fn warm_up(&self) -> Result<()> {
        self.model().await.map(|_| ())
    }

    async fn model(&self) -> Result<&Arc<OnnxModel>> {
        self.model
            .get_or_try_init(|| async {
                tracing::info!("Initializing ONNX embedder with model: {}", self.config.model);

                tokio::fs::create_dir_all(&self.cache_dir).await.map_err(|e| {
                    Error::config(format!(
                        "Failed to create cache directory {}: {}",
                        self.cache_dir.display(),
                        e
                    ))
                })?;

                let model_path = self.cache_dir.join("model.onnx");
                let tokenizer_path = self.cache_dir.join("tokenizer.json");

                if !model_path.exists() {
                    download(&self.model_url(), &model_path).await?;
                }
                if !tokenizer_path.exists() {
                    download(&self.tokenizer_url(), &tokenizer_path).await?;
                }

                let config = self.config.clone();
                let model = tokio::task::spawn_blocking(move || {
                    OnnxModel::load(&model_path, &tokenizer_path, &config)
                })
                .await
                .map_err(|e| Error::embedding(format!("Model loading task failed: {}", e)))??;

                tracing::info!("ONNX embedder ready ({})", self.cache_dir.display());
                Ok(Arc::new(model))
            })
            .await
    }
}

impl OnnxModel {
    fn load(model_path: &Path, tokenizer_path: &Path, config: &OnnxConfig) -> Result<Self> {
        let session = Session::builder()
            .map_err(|e| Error::embedding(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| Error::embedding(format!("Failed to set optimization level: {}", e)))?
            .with_intra_threads(config.threads)
            .map_err(|e| Error::embedding(format!("Failed to set threads: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| Error::embedding(format!("Failed to load model: {}", e)))?;

        let uses_token_type_ids = session
            .inputs
            .iter()
            .any(|input| input.name == "token_type_ids");

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| Error::embedding(format!("Failed to load tokenizer: {}", e)))?;

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            uses_token_type_ids,
            max_length: config.max_length,
            batch_size: config.batch_size,
        })
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            embeddings.extend(self.embed_batch(batch)?);
        }
        Ok(embeddings)
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let batch_size = texts.len();

        let encodings = self
            .tokenizer
            .encode_batch(texts.iter().map(String::as_str).collect::<Vec<_>>(), true)
            .map_err(|e| Error::embedding(format!("Tokenization failed: {}", e)))?;

        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0)
            .min(self.max_length);

        let mut input_ids = vec![0i64; batch_size * seq_len];
        let mut attention_mask = vec![0i64; batch_size * seq_len];
        let mut token_type_ids = vec![0i64; batch_size * seq_len];

        for (i, encoding) in encodings.iter().enumerate() {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            let types = encoding.get_type_ids();

            for j in 0..ids.len().min(seq_len) {
                input_ids[i * seq_len + j] = ids[j] as i64;
                attention_mask[i * seq_len + j] = mask[j] as i64;
                token_type_ids[i * seq_len + j] = types[j] as i64;
            }
        }

        let shape = vec![batch_size, seq_len];
        let tensor = |data: Vec<i64>, what: &str| {
            Tensor::from_array((shape.clone(), data.into_boxed_slice()))
                .map(|t| t.into_dyn())
                .map_err(|e| Error::embedding(format!("{} tensor creation failed: {}", what, e)))
        };

        let mut inputs = vec![
            ("input_ids", tensor(input_ids, "Input")?),
            ("attention_mask", tensor(attention_mask.clone(), "Attention mask")?),
        ];
        if self.uses_token_type_ids {
            inputs.push(("token_type_ids", tensor(token_type_ids, "Token type")?));
        }

        let mut session = self.session.lock();
        let outputs = session
            .run(inputs)
            .map_err(|e| Error::embedding(format!("Inference failed: {}", e)))?;

        let output_iter: Vec<_> = outputs.iter().collect();
        let output = output_iter
            .iter()
            .find(|(name, _)| *name == "last_hidden_state")
            .or_else(|| output_iter.first())
            .map(|(_, v)| v)
            .ok_or_else(|| Error::embedding("Model produced no output tensor"))?;

        let (tensor_shape, hidden) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::embedding(format!("Failed to extract tensor: {}", e)))?;

        let dims: Vec<usize> = tensor_shape.iter().map(|&d| d as usize).collect();
        if dims.len() != 3 || dims[0] != batch_size || dims[1] != seq_len {
            return Err(Error::embedding(format!(
                "Unexpected output shape {:?} for batch {}x{}",
                dims, batch_size, seq_len
            )));
        }

        mean_pool(hidden, &attention_mask, batch_size, seq_len, dims[2])
    }
}

/// Attention-masked mean over tokens, then L2 normalisation
fn mean_pool(
    hidden: &[f32],
    mask: &[i64],
    batch_size: usize,
    seq_len: usize,
    hidden_size: usize,
) -> Result<Vec<Vec<f32>>> {
    if hidden.len() < batch_size * seq_len * hidden_size || mask.len() < batch_size * seq_len {
        return Err(Error::embedding(format!(
            "Hidden state has {} values, expected {}",
            hidden.len(),
            batch_size * seq_len * hidden_size
        )));
    }

    let mut embeddings = Vec::with_capacity(batch_size);

    for i in 0..batch_size {
        let mut sum = vec![0.0f32; hidden_size];
        let mut count = 0.0f32;

        for j in 0..seq_len {
            let weight = mask[i * seq_len + j] as f32;
            if weight > 0.0 {
                let token = &hidden[(i * seq_len + j) * hidden_size..][..hidden_size];
                for (acc, value) in sum.iter_mut().zip(token) {
                    *acc += value * weight;
                }
                count += weight;
            }
        }

        if count > 0.0 {
            for value in &mut sum {
                *value /= count;
            }
        }

        let norm: f32 = sum.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut sum {
                *value /= norm;
            }
        }

        embeddings.push(sum);
    }

    Ok(embeddings)
}

/// Fetch `url` into `path`, via a `.part` file so an interrupted download is never cached
async fn download(url: &str, path: &Path) -> Result<()> {
    tracing::info!("Downloading {}", url);

    let response = reqwest::get(url)
        .await
        .map_err(|e| Error::embedding(format!("Failed to download {}: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(Error::embedding(format!(
            "Download of {} failed: HTTP {}",
            url,
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::embedding(format!("Failed to read {}: {}", url, e)))?;

    let partial = path.with_extension("part");
    tokio::fs::write(&partial, &bytes).await?;
    tokio::fs::rename(&partial, path).await?;

    tracing::info!("Saved {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

#[async_trait]
impl EmbeddingProvider for OnnxEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| Error::embedding("Empty embedding result"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = Arc::clone(self.model().await?);
        let texts = texts.to_vec();

        // Inference is CPU bound
        tokio::task::spawn_blocking(move || model.embed(&texts))
            .await
            .map_err(|e| Error::embedding(format!("Embedding task failed: {}", e)))?
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "onnx"
    }
}
