use anyhow::Context;
use anyhow::Result;
use log::info;
use quarry_core::Quarry;
use quarry_core::QuarryConfig;
use quarry_core::load_corpus;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, clap::Args)]
pub struct ServiceArgs {
    /// TOML configuration file; defaults apply when omitted
    #[arg(long, global = true, value_name = "FILE", env = "QUARRY_CONFIG")]
    pub config: Option<PathBuf>,

    /// JSON array of documents to search
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        env = "QUARRY_CORPUS",
        default_value = "corpus.json"
    )]
    pub corpus: PathBuf,
}

impl ServiceArgs {
    /// Load configuration and corpus, embedding documents that have no
    /// vector yet.
    pub async fn open(&self) -> Result<Quarry> {
        let config = match &self.config {
            Some(path) => QuarryConfig::load(path)
                .await
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => QuarryConfig::default(),
        }
        .with_env_overrides();

        let embeddings = Quarry::embedding_gateway(&config)
            .context("Failed to set up the embedding service")?;
        let completion = Quarry::completion_client(&config)
            .context("Failed to set up the completion API client")?;
        let store = load_corpus(&self.corpus, embeddings.as_ref())
            .await
            .with_context(|| format!("Failed to load corpus {}", self.corpus.display()))?;
        info!("Corpus {} ready", self.corpus.display());

        Ok(Quarry::new(config, Arc::new(store), embeddings, completion)?)
    }
}
