use clap::{Parser, Subcommand};
use fastembed::EmbeddingModel;
use std::path::PathBuf;
use std::sync::Arc;

use forage::config::{EmbeddingProviderKind, StorageBackendKind};
use forage::embedding::{EmbeddingProvider, LocalEmbedder, OpenAiEmbedder};
use forage::vector::{InMemoryBackend, QdrantBackend, VectorBackend};
use forage::{ContentSource, Retriever, Settings};

#[derive(Parser)]
#[command(name = "forage")]
#[command(about = "Index documents into a vector store and answer queries with retrieved context")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration file
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Index one or more sources (file paths or URLs)
    Index {
        /// File paths or URLs to index
        #[arg(required = true)]
        sources: Vec<String>,
    },

    /// Answer a query with context retrieved from the given sources
    Query {
        /// The query text
        query: String,

        /// File paths or URLs to retrieve from (indexed on first use)
        #[arg(short, long = "source", required = true)]
        sources: Vec<String>,

        /// Number of results per source (overrides config)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Minimum similarity for a result to be kept (overrides config)
        #[arg(short, long)]
        threshold: Option<f32>,
    },

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // For non-init commands, check if the project is initialized
    if !matches!(cli.command, Commands::Init { .. }) {
        if let Err(warning) = Settings::check_init() {
            eprintln!("Warning: {warning}");
            eprintln!("Using default configuration for now.");
        }
    }

    let config = Settings::load().unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        Settings::default()
    });

    forage::logging::init_with_config(&config.logging);

    match cli.command {
        Commands::Init { force } => {
            let config_path = PathBuf::from(".forage/settings.toml");

            if config_path.exists() && !force {
                eprintln!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                eprintln!("Use --force to overwrite");
                std::process::exit(1);
            }

            match Settings::init_config_file(force) {
                Ok(path) => {
                    println!("Edit {} to customize your settings.", path.display());
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            }
        }

        Commands::Config => {
            println!("Current Configuration:");
            println!("{}", "=".repeat(50));
            match toml::to_string_pretty(&config) {
                Ok(toml_str) => println!("{toml_str}"),
                Err(e) => eprintln!("Error displaying config: {e}"),
            }
        }

        Commands::Index { sources } => {
            let sources = resolve_sources(&sources);
            let retriever = build_retriever(&config);
            let backend = build_backend(&config);

            for source in &sources {
                let collection = source.collection_name();
                let exists = backend.collection_exists(&collection).await.unwrap_or(false);
                if !exists {
                    if let Err(e) = backend
                        .create_collection(&collection, retriever.dimensions())
                        .await
                    {
                        eprintln!("Error creating collection '{collection}': {e}");
                        std::process::exit(1);
                    }
                }

                let store = match backend.open(&collection).await {
                    Ok(store) => store,
                    Err(e) => {
                        eprintln!("Error opening collection '{collection}': {e}");
                        std::process::exit(1);
                    }
                };

                match retriever.index_source(source, store.as_ref()).await {
                    Ok(stats) => {
                        println!(
                            "Indexed {source} into '{collection}' ({} chunks)",
                            stats.chunks_indexed
                        );
                    }
                    Err(e) => {
                        eprintln!("Error indexing {source}: {e}");
                        std::process::exit(1);
                    }
                }
            }
        }

        Commands::Query {
            query,
            sources,
            top_k,
            threshold,
        } => {
            let sources = resolve_sources(&sources);
            let retriever = build_retriever(&config);
            let backend = build_backend(&config);

            let top_k = top_k.unwrap_or(config.retrieval.top_k);
            let threshold = threshold.unwrap_or(config.retrieval.similarity_threshold);

            match retriever
                .run_with(&query, &sources, backend.as_ref(), top_k, threshold)
                .await
            {
                Ok(answer) => println!("{answer}"),
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
}

fn resolve_sources(raw: &[String]) -> Vec<ContentSource> {
    raw.iter().map(|s| ContentSource::resolve(s)).collect()
}

fn build_retriever(config: &Settings) -> Retriever {
    let embedder = build_embedder(config);
    match Retriever::new(embedder).with_chunking(config.chunking.clone()) {
        Ok(retriever) => retriever,
        Err(e) => {
            eprintln!("Invalid chunking configuration: {e}");
            std::process::exit(1);
        }
    }
}

fn build_embedder(config: &Settings) -> Arc<dyn EmbeddingProvider> {
    match config.embedding.provider {
        EmbeddingProviderKind::Local => {
            let model = match local_model(&config.embedding.model) {
                Some(model) => model,
                None => {
                    eprintln!("Unknown local embedding model: {}", config.embedding.model);
                    std::process::exit(1);
                }
            };
            match LocalEmbedder::with_model(model) {
                Ok(embedder) => Arc::new(embedder),
                Err(e) => {
                    eprintln!("Failed to load embedding model: {e}");
                    std::process::exit(1);
                }
            }
        }
        EmbeddingProviderKind::OpenAi => {
            let api_key = config
                .embedding
                .api_key
                .clone()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok())
                .unwrap_or_else(|| {
                    eprintln!(
                        "OpenAI provider selected but no API key configured \
                         (set embedding.api_key or OPENAI_API_KEY)"
                    );
                    std::process::exit(1);
                });

            let dims = openai_model_dims(&config.embedding.model);
            let mut embedder =
                OpenAiEmbedder::new(api_key).with_model(&config.embedding.model, dims);
            if let Some(base_url) = &config.embedding.base_url {
                embedder = embedder.with_base_url(base_url);
            }
            Arc::new(embedder)
        }
    }
}

fn local_model(name: &str) -> Option<EmbeddingModel> {
    match name {
        "AllMiniLML6V2" => Some(EmbeddingModel::AllMiniLML6V2),
        "AllMiniLML12V2" => Some(EmbeddingModel::AllMiniLML12V2),
        "BGESmallENV15" => Some(EmbeddingModel::BGESmallENV15),
        "BGEBaseENV15" => Some(EmbeddingModel::BGEBaseENV15),
        _ => None,
    }
}

fn openai_model_dims(model: &str) -> usize {
    match model {
        "text-embedding-3-large" => 3072,
        // text-embedding-3-small and text-embedding-ada-002
        _ => 1536,
    }
}

fn build_backend(config: &Settings) -> Box<dyn VectorBackend> {
    match config.storage.backend {
        StorageBackendKind::Memory => Box::new(InMemoryBackend::new()),
        StorageBackendKind::Qdrant => Box::new(QdrantBackend::new(&config.storage.qdrant)),
    }
}
