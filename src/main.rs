//! docsim - Command-line entry point

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docsim::config::Settings;
use docsim::embedding::{BertEncoder, EncoderConfig};
use docsim::services::{rebuild_cache, QueryService, RelationExtractor};
use docsim::storage::{load_corpus, write_report, write_results, EmbeddingCache};

#[derive(Parser)]
#[command(name = "docsim")]
#[command(about = "Document similarity search over sentence embeddings")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode the target corpus and rewrite the embedding cache
    Cache {
        /// Corpus file to encode
        #[arg(long)]
        corpus: Option<PathBuf>,
        /// Cache file to write
        #[arg(long)]
        output: Option<PathBuf>,
        /// Texts per inference batch
        #[arg(long)]
        batch_size: Option<usize>,
    },
    /// Find the cached documents most similar to a query
    Search {
        /// Free-text query
        query: String,
        /// Number of results
        #[arg(long)]
        top_k: Option<usize>,
        /// Cache file to search
        #[arg(long)]
        cache: Option<PathBuf>,
        /// Where to write the ranked results
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Relate each source document to its nearest target documents
    Relate {
        /// Related documents kept per source document
        #[arg(long)]
        k: Option<usize>,
        /// Source corpus file
        #[arg(long)]
        source: Option<PathBuf>,
        /// Target corpus file
        #[arg(long)]
        target: Option<PathBuf>,
        /// Use the embedding cache as the target instead of encoding the target corpus
        #[arg(long, conflicts_with = "target")]
        from_cache: bool,
        /// Where to write the relation report
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Write default settings
    InitConfig {
        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    if let Err(e) = run(Cli::parse()) {
        tracing::error!("docsim failed: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Commands::InitConfig { force } = cli.command {
        let path = match cli.config {
            Some(path) => path,
            None => Settings::default_path()?,
        };
        Settings::init_config_file(&path, force)
            .with_context(|| format!("failed to write settings to {}", path.display()))?;
        println!("Wrote default settings to {}", path.display());
        return Ok(());
    }

    let settings = Settings::load(cli.config.as_deref()).context("failed to load settings")?;

    match cli.command {
        Commands::Cache {
            corpus,
            output,
            batch_size,
        } => {
            let corpus_path = corpus.unwrap_or_else(|| settings.corpora.target.path.clone());
            let output = output.unwrap_or_else(|| settings.search.cache_path.clone());
            let batch_size = batch_size.unwrap_or(settings.encoder.batch_size);

            let corpus = load_corpus(&corpus_path, &settings.corpora.target.format)
                .with_context(|| format!("failed to load corpus {}", corpus_path.display()))?;
            let encoder = load_encoder(&settings.encoder)?;
            let summary = rebuild_cache(&encoder, &corpus, batch_size, &output)
                .with_context(|| format!("failed to rebuild cache {}", output.display()))?;

            println!(
                "Cached {} documents ({}-d) in {}",
                summary.documents,
                summary.dimension,
                summary.path.display()
            );
        }
        Commands::Search {
            query,
            top_k,
            cache,
            output,
        } => {
            let cache = cache.unwrap_or_else(|| settings.search.cache_path.clone());
            let output = output.unwrap_or_else(|| settings.search.results_path.clone());
            let top_k = top_k.unwrap_or(settings.search.top_k);

            let encoder = load_encoder(&settings.encoder)?;
            let mut service = QueryService::new(encoder, settings.search.index_policy)
                .with_format(settings.corpora.target.format.clone());
            let hits = service.search(&query, &cache, top_k).with_context(|| {
                format!("search for {:?} against {} failed", query, cache.display())
            })?;
            write_results(&hits, &output)
                .with_context(|| format!("failed to write results to {}", output.display()))?;

            for (rank, hit) in hits.iter().enumerate() {
                println!(
                    "{:>2}. {:.4}  [{}] {}",
                    rank + 1,
                    hit.similarity,
                    hit.document.id,
                    hit.document.title
                );
            }
        }
        Commands::Relate {
            k,
            source,
            target,
            from_cache,
            output,
        } => {
            let k = k.unwrap_or(settings.relations.k);
            let output = output.unwrap_or_else(|| settings.relations.report_path.clone());
            let source_path = source.unwrap_or_else(|| settings.corpora.source.path.clone());

            let source = load_corpus(&source_path, &settings.corpora.source.format)
                .with_context(|| format!("failed to load corpus {}", source_path.display()))?;
            let encoder = load_encoder(&settings.encoder)?;
            let extractor = RelationExtractor::new(&encoder, settings.encoder.batch_size);

            let report = if from_cache {
                let cache_path = &settings.search.cache_path;
                let cache = EmbeddingCache::read_as(cache_path, &settings.corpora.target.format)
                    .with_context(|| format!("failed to read cache {}", cache_path.display()))?;
                extractor.extract_from_cache(&source, &cache, k)
            } else {
                let target_path = target.unwrap_or_else(|| settings.corpora.target.path.clone());
                let target = load_corpus(&target_path, &settings.corpora.target.format)
                    .with_context(|| format!("failed to load corpus {}", target_path.display()))?;
                extractor.extract(&source, &target, k)
            }
            .context("relation extraction failed")?;

            write_report(&report, &output)
                .with_context(|| format!("failed to write report to {}", output.display()))?;
            print_report_summary(&report.stats, &output);
        }
        Commands::InitConfig { .. } => {}
    }

    Ok(())
}

fn load_encoder(config: &EncoderConfig) -> Result<BertEncoder> {
    BertEncoder::load(config.clone())
        .with_context(|| format!("failed to load model {}", config.model.hf_model_id()))
}

fn print_report_summary(stats: &docsim::domain::RelationStats, output: &Path) {
    match stats.mean_similarity {
        Some(mean) => println!(
            "Related {} documents, average similarity {:.4}, report in {}",
            stats.count,
            mean,
            output.display()
        ),
        None => println!(
            "Related {} documents, no neighbors found, report in {}",
            stats.count,
            output.display()
        ),
    }
}
