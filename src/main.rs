use anyhow::{Context, Result};
use citation_graph::archive::{select_candidates, unpack, UnpackOutcome};
use citation_graph::config::{
    default_config_path, find_config_file, get_config, load_config, Config,
};
use citation_graph::extract::{ArxivPattern, CitationExtractor, ReconcilePolicy};
use citation_graph::models::{PaperId, PaperWorkspace, ReconciledCitation};
use citation_graph::pipeline::BatchRunner;
use citation_graph::sink::{CitationSink, JsonLinesSink};
use citation_graph::ui::{status_label, BatchProgress};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Citation Graph - extract citation edges from arXiv LaTeX sources
#[derive(Parser, Debug)]
#[command(name = "citation-graph")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Extract citation edges from arXiv LaTeX sources", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download papers and record their citations
    Run {
        /// Paper identifiers (e.g. 1902.00678, hep-th/9211122)
        ids: Vec<String>,

        /// File with one identifier per line (`#` starts a comment)
        #[arg(long)]
        ids_file: Option<PathBuf>,

        /// Append JSON lines here instead of writing to stdout
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Directory for downloaded and extracted sources
        #[arg(long)]
        work_dir: Option<PathBuf>,

        /// How to choose between arXiv identifiers and DOIs
        #[arg(long)]
        policy: Option<ReconcilePolicy>,

        /// arXiv identifier pattern (loose or strict)
        #[arg(long)]
        pattern: Option<ArxivPattern>,

        /// Drop repeated citations within a paper
        #[arg(long)]
        dedup: bool,

        /// Keep the downloaded and extracted files
        #[arg(long)]
        keep_files: bool,

        /// Stop at the first paper that fails
        #[arg(long)]
        fail_fast: bool,
    },

    /// Extract citations from local sources without downloading
    Parse {
        /// A source directory, a single .bbl/.tex file, or an e-print payload
        path: PathBuf,

        /// How to choose between arXiv identifiers and DOIs
        #[arg(long)]
        policy: Option<ReconcilePolicy>,

        /// arXiv identifier pattern (loose or strict)
        #[arg(long)]
        pattern: Option<ArxivPattern>,
    },

    /// Show or create the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,

    /// Write the default configuration
    Init {
        /// Destination (default: the user config directory)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { log_level };
    let json = cli.log_format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| format!("citation_graph={}", env_filter)),
        ))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .init();

    // Load configuration from file if specified or found in default locations
    let mut config = if let Some(config_path) = &cli.config {
        load_config(config_path)
            .with_context(|| format!("Failed to load {}", config_path.display()))?
    } else if let Some(config_path) = find_config_file() {
        tracing::info!("Using config file: {}", config_path.display());
        load_config(&config_path)?
    } else {
        get_config()?
    };

    match cli.command {
        Commands::Run {
            ids,
            ids_file,
            output,
            work_dir,
            policy,
            pattern,
            dedup,
            keep_files,
            fail_fast,
        } => {
            if let Some(root) = work_dir {
                config.workspace.root = root;
            }
            apply_extraction_flags(&mut config, policy, pattern);
            config.extraction.dedup |= dedup;
            config.workspace.keep_files |= keep_files;
            config.batch.fail_fast |= fail_fast;

            let mut papers = ids;
            if let Some(path) = ids_file {
                papers.extend(read_ids_file(&path)?);
            }
            if papers.is_empty() {
                anyhow::bail!("No paper identifiers given");
            }

            let mut sink: Box<dyn CitationSink> = match &output {
                Some(path) => Box::new(
                    JsonLinesSink::append_to(path)
                        .with_context(|| format!("Failed to open {}", path.display()))?,
                ),
                None => Box::new(JsonLinesSink::stdout()),
            };

            let runner = BatchRunner::new(&config)?;
            let progress = BatchProgress::new(papers.len());
            let report = runner
                .run_with(&papers, sink.as_mut(), |outcome| progress.complete(outcome))
                .await?;
            progress.finish(report.cited(), papers.len());

            if !cli.quiet {
                for failure in report.failures() {
                    eprintln!("{}: {}", failure.paper, status_label(&failure.status));
                }
                eprintln!(
                    "Processed {} papers: {} with citations ({} total), {} failed",
                    report.outcomes.len(),
                    report.cited(),
                    report.total_citations(),
                    report.failures().count()
                );
            }
        }

        Commands::Parse {
            path,
            policy,
            pattern,
        } => {
            apply_extraction_flags(&mut config, policy, pattern);
            let citations = parse_local(&path, &config)?;
            println!("{}", serde_json::to_string_pretty(&citations)?);
        }

        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                print!("{}", toml::to_string_pretty(&config)?);
            }
            ConfigCommands::Init { path, force } => {
                let path = path.unwrap_or_else(default_config_path);
                if path.exists() && !force {
                    anyhow::bail!(
                        "{} already exists (use --force to overwrite)",
                        path.display()
                    );
                }
                Config::default().save(&path)?;
                eprintln!("Wrote {}", path.display());
            }
        },
    }

    Ok(())
}

fn apply_extraction_flags(
    config: &mut Config,
    policy: Option<ReconcilePolicy>,
    pattern: Option<ArxivPattern>,
) {
    if let Some(policy) = policy {
        config.extraction.policy = policy;
    }
    if let Some(pattern) = pattern {
        config.extraction.arxiv_pattern = pattern;
    }
}

fn read_ids_file(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Extract citations from a directory, a source file, or a downloaded payload
fn parse_local(path: &Path, config: &Config) -> Result<Vec<ReconciledCitation>> {
    let extractor = CitationExtractor::from_config(&config.extraction);
    let extensions = &config.extraction.extensions;

    if path.is_dir() {
        let files = select_candidates(path, extensions);
        return Ok(extractor.extract_citations(&files)?);
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if extensions
        .iter()
        .any(|ext| name.ends_with(&format!(".{}", ext)))
    {
        return Ok(extractor.extract_citations(&[path])?);
    }

    let raw =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let stem = name.split('.').next().unwrap_or_default();
    let paper = PaperId::parse(stem).or_else(|_| PaperId::parse("local"))?;
    let workspace = PaperWorkspace::new(&config.workspace.root, &paper);

    let result = match unpack(&raw, &workspace) {
        Ok(UnpackOutcome::Unsupported) => Ok(Vec::new()),
        Ok(_) => {
            let files = select_candidates(workspace.dir(), extensions);
            extractor.extract_citations(&files).map_err(Into::into)
        }
        Err(e) => Err(e.into()),
    };

    if !config.workspace.keep_files {
        workspace.cleanup()?;
    }
    result
}
