use anyhow::Context;
use clap::{Parser, Subcommand};
use jobmatch_core::TrainedArtifacts;
use jobmatch_matcher::{Config, JobMatcher, Trainer};
use jobmatch_storage::{load_jobs, ArtifactStore, ModelCache};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Job recommendations from a trained match classifier
#[derive(Parser, Debug)]
#[command(name = "jobmatch")]
#[command(about = "Train and query the job match classifier", long_about = None)]
struct Args {
    /// JSON config file; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the model bundle
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fit the classifier on a job file and save the bundle
    Train {
        /// JSON array of job records
        #[arg(short, long)]
        jobs: PathBuf,

        /// Number of trees
        #[arg(long)]
        trees: Option<usize>,

        /// Initial label threshold
        #[arg(long)]
        threshold: Option<usize>,
    },
    /// Rank jobs for a set of user skills and print them as JSON
    Recommend {
        /// JSON array of job records
        #[arg(short, long)]
        jobs: PathBuf,

        /// Comma separated user skills
        #[arg(short, long, value_delimiter = ',')]
        skills: Vec<String>,

        /// Number of results
        #[arg(long)]
        top_n: Option<usize>,

        /// Ignore any saved model
        #[arg(long, default_value_t = false)]
        heuristic: bool,
    },
    /// Print the saved bundle's manifest and most important features
    Inspect {
        /// Number of features to list
        #[arg(long, default_value_t = 20)]
        top_features: usize,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // logs go to stderr so `recommend` output stays parseable
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config {:?}", path))?,
        None => Config::default(),
    };
    if let Some(dir) = args.model_dir {
        config.model_dir = dir;
    }

    info!("jobmatch v{}", env!("CARGO_PKG_VERSION"));
    info!("Model directory: {:?}", config.model_dir);

    let store = ArtifactStore::new(&config.model_dir);

    match args.command {
        Command::Train {
            jobs,
            trees,
            threshold,
        } => {
            if let Some(trees) = trees {
                config.training.forest.n_estimators = trees;
            }
            if let Some(threshold) = threshold {
                config.training.label_threshold = threshold;
            }

            let jobs =
                load_jobs(&jobs).with_context(|| format!("reading jobs from {:?}", jobs))?;
            let trainer = Trainer::new(config.training)?;
            let report = trainer.train_and_save(&jobs, &store)?;

            info!(
                "Saved bundle {} ({} trees, {} features)",
                report.manifest.bundle_id, report.manifest.n_trees, report.manifest.feature_dim
            );
            if let Some(evaluation) = &report.summary.evaluation {
                println!("{}", evaluation);
            }
        }
        Command::Recommend {
            jobs,
            skills,
            top_n,
            heuristic,
        } => {
            if let Some(top_n) = top_n {
                config.matcher.top_n = top_n;
            }
            config.matcher.validate()?;

            let jobs =
                load_jobs(&jobs).with_context(|| format!("reading jobs from {:?}", jobs))?;
            let matcher = if heuristic {
                JobMatcher::heuristic_only(config.matcher)
            } else {
                JobMatcher::new(Arc::new(ModelCache::new(store)), config.matcher)
            };

            let recommendations = matcher.score_jobs(&skills, &jobs);
            println!("{}", serde_json::to_string_pretty(&recommendations)?);
        }
        Command::Inspect { top_features } => {
            let (artifacts, manifest) = store
                .load()
                .with_context(|| format!("loading bundle from {:?}", store.dir()))?;
            println!("{}", serde_json::to_string_pretty(&manifest)?);
            print_importances(&artifacts, top_features);
        }
    }

    Ok(())
}

fn print_importances(artifacts: &TrainedArtifacts, n: usize) {
    let mut ranked: Vec<(String, f64)> = artifacts
        .feature_names()
        .into_iter()
        .zip(artifacts.classifier.feature_importances())
        .filter(|(_, importance)| *importance > 0.0)
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    println!("\nTop features:");
    for (name, importance) in ranked.into_iter().take(n) {
        println!("  {:<32} {:.4}", name, importance);
    }
}
