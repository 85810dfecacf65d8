use attachment_classifier::config::Config;
use attachment_classifier::error::ClassifierError;
use attachment_classifier::logging::init_subscriber;
use attachment_classifier::request::RequestContext;
use attachment_classifier::resolver::ClassificationResolver;
use attachment_classifier::store::{InMemoryStore, RecordStore};
use attachment_classifier::watermark::{auto_apply_rules, list_candidates, Actor, ListMode};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Attachment classifier - resolve which content type owns a media attachment
#[derive(Parser, Debug)]
#[command(name = "attachment-classifier")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to a YAML or JSON store fixture
    #[arg(short, long)]
    store: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve the owning type of one or more attachments
    Resolve {
        #[arg(required = true)]
        ids: Vec<u64>,

        /// Request parameter as key=value (repeatable)
        #[arg(long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,

        /// Referring URL of the simulated request
        #[arg(long)]
        referer: Option<String>,
    },

    /// Show the rules that would auto-apply to an uploaded attachment
    Eligible {
        id: u64,

        /// The uploader holds the apply-watermark capability
        #[arg(long)]
        can_apply: bool,

        /// Request parameter as key=value (repeatable)
        #[arg(long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,
    },

    /// List attachments for a bulk watermark or restore run
    List {
        #[arg(long, default_value_t = ListMode::Watermark)]
        mode: ListMode,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Serialize)]
struct ResolutionRow {
    id: u64,
    resolved_type: String,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("empty parameter name in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

fn request_context(params: &[(String, String)], referer: Option<&str>) -> RequestContext {
    let context = params
        .iter()
        .fold(RequestContext::new(), |context, (key, value)| {
            context.with_param(key.as_str(), value.as_str())
        });
    match referer {
        Some(url) => context.with_referer(url),
        None => context,
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config, ClassifierError> {
    let config = match path {
        Some(path) => Config::from_file(path).map_err(ClassifierError::Config)?,
        None => Config::default(),
    };
    config.validate().map_err(ClassifierError::Config)?;
    Ok(config)
}

fn run(args: Args) -> Result<(), ClassifierError> {
    let config = load_config(args.config.as_ref())?;
    init_subscriber(&config.logging)?;

    let store = InMemoryStore::from_file(&args.store)?;

    tracing::info!(
        config_file = ?args.config.as_ref().map(|p| p.display().to_string()),
        store_file = %args.store.display(),
        rules = config.rules.len(),
        "Configuration loaded successfully"
    );

    let context = match &args.command {
        Command::Resolve {
            params, referer, ..
        } => request_context(params, referer.as_deref()),
        Command::Eligible { params, .. } => request_context(params, None),
        Command::List { .. } => RequestContext::new(),
    };

    let resolver = ClassificationResolver::new(Arc::new(store.clone()), Arc::new(config))
        .with_context(Arc::new(context));

    match args.command {
        Command::Resolve { ids, .. } => {
            let mut rows = Vec::with_capacity(ids.len());
            for id in ids {
                let resolved = resolver.resolve_id(id)?;
                rows.push(ResolutionRow {
                    id,
                    resolved_type: resolved.into_string(),
                });
            }
            match args.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
                OutputFormat::Text => {
                    for row in &rows {
                        println!("{}\t{}", row.id, row.resolved_type);
                    }
                }
            }
        }
        Command::Eligible { id, can_apply, .. } => {
            let attachment = store
                .attachment(id)?
                .ok_or(ClassifierError::AttachmentNotFound(id))?;
            let rules = auto_apply_rules(&resolver, &attachment, Actor::new(can_apply))?;
            let names: Vec<&str> = rules.iter().map(|rule| rule.name.as_str()).collect();
            match args.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&names)?),
                OutputFormat::Text => {
                    for name in names {
                        println!("{}", name);
                    }
                }
            }
        }
        Command::List { mode } => {
            let outcome = list_candidates(&resolver, mode)?;
            match args.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
                OutputFormat::Text => {
                    for item in &outcome.items {
                        println!("{}\t{}", item.id, item.title);
                    }
                    for failure in &outcome.failures {
                        eprintln!("failed\t{}\t{}", failure.id, failure.error);
                    }
                }
            }
        }
    }

    let stats = resolver.cache_stats();
    tracing::debug!(
        resolution_hits = stats.resolutions.hits,
        resolution_misses = stats.resolutions.misses,
        detection_entries = stats.detections.entries,
        store_queries = store.query_count(),
        "Resolver cache statistics"
    );

    Ok(())
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
