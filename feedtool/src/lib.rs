#![forbid(unsafe_code)]

use std::{
    fs::File,
    io::{BufReader, Write, stdout},
    path::{Path, PathBuf},
};

use clap::{Args, Parser, Subcommand};
use relay_feed_core::{
    Config, ConnectionPath, MergeError, NodeKey, merge_connections, merge_connections_backward,
    patch::{self, InsertPolicy},
    query_builder::{QueryBuilder, Selection},
};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// This environment variable is used to control logs.
const LOG_ENV_VAR: &str = "LOG";

/// feedtool – merge and patch paginated GraphQL responses
#[derive(Parser)]
#[command(version, about, arg_required_else_help(true))]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Merge a newly fetched page into an accumulated response
    Merge(Merge),
    /// Replace or insert a single edge
    Upsert(Upsert),
    /// Remove nodes by key
    Remove(Remove),
    /// Fold a partial (subscription) response into a response
    DeepMerge(DeepMerge),
    /// Print a paginated query document
    Query(Query),
}

#[derive(Args)]
pub struct KeyArgs {
    /// Node field identifying nodes across pages
    #[arg(short('k'), long, conflicts_with = "whole_node")]
    pub key: Option<String>,

    /// Identify nodes by their entire value
    #[arg(long)]
    pub whole_node: bool,
}

#[derive(Args)]
#[command(arg_required_else_help(true))]
pub struct Merge {
    /// Response accumulated so far. Omit for the first page.
    #[arg(long)]
    pub old: Option<PathBuf>,

    /// Newly fetched response
    #[arg(long)]
    pub new: PathBuf,

    /// Dot-delimited path of the connection, e.g. `viewer.wallet.transactions`
    #[arg(short, long)]
    pub path: String,

    /// The new page precedes the accumulated edges (`last`/`before` pagination)
    #[arg(long)]
    pub backward: bool,

    #[command(flatten)]
    pub key: KeyArgs,
}

#[derive(Args)]
#[command(arg_required_else_help(true))]
pub struct Upsert {
    #[arg(long)]
    pub response: PathBuf,

    /// Edge object with `cursor` and `node`
    #[arg(long)]
    pub edge: PathBuf,

    #[arg(short, long)]
    pub path: String,

    /// Insert new nodes first instead of following the configured policy
    #[arg(long)]
    pub prepend: bool,

    #[command(flatten)]
    pub key: KeyArgs,
}

#[derive(Args)]
#[command(arg_required_else_help(true))]
pub struct Remove {
    #[arg(long)]
    pub response: PathBuf,

    #[arg(short, long)]
    pub path: String,

    /// Key values of nodes to remove. Values that parse as JSON are used as such, others as strings.
    #[arg(long("id"), required = true)]
    pub ids: Vec<String>,

    #[command(flatten)]
    pub key: KeyArgs,
}

#[derive(Args)]
#[command(arg_required_else_help(true))]
pub struct DeepMerge {
    #[arg(long)]
    pub target: PathBuf,

    #[arg(long)]
    pub patch: PathBuf,
}

#[derive(Args)]
#[command(arg_required_else_help(true))]
pub struct Query {
    /// Operation name
    #[arg(short, long)]
    pub name: String,

    #[arg(short, long)]
    pub path: String,

    /// Node fields to select
    #[arg(short('f'), long("field"), default_value = "id")]
    pub fields: Vec<String>,

    /// Extra operation variables as `name:Type`
    #[arg(long("var"))]
    pub variables: Vec<String>,
}

#[derive(Debug, Error)]
pub enum FeedtoolError {
    #[error("Invalid variable declaration `{0}`, expected `name:Type`")]
    InvalidVariable(String),
    #[error("{0}")]
    Merge(#[from] MergeError),
    #[error("{0:?}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("{0}")]
    IO(#[from] std::io::Error),
}

pub fn run() -> Result<(), FeedtoolError> {
    let cli = Cli::parse();
    init_tracing();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };

    if let Some(command) = cli.command {
        run_command(command, &config, &mut stdout().lock())
    } else {
        Ok(())
    }
}

pub fn run_command(
    command: Command,
    config: &Config,
    out: &mut impl Write,
) -> Result<(), FeedtoolError> {
    match command {
        Command::Merge(args) => {
            let path = ConnectionPath::parse(&args.path)?;
            let node_key = args.key.node_key(config);
            let old = args.old.as_deref().map(read_json).transpose()?;
            let new = read_json(&args.new)?;

            let merged = if args.backward {
                merge_connections_backward(old.as_ref(), new, &path, &node_key)?
            } else {
                merge_connections(old.as_ref(), new, &path, &node_key)?
            };
            write_json(out, &merged)
        }
        Command::Upsert(args) => {
            let path = ConnectionPath::parse(&args.path)?;
            let policy = if args.prepend {
                InsertPolicy::Prepend
            } else {
                config.insert_policy
            };
            let response = read_json(&args.response)?;
            let edge = read_json(&args.edge)?;

            let (patched, upserted) =
                patch::upsert_edge(&response, &path, &args.key.node_key(config), edge, policy)?;
            info!(?upserted, "upserted edge");
            write_json(out, &patched)
        }
        Command::Remove(args) => {
            let path = ConnectionPath::parse(&args.path)?;
            let response = read_json(&args.response)?;
            let keys: Vec<Value> = args.ids.iter().map(|id| parse_key(id)).collect();

            let (patched, removed) =
                patch::remove_nodes(&response, &path, &args.key.node_key(config), &keys)?;
            info!(removed, "removed nodes");
            write_json(out, &patched)
        }
        Command::DeepMerge(args) => {
            let target = read_json(&args.target)?;
            let patch = read_json(&args.patch)?;
            write_json(out, &patch::deep_merge(target, patch))
        }
        Command::Query(args) => {
            let path = ConnectionPath::parse(&args.path)?;
            let mut builder = QueryBuilder::new(args.name);
            for variable in &args.variables {
                let Some((name, ty)) = variable.split_once(':') else {
                    return Err(FeedtoolError::InvalidVariable(variable.clone()));
                };
                builder = builder.variable(name.trim(), ty.trim());
            }
            let node = Selection::new().fields(args.fields.iter().map(String::as_str));
            let query = builder.paginated_connection(&path, node).build();

            write!(out, "{query}")?;
            Ok(())
        }
    }
}

impl KeyArgs {
    fn node_key(&self, config: &Config) -> NodeKey {
        if self.whole_node {
            NodeKey::Whole
        } else if let Some(key) = &self.key {
            NodeKey::field(key)
        } else {
            config.node_key.clone()
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config, FeedtoolError> {
    debug!(?path, "loading config");
    Ok(serde_json::from_reader(BufReader::new(File::open(path)?))?)
}

fn read_json(path: &Path) -> Result<Value, FeedtoolError> {
    debug!(?path, "reading");
    Ok(serde_json::from_reader(BufReader::new(File::open(path)?))?)
}

fn write_json(out: &mut impl Write, value: &Value) -> Result<(), FeedtoolError> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn parse_key(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var(LOG_ENV_VAR)
                .from_env_lossy(),
        )
        .init();
}
