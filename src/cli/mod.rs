//! CLI argument parsing, input handling and logging setup

use crate::substitute::{parse_date, EventTable, SubstitutionParams};
use crate::{Error, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// sqlreport - Fill in and inspect parameterized SQL report templates
#[derive(Parser, Debug)]
#[command(name = "sqlreport")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log each rewrite pass to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report which placeholders a template uses (JSON)
    Detect {
        /// Template file (use - for stdin)
        file: PathBuf,
    },
    /// Pull hardcoded filter values out of existing SQL (JSON)
    Extract {
        /// SQL file (use - for stdin)
        file: PathBuf,
    },
    /// Substitute a template into executable SQL
    Render {
        /// Template file (use - for stdin)
        file: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,

        /// Anchor date for the default range instead of the local date (YYYY-MM-DD)
        #[arg(long)]
        today: Option<String>,

        /// Exit with code 1 if any placeholder is left unresolved
        #[arg(long)]
        strict: bool,
    },
    /// Build a report link query string for a template and its filters
    Link {
        /// Template file (use - for stdin)
        file: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,

        /// Page URL to prepend to the query string
        #[arg(long)]
        base: Option<String>,
    },
    /// Decode a report link into its template and filters (JSON)
    Decode {
        /// Full URL, query string, or a bare encoded sql value
        link: String,
    },
}

/// Filter values, from flags and an optional params file
#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// JSON params file; flags override its values
    #[arg(long, value_name = "FILE")]
    pub params: Option<PathBuf>,

    /// Website UUID for {{website_id}}
    #[arg(long)]
    pub website_id: Option<String>,

    /// Site domain for {{nettside}}
    #[arg(long)]
    pub site_domain: Option<String>,

    /// URL path filter (empty or / means no filter)
    #[arg(long)]
    pub url_path: Option<String>,

    /// How the URL path is compared: equals or starts-with
    #[arg(long)]
    pub path_operator: Option<String>,

    /// Start date (YYYY-MM-DD), defaults to 30 days before today
    #[arg(long)]
    pub from: Option<String>,

    /// End date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub to: Option<String>,

    /// Custom variable, repeatable
    #[arg(long = "var", value_name = "NAME=VALUE")]
    pub vars: Vec<String>,

    /// Table for the date clause instead of guessing: event or session
    #[arg(long)]
    pub table: Option<EventTable>,

    /// Warehouse project qualifying the event views
    #[arg(long, env = "SQLREPORT_PROJECT")]
    pub project: Option<String>,
}

impl FilterArgs {
    /// Merge the params file (if any) with the flags, flags winning
    pub fn to_params(&self) -> Result<SubstitutionParams> {
        let mut params = match &self.params {
            Some(path) => load_params(path)?,
            None => SubstitutionParams::default(),
        };

        if let Some(website_id) = &self.website_id {
            params.website_id = Some(website_id.clone());
        }
        if let Some(site_domain) = &self.site_domain {
            params.site_domain = Some(site_domain.clone());
        }
        if let Some(url_path) = &self.url_path {
            params.url_path = Some(url_path.clone());
        }
        if let Some(operator) = &self.path_operator {
            params.path_operator = operator.parse()?;
        }
        if let Some(from) = &self.from {
            params.date_range.from = Some(parse_date(from)?);
        }
        if let Some(to) = &self.to {
            params.date_range.to = Some(parse_date(to)?);
        }
        for spec in &self.vars {
            let (name, value) = parse_variable(spec)?;
            params.custom_variables.insert(name, value);
        }
        if let Some(table) = self.table {
            params.event_table = Some(table);
        }
        if let Some(project) = &self.project {
            params.project = Some(project.clone());
        }

        Ok(params)
    }
}

/// Read substitution params from a JSON file
pub fn load_params(path: &Path) -> Result<SubstitutionParams> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Split a `name=value` flag. The value may be empty or contain `=`.
pub fn parse_variable(spec: &str) -> Result<(String, String)> {
    match spec.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(Error::InvalidVariable {
            spec: spec.to_string(),
        }),
    }
}

/// Read a file, or stdin for `-`
pub fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut contents = String::new();
        io::stdin().read_to_string(&mut contents)?;
        return Ok(contents);
    }
    Ok(fs::read_to_string(path)?)
}

/// Log to stderr, filtered by `RUST_LOG` or `--verbose`
pub fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "sqlreport=debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let fmt_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(true)
        .without_time();

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}
