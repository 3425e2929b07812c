//! sqlreport CLI - Fill in and inspect parameterized SQL report templates

use clap::Parser;
use serde::Serialize;
use sqlreport::cli::{init_tracing, read_input, Cli, Commands, FilterArgs};
use sqlreport::substitute::{parse_date, render_at};
use sqlreport::{decode_sql_param, detect, extract, ReportState};
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Detect { file } => run_detect(&file),
        Commands::Extract { file } => run_extract(&file),
        Commands::Render {
            file,
            filters,
            today,
            strict,
        } => run_render(&file, &filters, today.as_deref(), strict),
        Commands::Link {
            file,
            filters,
            base,
        } => run_link(&file, &filters, base.as_deref()),
        Commands::Decode { link } => run_decode(&link),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            ExitCode::from(2)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> sqlreport::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Run the detect command
fn run_detect(file: &Path) -> sqlreport::Result<ExitCode> {
    let template = read_input(file)?;
    print_json(&detect(&template))?;
    Ok(ExitCode::SUCCESS)
}

/// Run the extract command
fn run_extract(file: &Path) -> sqlreport::Result<ExitCode> {
    let sql = read_input(file)?;
    print_json(&extract(&sql))?;
    Ok(ExitCode::SUCCESS)
}

/// Run the render command
fn run_render(
    file: &Path,
    filters: &FilterArgs,
    today: Option<&str>,
    strict: bool,
) -> sqlreport::Result<ExitCode> {
    let template = read_input(file)?;
    let params = filters.to_params()?;
    let today = match today {
        Some(date) => parse_date(date)?,
        None => chrono::Local::now().date_naive(),
    };

    let rendered = render_at(&template, &params, today);
    print!("{}", rendered.sql);

    for placeholder in &rendered.unresolved {
        eprintln!(
            "unresolved {} {}: {}",
            placeholder.kind, placeholder.text, placeholder.reason
        );
    }

    if strict && !rendered.is_complete() {
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}

/// Run the link command
fn run_link(file: &Path, filters: &FilterArgs, base: Option<&str>) -> sqlreport::Result<ExitCode> {
    let template = read_input(file)?;
    let params = filters.to_params()?;
    let query = ReportState::new(template, &params).to_query();

    match base {
        Some(base) => println!("{}?{}", base.trim_end_matches('?'), query),
        None => println!("{}", query),
    }
    Ok(ExitCode::SUCCESS)
}

/// Run the decode command
///
/// A bare encoded `sql` value (no `key=value` pairs) is printed as plain SQL.
fn run_decode(link: &str) -> sqlreport::Result<ExitCode> {
    if !link.contains('=') {
        println!("{}", decode_sql_param(link)?);
        return Ok(ExitCode::SUCCESS);
    }
    let state = ReportState::from_query(link)?;
    print_json(&state)?;
    Ok(ExitCode::SUCCESS)
}
