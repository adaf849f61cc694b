//! Command execution: wires arguments and settings into the conversion service

use std::io::{self, Write};
use std::path::PathBuf;

use tracing::{debug, instrument};

use crate::application::services::ConvertSummary;
use crate::cli::args::Cli;
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::Settings;
use crate::domain::Issue;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;
use crate::tree_traits::TreeNodeConvert;

/// Issue report destination meaning stdout.
const STDOUT: &str = "-";

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    if cli.show_config {
        print!("{}", settings.to_toml()?);
        return Ok(());
    }

    let container = ServiceContainer::new(settings);
    let summary = convert(cli, &container)?;
    debug!("summary: {:?}", summary);
    Ok(())
}

/// Run one conversion as described by `cli`.
///
/// Issues never fail the run; they go to the `--issues` destination.
#[instrument(level = "debug", skip(container))]
pub fn convert(cli: &Cli, container: &ServiceContainer) -> CliResult<ConvertSummary> {
    let input = cli
        .input
        .clone()
        .ok_or_else(|| CliError::Usage("missing input directory".into()))?;
    let start_file = cli
        .start_file
        .clone()
        .unwrap_or_else(|| container.settings.start_file.clone());
    let out_dir: Option<PathBuf> = if cli.dry_run {
        None
    } else {
        Some(
            cli.output
                .clone()
                .unwrap_or_else(|| container.settings.output_dir.clone()),
        )
    };

    let service = container.convert_service();
    let mut tree = service.parse(&input, out_dir, &start_file)?;
    let summary = service.write_output(&mut tree)?;

    if cli.dry_run {
        println!("{}", tree.to_tree_string());
    }

    write_issues(cli, container, tree.issues())?;

    let verb = if cli.dry_run { "planned" } else { "converted" };
    output::success(&format!(
        "{} {} pages, {} directories, {} images",
        verb, summary.pages, summary.directories, summary.images
    ));
    if let Some(out) = tree.output_root() {
        output::action("Output", &out.display());
    }
    if !tree.issues().is_empty() {
        let dest = if cli.issues == STDOUT {
            "stdout"
        } else {
            cli.issues.as_str()
        };
        output::warning(&format!("{} issues reported to {}", tree.issues().len(), dest));
    }
    Ok(summary)
}

fn write_issues(cli: &Cli, container: &ServiceContainer, issues: &[Issue]) -> CliResult<()> {
    if cli.issues == STDOUT {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        return render_issues(&mut lock, issues)
            .map_err(|e| InfraError::io("write issues to stdout", e).into());
    }

    let mut buf = Vec::new();
    render_issues(&mut buf, issues).map_err(|e| InfraError::io("render issues", e))?;
    let path = PathBuf::from(&cli.issues);
    container
        .fs
        .ensure_parent(&path)
        .and_then(|_| container.fs.write(&path, &String::from_utf8_lossy(&buf)))
        .map_err(|e| InfraError::io(format!("write issues: {}", path.display()), e))?;
    Ok(())
}

/// One issue per line.
pub fn render_issues<W: Write>(out: &mut W, issues: &[Issue]) -> io::Result<()> {
    for issue in issues {
        writeln!(out, "{}", issue)?;
    }
    Ok(())
}
