//! CLI entry point for `sde-editors`.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use sde_editors::access::index::AccessIndex;
use sde_editors::audit::{run_audit, AuditPlan};
use sde_editors::catalog::snapshot::SnapshotConnector;
use sde_editors::catalog::source::{CatalogConnector, CatalogTarget};
use sde_editors::catalog::sql_server::SqlServerConnector;
use sde_editors::config::{AuditSection, Config, DEFAULT_CONFIG_FILE};
use sde_editors::error::{Error, Result};
use sde_editors::logging;
use sde_editors::output::export::{self, ExportKind};
use sde_editors::output::formatter::{self, EDITORS_FILE_NAME, TABLES_FILE_NAME};
use sde_editors::output::report;
use tracing::{error, info};

#[derive(Parser)]
#[command(
    name = "sde-editors",
    about = "Report which AD users can edit which geodatabase tables"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve table editors for each configured catalog
    Audit(AuditArgs),
    /// Show who can edit the given tables
    Table {
        /// Table names
        #[arg(required = true)]
        tables: Vec<String>,

        /// Only users granted through this group
        #[arg(long)]
        group: Option<String>,

        /// Only users whose name contains this text
        #[arg(long)]
        filter: Option<String>,

        #[command(flatten)]
        data: DataArgs,
    },
    /// Show what the given users can edit
    User {
        /// Member display names, as in the membership export
        #[arg(required = true)]
        users: Vec<String>,

        /// Only tables granted through this group
        #[arg(long)]
        group: Option<String>,

        #[command(flatten)]
        data: DataArgs,
    },
    /// Show the members and tables of the given groups
    Group {
        /// AD group names
        #[arg(required = true)]
        groups: Vec<String>,

        /// Only tables whose name contains this text
        #[arg(long)]
        filter: Option<String>,

        #[command(flatten)]
        data: DataArgs,
    },
}

#[derive(Args)]
struct AuditArgs {
    /// Configuration file
    #[arg(long, env = "SDE_EDITORS_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Group membership export (overrides `[audit] membership_csv`)
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Catalog target to audit; repeat for several (overrides `[audit] targets`)
    #[arg(long = "target")]
    targets: Vec<String>,

    /// Output directory (overrides `[audit] output_dir`)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Replay a saved groups_and_tables.json instead of querying the catalog
    #[arg(long)]
    role_tables: Option<PathBuf>,

    /// Also write report_multi_table_editors.csv
    #[arg(long)]
    export_csv: bool,

    /// Log at trace level
    #[arg(long)]
    verbose: bool,
}

#[derive(Args)]
struct DataArgs {
    /// Directory holding groups_and_editors.json and groups_and_tables.json
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// Write the view as CSV into this directory
    #[arg(long)]
    export_to: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Audit(args) => audit(args).await,
        Command::Table {
            tables,
            group,
            filter,
            data,
        } => show_tables(&tables, group.as_deref(), filter.as_deref(), &data),
        Command::User { users, group, data } => show_users(&users, group.as_deref(), &data),
        Command::Group {
            groups,
            filter,
            data,
        } => show_groups(&groups, filter.as_deref(), &data),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(2);
    }
}

async fn audit(args: AuditArgs) -> Result<()> {
    let config = match Config::load(&args.config) {
        Ok(config) => config,
        // A snapshot replay needs no connection strings.
        Err(Error::FileNotFound { .. }) if args.role_tables.is_some() => Config::default(),
        Err(e) => {
            // No log_dir is known yet, so the failure goes to the default one.
            if logging::init(&AuditSection::default().log_dir, args.verbose).is_ok() {
                error!("{e}");
            }
            return Err(e);
        }
    };

    let log_file = logging::init(&config.audit.log_dir, args.verbose)?;
    info!("Logging to {}", log_file.display());

    let result = run(&config, &args).await;
    if let Err(e) = &result {
        error!("{e}");
    }
    result
}

async fn run(config: &Config, args: &AuditArgs) -> Result<()> {
    let snapshot = args
        .role_tables
        .as_deref()
        .map(SnapshotConnector::load)
        .transpose()?;

    let mut plan = match &snapshot {
        Some(_) => AuditPlan {
            membership_csv: config.audit.membership_csv.clone(),
            output_dir: config.audit.output_dir.clone(),
            targets: snapshot_targets(config, &args.targets),
            export_csv: false,
        },
        None => AuditPlan::from_config(config, &args.targets)?,
    };
    if let Some(csv) = &args.csv {
        plan.membership_csv = csv.clone();
    }
    if let Some(output_dir) = &args.output_dir {
        plan.output_dir = output_dir.clone();
    }
    plan.export_csv = args.export_csv;

    let connector: &dyn CatalogConnector = match &snapshot {
        Some(snapshot) => snapshot,
        None => &SqlServerConnector,
    };

    let mut stdout = std::io::stdout().lock();
    let summary = run_audit(&plan, connector, &mut stdout).await?;
    info!(
        "Audited {} target(s) against {} groups",
        summary.targets.len(),
        summary.membership.len()
    );
    Ok(())
}

// Replayed targets only need names; descriptors are kept when configured.
fn snapshot_targets(config: &Config, names: &[String]) -> Vec<CatalogTarget> {
    let names = if names.is_empty() {
        config.audit.targets.as_slice()
    } else {
        names
    };
    names
        .iter()
        .map(|name| {
            let descriptor = config.server.get(name).cloned().unwrap_or_default();
            CatalogTarget::new(name.as_str(), descriptor)
        })
        .collect()
}

fn load_index(data_dir: &Path) -> Result<AccessIndex> {
    let membership = formatter::load_group_membership(&data_dir.join(EDITORS_FILE_NAME))?;
    let role_tables = formatter::load_role_tables(&data_dir.join(TABLES_FILE_NAME))?;
    Ok(AccessIndex::build(&membership, &role_tables))
}

fn show_tables(
    tables: &[String],
    group: Option<&str>,
    filter: Option<&str>,
    data: &DataArgs,
) -> Result<()> {
    let index = load_index(&data.data_dir)?;
    let names: Vec<&str> = tables.iter().map(String::as_str).collect();
    let view = index.table_view(&names, group, filter);
    print_view(|out| report::write_table_view(out, &names, &view))?;

    if let Some(dir) = &data.export_to {
        let path = export_destination(dir, ExportKind::Table, &names)?;
        export::export_table_editors(&index, &names, &path)?;
        print_export(&path)?;
    }
    Ok(())
}

fn show_users(users: &[String], group: Option<&str>, data: &DataArgs) -> Result<()> {
    let index = load_index(&data.data_dir)?;
    let names: Vec<&str> = users.iter().map(String::as_str).collect();
    let view = index.user_view(&names, group);
    print_view(|out| report::write_user_view(out, &names, &view))?;

    if let Some(dir) = &data.export_to {
        let path = export_destination(dir, ExportKind::User, &names)?;
        export::export_user_tables(&index, &names, &path)?;
        print_export(&path)?;
    }
    Ok(())
}

fn show_groups(groups: &[String], filter: Option<&str>, data: &DataArgs) -> Result<()> {
    let index = load_index(&data.data_dir)?;
    let names: Vec<&str> = groups.iter().map(String::as_str).collect();
    let view = index.group_view(&names, filter);
    print_view(|out| report::write_group_view(out, &names, &view))?;

    if let Some(dir) = &data.export_to {
        let path = export_destination(dir, ExportKind::Group, &names)?;
        export::export_group_tables(&index, &names, &path)?;
        print_export(&path)?;
    }
    Ok(())
}

fn export_destination(dir: &Path, kind: ExportKind, names: &[&str]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|source| Error::Write {
        path: dir.to_path_buf(),
        source,
    })?;
    export::export_path(dir, &export::default_export_name(kind, names))
}

fn print_view(render: impl FnOnce(&mut dyn Write) -> std::io::Result<()>) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    render(&mut stdout).or_else(ignore_broken_pipe)
}

fn print_export(path: &Path) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "Exported {}", path.display()).or_else(ignore_broken_pipe)
}

// `sde-editors table X | head` should not fail.
fn ignore_broken_pipe(source: std::io::Error) -> Result<()> {
    if source.kind() == ErrorKind::BrokenPipe {
        return Ok(());
    }
    Err(Error::Write {
        path: PathBuf::from("<stdout>"),
        source,
    })
}
