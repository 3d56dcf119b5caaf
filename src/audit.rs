//! The audit run: load the membership export once, then resolve editors for
//! each configured catalog target in turn.
//!
//! A failing target aborts the run; targets after it are not attempted.

use std::io::Write;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::access::editors::{resolve_editors, unbridged_roles, TableEditors};
use crate::access::index::AccessIndex;
use crate::access::role_tables::{aggregate, RoleTables};
use crate::catalog::source::{CatalogConnector, CatalogTarget};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::membership::group_membership::GroupMembership;
use crate::membership::loader::load_membership;
use crate::output::export::{export_table_editors, REPORT_EXPORT_NAME};
use crate::output::formatter::{write_group_membership, write_report};

/// Everything one audit run needs, resolved from configuration and flags.
#[derive(Debug, Clone)]
pub struct AuditPlan {
    /// Group membership export.
    pub membership_csv: PathBuf,
    /// Directory for the JSON mappings and the optional CSV report.
    pub output_dir: PathBuf,
    /// Catalogs to audit, in order.
    pub targets: Vec<CatalogTarget>,
    /// Also write [`REPORT_EXPORT_NAME`] after each target.
    pub export_csv: bool,
}

impl AuditPlan {
    /// Plan from the `[audit]` defaults; `target_names` overrides the target list when non-empty.
    pub fn from_config(config: &Config, target_names: &[String]) -> Result<Self> {
        Ok(Self {
            membership_csv: config.audit.membership_csv.clone(),
            output_dir: config.audit.output_dir.clone(),
            targets: config.resolve_targets(target_names)?,
            export_csv: false,
        })
    }
}

/// What one target produced.
#[derive(Debug, Clone)]
pub struct TargetOutcome {
    /// Logical target name.
    pub target: String,
    /// Aggregated grants.
    pub role_tables: RoleTables,
    /// Editors per table.
    pub editors: TableEditors,
    /// Roles no membership group bridges to.
    pub unbridged_roles: Vec<String>,
}

/// Result of a complete run.
#[derive(Debug, Clone)]
pub struct AuditSummary {
    /// The loaded membership export.
    pub membership: GroupMembership,
    /// One outcome per target, in plan order.
    pub targets: Vec<TargetOutcome>,
}

/// Run the audit described by `plan`, printing the editor report to `console`.
///
/// The membership mapping is written before any catalog is contacted; each
/// target then rewrites both JSON files, so the last target's grants remain.
#[tracing::instrument(skip_all)]
pub async fn run_audit(
    plan: &AuditPlan,
    connector: &dyn CatalogConnector,
    console: &mut dyn Write,
) -> Result<AuditSummary> {
    let membership = load_membership(&plan.membership_csv)?;
    write_group_membership(&plan.output_dir, &membership)?;

    let total = plan.targets.len();
    let mut outcomes = Vec::with_capacity(total);
    for (count, target) in plan.targets.iter().enumerate() {
        info!("{}/{total}) Database: {}", count + 1, target.name);
        outcomes.push(audit_target(plan, target, &membership, connector, console).await?);
    }

    writeln!(console).map_err(|source| Error::Write {
        path: PathBuf::from("<stdout>"),
        source,
    })?;

    Ok(AuditSummary {
        membership,
        targets: outcomes,
    })
}

async fn audit_target(
    plan: &AuditPlan,
    target: &CatalogTarget,
    membership: &GroupMembership,
    connector: &dyn CatalogConnector,
    console: &mut dyn Write,
) -> Result<TargetOutcome> {
    let mut catalog = connector.connect(target).await?;
    let rows = catalog.role_permissions().await?;
    info!("{} returned {} grants", target.name, rows.len());

    let role_tables = aggregate(rows);
    let unbridged: Vec<String> = unbridged_roles(&role_tables, membership)
        .into_iter()
        .map(str::to_string)
        .collect();
    let editors = resolve_editors(&role_tables, membership);
    if editors.is_empty() {
        warn!("{} granted no auditable tables", target.name);
    }

    write_report(membership, &role_tables, &editors, &plan.output_dir, console)?;

    if plan.export_csv {
        let index = AccessIndex::build(membership, &role_tables);
        let tables: Vec<&str> = editors.tables().collect();
        export_table_editors(&index, &tables, &plan.output_dir.join(REPORT_EXPORT_NAME))?;
    }

    Ok(TargetOutcome {
        target: target.name.clone(),
        role_tables,
        editors,
        unbridged_roles: unbridged,
    })
}
