#![allow(dead_code)]

use std::path::{Path, PathBuf};

use sde_editors::audit::AuditPlan;
use sde_editors::catalog::source::CatalogTarget;

pub(crate) fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/audit")
        .join(name)
}

pub(crate) fn write_csv(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("members.csv");
    std::fs::write(&path, contents).expect("should write membership csv");
    path
}

pub(crate) fn fixture_plan(output_dir: &Path) -> AuditPlan {
    AuditPlan {
        membership_csv: fixture_path("members.csv"),
        output_dir: output_dir.to_path_buf(),
        targets: vec![CatalogTarget::new("prod_rw", "server=unused")],
        export_csv: false,
    }
}

pub(crate) fn read(path: &Path) -> String {
    std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()))
}
