//! `hive export` and `hive import`: client CSV interchange.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use hive_core::csv::{export_clients, export_file_name, import_clients};
use hive_core::{HiveStore, dates};

/// Write every client as CSV to stdout, or to `output`. When `output` is a
/// directory the file is named after today's date.
pub async fn run_export(store: &dyn HiveStore, output: Option<&str>) -> Result<()> {
    let clients = store.list_clients().await?;
    let csv = export_clients(&clients);

    match output {
        Some(path) => {
            let path = export_path(Path::new(path));
            std::fs::write(&path, format!("{csv}\n"))
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Exported {} client(s) to {}", clients.len(), path.display());
        }
        None => println!("{csv}"),
    }

    Ok(())
}

fn export_path(output: &Path) -> PathBuf {
    if output.is_dir() {
        output.join(export_file_name(dates::today()))
    } else {
        output.to_path_buf()
    }
}

pub async fn run_import(store: &dyn HiveStore, file: &str) -> Result<()> {
    let text =
        std::fs::read_to_string(file).with_context(|| format!("failed to read CSV file: {file}"))?;
    let report = import_clients(store, &text)
        .await
        .with_context(|| format!("failed to import {file}"))?;
    println!("Imported {} client(s) from {file}", report.imported());
    Ok(())
}
