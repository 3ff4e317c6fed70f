use anyhow::Context;
use serde::Serialize;

use crate::inventory::{BatchEncoding, ImportReport, decode_batch, import_batch};

use super::commands::ImportArgs;
use super::init_store;

#[derive(Serialize)]
struct ImportOutput {
    file: String,
    encoding: BatchEncoding,
    #[serde(flatten)]
    report: ImportReport,
}

/// Offline bulk import, using the same importer as `POST /stock/import`.
pub fn run_import(args: ImportArgs) -> anyhow::Result<()> {
    let store = init_store(&args.data_dir)?;

    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let (rows, encoding) = decode_batch(&bytes)?;
    let report = import_batch(&store, rows, &args.as_user)?;

    if args.json {
        let output = ImportOutput {
            file: args.file.display().to_string(),
            encoding,
            report,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!();
    println!("Imported {} ({encoding})", args.file.display());
    println!("  Inserted or replaced: {}", report.inserted_or_replaced);
    println!("  Skipped:              {}", report.skipped);
    println!("  Rejected:             {}", report.rejected);
    if report.superseded > 0 {
        println!(
            "  Superseded in file:   {} (a cheaper row had the same JAN)",
            report.superseded
        );
    }
    for rejection in &report.rejections {
        println!("    line {}: {}", rejection.line, rejection.reason);
    }
    println!();

    Ok(())
}
