use std::io::Write;
use std::path::Path;

use anyhow::Result;
use migrator::{Outcome, RunReport};
use sqlmill_core::{ScriptRunErrorRecord, ScriptRunRecord};

use crate::OutputFormat;

fn report_text(report: &RunReport) -> String {
    let mut lines = Vec::new();
    for s in &report.scripts {
        let mark = match s.outcome {
            Outcome::Applied => "applied",
            Outcome::Skipped => "skipped",
            Outcome::Failed => "FAILED ",
        };
        lines.push(format!("  {mark} {}/{}", s.folder, s.script));
    }
    let version = report.version_id.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
    lines.push(format!(
        "{} {} {} -> {} (version id {version}): {} applied, {} skipped, {} failed",
        report.run_id,
        report.repository.path,
        report.repository.version,
        report.stage,
        report.count(Outcome::Applied),
        report.count(Outcome::Skipped),
        report.count(Outcome::Failed),
    ));
    lines.join("\n")
}

pub fn print_report(report: &RunReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => println!("{}", report_text(report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Jsonl => {
            for s in &report.scripts {
                let obj = serde_json::json!({ "run_id": report.run_id, "version_id": report.version_id, "script": s });
                println!("{}", serde_json::to_string(&obj)?);
            }
            let summary = serde_json::json!({
                "run_id": report.run_id,
                "stage": report.stage,
                "failed_during": report.failed_during,
                "error": report.error,
                "started_at": report.started_at,
                "finished_at": report.finished_at,
            });
            println!("{}", serde_json::to_string(&summary)?);
        }
    }
    Ok(())
}

fn csv_writer(out: Option<&Path>) -> Result<csv::Writer<Box<dyn Write>>> {
    let sink: Box<dyn Write> = match out {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(std::io::stdout()),
    };
    Ok(csv::Writer::from_writer(sink))
}

pub fn print_runs(rows: &[ScriptRunRecord], format: OutputFormat, csv: bool, out: Option<&Path>) -> Result<()> {
    if csv {
        let mut wtr = csv_writer(out)?;
        wtr.write_record(["version_id", "script_name", "content_hash", "run_once", "entered_by", "entry_date"])?;
        for r in rows {
            wtr.write_record([
                &r.version_id.to_string(),
                &r.script_name,
                &r.content_hash,
                &r.run_once.to_string(),
                &r.entered_by,
                &r.entry_date,
            ])?;
        }
        wtr.flush()?;
        return Ok(());
    }
    match format {
        OutputFormat::Text => {
            for r in rows {
                let once = if r.run_once { "once" } else { "always" };
                println!("{} v{} {:<6} {} ({})", r.entry_date, r.version_id, once, r.script_name, r.entered_by);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(rows)?),
        OutputFormat::Jsonl => {
            for r in rows {
                println!("{}", serde_json::to_string(r)?);
            }
        }
    }
    Ok(())
}

pub fn print_errors(rows: &[ScriptRunErrorRecord], format: OutputFormat, csv: bool, out: Option<&Path>) -> Result<()> {
    if csv {
        let mut wtr = csv_writer(out)?;
        wtr.write_record(["version_id", "script_name", "failing_statement", "error_message", "entered_by", "entry_date"])?;
        for r in rows {
            wtr.write_record([
                &r.version_id.to_string(),
                &r.script_name,
                &r.failing_statement,
                &r.error_message,
                &r.entered_by,
                &r.entry_date,
            ])?;
        }
        wtr.flush()?;
        return Ok(());
    }
    match format {
        OutputFormat::Text => {
            for r in rows {
                println!("{} v{} {}: {}", r.entry_date, r.version_id, r.script_name, r.error_message);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(rows)?),
        OutputFormat::Jsonl => {
            for r in rows {
                println!("{}", serde_json::to_string(r)?);
            }
        }
    }
    Ok(())
}

pub fn print_batches(batches: &[String], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for (i, b) in batches.iter().enumerate() {
                println!("-- batch {}\n{}", i + 1, b);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(batches)?),
        OutputFormat::Jsonl => {
            for b in batches {
                println!("{}", serde_json::to_string(b)?);
            }
        }
    }
    Ok(())
}
