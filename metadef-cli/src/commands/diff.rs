//! `metadef diff <path>`: show how local declarations differ from the shop.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use metadef_core::store;
use metadef_sync::{DiffReport, DiffStatus, SyncOptions};

use crate::ShopArgs;

/// Arguments for `metadef diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Declaration file or directory.
    pub path: PathBuf,
}

impl DiffArgs {
    pub fn run(self, shop: &ShopArgs) -> Result<()> {
        let local = store::load_definitions(&self.path)
            .with_context(|| format!("failed to load {}", self.path.display()))?;
        let (session, client) = shop.connect()?;
        let report = metadef_sync::diff(&client, &local, &SyncOptions::from(&session))
            .with_context(|| format!("diff failed for shop '{}'", session.shop))?;
        print_report(&report);
        Ok(())
    }
}

fn print_report(report: &DiffReport) {
    let separator = "■".repeat(67).bright_black().to_string();

    for diff in &report.diffs {
        let marker = match diff.status {
            DiffStatus::New => format!(" {}", "(new)".yellow()),
            DiffStatus::Modified => String::new(),
        };
        println!(
            "{}: {} {}{marker}",
            diff.type_key.as_str().bold(),
            format!("+{}", diff.delta.insertions).green(),
            format!("-{}", diff.delta.deletions).red(),
        );
        println!("{separator}");
        for line in diff.delta.unified.lines() {
            println!("{}", colorize(line));
        }
        println!("{separator}");
    }

    if report.is_clean() {
        println!("No differences.");
    } else {
        println!(
            "{} changed, {} unchanged",
            report.diffs.len(),
            report.unchanged.len()
        );
    }

    if !report.unmanaged.is_empty() {
        let names: Vec<&str> = report.unmanaged.iter().map(|k| k.as_str()).collect();
        println!(
            "{} {}",
            "Not declared locally (left untouched):".bright_black(),
            names.join(", ")
        );
    }
}

fn colorize(line: &str) -> String {
    if line.starts_with("+++") || line.starts_with("---") {
        line.bold().to_string()
    } else if line.starts_with('+') {
        line.green().to_string()
    } else if line.starts_with('-') {
        line.red().to_string()
    } else if line.starts_with("@@") {
        line.cyan().to_string()
    } else {
        line.to_string()
    }
}
