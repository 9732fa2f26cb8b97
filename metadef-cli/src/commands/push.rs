//! `metadef push <path>`: create and update definitions from declarations.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use metadef_core::store;
use metadef_sync::{FieldAction, Outcome, Plan, PlannedAction, PushReport, SyncError, SyncOptions};

use crate::ShopArgs;

/// Arguments for `metadef push`.
#[derive(Args, Debug)]
pub struct PushArgs {
    /// Declaration file or directory.
    pub path: PathBuf,

    /// Print the planned operations without changing the shop.
    #[arg(long)]
    pub dry_run: bool,
}

impl PushArgs {
    pub fn run(self, shop: &ShopArgs) -> Result<()> {
        let local = store::load_definitions(&self.path)
            .with_context(|| format!("failed to load {}", self.path.display()))?;
        let (session, client) = shop.connect()?;
        let options = SyncOptions::from(&session);

        if self.dry_run {
            let plan = metadef_sync::dry_run(&client, &local, &options)
                .with_context(|| format!("planning failed for shop '{}'", session.shop))?;
            print_plan(&plan);
            return Ok(());
        }

        match metadef_sync::push(&client, &local, &options) {
            Ok(report) => {
                print_summary(&report);
                Ok(())
            }
            Err(err) => {
                if let SyncError::Aborted { report, .. } = &err {
                    print_summary(report);
                }
                Err(err).with_context(|| format!("push failed for shop '{}'", session.shop))
            }
        }
    }
}

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "definition")]
    definition: String,
    #[tabled(rename = "outcome")]
    outcome: String,
}

fn print_summary(report: &PushReport) {
    if report.outcomes.is_empty() {
        println!("Nothing to push.");
        return;
    }
    let rows: Vec<OutcomeRow> = report
        .outcomes
        .iter()
        .map(|o| OutcomeRow {
            definition: o.type_key.to_string(),
            outcome: outcome_label(o.outcome),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    println!(
        "{} created, {} updated, {} unchanged, {} failed",
        report.count(Outcome::Created),
        report.count(Outcome::Updated),
        report.count(Outcome::Unchanged),
        report.count(Outcome::Failed),
    );
}

fn outcome_label(outcome: Outcome) -> String {
    let label = outcome.to_string();
    match outcome {
        Outcome::Created => label.green().to_string(),
        Outcome::Updated => label.yellow().to_string(),
        Outcome::Unchanged => label.bright_black().to_string(),
        Outcome::Failed => label.red().bold().to_string(),
    }
}

fn print_plan(plan: &Plan) {
    let prefix = "[dry-run] ";
    if plan.is_empty() {
        println!("{prefix}✓ nothing to do ({} unchanged)", plan.unchanged.len());
        return;
    }
    for change in &plan.changes {
        match &change.action {
            PlannedAction::Create {
                fields,
                display_name_key,
            } => {
                let title = display_name_key
                    .as_deref()
                    .map(|k| format!(", titled by {k}"))
                    .unwrap_or_default();
                println!(
                    "{prefix}{} {} ({} field(s){title})",
                    "create".green(),
                    change.type_key,
                    fields.len()
                );
            }
            PlannedAction::Update { fields } => {
                println!("{prefix}{} {}", "update".yellow(), change.type_key);
                for action in fields {
                    let symbol = match action {
                        FieldAction::Create(_) => "+".green(),
                        FieldAction::Update(_) => "~".yellow(),
                        FieldAction::Delete(_) => "-".red(),
                    };
                    println!("  {symbol}  {}", action.key());
                }
            }
        }
    }
    println!(
        "{prefix}{} change(s), {} unchanged",
        plan.changes.len(),
        plan.unchanged.len()
    );
}
