//! `metadef pull`: write the shop's definitions as declarations.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use metadef_core::store;
use metadef_sync::SyncOptions;

use crate::ShopArgs;

/// Arguments for `metadef pull`.
#[derive(Args, Debug)]
pub struct PullArgs {
    /// Write every definition to this file instead of stdout.
    #[arg(long, conflicts_with = "split")]
    pub out: Option<PathBuf>,

    /// Write one `<type>.yaml` per definition into this directory.
    #[arg(long)]
    pub split: Option<PathBuf>,
}

impl PullArgs {
    pub fn run(self, shop: &ShopArgs) -> Result<()> {
        let (session, client) = shop.connect()?;
        let result = metadef_sync::pull(&client, &SyncOptions::from(&session))
            .with_context(|| format!("pull failed for shop '{}'", session.shop))?;

        if !result.unresolved.is_empty() {
            eprintln!(
                "warning: {} reference(s) point at unknown definitions; fix them before pushing",
                result.unresolved.len()
            );
        }

        if let Some(dir) = self.split {
            let written = store::save_split(&dir, &result.definitions)
                .with_context(|| format!("failed to write {}", dir.display()))?;
            println!("✓ wrote {} definition file(s) to {}", written.len(), dir.display());
        } else if let Some(path) = self.out {
            store::save_definitions(&path, &result.definitions)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!(
                "✓ wrote {} definition(s) to {}",
                result.definitions.len(),
                path.display()
            );
        } else {
            print!(
                "{}",
                store::to_yaml(&result.definitions).context("failed to render definitions")?
            );
        }
        Ok(())
    }
}
