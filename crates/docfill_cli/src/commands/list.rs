//! List command - List available templates.

use anyhow::{Context, Result};
use clap::Args;

use super::GlobalArgs;

#[derive(Args)]
pub struct ListArgs {
    /// Print the list as JSON
    #[arg(long)]
    json: bool,
}

pub async fn execute(global: &GlobalArgs, args: ListArgs) -> Result<()> {
    let templates = global
        .service()
        .list_templates()
        .context("Failed to list templates")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&templates)?);
        return Ok(());
    }

    if templates.is_empty() {
        if !global.quiet {
            println!("⚠️  No templates found in {:?}", global.templates_dir);
        }
        return Ok(());
    }

    for name in &templates {
        println!("{}", name);
    }

    Ok(())
}
