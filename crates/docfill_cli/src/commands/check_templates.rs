//! Check-templates command - Verify every template builds and renders.

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use super::GlobalArgs;

#[derive(Args)]
pub struct CheckTemplatesArgs {
    /// Print the results as JSON
    #[arg(long)]
    json: bool,
}

pub async fn execute(global: &GlobalArgs, args: CheckTemplatesArgs) -> Result<()> {
    info!("Checking templates in {:?}", global.templates_dir);

    let checks = global
        .service()
        .check_templates()
        .context("Failed to check templates")?;
    let failed = checks.iter().filter(|c| !c.passed()).count();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&checks)?);
    } else if checks.is_empty() {
        println!("⚠️  No templates found to check");
        return Ok(());
    } else {
        println!("🧪 Checking {} template(s)...\n", checks.len());
        for check in &checks {
            match (&check.fields, &check.error) {
                (_, Some(error)) => {
                    println!("{}... ❌", check.template);
                    println!("   - {}", error);
                }
                (Some(fields), None) => println!("{}... ✅ ({} field(s))", check.template, fields),
                (None, None) => println!("{}... ✅", check.template),
            }
        }
        println!();
        println!("Results: {} passed, {} failed", checks.len() - failed, failed);
    }

    if failed > 0 {
        anyhow::bail!("{} template(s) failed the check", failed);
    }

    Ok(())
}
