//! Fields command - Show the form fields of a template.

use anyhow::{Context, Result};
use clap::Args;

use super::GlobalArgs;

#[derive(Args)]
pub struct FieldsArgs {
    /// Template file name, e.g. invoice.docx
    template: String,

    /// Print the schema as JSON
    #[arg(long)]
    json: bool,
}

pub async fn execute(global: &GlobalArgs, args: FieldsArgs) -> Result<()> {
    let fields = global
        .service()
        .field_schema(&args.template)
        .with_context(|| format!("Failed to read fields of {}", args.template))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&fields)?);
        return Ok(());
    }

    if fields.is_empty() {
        println!("{} has no fields", args.template);
        return Ok(());
    }

    println!("📋 {} ({} field(s))\n", args.template, fields.len());
    for field in &fields {
        let label = if field.label != field.name {
            format!(" \"{}\"", field.label)
        } else {
            String::new()
        };
        let choices = if field.choices.is_empty() {
            String::new()
        } else {
            format!(" [{}]", field.choices.join(" | "))
        };
        println!("  {:<20} {:<7}{}{}", field.name, field.field_type.as_str(), label, choices);
    }

    Ok(())
}
