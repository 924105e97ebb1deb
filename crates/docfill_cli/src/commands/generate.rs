//! Generate command - Render a template to a file.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use docfill_core::GenerateRequest;
use docfill_templates::coerce_all;
use tracing::info;

use super::GlobalArgs;

#[derive(Args)]
pub struct GenerateArgs {
    /// Template file name, e.g. invoice.docx
    template: String,

    /// Field value as NAME=VALUE (repeatable)
    #[arg(short = 's', long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    values: Vec<(String, String)>,

    /// Output format: the template's own extension or "pdf"
    #[arg(short, long)]
    format: Option<String>,

    /// Output file, or directory to place the generated file in
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Parse a `NAME=VALUE` assignment. The value may itself contain `=`.
fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing field name in '{}'", raw));
    }
    Ok((name.to_string(), value.to_string()))
}

/// Where to write an artifact called `file_name`.
fn output_path(output: Option<&Path>, file_name: &str) -> PathBuf {
    match output {
        Some(path) if path.is_dir() => path.join(file_name),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(file_name),
    }
}

pub async fn execute(global: &GlobalArgs, args: GenerateArgs) -> Result<()> {
    let service = global.service();
    let values: HashMap<String, String> = args.values.into_iter().collect();

    // Report every bad value before doing any rendering
    let fields = service
        .load_field_schema(&args.template)
        .await
        .with_context(|| format!("Failed to read fields of {}", args.template))?;
    if let Err(errors) = coerce_all(&fields, &values) {
        for error in &errors {
            eprintln!("   - {}", error);
        }
        anyhow::bail!("{} invalid field value(s)", errors.len());
    }

    let mut request = GenerateRequest::new(&args.template);
    request.format = args.format;
    request.values = values;

    let artifact = service
        .generate(&request)
        .await
        .with_context(|| format!("Failed to generate {}", args.template))?;

    let path = output_path(args.output.as_deref(), &artifact.file_name);
    fs::write(&path, &artifact.bytes)
        .with_context(|| format!("Failed to write {:?}", path))?;
    info!("Wrote {} bytes to {:?}", artifact.bytes.len(), path);

    if !global.quiet {
        println!("✅ {}", path.display());
    }

    Ok(())
}
