//! CLI command definitions.
//!
//! Every subcommand works against the same templates directory and PDF
//! converter settings, gathered in [`GlobalArgs`].

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use docfill_convert::{ConverterConfig, FormatConverter};
use docfill_core::DocumentService;
use docfill_templates::FsTemplateStore;
use tracing::{debug, warn};

pub mod check_templates;
pub mod fields;
pub mod generate;
pub mod list;
pub mod serve;

/// Directory searched for templates when none is configured.
pub const DEFAULT_TEMPLATES_DIR: &str = "docx_templates";

/// docfill - fill office document templates from form data
#[derive(Parser)]
#[command(name = "docfill")]
#[command(version, about = "docfill - fill office document templates from form data")]
#[command(long_about = r#"
docfill renders DOCX and ODT templates with {{ placeholders }} into finished
documents, optionally converted to PDF through docx2pdf or LibreOffice.

COMMANDS:
  serve            → Run the HTTP form server
  list             → List available templates
  fields           → Show the form fields of a template
  generate         → Render a template to a file
  check-templates  → Verify every template builds and renders

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments or unknown template
  3 - Invalid field values
  4 - Template error
  5 - Conversion error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Directory holding templates and their metadata files
    #[arg(long, global = true, env = "DOCFILL_TEMPLATES_DIR", default_value = DEFAULT_TEMPLATES_DIR)]
    pub templates_dir: PathBuf,

    /// Path to the soffice binary (searched on PATH when unset)
    #[arg(long, global = true, env = "SOFFICE_PATH")]
    pub soffice: Option<PathBuf>,

    /// Skip the docx2pdf backend
    #[arg(long, global = true)]
    pub no_docx2pdf: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

impl GlobalArgs {
    pub fn converter_config(&self) -> ConverterConfig {
        let mut config = ConverterConfig::default();
        if let Some(path) = &self.soffice {
            config = config.soffice(path);
        }
        if self.no_docx2pdf {
            config = config.without_docx2pdf();
        }
        config
    }

    /// Service over the configured templates directory.
    pub fn service(&self) -> DocumentService {
        if !self.templates_dir.is_dir() {
            warn!("Templates directory {:?} does not exist", self.templates_dir);
        }

        let converter = FormatConverter::from_config(&self.converter_config());
        debug!(
            "Using templates from {:?} with converters [{}]",
            self.templates_dir,
            converter.backend_names().join(", ")
        );
        DocumentService::new(
            Arc::new(FsTemplateStore::new(&self.templates_dir)),
            converter,
        )
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP form server
    Serve(serve::ServeArgs),

    /// List available templates
    List(list::ListArgs),

    /// Show the form fields of a template
    Fields(fields::FieldsArgs),

    /// Render a template to a file
    Generate(generate::GenerateArgs),

    /// Verify every template builds its schema and renders
    #[command(name = "check-templates")]
    CheckTemplates(check_templates::CheckTemplatesArgs),
}
