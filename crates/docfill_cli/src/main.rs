//! docfill CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments or unknown template
//! - 3: Invalid field values
//! - 4: Template error
//! - 5: Conversion error

use std::process::ExitCode;

use clap::Parser;
use docfill_convert::ConvertError;
use docfill_core::CoreError;
use docfill_templates::TemplateError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
    pub const TEMPLATE_ERROR: u8 = 4;
    pub const CONVERSION_ERROR: u8 = 5;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_directives = if cli.global.verbose {
        "docfill=debug,info"
    } else if cli.global.quiet {
        "error"
    } else {
        "docfill=info,warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    // Already initialized is fine
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let global = cli.global;
    let result = match cli.command {
        Commands::Serve(args) => commands::serve::execute(&global, args).await,
        Commands::List(args) => commands::list::execute(&global, args).await,
        Commands::Fields(args) => commands::fields::execute(&global, args).await,
        Commands::Generate(args) => commands::generate::execute(&global, args).await,
        Commands::CheckTemplates(args) => commands::check_templates::execute(&global, args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(core) = cause.downcast_ref::<CoreError>() {
            return match core {
                CoreError::MissingTemplate => ExitCodes::INVALID_ARGS,
                CoreError::Template(t) => template_exit_code(t),
                CoreError::Convert(c) => convert_exit_code(c),
                CoreError::Io(_) | CoreError::Task(_) => ExitCodes::GENERAL_ERROR,
            };
        }
        if let Some(t) = cause.downcast_ref::<TemplateError>() {
            return template_exit_code(t);
        }
        if let Some(c) = cause.downcast_ref::<ConvertError>() {
            return convert_exit_code(c);
        }
    }

    let msg = e.to_string().to_lowercase();
    if msg.contains("invalid field") {
        ExitCodes::VALIDATION_FAILURE
    } else if msg.contains("template") {
        ExitCodes::TEMPLATE_ERROR
    } else if msg.contains("argument") || msg.contains("not found") {
        ExitCodes::INVALID_ARGS
    } else {
        ExitCodes::GENERAL_ERROR
    }
}

fn template_exit_code(e: &TemplateError) -> u8 {
    match e {
        TemplateError::NotFound(_) => ExitCodes::INVALID_ARGS,
        TemplateError::FieldInvalid { .. } => ExitCodes::VALIDATION_FAILURE,
        TemplateError::Io(_) => ExitCodes::GENERAL_ERROR,
        _ => ExitCodes::TEMPLATE_ERROR,
    }
}

fn convert_exit_code(e: &ConvertError) -> u8 {
    match e {
        ConvertError::UnsupportedFormat(_) => ExitCodes::INVALID_ARGS,
        ConvertError::Io(_) => ExitCodes::GENERAL_ERROR,
        _ => ExitCodes::CONVERSION_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_categorize_wrapped_errors() {
        let err = Err::<(), _>(CoreError::from(TemplateError::NotFound("a.docx".into())))
            .context("Failed to generate")
            .unwrap_err();
        assert_eq!(categorize_error(&err), ExitCodes::INVALID_ARGS);

        let err = anyhow::Error::from(CoreError::from(TemplateError::FieldInvalid {
            field: "due".into(),
            expected: "date".into(),
        }));
        assert_eq!(categorize_error(&err), ExitCodes::VALIDATION_FAILURE);

        let err = anyhow::Error::from(CoreError::from(ConvertError::ConverterNotFound(
            "no backends configured".into(),
        )));
        assert_eq!(categorize_error(&err), ExitCodes::CONVERSION_ERROR);

        let err = anyhow::Error::from(TemplateError::RenderIncomplete("name".into()));
        assert_eq!(categorize_error(&err), ExitCodes::TEMPLATE_ERROR);
    }

    #[test]
    fn test_categorize_by_message() {
        assert_eq!(
            categorize_error(&anyhow::anyhow!("2 invalid field value(s)")),
            ExitCodes::VALIDATION_FAILURE
        );
        assert_eq!(
            categorize_error(&anyhow::anyhow!("1 template(s) failed the check")),
            ExitCodes::TEMPLATE_ERROR
        );
        assert_eq!(
            categorize_error(&anyhow::anyhow!("disk full")),
            ExitCodes::GENERAL_ERROR
        );
    }
}
