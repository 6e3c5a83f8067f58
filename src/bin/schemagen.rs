//! schemagen CLI
//!
//! Command-line interface for generating JSON Schemas from type catalogs and
//! checking payloads against them.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use schemagen::{
    load_catalog, load_json, validate_against_schema, GeneratorOption, GeneratorSettings,
    OptionPreset, SchemaGenerator, SchemaVersion, ValidateError,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schemagen")]
#[command(about = "Generate JSON Schemas from type catalogs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the schema document for a single type
    Generate {
        /// Type catalog (JSON)
        catalog: PathBuf,

        /// Type expression, e.g. Order or List<Item>
        #[arg(long = "type", short = 't')]
        type_expr: String,

        #[command(flatten)]
        generator: GeneratorArgs,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Generate shared definitions for several types
    Definitions {
        /// Type catalog (JSON)
        catalog: PathBuf,

        /// Type expressions, in output order
        #[arg(long = "type", short = 't', required = true)]
        types: Vec<String>,

        /// Location of the definitions in the target document (e.g. components/schemas)
        #[arg(long)]
        definition_path: Option<String>,

        #[command(flatten)]
        generator: GeneratorArgs,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Validate a payload against the schema generated for a type
    Check {
        /// Type catalog (JSON)
        catalog: PathBuf,

        /// Type expression of the payload
        #[arg(long = "type", short = 't')]
        type_expr: String,

        /// Payload file to validate
        payload: PathBuf,

        #[command(flatten)]
        generator: GeneratorArgs,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },
}

/// Options shared by every subcommand; they override the settings file.
#[derive(Args)]
struct GeneratorArgs {
    /// Target draft: draft-06, draft-07, draft-2019-09 or draft-2020-12
    #[arg(long)]
    schema_version: Option<SchemaVersion>,

    /// Option preset: plain-json (default), full-documentation or java-object
    #[arg(long)]
    preset: Option<OptionPreset>,

    /// Enable an option (repeatable), e.g. --with nullable-fields-by-default
    #[arg(long = "with", value_name = "OPTION")]
    with: Vec<GeneratorOption>,

    /// Disable an option (repeatable)
    #[arg(long = "without", value_name = "OPTION")]
    without: Vec<GeneratorOption>,

    /// Read titles, descriptions and constraints from catalog annotations
    #[arg(long)]
    annotations: bool,

    /// Settings file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate {
            catalog,
            type_expr,
            generator,
            output,
            pretty,
        } => run_generate(&catalog, &type_expr, generator, output, pretty),

        Commands::Definitions {
            catalog,
            types,
            definition_path,
            generator,
            output,
            pretty,
        } => run_definitions(&catalog, &types, definition_path, generator, output, pretty),

        Commands::Check {
            catalog,
            type_expr,
            payload,
            generator,
            json,
        } => run_check(&catalog, &type_expr, &payload, generator, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

/// Settings file (if any) with the command-line flags applied on top.
fn load_settings(args: GeneratorArgs, definition_path: Option<String>) -> Result<GeneratorSettings, String> {
    let mut settings = match &args.config {
        Some(path) => GeneratorSettings::load(path).map_err(|e| format!("loading settings: {}", e))?,
        None => GeneratorSettings::default(),
    };
    settings.merge(GeneratorSettings {
        schema_version: args.schema_version,
        preset: args.preset,
        with: args.with,
        without: args.without,
        annotations: args.annotations,
        definition_path,
    });
    Ok(settings)
}

fn load_generator(catalog_path: &Path, settings: &GeneratorSettings) -> Result<SchemaGenerator, (String, u8)> {
    let catalog = load_catalog(catalog_path)
        .map_err(|e| (format!("loading catalog: {}", e), e.exit_code() as u8))?;
    Ok(SchemaGenerator::new(settings.config_builder().build(), catalog))
}

fn run_generate(
    catalog_path: &Path,
    type_expr: &str,
    args: GeneratorArgs,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<(), u8> {
    let settings = load_settings(args, None).map_err(|e| {
        eprintln!("Error: {}", e);
        2u8
    })?;
    let generator = load_generator(catalog_path, &settings).map_err(|(e, code)| {
        eprintln!("Error: {}", e);
        code
    })?;

    let schema = generator.generate_schema_for(type_expr).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    write_output(&schema, output, pretty)
}

fn run_definitions(
    catalog_path: &Path,
    type_exprs: &[String],
    definition_path: Option<String>,
    args: GeneratorArgs,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<(), u8> {
    let settings = load_settings(args, definition_path).map_err(|e| {
        eprintln!("Error: {}", e);
        2u8
    })?;
    let generator = load_generator(catalog_path, &settings).map_err(|(e, code)| {
        eprintln!("Error: {}", e);
        code
    })?;

    let report = |e: schemagen::GenerateError| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    };
    let mut builder = generator.builder();
    for type_expr in type_exprs {
        let ty = generator.resolve_type(type_expr).map_err(report)?;
        builder.create_schema_reference(&ty).map_err(report)?;
    }
    let schemas = builder
        .collect_definitions(&settings.definition_path())
        .map_err(report)?;

    write_output(&schemas, output, pretty)
}

fn run_check(
    catalog_path: &Path,
    type_expr: &str,
    payload_path: &Path,
    args: GeneratorArgs,
    json_output: bool,
) -> Result<(), u8> {
    let settings = load_settings(args, None).map_err(|e| {
        report_error(json_output, &e);
        2u8
    })?;
    let generator = load_generator(catalog_path, &settings).map_err(|(e, code)| {
        report_error(json_output, &e);
        code
    })?;

    let payload = load_json(payload_path).map_err(|e| {
        report_error(json_output, &format!("loading payload: {}", e));
        e.exit_code() as u8
    })?;

    let schema = generator.generate_schema_for(type_expr).map_err(|e| {
        report_error(json_output, &e.to_string());
        e.exit_code() as u8
    })?;

    match validate_against_schema(&schema, &payload) {
        Ok(()) => {
            if json_output {
                println!(r#"{{"valid":true}}"#);
            } else {
                println!("Valid");
            }
            Ok(())
        }
        Err(ValidateError::Invalid { errors }) => {
            if json_output {
                let output = serde_json::json!({
                    "valid": false,
                    "errors": errors
                });
                println!("{}", output);
            } else {
                eprintln!("Validation failed:");
                for error in errors {
                    eprintln!("  {}", error);
                }
            }
            Err(1)
        }
        Err(e) => {
            report_error(json_output, &e.to_string());
            Err(e.exit_code() as u8)
        }
    }
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", serde_json::json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}

fn write_output(value: &impl Serialize, output: Option<PathBuf>, pretty: bool) -> Result<(), u8> {
    let json_output = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}
