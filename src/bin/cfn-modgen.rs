//! cfn-modgen CLI
//!
//! Command-line interface for turning resource schemas into module
//! specifications.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use cfn_modgen::{
    generate_batch, lint, load_resource_schema, load_schema, normalize_schema, validate_document,
    DescriptionRewriter, FileStatus, GenerateOptions, ModuleConfigTable, ModuleSpec,
    NormalizeOptions, ResourceSchema, Severity, ValidateError,
};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cfn-modgen")]
#[command(about = "Generate module specifications from resource provider schemas")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate module specifications
    Generate {
        /// Resource schema files
        #[arg(required = true)]
        schemas: Vec<PathBuf>,

        /// Module configuration table (YAML); unlisted modules are skipped
        #[arg(long)]
        config: Option<PathBuf>,

        /// Version the modules were added in
        #[arg(long, default_value = cfn_modgen::DEFAULT_VERSION_ADDED)]
        version_added: String,

        /// Module author
        #[arg(long, default_value = cfn_modgen::DEFAULT_AUTHOR)]
        author: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Write one `<module>.<format>` file per schema (stdout if not specified)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Fail if any normalization defect was recorded
        #[arg(long)]
        strict: bool,
    },

    /// Print the normalized option tree of a schema
    Normalize {
        /// Resource schema file
        schema: PathBuf,

        /// Skip description rewriting
        #[arg(long)]
        raw: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Rewrite description text, one sentence per line
    Rewrite {
        /// Text to rewrite
        text: String,

        /// Declared enumeration value (repeatable)
        #[arg(long = "vocab")]
        vocabulary: Vec<String>,
    },

    /// Validate a schema against the provider-definition meta-schema
    Validate {
        /// Resource schema file
        schema: PathBuf,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },

    /// Lint schema files for errors (syntax, meta-schema, broken refs, defects)
    Lint {
        /// File or directory to lint
        path: PathBuf,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Suppress progress output, only show errors
        #[arg(long, short)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate {
            schemas,
            config,
            version_added,
            author,
            format,
            output_dir,
            pretty,
            strict,
        } => run_generate(GenerateArgs {
            schemas,
            config,
            options: GenerateOptions::new()
                .author(author)
                .version_added(version_added),
            format,
            output_dir,
            pretty,
            strict,
        }),
        Commands::Normalize { schema, raw, pretty } => run_normalize(&schema, raw, pretty),
        Commands::Rewrite { text, vocabulary } => {
            run_rewrite(&text, vocabulary);
            Ok(())
        }
        Commands::Validate { schema, json } => run_validate(&schema, json),
        Commands::Lint {
            path,
            format,
            strict,
            quiet,
        } => run_lint(&path, &format, strict, quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, u8> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })
}

fn load(path: &Path) -> Result<ResourceSchema, u8> {
    load_resource_schema(path).map_err(|e| {
        eprintln!("Error: {}: {}", path.display(), e);
        e.exit_code() as u8
    })
}

struct GenerateArgs {
    schemas: Vec<PathBuf>,
    config: Option<PathBuf>,
    options: GenerateOptions,
    format: OutputFormat,
    output_dir: Option<PathBuf>,
    pretty: bool,
    strict: bool,
}

fn run_generate(args: GenerateArgs) -> Result<(), u8> {
    let GenerateArgs {
        schemas: paths,
        config,
        options,
        format,
        output_dir,
        pretty,
        strict,
    } = args;

    let table = match &config {
        Some(path) => Some(ModuleConfigTable::load(path).map_err(|e| {
            eprintln!("Error: {}: {}", path.display(), e);
            e.exit_code() as u8
        })?),
        None => None,
    };

    let schemas = paths
        .iter()
        .map(|path| load(path))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(dir) = &output_dir {
        std::fs::create_dir_all(dir).map_err(|e| {
            eprintln!("Error creating {}: {}", dir.display(), e);
            3u8
        })?;
    }

    let mut failure: Option<u8> = None;
    for result in generate_batch(&schemas, &options, table.as_ref()) {
        let spec = match result {
            Ok(spec) => spec,
            Err(e) => {
                eprintln!("Error: {}", e);
                failure = failure.max(Some(e.exit_code() as u8));
                continue;
            }
        };

        if strict && !spec.defects.is_empty() {
            warn!(
                module = %spec.module_name(),
                defects = spec.defects.len(),
                "defects recorded in strict mode"
            );
            failure = failure.max(Some(1));
        }

        let rendered = render(&spec, format, pretty)?;
        match &output_dir {
            Some(dir) => {
                let path = dir.join(format!("{}.{}", spec.module_name(), format.extension()));
                std::fs::write(&path, &rendered).map_err(|e| {
                    eprintln!("Error writing to {}: {}", path.display(), e);
                    3u8
                })?;
                info!(path = %path.display(), "wrote module specification");
            }
            None => println!("{}", rendered),
        }
    }

    match failure {
        Some(code) => Err(code),
        None => Ok(()),
    }
}

fn render(spec: &ModuleSpec, format: OutputFormat, pretty: bool) -> Result<String, u8> {
    match format {
        OutputFormat::Json => to_json(spec, pretty),
        OutputFormat::Yaml => serde_yaml::to_string(spec).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        }),
    }
}

fn run_normalize(path: &Path, raw: bool, pretty: bool) -> Result<(), u8> {
    let schema = load(path)?;
    let normalized = normalize_schema(&schema, &NormalizeOptions::default()).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let options = if raw {
        normalized.options
    } else {
        DescriptionRewriter::for_schema(&schema).rewrite_tree(normalized.options)
    };

    println!("{}", to_json(&options, pretty)?);
    Ok(())
}

fn run_rewrite(text: &str, vocabulary: Vec<String>) {
    let rewriter = DescriptionRewriter::new().with_vocabulary(vocabulary);
    for sentence in rewriter.rewrite(text) {
        println!("{}", sentence);
    }
}

fn run_validate(path: &Path, json_output: bool) -> Result<(), u8> {
    let document = load_schema(path).map_err(|e| {
        report_error(json_output, &format!("loading schema: {}", e));
        e.exit_code() as u8
    })?;

    match validate_document(&document) {
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

fn run_lint(path: &Path, format: &str, strict: bool, quiet: bool) -> Result<(), u8> {
    if !path.exists() {
        eprintln!("Error: path not found: {}", path.display());
        return Err(3);
    }

    let result = lint(path, strict);
    let passed = result.is_ok() && (!strict || result.warnings == 0);

    if format == "json" {
        println!("{}", to_json(&result, true)?);
    } else {
        if !quiet {
            println!("Linting {} ...\n", path.display());
        }

        for file_result in &result.results {
            let status_icon = match file_result.status {
                FileStatus::Ok => "\x1b[32m✓\x1b[0m",
                FileStatus::Warning => "\x1b[33m⚠\x1b[0m",
                FileStatus::Error => "\x1b[31m✗\x1b[0m",
            };

            if !quiet || file_result.status != FileStatus::Ok {
                println!("  {} {}", status_icon, file_result.file.display());
            }

            for diag in &file_result.diagnostics {
                let (color, label) = match diag.severity {
                    Severity::Error => ("\x1b[31m", "error"),
                    Severity::Warning => ("\x1b[33m", "warning"),
                };
                if !quiet || diag.severity == Severity::Error {
                    println!(
                        "    {}{}[{}]\x1b[0m: {} - {}",
                        color, label, diag.code, diag.path, diag.message
                    );
                }
            }
        }

        println!();
        if passed {
            println!(
                "\x1b[32m✓ {} files checked, all passed\x1b[0m",
                result.files_checked
            );
        } else {
            println!(
                "\x1b[31m✗ {} files checked: {} passed, {} failed ({} errors, {} warnings)\x1b[0m",
                result.files_checked, result.passed, result.failed, result.errors, result.warnings
            );
        }
    }

    if passed {
        Ok(())
    } else {
        Err(1)
    }
}
