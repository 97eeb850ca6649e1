//! Resource Projection CLI
//!
//! Command-line interface for planning, projecting, linting and generating
//! types from resource definitions.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use resource_projection::{
    build_plan, lint, load_definition, load_json, load_json_str, output_type, parse_selection,
    project, render_output_type, render_schema_module, ActionRegistry, Engine, EngineConfig,
    FileStatus,
    NameCase, Registry, SchemaDefinition, Severity, StaticFetcher, StaticSchema,
};
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "resource-projection")]
#[command(about = "Plan, project and type client field selections over resource definitions")]
#[command(version)]
struct Cli {
    /// Explicit configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the naming convention for client field names
    #[arg(long, global = true, value_enum)]
    naming: Option<CaseArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum CaseArg {
    Identity,
    Camel,
    Pascal,
    Snake,
    Kebab,
}

impl From<CaseArg> for NameCase {
    fn from(arg: CaseArg) -> Self {
        match arg {
            CaseArg::Identity => NameCase::Identity,
            CaseArg::Camel => NameCase::Camel,
            CaseArg::Pascal => NameCase::Pascal,
            CaseArg::Snake => NameCase::Snake,
            CaseArg::Kebab => NameCase::Kebab,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build the fetch plan for a selection
    Plan {
        /// Definition file or directory
        definitions: PathBuf,

        /// Resource identifier the selection starts from
        resource: String,

        /// Selection: JSON literal or path to a JSON file
        selection: String,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Project raw fetch data through a selection
    Project {
        /// Definition file or directory
        definitions: PathBuf,

        /// Resource identifier the selection starts from
        resource: String,

        /// Selection: JSON literal or path to a JSON file
        selection: String,

        /// Raw data file (record or array of records)
        raw: PathBuf,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Emit Rust source for the static schema mirror or one selection's output type
    Typegen {
        /// Definition file or directory
        definitions: PathBuf,

        /// Resource for an output type (requires --selection)
        #[arg(long, requires = "selection")]
        resource: Option<String>,

        /// Selection for an output type: JSON literal or path to a JSON file
        #[arg(long, requires = "resource")]
        selection: Option<String>,

        /// Name of the generated root type
        #[arg(long, default_value = "Output")]
        name: String,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Lint definition files (every error, not just the first)
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

    /// Handle a request envelope, with a raw-data file standing in for the fetch engine
    Handle {
        /// Definition file or directory
        definitions: PathBuf,

        /// Request envelope file
        envelope: PathBuf,

        /// Raw data returned for the request
        raw: PathBuf,

        /// Actor file passed to the fetch context
        #[arg(long)]
        actor: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref(), cli.naming) {
        Ok(config) => config,
        Err(code) => return ExitCode::from(code),
    };

    let result = match cli.command {
        Commands::Plan {
            definitions,
            resource,
            selection,
            pretty,
        } => run_plan(&config, &definitions, &resource, &selection, pretty),

        Commands::Project {
            definitions,
            resource,
            selection,
            raw,
            pretty,
        } => run_project(&config, &definitions, &resource, &selection, &raw, pretty),

        Commands::Typegen {
            definitions,
            resource,
            selection,
            name,
            output,
        } => run_typegen(
            &config,
            &definitions,
            resource.as_deref().zip(selection.as_deref()),
            &name,
            output,
        ),

        Commands::Lint {
            path,
            format,
            strict,
            quiet,
        } => run_lint(&path, &format, strict, quiet),

        Commands::Handle {
            definitions,
            envelope,
            raw,
            actor,
            pretty,
        } => run_handle(&config, &definitions, &envelope, &raw, actor, pretty),

        Commands::Config => config
            .to_toml()
            .map(|toml| print!("{}", toml))
            .map_err(|e| {
                eprintln!("Error: {}", e);
                2u8
            }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn load_config(path: Option<&Path>, naming: Option<CaseArg>) -> Result<EngineConfig, u8> {
    let mut config = EngineConfig::load_from(path).map_err(|e| {
        eprintln!("Error loading configuration: {}", e);
        2u8
    })?;
    if let Some(case) = naming {
        config.naming.output_case = case.into();
    }
    Ok(config)
}

fn load_definitions(path: &Path) -> Result<(SchemaDefinition, Registry), u8> {
    let definition = load_definition(path).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;
    let registry = Registry::build(&definition).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;
    Ok((definition, registry))
}

/// JSON from a file path, or the argument itself parsed as JSON.
fn json_arg(arg: &str) -> Result<Value, u8> {
    let path = Path::new(arg);
    let loaded = if path.is_file() {
        load_json(path)
    } else {
        load_json_str(arg)
    };
    loaded.map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<(), u8> {
    let output = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;
    println!("{}", output);
    Ok(())
}

fn run_plan(
    config: &EngineConfig,
    definitions: &Path,
    resource: &str,
    selection: &str,
    pretty: bool,
) -> Result<(), u8> {
    let (_, registry) = load_definitions(definitions)?;
    let descriptor = registry.lookup(resource).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let node = parse_selection(
        &json_arg(selection)?,
        descriptor,
        &registry,
        &config.naming(),
        &config.syntax(),
    )
    .map_err(|e| {
        eprintln!("Error: {}", e);
        2u8
    })?;

    let plan = build_plan(&node, descriptor, &registry).map_err(|e| {
        eprintln!("Error: {}", e);
        2u8
    })?;
    print_json(&plan, pretty)
}

fn run_project(
    config: &EngineConfig,
    definitions: &Path,
    resource: &str,
    selection: &str,
    raw: &Path,
    pretty: bool,
) -> Result<(), u8> {
    let (_, registry) = load_definitions(definitions)?;
    let descriptor = registry.lookup(resource).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let naming = config.naming();
    let node = parse_selection(
        &json_arg(selection)?,
        descriptor,
        &registry,
        &naming,
        &config.syntax(),
    )
    .map_err(|e| {
        eprintln!("Error: {}", e);
        2u8
    })?;

    let raw = load_json(raw).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;
    print_json(&project(&raw, &node, &registry, &naming), pretty)
}

fn run_typegen(
    config: &EngineConfig,
    definitions: &Path,
    selection: Option<(&str, &str)>,
    name: &str,
    output: Option<PathBuf>,
) -> Result<(), u8> {
    let (_, registry) = load_definitions(definitions)?;
    let schema = StaticSchema::from_registry(&registry);

    let source = match selection {
        Some((resource, selection)) => {
            let shape = output_type(
                &schema,
                resource,
                &json_arg(selection)?,
                &config.naming(),
                &config.syntax(),
            )
            .map_err(|e| {
                eprintln!("Error: {}", e);
                2u8
            })?;
            render_output_type(&shape, name)
        }
        None => render_schema_module(&schema),
    };

    match output {
        Some(path) => std::fs::write(&path, source).map_err(|e| {
            eprintln!("Error writing to {}: {}", path.display(), e);
            3u8
        }),
        None => {
            print!("{}", source);
            Ok(())
        }
    }
}

fn run_lint(path: &Path, format: &str, strict: bool, quiet: bool) -> Result<(), u8> {
    if !path.exists() {
        eprintln!("Error: path not found: {}", path.display());
        return Err(3);
    }

    let result = lint(path, strict);

    if format == "json" {
        print_json(&result, true)?;
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
        if result.failed == 0 {
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

    if result.failed == 0 {
        Ok(())
    } else {
        Err(1)
    }
}

fn run_handle(
    config: &EngineConfig,
    definitions: &Path,
    envelope: &Path,
    raw: &Path,
    actor: Option<PathBuf>,
    pretty: bool,
) -> Result<(), u8> {
    let (definition, registry) = load_definitions(definitions)?;
    let actions = ActionRegistry::build(&definition, &registry).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let load = |path: &Path| {
        load_json(path).map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })
    };
    let envelope = load(envelope)?;
    let raw = load(raw)?;
    let actor = actor.as_deref().map(load).transpose()?;

    let engine = Engine::new(Arc::new(registry), actions, config, StaticFetcher::new(raw));
    let response = engine.handle(&envelope, actor.as_ref());
    print_json(&response, pretty)?;
    if response.success {
        Ok(())
    } else {
        Err(1)
    }
}
