use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use console::style;
use dialoguer::Confirm;

use apigen_core::config::{
    self, CONFIG_FILE_NAME, ConfigOverrides, Implementation, ProjectConfig,
};
use apigen_core::emitter::AlwaysAccept;
use apigen_core::error::EmitError;
use apigen_core::ir::IrSpec;
use apigen_core::parse::{self, SpecDocument};
use apigen_core::transform::build_ir;
use apigen_core::{Backend, OverwritePrompt, generate};
use apigen_flask_server::FlaskServer;
use apigen_typescript_client::TypeScriptClient;

#[derive(Parser)]
#[command(name = "apigen", about = "Template-driven OpenAPI 3 code generator", version)]
struct Cli {
    /// Project config file
    #[arg(short, long, global = true, default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate code from an OpenAPI spec
    Generate {
        /// Path to the OpenAPI spec file (YAML or JSON)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory searched for templates before the built-ins
        #[arg(short, long)]
        templates: Option<PathBuf>,

        /// Backend to generate with
        #[arg(long)]
        implementation: Option<ImplementationArg>,

        /// Write every file, ignoring the checksum ledger
        #[arg(long)]
        force: bool,

        /// Never write paths matching this pattern (repeatable)
        #[arg(long = "protect", value_name = "PATTERN")]
        protected: Vec<String>,

        /// Overwrite edited files without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// Validate an OpenAPI spec
    Validate {
        /// Path to the OpenAPI spec file
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Inspect the resolved IR of an OpenAPI spec
    Inspect {
        /// Path to the OpenAPI spec file
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: InspectFormat,
    },

    /// Initialize a new apigen configuration
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ImplementationArg {
    Flask,
    Typescript,
}

impl From<ImplementationArg> for Implementation {
    fn from(arg: ImplementationArg) -> Self {
        match arg {
            ImplementationArg::Flask => Implementation::Flask,
            ImplementationArg::Typescript => Implementation::Typescript,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum InspectFormat {
    Yaml,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            input,
            output,
            templates,
            implementation,
            force,
            protected,
            yes,
        } => {
            let overrides = ConfigOverrides {
                spec: input,
                output,
                templates,
                implementation: implementation.map(Implementation::from),
                overwrite: force,
                protected,
            };
            cmd_generate(&cli.config, overrides, yes)
        }

        Commands::Validate { input } => cmd_validate(&cli.config, input),

        Commands::Inspect { input, format } => cmd_inspect(&cli.config, input, format),

        Commands::Init { force } => cmd_init(&cli.config, force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "apigen", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Load the project config, falling back to defaults when the file is absent.
fn load_config(path: &Path) -> Result<ProjectConfig> {
    let cfg = config::load_config(path)?;
    if cfg.is_none() {
        log::debug!("{} not found, using defaults", path.display());
    }
    Ok(cfg.unwrap_or_default())
}

fn load_spec(path: &Path) -> Result<SpecDocument> {
    parse::load_spec(path).with_context(|| format!("failed to load {}", path.display()))
}

/// Look up a backend by its config value.
fn get_backend(implementation: Implementation) -> Box<dyn Backend> {
    match implementation {
        Implementation::Flask => Box::new(FlaskServer),
        Implementation::Typescript => Box::new(TypeScriptClient),
    }
}

/// Shows the diff of an edited file and asks before replacing it.
///
/// Declines without asking when stdin is not a terminal.
struct DialoguerPrompt {
    interactive: bool,
}

impl DialoguerPrompt {
    fn new() -> Self {
        Self {
            interactive: std::io::stdin().is_terminal(),
        }
    }
}

impl OverwritePrompt for DialoguerPrompt {
    fn confirm(&mut self, path: &Path, diff: &str) -> Result<bool, EmitError> {
        if !self.interactive {
            eprintln!(
                "  kept {} (edited since last run, no terminal to ask)",
                path.display()
            );
            return Ok(false);
        }

        eprintln!("\n{} was edited since the last run:", style(path.display()).bold());
        for line in diff.lines() {
            let line = if line.starts_with("+++") || line.starts_with("---") {
                style(line).bold()
            } else if line.starts_with('+') {
                style(line).green()
            } else if line.starts_with('-') {
                style(line).red()
            } else if line.starts_with("@@") {
                style(line).cyan()
            } else {
                style(line)
            };
            eprintln!("{line}");
        }

        Confirm::new()
            .with_prompt(format!("Overwrite {}?", path.display()))
            .default(false)
            .interact()
            .map_err(|err| EmitError::Prompt(err.to_string()))
    }
}

fn cmd_generate(config_path: &Path, overrides: ConfigOverrides, yes: bool) -> Result<()> {
    let cfg = load_config(config_path)?.merged(overrides);
    let doc = load_spec(&cfg.spec)?;
    let backend = get_backend(cfg.implementation);

    let prompt: Box<dyn OverwritePrompt> = if yes {
        Box::new(AlwaysAccept)
    } else {
        Box::new(DialoguerPrompt::new())
    };

    eprintln!(
        "Generating {} → {}",
        backend.id(),
        cfg.output.display()
    );
    let summary = generate::run(&doc, backend.as_ref(), &cfg, prompt)
        .with_context(|| format!("generation into {} failed", cfg.output.display()))?;

    eprintln!("  {summary}");
    if summary.changed() == 0 {
        eprintln!("Nothing to do, output is up to date.");
    }
    Ok(())
}

fn cmd_validate(config_path: &Path, input: Option<PathBuf>) -> Result<()> {
    let cfg = load_config(config_path)?;
    let input = input.unwrap_or(cfg.spec);
    let doc = load_spec(&input)?;

    eprintln!("Valid OpenAPI {} spec: {}", doc.openapi(), doc.title());
    eprintln!("  Version: {}", doc.version());
    eprintln!("  Paths: {}", doc.paths().count());
    if let Some(schemas) = doc.component_schemas() {
        eprintln!("  Schemas: {}", schemas.len());
    }

    // Also validate that every type resolves for the configured backend
    let backend = get_backend(cfg.implementation);
    let ir = build_ir(&doc, backend.type_mapper())?;
    eprintln!("  Operations: {}", ir.operation_count());
    eprintln!("  IR Schemas: {}", ir.schemas.len());
    eprintln!("  Tags: {}", ir.paths.len());

    eprintln!("Validation successful.");
    Ok(())
}

fn cmd_inspect(config_path: &Path, input: Option<PathBuf>, format: InspectFormat) -> Result<()> {
    let cfg = load_config(config_path)?;
    let input = input.unwrap_or(cfg.spec);
    let doc = load_spec(&input)?;
    let ir = build_ir(&doc, get_backend(cfg.implementation).type_mapper())?;

    let summary = build_inspect_summary(&ir);

    match format {
        InspectFormat::Yaml => {
            let yaml = serde_yaml_ng::to_string(&summary)?;
            print!("{}", yaml);
        }
        InspectFormat::Json => {
            let json = serde_json::to_string_pretty(&summary)?;
            println!("{}", json);
        }
    }

    Ok(())
}

fn build_inspect_summary(ir: &IrSpec) -> serde_json::Value {
    let schemas: Vec<serde_json::Value> = ir
        .schemas
        .values()
        .map(|s| {
            let kind = if s.is_alias() {
                "alias"
            } else if s.properties.is_empty() && s.additional_properties.is_none() {
                "primitive"
            } else {
                "object"
            };
            serde_json::json!({
                "name": s.name,
                "kind": kind,
                "properties": s.properties.iter().map(|p| &p.name).collect::<Vec<_>>(),
                "dependencies": s.dependencies,
            })
        })
        .collect();

    let tags: serde_json::Map<String, serde_json::Value> = ir
        .paths
        .iter()
        .map(|(tag, ops)| {
            let ops: Vec<serde_json::Value> = ops
                .iter()
                .map(|op| {
                    serde_json::json!({
                        "name": op.function_name,
                        "method": op.method.as_str(),
                        "url": op.url,
                        "deprecated": op.deprecated,
                    })
                })
                .collect();
            (tag.clone(), serde_json::Value::Array(ops))
        })
        .collect();

    serde_json::json!({
        "info": {
            "title": ir.info.title,
            "version": ir.info.version,
        },
        "base_path": ir.base_path,
        "schemas": schemas,
        "tags": tags,
    })
}

fn cmd_init(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(config_path, config::default_config_content())
        .with_context(|| format!("failed to write {}", config_path.display()))?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}
