use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use log::{debug, info};

use oapy_core::config::{self, CONFIG_FILE_NAME, HttpLibrary, OapyConfig, SyntaxCheck};
use oapy_core::parse::{self, OpenApiSpec};
use oapy_core::services::Service;
use oapy_core::{CodeGenerator, GeneratedFile};
use oapy_python_client::PythonClientGenerator;

#[derive(Parser)]
#[command(name = "oapy", about = "Python client generator for OpenAPI 3.x", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate service modules from an OpenAPI spec
    Generate {
        /// Path to the OpenAPI spec file (YAML or JSON)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// HTTP library the generated code uses
        #[arg(short, long)]
        library: Option<LibraryArg>,

        /// Syntax check run on every rendered operation
        #[arg(long)]
        syntax_check: Option<SyntaxCheckArg>,
    },

    /// Show the services and operations that would be generated
    Inspect {
        /// Path to the OpenAPI spec file
        #[arg(short, long)]
        input: PathBuf,

        /// HTTP library the generated code uses
        #[arg(short, long)]
        library: Option<LibraryArg>,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: InspectFormat,
    },

    /// Initialize a new oapy configuration
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
enum LibraryArg {
    Httpx,
    Requests,
    Aiohttp,
}

impl From<LibraryArg> for HttpLibrary {
    fn from(arg: LibraryArg) -> Self {
        match arg {
            LibraryArg::Httpx => HttpLibrary::Httpx,
            LibraryArg::Requests => HttpLibrary::Requests,
            LibraryArg::Aiohttp => HttpLibrary::Aiohttp,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SyntaxCheckArg {
    Off,
    Builtin,
    Python,
}

impl From<SyntaxCheckArg> for SyntaxCheck {
    fn from(arg: SyntaxCheckArg) -> Self {
        match arg {
            SyntaxCheckArg::Off => SyntaxCheck::Off,
            SyntaxCheckArg::Builtin => SyntaxCheck::Builtin,
            SyntaxCheckArg::Python => SyntaxCheck::Python,
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
            library,
            syntax_check,
        } => cmd_generate(input, output, library, syntax_check),

        Commands::Inspect {
            input,
            library,
            format,
        } => cmd_inspect(input, library, format),

        Commands::Init { force } => cmd_init(force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "oapy", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Try to load the project config file from the current directory.
fn try_load_config() -> Result<Option<OapyConfig>> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);
    config::load_config(&config_path).map_err(|e| anyhow::anyhow!(e))
}

fn load_spec(path: &Path) -> Result<OpenApiSpec> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("yaml");

    let parsed = match ext {
        "json" => parse::from_json(&content)?,
        _ => parse::from_yaml(&content)?,
    };
    debug!(
        "parsed {} ({} paths)",
        path.display(),
        parsed.paths.len()
    );
    Ok(parsed)
}

/// Command-line flags take precedence over `.oapy.yaml`.
fn apply_overrides(
    cfg: &mut OapyConfig,
    library: Option<LibraryArg>,
    syntax_check: Option<SyntaxCheckArg>,
) {
    if let Some(library) = library {
        cfg.library = library.into();
    }
    if let Some(check) = syntax_check {
        cfg.syntax_check = check.into();
    }
}

/// Write generated files to disk under the given base directory.
fn write_files(base: &Path, files: &[GeneratedFile]) -> Result<()> {
    for file in files {
        let path = base.join(&file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        fs::write(&path, &file.content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        eprintln!("  wrote {}", path.display());
    }
    Ok(())
}

fn cmd_generate(
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    library: Option<LibraryArg>,
    syntax_check: Option<SyntaxCheckArg>,
) -> Result<()> {
    let mut cfg = try_load_config()?.unwrap_or_default();
    apply_overrides(&mut cfg, library, syntax_check);

    let input = input.unwrap_or_else(|| PathBuf::from(&cfg.input));
    let output_dir = output.unwrap_or_else(|| PathBuf::from(&cfg.output));
    let spec = load_spec(&input)?;

    let library_config = cfg.library_config();
    eprintln!(
        "Generating {} client → {}",
        library_config.name,
        output_dir.display()
    );

    let files = PythonClientGenerator::new(cfg.syntax_check)
        .generate(&spec, &library_config)
        .with_context(|| format!("failed to generate services from {}", input.display()))?;

    fs::create_dir_all(&output_dir).with_context(|| {
        format!("failed to create output directory {}", output_dir.display())
    })?;
    write_files(&output_dir, &files)?;

    info!("{} files written", files.len());
    eprintln!("Generated {} files in {}", files.len(), output_dir.display());
    Ok(())
}

fn cmd_inspect(input: PathBuf, library: Option<LibraryArg>, format: InspectFormat) -> Result<()> {
    let mut cfg = try_load_config()?.unwrap_or_default();
    apply_overrides(&mut cfg, library, None);
    let spec = load_spec(&input)?;

    let services = PythonClientGenerator::new(SyntaxCheck::Off)
        .services(&spec, &cfg.library_config())
        .with_context(|| format!("failed to build services from {}", input.display()))?;

    let summary = build_inspect_summary(&spec, &services);

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

fn build_inspect_summary(spec: &OpenApiSpec, services: &[Service<'_>]) -> serde_json::Value {
    let services: Vec<serde_json::Value> = services
        .iter()
        .map(|service| {
            let operations: Vec<serde_json::Value> = service
                .operations
                .iter()
                .map(|so| {
                    serde_json::json!({
                        "name": so.operation_id,
                        "method": so.method.as_str(),
                        "path": so.path_name,
                        "params": so.params,
                        "returns": so
                            .return_type
                            .type_conversion
                            .as_ref()
                            .map(|t| t.converted_type.as_str()),
                        "status": so.return_type.status_code,
                    })
                })
                .collect();
            serde_json::json!({
                "file": service.file_name,
                "async": service.async_client,
                "operations": operations,
            })
        })
        .collect();

    serde_json::json!({
        "info": {
            "title": spec.info.title,
            "version": spec.info.version,
        },
        "services": services,
    })
}

fn cmd_init(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, config::default_config_content())?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}
