use flowmap::cli::{AnalysisCommand, Cli, Commands, ConfigAction, RequestArgs};
use flowmap::config::Config;
use flowmap::error::{FlowmapError, Result};
use flowmap::service::{AnalysisRequest, Analyzer};
use serde::Serialize;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    // Handle commands
    match cli.command {
        Commands::Config { action } => {
            cmd_config(cli.config, action)?;
        }
        Commands::Analysis(command) => {
            let mut config = load_config(cli.config)?;
            if let Some(dir) = cli.data_dir {
                config.data.dir = dir;
            }
            run_analysis(Analyzer::new(config), command)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "flowmap=debug" } else { "flowmap=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run_analysis(analyzer: Analyzer, command: AnalysisCommand) -> Result<()> {
    match command {
        AnalysisCommand::Map {
            request,
            min_edge_occurrences,
        } => {
            let mut request = read_request(request)?;
            if min_edge_occurrences.is_some() {
                request.controls.min_edge_occurrences = min_edge_occurrences;
            }
            print_json(&analyzer.process_map(&request)?)
        }
        AnalysisCommand::Durations { request } => {
            print_json(&analyzer.case_durations(&read_request(request)?)?)
        }
        AnalysisCommand::Endpoints { file } => print_json(&analyzer.start_end_activities(&file)?),
        AnalysisCommand::Columns { file } => print_json(&analyzer.columns(&file)?),
        AnalysisCommand::Values { file, column } => print_json(&analyzer.column_values(&file, &column)?),
        AnalysisCommand::Variants { file } => print_json(&analyzer.case_variants(&file)?),
        AnalysisCommand::Files => print_json(&analyzer.list_files()?),
    }
}

fn read_request(args: RequestArgs) -> Result<AnalysisRequest> {
    match (args.request, args.file) {
        (Some(path), _) => {
            let content = std::fs::read_to_string(&path).map_err(|e| FlowmapError::Io {
                source: e,
                context: format!("Failed to read request file: {:?}", path),
            })?;
            serde_json::from_str(&content).map_err(|e| FlowmapError::Json {
                source: e,
                context: format!("Failed to parse request file: {:?}", path),
            })
        }
        (None, Some(file)) => Ok(AnalysisRequest::new(file)),
        (None, None) => Err(FlowmapError::InvalidRequest(
            "Pass --request or --file".to_string(),
        )),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| FlowmapError::Json {
        source: e,
        context: "Failed to serialize result".to_string(),
    })?;
    println!("{}", json);
    Ok(())
}

fn cmd_config(config_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path)?;
            let toml = toml::to_string_pretty(&config)?;
            println!("{}", toml);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
            println!("  Data directory: {}", config.data.dir.display());
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            create_parent_dir(&path)?;
            Config::default().save(&path)?;

            println!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| FlowmapError::Io {
            source: e,
            context: format!("Failed to create config directory: {:?}", parent),
        })?;
    }
    Ok(())
}

fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if !path.exists() {
        tracing::warn!(
            "Config file not found, using defaults. Run 'flowmap config init' to create one."
        );
        return Config::from_env();
    }

    Config::load(&path)
}
