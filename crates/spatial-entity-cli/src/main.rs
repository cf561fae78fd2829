//! Spatial Entity Command-Line Client
//!
//! Resolves a persistence configuration and prints the result or the mapping
//! metadata it loads.

mod formatter;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use formatter::OutputFormat;
use spatial_entity_core::{
    Mode, PersistenceConfig, PersistenceConfigResolver, ResolvedConfiguration, TypeRegistry,
};

/// Spatial Entity persistence configuration tool
#[derive(Parser, Debug)]
#[command(name = "spatial-entity")]
#[command(version, about = "Resolve persistence configuration and mapping metadata")]
pub struct Args {
    /// Configuration file (defaults to <root>/config/config.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Project root that relative paths are anchored at
    #[arg(short, long, default_value = ".")]
    pub root: PathBuf,

    /// Metadata driver (annotation, attribute, xml, yaml, php)
    #[arg(short, long)]
    pub driver: Option<String>,

    /// Force production mode
    #[arg(long, conflicts_with = "dev")]
    pub prod: bool,

    /// Force development mode
    #[arg(long)]
    pub dev: bool,

    /// Output format
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the resolved configuration
    Resolve {
        /// Domains to resolve (defaults to domains.names)
        domains: Vec<String>,
    },
    /// Load and print the mapping metadata
    Metadata {
        /// Domains to read (defaults to domains.names)
        domains: Vec<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spatial_entity=info,spatial_entity_core=info".into()),
        )
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&args)?;
    let formatter = formatter::create_formatter(args.format);

    match &args.command {
        Command::Resolve { domains } => {
            let resolved = resolve(&config, domains)?;
            println!("{}", formatter.format_resolved(&resolved));
        }
        Command::Metadata { domains } => {
            let resolved = resolve(&config, domains)?;
            let bundle = resolved.load_metadata()?;
            println!("{}", formatter.format_metadata(&bundle));
        }
    }
    Ok(())
}

/// Load the configuration and apply command-line overrides.
fn load_config(args: &Args) -> Result<PersistenceConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => PersistenceConfig::load(path)?.anchored_at(&args.root),
        None => PersistenceConfig::load_from_project(&args.root)?,
    };

    if let Some(driver) = &args.driver {
        config.orm.metadata_driver = Some(driver.clone());
    }
    if args.prod {
        config.enable_prod_mode = true;
    } else if args.dev {
        config.enable_prod_mode = false;
    }
    tracing::debug!(
        mode = %Mode::from_prod_flag(config.enable_prod_mode),
        root = %args.root.display(),
        "loaded configuration"
    );
    Ok(config)
}

fn resolve(
    config: &PersistenceConfig,
    domains: &[String],
) -> spatial_entity_core::Result<ResolvedConfiguration> {
    let resolver = PersistenceConfigResolver::new(Arc::new(TypeRegistry::new()));
    if domains.is_empty() {
        resolver.resolve_configured(config)
    } else {
        resolver.resolve(domains, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolve_command() {
        let args = Args::try_parse_from([
            "spatial-entity",
            "--driver",
            "xml",
            "--prod",
            "--format",
            "json",
            "resolve",
            "sales",
            "billing",
        ])
        .unwrap();
        assert_eq!(args.driver.as_deref(), Some("xml"));
        assert!(args.prod);
        assert_eq!(args.format, OutputFormat::Json);
        match args.command {
            Command::Resolve { domains } => assert_eq!(domains, vec!["sales", "billing"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_prod_and_dev_conflict() {
        let result = Args::try_parse_from(["spatial-entity", "--prod", "--dev", "metadata"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides_apply_to_project_config() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args::try_parse_from([
            "spatial-entity",
            "--root",
            dir.path().to_str().unwrap(),
            "--driver",
            "yaml",
            "--prod",
            "metadata",
        ])
        .unwrap();

        let config = load_config(&args).unwrap();
        assert!(config.enable_prod_mode);
        assert_eq!(config.orm.metadata_driver.as_deref(), Some("yaml"));
        assert_eq!(config.domains.root, dir.path().join("src/core/Domain"));
    }
}
