//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::{Cli, Command, ExtractArgs};
use crate::config::{ExtractOverrides, ExtractionConfig};
use anyhow::{Context, Result};
use tracing::{debug, warn};

/// Convert CLI arguments to an [`ExtractionConfig`]
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Load the config file named by `--config` and layer the CLI flags on top
    pub(crate) fn from_cli(cli: &Cli) -> Result<ExtractionConfig> {
        let mut config = if cli.config.is_file() {
            debug!(path = %cli.config.display(), "Loading configuration");
            ExtractionConfig::from_yaml_file(&cli.config)
                .with_context(|| format!("Failed to load {}", cli.config.display()))?
        } else {
            warn!(
                path = %cli.config.display(),
                "Config file not found, using built-in defaults"
            );
            ExtractionConfig::default()
        };

        let overrides = match &cli.command {
            Command::Extract(args) => Self::extract_overrides(cli, args),
            Command::Inspect(args) => ExtractOverrides {
                workers: cli.workers,
                output_dir: args.output_dir.clone(),
                ..ExtractOverrides::default()
            },
        };
        config.apply_overrides(&overrides);

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    fn extract_overrides(cli: &Cli, args: &ExtractArgs) -> ExtractOverrides {
        ExtractOverrides {
            workers: cli.workers,
            start: args.start,
            end: args.end,
            image_dir: args.image_dir.clone(),
            mask_dir: args.mask_dir.clone(),
            output_dir: args.output_dir.clone(),
            save_masks: args.save_masks,
            save_overlays: args.save_overlays,
        }
    }
}
