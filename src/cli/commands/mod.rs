//! CLI command dispatch and handlers
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod completions;
pub mod reset;
pub mod run;
pub mod status;
pub mod validate;
pub mod version;

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::cli::args::{Cli, Commands, SourceArgs};
use crate::config::{ConfigLoader, RevealConfig};
use crate::error::UnveilError;
use crate::persistence::FileStore;

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// `cancel` is the page context: cancelling it tears down a running reveal.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub async fn dispatch(cli: Cli, cancel: CancellationToken) -> Result<(), UnveilError> {
    match cli.command {
        Commands::Run(args) => run::run(&args, cancel).await,
        Commands::Status(args) => status::run(&args),
        Commands::Reset(args) => reset::run(&args),
        Commands::Validate(args) => validate::run(&args),
        Commands::Completions(args) => {
            completions::run(&args);
            Ok(())
        }
        Commands::Version(args) => {
            version::run(&args);
            Ok(())
        }
    }
}

/// Loads the configuration named by `source`, or the stock page.
pub(crate) fn load_config(source: &SourceArgs) -> Result<Arc<RevealConfig>, UnveilError> {
    let Some(path) = &source.config else {
        tracing::debug!("no configuration file; using the stock page");
        return Ok(Arc::new(RevealConfig::default()));
    };
    tracing::info!(config = %path.display(), "loading configuration");
    let result = ConfigLoader::with_defaults().load(path)?;
    Ok(result.config)
}

/// The slot file for `config`, honouring `--state-file`.
pub(crate) fn open_store(source: &SourceArgs, config: &RevealConfig) -> FileStore {
    let path: PathBuf = source
        .state_file
        .clone()
        .unwrap_or_else(|| config.persistence.path.clone());
    FileStore::new(path)
}
