//! `reset` command: clears the persisted target.

use crate::cli::args::ResetArgs;
use crate::clock::clear_target;
use crate::error::UnveilError;

use super::{load_config, open_store};

/// Clears the duration-mode slot so the next run opens a fresh window.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the slot
/// cannot be cleared.
pub fn run(args: &ResetArgs) -> Result<(), UnveilError> {
    let config = load_config(&args.source)?;
    let mode = config.countdown.target_mode()?;
    let store = open_store(&args.source, &config);

    if clear_target(&mode, &store)? {
        println!("cleared persisted target in {}", store.path().display());
    } else {
        println!("fixed-date countdown; nothing to reset");
    }
    Ok(())
}
