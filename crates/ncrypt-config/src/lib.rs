// SPDX-FileCopyrightText: 2026 ncrypt Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the ncrypt client.
//!
//! Settings come from layered TOML files plus `NCRYPT_*` environment
//! variables. Unknown keys are rejected, and every problem is reported as a
//! miette diagnostic, so a typo gets a suggestion and a source span.
//!
//! There is no `[kdf]` section: key-derivation parameters are constants of
//! `ncrypt-crypto`, because changing them would change every derived key.
//!
//! ```no_run
//! match ncrypt_config::load_and_validate() {
//!     Ok(config) => println!("API base: {}", config.api.base_url),
//!     Err(errors) => eprint!("{}", ncrypt_config::render_errors(&errors)),
//! }
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, ConfigSource, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::NcryptConfig;

use ncrypt_core::NcryptError;

/// Load from the file hierarchy and environment, then validate.
pub fn load_and_validate() -> Result<NcryptConfig, Vec<ConfigError>> {
    let config = loader::load_config()
        .map_err(|err| diagnostic::from_figment(err, &hierarchy_sources()))?;
    validation::validate_config(&config)?;
    Ok(config)
}

/// Load a TOML document (no files, no environment), then validate.
pub fn load_and_validate_str(toml_content: &str) -> Result<NcryptConfig, Vec<ConfigError>> {
    let config = loader::load_config_from_str(toml_content).map_err(|err| {
        diagnostic::from_figment(err, &[ConfigSource::inline(toml_content)])
    })?;
    validation::validate_config(&config)?;
    Ok(config)
}

/// Collapse diagnostics into one [`NcryptError::Config`].
pub fn into_ncrypt_error(errors: &[ConfigError]) -> NcryptError {
    NcryptError::Config(
        errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; "),
    )
}

fn hierarchy_sources() -> Vec<ConfigSource> {
    loader::hierarchy_paths()
        .iter()
        .filter_map(|path| ConfigSource::read(path))
        .collect()
}
