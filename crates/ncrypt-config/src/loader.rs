// SPDX-FileCopyrightText: 2026 ncrypt Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered loading with figment.
//!
//! Later layers win: compiled defaults, `/etc/ncrypt/ncrypt.toml`, the user
//! config dir (`~/.config/ncrypt/ncrypt.toml` on Linux), `./ncrypt.toml`, and
//! finally `NCRYPT_<SECTION>_<KEY>` environment variables.

#![allow(clippy::result_large_err)] // figment::Error is foreign

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::NcryptConfig;

/// Top-level sections addressable from `NCRYPT_<SECTION>_<KEY>`.
const SECTIONS: &[&str] = &["api", "secrets", "log"];

/// Candidate config files, lowest precedence first. Missing files are skipped.
pub fn hierarchy_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/ncrypt/ncrypt.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("ncrypt").join("ncrypt.toml"));
    }
    paths.push(PathBuf::from("ncrypt.toml"));
    paths
}

fn defaults() -> Figment {
    Figment::from(Serialized::defaults(NcryptConfig::default()))
}

/// Every layer, before extraction.
pub fn build_figment() -> Figment {
    hierarchy_paths()
        .into_iter()
        .fold(defaults(), |figment, path| figment.merge(Toml::file(path)))
        .merge(env_provider())
}

/// Load from the full hierarchy plus environment.
pub fn load_config() -> Result<NcryptConfig, figment::Error> {
    build_figment().extract()
}

/// Load one TOML document over the defaults. Files and environment are ignored.
pub fn load_config_from_str(toml_content: &str) -> Result<NcryptConfig, figment::Error> {
    defaults().merge(Toml::string(toml_content)).extract()
}

/// Load one explicit file over the defaults, with environment overrides.
pub fn load_config_from_path(path: &Path) -> Result<NcryptConfig, figment::Error> {
    defaults()
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Environment provider with an explicit section map.
///
/// `Env::split("_")` would turn `NCRYPT_API_BASE_URL` into `api.base.url`;
/// only the first segment names the section.
fn env_provider() -> Env {
    Env::prefixed("NCRYPT_").map(|key| {
        let key = key.as_str().to_ascii_lowercase();
        let mapped = SECTIONS
            .iter()
            .find_map(|section| {
                key.strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|field| format!("{section}.{field}"))
            })
            .unwrap_or(key);
        mapped.into()
    })
}
