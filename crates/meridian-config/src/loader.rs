// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./meridian.toml` > `~/.config/meridian/meridian.toml`
//! > `/etc/meridian/meridian.toml` with environment variable overrides via the
//! `MERIDIAN_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::MeridianConfig;

/// Top-level config sections, in the order they are matched against env keys.
const SECTIONS: &[&str] = &[
    "agent",
    "anthropic",
    "openai",
    "routing",
    "orchestration",
    "retry",
    "pricing",
    "tools",
    "gateway",
];

/// Sections whose keys may address a nested table (`routing.standard.model`).
const NESTED_TABLES: &[(&str, &[&str])] = &[
    ("routing", &["standard", "premium", "fallback"]),
    ("pricing", &["standard", "premium", "fallback"]),
];

/// Keys inside nested-table sections that look nested but are plain fields.
const FLAT_KEYS: &[&str] = &["fallback_enabled", "premium_threshold"];

pub(crate) fn config_file_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/meridian/meridian.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("meridian/meridian.toml"));
    }
    paths.push(PathBuf::from("meridian.toml"));
    paths
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/meridian/meridian.toml` (system-wide)
/// 3. `~/.config/meridian/meridian.toml` (user XDG config)
/// 4. `./meridian.toml` (local directory)
/// 5. `MERIDIAN_*` environment variables
pub fn load_config() -> Result<MeridianConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<MeridianConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MeridianConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MeridianConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MeridianConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    config_file_paths()
        .into_iter()
        .fold(
            Figment::new().merge(Serialized::defaults(MeridianConfig::default())),
            |figment, path| figment.merge(Toml::file(path)),
        )
        .merge(env_provider())
}

/// Map a lowercased, prefix-stripped env key to a dotted config path.
///
/// `routing_standard_model` becomes `routing.standard.model`, while
/// `routing_premium_threshold` stays `routing.premium_threshold`. Keys that
/// start with no known section are returned unchanged.
pub fn env_key_to_path(key: &str) -> String {
    let Some(section) = SECTIONS
        .iter()
        .find(|s| key.starts_with(&format!("{s}_")))
    else {
        return key.to_string();
    };
    let rest = &key[section.len() + 1..];

    if !FLAT_KEYS.contains(&rest)
        && let Some((_, tables)) = NESTED_TABLES.iter().find(|(s, _)| s == section)
        && let Some(table) = tables
            .iter()
            .find(|t| rest.starts_with(&format!("{t}_")))
    {
        let field = &rest[table.len() + 1..];
        return format!("{section}.{table}.{field}");
    }

    format!("{section}.{rest}")
}

/// Environment provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because field names
/// contain underscores (`MERIDIAN_RETRY_BASE_DELAY_MS` → `retry.base_delay_ms`).
fn env_provider() -> Env {
    Env::prefixed("MERIDIAN_").map(|key| env_key_to_path(key.as_str()).into())
}
