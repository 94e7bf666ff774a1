//! Configuration loading for `juris.toml`.

/// TOML configuration, validation and conversion into runtime settings.
pub mod toml_config;
