// Pure config resolution for the web host (no web-sys), so it can be tested on the host.

use spiral_core::{DeploymentConfig, PlacementStrategy};

/// Value of `key` in a `?a=b&c=d` query string. A leading `?` is optional.
pub fn query_param<'a>(search: &'a str, key: &str) -> Option<&'a str> {
    search
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

/// Placement strategy requested by the page URL, if any and if valid.
pub fn placement_override(search: &str, key: &str) -> Option<PlacementStrategy> {
    let raw = query_param(search, key)?;
    match raw.parse::<PlacementStrategy>() {
        Ok(p) => Some(p),
        Err(e) => {
            log::warn!("[config] ignoring query override: {}", e);
            None
        }
    }
}

/// Embedded JSON config (or defaults), then the query override on top.
pub fn resolve_config(script_text: Option<&str>, search: &str, key: &str) -> DeploymentConfig {
    let mut config = match script_text.map(str::trim) {
        Some(text) if !text.is_empty() => DeploymentConfig::from_json_or_default(text),
        _ => DeploymentConfig::default(),
    };
    if let Some(placement) = placement_override(search, key) {
        config.placement = placement;
    }
    config
}
