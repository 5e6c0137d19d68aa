use std::path::PathBuf;

use super::{Config, ConfigLayer, MIN_HEARTBEAT_MS};

pub fn merge_layers(user: Option<ConfigLayer>, workspace: Option<ConfigLayer>) -> Config {
    let mut config = Config::default();
    if let Some(layer) = user {
        layer.apply_to(&mut config);
    }
    if let Some(layer) = workspace {
        layer.apply_to(&mut config);
    }
    config
}

pub fn apply_env_overrides(config: &mut Config) {
    apply_overrides_from(config, |name| std::env::var(name).ok());
}

/// Same as [`apply_env_overrides`] with an explicit variable lookup.
pub fn apply_overrides_from(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(ms) = millis(&lookup, "BOARDSYNC_DEBOUNCE_MS") {
        config.sync.debounce_ms = ms;
    }
    if let Some(ms) = millis(&lookup, "BOARDSYNC_HEARTBEAT_MS") {
        config.presence.heartbeat_ms = ms;
    }
    if let Some(ms) = millis(&lookup, "BOARDSYNC_FRESHNESS_MS") {
        config.presence.freshness_ms = ms;
    }

    if let Some(raw) = lookup("BOARDSYNC_CACHE_PATH") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            config.cache.path = Some(PathBuf::from(trimmed));
        }
    }

    if config.presence.heartbeat_ms < MIN_HEARTBEAT_MS {
        tracing::warn!(
            heartbeat_ms = config.presence.heartbeat_ms,
            min_ms = MIN_HEARTBEAT_MS,
            "presence heartbeat too short, clamping"
        );
        config.presence.heartbeat_ms = MIN_HEARTBEAT_MS;
    }
    if config.presence.freshness_ms < config.presence.heartbeat_ms {
        tracing::warn!(
            heartbeat_ms = config.presence.heartbeat_ms,
            freshness_ms = config.presence.freshness_ms,
            "presence freshness window is shorter than the heartbeat; peers will flicker"
        );
    }
}

fn millis(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<u64> {
    let raw = lookup(name)?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<u64>() {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!("invalid {name}, ignoring: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use super::super::schema::{PresenceOverride, SyncOverride};

    #[test]
    fn workspace_layer_wins_over_user() {
        let user = ConfigLayer {
            sync: SyncOverride {
                debounce_ms: Some(900),
            },
            presence: PresenceOverride {
                scope: Some("team".into()),
                ..PresenceOverride::default()
            },
            ..ConfigLayer::default()
        };
        let workspace = ConfigLayer {
            sync: SyncOverride {
                debounce_ms: Some(250),
            },
            ..ConfigLayer::default()
        };

        let config = merge_layers(Some(user), Some(workspace));
        assert_eq!(config.sync.debounce_ms, 250);
        assert_eq!(config.presence.scope, "team");
        assert_eq!(config.presence.heartbeat_ms, 20_000);
    }

    #[test]
    fn env_overrides_apply_and_bad_values_are_ignored() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("BOARDSYNC_DEBOUNCE_MS", "75"),
            ("BOARDSYNC_HEARTBEAT_MS", "soon"),
            ("BOARDSYNC_FRESHNESS_MS", " 90000 "),
            ("BOARDSYNC_CACHE_PATH", "/tmp/board.json"),
        ]);

        let mut config = Config::default();
        apply_overrides_from(&mut config, |name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.sync.debounce_ms, 75);
        assert_eq!(config.presence.heartbeat_ms, 20_000);
        assert_eq!(config.presence.freshness_ms, 90_000);
        assert_eq!(config.cache.path, Some(PathBuf::from("/tmp/board.json")));
    }

    #[test]
    fn zero_heartbeat_is_clamped() {
        let workspace = ConfigLayer {
            presence: PresenceOverride {
                heartbeat_ms: Some(0),
                ..PresenceOverride::default()
            },
            ..ConfigLayer::default()
        };
        let mut config = merge_layers(None, Some(workspace));
        assert_eq!(config.presence.settings().heartbeat.as_millis(), 1_000);

        apply_overrides_from(&mut config, |_| None);
        assert_eq!(config.presence.heartbeat_ms, MIN_HEARTBEAT_MS);

        apply_overrides_from(&mut config, |name| {
            (name == "BOARDSYNC_HEARTBEAT_MS").then(|| "0".to_string())
        });
        assert_eq!(config.presence.heartbeat_ms, MIN_HEARTBEAT_MS);
    }
}
