//! Handler configuration.

use serde::{Deserialize, Serialize};

/// Per-handler tuning knobs.
/// Keep this minimal; expand as needed without breaking API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cursor step used by `animate_default`.
    pub default_speed: f32,

    /// Maximum events retained between `drain_events` calls; the oldest is dropped beyond this.
    pub max_pending_events: usize,

    /// When false the handler records no events at all.
    pub record_events: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_speed: 1.0,
            max_pending_events: 64,
            record_events: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: Config = serde_json::from_str(r#"{ "default_speed": 0.5 }"#).unwrap();
        assert_eq!(cfg.default_speed, 0.5);
        assert_eq!(cfg.max_pending_events, 64);
        assert!(cfg.record_events);
    }
}
