use crate::types::Config;
use anyhow::{ensure, Context, Result};
use std::fs;
use std::path::Path;

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let t = &self.tracking;
        for (name, value) in [
            ("match_threshold", t.match_threshold),
            ("merge_threshold", t.merge_threshold),
            ("input_dedup_threshold", t.input_dedup_threshold),
            ("stale_ms", t.stale_ms),
        ] {
            ensure!(
                value.is_finite() && value > 0.0,
                "tracking.{} must be a positive number, got {}",
                name,
                value
            );
        }
        ensure!(
            t.stability_frames >= 1,
            "tracking.stability_frames must be at least 1"
        );
        if let Some(rescue) = &t.rescue {
            ensure!(
                rescue.distance > 0.0 && rescue.window_ms > 0.0,
                "tracking.rescue distance and window_ms must be positive"
            );
        }
        if let Some(zones) = &self.zones {
            ensure!(
                zones.tray.is_normalized() && zones.incision.is_normalized(),
                "zone rectangles must lie inside [0,1]"
            );
        }
        ensure!(
            self.replay.speed.is_finite() && self.replay.speed > 0.0,
            "replay.speed must be positive"
        );
        ensure!(
            self.replay.channel_capacity > 0,
            "replay.channel_capacity must be positive"
        );
        Ok(())
    }
}
