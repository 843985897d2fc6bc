//! Loads the initial [`engine::GameConfig`] from `GameConfig.json` next to
//! the binary, falling back to defaults if the file is absent or
//! unreadable. Mirrors the hot-reload shape of the game-room config the
//! teacher's relay used, minus the hot part: config only matters at
//! `start_game` time, so this only ever runs once, at startup.

use tokio::fs;

pub async fn load_initial_config(path: &str) -> engine::GameConfig {
    match fs::read_to_string(path).await {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(config) => config,
            Err(error) => {
                tracing::warn!(%error, path, "failed to parse config file, using defaults");
                engine::GameConfig::default()
            }
        },
        Err(error) => {
            tracing::info!(%error, path, "no config file found, using defaults");
            engine::GameConfig::default()
        }
    }
}
