use std::{fs, path::Path};

use anyhow::{Context, Result};
use pursuit_core::GameConfig;

/// Loads the encounter configuration, falling back to the divided field when
/// no file is given.
pub(crate) fn load(path: Option<&Path>) -> Result<GameConfig> {
    let Some(path) = path else {
        return Ok(GameConfig::default());
    };

    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    parse(&contents).with_context(|| format!("invalid config at {}", path.display()))
}

/// Parses and validates a TOML encounter configuration.
pub(crate) fn parse(contents: &str) -> Result<GameConfig> {
    let config: GameConfig =
        toml::from_str(contents).context("failed to parse config toml contents")?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pursuit_core::{AgentConfig, Position, ResolutionOrder};

    #[test]
    fn default_config_survives_toml() {
        let config = GameConfig {
            seed: Some(17),
            ..GameConfig::default()
        };

        let encoded = toml::to_string(&config).expect("serialize config");
        let decoded = parse(&encoded).expect("parse config");

        assert_eq!(decoded, config);
    }

    #[test]
    fn omitted_fields_take_defaults() {
        let contents = r#"
            width = 10
            height = 8
            obstacles = [{ x = 4, y = 4 }]
            seed = 9
            resolution_order = "EvaderFirst"

            [pursuer]
            start = { x = 9, y = 0 }
            step_budget = 1

            [evader]
            start = { x = 0, y = 7 }
            step_budget = 2
        "#;

        let config = parse(contents).expect("parse config");

        assert_eq!(config.width, 10);
        assert_eq!(config.obstacles, vec![Position::new(4, 4)]);
        assert_eq!(config.evader, AgentConfig::new(Position::new(0, 7), 2));
        assert_eq!(config.resolution_order, ResolutionOrder::EvaderFirst);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.apple_lifetime, GameConfig::default().apple_lifetime);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let contents = r#"
            width = 4
            height = 4
            obstacles = []

            [pursuer]
            start = { x = 3, y = 3 }
            step_budget = 0

            [evader]
            start = { x = 0, y = 0 }
            step_budget = 1
        "#;

        assert!(parse(contents).is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let error = load(Some(Path::new("does/not/exist.toml"))).expect_err("missing file");
        assert!(error.to_string().contains("does/not/exist.toml"));
    }
}
