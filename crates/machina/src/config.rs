//! Robot and compilation configuration.

use serde::{Deserialize, Serialize};

use crate::compiler::RobotBrand;
use crate::error::Result;
use crate::settings::Settings;
use crate::types::InitialPose;

/// Configuration for one robot instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    /// Name used as the logging source and the default program name.
    pub name: String,

    /// Output language for [`CursorChain::compile_program`](crate::chain::CursorChain::compile_program).
    pub brand: RobotBrand,

    /// Settings every cursor starts with.
    pub defaults: Settings,

    /// Pose issued as an `Initialization` action when the chain is built.
    ///
    /// If `None`, the cursors start with an unknown pose and the first
    /// motion must be absolute.
    pub initial_pose: Option<InitialPose>,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            name: "robot".to_string(),
            brand: RobotBrand::Human,
            defaults: Settings::default(),
            initial_pose: None,
        }
    }
}

impl RobotConfig {
    /// A configuration with default settings and no initial pose.
    pub fn new(name: impl Into<String>, brand: RobotBrand) -> Self {
        Self {
            name: name.into(),
            brand,
            ..Default::default()
        }
    }

    /// Parse a configuration from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the robot name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the target brand.
    pub fn with_brand(mut self, brand: RobotBrand) -> Self {
        self.brand = brand;
        self
    }

    /// Set the initial settings.
    pub fn with_defaults(mut self, defaults: Settings) -> Self {
        self.defaults = defaults;
        self
    }

    /// Set the pose the chain is initialized with.
    pub fn with_initial_pose(mut self, pose: InitialPose) -> Self {
        self.initial_pose = Some(pose);
        self
    }
}

/// Flags controlling how a program is compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Compile only the next block instead of everything pending.
    pub use_block: bool,

    /// Write target values inside instructions instead of declaring them.
    pub inline_targets: bool,

    /// Annotate each instruction with the action description instead of its id.
    pub human_comments: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            use_block: false,
            inline_targets: true,
            human_comments: true,
        }
    }
}

impl CompileOptions {
    /// Compile one block at a time.
    pub fn with_block(mut self, use_block: bool) -> Self {
        self.use_block = use_block;
        self
    }

    /// Write targets inline instead of declaring them.
    pub fn with_inline_targets(mut self, inline_targets: bool) -> Self {
        self.inline_targets = inline_targets;
        self
    }

    /// Annotate lines with descriptions instead of ids.
    pub fn with_human_comments(mut self, human_comments: bool) -> Self {
        self.human_comments = human_comments;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MotionType;

    #[test]
    fn test_config_from_partial_json() {
        let config = RobotConfig::from_json(
            r#"{ "name": "arm", "brand": "Abb", "defaults": { "speed": 50.0, "motion_type": "Joint" } }"#,
        )
        .unwrap();

        assert_eq!(config.name, "arm");
        assert_eq!(config.brand, RobotBrand::Abb);
        assert_eq!(config.defaults.speed, 50.0);
        assert_eq!(config.defaults.precision, 5.0);
        assert_eq!(config.defaults.motion_type, MotionType::Joint);
        assert!(config.initial_pose.is_none());
    }

    #[test]
    fn test_config_bad_json() {
        assert!(RobotConfig::from_json("{ name: }").is_err());
    }

    #[test]
    fn test_compile_options_defaults() {
        let options = CompileOptions::default();
        assert!(!options.use_block);
        assert!(options.inline_targets);
        assert!(options.human_comments);

        let declared = options.with_inline_targets(false).with_human_comments(false);
        assert!(!declared.inline_targets);
        assert!(!declared.human_comments);
    }
}
