use serde::{Deserialize, Serialize};
use stacker_align::FailurePolicy;
use stacker_core::{stack_group_name, ObjectRef, DEFAULT_GROUP_PREFIX};
use stacker_offsets::is_element_name;
use std::{fs, path::Path};
use tracing::warn;

const DEFAULT_CONFIG_PATH: &str = "config/stacker.toml";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StackerConfig {
    /// Space in x between neighbouring stacks.
    pub gap: f64,
    /// Stacks built by `build` when no count is given.
    pub stack_count: usize,
    /// Stack groups are named `<prefix>001`, `<prefix>002`, ...
    pub group_prefix: String,
    /// Fixed RNG seed for reproducible piece selection.
    pub seed: Option<u64>,
    pub failure_policy: FailurePolicy,
}

impl Default for StackerConfig {
    fn default() -> Self {
        Self {
            gap: 1.0,
            stack_count: 1,
            group_prefix: DEFAULT_GROUP_PREFIX.to_string(),
            seed: None,
            failure_policy: FailurePolicy::Leave,
        }
    }
}

impl StackerConfig {
    /// Load configuration from the default path.
    pub fn load() -> Self {
        Self::load_from_path(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Load configuration from an explicit path, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<StackerConfig>(&contents) {
                Ok(cfg) => cfg.sanitized(),
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    StackerConfig::default()
                }
            },
            Err(err) => {
                if path != Path::new(DEFAULT_CONFIG_PATH)
                    || err.kind() != std::io::ErrorKind::NotFound
                {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                }
                StackerConfig::default()
            }
        }
    }

    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !self.gap.is_finite() || self.gap < 0.0 {
            warn!(gap = self.gap, "gap must be a finite, non-negative number; using {}", defaults.gap);
            self.gap = defaults.gap;
        }
        if self.stack_count == 0 {
            warn!("stack_count must be at least 1; using {}", defaults.stack_count);
            self.stack_count = defaults.stack_count;
        }
        // Group names double as element names in saved offset files.
        let first_group = stack_group_name(&self.group_prefix, 1);
        if !is_element_name(&first_group) || ObjectRef::parse(&first_group).is_err() {
            warn!(
                prefix = %self.group_prefix,
                "group_prefix must start with a letter or '_' and only use letters, digits, '_' or '-'; using {}",
                defaults.group_prefix
            );
            self.group_prefix = defaults.group_prefix;
        }
        self
    }
}
