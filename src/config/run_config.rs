use crate::foundation::core::{SeaState, SourceImage};
use crate::foundation::error::{AugmentError, AugmentResult};
use crate::perturb::transform::PerturbationConfig;
use crate::pipeline::orchestrator::RunOptions;
use crate::plan::planner::{JobPlan, ObstacleSpec, plan};
use crate::plan::rules::{StyleRule, default_style_rules};
use crate::service::command::CommandServiceConfig;
use crate::service::retry::RetryPolicy;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Retry settings as written in the configuration file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per call, including the first one.
    pub max_attempts: u32,
    /// Backoff before the second attempt, in milliseconds.
    pub initial_backoff_ms: u64,
    /// Upper bound of the random jitter, in milliseconds.
    pub max_jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff_ms: 2000,
            max_jitter_ms: 1000,
        }
    }
}

impl RetryConfig {
    /// Convert into the policy used by [`crate::service::retry::RetryingCaller`].
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_jitter: Duration::from_millis(self.max_jitter_ms),
        }
    }
}

/// Augmentation run boundary object.
///
/// Human-edited JSON document describing the source images, the requested variations and the
/// service helper. Relative image paths are resolved against the directory of the file it was
/// loaded from.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AugmentConfig {
    /// Source image files.
    pub images: Vec<PathBuf>,
    /// Obstacles to composite, in execution order.
    pub obstacles: Vec<ObstacleSpec>,
    /// Comma-separated free-text scenarios.
    pub scenarios: String,
    /// Sea-state preset (1..=4) applied to every scenery.
    pub sea_state: Option<SeaState>,
    /// Run the preservation check on every scenery result.
    pub verify_preservation: bool,
    /// Evaluate obstacle results for hard-example difficulty.
    pub harden_examples: bool,
    /// Degradations applied before results are stored.
    pub perturbation: PerturbationConfig,
    /// Base seed for noise and the exported `generation_seed`.
    pub seed: u64,
    /// Pause after every service call, in milliseconds.
    pub cooldown_ms: u64,
    /// Interval between animation status polls, in milliseconds.
    pub poll_interval_ms: u64,
    /// Backoff settings for rate-limited calls.
    pub retry: RetryConfig,
    /// Keyword rules appending style clauses to obstacle prompts.
    pub style_rules: Vec<StyleRule>,
    /// Helper program backing the generative service.
    pub service: CommandServiceConfig,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            images: Vec::new(),
            obstacles: Vec::new(),
            scenarios: String::new(),
            sea_state: None,
            verify_preservation: true,
            harden_examples: false,
            perturbation: PerturbationConfig::default(),
            seed: 0,
            cooldown_ms: 1500,
            poll_interval_ms: 10_000,
            retry: RetryConfig::default(),
            style_rules: default_style_rules(),
            service: CommandServiceConfig::default(),
            base_dir: None,
        }
    }
}

impl AugmentConfig {
    /// Parse a configuration from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> AugmentResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| AugmentError::validation(format!("parse run configuration JSON: {e}")))
    }

    /// Parse a configuration from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> AugmentResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            AugmentError::validation(format!("open run configuration '{}': {e}", path.display()))
        })?;
        let mut cfg = Self::from_reader(BufReader::new(f))?;
        cfg.base_dir = path.parent().map(Path::to_path_buf);
        Ok(cfg)
    }

    /// Check value ranges and required entries.
    pub fn validate(&self) -> AugmentResult<()> {
        if self.images.is_empty() {
            return Err(AugmentError::validation("no source images configured"));
        }
        for obstacle in &self.obstacles {
            if obstacle.name.trim().is_empty() {
                return Err(AugmentError::validation("obstacle name must not be empty"));
            }
            if obstacle.variations == 0 {
                return Err(AugmentError::validation(format!(
                    "obstacle '{}' must request at least one variation",
                    obstacle.name
                )));
            }
        }
        self.perturbation.validate()?;
        if self.retry.max_attempts == 0 {
            return Err(AugmentError::validation(
                "retry.max_attempts must be at least 1",
            ));
        }
        for rule in &self.style_rules {
            if rule.keywords.iter().all(|k| k.trim().is_empty()) {
                return Err(AugmentError::validation(format!(
                    "style rule '{}' has no keywords",
                    rule.clause
                )));
            }
        }
        Ok(())
    }

    /// Image paths with relative entries resolved against the configuration directory.
    pub fn image_paths(&self) -> Vec<PathBuf> {
        self.images
            .iter()
            .map(|p| match &self.base_dir {
                Some(dir) if p.is_relative() => dir.join(p),
                _ => p.clone(),
            })
            .collect()
    }

    /// Read every configured source image.
    pub fn load_images(&self) -> AugmentResult<Vec<Arc<SourceImage>>> {
        self.image_paths()
            .into_iter()
            .map(|p| SourceImage::from_path(p).map(Arc::new))
            .collect()
    }

    /// Expand the configured options into a job plan for `image_count` images.
    pub fn job_plan(&self, image_count: usize) -> JobPlan {
        let sea_state = self.sea_state.map(SeaState::prompt).unwrap_or_default();
        plan(image_count, &self.obstacles, &self.scenarios, sea_state)
    }

    /// Orchestrator options derived from this configuration.
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            verify_preservation: self.verify_preservation,
            harden_examples: self.harden_examples,
            perturbation: self.perturbation,
            cooldown: Duration::from_millis(self.cooldown_ms),
            style_rules: self.style_rules.clone(),
            seed: self.seed,
        }
    }

    /// Retry policy derived from `retry`.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.policy()
    }

    /// Animation poll interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/run_config.rs"]
mod tests;
