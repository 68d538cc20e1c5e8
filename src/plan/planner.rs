use crate::foundation::error::{AugmentError, AugmentResult};

const HORIZON_MODIFIERS: [&str; 2] = [
    "very far away on the horizon, appearing as a small, discreet dot",
    "distant on the horizon line, so that it is hard to make out",
];
const PROXIMITY_MODIFIERS: [&str; 2] = [
    "at mid-distance, with reflections on the water",
    "close to the sailboat",
];
const SIZE_MODIFIERS: [&str; 2] = [
    "at a small, discreet size",
    "at a large, prominent size",
];
const EDGE_MODIFIERS: [&str; 2] = [
    "partially visible at the left edge",
    "partially visible at the right edge",
];
const DEFAULT_MODIFIER: &str = "at a size and position that look realistic";

/// Placement modifiers enabled for an obstacle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ObstacleModifiers {
    /// Close to the principal subject.
    pub proximity: bool,
    /// Small or large rendering.
    pub size: bool,
    /// Cut off at an image edge.
    pub edge: bool,
    /// Small and far away on the horizon.
    pub horizon: bool,
}

/// One obstacle the user wants composited into the scene.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ObstacleSpec {
    /// Free-text obstacle name, e.g. "red navigation buoy".
    pub name: String,
    /// Number of prompts generated for this obstacle (>= 1).
    pub variations: u32,
    /// Enabled placement modifiers.
    #[serde(default)]
    pub modifiers: ObstacleModifiers,
}

impl ObstacleSpec {
    /// Obstacle with no modifiers enabled.
    pub fn new(name: impl Into<String>, variations: u32) -> Self {
        Self {
            name: name.into(),
            variations,
            modifiers: ObstacleModifiers::default(),
        }
    }

    /// Modifier phrases in pool order: horizon, proximity, size, edge.
    ///
    /// Falls back to a single generic placement phrase when no modifier is enabled.
    pub fn modifier_pool(&self) -> Vec<&'static str> {
        let m = self.modifiers;
        let mut pool = Vec::new();
        if m.horizon {
            pool.extend(HORIZON_MODIFIERS);
        }
        if m.proximity {
            pool.extend(PROXIMITY_MODIFIERS);
        }
        if m.size {
            pool.extend(SIZE_MODIFIERS);
        }
        if m.edge {
            pool.extend(EDGE_MODIFIERS);
        }
        if pool.is_empty() {
            pool.push(DEFAULT_MODIFIER);
        }
        pool
    }

    /// Expand into `variations` prompts, cycling through the modifier pool round-robin.
    pub fn prompts(&self) -> Vec<String> {
        let pool = self.modifier_pool();
        (0..self.variations as usize)
            .map(|i| obstacle_prompt(&self.name, pool[i % pool.len()]))
            .collect()
    }
}

fn obstacle_prompt(name: &str, modifier: &str) -> String {
    format!(
        "Realistically integrate a \"{name}\" into the scene. The addition must blend in \
         seamlessly, taking lighting, shadows and reflections on the water into account. \
         Place the obstacle {modifier}."
    )
}

/// Fully expanded job plan, computed before a run starts.
///
/// Execution order is: every image, then every scenario (or the single "no scenario" slot),
/// then one optional scenery job followed by every obstacle job.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JobPlan {
    /// Scenery prompts; empty when neither sea state nor scenarios were requested.
    pub scenario_prompts: Vec<String>,
    /// Obstacle prompts in execution order.
    pub obstacle_prompts: Vec<String>,
    /// Number of jobs the orchestrator will account for.
    pub total_jobs: u64,
    /// Whether a sea-state phrase took part in the scenario prompts.
    pub sea_state_requested: bool,
}

impl JobPlan {
    /// Scenario slots in execution order; `None` is the "keep original scenery" slot.
    pub fn scenario_slots(&self) -> Vec<Option<&str>> {
        if self.scenario_prompts.is_empty() {
            vec![None]
        } else {
            self.scenario_prompts.iter().map(|s| Some(s.as_str())).collect()
        }
    }

    /// Number of jobs planned per source image.
    pub fn jobs_per_image(&self) -> u64 {
        jobs_per_image(self.scenario_prompts.len(), self.obstacle_prompts.len())
    }

    /// Reject plans that would not produce any job.
    pub fn validate(&self, image_count: usize) -> AugmentResult<()> {
        if image_count == 0 {
            return Err(AugmentError::validation(
                "at least one source image is required",
            ));
        }
        if self.scenario_prompts.is_empty() && self.obstacle_prompts.is_empty() {
            return Err(AugmentError::validation(
                "at least one obstacle, scenario or sea state is required",
            ));
        }
        Ok(())
    }
}

fn jobs_per_image(scenarios: usize, obstacles: usize) -> u64 {
    let scenarios = scenarios as u64;
    scenarios + scenarios.max(1) * obstacles as u64
}

/// Split comma-separated scenario text into trimmed, non-empty entries.
pub fn parse_scenarios(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build the scenery prompt list from the sea-state phrase and free-text scenarios.
pub fn scenario_prompts(scenario_text: &str, sea_state_text: &str) -> Vec<String> {
    let scenarios = parse_scenarios(scenario_text);
    let sea_state = sea_state_text.trim();
    match (sea_state.is_empty(), scenarios.is_empty()) {
        (false, false) => scenarios
            .iter()
            .map(|s| format!("{sea_state} Additionally, scenario is {s}."))
            .collect(),
        (false, true) => vec![sea_state.to_string()],
        (true, false) => scenarios
            .iter()
            .map(|s| format!("Change the image scenery to \"{s}\"."))
            .collect(),
        (true, true) => Vec::new(),
    }
}

/// Expand user options into a deterministic [`JobPlan`].
///
/// Pure: no I/O, never fails. Empty inputs yield an empty plan.
pub fn plan(
    image_count: usize,
    obstacles: &[ObstacleSpec],
    scenario_text: &str,
    sea_state_text: &str,
) -> JobPlan {
    let scenario_prompts = scenario_prompts(scenario_text, sea_state_text);
    let obstacle_prompts: Vec<String> = obstacles.iter().flat_map(ObstacleSpec::prompts).collect();
    let total_jobs =
        image_count as u64 * jobs_per_image(scenario_prompts.len(), obstacle_prompts.len());
    JobPlan {
        scenario_prompts,
        obstacle_prompts,
        total_jobs,
        sea_state_requested: !sea_state_text.trim().is_empty(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/plan/planner.rs"]
mod tests;
