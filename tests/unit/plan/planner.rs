use super::*;
use crate::foundation::core::SeaState;

fn spec_with(modifiers: ObstacleModifiers, variations: u32) -> ObstacleSpec {
    ObstacleSpec {
        name: "buoy".to_string(),
        variations,
        modifiers,
    }
}

#[test]
fn empty_inputs_yield_empty_plan() {
    let p = plan(3, &[], "", "");
    assert!(p.scenario_prompts.is_empty());
    assert!(p.obstacle_prompts.is_empty());
    assert_eq!(p.total_jobs, 0);
    assert_eq!(p.scenario_slots(), vec![None]);
    assert!(p.validate(3).is_err());
}

#[test]
fn sea_state_combines_with_each_scenario() {
    let sea = SeaState::Slight.prompt();
    let p = plan(1, &[], "fog", sea);
    assert_eq!(
        p.scenario_prompts,
        vec![format!("{sea} Additionally, scenario is fog.")]
    );
    assert!(p.sea_state_requested);

    let p = plan(1, &[], "fog, rain ,", sea);
    assert_eq!(p.scenario_prompts.len(), 2);
    assert!(p.scenario_prompts[1].ends_with("Additionally, scenario is rain."));
}

#[test]
fn sea_state_alone_is_a_single_prompt() {
    let sea = SeaState::Rough.prompt();
    let p = plan(1, &[], "  ", sea);
    assert_eq!(p.scenario_prompts, vec![sea.to_string()]);
}

#[test]
fn scenarios_alone_are_plain_prompts() {
    let p = plan(1, &[], "sunset, dense fog", "");
    assert_eq!(
        p.scenario_prompts,
        vec![
            "Change the image scenery to \"sunset\".".to_string(),
            "Change the image scenery to \"dense fog\".".to_string(),
        ]
    );
    assert!(!p.sea_state_requested);
}

#[test]
fn modifiers_cycle_round_robin() {
    let modifiers = ObstacleModifiers {
        proximity: true,
        size: true,
        edge: false,
        horizon: true,
    };
    let spec = spec_with(modifiers, 8);
    let pool = spec.modifier_pool();
    assert_eq!(pool.len(), 6);
    assert_eq!(pool[0], HORIZON_MODIFIERS[0]);
    assert_eq!(pool[2], PROXIMITY_MODIFIERS[0]);

    let prompts = spec.prompts();
    assert_eq!(prompts.len(), pool.len() + 2);
    let expected: Vec<usize> = vec![0, 1, 2, 3, 4, 5, 0, 1];
    for (prompt, idx) in prompts.iter().zip(expected) {
        assert!(prompt.ends_with(&format!("Place the obstacle {}.", pool[idx])));
    }
}

#[test]
fn no_modifiers_fall_back_to_realistic_placement() {
    let spec = ObstacleSpec::new("log", 3);
    assert_eq!(spec.modifier_pool(), vec![DEFAULT_MODIFIER]);
    let prompts = spec.prompts();
    assert_eq!(prompts.len(), 3);
    assert!(prompts.iter().all(|p| p.contains("\"log\"")));
    assert!(prompts.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn total_counts_scenery_once_per_scenario_and_obstacles_per_scenario() {
    let obstacles = vec![ObstacleSpec::new("buoy", 2), ObstacleSpec::new("kayak", 1)];

    let p = plan(2, &obstacles, "fog, rain", "");
    assert_eq!(p.obstacle_prompts.len(), 3);
    assert_eq!(p.total_jobs, 2 * 2 * (1 + 3));
    assert_eq!(p.jobs_per_image(), 8);

    let p = plan(2, &obstacles, "", "");
    assert_eq!(p.total_jobs, 2 * 3);

    let p = plan(4, &[], "fog", "");
    assert_eq!(p.total_jobs, 4);
}

#[test]
fn validation_requires_images() {
    let p = plan(0, &[ObstacleSpec::new("buoy", 1)], "", "");
    assert!(p.validate(0).is_err());
    assert!(p.validate(1).is_ok());
}
