use super::*;

const MINIMAL: &str = r#"{
    "images": ["boat.png"],
    "obstacles": [{ "name": "buoy", "variations": 2 }],
    "service": { "program": "edit-helper" }
}"#;

#[test]
fn minimal_document_uses_defaults() {
    let cfg = AugmentConfig::from_reader(MINIMAL.as_bytes()).unwrap();
    cfg.validate().unwrap();

    assert!(cfg.verify_preservation);
    assert!(!cfg.harden_examples);
    assert_eq!(cfg.seed, 0);
    assert_eq!(cfg.retry_policy(), RetryPolicy::default());
    assert_eq!(cfg.poll_interval(), Duration::from_secs(10));

    let opts = cfg.run_options();
    assert_eq!(opts.cooldown, Duration::from_millis(1500));
    assert_eq!(opts.style_rules, default_style_rules());
}

#[test]
fn plan_combines_sea_state_and_scenarios() {
    let mut cfg = AugmentConfig::from_reader(MINIMAL.as_bytes()).unwrap();
    cfg.sea_state = Some(SeaState::Rough);
    cfg.scenarios = "dusk, fog".to_string();

    let plan = cfg.job_plan(3);
    assert!(plan.sea_state_requested);
    assert_eq!(plan.scenario_prompts.len(), 2);
    assert!(plan.scenario_prompts[1].starts_with(SeaState::Rough.prompt()));
    assert!(plan.scenario_prompts[1].ends_with("Additionally, scenario is fog."));
    // 2 scenery jobs plus 2 scenarios x 2 obstacle prompts, per image.
    assert_eq!(plan.total_jobs, 3 * (2 + 4));
}

#[test]
fn sea_state_level_is_checked_while_parsing() {
    let doc = r#"{ "images": ["a.png"], "sea_state": 7 }"#;
    let err = AugmentConfig::from_reader(doc.as_bytes()).unwrap_err();
    assert!(err.to_string().contains("sea state must be 1..=4"));
}

#[test]
fn unknown_fields_are_rejected() {
    let doc = r#"{ "images": ["a.png"], "cooldown": 3 }"#;
    assert!(AugmentConfig::from_reader(doc.as_bytes()).is_err());
}

#[test]
fn validate_rejects_bad_values() {
    let base = AugmentConfig::from_reader(MINIMAL.as_bytes()).unwrap();

    let mut cfg = base.clone();
    cfg.obstacles[0].variations = 0;
    assert!(cfg.validate().is_err());

    let mut cfg = base.clone();
    cfg.retry.max_attempts = 0;
    assert!(cfg.validate().is_err());

    let mut cfg = base.clone();
    cfg.perturbation.noise_level = Some(300.0);
    assert!(cfg.validate().is_err());

    let mut cfg = base.clone();
    cfg.style_rules.push(StyleRule {
        keywords: vec![" ".to_string()],
        clause: "x".to_string(),
    });
    assert!(cfg.validate().is_err());

    let mut cfg = base;
    cfg.images.clear();
    assert!(cfg.validate().is_err());
}

#[test]
fn relative_images_resolve_against_config_dir() {
    let dir = std::env::temp_dir().join(format!("sea-augment-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("run.json");
    std::fs::write(&path, MINIMAL).unwrap();

    let cfg = AugmentConfig::from_path(&path).unwrap();
    assert_eq!(cfg.image_paths(), vec![dir.join("boat.png")]);

    let _ = std::fs::remove_dir_all(&dir);
}
