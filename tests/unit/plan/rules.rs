use super::*;

#[test]
fn infrared_rule_matches_case_insensitively() {
    let rule = StyleRule::infrared();
    assert!(rule.matches("Change the scenery to \"Monochrome FLIR night view\"."));
    assert!(rule.matches("thermal infrared"));
    assert!(!rule.matches("sunny afternoon"));
}

#[test]
fn clauses_are_appended_only_when_triggered() {
    let rules = default_style_rules();
    let base = "Place a buoy.";
    assert_eq!(apply_style_rules(&rules, None, base), base);
    assert_eq!(apply_style_rules(&rules, Some("fog"), base), base);
    let out = apply_style_rules(&rules, Some("flir"), base);
    assert!(out.starts_with("Place a buoy. "));
    assert!(out.ends_with(&rules[0].clause));
}

#[test]
fn empty_keywords_never_match() {
    let rule = StyleRule {
        keywords: vec![String::new()],
        clause: "x".to_string(),
    };
    assert!(!rule.matches("anything"));
}
