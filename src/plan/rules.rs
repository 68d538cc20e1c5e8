/// Keyword-triggered clause appended to obstacle prompts.
///
/// When the active scenario prompt contains any of `keywords` (case-insensitive), `clause` is
/// appended so the inserted obstacle matches the scenery's rendering style.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StyleRule {
    /// Lowercase substrings that activate the rule.
    pub keywords: Vec<String>,
    /// Text appended to the obstacle prompt.
    pub clause: String,
}

impl StyleRule {
    /// Built-in rule for infrared / night-vision scenery.
    pub fn infrared() -> Self {
        Self {
            keywords: vec![
                "flir".to_string(),
                "infrared".to_string(),
                "night vision".to_string(),
            ],
            clause: "The obstacle must be rendered in the same monochrome infrared night-vision \
                     (FLIR) style as the rest of the image."
                .to_string(),
        }
    }

    /// Return `true` when `scenario` triggers this rule.
    pub fn matches(&self, scenario: &str) -> bool {
        let scenario = scenario.to_lowercase();
        self.keywords
            .iter()
            .any(|k| !k.is_empty() && scenario.contains(&k.to_lowercase()))
    }
}

/// Default rule table.
pub fn default_style_rules() -> Vec<StyleRule> {
    vec![StyleRule::infrared()]
}

/// Append the clause of every rule triggered by `scenario` to `obstacle_prompt`.
pub fn apply_style_rules(
    rules: &[StyleRule],
    scenario: Option<&str>,
    obstacle_prompt: &str,
) -> String {
    let mut out = obstacle_prompt.to_string();
    let Some(scenario) = scenario else {
        return out;
    };
    for rule in rules.iter().filter(|r| r.matches(scenario)) {
        out.push(' ');
        out.push_str(&rule.clause);
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/plan/rules.rs"]
mod tests;
