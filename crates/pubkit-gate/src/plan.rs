//! Gate identifiers, modes and the ordered plan

use crate::error::GateError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// A release gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateId {
    Lint,
    Typecheck,
    Build,
    Seo,
    Performance,
    Security,
    I18n,
    /// Paper readiness of every registered paper
    Content,
}

impl GateId {
    /// All gates in default order
    pub const ALL: [GateId; 8] = [
        GateId::Lint,
        GateId::Typecheck,
        GateId::Build,
        GateId::Seo,
        GateId::Performance,
        GateId::Security,
        GateId::I18n,
        GateId::Content,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lint => "lint",
            Self::Typecheck => "typecheck",
            Self::Build => "build",
            Self::Seo => "seo",
            Self::Performance => "performance",
            Self::Security => "security",
            Self::I18n => "i18n",
            Self::Content => "content",
        }
    }
}

impl fmt::Display for GateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GateId {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GateError::UnknownGate(s.to_string()))
    }
}

/// Where the gate runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateMode {
    /// Every step runs
    #[default]
    Ci,
    /// Steps marked `ci_only` are skipped
    Local,
}

impl fmt::Display for GateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ci => "ci",
            Self::Local => "local",
        })
    }
}

impl FromStr for GateMode {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ci" => Ok(Self::Ci),
            "local" => Ok(Self::Local),
            _ => Err(GateError::UnknownMode(s.to_string())),
        }
    }
}

/// What a step does
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GateAction {
    /// External command; passes on exit status 0
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: BTreeMap<String, String>,
    },
    /// Check registered with the gate under the step's id
    Builtin,
}

impl GateAction {
    /// Command action from a program and its arguments
    pub fn command<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Command {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            env: BTreeMap::new(),
        }
    }
}

/// One entry of the plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateStep {
    pub id: GateId,
    pub action: GateAction,
    /// Skipped in [`GateMode::Local`]
    #[serde(default)]
    pub ci_only: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_timeout_secs() -> u64 {
    900
}

impl GateStep {
    pub fn new(id: GateId, action: GateAction) -> Self {
        Self {
            id,
            action,
            ci_only: false,
            timeout_secs: default_timeout_secs(),
        }
    }

    #[must_use]
    pub fn ci_only(mut self) -> Self {
        self.ci_only = true;
        self
    }

    #[must_use]
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Whether the step runs in `mode`
    #[inline]
    #[must_use]
    pub fn runs_in(&self, mode: GateMode) -> bool {
        mode == GateMode::Ci || !self.ci_only
    }
}

/// Ordered, duplicate-free list of steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GatePlan {
    steps: Vec<GateStep>,
}

impl GatePlan {
    /// Validate and wrap `steps`
    pub fn new(steps: Vec<GateStep>) -> Result<Self, GateError> {
        let mut seen = HashSet::new();
        for step in &steps {
            if !seen.insert(step.id) {
                return Err(GateError::DuplicateGate(step.id));
            }
        }
        Ok(Self { steps })
    }

    /// The site's standard gate sequence
    ///
    /// Lint, typecheck, build, performance and security shell out to npm
    /// tooling; seo, i18n and content are builtin checks.
    #[must_use]
    pub fn default_plan() -> Self {
        let steps = vec![
            GateStep::new(GateId::Lint, GateAction::command("npm", ["run", "lint"])),
            GateStep::new(GateId::Typecheck, GateAction::command("npm", ["run", "typecheck"])),
            GateStep::new(GateId::Build, GateAction::command("npm", ["run", "build"])),
            GateStep::new(GateId::Seo, GateAction::Builtin),
            GateStep::new(GateId::Performance, GateAction::command("npx", ["lhci", "autorun"])).ci_only(),
            GateStep::new(
                GateId::Security,
                GateAction::command("npm", ["audit", "--audit-level=high"]),
            )
            .ci_only(),
            GateStep::new(GateId::I18n, GateAction::Builtin),
            GateStep::new(GateId::Content, GateAction::Builtin),
        ];
        Self { steps }
    }

    pub fn steps(&self) -> &[GateStep] {
        &self.steps
    }

    pub fn get(&self, id: GateId) -> Option<&GateStep> {
        self.steps.iter().find(|s| s.id == id)
    }
}

impl Default for GatePlan {
    fn default() -> Self {
        Self::default_plan()
    }
}

impl<'de> Deserialize<'de> for GatePlan {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let steps = Vec::<GateStep>::deserialize(deserializer)?;
        Self::new(steps).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_plan_order() {
        let ids: Vec<_> = GatePlan::default_plan().steps().iter().map(|s| s.id).collect();
        assert_eq!(ids, GateId::ALL.to_vec());
    }

    #[test]
    fn local_mode_skips_ci_only_steps() {
        let plan = GatePlan::default_plan();
        let local: Vec<_> = plan
            .steps()
            .iter()
            .filter(|s| s.runs_in(GateMode::Local))
            .map(|s| s.id)
            .collect();
        assert!(!local.contains(&GateId::Performance));
        assert!(!local.contains(&GateId::Security));
        assert_eq!(local.len(), 6);
        assert!(plan.steps().iter().all(|s| s.runs_in(GateMode::Ci)));
    }

    #[test]
    fn duplicate_gate_rejected() {
        let step = GateStep::new(GateId::Lint, GateAction::Builtin);
        let err = GatePlan::new(vec![step.clone(), step]).unwrap_err();
        assert!(matches!(err, GateError::DuplicateGate(GateId::Lint)));
    }

    #[test]
    fn parses_ids_and_modes() {
        assert_eq!("I18N".parse::<GateId>().unwrap(), GateId::I18n);
        assert!("deploy".parse::<GateId>().is_err());
        assert_eq!("local".parse::<GateMode>().unwrap(), GateMode::Local);
        assert!("prod".parse::<GateMode>().is_err());
    }

    #[test]
    fn plan_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            steps: GatePlan,
        }
        let text = r#"
[[steps]]
id = "lint"
action = { kind = "command", program = "cargo", args = ["clippy"] }

[[steps]]
id = "content"
action = { kind = "builtin" }
timeout_secs = 60
"#;
        let plan = toml::from_str::<Wrapper>(text).unwrap().steps;
        assert_eq!(plan.steps().len(), 2);
        assert_eq!(plan.get(GateId::Content).unwrap().timeout_secs, 60);
        assert_eq!(plan.get(GateId::Lint).unwrap().timeout_secs, 900);

        let dup = "[[steps]]\nid = \"lint\"\naction = { kind = \"builtin\" }\n[[steps]]\nid = \"lint\"\naction = { kind = \"builtin\" }\n";
        assert!(toml::from_str::<Wrapper>(dup).is_err());
    }
}
