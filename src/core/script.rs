//! Bundled narrative-script interpreter.
//!
//! A script is a RON document of named knots, each an ordered list of
//! steps. [`ScriptedStory`] runs a script behind the [`StoryRuntime`] trait,
//! with independently resumable flows and a RON state snapshot.

use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::{Captures, Regex};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;
use std::cell::RefCell;

use crate::core::host::{DialogueContext, HostCall, NoHost, SharedHost};
use crate::core::runtime::{
    Diagnostic, Severity, StoryChoice, StoryError, StoryRuntime, DEFAULT_FLOW_NAME,
};
use crate::schema::value::Value;

/// Upper bound on non-content steps run between two lines.
const MAX_SETTLE_STEPS: usize = 10_000;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid placeholder regex"));

/// One option inside a `Choices` step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceSpec {
    pub text: String,
    /// Knot to continue at; `None` continues after the `Choices` step.
    #[serde(default)]
    pub divert: Option<String>,
}

/// A single instruction in a knot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Step {
    /// Yield a line; `{var}` placeholders are expanded.
    Line(String),
    /// Yield one of the alternatives, picked by the seeded RNG.
    Shuffle(Vec<String>),
    Divert(String),
    Choices(Vec<ChoiceSpec>),
    Set(String, Value),
    /// Call the host, optionally storing the result in a variable.
    Call(HostCall, Option<String>),
    /// Divert to the knot when the variable equals the value.
    When(String, Value, String),
    End,
}

/// A problem found by [`Script::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptIssue {
    pub severity: Severity,
    pub knot: String,
    pub message: String,
}

/// A parsed narrative script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub variables: BTreeMap<String, Value>,
    pub knots: FxHashMap<String, Vec<Step>>,
}

impl Script {
    /// Load a script from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<Script, StoryError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a script from a RON string.
    pub fn parse_ron(input: &str) -> Result<Script, StoryError> {
        Ok(ron::from_str(input)?)
    }

    pub fn has_knot(&self, name: &str) -> bool {
        self.knots.contains_key(name)
    }

    /// Knots no divert or choice points at. These are only reachable as
    /// entry paths.
    pub fn entry_knots(&self) -> Vec<&str> {
        let mut referenced = FxHashSet::default();
        for steps in self.knots.values() {
            for step in steps {
                match step {
                    Step::Divert(target) | Step::When(_, _, target) => {
                        referenced.insert(target.as_str());
                    }
                    Step::Choices(specs) => {
                        referenced.extend(specs.iter().filter_map(|s| s.divert.as_deref()));
                    }
                    _ => {}
                }
            }
        }
        let mut entries: Vec<&str> = self
            .knots
            .keys()
            .map(String::as_str)
            .filter(|k| !referenced.contains(k))
            .collect();
        entries.sort_unstable();
        entries
    }

    /// Check the script for broken references and suspicious content.
    pub fn validate(&self) -> Vec<ScriptIssue> {
        let mut issues = Vec::new();
        let mut names: Vec<&String> = self.knots.keys().collect();
        names.sort();

        for name in names {
            let steps = &self.knots[name];
            let mut report = |severity, message: String| {
                issues.push(ScriptIssue {
                    severity,
                    knot: name.clone(),
                    message,
                })
            };

            if steps.is_empty() {
                report(Severity::Warning, "knot is empty".to_string());
            }

            for (i, step) in steps.iter().enumerate() {
                match step {
                    Step::Divert(target) | Step::When(_, _, target) if !self.has_knot(target) => {
                        report(
                            Severity::Error,
                            format!("step {}: divert to unknown knot '{}'", i, target),
                        );
                    }
                    Step::Shuffle(options) if options.is_empty() => {
                        report(Severity::Error, format!("step {}: shuffle has no options", i));
                    }
                    Step::Choices(specs) if specs.is_empty() => {
                        report(Severity::Error, format!("step {}: choice list is empty", i));
                    }
                    Step::Choices(specs) => {
                        for spec in specs {
                            if let Some(target) = &spec.divert {
                                if !self.has_knot(target) {
                                    report(
                                        Severity::Error,
                                        format!(
                                            "step {}: choice '{}' diverts to unknown knot '{}'",
                                            i, spec.text, target
                                        ),
                                    );
                                }
                            }
                            if crate::core::classifier::strip_player_prefix(&spec.text)
                                .trim()
                                .is_empty()
                            {
                                report(Severity::Warning, format!("step {}: choice has no text", i));
                            }
                        }
                    }
                    _ => {}
                }

                let variable = match step {
                    Step::When(var, _, _) => Some(var),
                    Step::Call(_, Some(var)) => Some(var),
                    _ => None,
                };
                if let Some(var) = variable {
                    if !self.variables.contains_key(var) && !self.sets_variable(var) {
                        report(
                            Severity::Warning,
                            format!("step {}: variable '{}' is never declared or set", i, var),
                        );
                    }
                }
            }
        }
        issues
    }

    fn sets_variable(&self, name: &str) -> bool {
        self.knots
            .values()
            .flatten()
            .any(|step| matches!(step, Step::Set(var, _) if var == name))
    }
}

/// Expand `{var}` placeholders. Returns the text and any unknown names;
/// unknown placeholders are left untouched.
fn expand_placeholders(variables: &BTreeMap<String, Value>, text: &str) -> (String, Vec<String>) {
    let mut missing = Vec::new();
    let expanded = PLACEHOLDER.replace_all(text, |caps: &Captures<'_>| {
        match variables.get(&caps[1]) {
            Some(value) => value.to_string(),
            None => {
                missing.push(caps[1].to_string());
                caps[0].to_string()
            }
        }
    });
    (expanded.into_owned(), missing)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Pointer {
    knot: String,
    index: usize,
}

impl Pointer {
    fn entry(knot: &str) -> Self {
        Self {
            knot: knot.to_string(),
            index: 0,
        }
    }

    fn advanced(&self) -> Self {
        Self {
            knot: self.knot.clone(),
            index: self.index + 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PendingChoice {
    text: String,
    target: Pointer,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct FlowState {
    /// Set once the flow has been pointed at an entry path.
    started: bool,
    pointer: Option<Pointer>,
    choices: Vec<PendingChoice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StoryState {
    current_flow: String,
    flows: BTreeMap<String, FlowState>,
    variables: BTreeMap<String, Value>,
    turn: u64,
}

impl StoryState {
    fn initial(script: &Script) -> Self {
        let mut flows = BTreeMap::new();
        flows.insert(DEFAULT_FLOW_NAME.to_string(), FlowState::default());
        Self {
            current_flow: DEFAULT_FLOW_NAME.to_string(),
            flows,
            variables: script.variables.clone(),
            turn: 0,
        }
    }
}

/// A running script.
pub struct ScriptedStory {
    script: Script,
    state: StoryState,
    host: SharedHost,
    context: Option<DialogueContext>,
    diagnostics: Vec<Diagnostic>,
}

impl std::fmt::Debug for ScriptedStory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedStory")
            .field("current_flow", &self.state.current_flow)
            .field("flows", &self.state.flows.len())
            .field("knots", &self.script.knots.len())
            .finish()
    }
}

impl ScriptedStory {
    /// Run `script` without host capabilities.
    pub fn new(script: Script) -> Self {
        Self::with_host(script, Rc::new(RefCell::new(NoHost)))
    }

    pub fn with_host(script: Script, host: SharedHost) -> Self {
        let state = StoryState::initial(&script);
        Self {
            script,
            state,
            host,
            context: None,
            diagnostics: Vec::new(),
        }
    }

    pub fn parse_ron(input: &str) -> Result<Self, StoryError> {
        Ok(Self::new(Script::parse_ron(input)?))
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn set_context(&mut self, context: Option<DialogueContext>) {
        self.context = context;
    }

    pub fn context(&self) -> Option<&DialogueContext> {
        self.context.as_ref()
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.state.variables.get(name)
    }

    /// Assign a variable the script already knows about.
    pub fn set_variable(&mut self, name: &str, value: Value) -> Result<(), StoryError> {
        match self.state.variables.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(StoryError::UnknownVariable(name.to_string())),
        }
    }

    /// Names of every flow holding execution state.
    pub fn flow_names(&self) -> Vec<&str> {
        self.state
            .flows
            .iter()
            .filter(|(_, flow)| flow.started)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Export the full runtime state as RON.
    pub fn save_state(&self) -> Result<String, StoryError> {
        Ok(ron::to_string(&self.state)?)
    }

    /// Replace the runtime state with a snapshot from [`Self::save_state`].
    pub fn load_state(&mut self, snapshot: &str) -> Result<(), StoryError> {
        let mut state: StoryState = ron::from_str(snapshot)?;
        state
            .flows
            .entry(DEFAULT_FLOW_NAME.to_string())
            .or_default();
        state.flows.entry(state.current_flow.clone()).or_default();
        self.state = state;
        Ok(())
    }

    fn current_flow(&self) -> Option<&FlowState> {
        self.state.flows.get(&self.state.current_flow)
    }

    fn flow_mut(&mut self) -> &mut FlowState {
        let name = self.state.current_flow.clone();
        self.state.flows.entry(name).or_default()
    }

    fn entry_pointer(&self, knot: &str) -> Result<Pointer, StoryError> {
        if self.script.has_knot(knot) {
            Ok(Pointer::entry(knot))
        } else {
            Err(StoryError::UnknownPath(knot.to_string()))
        }
    }

    fn step_at(&self, pointer: &Pointer) -> Result<Option<Step>, StoryError> {
        let steps = self
            .script
            .knots
            .get(&pointer.knot)
            .ok_or_else(|| StoryError::UnknownPath(pointer.knot.clone()))?;
        Ok(steps.get(pointer.index).cloned())
    }

    fn interpolate(&mut self, text: &str) -> String {
        let (expanded, missing) = expand_placeholders(&self.state.variables, text);
        for name in missing {
            self.diagnostics.push(Diagnostic::warning(format!(
                "unknown variable '{}' in text",
                name
            )));
        }
        expanded
    }

    /// Run non-content steps until the pointer rests on a line, a choice
    /// point, or the end of the flow.
    fn settle(&mut self) -> Result<(), StoryError> {
        for _ in 0..MAX_SETTLE_STEPS {
            let Some(pointer) = self.flow_mut().pointer.clone() else {
                return Ok(());
            };
            let next = match self.step_at(&pointer)? {
                None | Some(Step::End) => None,
                Some(Step::Shuffle(options)) if options.is_empty() => {
                    self.diagnostics.push(Diagnostic::warning(format!(
                        "empty shuffle in '{}' skipped",
                        pointer.knot
                    )));
                    Some(pointer.advanced())
                }
                Some(Step::Line(_)) | Some(Step::Shuffle(_)) => return Ok(()),
                Some(Step::Divert(target)) => Some(self.entry_pointer(&target)?),
                Some(Step::Choices(specs)) => {
                    let resume = pointer.advanced();
                    let mut choices = Vec::with_capacity(specs.len());
                    for spec in specs {
                        let target = match &spec.divert {
                            Some(knot) => self.entry_pointer(knot)?,
                            None => resume.clone(),
                        };
                        choices.push(PendingChoice {
                            text: spec.text,
                            target,
                        });
                    }
                    self.flow_mut().choices = choices;
                    None
                }
                Some(Step::Set(name, value)) => {
                    self.state.variables.insert(name, value);
                    Some(pointer.advanced())
                }
                Some(Step::Call(call, into)) => {
                    let result = {
                        let variables = &self.state.variables;
                        let mut host = self.host.borrow_mut();
                        call.invoke(&mut *host, self.context.as_ref(), |s| {
                            expand_placeholders(variables, s).0
                        })
                    };
                    if let (Some(name), Some(value)) = (into, result) {
                        self.state.variables.insert(name, value);
                    }
                    Some(pointer.advanced())
                }
                Some(Step::When(name, expected, target)) => match self.state.variables.get(&name) {
                    Some(value) if *value == expected => Some(self.entry_pointer(&target)?),
                    Some(_) => Some(pointer.advanced()),
                    None => {
                        self.diagnostics.push(Diagnostic::warning(format!(
                            "condition on unknown variable '{}'",
                            name
                        )));
                        Some(pointer.advanced())
                    }
                },
            };
            self.flow_mut().pointer = next;
        }
        Err(StoryError::Malformed(format!(
            "no content reached after {} steps",
            MAX_SETTLE_STEPS
        )))
    }
}

impl StoryRuntime for ScriptedStory {
    fn can_continue(&self) -> bool {
        self.current_flow().is_some_and(|flow| flow.pointer.is_some())
    }

    fn continue_line(&mut self) -> Result<String, StoryError> {
        let pointer = self
            .current_flow()
            .and_then(|flow| flow.pointer.clone())
            .ok_or(StoryError::CannotContinue)?;
        let raw = match self.step_at(&pointer)? {
            Some(Step::Line(text)) => text,
            Some(Step::Shuffle(options)) if !options.is_empty() => {
                let mut rng =
                    StdRng::seed_from_u64(self.script.seed.wrapping_add(self.state.turn));
                self.state.turn += 1;
                options[rng.gen_range(0..options.len())].clone()
            }
            _ => return Err(StoryError::CannotContinue),
        };
        let line = self.interpolate(&raw);
        self.flow_mut().pointer = Some(pointer.advanced());
        self.settle()?;
        Ok(line)
    }

    fn current_choices(&self) -> Vec<StoryChoice> {
        self.current_flow()
            .map(|flow| {
                flow.choices
                    .iter()
                    .map(|choice| StoryChoice {
                        text: expand_placeholders(&self.state.variables, &choice.text).0,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn choose_choice(&mut self, index: usize) -> Result<(), StoryError> {
        let flow = self.flow_mut();
        let count = flow.choices.len();
        let Some(choice) = flow.choices.get(index) else {
            return Err(StoryError::ChoiceOutOfRange { index, count });
        };
        flow.pointer = Some(choice.target.clone());
        flow.choices.clear();
        self.settle()
    }

    fn current_flow_name(&self) -> &str {
        &self.state.current_flow
    }

    fn is_flow_alive(&self, name: &str) -> bool {
        let key = if self.is_default_flow(name) {
            DEFAULT_FLOW_NAME
        } else {
            name
        };
        self.state.flows.get(key).is_some_and(|flow| flow.started)
    }

    fn switch_flow(&mut self, name: &str) -> Result<(), StoryError> {
        if self.is_default_flow(name) {
            return self.switch_to_default_flow();
        }
        if name.trim().is_empty() {
            return Err(StoryError::InvalidFlowName(name.to_string()));
        }
        self.state.flows.entry(name.to_string()).or_default();
        self.state.current_flow = name.to_string();
        Ok(())
    }

    fn switch_to_default_flow(&mut self) -> Result<(), StoryError> {
        self.state.current_flow = DEFAULT_FLOW_NAME.to_string();
        self.flow_mut();
        Ok(())
    }

    fn remove_flow(&mut self, name: &str) -> Result<(), StoryError> {
        if self.is_default_flow(name) {
            return Err(StoryError::RemoveDefaultFlow);
        }
        if self.state.flows.remove(name).is_none() {
            return Err(StoryError::UnknownFlow(name.to_string()));
        }
        if self.state.current_flow == name {
            self.switch_to_default_flow()?;
        }
        Ok(())
    }

    fn reset_state(&mut self) -> Result<(), StoryError> {
        self.state = StoryState::initial(&self.script);
        Ok(())
    }

    fn choose_path(&mut self, path: &str) -> Result<(), StoryError> {
        let entry = self.entry_pointer(path)?;
        let flow = self.flow_mut();
        flow.started = true;
        flow.choices.clear();
        flow.pointer = Some(entry);
        self.settle()
    }

    fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMITH: &str = r#"(
        seed: 7,
        variables: { "met": Bool(false), "npc_id": String("") },
        knots: {
            "smith_start": [
                When("met", Bool(true), "smith_again"),
                Set("met", Bool(true)),
                Line("Welcome to my forge."),
                Line("p: Thanks."),
                Choices([
                    (text: "p: Buy a sword", divert: Some("smith_buy")),
                    (text: "p: Just looking"),
                ]),
                Line("Suit yourself."),
            ],
            "smith_again": [
                Line("Back again?"),
                End,
                Line("never reached"),
            ],
            "smith_buy": [
                Shuffle(["Fine choice.", "A sturdy blade."]),
                Divert("smith_bye"),
            ],
            "smith_bye": [
                Line("Goodbye, {npc_id}."),
            ],
        },
    )"#;

    fn story() -> ScriptedStory {
        ScriptedStory::parse_ron(SMITH).unwrap()
    }

    fn drain(story: &mut ScriptedStory) -> Vec<String> {
        let mut lines = Vec::new();
        while story.can_continue() {
            lines.push(story.continue_line().unwrap());
        }
        lines
    }

    #[test]
    fn fresh_story_cannot_continue() {
        let mut s = story();
        assert!(!s.can_continue());
        assert!(matches!(s.continue_line(), Err(StoryError::CannotContinue)));
        assert!(s.current_choices().is_empty());
    }

    #[test]
    fn runs_until_choices() {
        let mut s = story();
        s.choose_path("smith_start").unwrap();
        assert_eq!(drain(&mut s), vec!["Welcome to my forge.", "p: Thanks."]);
        let choices = s.current_choices();
        assert_eq!(choices.len(), 2);
        assert_eq!(choices[0].text, "p: Buy a sword");
        assert_eq!(s.variable("met"), Some(&Value::Bool(true)));
    }

    #[test]
    fn choice_without_divert_resumes_after_choices() {
        let mut s = story();
        s.choose_path("smith_start").unwrap();
        drain(&mut s);
        s.choose_choice(1).unwrap();
        assert_eq!(drain(&mut s), vec!["Suit yourself."]);
        assert!(s.current_choices().is_empty());
    }

    #[test]
    fn choice_with_divert_and_shuffle() {
        let mut s = story();
        s.set_variable("npc_id", Value::from("smith-01")).unwrap();
        s.choose_path("smith_start").unwrap();
        drain(&mut s);
        s.choose_choice(0).unwrap();
        let lines = drain(&mut s);
        assert_eq!(lines.len(), 2);
        assert!(lines[0] == "Fine choice." || lines[0] == "A sturdy blade.");
        assert_eq!(lines[1], "Goodbye, smith-01.");
    }

    #[test]
    fn choice_out_of_range() {
        let mut s = story();
        s.choose_path("smith_start").unwrap();
        drain(&mut s);
        assert!(matches!(
            s.choose_choice(5),
            Err(StoryError::ChoiceOutOfRange { index: 5, count: 2 })
        ));
        assert_eq!(s.current_choices().len(), 2);
    }

    #[test]
    fn when_diverts_on_match_and_end_stops() {
        let mut s = story();
        s.choose_path("smith_start").unwrap();
        drain(&mut s);
        s.choose_path("smith_start").unwrap();
        assert_eq!(drain(&mut s), vec!["Back again?"]);
    }

    #[test]
    fn unknown_path_rejected() {
        let mut s = story();
        assert!(matches!(
            s.choose_path("nowhere"),
            Err(StoryError::UnknownPath(p)) if p == "nowhere"
        ));
    }

    #[test]
    fn flows_are_independent() {
        let mut s = story();
        s.switch_flow("smith").unwrap();
        assert_eq!(s.current_flow_name(), "smith");
        assert!(!s.is_flow_alive("smith"));
        s.choose_path("smith_start").unwrap();
        assert!(s.is_flow_alive("smith"));
        s.continue_line().unwrap();

        s.switch_to_default_flow().unwrap();
        assert!(s.current_flow_is_default());
        assert!(!s.can_continue());

        s.switch_flow("smith").unwrap();
        assert_eq!(s.continue_line().unwrap(), "p: Thanks.");
    }

    #[test]
    fn remove_flow_rules() {
        let mut s = story();
        assert!(matches!(s.remove_flow(DEFAULT_FLOW_NAME), Err(StoryError::RemoveDefaultFlow)));
        assert!(matches!(s.remove_flow("ghost"), Err(StoryError::UnknownFlow(_))));
        s.switch_flow("smith").unwrap();
        s.choose_path("smith_start").unwrap();
        s.remove_flow("smith").unwrap();
        assert!(s.current_flow_is_default());
        assert!(!s.is_flow_alive("smith"));
    }

    #[test]
    fn reset_restores_variables_and_flows() {
        let mut s = story();
        s.switch_flow("smith").unwrap();
        s.choose_path("smith_start").unwrap();
        s.reset_state().unwrap();
        assert_eq!(s.variable("met"), Some(&Value::Bool(false)));
        assert!(s.current_flow_is_default());
        assert!(s.flow_names().is_empty());
    }

    #[test]
    fn set_unknown_variable_fails() {
        let mut s = story();
        assert!(matches!(
            s.set_variable("gold", Value::Int(1)),
            Err(StoryError::UnknownVariable(_))
        ));
    }

    #[test]
    fn save_and_load_state() {
        let mut s = story();
        s.switch_flow("smith").unwrap();
        s.choose_path("smith_start").unwrap();
        s.continue_line().unwrap();
        let snapshot = s.save_state().unwrap();

        let mut restored = story();
        restored.load_state(&snapshot).unwrap();
        assert_eq!(restored.current_flow_name(), "smith");
        assert_eq!(restored.continue_line().unwrap(), "p: Thanks.");
        assert_eq!(restored.variable("met"), Some(&Value::Bool(true)));
    }

    #[test]
    fn unknown_placeholder_warns() {
        let mut s = ScriptedStory::parse_ron(
            r#"(knots: { "a": [Line("Hi {who}.")] })"#,
        )
        .unwrap();
        s.choose_path("a").unwrap();
        assert_eq!(s.continue_line().unwrap(), "Hi {who}.");
        let diags = s.take_diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Warning);
        assert!(s.take_diagnostics().is_empty());
    }

    #[test]
    fn divert_loop_is_malformed() {
        let mut s = ScriptedStory::parse_ron(
            r#"(knots: { "a": [Divert("b")], "b": [Divert("a")] })"#,
        )
        .unwrap();
        assert!(matches!(s.choose_path("a"), Err(StoryError::Malformed(_))));
    }

    #[test]
    fn host_call_stores_result() {
        let mut s = ScriptedStory::parse_ron(
            r#"(
                variables: { "name": String("") },
                knots: { "a": [Call(NpcName, Some("name")), Line("I am {name}.")] },
            )"#,
        )
        .unwrap();
        s.set_context(Some(DialogueContext {
            npc_name: "Mira".to_string(),
            npc_id: None,
        }));
        s.choose_path("a").unwrap();
        assert_eq!(s.continue_line().unwrap(), "I am Mira.");
    }

    #[test]
    fn validate_reports_broken_references() {
        let script = Script::parse_ron(
            r#"(knots: {
                "a": [Divert("missing"), Choices([(text: "p: ", divert: Some("gone"))])],
                "b": [],
                "c": [Shuffle([]), When("flag", Bool(true), "a")],
            })"#,
        )
        .unwrap();
        let issues = script.validate();
        let errors = issues.iter().filter(|i| i.severity == Severity::Error).count();
        let warnings = issues.iter().filter(|i| i.severity == Severity::Warning).count();
        assert_eq!(errors, 3);
        assert_eq!(warnings, 3);
        assert_eq!(script.entry_knots(), vec!["b", "c"]);
    }

    #[test]
    fn load_fixture_script() {
        let path = std::path::PathBuf::from("tests/fixtures/tavern.ron");
        let script = Script::load_from_ron(&path).unwrap();
        assert!(script.has_knot("mira_start"));
        assert!(script
            .validate()
            .iter()
            .all(|issue| issue.severity != Severity::Error));
    }
}
