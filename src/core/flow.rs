//! Flow and entry-path selection at the start of a conversation.

use crate::core::runtime::{StoryError, StoryRuntime};
use crate::schema::actor::{ActorProfile, StartOption};

/// What preparing a story for a conversation actually did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preparation {
    pub reset_state: bool,
    pub switched_flow: bool,
    /// The entry path jumped to, if any.
    pub jumped_to: Option<String>,
}

/// Whether a session should jump to the configured start path.
///
/// Reset and from-start options always jump; the continue options jump
/// only into a flow with no recorded execution state.
pub fn should_jump(option: StartOption, flow_was_alive: bool) -> bool {
    match option {
        StartOption::AlwaysResetStory | StartOption::AlwaysFromStartPath => true,
        StartOption::Continue | StartOption::ContinueAndLoop => !flow_was_alive,
    }
}

/// Reset, switch flow and jump as the actor's start option demands.
///
/// Any engine rejection fails the whole preparation.
pub fn prepare_story(
    story: &mut dyn StoryRuntime,
    profile: &ActorProfile,
) -> Result<Preparation, StoryError> {
    prepare_story_with(story, profile, |_| {})
}

/// Like [`prepare_story`], running `before_entry` once the flow is selected
/// and before the entry path starts executing. Variables the entry path
/// reads belong there.
pub fn prepare_story_with<S, F>(
    story: &mut S,
    profile: &ActorProfile,
    before_entry: F,
) -> Result<Preparation, StoryError>
where
    S: StoryRuntime + ?Sized,
    F: FnOnce(&mut S),
{
    let mut prep = Preparation::default();

    if profile.start_option == StartOption::AlwaysResetStory {
        tracing::info!(actor = %profile.name, "resetting story state");
        story.reset_state()?;
        prep.reset_state = true;
    }

    let target = profile.flow_name();
    let was_alive = story.is_flow_alive(target);

    if story.is_default_flow(target) {
        if !story.current_flow_is_default() {
            tracing::debug!(actor = %profile.name, "switching to default flow");
            story.switch_to_default_flow()?;
            prep.switched_flow = true;
        }
    } else if story.current_flow_name() != target {
        tracing::debug!(actor = %profile.name, flow = target, "switching flow");
        story.switch_flow(target)?;
        prep.switched_flow = true;
    }

    before_entry(&mut *story);

    if should_jump(profile.start_option, was_alive) {
        let path = profile.start_path();
        tracing::debug!(
            actor = %profile.name,
            flow = story.current_flow_name(),
            path = %path,
            "choosing start path"
        );
        story.choose_path(&path)?;
        prep.jumped_to = Some(path);
    } else {
        tracing::debug!(
            actor = %profile.name,
            flow = story.current_flow_name(),
            "continuing from current pointer"
        );
    }

    Ok(prep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::script::ScriptedStory;

    const SCRIPT: &str = r#"(knots: {
        "guard_start": [Line("Halt!"), Line("Who goes there?")],
        "default_start": [Line("...")],
    })"#;

    fn story() -> ScriptedStory {
        ScriptedStory::parse_ron(SCRIPT).unwrap()
    }

    #[test]
    fn decision_table() {
        assert!(should_jump(StartOption::AlwaysResetStory, true));
        assert!(should_jump(StartOption::AlwaysFromStartPath, true));
        assert!(should_jump(StartOption::Continue, false));
        assert!(!should_jump(StartOption::Continue, true));
        assert!(should_jump(StartOption::ContinueAndLoop, false));
        assert!(!should_jump(StartOption::ContinueAndLoop, true));
    }

    #[test]
    fn continue_into_new_flow_jumps() {
        let mut s = story();
        let profile = ActorProfile::new("Guard");
        let prep = prepare_story(&mut s, &profile).unwrap();
        assert!(prep.switched_flow);
        assert!(!prep.reset_state);
        assert_eq!(prep.jumped_to.as_deref(), Some("guard_start"));
        assert_eq!(s.current_flow_name(), "Guard");
        assert_eq!(s.continue_line().unwrap(), "Halt!");
    }

    #[test]
    fn continue_resumes_alive_flow() {
        let mut s = story();
        let profile = ActorProfile::new("Guard");
        prepare_story(&mut s, &profile).unwrap();
        s.continue_line().unwrap();
        s.switch_to_default_flow().unwrap();

        let prep = prepare_story(&mut s, &profile).unwrap();
        assert!(prep.switched_flow);
        assert!(prep.jumped_to.is_none());
        assert_eq!(s.continue_line().unwrap(), "Who goes there?");
    }

    #[test]
    fn from_start_path_always_jumps() {
        let mut s = story();
        let profile =
            ActorProfile::new("Guard").with_start_option(StartOption::AlwaysFromStartPath);
        prepare_story(&mut s, &profile).unwrap();
        s.continue_line().unwrap();
        let prep = prepare_story(&mut s, &profile).unwrap();
        assert!(!prep.switched_flow);
        assert_eq!(prep.jumped_to.as_deref(), Some("guard_start"));
        assert_eq!(s.continue_line().unwrap(), "Halt!");
    }

    #[test]
    fn default_flow_target() {
        let mut s = story();
        let profile = ActorProfile::new("").with_flow_name("DEFAULT");
        let prep = prepare_story(&mut s, &profile).unwrap();
        assert!(!prep.switched_flow);
        assert_eq!(prep.jumped_to.as_deref(), Some("default_start"));
        assert!(s.current_flow_is_default());
    }

    #[test]
    fn entry_hook_runs_before_the_start_path() {
        let mut s = ScriptedStory::parse_ron(
            r#"(
                variables: { "visitor": String("") },
                knots: {
                    "guard_start": [When("visitor", String("knight"), "salute"), Line("Halt!")],
                    "salute": [Line("Welcome back, sir.")],
                },
            )"#,
        )
        .unwrap();
        let profile =
            ActorProfile::new("Guard").with_start_option(StartOption::AlwaysResetStory);
        let prep = prepare_story_with(&mut s, &profile, |story| {
            story.set_variable("visitor", "knight".into()).unwrap();
        })
        .unwrap();
        assert!(prep.reset_state);
        assert_eq!(s.continue_line().unwrap(), "Welcome back, sir.");
    }

    #[test]
    fn entry_hook_runs_when_resuming() {
        let mut s = story();
        let profile = ActorProfile::new("Guard");
        prepare_story(&mut s, &profile).unwrap();
        let mut ran = false;
        let prep = prepare_story_with(&mut s, &profile, |_| ran = true).unwrap();
        assert!(ran);
        assert!(prep.jumped_to.is_none());
    }

    #[test]
    fn bad_start_path_fails_preparation() {
        let mut s = story();
        let profile = ActorProfile::new("Guard").with_start_path("nowhere");
        assert!(matches!(
            prepare_story(&mut s, &profile),
            Err(StoryError::UnknownPath(_))
        ));
    }
}
