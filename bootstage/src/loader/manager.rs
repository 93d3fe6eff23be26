//! Game manager bootstrap: the machine the session coordinator waits on.
//!
//! ```text
//! PreInit ──→ FirstInit ⟲ ──→ WaitSecond ──→ ThirdInit ⟲ ──→ PostInit ──→ FinishInit ──→ Complete
//!   │            │                 │              │
//!   │            │                 │              └─ drive game type, then poll session ready
//!   │            │                 └─ start session (once)
//!   │            └─ full initializer batch every visit until all succeed
//!   └─ module data + create/start game type machine
//! ```

use super::game_type::{GameTypeMachine, game_type_machine};
use super::options::LoaderOptions;
use super::subsystems::{LoaderContext, load_required};
use crate::machine::{BootstrapMachine, GatedStage, Stage, StageRunner, Transition};
use bootstage_shared::errors::BootstrapResult;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ManagerStage {
    PreInit,
    FirstInit,
    WaitSecond,
    ThirdInit,
    PostInit,
    FinishInit,
    Complete,
}

impl Stage for ManagerStage {
    const INITIAL: Self = ManagerStage::PreInit;
    const TERMINAL: Self = ManagerStage::Complete;

    fn name(self) -> &'static str {
        match self {
            ManagerStage::PreInit => "PreInit",
            ManagerStage::FirstInit => "FirstInit",
            ManagerStage::WaitSecond => "WaitSecond",
            ManagerStage::ThirdInit => "ThirdInit",
            ManagerStage::PostInit => "PostInit",
            ManagerStage::FinishInit => "FinishInit",
            ManagerStage::Complete => "Complete",
        }
    }
}

pub type ManagerMachine = BootstrapMachine<ManagerStage, ManagerRunner>;

pub const MANAGER_MACHINE: &str = "game_manager";

pub struct ManagerRunner {
    options: Arc<LoaderOptions>,
    game_type: GatedStage<GameTypeMachine>,
}

impl ManagerRunner {
    pub fn new(options: Arc<LoaderOptions>) -> Self {
        let game_type = GatedStage::new(options.drive_policy);
        Self { options, game_type }
    }

    /// The game type machine, once PreInit has created it.
    pub fn game_type(&self) -> Option<&GameTypeMachine> {
        self.game_type.child()
    }

    fn pre_init(
        &mut self,
        ctx: &mut LoaderContext,
    ) -> BootstrapResult<Transition<ManagerStage>> {
        load_required(ctx, &self.options.module_data)?;

        let mut game_type = game_type_machine(&self.options);
        game_type.advance(ctx)?;
        self.game_type.attach(game_type);

        Ok(Transition::Advance(ManagerStage::FirstInit))
    }

    fn third_init(&mut self, ctx: &mut LoaderContext) -> Transition<ManagerStage> {
        match self.game_type.poll(ctx, ManagerStage::PostInit) {
            Transition::Advance(next) => Transition::advance_if(ctx.poll_session_ready(), next),
            other => other,
        }
    }
}

impl StageRunner<ManagerStage, LoaderContext> for ManagerRunner {
    fn run_stage(
        &mut self,
        stage: ManagerStage,
        ctx: &mut LoaderContext,
    ) -> Transition<ManagerStage> {
        match stage {
            ManagerStage::PreInit => self.pre_init(ctx).into(),
            ManagerStage::FirstInit => {
                let all_ready = ctx.run_subordinate_initializers(&self.options.sub_modules);
                Transition::advance_if(all_ready, ManagerStage::WaitSecond)
            }
            ManagerStage::WaitSecond => {
                ctx.start_session();
                Transition::Advance(ManagerStage::ThirdInit)
            }
            ManagerStage::ThirdInit => self.third_init(ctx),
            ManagerStage::PostInit => Transition::Advance(ManagerStage::FinishInit),
            ManagerStage::FinishInit => Transition::Advance(ManagerStage::Complete),
            ManagerStage::Complete => unreachable!("runner invoked on terminal stage"),
        }
    }
}

/// Build the game manager machine, not yet started.
pub fn manager_machine(options: &Arc<LoaderOptions>) -> ManagerMachine {
    BootstrapMachine::with_policy(
        MANAGER_MACHINE,
        ManagerRunner::new(Arc::clone(options)),
        options.revisit_policy,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::game_type::GameTypeStage;
    use crate::loader::testing::{Call, RecordingSubsystems};
    use crate::machine::RevisitPolicy;
    use bootstage_shared::errors::BootstrapError;

    fn machine() -> ManagerMachine {
        manager_machine(&Arc::new(LoaderOptions::default()))
    }

    fn run_to_completion(
        machine: &mut ManagerMachine,
        subsystems: &mut RecordingSubsystems,
    ) -> u32 {
        let mut calls = 0;
        while !machine.is_complete() {
            machine.advance(subsystems.ctx()).unwrap();
            calls += 1;
        }
        calls
    }

    #[test]
    fn test_pre_init_starts_game_type() {
        let mut machine = machine();
        let mut subsystems = RecordingSubsystems::default();

        assert!(machine.runner().game_type().is_none());
        assert_eq!(
            machine.advance(subsystems.ctx()).unwrap(),
            ManagerStage::FirstInit
        );

        assert_eq!(
            subsystems.calls[0],
            Call::LoadStaticData("ModuleData".into())
        );
        let game_type = machine.runner().game_type().unwrap();
        assert_eq!(game_type.current(), GameTypeStage::WaitSecond);
    }

    #[test]
    fn test_module_data_failure_is_fatal() {
        let mut machine = machine();
        let mut subsystems = RecordingSubsystems {
            failing_selector: Some("ModuleData".into()),
            ..Default::default()
        };

        let err = machine.advance(subsystems.ctx()).unwrap_err();
        assert!(matches!(err, BootstrapError::FatalConfiguration { .. }));
        assert!(machine.runner().game_type().is_none());
        assert_eq!(machine.current(), ManagerStage::PreInit);
    }

    #[test]
    fn test_first_init_replays_full_batch() {
        let mut machine = machine();
        let mut subsystems = RecordingSubsystems {
            initializer_results: [false, false].into(),
            ..Default::default()
        };

        machine.advance(subsystems.ctx()).unwrap(); // PreInit
        assert_eq!(
            machine.advance(subsystems.ctx()).unwrap(),
            ManagerStage::FirstInit
        );
        assert_eq!(
            machine.advance(subsystems.ctx()).unwrap(),
            ManagerStage::FirstInit
        );
        assert_eq!(
            machine.advance(subsystems.ctx()).unwrap(),
            ManagerStage::WaitSecond
        );

        let batches: Vec<_> = subsystems
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::RunSubordinate(list) => Some(list.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(batches.len(), 3);
        for batch in &batches {
            assert_eq!(batch, &vec!["Native".to_string(), "BreadAndGames".to_string()]);
        }
    }

    #[test]
    fn test_session_started_once() {
        let mut machine = machine();
        let mut subsystems = RecordingSubsystems {
            ready_results: [false, false, false].into(),
            ..Default::default()
        };

        run_to_completion(&mut machine, &mut subsystems);
        assert_eq!(subsystems.count(|c| *c == Call::StartSession), 1);
    }

    #[test]
    fn test_third_init_waits_for_game_type_then_ready() {
        let mut machine = machine();
        let mut subsystems = RecordingSubsystems {
            ready_results: [false, false].into(),
            ..Default::default()
        };

        // PreInit, FirstInit, WaitSecond
        for _ in 0..3 {
            machine.advance(subsystems.ctx()).unwrap();
        }
        assert_eq!(machine.current(), ManagerStage::ThirdInit);

        // Game type needs three more steps; readiness is only polled once it is done.
        machine.advance(subsystems.ctx()).unwrap();
        machine.advance(subsystems.ctx()).unwrap();
        assert_eq!(subsystems.count(|c| *c == Call::PollSessionReady), 0);

        machine.advance(subsystems.ctx()).unwrap();
        let game_type = machine.runner().game_type().unwrap();
        assert!(game_type.is_complete());
        assert_eq!(machine.current(), ManagerStage::ThirdInit);

        machine.advance(subsystems.ctx()).unwrap();
        assert_eq!(machine.current(), ManagerStage::ThirdInit);
        assert_eq!(
            machine.advance(subsystems.ctx()).unwrap(),
            ManagerStage::PostInit
        );
        assert_eq!(subsystems.count(|c| *c == Call::PollSessionReady), 3);
        assert_eq!(machine.metrics().visits("ThirdInit"), 5);
    }

    #[test]
    fn test_full_run_stage_count() {
        let mut machine = machine();
        let mut subsystems = RecordingSubsystems::default();

        // 6 stages, plus two extra ThirdInit visits while the game type finishes.
        assert_eq!(run_to_completion(&mut machine, &mut subsystems), 8);
        assert!(machine.completion_handle().is_complete());
    }

    #[test]
    fn test_game_type_progress_is_not_a_revisit() {
        let options = Arc::new(LoaderOptions {
            revisit_policy: RevisitPolicy::bounded(0),
            ..Default::default()
        });
        let mut machine = manager_machine(&options);
        let mut subsystems = RecordingSubsystems::default();

        assert_eq!(run_to_completion(&mut machine, &mut subsystems), 8);
        assert_eq!(machine.metrics().visits("ThirdInit"), 3);
    }

    #[test]
    fn test_bounded_revisits_stall_on_readiness() {
        let options = Arc::new(LoaderOptions {
            revisit_policy: RevisitPolicy::bounded(4),
            ..Default::default()
        });
        let mut machine = manager_machine(&options);
        let mut subsystems = RecordingSubsystems {
            ready_results: std::iter::repeat(false).take(100).collect(),
            ..Default::default()
        };

        let err = loop {
            if let Err(e) = machine.advance(subsystems.ctx()) {
                break e;
            }
        };
        assert!(matches!(
            err,
            BootstrapError::Stalled { ref stage, visits: 5, .. } if stage == "ThirdInit"
        ));
    }
}
