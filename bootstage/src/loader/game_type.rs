//! Game type bootstrap: the innermost machine.
//!
//! Started by the game manager's PreInit and driven from its ThirdInit.
//! Only the first stage does real work; the remaining stages are pacing
//! steps the engine expects to observe.

use super::options::LoaderOptions;
use super::subsystems::{LifecycleEvent, LoaderContext, load_required};
use crate::machine::{BootstrapMachine, Stage, StageTable, Transition};
use bootstage_shared::errors::BootstrapResult;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GameTypeStage {
    InitializeFirst,
    WaitSecond,
    LoadVisuals,
    PostInitialize,
    Complete,
}

impl Stage for GameTypeStage {
    const INITIAL: Self = GameTypeStage::InitializeFirst;
    const TERMINAL: Self = GameTypeStage::Complete;

    fn name(self) -> &'static str {
        match self {
            GameTypeStage::InitializeFirst => "InitializeFirst",
            GameTypeStage::WaitSecond => "WaitSecond",
            GameTypeStage::LoadVisuals => "LoadVisuals",
            GameTypeStage::PostInitialize => "PostInitialize",
            GameTypeStage::Complete => "Complete",
        }
    }
}

pub type GameTypeMachine =
    BootstrapMachine<GameTypeStage, StageTable<GameTypeStage, LoaderContext>>;

pub const GAME_TYPE_MACHINE: &str = "game_type";

/// Build the game type machine, not yet started.
pub fn game_type_machine(options: &Arc<LoaderOptions>) -> GameTypeMachine {
    let init_options = Arc::clone(options);
    let table = StageTable::<GameTypeStage, LoaderContext>::new()
        .on(GameTypeStage::InitializeFirst, move |ctx| {
            initialize(&init_options, ctx).into()
        })
        .on(GameTypeStage::WaitSecond, |_| {
            Transition::Advance(GameTypeStage::LoadVisuals)
        })
        .on(GameTypeStage::LoadVisuals, |_| {
            Transition::Advance(GameTypeStage::PostInitialize)
        })
        .on(GameTypeStage::PostInitialize, |_| {
            Transition::Advance(GameTypeStage::Complete)
        });

    BootstrapMachine::with_policy(GAME_TYPE_MACHINE, table, options.revisit_policy)
}

/// One-time game type setup: texts, models, object types, then static data,
/// with the game manager's lifecycle callbacks around the data load.
///
/// Object types are registered before any data set that contains them loads.
fn initialize(
    options: &LoaderOptions,
    ctx: &mut LoaderContext,
) -> BootstrapResult<Transition<GameTypeStage>> {
    for path in options.game_text_paths() {
        ctx.load_game_texts(&path)?;
    }

    for capability in &options.capabilities {
        ctx.register_capability(capability);
    }
    ctx.on_lifecycle(LifecycleEvent::GameStart);
    ctx.on_lifecycle(LifecycleEvent::BeginGameStart);

    for object_type in &options.object_types {
        ctx.register_object_type(object_type);
    }

    for selector in &options.static_data {
        load_required(ctx, selector)?;
    }
    ctx.unregister_non_ready_objects();

    ctx.on_lifecycle(LifecycleEvent::NewCampaignStart);
    ctx.on_lifecycle(LifecycleEvent::AfterCampaignStart);
    ctx.on_lifecycle(LifecycleEvent::InitializationFinished);

    tracing::debug!(
        capabilities = options.capabilities.len(),
        static_data = options.static_data.len(),
        "Game type initialized"
    );

    Ok(Transition::Advance(GameTypeStage::WaitSecond))
}
