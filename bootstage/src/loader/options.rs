//! Loader configuration.
//!
//! Options are set once before the first advance and never change while the
//! machines run. Every field has a default matching the stock module, so a
//! config file only needs to list what it overrides.

use crate::machine::{DrivePolicy, RevisitPolicy};
use bootstage_shared::errors::{BootstrapError, BootstrapResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Name of a behavior/model object or subordinate initializer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capability(String);

impl Capability {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Capability {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Object type registered with the object registry before data loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectTypeSpec {
    /// Element name of a single object (e.g. `NPCCharacter`).
    pub name: String,
    /// Element name of the containing list (e.g. `NPCCharacters`).
    pub list_name: String,
    pub type_id: u32,
}

impl ObjectTypeSpec {
    pub fn new(name: &str, list_name: &str, type_id: u32) -> Self {
        Self {
            name: name.to_string(),
            list_name: list_name.to_string(),
            type_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
    /// Also write daily rolling log files here when set.
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderOptions {
    /// Module whose `ModuleData/` directory holds the game texts.
    pub module_name: String,
    /// Selector loaded by the game manager before anything else.
    pub module_data: String,
    /// Text files under `<module_name>/ModuleData/`.
    pub game_texts: Vec<String>,
    /// Static data selectors loaded during game type initialization.
    pub static_data: Vec<String>,
    pub object_types: Vec<ObjectTypeSpec>,
    /// Gameplay models registered during game type initialization.
    pub capabilities: Vec<Capability>,
    /// Subordinate initializers run as one batch on every FirstInit visit.
    pub sub_modules: Vec<Capability>,
    /// UI state pushed once the session bootstrap completes.
    pub session_state: String,
    pub revisit_policy: RevisitPolicy,
    pub drive_policy: DrivePolicy,
    pub logging: LoggingOptions,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            module_name: "Native".to_string(),
            module_data: "ModuleData".to_string(),
            game_texts: [
                "multiplayer_strings.xml",
                "global_strings.xml",
                "module_strings.xml",
                "native_strings.xml",
            ]
            .map(String::from)
            .to_vec(),
            static_data: ["Items", "EquipmentRosters", "NPCCharacters", "SPCultures"]
                .map(String::from)
                .to_vec(),
            object_types: vec![
                ObjectTypeSpec::new("NPCCharacter", "NPCCharacters", 43),
                ObjectTypeSpec::new("Culture", "SPCultures", 17),
            ],
            capabilities: [
                "MultiplayerAgentDecideKilledOrUnconsciousModel",
                "CustomBattleAgentStatCalculateModel",
                "DefaultMissionDifficultyModel",
                "CustomBattleApplyWeatherEffectsModel",
                "MultiplayerAgentApplyDamageModel",
                "DefaultRidingModel",
                "DefaultStrikeMagnitudeModel",
                "CustomBattleMoraleModel",
                "CustomBattleInitializationModel",
                "DefaultDamageParticleModel",
            ]
            .map(Capability::from)
            .to_vec(),
            sub_modules: vec![Capability::from("Native"), Capability::from("BreadAndGames")],
            session_state: "BnGState".to_string(),
            revisit_policy: RevisitPolicy::default(),
            drive_policy: DrivePolicy::default(),
            logging: LoggingOptions::default(),
        }
    }
}

impl LoaderOptions {
    /// Read options from a JSON file. Missing fields keep their defaults.
    pub fn from_file(path: &Path) -> BootstrapResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            BootstrapError::Config(format!(
                "Failed to read options file {}: {}",
                path.display(),
                e
            ))
        })?;
        let options: Self = serde_json::from_str(&raw)?;
        options.sanitize()?;
        Ok(options)
    }

    /// Validate options before any machine is built.
    pub fn sanitize(&self) -> BootstrapResult<()> {
        if self.module_name.trim().is_empty() {
            return Err(BootstrapError::Config("module_name must not be empty".into()));
        }
        if self.module_data.trim().is_empty() {
            return Err(BootstrapError::Config("module_data must not be empty".into()));
        }
        if self.session_state.trim().is_empty() {
            return Err(BootstrapError::Config(
                "session_state must not be empty".into(),
            ));
        }
        if self.drive_policy.steps_per_visit == 0 {
            return Err(BootstrapError::Config(
                "drive_policy.steps_per_visit must be at least 1".into(),
            ));
        }
        if let Some(blank) = self
            .game_texts
            .iter()
            .chain(self.static_data.iter())
            .find(|s| s.trim().is_empty())
        {
            return Err(BootstrapError::Config(format!(
                "blank entry {:?} in game_texts/static_data",
                blank
            )));
        }

        check_unique("capabilities", &self.capabilities)?;
        check_unique("sub_modules", &self.sub_modules)?;

        let mut type_ids = HashSet::new();
        for ty in &self.object_types {
            if !type_ids.insert(ty.type_id) {
                return Err(BootstrapError::Config(format!(
                    "object type id {} registered twice ({})",
                    ty.type_id, ty.name
                )));
            }
        }

        Ok(())
    }

    /// Full paths of the game text files.
    pub fn game_text_paths(&self) -> Vec<PathBuf> {
        let base = Path::new(&self.module_name).join("ModuleData");
        self.game_texts.iter().map(|file| base.join(file)).collect()
    }
}

fn check_unique(field: &str, entries: &[Capability]) -> BootstrapResult<()> {
    let mut seen = HashSet::new();
    for entry in entries {
        if entry.as_str().trim().is_empty() {
            return Err(BootstrapError::Config(format!("blank entry in {}", field)));
        }
        if !seen.insert(entry) {
            return Err(BootstrapError::Config(format!(
                "duplicate entry '{}' in {}",
                entry, field
            )));
        }
    }
    Ok(())
}
