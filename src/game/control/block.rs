// Control block - per-entity tick logic and property surface

use super::legacy::migrate_display_name;
use super::settings::{ControlSettings, InputSelection, SettingsChange};
use super::targets::{ActionTarget, ProgramInput, TargetKind};
use super::trigger::{Fire, TriggerState};
use super::ControlError;
use crate::engine::input::{ControlBindings, InputCatalog, InputOracle, PressedSnapshot};
use crate::engine::net::{wire, Transport, INPUT_MESSAGE_ID};
use std::sync::Arc;

/// Ticks between the last settings change and writing CustomData
pub const SAVE_DELAY_TICKS: u32 = 30;

/// Whoever is operating the block this tick (a seated player's cockpit)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Controller {
    pub display_name: String,
    pub functional: bool,
    /// On the same or a connected structure
    pub connected: bool,
    /// Ownership and sharing allow this controller to use the block
    pub access_granted: bool,
}

impl Controller {
    /// A working, connected controller with access
    pub fn new(display_name: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            functional: true,
            connected: true,
            access_granted: true,
        }
    }
}

/// Everything a block needs to evaluate one tick
#[derive(Clone, Copy)]
pub struct TickContext<'a> {
    pub now: u64,
    pub oracle: &'a dyn InputOracle,
    pub controller: Option<&'a Controller>,
    /// Whether this side may run program targets
    pub authority: bool,
}

/// A block that turns input combinations into actions
pub struct ControlBlock {
    entity_id: u64,
    display_name: String,
    catalog: Arc<InputCatalog>,
    settings: ControlSettings,
    trigger: TriggerState,
    target: Box<dyn ActionTarget>,
    snapshot: PressedSnapshot,
    released: bool,
    custom_data: String,
    fail_reason: Option<String>,
    save_countdown: Option<u32>,
}

impl ControlBlock {
    /// Create a block and load its settings from CustomData, migrating any
    /// legacy settings found in the display name
    pub fn new(
        entity_id: u64,
        display_name: &str,
        custom_data: &str,
        target: Box<dyn ActionTarget>,
        catalog: Arc<InputCatalog>,
    ) -> Self {
        let mut block = Self {
            entity_id,
            display_name: display_name.to_string(),
            catalog,
            settings: ControlSettings::default(),
            trigger: TriggerState::new(),
            target,
            snapshot: PressedSnapshot::new(),
            released: false,
            custom_data: custom_data.to_string(),
            fail_reason: None,
            save_countdown: None,
        };
        block.load();
        block
    }

    fn load(&mut self) {
        let has_section = self.reload_custom_data();

        if let Some(migration) = migrate_display_name(&self.display_name, &self.catalog) {
            self.display_name = migration.display_name;
            if !has_section {
                self.settings = migration.settings;
                self.schedule_save();
            }
        }
    }

    /// Parse CustomData into the settings; returns whether a section exists
    fn reload_custom_data(&mut self) -> bool {
        match ControlSettings::parse(&self.custom_data, &self.catalog) {
            Ok(Some(settings)) => {
                self.settings = settings;
                self.fail_reason = None;
                true
            }
            Ok(None) => {
                self.settings = ControlSettings::default();
                self.fail_reason = None;
                false
            }
            Err(e) => {
                log::warn!("Block {}: invalid settings, keeping previous: {}", self.entity_id, e);
                self.fail_reason = Some(e.to_string());
                true
            }
        }
    }

    pub fn entity_id(&self) -> u64 {
        self.entity_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn settings(&self) -> &ControlSettings {
        &self.settings
    }

    pub fn target_kind(&self) -> TargetKind {
        self.target.kind()
    }

    pub fn custom_data(&self) -> &str {
        &self.custom_data
    }

    /// Why the last settings load failed, until a load succeeds
    pub fn fail_reason(&self) -> Option<&str> {
        self.fail_reason.as_deref()
    }

    pub fn is_save_pending(&self) -> bool {
        self.save_countdown.is_some()
    }

    /// The CustomData text was edited from outside; re-read the settings
    pub fn set_custom_data(&mut self, custom_data: &str) {
        if custom_data == self.custom_data {
            return;
        }

        self.custom_data = custom_data.to_string();
        // The edit replaces whatever was waiting to be written
        self.save_countdown = None;

        let before = self.settings.clone();
        self.reload_custom_data();
        if self.settings != before {
            self.trigger.reset();
        }
    }

    /// Apply a settings change and schedule the CustomData write
    pub fn apply(&mut self, change: SettingsChange) -> Result<(), ControlError> {
        if matches!(change, SettingsChange::RunOnInput(_)) && self.target.kind() != TargetKind::Program {
            return Err(ControlError::ProgramOnly("Run"));
        }

        let resets_trigger = matches!(
            change,
            SettingsChange::Input(_) | SettingsChange::AddInput(_) | SettingsChange::RemoveInput(_)
        );

        if self.settings.apply(change, &self.catalog)? {
            if resets_trigger {
                self.trigger.reset();
            }
            self.schedule_save();
        }
        Ok(())
    }

    /// Start monitoring another input by name
    pub fn add_input(&mut self, name: &str) -> Result<(), ControlError> {
        self.apply(SettingsChange::AddInput(name.to_string()))
    }

    /// Stop monitoring an input by name
    pub fn remove_input(&mut self, name: &str) -> Result<(), ControlError> {
        self.apply(SettingsChange::RemoveInput(name.to_string()))
    }

    /// Names of the inputs currently monitored
    pub fn monitored_inputs(&self) -> Vec<String> {
        match self.settings.input() {
            InputSelection::None => Vec::new(),
            InputSelection::All => self.catalog.iter().map(|i| i.name().to_string()).collect(),
            InputSelection::Combination(combination) => {
                combination.names().into_iter().map(str::to_string).collect()
            }
        }
    }

    /// Values captured by the last fire
    pub fn pressed_snapshot(&self) -> &PressedSnapshot {
        &self.snapshot
    }

    /// Whether the last fire came from a release
    pub fn last_fire_released(&self) -> bool {
        self.released
    }

    /// Describe the monitored inputs by their physical bindings
    pub fn friendly_string(&self, bindings: &ControlBindings) -> String {
        match self.settings.input() {
            InputSelection::None => "none".to_string(),
            InputSelection::All => "any input".to_string(),
            InputSelection::Combination(combination) => {
                combination.friendly_string(self.settings.combine_mode(), bindings)
            }
        }
    }

    /// Run one tick; returns the fire if there was one
    pub fn update(&mut self, ctx: &TickContext<'_>, transport: &mut dyn Transport) -> Option<Fire> {
        self.update_save();

        if !self.settings.input().is_active() {
            return None;
        }

        let pressed = self.gates_pass(ctx) && self.is_satisfied(ctx.oracle);
        let fire = self.trigger.update(
            ctx.now,
            pressed,
            self.settings.trigger_mode(),
            self.settings.thresholds(),
        )?;

        self.fire(fire.released, ctx, transport);
        Some(fire)
    }

    fn gates_pass(&self, ctx: &TickContext<'_>) -> bool {
        let Some(controller) = ctx.controller else {
            return false;
        };

        if !controller.functional || !controller.connected || !controller.access_granted {
            return false;
        }

        if let Some(filter) = self.settings.filter() {
            let name = controller.display_name.to_lowercase();
            if !name.contains(&filter.to_lowercase()) {
                return false;
            }
        }

        self.settings.monitor_in_menus() || !ctx.oracle.in_menu()
    }

    fn is_satisfied(&self, oracle: &dyn InputOracle) -> bool {
        match self.settings.input() {
            InputSelection::None => false,
            InputSelection::All => self.catalog.iter().any(|i| i.sample(oracle, false)),
            InputSelection::Combination(combination) => {
                combination.is_satisfied(self.settings.combine_mode(), oracle, false)
            }
        }
    }

    fn capture(&self, released: bool, oracle: &dyn InputOracle) -> PressedSnapshot {
        match self.settings.input() {
            InputSelection::None => PressedSnapshot::new(),
            // Zeroed analog inputs on release, otherwise only what is held
            InputSelection::All if released => PressedSnapshot::capture(
                self.catalog.iter().filter(|i| i.kind().is_analog()),
                true,
                oracle,
            ),
            InputSelection::All => PressedSnapshot::capture(
                self.catalog.iter().filter(|i| i.sample(oracle, false)),
                false,
                oracle,
            ),
            InputSelection::Combination(combination) => combination.capture(released, oracle),
        }
    }

    fn fire(&mut self, released: bool, ctx: &TickContext<'_>, transport: &mut dyn Transport) {
        let edge = if released { "release" } else { "press" };
        if self.settings.debug() {
            log::info!("Block {} '{}' fired on {}", self.entity_id, self.display_name, edge);
        } else {
            log::debug!("Block {} fired on {}", self.entity_id, edge);
        }

        match self.target.kind() {
            TargetKind::Pulse => self.target.pulse(),
            TargetKind::Program => {
                self.snapshot = self.capture(released, ctx.oracle);
                self.released = released;

                if !self.settings.run_on_input() {
                    return;
                }

                if ctx.authority {
                    self.run_target();
                } else {
                    let payload = wire::encode(&self.snapshot, self.entity_id);
                    transport.send_to_authority(INPUT_MESSAGE_ID, payload);
                }
            }
        }
    }

    /// Authority side: a client replicated a snapshot for this block.
    /// Returns whether the snapshot was accepted.
    pub fn apply_remote_snapshot(&mut self, snapshot: PressedSnapshot) -> bool {
        if self.target.kind() != TargetKind::Program {
            log::warn!(
                "Block {}: ignoring replicated input for a pulse target",
                self.entity_id
            );
            return false;
        }

        // A release capture holds nothing pressed and only zeroed analog values
        self.released = !snapshot
            .iter()
            .any(|(_, value)| value.components().is_empty() || value.is_nonzero());
        self.snapshot = snapshot;

        if self.settings.run_on_input() {
            self.run_target();
        }
        true
    }

    fn run_target(&mut self) {
        let input = ProgramInput {
            entity_id: self.entity_id,
            snapshot: &self.snapshot,
            released: self.released,
        };
        self.target.run(&input);
    }

    fn schedule_save(&mut self) {
        self.save_countdown = Some(SAVE_DELAY_TICKS);
    }

    fn update_save(&mut self) {
        match self.save_countdown {
            Some(remaining) if remaining > 1 => self.save_countdown = Some(remaining - 1),
            Some(_) => {
                self.save_countdown = None;
                self.save();
            }
            None => {}
        }
    }

    fn save(&mut self) {
        self.custom_data = self.settings.write_into(&self.custom_data);
        self.fail_reason = None;
        log::debug!("Block {}: settings written", self.entity_id);
    }
}

impl std::fmt::Debug for ControlBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlBlock")
            .field("entity_id", &self.entity_id)
            .field("display_name", &self.display_name)
            .field("settings", &self.settings)
            .field("target", &self.target.kind())
            .field("fail_reason", &self.fail_reason)
            .finish()
    }
}
