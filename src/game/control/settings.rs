// Control block settings and their CustomData text section
//
// ```text
// [ControlModuleMod]
// Input=shift m.left
// State=1
// Hold=0.5
// ```
//
// Only non-default values are written. Settings that are all default remove
// the section, leaving the rest of the text untouched.

use super::trigger::{Thresholds, TriggerMode};
use super::ControlError;
use crate::core::math::round_to;
use crate::engine::clock::{seconds_to_ticks, TICK_SECONDS};
use crate::engine::input::{CombineMode, InputCatalog, InputCombination, InputError};
use std::sync::Arc;

/// Section header the settings live under
pub const SECTION_NAME: &str = "ControlModuleMod";

/// Longest accepted hold, repeat or release delay in seconds
pub const MAX_DELAY_SECONDS: f32 = 600.0;

/// Decimals kept for delays
const DELAY_DECIMALS: i32 = 3;

const KEY_INPUT: &str = "Input";
const KEY_STATE: &str = "State";
const KEY_CHECK: &str = "Check";
const KEY_HOLD: &str = "Hold";
const KEY_REPEAT: &str = "Repeat";
const KEY_RELEASE: &str = "Release";
const KEY_FILTER: &str = "Filter";
const KEY_DEBUG: &str = "Debug";
const KEY_IN_MENUS: &str = "InMenus";
const KEY_RUN: &str = "Run";

/// Which inputs a block monitors
#[derive(Debug, Clone, Default, PartialEq)]
pub enum InputSelection {
    /// Nothing monitored, the block is inert
    #[default]
    None,
    /// Every catalog input
    All,
    Combination(InputCombination),
}

impl InputSelection {
    /// Parse `none`, `all` or a combination string; empty text means `none`
    pub fn parse(catalog: &InputCatalog, text: &str) -> Result<Self, InputError> {
        let text = text.trim();
        if text.is_empty() || text.eq_ignore_ascii_case("none") {
            Ok(Self::None)
        } else if text.eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            InputCombination::parse(catalog, text).map(Self::Combination)
        }
    }

    /// Text form used in settings
    pub fn as_setting(&self) -> &str {
        match self {
            Self::None => "none",
            Self::All => "all",
            Self::Combination(combination) => combination.combination_string(),
        }
    }

    /// Whether the block has anything to evaluate
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// A single change to a block's settings
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsChange {
    Input(InputSelection),
    AddInput(String),
    RemoveInput(String),
    TriggerMode(TriggerMode),
    CombineMode(CombineMode),
    /// Seconds
    Hold(f32),
    /// Seconds
    Repeat(f32),
    /// Seconds
    Release(f32),
    Filter(Option<String>),
    Debug(bool),
    MonitorInMenus(bool),
    RunOnInput(bool),
}

/// Everything a control block persists
#[derive(Debug, Clone, PartialEq)]
pub struct ControlSettings {
    input: InputSelection,
    trigger_mode: TriggerMode,
    combine_mode: CombineMode,
    hold: f32,
    repeat: f32,
    release: f32,
    filter: Option<String>,
    debug: bool,
    monitor_in_menus: bool,
    run_on_input: bool,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            input: InputSelection::None,
            trigger_mode: TriggerMode::default(),
            combine_mode: CombineMode::default(),
            hold: 0.0,
            repeat: 0.0,
            release: 0.0,
            filter: None,
            debug: false,
            monitor_in_menus: false,
            run_on_input: true,
        }
    }
}

impl ControlSettings {
    pub fn input(&self) -> &InputSelection {
        &self.input
    }

    pub fn trigger_mode(&self) -> TriggerMode {
        self.trigger_mode
    }

    pub fn combine_mode(&self) -> CombineMode {
        self.combine_mode
    }

    /// Hold delay in seconds
    pub fn hold(&self) -> f32 {
        self.hold
    }

    /// Repeat interval in seconds
    pub fn repeat(&self) -> f32 {
        self.repeat
    }

    /// Release delay in seconds
    pub fn release(&self) -> f32 {
        self.release
    }

    /// Substring the controller's name must contain
    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn monitor_in_menus(&self) -> bool {
        self.monitor_in_menus
    }

    pub fn run_on_input(&self) -> bool {
        self.run_on_input
    }

    /// Delays converted to whole ticks
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            hold: seconds_to_ticks(self.hold),
            repeat: seconds_to_ticks(self.repeat),
            release: seconds_to_ticks(self.release),
        }
    }

    /// Apply a change, returning whether anything actually changed
    pub fn apply(
        &mut self,
        change: SettingsChange,
        catalog: &InputCatalog,
    ) -> Result<bool, ControlError> {
        let before = self.clone();

        match change {
            SettingsChange::Input(input) => self.input = input,
            SettingsChange::AddInput(name) => {
                let combination = match &self.input {
                    InputSelection::Combination(combination) => {
                        combination.with_input(catalog, &name)?
                    }
                    _ => {
                        let descriptor = catalog.resolve(&name)?;
                        InputCombination::from_inputs(vec![Arc::clone(descriptor)])
                            .ok_or(InputError::Empty)?
                    }
                };
                self.input = InputSelection::Combination(combination);
            }
            SettingsChange::RemoveInput(name) => {
                if let InputSelection::Combination(combination) = &self.input {
                    self.input = match combination.without_input(catalog, &name)? {
                        Some(combination) => InputSelection::Combination(combination),
                        None => InputSelection::None,
                    };
                } else {
                    catalog.resolve(&name)?;
                }
            }
            SettingsChange::TriggerMode(mode) => self.trigger_mode = mode,
            SettingsChange::CombineMode(mode) => self.combine_mode = mode,
            SettingsChange::Hold(seconds) => self.hold = clamp_delay(seconds),
            SettingsChange::Repeat(seconds) => self.repeat = clamp_delay(seconds),
            SettingsChange::Release(seconds) => self.release = clamp_delay(seconds),
            SettingsChange::Filter(filter) => self.filter = filter.and_then(|f| clean_filter(&f)),
            SettingsChange::Debug(debug) => self.debug = debug,
            SettingsChange::MonitorInMenus(monitor) => self.monitor_in_menus = monitor,
            SettingsChange::RunOnInput(run) => self.run_on_input = run,
        }

        Ok(*self != before)
    }

    /// Read the settings section out of a CustomData text.
    ///
    /// `Ok(None)` when the text has no settings section. Unknown keys are
    /// skipped with a warning; a bad value fails the whole parse.
    pub fn parse(custom_data: &str, catalog: &InputCatalog) -> Result<Option<Self>, ControlError> {
        let Some(section) = Section::find(custom_data) else {
            return Ok(None);
        };

        let mut settings = Self::default();
        let body = &custom_data[section.body_start..section.end];

        for (index, line) in body.lines().enumerate() {
            let line_number = section.header_line + 2 + index;
            let line = line.trim();

            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(parse_error(line_number, format!("Expected key=value, got '{}'", line)));
            };
            settings.parse_entry(line_number, key.trim(), value.trim(), catalog)?;
        }

        Ok(Some(settings))
    }

    fn parse_entry(
        &mut self,
        line: usize,
        key: &str,
        value: &str,
        catalog: &InputCatalog,
    ) -> Result<(), ControlError> {
        let invalid = |key: &str| parse_error(line, format!("Invalid {} value '{}'", key, value));

        if key.eq_ignore_ascii_case(KEY_INPUT) {
            self.input = InputSelection::parse(catalog, value)
                .map_err(|e| parse_error(line, e.to_string()))?;
        } else if key.eq_ignore_ascii_case(KEY_STATE) {
            self.trigger_mode = value
                .parse::<u8>()
                .ok()
                .and_then(TriggerMode::from_index)
                .ok_or_else(|| invalid(KEY_STATE))?;
        } else if key.eq_ignore_ascii_case(KEY_CHECK) {
            self.combine_mode = value
                .parse::<u8>()
                .ok()
                .and_then(CombineMode::from_index)
                .ok_or_else(|| invalid(KEY_CHECK))?;
        } else if key.eq_ignore_ascii_case(KEY_HOLD) {
            self.hold = parse_delay(value).ok_or_else(|| invalid(KEY_HOLD))?;
        } else if key.eq_ignore_ascii_case(KEY_REPEAT) {
            self.repeat = parse_delay(value).ok_or_else(|| invalid(KEY_REPEAT))?;
        } else if key.eq_ignore_ascii_case(KEY_RELEASE) {
            self.release = parse_delay(value).ok_or_else(|| invalid(KEY_RELEASE))?;
        } else if key.eq_ignore_ascii_case(KEY_FILTER) {
            self.filter = clean_filter(value);
        } else if key.eq_ignore_ascii_case(KEY_DEBUG) {
            self.debug = parse_bool(value).ok_or_else(|| invalid(KEY_DEBUG))?;
        } else if key.eq_ignore_ascii_case(KEY_IN_MENUS) {
            self.monitor_in_menus = parse_bool(value).ok_or_else(|| invalid(KEY_IN_MENUS))?;
        } else if key.eq_ignore_ascii_case(KEY_RUN) {
            self.run_on_input = parse_bool(value).ok_or_else(|| invalid(KEY_RUN))?;
        } else {
            log::warn!("Ignoring unknown setting '{}' on line {}", key, line);
        }

        Ok(())
    }

    /// The settings section text, `None` when everything is default
    pub fn to_section(&self) -> Option<String> {
        let defaults = Self::default();
        let mut entries: Vec<(&str, String)> = Vec::new();

        if self.input != defaults.input {
            entries.push((KEY_INPUT, self.input.as_setting().to_string()));
        }
        if self.trigger_mode != defaults.trigger_mode {
            entries.push((KEY_STATE, self.trigger_mode.index().to_string()));
        }
        if self.combine_mode != defaults.combine_mode {
            entries.push((KEY_CHECK, self.combine_mode.index().to_string()));
        }
        for (key, value) in [
            (KEY_HOLD, self.hold),
            (KEY_REPEAT, self.repeat),
            (KEY_RELEASE, self.release),
        ] {
            if value != 0.0 {
                entries.push((key, round_to(value, DELAY_DECIMALS).to_string()));
            }
        }
        if let Some(filter) = &self.filter {
            entries.push((KEY_FILTER, filter.clone()));
        }
        for (key, value, default) in [
            (KEY_DEBUG, self.debug, defaults.debug),
            (KEY_IN_MENUS, self.monitor_in_menus, defaults.monitor_in_menus),
            (KEY_RUN, self.run_on_input, defaults.run_on_input),
        ] {
            if value != default {
                entries.push((key, value.to_string()));
            }
        }

        if entries.is_empty() {
            return None;
        }

        let mut text = format!("[{}]\n", SECTION_NAME);
        for (key, value) in entries {
            text.push_str(key);
            text.push('=');
            text.push_str(&value);
            text.push('\n');
        }
        Some(text)
    }

    /// Write the settings into a CustomData text, replacing any previous
    /// section and keeping everything else as is
    pub fn write_into(&self, custom_data: &str) -> String {
        let section_text = self.to_section();

        match Section::find(custom_data) {
            Some(section) => {
                let mut out = String::with_capacity(custom_data.len());
                out.push_str(&custom_data[..section.start]);
                if let Some(text) = &section_text {
                    out.push_str(text);
                }
                out.push_str(&custom_data[section.end..]);
                out
            }
            None => {
                let mut out = custom_data.to_string();
                if let Some(text) = &section_text {
                    if !out.is_empty() && !out.ends_with('\n') {
                        out.push('\n');
                    }
                    out.push_str(text);
                }
                out
            }
        }
    }
}

/// Byte span of the settings section inside a CustomData text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Section {
    /// Zero-based line index of the header
    header_line: usize,
    /// Start of the header line
    start: usize,
    /// Start of the first line after the header
    body_start: usize,
    /// Start of the next section, or the end of the text
    end: usize,
}

impl Section {
    fn find(text: &str) -> Option<Self> {
        let mut offset = 0;
        let mut found: Option<Self> = None;

        for (index, line) in text.split_inclusive('\n').enumerate() {
            if let Some(name) = section_header(line) {
                if let Some(section) = found.as_mut() {
                    section.end = offset;
                    break;
                }
                if name.eq_ignore_ascii_case(SECTION_NAME) {
                    found = Some(Self {
                        header_line: index,
                        start: offset,
                        body_start: offset + line.len(),
                        end: text.len(),
                    });
                }
            }

            offset += line.len();
        }

        found
    }
}

fn section_header(line: &str) -> Option<&str> {
    let line = line.trim();
    line.strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .map(str::trim)
}

fn parse_error(line: usize, reason: String) -> ControlError {
    ControlError::Parse { line, reason }
}

/// Filter text as stored: control characters become spaces so the value
/// stays on its own line, and blank filters are none
fn clean_filter(filter: &str) -> Option<String> {
    let cleaned: String = filter
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

/// Parse a boolean written as true/false or 1/0
pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") || value == "1" {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") || value == "0" {
        Some(false)
    } else {
        None
    }
}

/// Parse a delay in seconds; rejects negative and non-finite values
pub(crate) fn parse_delay(value: &str) -> Option<f32> {
    let seconds = value.parse::<f32>().ok()?;
    (seconds.is_finite() && seconds >= 0.0).then(|| clamp_delay(seconds))
}

/// Clamp a delay into range and quantize it; below one tick is off
fn clamp_delay(seconds: f32) -> f32 {
    if !seconds.is_finite() || seconds < TICK_SECONDS {
        return 0.0;
    }
    if seconds > MAX_DELAY_SECONDS {
        log::warn!(
            "Delay of {}s is over the {}s limit, using {}s",
            seconds,
            MAX_DELAY_SECONDS,
            MAX_DELAY_SECONDS
        );
        return MAX_DELAY_SECONDS;
    }
    round_to(seconds, DELAY_DECIMALS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> InputCatalog {
        InputCatalog::standard()
    }

    fn parse(text: &str) -> ControlSettings {
        ControlSettings::parse(text, &catalog()).unwrap().unwrap()
    }

    #[test]
    fn test_default_settings_write_nothing() {
        let settings = ControlSettings::default();
        assert_eq!(settings.to_section(), None);
        assert_eq!(settings.write_into(""), "");
        assert_eq!(settings.write_into("Some notes\n"), "Some notes\n");
    }

    #[test]
    fn test_missing_section_is_none() {
        let result = ControlSettings::parse("[Other]\nKey=1\n", &catalog()).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_round_trip() {
        let catalog = catalog();
        let mut settings = ControlSettings::default();
        let changes = [
            SettingsChange::Input(InputSelection::parse(&catalog, "shift m.left").unwrap()),
            SettingsChange::TriggerMode(TriggerMode::OnPressAndRelease),
            SettingsChange::CombineMode(CombineMode::All),
            SettingsChange::Hold(0.5),
            SettingsChange::Release(0.25),
            SettingsChange::Filter(Some("Pilot".to_string())),
            SettingsChange::Debug(true),
            SettingsChange::RunOnInput(false),
        ];
        for change in changes {
            settings.apply(change, &catalog).unwrap();
        }

        let text = settings.write_into("");
        assert_eq!(
            text,
            "[ControlModuleMod]\nInput=shift m.left\nState=1\nCheck=1\nHold=0.5\n\
             Release=0.25\nFilter=Pilot\nDebug=true\nRun=false\n"
        );

        let loaded = parse(&text);
        assert_eq!(loaded, settings);
        // Saving again without edits is byte-for-byte identical
        assert_eq!(loaded.write_into(&text), text);
    }

    #[test]
    fn test_write_preserves_surrounding_text() {
        let catalog = catalog();
        let blob = "Notes at the top\n[ControlModuleMod]\nInput=a\n[Other]\nKey=1\n";

        let mut settings = parse(blob);
        settings
            .apply(SettingsChange::AddInput("b".to_string()), &catalog)
            .unwrap();
        assert_eq!(
            settings.write_into(blob),
            "Notes at the top\n[ControlModuleMod]\nInput=a b\n[Other]\nKey=1\n"
        );

        // Back to defaults removes only our section
        let defaults = ControlSettings::default();
        assert_eq!(defaults.write_into(blob), "Notes at the top\n[Other]\nKey=1\n");
    }

    #[test]
    fn test_write_appends_section() {
        let catalog = catalog();
        let mut settings = ControlSettings::default();
        settings
            .apply(SettingsChange::Debug(true), &catalog)
            .unwrap();
        assert_eq!(
            settings.write_into("[Other]\nKey=1"),
            "[Other]\nKey=1\n[ControlModuleMod]\nDebug=true\n"
        );
    }

    #[test]
    fn test_parse_is_lenient_on_format() {
        let settings = parse("[controlmodulemod]\n; comment\n\n  input = A  M.Left \nDebug=1\n");
        assert_eq!(settings.input().as_setting(), "a m.left");
        assert!(settings.debug());
    }

    #[test]
    fn test_unknown_key_ignored() {
        let settings = parse("[ControlModuleMod]\nColour=red\nState=2\n");
        assert_eq!(settings.trigger_mode(), TriggerMode::OnReleaseOnly);
    }

    #[test]
    fn test_bad_values_report_line() {
        let catalog = catalog();
        let cases = [
            ("x\n[ControlModuleMod]\nState=7\n", 3),
            ("[ControlModuleMod]\nInput=a\nCheck=maybe\n", 3),
            ("[ControlModuleMod]\nHold=-1\n", 2),
            ("[ControlModuleMod]\nRun=yes\n", 2),
            ("[ControlModuleMod]\nInput=a zzz\n", 2),
            ("[ControlModuleMod]\n\nno equals sign\n", 3),
        ];
        for (text, expected_line) in cases {
            match ControlSettings::parse(text, &catalog) {
                Err(ControlError::Parse { line, .. }) => assert_eq!(line, expected_line, "{}", text),
                other => panic!("expected parse error for {:?}, got {:?}", text, other),
            }
        }
    }

    #[test]
    fn test_input_selection() {
        let catalog = catalog();
        assert_eq!(InputSelection::parse(&catalog, "").unwrap(), InputSelection::None);
        assert_eq!(InputSelection::parse(&catalog, "NONE").unwrap(), InputSelection::None);
        assert_eq!(InputSelection::parse(&catalog, "all").unwrap(), InputSelection::All);
        assert!(InputSelection::parse(&catalog, "a zzz").is_err());

        let settings = parse("[ControlModuleMod]\nInput=all\n");
        assert_eq!(settings.input(), &InputSelection::All);
        assert_eq!(settings.to_section().unwrap(), "[ControlModuleMod]\nInput=all\n");
    }

    #[test]
    fn test_delays_rounded_and_quantized() {
        let catalog = catalog();
        let mut settings = ControlSettings::default();

        settings.apply(SettingsChange::Hold(0.12345), &catalog).unwrap();
        approx::assert_relative_eq!(settings.hold(), 0.123);

        // Below one tick is off
        settings.apply(SettingsChange::Repeat(0.01), &catalog).unwrap();
        assert_eq!(settings.repeat(), 0.0);

        settings.apply(SettingsChange::Release(1e6), &catalog).unwrap();
        assert_eq!(settings.release(), MAX_DELAY_SECONDS);

        let thresholds = settings.thresholds();
        assert_eq!(thresholds.hold, 7);
        assert_eq!(thresholds.repeat, 0);
        assert_eq!(thresholds.release, 36_000);
    }

    #[test]
    fn test_filter_with_line_breaks_round_trips() {
        let catalog = catalog();
        let mut settings = ControlSettings::default();
        settings
            .apply(SettingsChange::Filter(Some("Pilot\r\nSeat\t".to_string())), &catalog)
            .unwrap();
        assert_eq!(settings.filter(), Some("Pilot  Seat"));

        let text = settings.write_into("");
        assert_eq!(text, "[ControlModuleMod]\nFilter=Pilot  Seat\n");
        assert_eq!(parse(&text), settings);

        // Nothing left after cleaning means no filter
        settings
            .apply(SettingsChange::Filter(Some("\n\r".to_string())), &catalog)
            .unwrap();
        assert_eq!(settings.filter(), None);
    }

    #[test]
    fn test_delay_over_limit_clamped_on_parse() {
        let settings = parse("[ControlModuleMod]\nHold=1000\nRepeat=600\n");
        assert_eq!(settings.hold(), MAX_DELAY_SECONDS);
        assert_eq!(settings.repeat(), MAX_DELAY_SECONDS);
        assert_eq!(
            settings.to_section().unwrap(),
            "[ControlModuleMod]\nHold=600\nRepeat=600\n"
        );
    }

    #[test]
    fn test_apply_reports_changes() {
        let catalog = catalog();
        let mut settings = ControlSettings::default();

        assert!(settings.apply(SettingsChange::Debug(true), &catalog).unwrap());
        assert!(!settings.apply(SettingsChange::Debug(true), &catalog).unwrap());
        assert!(!settings
            .apply(SettingsChange::Filter(Some("  ".to_string())), &catalog)
            .unwrap());
    }

    #[test]
    fn test_add_and_remove_inputs() {
        let catalog = catalog();
        let mut settings = ControlSettings::default();

        settings
            .apply(SettingsChange::AddInput("A".to_string()), &catalog)
            .unwrap();
        settings
            .apply(SettingsChange::AddInput("m.left".to_string()), &catalog)
            .unwrap();
        assert_eq!(settings.input().as_setting(), "a m.left");

        let err = settings
            .apply(SettingsChange::AddInput("zzz".to_string()), &catalog)
            .unwrap_err();
        assert_eq!(err, ControlError::Input(InputError::UnknownInput("zzz".to_string())));

        settings
            .apply(SettingsChange::RemoveInput("a".to_string()), &catalog)
            .unwrap();
        settings
            .apply(SettingsChange::RemoveInput("m.left".to_string()), &catalog)
            .unwrap();
        assert_eq!(settings.input(), &InputSelection::None);

        // Unknown names fail even with nothing to remove from
        assert!(settings
            .apply(SettingsChange::RemoveInput("zzz".to_string()), &catalog)
            .is_err());
    }
}
