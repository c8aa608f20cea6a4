// Settings embedded in display names by older versions
//
// Two forms are read, never written:
//
// ```text
// Button Panel {ControlModule:input:shift m.left;state:1;hold:0.5}
// Button Panel +input:g.a,g.b +debug:1
// ```
//
// After migration the settings move to CustomData and the tokens are stripped
// from the name.

use super::settings::{parse_bool, parse_delay, ControlSettings, InputSelection, SettingsChange};
use super::trigger::TriggerMode;
use crate::engine::input::{CombineMode, InputCatalog};

const TAG: &str = "controlmodule";

/// Settings recovered from a display name
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyMigration {
    pub settings: ControlSettings,
    /// The display name with the legacy tokens removed
    pub display_name: String,
}

/// Pull legacy settings out of a display name.
///
/// `None` when the name carries no legacy tokens. Entries with bad values are
/// skipped with a warning; the rest still migrate.
pub fn migrate_display_name(display_name: &str, catalog: &InputCatalog) -> Option<LegacyMigration> {
    let mut entries: Vec<(String, String)> = Vec::new();
    let mut remaining = display_name.to_string();

    if let Some((start, end, body)) = find_tag(display_name) {
        for entry in body.split(';') {
            if let Some((key, value)) = entry.split_once(':') {
                entries.push((key.trim().to_lowercase(), value.trim().to_string()));
            } else if !entry.trim().is_empty() {
                log::warn!("Ignoring malformed legacy entry '{}'", entry.trim());
            }
        }
        remaining.replace_range(start..end, " ");
    }

    let mut kept_words = Vec::new();
    for word in remaining.split_whitespace() {
        match flag_token(word) {
            Some((key, value)) => entries.push((key, value)),
            None => kept_words.push(word),
        }
    }

    if entries.is_empty() {
        return None;
    }

    let mut settings = ControlSettings::default();
    for (key, value) in &entries {
        match legacy_change(key, value, catalog) {
            Some(change) => {
                if let Err(e) = settings.apply(change, catalog) {
                    log::warn!("Skipping legacy setting {}:{}: {}", key, value, e);
                }
            }
            None => log::warn!("Skipping legacy setting {}:{}", key, value),
        }
    }

    let stripped = kept_words.join(" ");
    log::info!(
        "Migrated legacy settings from '{}' (now '{}')",
        display_name,
        stripped
    );

    Some(LegacyMigration {
        settings,
        display_name: stripped,
    })
}

/// Locate `{ControlModule:...}`, returning its byte span and body
fn find_tag(name: &str) -> Option<(usize, usize, &str)> {
    let lower = name.to_ascii_lowercase();
    let mut search_from = 0;

    while let Some(offset) = lower[search_from..].find('{') {
        let start = search_from + offset;
        let Some(close) = lower[start..].find('}') else {
            return None;
        };
        let end = start + close + 1;

        let inner = &name[start + 1..end - 1];
        if let Some((tag, body)) = inner.split_once(':') {
            if tag.trim().eq_ignore_ascii_case(TAG) {
                return Some((start, end, body));
            }
        }
        search_from = end;
    }

    None
}

/// A `+key:value` token with a known key
fn flag_token(word: &str) -> Option<(String, String)> {
    let (key, value) = word.strip_prefix('+')?.split_once(':')?;
    let key = key.to_lowercase();
    is_legacy_key(&key).then(|| (key, value.to_string()))
}

fn is_legacy_key(key: &str) -> bool {
    matches!(
        key,
        "input"
            | "state"
            | "check"
            | "hold"
            | "repeat"
            | "release"
            | "filter"
            | "debug"
            | "monitorinmenus"
            | "run"
    )
}

fn legacy_change(key: &str, value: &str, catalog: &InputCatalog) -> Option<SettingsChange> {
    let change = match key {
        "input" => {
            // Flag tokens cannot hold spaces, so they separate inputs with commas
            let spec = value.replace(',', " ");
            match InputSelection::parse(catalog, &spec) {
                Ok(selection) => SettingsChange::Input(selection),
                Err(e) => {
                    log::warn!("Legacy input '{}' not usable: {}", value, e);
                    return None;
                }
            }
        }
        "state" => SettingsChange::TriggerMode(TriggerMode::from_index(value.parse().ok()?)?),
        "check" => SettingsChange::CombineMode(CombineMode::from_index(value.parse().ok()?)?),
        "hold" => SettingsChange::Hold(parse_delay(value)?),
        "repeat" => SettingsChange::Repeat(parse_delay(value)?),
        "release" => SettingsChange::Release(parse_delay(value)?),
        "filter" => SettingsChange::Filter(Some(value.to_string())),
        "debug" => SettingsChange::Debug(parse_bool(value)?),
        "monitorinmenus" => SettingsChange::MonitorInMenus(parse_bool(value)?),
        "run" => SettingsChange::RunOnInput(parse_bool(value)?),
        _ => return None,
    };
    Some(change)
}
