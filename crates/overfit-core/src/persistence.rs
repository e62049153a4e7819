//! Save/Load for game sessions.
//!
//! Two formats:
//!
//! - **JSON** ([`serialize_state`] / [`deserialize_state`]): the portable
//!   save. Every save carries a `version` tag. Older saves are migrated
//!   step by step ([`migrate`]) before they are decoded, then checked by
//!   [`validate_state`]. A save that fails any step is rejected whole.
//! - **Binary** ([`save_binary`] / [`load_binary`]): a compact bincode
//!   snapshot for quick save slots. No migration; a format mismatch is an
//!   error.

use std::io::{Read, Write};

use log::warn;
use serde_json::{Map, Value};
use thiserror::Error;

use overfit_logic::constants::{equipment as equipment_limits, gauges, CURRENT_VERSION};
use overfit_logic::equipment::{Equipment, EquipmentTrack};
use overfit_logic::state::{Dimension, Dimensions, GameState, GameStatus};

/// Version number for the binary snapshot header (increment when the layout changes)
const BINARY_SAVE_VERSION: u32 = 1;

/// Schema versions this build can read, oldest first.
pub const KNOWN_VERSIONS: [&str; 3] = ["1.0", "1.1", CURRENT_VERSION];

/// Errors that can occur during save/load
#[derive(Debug, Error)]
pub enum SaveError {
    /// The save decoded but does not describe a valid game.
    #[error("invalid save data: {0}")]
    InvalidSaveData(String),
    /// The state handed in cannot be persisted safely.
    #[error("state cannot be serialized: {0}")]
    SerializationFailure(String),
    #[error("unsupported save version `{0}`")]
    UnsupportedVersion(String),
    #[error("save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("serialization error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ── Validation ─────────────────────────────────────────────────────

fn check_percent(name: &str, value: i32) -> Result<(), String> {
    if (gauges::MIN..=gauges::MAX).contains(&value) {
        Ok(())
    } else {
        Err(format!("{} out of range: {}", name, value))
    }
}

/// Structural checks on a decoded state. Returns the first problem found.
pub fn validate_state(state: &GameState) -> Result<(), String> {
    let m = &state.metrics;
    for (name, value) in [
        ("fitScore", m.fit_score),
        ("entropy", m.entropy),
        ("fitScoreCap", m.fit_score_cap),
        ("accuracy", m.accuracy),
        ("speed", m.speed),
        ("creativity", m.creativity),
        ("robustness", m.robustness),
        ("legalRisk", state.risks.legal_risk),
        ("reputation", state.reputation),
    ] {
        check_percent(name, value)?;
    }
    for dim in Dimension::ALL {
        check_percent(dim.label(), state.dimensions.get(dim))?;
    }
    if m.fit_score > m.fit_score_cap {
        return Err(format!("fitScore {} above cap {}", m.fit_score, m.fit_score_cap));
    }

    let r = &state.resources;
    if r.compute_points > r.compute_max {
        return Err(format!("computePoints {} above computeMax {}", r.compute_points, r.compute_max));
    }
    if r.dirty_data as u64 + r.golden_data as u64 > r.data_capacity as u64 {
        return Err("stored data exceeds dataCapacity".to_string());
    }
    if state.progress.turn == 0 {
        return Err("turn counter must start at 1".to_string());
    }

    for track in EquipmentTrack::ALL {
        let level = state.equipment.get(track).level;
        if !(equipment_limits::MIN_LEVEL..=equipment_limits::MAX_LEVEL).contains(&level) {
            return Err(format!("{} level out of range: {}", track.label(), level));
        }
    }

    let members = || state.team.iter().chain(state.hiring_pool.iter());
    for m in members() {
        if m.hiring_cost < 0 || m.salary < 0 {
            return Err(format!("member {} has a negative hiring cost or salary", m.id));
        }
    }
    let mut ids: Vec<u32> = members().map(|m| m.id).collect();
    let total = ids.len();
    ids.sort_unstable();
    ids.dedup();
    if ids.len() != total {
        return Err("member ids are not unique across team and hiring pool".to_string());
    }
    if let Some(&highest) = ids.last() {
        if state.next_member_id <= highest {
            return Err(format!(
                "nextMemberId {} does not exceed member id {}",
                state.next_member_id, highest
            ));
        }
    }

    match (state.game_status, state.ending_type) {
        (GameStatus::Playing, None) => {}
        (GameStatus::Playing, Some(_)) => return Err("ending set on a game in progress".to_string()),
        (_, None) => return Err("finished game without an ending".to_string()),
        (status, Some(ending)) => {
            if ending.is_victory() != (status == GameStatus::Victory) {
                return Err(format!("ending {} does not match status {:?}", ending.id(), status));
            }
        }
    }
    Ok(())
}

// ── Migration ──────────────────────────────────────────────────────

fn to_value<T: serde::Serialize>(value: T) -> Result<Value, SaveError> {
    serde_json::to_value(value).map_err(|e| SaveError::SerializationFailure(e.to_string()))
}

fn object_mut<'a>(value: &'a mut Value, what: &str) -> Result<&'a mut Map<String, Value>, SaveError> {
    value
        .as_object_mut()
        .ok_or_else(|| SaveError::InvalidSaveData(format!("{} is not an object", what)))
}

/// Bring a raw save from `from_version` up to the current schema.
///
/// One step per version, each backfilling only the fields that version
/// introduced:
///
/// | Step | Backfilled default |
/// |------|--------------------|
/// | 1.0 → 1.1 | `dimensions`: all 20 |
/// | 1.1 → 1.2 | `reputation`: 0, `equipment`: every track level 1, `risks.meltdownTurns`: 0 |
pub fn migrate(raw: Value, from_version: &str) -> Result<Value, SaveError> {
    let mut raw = raw;
    let mut version = from_version.to_string();
    loop {
        match version.as_str() {
            "1.0" => {
                let obj = object_mut(&mut raw, "save")?;
                if !obj.contains_key("dimensions") {
                    obj.insert("dimensions".to_string(), to_value(Dimensions::uniform(20))?);
                }
                version = "1.1".to_string();
            }
            "1.1" => {
                let obj = object_mut(&mut raw, "save")?;
                obj.entry("reputation").or_insert(Value::from(0));
                if !obj.contains_key("equipment") {
                    obj.insert("equipment".to_string(), to_value(Equipment::default())?);
                }
                if let Some(risks) = obj.get_mut("risks") {
                    object_mut(risks, "risks")?
                        .entry("meltdownTurns")
                        .or_insert(Value::from(0));
                }
                version = CURRENT_VERSION.to_string();
            }
            v if v == CURRENT_VERSION => break,
            other => return Err(SaveError::UnsupportedVersion(other.to_string())),
        }
    }
    object_mut(&mut raw, "save")?.insert("version".to_string(), Value::from(CURRENT_VERSION));
    if from_version != CURRENT_VERSION {
        warn!("migrated save from version {} to {}", from_version, CURRENT_VERSION);
    }
    Ok(raw)
}

// ── JSON ───────────────────────────────────────────────────────────

/// Serialize a state to a JSON save stamped with the current version.
pub fn serialize_state(state: &GameState) -> Result<String, SaveError> {
    validate_state(state).map_err(SaveError::SerializationFailure)?;
    let mut stamped = state.clone();
    stamped.version = CURRENT_VERSION.to_string();
    serde_json::to_string(&stamped).map_err(|e| SaveError::SerializationFailure(e.to_string()))
}

/// Decode, migrate and validate a JSON save.
pub fn deserialize_state(json: &str) -> Result<GameState, SaveError> {
    let raw: Value = serde_json::from_str(json).map_err(|e| SaveError::InvalidSaveData(e.to_string()))?;
    let version = raw
        .get("version")
        .and_then(Value::as_str)
        .ok_or_else(|| SaveError::InvalidSaveData("missing version tag".to_string()))?
        .to_string();

    let migrated = migrate(raw, &version)?;
    let state: GameState =
        serde_json::from_value(migrated).map_err(|e| SaveError::InvalidSaveData(e.to_string()))?;
    validate_state(&state).map_err(SaveError::InvalidSaveData)?;
    Ok(state)
}

// ── Binary ─────────────────────────────────────────────────────────

/// Write a binary snapshot: format header, then the state.
pub fn save_binary<W: Write>(mut writer: W, state: &GameState) -> Result<(), SaveError> {
    validate_state(state).map_err(SaveError::SerializationFailure)?;
    bincode::serialize_into(&mut writer, &BINARY_SAVE_VERSION)?;
    bincode::serialize_into(&mut writer, state)?;
    Ok(())
}

/// Read a binary snapshot written by [`save_binary`].
pub fn load_binary<R: Read>(mut reader: R) -> Result<GameState, SaveError> {
    let format: u32 = bincode::deserialize_from(&mut reader)?;
    if format != BINARY_SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: BINARY_SAVE_VERSION,
            found: format,
        });
    }
    let state: GameState = bincode::deserialize_from(&mut reader)?;
    if state.version != CURRENT_VERSION {
        return Err(SaveError::UnsupportedVersion(state.version));
    }
    validate_state(&state).map_err(SaveError::InvalidSaveData)?;
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use overfit_logic::archetypes::Archetype;
    use overfit_logic::difficulty::Difficulty;
    use overfit_logic::state::{create_game, EndingType};
    use overfit_logic::tables::GameTables;
    use overfit_logic::team::refresh_hiring_pool;
    use rand::{rngs::SmallRng, SeedableRng};

    fn sample() -> GameState {
        let tables = GameTables::standard();
        let mut rng = SmallRng::seed_from_u64(77);
        let mut state = create_game(Archetype::Academic, Difficulty::Hard, &tables);
        refresh_hiring_pool(&mut state, &tables, &mut rng);
        let hired = state.hiring_pool.remove(0);
        state.team.push(hired);
        state.equipment.gpu.level = 3;
        state.equipment.gpu.bonus_percent = 20;
        state.risks.meltdown_turns = 1;
        state.risks.server_meltdown = true;
        state
    }

    #[test]
    fn test_json_round_trip() {
        let state = sample();
        let json = serialize_state(&state).unwrap();
        let loaded = deserialize_state(&json).unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_round_trip_edge_values() {
        let mut state = sample();
        state.resources.budget = -5000;
        state.team.clear();
        state.hiring_pool.clear();
        for dims in [Dimensions::uniform(0), Dimensions::uniform(100)] {
            state.dimensions = dims;
            let loaded = deserialize_state(&serialize_state(&state).unwrap()).unwrap();
            assert_eq!(loaded, state);
        }
    }

    #[test]
    fn test_round_trip_finished_game() {
        let mut state = sample();
        state.finish(GameStatus::Victory, EndingType::IndustryLeader, "passed 12 exams");
        let loaded = deserialize_state(&serialize_state(&state).unwrap()).unwrap();
        assert_eq!(loaded.game_status, GameStatus::Victory);
        assert_eq!(loaded.ending_type, Some(EndingType::IndustryLeader));
        assert_eq!(loaded.game_over_reason.as_deref(), Some("passed 12 exams"));
    }

    #[test]
    fn test_output_carries_current_version() {
        let mut state = sample();
        state.version = "1.0".to_string();
        let json = serialize_state(&state).unwrap();
        let raw: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(raw["version"], CURRENT_VERSION);
    }

    fn legacy(version: &str, strip: &[&str]) -> Value {
        let mut raw: Value = serde_json::from_str(&serialize_state(&sample()).unwrap()).unwrap();
        let obj = raw.as_object_mut().unwrap();
        for key in strip {
            obj.remove(*key);
        }
        if version != CURRENT_VERSION {
            obj["risks"].as_object_mut().unwrap().remove("meltdownTurns");
        }
        obj.insert("version".into(), Value::from(version));
        raw
    }

    #[test]
    fn test_migrate_from_1_0() {
        let raw = legacy("1.0", &["dimensions", "reputation", "equipment"]);
        let state = deserialize_state(&raw.to_string()).unwrap();
        assert_eq!(state.version, CURRENT_VERSION);
        assert_eq!(state.dimensions, Dimensions::uniform(20));
        assert_eq!(state.reputation, 0);
        assert_eq!(state.equipment, Equipment::default());
        assert_eq!(state.risks.meltdown_turns, 0);
    }

    #[test]
    fn test_migrate_from_1_1_keeps_dimensions() {
        let mut raw = legacy("1.1", &["reputation", "equipment"]);
        raw["dimensions"]["stability"] = Value::from(64);
        let state = deserialize_state(&raw.to_string()).unwrap();
        assert_eq!(state.dimensions.stability, 64);
        assert_eq!(state.reputation, 0);
    }

    #[test]
    fn test_migrate_does_not_overwrite_present_fields() {
        let mut raw = legacy("1.1", &[]);
        raw["reputation"] = Value::from(42);
        let migrated = migrate(raw, "1.1").unwrap();
        assert_eq!(migrated["reputation"], 42);
        assert_eq!(migrated["version"], CURRENT_VERSION);
    }

    #[test]
    fn test_unknown_version_rejected() {
        let raw = legacy("9.9", &[]);
        let err = deserialize_state(&raw.to_string()).unwrap_err();
        assert!(matches!(err, SaveError::UnsupportedVersion(v) if v == "9.9"));
    }

    #[test]
    fn test_missing_version_rejected() {
        let mut raw = legacy("1.2", &[]);
        raw.as_object_mut().unwrap().remove("version");
        assert!(matches!(
            deserialize_state(&raw.to_string()),
            Err(SaveError::InvalidSaveData(_))
        ));
    }

    #[test]
    fn test_malformed_saves_rejected() {
        assert!(matches!(deserialize_state("not json"), Err(SaveError::InvalidSaveData(_))));

        let mut raw = legacy("1.2", &[]);
        raw["archetype"] = Value::from("megacorp");
        assert!(matches!(deserialize_state(&raw.to_string()), Err(SaveError::InvalidSaveData(_))));

        let mut raw = legacy("1.2", &[]);
        raw["metrics"]["entropy"] = Value::from(140);
        assert!(matches!(deserialize_state(&raw.to_string()), Err(SaveError::InvalidSaveData(_))));

        let mut raw = legacy("1.2", &[]);
        raw["resources"]["budget"] = Value::from("lots");
        assert!(matches!(deserialize_state(&raw.to_string()), Err(SaveError::InvalidSaveData(_))));
    }

    #[test]
    fn test_every_known_version_migrates() {
        let stripped: [&[&str]; 3] = [&["dimensions", "reputation", "equipment"], &["reputation", "equipment"], &[]];
        for (version, strip) in KNOWN_VERSIONS.into_iter().zip(stripped) {
            let raw = legacy(version, strip);
            let state = deserialize_state(&raw.to_string()).unwrap_or_else(|e| panic!("{}: {}", version, e));
            assert_eq!(state.version, CURRENT_VERSION);
        }
    }

    #[test]
    fn test_invalid_state_not_serialized() {
        let mut state = sample();
        state.metrics.accuracy = 250;
        assert!(matches!(serialize_state(&state), Err(SaveError::SerializationFailure(_))));
    }

    #[test]
    fn test_negative_member_costs_rejected() {
        let mut state = sample();
        state.hiring_pool[0].hiring_cost = -5000;
        let mut raw: Value = serde_json::from_str(&serialize_state(&sample()).unwrap()).unwrap();
        raw["hiringPool"][0]["hiringCost"] = Value::from(-5000);
        assert!(matches!(deserialize_state(&raw.to_string()), Err(SaveError::InvalidSaveData(_))));
        assert!(matches!(serialize_state(&state), Err(SaveError::SerializationFailure(_))));

        let mut raw: Value = serde_json::from_str(&serialize_state(&sample()).unwrap()).unwrap();
        raw["team"][0]["salary"] = Value::from(-9000);
        assert!(matches!(deserialize_state(&raw.to_string()), Err(SaveError::InvalidSaveData(_))));
    }

    #[test]
    fn test_stale_member_counter_rejected() {
        let state = sample();
        let highest = state.team.iter().chain(&state.hiring_pool).map(|m| m.id).max().unwrap();
        let mut raw: Value = serde_json::from_str(&serialize_state(&state).unwrap()).unwrap();
        raw["nextMemberId"] = Value::from(highest);
        assert!(matches!(deserialize_state(&raw.to_string()), Err(SaveError::InvalidSaveData(_))));

        raw["nextMemberId"] = Value::from(highest + 1);
        assert!(deserialize_state(&raw.to_string()).is_ok());
    }

    #[test]
    fn test_binary_round_trip() {
        let state = sample();
        let mut buffer = Vec::new();
        save_binary(&mut buffer, &state).unwrap();
        let loaded = load_binary(&buffer[..]).unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_binary_version_mismatch() {
        let mut buffer = Vec::new();
        bincode::serialize_into(&mut buffer, &(BINARY_SAVE_VERSION + 1)).unwrap();
        match load_binary(&buffer[..]) {
            Err(SaveError::VersionMismatch { expected, found }) => {
                assert_eq!(expected, BINARY_SAVE_VERSION);
                assert_eq!(found, BINARY_SAVE_VERSION + 1);
            }
            other => panic!("expected version mismatch, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_binary_truncated() {
        let mut buffer = Vec::new();
        save_binary(&mut buffer, &sample()).unwrap();
        buffer.truncate(buffer.len() / 2);
        assert!(load_binary(&buffer[..]).is_err());
    }
}
