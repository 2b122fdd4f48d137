//! Live configuration edits expressed as JSON merge patches.
//!
//! A patch is merged into the serialized current configuration, so every key
//! must already exist and keep its JSON type. The merged document is decoded
//! again with field-path reporting and validated before the world adopts it.

use serde::Serialize;
use serde_json::{Map, Value};
use shoal_core::{ShoalConfig, WorldError};
use smallvec::SmallVec;
use thiserror::Error;
use tracing::info;

use crate::session::Session;

/// Current configuration as JSON, stamped with the tick it was read at.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConfigSnapshot {
    pub tick: u64,
    pub config: Value,
}

impl ConfigSnapshot {
    fn from_config(config: &ShoalConfig, tick: u64) -> Result<Self, ControlError> {
        let config = serde_json::to_value(config).map_err(ControlError::serialization)?;
        Ok(Self { tick, config })
    }
}

/// Single knob edit addressed by a dotted path such as `food.max_food`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct KnobUpdate {
    pub path: String,
    pub value: Value,
}

impl KnobUpdate {
    pub fn new(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: path.into(),
            value,
        }
    }
}

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("{0}")]
    InvalidPatch(String),
    #[error("unknown knob path: {0}")]
    UnknownPath(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("configuration rejected: {0}")]
    Rejected(#[from] WorldError),
}

impl ControlError {
    fn serialization(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }

    fn mismatch(path: &[&str]) -> Self {
        Self::InvalidPatch(format!("type mismatch at {}", path_display(path)))
    }
}

pub fn config_snapshot(session: &Session) -> Result<ConfigSnapshot, ControlError> {
    let world = session.world();
    ConfigSnapshot::from_config(world.config(), world.tick_count().0)
}

/// Merge `patch` into the running configuration and hand the result to the world.
///
/// Nothing changes unless the merged configuration decodes and validates.
pub fn apply_patch(session: &mut Session, patch: Value) -> Result<ConfigSnapshot, ControlError> {
    if !patch.is_object() {
        return Err(ControlError::InvalidPatch(
            "configuration patch must be a JSON object".into(),
        ));
    }
    commit(session, std::slice::from_ref(&patch))
}

/// Apply a batch of dotted-path knob edits, all or nothing.
pub fn apply_updates(
    session: &mut Session,
    updates: &[KnobUpdate],
) -> Result<ConfigSnapshot, ControlError> {
    let patches = updates
        .iter()
        .map(|update| nest(&update.path, update.value.clone()))
        .collect::<Result<Vec<_>, _>>()?;
    commit(session, &patches)
}

fn commit(session: &mut Session, patches: &[Value]) -> Result<ConfigSnapshot, ControlError> {
    let mut config_value =
        serde_json::to_value(session.world().config()).map_err(ControlError::serialization)?;
    for patch in patches {
        let mut path = SmallVec::<[&str; 8]>::new();
        merge_value(&mut config_value, patch, &mut path)?;
    }

    let config: ShoalConfig = serde_path_to_error::deserialize(config_value).map_err(
        |err: serde_path_to_error::Error<serde_json::Error>| {
            ControlError::InvalidPatch(format!("{} at {}", err.inner(), err.path()))
        },
    )?;

    let world = session.world_mut();
    world.set_config(config)?;
    info!(
        tick = world.tick_count().0,
        patches = patches.len(),
        "configuration patch applied"
    );
    ConfigSnapshot::from_config(world.config(), world.tick_count().0)
}

/// Expands `food.max_food = 4` into `{"food": {"max_food": 4}}`.
fn nest(path: &str, value: Value) -> Result<Value, ControlError> {
    let segments: SmallVec<[&str; 8]> = path.split('.').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(ControlError::InvalidPatch(format!(
            "malformed knob path '{path}'"
        )));
    }
    Ok(segments.iter().rev().fold(value, |inner, key| {
        let mut map = Map::new();
        map.insert((*key).to_owned(), inner);
        Value::Object(map)
    }))
}

fn path_display(path: &[&str]) -> String {
    path.join(".")
}

/// Tagged enums (`{"kind": ...}`) switch variant wholesale; their fields differ per variant.
fn switches_variant(target: &Map<String, Value>, patch: &Map<String, Value>) -> bool {
    match (target.get("kind"), patch.get("kind")) {
        (Some(Value::String(current)), Some(Value::String(next))) => current != next,
        _ => false,
    }
}

/// Objects merge key by key; every other knob is replaced by a value of the same JSON kind.
///
/// Unset optional knobs (`null`, such as `rng_seed`) take any value and
/// decoding checks the result. Numeric width is left to decoding as well.
fn merge_value<'a>(
    target: &mut Value,
    patch: &'a Value,
    path: &mut SmallVec<[&'a str; 8]>,
) -> Result<(), ControlError> {
    match (target, patch) {
        (Value::Object(fields), Value::Object(edits)) if !switches_variant(fields, edits) => {
            for (key, edit) in edits {
                path.push(key);
                let Some(field) = fields.get_mut(key) else {
                    return Err(ControlError::UnknownPath(path_display(path)));
                };
                merge_value(field, edit, path)?;
                path.pop();
            }
            Ok(())
        }
        (target, patch)
            if target.is_null()
                || std::mem::discriminant(&*target) == std::mem::discriminant(patch) =>
        {
            *target = patch.clone();
            Ok(())
        }
        _ => Err(ControlError::mismatch(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn merged(patch: Value) -> Result<Value, ControlError> {
        let mut target = json!({
            "food": { "max_food": 30, "spawn_probability": 0.02 },
            "update_order": "interleaved",
            "rng_seed": null,
            "lifecycle": { "kind": "immortal" },
        });
        let mut path = SmallVec::<[&str; 8]>::new();
        merge_value(&mut target, &patch, &mut path)?;
        Ok(target)
    }

    #[test]
    fn nested_values_are_replaced_in_place() {
        let value = merged(json!({ "food": { "max_food": 12 } })).expect("merge");
        assert_eq!(value["food"]["max_food"], json!(12));
        assert_eq!(value["food"]["spawn_probability"], json!(0.02));
    }

    #[test]
    fn numbers_must_arrive_as_numbers() {
        let err = merged(json!({ "food": { "spawn_probability": "0.5" } })).expect_err("string");
        assert!(matches!(err, ControlError::InvalidPatch(msg) if msg.contains("food.spawn_probability")));
        let value = merged(json!({ "food": { "spawn_probability": 1 } })).expect("integer literal");
        assert_eq!(value["food"]["spawn_probability"], json!(1));
    }

    #[test]
    fn unknown_keys_report_their_path() {
        let err = merged(json!({ "food": { "max_fod": 3 } })).expect_err("unknown");
        assert!(matches!(err, ControlError::UnknownPath(path) if path == "food.max_fod"));
    }

    #[test]
    fn type_mismatches_are_rejected() {
        let err = merged(json!({ "update_order": 3 })).expect_err("mismatch");
        assert!(matches!(err, ControlError::InvalidPatch(msg) if msg.contains("update_order")));
        assert!(merged(json!({ "food": 3 })).is_err());
        assert!(merged(json!({ "food": { "max_food": null } })).is_err());
    }

    #[test]
    fn tagged_variants_switch_wholesale() {
        let value = merged(json!({ "lifecycle": { "kind": "energy_gated", "max_population": 9 } }))
            .expect("merge");
        assert_eq!(value["lifecycle"]["max_population"], json!(9));
        assert!(merged(json!({ "lifecycle": { "max_population": 9 } })).is_err());
        assert_eq!(merged(json!({ "rng_seed": 4 })).expect("merge")["rng_seed"], json!(4));
    }

    #[test]
    fn dotted_paths_nest_into_objects() {
        assert_eq!(
            nest("food.max_food", json!(5)).expect("nest"),
            json!({ "food": { "max_food": 5 } })
        );
        assert_eq!(nest("arena_margin", json!(10.0)).expect("nest"), json!({ "arena_margin": 10.0 }));
        assert!(nest("food..max_food", json!(1)).is_err());
        assert!(nest("", json!(1)).is_err());
    }
}
