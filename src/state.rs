//! Application state, edits and persistence.
//!
//! The persisted form is a flat JSON object:
//!
//! ```json
//! { "func1.func": "x + a", "func2.func": "1 - x", "blendFunc.func": "x", "env.a": 0.5 }
//! ```
//!
//! Keys that are missing keep their defaults, unknown keys are ignored, and a payload that
//! cannot be read at all is replaced by [`AppState::default`].

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::Real;
use crate::compiler::{Slot, Sources};
use crate::error::StateError;

const ENV_PREFIX: &str = "env.";

/// Persistence key of a slot's text.
pub fn storage_key(slot: Slot) -> &'static str {
    match slot {
        Slot::F1 => "func1.func",
        Slot::F2 => "func2.func",
        Slot::Blend => "blendFunc.func",
    }
}

/// Current parameter values by name.
///
/// A name with no entry reads as `0`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Environment {
    values: BTreeMap<String, Real>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Real {
        self.values.get(name).copied().unwrap_or(0.0)
    }

    /// Set a parameter, returning the previous value if there was one.
    pub fn set(&mut self, name: &str, value: Real) -> Option<Real> {
        self.values.insert(name.to_string(), value)
    }

    pub fn remove(&mut self, name: &str) -> Option<Real> {
        self.values.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Real)> {
        self.values.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A single change made through the editor.
#[derive(Clone, Debug, PartialEq)]
pub enum Edit {
    /// Replace the text of one expression.
    Function { slot: Slot, text: String },
    /// Set one parameter value.
    Parameter { name: String, value: Real },
}

/// Everything the user edits: the three expressions and the parameter values.
#[derive(Clone, Debug, PartialEq)]
pub struct AppState {
    pub f1: String,
    pub f2: String,
    pub blend: String,
    pub env: Environment,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            f1: "x".to_string(),
            f2: "1 - x".to_string(),
            blend: "x".to_string(),
            env: Environment::new(),
        }
    }
}

impl AppState {
    pub fn sources(&self) -> Sources<'_> {
        Sources::new(&self.f1, &self.f2, &self.blend)
    }

    pub fn text(&self, slot: Slot) -> &str {
        match slot {
            Slot::F1 => &self.f1,
            Slot::F2 => &self.f2,
            Slot::Blend => &self.blend,
        }
    }

    fn text_mut(&mut self, slot: Slot) -> &mut String {
        match slot {
            Slot::F1 => &mut self.f1,
            Slot::F2 => &mut self.f2,
            Slot::Blend => &mut self.blend,
        }
    }

    pub fn apply(&mut self, edit: Edit) {
        match edit {
            Edit::Function { slot, text } => *self.text_mut(slot) = text,
            Edit::Parameter { name, value } => {
                self.env.set(&name, value);
            }
        }
    }

    /// Serialize to the flat persisted form.
    ///
    /// Non-finite parameter values have no JSON number form and are written as `null`,
    /// which reads back as an absent value.
    pub fn to_json(&self) -> String {
        let mut map = Map::new();
        for slot in Slot::ALL {
            map.insert(
                storage_key(slot).to_string(),
                Value::String(self.text(slot).to_string()),
            );
        }
        for (name, value) in self.env.iter() {
            let number = Number::from_f64(f64::from(value)).map_or(Value::Null, Value::Number);
            map.insert(format!("{}{}", ENV_PREFIX, name), number);
        }
        Value::Object(map).to_string()
    }

    /// Parse the flat persisted form.
    pub fn from_json(json: &str) -> Result<Self, StateError> {
        let value: Value = serde_json::from_str(json)?;
        let Value::Object(map) = value else {
            return Err(StateError::NotAnObject);
        };

        let mut state = AppState::default();
        for slot in Slot::ALL {
            let key = storage_key(slot);
            match map.get(key) {
                None => {}
                Some(Value::String(text)) => *state.text_mut(slot) = text.clone(),
                Some(_) => return Err(StateError::InvalidValue { key: key.to_string() }),
            }
        }
        for (key, value) in &map {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match value {
                Value::Null => {}
                Value::Number(number) => {
                    let value = number
                        .as_f64()
                        .ok_or_else(|| StateError::InvalidValue { key: key.clone() })?;
                    state.env.set(name, value as Real);
                }
                _ => return Err(StateError::InvalidValue { key: key.clone() }),
            }
        }
        Ok(state)
    }
}

/// Durable storage for the persisted state payload.
pub trait StateStore {
    /// The stored payload, or `None` if nothing was saved yet.
    fn load(&self) -> Result<Option<String>, StateError>;
    fn save(&mut self, payload: &str) -> Result<(), StateError>;
}

/// A store that keeps the payload in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    payload: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(payload: impl Into<String>) -> Self {
        Self {
            payload: Some(payload.into()),
        }
    }

    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<String>, StateError> {
        Ok(self.payload.clone())
    }

    fn save(&mut self, payload: &str) -> Result<(), StateError> {
        self.payload = Some(payload.to_string());
        Ok(())
    }
}

/// A store backed by a single JSON file.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StateStore for FileStore {
    fn load(&self) -> Result<Option<String>, StateError> {
        match fs::read_to_string(&self.path) {
            Ok(payload) => Ok(Some(payload)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&mut self, payload: &str) -> Result<(), StateError> {
        fs::write(&self.path, payload)?;
        Ok(())
    }
}

/// Load the state from `store`, falling back to the defaults when nothing is stored or the
/// payload cannot be read.
pub fn load_state<S: StateStore + ?Sized>(store: &S) -> AppState {
    let payload = match store.load() {
        Ok(Some(payload)) => payload,
        Ok(None) => {
            debug!("no stored state, using defaults");
            return AppState::default();
        }
        Err(err) => {
            warn!("unable to read stored state, using defaults: {}", err);
            return AppState::default();
        }
    };
    match AppState::from_json(&payload) {
        Ok(state) => state,
        Err(err) => {
            warn!("unable to parse stored state, using defaults: {}", err);
            AppState::default()
        }
    }
}

pub fn save_state<S: StateStore + ?Sized>(store: &mut S, state: &AppState) -> Result<(), StateError> {
    store.save(&state.to_json())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> AppState {
        let mut state = AppState {
            f1: "x + a".to_string(),
            f2: "sin(b * x)".to_string(),
            blend: "".to_string(),
            env: Environment::new(),
        };
        state.env.set("a", 0.25);
        state.env.set("b", 0.875);
        state
    }

    #[test]
    fn test_environment_defaults_to_zero() {
        let mut env = Environment::new();
        assert_eq!(env.get("missing"), 0.0);
        assert_eq!(env.set("a", 1.5), None);
        assert_eq!(env.set("a", 2.0), Some(1.5));
        assert_eq!(env.get("a"), 2.0);
        assert!(env.contains("a"));
        assert_eq!(env.remove("a"), Some(2.0));
        assert!(env.is_empty());
    }

    #[test]
    fn test_edits() {
        let mut state = AppState::default();
        state.apply(Edit::Function {
            slot: Slot::F2,
            text: "x * x".to_string(),
        });
        state.apply(Edit::Parameter {
            name: "k".to_string(),
            value: -3.0,
        });
        assert_eq!(state.f2, "x * x");
        assert_eq!(state.f1, "x");
        assert_eq!(state.env.get("k"), -3.0);
    }

    #[test]
    fn test_flat_json_layout() {
        let json = sample_state().to_json();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["func1.func"], "x + a");
        assert_eq!(value["func2.func"], "sin(b * x)");
        assert_eq!(value["blendFunc.func"], "");
        assert_eq!(value["env.a"], 0.25);
        assert_eq!(value["env.b"], 0.875);
    }

    #[test]
    fn test_round_trip() {
        let state = sample_state();
        assert_eq!(AppState::from_json(&state.to_json()).unwrap(), state);
    }

    #[test]
    fn test_missing_keys_keep_defaults() {
        let state = AppState::from_json(r#"{"func2.func": "0", "other": [1]}"#).unwrap();
        assert_eq!(state.f1, "x");
        assert_eq!(state.f2, "0");
        assert_eq!(state.blend, "x");
        assert!(state.env.is_empty());
    }

    #[test]
    fn test_non_finite_values_read_back_as_absent() {
        let mut state = AppState::default();
        state.env.set("a", Real::NAN);
        let json = state.to_json();
        assert!(json.contains("\"env.a\":null"));
        let restored = AppState::from_json(&json).unwrap();
        assert!(!restored.env.contains("a"));
        assert_eq!(restored.env.get("a"), 0.0);
    }

    #[test]
    fn test_corrupt_payloads() {
        assert!(matches!(
            AppState::from_json("{not json"),
            Err(StateError::Json(_))
        ));
        assert!(matches!(
            AppState::from_json("[1, 2]"),
            Err(StateError::NotAnObject)
        ));
        assert!(matches!(
            AppState::from_json(r#"{"func1.func": 3}"#),
            Err(StateError::InvalidValue { .. })
        ));
        assert!(matches!(
            AppState::from_json(r#"{"env.a": "high"}"#),
            Err(StateError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_load_state_falls_back_to_defaults() {
        assert_eq!(load_state(&MemoryStore::new()), AppState::default());
        assert_eq!(
            load_state(&MemoryStore::with_payload("{\"func1.func\": ")),
            AppState::default()
        );
        let mut store = MemoryStore::new();
        save_state(&mut store, &sample_state()).unwrap();
        assert_eq!(load_state(&store), sample_state());
    }

    #[test]
    fn test_file_store_round_trip() {
        let path = std::env::temp_dir().join(format!("funfun-state-{}.json", std::process::id()));
        let mut store = FileStore::new(&path);
        let _ = fs::remove_file(&path);
        assert_eq!(store.load().unwrap(), None);
        save_state(&mut store, &sample_state()).unwrap();
        assert_eq!(load_state(&store), sample_state());
        let _ = fs::remove_file(&path);
    }
}
