use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const NAME_KEY: &str = "name";
const FRAME_TV_SUPPORT_KEY: &str = "FrameTVSupport";

/// Cached device description.
///
/// Starts as the merged REST discovery result and absorbs every later
/// `get_device_info` event. Fields are only ever added or overwritten.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceInfo(Map<String, Value>);

impl DeviceInfo {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Overwrite or add every field of `update`. Nothing is removed.
    pub fn merge(&mut self, update: Map<String, Value>) {
        for (key, value) in update {
            self.0.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Display name the device reports for itself.
    pub fn name(&self) -> Option<&str> {
        self.0.get(NAME_KEY).and_then(Value::as_str)
    }

    /// The device reports this as the string `"true"`, not a JSON bool.
    pub fn has_frame_tv_support(&self) -> bool {
        match self.0.get(FRAME_TV_SUPPORT_KEY) {
            Some(Value::String(s)) => s == "true",
            Some(Value::Bool(b)) => *b,
            _ => false,
        }
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for DeviceInfo {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}
