use serde_json::Value;

/// A document handed to the builder.
///
/// Plain JSON is borrowed as-is through [`JsonInput::Value`]. Hosts that walk
/// language-native objects can spell out containers themselves and use
/// [`JsonInput::Undefined`] for fields that exist but carry no value. JSON has
/// no `undefined`, so it is built as a `Null` node and reconstructs as `null`.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonInput<'a> {
    Undefined,
    Value(&'a Value),
    Array(Vec<JsonInput<'a>>),
    Object(Vec<(String, JsonInput<'a>)>),
}

impl<'a> JsonInput<'a> {
    pub fn is_undefined(&self) -> bool {
        matches!(self, JsonInput::Undefined)
    }

    /// Number of direct children (keys or items); zero for scalars.
    pub fn child_count(&self) -> usize {
        match self {
            JsonInput::Value(Value::Object(map)) => map.len(),
            JsonInput::Value(Value::Array(items)) => items.len(),
            JsonInput::Array(items) => items.len(),
            JsonInput::Object(entries) => entries.len(),
            _ => 0,
        }
    }
}

impl<'a> From<&'a Value> for JsonInput<'a> {
    fn from(value: &'a Value) -> Self {
        JsonInput::Value(value)
    }
}
