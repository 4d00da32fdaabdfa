use jsongraph_core::{JsonInput, ValueKind};
use serde_json::Value;
use thiserror::Error;

/// Shown in place of a value whose formatter failed.
pub const UNFORMATTABLE_SENTINEL: &str = "[unformattable value]";
/// Default cap on characters shown for string values.
pub const DEFAULT_MAX_DISPLAY_CHARS: usize = 100;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    #[error("{kind} value rejected by formatter: {reason}")]
    Rejected { kind: ValueKind, reason: String },
}

pub fn classify_value(value: &Value) -> ValueKind {
    match value {
        Value::Object(_) => ValueKind::Object,
        Value::Array(_) => ValueKind::Array,
        Value::String(_) => ValueKind::String,
        Value::Number(_) => ValueKind::Number,
        Value::Bool(_) => ValueKind::Boolean,
        Value::Null => ValueKind::Null,
    }
}

pub fn classify(input: &JsonInput<'_>) -> ValueKind {
    match input {
        JsonInput::Undefined => ValueKind::Null,
        JsonInput::Value(value) => classify_value(value),
        JsonInput::Array(_) => ValueKind::Array,
        JsonInput::Object(_) => ValueKind::Object,
    }
}

/// Turns a value into the label a renderer shows. Implementations may fail;
/// the builder swaps failures for [`UNFORMATTABLE_SENTINEL`].
pub trait DisplayFormatter {
    fn format(&self, input: &JsonInput<'_>, kind: ValueKind) -> Result<String, FormatError>;
}

#[derive(Debug, Clone, Copy)]
pub struct DefaultFormatter {
    /// Truncate long strings and escape control characters.
    pub safe_display: bool,
    pub max_chars: usize,
}

impl Default for DefaultFormatter {
    fn default() -> Self {
        Self {
            safe_display: true,
            max_chars: DEFAULT_MAX_DISPLAY_CHARS,
        }
    }
}

impl DefaultFormatter {
    pub fn new(safe_display: bool, max_chars: usize) -> Self {
        Self {
            safe_display,
            max_chars,
        }
    }

    fn format_string(&self, s: &str) -> String {
        if !self.safe_display {
            return format!("\"{}\"", s);
        }

        let mut out = String::with_capacity(s.len().min(self.max_chars) + 5);
        out.push('"');
        let mut truncated = false;
        for (count, ch) in s.chars().enumerate() {
            if count == self.max_chars {
                truncated = true;
                break;
            }
            if ch.is_control() {
                out.extend(ch.escape_default());
            } else {
                out.push(ch);
            }
        }
        if truncated {
            out.push_str("...");
        }
        out.push('"');
        out
    }
}

fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("{} {}", count, one)
    } else {
        format!("{} {}", count, many)
    }
}

impl DisplayFormatter for DefaultFormatter {
    fn format(&self, input: &JsonInput<'_>, kind: ValueKind) -> Result<String, FormatError> {
        let text = match (kind, input) {
            (ValueKind::Object, _) => {
                format!("Object{{{}}}", plural(input.child_count(), "field", "fields"))
            }
            (ValueKind::Array, _) => {
                format!("Array[{}]", plural(input.child_count(), "item", "items"))
            }
            (ValueKind::Null, _) => "null".to_string(),
            (ValueKind::String, JsonInput::Value(Value::String(s))) => self.format_string(s),
            (ValueKind::Number, JsonInput::Value(Value::Number(n))) => n.to_string(),
            (ValueKind::Boolean, JsonInput::Value(Value::Bool(b))) => b.to_string(),
            (kind, other) => {
                return Err(FormatError::Rejected {
                    kind,
                    reason: format!("input holds a {}", classify(other)),
                });
            }
        };
        Ok(text)
    }
}

/// Never fails: formatter errors collapse to [`UNFORMATTABLE_SENTINEL`].
pub fn format_display_value(input: &JsonInput<'_>, kind: ValueKind) -> String {
    DefaultFormatter::default()
        .format(input, kind)
        .unwrap_or_else(|_| UNFORMATTABLE_SENTINEL.to_string())
}
