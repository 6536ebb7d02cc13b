//! Field schemas and the per-field derivation rules.
//!
//! Every derived property of a field (visibility, required-ness, validity) is a
//! pure function of the schema and the card's current values:
//!
//! - `visible = visible_predicate(values)`
//! - `required = required_predicate(values)`
//! - `valid` depends only on the field's own value and shape
//!
//! Input parsing never fails: unparseable numeric input becomes `null`, which
//! simply renders the field invalid.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::core::types::{ColumnDescriptor, FieldValues};

/// Input control used to edit a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Widget {
    Select,
    MultiSelect,
    Text,
    Number,
}

/// Where a selectable field draws its options from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionsSource {
    /// A fixed list declared by the card type.
    Fixed(Vec<Value>),
    /// A template resolved against the pipeline at render time.
    Template(OptionsTemplate),
}

/// Template reference, serialized as `{"-v": "names"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionsTemplate {
    #[serde(rename = "-v")]
    pub var: TemplateVar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateVar {
    /// Names of every column currently available to the card.
    Names,
}

/// Bounds for number widgets; values outside them are invalid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericBounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

/// Predicate over sibling field values.
///
/// Serialized as `true`, `false`, or an allow-list mapping
/// `{"<key>": [<allowed>, ...]}`. The mapping holds when every listed key's
/// current value is a member of its allow-list; an empty mapping holds
/// unconditionally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ConditionRepr", into = "ConditionRepr")]
pub enum Condition {
    #[default]
    Always,
    Never,
    When(BTreeMap<String, Vec<Value>>),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ConditionRepr {
    Flag(bool),
    When(BTreeMap<String, Vec<Value>>),
}

impl From<ConditionRepr> for Condition {
    fn from(repr: ConditionRepr) -> Self {
        match repr {
            ConditionRepr::Flag(true) => Condition::Always,
            ConditionRepr::Flag(false) => Condition::Never,
            ConditionRepr::When(allow) if allow.is_empty() => Condition::Always,
            ConditionRepr::When(allow) => Condition::When(allow),
        }
    }
}

impl From<Condition> for ConditionRepr {
    fn from(condition: Condition) -> Self {
        match condition {
            Condition::Always => ConditionRepr::Flag(true),
            Condition::Never => ConditionRepr::Flag(false),
            Condition::When(allow) => ConditionRepr::When(allow),
        }
    }
}

impl Condition {
    /// Allow-list predicate over a single sibling key.
    pub fn when(key: impl Into<String>, allowed: Vec<Value>) -> Self {
        Condition::When(BTreeMap::from([(key.into(), allowed)]))
    }

    pub fn is_always(&self) -> bool {
        matches!(self, Condition::Always)
    }

    /// Evaluate against the card's current values. Missing keys read as `null`.
    pub fn holds(&self, values: &FieldValues) -> bool {
        match self {
            Condition::Always => true,
            Condition::Never => false,
            Condition::When(allow) => allow.iter().all(|(key, allowed)| {
                let current = values.get(key).unwrap_or(&Value::Null);
                allowed.iter().any(|candidate| same_value(candidate, current))
            }),
        }
    }

    /// Sibling keys this predicate reads.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        let allow = match self {
            Condition::When(allow) => Some(allow),
            _ => None,
        };
        allow.into_iter().flat_map(|allow| allow.keys().map(String::as_str))
    }
}

/// Static description of one configurable input of a card type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub key: String,
    pub widget: Widget,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<OptionsSource>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub multiple: bool,
    #[serde(flatten)]
    pub bounds: NumericBounds,
    #[serde(default, skip_serializing_if = "Condition::is_always")]
    pub visible: Condition,
    #[serde(default, skip_serializing_if = "Condition::is_always")]
    pub required: Condition,
    #[serde(default, alias = "value")]
    pub default: Value,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

impl FieldSchema {
    /// Minimal schema with the given key and widget; everything else defaulted.
    pub fn new(key: impl Into<String>, widget: Widget) -> Self {
        let key = key.into();
        Self {
            label: key.clone(),
            key,
            widget,
            placeholder: None,
            options: None,
            multiple: widget == Widget::MultiSelect,
            bounds: NumericBounds::default(),
            visible: Condition::Always,
            required: Condition::Always,
            default: Value::Null,
        }
    }

    /// True if the value is a collection rather than a scalar.
    pub fn is_multiple(&self) -> bool {
        self.multiple || self.widget == Widget::MultiSelect
    }

    pub fn is_visible(&self, values: &FieldValues) -> bool {
        self.visible.holds(values)
    }

    pub fn is_required(&self, values: &FieldValues) -> bool {
        self.required.holds(values)
    }

    /// Validity of the field's current value, independent of required-ness.
    ///
    /// - multiple: a non-empty array
    /// - scalar text: a non-empty string
    /// - any other scalar: non-null
    ///
    /// Numbers must also lie within the declared `min`/`max`.
    pub fn is_valid(&self, values: &FieldValues) -> bool {
        let value = values.get(&self.key).unwrap_or(&Value::Null);
        if self.is_multiple() {
            matches!(value, Value::Array(items)
                if !items.is_empty() && items.iter().all(|item| self.in_bounds(item)))
        } else if self.widget == Widget::Text {
            matches!(value, Value::String(text) if !text.is_empty())
        } else {
            !value.is_null() && self.in_bounds(value)
        }
    }

    fn in_bounds(&self, value: &Value) -> bool {
        let Some(x) = value.as_f64() else {
            return true;
        };
        self.bounds.min.is_none_or(|min| x >= min)
            && self.bounds.max.is_none_or(|max| x <= max)
    }

    /// Convert raw widget input into the stored value.
    ///
    /// Number widgets parse strings as `f64` (element-wise for multiple
    /// fields); anything unparseable becomes `null`. Other widgets store the
    /// input unchanged.
    pub fn parse_input(&self, raw: Value) -> Value {
        if self.widget != Widget::Number {
            return raw;
        }
        match raw {
            Value::Array(items) if self.is_multiple() => {
                Value::Array(items.into_iter().map(parse_number).collect())
            }
            other => parse_number(other),
        }
    }

    /// True if the options come from the pipeline's column names.
    pub fn draws_from_columns(&self) -> bool {
        matches!(
            self.options,
            Some(OptionsSource::Template(OptionsTemplate {
                var: TemplateVar::Names
            }))
        )
    }

    /// Resolve the option list against the columns available to the card.
    pub fn resolve_options(&self, available: &[ColumnDescriptor]) -> Vec<Value> {
        match &self.options {
            None => Vec::new(),
            Some(OptionsSource::Fixed(items)) => items.clone(),
            Some(OptionsSource::Template(template)) => match template.var {
                TemplateVar::Names => available
                    .iter()
                    .map(|column| Value::String(column.name.clone()))
                    .collect(),
            },
        }
    }
}

fn parse_number(raw: Value) -> Value {
    match raw {
        Value::Number(number) => Value::Number(number),
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .ok()
            .map(number_value)
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

/// Encode a finite float as JSON, preferring an integer when it is integral.
pub(crate) fn number_value(x: f64) -> Value {
    const EXACT_INT: f64 = 9_007_199_254_740_992.0;
    if !x.is_finite() {
        return Value::Null;
    }
    if x.fract() == 0.0 && x.abs() < EXACT_INT {
        return Value::from(x as i64);
    }
    Number::from_f64(x).map(Value::Number).unwrap_or(Value::Null)
}

/// Value equality used by predicates: numbers compare numerically so that
/// `1` and `1.0` match.
pub(crate) fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}
