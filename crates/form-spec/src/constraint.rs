use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Mutex, OnceLock};

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FormError;
use crate::mode::FormMode;
use crate::value::{FieldValue, ValueKind};

pub const REQUIRED_MESSAGE: &str = "A value is required";

const MAX_DECIMALS: u8 = 15;

fn default_true() -> bool {
    true
}

fn default_decimals() -> u8 {
    2
}

fn default_field_height() -> u32 {
    100
}

/// Validation rule plus display and visibility metadata for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Constraint {
    /// Label shown next to the widget; the field name when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub required: bool,
    /// Re-validate on every local change instead of only on submit.
    #[serde(default)]
    pub runtime_check: bool,
    #[serde(default)]
    pub visible_in: FormMode,
    #[serde(flatten)]
    pub rule: ConstraintRule,
}

/// Kind-specific part of a [`Constraint`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConstraintRule {
    Boolean,
    Integer(IntegerRule),
    Float(FloatRule),
    String(StringRule),
    Text(TextRule),
    Custom(CustomRule),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IntegerRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    #[serde(default)]
    pub positive: bool,
    /// Offer increment/decrement controls.
    #[serde(default = "default_true")]
    pub stepper: bool,
}

impl Default for IntegerRule {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
            positive: false,
            stepper: true,
        }
    }
}

impl IntegerRule {
    pub fn min_value(&self) -> i64 {
        self.min.unwrap_or(i64::MIN)
    }

    pub fn max_value(&self) -> i64 {
        self.max.unwrap_or(i64::MAX)
    }

    fn check(&self, value: i64) -> Result<(), String> {
        if value < self.min_value() {
            return Err(format!("Value should be greater than {}", self.min_value()));
        }
        if value > self.max_value() {
            return Err(format!("Value should be lower than {}", self.max_value()));
        }
        if self.positive && value < 0 {
            return Err("Value should be positive".into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FloatRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default)]
    pub positive: bool,
    #[serde(default = "default_true")]
    pub use_slider: bool,
    /// Decimal places used when the value is displayed.
    #[serde(default = "default_decimals")]
    pub decimals: u8,
}

impl Default for FloatRule {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
            positive: false,
            use_slider: true,
            decimals: default_decimals(),
        }
    }
}

impl FloatRule {
    pub fn min_value(&self) -> f64 {
        self.min.unwrap_or(f64::MIN)
    }

    pub fn max_value(&self) -> f64 {
        self.max.unwrap_or(f64::MAX)
    }

    fn check(&self, value: f64) -> Result<(), String> {
        if value < self.min_value() {
            return Err(format!("Value should be greater than {}", self.min_value()));
        }
        if value > self.max_value() {
            return Err(format!("Value should be lower than {}", self.max_value()));
        }
        if self.positive && value < 0.0 {
            return Err("Value should be positive".into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StringRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub min_length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default)]
    pub exclude_digits: bool,
    #[serde(default)]
    pub exclude_special_chars: bool,
    /// Regular expression the whole value must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl StringRule {
    pub fn max_length_value(&self) -> usize {
        self.max_length.unwrap_or(usize::MAX)
    }

    fn check(&self, text: &str) -> Result<(), String> {
        let length = text.chars().count();
        if length > self.max_length_value() {
            return Err(format!(
                "Value should have less than {} characters",
                self.max_length_value()
            ));
        }
        if length < self.min_length {
            return Err(format!(
                "Value should have more than {} characters",
                self.min_length
            ));
        }
        if self.exclude_digits && contains_decimal_digit(text) {
            return Err("Value shouldn't contain digits".into());
        }
        if self.exclude_special_chars && contains_special_char(text) {
            return Err("Value shouldn't contain special chars".into());
        }
        // Bad patterns are rejected by `Constraint::verify` before any widget exists.
        if let Some(pattern) = &self.pattern
            && let Some(regex) = compiled(pattern)
            && !regex.is_match(text)
        {
            return Err("Value doesn't match the expected format".into());
        }
        Ok(())
    }
}

/// Multi-line string rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TextRule {
    #[serde(flatten)]
    pub string: StringRule,
    #[serde(default = "default_field_height")]
    pub field_height: u32,
}

impl Default for TextRule {
    fn default() -> Self {
        Self {
            string: StringRule::default(),
            field_height: default_field_height(),
        }
    }
}

/// Rule for widget kinds registered outside the built-in set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CustomRule {
    pub kind: String,
    pub value_kind: ValueKind,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, Value>,
}

/// Key the widget registry resolves a constraint by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    Boolean,
    Integer,
    Float,
    String,
    Text,
    Custom(String),
}

impl WidgetKind {
    pub fn name(&self) -> &str {
        match self {
            WidgetKind::Boolean => "boolean",
            WidgetKind::Integer => "integer",
            WidgetKind::Float => "float",
            WidgetKind::String => "string",
            WidgetKind::Text => "text",
            WidgetKind::Custom(name) => name,
        }
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl ConstraintRule {
    pub fn widget_kind(&self) -> WidgetKind {
        match self {
            ConstraintRule::Boolean => WidgetKind::Boolean,
            ConstraintRule::Integer(_) => WidgetKind::Integer,
            ConstraintRule::Float(_) => WidgetKind::Float,
            ConstraintRule::String(_) => WidgetKind::String,
            ConstraintRule::Text(_) => WidgetKind::Text,
            ConstraintRule::Custom(rule) => WidgetKind::Custom(rule.kind.clone()),
        }
    }

    pub fn value_kind(&self) -> ValueKind {
        match self {
            ConstraintRule::Boolean => ValueKind::Boolean,
            ConstraintRule::Integer(_) => ValueKind::Integer,
            ConstraintRule::Float(_) => ValueKind::Float,
            ConstraintRule::String(_) | ConstraintRule::Text(_) => ValueKind::String,
            ConstraintRule::Custom(rule) => rule.value_kind,
        }
    }

    /// The single-line string rule, shared by the multi-line variant.
    pub fn string_rule(&self) -> Option<&StringRule> {
        match self {
            ConstraintRule::String(rule) => Some(rule),
            ConstraintRule::Text(rule) => Some(&rule.string),
            _ => None,
        }
    }

    fn check(&self, value: Option<&FieldValue>) -> Result<(), String> {
        if let Some(rule) = self.string_rule() {
            return match value {
                None => rule.check(""),
                Some(FieldValue::Text(text)) => rule.check(text),
                Some(other) => Err(wrong_kind(ValueKind::String, other)),
            };
        }

        let Some(value) = value else {
            return Ok(());
        };
        match (self, value) {
            (ConstraintRule::Boolean, FieldValue::Bool(_)) => Ok(()),
            (ConstraintRule::Integer(rule), FieldValue::Integer(number)) => rule.check(*number),
            (ConstraintRule::Float(rule), FieldValue::Float(number)) => rule.check(*number),
            (ConstraintRule::Custom(rule), value) if value.kind() == rule.value_kind => Ok(()),
            (rule, value) => Err(wrong_kind(rule.value_kind(), value)),
        }
    }
}

impl Constraint {
    pub fn new(rule: ConstraintRule) -> Self {
        Self {
            label: None,
            required: false,
            runtime_check: false,
            visible_in: FormMode::ALL,
            rule,
        }
    }

    pub fn boolean() -> Self {
        Self::new(ConstraintRule::Boolean)
    }

    pub fn integer(rule: IntegerRule) -> Self {
        Self::new(ConstraintRule::Integer(rule))
    }

    pub fn float(rule: FloatRule) -> Self {
        Self::new(ConstraintRule::Float(rule))
    }

    pub fn string(rule: StringRule) -> Self {
        Self::new(ConstraintRule::String(rule))
    }

    pub fn text(rule: TextRule) -> Self {
        Self::new(ConstraintRule::Text(rule))
    }

    pub fn custom(rule: CustomRule) -> Self {
        Self::new(ConstraintRule::Custom(rule))
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn runtime_check(mut self) -> Self {
        self.runtime_check = true;
        self
    }

    pub fn visible_in(mut self, mode: FormMode) -> Self {
        self.visible_in = mode;
        self
    }

    pub fn widget_kind(&self) -> WidgetKind {
        self.rule.widget_kind()
    }

    pub fn value_kind(&self) -> ValueKind {
        self.rule.value_kind()
    }

    pub fn is_visible_in(&self, mode: FormMode) -> bool {
        self.visible_in.intersects(mode)
    }

    /// Checks a candidate value; the first failing rule wins.
    pub fn check(&self, value: Option<&FieldValue>) -> Result<(), String> {
        if self.required && value.is_none() {
            return Err(REQUIRED_MESSAGE.into());
        }
        self.rule.check(value)
    }

    /// Rejects configurations no value could ever satisfy.
    pub fn verify(&self, field: &str) -> Result<(), FormError> {
        let invalid = |reason: String| FormError::InvalidConstraint {
            field: field.to_string(),
            reason,
        };
        match &self.rule {
            ConstraintRule::Integer(rule) if rule.min_value() > rule.max_value() => Err(invalid(
                format!("min {} is above max {}", rule.min_value(), rule.max_value()),
            )),
            ConstraintRule::Float(rule)
                if !rule.min_value().is_finite() || !rule.max_value().is_finite() =>
            {
                Err(invalid(format!(
                    "bounds must be finite, got min {} and max {}",
                    rule.min_value(),
                    rule.max_value()
                )))
            }
            ConstraintRule::Float(rule) if rule.min_value() > rule.max_value() => Err(invalid(
                format!("min {} is above max {}", rule.min_value(), rule.max_value()),
            )),
            ConstraintRule::Float(rule) if rule.decimals > MAX_DECIMALS => Err(invalid(format!(
                "{} decimals exceed the supported {MAX_DECIMALS}",
                rule.decimals
            ))),
            ConstraintRule::String(_) | ConstraintRule::Text(_) => {
                let Some(rule) = self.rule.string_rule() else {
                    return Ok(());
                };
                if rule.min_length > rule.max_length_value() {
                    return Err(invalid(format!(
                        "min_length {} is above max_length {}",
                        rule.min_length,
                        rule.max_length_value()
                    )));
                }
                if let Some(pattern) = &rule.pattern {
                    Regex::new(&anchored(pattern))
                        .map_err(|err| invalid(format!("bad pattern: {err}")))?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

fn anchored(pattern: &str) -> String {
    format!("^(?:{pattern})$")
}

/// Anchored regex for `pattern`, compiled once per distinct pattern.
fn compiled(pattern: &str) -> Option<Regex> {
    static CACHE: OnceLock<Mutex<HashMap<String, Regex>>> = OnceLock::new();
    let cache = CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    let mut cache = cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(regex) = cache.get(pattern) {
        return Some(regex.clone());
    }
    let regex = Regex::new(&anchored(pattern)).ok()?;
    cache.insert(pattern.to_string(), regex.clone());
    Some(regex)
}

/// Unicode class regex built once; `None` only if the class is unsupported.
fn unicode_class(cell: &'static OnceLock<Option<Regex>>, class: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(class).ok()).as_ref()
}

/// Decimal digits (`Nd`) only; vulgar fractions and roman numerals are not digits.
fn contains_decimal_digit(text: &str) -> bool {
    static DIGIT: OnceLock<Option<Regex>> = OnceLock::new();
    match unicode_class(&DIGIT, r"\p{Nd}") {
        Some(regex) => regex.is_match(text),
        None => text.chars().any(|ch| ch.is_ascii_digit()),
    }
}

/// Anything that is neither a letter nor a decimal digit.
fn contains_special_char(text: &str) -> bool {
    static SPECIAL: OnceLock<Option<Regex>> = OnceLock::new();
    match unicode_class(&SPECIAL, r"[^\p{L}\p{Nd}]") {
        Some(regex) => regex.is_match(text),
        None => text.chars().any(|ch| !ch.is_alphabetic() && !ch.is_ascii_digit()),
    }
}

fn wrong_kind(expected: ValueKind, found: &FieldValue) -> String {
    format!("Expected a {expected} value but got a {}", found.kind())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_rule(min: i64, max: i64, positive: bool) -> Constraint {
        Constraint::integer(IntegerRule {
            min: Some(min),
            max: Some(max),
            positive,
            ..IntegerRule::default()
        })
    }

    fn text(value: &str) -> Option<FieldValue> {
        Some(FieldValue::Text(value.to_string()))
    }

    #[test]
    fn required_fails_before_kind_checks() {
        let constraint = int_rule(10, 20, true).required();
        assert_eq!(constraint.check(None), Err(REQUIRED_MESSAGE.to_string()));

        let strings = Constraint::string(StringRule {
            min_length: 3,
            ..StringRule::default()
        })
        .required();
        assert_eq!(strings.check(None), Err(REQUIRED_MESSAGE.to_string()));
    }

    #[test]
    fn check_is_pure() {
        let constraint = int_rule(0, 10, false);
        let value = Some(FieldValue::Integer(4));
        assert_eq!(constraint.check(value.as_ref()), Ok(()));
        assert_eq!(constraint.check(value.as_ref()), Ok(()));

        let bad = Some(FieldValue::Integer(11));
        assert_eq!(constraint.check(bad.as_ref()), constraint.check(bad.as_ref()));
    }

    #[test]
    fn numeric_bounds_reference_their_limit() {
        let constraint = int_rule(-5, 5, false);
        assert_eq!(
            constraint.check(Some(&FieldValue::Integer(-6))),
            Err("Value should be greater than -5".to_string())
        );
        assert_eq!(
            constraint.check(Some(&FieldValue::Integer(6))),
            Err("Value should be lower than 5".to_string())
        );
        assert_eq!(constraint.check(Some(&FieldValue::Integer(5))), Ok(()));
    }

    #[test]
    fn positive_fails_inside_range() {
        let constraint = int_rule(-5, 5, true);
        assert_eq!(
            constraint.check(Some(&FieldValue::Integer(-1))),
            Err("Value should be positive".to_string())
        );

        let floats = Constraint::float(FloatRule {
            min: Some(-1.0),
            max: Some(1.0),
            positive: true,
            ..FloatRule::default()
        });
        assert_eq!(
            floats.check(Some(&FieldValue::Float(-0.5))),
            Err("Value should be positive".to_string())
        );
        assert_eq!(
            floats.check(Some(&FieldValue::Float(1.5))),
            Err("Value should be lower than 1".to_string())
        );
    }

    #[test]
    fn unbounded_numbers_accept_extremes() {
        let ints = Constraint::integer(IntegerRule::default());
        assert_eq!(ints.check(Some(&FieldValue::Integer(i64::MIN))), Ok(()));
        let floats = Constraint::float(FloatRule::default());
        assert_eq!(floats.check(Some(&FieldValue::Float(f64::MAX))), Ok(()));
    }

    #[test]
    fn string_checks_are_independent() {
        let max = Constraint::string(StringRule {
            max_length: Some(3),
            ..StringRule::default()
        });
        assert!(max.check(text("abcd").as_ref()).is_err());
        assert!(max.check(text("abc").as_ref()).is_ok());

        let min = Constraint::string(StringRule {
            min_length: 2,
            ..StringRule::default()
        });
        assert_eq!(
            min.check(text("a").as_ref()),
            Err("Value should have more than 2 characters".to_string())
        );
        assert_eq!(
            min.check(None),
            Err("Value should have more than 2 characters".to_string())
        );

        let digits = Constraint::string(StringRule {
            exclude_digits: true,
            ..StringRule::default()
        });
        assert_eq!(
            digits.check(text("r2d2").as_ref()),
            Err("Value shouldn't contain digits".to_string())
        );
        assert!(digits.check(text("robot-name").as_ref()).is_ok());

        let special = Constraint::string(StringRule {
            exclude_special_chars: true,
            ..StringRule::default()
        });
        assert_eq!(
            special.check(text("robot-name").as_ref()),
            Err("Value shouldn't contain special chars".to_string())
        );
        assert!(special.check(text("r2d2").as_ref()).is_ok());
    }

    #[test]
    fn combined_string_checks_report_in_order() {
        let constraint = Constraint::string(StringRule {
            min_length: 2,
            max_length: Some(6),
            exclude_digits: true,
            exclude_special_chars: true,
            ..StringRule::default()
        });
        assert_eq!(
            constraint.check(text("abcdefg").as_ref()),
            Err("Value should have less than 6 characters".to_string())
        );
        assert_eq!(
            constraint.check(text("a1-").as_ref()),
            Err("Value shouldn't contain digits".to_string())
        );
        assert_eq!(
            constraint.check(text("ab-").as_ref()),
            Err("Value shouldn't contain special chars".to_string())
        );
        assert_eq!(constraint.check(text("abc").as_ref()), Ok(()));
    }

    #[test]
    fn pattern_matches_whole_value() {
        let constraint = Constraint::string(StringRule {
            pattern: Some("[a-z]+".into()),
            ..StringRule::default()
        });
        assert!(constraint.check(text("abc").as_ref()).is_ok());
        assert_eq!(
            constraint.check(text("abc1").as_ref()),
            Err("Value doesn't match the expected format".to_string())
        );
    }

    #[test]
    fn length_counts_characters() {
        let constraint = Constraint::string(StringRule {
            max_length: Some(4),
            ..StringRule::default()
        });
        assert!(constraint.check(text("ünïç").as_ref()).is_ok());
    }

    #[test]
    fn verify_rejects_impossible_rules() {
        assert!(int_rule(5, 1, false).verify("level").is_err());
        let pattern = Constraint::string(StringRule {
            pattern: Some("(".into()),
            ..StringRule::default()
        });
        let err = pattern.verify("code").unwrap_err();
        assert!(err.to_string().contains("invalid constraint on field 'code'"));
        let lengths = Constraint::text(TextRule {
            string: StringRule {
                min_length: 9,
                max_length: Some(3),
                ..StringRule::default()
            },
            ..TextRule::default()
        });
        assert!(lengths.verify("bio").is_err());
        assert!(int_rule(0, 5, true).verify("level").is_ok());
    }

    #[test]
    fn verify_rejects_non_finite_float_bounds() {
        for rule in [
            FloatRule {
                min: Some(f64::NAN),
                ..FloatRule::default()
            },
            FloatRule {
                max: Some(f64::INFINITY),
                ..FloatRule::default()
            },
            FloatRule {
                min: Some(f64::NEG_INFINITY),
                max: Some(f64::NAN),
                ..FloatRule::default()
            },
        ] {
            assert!(matches!(
                Constraint::float(rule).verify("speed"),
                Err(FormError::InvalidConstraint { .. })
            ));
        }
        assert!(
            Constraint::float(FloatRule::default())
                .verify("speed")
                .is_ok()
        );
    }

    #[test]
    fn charset_exclusions_use_decimal_digits() {
        let digits = Constraint::string(StringRule {
            exclude_digits: true,
            ..StringRule::default()
        });
        assert!(digits.check(text("½").as_ref()).is_ok());
        assert!(digits.check(text("Ⅻ").as_ref()).is_ok());
        assert_eq!(
            digits.check(text("agent٣").as_ref()),
            Err("Value shouldn't contain digits".to_string())
        );

        let special = Constraint::string(StringRule {
            exclude_special_chars: true,
            ..StringRule::default()
        });
        assert_eq!(
            special.check(text("½").as_ref()),
            Err("Value shouldn't contain special chars".to_string())
        );
        assert_eq!(
            special.check(text("Ⅻ").as_ref()),
            Err("Value shouldn't contain special chars".to_string())
        );
        assert!(special.check(text("Zoë٣7").as_ref()).is_ok());
    }

    #[test]
    fn pattern_checks_reuse_compiled_regex() {
        let constraint = Constraint::string(StringRule {
            pattern: Some("[a-z]{3}-\\d+".into()),
            ..StringRule::default()
        });
        for _ in 0..3 {
            assert!(constraint.check(text("abc-42").as_ref()).is_ok());
            assert!(constraint.check(text("abc-42x").as_ref()).is_err());
        }
        let first = compiled("[a-z]{3}-\\d+").expect("compiled");
        let second = compiled("[a-z]{3}-\\d+").expect("cached");
        assert_eq!(first.as_str(), "^(?:[a-z]{3}-\\d+)$");
        assert_eq!(first.as_str(), second.as_str());
        assert!(compiled("(").is_none());
    }

    #[test]
    fn custom_rule_only_checks_value_kind() {
        let constraint = Constraint::custom(CustomRule {
            kind: "color".into(),
            value_kind: ValueKind::String,
            options: BTreeMap::new(),
        });
        assert!(constraint.check(text("#ff0000").as_ref()).is_ok());
        assert!(constraint.check(Some(&FieldValue::Integer(1))).is_err());
        assert_eq!(constraint.widget_kind(), WidgetKind::Custom("color".into()));
    }

    #[test]
    fn deserializes_tagged_rules_with_defaults() {
        let constraint: Constraint = serde_json::from_value(serde_json::json!({
            "kind": "float",
            "label": "Speed",
            "required": true,
            "min": 0.0,
            "visible_in": 4
        }))
        .expect("deserialize");
        assert_eq!(constraint.label.as_deref(), Some("Speed"));
        assert_eq!(constraint.visible_in, FormMode::EDIT);
        let ConstraintRule::Float(rule) = &constraint.rule else {
            panic!("expected float rule");
        };
        assert_eq!(rule.decimals, 2);
        assert!(rule.use_slider);
        assert_eq!(rule.min, Some(0.0));

        let text: Constraint = serde_json::from_value(serde_json::json!({
            "kind": "text",
            "max_length": 200
        }))
        .expect("deserialize text");
        assert_eq!(text.visible_in, FormMode::ALL);
        assert_eq!(text.widget_kind(), WidgetKind::Text);
        let ConstraintRule::Text(rule) = &text.rule else {
            panic!("expected text rule");
        };
        assert_eq!(rule.field_height, 100);
        assert_eq!(rule.string.max_length, Some(200));
    }
}
