use tracing::trace;

use super::{Controls, FieldWidget, SliderRange, WidgetAction, WidgetCore, WidgetView, wrong_rule};
use crate::constraint::{ConstraintRule, FloatRule, IntegerRule, WidgetKind};
use crate::descriptor::FieldDescriptor;
use crate::error::FormError;
use crate::value::{FieldValue, ValueKind};

/// Whole-number entry with optional increment/decrement buttons.
///
/// An empty entry leaves the value absent, so `required` can reject it.
#[derive(Debug, Clone, Default)]
pub struct IntegerWidget {
    core: WidgetCore,
    rule: IntegerRule,
    value: Option<i64>,
}

impl IntegerWidget {
    fn after_change(&mut self) {
        if self.core.runtime_check() {
            self.validate();
        }
    }

    /// Where the stepper starts from an absent value: zero moved into range.
    fn seed(&self) -> i64 {
        0_i64.max(self.rule.min_value()).min(self.rule.max_value())
    }

    fn increment(&mut self) {
        let Some(current) = self.value else {
            self.value = Some(self.seed());
            return;
        };
        if current < self.rule.max_value() {
            self.value = Some(current + 1);
        }
    }

    fn decrement(&mut self) {
        let Some(current) = self.value else {
            self.value = Some(self.seed());
            return;
        };
        if current > self.rule.min_value() && (!self.rule.positive || current > 0) {
            self.value = Some(current - 1);
        }
    }
}

impl FieldWidget for IntegerWidget {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn kind(&self) -> WidgetKind {
        WidgetKind::Integer
    }

    fn configure(&mut self, descriptor: &FieldDescriptor) -> Result<(), FormError> {
        let ConstraintRule::Integer(rule) = &descriptor.constraint.rule else {
            return Err(wrong_rule(descriptor, ValueKind::Integer));
        };
        self.core.configure(descriptor);
        self.rule = rule.clone();
        self.value = descriptor
            .current_value
            .as_ref()
            .and_then(FieldValue::as_integer);
        Ok(())
    }

    fn on_local_change(&mut self, raw: &str) {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            self.value = None;
        } else {
            match trimmed.parse::<i64>() {
                Ok(number) => self.value = Some(number),
                Err(_) => trace!(field = self.core.name(), raw, "ignoring unparsable integer input"),
            }
        }
        self.after_change();
    }

    fn on_action(&mut self, action: WidgetAction) -> bool {
        if !self.rule.stepper {
            return false;
        }
        match action {
            WidgetAction::Increment => self.increment(),
            WidgetAction::Decrement => self.decrement(),
            _ => return false,
        }
        self.after_change();
        true
    }

    fn validate(&mut self) -> bool {
        let value = self.value();
        self.core.check(value.as_ref())
    }

    fn value(&self) -> Option<FieldValue> {
        self.value.map(FieldValue::Integer)
    }

    fn error(&self) -> Option<&str> {
        self.core.error()
    }

    fn view(&self) -> WidgetView {
        self.core.view(
            self.kind(),
            self.value.map(|number| number.to_string()).unwrap_or_default(),
            self.value(),
            Controls {
                stepper: self.rule.stepper,
                ..Controls::default()
            },
        )
    }
}

/// Decimal entry with an optional slider over the rule's range.
#[derive(Debug, Clone, Default)]
pub struct FloatWidget {
    core: WidgetCore,
    rule: FloatRule,
    value: Option<f64>,
}

impl FloatWidget {
    fn after_change(&mut self) {
        if self.core.runtime_check() {
            self.validate();
        }
    }

    /// The working value with the rule's fixed decimal count; empty when absent.
    pub fn display_text(&self) -> String {
        self.value
            .map(|number| format!("{:.*}", usize::from(self.rule.decimals), number))
            .unwrap_or_default()
    }
}

impl FieldWidget for FloatWidget {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn kind(&self) -> WidgetKind {
        WidgetKind::Float
    }

    fn configure(&mut self, descriptor: &FieldDescriptor) -> Result<(), FormError> {
        let ConstraintRule::Float(rule) = &descriptor.constraint.rule else {
            return Err(wrong_rule(descriptor, ValueKind::Float));
        };
        self.core.configure(descriptor);
        self.rule = rule.clone();
        self.value = descriptor
            .current_value
            .as_ref()
            .and_then(FieldValue::as_float);
        Ok(())
    }

    fn on_local_change(&mut self, raw: &str) {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            self.value = None;
        } else {
            match trimmed.parse::<f64>().ok().filter(|number| number.is_finite()) {
                Some(number) => self.value = Some(number),
                None => trace!(field = self.core.name(), raw, "ignoring unparsable float input"),
            }
        }
        self.after_change();
    }

    fn on_action(&mut self, action: WidgetAction) -> bool {
        let WidgetAction::Slide(position) = action else {
            return false;
        };
        if !self.rule.use_slider {
            return false;
        }
        if position.is_finite() {
            // Unlike `clamp`, tolerates a NaN bound.
            self.value = Some(position.max(self.rule.min_value()).min(self.rule.max_value()));
        }
        self.after_change();
        true
    }

    fn validate(&mut self) -> bool {
        let value = self.value();
        self.core.check(value.as_ref())
    }

    fn value(&self) -> Option<FieldValue> {
        self.value.map(FieldValue::Float)
    }

    fn error(&self) -> Option<&str> {
        self.core.error()
    }

    fn view(&self) -> WidgetView {
        let slider = self.rule.use_slider.then(|| SliderRange {
            min: self.rule.min_value(),
            max: self.rule.max_value(),
        });
        self.core.view(
            self.kind(),
            self.display_text(),
            self.value(),
            Controls {
                slider,
                ..Controls::default()
            },
        )
    }
}
