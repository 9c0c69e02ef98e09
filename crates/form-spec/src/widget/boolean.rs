use tracing::trace;

use super::{Controls, FieldWidget, WidgetAction, WidgetCore, WidgetView, wrong_rule};
use crate::constraint::{ConstraintRule, WidgetKind};
use crate::descriptor::FieldDescriptor;
use crate::error::FormError;
use crate::value::{FieldValue, ValueKind, parse_bool};

/// Toggle editor. Stays absent until the host supplies a value or the user picks one.
#[derive(Debug, Clone, Default)]
pub struct BoolWidget {
    core: WidgetCore,
    value: Option<bool>,
}

impl BoolWidget {
    fn after_change(&mut self) {
        if self.core.runtime_check() {
            self.validate();
        }
    }
}

impl FieldWidget for BoolWidget {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn kind(&self) -> WidgetKind {
        WidgetKind::Boolean
    }

    fn configure(&mut self, descriptor: &FieldDescriptor) -> Result<(), FormError> {
        if !matches!(descriptor.constraint.rule, ConstraintRule::Boolean) {
            return Err(wrong_rule(descriptor, ValueKind::Boolean));
        }
        self.core.configure(descriptor);
        self.value = descriptor
            .current_value
            .as_ref()
            .map(|value| FieldValue::coerce_bool(Some(value)));
        Ok(())
    }

    fn on_local_change(&mut self, raw: &str) {
        if raw.trim().is_empty() {
            self.value = None;
        } else {
            match parse_bool(raw) {
                Some(flag) => self.value = Some(flag),
                None => trace!(field = self.core.name(), raw, "ignoring unparsable toggle input"),
            }
        }
        self.after_change();
    }

    fn on_action(&mut self, action: WidgetAction) -> bool {
        let WidgetAction::Toggle(flag) = action else {
            return false;
        };
        self.value = Some(flag);
        self.after_change();
        true
    }

    fn validate(&mut self) -> bool {
        let value = self.value();
        self.core.check(value.as_ref())
    }

    fn value(&self) -> Option<FieldValue> {
        self.value.map(FieldValue::Bool)
    }

    fn error(&self) -> Option<&str> {
        self.core.error()
    }

    fn view(&self) -> WidgetView {
        self.core.view(
            self.kind(),
            self.value.map(|flag| flag.to_string()).unwrap_or_default(),
            self.value(),
            Controls {
                toggle: Some(self.value.unwrap_or(false)),
                ..Controls::default()
            },
        )
    }
}
