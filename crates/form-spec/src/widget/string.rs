use super::{Controls, FieldWidget, WidgetCore, WidgetView, wrong_rule};
use crate::constraint::{ConstraintRule, StringRule, WidgetKind};
use crate::descriptor::FieldDescriptor;
use crate::error::FormError;
use crate::value::{FieldValue, ValueKind};

/// Single-line text entry. Clearing the entry makes the value absent.
#[derive(Debug, Clone, Default)]
pub struct StringWidget {
    core: WidgetCore,
    rule: StringRule,
    value: Option<String>,
}

impl FieldWidget for StringWidget {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn kind(&self) -> WidgetKind {
        WidgetKind::String
    }

    fn configure(&mut self, descriptor: &FieldDescriptor) -> Result<(), FormError> {
        let Some(rule) = descriptor.constraint.rule.string_rule() else {
            return Err(wrong_rule(descriptor, ValueKind::String));
        };
        self.core.configure(descriptor);
        self.rule = rule.clone();
        self.value = descriptor
            .current_value
            .as_ref()
            .and_then(FieldValue::as_text)
            .map(str::to_string);
        Ok(())
    }

    fn on_local_change(&mut self, raw: &str) {
        self.value = (!raw.is_empty()).then(|| raw.to_string());
        if self.core.runtime_check() {
            self.validate();
        }
    }

    fn validate(&mut self) -> bool {
        let value = self.value();
        self.core.check(value.as_ref())
    }

    fn value(&self) -> Option<FieldValue> {
        self.value.clone().map(FieldValue::Text)
    }

    fn error(&self) -> Option<&str> {
        self.core.error()
    }

    fn view(&self) -> WidgetView {
        self.core.view(
            self.kind(),
            self.value.clone().unwrap_or_default(),
            self.value(),
            Controls {
                placeholder: self.rule.placeholder.clone(),
                ..Controls::default()
            },
        )
    }
}

/// Multi-line variant of [`StringWidget`] with a display height.
#[derive(Debug, Clone, Default)]
pub struct TextWidget {
    inner: StringWidget,
    field_height: u32,
}

impl FieldWidget for TextWidget {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn kind(&self) -> WidgetKind {
        WidgetKind::Text
    }

    fn configure(&mut self, descriptor: &FieldDescriptor) -> Result<(), FormError> {
        let ConstraintRule::Text(rule) = &descriptor.constraint.rule else {
            return Err(wrong_rule(descriptor, ValueKind::String));
        };
        self.field_height = rule.field_height;
        self.inner.configure(descriptor)
    }

    fn on_local_change(&mut self, raw: &str) {
        self.inner.on_local_change(raw);
    }

    fn validate(&mut self) -> bool {
        self.inner.validate()
    }

    fn value(&self) -> Option<FieldValue> {
        self.inner.value()
    }

    fn error(&self) -> Option<&str> {
        self.inner.error()
    }

    fn view(&self) -> WidgetView {
        let mut view = self.inner.view();
        view.kind = self.kind().to_string();
        view.controls.multiline_height = Some(self.field_height);
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{Constraint, TextRule};

    fn descriptor(constraint: Constraint, value: Option<&str>) -> FieldDescriptor {
        FieldDescriptor {
            name: "title".into(),
            declared_type: ValueKind::String,
            current_value: value.map(FieldValue::from),
            constraint,
        }
    }

    #[test]
    fn clearing_input_makes_value_absent() {
        let mut widget = StringWidget::default();
        widget
            .configure(&descriptor(
                Constraint::string(StringRule::default()).required(),
                Some("draft"),
            ))
            .expect("configure");
        assert!(widget.validate());

        widget.on_local_change("");
        assert_eq!(widget.value(), None);
        assert!(!widget.validate());
        assert_eq!(widget.error(), Some("A value is required"));
    }

    #[test]
    fn view_carries_placeholder_and_label() {
        let mut widget = StringWidget::default();
        let constraint = Constraint::string(StringRule {
            placeholder: Some("Type a title".into()),
            ..StringRule::default()
        })
        .with_label("Title")
        .required();
        widget
            .configure(&descriptor(constraint, None))
            .expect("configure");
        let view = widget.view();
        assert_eq!(view.label, "Title *");
        assert!(view.required);
        assert_eq!(view.text, "");
        assert_eq!(view.controls.placeholder.as_deref(), Some("Type a title"));
    }

    #[test]
    fn text_widget_inherits_string_checks() {
        let mut widget = TextWidget::default();
        let constraint = Constraint::text(TextRule {
            string: StringRule {
                exclude_digits: true,
                ..StringRule::default()
            },
            field_height: 240,
        })
        .runtime_check();
        widget
            .configure(&descriptor(constraint, Some("intro")))
            .expect("configure");

        widget.on_local_change("line one\nline 2");
        assert_eq!(widget.error(), Some("Value shouldn't contain digits"));

        let view = widget.view();
        assert_eq!(view.kind, "text");
        assert_eq!(view.controls.multiline_height, Some(240));
    }

    #[test]
    fn text_widget_rejects_single_line_rule() {
        let mut widget = TextWidget::default();
        let err = widget
            .configure(&descriptor(Constraint::string(StringRule::default()), None))
            .unwrap_err();
        assert!(matches!(err, FormError::KindMismatch { .. }));
    }
}
