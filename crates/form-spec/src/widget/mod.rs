//! Field widgets: one editor per constrained field.
//!
//! A widget keeps a working copy of its field value. Malformed raw input is
//! dropped and the previous working value is kept; it is never reported as a
//! separate error, only constraint failures are.

mod boolean;
mod numeric;
mod string;

pub use boolean::BoolWidget;
pub use numeric::{FloatWidget, IntegerWidget};
pub use string::{StringWidget, TextWidget};

use serde::Serialize;

use crate::constraint::{Constraint, WidgetKind};
use crate::descriptor::FieldDescriptor;
use crate::error::FormError;
use crate::schema::FormBindable;
use crate::value::{FieldValue, ValueKind};

/// Non-text interactions delivered by the rendering runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WidgetAction {
    Toggle(bool),
    Increment,
    Decrement,
    Slide(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SliderRange {
    pub min: f64,
    pub max: f64,
}

/// Affordances the renderer should draw for a widget.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Controls {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toggle: Option<bool>,
    pub stepper: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slider: Option<SliderRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiline_height: Option<u32>,
}

/// Snapshot of a widget for the rendering collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetView {
    pub name: String,
    pub kind: String,
    pub label: String,
    pub required: bool,
    /// Text shown in the entry control.
    pub text: String,
    pub value: Option<FieldValue>,
    pub error: Option<String>,
    pub controls: Controls,
}

/// Editor contract shared by every value kind.
pub trait FieldWidget {
    fn name(&self) -> &str;

    fn kind(&self) -> WidgetKind;

    /// Takes the working value, label and rule from the descriptor.
    fn configure(&mut self, descriptor: &FieldDescriptor) -> Result<(), FormError>;

    /// Raw text typed into the entry control.
    fn on_local_change(&mut self, raw: &str);

    /// Returns false when the widget has no such affordance.
    fn on_action(&mut self, _action: WidgetAction) -> bool {
        false
    }

    /// Checks the working value and updates the visible error.
    fn validate(&mut self) -> bool;

    fn value(&self) -> Option<FieldValue>;

    fn error(&self) -> Option<&str>;

    fn view(&self) -> WidgetView;

    /// Writes the working value into the host object without validating it.
    fn bind(&self, item: &mut dyn FormBindable) -> Result<(), FormError> {
        item.write_field(self.name(), self.value())
    }
}

/// State every widget carries regardless of its value kind.
#[derive(Debug, Clone, Default)]
pub struct WidgetCore {
    name: String,
    label: String,
    constraint: Option<Constraint>,
    error: Option<String>,
}

impl WidgetCore {
    pub fn configure(&mut self, descriptor: &FieldDescriptor) {
        self.name = descriptor.name.clone();
        self.label = descriptor.label();
        self.constraint = Some(descriptor.constraint.clone());
        self.error = None;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn constraint(&self) -> Option<&Constraint> {
        self.constraint.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn runtime_check(&self) -> bool {
        self.constraint
            .as_ref()
            .is_some_and(|constraint| constraint.runtime_check)
    }

    /// Runs the constraint and shows or hides the error text.
    pub fn check(&mut self, value: Option<&FieldValue>) -> bool {
        let result = match &self.constraint {
            Some(constraint) => constraint.check(value),
            None => Ok(()),
        };
        self.error = result.err();
        self.error.is_none()
    }

    /// Shows an error found by widget-specific checks.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn view(&self, kind: WidgetKind, text: String, value: Option<FieldValue>, controls: Controls) -> WidgetView {
        WidgetView {
            name: self.name.clone(),
            kind: kind.to_string(),
            label: self.label.clone(),
            required: self
                .constraint
                .as_ref()
                .is_some_and(|constraint| constraint.required),
            text,
            value,
            error: self.error.clone(),
            controls,
        }
    }
}

pub(crate) fn wrong_rule(descriptor: &FieldDescriptor, expected: ValueKind) -> FormError {
    FormError::KindMismatch {
        field: descriptor.name.clone(),
        declared: descriptor.declared_type,
        expected,
    }
}
