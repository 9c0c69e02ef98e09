use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constraint::Constraint;
use crate::error::FormError;
use crate::value::{FieldValue, ValueKind};

/// Descriptive metadata a host type may carry for form titles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormInfo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// One declared field of a host type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldDeclaration {
    pub name: String,
    #[serde(rename = "type")]
    pub declared_type: ValueKind,
    /// Fields without a constraint are never shown in a form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<Constraint>,
}

/// Field table of a host type; built once per type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormSchema {
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<FormInfo>,
    #[serde(default)]
    pub fields: Vec<FieldDeclaration>,
}

impl FormSchema {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            info: None,
            fields: Vec::new(),
        }
    }

    pub fn with_info(mut self, title: impl Into<String>, description: impl Into<String>) -> Self {
        self.info = Some(FormInfo {
            title: title.into(),
            description: description.into(),
        });
        self
    }

    /// Declares a form-bindable field.
    pub fn field(mut self, name: impl Into<String>, declared_type: ValueKind, constraint: Constraint) -> Self {
        self.fields.push(FieldDeclaration {
            name: name.into(),
            declared_type,
            constraint: Some(constraint),
        });
        self
    }

    /// Declares a field the form never edits.
    pub fn plain_field(mut self, name: impl Into<String>, declared_type: ValueKind) -> Self {
        self.fields.push(FieldDeclaration {
            name: name.into(),
            declared_type,
            constraint: None,
        });
        self
    }

    pub fn declaration(&self, name: &str) -> Option<&FieldDeclaration> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// JSON Schema document describing [`FormSchema`] files.
pub fn schema_document() -> Value {
    serde_json::to_value(schemars::schema_for!(FormSchema)).unwrap_or(Value::Null)
}

/// Capability surface a host object exposes to a form.
pub trait FormBindable {
    fn schema(&self) -> &FormSchema;

    /// Current value of a field. Writing it straight back must succeed, since
    /// a failed submit restores fields this way.
    fn read_field(&self, name: &str) -> Option<FieldValue>;

    fn write_field(&mut self, name: &str, value: Option<FieldValue>) -> Result<(), FormError>;

    /// Called once after a form has written every field back.
    fn on_update(&mut self) {}
}
