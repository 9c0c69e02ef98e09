use tracing::debug;

use crate::constraint::Constraint;
use crate::error::FormError;
use crate::mode::FormMode;
use crate::schema::FormBindable;
use crate::value::{FieldValue, ValueKind};

/// A constrained field discovered on a host object for one build pass.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub declared_type: ValueKind,
    pub current_value: Option<FieldValue>,
    pub constraint: Constraint,
}

impl FieldDescriptor {
    /// Label text: the constraint label or the field name, starred when required.
    pub fn label(&self) -> String {
        let base = self.constraint.label.as_deref().unwrap_or(&self.name);
        if self.constraint.required {
            format!("{base} *")
        } else {
            base.to_string()
        }
    }
}

/// Collects, in declaration order, the constrained fields visible in `mode`.
pub fn discover(item: &dyn FormBindable, mode: FormMode) -> Result<Vec<FieldDescriptor>, FormError> {
    let schema = item.schema();
    let mut descriptors = Vec::new();

    for declaration in &schema.fields {
        let Some(constraint) = &declaration.constraint else {
            continue;
        };
        if !constraint.is_visible_in(mode) {
            debug!(field = %declaration.name, %mode, "field hidden in mode");
            continue;
        }
        if constraint.value_kind() != declaration.declared_type {
            return Err(FormError::KindMismatch {
                field: declaration.name.clone(),
                declared: declaration.declared_type,
                expected: constraint.value_kind(),
            });
        }
        constraint.verify(&declaration.name)?;

        descriptors.push(FieldDescriptor {
            name: declaration.name.clone(),
            declared_type: declaration.declared_type,
            current_value: item.read_field(&declaration.name),
            constraint: constraint.clone(),
        });
    }

    debug!(
        type_name = %schema.type_name,
        %mode,
        count = descriptors.len(),
        "discovered form fields"
    );
    Ok(descriptors)
}
