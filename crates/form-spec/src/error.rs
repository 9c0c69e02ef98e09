use thiserror::Error;

use crate::form::FormState;
use crate::value::ValueKind;

/// Errors raised while building, driving or binding a form.
///
/// Constraint violations and malformed user input are not errors: they stay
/// inside the widgets as visible state.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("no widget registered for kind '{kind}' (field '{field}')")]
    MissingWidget { kind: String, field: String },
    #[error("field '{field}' is declared as {declared} but its constraint expects {expected}")]
    KindMismatch {
        field: String,
        declared: ValueKind,
        expected: ValueKind,
    },
    #[error("invalid constraint on field '{field}': {reason}")]
    InvalidConstraint { field: String, reason: String },
    #[error("unknown field '{name}'")]
    UnknownField { name: String },
    #[error("field '{field}' expects {expected} but received {found}")]
    TypeMismatch {
        field: String,
        expected: ValueKind,
        found: String,
    },
    #[error("no item is bound to the form")]
    NotBound,
    #[error("the bound item was dropped")]
    ItemDropped,
    #[error("the bound item is borrowed elsewhere")]
    ItemBusy,
    #[error("cannot {operation} while the form is {state}")]
    InvalidState {
        operation: &'static str,
        state: FormState,
    },
    #[error("template render failed: {0}")]
    Template(#[from] handlebars::RenderError),
    #[error("template parse failed: {0}")]
    TemplateParse(#[from] handlebars::TemplateError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_widget_names_kind_and_field() {
        let err = FormError::MissingWidget {
            kind: "color".into(),
            field: "tint".into(),
        };
        assert_eq!(
            err.to_string(),
            "no widget registered for kind 'color' (field 'tint')"
        );
    }

    #[test]
    fn invalid_state_mentions_operation() {
        let err = FormError::InvalidState {
            operation: "submit",
            state: FormState::Empty,
        };
        assert_eq!(err.to_string(), "cannot submit while the form is empty");
    }
}
