use serde_json::{Value, json};

use crate::form::{Form, FormState};
use crate::schema::FormBindable;
use crate::widget::WidgetView;

/// Collected payload used by both text and JSON renderers.
#[derive(Debug, Clone)]
pub struct RenderPayload {
    pub type_name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub mode: String,
    pub state: FormState,
    /// False as soon as one field shows an error.
    pub valid: bool,
    pub fields: Vec<WidgetView>,
}

/// Build the renderer payload from the live widgets of a form.
pub fn build_render_payload<T: FormBindable + 'static>(form: &Form<T>) -> RenderPayload {
    let fields = form.widgets().map(|widget| widget.view()).collect::<Vec<_>>();
    RenderPayload {
        type_name: form.type_name().to_string(),
        title: form.title().map(str::to_string),
        description: form.description().map(str::to_string),
        mode: form.mode().to_string(),
        state: form.state(),
        valid: fields.iter().all(|field| field.error.is_none()),
        fields,
    }
}

/// Render the payload as a structured JSON-friendly value.
pub fn render_json_ui(payload: &RenderPayload) -> Value {
    let fields = payload
        .fields
        .iter()
        .map(|field| serde_json::to_value(field).unwrap_or(Value::Null))
        .collect::<Vec<_>>();

    json!({
        "type_name": payload.type_name,
        "title": payload.title,
        "description": payload.description,
        "mode": payload.mode,
        "state": payload.state.as_str(),
        "valid": payload.valid,
        "fields": fields,
    })
}

/// Render the payload as human-friendly text.
pub fn render_text(payload: &RenderPayload) -> String {
    let mut lines = Vec::new();
    match &payload.title {
        Some(title) => lines.push(format!("Form: {}", title)),
        None => lines.push(format!("Form: {} ({})", payload.type_name, payload.mode)),
    }
    if let Some(description) = &payload.description {
        lines.push(description.clone());
    }

    if payload.fields.is_empty() {
        lines.push("No fields are visible in this mode.".to_string());
    }
    for field in &payload.fields {
        lines.push(format!(" - {}: {}", field.label, field_display(field)));
        if let Some(error) = &field.error {
            lines.push(format!("   ! {}", error));
        }
    }

    lines.join("\n")
}

fn field_display(field: &WidgetView) -> String {
    let controls = &field.controls;
    let mut entry = if let Some(flag) = controls.toggle {
        if flag { "[x]".to_string() } else { "[ ]".to_string() }
    } else if field.text.is_empty() {
        controls
            .placeholder
            .as_ref()
            .map(|placeholder| format!("<{}>", placeholder))
            .unwrap_or_default()
    } else {
        field.text.clone()
    };
    if controls.stepper {
        entry.push_str(" [-/+]");
    }
    if let Some(slider) = controls.slider {
        entry.push_str(&format!(" [slider {}..{}]", slider.min, slider.max));
    }
    if let Some(height) = controls.multiline_height {
        entry.push_str(&format!(" [multiline {}]", height));
    }
    entry
}
