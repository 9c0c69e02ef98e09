use handlebars::{Handlebars, no_escape};
use serde_json::json;

use crate::error::FormError;
use crate::mode::FormMode;
use crate::schema::FormInfo;

pub const DEFAULT_TITLE_FORMAT: &str = "{{form_info.title}} ({{mode}})";
pub const DEFAULT_DESCRIPTION_FORMAT: &str = "A simple form for {{item_type_name}}";

/// Title and description formats of a form.
///
/// Formats see `form_info.title`, `form_info.description`, `item_type_name`
/// and `mode`. A `None` format leaves the text unset.
#[derive(Debug, Clone, PartialEq)]
pub struct FormTexts {
    pub title_format: Option<String>,
    pub description_format: Option<String>,
}

impl Default for FormTexts {
    fn default() -> Self {
        Self {
            title_format: Some(DEFAULT_TITLE_FORMAT.to_string()),
            description_format: Some(DEFAULT_DESCRIPTION_FORMAT.to_string()),
        }
    }
}

/// Rendered header texts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedTexts {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl FormTexts {
    pub fn none() -> Self {
        Self {
            title_format: None,
            description_format: None,
        }
    }

    pub fn render(
        &self,
        info: Option<&FormInfo>,
        item_type_name: &str,
        mode: FormMode,
    ) -> Result<RenderedTexts, FormError> {
        let mut engine = Handlebars::new();
        engine.register_escape_fn(no_escape);

        let info = info.cloned().unwrap_or_default();
        let ctx = json!({
            "form_info": {
                "title": info.title,
                "description": info.description,
            },
            "item_type_name": item_type_name,
            "mode": mode.to_string(),
        });

        for (name, format) in [("title", &self.title_format), ("description", &self.description_format)] {
            if let Some(template) = format.as_deref()
                && !template.is_empty()
            {
                engine.register_template_string(name, template)?;
            }
        }

        let render = |name: &str| -> Result<Option<String>, FormError> {
            if engine.has_template(name) {
                Ok(Some(engine.render(name, &ctx)?))
            } else {
                Ok(None)
            }
        };

        Ok(RenderedTexts {
            title: render("title")?,
            description: render("description")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_info_type_and_mode() {
        let info = FormInfo {
            title: "Hero".into(),
            description: "Playable character".into(),
        };
        let texts = FormTexts::default()
            .render(Some(&info), "Character", FormMode::EDIT)
            .expect("render");
        assert_eq!(texts.title.as_deref(), Some("Hero (edit)"));
        assert_eq!(texts.description.as_deref(), Some("A simple form for Character"));
    }

    #[test]
    fn missing_info_renders_empty_and_skips_escaping() {
        let texts = FormTexts {
            title_format: Some("{{form_info.title}}<{{item_type_name}}>".into()),
            description_format: None,
        }
        .render(None, "A&B", FormMode::CREATE)
        .expect("render");
        assert_eq!(texts.title.as_deref(), Some("<A&B>"));
        assert_eq!(texts.description, None);
    }

    #[test]
    fn broken_template_is_an_error() {
        let result = FormTexts {
            title_format: Some("{{#if}}".into()),
            description_format: None,
        }
        .render(None, "Item", FormMode::EDIT);
        assert!(result.is_err());
    }
}
