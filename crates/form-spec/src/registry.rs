use std::fmt;
use std::sync::Arc;

use crate::constraint::WidgetKind;
use crate::widget::{BoolWidget, FieldWidget, FloatWidget, IntegerWidget, StringWidget, TextWidget};

/// Creates a fresh, unconfigured widget.
pub type WidgetFactory = Arc<dyn Fn() -> Box<dyn FieldWidget> + Send + Sync>;

/// Maps constraint widget kinds to widget factories.
///
/// The built-in kinds are looked up first; everything else is matched by
/// exact name against the custom entries, in registration order.
#[derive(Clone)]
pub struct WidgetRegistry {
    boolean: Option<WidgetFactory>,
    integer: Option<WidgetFactory>,
    float: Option<WidgetFactory>,
    string: Option<WidgetFactory>,
    custom: Vec<(String, WidgetFactory)>,
}

impl WidgetRegistry {
    /// A registry without any mapping.
    pub fn empty() -> Self {
        Self {
            boolean: None,
            integer: None,
            float: None,
            string: None,
            custom: Vec::new(),
        }
    }

    pub fn with_boolean(mut self, factory: WidgetFactory) -> Self {
        self.boolean = Some(factory);
        self
    }

    pub fn with_integer(mut self, factory: WidgetFactory) -> Self {
        self.integer = Some(factory);
        self
    }

    pub fn with_float(mut self, factory: WidgetFactory) -> Self {
        self.float = Some(factory);
        self
    }

    pub fn with_string(mut self, factory: WidgetFactory) -> Self {
        self.string = Some(factory);
        self
    }

    /// Adds a mapping for a non built-in kind such as `text` or a custom name.
    pub fn with_custom(mut self, kind: impl Into<String>, factory: WidgetFactory) -> Self {
        self.custom.push((kind.into(), factory));
        self
    }

    pub fn resolve(&self, kind: &WidgetKind) -> Option<&WidgetFactory> {
        let builtin = match kind {
            WidgetKind::Boolean => self.boolean.as_ref(),
            WidgetKind::Integer => self.integer.as_ref(),
            WidgetKind::Float => self.float.as_ref(),
            WidgetKind::String => self.string.as_ref(),
            WidgetKind::Text | WidgetKind::Custom(_) => None,
        };
        builtin.or_else(|| {
            self.custom
                .iter()
                .find(|(name, _)| name == kind.name())
                .map(|(_, factory)| factory)
        })
    }

    pub fn instantiate(&self, kind: &WidgetKind) -> Option<Box<dyn FieldWidget>> {
        self.resolve(kind).map(|factory| factory())
    }
}

impl Default for WidgetRegistry {
    fn default() -> Self {
        Self::empty()
            .with_boolean(factory::<BoolWidget>())
            .with_integer(factory::<IntegerWidget>())
            .with_float(factory::<FloatWidget>())
            .with_string(factory::<StringWidget>())
            .with_custom("text", factory::<TextWidget>())
    }
}

impl fmt::Debug for WidgetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetRegistry")
            .field("boolean", &self.boolean.is_some())
            .field("integer", &self.integer.is_some())
            .field("float", &self.float.is_some())
            .field("string", &self.string.is_some())
            .field(
                "custom",
                &self.custom.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Factory building `W::default()`.
pub fn factory<W>() -> WidgetFactory
where
    W: FieldWidget + Default + 'static,
{
    Arc::new(|| Box::new(W::default()) as Box<dyn FieldWidget>)
}
