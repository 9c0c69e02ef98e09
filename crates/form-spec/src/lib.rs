#![allow(missing_docs)]

pub mod constraint;
pub mod descriptor;
pub mod error;
pub mod form;
pub mod mode;
pub mod record;
pub mod registry;
pub mod render;
pub mod schema;
pub mod template;
pub mod value;
pub mod widget;

pub use constraint::{
    Constraint, ConstraintRule, CustomRule, FloatRule, IntegerRule, REQUIRED_MESSAGE, StringRule,
    TextRule, WidgetKind,
};
pub use descriptor::{FieldDescriptor, discover};
pub use error::FormError;
pub use form::{Form, FormEvent, FormState, SubmitOutcome};
pub use mode::FormMode;
pub use record::Record;
pub use registry::{WidgetFactory, WidgetRegistry, factory};
pub use render::{RenderPayload, build_render_payload, render_json_ui, render_text};
pub use schema::{FieldDeclaration, FormBindable, FormInfo, FormSchema, schema_document};
pub use template::{FormTexts, RenderedTexts};
pub use value::{FieldValue, FromFieldValue, ValueKind, extract};
pub use widget::{
    BoolWidget, Controls, FieldWidget, FloatWidget, IntegerWidget, SliderRange, StringWidget,
    TextWidget, WidgetAction, WidgetCore, WidgetView,
};
