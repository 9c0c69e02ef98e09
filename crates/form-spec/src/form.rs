use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::descriptor::discover;
use crate::error::FormError;
use crate::mode::FormMode;
use crate::registry::WidgetRegistry;
use crate::schema::{FormBindable, FormInfo};
use crate::template::{FormTexts, RenderedTexts};
use crate::value::FieldValue;
use crate::widget::{FieldWidget, WidgetAction};

/// Lifecycle of a form over its bound item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Empty,
    Building,
    Ready,
    Validating,
    Rebuilding,
    Canceled,
}

impl FormState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormState::Empty => "empty",
            FormState::Building => "building",
            FormState::Ready => "ready",
            FormState::Validating => "validating",
            FormState::Rebuilding => "rebuilding",
            FormState::Canceled => "canceled",
        }
    }
}

impl fmt::Display for FormState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Every field passed and was written back.
    Bound,
    /// Nothing was written; the named fields show errors.
    Invalid { failed: Vec<String> },
}

/// Notifications delivered to form listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormEvent {
    Submitted,
    Canceled,
}

type Listener = Box<dyn FnMut(FormEvent)>;

/// Builds widgets for a bound host object and commits them back on submit.
///
/// The form observes its item through a weak reference and never keeps it
/// alive. Every bind rebuilds all widgets from scratch.
pub struct Form<T: FormBindable> {
    registry: Arc<WidgetRegistry>,
    texts: FormTexts,
    item: Option<Weak<RefCell<T>>>,
    mode: FormMode,
    widgets: Vec<Box<dyn FieldWidget>>,
    info: Option<FormInfo>,
    rendered: RenderedTexts,
    type_name: String,
    state: FormState,
    listeners: Vec<Listener>,
}

impl<T: FormBindable + 'static> Form<T> {
    pub fn new(registry: Arc<WidgetRegistry>, texts: FormTexts) -> Self {
        Self {
            registry,
            texts,
            item: None,
            mode: FormMode::EDIT,
            widgets: Vec::new(),
            info: None,
            rendered: RenderedTexts::default(),
            type_name: String::new(),
            state: FormState::Empty,
            listeners: Vec::new(),
        }
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn info(&self) -> Option<&FormInfo> {
        self.info.as_ref()
    }

    pub fn title(&self) -> Option<&str> {
        self.rendered.title.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.rendered.description.as_deref()
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The bound item, if it is still alive.
    pub fn item(&self) -> Option<Rc<RefCell<T>>> {
        self.item.as_ref().and_then(Weak::upgrade)
    }

    pub fn widgets(&self) -> impl Iterator<Item = &dyn FieldWidget> {
        self.widgets.iter().map(|widget| widget.as_ref())
    }

    pub fn widget(&self, name: &str) -> Option<&dyn FieldWidget> {
        self.widgets().find(|widget| widget.name() == name)
    }

    pub fn widget_mut(&mut self, name: &str) -> Option<&mut Box<dyn FieldWidget>> {
        self.widgets.iter_mut().find(|widget| widget.name() == name)
    }

    pub fn subscribe(&mut self, listener: impl FnMut(FormEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Binds an item and builds its widgets for `mode`.
    pub fn bind(&mut self, item: &Rc<RefCell<T>>, mode: FormMode) -> Result<(), FormError> {
        if matches!(self.state, FormState::Building | FormState::Validating | FormState::Rebuilding) {
            return Err(self.invalid_state("bind"));
        }
        self.item = Some(Rc::downgrade(item));
        self.mode = mode;
        self.rebuild()
    }

    /// Binds a fresh default item in create mode and hands it back.
    pub fn create_item(&mut self) -> Result<Rc<RefCell<T>>, FormError>
    where
        T: Default,
    {
        let item = Rc::new(RefCell::new(T::default()));
        self.bind(&item, FormMode::CREATE)?;
        Ok(item)
    }

    /// Rebuilds every widget from the bound item, dropping pending edits.
    pub fn reload(&mut self) -> Result<(), FormError> {
        if self.item.is_none() {
            return Err(FormError::NotBound);
        }
        self.rebuild()
    }

    /// Discards the in-progress edits of a ready or canceled form.
    pub fn reset(&mut self) -> Result<(), FormError> {
        if !matches!(self.state, FormState::Ready | FormState::Canceled) {
            return Err(self.invalid_state("reset"));
        }
        self.transition(FormState::Rebuilding);
        self.reload()
    }

    /// Drops every widget and forgets the item.
    pub fn clear(&mut self) {
        self.widgets.clear();
        self.item = None;
        self.info = None;
        self.rendered = RenderedTexts::default();
        self.type_name.clear();
        self.transition(FormState::Empty);
    }

    /// Routes raw text input to a widget.
    pub fn input(&mut self, name: &str, raw: &str) -> Result<(), FormError> {
        self.ensure_ready("edit")?;
        let widget = self.widget_mut(name).ok_or_else(|| FormError::UnknownField {
            name: name.to_string(),
        })?;
        widget.on_local_change(raw);
        Ok(())
    }

    /// Routes a control action to a widget; false when it has no such control.
    pub fn action(&mut self, name: &str, action: WidgetAction) -> Result<bool, FormError> {
        self.ensure_ready("edit")?;
        let widget = self.widget_mut(name).ok_or_else(|| FormError::UnknownField {
            name: name.to_string(),
        })?;
        Ok(widget.on_action(action))
    }

    /// Validates every widget so each shows its error; true when all pass.
    pub fn validate_all(&mut self) -> Result<bool, FormError> {
        self.ensure_ready("validate")?;
        Ok(self.check_widgets().is_empty())
    }

    /// Validates every widget, then writes them all back only if all passed.
    pub fn submit(&mut self) -> Result<SubmitOutcome, FormError> {
        self.ensure_ready("submit")?;
        let item = self.live_item()?;

        self.transition(FormState::Validating);
        let failed = self.check_widgets();
        if !failed.is_empty() {
            warn!(type_name = %self.type_name, ?failed, "form submission rejected");
            self.transition(FormState::Ready);
            return Ok(SubmitOutcome::Invalid { failed });
        }

        let result = Self::commit(&item, &self.widgets);
        self.transition(FormState::Ready);
        result?;

        debug!(type_name = %self.type_name, fields = self.widgets.len(), "form bound to item");
        self.emit(FormEvent::Submitted);
        Ok(SubmitOutcome::Bound)
    }

    /// Abandons the edits without touching the item.
    pub fn cancel(&mut self) -> Result<(), FormError> {
        self.ensure_ready("cancel")?;
        self.transition(FormState::Canceled);
        self.emit(FormEvent::Canceled);
        Ok(())
    }

    fn rebuild(&mut self) -> Result<(), FormError> {
        self.widgets.clear();
        self.transition(FormState::Building);
        match self.build() {
            Ok(widgets) => {
                self.widgets = widgets;
                self.transition(FormState::Ready);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "form build aborted");
                self.transition(FormState::Empty);
                Err(err)
            }
        }
    }

    fn build(&mut self) -> Result<Vec<Box<dyn FieldWidget>>, FormError> {
        let handle = self.live_item()?;
        let item = handle.try_borrow().map_err(|_| FormError::ItemBusy)?;
        let schema = item.schema();

        self.type_name = schema.type_name.clone();
        self.info = schema.info.clone();
        self.rendered = self
            .texts
            .render(self.info.as_ref(), &self.type_name, self.mode)?;

        let mut widgets = Vec::new();
        for descriptor in discover(&*item, self.mode)? {
            let kind = descriptor.constraint.widget_kind();
            let mut widget =
                self.registry
                    .instantiate(&kind)
                    .ok_or_else(|| FormError::MissingWidget {
                        kind: kind.to_string(),
                        field: descriptor.name.clone(),
                    })?;
            widget.configure(&descriptor)?;
            widgets.push(widget);
        }
        debug!(type_name = %self.type_name, mode = %self.mode, count = widgets.len(), "form built");
        Ok(widgets)
    }

    /// Writes every widget back or, if one write fails, restores the fields
    /// already written so the item is left as it was.
    fn commit(item: &Rc<RefCell<T>>, widgets: &[Box<dyn FieldWidget>]) -> Result<(), FormError> {
        let mut item = item.try_borrow_mut().map_err(|_| FormError::ItemBusy)?;
        let mut previous = Vec::with_capacity(widgets.len());
        for widget in widgets {
            let before = item.read_field(widget.name());
            if let Err(err) = widget.bind(&mut *item) {
                previous.push((widget.name(), before));
                Self::restore(&mut *item, previous);
                return Err(err);
            }
            previous.push((widget.name(), before));
        }
        item.on_update();
        Ok(())
    }

    fn restore(item: &mut T, previous: Vec<(&str, Option<FieldValue>)>) {
        for (name, value) in previous.into_iter().rev() {
            if let Err(err) = item.write_field(name, value) {
                warn!(field = name, error = %err, "could not restore field after failed bind");
            }
        }
        debug!(type_name = %item.schema().type_name, "bind rolled back");
    }

    fn check_widgets(&mut self) -> Vec<String> {
        let mut failed = Vec::new();
        for widget in &mut self.widgets {
            if !widget.validate() {
                failed.push(widget.name().to_string());
            }
        }
        failed
    }

    fn live_item(&self) -> Result<Rc<RefCell<T>>, FormError> {
        let weak = self.item.as_ref().ok_or(FormError::NotBound)?;
        weak.upgrade().ok_or(FormError::ItemDropped)
    }

    fn ensure_ready(&self, operation: &'static str) -> Result<(), FormError> {
        if self.state == FormState::Ready {
            Ok(())
        } else {
            Err(self.invalid_state(operation))
        }
    }

    fn invalid_state(&self, operation: &'static str) -> FormError {
        FormError::InvalidState {
            operation,
            state: self.state,
        }
    }

    fn transition(&mut self, next: FormState) {
        if self.state != next {
            debug!(from = %self.state, to = %next, "form state");
            self.state = next;
        }
    }

    fn emit(&mut self, event: FormEvent) {
        for listener in &mut self.listeners {
            listener(event);
        }
    }
}

impl<T: FormBindable> fmt::Debug for Form<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form")
            .field("type_name", &self.type_name)
            .field("mode", &self.mode)
            .field("state", &self.state)
            .field(
                "widgets",
                &self.widgets.iter().map(|widget| widget.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
