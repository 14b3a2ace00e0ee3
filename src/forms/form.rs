//! Live form state bound to generated descriptors.

use chrono::NaiveDate;
use indexmap::IndexMap;
use regex::Regex;
use std::fmt;

use crate::entity::{EntityRecord, FieldValue};
use crate::forms::FieldDescriptor;
use crate::metadata::FieldKind;
use crate::notify::Notifier;

/// Error type for form operations
#[derive(Debug, Clone, PartialEq)]
pub enum FormError {
    UnknownField(String),
    InvalidPattern {
        field: String,
        reason: String,
    },
    /// Submission refused; lists the fields that failed validation.
    Invalid(Vec<String>),
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::UnknownField(name) => write!(f, "Form has no field '{}'", name),
            FormError::InvalidPattern { field, reason } => {
                write!(f, "Invalid pattern for field '{}': {}", field, reason)
            }
            FormError::Invalid(fields) => {
                write!(f, "Form is invalid: {}", fields.join(", "))
            }
        }
    }
}

impl std::error::Error for FormError {}

/// A single failed rule on a control.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Required,
    Email,
    Min(f64),
    Max(f64),
    MinLength(usize),
    MaxLength(usize),
    Pattern(Option<String>),
    MinDate(NaiveDate),
    MaxDate(NaiveDate),
}

impl ValidationError {
    /// User-facing message for a field labelled `label`.
    pub fn message(&self, label: &str) -> String {
        match self {
            ValidationError::Required => format!("{} is required", label),
            ValidationError::Email => "Invalid email format".to_string(),
            ValidationError::Min(min) => format!("Minimum value: {}", min),
            ValidationError::Max(max) => format!("Maximum value: {}", max),
            ValidationError::MinLength(n) => format!("Minimum {} characters", n),
            ValidationError::MaxLength(n) => format!("Maximum {} characters", n),
            ValidationError::Pattern(custom) => custom
                .clone()
                .unwrap_or_else(|| "Invalid format".to_string()),
            ValidationError::MinDate(d) => format!("Date must be on or after {}", d),
            ValidationError::MaxDate(d) => format!("Date must be on or before {}", d),
        }
    }
}

#[derive(Debug, Clone)]
enum Rule {
    Required,
    Email(Regex),
    Min(f64),
    Max(f64),
    MinLength(usize),
    MaxLength(usize),
    Pattern { regex: Regex, message: Option<String> },
    MinDate(NaiveDate),
    MaxDate(NaiveDate),
}

const EMAIL_PATTERN: &str = r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$";

/// Patterns given as plain strings must match the whole value.
fn anchored(pattern: &str) -> String {
    let mut full = String::with_capacity(pattern.len() + 2);
    if !pattern.starts_with('^') {
        full.push('^');
    }
    full.push_str(pattern);
    if !pattern.ends_with('$') {
        full.push('$');
    }
    full
}

impl Rule {
    fn check(&self, value: &FieldValue) -> Option<ValidationError> {
        if let Rule::Required = self {
            return value.is_empty().then_some(ValidationError::Required);
        }
        // Every other rule leaves empty values to `Required`.
        if value.is_empty() {
            return None;
        }

        match self {
            Rule::Required => None,
            Rule::Email(regex) => match value.as_str() {
                Some(s) if !regex.is_match(s) => Some(ValidationError::Email),
                _ => None,
            },
            Rule::Min(min) => value
                .as_f64()
                .filter(|v| v < min)
                .map(|_| ValidationError::Min(*min)),
            Rule::Max(max) => value
                .as_f64()
                .filter(|v| v > max)
                .map(|_| ValidationError::Max(*max)),
            Rule::MinLength(n) => value
                .text_len()
                .filter(|len| len < n)
                .map(|_| ValidationError::MinLength(*n)),
            Rule::MaxLength(n) => value
                .text_len()
                .filter(|len| len > n)
                .map(|_| ValidationError::MaxLength(*n)),
            Rule::Pattern { regex, message } => {
                let text = value.to_string();
                (!regex.is_match(&text)).then(|| ValidationError::Pattern(message.clone()))
            }
            Rule::MinDate(min) => parse_date(value)
                .filter(|d| d < min)
                .map(|_| ValidationError::MinDate(*min)),
            Rule::MaxDate(max) => parse_date(value)
                .filter(|d| d > max)
                .map(|_| ValidationError::MaxDate(*max)),
        }
    }
}

fn parse_date(value: &FieldValue) -> Option<NaiveDate> {
    let text = value.as_str()?;
    let date_part = text.split('T').next().unwrap_or(text);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

fn compile(field: &str, pattern: &str) -> Result<Regex, FormError> {
    Regex::new(pattern).map_err(|e| FormError::InvalidPattern {
        field: field.to_string(),
        reason: e.to_string(),
    })
}

fn build_rules(descriptor: &FieldDescriptor) -> Result<Vec<Rule>, FormError> {
    let mut rules = Vec::new();
    if descriptor.required {
        rules.push(Rule::Required);
    }
    if descriptor.kind == FieldKind::Email {
        rules.push(Rule::Email(compile(&descriptor.name, EMAIL_PATTERN)?));
    }

    let Some(constraints) = descriptor.constraints.clone() else {
        return Ok(rules);
    };
    let constraints = constraints.restricted_to(descriptor.kind);

    if let Some(min) = constraints.min {
        rules.push(Rule::Min(min));
    }
    if let Some(max) = constraints.max {
        rules.push(Rule::Max(max));
    }
    if let Some(n) = constraints.min_length.filter(|n| *n > 0) {
        rules.push(Rule::MinLength(n));
    }
    if let Some(n) = constraints.max_length.filter(|n| *n > 0) {
        rules.push(Rule::MaxLength(n));
    }
    if let Some(pattern) = constraints.pattern.filter(|p| !p.is_empty()) {
        let regex = compile(&descriptor.name, &anchored(&pattern))?;
        rules.push(Rule::Pattern {
            regex,
            message: constraints.pattern_message,
        });
    }
    if let Some(min) = constraints.min_date {
        rules.push(Rule::MinDate(min));
    }
    if let Some(max) = constraints.max_date {
        rules.push(Rule::MaxDate(max));
    }
    Ok(rules)
}

#[derive(Debug, Clone)]
struct Control {
    kind: FieldKind,
    label: String,
    value: FieldValue,
    touched: bool,
    dirty: bool,
    rules: Vec<Rule>,
}

impl Control {
    fn errors(&self) -> Vec<ValidationError> {
        self.rules.iter().filter_map(|r| r.check(&self.value)).collect()
    }

    fn is_valid(&self) -> bool {
        self.rules.iter().all(|r| r.check(&self.value).is_none())
    }
}

fn initial_value(descriptor: &FieldDescriptor) -> FieldValue {
    match &descriptor.value {
        Some(value) if !value.is_null() => value.clone(),
        _ => descriptor.kind.default_value(),
    }
}

type ValidityListener = Box<dyn Fn(bool) + Send + Sync>;

/// One control per descriptor, validated on every change.
pub struct DynamicForm {
    descriptors: Vec<FieldDescriptor>,
    controls: IndexMap<String, Control>,
    title: Option<String>,
    edit_mode: bool,
    listeners: Vec<ValidityListener>,
}

impl fmt::Debug for DynamicForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicForm")
            .field("fields", &self.controls.keys().collect::<Vec<_>>())
            .field("edit_mode", &self.edit_mode)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl DynamicForm {
    /// Bind `descriptors` to fresh controls.
    ///
    /// Fails only when a descriptor carries a pattern that is not a valid
    /// regular expression.
    pub fn new(descriptors: Vec<FieldDescriptor>) -> Result<Self, FormError> {
        let mut controls = IndexMap::with_capacity(descriptors.len());
        for descriptor in &descriptors {
            controls.insert(
                descriptor.name.clone(),
                Control {
                    kind: descriptor.kind,
                    label: descriptor.label.clone(),
                    value: initial_value(descriptor),
                    touched: false,
                    dirty: false,
                    rules: build_rules(descriptor)?,
                },
            );
        }

        Ok(Self {
            descriptors,
            controls,
            title: None,
            edit_mode: false,
            listeners: Vec::new(),
        })
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_edit_mode(mut self, edit_mode: bool) -> Self {
        self.edit_mode = edit_mode;
        self
    }

    pub fn title(&self) -> String {
        match &self.title {
            Some(title) => title.clone(),
            None if self.edit_mode => "Edit Record".to_string(),
            None => "New Record".to_string(),
        }
    }

    pub fn is_edit_mode(&self) -> bool {
        self.edit_mode
    }

    pub fn descriptors(&self) -> &[FieldDescriptor] {
        &self.descriptors
    }

    /// Nothing to render.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Sections in display order with their fields.
    pub fn sections(&self) -> Vec<(&str, Vec<&FieldDescriptor>)> {
        let mut sections: Vec<(&str, Vec<&FieldDescriptor>)> = Vec::new();
        for descriptor in &self.descriptors {
            match sections.iter_mut().find(|(name, _)| *name == descriptor.section) {
                Some((_, fields)) => fields.push(descriptor),
                None => sections.push((descriptor.section.as_str(), vec![descriptor])),
            }
        }
        sections
    }

    /// Register a callback receiving the form validity after every change.
    pub fn on_validity_change<F>(&mut self, listener: F)
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.controls.get(name).map(|c| &c.value)
    }

    /// Change one control's value; returns the form validity afterwards.
    pub fn set_value(
        &mut self,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> Result<bool, FormError> {
        let control = self
            .controls
            .get_mut(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))?;
        control.value = value.into();
        control.dirty = true;

        let valid = self.is_valid();
        for listener in &self.listeners {
            listener(valid);
        }
        Ok(valid)
    }

    pub fn touch(&mut self, name: &str) -> Result<(), FormError> {
        let control = self
            .controls
            .get_mut(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))?;
        control.touched = true;
        Ok(())
    }

    pub fn mark_all_touched(&mut self) {
        for control in self.controls.values_mut() {
            control.touched = true;
        }
    }

    pub fn is_touched(&self, name: &str) -> bool {
        self.controls.get(name).map(|c| c.touched).unwrap_or(false)
    }

    pub fn is_valid(&self) -> bool {
        self.controls.values().all(Control::is_valid)
    }

    pub fn is_dirty(&self) -> bool {
        self.controls.values().any(|c| c.dirty)
    }

    pub fn is_field_valid(&self, name: &str) -> bool {
        self.controls.get(name).map(Control::is_valid).unwrap_or(false)
    }

    pub fn errors(&self, name: &str) -> Vec<ValidationError> {
        self.controls.get(name).map(Control::errors).unwrap_or_default()
    }

    pub fn invalid_fields(&self) -> Vec<String> {
        self.controls
            .iter()
            .filter(|(_, c)| !c.is_valid())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Whether an inline error should be shown: invalid and touched.
    pub fn has_error(&self, name: &str) -> bool {
        self.controls
            .get(name)
            .map(|c| c.touched && !c.is_valid())
            .unwrap_or(false)
    }

    /// Message for the first failing rule of a touched control.
    pub fn error_message(&self, name: &str) -> Option<String> {
        let control = self.controls.get(name)?;
        if !control.touched {
            return None;
        }
        control.errors().first().map(|e| e.message(&control.label))
    }

    /// Validate and hand back the descriptors with their live values.
    ///
    /// An invalid form marks every control touched, warns through
    /// `notifier` and refuses the submission.
    pub fn submit(&mut self, notifier: &dyn Notifier) -> Result<Vec<FieldDescriptor>, FormError> {
        let invalid = self.invalid_fields();
        if !invalid.is_empty() {
            self.mark_all_touched();
            notifier.warning("Please complete all required fields");
            tracing::debug!("Form submission refused, invalid fields: {:?}", invalid);
            return Err(FormError::Invalid(invalid));
        }

        Ok(self
            .descriptors
            .iter()
            .map(|descriptor| {
                let mut submitted = descriptor.clone();
                submitted.value = self.controls.get(&descriptor.name).map(|c| c.value.clone());
                submitted
            })
            .collect())
    }

    /// Submit and flatten into a payload record.
    pub fn submit_record(&mut self, notifier: &dyn Notifier) -> Result<EntityRecord, FormError> {
        self.submit(notifier)
            .map(|descriptors| EntityRecord::from_descriptors(&descriptors))
    }

    /// Return every control to its kind default (not to the supplied values).
    pub fn reset(&mut self) {
        for control in self.controls.values_mut() {
            control.value = control.kind.default_value();
            control.touched = false;
            control.dirty = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ValidationConstraints;
    use crate::notify::{Level, NotificationQueue};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn code_field() -> FieldDescriptor {
        FieldDescriptor::new("codigo", "Codigo", FieldKind::Text)
            .required(true)
            .with_constraints(ValidationConstraints {
                min_length: Some(2),
                max_length: Some(10),
                pattern: Some("[A-Z0-9]+".to_string()),
                pattern_message: Some("Only upper-case letters and digits".to_string()),
                ..Default::default()
            })
    }

    #[test]
    fn test_initial_values() {
        let form = DynamicForm::new(vec![
            FieldDescriptor::new("activo", "Activo", FieldKind::Boolean),
            FieldDescriptor::new("monto", "Monto", FieldKind::Number),
            FieldDescriptor::new("fecha", "Fecha", FieldKind::Date),
            FieldDescriptor::new("estado", "Estado", FieldKind::Select),
            FieldDescriptor::new("nombre", "Nombre", FieldKind::Text),
            FieldDescriptor::new("codigo", "Codigo", FieldKind::Text).with_value("LP"),
        ])
        .unwrap();

        assert_eq!(form.value("activo"), Some(&FieldValue::Bool(false)));
        assert_eq!(form.value("monto"), Some(&FieldValue::Int(0)));
        assert_eq!(form.value("fecha"), Some(&FieldValue::Null));
        assert_eq!(form.value("estado"), Some(&FieldValue::Null));
        assert_eq!(form.value("nombre"), Some(&FieldValue::from("")));
        assert_eq!(form.value("codigo"), Some(&FieldValue::from("LP")));
    }

    #[test]
    fn test_required_field() {
        let mut form = DynamicForm::new(vec![
            FieldDescriptor::new("nombre", "Nombre", FieldKind::Text).required(true),
        ])
        .unwrap();

        assert!(!form.is_valid());
        assert_eq!(form.errors("nombre"), vec![ValidationError::Required]);

        assert!(form.set_value("nombre", "Bienes").unwrap());
        assert!(form.is_valid());
        assert!(form.is_dirty());
    }

    #[test]
    fn test_length_and_pattern_rules() {
        let mut form = DynamicForm::new(vec![code_field()]).unwrap();

        form.set_value("codigo", "A").unwrap();
        assert_eq!(form.errors("codigo"), vec![ValidationError::MinLength(2)]);

        form.set_value("codigo", "lp").unwrap();
        assert_eq!(
            form.errors("codigo"),
            vec![ValidationError::Pattern(Some(
                "Only upper-case letters and digits".to_string()
            ))]
        );

        form.set_value("codigo", "LP01").unwrap();
        assert!(form.is_valid());
    }

    #[test]
    fn test_numeric_bounds_skip_empty_values() {
        let field = FieldDescriptor::new("monto", "Monto", FieldKind::Number).with_constraints(
            ValidationConstraints {
                min: Some(1.0),
                max: Some(10000.0),
                ..Default::default()
            },
        );
        let mut form = DynamicForm::new(vec![field]).unwrap();

        form.set_value("monto", FieldValue::Null).unwrap();
        assert!(form.is_valid());

        form.set_value("monto", 0).unwrap();
        assert_eq!(form.errors("monto"), vec![ValidationError::Min(1.0)]);

        form.set_value("monto", 20000.5).unwrap();
        assert_eq!(form.errors("monto"), vec![ValidationError::Max(10000.0)]);
    }

    #[test]
    fn test_email_rule() {
        let mut form =
            DynamicForm::new(vec![FieldDescriptor::new("email", "Email", FieldKind::Email)]).unwrap();

        form.set_value("email", "not-an-email").unwrap();
        assert_eq!(form.errors("email"), vec![ValidationError::Email]);

        form.set_value("email", "ana.garcia@gmail.com").unwrap();
        assert!(form.is_valid());
    }

    #[test]
    fn test_error_messages_only_when_touched() {
        let mut form = DynamicForm::new(vec![code_field()]).unwrap();
        assert_eq!(form.error_message("codigo"), None);

        form.touch("codigo").unwrap();
        assert_eq!(form.error_message("codigo").as_deref(), Some("Codigo is required"));
        assert!(form.has_error("codigo"));

        form.set_value("codigo", "ABCDEFGHIJKL").unwrap();
        assert_eq!(form.error_message("codigo").as_deref(), Some("Maximum 10 characters"));
    }

    #[test]
    fn test_invalid_submit_touches_everything_and_warns() {
        let mut form = DynamicForm::new(vec![
            code_field(),
            FieldDescriptor::new("descripcion", "Descripcion", FieldKind::Textarea),
        ])
        .unwrap();
        let notifier = NotificationQueue::default();

        let err = form.submit(&notifier).unwrap_err();
        assert_eq!(err, FormError::Invalid(vec!["codigo".to_string()]));
        assert!(form.is_touched("codigo"));
        assert!(form.is_touched("descripcion"));

        let notes = notifier.snapshot();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, Level::Warning);
    }

    #[test]
    fn test_valid_submit_emits_values() {
        let mut form = DynamicForm::new(vec![
            code_field(),
            FieldDescriptor::new("activo", "Activo", FieldKind::Boolean),
        ])
        .unwrap();
        form.set_value("codigo", "LP").unwrap();

        let notifier = NotificationQueue::default();
        let record = form.submit_record(&notifier).unwrap();
        assert_eq!(record.get_str("codigo"), Some("LP"));
        assert_eq!(record.get("activo"), Some(&FieldValue::Bool(false)));
        assert!(notifier.is_empty());
    }

    #[test]
    fn test_reset_returns_to_kind_defaults() {
        let mut form = DynamicForm::new(vec![
            FieldDescriptor::new("activo", "Activo", FieldKind::Boolean).with_value(true),
            FieldDescriptor::new("monto", "Monto", FieldKind::Number).with_value(5150),
            FieldDescriptor::new("fecha", "Fecha", FieldKind::Date).with_value("2025-01-01"),
            FieldDescriptor::new("estado", "Estado", FieldKind::Select).with_value("ACTIVO"),
            FieldDescriptor::new("nombre", "Nombre", FieldKind::Text).with_value("Bienes"),
        ])
        .unwrap();
        form.set_value("nombre", "Obras").unwrap();
        form.reset();

        assert_eq!(form.value("activo"), Some(&FieldValue::Bool(false)));
        assert_eq!(form.value("monto"), Some(&FieldValue::Int(0)));
        assert_eq!(form.value("fecha"), Some(&FieldValue::Null));
        assert_eq!(form.value("estado"), Some(&FieldValue::Null));
        assert_eq!(form.value("nombre"), Some(&FieldValue::from("")));
        assert!(!form.is_dirty());
    }

    #[test]
    fn test_listeners_see_every_change() {
        let mut form = DynamicForm::new(vec![
            FieldDescriptor::new("nombre", "Nombre", FieldKind::Text).required(true),
        ])
        .unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        form.on_validity_change(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        form.set_value("nombre", "x").unwrap();
        form.set_value("nombre", "").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_bad_pattern_is_reported() {
        let field = FieldDescriptor::new("codigo", "Codigo", FieldKind::Text).with_constraints(
            ValidationConstraints {
                pattern: Some("([A-Z".to_string()),
                ..Default::default()
            },
        );
        assert!(matches!(
            DynamicForm::new(vec![field]),
            Err(FormError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_unknown_field() {
        let mut form = DynamicForm::new(vec![]).unwrap();
        assert!(form.is_empty());
        assert_eq!(
            form.set_value("ghost", 1),
            Err(FormError::UnknownField("ghost".to_string()))
        );
    }

    #[test]
    fn test_title() {
        let form = DynamicForm::new(vec![]).unwrap();
        assert_eq!(form.title(), "New Record");
        let form = form.with_edit_mode(true);
        assert_eq!(form.title(), "Edit Record");
        assert_eq!(form.with_title("UIT").title(), "UIT");
    }
}
