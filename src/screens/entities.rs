use std::sync::Arc;

use crate::client::{ApiError, Backend};
use crate::entity::{EntityRecord, FieldValue};
use crate::forms::{DynamicForm, FieldDescriptor, FieldGenerator, FormError};
use crate::metadata::{FieldKind, ParametricaMetadata, SelectOption, ValidationConstraints};
use crate::notify::Notifier;
use crate::parametricas::{Operation, ParametricKind};

/// Generic manager for one parametric table.
pub struct EntityScreen {
    kind: ParametricKind,
    backend: Backend,
    notifier: Arc<dyn Notifier>,
    generator: FieldGenerator,
    metadata: Option<ParametricaMetadata>,
    records: Vec<EntityRecord>,
    sub_descriptions: Vec<EntityRecord>,
    form: Option<DynamicForm>,
    editing: Option<i64>,
}

/// Constraints a management screen enforces on top of the generated ones.
pub fn screen_constraints(kind: ParametricKind, field: &str) -> Option<ValidationConstraints> {
    let code = |min, max, pattern: &str, message: &str| ValidationConstraints {
        min_length: Some(min),
        max_length: Some(max),
        pattern: Some(pattern.to_string()),
        pattern_message: Some(message.to_string()),
        ..Default::default()
    };
    let length = |min, max| ValidationConstraints {
        min_length: min,
        max_length: Some(max),
        ..Default::default()
    };

    match (kind, field) {
        (ParametricKind::ObjetoContratacion, "codigo") => {
            Some(code(1, 20, "^[A-Z0-9]+$", "Only upper-case letters and digits"))
        }
        (ParametricKind::ObjetoContratacion, "nombre") => Some(length(Some(3), 50)),
        (ParametricKind::OperadoresMonto, "codigo") => Some(code(
            2,
            20,
            "^[A-Z0-9_]+$",
            "Only upper-case letters, digits and underscores",
        )),
        (ParametricKind::OperadoresMonto, "nombre") => Some(length(Some(3), 50)),
        (ParametricKind::OperadoresMonto, "simbolo") => Some(code(
            1,
            10,
            r"^[><=≥≤≠±+\-*/^()\s]+$",
            "Only mathematical symbols",
        )),
        (ParametricKind::SubDescripcion, "codigo") => Some(code(
            2,
            15,
            "^[A-Z0-9_]+$",
            "Only upper-case letters, digits and underscores",
        )),
        (ParametricKind::SubDescripcion, "nombre") => Some(length(Some(5), 100)),
        (ParametricKind::OperadoresMonto | ParametricKind::SubDescripcion, "descripcion") => {
            Some(length(None, 500))
        }
        (ParametricKind::TipoProceso, "codigo") => {
            Some(code(2, 10, "^[A-Z0-9]+$", "Only upper-case letters and digits"))
        }
        (ParametricKind::TipoProceso, "anioVigencia") => Some(ValidationConstraints {
            min: Some(2020.0),
            max: Some(2030.0),
            ..Default::default()
        }),
        _ => None,
    }
}

/// Label of a sub-description: its name, else its code, else its id.
fn sub_description_label(record: &EntityRecord) -> String {
    record
        .get_str("nombre")
        .or_else(|| record.get_str("codigo"))
        .map(str::to_string)
        .unwrap_or_else(|| format!("ID: {}", record.id.unwrap_or_default()))
}

/// Fill descriptor values from an existing record. Fields the record does
/// not carry keep their current value.
pub fn prefill(descriptors: &mut [FieldDescriptor], record: &EntityRecord) {
    for descriptor in descriptors.iter_mut() {
        if let Some(value) = record.get(&descriptor.name) {
            descriptor.value = Some(value.clone());
        }
    }
}

impl EntityScreen {
    pub fn new(kind: ParametricKind, backend: Backend, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_generator(kind, backend, notifier, FieldGenerator::new())
    }

    pub fn with_generator(
        kind: ParametricKind,
        backend: Backend,
        notifier: Arc<dyn Notifier>,
        generator: FieldGenerator,
    ) -> Self {
        Self {
            kind,
            backend,
            notifier,
            generator,
            metadata: None,
            records: Vec::new(),
            sub_descriptions: Vec::new(),
            form: None,
            editing: None,
        }
    }

    pub fn kind(&self) -> ParametricKind {
        self.kind
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn metadata(&self) -> Option<&ParametricaMetadata> {
        self.metadata.as_ref()
    }

    pub fn records(&self) -> &[EntityRecord] {
        &self.records
    }

    pub fn record(&self, id: i64) -> Option<&EntityRecord> {
        self.records.iter().find(|r| r.id == Some(id))
    }

    /// Table columns: the declared fields without `id`.
    pub fn columns(&self) -> Vec<&str> {
        self.metadata
            .iter()
            .flat_map(|m| m.fields.iter())
            .map(String::as_str)
            .filter(|f| *f != "id")
            .collect()
    }

    pub fn form(&self) -> Option<&DynamicForm> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut DynamicForm> {
        self.form.as_mut()
    }

    /// Sub-descriptions offered to contracting objects.
    pub fn sub_descriptions(&self) -> &[EntityRecord] {
        &self.sub_descriptions
    }

    /// Metadata, the sub-descriptions when objects reference them, then
    /// records.
    pub async fn load(&mut self) -> bool {
        if !self.load_metadata().await {
            return false;
        }
        if self.kind == ParametricKind::ObjetoContratacion {
            self.load_sub_descriptions().await;
        }
        self.reload().await
    }

    /// Best effort: a failed list leaves no options.
    async fn load_sub_descriptions(&mut self) {
        let path = ParametricKind::SubDescripcion.path();
        match self.backend.entities.list(path, None).await {
            Ok(records) => self.sub_descriptions = records,
            Err(e) => {
                tracing::warn!("Sub-descriptions unavailable: {}", e);
                self.sub_descriptions.clear();
            }
        }
        tracing::debug!("Loaded {} sub-descriptions", self.sub_descriptions.len());
    }

    /// Refresh this entity's metadata from the catalog.
    pub async fn load_metadata(&mut self) -> bool {
        let friendly = self.kind.config().friendly_name;
        match self.backend.parametricas.catalog().await {
            Ok(catalog) => {
                self.metadata = catalog.metadata(self.kind.catalog_key()).cloned();
                if self.metadata.is_none() {
                    self.notifier
                        .error(&format!("No metadata found for {}", friendly));
                }
                self.metadata.is_some()
            }
            Err(e) => {
                self.notifier.error(&format!("Error loading catalog: {}", e));
                false
            }
        }
    }

    /// Refetch the records.
    pub async fn reload(&mut self) -> bool {
        match self.backend.entities.list(self.kind.path(), None).await {
            Ok(records) => {
                self.records = records;
                true
            }
            Err(e) => {
                self.notifier.error(&format!(
                    "Error loading {}: {}",
                    self.kind.config().friendly_name,
                    e
                ));
                self.records.clear();
                false
            }
        }
    }

    fn allowed(&self, operation: Operation) -> bool {
        if self.kind.allows(operation) {
            return true;
        }
        self.notifier.warning(&format!(
            "Operation not allowed for {}",
            self.kind.config().friendly_name
        ));
        false
    }

    /// Descriptors generated from the loaded metadata, with this entity's
    /// screen rules applied.
    pub fn descriptors(&self) -> Option<Vec<FieldDescriptor>> {
        match &self.metadata {
            Some(metadata) => {
                let generated = self.generator.generate(self.kind.catalog_key(), Some(metadata));
                Some(self.apply_screen_rules(generated))
            }
            None => {
                self.notifier.warning("Metadata not available");
                None
            }
        }
    }

    fn apply_screen_rules(&self, mut descriptors: Vec<FieldDescriptor>) -> Vec<FieldDescriptor> {
        for descriptor in descriptors.iter_mut() {
            if let Some(constraints) = screen_constraints(self.kind, &descriptor.name) {
                descriptor.constraints = Some(constraints);
            }
            let name = descriptor.name.clone();
            match name.as_str() {
                "descripcion" => descriptor.required = false,
                "estado" if descriptor.value.is_none() => {
                    descriptor.value = Some("ACTIVO".into());
                }
                "anioVigencia"
                    if self.kind == ParametricKind::TipoProceso && descriptor.value.is_none() =>
                {
                    descriptor.value = Some(self.generator.reference_year().into());
                }
                "idSubDescripcionContratacion"
                    if self.kind == ParametricKind::ObjetoContratacion =>
                {
                    self.sub_description_select(descriptor);
                }
                _ => {}
            }
        }

        if self.kind == ParametricKind::ObjetoContratacion {
            descriptors.retain(|d| d.name != "permiteSubDescripcion");
        }
        descriptors
    }

    fn sub_description_select(&self, descriptor: &mut FieldDescriptor) {
        descriptor.kind = FieldKind::Select;
        descriptor.required = false;
        descriptor.help = "Associated sub-description (optional)".to_string();
        if self.sub_descriptions.is_empty() {
            descriptor.placeholder = "No sub-descriptions available".to_string();
            descriptor.options = Some(vec![SelectOption::new(
                FieldValue::Null,
                "No sub-description records",
            )]);
        } else {
            descriptor.placeholder = "Select sub-description...".to_string();
            descriptor.options = Some(
                self.sub_descriptions
                    .iter()
                    .filter_map(|sub| {
                        let id = sub.id?;
                        let label = format!(
                            "{} - {}",
                            sub.get_str("codigo").unwrap_or_default(),
                            sub.get_str("nombre").unwrap_or_default()
                        );
                        Some(SelectOption::new(id, label))
                    })
                    .collect(),
            );
        }
    }

    /// Fields the screen computes instead of asking for.
    fn derive_fields(&self, record: &mut EntityRecord) {
        if self.kind == ParametricKind::ObjetoContratacion {
            let linked = record
                .get("idSubDescripcionContratacion")
                .is_some_and(|v| !v.is_null());
            record.set("permiteSubDescripcion", linked);
        }
    }

    /// Table cell text for `column` of a record.
    pub fn cell(&self, record: &EntityRecord, column: &str) -> String {
        let value = match record.get(column) {
            Some(value) if !value.is_null() => value,
            _ => return "--".to_string(),
        };

        match column {
            "codigo" => value.to_string().to_uppercase(),
            "idSubDescripcionContratacion" => match value.as_i64() {
                Some(id) => self
                    .sub_descriptions
                    .iter()
                    .find(|sub| sub.id == Some(id))
                    .map(sub_description_label)
                    .unwrap_or_else(|| format!("ID: {}", id)),
                None => "--".to_string(),
            },
            "permiteSubDescripcion" => match value.as_bool() {
                Some(true) => "Yes".to_string(),
                _ => "No".to_string(),
            },
            "estado" => match value.as_str() {
                Some("ACTIVO") => "✅ Active".to_string(),
                Some("INACTIVO") => "❌ Inactive".to_string(),
                _ => value.to_string(),
            },
            _ => value.to_string(),
        }
    }

    /// Open the form with prepared descriptors. `editing` is the id of the
    /// record being edited, if any.
    pub fn open_form(
        &mut self,
        descriptors: Vec<FieldDescriptor>,
        editing: Option<i64>,
    ) -> Result<(), FormError> {
        let form = DynamicForm::new(descriptors)?.with_edit_mode(editing.is_some());
        self.form = Some(form);
        self.editing = editing;
        Ok(())
    }

    fn open_checked(&mut self, descriptors: Vec<FieldDescriptor>, editing: Option<i64>) -> bool {
        match self.open_form(descriptors, editing) {
            Ok(()) => true,
            Err(e) => {
                self.notifier.error(&e.to_string());
                false
            }
        }
    }

    pub fn open_create(&mut self) -> bool {
        if !self.allowed(Operation::Create) {
            return false;
        }
        match self.descriptors() {
            Some(descriptors) => self.open_checked(descriptors, None),
            None => false,
        }
    }

    pub fn open_edit(&mut self, id: i64) -> bool {
        if !self.allowed(Operation::Edit) {
            return false;
        }
        let Some(record) = self.record(id).cloned() else {
            self.notifier.error(&format!("Record {} not found", id));
            return false;
        };
        match self.descriptors() {
            Some(mut descriptors) => {
                prefill(&mut descriptors, &record);
                self.open_checked(descriptors, Some(id))
            }
            None => false,
        }
    }

    pub fn close_form(&mut self) {
        self.form = None;
        self.editing = None;
    }

    pub fn editing(&self) -> Option<i64> {
        self.editing
    }

    /// Validate the open form and flatten it into a payload.
    pub fn submit_form(&mut self) -> Option<EntityRecord> {
        let notifier = self.notifier.clone();
        let form = self.form.as_mut()?;
        form.submit_record(notifier.as_ref()).ok()
    }

    /// Create or update `record` depending on the form mode, then refetch.
    pub async fn persist(&mut self, record: EntityRecord) -> bool {
        let friendly = self.kind.config().friendly_name;
        let path = self.kind.path();
        let outcome: Result<EntityRecord, ApiError> = match self.editing {
            Some(id) => self.backend.entities.update(path, id, &record).await,
            None => self.backend.entities.create(path, &record).await,
        };
        let (done, doing) = if self.editing.is_some() {
            ("updated", "updating")
        } else {
            ("created", "creating")
        };

        match outcome {
            Ok(_) => {
                self.notifier
                    .success(&format!("{} {} successfully", friendly, done));
                self.close_form();
                self.reload().await;
                true
            }
            Err(e) => {
                self.notifier.error(&format!("Error {}: {}", doing, e));
                false
            }
        }
    }

    pub async fn save(&mut self) -> bool {
        match self.submit_form() {
            Some(mut record) => {
                self.derive_fields(&mut record);
                self.persist(record).await
            }
            None => false,
        }
    }

    pub async fn delete(&mut self, id: i64) -> bool {
        if !self.allowed(Operation::Delete) {
            return false;
        }
        let friendly = self.kind.config().friendly_name;
        if self.backend.entities.delete(self.kind.path(), id).await {
            self.notifier
                .success(&format!("{} deleted successfully", friendly));
            self.reload().await;
            true
        } else {
            self.notifier.error(&format!("Error deleting {}", friendly));
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefill_keeps_defaults_for_missing_fields() {
        let mut descriptors = vec![
            FieldDescriptor::new("monto", "Monto", crate::metadata::FieldKind::Number),
            FieldDescriptor::new("estado", "Estado", crate::metadata::FieldKind::Select)
                .with_value("ACTIVO"),
        ];
        let record = EntityRecord::new().with_field("monto", 5150.0);
        prefill(&mut descriptors, &record);

        assert_eq!(descriptors[0].value, Some(5150.0.into()));
        assert_eq!(descriptors[1].value, Some("ACTIVO".into()));
    }

    #[test]
    fn test_screen_constraints_per_entity() {
        let codigo = screen_constraints(ParametricKind::ObjetoContratacion, "codigo").unwrap();
        assert_eq!((codigo.min_length, codigo.max_length), (Some(1), Some(20)));
        assert_eq!(codigo.pattern.as_deref(), Some("^[A-Z0-9]+$"));

        let nombre = screen_constraints(ParametricKind::ObjetoContratacion, "nombre").unwrap();
        assert_eq!((nombre.min_length, nombre.max_length), (Some(3), Some(50)));

        let simbolo = screen_constraints(ParametricKind::OperadoresMonto, "simbolo").unwrap();
        let pattern = regex::Regex::new(simbolo.pattern.as_deref().unwrap()).unwrap();
        assert!(pattern.is_match(">="));
        assert!(pattern.is_match("≤"));
        assert!(!pattern.is_match("abc"));

        assert!(screen_constraints(ParametricKind::Uit, "codigo").is_none());
    }
}
