use chrono::Datelike;
use std::sync::Arc;

use crate::client::Backend;
use crate::entity::{EntityRecord, FieldValue};
use crate::forms::FieldDescriptor;
use crate::notify::Notifier;
use crate::parametricas::ParametricKind;
use crate::screens::entities::{prefill, EntityScreen};
use crate::topes::{apply_overrides, apply_uit_reference, column_title, format_cell, RelatedLists, UitTable};

/// Caps manager: the generic manager plus relation lists, UIT recompute
/// and cap-specific formatting.
pub struct TopesScreen {
    inner: EntityScreen,
    related: RelatedLists,
    current_year: i64,
}

impl TopesScreen {
    pub fn new(backend: Backend, notifier: Arc<dyn Notifier>) -> Self {
        let current_year = chrono::Local::now().year() as i64;
        Self::with_year(backend, notifier, current_year)
    }

    /// Screen pinned to `current_year`, used for the suggested UIT reference.
    pub fn with_year(backend: Backend, notifier: Arc<dyn Notifier>, current_year: i64) -> Self {
        Self {
            inner: EntityScreen::new(ParametricKind::Topes, backend, notifier),
            related: RelatedLists::default(),
            current_year,
        }
    }

    pub fn entity(&self) -> &EntityScreen {
        &self.inner
    }

    pub fn entity_mut(&mut self) -> &mut EntityScreen {
        &mut self.inner
    }

    pub fn related(&self) -> &RelatedLists {
        &self.related
    }

    pub fn records(&self) -> &[EntityRecord] {
        self.inner.records()
    }

    /// Metadata, the related lists, then the caps themselves.
    pub async fn load(&mut self) -> bool {
        if !self.inner.load_metadata().await {
            return false;
        }
        self.load_related().await;
        self.inner.reload().await
    }

    /// Related lists are best effort: a failed list stays empty.
    async fn load_related(&mut self) {
        let entities = self.inner.backend().entities.clone();
        let (tipos, objetos, operadores, uits) = tokio::join!(
            entities.list(ParametricKind::TipoProceso.path(), None),
            entities.list(ParametricKind::ObjetoContratacion.path(), None),
            entities.list(ParametricKind::OperadoresMonto.path(), None),
            entities.list(ParametricKind::Uit.path(), None),
        );

        self.related = RelatedLists {
            tipos_proceso: tipos.unwrap_or_default(),
            objetos_contratacion: objetos.unwrap_or_default(),
            operadores_monto: operadores.unwrap_or_default(),
            uits: UitTable::from_records(&uits.unwrap_or_default()),
        };
        tracing::debug!(
            "Caps relations: {} process types, {} objects, {} operators, {} UITs",
            self.related.tipos_proceso.len(),
            self.related.objetos_contratacion.len(),
            self.related.operadores_monto.len(),
            self.related.uits.len()
        );
    }

    fn descriptors(&self) -> Option<Vec<FieldDescriptor>> {
        self.inner
            .descriptors()
            .map(|d| apply_overrides(d, &self.related, self.current_year))
    }

    pub fn open_create(&mut self) -> bool {
        let Some(descriptors) = self.descriptors() else {
            return false;
        };
        self.open(descriptors, None)
    }

    pub fn open_edit(&mut self, id: i64) -> bool {
        let Some(record) = self.inner.record(id).cloned() else {
            self.inner
                .notifier()
                .error(&format!("Record {} not found", id));
            return false;
        };
        let Some(mut descriptors) = self.descriptors() else {
            return false;
        };
        prefill(&mut descriptors, &record);
        self.open(descriptors, Some(id))
    }

    fn open(&mut self, descriptors: Vec<FieldDescriptor>, editing: Option<i64>) -> bool {
        match self.inner.open_form(descriptors, editing) {
            Ok(()) => true,
            Err(e) => {
                self.inner.notifier().error(&e.to_string());
                false
            }
        }
    }

    /// Validate, point the cap at its year's UIT, then persist. A year with
    /// no UIT aborts the save.
    pub async fn save(&mut self) -> bool {
        let Some(mut record) = self.inner.submit_form() else {
            return false;
        };
        if let Err(e) = apply_uit_reference(&mut record, &self.related.uits) {
            self.inner.notifier().error(&e.to_string());
            return false;
        }
        self.inner.persist(record).await
    }

    pub async fn delete(&mut self, id: i64) -> bool {
        self.inner.delete(id).await
    }

    pub fn columns(&self) -> Vec<&str> {
        self.inner.columns()
    }

    pub fn column_title<'a>(&'a self, column: &'a str) -> &'a str {
        column_title(column, self.inner.metadata().map(|m| &m.field_descriptions))
    }

    pub fn cell(&self, record: &EntityRecord, column: &str) -> String {
        let value = record.get(column).cloned().unwrap_or(FieldValue::Null);
        format_cell(column, &value, &self.related)
    }
}
