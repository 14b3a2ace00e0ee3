//! Metadata -> ordered, sectioned field descriptors.

use chrono::Datelike;

use crate::forms::policy::NamingPolicy;
use crate::forms::FieldDescriptor;
use crate::metadata::{ParametricaMetadata, SelectOption, ValidationConstraints};

/// Builds [`FieldDescriptor`]s from catalog metadata.
///
/// Generation is a pure function of the metadata, the entity name, the naming
/// policy and the reference year (used for year placeholders).
#[derive(Debug, Clone)]
pub struct FieldGenerator {
    policy: NamingPolicy,
    reference_year: i32,
}

impl Default for FieldGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldGenerator {
    /// Generator with the default policy, using the current year.
    pub fn new() -> Self {
        Self::with_reference_year(chrono::Local::now().year())
    }

    pub fn with_reference_year(reference_year: i32) -> Self {
        Self {
            policy: NamingPolicy::default(),
            reference_year,
        }
    }

    pub fn with_policy(mut self, policy: NamingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Year used for year placeholders and defaults.
    pub fn reference_year(&self) -> i32 {
        self.reference_year
    }

    pub fn policy(&self) -> &NamingPolicy {
        &self.policy
    }

    /// Generate the descriptors for `entity`.
    ///
    /// The identifier field is skipped. Output is grouped by section. The
    /// entity's default section ([`NamingPolicy::default_section`]) is pinned
    /// first and the others follow in lexicographic order; inside a section
    /// the metadata field order is kept. For entities without a dedicated
    /// section the default is "General Information", so that section leads.
    /// Entities with a dedicated section ("UIT Information" for `uit`) lead
    /// with it instead of the general one. Absent metadata yields an empty
    /// list.
    pub fn generate(
        &self,
        entity: &str,
        metadata: Option<&ParametricaMetadata>,
    ) -> Vec<FieldDescriptor> {
        let Some(metadata) = metadata else {
            tracing::debug!("No metadata for '{}', nothing to render", entity);
            return Vec::new();
        };

        let mut fields: Vec<FieldDescriptor> = metadata
            .fields
            .iter()
            .enumerate()
            .filter(|(_, name)| name.as_str() != "id")
            .map(|(index, name)| self.describe(entity, metadata, name, index))
            .collect();

        let default_section = self.policy.default_section(entity);
        fields.sort_by(|a, b| {
            let a_key = (a.section != default_section, &a.section, a.order);
            let b_key = (b.section != default_section, &b.section, b.order);
            a_key.cmp(&b_key)
        });

        tracing::debug!("Generated {} fields for '{}'", fields.len(), entity);
        fields
    }

    fn describe(
        &self,
        entity: &str,
        metadata: &ParametricaMetadata,
        name: &str,
        index: usize,
    ) -> FieldDescriptor {
        let kind = metadata.field_kind(name);
        let label = metadata
            .field_descriptions
            .get(name)
            .filter(|d| !d.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| self.policy.humanize(name));

        let section = metadata
            .sections
            .iter()
            .find(|(_, members)| members.iter().any(|m| m == name))
            .map(|(section, _)| section.clone())
            .unwrap_or_else(|| self.policy.section(name, entity));

        let constraints = metadata
            .field_validations
            .get(name)
            .cloned()
            .or_else(|| preset_constraints(entity, name))
            .map(|c| c.restricted_to(kind))
            .filter(|c| !c.is_empty());

        let options = metadata
            .field_options
            .get(name)
            .cloned()
            .or_else(|| default_options(name));

        FieldDescriptor {
            name: name.to_string(),
            label,
            kind,
            required: metadata.is_required(name),
            read_only: metadata.is_read_only(name),
            width: self.policy.width(name, kind),
            section,
            order: index,
            placeholder: self.policy.placeholder(name, kind, self.reference_year),
            help: self.policy.help(name, entity),
            icon: self.policy.icon(name, kind),
            prefix: None,
            suffix: None,
            options,
            constraints,
            value: None,
        }
    }
}

/// Generate descriptors with the default generator.
pub fn generate(entity: &str, metadata: Option<&ParametricaMetadata>) -> Vec<FieldDescriptor> {
    FieldGenerator::new().generate(entity, metadata)
}

/// Built-in constraints for well-known entity fields, used when the server
/// sends none.
pub fn preset_constraints(entity: &str, field: &str) -> Option<ValidationConstraints> {
    let entity = entity.replace('-', "_");
    let year = || ValidationConstraints {
        min: Some(2020.0),
        max: Some(2030.0),
        ..Default::default()
    };

    match (entity.as_str(), field) {
        ("uit", "monto") => Some(ValidationConstraints {
            min: Some(1.0),
            max: Some(10000.0),
            step: Some(0.01),
            ..Default::default()
        }),
        ("uit", "anio_vigencia" | "anioVigencia") => Some(year()),
        ("tipo_proceso" | "tipo_proceso_seleccion", "codigo") => Some(ValidationConstraints {
            min_length: Some(2),
            max_length: Some(10),
            pattern: Some("^[A-Z0-9]+$".to_string()),
            pattern_message: Some("Only upper-case letters and digits".to_string()),
            ..Default::default()
        }),
        ("tipo_proceso" | "tipo_proceso_seleccion", "anio_vigencia" | "anioVigencia") => {
            Some(year())
        }
        ("objeto_contratacion", "nombre") => Some(ValidationConstraints {
            min_length: Some(5),
            max_length: Some(100),
            ..Default::default()
        }),
        _ => None,
    }
}

/// Options every entity shares for well-known select fields.
pub fn default_options(field: &str) -> Option<Vec<SelectOption>> {
    match field {
        "estado" => Some(vec![
            SelectOption::new("ACTIVO", "Active"),
            SelectOption::new("INACTIVO", "Inactive"),
            SelectOption::new("PENDIENTE", "Pending"),
            SelectOption::new("ARCHIVADO", "Archived"),
        ]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::policy::{
        CONFIGURATION_SECTION, DATES_SECTION, GENERAL_SECTION, MONETARY_SECTION,
    };
    use crate::metadata::FieldKind;
    use std::collections::HashSet;

    fn uit_metadata() -> ParametricaMetadata {
        let mut metadata =
            ParametricaMetadata::with_fields(["id", "monto", "anioVigencia", "estado", "observaciones"]);
        metadata.field_types.insert("monto".to_string(), FieldKind::Currency);
        metadata.field_types.insert("anioVigencia".to_string(), FieldKind::Number);
        metadata.field_types.insert("observaciones".to_string(), FieldKind::Textarea);
        metadata.required_fields = vec!["monto".to_string(), "anioVigencia".to_string()];
        metadata
    }

    #[test]
    fn test_absent_metadata_yields_nothing() {
        assert!(FieldGenerator::with_reference_year(2025).generate("uit", None).is_empty());
    }

    #[test]
    fn test_excludes_id_and_keeps_every_other_field_once() {
        let metadata = uit_metadata();
        let fields = FieldGenerator::with_reference_year(2025).generate("uit", Some(&metadata));

        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert!(!names.contains(&"id"));
        assert_eq!(names.len(), 4);
        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(unique.len(), 4);
    }

    #[test]
    fn test_default_section_first_then_lexicographic() {
        let metadata = uit_metadata();
        let fields = FieldGenerator::with_reference_year(2025).generate("uit", Some(&metadata));

        let sections: Vec<&str> = fields.iter().map(|f| f.section.as_str()).collect();
        assert_eq!(
            sections,
            vec!["UIT Information", CONFIGURATION_SECTION, DATES_SECTION, MONETARY_SECTION]
        );
    }

    #[test]
    fn test_general_section_leads_without_dedicated_section() {
        let metadata = ParametricaMetadata::with_fields(["estado", "simbolo", "nombre"]);
        let fields =
            FieldGenerator::with_reference_year(2025).generate("operadores-monto", Some(&metadata));

        let sections: Vec<&str> = fields.iter().map(|f| f.section.as_str()).collect();
        assert_eq!(sections, vec![GENERAL_SECTION, GENERAL_SECTION, CONFIGURATION_SECTION]);
    }

    #[test]
    fn test_order_preserved_within_section() {
        let metadata = ParametricaMetadata::with_fields(["simbolo", "id", "nombre", "codigo"]);
        let fields =
            FieldGenerator::with_reference_year(2025).generate("operadores-monto", Some(&metadata));

        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["simbolo", "nombre", "codigo"]);
        assert!(fields.windows(2).all(|w| w[0].order < w[1].order));
    }

    #[test]
    fn test_decorations() {
        let metadata = uit_metadata();
        let fields = FieldGenerator::with_reference_year(2025).generate("uit", Some(&metadata));
        let monto = fields.iter().find(|f| f.name == "monto").unwrap();

        assert_eq!(monto.label, "Monto");
        assert!(monto.required);
        assert_eq!(monto.placeholder, "0.00");
        assert_eq!(monto.icon, "monetization_on");
        assert_eq!(monto.help, "UIT amount in soles for the validity year");

        let constraints = monto.constraints.as_ref().unwrap();
        assert_eq!(constraints.min, Some(1.0));
        assert_eq!(constraints.max, Some(10000.0));

        let year = fields.iter().find(|f| f.name == "anioVigencia").unwrap();
        assert_eq!(year.placeholder, "2025");

        let estado = fields.iter().find(|f| f.name == "estado").unwrap();
        assert_eq!(estado.options.as_ref().map(Vec::len), Some(4));
    }

    #[test]
    fn test_supplied_description_wins_over_humanized_name() {
        let mut metadata = ParametricaMetadata::with_fields(["simbolo"]);
        metadata
            .field_descriptions
            .insert("simbolo".to_string(), "Operator symbol".to_string());

        let fields = generate("operadores-monto", Some(&metadata));
        assert_eq!(fields[0].label, "Operator symbol");
    }

    #[test]
    fn test_server_constraints_are_trimmed_to_kind() {
        let mut metadata = ParametricaMetadata::with_fields(["nombre"]);
        metadata.field_validations.insert(
            "nombre".to_string(),
            ValidationConstraints {
                min: Some(3.0),
                max_length: Some(40),
                ..Default::default()
            },
        );

        let fields = generate("objeto-contratacion", Some(&metadata));
        let constraints = fields[0].constraints.as_ref().unwrap();
        assert!(constraints.min.is_none());
        assert_eq!(constraints.max_length, Some(40));
    }
}
