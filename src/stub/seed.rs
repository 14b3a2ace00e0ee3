//! Reference data the stub starts with, and the metadata it publishes.

use std::collections::HashMap;

use crate::entity::EntityRecord;
use crate::metadata::{FieldKind, ParametricaMetadata};
use crate::parametricas::ParametricKind;

/// (field, kind, label) per entity, in form order.
fn fields(kind: ParametricKind) -> &'static [(&'static str, FieldKind, &'static str)] {
    match kind {
        ParametricKind::Uit => &[
            ("monto", FieldKind::Number, "Amount"),
            ("anioVigencia", FieldKind::Number, "Validity Year"),
            ("estado", FieldKind::Select, "Status"),
            ("observaciones", FieldKind::Textarea, "Notes"),
        ],
        ParametricKind::TipoProceso => &[
            ("codigo", FieldKind::Text, "Code"),
            ("nombre", FieldKind::Text, "Name"),
            ("descripcion", FieldKind::Textarea, "Description"),
            ("anioVigencia", FieldKind::Number, "Validity Year"),
            ("estado", FieldKind::Select, "Status"),
            ("observaciones", FieldKind::Textarea, "Notes"),
        ],
        ParametricKind::ObjetoContratacion => &[
            ("codigo", FieldKind::Text, "Code"),
            ("nombre", FieldKind::Text, "Name"),
            ("descripcion", FieldKind::Textarea, "Description"),
            ("idSubDescripcionContratacion", FieldKind::Number, "Sub-description"),
            ("permiteSubDescripcion", FieldKind::Boolean, "Allows Sub-descriptions"),
            ("estado", FieldKind::Select, "Status"),
        ],
        ParametricKind::OperadoresMonto => &[
            ("codigo", FieldKind::Text, "Code"),
            ("nombre", FieldKind::Text, "Name"),
            ("simbolo", FieldKind::Text, "Symbol"),
            ("descripcion", FieldKind::Textarea, "Description"),
            ("estado", FieldKind::Select, "Status"),
        ],
        ParametricKind::SubDescripcion => &[
            ("codigo", FieldKind::Text, "Code"),
            ("nombre", FieldKind::Text, "Name"),
            ("descripcion", FieldKind::Textarea, "Description"),
            ("estado", FieldKind::Select, "Status"),
        ],
        ParametricKind::Topes => &[
            ("idTipoProcesoSeleccion", FieldKind::Number, "Process Type"),
            ("idObjetoContratacion", FieldKind::Number, "Contracting Object"),
            ("idSubDescripcionContratacion", FieldKind::Number, "Sub-description"),
            ("idOperadorMonto", FieldKind::Number, "Operator"),
            ("monto", FieldKind::Number, "Amount"),
            ("referenciaUit", FieldKind::Number, "UIT Reference"),
            ("idUit", FieldKind::Number, "UIT"),
            ("observaciones", FieldKind::Textarea, "Notes"),
            ("anioVigencia", FieldKind::Number, "Validity Year"),
            ("estado", FieldKind::Select, "Status"),
        ],
    }
}

fn class_name(kind: ParametricKind) -> &'static str {
    match kind {
        ParametricKind::Uit => "Uit",
        ParametricKind::TipoProceso => "TipoProcesoSeleccion",
        ParametricKind::ObjetoContratacion => "ObjetoContratacion",
        ParametricKind::OperadoresMonto => "OperadoresMonto",
        ParametricKind::SubDescripcion => "SubDescripcionContratacion",
        ParametricKind::Topes => "Topes",
    }
}

/// Static part of an entity's catalog entry; counts are filled in by the store.
pub fn metadata(kind: ParametricKind) -> ParametricaMetadata {
    let config = kind.config();
    let specs = fields(kind);

    let mut metadata = ParametricaMetadata::with_fields(specs.iter().map(|(name, _, _)| *name));
    metadata.table_name = kind.catalog_key().to_string();
    metadata.class_name = class_name(kind).to_string();
    metadata.description = config.description.to_string();
    metadata.field_types = specs.iter().map(|(name, k, _)| (name.to_string(), *k)).collect();
    metadata.field_descriptions = specs
        .iter()
        .map(|(name, _, label)| (name.to_string(), label.to_string()))
        .collect();
    metadata.required_fields = config.required_fields.iter().map(|f| f.to_string()).collect();

    let has = |field: &str| specs.iter().any(|(name, _, _)| *name == field);
    metadata.metadata_adicional = HashMap::from([
        ("hasAnioVigencia".to_string(), has("anioVigencia").into()),
        ("hasEstado".to_string(), has("estado").into()),
        ("auditEnabled".to_string(), true.into()),
    ]);
    metadata
}

fn record(fields: &[(&str, serde_json::Value)]) -> EntityRecord {
    let mut record = EntityRecord::new();
    for (name, value) in fields {
        record.set(*name, value.clone());
    }
    record.set("estado", "ACTIVO");
    record
}

/// Seed rows per entity, without ids.
pub fn rows(kind: ParametricKind) -> Vec<EntityRecord> {
    use serde_json::json;

    match kind {
        ParametricKind::Uit => [(2023, 4950.0), (2024, 5150.0), (2025, 5350.0)]
            .into_iter()
            .map(|(year, monto)| record(&[("monto", json!(monto)), ("anioVigencia", json!(year))]))
            .collect(),
        ParametricKind::TipoProceso => [
            ("LP", "Licitacion Publica"),
            ("CP", "Concurso Publico"),
            ("AS", "Adjudicacion Simplificada"),
        ]
        .into_iter()
        .map(|(codigo, nombre)| {
            record(&[
                ("codigo", json!(codigo)),
                ("nombre", json!(nombre)),
                ("anioVigencia", json!(2025)),
            ])
        })
        .collect(),
        // Sub-description links are resolved by the store once ids exist.
        ParametricKind::ObjetoContratacion => [("BI", "Bienes"), ("SE", "Servicios"), ("OB", "Obras")]
            .into_iter()
            .map(|(codigo, nombre)| {
                record(&[
                    ("codigo", json!(codigo)),
                    ("nombre", json!(nombre)),
                    ("idSubDescripcionContratacion", json!(null)),
                    ("permiteSubDescripcion", json!(false)),
                ])
            })
            .collect(),
        ParametricKind::OperadoresMonto => [
            ("MAYOR_IGUAL", "Greater or equal", ">="),
            ("MENOR_IGUAL", "Less or equal", "<="),
            ("MAYOR", "Greater", ">"),
            ("MENOR", "Less", "<"),
        ]
        .into_iter()
        .map(|(codigo, nombre, simbolo)| {
            record(&[
                ("codigo", json!(codigo)),
                ("nombre", json!(nombre)),
                ("simbolo", json!(simbolo)),
            ])
        })
        .collect(),
        ParametricKind::SubDescripcion => [
            ("SG", "Servicios en general"),
            ("CO", "Consultoria en general"),
        ]
        .into_iter()
        .map(|(codigo, nombre)| record(&[("codigo", json!(codigo)), ("nombre", json!(nombre))]))
        .collect(),
        // Caps reference other rows by id and are built by the store.
        ParametricKind::Topes => Vec::new(),
    }
}

/// Contracting objects linked to a sub-description, as (object code,
/// sub-description code).
pub const OBJECT_SUB_DESCRIPTIONS: &[(&str, &str)] = &[("SE", "SG")];

/// Seed caps for 2025 as (process code, object code, operator code, amount).
pub const CAPS_2025: &[(&str, &str, &str, f64)] = &[
    ("LP", "BI", "MAYOR_IGUAL", 400_000.0),
    ("AS", "BI", "MENOR", 400_000.0),
    ("CP", "SE", "MAYOR_IGUAL", 400_000.0),
    ("AS", "SE", "MENOR", 400_000.0),
];
