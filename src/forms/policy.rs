//! Naming heuristics for generated fields.
//!
//! Section, width, icon, placeholder and help text are inferred from substrings
//! of the field name. All of those tables live in one [`NamingPolicy`] value so
//! a rename on the server side means editing one table, not several functions.

use convert_case::{Case, Casing};

use crate::metadata::FieldKind;
use crate::forms::FieldWidth;

pub const GENERAL_SECTION: &str = "General Information";
pub const CONFIGURATION_SECTION: &str = "Configuration";
pub const DATES_SECTION: &str = "Dates";
pub const MONETARY_SECTION: &str = "Monetary Values";

/// Substring rule: any keyword contained in the lower-cased field name matches.
#[derive(Debug, Clone)]
pub struct KeywordRule<T> {
    pub keywords: Vec<&'static str>,
    pub outcome: T,
}

impl<T> KeywordRule<T> {
    pub fn new(keywords: &[&'static str], outcome: T) -> Self {
        Self {
            keywords: keywords.to_vec(),
            outcome,
        }
    }

    fn matches(&self, lower_name: &str) -> bool {
        self.keywords.iter().any(|k| lower_name.contains(k))
    }
}

/// Lookup tables driving the field generator's decorations.
#[derive(Debug, Clone)]
pub struct NamingPolicy {
    /// Evaluated in order; the first matching rule wins.
    pub section_rules: Vec<KeywordRule<&'static str>>,
    /// Entity name prefix (normalized to snake case) -> default section.
    pub entity_sections: Vec<(&'static str, &'static str)>,
    pub fallback_section: &'static str,
    pub full_width: Vec<&'static str>,
    pub quarter_width: Vec<&'static str>,
    /// Keyword -> icon, in priority order.
    pub icons: Vec<(&'static str, &'static str)>,
    /// Exact field name -> help text.
    pub help: Vec<(&'static str, &'static str)>,
    /// (entity, field) -> help text, checked before `help`.
    pub entity_help: Vec<(&'static str, &'static str, &'static str)>,
    pub amount_keywords: Vec<&'static str>,
    pub year_keywords: Vec<&'static str>,
}

impl Default for NamingPolicy {
    fn default() -> Self {
        Self {
            section_rules: vec![
                KeywordRule::new(&["activo", "vigente", "orden", "estado"], CONFIGURATION_SECTION),
                KeywordRule::new(&["fecha", "vigencia", "inicio", "fin"], DATES_SECTION),
                KeywordRule::new(&["monto", "valor", "precio", "costo"], MONETARY_SECTION),
            ],
            entity_sections: vec![
                ("uit", "UIT Information"),
                ("tipo_proceso", "Process Information"),
                ("objeto_contratacion", "Object Information"),
            ],
            fallback_section: GENERAL_SECTION,
            full_width: vec!["descripcion", "observaciones", "comentarios", "notas"],
            quarter_width: vec!["codigo", "sigla", "anio", "orden"],
            icons: vec![
                ("codigo", "tag"),
                ("nombre", "title"),
                ("descripcion", "description"),
                ("anio", "calendar_today"),
                ("fecha", "event"),
                ("monto", "monetization_on"),
                ("valor", "paid"),
                ("orden", "sort"),
                ("estado", "info"),
                ("activo", "toggle_on"),
            ],
            help: vec![
                ("codigo", "Unique identifying code"),
                ("nombre", "Descriptive name of the item"),
                ("descripcion", "Detailed description (optional)"),
                ("anio_vigencia", "Year this configuration is valid for"),
                ("anioVigencia", "Year this configuration is valid for"),
                ("monto", "Amount in Peruvian soles (S/)"),
                ("fechaInicio", "Start of validity"),
                ("fechaFin", "End of validity (optional)"),
                ("activo", "Check if currently active"),
                ("orden", "Display order in lists"),
            ],
            entity_help: vec![("uit", "monto", "UIT amount in soles for the validity year")],
            amount_keywords: vec!["monto"],
            year_keywords: vec!["anio"],
        }
    }
}

/// Entity names arrive as `tipo-proceso`, `tipo_proceso` or `TipoProceso`.
fn normalize_entity(entity: &str) -> String {
    entity.replace('-', "_").to_case(Case::Snake)
}

impl NamingPolicy {
    /// `anioVigencia` -> `Anio Vigencia`, `fecha_fin` -> `Fecha Fin`.
    pub fn humanize(&self, field: &str) -> String {
        field.to_case(Case::Title)
    }

    /// Section a field of `entity` falls into when nothing else applies.
    pub fn default_section(&self, entity: &str) -> &'static str {
        let entity = normalize_entity(entity);
        self.entity_sections
            .iter()
            .find(|(prefix, _)| entity.starts_with(prefix))
            .map(|(_, section)| *section)
            .unwrap_or(self.fallback_section)
    }

    pub fn section(&self, field: &str, entity: &str) -> String {
        let lower = field.to_lowercase();
        self.section_rules
            .iter()
            .find(|rule| rule.matches(&lower))
            .map(|rule| rule.outcome)
            .unwrap_or_else(|| self.default_section(entity))
            .to_string()
    }

    pub fn width(&self, field: &str, kind: FieldKind) -> FieldWidth {
        let lower = field.to_lowercase();
        if self.full_width.iter().any(|k| lower.contains(k)) || kind == FieldKind::Textarea {
            return FieldWidth::Full;
        }
        if self.quarter_width.iter().any(|k| lower.contains(k)) {
            return FieldWidth::Quarter;
        }
        FieldWidth::Half
    }

    pub fn placeholder(&self, field: &str, kind: FieldKind, reference_year: i32) -> String {
        let lower = field.to_lowercase();
        match kind {
            FieldKind::Email => "example@mail.com".to_string(),
            FieldKind::Number | FieldKind::Currency => {
                if self.amount_keywords.iter().any(|k| lower.contains(k)) {
                    "0.00".to_string()
                } else if self.year_keywords.iter().any(|k| lower.contains(k)) {
                    reference_year.to_string()
                } else {
                    "Enter a number".to_string()
                }
            }
            FieldKind::Date | FieldKind::Year => "dd/mm/yyyy".to_string(),
            FieldKind::Select => "Select an option".to_string(),
            FieldKind::Textarea => "Enter a detailed description...".to_string(),
            _ => format!("Enter {}", self.humanize(field).to_lowercase()),
        }
    }

    pub fn icon(&self, field: &str, kind: FieldKind) -> String {
        let lower = field.to_lowercase();
        match kind {
            FieldKind::Email => return "email".to_string(),
            FieldKind::Date | FieldKind::Year => return "calendar_today".to_string(),
            FieldKind::Number | FieldKind::Currency => {
                let icon = if self.amount_keywords.iter().any(|k| lower.contains(k)) {
                    "monetization_on"
                } else {
                    "numbers"
                };
                return icon.to_string();
            }
            FieldKind::Boolean => return "check_box".to_string(),
            _ => {}
        }

        self.icons
            .iter()
            .find(|(keyword, _)| lower.contains(keyword))
            .map(|(_, icon)| icon.to_string())
            .unwrap_or_else(|| "edit".to_string())
    }

    pub fn help(&self, field: &str, entity: &str) -> String {
        let entity = normalize_entity(entity);
        if let Some((_, _, text)) = self
            .entity_help
            .iter()
            .find(|(e, f, _)| *e == entity && *f == field)
        {
            return text.to_string();
        }
        self.help
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, text)| text.to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humanize() {
        let policy = NamingPolicy::default();
        assert_eq!(policy.humanize("anioVigencia"), "Anio Vigencia");
        assert_eq!(policy.humanize("totalPurchases"), "Total Purchases");
        assert_eq!(policy.humanize("fecha_fin"), "Fecha Fin");
    }

    #[test]
    fn test_sections() {
        let policy = NamingPolicy::default();
        assert_eq!(policy.section("estado", "uit"), CONFIGURATION_SECTION);
        assert_eq!(policy.section("fechaInicio", "uit"), DATES_SECTION);
        assert_eq!(policy.section("anioVigencia", "topes"), DATES_SECTION);
        assert_eq!(policy.section("monto", "topes"), MONETARY_SECTION);
        assert_eq!(policy.section("observaciones", "uit"), "UIT Information");
        assert_eq!(policy.section("codigo", "tipo-proceso"), "Process Information");
        assert_eq!(policy.section("codigo", "objeto_contratacion"), "Object Information");
        assert_eq!(policy.section("simbolo", "operadores-monto"), GENERAL_SECTION);
    }

    #[test]
    fn test_widths() {
        let policy = NamingPolicy::default();
        assert_eq!(policy.width("descripcion", FieldKind::Text), FieldWidth::Full);
        assert_eq!(policy.width("notes", FieldKind::Textarea), FieldWidth::Full);
        assert_eq!(policy.width("codigo", FieldKind::Text), FieldWidth::Quarter);
        assert_eq!(policy.width("anioVigencia", FieldKind::Number), FieldWidth::Quarter);
        assert_eq!(policy.width("nombre", FieldKind::Text), FieldWidth::Half);
    }

    #[test]
    fn test_placeholders() {
        let policy = NamingPolicy::default();
        assert_eq!(policy.placeholder("monto", FieldKind::Currency, 2025), "0.00");
        assert_eq!(policy.placeholder("anioVigencia", FieldKind::Number, 2025), "2025");
        assert_eq!(policy.placeholder("cantidad", FieldKind::Number, 2025), "Enter a number");
        assert_eq!(policy.placeholder("nombre", FieldKind::Text, 2025), "Enter nombre");
        assert_eq!(policy.placeholder("estado", FieldKind::Select, 2025), "Select an option");
    }

    #[test]
    fn test_icons() {
        let policy = NamingPolicy::default();
        assert_eq!(policy.icon("monto", FieldKind::Number), "monetization_on");
        assert_eq!(policy.icon("cantidad", FieldKind::Number), "numbers");
        assert_eq!(policy.icon("codigo", FieldKind::Text), "tag");
        assert_eq!(policy.icon("activo", FieldKind::Boolean), "check_box");
        assert_eq!(policy.icon("simbolo", FieldKind::Text), "edit");
    }

    #[test]
    fn test_help_entity_override() {
        let policy = NamingPolicy::default();
        assert_eq!(policy.help("monto", "uit"), "UIT amount in soles for the validity year");
        assert_eq!(policy.help("monto", "topes"), "Amount in Peruvian soles (S/)");
        assert_eq!(policy.help("simbolo", "topes"), "");
    }
}
