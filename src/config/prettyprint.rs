//! Configuration pretty-printing
// (c) 2026 fxp authors

use super::Manager;

use figment::{value::Value, Metadata};
use serde::Deserialize;
use std::fmt::{Debug, Display};
use struct_field_names_as_array::FieldNamesAsSlice;
use tabled::{settings::Style, Table, Tabled};

/// Data type used when rendering the config table
#[derive(Tabled)]
struct PrettyConfig {
    field: String,
    value: String,
    source: String,
}

impl PrettyConfig {
    fn render_source(meta: Option<&Metadata>) -> String {
        meta.map_or_else(String::new, |m| {
            m.source
                .as_ref()
                .map_or_else(|| m.name.to_string(), figment::Source::to_string)
        })
    }

    fn render_value(value: &Value) -> String {
        match value {
            Value::String(_tag, s) => s.to_string(),
            Value::Char(_tag, c) => c.to_string(),
            Value::Bool(_tag, b) => b.to_string(),
            Value::Num(_tag, num) => num
                .to_i128()
                .map(|i| i.to_string())
                .or_else(|| num.to_u128().map(|u| u.to_string()))
                .or_else(|| num.to_f64().map(|f| f.to_string()))
                .unwrap_or_default(),
            Value::Empty(_tag, _) => "<empty>".into(),
            Value::Dict(_tag, dict) => format!("{dict:?}"),
            Value::Array(_tag, vec) => {
                format!(
                    "[{}]",
                    vec.iter()
                        .map(PrettyConfig::render_value)
                        .collect::<Vec<_>>()
                        .join(",")
                )
            }
        }
    }

    fn new<F: Into<String>>(field: F, value: &Value, meta: Option<&Metadata>) -> Self {
        Self {
            field: field.into(),
            value: PrettyConfig::render_value(value),
            source: PrettyConfig::render_source(meta),
        }
    }
}

/// Pretty-printing type wrapper to Manager
#[derive(Debug)]
pub struct DisplayAdapter<'a> {
    /// Data source
    source: &'a Manager,
    /// The fields we want to output, in order
    fields: &'static [&'static str],
}

impl Manager {
    /// Creates a `DisplayAdapter` showing the fields of `T`.
    ///
    /// # Returns
    /// An ephemeral structure implementing `Display`.
    #[must_use]
    pub fn to_display_adapter<'de, T>(&self) -> DisplayAdapter<'_>
    where
        T: Deserialize<'de> + FieldNamesAsSlice,
    {
        DisplayAdapter {
            source: self,
            fields: T::FIELD_NAMES_AS_SLICE,
        }
    }
}

impl Display for DisplayAdapter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = &self.source.data;

        let output = self
            .fields
            .iter()
            .filter_map(|field| {
                data.find_value(field).ok().map(|value| {
                    let meta = data.get_metadata(value.tag());
                    PrettyConfig::new(*field, &value, meta)
                })
            })
            .collect::<Vec<_>>();
        let mut writable = Table::new(output);
        let _ = writable.with(Style::sharp());
        write!(f, "{writable}")
    }
}
