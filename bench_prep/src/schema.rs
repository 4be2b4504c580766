//! Dataset schemas
//!
//! A [`Schema`] tells the later stages which column identifies a series,
//! which one is time, which one is the forecast target and which ones are
//! covariates. It is derived from the feature-role table by
//! [`SchemaBuilder`] and persisted as a JSON document next to the data.

use crate::config::{DatasetMetadata, FeatureRole};
use crate::error::{PrepError, Result};
use crate::table::Table;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Version written into every schema document
pub const SCHEMA_VERSION: f64 = 1.0;

/// Role a field plays in a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Id,
    Time,
    Target,
    PastCovariate,
    FutureCovariate,
    StaticCovariate,
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "id" => Ok(FieldType::Id),
            "time" => Ok(FieldType::Time),
            "target" => Ok(FieldType::Target),
            "past_covariate" => Ok(FieldType::PastCovariate),
            "future_covariate" => Ok(FieldType::FutureCovariate),
            "static_covariate" => Ok(FieldType::StaticCovariate),
            other => Err(format!("unknown field type '{}'", other)),
        }
    }
}

/// Description of one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: String,
    pub description: String,
    pub data_type: String,
    /// First non-missing value of the column
    pub example: Value,
}

/// Field sections of a schema, independent of forecast length
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaFields {
    pub id_field: FieldDescriptor,
    pub time_field: Option<FieldDescriptor>,
    pub forecast_target: FieldDescriptor,
    pub past_covariates: Vec<FieldDescriptor>,
    pub future_covariates: Vec<FieldDescriptor>,
    pub static_covariates: Vec<FieldDescriptor>,
}

/// Schema document for one dataset and forecast length
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub title: String,
    pub description: String,
    pub model_category: String,
    pub schema_version: f64,
    pub input_data_format: String,
    pub encoding: String,
    pub frequency: String,
    pub forecast_length: usize,
    pub id_field: FieldDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_field: Option<FieldDescriptor>,
    pub forecast_target: FieldDescriptor,
    #[serde(default)]
    pub past_covariates: Vec<FieldDescriptor>,
    #[serde(default)]
    pub future_covariates: Vec<FieldDescriptor>,
    #[serde(default)]
    pub static_covariates: Vec<FieldDescriptor>,
}

impl Schema {
    /// Assemble a schema document from metadata and field sections
    pub fn from_parts(
        metadata: &DatasetMetadata,
        fields: SchemaFields,
        forecast_length: usize,
    ) -> Result<Self> {
        if forecast_length == 0 {
            return Err(PrepError::schema(
                &metadata.name,
                "forecast length must be greater than zero",
            ));
        }

        Ok(Self {
            title: format!("{} Forecast Length {}", metadata.title, forecast_length),
            description: format!(
                "{} In this specific variation, the test set is designed to use a forecast length of {} time steps.",
                metadata.description, forecast_length
            ),
            model_category: metadata.model_category.clone(),
            schema_version: SCHEMA_VERSION,
            input_data_format: "CSV".to_string(),
            encoding: metadata.encoding.clone(),
            frequency: metadata.frequency.clone(),
            forecast_length,
            id_field: fields.id_field,
            time_field: fields.time_field,
            forecast_target: fields.forecast_target,
            past_covariates: fields.past_covariates,
            future_covariates: fields.future_covariates,
            static_covariates: fields.static_covariates,
        })
    }

    /// Name of the series identifier column
    pub fn id_name(&self) -> &str {
        &self.id_field.name
    }

    /// Name of the time column, if the dataset has one
    pub fn time_name(&self) -> Option<&str> {
        self.time_field.as_ref().map(|f| f.name.as_str())
    }

    /// Name of the target column
    pub fn target_name(&self) -> &str {
        &self.forecast_target.name
    }

    /// Names of the past covariates
    pub fn past_covariate_names(&self) -> Vec<&str> {
        self.past_covariates.iter().map(|f| f.name.as_str()).collect()
    }

    /// File name the schema is stored under
    pub fn file_name(dataset: &str, forecast_length: usize) -> String {
        format!("{}_forecast_len_{}_schema.json", dataset, forecast_length)
    }

    /// Write the schema as pretty JSON into `dir`, returning the file path
    pub fn save_json<P: AsRef<Path>>(&self, dir: P, dataset: &str) -> Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(Self::file_name(dataset, self.forecast_length));
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)?;
        Ok(path)
    }

    /// Read a schema document
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// Type an example cell for the JSON document
pub fn example_value(cell: &str) -> Value {
    let trimmed = cell.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if let Some(n) = Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    Value::String(cell.to_string())
}

/// Derives schemas from the feature-role table
#[derive(Debug, Clone, Copy)]
pub struct SchemaBuilder<'a> {
    roles: &'a [FeatureRole],
}

impl<'a> SchemaBuilder<'a> {
    pub fn new(roles: &'a [FeatureRole]) -> Self {
        Self { roles }
    }

    /// Derive the field sections of `dataset`, taking examples from `sample`
    pub fn fields(&self, dataset: &str, sample: &Table) -> Result<SchemaFields> {
        let rows: Vec<(&FeatureRole, FieldType)> = self
            .roles
            .iter()
            .filter(|r| r.name == dataset)
            .map(|r| {
                r.field_type
                    .parse::<FieldType>()
                    .map(|t| (r, t))
                    .map_err(|e| PrepError::schema(dataset, format!("field '{}': {}", r.field_name, e)))
            })
            .collect::<Result<_>>()?;

        if rows.is_empty() {
            return Err(PrepError::schema(dataset, "no features configured"));
        }

        let of_type = |t: FieldType| {
            rows.iter()
                .filter(|(_, ft)| *ft == t)
                .map(|(r, _)| *r)
                .collect::<Vec<&FeatureRole>>()
        };

        let id_rows = of_type(FieldType::Id);
        if id_rows.len() != 1 {
            return Err(PrepError::schema(
                dataset,
                format!("expected exactly one id field, found {}", id_rows.len()),
            ));
        }

        let target_rows = of_type(FieldType::Target);
        if target_rows.len() != 1 {
            return Err(PrepError::schema(
                dataset,
                format!("expected exactly one target field, found {}", target_rows.len()),
            ));
        }

        let time_rows = of_type(FieldType::Time);
        if time_rows.len() > 1 {
            return Err(PrepError::schema(
                dataset,
                format!("expected at most one time field, found {}", time_rows.len()),
            ));
        }

        let describe = |role: &FeatureRole, upper: bool| -> Result<FieldDescriptor> {
            let example = sample
                .first_present(&role.field_name)
                .map_err(|_| {
                    PrepError::schema(
                        dataset,
                        format!("column '{}' is not in the dataset", role.field_name),
                    )
                })?
                .ok_or_else(|| {
                    PrepError::schema(
                        dataset,
                        format!("column '{}' has no non-missing value", role.field_name),
                    )
                })?;

            Ok(FieldDescriptor {
                name: role.field_name.clone(),
                description: role.field_description.clone(),
                data_type: if upper {
                    role.data_type.to_uppercase()
                } else {
                    role.data_type.clone()
                },
                example: example_value(example),
            })
        };

        let covariates = |t: FieldType| -> Result<Vec<FieldDescriptor>> {
            of_type(t).into_iter().map(|r| describe(r, true)).collect()
        };

        Ok(SchemaFields {
            id_field: describe(id_rows[0], false)?,
            time_field: time_rows.first().map(|r| describe(*r, false)).transpose()?,
            forecast_target: describe(target_rows[0], false)?,
            past_covariates: covariates(FieldType::PastCovariate)?,
            future_covariates: covariates(FieldType::FutureCovariate)?,
            static_covariates: covariates(FieldType::StaticCovariate)?,
        })
    }

    /// Build the full schema document for one forecast length
    pub fn build(
        &self,
        metadata: &DatasetMetadata,
        sample: &Table,
        forecast_length: usize,
    ) -> Result<Schema> {
        let fields = self.fields(&metadata.name, sample)?;
        Schema::from_parts(metadata, fields, forecast_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_typing() {
        assert_eq!(example_value("42"), Value::from(42));
        assert_eq!(example_value("2.5"), Value::from(2.5));
        assert_eq!(example_value("2021-01-01"), Value::from("2021-01-01"));
        assert_eq!(example_value("inf"), Value::from("inf"));
    }

    #[test]
    fn test_field_type_parsing() {
        assert_eq!("target".parse::<FieldType>().unwrap(), FieldType::Target);
        assert!("feature".parse::<FieldType>().is_err());
    }
}
