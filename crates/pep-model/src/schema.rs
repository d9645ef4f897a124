use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Code of one of the compared regions (e.g. `BA`, `RJ`).
///
/// Codes are stored trimmed; comparisons are exact (case-sensitive), matching how the
/// source spreadsheets spell them.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionCode(String);

impl RegionCode {
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for RegionCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RegionCode {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RegionCode {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// The two record schemas the dashboard knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetVariant {
    /// Post-exposure prophylaxis dispensations.
    Pep,
    /// Pre-exposure prophylaxis dispensations.
    Prep,
}

impl DatasetVariant {
    pub const ALL: [DatasetVariant; 2] = [DatasetVariant::Pep, DatasetVariant::Prep];

    /// Lowercase identifier used in file names and on the command line.
    pub const fn slug(self) -> &'static str {
        match self {
            DatasetVariant::Pep => "pep",
            DatasetVariant::Prep => "prep",
        }
    }

    pub const fn default_sheet_name(self) -> &'static str {
        match self {
            DatasetVariant::Pep => "Banco_PEP_UDM",
            DatasetVariant::Prep => "Banco_PrEP_UDM",
        }
    }

    /// File name of the filtered CSV export, e.g. `pep_filtered.csv`.
    pub fn export_file_name(self) -> String {
        format!("{}_filtered.csv", self.slug())
    }
}

impl fmt::Display for DatasetVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetVariant::Pep => f.write_str("PEP"),
            DatasetVariant::Prep => f.write_str("PrEP"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown dataset variant `{0}` (expected `pep` or `prep`)")]
pub struct UnknownVariant(pub String);

impl FromStr for DatasetVariant {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pep" => Ok(DatasetVariant::Pep),
            "prep" => Ok(DatasetVariant::Prep),
            _ => Err(UnknownVariant(s.to_owned())),
        }
    }
}

/// A categorical column used for grouped counts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionSpec {
    pub column: String,
    pub label: String,
    /// Also render an absolute-count chart next to the percentage one.
    #[serde(default)]
    pub raw_counts: bool,
}

impl DimensionSpec {
    pub fn new(column: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            label: label.into(),
            raw_counts: false,
        }
    }

    pub fn with_raw_counts(mut self) -> Self {
        self.raw_counts = true;
        self
    }
}

/// Column layout of one dataset variant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSchema {
    pub variant: DatasetVariant,
    pub region_column: String,
    pub date_column: String,
    #[serde(default)]
    pub dimensions: Vec<DimensionSpec>,
}

impl VariantSchema {
    pub fn pep() -> Self {
        Self {
            variant: DatasetVariant::Pep,
            region_column: "UF_UDM".to_owned(),
            date_column: "dt_disp".to_owned(),
            dimensions: vec![
                DimensionSpec::new("Pop", "Population group").with_raw_counts(),
                DimensionSpec::new("tipo_exposicao", "Exposure type").with_raw_counts(),
                DimensionSpec::new("trabalho_sexual", "Sex work"),
                DimensionSpec::new("alcool_drogas", "Alcohol/drug use"),
            ],
        }
    }

    pub fn prep() -> Self {
        Self {
            variant: DatasetVariant::Prep,
            region_column: "UF_UDM".to_owned(),
            date_column: "dt_disp".to_owned(),
            dimensions: vec![
                DimensionSpec::new("Pop", "Population group").with_raw_counts(),
                DimensionSpec::new("tipo_servico", "Service type"),
                DimensionSpec::new("resultado_teste", "Test result"),
            ],
        }
    }

    /// Every column a loaded table must carry, in declaration order.
    pub fn required_columns(&self) -> impl Iterator<Item = &str> + '_ {
        [self.region_column.as_str(), self.date_column.as_str()]
            .into_iter()
            .chain(self.dimensions.iter().map(|d| d.column.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_codes_are_trimmed() {
        assert_eq!(RegionCode::new(" RJ "), RegionCode::from("RJ"));
        assert_eq!(RegionCode::new("BA").as_str(), "BA");
    }

    #[test]
    fn variant_parses_case_insensitively() {
        assert_eq!("PrEP".parse::<DatasetVariant>(), Ok(DatasetVariant::Prep));
        assert_eq!(" pep".parse::<DatasetVariant>(), Ok(DatasetVariant::Pep));
        assert!("hiv".parse::<DatasetVariant>().is_err());
    }

    #[test]
    fn export_file_names_follow_variant_slug() {
        assert_eq!(DatasetVariant::Pep.export_file_name(), "pep_filtered.csv");
        assert_eq!(DatasetVariant::Prep.export_file_name(), "prep_filtered.csv");
    }

    #[test]
    fn required_columns_start_with_region_and_date() {
        let schema = VariantSchema::pep();
        let cols: Vec<&str> = schema.required_columns().collect();
        assert_eq!(
            cols,
            vec![
                "UF_UDM",
                "dt_disp",
                "Pop",
                "tipo_exposicao",
                "trabalho_sexual",
                "alcool_drogas"
            ]
        );
    }

    #[test]
    fn schema_round_trips_through_json_with_default_raw_counts() {
        let json = r#"{
            "variant": "prep",
            "region_column": "UF",
            "date_column": "data",
            "dimensions": [{"column": "Pop", "label": "Population"}]
        }"#;
        let schema: VariantSchema = serde_json::from_str(json).unwrap();
        assert_eq!(schema.variant, DatasetVariant::Prep);
        assert!(!schema.dimensions[0].raw_counts);
    }
}
