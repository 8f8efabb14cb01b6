use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use crate::nutrients::{NutrientKey, NutrientVector};

const NAME_COL: &str = "name";

/// Nutrient values for one ingredient, per 100 units.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NutrientCatalogEntry {
    pub name: String,
    #[serde(flatten)]
    pub per_100: NutrientVector,
}

/// Read-only snapshot of the ingredient catalog, keyed by exact ingredient name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NutrientCatalog {
    entries: Vec<NutrientCatalogEntry>,
}

impl NutrientCatalog {
    pub fn new(entries: Vec<NutrientCatalogEntry>) -> Self {
        Self { entries }
    }

    /// Exact, case-sensitive name match. The first entry wins on duplicate names.
    pub fn lookup(&self, name: &str) -> Option<&NutrientCatalogEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Names usable as substitutes, in catalog order.
    pub fn ingredient_names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_nutrient_value(raw: &str, column: &str, row_index: usize) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            warn!(row = row_index, column, value = trimmed, "unparseable catalog value, using 0");
            0.0
        }
    }
}

/// Loads the catalog from a CSV file with a `name` column and one column per nutrient key.
/// Blank cells count as 0; rows with a blank name are skipped.
pub fn load_nutrient_catalog(csv_path: &Path) -> Result<NutrientCatalog> {
    if !csv_path.exists() {
        return Err(anyhow!("Nutrient catalog CSV file not found at: {:?}", csv_path));
    }

    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open nutrient catalog at {:?}", csv_path))?;
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(file);

    let headers = rdr.headers()?.clone();
    let column_index = |column: &str| {
        headers
            .iter()
            .position(|h| h.trim() == column)
            .ok_or_else(|| anyhow!("Column '{}' not found", column))
    };

    let name_idx = column_index(NAME_COL)?;
    let nutrient_indices = NutrientKey::ALL
        .iter()
        .map(|key| column_index(key.as_str()).map(|idx| (*key, idx)))
        .collect::<Result<Vec<_>>>()?;

    let mut entries = Vec::new();
    for (row_index, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read record at row index {}", row_index))?;

        let name = record.get(name_idx).unwrap_or_default().trim().to_string();
        if name.is_empty() {
            continue;
        }

        let mut per_100 = NutrientVector::default();
        for (key, idx) in &nutrient_indices {
            *per_100.get_mut(*key) =
                parse_nutrient_value(record.get(*idx).unwrap_or_default(), key.as_str(), row_index);
        }
        entries.push(NutrientCatalogEntry { name, per_100 });
    }

    if entries.is_empty() {
        return Err(anyhow!("No catalog entries loaded from {:?}", csv_path));
    }

    Ok(NutrientCatalog::new(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "name,calories,protein_g,carbs_g,fat_g,fiber_g,calcium_mg,iron_mg,vitamin_d_μg,omega3_g";

    fn create_test_csv_file() -> Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "{}", HEADER)?;
        writeln!(file, "oats,380,13,67,7,10,50,4,0,0.1")?;
        writeln!(file, "salmon,208,20,0,13,0,9,0.3,11,2.3")?;
        writeln!(file, ",10,10,10,10,10,10,10,10,10")?;
        writeln!(file, "mystery,text,,1,1,1,1,1,1,1")?;
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn test_load_nutrient_catalog_success() -> Result<()> {
        let file = create_test_csv_file()?;
        let catalog = load_nutrient_catalog(file.path())?;

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.ingredient_names(), vec!["oats", "salmon", "mystery"]);

        let salmon = catalog.lookup("salmon").unwrap();
        assert_eq!(salmon.per_100.vitamin_d_ug, 11.0);
        assert_eq!(salmon.per_100.omega3_g, 2.3);

        let mystery = catalog.lookup("mystery").unwrap();
        assert_eq!(mystery.per_100.calories, 0.0);
        assert_eq!(mystery.per_100.protein_g, 0.0);
        assert_eq!(mystery.per_100.carbs_g, 1.0);
        Ok(())
    }

    #[test]
    fn test_lookup_is_exact() -> Result<()> {
        let file = create_test_csv_file()?;
        let catalog = load_nutrient_catalog(file.path())?;
        assert!(catalog.lookup("Oats").is_none());
        assert!(catalog.lookup("oats ").is_none());
        assert!(catalog.lookup("oats").is_some());
        Ok(())
    }

    #[test]
    fn test_missing_column() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "name,calories,protein_g")?;
        writeln!(file, "oats,380,13")?;
        file.flush()?;

        let result = load_nutrient_catalog(file.path());
        assert!(result.unwrap_err().to_string().contains("Column 'carbs_g' not found"));
        Ok(())
    }

    #[test]
    fn test_headers_only() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "{}", HEADER)?;
        file.flush()?;

        let result = load_nutrient_catalog(file.path());
        assert!(result.unwrap_err().to_string().contains("No catalog entries loaded"));
        Ok(())
    }

    #[test]
    fn test_file_not_found() {
        let result = load_nutrient_catalog(Path::new("this_catalog_does_not_exist.csv"));
        assert!(result.unwrap_err().to_string().contains("not found"));
    }

    #[test]
    fn test_entry_json_is_flat() {
        let entry: NutrientCatalogEntry =
            serde_json::from_str(r#"{"name":"oats","calories":380,"protein_g":13}"#).unwrap();
        assert_eq!(entry.per_100.calories, 380.0);
        assert_eq!(entry.per_100.fat_g, 0.0);
    }
}
