use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::nutrients::NutrientKey;
use crate::recipe_aggregator::NutritionReport;

/// Daily nutrient targets for one disease, as stored. Values are kept as raw JSON
/// so the mapping is echoed back unchanged; only numeric values take part in
/// percentage calculation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct DiseaseTargets {
    pub disease: String,
    #[serde(default)]
    pub targets: BTreeMap<String, Value>,
}

impl DiseaseTargets {
    pub fn new(disease: &str, targets: &[(&str, f64)]) -> Self {
        Self {
            disease: disease.to_string(),
            targets: targets
                .iter()
                .map(|(key, value)| (key.to_string(), Value::from(*value)))
                .collect(),
        }
    }

    /// Numeric target for `key`, if present and usable as a divisor.
    pub fn target_for(&self, key: &str) -> Option<f64> {
        self.targets
            .get(key)
            .and_then(Value::as_f64)
            .filter(|value| value.is_finite() && *value != 0.0)
    }
}

/// Percent of daily target reached by one serving, per target key.
///
/// Only target keys with a mass-unit suffix (`_g`, `_mg`, `_μg`) that name a tracked
/// nutrient are considered. Targets that are zero, missing or non-numeric produce no
/// entry, as do keys the report does not carry.
pub fn calculate_percentages(
    nutrition: &NutritionReport,
    targets: &DiseaseTargets,
) -> BTreeMap<String, i64> {
    let mut percentages = BTreeMap::new();

    for key in targets.targets.keys() {
        let Some(nutrient) = NutrientKey::from_key(key).filter(|n| n.unit().is_some()) else {
            continue;
        };
        let Some(target) = targets.target_for(key) else {
            continue;
        };
        let per_serving = nutrition.per_serving.get(nutrient);
        percentages.insert(key.clone(), (per_serving / target * 100.0).round() as i64);
    }

    percentages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrients::NutrientVector;
    use serde_json::json;

    fn report_with(per_serving: NutrientVector) -> NutritionReport {
        NutritionReport {
            total: per_serving,
            per_serving,
        }
    }

    #[test]
    fn test_protein_percentage() {
        let report = report_with(NutrientVector { protein_g: 13.0, ..Default::default() });
        let targets = DiseaseTargets::new("celiac", &[("protein_g", 50.0)]);
        let percentages = calculate_percentages(&report, &targets);
        assert_eq!(percentages.len(), 1);
        assert_eq!(percentages["protein_g"], 26);
    }

    #[test]
    fn test_all_mass_units_are_recognised() {
        let report = report_with(NutrientVector {
            fiber_g: 5.0,
            calcium_mg: 333.0,
            vitamin_d_ug: 3.0,
            ..Default::default()
        });
        let targets = DiseaseTargets::new(
            "lactose_intolerance",
            &[("fiber_g", 25.0), ("calcium_mg", 1000.0), ("vitamin_d_μg", 15.0)],
        );
        let percentages = calculate_percentages(&report, &targets);
        assert_eq!(percentages["fiber_g"], 20);
        assert_eq!(percentages["calcium_mg"], 33);
        assert_eq!(percentages["vitamin_d_μg"], 20);
    }

    #[test]
    fn test_skips_zero_unknown_unitless_and_non_numeric_targets() {
        let report = report_with(NutrientVector {
            calories: 400.0,
            carbs_g: 30.0,
            ..Default::default()
        });
        let targets = DiseaseTargets {
            disease: "type1_diabetes".to_string(),
            targets: BTreeMap::from([
                ("calories".to_string(), json!(2000)),
                ("carbs_g".to_string(), json!(0)),
                ("sugar_g".to_string(), json!(25)),
                ("fat_g".to_string(), json!(null)),
                ("fiber_g".to_string(), json!("plenty")),
                ("iron_mg".to_string(), json!(18)),
            ]),
        };
        let percentages = calculate_percentages(&report, &targets);
        assert_eq!(percentages, BTreeMap::from([("iron_mg".to_string(), 0)]));
    }

    #[test]
    fn test_empty_targets_give_empty_percentages() {
        let report = report_with(NutrientVector { protein_g: 10.0, ..Default::default() });
        assert!(calculate_percentages(&report, &DiseaseTargets::default()).is_empty());
    }

    #[test]
    fn test_targets_json_round_trip_keeps_extra_keys() {
        let targets: DiseaseTargets = serde_json::from_value(json!({
            "disease": "celiac",
            "targets": { "protein_g": 50, "gluten": "none" }
        }))
        .unwrap();
        assert_eq!(targets.target_for("protein_g"), Some(50.0));
        assert_eq!(targets.target_for("gluten"), None);
        assert_eq!(serde_json::to_value(&targets).unwrap()["targets"]["gluten"], "none");
    }
}
