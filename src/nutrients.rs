use serde::{Deserialize, Serialize};

/// The nutrients tracked by the catalog, the nutrition report and the disease targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NutrientKey {
    #[serde(rename = "calories")]
    Calories,
    #[serde(rename = "protein_g")]
    ProteinG,
    #[serde(rename = "carbs_g")]
    CarbsG,
    #[serde(rename = "fat_g")]
    FatG,
    #[serde(rename = "fiber_g")]
    FiberG,
    #[serde(rename = "calcium_mg")]
    CalciumMg,
    #[serde(rename = "iron_mg")]
    IronMg,
    #[serde(rename = "vitamin_d_μg")]
    VitaminDUg,
    #[serde(rename = "omega3_g")]
    Omega3G,
}

impl NutrientKey {
    pub const ALL: [NutrientKey; 9] = [
        NutrientKey::Calories,
        NutrientKey::ProteinG,
        NutrientKey::CarbsG,
        NutrientKey::FatG,
        NutrientKey::FiberG,
        NutrientKey::CalciumMg,
        NutrientKey::IronMg,
        NutrientKey::VitaminDUg,
        NutrientKey::Omega3G,
    ];

    /// Wire name of the key, identical to the catalog column and the target key.
    pub const fn as_str(&self) -> &'static str {
        match self {
            NutrientKey::Calories => "calories",
            NutrientKey::ProteinG => "protein_g",
            NutrientKey::CarbsG => "carbs_g",
            NutrientKey::FatG => "fat_g",
            NutrientKey::FiberG => "fiber_g",
            NutrientKey::CalciumMg => "calcium_mg",
            NutrientKey::IronMg => "iron_mg",
            NutrientKey::VitaminDUg => "vitamin_d_μg",
            NutrientKey::Omega3G => "omega3_g",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == key)
    }

    /// Mass unit of the nutrient, `None` for energy (calories).
    pub fn unit(&self) -> Option<UnitSuffix> {
        classify_unit_suffix(self.as_str())
    }
}

/// Mass unit encoded in the suffix of a nutrient key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitSuffix {
    Grams,
    Milligrams,
    Micrograms,
}

pub const MICROGRAMS_SUFFIX: &str = "_μg";

/// Classifies a key by its mass-unit suffix. Keys without a recognised suffix
/// (such as `calories`) yield `None`.
pub fn classify_unit_suffix(key: &str) -> Option<UnitSuffix> {
    // "_mg" and "_μg" must be checked before "_g", which they both end with.
    if key.ends_with("_mg") {
        Some(UnitSuffix::Milligrams)
    } else if key.ends_with(MICROGRAMS_SUFFIX) {
        Some(UnitSuffix::Micrograms)
    } else if key.ends_with("_g") {
        Some(UnitSuffix::Grams)
    } else {
        None
    }
}

/// Rounds to one decimal place, halves away from zero.
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// One value per tracked nutrient. Used both for catalog entries (per 100 units)
/// and for report totals / per-serving values.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct NutrientVector {
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein_g: f64,
    #[serde(default)]
    pub carbs_g: f64,
    #[serde(default)]
    pub fat_g: f64,
    #[serde(default)]
    pub fiber_g: f64,
    #[serde(default)]
    pub calcium_mg: f64,
    #[serde(default)]
    pub iron_mg: f64,
    #[serde(default, rename = "vitamin_d_μg")]
    pub vitamin_d_ug: f64,
    #[serde(default)]
    pub omega3_g: f64,
}

impl NutrientVector {
    pub fn get(&self, key: NutrientKey) -> f64 {
        match key {
            NutrientKey::Calories => self.calories,
            NutrientKey::ProteinG => self.protein_g,
            NutrientKey::CarbsG => self.carbs_g,
            NutrientKey::FatG => self.fat_g,
            NutrientKey::FiberG => self.fiber_g,
            NutrientKey::CalciumMg => self.calcium_mg,
            NutrientKey::IronMg => self.iron_mg,
            NutrientKey::VitaminDUg => self.vitamin_d_ug,
            NutrientKey::Omega3G => self.omega3_g,
        }
    }

    pub fn get_mut(&mut self, key: NutrientKey) -> &mut f64 {
        match key {
            NutrientKey::Calories => &mut self.calories,
            NutrientKey::ProteinG => &mut self.protein_g,
            NutrientKey::CarbsG => &mut self.carbs_g,
            NutrientKey::FatG => &mut self.fat_g,
            NutrientKey::FiberG => &mut self.fiber_g,
            NutrientKey::CalciumMg => &mut self.calcium_mg,
            NutrientKey::IronMg => &mut self.iron_mg,
            NutrientKey::VitaminDUg => &mut self.vitamin_d_ug,
            NutrientKey::Omega3G => &mut self.omega3_g,
        }
    }

    /// Adds `other * factor` to every nutrient.
    pub fn add_scaled(&mut self, other: &NutrientVector, factor: f64) {
        for key in NutrientKey::ALL {
            *self.get_mut(key) += other.get(key) * factor;
        }
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> NutrientVector {
        let mut out = NutrientVector::default();
        for key in NutrientKey::ALL {
            *out.get_mut(key) = f(self.get(key));
        }
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = (NutrientKey, f64)> + '_ {
        NutrientKey::ALL.into_iter().map(move |key| (key, self.get(key)))
    }
}
