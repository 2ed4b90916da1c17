use crate::core::errors::{Result, SimError};
use crate::core::material::MaterialKind;
use serde::{Deserialize, Serialize};

/// Description of the raw material entering the line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Units available; `None` never runs dry
    pub initial_inventory: Option<u64>,
    pub material_kind: MaterialKind,
    /// Recorded as the creating station of every supplied unit
    pub label: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            initial_inventory: None,
            material_kind: MaterialKind::Raw,
            label: "Raw".to_string(),
        }
    }
}

impl SourceConfig {
    /// Inexhaustible supply of raw material
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn with_inventory(mut self, units: u64) -> Self {
        self.initial_inventory = Some(units);
        self
    }

    pub fn with_material(mut self, kind: MaterialKind, label: impl Into<String>) -> Self {
        self.material_kind = kind;
        self.label = label.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.label.trim().is_empty() {
            return Err(SimError::configuration("source", "label must not be empty"));
        }
        Ok(())
    }
}

/// Product economics used when aggregating production
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductConfig {
    pub name: String,
    pub units_per_case: u32,
    pub cases_per_pallet: u32,
    /// Material cost per pallet
    pub material_cost: f64,
    /// Selling price per pallet
    pub selling_price: f64,
}

impl Default for ProductConfig {
    fn default() -> Self {
        Self {
            name: "Product".to_string(),
            units_per_case: 12,
            cases_per_pallet: 60,
            material_cost: 150.0,
            selling_price: 450.0,
        }
    }
}

impl ProductConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn units_per_pallet(&self) -> u32 {
        self.units_per_case * self.cases_per_pallet
    }

    /// Selling price of one unit of `kind`, scaled down from the pallet price
    pub fn price_of(&self, kind: MaterialKind) -> f64 {
        self.scale(self.selling_price, kind)
    }

    /// Material cost of one unit of `kind`, scaled down from the pallet cost
    pub fn material_cost_of(&self, kind: MaterialKind) -> f64 {
        self.scale(self.material_cost, kind)
    }

    fn scale(&self, per_pallet: f64, kind: MaterialKind) -> f64 {
        let divisor = match kind {
            MaterialKind::Pallet => 1,
            MaterialKind::Case => self.cases_per_pallet,
            MaterialKind::Tube | MaterialKind::Raw => self.units_per_pallet(),
        };
        if divisor == 0 {
            0.0
        } else {
            per_pallet / f64::from(divisor)
        }
    }
}
