use crate::gen1;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Only lines with this expression driver may take part in a cross.
pub const REQUIRED_DRIVER: &str = "GAL4";

/// Which half of the split binary system a line carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitHalf {
    #[serde(rename = "AD")]
    Ad,
    #[serde(rename = "DBD")]
    Dbd,
}

impl SplitHalf {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "AD" => Some(SplitHalf::Ad),
            "DBD" => Some(SplitHalf::Dbd),
            _ => None,
        }
    }
}

impl fmt::Display for SplitHalf {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SplitHalf::Ad => write!(f, "AD"),
            SplitHalf::Dbd => write!(f, "DBD"),
        }
    }
}

fn default_driver() -> String {
    REQUIRED_DRIVER.to_string()
}

/// One concrete line record associated with a fragment.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LineVariant {
    pub line: String,
    #[serde(rename = "type")]
    pub half: SplitHalf,
    #[serde(default = "default_driver")]
    pub driver: String,
}

impl LineVariant {
    pub fn new(line: &str, half: SplitHalf, driver: &str) -> Self {
        Self {
            line: line.to_string(),
            half,
            driver: driver.to_string(),
        }
    }

    pub fn is_eligible(&self, half: SplitHalf) -> bool {
        self.half == half && self.driver == REQUIRED_DRIVER
    }

    pub fn landing_site(&self) -> &str {
        gen1::landing_site(&self.line)
    }
}

/// Fragment key -> known AD/DBD line variants, built once per run from the
/// split-halves service. Variants are kept sorted by line name so that the
/// strict-maximum cross selection is reproducible run to run.
#[derive(Clone, Debug, Default)]
pub struct FragmentTable {
    variants: HashMap<String, Vec<LineVariant>>,
}

impl FragmentTable {
    pub fn new(mut variants: HashMap<String, Vec<LineVariant>>) -> Self {
        for list in variants.values_mut() {
            list.sort_by(|a, b| a.line.cmp(&b.line));
        }
        Self { variants }
    }

    pub fn contains(&self, fragment: &str) -> bool {
        self.variants.contains_key(fragment)
    }

    pub fn variants(&self, fragment: &str) -> &[LineVariant] {
        self.variants.get(fragment).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn insert(&mut self, fragment: &str, variant: LineVariant) {
        let list = self.variants.entry(fragment.to_string()).or_default();
        list.push(variant);
        list.sort_by(|a, b| a.line.cmp(&b.line));
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

/// One row of a `lines?name=` query.
#[derive(Clone, Debug, Deserialize)]
pub struct LineRecord {
    pub name: String,
    #[serde(default)]
    pub flycore_project: String,
}

/// FlyCore stock metadata for one line, as used on the order worksheet.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StockRecord {
    #[serde(rename = "A_Concat_Loc", default)]
    pub rack_location: String,
    #[serde(rename = "__kp_UniqueID", default)]
    pub unique_id: String,
    #[serde(rename = "RobotID", default)]
    pub robot_id: String,
    #[serde(rename = "Genotype_GSI_Name_PlateWell", default)]
    pub genotype: String,
    #[serde(rename = "Chromosome", default)]
    pub chromosome: String,
    #[serde(default)]
    pub fragment: String,
    #[serde(rename = "Production_Info", default)]
    pub production_info: String,
    #[serde(rename = "Quality_Control", default)]
    pub quality_control: String,
}
