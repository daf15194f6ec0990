// Service seams for the three external collaborators: the SAGE line
// service, the FlyCore stock service, and the configuration service.
// The HTTP clients live here too; tests swap in in-memory fakes.

use crate::error::{Result, SplitGenError};
use crate::lines::{LineRecord, LineVariant, StockRecord};
use crate::responder::Responder;
use serde::Deserialize;
use std::collections::HashMap;

pub trait LineService {
    /// Fragment -> known AD/DBD variants, fetched once per run.
    fn split_halves(&self) -> Result<HashMap<String, Vec<LineVariant>>>;

    /// `lines?name=<pattern>` lookup; `names_only` restricts the
    /// returned columns to the line name.
    fn lines_matching(&self, pattern: &str, names_only: bool) -> Result<Vec<LineRecord>>;

    /// Translate a canonical VT identifier to its qualified line name.
    /// `None` means the identifier is unknown, which is not fatal.
    fn translate_vt(&self, vt: &str) -> Result<Option<String>>;
}

pub trait StockService {
    /// Stock metadata for one line. Failure here is fatal for the run:
    /// the order worksheet cannot be completed without it.
    fn line_data(&self, line: &str) -> Result<StockRecord>;
}

pub trait SettingsService {
    /// Suffix -> score table for this program.
    fn score_table(&self) -> Result<HashMap<String, i64>>;

    /// Persisted VT -> fragment conversions; empty on first deployment.
    fn vt_cache(&self) -> Result<HashMap<String, String>>;

    /// Push one new VT conversion back to the persisted cache.
    fn store_vt_entry(&self, vt: &str, fragment: &str) -> Result<()>;

    /// Resolve a user id to a display name for the order worksheet.
    fn workday_name(&self, userid: &str) -> Result<Option<String>>;
}

#[derive(Deserialize)]
struct LinesEnvelope {
    #[serde(default)]
    line_data: Vec<LineRecord>,
}

#[derive(Deserialize)]
struct TranslateEnvelope {
    #[serde(default)]
    line_data: Vec<TranslatedLine>,
}

#[derive(Deserialize)]
struct TranslatedLine {
    line: String,
}

#[derive(Deserialize)]
struct SplitHalvesEnvelope {
    split_halves: HashMap<String, Vec<LineVariant>>,
}

#[derive(Deserialize)]
struct StockEnvelope {
    linedata: Option<StockRecord>,
}

#[derive(Deserialize)]
struct ConfigEnvelope<T> {
    config: T,
}

#[derive(Deserialize)]
struct ScoreConfig {
    score: HashMap<String, i64>,
}

#[derive(Deserialize)]
struct WorkdayRecord {
    first: String,
    last: String,
}

/// Base URL for one REST collaborator, as served by `config/rest_services`.
#[derive(Clone, Debug, Deserialize)]
pub struct RestService {
    pub url: String,
}

pub struct SageClient {
    responder: Responder,
}

impl SageClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            responder: Responder::new(base_url)?,
        })
    }
}

impl LineService for SageClient {
    fn split_halves(&self) -> Result<HashMap<String, Vec<LineVariant>>> {
        let envelope: SplitHalvesEnvelope = self
            .responder
            .get("split_halves")?
            .ok_or_else(|| SplitGenError::Service("split_halves is not available".to_string()))?;
        Ok(envelope.split_halves)
    }

    fn lines_matching(&self, pattern: &str, names_only: bool) -> Result<Vec<LineRecord>> {
        let columns = if names_only { "&_columns=name" } else { "" };
        let endpoint = format!("lines?name={pattern}{columns}");
        let envelope: LinesEnvelope = self.responder.get(&endpoint)?.ok_or_else(|| {
            SplitGenError::Service(format!("line lookup for '{pattern}' is not available"))
        })?;
        Ok(envelope.line_data)
    }

    fn translate_vt(&self, vt: &str) -> Result<Option<String>> {
        let envelope: Option<TranslateEnvelope> = self.responder.get(&format!("translatevt/{vt}"))?;
        Ok(envelope
            .and_then(|e| e.line_data.into_iter().next())
            .map(|t| t.line))
    }
}

pub struct FlyCoreClient {
    responder: Responder,
}

impl FlyCoreClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            responder: Responder::new(base_url)?,
        })
    }
}

impl StockService for FlyCoreClient {
    fn line_data(&self, line: &str) -> Result<StockRecord> {
        let endpoint = format!("?request=linedata&line={line}");
        let envelope: Option<StockEnvelope> = self.responder.get(&endpoint)?;
        envelope
            .and_then(|e| e.linedata)
            .ok_or_else(|| SplitGenError::Service(format!("No stock data for line '{line}'")))
    }
}

pub struct ConfigClient {
    responder: Responder,
    program: String,
}

impl ConfigClient {
    pub fn new(base_url: &str, program: &str) -> Result<Self> {
        Ok(Self {
            responder: Responder::new(base_url)?,
            program: program.to_string(),
        })
    }

    /// Base URLs for the other REST collaborators.
    pub fn rest_services(&self) -> Result<HashMap<String, RestService>> {
        let envelope: ConfigEnvelope<HashMap<String, RestService>> = self
            .responder
            .get("config/rest_services")?
            .ok_or_else(|| SplitGenError::Service("rest_services is not configured".to_string()))?;
        Ok(envelope.config)
    }
}

impl SettingsService for ConfigClient {
    fn score_table(&self) -> Result<HashMap<String, i64>> {
        let endpoint = format!("config/{}", self.program);
        let envelope: ConfigEnvelope<ScoreConfig> = self.responder.get(&endpoint)?.ok_or_else(
            || SplitGenError::Service(format!("no score configuration for '{}'", self.program)),
        )?;
        Ok(envelope.config.score)
    }

    fn vt_cache(&self) -> Result<HashMap<String, String>> {
        // A missing cache document is an empty cache, not an error.
        let envelope: Option<ConfigEnvelope<HashMap<String, String>>> =
            self.responder.get("config/vt_conversion")?;
        Ok(envelope.map(|e| e.config).unwrap_or_default())
    }

    fn store_vt_entry(&self, vt: &str, fragment: &str) -> Result<()> {
        let body = HashMap::from([("config", serde_json::to_string(fragment)?)]);
        let endpoint = format!("importjson/vt_conversion/{vt}");
        let _: Option<serde_json::Value> = self.responder.post_form(&endpoint, &body)?;
        Ok(())
    }

    fn workday_name(&self, userid: &str) -> Result<Option<String>> {
        let envelope: Option<ConfigEnvelope<WorkdayRecord>> =
            self.responder.get(&format!("config/workday/{userid}"))?;
        Ok(envelope.map(|e| format!("{} {}", e.config.first, e.config.last)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lines::SplitHalf;

    #[test]
    fn split_halves_payload_parses_into_variants() {
        let json = r#"{"split_halves": {
            "BJD_112C03": [
                {"line": "BJD_112C03_AE_01", "type": "AD", "driver": "GAL4"},
                {"line": "BJD_112C03_BB_21", "type": "DBD", "driver": "LexA"}
            ]
        }}"#;
        let envelope: SplitHalvesEnvelope = serde_json::from_str(json).unwrap();
        let variants = &envelope.split_halves["BJD_112C03"];
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].half, SplitHalf::Ad);
        assert_eq!(variants[1].driver, "LexA");
    }

    #[test]
    fn empty_translation_yields_no_line() {
        let envelope: TranslateEnvelope = serde_json::from_str(r#"{"line_data": []}"#).unwrap();
        assert!(envelope.line_data.is_empty());
        let envelope: TranslateEnvelope = serde_json::from_str(r#"{}"#).unwrap();
        assert!(envelope.line_data.is_empty());
    }

    #[test]
    fn stock_payload_parses_worksheet_fields() {
        let json = r#"{"linedata": {
            "A_Concat_Loc": "R12 C3",
            "__kp_UniqueID": "12345",
            "RobotID": "R-99",
            "Genotype_GSI_Name_PlateWell": "w[1118]; P{y[+t7.7]...}",
            "Chromosome": "3",
            "fragment": "112C03",
            "Production_Info": "ok",
            "Quality_Control": "passed"
        }}"#;
        let envelope: StockEnvelope = serde_json::from_str(json).unwrap();
        let stock = envelope.linedata.unwrap();
        assert_eq!(stock.rack_location, "R12 C3");
        assert_eq!(stock.unique_id, "12345");
        assert_eq!(stock.chromosome, "3");
        assert_eq!(stock.quality_control, "passed");
    }

    #[test]
    fn missing_stock_fields_default_to_empty() {
        let envelope: StockEnvelope =
            serde_json::from_str(r#"{"linedata": {"fragment": "112C03"}}"#).unwrap();
        let stock = envelope.linedata.unwrap();
        assert_eq!(stock.fragment, "112C03");
        assert_eq!(stock.robot_id, "");
    }
}
