// Run outputs: the crosses-found list, the crosses-not-found list, and
// the tab-delimited FlyCore order worksheet. All three are buffered and
// flushed on close on every control path; the not-found file is removed
// afterwards if nothing was written to it.

use crate::cross::{Cross, MissingHalf};
use crate::error::Result;
use crate::lines::StockRecord;
use crate::services::StockService;
use log::info;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const WORKSHEET_STOCK_COLUMNS: [&str; 9] = [
    "__flipper_flystocks_stock::RACK_LOCATION",
    "StockFinder::__kp_UniqueID",
    "StockFinder::RobotID",
    "StockFinder::Genotype_GSI_Name_PlateWell",
    "StockFinder::Chromosome",
    "StockFinder::Stock_Name",
    "StockFinder::fragment",
    "StockFinder::Production_Info",
    "StockFinder::Quality_Control",
];

pub struct ReportSet {
    crosses: BufWriter<File>,
    no_crosses: BufWriter<File>,
    worksheet: csv::Writer<File>,
    no_crosses_path: PathBuf,
    no_crosses_written: usize,
    order_name: String,
    stock: HashMap<String, StockRecord>,
}

impl ReportSet {
    /// Open the three report files under `dir` with the shared stem and
    /// write the worksheet header row.
    pub fn create(dir: &Path, stem: &str, order_name: &str) -> Result<Self> {
        let crosses = BufWriter::new(File::create(dir.join(format!("{stem}.crosses.txt")))?);
        let no_crosses_path = dir.join(format!("{stem}.no_crosses.txt"));
        let no_crosses = BufWriter::new(File::create(&no_crosses_path)?);
        let mut worksheet = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(dir.join(format!("{stem}.flycore.xls")))?;

        let mut header: Vec<&str> = vec!["Who", "#", "Alias", "Pfrag", "IS"];
        for _ in 0..2 {
            header.extend(WORKSHEET_STOCK_COLUMNS);
        }
        worksheet.write_record(&header)?;

        Ok(Self {
            crosses,
            no_crosses,
            worksheet,
            no_crosses_path,
            no_crosses_written: 0,
            order_name: order_name.to_string(),
            stock: HashMap::new(),
        })
    }

    /// A search term that could not be resolved at all.
    pub fn record_unresolved(&mut self, message: &str) -> Result<()> {
        writeln!(self.no_crosses, "{message}")?;
        self.no_crosses_written += 1;
        Ok(())
    }

    /// A fragment pair with no eligible AD/DBD combination.
    pub fn record_missing(&mut self, frag1: &str, frag2: &str, what: MissingHalf) -> Result<()> {
        writeln!(self.no_crosses, "Missing {what} for {frag1}-x-{frag2}")?;
        self.no_crosses_written += 1;
        Ok(())
    }

    /// A discovered cross: one line in the crosses file plus one order
    /// worksheet row combining both halves' stock metadata.
    pub fn record_cross(&mut self, stock: &dyn StockService, cross: &Cross) -> Result<()> {
        let alias = cross.alias();
        info!("Found cross {alias}");
        writeln!(self.crosses, "{alias}")?;

        for half in [&cross.ad, &cross.dbd] {
            if !self.stock.contains_key(half) {
                let record = stock.line_data(half)?;
                self.stock.insert(half.clone(), record);
            }
        }
        let ad = &self.stock[&cross.ad];
        let dbd = &self.stock[&cross.dbd];
        let pfrag = format!("{}-x-{}", ad.fragment, dbd.fragment);

        let mut row: Vec<&str> = vec![self.order_name.as_str(), "", alias.as_str(), pfrag.as_str(), ""];
        for (line, record) in [(&cross.ad, ad), (&cross.dbd, dbd)] {
            row.extend([
                record.rack_location.as_str(),
                record.unique_id.as_str(),
                record.robot_id.as_str(),
                record.genotype.as_str(),
                record.chromosome.as_str(),
                line.as_str(),
                record.fragment.as_str(),
                record.production_info.as_str(),
                record.quality_control.as_str(),
            ]);
        }
        self.worksheet.write_record(&row)?;
        Ok(())
    }

    /// Flush and close all three files; an empty not-found report is
    /// deleted rather than left as litter.
    pub fn close(mut self) -> Result<()> {
        self.crosses.flush()?;
        self.no_crosses.flush()?;
        self.worksheet.flush()?;
        if self.no_crosses_written == 0 {
            fs::remove_file(&self.no_crosses_path)?;
        }
        Ok(())
    }
}

/// Shared stem for the three report files: `<aline->(file|task|STDIN)[-ALL]`.
pub fn report_stem(file: Option<&str>, task: Option<&str>, aline: Option<&str>, all: bool) -> String {
    let stem = file.or(task).unwrap_or("STDIN");
    let prefix = aline.map(|a| format!("{a}-")).unwrap_or_default();
    let insert = if all { "-ALL" } else { "" };
    format!("{prefix}{stem}{insert}")
}
