// Turns raw search terms (VT identifiers, Gen1 coordinates, literal line
// names) into canonical fragment keys that exist in the fragment table.

use crate::error::Result;
use crate::gen1;
use crate::lines::{FragmentTable, LineVariant, REQUIRED_DRIVER, SplitHalf};
use crate::services::LineService;
use log::{debug, error, info, warn};
use std::collections::HashMap;

/// Outcome of normalizing one raw search term.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Normalized {
    /// Canonical search term, ready for the eligibility lookup.
    Term(String),
    /// A VT identifier the translation service does not know.
    UnknownVt(String),
}

pub struct FragmentResolver<'a> {
    lines: &'a dyn LineService,
    vt_cache: HashMap<String, String>,
    added: Vec<(String, String)>,
}

impl<'a> FragmentResolver<'a> {
    pub fn new(lines: &'a dyn LineService, vt_cache: HashMap<String, String>) -> Self {
        Self {
            lines,
            vt_cache,
            added: Vec::new(),
        }
    }

    /// Cache entries discovered this run, to be pushed back at run end.
    pub fn new_entries(&self) -> &[(String, String)] {
        &self.added
    }

    /// VT translation with the persistent cache in front of the service.
    /// The cached value is the plate/well fragment of the qualified line.
    pub fn convert_vt(&mut self, term: &str) -> Result<Normalized> {
        let vt = gen1::canonical_vt(term);
        if let Some(fragment) = self.vt_cache.get(&vt) {
            debug!("Converted {vt} to {fragment} (cached)");
            return Ok(Normalized::Term(fragment.clone()));
        }
        let Some(line) = self.lines.translate_vt(&vt)? else {
            return Ok(Normalized::UnknownVt(vt));
        };
        let fragment = line.split('_').nth(1).unwrap_or(&line).to_string();
        debug!("Converted {vt} to {fragment}");
        self.vt_cache.insert(vt.clone(), fragment.clone());
        self.added.push((vt, fragment.clone()));
        Ok(Normalized::Term(fragment))
    }

    /// Normalize a raw input term to its canonical search term: VT
    /// identifiers are translated, Gen1 names are reduced to the bare
    /// fragment, anything else passes through as a literal line name.
    pub fn normalize(&mut self, raw: &str) -> Result<Normalized> {
        let mut term = raw.to_string();
        if gen1::is_vt(&term) {
            match self.convert_vt(&term)? {
                Normalized::Term(converted) => term = converted,
                unknown => return Ok(unknown),
            }
        }
        if gen1::is_gen1_fragment(&term) || gen1::is_gen1(&term) {
            term = gen1::convert_gen1(&term);
        }
        Ok(Normalized::Term(term))
    }

    /// Find the canonical fragment key for a normalized term, if it can
    /// take part in a cross. Non-Gen1 exact matches are added to the
    /// fragment table on the fly; `None` drops the term from the run.
    pub fn locate(&self, table: &mut FragmentTable, term: &str) -> Result<Option<String>> {
        let gen1_fragment = gen1::is_gen1_fragment(term);
        if gen1_fragment {
            // Low plate numbers live in the GMR collection, the rest in BJD.
            let collection = if gen1::leading_number(term).unwrap_or(0) < 100 {
                "GMR_"
            } else {
                "BJD_"
            };
            let extended = format!("{collection}{term}");
            if table.contains(&extended) {
                info!("Found {extended} in split half list");
                return Ok(Some(extended));
            }
        }

        let (pattern, names_only) = if gen1_fragment {
            (format!("*\\_{term}*"), true)
        } else {
            (term.to_string(), false)
        };
        let records = self.lines.lines_matching(&pattern, names_only)?;
        if records.is_empty() {
            error!("{term} was not found in SAGE");
            return Ok(None);
        }
        for record in &records {
            if record.name == term {
                if gen1_fragment {
                    warn!("Line {term} is not a valid split half");
                } else {
                    let project = record.flycore_project.as_str();
                    let half = project.rsplit('-').next().and_then(SplitHalf::parse);
                    let Some(half) = half else {
                        error!("Non-Gen1 line {term} is not an AD or DBD ({project})");
                        return Ok(None);
                    };
                    table.insert(term, LineVariant::new(term, half, REQUIRED_DRIVER));
                    info!("Non-Gen1 {term} ({half})");
                    return Ok(Some(term.to_string()));
                }
            }
            if !record.name.contains(&format!("_{term}")) {
                continue;
            }
            let fragment = gen1::strip_well_suffix(&record.name);
            debug!("{} -> {fragment}", record.name);
            if !table.contains(&fragment) {
                warn!("Fragment {fragment} does not have an AD or DBD");
                return Ok(None);
            }
            info!("{fragment}");
            return Ok(Some(fragment));
        }
        Ok(None)
    }
}
