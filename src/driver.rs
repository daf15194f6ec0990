// One complete generator run: resolve the input fragments, enumerate all
// unordered pairs, and hand discovered crosses and misses to the reports.

use crate::cross;
use crate::error::{Result, SplitGenError};
use crate::gen1;
use crate::lines::FragmentTable;
use crate::report::ReportSet;
use crate::resolver::{FragmentResolver, Normalized};
use crate::scoring::ScoreTable;
use crate::services::{LineService, StockService};
use itertools::Itertools;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::time::Instant;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub read: usize,
    pub eligible: usize,
    pub theoretical: usize,
    pub found: usize,
}

#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    /// Raw input terms, one per line, before normalization.
    pub input: Vec<String>,
    /// Restrict pairs to those containing this fragment.
    pub a_line: Option<String>,
    /// Emit every eligible combination instead of only the best.
    pub all_combinations: bool,
}

pub struct Driver<'a> {
    lines: &'a dyn LineService,
    stock: &'a dyn StockService,
}

impl<'a> Driver<'a> {
    pub fn new(lines: &'a dyn LineService, stock: &'a dyn StockService) -> Self {
        Self { lines, stock }
    }

    pub fn run(
        &self,
        options: &RunOptions,
        scores: &mut ScoreTable,
        resolver: &mut FragmentResolver<'_>,
        reports: &mut ReportSet,
    ) -> Result<Summary> {
        let start = Instant::now();
        info!("Fetching split halves");
        let mut table = FragmentTable::new(self.lines.split_halves()?);
        info!("Found {} fragments with AD/DBDs", table.len());

        // The A line is resolved up front; its failure is fatal because
        // every pair would have to contain it.
        let a_line = match &options.a_line {
            Some(raw) => Some(Self::convert_a_line(resolver, reports, raw)?),
            None => None,
        };

        info!("Processing line fragment list");
        let mut summary = Summary::default();
        let mut seen: HashSet<String> = HashSet::new();
        let mut eligible: Vec<String> = Vec::new();
        let terms = a_line.iter().cloned().chain(options.input.iter().cloned());
        for raw in terms {
            let raw = raw.trim_end();
            if raw.is_empty() {
                continue;
            }
            summary.read += 1;
            let term = match resolver.normalize(raw)? {
                Normalized::Term(term) => term,
                Normalized::UnknownVt(vt) => {
                    warn!("Could not convert {vt} to line");
                    reports.record_unresolved(&format!("Could not convert {vt} to line"))?;
                    continue;
                }
            };
            if !seen.insert(term.clone()) {
                warn!("Ignoring duplicate {term}");
                summary.read -= 1;
                continue;
            }
            debug!("{raw} -> {term}");
            match resolver.locate(&mut table, &term)? {
                Some(fragment) => eligible.push(fragment),
                None => {
                    if a_line.as_deref() == Some(term.as_str()) {
                        return Err(SplitGenError::NotFound(format!(
                            "A line {term} could not be resolved"
                        )));
                    }
                }
            }
        }
        eligible.sort();
        summary.eligible = eligible.len();

        let n = summary.eligible;
        summary.theoretical = match &a_line {
            Some(_) => n.saturating_sub(1),
            None => n * n.saturating_sub(1) / 2,
        };
        println!("Fragments read: {}", summary.read);
        println!("Eligible line fragments: {n}");
        println!("Theoretical crosses: {}", summary.theoretical);
        if summary.theoretical == 0 {
            return Err(SplitGenError::NotFound(
                "No theoretical crosses found".to_string(),
            ));
        }

        info!("Generating crosses");
        for (frag1, frag2) in eligible.iter().tuple_combinations() {
            if frag1 == frag2 {
                continue;
            }
            if let Some(a) = &a_line {
                if !frag1.contains(a.as_str()) && !frag2.contains(a.as_str()) {
                    debug!("Cross does not contain A line {a}");
                    continue;
                }
            }
            let candidates =
                cross::generate(&table, scores, frag1, frag2, options.all_combinations);
            for found in &candidates.all {
                reports.record_cross(self.stock, found)?;
            }
            match candidates.best {
                Some(best) => {
                    summary.found += 1;
                    if !options.all_combinations {
                        reports.record_cross(self.stock, &best)?;
                    }
                }
                None => {
                    let what = cross::missing_half(&table, frag1, frag2);
                    warn!("Missing {what} for {frag1}-x-{frag2}");
                    reports.record_missing(frag1, frag2, what)?;
                }
            }
        }

        println!(
            "Crosses found: {}/{} ({:.2}%)",
            summary.found,
            summary.theoretical,
            summary.found as f64 / summary.theoretical as f64 * 100.0
        );
        info!("Elapsed time: {:.2?}", start.elapsed());
        Ok(summary)
    }

    /// VT-translate or uppercase the A-line filter term. The filter is a
    /// substring match, so a bare fragment matches its qualified names.
    fn convert_a_line(
        resolver: &mut FragmentResolver<'_>,
        reports: &mut ReportSet,
        raw: &str,
    ) -> Result<String> {
        let raw = raw.trim();
        if gen1::is_vt(raw) {
            match resolver.convert_vt(raw)? {
                Normalized::Term(term) => Ok(term),
                Normalized::UnknownVt(vt) => {
                    // The miss goes in the report even though it is fatal.
                    let message = format!("Could not convert {vt} to line");
                    reports.record_unresolved(&message)?;
                    Err(SplitGenError::NotFound(message))
                }
            }
        } else {
            Ok(raw.to_uppercase())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::lines::{LineRecord, LineVariant, SplitHalf, StockRecord};
    use std::collections::HashMap;

    struct FakeServices {
        split: HashMap<String, Vec<LineVariant>>,
        translations: HashMap<String, String>,
    }

    impl FakeServices {
        fn new(entries: &[(&str, &[(&str, SplitHalf)])]) -> Self {
            let mut split = HashMap::new();
            for (fragment, variants) in entries {
                split.insert(
                    fragment.to_string(),
                    variants
                        .iter()
                        .map(|(line, half)| LineVariant::new(line, *half, "GAL4"))
                        .collect(),
                );
            }
            Self {
                split,
                translations: HashMap::new(),
            }
        }
    }

    impl LineService for FakeServices {
        fn split_halves(&self) -> Result<HashMap<String, Vec<LineVariant>>> {
            Ok(self.split.clone())
        }

        fn lines_matching(&self, _pattern: &str, _names_only: bool) -> Result<Vec<LineRecord>> {
            Ok(vec![])
        }

        fn translate_vt(&self, vt: &str) -> Result<Option<String>> {
            Ok(self.translations.get(vt).cloned())
        }
    }

    impl StockService for FakeServices {
        fn line_data(&self, _line: &str) -> Result<StockRecord> {
            Ok(StockRecord::default())
        }
    }

    fn run_with(
        services: &FakeServices,
        options: &RunOptions,
    ) -> (Result<Summary>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut scores = ScoreTable::default();
        let mut resolver = FragmentResolver::new(services, HashMap::new());
        let mut reports = ReportSet::create(dir.path(), "test", "n").unwrap();
        let summary = Driver::new(services, services).run(
            options,
            &mut scores,
            &mut resolver,
            &mut reports,
        );
        reports.close().unwrap();
        (summary, dir)
    }

    fn three_fragment_services() -> FakeServices {
        FakeServices::new(&[
            (
                "BJD_112C03",
                &[
                    ("BJD_112C03_AE_01", SplitHalf::Ad),
                    ("BJD_112C03_BB_21", SplitHalf::Dbd),
                ][..],
            ),
            ("BJD_113D04", &[("BJD_113D04_CC_05", SplitHalf::Dbd)][..]),
            ("BJD_114E05", &[("BJD_114E05_DD_07", SplitHalf::Ad)][..]),
        ])
    }

    #[test]
    fn pair_counts_without_a_line_filter() {
        let services = three_fragment_services();
        let options = RunOptions {
            input: vec!["112C03".into(), "113D04".into(), "114E05".into()],
            ..Default::default()
        };
        let (summary, dir) = run_with(&services, &options);
        let summary = summary.unwrap();
        assert_eq!(summary.read, 3);
        assert_eq!(summary.eligible, 3);
        assert_eq!(summary.theoretical, 3);
        // 112C03 crosses both others; the DBD-only x AD-only pair also works.
        assert_eq!(summary.found, 3);
        assert!(!dir.path().join("test.no_crosses.txt").exists());
    }

    #[test]
    fn duplicates_are_skipped_and_not_counted() {
        let services = three_fragment_services();
        let options = RunOptions {
            input: vec![
                "112C03".into(),
                "BJD_112C03_BB_21".into(), // same fragment, different spelling
                "113D04".into(),
            ],
            ..Default::default()
        };
        let (summary, _dir) = run_with(&services, &options);
        let summary = summary.unwrap();
        assert_eq!(summary.read, 2);
        assert_eq!(summary.eligible, 2);
        assert_eq!(summary.theoretical, 1);
    }

    #[test]
    fn a_line_filter_reduces_theoretical_to_n_minus_one() {
        let services = three_fragment_services();
        let options = RunOptions {
            input: vec!["113D04".into(), "114E05".into()],
            a_line: Some("112C03".into()),
            ..Default::default()
        };
        let (summary, _dir) = run_with(&services, &options);
        let summary = summary.unwrap();
        assert_eq!(summary.eligible, 3);
        assert_eq!(summary.theoretical, 2);
        // The 113D04 x 114E05 pair is filtered out, not counted as missing.
        assert_eq!(summary.found, 2);
    }

    #[test]
    fn unresolved_a_line_is_fatal() {
        let services = three_fragment_services();
        let options = RunOptions {
            input: vec!["113D04".into()],
            a_line: Some("47A08".into()),
            ..Default::default()
        };
        let (summary, _dir) = run_with(&services, &options);
        assert!(matches!(summary, Err(SplitGenError::NotFound(_))));
    }

    #[test]
    fn unknown_vt_a_line_is_fatal_and_recorded() {
        let services = three_fragment_services();
        let options = RunOptions {
            input: vec!["113D04".into()],
            a_line: Some("VT999999".into()),
            ..Default::default()
        };
        let (summary, dir) = run_with(&services, &options);
        assert!(matches!(summary, Err(SplitGenError::NotFound(_))));
        let text =
            std::fs::read_to_string(dir.path().join("test.no_crosses.txt")).unwrap();
        assert_eq!(text, "Could not convert VT999999 to line\n");
    }

    #[test]
    fn no_resolvable_fragments_is_fatal_not_a_panic() {
        let services = FakeServices::new(&[]);
        let options = RunOptions {
            input: vec!["47A08".into(), "113D04".into()],
            ..Default::default()
        };
        let (summary, _dir) = run_with(&services, &options);
        match summary {
            Err(SplitGenError::NotFound(msg)) => {
                assert_eq!(msg, "No theoretical crosses found");
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn zero_theoretical_crosses_is_fatal() {
        let services = three_fragment_services();
        let options = RunOptions {
            input: vec!["112C03".into()],
            ..Default::default()
        };
        let (summary, _dir) = run_with(&services, &options);
        assert!(matches!(summary, Err(SplitGenError::NotFound(_))));
    }

    #[test]
    fn missing_halves_land_in_the_not_found_report() {
        let services = FakeServices::new(&[
            ("BJD_113D04", &[("BJD_113D04_CC_05", SplitHalf::Dbd)][..]),
            ("BJD_115F06", &[("BJD_115F06_EE_09", SplitHalf::Dbd)][..]),
        ]);
        let options = RunOptions {
            input: vec!["113D04".into(), "115F06".into()],
            ..Default::default()
        };
        let (summary, dir) = run_with(&services, &options);
        assert_eq!(summary.unwrap().found, 0);
        let text =
            std::fs::read_to_string(dir.path().join("test.no_crosses.txt")).unwrap();
        assert_eq!(text, "Missing AD for BJD_113D04-x-BJD_115F06\n");
    }

    #[test]
    fn unknown_vt_input_is_recorded_and_skipped() {
        let services = three_fragment_services();
        let options = RunOptions {
            input: vec!["VT000123".into(), "112C03".into(), "113D04".into()],
            ..Default::default()
        };
        let (summary, dir) = run_with(&services, &options);
        let summary = summary.unwrap();
        assert_eq!(summary.read, 3);
        assert_eq!(summary.eligible, 2);
        let text =
            std::fs::read_to_string(dir.path().join("test.no_crosses.txt")).unwrap();
        assert!(text.contains("Could not convert VT000123 to line"));
    }

    #[test]
    fn all_combinations_mode_counts_pairs_once() {
        let services = FakeServices::new(&[
            (
                "BJD_112C03",
                &[
                    ("BJD_112C03_AE_01", SplitHalf::Ad),
                    ("BJD_112C03_BB_21", SplitHalf::Ad),
                ][..],
            ),
            ("BJD_113D04", &[("BJD_113D04_CC_05", SplitHalf::Dbd)][..]),
        ]);
        let options = RunOptions {
            input: vec!["112C03".into(), "113D04".into()],
            all_combinations: true,
            ..Default::default()
        };
        let (summary, dir) = run_with(&services, &options);
        assert_eq!(summary.unwrap().found, 1);
        let crosses =
            std::fs::read_to_string(dir.path().join("test.crosses.txt")).unwrap();
        assert_eq!(crosses.lines().count(), 2);
    }
}
