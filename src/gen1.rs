// Gen1 naming conventions: pattern checks and name surgery shared by the
// resolver, scorer, and cross generator.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Full Gen1 line, e.g. "BJD_112C03_BB_21"
    static ref GEN1_LINE: Regex =
        Regex::new(r"(?i)^((BJD|GMR)_)*[0-9]+[A-H][0-9]{2}_[A-Z]{2}_[0-9]{2}$").unwrap();
    // Bare Gen1 fragment, e.g. "112C03" or "GMR_12C03"
    static ref GEN1_FRAGMENT: Regex =
        Regex::new(r"(?i)^((BJD|GMR)_)*[0-9]+[A-H][0-9]{2}$").unwrap();
    static ref WELL_SUFFIX: Regex = Regex::new(r"_[A-Z][A-Z]_[0-9][0-9]").unwrap();
    static ref LEADING_NUMBER: Regex = Regex::new(r"[0-9]+").unwrap();
}

/// A numeric term, with or without a "VT" prefix, is a VT identifier.
pub fn is_vt(term: &str) -> bool {
    if term.to_uppercase().starts_with("VT") {
        return true;
    }
    !term.is_empty() && term.chars().all(|c| c.is_ascii_digit())
}

pub fn is_gen1(line: &str) -> bool {
    GEN1_LINE.is_match(line)
}

pub fn is_gen1_fragment(line: &str) -> bool {
    GEN1_FRAGMENT.is_match(line)
}

/// Canonical cache key for a VT identifier: strip any "VT" prefix and
/// left-pad the number to six digits.
pub fn canonical_vt(term: &str) -> String {
    let digits = term.to_uppercase().replace("VT", "");
    format!("VT{digits:0>6}")
}

/// Reduce a Gen1 line or fragment to its bare plate/well fragment:
/// drop a BJD_/GMR_ prefix, then truncate at the first underscore.
pub fn convert_gen1(term: &str) -> String {
    let upper = term.to_uppercase();
    let bare = if upper.starts_with("BJD_") || upper.starts_with("GMR_") {
        upper.split('_').nth(1).unwrap_or_default().to_string()
    } else {
        upper
    };
    match bare.find('_') {
        Some(pos) => bare[..pos].to_string(),
        None => bare,
    }
}

/// Strip the plate/well suffix ("_BB_21") from a full line name to get the
/// canonical fragment key.
pub fn strip_well_suffix(name: &str) -> String {
    WELL_SUFFIX.replace_all(name, "").to_string()
}

/// The landing site is the final underscore-delimited token of a line name.
/// An AD and a DBD at the same site cannot be combined.
pub fn landing_site(line: &str) -> &str {
    line.rsplit('_').next().unwrap_or(line)
}

/// Scoring suffix: the last two underscore-joined tokens ("BB_21").
pub fn score_suffix(line: &str) -> String {
    let mut tail = line.rsplitn(3, '_');
    let last = tail.next().unwrap_or("");
    match tail.next() {
        Some(prev) => format!("{prev}_{last}"),
        None => last.to_string(),
    }
}

/// Leading digit block of a fragment, used to pick the GMR/BJD collection.
pub fn leading_number(fragment: &str) -> Option<u32> {
    LEADING_NUMBER
        .find(fragment)
        .and_then(|m| m.as_str().parse().ok())
}
