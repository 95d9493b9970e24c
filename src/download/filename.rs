//! Local filename derivation for downloaded documents.
//!
//! Names are a pure function of the input string: the same suggested name or
//! URL always maps to the same file, which is what lets a re-run find files
//! written by an earlier run.

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};
use url::Url;

/// Extension appended to every derived filename.
pub const PDF_EXTENSION: &str = ".pdf";

/// Stems longer than this are truncated and suffixed with a digest.
const MAX_STEM_LEN: usize = 120;

/// Hex characters of the digest used as a fallback name.
const FALLBACK_DIGEST_LEN: usize = 32;

/// Hex characters of the digest appended to truncated stems.
const TRUNCATION_DIGEST_LEN: usize = 8;

/// Appended to stems that Windows reserves as device names.
const RESERVED_STEM_SUFFIX: &str = "_file";

#[allow(clippy::expect_used)]
static NON_ALNUM_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("separator regex is valid")); // Static pattern, safe to panic

/// Derives the local filename for a download.
///
/// The suggested name is normalized first. When it normalizes to nothing, the
/// last segment of the URL path is tried, and failing that the SHA-256 of the
/// URL is used. The result always matches `[a-z0-9_]+\.pdf`.
///
/// # Examples
///
/// ```
/// use docharvest_core::download::local_filename;
///
/// assert_eq!(
///     local_filename("https://example.com/x", "Safety Data Sheet (EN).PDF"),
///     "safety_data_sheet_en.pdf"
/// );
/// ```
#[must_use]
pub fn local_filename(url: &str, suggested_name: &str) -> String {
    if let Some(name) = normalize_name(suggested_name) {
        return name;
    }
    if let Some(name) = url_last_segment(url).and_then(|segment| normalize_name(&segment)) {
        return name;
    }
    let digest = hex_digest(url);
    format!("{}{PDF_EXTENSION}", &digest[..FALLBACK_DIGEST_LEN])
}

/// Normalizes a name into a filesystem-safe `.pdf` filename.
///
/// Lower-cases, keeps only the last path segment, drops a `.pdf` extension,
/// collapses every run of characters outside `[a-z0-9]` into `_`, trims
/// separators and trailing `_pdf` artifacts, then appends `.pdf`. Device
/// names such as `con` or `lpt1` get a `_file` suffix so the result can be
/// created on Windows too. Returns `None` when nothing usable remains.
#[must_use]
pub fn normalize_name(name: &str) -> Option<String> {
    let lowered = name.trim().to_lowercase();
    let last_segment = lowered
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(lowered.as_str());
    let without_ext = last_segment
        .strip_suffix(PDF_EXTENSION)
        .unwrap_or(last_segment);

    let replaced = NON_ALNUM_RUN.replace_all(without_ext, "_");
    let mut stem = replaced.trim_matches('_');
    while let Some(rest) = stem.strip_suffix("_pdf") {
        stem = rest.trim_end_matches('_');
    }
    if stem.is_empty() {
        return None;
    }

    if stem.len() > MAX_STEM_LEN {
        let digest = hex_digest(name);
        let truncated = stem[..MAX_STEM_LEN].trim_end_matches('_');
        return Some(format!(
            "{truncated}_{}{PDF_EXTENSION}",
            &digest[..TRUNCATION_DIGEST_LEN]
        ));
    }

    if is_reserved_device_name(stem) {
        return Some(format!("{stem}{RESERVED_STEM_SUFFIX}{PDF_EXTENSION}"));
    }

    Some(format!("{stem}{PDF_EXTENSION}"))
}

fn is_reserved_device_name(stem: &str) -> bool {
    match stem {
        "con" | "prn" | "aux" | "nul" => true,
        _ => ["com", "lpt"].iter().any(|prefix| {
            stem.strip_prefix(prefix).is_some_and(|digit| {
                digit.len() == 1 && digit.bytes().all(|b| (b'1'..=b'9').contains(&b))
            })
        }),
    }
}

fn url_last_segment(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let last = parsed.path_segments()?.next_back()?;
    if last.is_empty() {
        return None;
    }
    let decoded = urlencoding::decode(last).map_or_else(|_| last.to_string(), |d| d.into_owned());
    Some(decoded)
}

fn hex_digest(input: &str) -> String {
    Sha256::digest(input.as_bytes())
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name_basic() {
        assert_eq!(
            normalize_name("Product Info Sheet.pdf").unwrap(),
            "product_info_sheet.pdf"
        );
    }

    #[test]
    fn test_normalize_name_strips_path_to_last_segment() {
        assert_eq!(
            normalize_name("docs/2024/Data-Sheet.pdf").unwrap(),
            "data_sheet.pdf"
        );
        assert_eq!(normalize_name(r"C:\tmp\Report.PDF").unwrap(), "report.pdf");
    }

    #[test]
    fn test_normalize_name_removes_duplicate_extension_artifacts() {
        assert_eq!(normalize_name("manual.pdf.pdf").unwrap(), "manual.pdf");
        assert_eq!(normalize_name("manual_pdf").unwrap(), "manual.pdf");
        assert_eq!(normalize_name("manual (pdf).pdf").unwrap(), "manual.pdf");
    }

    #[test]
    fn test_normalize_name_collapses_separators() {
        assert_eq!(
            normalize_name("--Ächtung!!  v2..final--").unwrap(),
            "chtung_v2_final.pdf"
        );
    }

    #[test]
    fn test_normalize_name_rejects_empty_result() {
        assert!(normalize_name("").is_none());
        assert!(normalize_name("   ").is_none());
        assert!(normalize_name("!!!.pdf").is_none());
        assert!(normalize_name(".pdf").is_none());
    }

    #[test]
    fn test_normalize_name_avoids_reserved_device_names() {
        assert_eq!(normalize_name("con.pdf").unwrap(), "con_file.pdf");
        assert_eq!(normalize_name("NUL").unwrap(), "nul_file.pdf");
        assert_eq!(normalize_name("Aux (pdf).pdf").unwrap(), "aux_file.pdf");
        assert_eq!(normalize_name("COM1.PDF").unwrap(), "com1_file.pdf");
        assert_eq!(normalize_name("lpt9").unwrap(), "lpt9_file.pdf");

        assert_eq!(normalize_name("console.pdf").unwrap(), "console.pdf");
        assert_eq!(normalize_name("com0").unwrap(), "com0.pdf");
        assert_eq!(normalize_name("com10").unwrap(), "com10.pdf");
        assert_eq!(normalize_name("prn_manual").unwrap(), "prn_manual.pdf");
    }

    #[test]
    fn test_local_filename_never_yields_device_name() {
        assert_eq!(local_filename("https://host/files/nul.pdf", ""), "nul_file.pdf");
    }

    #[test]
    fn test_normalize_name_truncates_long_stems_with_digest() {
        let long = "a".repeat(400);
        let name = normalize_name(&long).unwrap();
        assert!(name.len() <= MAX_STEM_LEN + 1 + TRUNCATION_DIGEST_LEN + PDF_EXTENSION.len());
        assert!(name.ends_with(PDF_EXTENSION));

        let other = format!("{}b", "a".repeat(399));
        assert_ne!(name, normalize_name(&other).unwrap());
    }

    #[test]
    fn test_local_filename_is_stable() {
        let first = local_filename("https://host/doc?id=7", "Spec Sheet.pdf");
        let second = local_filename("https://host/doc?id=7", "Spec Sheet.pdf");
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn test_local_filename_falls_back_to_url_segment() {
        assert_eq!(
            local_filename("https://host/files/Safety%20Sheet.pdf", ""),
            "safety_sheet.pdf"
        );
    }

    #[test]
    fn test_local_filename_falls_back_to_digest() {
        let name = local_filename("https://host/", "");
        assert_eq!(name.len(), FALLBACK_DIGEST_LEN + PDF_EXTENSION.len());
        assert!(name.ends_with(".pdf"));
        assert!(name[..FALLBACK_DIGEST_LEN].chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(name, local_filename("https://other/", ""));
    }

    #[test]
    fn test_local_filename_character_set_is_safe() {
        let name = local_filename("https://h/x", "../../etc/passwd: <bad> |name|");
        assert!(
            name.chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '.'),
            "unsafe characters in {name}"
        );
        assert!(!name.contains(".."));
    }
}
