//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod socket_guard;

use std::path::Path;

/// Builds a results page body in the upstream shape, one result per item.
pub fn page_json(entries: &[(&str, &str)]) -> String {
    let results: Vec<String> = entries
        .iter()
        .map(|(url, name)| {
            format!(r#"{{"variants":[{{"downloadUrl":"{url}","fileName":"{name}"}}]}}"#)
        })
        .collect();
    format!(r#"{{"results":[{}]}}"#, results.join(","))
}

/// Writes page `index` into `cache_dir` so the run never asks the network for it.
pub fn seed_page_cache(cache_dir: &Path, index: u32, body: &str) {
    std::fs::create_dir_all(cache_dir).unwrap();
    std::fs::write(cache_dir.join(format!("results_{index}.json")), body).unwrap();
}

/// Ledger lines as written on disk.
pub fn ledger_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}
