// file: src/parser/normalizer.rs
// description: Maps raw index matches onto display-ready company records
// reference: https://docs.rs/serde_json

use crate::models::{CompanyMetadata, CompanyRecord, RawMatch};
use tracing::debug;

/// Pure transformation: no I/O, input order is preserved and never re-sorted.
pub struct ResultNormalizer;

impl ResultNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, matches: &[RawMatch]) -> Vec<CompanyRecord> {
        let records: Vec<CompanyRecord> = matches
            .iter()
            .filter_map(|raw| self.normalize_match(raw))
            .collect();

        debug!(
            "Normalized {} of {} matches",
            records.len(),
            matches.len()
        );

        records
    }

    fn normalize_match(&self, raw: &RawMatch) -> Option<CompanyRecord> {
        if !raw.has_metadata() {
            debug!("Dropping match {} without metadata", raw.id);
            return None;
        }

        let metadata = CompanyMetadata::from_map(raw.metadata.as_ref()?);
        Some(CompanyRecord::from_metadata(metadata, raw.score))
    }
}

impl Default for ResultNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
