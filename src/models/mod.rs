// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod company;
pub mod raw_match;

pub use company::{CompanyMetadata, CompanyRecord, NOT_AVAILABLE};
pub use raw_match::RawMatch;
