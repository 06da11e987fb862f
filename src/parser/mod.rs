// file: src/parser/mod.rs
// description: result parsing module exports
// reference: internal module structure

mod normalizer;

pub use normalizer::ResultNormalizer;
