//! Property-based and statistical tests

mod document_proptest;
#[cfg(feature = "ssr")]
mod picker_stats;
