//! Testing harness and utilities for checking a tokenizer against the html5lib test suite
pub mod tokenizer;
