//! Conformance harness for html5lib tokenizer tests. The tokenizer under test is an external
//! program; the harness feeds it every fixture case and compares the tokens it prints.
pub use harness_config as config;
pub use harness_shared::types;
pub use harness_testing::testing;
