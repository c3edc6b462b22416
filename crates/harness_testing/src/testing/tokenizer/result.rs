use crate::testing::tokenizer::fixture::SubTest;
use serde_json::Value;

/// Outcome of a single sub-test
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The tokenizer emitted exactly the expected tokens
    Success,
    /// The tokenizer emitted tokens, but they differ from the expected tokens
    Mismatch,
    /// The tokenizer did not finish within the timeout and was killed
    TimedOut,
    /// The tokenizer could not be started, exited abnormally or produced unreadable output
    RunError(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    /// Verdict as printed after each sub-test
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Success => "Success",
            Outcome::Mismatch => "Fail",
            Outcome::TimedOut => "Fail (Timed out)",
            Outcome::RunError(_) => "Fail (Exception)",
        }
    }
}

/// Compares the token arrays position by position. Tokens are only equal when every field is.
pub fn compare(actual: &[Value], expected: &[Value]) -> Outcome {
    if actual == expected {
        Outcome::Success
    } else {
        Outcome::Mismatch
    }
}

/// Everything known about a sub-test after it ran
#[derive(Debug, Clone, PartialEq)]
pub struct TestResult {
    pub subtest: SubTest,
    pub outcome: Outcome,
    /// Expected tokens after normalization
    pub expected: Vec<Value>,
    /// Decoded tokenizer output, when it could be decoded
    pub actual: Option<Vec<Value>>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl TestResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn equal_token_arrays() {
        let tokens = vec![json!(["Character", "&amp"])];
        assert_eq!(compare(&tokens, &tokens.clone()), Outcome::Success);
        assert_eq!(compare(&[], &[]), Outcome::Success);
    }

    #[test]
    fn split_tokens_do_not_match() {
        let expected = vec![json!(["Character", "&amp"])];
        let actual = vec![json!(["Character", "&"]), json!(["Character", "amp"])];

        assert_eq!(compare(&actual, &expected), Outcome::Mismatch);
    }

    #[test]
    fn order_matters() {
        let a = vec![json!(["StartTag", "a", {}]), json!(["EndTag", "a"])];
        let b = vec![json!(["EndTag", "a"]), json!(["StartTag", "a", {}])];

        assert_eq!(compare(&a, &b), Outcome::Mismatch);
        assert_eq!(compare(&a[..1], &a), Outcome::Mismatch);
    }

    #[test]
    fn field_values_matter() {
        let expected = vec![json!(["StartTag", "a", {"href": "x"}, true])];
        let actual = vec![json!(["StartTag", "a", {"href": "x"}])];
        assert_eq!(compare(&actual, &expected), Outcome::Mismatch);

        // Attribute order inside a token is not significant
        let expected = vec![json!(["StartTag", "a", {"x": "1", "y": "2"}])];
        let actual = vec![json!(["StartTag", "a", {"y": "2", "x": "1"}])];
        assert_eq!(compare(&actual, &expected), Outcome::Success);
    }

    #[test]
    fn labels() {
        assert_eq!(Outcome::Success.label(), "Success");
        assert_eq!(Outcome::Mismatch.label(), "Fail");
        assert_eq!(Outcome::TimedOut.label(), "Fail (Timed out)");
        assert_eq!(Outcome::RunError("boom".into()).label(), "Fail (Exception)");
        assert!(!Outcome::TimedOut.is_success());
    }
}
