use harness_shared::types::{Error, Result};
use log::debug;
use serde_derive::Deserialize;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Top level object of a tokenizer fixture file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Root {
    pub tests: Vec<Test>,
}

/// Parse error the fixture expects the tokenizer to report
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedError {
    pub code: String,
    #[serde(default)]
    pub line: i64,
    #[serde(default)]
    pub col: i64,
}

/// A single test case as found in a fixture file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Test {
    #[serde(default)]
    pub description: String,
    pub input: String,
    /// Expected tokens. Each token is kept verbatim, the harness only compares whole tokens.
    pub output: Vec<Value>,
    #[serde(default)]
    pub errors: Vec<ExpectedError>,
    #[serde(default)]
    pub double_escaped: bool,
    pub initial_states: Option<Vec<String>>,
    pub last_start_tag: Option<String>,
}

/// One execution of the tokenizer: a test case started in a single entry state
#[derive(Debug, Clone, PartialEq)]
pub struct SubTest {
    /// Description of the test, suffixed with the state when the test declares multiple states
    pub description: String,
    pub input: String,
    pub expected_output: Vec<Value>,
    pub state: String,
    pub last_start_tag: Option<String>,
    pub double_escaped: bool,
    pub errors: Vec<ExpectedError>,
}

impl Test {
    /// Returns true when the test should run for the given case-name filter
    pub fn matches_filter(&self, filter: Option<&str>) -> bool {
        filter.map_or(true, |filter| self.description.contains(filter))
    }

    /// Expands the test into one sub-test per initial state. Tests without (or with an empty list
    /// of) initial states run once in the default state.
    pub fn subtests(&self, default_state: &str) -> Vec<SubTest> {
        let states = match &self.initial_states {
            Some(states) if !states.is_empty() => states.clone(),
            _ => vec![default_state.to_string()],
        };

        let multiple = states.len() > 1;
        states
            .into_iter()
            .map(|state| SubTest {
                description: if multiple {
                    format!("{}({})", self.description, state)
                } else {
                    self.description.clone()
                },
                input: self.input.clone(),
                expected_output: self.output.clone(),
                last_start_tag: self.last_start_tag.clone(),
                double_escaped: self.double_escaped,
                errors: self.errors.clone(),
                state,
            })
            .collect()
    }
}

/// Holds all tests as found in the given fixture file
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureFile {
    /// All the tests extracted from this fixture file
    pub tests: Vec<Test>,
    /// Path to the fixture file
    pub path: String,
}

impl FixtureFile {
    /// Returns the sub-tests of every test that passes the filter, in test order and then state
    /// order.
    pub fn subtests(&self, filter: Option<&str>, default_state: &str) -> Vec<SubTest> {
        self.tests
            .iter()
            .filter(|test| test.matches_filter(filter))
            .flat_map(|test| test.subtests(default_state))
            .collect()
    }
}

/// Reads a given fixture file. Anything that is not a well-formed fixture results in
/// `Error::MalformedFixture`; only failing to read the file at all is reported as `Error::IO`.
pub fn read_fixture_from_path(path: impl AsRef<Path>) -> std::result::Result<FixtureFile, Error> {
    let display = path.as_ref().to_string_lossy().into_owned();

    let contents = fs::read_to_string(&path).map_err(|err| match err.kind() {
        ErrorKind::InvalidData => Error::MalformedFixture {
            path: display.clone(),
            reason: err.to_string(),
        },
        _ => Error::IO(err),
    })?;

    let root: Root = serde_json::from_str(&contents).map_err(|err| Error::MalformedFixture {
        path: display.clone(),
        reason: err.to_string(),
    })?;

    Ok(FixtureFile {
        tests: root.tests,
        path: display,
    })
}

/// Returns true when the file at 'path' has the fixture extension and is not excluded
fn use_fixture(path: &Path, extension: &str, excluded: &[String]) -> bool {
    if path.extension().map_or(true, |ext| ext != extension) {
        return false;
    }

    let Some(filename) = path.file_name().map(|name| name.to_string_lossy()) else {
        return false;
    };

    !excluded.iter().any(|pattern| filename.ends_with(pattern.as_str()))
}

/// Returns the fixture files found directly in `root`, sorted by file name. When `root` is a
/// file it is returned as the only fixture.
pub fn fixture_paths(root: &Path, extension: &str, excluded: &[String]) -> Result<Vec<PathBuf>> {
    if fs::metadata(root)?.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        if use_fixture(entry.path(), extension, excluded) {
            paths.push(entry.into_path());
        } else {
            debug!("skipping {}", entry.path().display());
        }
    }

    Ok(paths)
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn parse(json: &str) -> Test {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn optional_fields() {
        let test = parse(r#"{"description": "A", "input": "&amp", "output": [["Character", "&amp"]]}"#);

        assert_eq!(test.description, "A");
        assert_eq!(test.output, vec![json!(["Character", "&amp"])]);
        assert_eq!(test.initial_states, None);
        assert_eq!(test.last_start_tag, None);
        assert!(!test.double_escaped);
        assert!(test.errors.is_empty());

        let test = parse(
            r#"{"description": "B", "input": "x", "output": [],
                "initialStates": ["RCDATA state"], "lastStartTag": "xmp", "doubleEscaped": true,
                "errors": [{"code": "eof-in-tag", "line": 1, "col": 2}]}"#,
        );
        assert_eq!(test.initial_states, Some(vec!["RCDATA state".to_string()]));
        assert_eq!(test.last_start_tag.as_deref(), Some("xmp"));
        assert!(test.double_escaped);
        assert_eq!(test.errors[0].code, "eof-in-tag");
    }

    #[test]
    fn required_fields() {
        assert!(serde_json::from_str::<Test>(r#"{"description": "A", "output": []}"#).is_err());
        assert!(serde_json::from_str::<Test>(r#"{"description": "A", "input": ""}"#).is_err());
        assert!(serde_json::from_str::<Test>(r#"{"input": "", "output": []}"#).is_ok());
    }

    #[test]
    fn default_state_expansion() {
        let test = parse(r#"{"description": "A", "input": "&amp", "output": [["Character", "&amp"]]}"#);
        let subtests = test.subtests("Data state");

        assert_eq!(subtests.len(), 1);
        assert_eq!(subtests[0].state, "Data state");
        assert_eq!(subtests[0].description, "A");
        assert_eq!(subtests[0].input, "&amp");
        assert_eq!(subtests[0].expected_output, test.output);
    }

    #[test]
    fn multiple_state_expansion() {
        let test = parse(
            r#"{"description": "A", "input": "<a>", "output": [["Character", "<a>"]],
                "initialStates": ["Data state", "RAWTEXT state", "RCDATA state"], "lastStartTag": "a"}"#,
        );
        let subtests = test.subtests("Data state");

        assert_eq!(subtests.len(), 3);
        let descriptions: Vec<_> = subtests.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(
            descriptions,
            vec!["A(Data state)", "A(RAWTEXT state)", "A(RCDATA state)"]
        );
        for subtest in &subtests {
            assert_eq!(subtest.input, "<a>");
            assert_eq!(subtest.expected_output, test.output);
            assert_eq!(subtest.last_start_tag.as_deref(), Some("a"));
        }
    }

    #[test]
    fn single_declared_state_has_no_suffix() {
        let test = parse(
            r#"{"description": "A", "input": "", "output": [], "initialStates": ["PLAINTEXT state"]}"#,
        );
        let subtests = test.subtests("Data state");

        assert_eq!(subtests.len(), 1);
        assert_eq!(subtests[0].description, "A");
        assert_eq!(subtests[0].state, "PLAINTEXT state");
    }

    #[test]
    fn empty_states_fall_back_to_default() {
        let test = parse(r#"{"description": "A", "input": "", "output": [], "initialStates": []}"#);
        let subtests = test.subtests("Data state");

        assert_eq!(subtests.len(), 1);
        assert_eq!(subtests[0].state, "Data state");
    }

    #[test]
    fn filter_applies_before_expansion() {
        let fixture = FixtureFile {
            path: "x.test".into(),
            tests: vec![
                parse(
                    r#"{"description": "Ampersand", "input": "&", "output": [],
                        "initialStates": ["Data state", "RCDATA state"]}"#,
                ),
                parse(r#"{"description": "Comment", "input": "<!---->", "output": []}"#),
            ],
        };

        assert_eq!(fixture.subtests(None, "Data state").len(), 3);
        assert_eq!(fixture.subtests(Some("Amper"), "Data state").len(), 2);
        assert_eq!(fixture.subtests(Some("Comment"), "Data state").len(), 1);
        assert!(fixture.subtests(Some("nothing"), "Data state").is_empty());
    }

    #[test]
    fn read_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("good.test");
        fs::write(
            &path,
            r#"{"tests": [{"description": "A", "input": "a", "output": [["Character", "a"]]}]}"#,
        )
        .unwrap();

        let fixture = read_fixture_from_path(&path).unwrap();
        assert_eq!(fixture.tests.len(), 1);
        assert_eq!(fixture.path, path.to_string_lossy());
    }

    #[test]
    fn malformed_fixtures() {
        let dir = tempfile::tempdir().unwrap();

        let cases: &[(&str, &[u8])] = &[
            ("not_json.test", &b"{ this is not json"[..]),
            ("no_tests.test", &br#"{"xmlViolationTests": []}"#[..]),
            ("no_input.test", &br#"{"tests": [{"description": "A", "output": []}]}"#[..]),
            ("no_output.test", &br#"{"tests": [{"description": "A", "input": "a"}]}"#[..]),
            ("not_utf8.test", &b"\xff\xfe\xfd"[..]),
        ];

        for (name, contents) in cases {
            let path = dir.path().join(name);
            fs::write(&path, contents).unwrap();

            let result = read_fixture_from_path(&path);
            assert!(
                matches!(result, Err(Error::MalformedFixture { .. })),
                "{name} should be malformed"
            );
        }
    }

    #[test]
    fn unreadable_fixture_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_fixture_from_path(dir.path().join("missing.test"));

        assert!(matches!(result, Err(Error::IO(_))));
    }

    #[test]
    fn discovers_fixtures_in_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "test2.test",
            "test1.test",
            "xmlViolation.test",
            "README.md",
            "entities.test",
        ] {
            fs::write(dir.path().join(name), "{}").unwrap();
        }
        fs::create_dir(dir.path().join("nested.test")).unwrap();

        let excluded = vec!["xmlViolation.test".to_string()];
        let paths = fixture_paths(dir.path(), "test", &excluded).unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["entities.test", "test1.test", "test2.test"]);
    }

    #[test]
    fn single_fixture_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("only.test");
        fs::write(&path, "{}").unwrap();

        let paths = fixture_paths(&path, "test", &[]).unwrap();
        assert_eq!(paths, vec![path]);
    }

    #[test]
    fn missing_fixture_root() {
        let dir = tempfile::tempdir().unwrap();
        assert!(fixture_paths(&dir.path().join("nope"), "test", &[]).is_err());
    }
}
