//! YAML loading with located diagnostics

pub mod diagnostics;

pub use diagnostics::{YamlError, YamlSyntaxError};

use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Parse `source` into `T`; `filename` labels the diagnostic
pub fn parse_yaml_str<T: DeserializeOwned>(source: &str, filename: &str) -> Result<T, YamlError> {
    serde_yml::from_str(source)
        .map_err(|e| YamlSyntaxError::from_serde_error(&e, source, filename).into())
}

/// Read and parse a YAML file
pub fn parse_yaml_file<T: DeserializeOwned>(path: &Path) -> Result<T, YamlError> {
    let source = fs::read_to_string(path).map_err(|source| YamlError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_yaml_str(&source, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::registration::BookingDraft;

    #[test]
    fn test_parse_draft() {
        let draft: BookingDraft = parse_yaml_str(
            "activity: Safari\ndate: 2026-10-20\ntime: \"10:00\"\nparticipants:\n  - name: Ana\n    dni: 30123456\n    age: 34\n",
            "draft.yaml",
        )
        .unwrap();
        assert_eq!(draft.activity.as_deref(), Some("Safari"));
        assert_eq!(draft.participants[0].dni, "30123456");
        assert_eq!(draft.participants[0].age, "34");
    }

    #[test]
    fn test_bad_time_is_located() {
        let yaml = "activity: Safari\ntime: \"25:99\"\n";
        let err = parse_yaml_str::<BookingDraft>(yaml, "draft.yaml").unwrap_err();
        match err {
            YamlError::Syntax(e) => assert!(e.message().contains("25:99")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let err =
            parse_yaml_file::<BookingDraft>(Path::new("/nonexistent/draft.yaml")).unwrap_err();
        assert!(matches!(err, YamlError::Io { .. }));
    }
}
