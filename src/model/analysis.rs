use serde::{Deserialize, Serialize};

/// Work item for the `analysis.filesize` stage.
///
/// The measured size is written back into the version record identified by
/// `version_id`, which is why the id is mandatory in the message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FilesizeMessage {
    /// Version record to store the measured size on.
    pub version_id: i64,

    /// Absolute path of the file to measure.
    pub filename: String,
}

/// Work item for the `analysis.pdepend` stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PDependMessage {
    /// Version record the analyzed sources belong to.
    pub version_id: i64,

    /// Absolute path of the source directory to analyze,
    /// e.g. `/srv/sources/typo3_6-2-0`.
    pub directory: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filesize_uses_camel_case_keys() {
        let json = r#"{"versionId":42,"filename":"/tmp/present.tgz"}"#;
        let msg: FilesizeMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.version_id, 42);
        assert_eq!(msg.filename, "/tmp/present.tgz");
    }

    #[test]
    fn filesize_missing_field_is_a_decode_error() {
        assert!(serde_json::from_str::<FilesizeMessage>(r#"{"versionId":42}"#).is_err());
    }

    #[test]
    fn pdepend_uses_camel_case_keys() {
        let json = r#"{"versionId":7,"directory":"/srv/sources/typo3_6-2-0"}"#;
        let msg: PDependMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.version_id, 7);
        assert_eq!(msg.directory, "/srv/sources/typo3_6-2-0");
    }
}
