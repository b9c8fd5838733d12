use serde::{Deserialize, Serialize};

/// Seed message for a Gitweb server crawl.
///
/// Published to the project exchange with routing key `crawler.gitweb`.
/// The crawler stage expands this into one download message per repository
/// it discovers on the page.
///
/// Unknown fields are a decode error: each routing key has exactly one
/// payload shape, and a mismatch means the message was routed wrongly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GitwebMessage {
    /// Project name the crawl belongs to, e.g. `TYPO3`.
    pub project: String,

    /// URL of the Gitweb index page to crawl.
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_camel_case_wire_format() {
        let json = r#"{"project":"TYPO3","url":"https://git.example.org/gitweb"}"#;
        let msg: GitwebMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.project, "TYPO3");
        assert_eq!(serde_json::to_string(&msg).unwrap(), json);
    }

    #[test]
    fn unknown_fields_are_a_decode_error() {
        let json = r#"{"project":"TYPO3","url":"x","extra":1}"#;
        assert!(serde_json::from_str::<GitwebMessage>(json).is_err());
    }
}
