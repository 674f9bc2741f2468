use serde::{Deserialize, Serialize};

/// Table holding submissions and their vote counts
pub const SUBMISSIONS_TABLE: &str = "submissions";

/// One persisted competition entry; immutable once written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    /// Author name, also the key votes are cast against
    pub user: String,
    /// Full source text as held by the editor at submit time
    pub code: String,
    pub video_url: String,
}

/// Gallery projection of a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRow {
    pub user: String,
    pub video_url: String,
    #[serde(default)]
    pub vote: i64,
}

/// Row as held by a record store: the record plus its vote counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSubmission {
    #[serde(flatten)]
    pub record: SubmissionRecord,
    #[serde(default)]
    pub vote: i64,
}

impl StoredSubmission {
    pub fn new(record: SubmissionRecord) -> Self {
        Self { record, vote: 0 }
    }

    /// `select user, video_url, vote`
    pub fn row(&self) -> SubmissionRow {
        SubmissionRow {
            user: self.record.user.clone(),
            video_url: self.record.video_url.clone(),
            vote: self.vote,
        }
    }
}

/// Encoded capture ready for upload
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    /// File extension without the dot
    pub extension: &'static str,
    pub frames: u32,
    pub width: u32,
    pub height: u32,
}

impl Clip {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_wire_names() {
        let record = SubmissionRecord {
            user: "ada".into(),
            code: "class A {}".into(),
            video_url: "https://cdn/x.mjpeg".into(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["user"], "ada");
        assert_eq!(json["code"], "class A {}");
        assert_eq!(json["video_url"], "https://cdn/x.mjpeg");
    }

    #[test]
    fn test_row_vote_defaults_to_zero() {
        let row: SubmissionRow = serde_json::from_str(r#"{"user":"a","video_url":"v"}"#).unwrap();
        assert_eq!(row.vote, 0);
    }

    #[test]
    fn test_stored_submission_is_flat() {
        let stored = StoredSubmission {
            record: SubmissionRecord {
                user: "bo".into(),
                code: "x".into(),
                video_url: "v".into(),
            },
            vote: 4,
        };
        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["user"], "bo");
        assert_eq!(json["vote"], 4);
        assert_eq!(stored.row().vote, 4);
    }
}
