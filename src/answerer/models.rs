use serde::{Deserialize, Serialize};

use crate::answerer::AnswerError;
use crate::db::models::Citations;

#[derive(Debug, Clone, Serialize)]
pub struct AnswerRequest<'a> {
    pub query: &'a str,
}

/// Upstream payload as received; every field may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAnswer {
    pub query: Option<String>,
    pub answer: Option<String>,
    #[serde(flatten)]
    pub citations: Citations,
}

/// Answer text plus its citation collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerBundle {
    pub query: String,
    pub answer: String,
    #[serde(flatten)]
    pub citations: Citations,
}

impl RawAnswer {
    /// An answer-less payload is invalid; everything else is filled in.
    pub fn into_bundle(self, submitted_query: &str) -> Result<AnswerBundle, AnswerError> {
        let answer = match self.answer {
            Some(a) if !a.trim().is_empty() => a,
            _ => return Err(AnswerError::InvalidResponse("missing answer".to_string())),
        };
        let query = match self.query {
            Some(q) if !q.is_empty() => q,
            _ => submitted_query.to_string(),
        };
        Ok(AnswerBundle {
            query,
            answer,
            citations: self.citations,
        })
    }
}
