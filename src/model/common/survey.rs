use mongodb::bson::{to_bson, Bson};
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// How many answers a respondent may choose for a question.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    /// Exactly one answer.
    Single,
    /// One or more answers.
    Multiple,
}

impl From<QuestionType> for Bson {
    fn from(kind: QuestionType) -> Self {
        to_bson(&kind).expect("Serialisation is infallible")
    }
}

/// One chosen (question, answer) pair within a submission, before it is persisted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserAnswerSelection {
    pub question_id: Id,
    pub answer_id: Id,
}

impl UserAnswerSelection {
    pub fn new(question_id: Id, answer_id: Id) -> Self {
        Self {
            question_id,
            answer_id,
        }
    }
}
