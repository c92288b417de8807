use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::{
    common::survey::QuestionType,
    mongodb::{serde_optional_datetime, Id},
};

/// A possible answer to a question. This is an option to choose, not a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Unique ID.
    pub id: Id,
    /// Answer text.
    pub body: String,
}

/// A single question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Unique ID.
    pub id: Id,
    /// Question text.
    pub title: String,
    /// Whether one or several answers may be chosen.
    #[serde(rename = "type")]
    pub kind: QuestionType,
    /// The answers on offer.
    pub answers: Vec<Answer>,
}

impl Question {
    /// Get the answer with the given ID, if it belongs to this question.
    pub fn answer(&self, answer_id: Id) -> Option<&Answer> {
        self.answers.iter().find(|a| a.id == answer_id)
    }
}

/// Core survey data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyCore {
    /// Survey title.
    pub title: String,
    /// Optional longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Submissions are refused from this point onwards.
    #[serde(default, with = "serde_optional_datetime")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Creation time.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    /// Survey questions.
    pub questions: Vec<Question>,
}

impl SurveyCore {
    /// Get the question with the given ID, if it belongs to this survey.
    pub fn question(&self, question_id: Id) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    /// Has this survey expired as of `now`?
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(false, |expires_at| expires_at <= now)
    }
}

/// A survey without an ID.
pub type NewSurvey = SurveyCore;

/// A survey from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Survey {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub survey: SurveyCore,
}

impl Deref for Survey {
    type Target = SurveyCore;

    fn deref(&self) -> &Self::Target {
        &self.survey
    }
}

impl DerefMut for Survey {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.survey
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use chrono::{Duration, SubsecRound};

    use super::*;

    impl Answer {
        pub fn example(body: &str) -> Self {
            Self {
                id: Id::new(),
                body: body.to_string(),
            }
        }
    }

    impl Question {
        pub fn single_example() -> Self {
            Self {
                id: Id::new(),
                title: "Which language do you use most?".to_string(),
                kind: QuestionType::Single,
                answers: vec![Answer::example("Rust"), Answer::example("Go")],
            }
        }

        pub fn multiple_example() -> Self {
            Self {
                id: Id::new(),
                title: "Which editors have you used this year?".to_string(),
                kind: QuestionType::Multiple,
                answers: vec![
                    Answer::example("Vim"),
                    Answer::example("Emacs"),
                    Answer::example("VS Code"),
                ],
            }
        }
    }

    impl SurveyCore {
        pub fn open_example() -> Self {
            Self {
                title: "Developer survey".to_string(),
                description: Some("Tell us about your tools.".to_string()),
                expires_at: Some(Utc::now().trunc_subsecs(3) + Duration::days(30)),
                created_at: Utc::now().trunc_subsecs(3),
                questions: vec![Question::single_example(), Question::multiple_example()],
            }
        }

        pub fn expired_example() -> Self {
            Self {
                expires_at: Some(Utc::now().trunc_subsecs(3) - Duration::days(1)),
                ..Self::open_example()
            }
        }

        pub fn never_expiring_example() -> Self {
            Self {
                expires_at: None,
                ..Self::open_example()
            }
        }
    }

    impl Survey {
        pub fn open_example() -> Self {
            Self {
                id: Id::new(),
                survey: SurveyCore::open_example(),
            }
        }
    }
}
