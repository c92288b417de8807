use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{
    api::id::ApiId,
    common::survey::{QuestionType, UserAnswerSelection},
    db::survey::{Answer, NewSurvey, Question, Survey},
    mongodb::Id,
};

/// A survey specification, as submitted by an administrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveySpec {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub questions: Vec<QuestionSpec>,
}

/// A question specification: the text, the type, and the bodies of its answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSpec {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub answers: Vec<String>,
}

/// Reasons a survey specification is refused.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum SurveySpecError {
    #[error("survey title must not be empty")]
    EmptyTitle,
    #[error("survey must have at least one question")]
    NoQuestions,
    #[error("question {0} has an empty title")]
    EmptyQuestionTitle(usize),
    #[error("question {0} must have at least one answer")]
    NoAnswers(usize),
    #[error("question {0} has an empty answer")]
    EmptyAnswer(usize),
    #[error("question {0} offers the same answer twice")]
    DuplicateAnswer(usize),
}

impl SurveySpec {
    /// Check the survey is well-formed and assign fresh IDs to every question and answer.
    pub fn into_survey(self, created_at: DateTime<Utc>) -> Result<NewSurvey, SurveySpecError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(SurveySpecError::EmptyTitle);
        }
        if self.questions.is_empty() {
            return Err(SurveySpecError::NoQuestions);
        }

        let questions = self
            .questions
            .into_iter()
            .enumerate()
            .map(|(i, question)| question.into_question(i))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(NewSurvey {
            title,
            description: self
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            expires_at: self.expires_at,
            created_at,
            questions,
        })
    }
}

impl QuestionSpec {
    /// Convert this into the `index`th question of a survey.
    fn into_question(self, index: usize) -> Result<Question, SurveySpecError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(SurveySpecError::EmptyQuestionTitle(index));
        }
        if self.answers.is_empty() {
            return Err(SurveySpecError::NoAnswers(index));
        }

        let mut seen = HashSet::new();
        let mut answers = Vec::with_capacity(self.answers.len());
        for body in self.answers {
            let body = body.trim().to_string();
            if body.is_empty() {
                return Err(SurveySpecError::EmptyAnswer(index));
            }
            if !seen.insert(body.clone()) {
                return Err(SurveySpecError::DuplicateAnswer(index));
            }
            answers.push(Answer { id: Id::new(), body });
        }

        Ok(Question {
            id: Id::new(),
            title,
            kind: self.kind,
            answers,
        })
    }
}

/// An API-friendly survey description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyDescription {
    pub id: ApiId,
    pub title: String,
    pub description: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub questions: Vec<QuestionDescription>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDescription {
    pub id: ApiId,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub answers: Vec<AnswerDescription>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerDescription {
    pub id: ApiId,
    pub body: String,
}

impl From<Survey> for SurveyDescription {
    fn from(survey: Survey) -> Self {
        Self {
            id: survey.id.into(),
            title: survey.survey.title,
            description: survey.survey.description,
            expires_at: survey.survey.expires_at,
            created_at: survey.survey.created_at,
            questions: survey
                .survey
                .questions
                .into_iter()
                .map(|question| QuestionDescription {
                    id: question.id.into(),
                    title: question.title,
                    kind: question.kind,
                    answers: question
                        .answers
                        .into_iter()
                        .map(|answer| AnswerDescription {
                            id: answer.id.into(),
                            body: answer.body,
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// A summary of a survey for listings, shorter than the full `SurveyDescription`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveySummary {
    pub id: ApiId,
    pub title: String,
    pub description: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Has the requesting account already answered this survey?
    pub did_answer: bool,
}

impl SurveySummary {
    pub fn new(survey: Survey, did_answer: bool) -> Self {
        Self {
            id: survey.id.into(),
            title: survey.survey.title,
            description: survey.survey.description,
            expires_at: survey.survey.expires_at,
            did_answer,
        }
    }
}

/// A selection as received from a respondent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionSpec {
    pub question_id: ApiId,
    pub answer_id: ApiId,
}

impl From<SelectionSpec> for UserAnswerSelection {
    fn from(spec: SelectionSpec) -> Self {
        UserAnswerSelection::new(spec.question_id.into(), spec.answer_id.into())
    }
}
