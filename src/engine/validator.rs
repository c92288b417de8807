use std::collections::{HashMap, HashSet};

use log::trace;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{
    common::survey::{QuestionType, UserAnswerSelection},
    db::survey::Survey,
    mongodb::Id,
};

use super::clock::Clock;

const FOREIGN_QUESTION: &str = "some of the questions don't belong to the survey";
const FOREIGN_ANSWER: &str = "some of the answers don't belong to its question";
const UNCOVERED_QUESTION: &str = "some of the questions doesn't have at least one user answer";
const SINGLE_CARDINALITY: &str = "some of the single type questions has more than one user answer";
const DUPLICATE_SELECTION: &str = "duplicated user answer";

/// Why a submission was refused.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionKind {
    /// The survey stopped accepting submissions.
    ExpiredSurvey,
    /// The submission does not fit the survey's structure.
    InvalidPayload,
}

/// A refused submission, with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct Rejection {
    #[serde(rename = "type")]
    pub kind: RejectionKind,
    pub message: String,
}

impl Rejection {
    fn expired(survey_id: Id) -> Self {
        Self {
            kind: RejectionKind::ExpiredSurvey,
            message: format!("survey {} has expired", survey_id),
        }
    }

    fn invalid(message: &str) -> Self {
        Self {
            kind: RejectionKind::InvalidPayload,
            message: message.to_string(),
        }
    }
}

/// A submission that passed validation, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub account_id: Id,
    pub survey_id: Id,
    /// Exactly the submitted selections, in submission order.
    pub selections: Vec<UserAnswerSelection>,
}

/// Decides whether a set of selections is an acceptable answer to a survey.
pub struct SubmissionValidator<'c> {
    clock: &'c dyn Clock,
}

impl<'c> SubmissionValidator<'c> {
    pub fn new(clock: &'c dyn Clock) -> Self {
        Self { clock }
    }

    /// Validate `selections` against `survey`.
    ///
    /// Checks run in a fixed order and the first failure is reported:
    ///
    /// 1. the survey has not expired;
    /// 2. every selected question belongs to the survey;
    /// 3. every selected answer belongs to its question;
    /// 4. every question of the survey is selected at least once;
    /// 5. no `SINGLE` question is selected more than once;
    /// 6. no (question, answer) pair is selected twice.
    ///
    /// `account_id` is not checked, only carried through to the result.
    pub fn validate(
        &self,
        survey: &Survey,
        account_id: Id,
        selections: Vec<UserAnswerSelection>,
    ) -> Result<Accepted, Rejection> {
        if survey.is_expired_at(self.clock.now()) {
            return Err(Rejection::expired(survey.id));
        }

        let mut questions = Vec::with_capacity(selections.len());
        for selection in selections.iter() {
            match survey.question(selection.question_id) {
                Some(question) => questions.push(question),
                None => return Err(Rejection::invalid(FOREIGN_QUESTION)),
            }
        }

        let foreign_answer = selections
            .iter()
            .zip(questions.iter())
            .any(|(selection, question)| question.answer(selection.answer_id).is_none());
        if foreign_answer {
            return Err(Rejection::invalid(FOREIGN_ANSWER));
        }

        let mut selected_counts: HashMap<Id, usize> = HashMap::new();
        for selection in selections.iter() {
            *selected_counts.entry(selection.question_id).or_default() += 1;
        }

        let uncovered = survey
            .questions
            .iter()
            .any(|question| !selected_counts.contains_key(&question.id));
        if uncovered {
            return Err(Rejection::invalid(UNCOVERED_QUESTION));
        }

        let overfilled = survey.questions.iter().any(|question| {
            question.kind == QuestionType::Single && selected_counts[&question.id] > 1
        });
        if overfilled {
            return Err(Rejection::invalid(SINGLE_CARDINALITY));
        }

        let mut seen = HashSet::with_capacity(selections.len());
        if !selections.iter().all(|selection| seen.insert(*selection)) {
            return Err(Rejection::invalid(DUPLICATE_SELECTION));
        }

        trace!(
            "Accepted {} selections from {} for survey {}",
            selections.len(),
            account_id,
            survey.id
        );
        Ok(Accepted {
            account_id,
            survey_id: survey.id,
            selections,
        })
    }
}
