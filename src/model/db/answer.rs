use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::{engine::Accepted, model::mongodb::Id};

/// A persisted response: one selected answer, by one account, to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAnswerRecordCore {
    pub account_id: Id,
    pub survey_id: Id,
    pub question_id: Id,
    pub answer_id: Id,
}

impl UserAnswerRecordCore {
    /// One record per selection of an accepted submission, in submission order.
    pub fn from_accepted(accepted: &Accepted) -> Vec<Self> {
        accepted
            .selections
            .iter()
            .map(|selection| Self {
                account_id: accepted.account_id,
                survey_id: accepted.survey_id,
                question_id: selection.question_id,
                answer_id: selection.answer_id,
            })
            .collect()
    }
}

/// A user answer record without an ID.
pub type NewUserAnswerRecord = UserAnswerRecordCore;

/// A user answer record from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAnswerRecord {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub record: UserAnswerRecordCore,
}

impl Deref for UserAnswerRecord {
    type Target = UserAnswerRecordCore;

    fn deref(&self) -> &Self::Target {
        &self.record
    }
}

impl DerefMut for UserAnswerRecord {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::common::survey::UserAnswerSelection;

    #[test]
    fn one_record_per_selection() {
        let (account_id, survey_id) = (Id::new(), Id::new());
        let selections = vec![
            UserAnswerSelection::new(Id::new(), Id::new()),
            UserAnswerSelection::new(Id::new(), Id::new()),
        ];
        let accepted = Accepted {
            account_id,
            survey_id,
            selections: selections.clone(),
        };

        let records = NewUserAnswerRecord::from_accepted(&accepted);
        assert_eq!(records.len(), 2);
        for (record, selection) in records.iter().zip(selections) {
            assert_eq!(record.account_id, account_id);
            assert_eq!(record.survey_id, survey_id);
            assert_eq!(record.question_id, selection.question_id);
            assert_eq!(record.answer_id, selection.answer_id);
        }
    }
}
