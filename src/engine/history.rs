use std::collections::HashMap;

use crate::model::{
    common::survey::QuestionType,
    db::{answer::UserAnswerRecord, survey::Survey},
    mongodb::Id,
};

/// A survey whose answers each carry every record that selected them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyWithHistory {
    pub id: Id,
    pub title: String,
    /// How many accounts have completed this survey.
    pub times_answered: u64,
    pub questions: Vec<QuestionWithHistory>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionWithHistory {
    pub id: Id,
    pub title: String,
    pub kind: QuestionType,
    pub answers: Vec<AnswerWithHistory>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerWithHistory {
    pub id: Id,
    pub body: String,
    pub records: Vec<UserAnswerRecord>,
}

impl SurveyWithHistory {
    /// Attach `records` to the answers they selected.
    ///
    /// A record is attached only when both its question and its answer match,
    /// so stray records for other surveys or since-removed answers are dropped.
    pub fn annotate(survey: Survey, records: Vec<UserAnswerRecord>, times_answered: u64) -> Self {
        let mut by_selection: HashMap<(Id, Id), Vec<UserAnswerRecord>> = HashMap::new();
        for record in records {
            by_selection
                .entry((record.question_id, record.answer_id))
                .or_default()
                .push(record);
        }

        let Survey { id, survey } = survey;
        let questions = survey
            .questions
            .into_iter()
            .map(|question| QuestionWithHistory {
                id: question.id,
                title: question.title,
                kind: question.kind,
                answers: question
                    .answers
                    .into_iter()
                    .map(|answer| AnswerWithHistory {
                        records: by_selection
                            .remove(&(question.id, answer.id))
                            .unwrap_or_default(),
                        id: answer.id,
                        body: answer.body,
                    })
                    .collect(),
            })
            .collect();

        Self {
            id,
            title: survey.title,
            times_answered,
            questions,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::model::db::answer::UserAnswerRecordCore;

    use super::*;

    fn record(survey: &Survey, question_id: Id, answer_id: Id) -> UserAnswerRecord {
        UserAnswerRecord {
            id: Id::new(),
            record: UserAnswerRecordCore {
                account_id: Id::new(),
                survey_id: survey.id,
                question_id,
                answer_id,
            },
        }
    }

    #[test]
    fn records_land_on_their_answers() {
        let survey = Survey::open_example();
        let (single, multiple) = (&survey.questions[0], &survey.questions[1]);
        let records = vec![
            record(&survey, single.id, single.answers[0].id),
            record(&survey, multiple.id, multiple.answers[2].id),
            record(&survey, single.id, single.answers[0].id),
        ];

        let history = SurveyWithHistory::annotate(survey.clone(), records, 2);

        assert_eq!(history.id, survey.id);
        assert_eq!(history.times_answered, 2);
        let counts = history
            .questions
            .iter()
            .map(|q| q.answers.iter().map(|a| a.records.len()).collect::<Vec<_>>())
            .collect::<Vec<_>>();
        assert_eq!(counts, vec![vec![2, 0], vec![0, 0, 1]]);
    }

    #[test]
    fn mismatched_records_are_dropped() {
        let survey = Survey::open_example();
        let (single, multiple) = (&survey.questions[0], &survey.questions[1]);
        // Right answer ID, wrong question ID.
        let records = vec![record(&survey, multiple.id, single.answers[0].id)];

        let history = SurveyWithHistory::annotate(survey, records, 1);

        assert!(history
            .questions
            .iter()
            .flat_map(|q| q.answers.iter())
            .all(|a| a.records.is_empty()));
    }

    #[test]
    fn keeps_question_and_answer_order() {
        let survey = Survey::open_example();
        let history = SurveyWithHistory::annotate(survey.clone(), vec![], 0);

        for (annotated, original) in history.questions.iter().zip(survey.questions.iter()) {
            assert_eq!(annotated.id, original.id);
            assert_eq!(annotated.kind, original.kind);
            let ids = annotated.answers.iter().map(|a| a.id).collect::<Vec<_>>();
            let expected = original.answers.iter().map(|a| a.id).collect::<Vec<_>>();
            assert_eq!(ids, expected);
        }
    }
}
