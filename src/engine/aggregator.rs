use serde::{Deserialize, Serialize};

use crate::model::{api::id::ApiId, common::survey::QuestionType};

use super::history::{AnswerWithHistory, QuestionWithHistory, SurveyWithHistory};

/// Per-question, per-answer statistics for a survey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyResult {
    pub survey: SurveyHeader,
    pub times_answered: u64,
    pub questions: Vec<QuestionResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyHeader {
    pub id: ApiId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question: QuestionHeader,
    pub answers: Vec<AnswerResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionHeader {
    pub id: ApiId,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer: AnswerHeader,
    /// Share of respondents who chose this answer, from 0 to 100. Not rounded.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerHeader {
    pub id: ApiId,
    pub body: String,
}

/// Compute, for every answer, the percentage of respondents who chose it.
///
/// When nobody has answered the survey yet every percentage is zero. For
/// `MULTIPLE` questions the percentages of one question may add up to more
/// than 100, since a respondent may choose several answers.
pub fn aggregate(survey: SurveyWithHistory) -> SurveyResult {
    let times_answered = survey.times_answered;
    let questions = survey
        .questions
        .into_iter()
        .map(|question| aggregate_question(question, times_answered))
        .collect();

    SurveyResult {
        survey: SurveyHeader {
            id: survey.id.into(),
            title: survey.title,
        },
        times_answered,
        questions,
    }
}

fn aggregate_question(question: QuestionWithHistory, times_answered: u64) -> QuestionResult {
    let answers = question
        .answers
        .into_iter()
        .map(|answer| aggregate_answer(answer, times_answered))
        .collect();

    QuestionResult {
        question: QuestionHeader {
            id: question.id.into(),
            title: question.title,
            kind: question.kind,
        },
        answers,
    }
}

fn aggregate_answer(answer: AnswerWithHistory, times_answered: u64) -> AnswerResult {
    AnswerResult {
        percentage: percentage(answer.records.len(), times_answered),
        answer: AnswerHeader {
            id: answer.id.into(),
            body: answer.body,
        },
    }
}

fn percentage(count: usize, times_answered: u64) -> f64 {
    if times_answered == 0 {
        return 0.0;
    }
    count as f64 / times_answered as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use crate::model::{
        db::{
            answer::{UserAnswerRecord, UserAnswerRecordCore},
            survey::{Answer, Question, Survey, SurveyCore},
        },
        mongodb::Id,
    };

    use super::*;

    /// Build a history where answer `j` of question `i` was chosen `counts[i][j]` times.
    fn history(survey: &Survey, counts: &[&[usize]], times_answered: u64) -> SurveyWithHistory {
        let mut records = Vec::new();
        for (question, answer_counts) in survey.questions.iter().zip(counts) {
            for (answer, &count) in question.answers.iter().zip(answer_counts.iter()) {
                for _ in 0..count {
                    records.push(UserAnswerRecord {
                        id: Id::new(),
                        record: UserAnswerRecordCore {
                            account_id: Id::new(),
                            survey_id: survey.id,
                            question_id: question.id,
                            answer_id: answer.id,
                        },
                    });
                }
            }
        }
        SurveyWithHistory::annotate(survey.clone(), records, times_answered)
    }

    fn percentages(result: &SurveyResult) -> Vec<Vec<f64>> {
        result
            .questions
            .iter()
            .map(|q| q.answers.iter().map(|a| a.percentage).collect())
            .collect()
    }

    #[test]
    fn single_question_end_to_end() {
        let question = Question {
            answers: vec![Answer::example("A1"), Answer::example("A2")],
            ..Question::single_example()
        };
        let survey = Survey {
            id: Id::new(),
            survey: SurveyCore {
                questions: vec![question.clone()],
                ..SurveyCore::open_example()
            },
        };

        let result = aggregate(history(&survey, &[&[2, 3]], 5));

        assert_eq!(result.times_answered, 5);
        assert_eq!(result.survey.id, ApiId::from(survey.id));
        assert_eq!(result.survey.title, survey.title);
        assert_eq!(result.questions[0].question.id, ApiId::from(question.id));
        assert_eq!(result.questions[0].question.kind, QuestionType::Single);
        assert_eq!(result.questions[0].answers[0].answer.body, "A1");
        assert_eq!(percentages(&result), vec![vec![40.0, 60.0]]);
    }

    #[test]
    fn nobody_answered_means_zero_everywhere() {
        let survey = Survey::open_example();
        let result = aggregate(history(&survey, &[], 0));

        assert_eq!(result.times_answered, 0);
        assert!(percentages(&result)
            .iter()
            .flatten()
            .all(|&p| p == 0.0 && !p.is_nan()));
    }

    #[test]
    fn single_question_sums_to_at_most_one_hundred() {
        let survey = Survey::open_example();
        // Four respondents, each answered the single question exactly once.
        let result = aggregate(history(&survey, &[&[1, 3], &[4, 2, 3]], 4));

        let single_total: f64 = result.questions[0].answers.iter().map(|a| a.percentage).sum();
        assert!(single_total <= 100.0);
        assert_eq!(single_total, 100.0);

        let multiple_total: f64 = result.questions[1].answers.iter().map(|a| a.percentage).sum();
        assert!(multiple_total > 100.0);
        assert_eq!(percentages(&result)[1], vec![100.0, 50.0, 75.0]);
    }

    #[test]
    fn percentages_are_not_rounded() {
        let survey = Survey::open_example();
        let result = aggregate(history(&survey, &[&[1, 2]], 3));

        let first = result.questions[0].answers[0].percentage;
        assert!((first - 100.0 / 3.0).abs() < 1e-9);
        assert_ne!(first, first.round());
    }

    #[test]
    fn serialises_in_api_shape() {
        let survey = Survey::open_example();
        let result = aggregate(history(&survey, &[&[1, 0]], 1));
        let json = rocket::serde::json::serde_json::to_value(&result).unwrap();

        assert_eq!(json["timesAnswered"], 1);
        assert_eq!(json["survey"]["id"], survey.id.to_string());
        assert_eq!(json["questions"][0]["question"]["type"], "SINGLE");
        assert_eq!(json["questions"][1]["question"]["type"], "MULTIPLE");
        assert_eq!(json["questions"][0]["answers"][0]["answer"]["body"], "Rust");
        assert_eq!(json["questions"][0]["answers"][0]["percentage"], 100.0);
    }
}
