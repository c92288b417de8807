use std::collections::HashSet;

use log::{debug, info};
use mongodb::{
    bson::doc,
    options::{FindOptions, SessionOptions},
    Client,
};
use rocket::{futures::TryStreamExt, http::Status, serde::json::Json, Route, State};

use crate::{
    engine::{aggregate, SharedClock, SubmissionValidator, SurveyResult, SurveyWithHistory},
    error::{Error, Result},
    model::{
        api::{
            auth::{AuthToken, Respondent},
            pagination::{Paginated, PaginationRequest},
            survey::{SelectionSpec, SurveyDescription, SurveySummary},
        },
        common::survey::UserAnswerSelection,
        db::{
            answer::{NewUserAnswerRecord, UserAnswerRecord},
            answered::{answered_filter, NewUserAnsweredSurvey, UserAnsweredSurvey},
            survey::Survey,
        },
        mongodb::{is_duplicate_key_error, is_write_conflict, Coll, Id},
    },
};

pub fn routes() -> Vec<Route> {
    routes![list_surveys, get_survey, submit_answers, survey_results]
}

#[get("/surveys?<pagination..>")]
async fn list_surveys(
    token: AuthToken<Respondent>,
    pagination: PaginationRequest,
    surveys: Coll<Survey>,
    markers: Coll<UserAnsweredSurvey>,
) -> Result<Json<Paginated<SurveySummary>>> {
    let total = surveys.count_documents(None, None).await?;

    // Newest first.
    let options = FindOptions::builder()
        .sort(doc! { "created_at": -1, "_id": -1 })
        .skip(u64::from(pagination.skip()))
        .limit(i64::from(pagination.page_size()))
        .build();
    let page: Vec<Survey> = surveys.find(None, options).await?.try_collect().await?;

    // Which of this page has the caller already answered?
    let page_ids = page.iter().map(|survey| survey.id).collect::<Vec<_>>();
    let filter = doc! {
        "account_id": token.id,
        "survey_id": { "$in": page_ids },
    };
    let answered: HashSet<Id> = markers
        .find(filter, None)
        .await?
        .map_ok(|marker| marker.survey_id)
        .try_collect()
        .await?;

    let summaries = page
        .into_iter()
        .map(|survey| {
            let did_answer = answered.contains(&survey.id);
            SurveySummary::new(survey, did_answer)
        })
        .collect();
    Ok(Json(pagination.to_paginated(total, summaries)))
}

#[get("/surveys/<survey_id>")]
async fn get_survey(
    _token: AuthToken<Respondent>,
    survey_id: Id,
    surveys: Coll<Survey>,
) -> Result<Json<SurveyDescription>> {
    let survey = surveys
        .find_one(survey_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Survey {survey_id}")))?;

    Ok(Json(survey.into()))
}

#[put("/surveys/<survey_id>/answers", data = "<selections>", format = "json")]
#[allow(clippy::too_many_arguments)]
async fn submit_answers(
    token: AuthToken<Respondent>,
    survey_id: Id,
    selections: Json<Vec<SelectionSpec>>,
    surveys: Coll<Survey>,
    records: Coll<NewUserAnswerRecord>,
    markers: Coll<NewUserAnsweredSurvey>,
    clock: &State<SharedClock>,
    db_client: &State<Client>,
) -> Result<()> {
    let already_answered = || {
        Error::Status(
            Status::Conflict,
            format!("Survey {survey_id} already answered"),
        )
    };

    // Resubmission is refused before the survey is even looked at.
    if markers
        .find_one(answered_filter(token.id, survey_id), None)
        .await?
        .is_some()
    {
        return Err(already_answered());
    }

    let survey = surveys
        .find_one(survey_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Survey {survey_id}")))?;

    let selections = selections
        .0
        .into_iter()
        .map(UserAnswerSelection::from)
        .collect();
    let accepted =
        SubmissionValidator::new(clock.inner().as_ref()).validate(&survey, token.id, selections)?;
    debug!(
        "Accepted {} selections from {} for survey {survey_id}",
        accepted.selections.len(),
        token.id
    );

    // Store the answers and the marker together, or not at all. The unique
    // marker index turns a concurrent resubmission into a failed write here.
    let mut session = db_client.start_session(None).await?;
    session.start_transaction(None).await?;

    let new_records = NewUserAnswerRecord::from_accepted(&accepted);
    if !new_records.is_empty() {
        records
            .insert_many_with_session(&new_records, None, &mut session)
            .await?;
    }
    let marker = NewUserAnsweredSurvey::new(token.id, survey_id, clock.now());
    match markers
        .insert_one_with_session(marker, None, &mut session)
        .await
    {
        Ok(_) => {}
        Err(err) if is_duplicate_key_error(&err) || is_write_conflict(&err) => {
            session.abort_transaction().await?;
            return Err(already_answered());
        }
        Err(err) => return Err(err.into()),
    }

    session.commit_transaction().await?;
    info!(
        "Stored {} answers from {} for survey {survey_id}",
        new_records.len(),
        token.id
    );

    Ok(())
}

#[get("/surveys/<survey_id>/results")]
async fn survey_results(
    _token: AuthToken<Respondent>,
    survey_id: Id,
    surveys: Coll<Survey>,
    records: Coll<UserAnswerRecord>,
    markers: Coll<UserAnsweredSurvey>,
    db_client: &State<Client>,
) -> Result<Json<SurveyResult>> {
    // Read everything from one snapshot so the records and the count agree.
    let options = SessionOptions::builder().snapshot(true).build();
    let mut session = db_client.start_session(options).await?;

    let survey = surveys
        .find_one_with_session(survey_id.as_doc(), None, &mut session)
        .await?
        .ok_or_else(|| Error::not_found(format!("Survey {survey_id}")))?;

    let filter = doc! {
        "survey_id": survey_id,
    };
    let mut cursor = records
        .find_with_session(filter.clone(), None, &mut session)
        .await?;
    let answer_records: Vec<UserAnswerRecord> = cursor.stream(&mut session).try_collect().await?;
    let times_answered = markers
        .count_documents_with_session(filter, None, &mut session)
        .await?;

    let history = SurveyWithHistory::annotate(survey, answer_records, times_answered);
    Ok(Json(aggregate(history)))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mongodb::Database;
    use rocket::{
        http::ContentType,
        local::asynchronous::{Client, LocalResponse},
        serde::json::{serde_json::json, Value},
    };

    use crate::engine::{Rejection, RejectionKind};
    use crate::model::{
        api::{auth::AUTH_TOKEN_COOKIE, id::ApiId, pagination::DEFAULT_PAGE_SIZE},
        db::{
            account::{Account, NewAccount},
            survey::{NewSurvey, SurveyCore},
        },
    };

    use super::*;

    /// Insert a survey directly, bypassing the admin route.
    async fn insert_survey(db: &Database, survey: NewSurvey) -> Survey {
        let survey = Survey {
            id: Id::new(),
            survey,
        };
        Coll::<Survey>::from_db(db)
            .insert_one(&survey, None)
            .await
            .unwrap();
        survey
    }

    /// One selection per question: the first answer of each.
    fn first_answers(survey: &Survey) -> Vec<SelectionSpec> {
        survey
            .questions
            .iter()
            .map(|question| SelectionSpec {
                question_id: question.id.into(),
                answer_id: question.answers[0].id.into(),
            })
            .collect()
    }

    async fn submit<'c>(
        client: &'c Client,
        survey_id: Id,
        selections: &[SelectionSpec],
    ) -> LocalResponse<'c> {
        client
            .put(uri!(submit_answers(survey_id)))
            .header(ContentType::JSON)
            .body(json!(selections).to_string())
            .dispatch()
            .await
    }

    async fn logged_in_account(db: &Database) -> Account {
        Coll::<Account>::from_db(db)
            .find_one(doc! { "email": "rita@example.com" }, None)
            .await
            .unwrap()
            .unwrap()
    }

    #[backend_test(respondent)]
    #[ignore = "needs a MongoDB replica set"]
    async fn valid_submission_is_stored(client: Client, db: Database) {
        let survey = insert_survey(&db, SurveyCore::open_example()).await;
        let selections = first_answers(&survey);

        let response = submit(&client, survey.id, &selections).await;
        assert_eq!(Status::Ok, response.status());

        let account = logged_in_account(&db).await;
        let stored: Vec<UserAnswerRecord> = Coll::<UserAnswerRecord>::from_db(&db)
            .find(doc! { "survey_id": survey.id }, None)
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(stored.len(), selections.len());
        assert!(stored.iter().all(|record| record.account_id == account.id));
        assert!(Coll::<UserAnsweredSurvey>::from_db(&db)
            .find_one(answered_filter(account.id, survey.id), None)
            .await
            .unwrap()
            .is_some());
    }

    #[backend_test(respondent)]
    #[ignore = "needs a MongoDB replica set"]
    async fn resubmission_conflicts(client: Client, db: Database) {
        let survey = insert_survey(&db, SurveyCore::open_example()).await;
        let selections = first_answers(&survey);

        let response = submit(&client, survey.id, &selections).await;
        assert_eq!(Status::Ok, response.status());
        let response = submit(&client, survey.id, &selections).await;
        assert_eq!(Status::Conflict, response.status());

        let count = Coll::<UserAnswerRecord>::from_db(&db)
            .count_documents(None, None)
            .await
            .unwrap();
        assert_eq!(count as usize, selections.len());
    }

    #[backend_test(respondent)]
    #[ignore = "needs a MongoDB replica set"]
    async fn expired_survey_is_forbidden(client: Client, db: Database) {
        let survey = insert_survey(&db, SurveyCore::expired_example()).await;

        let response = submit(&client, survey.id, &first_answers(&survey)).await;
        assert_eq!(Status::Forbidden, response.status());
        let rejection: Rejection = response.into_json().await.unwrap();
        assert_eq!(rejection.kind, RejectionKind::ExpiredSurvey);

        let count = Coll::<UserAnsweredSurvey>::from_db(&db)
            .count_documents(None, None)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[backend_test(respondent)]
    #[ignore = "needs a MongoDB replica set"]
    async fn invalid_payload_is_bad_request(client: Client, db: Database) {
        let survey = insert_survey(&db, SurveyCore::open_example()).await;
        let single = &survey.questions[0];
        let selections = vec![
            SelectionSpec {
                question_id: single.id.into(),
                answer_id: single.answers[0].id.into(),
            },
            SelectionSpec {
                question_id: single.id.into(),
                answer_id: single.answers[1].id.into(),
            },
        ];

        let response = submit(&client, survey.id, &selections).await;
        assert_eq!(Status::BadRequest, response.status());
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["type"], "INVALID_PAYLOAD");

        let count = Coll::<UserAnswerRecord>::from_db(&db)
            .count_documents(None, None)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[backend_test(respondent)]
    #[ignore = "needs a MongoDB replica set"]
    async fn missing_survey_is_not_found(client: Client) {
        let response = submit(&client, Id::new(), &[]).await;
        assert_eq!(Status::NotFound, response.status());

        let response = client.get(uri!(get_survey(Id::new()))).dispatch().await;
        assert_eq!(Status::NotFound, response.status());

        let response = client.get(uri!(survey_results(Id::new()))).dispatch().await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test]
    #[ignore = "needs a MongoDB replica set"]
    async fn anonymous_requests_are_refused(client: Client, db: Database) {
        let survey = insert_survey(&db, SurveyCore::open_example()).await;

        let response = client.get(uri!(get_survey(survey.id))).dispatch().await;
        assert_eq!(Status::NotFound, response.status());
        assert_eq!(None, client.cookies().get(AUTH_TOKEN_COOKIE));

        let response = submit(&client, survey.id, &first_answers(&survey)).await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test(respondent)]
    #[ignore = "needs a MongoDB replica set"]
    async fn listing_reports_did_answer(client: Client, db: Database) {
        let answered = insert_survey(&db, SurveyCore::open_example()).await;
        let unanswered = insert_survey(&db, SurveyCore::never_expiring_example()).await;
        let response = submit(&client, answered.id, &first_answers(&answered)).await;
        assert_eq!(Status::Ok, response.status());

        let response = client
            .get(uri!(list_surveys(PaginationRequest::default())))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let page: Paginated<SurveySummary> = response.into_json().await.unwrap();

        assert_eq!(page.pagination.total, 2);
        assert_eq!(page.pagination.page_size, DEFAULT_PAGE_SIZE);
        let did_answer = |id: Id| {
            page.items
                .iter()
                .find(|summary| summary.id == ApiId::from(id))
                .map(|summary| summary.did_answer)
        };
        assert_eq!(did_answer(answered.id), Some(true));
        assert_eq!(did_answer(unanswered.id), Some(false));
    }

    #[backend_test(respondent)]
    #[ignore = "needs a MongoDB replica set"]
    async fn listing_is_paginated(client: Client, db: Database) {
        for _ in 0..3 {
            insert_survey(&db, SurveyCore::open_example()).await;
        }

        let response = client
            .get(uri!(list_surveys(PaginationRequest::new(2, 2))))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let page: Paginated<SurveySummary> = response.into_json().await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.pagination.total, 3);

        let response = client.get("/surveys?page_size=1000").dispatch().await;
        assert_eq!(Status::UnprocessableEntity, response.status());
    }

    #[backend_test(respondent)]
    #[ignore = "needs a MongoDB replica set"]
    async fn results_count_every_respondent(client: Client, db: Database) {
        let survey = insert_survey(&db, SurveyCore::open_example()).await;
        let single = &survey.questions[0];

        // Two other respondents chose the second answer, then we choose the first.
        let records = Coll::<NewUserAnswerRecord>::from_db(&db);
        let markers = Coll::<NewUserAnsweredSurvey>::from_db(&db);
        for _ in 0..2 {
            let account_id = Id::new();
            records
                .insert_one(
                    NewUserAnswerRecord {
                        account_id,
                        survey_id: survey.id,
                        question_id: single.id,
                        answer_id: single.answers[1].id,
                    },
                    None,
                )
                .await
                .unwrap();
            markers
                .insert_one(
                    NewUserAnsweredSurvey::new(account_id, survey.id, Utc::now()),
                    None,
                )
                .await
                .unwrap();
        }
        let response = submit(&client, survey.id, &first_answers(&survey)).await;
        assert_eq!(Status::Ok, response.status());

        let response = client
            .get(uri!(survey_results(survey.id)))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let result: SurveyResult = response.into_json().await.unwrap();

        assert_eq!(result.times_answered, 3);
        let single_result = &result.questions[0];
        assert_eq!(single_result.question.id, ApiId::from(single.id));
        let percentages = single_result
            .answers
            .iter()
            .map(|answer| answer.percentage)
            .collect::<Vec<_>>();
        assert!((percentages[0] - 100.0 / 3.0).abs() < 1e-9);
        assert!((percentages[1] - 200.0 / 3.0).abs() < 1e-9);
    }

    #[backend_test(admin)]
    #[ignore = "needs a MongoDB replica set"]
    async fn admins_may_answer(client: Client, db: Database, accounts: Coll<NewAccount>) {
        assert_eq!(1, accounts.count_documents(None, None).await.unwrap());
        let survey = insert_survey(&db, SurveyCore::never_expiring_example()).await;

        let response = submit(&client, survey.id, &first_answers(&survey)).await;
        assert_eq!(Status::Ok, response.status());
    }
}
