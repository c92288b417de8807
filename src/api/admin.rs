use log::info;
use mongodb::{bson::doc, Client};
use rocket::{futures::TryStreamExt, serde::json::Json, Route, State};

use crate::{
    engine::SharedClock,
    error::{Error, Result},
    model::{
        api::{
            account::{AccountDescription, SignupRequest},
            auth::{Admin, AuthToken, Rights},
            survey::{SurveyDescription, SurveySpec},
        },
        db::{
            account::Account, answer::UserAnswerRecord, answered::UserAnsweredSurvey,
            survey::Survey,
        },
        mongodb::{Coll, Id},
    },
};

use super::auth::insert_account;

pub fn routes() -> Vec<Route> {
    routes![get_admins, create_admin, create_survey, delete_survey]
}

#[get("/admins")]
async fn get_admins(
    _token: AuthToken<Admin>,
    accounts: Coll<Account>,
) -> Result<Json<Vec<AccountDescription>>> {
    let admins: Vec<Account> = accounts
        .find(doc! { "rights": Rights::Admin }, None)
        .await?
        .try_collect()
        .await?;
    Ok(Json(admins.into_iter().map(Into::into).collect()))
}

#[post("/admins", data = "<request>", format = "json")]
async fn create_admin(
    token: AuthToken<Admin>,
    request: Json<SignupRequest>,
    accounts: Coll<Account>,
) -> Result<Json<AccountDescription>> {
    let admin = insert_account(request.0, Rights::Admin, &accounts).await?;
    info!("Admin {} created admin {}", token.id, admin.id);
    Ok(Json(admin.into()))
}

#[post("/surveys", data = "<spec>", format = "json")]
async fn create_survey(
    token: AuthToken<Admin>,
    spec: Json<SurveySpec>,
    surveys: Coll<Survey>,
    clock: &State<SharedClock>,
) -> Result<Json<SurveyDescription>> {
    let survey = Survey {
        id: Id::new(),
        survey: spec.0.into_survey(clock.now())?,
    };
    surveys.insert_one(&survey, None).await?;
    info!("Admin {} created survey {}", token.id, survey.id);

    Ok(Json(survey.into()))
}

#[delete("/surveys/<survey_id>")]
async fn delete_survey(
    token: AuthToken<Admin>,
    survey_id: Id,
    surveys: Coll<Survey>,
    records: Coll<UserAnswerRecord>,
    markers: Coll<UserAnsweredSurvey>,
    db_client: &State<Client>,
) -> Result<()> {
    // Atomically delete the survey and everything answered for it.
    let mut session = db_client.start_session(None).await?;
    session.start_transaction(None).await?;

    let result = surveys
        .delete_one_with_session(survey_id.as_doc(), None, &mut session)
        .await?;
    if result.deleted_count == 0 {
        session.abort_transaction().await?;
        return Err(Error::not_found(format!("Survey {survey_id}")));
    }

    let filter = doc! {
        "survey_id": survey_id,
    };
    records
        .delete_many_with_session(filter.clone(), None, &mut session)
        .await?;
    markers
        .delete_many_with_session(filter, None, &mut session)
        .await?;

    session.commit_transaction().await?;
    info!("Admin {} deleted survey {survey_id}", token.id);

    Ok(())
}
