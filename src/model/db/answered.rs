use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::{doc, serde_helpers::chrono_datetime_as_bson_datetime, Document};
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Marks that an account has completed a survey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAnsweredSurveyCore {
    pub account_id: Id,
    pub survey_id: Id,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub answered_at: DateTime<Utc>,
}

impl UserAnsweredSurveyCore {
    pub fn new(account_id: Id, survey_id: Id, answered_at: DateTime<Utc>) -> Self {
        Self {
            account_id,
            survey_id,
            answered_at,
        }
    }
}

/// An answered marker without an ID.
pub type NewUserAnsweredSurvey = UserAnsweredSurveyCore;

/// An answered marker from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAnsweredSurvey {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub answered: UserAnsweredSurveyCore,
}

impl Deref for UserAnsweredSurvey {
    type Target = UserAnsweredSurveyCore;

    fn deref(&self) -> &Self::Target {
        &self.answered
    }
}

impl DerefMut for UserAnsweredSurvey {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.answered
    }
}

/// Filter matching the marker for this account and survey.
pub fn answered_filter(account_id: Id, survey_id: Id) -> Document {
    doc! {
        "account_id": account_id,
        "survey_id": survey_id,
    }
}
