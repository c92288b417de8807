use std::ops::Deref;

use log::debug;
use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};
use rocket::{
    request::{self, FromRequest, Request},
    State,
};

use crate::model::db::{
    account::{Account, NewAccount},
    answer::{NewUserAnswerRecord, UserAnswerRecord},
    answered::{NewUserAnsweredSurvey, UserAnsweredSurvey},
    survey::{NewSurvey, Survey},
};

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r, T> FromRequest<'r> for Coll<T>
where
    T: MongoCollection,
{
    type Error = ();

    /// Get the database connection from the managed state and wrap it in a collection.
    ///
    /// Panics iff the [`Database`] is not managed by [`rocket::Rocket`].
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let db = req.guard::<&State<Database>>().await.unwrap();
        request::Outcome::Success(Coll::from_db(db))
    }
}

// Account collections
const ACCOUNTS: &str = "accounts";
impl MongoCollection for Account {
    const NAME: &'static str = ACCOUNTS;
}
impl MongoCollection for NewAccount {
    const NAME: &'static str = ACCOUNTS;
}

// Survey collections
const SURVEYS: &str = "surveys";
impl MongoCollection for Survey {
    const NAME: &'static str = SURVEYS;
}
impl MongoCollection for NewSurvey {
    const NAME: &'static str = SURVEYS;
}

// User answer collections
const USER_ANSWERS: &str = "user_answers";
impl MongoCollection for UserAnswerRecord {
    const NAME: &'static str = USER_ANSWERS;
}
impl MongoCollection for NewUserAnswerRecord {
    const NAME: &'static str = USER_ANSWERS;
}

// Answered survey marker collections
const USER_ANSWERED_SURVEYS: &str = "user_answered_surveys";
impl MongoCollection for UserAnsweredSurvey {
    const NAME: &'static str = USER_ANSWERED_SURVEYS;
}
impl MongoCollection for NewUserAnsweredSurvey {
    const NAME: &'static str = USER_ANSWERED_SURVEYS;
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    let unique = IndexOptions::builder().unique(true).build();

    // Account collection.
    let account_index = IndexModel::builder()
        .keys(doc! {"email": 1})
        .options(unique.clone())
        .build();
    Coll::<Account>::from_db(db)
        .create_index(account_index, None)
        .await?;

    // Answered marker collection: at most one per account per survey.
    let answered_index = IndexModel::builder()
        .keys(doc! {"account_id": 1, "survey_id": 1})
        .options(unique)
        .build();
    Coll::<UserAnsweredSurvey>::from_db(db)
        .create_index(answered_index, None)
        .await?;

    // User answer collection, queried by survey when aggregating results.
    let answer_index = IndexModel::builder()
        .keys(doc! {"survey_id": 1, "question_id": 1, "answer_id": 1})
        .build();
    Coll::<UserAnswerRecord>::from_db(db)
        .create_index(answer_index, None)
        .await?;

    Ok(())
}
