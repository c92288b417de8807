use log::info;
use mongodb::bson::doc;
use rocket::{
    http::{Cookie, CookieJar, Status},
    serde::json::Json,
    Route, State,
};

use crate::{
    config::Config,
    error::{Error, Result},
    model::{
        api::{
            account::{AccountDescription, LoginRequest, SignupRequest},
            auth::{AuthToken, Respondent, Rights, AUTH_TOKEN_COOKIE},
        },
        db::account::Account,
        mongodb::{is_duplicate_key_error, Coll, Id},
    },
};

pub fn routes() -> Vec<Route> {
    routes![signup, login, logout]
}

#[post("/signup", data = "<request>", format = "json")]
pub async fn signup(
    cookies: &CookieJar<'_>,
    request: Json<SignupRequest>,
    accounts: Coll<Account>,
    config: &State<Config>,
) -> Result<Json<AccountDescription>> {
    let account = insert_account(request.0, Rights::Respondent, &accounts).await?;
    info!("New respondent {} signed up", account.id);

    cookies.add(AuthToken::<Respondent>::new(&account).into_cookie(config));
    Ok(Json(account.into()))
}

#[post("/login", data = "<credentials>", format = "json")]
pub async fn login(
    cookies: &CookieJar<'_>,
    credentials: Json<LoginRequest>,
    accounts: Coll<Account>,
    config: &State<Config>,
) -> Result<Json<AccountDescription>> {
    let with_email = doc! {
        "email": credentials.email.trim().to_lowercase(),
    };

    let account = accounts
        .find_one(with_email, None)
        .await?
        .filter(|account| account.verify_password(&credentials.password))
        .ok_or_else(|| {
            Error::Status(
                Status::Unauthorized,
                "No account found with the provided email and password combination.".to_string(),
            )
        })?;

    cookies.add(AuthToken::<Respondent>::new(&account).into_cookie(config));
    Ok(Json(account.into()))
}

#[delete("/auth")]
pub fn logout(cookies: &CookieJar) -> Status {
    cookies.remove(Cookie::named(AUTH_TOKEN_COOKIE));
    Status::Ok
}

/// Validate a signup request and store the resulting account with the given rights.
///
/// Email uniqueness is enforced by the unique index, so a concurrent signup with
/// the same email is reported as a conflict too.
pub(crate) async fn insert_account(
    request: SignupRequest,
    rights: Rights,
    accounts: &Coll<Account>,
) -> Result<Account> {
    let account = Account {
        id: Id::new(),
        account: request.into_account(rights)?,
    };

    let email_taken = || {
        Error::Status(
            Status::Conflict,
            format!("Email already in use: {}", account.email),
        )
    };
    if accounts
        .find_one(doc! { "email": &account.email }, None)
        .await?
        .is_some()
    {
        return Err(email_taken());
    }
    match accounts.insert_one(&account, None).await {
        Ok(_) => {}
        Err(err) if is_duplicate_key_error(&err) => return Err(email_taken()),
        Err(err) => return Err(err.into()),
    }

    Ok(account)
}
