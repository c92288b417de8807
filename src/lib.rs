#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use std::sync::Arc;

use rocket::{Build, Rocket};

use crate::config::{ConfigFairing, DatabaseFairing};
use crate::engine::{SharedClock, SystemClock};
use crate::logging::LoggerFairing;

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod model;

/// Assemble the server: configuration, database connection, clock and routes.
pub fn build() -> Rocket<Build> {
    base().attach(DatabaseFairing)
}

/// Everything but the database.
fn base() -> Rocket<Build> {
    let clock: SharedClock = Arc::new(SystemClock);
    rocket::build()
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .manage(clock)
        .mount("/", api::routes())
}

/// Connect to the database named by `db_uri` in the test configuration.
#[cfg(test)]
pub(crate) async fn db_client() -> mongodb::Client {
    let db_uri = rocket::Config::figment()
        .extract_inner::<String>("db_uri")
        .expect("`db_uri` must be configured to run database tests");
    mongodb::Client::with_uri_str(db_uri)
        .await
        .expect("could not connect to the test database")
}

/// A fresh database name for one test.
#[cfg(test)]
pub(crate) fn database() -> String {
    config::get_database_name()
}

/// A server using the given database, which is prepared the same way as at launch.
#[cfg(test)]
pub(crate) async fn rocket_for_db(client: mongodb::Client, db_name: &str) -> Rocket<Build> {
    let db = client.database(db_name);
    model::mongodb::ensure_indexes_exist(&db)
        .await
        .expect("could not create indexes");
    base().manage(client).manage(db)
}
