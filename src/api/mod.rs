use rocket::Route;

pub mod admin;
pub mod auth;
pub mod surveys;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(admin::routes());
    routes.extend(auth::routes());
    routes.extend(surveys::routes());
    routes
}
