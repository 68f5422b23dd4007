use actix_web::web::*;

mod auth;
mod ticket;
mod user;

// auth and ticket register literal paths under /customer, /engineer, and
// /admin, so they must come before user's role scopes.
pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/api")
            .configure(auth::configure)
            .configure(ticket::configure)
            .configure(user::configure),
    );
}
