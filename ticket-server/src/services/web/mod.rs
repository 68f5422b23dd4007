use actix_web::web::*;

use crate::handlers::{health, uploads};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("")
            .route("/heartbeat", get().to(health::heartbeat))
            .route("/health", get().to(health::health))
            .route("/uploads/{filename}", get().to(uploads::serve_upload)),
    );
}
