use actix_web::web::*;

use crate::handlers::auth;

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(resource("/customer/login").route(post().to(auth::customer_login)))
        .service(
            resource("/customer/forgot-password/send-otp")
                .route(post().to(auth::customer_forgot_password_send_otp)),
        )
        .service(
            resource("/customer/forgot-password/verify-otp")
                .route(post().to(auth::customer_forgot_password_verify_otp)),
        )
        .service(
            resource("/customer/reset-password").route(post().to(auth::customer_reset_password)),
        )
        .service(resource("/customer/change-password").route(post().to(auth::change_password)))
        .service(resource("/engineer/login").route(post().to(auth::engineer_login)))
        .service(
            resource("/engineer/forgot-password/send-otp")
                .route(post().to(auth::engineer_forgot_password_send_otp)),
        )
        .service(
            resource("/engineer/forgot-password/verify-otp")
                .route(post().to(auth::engineer_forgot_password_verify_otp)),
        )
        .service(
            resource("/engineer/reset-password").route(post().to(auth::engineer_reset_password)),
        )
        .service(resource("/engineer/change-password").route(post().to(auth::change_password)))
        .service(resource("/admin/login").route(post().to(auth::admin_login)))
        .service(resource("/admin/verify-otp").route(post().to(auth::admin_verify_otp)))
        .service(
            resource("/admin/forgot-password/send-otp")
                .route(post().to(auth::admin_forgot_password_send_otp)),
        )
        .service(
            resource("/admin/forgot-password/verify-otp")
                .route(post().to(auth::admin_forgot_password_verify_otp)),
        )
        .service(resource("/admin/reset-password").route(post().to(auth::admin_reset_password)))
        .service(resource("/admin/change-password").route(post().to(auth::change_password)));
}
