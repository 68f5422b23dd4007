use actix_web::web::*;

use crate::handlers::user;

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/customer")
            .service(
                resource("")
                    .route(post().to(user::create_customer))
                    .route(get().to(user::list_customers)),
            )
            .service(
                resource("/profile")
                    .route(get().to(user::get_profile))
                    .route(put().to(user::update_profile)),
            )
            .service(resource("/profile-image").route(put().to(user::upload_profile_image)))
            .service(resource("/{account_id}").route(delete().to(user::delete_customer))),
    )
    .service(
        scope("/engineer")
            .service(
                resource("")
                    .route(post().to(user::create_engineer))
                    .route(get().to(user::list_engineers)),
            )
            .service(
                resource("/customers/grouped")
                    .route(get().to(user::customers_grouped_by_company)),
            )
            .service(
                resource("/profile")
                    .route(get().to(user::get_profile))
                    .route(put().to(user::update_profile)),
            )
            .service(resource("/profile-image").route(put().to(user::upload_profile_image)))
            .service(resource("/{account_id}").route(delete().to(user::delete_engineer))),
    )
    .service(
        scope("/admin")
            .service(resource("").route(get().to(user::list_admins)))
            .service(resource("/register").route(post().to(user::create_admin)))
            .service(
                resource("/profile")
                    .route(get().to(user::get_profile))
                    .route(put().to(user::update_profile)),
            )
            .service(resource("/{account_id}").route(delete().to(user::delete_admin))),
    );
}
