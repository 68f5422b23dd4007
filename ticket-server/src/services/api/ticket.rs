use actix_web::web::*;

use crate::handlers::ticket;

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        resource("/customer/tickets/{ticket_id}/comments")
            .route(get().to(ticket::get_comments))
            .route(post().to(ticket::post_comment)),
    )
    .service(
        resource("/engineer/tickets/{ticket_id}/comments")
            .route(get().to(ticket::get_comments))
            .route(post().to(ticket::post_comment)),
    )
    .service(
        scope("/ticket")
            .service(resource("/sr").route(post().to(ticket::create_service_request)))
            .service(resource("/ft").route(post().to(ticket::create_faulty_ticket)))
            .service(resource("/pending").route(get().to(ticket::pending_tickets)))
            .service(resource("/assigned").route(get().to(ticket::assigned_tickets)))
            .service(resource("/mine").route(get().to(ticket::my_tickets)))
            .service(resource("/history/all").route(get().to(ticket::ticket_history)))
            .service(resource("/assign/{ticket_id}").route(put().to(ticket::assign_ticket)))
            .service(resource("/close/{ticket_id}").route(post().to(ticket::close_ticket)))
            .service(
                resource("/{ticket_id}")
                    .route(get().to(ticket::ticket_detail))
                    .route(delete().to(ticket::delete_ticket)),
            ),
    );
}
