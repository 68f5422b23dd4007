use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures::TryStreamExt;
use std::str::FromStr;
use std::time::SystemTime;

use ticket_common::civil_time;
use ticket_common::db::{self, DbThreadPool};
use ticket_common::email::dispatcher::{EmailDispatcher, OutboundEmail};
use ticket_common::email::templates::{
    NewTicketAlertMessage, TicketAssignedMessage, TicketReceivedMessage,
};
use ticket_common::models::comment::NewComment;
use ticket_common::models::ticket::{NewTicket, Ticket};
use ticket_common::models::{TicketPriority, TicketStatus, TicketType, UserRole};
use ticket_common::request_io::{
    InputCloseTicket, InputComment, OutputComment, OutputMessage, OutputTicket,
    OutputTicketBuckets, OutputTicketDetail,
};

use crate::env;
use crate::handlers::error::HttpErrorResponse;
use crate::handlers::uploads;
use crate::middleware::auth::{Access, VerifiedToken};
use crate::middleware::FromBearerHeader;

type AccessToken = VerifiedToken<Access, FromBearerHeader>;

fn require_engineer_or_admin(token: &AccessToken) -> Result<(), HttpErrorResponse> {
    match token.claims.user_role {
        UserRole::Engineer | UserRole::Admin => Ok(()),
        UserRole::Customer => Err(HttpErrorResponse::Forbidden(String::from(
            "This endpoint is not available to the signed-in role",
        ))),
    }
}

struct TicketForm {
    subject: String,
    description: String,
    priority: TicketPriority,
    document: Option<String>,
}

/// Pulls `subject`, `description`, and `priority` text fields plus an
/// optional `document` file out of the multipart payload. The file lands in
/// the uploads directory before the ticket row exists; an orphaned file on a
/// later failure is harmless.
async fn parse_ticket_form(mut payload: Multipart) -> Result<TicketForm, HttpErrorResponse> {
    let mut subject: Option<String> = None;
    let mut description: Option<String> = None;
    let mut priority: Option<String> = None;
    let mut document: Option<String> = None;

    while let Some(mut field) = payload.try_next().await.map_err(|_| {
        HttpErrorResponse::ValidationError(String::from("Invalid multipart payload"))
    })? {
        let is_file = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .is_some();
        let name = field.name().unwrap_or_default().to_owned();

        if is_file {
            if name == "document" && document.is_none() {
                document = Some(uploads::store_uploaded_file(&mut field).await?);
            }

            continue;
        }

        let value = read_text_field(&mut field).await?;

        match name.as_str() {
            "subject" => subject = Some(value),
            "description" => description = Some(value),
            "priority" => priority = Some(value),
            _ => (),
        }
    }

    let subject = require_field(subject, "subject")?;
    let description = require_field(description, "description")?;
    let priority = require_field(priority, "priority")?;

    let priority = TicketPriority::from_str(&priority).map_err(|_| {
        HttpErrorResponse::ValidationError(String::from("Unrecognized ticket priority"))
    })?;

    Ok(TicketForm {
        subject,
        description,
        priority,
        document,
    })
}

fn require_field(value: Option<String>, name: &str) -> Result<String, HttpErrorResponse> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(HttpErrorResponse::ValidationError(format!(
            "Field '{name}' is required",
        ))),
    }
}

async fn read_text_field(
    field: &mut actix_multipart::Field,
) -> Result<String, HttpErrorResponse> {
    let mut contents: Vec<u8> = Vec::new();

    while let Some(chunk) = field.try_next().await.map_err(|_| {
        HttpErrorResponse::ValidationError(String::from("Invalid multipart payload"))
    })? {
        if contents.len() + chunk.len() > uploads::MAX_UPLOAD_BYTES {
            return Err(HttpErrorResponse::InputTooLarge(String::from(
                "Form field is too large",
            )));
        }

        contents.extend_from_slice(&chunk);
    }

    String::from_utf8(contents).map_err(|_| {
        HttpErrorResponse::ValidationError(String::from("Form fields must be valid UTF-8"))
    })
}

async fn create_ticket_of_type(
    ticket_type: TicketType,
    token: AccessToken,
    payload: Multipart,
    db_thread_pool: web::Data<DbThreadPool>,
    dispatcher: web::Data<EmailDispatcher>,
) -> Result<HttpResponse, HttpErrorResponse> {
    token.require_role(UserRole::Customer)?;

    let form = parse_ticket_form(payload).await?;
    let claims = token.claims;

    let ticket_dao = db::ticket::Dao::new(&db_thread_pool);
    let ticket = match web::block(move || {
        ticket_dao.create_ticket(&NewTicket {
            ticket_type: ticket_type.as_str(),
            subject: &form.subject,
            description: &form.description,
            priority: form.priority.as_str(),
            status: TicketStatus::Pending.as_str(),
            document: form.document.as_deref(),
            requester_id: claims.user_id,
            requester_name: &claims.user_name,
            requester_email: &claims.user_email,
            requester_mobile: claims.mobile.as_deref(),
            requester_company: claims.company.as_deref(),
            created_timestamp: SystemTime::now(),
        })
    })
    .await?
    {
        Ok(t) => t,
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to create ticket",
            )));
        }
    };

    let reference = ticket.reference();

    let (body_html, body_text) = TicketReceivedMessage::generate(
        &ticket.requester_name,
        &reference,
        &ticket.ticket_type,
        &ticket.subject,
    );
    dispatcher.enqueue(OutboundEmail {
        destination: ticket.requester_email.clone(),
        subject: format!("We received your ticket {reference}"),
        body_html,
        body_text,
    });

    let (body_html, body_text) = NewTicketAlertMessage::generate(
        &reference,
        &ticket.ticket_type,
        &ticket.subject,
        &ticket.priority,
    );
    dispatcher.enqueue(OutboundEmail {
        destination: env::CONF.engineer_pool_address.clone(),
        subject: format!("New ticket {reference}"),
        body_html,
        body_text,
    });

    Ok(HttpResponse::Created().json(OutputTicket::from_ticket(
        ticket,
        env::CONF.display_time_zone,
    )))
}

pub async fn create_service_request(
    db_thread_pool: web::Data<DbThreadPool>,
    dispatcher: web::Data<EmailDispatcher>,
    token: AccessToken,
    payload: Multipart,
) -> Result<HttpResponse, HttpErrorResponse> {
    create_ticket_of_type(
        TicketType::ServiceRequest,
        token,
        payload,
        db_thread_pool,
        dispatcher,
    )
    .await
}

pub async fn create_faulty_ticket(
    db_thread_pool: web::Data<DbThreadPool>,
    dispatcher: web::Data<EmailDispatcher>,
    token: AccessToken,
    payload: Multipart,
) -> Result<HttpResponse, HttpErrorResponse> {
    create_ticket_of_type(
        TicketType::FaultyTicket,
        token,
        payload,
        db_thread_pool,
        dispatcher,
    )
    .await
}

fn to_output_tickets(tickets: Vec<Ticket>) -> Vec<OutputTicket> {
    tickets
        .into_iter()
        .map(|t| OutputTicket::from_ticket(t, env::CONF.display_time_zone))
        .collect()
}

pub async fn pending_tickets(
    db_thread_pool: web::Data<DbThreadPool>,
    token: AccessToken,
) -> Result<HttpResponse, HttpErrorResponse> {
    require_engineer_or_admin(&token)?;

    let ticket_dao = db::ticket::Dao::new(&db_thread_pool);
    match web::block(move || ticket_dao.pending_tickets()).await? {
        Ok(tickets) => Ok(HttpResponse::Ok().json(to_output_tickets(tickets))),
        Err(e) => {
            log::error!("{e}");
            Err(HttpErrorResponse::InternalError(String::from(
                "Failed to list pending tickets",
            )))
        }
    }
}

pub async fn assigned_tickets(
    db_thread_pool: web::Data<DbThreadPool>,
    token: AccessToken,
) -> Result<HttpResponse, HttpErrorResponse> {
    token.require_role(UserRole::Engineer)?;

    let engineer_id = token.claims.user_id;
    let ticket_dao = db::ticket::Dao::new(&db_thread_pool);
    match web::block(move || ticket_dao.ongoing_tickets_for_engineer(engineer_id)).await? {
        Ok(tickets) => Ok(HttpResponse::Ok().json(to_output_tickets(tickets))),
        Err(e) => {
            log::error!("{e}");
            Err(HttpErrorResponse::InternalError(String::from(
                "Failed to list assigned tickets",
            )))
        }
    }
}

/// The customer view: open work for the caller's company, bucketed by status
/// and ticket type. Customers with no company on file see their own tickets.
pub async fn my_tickets(
    db_thread_pool: web::Data<DbThreadPool>,
    token: AccessToken,
) -> Result<HttpResponse, HttpErrorResponse> {
    token.require_role(UserRole::Customer)?;

    let company = token.claims.company.clone();
    let requester_id = token.claims.user_id;

    let ticket_dao = db::ticket::Dao::new(&db_thread_pool);
    let tickets = match web::block(move || match company {
        Some(company) => ticket_dao.tickets_for_company(&company),
        None => ticket_dao.tickets_for_requester(requester_id),
    })
    .await?
    {
        Ok(t) => t,
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to list tickets",
            )));
        }
    };

    let mut buckets = OutputTicketBuckets {
        pending_service_requests: Vec::new(),
        pending_faulty_tickets: Vec::new(),
        ongoing_service_requests: Vec::new(),
        ongoing_faulty_tickets: Vec::new(),
    };

    for ticket in tickets {
        let is_service_request = ticket.ticket_type == TicketType::ServiceRequest.as_str();
        let output = OutputTicket::from_ticket(ticket, env::CONF.display_time_zone);

        match (output.status.as_str(), is_service_request) {
            ("Pending", true) => buckets.pending_service_requests.push(output),
            ("Pending", false) => buckets.pending_faulty_tickets.push(output),
            ("Ongoing", true) => buckets.ongoing_service_requests.push(output),
            ("Ongoing", false) => buckets.ongoing_faulty_tickets.push(output),
            _ => (),
        }
    }

    Ok(HttpResponse::Ok().json(buckets))
}

pub async fn ticket_history(
    db_thread_pool: web::Data<DbThreadPool>,
    token: AccessToken,
) -> Result<HttpResponse, HttpErrorResponse> {
    token.require_role(UserRole::Admin)?;

    let ticket_dao = db::ticket::Dao::new(&db_thread_pool);
    match web::block(move || ticket_dao.all_tickets()).await? {
        Ok(tickets) => Ok(HttpResponse::Ok().json(to_output_tickets(tickets))),
        Err(e) => {
            log::error!("{e}");
            Err(HttpErrorResponse::InternalError(String::from(
                "Failed to list tickets",
            )))
        }
    }
}

async fn fetch_ticket(
    ticket_id: i32,
    db_thread_pool: &DbThreadPool,
) -> Result<Option<Ticket>, HttpErrorResponse> {
    let ticket_dao = db::ticket::Dao::new(db_thread_pool);
    match web::block(move || ticket_dao.get_ticket(ticket_id)).await? {
        Ok(t) => Ok(t),
        Err(e) => {
            log::error!("{e}");
            Err(HttpErrorResponse::InternalError(String::from(
                "Failed to look up ticket",
            )))
        }
    }
}

/// A customer may only see tickets raised by their own company; a missing
/// ticket and a foreign ticket are indistinguishable in the response.
fn check_ticket_visibility(ticket: &Ticket, token: &AccessToken) -> Result<(), HttpErrorResponse> {
    if token.claims.user_role != UserRole::Customer {
        return Ok(());
    }

    let visible = match (&ticket.requester_company, &token.claims.company) {
        (Some(ticket_company), Some(claims_company)) => ticket_company == claims_company,
        _ => ticket.requester_id == token.claims.user_id,
    };

    if visible {
        Ok(())
    } else {
        Err(HttpErrorResponse::DoesNotExist(String::from(
            "No such ticket",
        )))
    }
}

pub async fn ticket_detail(
    db_thread_pool: web::Data<DbThreadPool>,
    token: AccessToken,
    ticket_id: web::Path<i32>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let ticket = fetch_ticket(*ticket_id, &db_thread_pool)
        .await?
        .ok_or_else(|| HttpErrorResponse::DoesNotExist(String::from("No such ticket")))?;

    check_ticket_visibility(&ticket, &token)?;

    let ticket_id = ticket.id;
    let ticket_dao = db::ticket::Dao::new(&db_thread_pool);
    let comments = match web::block(move || ticket_dao.comments_for_ticket(ticket_id)).await? {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to load comments",
            )));
        }
    };

    Ok(HttpResponse::Ok().json(OutputTicketDetail {
        ticket: OutputTicket::from_ticket(ticket, env::CONF.display_time_zone),
        comments: comments
            .into_iter()
            .map(|c| OutputComment::from_comment(c, env::CONF.display_time_zone))
            .collect(),
    }))
}

/// Distinguishes "no such ticket" from "ticket is closed" after a
/// conditional update matched zero rows.
async fn closed_or_missing(
    ticket_id: i32,
    db_thread_pool: &DbThreadPool,
) -> HttpErrorResponse {
    match fetch_ticket(ticket_id, db_thread_pool).await {
        Ok(Some(_)) => {
            HttpErrorResponse::AlreadyClosed(String::from("The ticket has already been closed"))
        }
        Ok(None) => HttpErrorResponse::DoesNotExist(String::from("No such ticket")),
        Err(e) => e,
    }
}

pub async fn assign_ticket(
    db_thread_pool: web::Data<DbThreadPool>,
    dispatcher: web::Data<EmailDispatcher>,
    token: AccessToken,
    ticket_id: web::Path<i32>,
) -> Result<HttpResponse, HttpErrorResponse> {
    token.require_role(UserRole::Engineer)?;

    let ticket_id = *ticket_id;
    let engineer_id = token.claims.user_id;
    let engineer_name = token.claims.user_name.clone();
    let engineer_contact = token
        .claims
        .mobile
        .clone()
        .unwrap_or_else(|| token.claims.user_email.clone());

    let contact = engineer_contact.clone();
    let ticket_dao = db::ticket::Dao::new(&db_thread_pool);
    let updated = match web::block(move || {
        ticket_dao.assign_ticket(ticket_id, engineer_id, &engineer_name, &contact)
    })
    .await?
    {
        Ok(t) => t,
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to assign ticket",
            )));
        }
    };

    let Some(ticket) = updated else {
        return Err(closed_or_missing(ticket_id, &db_thread_pool).await);
    };

    let reference = ticket.reference();
    let (body_html, body_text) = TicketAssignedMessage::generate(
        &ticket.requester_name,
        &reference,
        ticket.engineer_name.as_deref().unwrap_or_default(),
        &engineer_contact,
    );
    dispatcher.enqueue(OutboundEmail {
        destination: ticket.requester_email.clone(),
        subject: format!("An engineer has been assigned to {reference}"),
        body_html,
        body_text,
    });

    Ok(HttpResponse::Ok().json(OutputTicket::from_ticket(
        ticket,
        env::CONF.display_time_zone,
    )))
}

pub async fn close_ticket(
    db_thread_pool: web::Data<DbThreadPool>,
    token: AccessToken,
    ticket_id: web::Path<i32>,
    input: web::Json<InputCloseTicket>,
) -> Result<HttpResponse, HttpErrorResponse> {
    token.require_role(UserRole::Engineer)?;

    if input.work_done.trim().is_empty() {
        return Err(HttpErrorResponse::ValidationError(String::from(
            "Field 'work_done' is required",
        )));
    }

    let rectification_timestamp =
        civil_time::parse_civil(&input.rectification_date, env::CONF.display_time_zone).map_err(
            |_| {
                HttpErrorResponse::ValidationError(String::from(
                    "Field 'rectification_date' is not a recognizable date",
                ))
            },
        )?;

    let ticket_id = *ticket_id;
    let work_done = input.work_done.clone();
    let ticket_dao = db::ticket::Dao::new(&db_thread_pool);
    let updated = match web::block(move || {
        ticket_dao.close_ticket(
            ticket_id,
            &work_done,
            Some(rectification_timestamp),
            SystemTime::now(),
        )
    })
    .await?
    {
        Ok(t) => t,
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to close ticket",
            )));
        }
    };

    let Some(ticket) = updated else {
        return Err(closed_or_missing(ticket_id, &db_thread_pool).await);
    };

    Ok(HttpResponse::Ok().json(OutputTicket::from_ticket(
        ticket,
        env::CONF.display_time_zone,
    )))
}

pub async fn delete_ticket(
    db_thread_pool: web::Data<DbThreadPool>,
    token: AccessToken,
    ticket_id: web::Path<i32>,
) -> Result<HttpResponse, HttpErrorResponse> {
    token.require_role(UserRole::Admin)?;

    let ticket_id = *ticket_id;
    let ticket_dao = db::ticket::Dao::new(&db_thread_pool);
    match web::block(move || ticket_dao.delete_ticket(ticket_id)).await? {
        Ok(0) => Err(HttpErrorResponse::DoesNotExist(String::from(
            "No such ticket",
        ))),
        Ok(_) => Ok(HttpResponse::Ok().json(OutputMessage {
            message: String::from("Ticket deleted"),
        })),
        Err(e) => {
            log::error!("{e}");
            Err(HttpErrorResponse::InternalError(String::from(
                "Failed to delete ticket",
            )))
        }
    }
}

async fn comment_access(
    ticket_id: i32,
    token: &AccessToken,
    db_thread_pool: &DbThreadPool,
) -> Result<Ticket, HttpErrorResponse> {
    let ticket = fetch_ticket(ticket_id, db_thread_pool)
        .await?
        .ok_or_else(|| HttpErrorResponse::DoesNotExist(String::from("No such ticket")))?;

    check_ticket_visibility(&ticket, token)?;

    Ok(ticket)
}

pub async fn get_comments(
    db_thread_pool: web::Data<DbThreadPool>,
    token: AccessToken,
    ticket_id: web::Path<i32>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let ticket = comment_access(*ticket_id, &token, &db_thread_pool).await?;

    let ticket_id = ticket.id;
    let ticket_dao = db::ticket::Dao::new(&db_thread_pool);
    match web::block(move || ticket_dao.comments_for_ticket(ticket_id)).await? {
        Ok(comments) => Ok(HttpResponse::Ok().json(
            comments
                .into_iter()
                .map(|c| OutputComment::from_comment(c, env::CONF.display_time_zone))
                .collect::<Vec<_>>(),
        )),
        Err(e) => {
            log::error!("{e}");
            Err(HttpErrorResponse::InternalError(String::from(
                "Failed to load comments",
            )))
        }
    }
}

pub async fn post_comment(
    db_thread_pool: web::Data<DbThreadPool>,
    token: AccessToken,
    ticket_id: web::Path<i32>,
    input: web::Json<InputComment>,
) -> Result<HttpResponse, HttpErrorResponse> {
    if input.content.trim().is_empty() {
        return Err(HttpErrorResponse::ValidationError(String::from(
            "Comment content must not be empty",
        )));
    }

    let ticket = comment_access(*ticket_id, &token, &db_thread_pool).await?;

    let ticket_id = ticket.id;
    let author_name = token.claims.user_name.clone();
    let author_role = token.claims.user_role;
    let content = input.content.clone();

    let ticket_dao = db::ticket::Dao::new(&db_thread_pool);
    let comment = match web::block(move || {
        ticket_dao.create_comment(&NewComment {
            ticket_id,
            author_name: &author_name,
            author_role: author_role.as_str(),
            content: &content,
            created_timestamp: SystemTime::now(),
        })
    })
    .await?
    {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to save comment",
            )));
        }
    };

    Ok(HttpResponse::Created().json(OutputComment::from_comment(
        comment,
        env::CONF.display_time_zone,
    )))
}
