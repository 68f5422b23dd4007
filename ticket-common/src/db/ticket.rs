use diesel::{dsl, ExpressionMethods, OptionalExtension, QueryDsl, RunQueryDsl};
use std::time::SystemTime;

use crate::db::{DaoError, DbThreadPool};
use crate::models::comment::{Comment, NewComment};
use crate::models::ticket::{NewTicket, Ticket};
use crate::models::TicketStatus;
use crate::schema::comments as comment_fields;
use crate::schema::comments::dsl::comments;
use crate::schema::tickets as ticket_fields;
use crate::schema::tickets::dsl::tickets;

pub struct Dao {
    db_thread_pool: DbThreadPool,
}

impl Dao {
    pub fn new(db_thread_pool: &DbThreadPool) -> Self {
        Self {
            db_thread_pool: db_thread_pool.clone(),
        }
    }

    pub fn create_ticket(&self, new_ticket: &NewTicket) -> Result<Ticket, DaoError> {
        Ok(dsl::insert_into(tickets)
            .values(new_ticket)
            .get_result::<Ticket>(&mut self.db_thread_pool.get()?)?)
    }

    pub fn get_ticket(&self, ticket_id: i32) -> Result<Option<Ticket>, DaoError> {
        Ok(tickets
            .find(ticket_id)
            .get_result::<Ticket>(&mut self.db_thread_pool.get()?)
            .optional()?)
    }

    pub fn all_tickets(&self) -> Result<Vec<Ticket>, DaoError> {
        Ok(tickets
            .order(ticket_fields::created_timestamp.desc())
            .load::<Ticket>(&mut self.db_thread_pool.get()?)?)
    }

    pub fn pending_tickets(&self) -> Result<Vec<Ticket>, DaoError> {
        Ok(tickets
            .filter(ticket_fields::status.eq(TicketStatus::Pending.as_str()))
            .order(ticket_fields::created_timestamp.desc())
            .load::<Ticket>(&mut self.db_thread_pool.get()?)?)
    }

    pub fn tickets_for_requester(&self, requester_id: i32) -> Result<Vec<Ticket>, DaoError> {
        Ok(tickets
            .filter(ticket_fields::requester_id.eq(requester_id))
            .order(ticket_fields::created_timestamp.desc())
            .load::<Ticket>(&mut self.db_thread_pool.get()?)?)
    }

    pub fn tickets_for_company(&self, company: &str) -> Result<Vec<Ticket>, DaoError> {
        Ok(tickets
            .filter(ticket_fields::requester_company.eq(company))
            .order(ticket_fields::created_timestamp.desc())
            .load::<Ticket>(&mut self.db_thread_pool.get()?)?)
    }

    pub fn ongoing_tickets_for_engineer(&self, engineer_id: i32) -> Result<Vec<Ticket>, DaoError> {
        Ok(tickets
            .filter(ticket_fields::engineer_id.eq(engineer_id))
            .filter(ticket_fields::status.eq(TicketStatus::Ongoing.as_str()))
            .order(ticket_fields::created_timestamp.desc())
            .load::<Ticket>(&mut self.db_thread_pool.get()?)?)
    }

    /// Moves a ticket to Ongoing and records the assigned engineer. The
    /// status guard is part of the UPDATE itself, so a ticket that was closed
    /// concurrently is left untouched and `None` is returned.
    pub fn assign_ticket(
        &self,
        ticket_id: i32,
        engineer_id: i32,
        engineer_name: &str,
        engineer_contact: &str,
    ) -> Result<Option<Ticket>, DaoError> {
        Ok(dsl::update(
            tickets
                .find(ticket_id)
                .filter(ticket_fields::status.ne(TicketStatus::Closed.as_str())),
        )
        .set((
            ticket_fields::status.eq(TicketStatus::Ongoing.as_str()),
            ticket_fields::engineer_id.eq(engineer_id),
            ticket_fields::engineer_name.eq(engineer_name),
            ticket_fields::engineer_contact.eq(engineer_contact),
        ))
        .get_result::<Ticket>(&mut self.db_thread_pool.get()?)
        .optional()?)
    }

    /// Same single-statement guard as `assign_ticket`; closing an
    /// already-closed ticket affects no rows.
    pub fn close_ticket(
        &self,
        ticket_id: i32,
        work_done: &str,
        rectification_timestamp: Option<SystemTime>,
        now: SystemTime,
    ) -> Result<Option<Ticket>, DaoError> {
        Ok(dsl::update(
            tickets
                .find(ticket_id)
                .filter(ticket_fields::status.ne(TicketStatus::Closed.as_str())),
        )
        .set((
            ticket_fields::status.eq(TicketStatus::Closed.as_str()),
            ticket_fields::work_done.eq(work_done),
            ticket_fields::rectification_timestamp.eq(rectification_timestamp),
            ticket_fields::closed_timestamp.eq(now),
        ))
        .get_result::<Ticket>(&mut self.db_thread_pool.get()?)
        .optional()?)
    }

    /// Comments are removed with the ticket via the FK cascade.
    pub fn delete_ticket(&self, ticket_id: i32) -> Result<usize, DaoError> {
        Ok(diesel::delete(tickets.find(ticket_id)).execute(&mut self.db_thread_pool.get()?)?)
    }

    pub fn create_comment(&self, new_comment: &NewComment) -> Result<Comment, DaoError> {
        Ok(dsl::insert_into(comments)
            .values(new_comment)
            .get_result::<Comment>(&mut self.db_thread_pool.get()?)?)
    }

    pub fn comments_for_ticket(&self, ticket_id: i32) -> Result<Vec<Comment>, DaoError> {
        Ok(comments
            .filter(comment_fields::ticket_id.eq(ticket_id))
            .order(comment_fields::created_timestamp.asc())
            .load::<Comment>(&mut self.db_thread_pool.get()?)?)
    }
}
