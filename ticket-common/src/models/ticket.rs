use diesel::{Insertable, Queryable};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::schema::tickets;

/// Ticket ids are shown to users as a zero-padded reference such as `#000123`.
pub fn ticket_reference(id: i32) -> String {
    format!("#{:06}", id)
}

#[derive(Clone, Debug, Serialize, Deserialize, Identifiable, Queryable)]
#[diesel(table_name = tickets)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Ticket {
    pub id: i32,
    pub ticket_type: String,
    pub subject: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    pub document: Option<String>,
    pub requester_id: i32,
    pub requester_name: String,
    pub requester_email: String,
    pub requester_mobile: Option<String>,
    pub requester_company: Option<String>,
    pub engineer_id: Option<i32>,
    pub engineer_name: Option<String>,
    pub engineer_contact: Option<String>,
    pub work_done: Option<String>,
    pub rectification_timestamp: Option<SystemTime>,
    pub created_timestamp: SystemTime,
    pub closed_timestamp: Option<SystemTime>,
}

impl Ticket {
    pub fn reference(&self) -> String {
        ticket_reference(self.id)
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = tickets)]
pub struct NewTicket<'a> {
    pub ticket_type: &'a str,
    pub subject: &'a str,
    pub description: &'a str,
    pub priority: &'a str,
    pub status: &'a str,
    pub document: Option<&'a str>,
    pub requester_id: i32,
    pub requester_name: &'a str,
    pub requester_email: &'a str,
    pub requester_mobile: Option<&'a str>,
    pub requester_company: Option<&'a str>,
    pub created_timestamp: SystemTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_reference_padding() {
        assert_eq!(ticket_reference(7), "#000007");
        assert_eq!(ticket_reference(123), "#000123");
        assert_eq!(ticket_reference(999999), "#999999");
        assert_eq!(ticket_reference(1234567), "#1234567");
    }
}
