use chrono_tz::Tz;
use serde::Serialize;

use crate::civil_time::format_civil;
use crate::db::user::AccountSummary;
use crate::models::admin::Admin;
use crate::models::comment::Comment;
use crate::models::customer::Customer;
use crate::models::engineer::Engineer;
use crate::models::ticket::Ticket;
use crate::models::UserRole;

#[derive(Clone, Debug, Serialize)]
pub struct ServerErrorResponse {
    pub error_type: &'static str,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts_remaining: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_for_minutes: Option<u64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct OutputMessage {
    pub message: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct OutputAccount {
    pub id: i32,
    pub role: UserRole,
    pub name: String,
    pub email: String,
    pub designation: Option<String>,
    pub mobile: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub subscription: Option<String>,
    pub profile_image: Option<String>,
}

impl From<AccountSummary> for OutputAccount {
    fn from(account: AccountSummary) -> Self {
        Self {
            id: account.id,
            role: account.role,
            name: account.name,
            email: account.email,
            designation: account.designation,
            mobile: account.mobile,
            company: account.company,
            address: account.address,
            subscription: account.subscription,
            profile_image: account.profile_image,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct OutputSession {
    pub access_token: String,
    pub account: OutputAccount,
}

/// Returned by admin login in place of a session; the signin token plus a
/// correct OTP exchange for the real access token.
#[derive(Clone, Debug, Serialize)]
pub struct OutputSigninChallenge {
    pub signin_token: String,
    pub message: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct OutputResetToken {
    pub reset_token: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct OutputTicket {
    pub id: i32,
    pub reference: String,
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
    pub rectification_timestamp: Option<String>,
    pub created_timestamp: String,
    pub closed_timestamp: Option<String>,
}

impl OutputTicket {
    pub fn from_ticket(ticket: Ticket, zone: Tz) -> Self {
        Self {
            id: ticket.id,
            reference: ticket.reference(),
            ticket_type: ticket.ticket_type,
            subject: ticket.subject,
            description: ticket.description,
            priority: ticket.priority,
            status: ticket.status,
            document: ticket.document,
            requester_id: ticket.requester_id,
            requester_name: ticket.requester_name,
            requester_email: ticket.requester_email,
            requester_mobile: ticket.requester_mobile,
            requester_company: ticket.requester_company,
            engineer_id: ticket.engineer_id,
            engineer_name: ticket.engineer_name,
            engineer_contact: ticket.engineer_contact,
            work_done: ticket.work_done,
            rectification_timestamp: ticket
                .rectification_timestamp
                .map(|t| format_civil(t, zone)),
            created_timestamp: format_civil(ticket.created_timestamp, zone),
            closed_timestamp: ticket.closed_timestamp.map(|t| format_civil(t, zone)),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct OutputComment {
    pub id: i32,
    pub ticket_id: i32,
    pub author_name: String,
    pub author_role: String,
    pub content: String,
    pub created_timestamp: String,
}

impl OutputComment {
    pub fn from_comment(comment: Comment, zone: Tz) -> Self {
        Self {
            id: comment.id,
            ticket_id: comment.ticket_id,
            author_name: comment.author_name,
            author_role: comment.author_role,
            content: comment.content,
            created_timestamp: format_civil(comment.created_timestamp, zone),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct OutputTicketDetail {
    pub ticket: OutputTicket,
    pub comments: Vec<OutputComment>,
}

/// A customer's company-scoped view, split by status and ticket type.
#[derive(Clone, Debug, Serialize)]
pub struct OutputTicketBuckets {
    pub pending_service_requests: Vec<OutputTicket>,
    pub pending_faulty_tickets: Vec<OutputTicket>,
    pub ongoing_service_requests: Vec<OutputTicket>,
    pub ongoing_faulty_tickets: Vec<OutputTicket>,
}

#[derive(Clone, Debug, Serialize)]
pub struct OutputCustomer {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub designation: Option<String>,
    pub mobile: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub subscription: Option<String>,
    pub profile_image: Option<String>,
    pub created_timestamp: String,
}

impl OutputCustomer {
    pub fn from_customer(customer: Customer, zone: Tz) -> Self {
        Self {
            id: customer.id,
            name: customer.name,
            email: customer.email,
            designation: customer.designation,
            mobile: customer.mobile,
            company: customer.company,
            address: customer.address,
            subscription: customer.subscription,
            profile_image: customer.profile_image,
            created_timestamp: format_civil(customer.created_timestamp, zone),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct OutputEngineer {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub designation: String,
    pub mobile: String,
    pub profile_image: Option<String>,
    pub created_timestamp: String,
}

impl OutputEngineer {
    pub fn from_engineer(engineer: Engineer, zone: Tz) -> Self {
        Self {
            id: engineer.id,
            name: engineer.name,
            email: engineer.email,
            designation: engineer.designation,
            mobile: engineer.mobile,
            profile_image: engineer.profile_image,
            created_timestamp: format_civil(engineer.created_timestamp, zone),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct OutputAdmin {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub created_timestamp: String,
}

impl OutputAdmin {
    pub fn from_admin(admin: Admin, zone: Tz) -> Self {
        Self {
            id: admin.id,
            name: admin.name,
            email: admin.email,
            mobile: admin.mobile,
            created_timestamp: format_civil(admin.created_timestamp, zone),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct OutputCompanyCustomers {
    pub company: String,
    pub customers: Vec<OutputCustomer>,
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_output_ticket_renders_reference_and_civil_times() {
        let created = UNIX_EPOCH + Duration::from_secs(1_709_294_400);

        let ticket = Ticket {
            id: 42,
            ticket_type: String::from("Service Request"),
            subject: String::from("Printer down"),
            description: String::from("The office printer is jammed"),
            priority: String::from("High"),
            status: String::from("Pending"),
            document: None,
            requester_id: 7,
            requester_name: String::from("Nimal"),
            requester_email: String::from("a@b.com"),
            requester_mobile: Some(String::from("0771234567")),
            requester_company: Some(String::from("Acme")),
            engineer_id: None,
            engineer_name: None,
            engineer_contact: None,
            work_done: None,
            rectification_timestamp: None,
            created_timestamp: created,
            closed_timestamp: None,
        };

        let output = OutputTicket::from_ticket(ticket, chrono_tz::Asia::Colombo);

        assert_eq!(output.reference, "#000042");
        assert_eq!(output.created_timestamp, "2024-03-01 17:30:00");
        assert!(output.closed_timestamp.is_none());
        assert!(output.rectification_timestamp.is_none());
    }

    #[test]
    fn test_output_customer_renders_civil_created_time() {
        let created = UNIX_EPOCH + Duration::from_secs(1_709_294_400);

        let customer = Customer {
            id: 7,
            name: String::from("Nimal"),
            email: String::from("a@b.com"),
            designation: None,
            mobile: Some(String::from("0771234567")),
            company: Some(String::from("Acme")),
            address: None,
            subscription: None,
            profile_image: None,
            password_hash: String::from("not-a-real-hash"),
            created_timestamp: created,
        };

        let output = OutputCustomer::from_customer(customer, chrono_tz::Asia::Colombo);
        assert_eq!(output.created_timestamp, "2024-03-01 17:30:00");

        let serialized = serde_json::to_string(&output).unwrap();
        assert!(serialized.contains("\"created_timestamp\":\"2024-03-01 17:30:00\""));
        assert!(!serialized.contains("password_hash"));
    }

    #[test]
    fn test_error_response_omits_absent_extras() {
        let response = ServerErrorResponse {
            error_type: "incorrect_credentials",
            message: String::from("Incorrect email or password"),
            attempts_remaining: Some(2),
            locked_for_minutes: None,
        };

        let serialized = serde_json::to_string(&response).unwrap();
        assert!(serialized.contains("\"attempts_remaining\":2"));
        assert!(!serialized.contains("locked_for_minutes"));
    }
}
