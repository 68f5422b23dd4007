pub mod admin;
pub mod comment;
pub mod customer;
pub mod engineer;
pub mod login_attempt;
pub mod ticket;
pub mod user_otp;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug)]
pub struct UnrecognizedVariant(pub &'static str);

impl std::error::Error for UnrecognizedVariant {}

impl fmt::Display for UnrecognizedVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unrecognized {}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Customer,
    Engineer,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Customer => "customer",
            UserRole::Engineer => "engineer",
            UserRole::Admin => "admin",
        }
    }
}

impl FromStr for UserRole {
    type Err = UnrecognizedVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(UserRole::Customer),
            "engineer" => Ok(UserRole::Engineer),
            "admin" => Ok(UserRole::Admin),
            _ => Err(UnrecognizedVariant("user role")),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum TicketType {
    #[serde(rename = "Service Request")]
    ServiceRequest,
    #[serde(rename = "Faulty Ticket")]
    FaultyTicket,
}

impl TicketType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketType::ServiceRequest => "Service Request",
            TicketType::FaultyTicket => "Faulty Ticket",
        }
    }
}

impl FromStr for TicketType {
    type Err = UnrecognizedVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Service Request" => Ok(TicketType::ServiceRequest),
            "Faulty Ticket" => Ok(TicketType::FaultyTicket),
            _ => Err(UnrecognizedVariant("ticket type")),
        }
    }
}

impl fmt::Display for TicketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum TicketPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::Low => "Low",
            TicketPriority::Medium => "Medium",
            TicketPriority::High => "High",
            TicketPriority::Critical => "Critical",
        }
    }
}

impl FromStr for TicketPriority {
    type Err = UnrecognizedVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(TicketPriority::Low),
            "Medium" => Ok(TicketPriority::Medium),
            "High" => Ok(TicketPriority::High),
            "Critical" => Ok(TicketPriority::Critical),
            _ => Err(UnrecognizedVariant("ticket priority")),
        }
    }
}

impl fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum TicketStatus {
    Pending,
    Ongoing,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Pending => "Pending",
            TicketStatus::Ongoing => "Ongoing",
            TicketStatus::Closed => "Closed",
        }
    }
}

impl FromStr for TicketStatus {
    type Err = UnrecognizedVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(TicketStatus::Pending),
            "Ongoing" => Ok(TicketStatus::Ongoing),
            "Closed" => Ok(TicketStatus::Closed),
            _ => Err(UnrecognizedVariant("ticket status")),
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OtpPurpose {
    PasswordReset,
    AdminSignin,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::PasswordReset => "password_reset",
            OtpPurpose::AdminSignin => "admin_signin",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_round_trips() {
        for role in [UserRole::Customer, UserRole::Engineer, UserRole::Admin] {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
        }

        for ticket_type in [TicketType::ServiceRequest, TicketType::FaultyTicket] {
            assert_eq!(
                ticket_type.as_str().parse::<TicketType>().unwrap(),
                ticket_type
            );
        }

        for status in [
            TicketStatus::Pending,
            TicketStatus::Ongoing,
            TicketStatus::Closed,
        ] {
            assert_eq!(status.as_str().parse::<TicketStatus>().unwrap(), status);
        }

        for priority in [
            TicketPriority::Low,
            TicketPriority::Medium,
            TicketPriority::High,
            TicketPriority::Critical,
        ] {
            assert_eq!(
                priority.as_str().parse::<TicketPriority>().unwrap(),
                priority
            );
        }

        assert!("Urgent".parse::<TicketPriority>().is_err());
        assert!("pending".parse::<TicketStatus>().is_err());
        assert!("root".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_role_serde_representation() {
        let serialized = serde_json::to_string(&UserRole::Engineer).unwrap();
        assert_eq!(serialized, "\"engineer\"");

        let deserialized: UserRole = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(deserialized, UserRole::Admin);
    }
}
