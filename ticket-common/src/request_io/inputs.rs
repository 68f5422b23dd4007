use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct InputEmail {
    pub email: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct InputCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct InputOtp {
    pub otp: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct InputOtpVerification {
    pub email: String,
    pub otp: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct InputPasswordReset {
    pub email: String,
    pub reset_token: String,
    pub new_password: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct InputPasswordChange {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct InputNewCustomer {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub designation: Option<String>,
    pub mobile: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub subscription: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct InputNewEngineer {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub designation: String,
    pub mobile: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct InputNewAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub mobile: String,
}

/// Absent fields leave the stored value untouched.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct InputProfileUpdate {
    pub name: Option<String>,
    pub designation: Option<String>,
    pub mobile: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub subscription: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct InputComment {
    pub content: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct InputCloseTicket {
    pub work_done: String,
    pub rectification_date: String,
}
