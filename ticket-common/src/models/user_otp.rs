use diesel::{Insertable, Queryable};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::schema::otps;

#[derive(Clone, Debug, Serialize, Deserialize, Identifiable, Queryable)]
#[diesel(table_name = otps, primary_key(user_email, purpose))]
pub struct UserOtp {
    pub user_email: String,
    pub purpose: String,
    pub otp: String,
    pub expiration: SystemTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = otps, primary_key(user_email, purpose))]
pub struct NewUserOtp<'a> {
    pub user_email: &'a str,
    pub purpose: &'a str,
    pub otp: &'a str,
    pub expiration: SystemTime,
}
