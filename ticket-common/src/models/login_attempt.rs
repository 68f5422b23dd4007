use diesel::{Insertable, Queryable};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::schema::login_attempts;

#[derive(Clone, Debug, Serialize, Deserialize, Identifiable, Queryable)]
#[diesel(table_name = login_attempts, primary_key(email))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct LoginAttempt {
    pub email: String,
    pub attempt_count: i32,
    pub last_failure_timestamp: SystemTime,
    pub locked_until: Option<SystemTime>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = login_attempts, primary_key(email))]
pub struct NewLoginAttempt<'a> {
    pub email: &'a str,
    pub attempt_count: i32,
    pub last_failure_timestamp: SystemTime,
    pub locked_until: Option<SystemTime>,
}
