use diesel::{Insertable, Queryable};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::schema::engineers;

#[derive(Clone, Debug, Serialize, Deserialize, Identifiable, Queryable)]
#[diesel(table_name = engineers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Engineer {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub designation: String,
    pub mobile: String,
    pub profile_image: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_timestamp: SystemTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = engineers)]
pub struct NewEngineer<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub designation: &'a str,
    pub mobile: &'a str,
    pub password_hash: &'a str,
    pub created_timestamp: SystemTime,
}
