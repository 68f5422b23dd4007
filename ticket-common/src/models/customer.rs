use diesel::{Insertable, Queryable};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::schema::customers;

#[derive(Clone, Debug, Serialize, Deserialize, Identifiable, Queryable)]
#[diesel(table_name = customers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Customer {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub designation: Option<String>,
    pub mobile: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub subscription: Option<String>,
    pub profile_image: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_timestamp: SystemTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = customers)]
pub struct NewCustomer<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub designation: Option<&'a str>,
    pub mobile: Option<&'a str>,
    pub company: Option<&'a str>,
    pub address: Option<&'a str>,
    pub subscription: Option<&'a str>,
    pub password_hash: &'a str,
    pub created_timestamp: SystemTime,
}
