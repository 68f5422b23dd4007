use diesel::{dsl, ExpressionMethods, OptionalExtension, QueryDsl, RunQueryDsl};

use crate::db::{DaoError, DbThreadPool};
use crate::models::admin::{Admin, NewAdmin};
use crate::models::customer::{Customer, NewCustomer};
use crate::models::engineer::{Engineer, NewEngineer};
use crate::models::UserRole;
use crate::schema::admins as admin_fields;
use crate::schema::admins::dsl::admins;
use crate::schema::customers as customer_fields;
use crate::schema::customers::dsl::customers;
use crate::schema::engineers as engineer_fields;
use crate::schema::engineers::dsl::engineers;

/// A role-independent view of an account row, used by sign-in, profile and
/// password flows that work the same way for all three roles.
#[derive(Clone, Debug)]
pub struct AccountSummary {
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
    pub password_hash: String,
}

impl From<Customer> for AccountSummary {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            role: UserRole::Customer,
            name: customer.name,
            email: customer.email,
            designation: customer.designation,
            mobile: customer.mobile,
            company: customer.company,
            address: customer.address,
            subscription: customer.subscription,
            profile_image: customer.profile_image,
            password_hash: customer.password_hash,
        }
    }
}

impl From<Engineer> for AccountSummary {
    fn from(engineer: Engineer) -> Self {
        Self {
            id: engineer.id,
            role: UserRole::Engineer,
            name: engineer.name,
            email: engineer.email,
            designation: Some(engineer.designation),
            mobile: Some(engineer.mobile),
            company: None,
            address: None,
            subscription: None,
            profile_image: engineer.profile_image,
            password_hash: engineer.password_hash,
        }
    }
}

impl From<Admin> for AccountSummary {
    fn from(admin: Admin) -> Self {
        Self {
            id: admin.id,
            role: UserRole::Admin,
            name: admin.name,
            email: admin.email,
            designation: None,
            mobile: Some(admin.mobile),
            company: None,
            address: None,
            subscription: None,
            profile_image: None,
            password_hash: admin.password_hash,
        }
    }
}

pub struct Dao {
    db_thread_pool: DbThreadPool,
}

impl Dao {
    pub fn new(db_thread_pool: &DbThreadPool) -> Self {
        Self {
            db_thread_pool: db_thread_pool.clone(),
        }
    }

    pub fn get_account_by_email(
        &self,
        role: UserRole,
        user_email: &str,
    ) -> Result<Option<AccountSummary>, DaoError> {
        let mut db_connection = self.db_thread_pool.get()?;

        let account = match role {
            UserRole::Customer => customers
                .filter(customer_fields::email.eq(user_email))
                .get_result::<Customer>(&mut db_connection)
                .optional()?
                .map(AccountSummary::from),
            UserRole::Engineer => engineers
                .filter(engineer_fields::email.eq(user_email))
                .get_result::<Engineer>(&mut db_connection)
                .optional()?
                .map(AccountSummary::from),
            UserRole::Admin => admins
                .filter(admin_fields::email.eq(user_email))
                .get_result::<Admin>(&mut db_connection)
                .optional()?
                .map(AccountSummary::from),
        };

        Ok(account)
    }

    pub fn get_account_by_id(
        &self,
        role: UserRole,
        account_id: i32,
    ) -> Result<Option<AccountSummary>, DaoError> {
        let mut db_connection = self.db_thread_pool.get()?;

        let account = match role {
            UserRole::Customer => customers
                .find(account_id)
                .get_result::<Customer>(&mut db_connection)
                .optional()?
                .map(AccountSummary::from),
            UserRole::Engineer => engineers
                .find(account_id)
                .get_result::<Engineer>(&mut db_connection)
                .optional()?
                .map(AccountSummary::from),
            UserRole::Admin => admins
                .find(account_id)
                .get_result::<Admin>(&mut db_connection)
                .optional()?
                .map(AccountSummary::from),
        };

        Ok(account)
    }

    pub fn create_customer(&self, new_customer: &NewCustomer) -> Result<i32, DaoError> {
        Ok(dsl::insert_into(customers)
            .values(new_customer)
            .returning(customer_fields::id)
            .get_result::<i32>(&mut self.db_thread_pool.get()?)?)
    }

    pub fn create_engineer(&self, new_engineer: &NewEngineer) -> Result<i32, DaoError> {
        Ok(dsl::insert_into(engineers)
            .values(new_engineer)
            .returning(engineer_fields::id)
            .get_result::<i32>(&mut self.db_thread_pool.get()?)?)
    }

    pub fn create_admin(&self, new_admin: &NewAdmin) -> Result<i32, DaoError> {
        Ok(dsl::insert_into(admins)
            .values(new_admin)
            .returning(admin_fields::id)
            .get_result::<i32>(&mut self.db_thread_pool.get()?)?)
    }

    pub fn list_customers(&self) -> Result<Vec<Customer>, DaoError> {
        Ok(customers
            .order(customer_fields::name.asc())
            .load::<Customer>(&mut self.db_thread_pool.get()?)?)
    }

    pub fn list_engineers(&self) -> Result<Vec<Engineer>, DaoError> {
        Ok(engineers
            .order(engineer_fields::name.asc())
            .load::<Engineer>(&mut self.db_thread_pool.get()?)?)
    }

    pub fn list_admins(&self) -> Result<Vec<Admin>, DaoError> {
        Ok(admins
            .order(admin_fields::name.asc())
            .load::<Admin>(&mut self.db_thread_pool.get()?)?)
    }

    pub fn delete_account(&self, role: UserRole, account_id: i32) -> Result<usize, DaoError> {
        let mut db_connection = self.db_thread_pool.get()?;

        let affected = match role {
            UserRole::Customer => {
                diesel::delete(customers.find(account_id)).execute(&mut db_connection)?
            }
            UserRole::Engineer => {
                diesel::delete(engineers.find(account_id)).execute(&mut db_connection)?
            }
            UserRole::Admin => {
                diesel::delete(admins.find(account_id)).execute(&mut db_connection)?
            }
        };

        Ok(affected)
    }

    pub fn update_password_hash(
        &self,
        role: UserRole,
        user_email: &str,
        password_hash: &str,
    ) -> Result<usize, DaoError> {
        let mut db_connection = self.db_thread_pool.get()?;

        let affected = match role {
            UserRole::Customer => {
                dsl::update(customers.filter(customer_fields::email.eq(user_email)))
                    .set(customer_fields::password_hash.eq(password_hash))
                    .execute(&mut db_connection)?
            }
            UserRole::Engineer => {
                dsl::update(engineers.filter(engineer_fields::email.eq(user_email)))
                    .set(engineer_fields::password_hash.eq(password_hash))
                    .execute(&mut db_connection)?
            }
            UserRole::Admin => dsl::update(admins.filter(admin_fields::email.eq(user_email)))
                .set(admin_fields::password_hash.eq(password_hash))
                .execute(&mut db_connection)?,
        };

        Ok(affected)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn update_customer_profile(
        &self,
        customer_id: i32,
        name: &str,
        designation: Option<&str>,
        mobile: Option<&str>,
        company: Option<&str>,
        address: Option<&str>,
        subscription: Option<&str>,
    ) -> Result<usize, DaoError> {
        Ok(dsl::update(customers.find(customer_id))
            .set((
                customer_fields::name.eq(name),
                customer_fields::designation.eq(designation),
                customer_fields::mobile.eq(mobile),
                customer_fields::company.eq(company),
                customer_fields::address.eq(address),
                customer_fields::subscription.eq(subscription),
            ))
            .execute(&mut self.db_thread_pool.get()?)?)
    }

    pub fn update_engineer_profile(
        &self,
        engineer_id: i32,
        name: &str,
        designation: &str,
        mobile: &str,
    ) -> Result<usize, DaoError> {
        Ok(dsl::update(engineers.find(engineer_id))
            .set((
                engineer_fields::name.eq(name),
                engineer_fields::designation.eq(designation),
                engineer_fields::mobile.eq(mobile),
            ))
            .execute(&mut self.db_thread_pool.get()?)?)
    }

    pub fn update_admin_profile(
        &self,
        admin_id: i32,
        name: &str,
        mobile: &str,
    ) -> Result<usize, DaoError> {
        Ok(dsl::update(admins.find(admin_id))
            .set((
                admin_fields::name.eq(name),
                admin_fields::mobile.eq(mobile),
            ))
            .execute(&mut self.db_thread_pool.get()?)?)
    }

    /// Admins have no profile image column; the handler rejects that case
    /// before reaching the DAO.
    pub fn set_profile_image(
        &self,
        role: UserRole,
        account_id: i32,
        filename: &str,
    ) -> Result<usize, DaoError> {
        let mut db_connection = self.db_thread_pool.get()?;

        let affected = match role {
            UserRole::Customer => dsl::update(customers.find(account_id))
                .set(customer_fields::profile_image.eq(filename))
                .execute(&mut db_connection)?,
            UserRole::Engineer => dsl::update(engineers.find(account_id))
                .set(engineer_fields::profile_image.eq(filename))
                .execute(&mut db_connection)?,
            UserRole::Admin => 0,
        };

        Ok(affected)
    }
}
