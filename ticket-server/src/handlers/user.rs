use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures::TryStreamExt;
use std::collections::BTreeMap;
use std::time::SystemTime;

use ticket_common::db::user::AccountSummary;
use ticket_common::db::{self, DbThreadPool};
use ticket_common::models::admin::NewAdmin;
use ticket_common::models::customer::NewCustomer;
use ticket_common::models::engineer::NewEngineer;
use ticket_common::models::UserRole;
use ticket_common::request_io::{
    InputNewAdmin, InputNewCustomer, InputNewEngineer, InputProfileUpdate, OutputAccount,
    OutputAdmin, OutputCompanyCustomers, OutputCustomer, OutputEngineer, OutputMessage,
};
use ticket_common::validators::{self, Validity};

use crate::env;
use crate::handlers::error::HttpErrorResponse;
use crate::handlers::{uploads, verification};
use crate::middleware::auth::{Access, VerifiedToken};
use crate::middleware::FromBearerHeader;

fn validate_new_credentials(
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<(), HttpErrorResponse> {
    if let Validity::Invalid(msg) = validators::validate_email_address(email) {
        return Err(HttpErrorResponse::ValidationError(msg));
    }

    if let Validity::Invalid(msg) = validators::validate_password(password) {
        return Err(HttpErrorResponse::ValidationError(msg));
    }

    if password != confirm_password {
        return Err(HttpErrorResponse::ValidationError(String::from(
            "Passwords do not match",
        )));
    }

    Ok(())
}

fn map_create_error(e: db::DaoError) -> HttpErrorResponse {
    if e.is_unique_violation() {
        HttpErrorResponse::AlreadyExists(String::from(
            "An account with that email address already exists",
        ))
    } else {
        log::error!("{e}");
        HttpErrorResponse::InternalError(String::from("Failed to create account"))
    }
}

pub async fn create_customer(
    db_thread_pool: web::Data<DbThreadPool>,
    new_customer: web::Json<InputNewCustomer>,
) -> Result<HttpResponse, HttpErrorResponse> {
    validate_new_credentials(
        &new_customer.email,
        &new_customer.password,
        &new_customer.confirm_password,
    )?;

    let password_hash = verification::hash_password(new_customer.password.clone()).await?;

    let user_dao = db::user::Dao::new(&db_thread_pool);
    match web::block(move || {
        user_dao.create_customer(&NewCustomer {
            name: &new_customer.name,
            email: &new_customer.email,
            designation: new_customer.designation.as_deref(),
            mobile: new_customer.mobile.as_deref(),
            company: new_customer.company.as_deref(),
            address: new_customer.address.as_deref(),
            subscription: new_customer.subscription.as_deref(),
            password_hash: &password_hash,
            created_timestamp: SystemTime::now(),
        })
    })
    .await?
    {
        Ok(_) => (),
        Err(e) => return Err(map_create_error(e)),
    };

    Ok(HttpResponse::Created().json(OutputMessage {
        message: String::from("Account created"),
    }))
}

pub async fn create_engineer(
    db_thread_pool: web::Data<DbThreadPool>,
    token: VerifiedToken<Access, FromBearerHeader>,
    new_engineer: web::Json<InputNewEngineer>,
) -> Result<HttpResponse, HttpErrorResponse> {
    token.require_role(UserRole::Admin)?;

    validate_new_credentials(
        &new_engineer.email,
        &new_engineer.password,
        &new_engineer.confirm_password,
    )?;

    let password_hash = verification::hash_password(new_engineer.password.clone()).await?;

    let user_dao = db::user::Dao::new(&db_thread_pool);
    match web::block(move || {
        user_dao.create_engineer(&NewEngineer {
            name: &new_engineer.name,
            email: &new_engineer.email,
            designation: &new_engineer.designation,
            mobile: &new_engineer.mobile,
            password_hash: &password_hash,
            created_timestamp: SystemTime::now(),
        })
    })
    .await?
    {
        Ok(_) => (),
        Err(e) => return Err(map_create_error(e)),
    };

    Ok(HttpResponse::Created().json(OutputMessage {
        message: String::from("Engineer account created"),
    }))
}

pub async fn create_admin(
    db_thread_pool: web::Data<DbThreadPool>,
    token: VerifiedToken<Access, FromBearerHeader>,
    new_admin: web::Json<InputNewAdmin>,
) -> Result<HttpResponse, HttpErrorResponse> {
    token.require_role(UserRole::Admin)?;

    validate_new_credentials(
        &new_admin.email,
        &new_admin.password,
        &new_admin.confirm_password,
    )?;

    let password_hash = verification::hash_password(new_admin.password.clone()).await?;

    let user_dao = db::user::Dao::new(&db_thread_pool);
    match web::block(move || {
        user_dao.create_admin(&NewAdmin {
            name: &new_admin.name,
            email: &new_admin.email,
            mobile: &new_admin.mobile,
            password_hash: &password_hash,
            created_timestamp: SystemTime::now(),
        })
    })
    .await?
    {
        Ok(_) => (),
        Err(e) => return Err(map_create_error(e)),
    };

    Ok(HttpResponse::Created().json(OutputMessage {
        message: String::from("Admin account created"),
    }))
}

async fn fetch_account(
    role: UserRole,
    account_id: i32,
    db_thread_pool: &DbThreadPool,
) -> Result<AccountSummary, HttpErrorResponse> {
    let user_dao = db::user::Dao::new(db_thread_pool);
    match web::block(move || user_dao.get_account_by_id(role, account_id)).await? {
        Ok(Some(a)) => Ok(a),
        Ok(None) => Err(HttpErrorResponse::DoesNotExist(String::from(
            "Account no longer exists",
        ))),
        Err(e) => {
            log::error!("{e}");
            Err(HttpErrorResponse::InternalError(String::from(
                "Failed to look up account",
            )))
        }
    }
}

pub async fn get_profile(
    db_thread_pool: web::Data<DbThreadPool>,
    token: VerifiedToken<Access, FromBearerHeader>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let account = fetch_account(
        token.claims.user_role,
        token.claims.user_id,
        &db_thread_pool,
    )
    .await?;

    Ok(HttpResponse::Ok().json(OutputAccount::from(account)))
}

/// Absent input fields keep their stored values.
pub async fn update_profile(
    db_thread_pool: web::Data<DbThreadPool>,
    token: VerifiedToken<Access, FromBearerHeader>,
    update: web::Json<InputProfileUpdate>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let role = token.claims.user_role;
    let account_id = token.claims.user_id;

    let current = fetch_account(role, account_id, &db_thread_pool).await?;
    let update = update.into_inner();

    let name = update.name.unwrap_or(current.name);
    let designation = update.designation.or(current.designation);
    let mobile = update.mobile.or(current.mobile);
    let company = update.company.or(current.company);
    let address = update.address.or(current.address);
    let subscription = update.subscription.or(current.subscription);

    let user_dao = db::user::Dao::new(&db_thread_pool);
    let update_result = match role {
        UserRole::Customer => {
            web::block(move || {
                user_dao.update_customer_profile(
                    account_id,
                    &name,
                    designation.as_deref(),
                    mobile.as_deref(),
                    company.as_deref(),
                    address.as_deref(),
                    subscription.as_deref(),
                )
            })
            .await?
        }
        UserRole::Engineer => {
            web::block(move || {
                user_dao.update_engineer_profile(
                    account_id,
                    &name,
                    designation.as_deref().unwrap_or_default(),
                    mobile.as_deref().unwrap_or_default(),
                )
            })
            .await?
        }
        UserRole::Admin => {
            web::block(move || {
                user_dao.update_admin_profile(account_id, &name, mobile.as_deref().unwrap_or_default())
            })
            .await?
        }
    };

    match update_result {
        Ok(0) => Err(HttpErrorResponse::DoesNotExist(String::from(
            "Account no longer exists",
        ))),
        Ok(_) => {
            let account = fetch_account(role, account_id, &db_thread_pool).await?;
            Ok(HttpResponse::Ok().json(OutputAccount::from(account)))
        }
        Err(e) => {
            log::error!("{e}");
            Err(HttpErrorResponse::InternalError(String::from(
                "Failed to update profile",
            )))
        }
    }
}

pub async fn list_customers(
    db_thread_pool: web::Data<DbThreadPool>,
    token: VerifiedToken<Access, FromBearerHeader>,
) -> Result<HttpResponse, HttpErrorResponse> {
    token.require_role(UserRole::Admin)?;

    let user_dao = db::user::Dao::new(&db_thread_pool);
    match web::block(move || user_dao.list_customers()).await? {
        Ok(customers) => Ok(HttpResponse::Ok().json(
            customers
                .into_iter()
                .map(|c| OutputCustomer::from_customer(c, env::CONF.display_time_zone))
                .collect::<Vec<_>>(),
        )),
        Err(e) => {
            log::error!("{e}");
            Err(HttpErrorResponse::InternalError(String::from(
                "Failed to list customers",
            )))
        }
    }
}

pub async fn list_engineers(
    db_thread_pool: web::Data<DbThreadPool>,
    token: VerifiedToken<Access, FromBearerHeader>,
) -> Result<HttpResponse, HttpErrorResponse> {
    token.require_role(UserRole::Admin)?;

    let user_dao = db::user::Dao::new(&db_thread_pool);
    match web::block(move || user_dao.list_engineers()).await? {
        Ok(engineers) => Ok(HttpResponse::Ok().json(
            engineers
                .into_iter()
                .map(|e| OutputEngineer::from_engineer(e, env::CONF.display_time_zone))
                .collect::<Vec<_>>(),
        )),
        Err(e) => {
            log::error!("{e}");
            Err(HttpErrorResponse::InternalError(String::from(
                "Failed to list engineers",
            )))
        }
    }
}

pub async fn list_admins(
    db_thread_pool: web::Data<DbThreadPool>,
    token: VerifiedToken<Access, FromBearerHeader>,
) -> Result<HttpResponse, HttpErrorResponse> {
    token.require_role(UserRole::Admin)?;

    let user_dao = db::user::Dao::new(&db_thread_pool);
    match web::block(move || user_dao.list_admins()).await? {
        Ok(admins) => Ok(HttpResponse::Ok().json(
            admins
                .into_iter()
                .map(|a| OutputAdmin::from_admin(a, env::CONF.display_time_zone))
                .collect::<Vec<_>>(),
        )),
        Err(e) => {
            log::error!("{e}");
            Err(HttpErrorResponse::InternalError(String::from(
                "Failed to list admins",
            )))
        }
    }
}

async fn delete_account_for_role(
    role: UserRole,
    account_id: i32,
    token: &VerifiedToken<Access, FromBearerHeader>,
    db_thread_pool: &DbThreadPool,
) -> Result<HttpResponse, HttpErrorResponse> {
    token.require_role(UserRole::Admin)?;

    let user_dao = db::user::Dao::new(db_thread_pool);
    match web::block(move || user_dao.delete_account(role, account_id)).await? {
        Ok(0) => Err(HttpErrorResponse::DoesNotExist(String::from(
            "No such account",
        ))),
        Ok(_) => Ok(HttpResponse::Ok().json(OutputMessage {
            message: String::from("Account deleted"),
        })),
        Err(e) => {
            log::error!("{e}");
            Err(HttpErrorResponse::InternalError(String::from(
                "Failed to delete account",
            )))
        }
    }
}

pub async fn delete_customer(
    db_thread_pool: web::Data<DbThreadPool>,
    token: VerifiedToken<Access, FromBearerHeader>,
    account_id: web::Path<i32>,
) -> Result<HttpResponse, HttpErrorResponse> {
    delete_account_for_role(UserRole::Customer, *account_id, &token, &db_thread_pool).await
}

pub async fn delete_engineer(
    db_thread_pool: web::Data<DbThreadPool>,
    token: VerifiedToken<Access, FromBearerHeader>,
    account_id: web::Path<i32>,
) -> Result<HttpResponse, HttpErrorResponse> {
    delete_account_for_role(UserRole::Engineer, *account_id, &token, &db_thread_pool).await
}

pub async fn delete_admin(
    db_thread_pool: web::Data<DbThreadPool>,
    token: VerifiedToken<Access, FromBearerHeader>,
    account_id: web::Path<i32>,
) -> Result<HttpResponse, HttpErrorResponse> {
    delete_account_for_role(UserRole::Admin, *account_id, &token, &db_thread_pool).await
}

pub async fn customers_grouped_by_company(
    db_thread_pool: web::Data<DbThreadPool>,
    token: VerifiedToken<Access, FromBearerHeader>,
) -> Result<HttpResponse, HttpErrorResponse> {
    token.require_role(UserRole::Engineer)?;

    let user_dao = db::user::Dao::new(&db_thread_pool);
    let customers = match web::block(move || user_dao.list_customers()).await? {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to list customers",
            )));
        }
    };

    let mut groups: BTreeMap<String, Vec<OutputCustomer>> = BTreeMap::new();
    for customer in customers {
        let company = customer
            .company
            .clone()
            .unwrap_or_else(|| String::from("Unaffiliated"));
        groups
            .entry(company)
            .or_default()
            .push(OutputCustomer::from_customer(
                customer,
                env::CONF.display_time_zone,
            ));
    }

    let output: Vec<OutputCompanyCustomers> = groups
        .into_iter()
        .map(|(company, customers)| OutputCompanyCustomers { company, customers })
        .collect();

    Ok(HttpResponse::Ok().json(output))
}

pub async fn upload_profile_image(
    db_thread_pool: web::Data<DbThreadPool>,
    token: VerifiedToken<Access, FromBearerHeader>,
    mut payload: Multipart,
) -> Result<HttpResponse, HttpErrorResponse> {
    let role = token.claims.user_role;

    if role == UserRole::Admin {
        return Err(HttpErrorResponse::Forbidden(String::from(
            "Admin accounts do not have profile images",
        )));
    }

    let mut stored_name: Option<String> = None;

    while let Some(mut field) = payload.try_next().await.map_err(|_| {
        HttpErrorResponse::ValidationError(String::from("Invalid multipart payload"))
    })? {
        let is_file = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .is_some();

        if is_file && stored_name.is_none() {
            stored_name = Some(uploads::store_uploaded_file(&mut field).await?);
        }
    }

    let Some(stored_name) = stored_name else {
        return Err(HttpErrorResponse::ValidationError(String::from(
            "No image file was included in the request",
        )));
    };

    let account_id = token.claims.user_id;
    let filename = stored_name.clone();
    let user_dao = db::user::Dao::new(&db_thread_pool);
    match web::block(move || user_dao.set_profile_image(role, account_id, &filename)).await? {
        Ok(0) => Err(HttpErrorResponse::DoesNotExist(String::from(
            "Account no longer exists",
        ))),
        Ok(_) => Ok(HttpResponse::Ok().json(OutputMessage {
            message: stored_name,
        })),
        Err(e) => {
            log::error!("{e}");
            Err(HttpErrorResponse::InternalError(String::from(
                "Failed to update profile image",
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_credentials_validation() {
        assert!(validate_new_credentials("a@b.com", "password123", "password123").is_ok());
        assert!(validate_new_credentials("not-an-email", "password123", "password123").is_err());
        assert!(validate_new_credentials("a@b.com", "short", "short").is_err());
        assert!(validate_new_credentials("a@b.com", "password123", "password124").is_err());
    }
}
