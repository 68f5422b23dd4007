use actix_web::{web, HttpResponse};
use std::time::{SystemTime, UNIX_EPOCH};

use ticket_common::db::user::AccountSummary;
use ticket_common::db::{self, DbThreadPool};
use ticket_common::email::dispatcher::EmailDispatcher;
use ticket_common::lockout;
use ticket_common::models::{OtpPurpose, UserRole};
use ticket_common::request_io::{
    InputCredentials, InputEmail, InputOtp, InputOtpVerification, InputPasswordChange,
    InputPasswordReset, OutputMessage, OutputResetToken, OutputSession, OutputSigninChallenge,
};
use ticket_common::token::auth_token::{AuthToken, AuthTokenType, NewAuthTokenClaims};
use ticket_common::token::password_reset_token::{NewPasswordResetClaims, PasswordResetToken};
use ticket_common::token::Token;
use ticket_common::validators;

use crate::env;
use crate::handlers::error::HttpErrorResponse;
use crate::handlers::verification;
use crate::middleware::auth::{Access, SignIn, VerifiedToken};
use crate::middleware::FromBearerHeader;

const INCORRECT_CREDENTIALS_MSG: &str = "Incorrect email or password";

fn unix_secs(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .expect("System clock is set before the Unix epoch")
        .as_secs()
}

fn sign_access_token(account: &AccountSummary) -> String {
    let expiration = unix_secs(SystemTime::now() + env::CONF.access_token_lifetime);

    AuthToken::sign_new(
        NewAuthTokenClaims {
            user_id: account.id,
            user_email: &account.email,
            user_name: &account.name,
            user_role: account.role,
            mobile: account.mobile.as_deref(),
            designation: account.designation.as_deref(),
            company: account.company.as_deref(),
            expiration,
            token_type: AuthTokenType::Access,
        },
        &env::CONF.token_signing_key,
    )
}

/// Credential check gated by the per-email failure guard. A locked account is
/// rejected before any credential work; an unknown email still counts against
/// the guard so enumeration probes lock out the same way bad passwords do.
async fn authenticate(
    role: UserRole,
    credentials: &InputCredentials,
    db_thread_pool: &DbThreadPool,
) -> Result<AccountSummary, HttpErrorResponse> {
    if !validators::validate_email_address(&credentials.email).is_valid() {
        return Err(HttpErrorResponse::IncorrectCredentials(
            String::from(INCORRECT_CREDENTIALS_MSG),
            None,
        ));
    }

    let now = SystemTime::now();
    let email = credentials.email.clone();

    let auth_dao = db::auth::Dao::new(db_thread_pool);
    let guard_state = match web::block(move || auth_dao.get_login_attempt(&email)).await? {
        Ok(a) => a,
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to check sign-in attempts",
            )));
        }
    };

    if let Some(locked_until) = guard_state.as_ref().and_then(|a| a.locked_until) {
        if now < locked_until {
            return Err(HttpErrorResponse::AccountLocked(
                String::from("Too many failed sign-in attempts"),
                lockout::remaining_lock_minutes(locked_until, now),
            ));
        }
    }

    let email = credentials.email.clone();
    let user_dao = db::user::Dao::new(db_thread_pool);
    let account = match web::block(move || user_dao.get_account_by_email(role, &email)).await? {
        Ok(a) => a,
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to look up account",
            )));
        }
    };

    let credentials_match = match &account {
        Some(account) => {
            verification::password_matches_hash(&credentials.password, account.password_hash.clone())
                .await?
        }
        None => false,
    };

    if !credentials_match {
        let email = credentials.email.clone();
        let auth_dao = db::auth::Dao::new(db_thread_pool);
        let attempt = match web::block(move || {
            auth_dao.record_failed_attempt(&email, now, &env::CONF.lockout_policy)
        })
        .await?
        {
            Ok(a) => a,
            Err(e) => {
                log::error!("{e}");
                return Err(HttpErrorResponse::InternalError(String::from(
                    "Failed to record sign-in attempt",
                )));
            }
        };

        return Err(HttpErrorResponse::IncorrectCredentials(
            String::from(INCORRECT_CREDENTIALS_MSG),
            Some(lockout::attempts_remaining(
                attempt.attempt_count,
                &env::CONF.lockout_policy,
            )),
        ));
    }

    let email = credentials.email.clone();
    let auth_dao = db::auth::Dao::new(db_thread_pool);
    match web::block(move || auth_dao.clear_login_attempts(&email)).await? {
        Ok(_) => (),
        Err(e) => {
            log::error!("{e}");
        }
    };

    // Checked above; credentials cannot match a missing account
    account.ok_or_else(|| {
        HttpErrorResponse::InternalError(String::from("Account lookup failed after verification"))
    })
}

async fn login_for_role(
    role: UserRole,
    credentials: web::Json<InputCredentials>,
    db_thread_pool: web::Data<DbThreadPool>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let account = authenticate(role, &credentials, &db_thread_pool).await?;
    let access_token = sign_access_token(&account);

    Ok(HttpResponse::Ok().json(OutputSession {
        access_token,
        account: account.into(),
    }))
}

pub async fn customer_login(
    db_thread_pool: web::Data<DbThreadPool>,
    credentials: web::Json<InputCredentials>,
) -> Result<HttpResponse, HttpErrorResponse> {
    login_for_role(UserRole::Customer, credentials, db_thread_pool).await
}

pub async fn engineer_login(
    db_thread_pool: web::Data<DbThreadPool>,
    credentials: web::Json<InputCredentials>,
) -> Result<HttpResponse, HttpErrorResponse> {
    login_for_role(UserRole::Engineer, credentials, db_thread_pool).await
}

/// Admin sign-in is OTP-gated: a correct password yields only a short-lived
/// signin token. The access token is issued by `admin_verify_otp`.
pub async fn admin_login(
    db_thread_pool: web::Data<DbThreadPool>,
    dispatcher: web::Data<EmailDispatcher>,
    credentials: web::Json<InputCredentials>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let account = authenticate(UserRole::Admin, &credentials, &db_thread_pool).await?;

    let expiration = unix_secs(SystemTime::now() + env::CONF.signin_token_lifetime);
    let signin_token = AuthToken::sign_new(
        NewAuthTokenClaims {
            user_id: account.id,
            user_email: &account.email,
            user_name: &account.name,
            user_role: UserRole::Admin,
            mobile: account.mobile.as_deref(),
            designation: None,
            company: None,
            expiration,
            token_type: AuthTokenType::SignIn,
        },
        &env::CONF.token_signing_key,
    );

    verification::generate_and_email_otp(
        &account.email,
        OtpPurpose::AdminSignin,
        &db_thread_pool,
        &dispatcher,
    )
    .await?;

    Ok(HttpResponse::Ok().json(OutputSigninChallenge {
        signin_token,
        message: String::from("A one-time passcode has been sent to your email address"),
    }))
}

pub async fn admin_verify_otp(
    db_thread_pool: web::Data<DbThreadPool>,
    signin_token: VerifiedToken<SignIn, FromBearerHeader>,
    otp: web::Json<InputOtp>,
) -> Result<HttpResponse, HttpErrorResponse> {
    signin_token.require_role(UserRole::Admin)?;

    let now = SystemTime::now();
    let email = signin_token.claims.user_email.clone();
    let otp_value = otp.otp.clone();

    let auth_dao = db::auth::Dao::new(&db_thread_pool);
    let outcome = match web::block(move || {
        auth_dao.consume_otp(&otp_value, &email, OtpPurpose::AdminSignin, now)
    })
    .await?
    {
        Ok(o) => o,
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to check OTP",
            )));
        }
    };

    check_otp_outcome(outcome)?;

    let user_id = signin_token.claims.user_id;
    let user_dao = db::user::Dao::new(&db_thread_pool);
    let account = match web::block(move || user_dao.get_account_by_id(UserRole::Admin, user_id))
        .await?
    {
        Ok(Some(a)) => a,
        Ok(None) => {
            return Err(HttpErrorResponse::DoesNotExist(String::from(
                "Account no longer exists",
            )));
        }
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to look up account",
            )));
        }
    };

    let access_token = sign_access_token(&account);

    Ok(HttpResponse::Ok().json(OutputSession {
        access_token,
        account: account.into(),
    }))
}

fn check_otp_outcome(outcome: db::auth::OtpConsumeOutcome) -> Result<(), HttpErrorResponse> {
    use db::auth::OtpConsumeOutcome::*;

    match outcome {
        Verified => Ok(()),
        Incorrect => Err(HttpErrorResponse::IncorrectOtp(String::from(
            "The passcode was incorrect",
        ))),
        Expired => Err(HttpErrorResponse::OtpExpired(String::from(
            "The passcode has expired",
        ))),
        NotFound => Err(HttpErrorResponse::DoesNotExist(String::from(
            "No passcode has been issued",
        ))),
    }
}

async fn forgot_password_send_otp_for_role(
    role: UserRole,
    email_input: web::Json<InputEmail>,
    db_thread_pool: web::Data<DbThreadPool>,
    dispatcher: web::Data<EmailDispatcher>,
) -> Result<HttpResponse, HttpErrorResponse> {
    if !validators::validate_email_address(&email_input.email).is_valid() {
        return Err(HttpErrorResponse::ValidationError(String::from(
            "Email address is invalid",
        )));
    }

    let email = email_input.email.clone();
    let user_dao = db::user::Dao::new(&db_thread_pool);
    let account = match web::block(move || user_dao.get_account_by_email(role, &email)).await? {
        Ok(a) => a,
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to look up account",
            )));
        }
    };

    if account.is_none() {
        return Err(HttpErrorResponse::DoesNotExist(String::from(
            "No account is registered with that email address",
        )));
    }

    verification::generate_and_email_otp(
        &email_input.email,
        OtpPurpose::PasswordReset,
        &db_thread_pool,
        &dispatcher,
    )
    .await?;

    Ok(HttpResponse::Ok().json(OutputMessage {
        message: String::from("A one-time passcode has been sent to your email address"),
    }))
}

async fn forgot_password_verify_otp_for_role(
    role: UserRole,
    input: web::Json<InputOtpVerification>,
    db_thread_pool: web::Data<DbThreadPool>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let now = SystemTime::now();
    let email = input.email.clone();
    let otp_value = input.otp.clone();

    let auth_dao = db::auth::Dao::new(&db_thread_pool);
    let outcome = match web::block(move || {
        auth_dao.consume_otp(&otp_value, &email, OtpPurpose::PasswordReset, now)
    })
    .await?
    {
        Ok(o) => o,
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to check OTP",
            )));
        }
    };

    check_otp_outcome(outcome)?;

    let issued_at = unix_secs(now);
    let reset_token = PasswordResetToken::sign_new(
        NewPasswordResetClaims {
            user_email: &input.email,
            user_role: role,
            issued_at,
            expiration: issued_at + env::CONF.reset_token_max_age.as_secs(),
        },
        &env::CONF.token_signing_key,
    );

    Ok(HttpResponse::Ok().json(OutputResetToken { reset_token }))
}

async fn reset_password_for_role(
    role: UserRole,
    input: web::Json<InputPasswordReset>,
    db_thread_pool: web::Data<DbThreadPool>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let decoded = PasswordResetToken::decode(&input.reset_token)?;
    let claims = decoded.verify(&env::CONF.token_signing_key)?;

    claims.check_age(unix_secs(SystemTime::now()), env::CONF.reset_token_max_age)?;

    if claims.user_email != input.email || claims.user_role != role {
        return Err(HttpErrorResponse::TokenMismatch(String::from(
            "The reset token was not issued for this account",
        )));
    }

    if let validators::Validity::Invalid(msg) = validators::validate_password(&input.new_password) {
        return Err(HttpErrorResponse::ValidationError(msg));
    }

    let email = input.email.clone();
    let user_dao = db::user::Dao::new(&db_thread_pool);
    let account = match web::block(move || user_dao.get_account_by_email(role, &email)).await? {
        Ok(Some(a)) => a,
        Ok(None) => {
            return Err(HttpErrorResponse::DoesNotExist(String::from(
                "No account is registered with that email address",
            )));
        }
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to look up account",
            )));
        }
    };

    let new_hash = verification::hash_password(input.new_password.clone()).await?;

    let email = account.email.clone();
    let user_dao = db::user::Dao::new(&db_thread_pool);
    match web::block(move || user_dao.update_password_hash(role, &email, &new_hash)).await? {
        Ok(_) => (),
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to update password",
            )));
        }
    };

    Ok(HttpResponse::Ok().json(OutputMessage {
        message: String::from("Password has been reset"),
    }))
}

pub async fn change_password(
    db_thread_pool: web::Data<DbThreadPool>,
    token: VerifiedToken<Access, FromBearerHeader>,
    input: web::Json<InputPasswordChange>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let role = token.claims.user_role;
    let user_id = token.claims.user_id;

    let user_dao = db::user::Dao::new(&db_thread_pool);
    let account = match web::block(move || user_dao.get_account_by_id(role, user_id)).await? {
        Ok(Some(a)) => a,
        Ok(None) => {
            return Err(HttpErrorResponse::DoesNotExist(String::from(
                "Account no longer exists",
            )));
        }
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to look up account",
            )));
        }
    };

    let current_matches =
        verification::password_matches_hash(&input.current_password, account.password_hash.clone())
            .await?;

    if !current_matches {
        return Err(HttpErrorResponse::IncorrectCredentials(
            String::from("The current password was incorrect"),
            None,
        ));
    }

    if let validators::Validity::Invalid(msg) = validators::validate_password(&input.new_password) {
        return Err(HttpErrorResponse::ValidationError(msg));
    }

    let new_hash = verification::hash_password(input.new_password.clone()).await?;

    let email = account.email.clone();
    let user_dao = db::user::Dao::new(&db_thread_pool);
    match web::block(move || user_dao.update_password_hash(role, &email, &new_hash)).await? {
        Ok(_) => (),
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to update password",
            )));
        }
    };

    Ok(HttpResponse::Ok().json(OutputMessage {
        message: String::from("Password has been changed"),
    }))
}

pub async fn customer_forgot_password_send_otp(
    db_thread_pool: web::Data<DbThreadPool>,
    dispatcher: web::Data<EmailDispatcher>,
    email_input: web::Json<InputEmail>,
) -> Result<HttpResponse, HttpErrorResponse> {
    forgot_password_send_otp_for_role(UserRole::Customer, email_input, db_thread_pool, dispatcher)
        .await
}

pub async fn customer_forgot_password_verify_otp(
    db_thread_pool: web::Data<DbThreadPool>,
    input: web::Json<InputOtpVerification>,
) -> Result<HttpResponse, HttpErrorResponse> {
    forgot_password_verify_otp_for_role(UserRole::Customer, input, db_thread_pool).await
}

pub async fn customer_reset_password(
    db_thread_pool: web::Data<DbThreadPool>,
    input: web::Json<InputPasswordReset>,
) -> Result<HttpResponse, HttpErrorResponse> {
    reset_password_for_role(UserRole::Customer, input, db_thread_pool).await
}

pub async fn engineer_forgot_password_send_otp(
    db_thread_pool: web::Data<DbThreadPool>,
    dispatcher: web::Data<EmailDispatcher>,
    email_input: web::Json<InputEmail>,
) -> Result<HttpResponse, HttpErrorResponse> {
    forgot_password_send_otp_for_role(UserRole::Engineer, email_input, db_thread_pool, dispatcher)
        .await
}

pub async fn engineer_forgot_password_verify_otp(
    db_thread_pool: web::Data<DbThreadPool>,
    input: web::Json<InputOtpVerification>,
) -> Result<HttpResponse, HttpErrorResponse> {
    forgot_password_verify_otp_for_role(UserRole::Engineer, input, db_thread_pool).await
}

pub async fn engineer_reset_password(
    db_thread_pool: web::Data<DbThreadPool>,
    input: web::Json<InputPasswordReset>,
) -> Result<HttpResponse, HttpErrorResponse> {
    reset_password_for_role(UserRole::Engineer, input, db_thread_pool).await
}

pub async fn admin_forgot_password_send_otp(
    db_thread_pool: web::Data<DbThreadPool>,
    dispatcher: web::Data<EmailDispatcher>,
    email_input: web::Json<InputEmail>,
) -> Result<HttpResponse, HttpErrorResponse> {
    forgot_password_send_otp_for_role(UserRole::Admin, email_input, db_thread_pool, dispatcher)
        .await
}

pub async fn admin_forgot_password_verify_otp(
    db_thread_pool: web::Data<DbThreadPool>,
    input: web::Json<InputOtpVerification>,
) -> Result<HttpResponse, HttpErrorResponse> {
    forgot_password_verify_otp_for_role(UserRole::Admin, input, db_thread_pool).await
}

pub async fn admin_reset_password(
    db_thread_pool: web::Data<DbThreadPool>,
    input: web::Json<InputPasswordReset>,
) -> Result<HttpResponse, HttpErrorResponse> {
    reset_password_for_role(UserRole::Admin, input, db_thread_pool).await
}

#[cfg(test)]
mod tests {
    use super::*;

    use actix_web::http::StatusCode;
    use actix_web::test::{self, TestRequest};
    use actix_web::web::Data;
    use actix_web::App;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    use ticket_common::db::auth::OtpConsumeOutcome;
    use ticket_common::email::senders::MockSender;
    use ticket_common::email::EmailSender;
    use ticket_common::models::customer::NewCustomer;
    use ticket_common::threadrand::SecureRng;

    fn test_dispatcher() -> EmailDispatcher {
        let sender: EmailSender = Box::new(MockSender::new());
        EmailDispatcher::start(
            Arc::new(sender),
            env::CONF.email_from_address.clone(),
            env::CONF.email_reply_to_address.clone(),
            env::CONF.email_queue_depth,
        )
    }

    async fn create_test_customer(email: &str, password: &str) -> i32 {
        let password_hash = verification::hash_password(String::from(password))
            .await
            .expect("Failed to hash password");

        let user_dao = db::user::Dao::new(&env::testing::DB_THREAD_POOL);
        user_dao
            .create_customer(&NewCustomer {
                name: "Test Customer",
                email,
                designation: None,
                mobile: None,
                company: Some("Test Co"),
                address: None,
                subscription: None,
                password_hash: &password_hash,
                created_timestamp: SystemTime::now(),
            })
            .expect("Failed to create customer")
    }

    #[actix_web::test]
    async fn test_repeated_login_failures_lock_the_account() {
        let app = test::init_service(
            App::new()
                .app_data(Data::new(env::testing::DB_THREAD_POOL.clone()))
                .app_data(Data::new(test_dispatcher()))
                .configure(crate::services::api::configure),
        )
        .await;

        let email = format!("customer{}@test.com", SecureRng::next_u128());
        let password = "correct-horse-battery";
        create_test_customer(&email, password).await;

        for expected_remaining in [2, 1, 0] {
            let req = TestRequest::post()
                .uri("/api/customer/login")
                .set_json(json!({ "email": &email, "password": "wrong-password" }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

            let body: serde_json::Value = test::read_body_json(resp).await;
            assert_eq!(body["error_type"], "incorrect_credentials");
            assert_eq!(body["attempts_remaining"], expected_remaining);
        }

        // Even the correct password is rejected while the lock holds
        let req = TestRequest::post()
            .uri("/api/customer/login")
            .set_json(json!({ "email": &email, "password": password }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error_type"], "account_locked");

        let minutes = body["locked_for_minutes"]
            .as_u64()
            .expect("Missing lock duration");
        assert!(minutes >= 1 && minutes <= 5);
    }

    #[actix_web::test]
    async fn test_successful_login_clears_failed_attempts() {
        let app = test::init_service(
            App::new()
                .app_data(Data::new(env::testing::DB_THREAD_POOL.clone()))
                .app_data(Data::new(test_dispatcher()))
                .configure(crate::services::api::configure),
        )
        .await;

        let email = format!("customer{}@test.com", SecureRng::next_u128());
        let password = "correct-horse-battery";
        create_test_customer(&email, password).await;

        let req = TestRequest::post()
            .uri("/api/customer/login")
            .set_json(json!({ "email": &email, "password": "wrong-password" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = TestRequest::post()
            .uri("/api/customer/login")
            .set_json(json!({ "email": &email, "password": password }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(!body["access_token"].as_str().unwrap().is_empty());
        assert_eq!(body["account"]["email"], email.as_str());
        assert_eq!(body["account"]["company"], "Test Co");

        let auth_dao = db::auth::Dao::new(&env::testing::DB_THREAD_POOL);
        let guard_state = auth_dao
            .get_login_attempt(&email)
            .expect("Failed to read guard state");
        assert!(guard_state.is_none());
    }

    #[actix_web::test]
    async fn test_reset_token_is_bound_to_its_email() {
        let app = test::init_service(
            App::new()
                .app_data(Data::new(env::testing::DB_THREAD_POOL.clone()))
                .app_data(Data::new(test_dispatcher()))
                .configure(crate::services::api::configure),
        )
        .await;

        let email_a = format!("customer{}@test.com", SecureRng::next_u128());
        let email_b = format!("customer{}@test.com", SecureRng::next_u128());
        create_test_customer(&email_a, "original-password").await;
        create_test_customer(&email_b, "original-password").await;

        let issued_at = unix_secs(SystemTime::now());
        let reset_token = PasswordResetToken::sign_new(
            NewPasswordResetClaims {
                user_email: &email_a,
                user_role: UserRole::Customer,
                issued_at,
                expiration: issued_at + env::CONF.reset_token_max_age.as_secs(),
            },
            &env::CONF.token_signing_key,
        );

        let req = TestRequest::post()
            .uri("/api/customer/reset-password")
            .set_json(json!({
                "email": &email_b,
                "reset_token": &reset_token,
                "new_password": "brand-new-password",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error_type"], "token_mismatch");

        // The email the token was issued for goes through
        let req = TestRequest::post()
            .uri("/api/customer/reset-password")
            .set_json(json!({
                "email": &email_a,
                "reset_token": &reset_token,
                "new_password": "brand-new-password",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = TestRequest::post()
            .uri("/api/customer/login")
            .set_json(json!({ "email": &email_a, "password": "brand-new-password" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn test_otp_is_consumed_exactly_once() {
        let email = format!("customer{}@test.com", SecureRng::next_u128());
        let auth_dao = db::auth::Dao::new(&env::testing::DB_THREAD_POOL);
        let now = SystemTime::now();

        auth_dao
            .save_otp(
                "042137",
                &email,
                OtpPurpose::PasswordReset,
                now + Duration::from_secs(300),
            )
            .expect("Failed to save OTP");

        // A wrong code leaves the record in place
        assert_eq!(
            auth_dao
                .consume_otp("999999", &email, OtpPurpose::PasswordReset, now)
                .expect("Failed to check OTP"),
            OtpConsumeOutcome::Incorrect,
        );
        assert_eq!(
            auth_dao
                .consume_otp("042137", &email, OtpPurpose::PasswordReset, now)
                .expect("Failed to check OTP"),
            OtpConsumeOutcome::Verified,
        );
        assert_eq!(
            auth_dao
                .consume_otp("042137", &email, OtpPurpose::PasswordReset, now)
                .expect("Failed to check OTP"),
            OtpConsumeOutcome::NotFound,
        );

        // An expired record is deleted on the read that discovers it
        auth_dao
            .save_otp("042137", &email, OtpPurpose::PasswordReset, now)
            .expect("Failed to save OTP");
        assert_eq!(
            auth_dao
                .consume_otp("042137", &email, OtpPurpose::PasswordReset, now)
                .expect("Failed to check OTP"),
            OtpConsumeOutcome::Expired,
        );
        assert_eq!(
            auth_dao
                .consume_otp("042137", &email, OtpPurpose::PasswordReset, now)
                .expect("Failed to check OTP"),
            OtpConsumeOutcome::NotFound,
        );
    }
}
