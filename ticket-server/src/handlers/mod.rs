pub mod auth;
pub mod health;
pub mod ticket;
pub mod uploads;
pub mod user;

pub mod verification {
    use actix_web::web;
    use std::str::FromStr;
    use std::time::SystemTime;

    use ticket_common::db::{self, DbThreadPool};
    use ticket_common::email::dispatcher::{EmailDispatcher, OutboundEmail};
    use ticket_common::email::templates::OtpMessage;
    use ticket_common::models::OtpPurpose;
    use ticket_common::otp::Otp;

    use super::error::HttpErrorResponse;
    use crate::env;

    pub const OTP_LENGTH: usize = 6;

    /// Stores a fresh OTP for the email/purpose pair and queues the
    /// notification. The caller is responsible for confirming the account
    /// exists first; this function does not reveal whether it does.
    pub async fn generate_and_email_otp(
        user_email: &str,
        purpose: OtpPurpose,
        db_thread_pool: &DbThreadPool,
        dispatcher: &EmailDispatcher,
    ) -> Result<(), HttpErrorResponse> {
        let otp_expiration = SystemTime::now() + env::CONF.otp_lifetime;

        let otp = Otp::generate(OTP_LENGTH);
        let otp_copy = otp.clone();
        let user_email_copy = String::from(user_email);

        let auth_dao = db::auth::Dao::new(db_thread_pool);
        match web::block(move || {
            auth_dao.save_otp(&otp_copy, &user_email_copy, purpose, otp_expiration)
        })
        .await?
        {
            Ok(_) => (),
            Err(e) => {
                log::error!("{e}");
                return Err(HttpErrorResponse::InternalError(String::from(
                    "Failed to save OTP",
                )));
            }
        };

        let (body_html, body_text) = OtpMessage::generate(&otp, env::CONF.otp_lifetime);

        dispatcher.enqueue(OutboundEmail {
            destination: String::from(user_email),
            subject: String::from("Your one-time passcode"),
            body_html,
            body_text,
        });

        Ok(())
    }

    /// Argon2id with the server-side pepper. Runs on the blocking pool.
    pub async fn hash_password(password: String) -> Result<String, HttpErrorResponse> {
        let hash_result = web::block(move || {
            argon2_kdf::Hasher::default()
                .algorithm(argon2_kdf::Algorithm::Argon2id)
                .salt_length(env::CONF.hash_salt_length)
                .hash_length(env::CONF.hash_length)
                .iterations(env::CONF.hash_iterations)
                .memory_cost_kib(env::CONF.hash_mem_cost_kib)
                .threads(env::CONF.hash_threads)
                .secret(argon2_kdf::Secret::using(&env::CONF.hashing_key))
                .hash(password.as_bytes())
                .map(|hash| hash.to_string())
        })
        .await?;

        match hash_result {
            Ok(hash) => Ok(hash),
            Err(e) => {
                log::error!("{e}");
                Err(HttpErrorResponse::InternalError(String::from(
                    "Failed to hash password",
                )))
            }
        }
    }

    pub async fn password_matches_hash(
        password: &str,
        stored_hash: String,
    ) -> Result<bool, HttpErrorResponse> {
        let password = String::from(password);

        let match_result = web::block(move || {
            argon2_kdf::Hash::from_str(&stored_hash).map(|hash| {
                hash.verify_with_secret(
                    password.as_bytes(),
                    argon2_kdf::Secret::using(&env::CONF.hashing_key),
                )
            })
        })
        .await?;

        match match_result {
            Ok(matches) => Ok(matches),
            Err(e) => {
                log::error!("{e}");
                Err(HttpErrorResponse::InternalError(String::from(
                    "Failed to verify password",
                )))
            }
        }
    }
}

pub mod error {
    use actix_web::http::StatusCode;
    use actix_web::{HttpResponse, HttpResponseBuilder};
    use std::fmt;

    use ticket_common::request_io::ServerErrorResponse;
    use ticket_common::token::TokenError;

    #[derive(Debug)]
    pub enum HttpErrorResponse {
        // 400
        ValidationError(String),

        // 401
        MissingHeader(String),
        MalformedHeader(String),
        TokenExpired(String),
        TokenInvalid(String),
        WrongTokenType(String),
        TokenMismatch(String),
        IncorrectCredentials(String, Option<i32>),
        IncorrectOtp(String),
        OtpExpired(String),

        // 403
        Forbidden(String),
        AccountLocked(String, u64),

        // 404
        DoesNotExist(String),

        // 409
        AlreadyExists(String),
        AlreadyClosed(String),

        // 413
        InputTooLarge(String),

        // 500
        InternalError(String),
    }

    impl std::error::Error for HttpErrorResponse {}

    impl fmt::Display for HttpErrorResponse {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let server_error: ServerErrorResponse = self.into();
            write!(f, "{:?}", server_error)
        }
    }

    impl From<&HttpErrorResponse> for ServerErrorResponse {
        fn from(resp: &HttpErrorResponse) -> Self {
            let (error_type, message) = match resp {
                HttpErrorResponse::ValidationError(msg) => ("validation_error", msg),
                HttpErrorResponse::MissingHeader(msg) => ("missing_header", msg),
                HttpErrorResponse::MalformedHeader(msg) => ("malformed_header", msg),
                HttpErrorResponse::TokenExpired(msg) => ("token_expired", msg),
                HttpErrorResponse::TokenInvalid(msg) => ("token_invalid", msg),
                HttpErrorResponse::WrongTokenType(msg) => ("wrong_token_type", msg),
                HttpErrorResponse::TokenMismatch(msg) => ("token_mismatch", msg),
                HttpErrorResponse::IncorrectCredentials(msg, _) => ("incorrect_credentials", msg),
                HttpErrorResponse::IncorrectOtp(msg) => ("incorrect_otp", msg),
                HttpErrorResponse::OtpExpired(msg) => ("otp_expired", msg),
                HttpErrorResponse::Forbidden(msg) => ("forbidden", msg),
                HttpErrorResponse::AccountLocked(msg, _) => ("account_locked", msg),
                HttpErrorResponse::DoesNotExist(msg) => ("does_not_exist", msg),
                HttpErrorResponse::AlreadyExists(msg) => ("already_exists", msg),
                HttpErrorResponse::AlreadyClosed(msg) => ("already_closed", msg),
                HttpErrorResponse::InputTooLarge(msg) => ("input_too_large", msg),
                HttpErrorResponse::InternalError(msg) => ("internal_error", msg),
            };

            let attempts_remaining = match resp {
                HttpErrorResponse::IncorrectCredentials(_, remaining) => *remaining,
                _ => None,
            };

            let locked_for_minutes = match resp {
                HttpErrorResponse::AccountLocked(_, minutes) => Some(*minutes),
                _ => None,
            };

            ServerErrorResponse {
                error_type,
                message: message.clone(),
                attempts_remaining,
                locked_for_minutes,
            }
        }
    }

    impl actix_web::error::ResponseError for HttpErrorResponse {
        fn error_response(&self) -> HttpResponse {
            let server_error: ServerErrorResponse = self.into();
            HttpResponseBuilder::new(self.status_code()).json(server_error)
        }

        fn status_code(&self) -> StatusCode {
            match *self {
                HttpErrorResponse::ValidationError(_) => StatusCode::BAD_REQUEST,
                HttpErrorResponse::MissingHeader(_)
                | HttpErrorResponse::MalformedHeader(_)
                | HttpErrorResponse::TokenExpired(_)
                | HttpErrorResponse::TokenInvalid(_)
                | HttpErrorResponse::WrongTokenType(_)
                | HttpErrorResponse::TokenMismatch(_)
                | HttpErrorResponse::IncorrectCredentials(_, _)
                | HttpErrorResponse::IncorrectOtp(_)
                | HttpErrorResponse::OtpExpired(_) => StatusCode::UNAUTHORIZED,
                HttpErrorResponse::Forbidden(_) | HttpErrorResponse::AccountLocked(_, _) => {
                    StatusCode::FORBIDDEN
                }
                HttpErrorResponse::DoesNotExist(_) => StatusCode::NOT_FOUND,
                HttpErrorResponse::AlreadyExists(_) | HttpErrorResponse::AlreadyClosed(_) => {
                    StatusCode::CONFLICT
                }
                HttpErrorResponse::InputTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
                HttpErrorResponse::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        }
    }

    impl From<actix_web::error::BlockingError> for HttpErrorResponse {
        fn from(_err: actix_web::error::BlockingError) -> Self {
            HttpErrorResponse::InternalError(String::from("Actix thread pool failure"))
        }
    }

    impl From<TokenError> for HttpErrorResponse {
        fn from(err: TokenError) -> Self {
            match err {
                TokenError::TokenInvalid => {
                    HttpErrorResponse::TokenInvalid(String::from("Token is invalid"))
                }
                TokenError::TokenExpired => {
                    HttpErrorResponse::TokenExpired(String::from("Token is expired"))
                }
                TokenError::TokenMissing => {
                    HttpErrorResponse::MissingHeader(String::from("Authorization header is missing"))
                }
                TokenError::HeaderMalformed => HttpErrorResponse::MalformedHeader(String::from(
                    "Authorization header must be of the form 'Bearer <token>'",
                )),
                TokenError::WrongTokenType => {
                    HttpErrorResponse::WrongTokenType(String::from("Incorrect token type"))
                }
            }
        }
    }

}
