use base64::engine::general_purpose::STANDARD as b64;
use base64::Engine;
use chrono_tz::Tz;
use lettre::message::Mailbox;
use once_cell::sync::Lazy;
use std::cell::UnsafeCell;
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use std::time::Duration;
use zeroize::{Zeroize, Zeroizing};

use ticket_common::lockout::LockoutPolicy;

#[cfg(not(test))]
pub static CONF: Lazy<Config> = Lazy::new(|| Config::from_env().expect("Failed to load config"));

#[cfg(test)]
pub static CONF: Lazy<Config> = Lazy::new(Config::for_tests);

const DB_USERNAME_VAR: &str = "TICKET_DB_USERNAME";
const DB_PASSWORD_VAR: &str = "TICKET_DB_PASSWORD";
const DB_HOSTNAME_VAR: &str = "TICKET_DB_HOSTNAME";
const DB_PORT_VAR: &str = "TICKET_DB_PORT";
const DB_NAME_VAR: &str = "TICKET_DB_NAME";
const DB_MAX_CONNECTIONS_VAR: &str = "TICKET_DB_MAX_CONNECTIONS";
const DB_IDLE_TIMEOUT_SECS_VAR: &str = "TICKET_DB_IDLE_TIMEOUT_SECS";

const HASHING_KEY_VAR: &str = "TICKET_HASHING_KEY_B64";
const TOKEN_SIGNING_KEY_VAR: &str = "TICKET_TOKEN_SIGNING_KEY_B64";

const HASH_LENGTH_VAR: &str = "TICKET_HASH_LENGTH";
const HASH_ITERATIONS_VAR: &str = "TICKET_HASH_ITERATIONS";
const HASH_MEM_COST_KIB_VAR: &str = "TICKET_HASH_MEM_COST_KIB";
const HASH_THREADS_VAR: &str = "TICKET_HASH_THREADS";
const HASH_SALT_LENGTH_VAR: &str = "TICKET_HASH_SALT_LENGTH";

const EMAIL_ENABLED_VAR: &str = "TICKET_EMAIL_ENABLED";
const EMAIL_FROM_ADDR_VAR: &str = "TICKET_EMAIL_FROM_ADDR";
const EMAIL_REPLY_TO_ADDR_VAR: &str = "TICKET_EMAIL_REPLY_TO_ADDR";
const ENGINEER_POOL_ADDR_VAR: &str = "TICKET_ENGINEER_POOL_ADDR";
const SMTP_USERNAME_VAR: &str = "TICKET_SMTP_USERNAME";
const SMTP_PASSWORD_VAR: &str = "TICKET_SMTP_PASSWORD";
const SMTP_ADDRESS_VAR: &str = "TICKET_SMTP_ADDRESS";
const MAX_SMTP_CONNECTIONS_VAR: &str = "TICKET_MAX_SMTP_CONNECTIONS";
const SMTP_IDLE_TIMEOUT_SECS_VAR: &str = "TICKET_SMTP_IDLE_TIMEOUT_SECS";
const EMAIL_QUEUE_DEPTH_VAR: &str = "TICKET_EMAIL_QUEUE_DEPTH";

const UPLOADS_DIR_VAR: &str = "TICKET_UPLOADS_DIR";
const DISPLAY_TIME_ZONE_VAR: &str = "TICKET_DISPLAY_TIME_ZONE";

const ACCESS_TOKEN_LIFETIME_MINS_VAR: &str = "TICKET_ACCESS_TOKEN_LIFETIME_MINS";
const SIGNIN_TOKEN_LIFETIME_MINS_VAR: &str = "TICKET_SIGNIN_TOKEN_LIFETIME_MINS";
const RESET_TOKEN_MAX_AGE_SECS_VAR: &str = "TICKET_RESET_TOKEN_MAX_AGE_SECS";
const OTP_LIFETIME_MINS_VAR: &str = "TICKET_OTP_LIFETIME_MINS";

const MAX_LOGIN_ATTEMPTS_VAR: &str = "TICKET_MAX_LOGIN_ATTEMPTS";
const LOGIN_ATTEMPT_WINDOW_MINS_VAR: &str = "TICKET_LOGIN_ATTEMPT_WINDOW_MINS";
const LOCKOUT_DURATION_MINS_VAR: &str = "TICKET_LOCKOUT_DURATION_MINS";

const ACTIX_WORKER_COUNT_VAR: &str = "TICKET_ACTIX_WORKER_COUNT";
const LOG_LEVEL_VAR: &str = "TICKET_LOG_LEVEL";

const HASHING_KEY_SIZE: usize = 32;
const TOKEN_SIGNING_KEY_SIZE: usize = 64;

#[derive(Zeroize)]
pub struct ConfigInner {
    pub db_username: String,
    pub db_password: String,
    pub db_hostname: String,
    pub db_port: u16,
    pub db_name: String,
    #[zeroize(skip)]
    pub db_max_connections: u32,
    #[zeroize(skip)]
    pub db_idle_timeout: Duration,

    pub hashing_key: [u8; HASHING_KEY_SIZE],
    pub token_signing_key: [u8; TOKEN_SIGNING_KEY_SIZE],

    #[zeroize(skip)]
    pub hash_length: u32,
    #[zeroize(skip)]
    pub hash_iterations: u32,
    #[zeroize(skip)]
    pub hash_mem_cost_kib: u32,
    #[zeroize(skip)]
    pub hash_threads: u32,
    #[zeroize(skip)]
    pub hash_salt_length: u32,

    #[zeroize(skip)]
    pub email_enabled: bool,
    #[zeroize(skip)]
    pub email_from_address: Mailbox,
    #[zeroize(skip)]
    pub email_reply_to_address: Mailbox,
    #[zeroize(skip)]
    pub engineer_pool_address: String,
    pub smtp_username: String,
    pub smtp_password: String,
    pub smtp_address: String,
    #[zeroize(skip)]
    pub max_smtp_connections: u32,
    #[zeroize(skip)]
    pub smtp_idle_timeout: Duration,
    #[zeroize(skip)]
    pub email_queue_depth: usize,

    #[zeroize(skip)]
    pub uploads_dir: String,
    #[zeroize(skip)]
    pub display_time_zone: Tz,

    #[zeroize(skip)]
    pub access_token_lifetime: Duration,
    #[zeroize(skip)]
    pub signin_token_lifetime: Duration,
    #[zeroize(skip)]
    pub reset_token_max_age: Duration,
    #[zeroize(skip)]
    pub otp_lifetime: Duration,

    #[zeroize(skip)]
    pub lockout_policy: LockoutPolicy,

    #[zeroize(skip)]
    pub actix_worker_count: usize,
    #[zeroize(skip)]
    pub log_level: String,
}

pub struct Config {
    inner: UnsafeCell<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        // Safe as long as `unsafe Config::zeroize()` hasn't been called
        unsafe { &*self.inner.get() }
    }
}

// Safe to be shared across threads as long as `unsafe Config::zeroize()` hasn't been called
unsafe impl Sync for Config {}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        let hashing_key = Zeroizing::new(
            b64.decode(env_var::<String>(HASHING_KEY_VAR)?.as_bytes())
                .map_err(|_| ConfigError::InvalidVar(HASHING_KEY_VAR))?,
        );
        let hashing_key = hashing_key[..]
            .try_into()
            .map_err(|_| ConfigError::InvalidVar(HASHING_KEY_VAR))?;

        let token_signing_key = Zeroizing::new(
            b64.decode(env_var::<String>(TOKEN_SIGNING_KEY_VAR)?.as_bytes())
                .map_err(|_| ConfigError::InvalidVar(TOKEN_SIGNING_KEY_VAR))?,
        );
        let token_signing_key = token_signing_key[..]
            .try_into()
            .map_err(|_| ConfigError::InvalidVar(TOKEN_SIGNING_KEY_VAR))?;

        let email_from_address: Mailbox = env_var::<String>(EMAIL_FROM_ADDR_VAR)?
            .parse()
            .map_err(|_| ConfigError::InvalidVar(EMAIL_FROM_ADDR_VAR))?;
        let email_reply_to_address: Mailbox = env_var::<String>(EMAIL_REPLY_TO_ADDR_VAR)?
            .parse()
            .map_err(|_| ConfigError::InvalidVar(EMAIL_REPLY_TO_ADDR_VAR))?;

        let display_time_zone: Tz =
            env_var_or(DISPLAY_TIME_ZONE_VAR, String::from("Asia/Colombo"))
                .parse()
                .map_err(|_| ConfigError::InvalidVar(DISPLAY_TIME_ZONE_VAR))?;

        let inner = ConfigInner {
            db_username: env_var(DB_USERNAME_VAR)?,
            db_password: env_var(DB_PASSWORD_VAR)?,
            db_hostname: env_var(DB_HOSTNAME_VAR)?,
            db_port: env_var(DB_PORT_VAR)?,
            db_name: env_var(DB_NAME_VAR)?,
            db_max_connections: env_var_or(DB_MAX_CONNECTIONS_VAR, 48),
            db_idle_timeout: Duration::from_secs(env_var_or(DB_IDLE_TIMEOUT_SECS_VAR, 30)),

            hashing_key,
            token_signing_key,

            hash_length: env_var_or(HASH_LENGTH_VAR, 32),
            hash_iterations: env_var_or(HASH_ITERATIONS_VAR, 3),
            hash_mem_cost_kib: env_var_or(HASH_MEM_COST_KIB_VAR, 62500),
            hash_threads: env_var_or(HASH_THREADS_VAR, 2),
            hash_salt_length: env_var_or(HASH_SALT_LENGTH_VAR, 16),

            email_enabled: env_var(EMAIL_ENABLED_VAR)?,
            email_from_address,
            email_reply_to_address,
            engineer_pool_address: env_var(ENGINEER_POOL_ADDR_VAR)?,
            smtp_username: env_var_or(SMTP_USERNAME_VAR, String::new()),
            smtp_password: env_var_or(SMTP_PASSWORD_VAR, String::new()),
            smtp_address: env_var_or(SMTP_ADDRESS_VAR, String::new()),
            max_smtp_connections: env_var_or(MAX_SMTP_CONNECTIONS_VAR, 24),
            smtp_idle_timeout: Duration::from_secs(env_var_or(SMTP_IDLE_TIMEOUT_SECS_VAR, 60)),
            email_queue_depth: env_var_or(EMAIL_QUEUE_DEPTH_VAR, 256),

            uploads_dir: env_var_or(UPLOADS_DIR_VAR, String::from("./uploads")),
            display_time_zone,

            access_token_lifetime: Duration::from_secs(
                env_var_or(ACCESS_TOKEN_LIFETIME_MINS_VAR, 480) * 60,
            ),
            signin_token_lifetime: Duration::from_secs(
                env_var_or(SIGNIN_TOKEN_LIFETIME_MINS_VAR, 5) * 60,
            ),
            reset_token_max_age: Duration::from_secs(env_var_or(RESET_TOKEN_MAX_AGE_SECS_VAR, 300)),
            otp_lifetime: Duration::from_secs(env_var_or(OTP_LIFETIME_MINS_VAR, 5) * 60),

            lockout_policy: LockoutPolicy {
                max_attempts: env_var_or(MAX_LOGIN_ATTEMPTS_VAR, 3),
                attempt_window: Duration::from_secs(
                    env_var_or(LOGIN_ATTEMPT_WINDOW_MINS_VAR, 15) * 60,
                ),
                lockout_duration: Duration::from_secs(
                    env_var_or(LOCKOUT_DURATION_MINS_VAR, 5) * 60,
                ),
            },

            actix_worker_count: env_var_or(ACTIX_WORKER_COUNT_VAR, num_cpus::get()),
            log_level: env_var_or(LOG_LEVEL_VAR, String::from("info")),
        };

        Ok(Config {
            inner: UnsafeCell::new(inner),
        })
    }

    /// # Safety
    ///
    /// Safe only if the Config isn't being used by other threads or across an async
    /// boundary. Generally, this should only be used at the end of the main function once
    /// all threads have been joined.
    pub unsafe fn zeroize(&self) {
        unsafe {
            (*self.inner.get()).zeroize();
        }
    }

    /// A fixed configuration so unit tests never depend on the environment.
    #[cfg(test)]
    pub fn for_tests() -> Config {
        let inner = ConfigInner {
            db_username: String::from("postgres"),
            db_password: String::from("postgres"),
            db_hostname: String::from("localhost"),
            db_port: 5432,
            db_name: String::from("ticket_test"),
            db_max_connections: 4,
            db_idle_timeout: Duration::from_secs(30),

            hashing_key: [4u8; HASHING_KEY_SIZE],
            token_signing_key: [7u8; TOKEN_SIGNING_KEY_SIZE],

            hash_length: 32,
            hash_iterations: 1,
            hash_mem_cost_kib: 1024,
            hash_threads: 1,
            hash_salt_length: 16,

            email_enabled: false,
            email_from_address: "Support <support@example.com>"
                .parse()
                .expect("Invalid test mailbox"),
            email_reply_to_address: "No Reply <no-reply@example.com>"
                .parse()
                .expect("Invalid test mailbox"),
            engineer_pool_address: String::from("engineers@example.com"),
            smtp_username: String::new(),
            smtp_password: String::new(),
            smtp_address: String::new(),
            max_smtp_connections: 1,
            smtp_idle_timeout: Duration::from_secs(10),
            email_queue_depth: 16,

            uploads_dir: String::from("./test_uploads"),
            display_time_zone: chrono_tz::Asia::Colombo,

            access_token_lifetime: Duration::from_secs(480 * 60),
            signin_token_lifetime: Duration::from_secs(5 * 60),
            reset_token_max_age: Duration::from_secs(300),
            otp_lifetime: Duration::from_secs(5 * 60),

            lockout_policy: LockoutPolicy::default(),

            actix_worker_count: 1,
            log_level: String::from("info"),
        };

        Config {
            inner: UnsafeCell::new(inner),
        }
    }
}

fn env_var<T: FromStr>(key: &'static str) -> Result<T, ConfigError> {
    let var = std::env::var(key).map_err(|_| ConfigError::MissingVar(key))?;
    let var: T = var.parse().map_err(|_| ConfigError::InvalidVar(key))?;
    Ok(var)
}

fn env_var_or<T: FromStr>(key: &'static str, default: T) -> T {
    let Ok(var) = std::env::var(key) else {
        return default;
    };

    var.parse().unwrap_or(default)
}

#[derive(Clone, Copy, Debug)]
pub enum ConfigError {
    MissingVar(&'static str),
    InvalidVar(&'static str),
}

impl std::error::Error for ConfigError {}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingVar(key) => write!(f, "Missing environment variable '{}'", key),
            Self::InvalidVar(key) => write!(f, "Environment variable '{}' is invalid", key),
        }
    }
}

#[cfg(test)]
pub mod testing {
    use ticket_common::db::{create_db_thread_pool, DbThreadPool};

    use super::*;

    pub static DB_THREAD_POOL: Lazy<DbThreadPool> = Lazy::new(|| {
        create_db_thread_pool(
            &format!(
                "postgres://{}:{}@{}:{}/{}",
                CONF.db_username, CONF.db_password, CONF.db_hostname, CONF.db_port, CONF.db_name,
            ),
            CONF.db_max_connections,
            CONF.db_idle_timeout,
        )
    });
}
