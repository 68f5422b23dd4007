use diesel::{dsl, ExpressionMethods, OptionalExtension, QueryDsl, RunQueryDsl};
use std::time::SystemTime;

use crate::db::{DaoError, DbThreadPool};
use crate::lockout::{self, LockoutPolicy, PreviousFailures};
use crate::models::login_attempt::{LoginAttempt, NewLoginAttempt};
use crate::models::user_otp::{NewUserOtp, UserOtp};
use crate::models::OtpPurpose;
use crate::otp::Otp;
use crate::schema::login_attempts as login_attempt_fields;
use crate::schema::login_attempts::dsl::login_attempts;
use crate::schema::otps as otp_fields;
use crate::schema::otps::dsl::otps;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OtpConsumeOutcome {
    Verified,
    Incorrect,
    Expired,
    NotFound,
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

    pub fn get_login_attempt(&self, user_email: &str) -> Result<Option<LoginAttempt>, DaoError> {
        Ok(login_attempts
            .find(user_email)
            .get_result::<LoginAttempt>(&mut self.db_thread_pool.get()?)
            .optional()?)
    }

    /// Records a failed sign-in attempt and returns the updated guard row.
    /// Runs in a transaction with the row locked so concurrent failures
    /// cannot undercount.
    pub fn record_failed_attempt(
        &self,
        user_email: &str,
        now: SystemTime,
        policy: &LockoutPolicy,
    ) -> Result<LoginAttempt, DaoError> {
        let mut db_connection = self.db_thread_pool.get()?;

        let attempt = db_connection
            .build_transaction()
            .run::<_, diesel::result::Error, _>(|conn| {
                let previous = login_attempts
                    .find(user_email)
                    .for_update()
                    .get_result::<LoginAttempt>(conn)
                    .optional()?
                    .map(|a| PreviousFailures {
                        attempt_count: a.attempt_count,
                        last_failure_timestamp: a.last_failure_timestamp,
                    });

                let attempt_count = lockout::next_attempt_count(previous, now, policy);
                let locked_until = lockout::lock_expiration(attempt_count, now, policy);

                let new_attempt = NewLoginAttempt {
                    email: user_email,
                    attempt_count,
                    last_failure_timestamp: now,
                    locked_until,
                };

                dsl::insert_into(login_attempts)
                    .values(&new_attempt)
                    .on_conflict(login_attempt_fields::email)
                    .do_update()
                    .set((
                        login_attempt_fields::attempt_count.eq(attempt_count),
                        login_attempt_fields::last_failure_timestamp.eq(now),
                        login_attempt_fields::locked_until.eq(locked_until),
                    ))
                    .get_result::<LoginAttempt>(conn)
            })?;

        Ok(attempt)
    }

    pub fn clear_login_attempts(&self, user_email: &str) -> Result<(), DaoError> {
        diesel::delete(login_attempts.find(user_email))
            .execute(&mut self.db_thread_pool.get()?)?;

        Ok(())
    }

    pub fn save_otp(
        &self,
        otp: &str,
        user_email: &str,
        purpose: OtpPurpose,
        expiration: SystemTime,
    ) -> Result<(), DaoError> {
        let new_otp = NewUserOtp {
            user_email,
            purpose: purpose.as_str(),
            otp,
            expiration,
        };

        dsl::insert_into(otps)
            .values(&new_otp)
            .on_conflict((otp_fields::user_email, otp_fields::purpose))
            .do_update()
            .set((
                otp_fields::otp.eq(otp),
                otp_fields::expiration.eq(expiration),
            ))
            .execute(&mut self.db_thread_pool.get()?)?;

        Ok(())
    }

    /// Checks an OTP and deletes it in the same transaction when it is spent
    /// (verified or expired), so a code can never be replayed between the
    /// check and the delete.
    pub fn consume_otp(
        &self,
        otp: &str,
        user_email: &str,
        purpose: OtpPurpose,
        now: SystemTime,
    ) -> Result<OtpConsumeOutcome, DaoError> {
        let mut db_connection = self.db_thread_pool.get()?;

        let outcome = db_connection
            .build_transaction()
            .run::<_, diesel::result::Error, _>(|conn| {
                let saved = otps
                    .find((user_email, purpose.as_str()))
                    .for_update()
                    .get_result::<UserOtp>(conn)
                    .optional()?;

                let Some(saved) = saved else {
                    return Ok(OtpConsumeOutcome::NotFound);
                };

                if saved.expiration <= now {
                    diesel::delete(otps.find((user_email, purpose.as_str()))).execute(conn)?;
                    return Ok(OtpConsumeOutcome::Expired);
                }

                if !Otp::are_equal(otp, &saved.otp) {
                    return Ok(OtpConsumeOutcome::Incorrect);
                }

                diesel::delete(otps.find((user_email, purpose.as_str()))).execute(conn)?;

                Ok(OtpConsumeOutcome::Verified)
            })?;

        Ok(outcome)
    }

    pub fn delete_all_expired_otps(&self, now: SystemTime) -> Result<usize, DaoError> {
        Ok(
            diesel::delete(otps.filter(otp_fields::expiration.lt(now)))
                .execute(&mut self.db_thread_pool.get()?)?,
        )
    }
}
