use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::UserRole;
use crate::token::{sign_claims_json, Expiring, HmacSha256Verifier, Token, TokenError};

/// Claims for the single-use token returned by a successful OTP verification
/// during the forgotten-password flow.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PasswordResetClaims {
    #[serde(rename = "eml")]
    pub user_email: String,
    #[serde(rename = "rol")]
    pub user_role: UserRole,
    #[serde(rename = "iat")]
    pub issued_at: u64,
    #[serde(rename = "exp")]
    pub expiration: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewPasswordResetClaims<'a> {
    #[serde(rename = "eml")]
    pub user_email: &'a str,
    #[serde(rename = "rol")]
    pub user_role: UserRole,
    #[serde(rename = "iat")]
    pub issued_at: u64,
    #[serde(rename = "exp")]
    pub expiration: u64,
}

impl Expiring for PasswordResetClaims {
    fn expiration(&self) -> u64 {
        self.expiration
    }
}

impl PasswordResetClaims {
    /// Bounds the token's age from its issue time. The embedded expiration is
    /// checked by signature verification already; this guards the window even
    /// if a longer `exp` was ever issued.
    pub fn check_age(&self, now_secs: u64, max_age: Duration) -> Result<(), TokenError> {
        if self.issued_at > now_secs {
            return Err(TokenError::TokenInvalid);
        }

        if now_secs - self.issued_at > max_age.as_secs() {
            return Err(TokenError::TokenExpired);
        }

        Ok(())
    }
}

pub struct PasswordResetToken {}

impl PasswordResetToken {
    pub fn sign_new(claims: NewPasswordResetClaims, signing_key: &[u8]) -> String {
        let claims_json =
            serde_json::to_vec(&claims).expect("Failed to transform claims into JSON");
        sign_claims_json(claims_json, signing_key)
    }
}

impl Token for PasswordResetToken {
    type Claims = PasswordResetClaims;
    type Verifier = HmacSha256Verifier;

    fn token_name() -> &'static str {
        "PasswordResetToken"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::{SystemTime, UNIX_EPOCH};

    const MAX_AGE: Duration = Duration::from_secs(300);

    fn now_secs() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    #[test]
    fn test_sign_and_verify() {
        let signing_key = [4; 64];
        let now = now_secs();

        let claims = NewPasswordResetClaims {
            user_email: "reset@example.com",
            user_role: UserRole::Customer,
            issued_at: now,
            expiration: now + MAX_AGE.as_secs(),
        };

        let token = PasswordResetToken::sign_new(claims, &signing_key);
        let t = PasswordResetToken::decode(&token).unwrap();
        let claims = t.verify(&signing_key).unwrap();

        assert_eq!(claims.user_email, "reset@example.com");
        assert_eq!(claims.user_role, UserRole::Customer);
        assert!(claims.check_age(now, MAX_AGE).is_ok());
    }

    #[test]
    fn test_age_limit_is_independent_of_embedded_expiration() {
        let now = now_secs();

        // A token carrying a generous exp is still rejected once its issue
        // time is older than the maximum age
        let claims = PasswordResetClaims {
            user_email: String::from("reset@example.com"),
            user_role: UserRole::Engineer,
            issued_at: now - 301,
            expiration: now + 86400,
        };

        assert!(matches!(
            claims.check_age(now, MAX_AGE),
            Err(TokenError::TokenExpired)
        ));

        let claims = PasswordResetClaims {
            issued_at: now - 299,
            ..claims
        };

        assert!(claims.check_age(now, MAX_AGE).is_ok());
    }

    #[test]
    fn test_future_issued_at_is_invalid() {
        let now = now_secs();

        let claims = PasswordResetClaims {
            user_email: String::from("reset@example.com"),
            user_role: UserRole::Admin,
            issued_at: now + 60,
            expiration: now + 360,
        };

        assert!(matches!(
            claims.check_age(now, MAX_AGE),
            Err(TokenError::TokenInvalid)
        ));
    }
}
