use serde::{Deserialize, Serialize};

use crate::models::UserRole;
use crate::token::{sign_claims_json, Expiring, HmacSha256Verifier, Token};

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum AuthTokenType {
    Access,
    SignIn,
}

/// Session claims carry the profile fields the web client renders in its
/// header, so a round trip to the account tables is not needed on every
/// request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthTokenClaims {
    #[serde(rename = "uid")]
    pub user_id: i32,
    #[serde(rename = "eml")]
    pub user_email: String,
    #[serde(rename = "nam")]
    pub user_name: String,
    #[serde(rename = "rol")]
    pub user_role: UserRole,
    #[serde(rename = "mbl")]
    pub mobile: Option<String>,
    #[serde(rename = "dsg")]
    pub designation: Option<String>,
    #[serde(rename = "cmp")]
    pub company: Option<String>,
    #[serde(rename = "exp")]
    pub expiration: u64,
    #[serde(rename = "typ")]
    pub token_type: AuthTokenType,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewAuthTokenClaims<'a> {
    #[serde(rename = "uid")]
    pub user_id: i32,
    #[serde(rename = "eml")]
    pub user_email: &'a str,
    #[serde(rename = "nam")]
    pub user_name: &'a str,
    #[serde(rename = "rol")]
    pub user_role: UserRole,
    #[serde(rename = "mbl")]
    pub mobile: Option<&'a str>,
    #[serde(rename = "dsg")]
    pub designation: Option<&'a str>,
    #[serde(rename = "cmp")]
    pub company: Option<&'a str>,
    #[serde(rename = "exp")]
    pub expiration: u64,
    #[serde(rename = "typ")]
    pub token_type: AuthTokenType,
}

impl Expiring for AuthTokenClaims {
    fn expiration(&self) -> u64 {
        self.expiration
    }
}

pub struct AuthToken {}

impl AuthToken {
    pub fn sign_new(claims: NewAuthTokenClaims, signing_key: &[u8]) -> String {
        let claims_json =
            serde_json::to_vec(&claims).expect("Failed to transform claims into JSON");
        sign_claims_json(claims_json, signing_key)
    }
}

impl Token for AuthToken {
    type Claims = AuthTokenClaims;
    type Verifier = HmacSha256Verifier;

    fn token_name() -> &'static str {
        "AuthToken"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use base64::engine::general_purpose::URL_SAFE as b64_urlsafe;
    use base64::Engine;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    #[test]
    fn test_sign_and_verify() {
        let exp = (SystemTime::now() + Duration::from_secs(10))
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let signing_key = [9; 64];

        let claims = NewAuthTokenClaims {
            user_id: 12,
            user_email: "test1234@example.com",
            user_name: "Test User",
            user_role: UserRole::Customer,
            mobile: Some("0771234567"),
            designation: None,
            company: Some("Acme Corp"),
            expiration: exp,
            token_type: AuthTokenType::Access,
        };

        let token = AuthToken::sign_new(claims, &signing_key);
        let t = AuthToken::decode(&token).unwrap();
        let claims = t.verify(&signing_key).unwrap();

        assert_eq!(claims.user_id, 12);
        assert_eq!(claims.user_email, "test1234@example.com");
        assert_eq!(claims.user_name, "Test User");
        assert_eq!(claims.user_role, UserRole::Customer);
        assert_eq!(claims.mobile.as_deref(), Some("0771234567"));
        assert_eq!(claims.company.as_deref(), Some("Acme Corp"));
        assert_eq!(claims.expiration, exp);
        assert_eq!(claims.token_type, AuthTokenType::Access);
    }

    #[test]
    fn test_tampered_signature_is_rejected() {
        let exp = (SystemTime::now() + Duration::from_secs(10))
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let signing_key = [9; 64];

        let claims = NewAuthTokenClaims {
            user_id: 3,
            user_email: "admin@example.com",
            user_name: "Admin",
            user_role: UserRole::Admin,
            mobile: None,
            designation: None,
            company: None,
            expiration: exp,
            token_type: AuthTokenType::SignIn,
        };

        let token = AuthToken::sign_new(claims, &signing_key);
        let mut t = b64_urlsafe.decode(token).unwrap();

        // Make the signature invalid
        let last_byte = t.pop().unwrap();
        if last_byte == 0x01 {
            t.push(0x02);
        } else {
            t.push(0x01);
        }

        let t = b64_urlsafe.encode(t);

        assert!(AuthToken::decode(&t).unwrap().verify(&signing_key).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let exp = (SystemTime::now() - Duration::from_secs(10))
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let signing_key = [9; 64];

        let claims = NewAuthTokenClaims {
            user_id: 3,
            user_email: "eng@example.com",
            user_name: "Engineer",
            user_role: UserRole::Engineer,
            mobile: Some("0770000000"),
            designation: Some("Field Engineer"),
            company: None,
            expiration: exp,
            token_type: AuthTokenType::Access,
        };

        let token = AuthToken::sign_new(claims, &signing_key);
        assert!(AuthToken::decode(&token)
            .unwrap()
            .verify(&signing_key)
            .is_err());
    }
}
