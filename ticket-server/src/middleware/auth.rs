use ticket_common::models::UserRole;
use ticket_common::token::auth_token::{AuthToken, AuthTokenClaims, AuthTokenType};
use ticket_common::token::{DecodedToken, Token, TokenError};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use futures::future;
use std::marker::PhantomData;

use crate::env;
use crate::handlers::error::HttpErrorResponse;
use crate::middleware::{into_actix_error_res, TokenLocation};

pub trait RequestAuthTokenType {
    fn token_type() -> AuthTokenType;
}

pub struct Access {}
pub struct SignIn {}

impl RequestAuthTokenType for Access {
    fn token_type() -> AuthTokenType {
        AuthTokenType::Access
    }
}

impl RequestAuthTokenType for SignIn {
    fn token_type() -> AuthTokenType {
        AuthTokenType::SignIn
    }
}

const AUTHORIZATION_HEADER: &str = "Authorization";

type AuthDecodedToken = DecodedToken<<AuthToken as Token>::Claims, <AuthToken as Token>::Verifier>;

#[derive(Debug)]
pub struct VerifiedToken<T: RequestAuthTokenType, L: TokenLocation> {
    pub claims: AuthTokenClaims,
    _marker: PhantomData<(T, L)>,
}

impl<T, L> VerifiedToken<T, L>
where
    T: RequestAuthTokenType,
    L: TokenLocation,
{
    /// Returns `Forbidden` when the token's role doesn't match, regardless of
    /// how valid the token otherwise is.
    pub fn require_role(&self, role: UserRole) -> Result<(), HttpErrorResponse> {
        if self.claims.user_role == role {
            Ok(())
        } else {
            Err(HttpErrorResponse::Forbidden(String::from(
                "This endpoint is not available to the signed-in role",
            )))
        }
    }
}

impl<T, L> FromRequest for VerifiedToken<T, L>
where
    T: RequestAuthTokenType,
    L: TokenLocation,
{
    type Error = HttpErrorResponse;
    type Future = future::Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let decoded_token = match into_actix_error_res(get_and_decode_token::<L>(req)) {
            Ok(t) => t,
            Err(e) => return future::err(e),
        };

        let claims = match into_actix_error_res(verify_token(&decoded_token, T::token_type())) {
            Ok(c) => c,
            Err(e) => return future::err(e),
        };

        future::ok(VerifiedToken {
            claims,
            _marker: PhantomData,
        })
    }
}

#[inline]
fn get_and_decode_token<L: TokenLocation>(req: &HttpRequest) -> Result<AuthDecodedToken, TokenError> {
    let extracted = L::get_from_request(req, AUTHORIZATION_HEADER)?;
    AuthToken::decode(extracted)
}

#[inline]
fn verify_token(
    decoded_token: &AuthDecodedToken,
    expected_type: AuthTokenType,
) -> Result<AuthTokenClaims, TokenError> {
    let claims = decoded_token.verify(&env::CONF.token_signing_key)?;

    if claims.token_type != expected_type {
        return Err(TokenError::WrongTokenType);
    }

    Ok(claims.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    use actix_web::dev::Payload;
    use actix_web::test::TestRequest;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    use ticket_common::token::auth_token::NewAuthTokenClaims;

    use crate::middleware::FromBearerHeader;

    fn sign_token(token_type: AuthTokenType, role: UserRole, exp_offset_secs: i64) -> String {
        let exp = if exp_offset_secs >= 0 {
            SystemTime::now() + Duration::from_secs(exp_offset_secs as u64)
        } else {
            SystemTime::now() - Duration::from_secs((-exp_offset_secs) as u64)
        };
        let exp = exp.duration_since(UNIX_EPOCH).unwrap().as_secs();

        let claims = NewAuthTokenClaims {
            user_id: 42,
            user_email: "test1234@example.com",
            user_name: "Test User",
            user_role: role,
            mobile: Some("0771234567"),
            designation: None,
            company: Some("Acme"),
            expiration: exp,
            token_type,
        };

        AuthToken::sign_new(claims, &env::CONF.token_signing_key)
    }

    #[actix_web::test]
    async fn test_verified_token_from_bearer_header() {
        let token = sign_token(AuthTokenType::Access, UserRole::Customer, 60);

        let req = TestRequest::default()
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_http_request();

        let verified =
            VerifiedToken::<Access, FromBearerHeader>::from_request(&req, &mut Payload::None)
                .await
                .unwrap();

        assert_eq!(verified.claims.user_id, 42);
        assert_eq!(verified.claims.user_email, "test1234@example.com");
        assert_eq!(verified.claims.user_role, UserRole::Customer);

        assert!(verified.require_role(UserRole::Customer).is_ok());
        assert!(verified.require_role(UserRole::Engineer).is_err());

        // An access token is not accepted where a signin token is expected
        assert!(
            VerifiedToken::<SignIn, FromBearerHeader>::from_request(&req, &mut Payload::None)
                .await
                .is_err()
        );
    }

    #[actix_web::test]
    async fn test_missing_and_malformed_headers_are_rejected() {
        let req = TestRequest::default().to_http_request();
        assert!(
            VerifiedToken::<Access, FromBearerHeader>::from_request(&req, &mut Payload::None)
                .await
                .is_err()
        );

        let token = sign_token(AuthTokenType::Access, UserRole::Engineer, 60);

        let req = TestRequest::default()
            .insert_header(("Authorization", token.clone()))
            .to_http_request();
        assert!(
            VerifiedToken::<Access, FromBearerHeader>::from_request(&req, &mut Payload::None)
                .await
                .is_err()
        );

        let req = TestRequest::default()
            .insert_header(("Authorization", format!("Basic {token}")))
            .to_http_request();
        assert!(
            VerifiedToken::<Access, FromBearerHeader>::from_request(&req, &mut Payload::None)
                .await
                .is_err()
        );
    }

    #[actix_web::test]
    async fn test_expired_token_is_rejected() {
        let token = sign_token(AuthTokenType::Access, UserRole::Admin, -60);

        let req = TestRequest::default()
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_http_request();

        assert!(
            VerifiedToken::<Access, FromBearerHeader>::from_request(&req, &mut Payload::None)
                .await
                .is_err()
        );
    }

    #[actix_web::test]
    async fn test_signin_token_accepted_only_by_signin_extractor() {
        let token = sign_token(AuthTokenType::SignIn, UserRole::Admin, 60);

        let req = TestRequest::default()
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_http_request();

        assert!(
            VerifiedToken::<SignIn, FromBearerHeader>::from_request(&req, &mut Payload::None)
                .await
                .is_ok()
        );
        assert!(
            VerifiedToken::<Access, FromBearerHeader>::from_request(&req, &mut Payload::None)
                .await
                .is_err()
        );
    }
}
