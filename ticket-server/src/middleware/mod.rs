pub mod auth;

use actix_web::HttpRequest;

use ticket_common::token::TokenError;

use crate::handlers::error::HttpErrorResponse;

pub trait TokenLocation {
    fn get_from_request<'a>(req: &'a HttpRequest, key: &str) -> Result<&'a str, TokenError>;
}

pub struct FromBearerHeader {}

impl TokenLocation for FromBearerHeader {
    fn get_from_request<'a>(req: &'a HttpRequest, key: &str) -> Result<&'a str, TokenError> {
        let header = match req.headers().get(key) {
            Some(h) => h,
            None => return Err(TokenError::TokenMissing),
        };

        let header = header.to_str().map_err(|_| TokenError::HeaderMalformed)?;

        let mut parts = header.split(' ');
        let scheme = parts.next().ok_or(TokenError::HeaderMalformed)?;
        let token = parts.next().ok_or(TokenError::HeaderMalformed)?;

        if parts.next().is_some() || !scheme.eq_ignore_ascii_case("bearer") {
            return Err(TokenError::HeaderMalformed);
        }

        Ok(token)
    }
}

#[inline(always)]
fn into_actix_error_res<T>(result: Result<T, TokenError>) -> Result<T, HttpErrorResponse> {
    match result {
        Ok(t) => Ok(t),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use actix_web::test::TestRequest;

    #[test]
    fn test_bearer_header_parsing() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer abc123"))
            .to_http_request();
        assert_eq!(
            FromBearerHeader::get_from_request(&req, "Authorization").unwrap(),
            "abc123",
        );

        let req = TestRequest::default()
            .insert_header(("Authorization", "bEaReR abc123"))
            .to_http_request();
        assert_eq!(
            FromBearerHeader::get_from_request(&req, "Authorization").unwrap(),
            "abc123",
        );

        let req = TestRequest::default().to_http_request();
        assert!(matches!(
            FromBearerHeader::get_from_request(&req, "Authorization"),
            Err(TokenError::TokenMissing),
        ));

        let req = TestRequest::default()
            .insert_header(("Authorization", "abc123"))
            .to_http_request();
        assert!(matches!(
            FromBearerHeader::get_from_request(&req, "Authorization"),
            Err(TokenError::HeaderMalformed),
        ));

        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer abc123 extra"))
            .to_http_request();
        assert!(matches!(
            FromBearerHeader::get_from_request(&req, "Authorization"),
            Err(TokenError::HeaderMalformed),
        ));

        let req = TestRequest::default()
            .insert_header(("Authorization", "Basic abc123"))
            .to_http_request();
        assert!(matches!(
            FromBearerHeader::get_from_request(&req, "Authorization"),
            Err(TokenError::HeaderMalformed),
        ));
    }
}
