use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

/// Claims of tokens issued by the HR platform's auth service. This service
/// only verifies them.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    pub role: u8, // role id
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn sign(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims(exp: usize) -> Claims {
        Claims {
            user_id: 1,
            sub: "asha".into(),
            role: 4,
            exp,
            jti: "test-jti".into(),
            token_type: TokenType::Access,
            employee_id: Some(1000),
        }
    }

    fn far_future() -> usize {
        (chrono::Utc::now().timestamp() + 3600) as usize
    }

    #[test]
    fn verifies_token_signed_with_same_secret() {
        let token = sign(&claims(far_future()), "secret");
        let verified = verify_token(&token, "secret").unwrap();
        assert_eq!(verified.employee_id, Some(1000));
        assert_eq!(verified.token_type, TokenType::Access);
    }

    #[test]
    fn rejects_wrong_secret_and_expired_tokens() {
        let token = sign(&claims(far_future()), "secret");
        assert!(verify_token(&token, "other").is_err());

        let expired = sign(&claims(1_000), "secret");
        assert!(verify_token(&expired, "secret").is_err());
    }
}
