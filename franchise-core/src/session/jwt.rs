//! JWT access token issuance and verification
//!
//! Tokens are stateless: nothing is written to storage when one is issued,
//! and a token stays valid until it expires.

use chrono::Utc;
use jsonwebtoken::{Header, decode, encode, errors::ErrorKind};

use crate::{
    Account, Error,
    error::{CryptoError, SessionError},
};

use super::{AccessToken, JwtConfig, SessionClaims};

/// Signs and verifies access tokens with a [`JwtConfig`].
#[derive(Debug, Clone)]
pub struct JwtIssuer {
    config: JwtConfig,
}

impl JwtIssuer {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    /// Issue a token for `account`, valid for the configured lifetime.
    pub fn issue(&self, account: &Account) -> Result<AccessToken, Error> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: account.id.to_string(),
            email: account.email.clone(),
            role: account.role,
            iat: now.timestamp(),
            exp: (now + self.config.expires_in).timestamp(),
            iss: self.config.issuer.clone(),
        };

        self.sign(&claims)
    }

    pub fn sign(&self, claims: &SessionClaims) -> Result<AccessToken, Error> {
        let header = Header::new(self.config.jwt_algorithm());
        let encoding_key = self.config.get_encoding_key()?;

        let token = encode(&header, claims, &encoding_key)
            .map_err(|e| CryptoError::JwtSigning(e.to_string()))?;

        Ok(AccessToken::from(token))
    }

    /// Verify the signature, expiry and issuer of `token` and return its claims.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, Error> {
        let decoding_key = self.config.get_decoding_key()?;
        let validation = self.config.get_validation();

        let token_data =
            decode::<SessionClaims>(token, &decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => SessionError::Expired,
                    _ => SessionError::InvalidToken(format!("JWT validation failed: {e}")),
                }
            })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AccountId, Role};
    use chrono::Duration;

    const TEST_HS256_SECRET: &[u8] = b"franchise_test_secret_for_hs256_tokens_only";

    fn account() -> Account {
        let now = Utc::now();
        Account {
            id: AccountId::new_random(),
            email: "owner@example.com".to_string(),
            full_name: "Maria Santos".to_string(),
            password_hash: String::new(),
            role: Role::FranchiseOwner,
            branch_id: None,
            invitation_code_id: None,
            is_active: true,
            is_email_verified: false,
            email_verification_token: None,
            email_verification_expires: None,
            password_reset_token: None,
            password_reset_expires: None,
            last_login: None,
            login_attempts: 0,
            locked_until: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = JwtIssuer::new(JwtConfig::new_hs256(TEST_HS256_SECRET.to_vec()).with_issuer("franchise"));
        let account = account();

        let token = issuer.issue(&account).unwrap();
        let claims = issuer.verify(token.as_str()).unwrap();

        assert_eq!(claims.account_id(), account.id);
        assert_eq!(claims.email, "owner@example.com");
        assert_eq!(claims.role, Role::FranchiseOwner);
        assert_eq!(claims.iss.as_deref(), Some("franchise"));
        assert_eq!(claims.exp - claims.iat, Duration::hours(24).num_seconds());
    }

    #[test]
    fn test_expired_token() {
        let issuer = JwtIssuer::new(JwtConfig::new_hs256(TEST_HS256_SECRET.to_vec()));
        let now = Utc::now();
        let claims = SessionClaims {
            sub: "usr_expired".to_string(),
            email: "owner@example.com".to_string(),
            role: Role::Crew,
            iat: (now - Duration::hours(3)).timestamp(),
            exp: (now - Duration::hours(2)).timestamp(),
            iss: None,
        };
        let token = issuer.sign(&claims).unwrap();

        assert!(matches!(
            issuer.verify(token.as_str()),
            Err(Error::Session(SessionError::Expired))
        ));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let issuer = JwtIssuer::new(JwtConfig::new_hs256(TEST_HS256_SECRET.to_vec()));
        let other = JwtIssuer::new(JwtConfig::new_hs256(b"another_secret".to_vec()));
        let token = other.issue(&account()).unwrap();

        assert!(matches!(
            issuer.verify(token.as_str()),
            Err(Error::Session(SessionError::InvalidToken(_)))
        ));
    }

    #[test]
    fn test_wrong_issuer_is_rejected() {
        let issuer = JwtIssuer::new(JwtConfig::new_hs256(TEST_HS256_SECRET.to_vec()).with_issuer("franchise"));
        let other = JwtIssuer::new(JwtConfig::new_hs256(TEST_HS256_SECRET.to_vec()).with_issuer("elsewhere"));
        let token = other.issue(&account()).unwrap();

        assert!(issuer.verify(token.as_str()).is_err());
    }

    #[test]
    fn test_garbage_token() {
        let issuer = JwtIssuer::new(JwtConfig::new_hs256(TEST_HS256_SECRET.to_vec()));
        assert!(matches!(
            issuer.verify("invalid.jwt.token"),
            Err(Error::Session(SessionError::InvalidToken(_)))
        ));
    }
}
