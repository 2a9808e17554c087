//! 토큰 교환 / 갱신 / 검증

use std::sync::Arc;

use crate::auth::TokenCodec;
use crate::clock::Clock;
use crate::credential::{Expiring, ResourceOwner};
use crate::store::{Credentials, Redemption};
use crate::wire::{TokenGrant, GRANT_ACCESS_CODE, GRANT_REFRESH_TOKEN, TOKEN_TYPE_BEARER};
use crate::{Error, Result};

#[derive(Clone)]
pub struct AuthFlow {
    credentials: Credentials,
    codec: Arc<TokenCodec>,
    clock: Arc<dyn Clock>,
}

impl AuthFlow {
    pub fn new(credentials: Credentials, codec: Arc<TokenCodec>, clock: Arc<dyn Clock>) -> Self {
        Self {
            credentials,
            codec,
            clock,
        }
    }

    /// Access Code를 토큰으로 교환
    ///
    /// 코드는 만료 여부와 상관없이 redeem 시점에 소비됩니다.
    pub async fn access_token(&self, grant_type: &str, code: &str) -> Result<TokenGrant> {
        if grant_type != GRANT_ACCESS_CODE {
            return Err(Error::UnsupportedGrantType {
                grant_type: grant_type.to_string(),
            });
        }
        let now = self.clock.now();

        let code = match self.credentials.store().redeem_code(code).await {
            Ok(Redemption::Redeemed(code)) => code,
            Ok(Redemption::AlreadyUsed) => return Err(Error::CodeWasUsed),
            Ok(Redemption::NotFound) => return Err(Error::CodeNotFound),
            Err(e) => return Err(Error::internal("AccessToken[redeem code]", e)),
        };
        if code.is_expired_at(now) {
            return Err(Error::CodeExpired);
        }

        let owner = code.owner();
        let issued = self
            .codec
            .make(&owner, now)
            .map_err(|e| Error::internal("AccessToken[make token]", e))?;
        let refresh = self
            .credentials
            .issue_refresh_token(&owner, now)
            .await
            .map_err(|e| Error::internal("AccessToken[issue refresh token]", e))?;

        tracing::debug!(owner = %owner.id, "access token issued");

        let expires_in = issued.expires_in();
        Ok(TokenGrant {
            access_token: issued.token,
            expires_in,
            refresh_token: Some(refresh.token),
            token_type: Some(TOKEN_TYPE_BEARER.to_string()),
        })
    }

    /// Refresh Token으로 새 Access Token 발급 (Refresh Token은 유지)
    pub async fn refresh(&self, grant_type: &str, refresh_token: &str) -> Result<TokenGrant> {
        if grant_type != GRANT_REFRESH_TOKEN {
            return Err(Error::UnsupportedGrantType {
                grant_type: grant_type.to_string(),
            });
        }
        let now = self.clock.now();

        let token = self
            .credentials
            .store()
            .find_refresh_token(refresh_token)
            .await
            .map_err(|e| Error::internal("RefreshAccessToken[find refresh token]", e))?
            .filter(|token| !token.is_expired_at(now))
            .ok_or(Error::RefreshTokenNotFound)?;

        let issued = self
            .codec
            .make(&token.owner(), now)
            .map_err(|e| Error::internal("RefreshAccessToken[make token]", e))?;

        let expires_in = issued.expires_in();
        Ok(TokenGrant {
            access_token: issued.token,
            expires_in,
            refresh_token: None,
            token_type: None,
        })
    }

    /// Access Token 검증
    pub async fn verify(&self, access_token: &str) -> Result<ResourceOwner> {
        let now = self.clock.now();

        let claims = self
            .codec
            .parse(access_token)
            .map_err(|_| Error::AccessTokenBroken)?;
        if claims.is_expired_at(now) {
            return Err(Error::AccessTokenExpired);
        }

        Ok(claims.owner())
    }
}
