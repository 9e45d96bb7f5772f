// src/auth.rs

use std::path::Path;

use yup_oauth2::{
    authenticator::DefaultAuthenticator, read_service_account_key, ServiceAccountAuthenticator,
};

use crate::error::{Error, Result};

/// The reporting pipeline only ever reads.
pub const SCOPES: &[&str] = &["https://www.googleapis.com/auth/analytics.readonly"];

/// Load a service-account JSON key and build an authenticator from it.
///
/// The authenticator caches and refreshes access tokens internally; callers
/// just ask it for a token per request.
pub async fn service_account_auth(key_path: impl AsRef<Path>) -> Result<DefaultAuthenticator> {
    let key_path = key_path.as_ref();
    let key = read_service_account_key(key_path)
        .await
        .map_err(|source| Error::Credentials {
            path: key_path.to_path_buf(),
            source,
        })?;

    ServiceAccountAuthenticator::builder(key)
        .build()
        .await
        .map_err(|source| Error::Credentials {
            path: key_path.to_path_buf(),
            source,
        })
}
