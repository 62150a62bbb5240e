// SPDX-License-Identifier: MIT

//! Provider OAuth routes (Strava activity import, Google Calendar
//! export).
//!
//! Authorization is a full-page redirect; the callback exchanges the
//! code server-side so the client secret never reaches a browser. The
//! state parameter carries the provider discriminator and return URL,
//! HMAC-signed to survive the round trip untampered.

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{AppError, Result};
use crate::services::{calendar, strava};
use crate::AppState;

use hmac::{Hmac, Mac};
use sha2::Sha256;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/{provider}", get(auth_start))
        .route("/auth/{provider}/callback", get(auth_callback))
        .route("/auth/{provider}/status", get(auth_status))
        .route("/auth/{provider}/disconnect", post(auth_disconnect))
}

/// Query parameters for starting an OAuth flow.
#[derive(Deserialize)]
pub struct AuthStartParams {
    /// Frontend URL to redirect back to after OAuth completes.
    /// If not provided, uses the configured frontend URL.
    #[serde(default)]
    redirect_uri: Option<String>,
}

/// Start OAuth flow - redirect to the provider's consent page.
async fn auth_start(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    Query(params): Query<AuthStartParams>,
    headers: axum::http::HeaderMap,
) -> Result<Redirect> {
    let provider = known_provider(&provider)?;

    let frontend_url = params
        .redirect_uri
        .unwrap_or_else(|| state.config.frontend_url.clone());

    let oauth_state = sign_state(provider, &frontend_url, &state.config.oauth_state_key)?;
    let callback_url = format!("{}/auth/{}/callback", request_base(&headers), provider);

    let auth_url = match provider {
        strava::PROVIDER => format!(
            "https://www.strava.com/oauth/authorize?\
             client_id={}&\
             redirect_uri={}&\
             response_type=code&\
             scope=activity:read_all&\
             state={}",
            state.config.strava_client_id,
            urlencoding::encode(&callback_url),
            oauth_state
        ),
        calendar::PROVIDER => format!(
            "https://accounts.google.com/o/oauth2/v2/auth?\
             client_id={}&\
             redirect_uri={}&\
             response_type=code&\
             scope={}&\
             access_type=offline&\
             prompt=consent&\
             state={}",
            state.config.google_client_id,
            urlencoding::encode(&callback_url),
            urlencoding::encode("https://www.googleapis.com/auth/calendar.events"),
            oauth_state
        ),
        _ => unreachable!(),
    };

    tracing::info!(provider, frontend_url = %frontend_url, "Starting OAuth flow");
    Ok(Redirect::temporary(&auth_url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    state: String,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange code for tokens and return to the frontend.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    Query(params): Query<CallbackParams>,
) -> Result<Redirect> {
    let provider = known_provider(&provider)?;

    // Decode and verify frontend URL from state parameter
    let frontend_url = verify_and_decode_state(&params.state, provider, &state.config.oauth_state_key)
        .unwrap_or_else(|| {
            tracing::warn!(
                provider,
                "Invalid or tampered state parameter, falling back to default frontend URL"
            );
            state.config.frontend_url.clone()
        });

    // Check for OAuth errors (user denied, etc.)
    if let Some(error) = params.error {
        tracing::warn!(provider, error = %error, "OAuth error from provider");
        let redirect = format!("{}?error={}", frontend_url, urlencoding::encode(&error));
        return Ok(Redirect::temporary(&redirect));
    }

    let Some(code) = params.code else {
        let redirect = format!("{}?error=missing_code", frontend_url);
        return Ok(Redirect::temporary(&redirect));
    };

    let exchanged = match provider {
        strava::PROVIDER => state.strava.tokens.handle_callback(&code).await,
        calendar::PROVIDER => state.calendar.tokens.handle_callback(&code).await,
        _ => unreachable!(),
    };

    match exchanged {
        Ok(()) => {
            tracing::info!(provider, "OAuth successful, tokens stored");
            Ok(Redirect::temporary(&format!(
                "{}?connected={}",
                frontend_url, provider
            )))
        }
        Err(e) => {
            tracing::error!(provider, error = %e, "Token exchange failed");
            Ok(Redirect::temporary(&format!(
                "{}?error=token_exchange_failed",
                frontend_url
            )))
        }
    }
}

#[derive(Serialize)]
pub struct AuthStatusResponse {
    pub provider: String,
    pub connected: bool,
}

/// Connection status: a stored token triple exists. Does not verify the
/// tokens are still accepted by the provider.
async fn auth_status(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
) -> Result<Json<AuthStatusResponse>> {
    let provider = known_provider(&provider)?;
    let connected = match provider {
        strava::PROVIDER => state.strava.tokens.is_connected().await,
        calendar::PROVIDER => state.calendar.tokens.is_connected().await,
        _ => unreachable!(),
    };
    Ok(Json(AuthStatusResponse {
        provider: provider.to_string(),
        connected,
    }))
}

/// Forget stored tokens. No server-side revocation.
async fn auth_disconnect(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
) -> Result<Json<AuthStatusResponse>> {
    let provider = known_provider(&provider)?;
    match provider {
        strava::PROVIDER => state.strava.tokens.disconnect().await,
        calendar::PROVIDER => state.calendar.tokens.disconnect().await,
        _ => unreachable!(),
    }
    Ok(Json(AuthStatusResponse {
        provider: provider.to_string(),
        connected: false,
    }))
}

fn known_provider(provider: &str) -> Result<&'static str> {
    match provider {
        strava::PROVIDER => Ok(strava::PROVIDER),
        calendar::PROVIDER => Ok(calendar::PROVIDER),
        other => Err(AppError::NotFound(format!("Unknown provider {}", other))),
    }
}

/// Scheme and host to build the callback URL from request headers.
fn request_base(headers: &axum::http::HeaderMap) -> String {
    let host = headers
        .get(axum::http::header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| {
            std::env::var("API_HOST").unwrap_or_else(|_| "localhost:8080".to_string())
        });

    let scheme = if host.contains("localhost") || host.contains("127.0.0.1") {
        "http"
    } else {
        "https"
    };
    format!("{}://{}", scheme, host)
}

/// Build the signed OAuth state: "provider|frontend_url|timestamp_hex"
/// plus an HMAC signature, base64-encoded for the URL.
fn sign_state(provider: &str, frontend_url: &str, secret: &[u8]) -> Result<String> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis();

    let state_payload = format!("{}|{}|{:x}", provider, frontend_url, timestamp);

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(state_payload.as_bytes());
    let signature = mac.finalize().into_bytes();

    let signed_state = format!("{}|{}", state_payload, hex::encode(signature));
    Ok(URL_SAFE_NO_PAD.encode(signed_state.as_bytes()))
}

/// Verify HMAC signature and provider, returning the frontend URL the
/// flow started from.
fn verify_and_decode_state(state: &str, expected_provider: &str, secret: &[u8]) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    // Format is "provider|frontend_url|timestamp_hex|signature_hex"
    let parts: Vec<&str> = state_str.splitn(4, '|').collect();
    if parts.len() != 4 {
        return None;
    }

    let provider = parts[0];
    let frontend_url = parts[1];
    let timestamp_hex = parts[2];
    let signature_hex = parts[3];

    if provider != expected_provider {
        tracing::error!(provider, expected_provider, "OAuth state provider mismatch");
        return None;
    }

    // Reconstruct payload and verify signature
    let payload = format!("{}|{}|{}", provider, frontend_url, timestamp_hex);

    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload.as_bytes());

    let expected_signature = hex::encode(mac.finalize().into_bytes());

    if signature_hex != expected_signature {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return None;
    }

    Some(frontend_url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_round_trip() {
        let secret = b"secret_key";
        let encoded = sign_state("strava", "https://example.com", secret).unwrap();

        let result = verify_and_decode_state(&encoded, "strava", secret);
        assert_eq!(result, Some("https://example.com".to_string()));
    }

    #[test]
    fn test_state_rejects_wrong_provider() {
        let secret = b"secret_key";
        let encoded = sign_state("strava", "https://example.com", secret).unwrap();

        // A state minted for one provider must not validate for another.
        assert_eq!(verify_and_decode_state(&encoded, "calendar", secret), None);
    }

    #[test]
    fn test_state_rejects_wrong_secret() {
        let encoded = sign_state("strava", "https://example.com", b"secret_key").unwrap();
        assert_eq!(
            verify_and_decode_state(&encoded, "strava", b"wrong_key"),
            None
        );
    }

    #[test]
    fn test_state_rejects_tampered_payload() {
        let secret = b"secret_key";
        let encoded = sign_state("strava", "https://example.com", secret).unwrap();

        let mut decoded = String::from_utf8(URL_SAFE_NO_PAD.decode(&encoded).unwrap()).unwrap();
        decoded = decoded.replace("example.com", "evil.example");
        let tampered = URL_SAFE_NO_PAD.encode(decoded.as_bytes());

        assert_eq!(verify_and_decode_state(&tampered, "strava", secret), None);
    }

    #[test]
    fn test_state_rejects_malformed_input() {
        let secret = b"secret_key";
        assert_eq!(verify_and_decode_state("!!!", "strava", secret), None);
        let short = URL_SAFE_NO_PAD.encode("only|three|parts");
        assert_eq!(verify_and_decode_state(&short, "strava", secret), None);
    }

    #[test]
    fn test_known_provider_guard() {
        assert!(known_provider("strava").is_ok());
        assert!(known_provider("calendar").is_ok());
        assert!(known_provider("garmin").is_err());
    }
}
