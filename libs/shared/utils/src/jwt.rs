use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{TimeZone, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use shared_models::auth::{JwtClaims, User};

type HmacSha256 = Hmac<Sha256>;

/// Validate an HS256 bearer token and recover the caller identity.
pub fn validate_token(token: &str, jwt_secret: &str) -> Result<User, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err("Invalid token format".to_string());
    }

    let header_b64 = parts[0];
    let claims_b64 = parts[1];
    let signature_b64 = parts[2];

    let signature = match URL_SAFE_NO_PAD.decode(signature_b64) {
        Ok(sig) => sig,
        Err(e) => {
            debug!("Failed to decode signature: {}", e);
            return Err("Invalid signature encoding".to_string());
        }
    };

    let signature_string = format!("{}.{}", header_b64, claims_b64);

    let mut mac = match HmacSha256::new_from_slice(jwt_secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return Err("Failed to create HMAC".to_string()),
    };

    mac.update(signature_string.as_bytes());

    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err("Invalid token signature".to_string());
    }

    let claims_json = match URL_SAFE_NO_PAD.decode(claims_b64) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(json_str) => json_str,
            Err(_) => return Err("Invalid claims encoding".to_string()),
        },
        Err(_) => return Err("Invalid claims encoding".to_string()),
    };

    let claims: JwtClaims = match serde_json::from_str(&claims_json) {
        Ok(c) => c,
        Err(e) => {
            debug!("Failed to parse claims: {}", e);
            return Err("Invalid claims format".to_string());
        }
    };

    if let Some(exp) = claims.exp {
        let now = Utc::now().timestamp() as u64;
        if exp < now {
            debug!("Token expired at {} (now: {})", exp, now);
            return Err("Token expired".to_string());
        }
    }

    let created_at = claims
        .iat
        .and_then(|timestamp| Utc.timestamp_opt(timestamp as i64, 0).single());

    let user = User {
        id: claims.sub,
        email: claims.email,
        role: claims.role,
        created_at,
    };

    debug!("Token validated successfully for user: {}", user.id);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    const SECRET: &str = "unit-test-secret";

    fn encode(value: &serde_json::Value) -> String {
        URL_SAFE_NO_PAD.encode(value.to_string())
    }

    fn sign(header: &str, claims: &str, secret: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{}.{}", header, claims).as_bytes());
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }

    fn token_with_claims(claims: serde_json::Value, secret: &str) -> String {
        let header = encode(&json!({"alg": "HS256", "typ": "JWT"}));
        let claims = encode(&claims);
        let signature = sign(&header, &claims, secret);
        format!("{}.{}.{}", header, claims, signature)
    }

    #[test]
    fn accepts_a_well_signed_token() {
        let token = token_with_claims(
            json!({
                "sub": "6f1c1fce-1f41-4d5e-bb0a-76c2bb8d8f5a",
                "email": "pat@example.com",
                "role": "patient",
                "exp": Utc::now().timestamp() + 3600
            }),
            SECRET,
        );

        let user = validate_token(&token, SECRET).unwrap();
        assert_eq!(user.id, "6f1c1fce-1f41-4d5e-bb0a-76c2bb8d8f5a");
        assert_eq!(user.role.as_deref(), Some("patient"));
    }

    #[test]
    fn rejects_a_token_signed_with_another_secret() {
        let token = token_with_claims(json!({"sub": "abc"}), "some-other-secret");

        assert_matches!(validate_token(&token, SECRET), Err(msg) => {
            assert_eq!(msg, "Invalid token signature");
        });
    }

    #[test]
    fn rejects_an_expired_token() {
        let token = token_with_claims(
            json!({"sub": "abc", "exp": Utc::now().timestamp() - 60}),
            SECRET,
        );

        assert_matches!(validate_token(&token, SECRET), Err(msg) => {
            assert_eq!(msg, "Token expired");
        });
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert!(validate_token("not-a-token", SECRET).is_err());
        assert!(validate_token("a.b", SECRET).is_err());
    }

    #[test]
    fn rejects_when_no_secret_is_configured() {
        let token = token_with_claims(json!({"sub": "abc"}), SECRET);
        assert!(validate_token(&token, "").is_err());
    }
}
