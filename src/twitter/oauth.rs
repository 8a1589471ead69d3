//! OAuth 1.0a request signing (HMAC-SHA1) for user-context Twitter calls.
use data_encoding::BASE64;
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::distr::{Alphanumeric, SampleString};
use reqwest::{Method, Url};
use sha1::Sha1;
use std::fmt;

/// Everything outside the RFC 3986 unreserved set is escaped.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const VERSION: &str = "1.0";
const NONCE_LEN: usize = 32;

/// App (consumer) and user (access token) key pairs.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub token: String,
    pub token_secret: String,
}

impl fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"[REDACTED]")
            .field("token", &"[REDACTED]")
            .field("token_secret", &"[REDACTED]")
            .finish()
    }
}

fn encode(s: &str) -> String {
    utf8_percent_encode(s, UNRESERVED).to_string()
}

pub fn generate_nonce() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), NONCE_LEN)
}

pub fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Scheme, host, non-default port and path; no query or fragment.
fn base_url(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    let port = url.port().map(|p| format!(":{}", p)).unwrap_or_default();
    format!("{}://{}{}{}", url.scheme(), host, port, url.path())
}

/// Build the string that gets signed: method, base URL and the sorted,
/// encoded parameter list (query pairs plus `oauth_params`).
pub fn signature_base_string(
    method: &Method,
    url: &Url,
    oauth_params: &[(&str, String)],
) -> String {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (encode(&k), encode(&v)))
        .chain(oauth_params.iter().map(|(k, v)| (encode(k), encode(v))))
        .collect();
    params.sort();

    let normalized = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.as_str().to_ascii_uppercase(),
        encode(&base_url(url)),
        encode(&normalized)
    )
}

pub fn sign(creds: &OAuthCredentials, base_string: &str) -> Result<String, InvalidLength> {
    let consumer_secret = encode(&creds.consumer_secret);
    let token_secret = encode(&creds.token_secret);
    let key = format!("{}&{}", consumer_secret, token_secret);
    let mut mac = Hmac::<Sha1>::new_from_slice(key.as_bytes())?;
    mac.update(base_string.as_bytes());
    Ok(BASE64.encode(&mac.finalize().into_bytes()))
}

/// Value for the `Authorization` header of a request to `url`.
///
/// Request bodies are not part of the signature, which matches JSON payloads.
pub fn authorization_header(
    creds: &OAuthCredentials,
    method: &Method,
    url: &Url,
    nonce: &str,
    timestamp: i64,
) -> Result<String, InvalidLength> {
    let mut params = vec![
        ("oauth_consumer_key", creds.consumer_key.clone()),
        ("oauth_nonce", nonce.to_string()),
        ("oauth_signature_method", SIGNATURE_METHOD.to_string()),
        ("oauth_timestamp", timestamp.to_string()),
        ("oauth_token", creds.token.clone()),
        ("oauth_version", VERSION.to_string()),
    ];
    let signature = sign(creds, &signature_base_string(method, url, &params))?;
    params.push(("oauth_signature", signature));
    params.sort_by(|a, b| a.0.cmp(&b.0));

    let fields = params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("OAuth {}", fields))
}
