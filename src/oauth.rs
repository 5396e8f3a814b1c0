//! OAuth 1.0a request signing (HMAC-SHA1) for the streaming endpoint.

use base64::Engine;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha1::Sha1;

use crate::config::Credentials;

/// RFC 3986 unreserved characters stay literal, everything else is escaped.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

pub fn encode(s: &str) -> String {
    utf8_percent_encode(s, OAUTH_ENCODE_SET).to_string()
}

/// Build the `Authorization` header value for one request.
///
/// `params` are the query or form parameters sent with the request; they take
/// part in the signature but are not repeated in the header.
pub fn authorization_header(
    credentials: &Credentials,
    method: &str,
    url: &str,
    params: &[(&str, String)],
) -> String {
    let nonce: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    let timestamp = time::OffsetDateTime::now_utc().unix_timestamp().to_string();
    authorization_header_with(credentials, method, url, params, &nonce, &timestamp)
}

pub fn authorization_header_with(
    credentials: &Credentials,
    method: &str,
    url: &str,
    params: &[(&str, String)],
    nonce: &str,
    timestamp: &str,
) -> String {
    let mut oauth_params = vec![
        ("oauth_consumer_key", credentials.consumer_key.clone()),
        ("oauth_nonce", nonce.to_owned()),
        ("oauth_signature_method", "HMAC-SHA1".to_owned()),
        ("oauth_timestamp", timestamp.to_owned()),
        ("oauth_token", credentials.access_token.clone()),
        ("oauth_version", "1.0".to_owned()),
    ];

    let mut all_params = oauth_params.clone();
    all_params.extend(params.iter().cloned());
    let base = signature_base_string(method, url, &parameter_string(&all_params));
    let signature = sign(
        &base,
        &credentials.consumer_secret,
        &credentials.access_token_secret,
    );
    oauth_params.push(("oauth_signature", signature));

    let fields: Vec<String> = oauth_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect();
    format!("OAuth {}", fields.join(", "))
}

/// Percent-encode every pair, sort by key then value, join with `&`.
pub fn parameter_string(params: &[(&str, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    encoded.sort();
    encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn signature_base_string(method: &str, url: &str, parameter_string: &str) -> String {
    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(url),
        encode(parameter_string)
    )
}

pub fn sign(base: &str, consumer_secret: &str, token_secret: &str) -> String {
    let key = format!("{}&{}", encode(consumer_secret), encode(token_secret));
    let mut mac =
        Hmac::<Sha1>::new_from_slice(key.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(base.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials {
            consumer_key: "xvz1evFS4wEEPTGEFPHBog".to_owned(),
            consumer_secret: "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw".to_owned(),
            access_token: "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb".to_owned(),
            access_token_secret: "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE".to_owned(),
        }
    }

    #[test]
    fn encodes_reserved_characters() {
        assert_eq!(encode("Ladies + Gentlemen"), "Ladies%20%2B%20Gentlemen");
        assert_eq!(encode("a-b.c_d~e"), "a-b.c_d~e");
        assert_eq!(encode("-122.75,36.8"), "-122.75%2C36.8");
    }

    #[test]
    fn parameters_are_sorted_after_encoding() {
        let params = [
            ("track", "batman,joker".to_owned()),
            ("language", "en".to_owned()),
            ("oauth_version", "1.0".to_owned()),
        ];
        assert_eq!(
            parameter_string(&params),
            "language=en&oauth_version=1.0&track=batman%2Cjoker"
        );
    }

    #[test]
    fn base_string_encodes_url_and_parameters() {
        let base = signature_base_string(
            "post",
            "https://stream.twitter.com/1.1/statuses/filter.json",
            "language=en&track=batman%2Cjoker",
        );
        assert_eq!(
            base,
            "POST&https%3A%2F%2Fstream.twitter.com%2F1.1%2Fstatuses%2Ffilter.json\
             &language%3Den%26track%3Dbatman%252Cjoker"
        );
    }

    #[test]
    fn signature_is_deterministic_base64_sha1() {
        let a = sign("POST&x&y", "secret", "token");
        let b = sign("POST&x&y", "secret", "token");
        let c = sign("POST&x&y", "secret", "other");
        assert_eq!(a, b);
        assert_ne!(a, c);
        // 20-byte digest encodes to 28 base64 characters
        assert_eq!(a.len(), 28);
    }

    #[test]
    fn header_lists_oauth_fields_only() {
        let header = authorization_header_with(
            &credentials(),
            "POST",
            "https://stream.twitter.com/1.1/statuses/filter.json",
            &[("track", "batman".to_owned())],
            "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg",
            "1318622958",
        );
        assert!(header.starts_with("OAuth oauth_consumer_key=\"xvz1evFS4wEEPTGEFPHBog\""));
        assert!(header.contains("oauth_timestamp=\"1318622958\""));
        assert!(header.contains("oauth_signature=\""));
        assert!(!header.contains("track"));
    }
}
