use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use url::form_urlencoded;

type HmacSha256 = Hmac<Sha256>;

/// Key Telegram uses to derive the secret from the bot token
const WEB_APP_DATA_KEY: &[u8] = b"WebAppData";

/// Telegram user as carried in the `user` field of init data
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WebAppUser {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Init data verification errors
#[derive(Debug, Error)]
pub enum InitDataError {
    #[error("initData hash missing")]
    MissingHash,

    #[error("initData hash mismatch - data may be tampered")]
    HashMismatch,

    #[error("auth_date missing")]
    MissingAuthDate,

    #[error("auth_date is not a unix timestamp: {0}")]
    InvalidAuthDate(String),

    #[error("initData is too old ({age_secs} seconds)")]
    Expired { age_secs: i64 },

    #[error("user missing")]
    MissingUser,

    #[error("Failed to parse user JSON: {0}")]
    InvalidUser(#[from] serde_json::Error),
}

/// Parsed init data (query string format)
///
/// Parameters are kept sorted by key, which is exactly the order the data check
/// string needs. A repeated key keeps its first value. Blank values are dropped,
/// the way Python's `parse_qs` does on the backend, so `foo=` never reaches the
/// data check string.
#[derive(Debug, Clone, Default)]
pub struct InitData {
    params: BTreeMap<String, String>,
}

impl InitData {
    pub fn parse(init_data: &str) -> Self {
        let mut params = BTreeMap::new();
        let pairs = form_urlencoded::parse(init_data.as_bytes()).filter(|(_, value)| !value.is_empty());
        for (key, value) in pairs {
            params.entry(key.into_owned()).or_insert_with(|| value.into_owned());
        }
        Self { params }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// All parameters except `hash`, as sorted `key=value` lines
    pub fn data_check_string(&self) -> String {
        self.params
            .iter()
            .filter(|(key, _)| key.as_str() != "hash")
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn auth_date(&self) -> Result<DateTime<Utc>, InitDataError> {
        let raw = self.get("auth_date").ok_or(InitDataError::MissingAuthDate)?;
        raw.parse::<i64>()
            .ok()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .ok_or_else(|| InitDataError::InvalidAuthDate(raw.to_string()))
    }

    /// The `user` field, without any signature check
    pub fn user(&self) -> Result<WebAppUser, InitDataError> {
        let user_json = self.get("user").ok_or(InitDataError::MissingUser)?;
        Ok(serde_json::from_str(user_json)?)
    }

    /// Validates the Telegram signature and freshness, then returns the user
    ///
    /// Telegram signs init data with HMAC-SHA256. The HMAC key is itself
    /// `HMAC_SHA256(key = "WebAppData", msg = bot_token)`.
    pub fn verify(&self, bot_token: &str, max_age: Duration) -> Result<WebAppUser, InitDataError> {
        self.verify_at(bot_token, max_age, Utc::now())
    }

    pub fn verify_at(
        &self,
        bot_token: &str,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> Result<WebAppUser, InitDataError> {
        let received_hash = self.get("hash").ok_or(InitDataError::MissingHash)?;
        let received = hex::decode(received_hash).map_err(|_| InitDataError::HashMismatch)?;

        // verify_slice compares in constant time
        data_check_mac(bot_token, &self.data_check_string())
            .verify_slice(&received)
            .map_err(|_| InitDataError::HashMismatch)?;

        let age_secs = now.timestamp() - self.auth_date()?.timestamp();
        if age_secs > i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX) {
            return Err(InitDataError::Expired { age_secs });
        }

        self.user()
    }
}

/// Reads the user from init data WITHOUT validation
///
/// Only for development setups where no bot token is available.
pub fn extract_user_unverified(init_data: &str) -> Result<WebAppUser, InitDataError> {
    InitData::parse(init_data).user()
}

/// Hex signature Telegram would put in `hash` for this data check string
pub fn sign(bot_token: &str, data_check_string: &str) -> String {
    hex::encode(data_check_mac(bot_token, data_check_string).finalize().into_bytes())
}

fn data_check_mac(bot_token: &str, data_check_string: &str) -> HmacSha256 {
    let mut secret_key_mac = new_mac(WEB_APP_DATA_KEY);
    secret_key_mac.update(bot_token.as_bytes());
    let secret_key = secret_key_mac.finalize().into_bytes();

    let mut mac = new_mac(&secret_key);
    mac.update(data_check_string.as_bytes());
    mac
}

#[allow(clippy::expect_used)]
fn new_mac(key: &[u8]) -> HmacSha256 {
    HmacSha256::new_from_slice(key).expect("HMAC can take key of any size")
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOT_TOKEN: &str = "123456:TEST-TOKEN";
    const AUTH_DATE: i64 = 1_700_000_000;

    fn signed_init_data(user_json: &str, auth_date: i64) -> String {
        let unsigned = form_urlencoded::Serializer::new(String::new())
            .append_pair("query_id", "AAHdF6IQAAAAAN0XohDhrOrc")
            .append_pair("user", user_json)
            .append_pair("auth_date", &auth_date.to_string())
            .finish();
        let hash = sign(BOT_TOKEN, &InitData::parse(&unsigned).data_check_string());
        format!("{}&hash={}", unsigned, hash)
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_extract_user() {
        let init_data = "user=%7B%22id%22%3A123456789%2C%22first_name%22%3A%22Test%22%7D&auth_date=1234567890&hash=abc";
        let user = extract_user_unverified(init_data).unwrap();
        assert_eq!(user.id, 123456789);
        assert_eq!(user.first_name.as_deref(), Some("Test"));
        assert_eq!(user.username, None);
    }

    #[test]
    fn test_data_check_string_is_sorted_without_hash() {
        let data = InitData::parse("user=u&auth_date=1&hash=h&query_id=q");
        assert_eq!(data.data_check_string(), "auth_date=1\nquery_id=q\nuser=u");
    }

    #[test]
    fn test_blank_values_are_dropped() {
        let data = InitData::parse("foo=&user=u&auth_date=1&hash=h&user=second&bar=&bar=x");
        assert_eq!(data.get("foo"), None);
        assert_eq!(data.get("bar"), Some("x"));
        assert_eq!(data.data_check_string(), "auth_date=1\nbar=x\nuser=u");
    }

    #[test]
    fn test_verify_ignores_blank_params() {
        // Signed without the blank parameter, as the backend computes it
        let signed = signed_init_data(r#"{"id":42}"#, AUTH_DATE);
        let with_blank = format!("start_param=&{}", signed);
        let user = InitData::parse(&with_blank)
            .verify_at(BOT_TOKEN, Duration::from_secs(60), at(AUTH_DATE))
            .unwrap();
        assert_eq!(user.id, 42);

        let result = InitData::parse("hash=&auth_date=1").verify(BOT_TOKEN, Duration::from_secs(60));
        assert!(matches!(result, Err(InitDataError::MissingHash)));
    }

    #[test]
    fn test_verify_valid() {
        let init_data = signed_init_data(r#"{"id":42,"username":"neo","first_name":"Thomas"}"#, AUTH_DATE);
        let user = InitData::parse(&init_data)
            .verify_at(BOT_TOKEN, Duration::from_secs(86400), at(AUTH_DATE + 60))
            .unwrap();
        assert_eq!(
            user,
            WebAppUser {
                id: 42,
                username: Some("neo".to_string()),
                first_name: Some("Thomas".to_string()),
                last_name: None,
            }
        );
    }

    #[test]
    fn test_missing_hash() {
        let data = InitData::parse("user={\"id\":123}&auth_date=1234567890");
        let result = data.verify("test_token", Duration::from_secs(86400));
        assert!(matches!(result, Err(InitDataError::MissingHash)));
    }

    #[test]
    fn test_wrong_bot_token() {
        let init_data = signed_init_data(r#"{"id":42}"#, AUTH_DATE);
        let result = InitData::parse(&init_data).verify_at("other:token", Duration::from_secs(86400), at(AUTH_DATE));
        assert!(matches!(result, Err(InitDataError::HashMismatch)));
    }

    #[test]
    fn test_tampered_user() {
        let init_data = signed_init_data(r#"{"id":42}"#, AUTH_DATE).replace("42", "43");
        let result = InitData::parse(&init_data).verify_at(BOT_TOKEN, Duration::from_secs(86400), at(AUTH_DATE));
        assert!(matches!(result, Err(InitDataError::HashMismatch)));
    }

    #[test]
    fn test_non_hex_hash() {
        let result = InitData::parse("auth_date=1&hash=zz").verify(BOT_TOKEN, Duration::from_secs(60));
        assert!(matches!(result, Err(InitDataError::HashMismatch)));
    }

    #[test]
    fn test_expired() {
        let init_data = signed_init_data(r#"{"id":42}"#, AUTH_DATE);
        let result = InitData::parse(&init_data).verify_at(BOT_TOKEN, Duration::from_secs(3600), at(AUTH_DATE + 3601));
        assert!(matches!(result, Err(InitDataError::Expired { age_secs: 3601 })));
    }

    #[test]
    fn test_missing_user() {
        let unsigned = format!("auth_date={}", AUTH_DATE);
        let init_data = format!("{}&hash={}", unsigned, sign(BOT_TOKEN, &unsigned));
        let result = InitData::parse(&init_data).verify_at(BOT_TOKEN, Duration::from_secs(60), at(AUTH_DATE));
        assert!(matches!(result, Err(InitDataError::MissingUser)));
    }

    #[test]
    fn test_invalid_auth_date() {
        let data = InitData::parse("auth_date=yesterday");
        assert!(matches!(data.auth_date(), Err(InitDataError::InvalidAuthDate(_))));
        assert!(matches!(InitData::default().auth_date(), Err(InitDataError::MissingAuthDate)));
    }
}
