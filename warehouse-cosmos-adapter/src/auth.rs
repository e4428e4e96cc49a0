use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha2::Sha256;
use std::fmt::Display;
use warehouse::errors::{ErrorKind, WarehouseError, WarehouseResult};

type HmacSha256 = Hmac<Sha256>;

/// Characters left as-is when the token is percent-encoded, matching the way the
/// service decodes the `authorization` header.
const TOKEN_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const TOKEN_TYPE: &str = "master";
const TOKEN_VERSION: &str = "1.0";

/// Kind of resource a request addresses. Part of the signed payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceType {
    Database,
    Collection,
    Document,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Database => "dbs",
            ResourceType::Collection => "colls",
            ResourceType::Document => "docs",
        }
    }
}

impl Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Signs requests with the account master key.
#[derive(Clone)]
pub(crate) struct MasterKeyCredential {
    key: Vec<u8>,
}

impl MasterKeyCredential {
    pub(crate) fn new(key: &[u8]) -> Self {
        MasterKeyCredential { key: key.to_vec() }
    }

    /// Builds the value of the `authorization` header.
    ///
    /// The signed payload is the lower-cased verb, resource type and date plus the
    /// resource link as given, each followed by a newline, and a trailing empty line.
    pub(crate) fn authorization_token(
        &self,
        verb: &str,
        resource_type: ResourceType,
        resource_link: &str,
        date: &str,
    ) -> WarehouseResult<String> {
        let payload = format!(
            "{}\n{}\n{}\n{}\n\n",
            verb.to_lowercase(),
            resource_type.as_str(),
            resource_link,
            date.to_lowercase()
        );

        let mut mac = HmacSha256::new_from_slice(&self.key).map_err(|e| {
            log::error!("Failed to initialize request signer: {}", e);
            WarehouseError::new(
                &format!("Failed to initialize request signer: {}", e),
                ErrorKind::SecurityError,
            )
        })?;
        mac.update(payload.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());

        let token = format!(
            "type={}&ver={}&sig={}",
            TOKEN_TYPE, TOKEN_VERSION, signature
        );
        Ok(utf8_percent_encode(&token, TOKEN_ENCODE_SET).to_string())
    }
}

/// Formats `date` the way the `x-ms-date` header expects, e.g.
/// `Tue, 01 Oct 2024 08:30:00 GMT`.
pub(crate) fn rfc1123_date(date: DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
