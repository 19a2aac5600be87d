//! Background images travel as `data:<mime>;base64,<payload>` strings, both in
//! requests and in stored rows.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use mime::Mime;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub struct DataUrl {
    pub mime: Mime,
    pub payload: Bytes,
}

impl DataUrl {
    pub fn new(mime: Mime, payload: impl Into<Bytes>) -> Self {
        Self { mime, payload: payload.into() }
    }
}

impl FromStr for DataUrl {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |why: &str| AppError::ValidationError(format!("invalid data url: {why}"));

        let rest = s.strip_prefix("data:").ok_or_else(|| invalid("missing data: scheme"))?;
        let (header, encoded) = rest.split_once(',').ok_or_else(|| invalid("missing payload"))?;
        let media_type = header.strip_suffix(";base64").ok_or_else(|| invalid("payload must be base64"))?;
        let mime: Mime = media_type.parse().map_err(|_| invalid("bad media type"))?;
        let payload = STANDARD.decode(encoded.trim()).map_err(|e| invalid(&e.to_string()))?;
        if payload.is_empty() {
            return Err(invalid("empty payload"));
        }
        Ok(Self::new(mime, payload))
    }
}

impl fmt::Display for DataUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime.essence_str(), STANDARD.encode(&self.payload))
    }
}
