use std::convert::TryFrom;

use url::Url;

use crate::domain::errors::MalformedInput;

/// The address a feed is fetched from.
#[derive(Clone, Debug)]
pub struct FeedUrl(Url);

impl TryFrom<String> for FeedUrl {
    type Error = MalformedInput;

    fn try_from(address: String) -> Result<Self, Self::Error> {
        let url = Url::parse(&address).map_err(|e| MalformedInput::InvalidUrl {
            message: format!("invalid feed address: {}: {}", address, e),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(Self(url)),
            other => Err(MalformedInput::InvalidUrl {
                message: format!("unsupported feed address scheme: {}", other),
            }),
        }
    }
}

impl AsRef<str> for FeedUrl {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}
