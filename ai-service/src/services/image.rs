//! Image references: `data:` URL codec and remote image fetching.

use base64::Engine;
use reqwest::{header, Client};
use thiserror::Error;

/// Prefix of an embedded-data reference.
pub const DATA_URL_PREFIX: &str = "data:";

/// Media type assumed when neither the reference nor the host says otherwise.
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataUrlError {
    #[error("not a data URL")]
    MissingPrefix,

    #[error("data URL has no ',' separating header and payload")]
    MissingSeparator,

    #[error("data URL payload must be base64 encoded")]
    NotBase64,

    #[error("invalid base64 payload: {0}")]
    InvalidPayload(String),
}

#[derive(Debug, Error)]
pub enum ImageFetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("failed to fetch image: {0}")]
    Request(String),

    #[error("image host returned {0}")]
    Status(reqwest::StatusCode),
}

/// Image bytes with their media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Where an image reference points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageReference<'a> {
    Remote(&'a str),
    Embedded(&'a str),
}

impl<'a> ImageReference<'a> {
    /// Classify a reference; `None` for anything that is neither an
    /// `http(s)://` URL nor a `data:` reference.
    pub fn parse(reference: &'a str) -> Option<Self> {
        if reference.starts_with(DATA_URL_PREFIX) {
            Some(ImageReference::Embedded(reference))
        } else if reference.starts_with("http://") || reference.starts_with("https://") {
            Some(ImageReference::Remote(reference))
        } else {
            None
        }
    }
}

/// Encode bytes as `data:<mime>;base64,<payload>`.
pub fn encode_data_url(mime_type: &str, data: &[u8]) -> String {
    format!(
        "{}{};base64,{}",
        DATA_URL_PREFIX,
        mime_type,
        base64::engine::general_purpose::STANDARD.encode(data)
    )
}

/// Decode a `data:<mime>;base64,<payload>` reference.
pub fn decode_data_url(reference: &str) -> Result<ImageData, DataUrlError> {
    let rest = reference
        .strip_prefix(DATA_URL_PREFIX)
        .ok_or(DataUrlError::MissingPrefix)?;

    let (header, payload) = rest
        .split_once(',')
        .ok_or(DataUrlError::MissingSeparator)?;

    let mut params = header.split(';');
    let mime_type = params.next().unwrap_or("").trim();
    if !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
        return Err(DataUrlError::NotBase64);
    }

    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let data = base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| DataUrlError::InvalidPayload(e.to_string()))?;

    Ok(ImageData {
        mime_type: if mime_type.is_empty() {
            DEFAULT_IMAGE_MIME.to_string()
        } else {
            mime_type.to_string()
        },
        data,
    })
}

/// Downloads remote images. One attempt per call, transport-default timeouts.
#[derive(Clone)]
pub struct ImageFetcher {
    client: Client,
}

impl ImageFetcher {
    pub fn new() -> Result<Self, ImageFetchError> {
        let client = Client::builder()
            .user_agent(concat!("snaktox-ai-service/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ImageFetchError::Client(e.to_string()))?;

        Ok(Self { client })
    }

    pub async fn fetch(&self, url: &str) -> Result<ImageData, ImageFetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ImageFetchError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ImageFetchError::Status(response.status()));
        }

        let mime_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
            .filter(|v| v.starts_with("image/"))
            .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string());

        let data = response
            .bytes()
            .await
            .map_err(|e| ImageFetchError::Request(e.to_string()))?
            .to_vec();

        tracing::debug!(url = %url, mime_type = %mime_type, size = data.len(), "Fetched remote image");

        Ok(ImageData { mime_type, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn data_url_round_trip_preserves_bytes() {
        let original: Vec<u8> = (0..=255).collect();
        let encoded = encode_data_url("image/png", &original);
        assert!(encoded.starts_with("data:image/png;base64,"));

        let decoded = decode_data_url(&encoded).unwrap();
        assert_eq!(decoded.mime_type, "image/png");
        assert_eq!(decoded.data, original);
    }

    #[test]
    fn empty_payload_round_trips() {
        let decoded = decode_data_url(&encode_data_url("image/webp", &[])).unwrap();
        assert!(decoded.data.is_empty());
    }

    #[test]
    fn decode_rejects_malformed_references() {
        assert_eq!(
            decode_data_url("https://example.com/a.png"),
            Err(DataUrlError::MissingPrefix)
        );
        assert_eq!(
            decode_data_url("data:image/png;base64"),
            Err(DataUrlError::MissingSeparator)
        );
        assert_eq!(
            decode_data_url("data:image/png,rawbytes"),
            Err(DataUrlError::NotBase64)
        );
        assert!(matches!(
            decode_data_url("data:image/png;base64,!!!"),
            Err(DataUrlError::InvalidPayload(_))
        ));
    }

    #[test]
    fn decode_defaults_missing_mime_type() {
        let decoded = decode_data_url("data:;base64,AQID").unwrap();
        assert_eq!(decoded.mime_type, DEFAULT_IMAGE_MIME);
        assert_eq!(decoded.data, vec![1, 2, 3]);
    }

    #[test]
    fn reference_classification() {
        assert!(matches!(
            ImageReference::parse("https://x.test/a.jpg"),
            Some(ImageReference::Remote(_))
        ));
        assert!(matches!(
            ImageReference::parse("http://x.test/a.jpg"),
            Some(ImageReference::Remote(_))
        ));
        assert!(matches!(
            ImageReference::parse("data:image/png;base64,AA=="),
            Some(ImageReference::Embedded(_))
        ));
        assert!(ImageReference::parse("ftp://x.test/a.jpg").is_none());
        assert!(ImageReference::parse("/tmp/snake.jpg").is_none());
        assert!(ImageReference::parse("HTTPS://x.test/a.jpg").is_none());
    }

    #[tokio::test]
    async fn fetch_uses_content_type_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/snake.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(vec![9u8, 8, 7]),
            )
            .mount(&server)
            .await;

        let image = ImageFetcher::new()
            .unwrap()
            .fetch(&format!("{}/snake.png", server.uri()))
            .await
            .unwrap();

        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, vec![9, 8, 7]);
    }

    #[tokio::test]
    async fn fetch_defaults_to_jpeg_for_non_image_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/octet-stream")
                    .set_body_bytes(vec![1u8]),
            )
            .mount(&server)
            .await;

        let image = ImageFetcher::new()
            .unwrap()
            .fetch(&format!("{}/blob", server.uri()))
            .await
            .unwrap();

        assert_eq!(image.mime_type, DEFAULT_IMAGE_MIME);
    }

    #[tokio::test]
    async fn fetch_reports_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = ImageFetcher::new()
            .unwrap()
            .fetch(&format!("{}/missing.jpg", server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err, ImageFetchError::Status(s) if s.as_u16() == 404));
    }
}
