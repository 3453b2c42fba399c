//! Public Google Cloud Storage bucket as a [`BlobSource`].
//!
//! Listing goes through the JSON API (`/storage/v1/b/{bucket}/o`), following
//! `nextPageToken` until the listing is exhausted; objects are downloaded
//! from the public media endpoint. No credentials are sent.

use reqwest::Url;
use serde::Deserialize;
use stability_core::Result;
use stability_data::partitioner::BlobSource;
use tracing::debug;

use crate::error::FetchError;

pub const GCS_API_BASE: &str = "https://storage.googleapis.com/storage/v1";
pub const GCS_MEDIA_BASE: &str = "https://storage.googleapis.com";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectList {
    #[serde(default)]
    items: Vec<ObjectItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectItem {
    name: String,
}

pub struct GcsBucket {
    client: reqwest::blocking::Client,
    bucket: String,
    prefix: Option<String>,
    api_base: String,
    media_base: String,
}

impl GcsBucket {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            bucket: bucket.into(),
            prefix: None,
            api_base: GCS_API_BASE.to_string(),
            media_base: GCS_MEDIA_BASE.to_string(),
        }
    }

    /// Only list objects whose name starts with `prefix`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Point at another storage host, e.g. a local emulator.
    pub fn with_endpoints(
        mut self,
        api_base: impl Into<String>,
        media_base: impl Into<String>,
    ) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self.media_base = media_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn list_url(&self) -> String {
        format!("{}/b/{}/o", self.api_base, self.bucket)
    }

    /// Media URL of `name`. Each `/`-separated part of the name is
    /// percent-encoded, so `#`, `?` and spaces survive.
    pub fn object_url(&self, name: &str) -> std::result::Result<Url, FetchError> {
        let mut url = Url::parse(&self.media_base)
            .map_err(|e| FetchError::Parse(format!("media base {}: {e}", self.media_base)))?;
        url.path_segments_mut()
            .map_err(|()| {
                FetchError::Parse(format!("media base {} cannot hold a path", self.media_base))
            })?
            .pop_if_empty()
            .push(&self.bucket)
            .extend(name.split('/'));
        Ok(url)
    }

    fn list_page(&self, page_token: Option<&str>) -> std::result::Result<ObjectList, FetchError> {
        let mut request = self
            .client
            .get(self.list_url())
            .query(&[("fields", "items(name),nextPageToken")]);
        if let Some(prefix) = &self.prefix {
            request = request.query(&[("prefix", prefix.as_str())]);
        }
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let resp = request.send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(FetchError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(serde_json::from_str(&resp.text()?)?)
    }

    fn fetch_object(&self, name: &str) -> std::result::Result<String, FetchError> {
        let resp = self.client.get(self.object_url(name)?).send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(FetchError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(resp.text()?)
    }
}

impl BlobSource for GcsBucket {
    fn list_blobs(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let page = self.list_page(token.as_deref())?;
            names.extend(page.items.into_iter().map(|item| item.name));
            match page.next_page_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }
        debug!(bucket = %self.bucket, blobs = names.len(), "listed bucket");
        Ok(names)
    }

    fn download_text(&self, name: &str) -> Result<String> {
        Ok(self.fetch_object(name)?)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let bucket = GcsBucket::new("gdelt-events");
        assert_eq!(
            bucket.list_url(),
            "https://storage.googleapis.com/storage/v1/b/gdelt-events/o"
        );
        assert_eq!(
            bucket.object_url("events_2019.json").unwrap().as_str(),
            "https://storage.googleapis.com/gdelt-events/events_2019.json"
        );
    }

    #[test]
    fn test_custom_endpoints() {
        let bucket = GcsBucket::new("b")
            .with_prefix("raw/")
            .with_endpoints("http://localhost:4443/storage/v1/", "http://localhost:4443/");
        assert_eq!(bucket.list_url(), "http://localhost:4443/storage/v1/b/b/o");
        assert_eq!(
            bucket.object_url("raw/x_2020.json").unwrap().as_str(),
            "http://localhost:4443/b/raw/x_2020.json"
        );
        assert_eq!(bucket.prefix.as_deref(), Some("raw/"));
    }

    #[test]
    fn test_object_url_escapes_reserved_characters() {
        let bucket = GcsBucket::new("gdelt-events");
        assert_eq!(
            bucket.object_url("daily/events 2019#v2?.json").unwrap().as_str(),
            "https://storage.googleapis.com/gdelt-events/daily/events%202019%23v2%3F.json"
        );
    }

    #[test]
    fn test_object_url_rejects_bad_media_base() {
        let bucket = GcsBucket::new("b").with_endpoints(GCS_API_BASE, "not a url");
        assert!(matches!(bucket.object_url("x.json"), Err(FetchError::Parse(_))));
    }

    #[test]
    fn test_object_list_page_parsing() {
        let page: ObjectList = serde_json::from_str(
            r#"{"items": [{"name": "events_2018.json"}, {"name": "events_2019.json"}],
                "nextPageToken": "abc"}"#,
        )
        .unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.next_page_token.as_deref(), Some("abc"));

        let last: ObjectList = serde_json::from_str("{}").unwrap();
        assert!(last.items.is_empty());
        assert!(last.next_page_token.is_none());
    }
}
