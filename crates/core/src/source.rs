//! Source URL analysis for ingest validation.

use serde::Serialize;
use url::Url;

/// Supported content platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Instagram,
    Unknown,
}

/// Kind of content a URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Reel,
    Post,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlAnalysis {
    pub platform: Platform,
    pub kind: ContentKind,
    pub is_valid: bool,
}

impl UrlAnalysis {
    fn invalid() -> Self {
        Self {
            platform: Platform::Unknown,
            kind: ContentKind::Unknown,
            is_valid: false,
        }
    }
}

const INSTAGRAM_HOSTS: &[&str] = &["instagram.com", "www.instagram.com", "m.instagram.com"];

/// Classifies a URL by platform and content kind.
pub fn analyze_url(raw: &str) -> UrlAnalysis {
    let Ok(url) = Url::parse(raw.trim()) else {
        return UrlAnalysis::invalid();
    };

    if !matches!(url.scheme(), "http" | "https") {
        return UrlAnalysis::invalid();
    }

    let is_instagram = url
        .host_str()
        .map(|host| INSTAGRAM_HOSTS.contains(&host.to_ascii_lowercase().as_str()))
        .unwrap_or(false);
    if !is_instagram {
        return UrlAnalysis::invalid();
    }

    let path = url.path().to_ascii_lowercase();
    let kind = if path.contains("/reel/") || path.contains("/reels/") {
        ContentKind::Reel
    } else if path.contains("/p/") {
        ContentKind::Post
    } else {
        ContentKind::Unknown
    };

    UrlAnalysis {
        platform: Platform::Instagram,
        kind,
        is_valid: true,
    }
}

/// Returns true if the URL points at a platform the pipeline can resolve.
pub fn is_supported_source(raw: &str) -> bool {
    analyze_url(raw).platform == Platform::Instagram
}
