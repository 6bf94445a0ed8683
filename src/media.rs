//! Media reference resolution: asset `uri` first, direct `url` as fallback.
use crate::error::PlaybackError;
use crate::model::MediaData;

pub fn resolve(media: &MediaData, id: &str) -> Result<String, PlaybackError> {
    let asset = media
        .get(id)
        .ok_or_else(|| PlaybackError::ResourceUnresolved(id.to_string()))?;
    let non_empty = |u: &&str| !u.is_empty();
    asset
        .assets
        .as_ref()
        .and_then(|a| a.uri.as_deref())
        .filter(non_empty)
        .or(asset.url.as_deref().filter(non_empty))
        .map(str::to_string)
        .ok_or_else(|| PlaybackError::ResourceUnresolved(id.to_string()))
}

/// URL of the first reference in `field`. Only the first reference is tried.
pub fn first_media_url(media: &MediaData, field: &[String]) -> Option<String> {
    field.first().and_then(|id| resolve(media, id).ok())
}

/// URLs of every resolvable reference in `field`, unresolved ones skipped.
pub fn all_media_urls(media: &MediaData, field: &[String]) -> Vec<String> {
    field.iter().filter_map(|id| resolve(media, id).ok()).collect()
}
