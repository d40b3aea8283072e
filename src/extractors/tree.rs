use serde_json::Value;

use super::patterns::is_accepted_media_url;

/// Keys under which the site stores a media URL (or an object holding a list of them)
pub const MEDIA_KEY_ALIASES: &[&str] = &["playAddr", "downloadAddr", "play_addr", "download_addr", "url"];

/// Fields that hold a list of candidate URLs inside an aliased object
pub const URL_LIST_FIELDS: &[&str] = &["url_list", "urlList"];

/// Depth-first, pre-order search for the first accepted media URL in an untrusted JSON tree.
///
/// Values of unexpected type are skipped, so any well-formed JSON document is a valid input.
pub fn find_media_url(value: &Value) -> Option<&str> {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if MEDIA_KEY_ALIASES.contains(&key.as_str()) {
                    if let Some(url) = aliased_url(child) {
                        return Some(url);
                    }
                }

                if let Some(url) = find_media_url(child) {
                    return Some(url);
                }
            }
            None
        }
        Value::Array(items) => items.iter().find_map(find_media_url),
        _ => None,
    }
}

/// An aliased value is either the URL itself or an object with a candidate list
fn aliased_url(value: &Value) -> Option<&str> {
    match value {
        Value::String(url) if is_accepted_media_url(url) => Some(url.as_str()),
        Value::Object(map) => URL_LIST_FIELDS
            .iter()
            .filter_map(|field| map.get(*field))
            .filter_map(Value::as_array)
            .flatten()
            .filter_map(Value::as_str)
            .find(|url| is_accepted_media_url(url)),
        _ => None,
    }
}
