use reqwest::header::{HeaderMap, HeaderValue};

pub const USER_ID_HEADER: &str = "x-user-id";

/// Headers carrying the current identity on outbound API calls. Ids that are
/// not valid header values are skipped rather than failing the request.
pub fn user_headers(user_id: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(id) = user_id.filter(|s| !s.is_empty()) {
        if let Ok(v) = HeaderValue::from_str(id) {
            headers.insert(USER_ID_HEADER, v);
        }
    }
    headers
}
