use http::header::{HeaderValue, CONTENT_TYPE};
use reqwest::Method;

use crate::net::Response;

const JSON_CONTENT_TYPE: &str = "application/json";

// Sends a single JSON request and buffers the response. Non-2xx statuses are returned as a
// normal response; only connection level failures end up in the error.
pub async fn fetch(
    client: &reqwest::Client,
    method: Method,
    url: url::Url,
    body: Option<Vec<u8>>,
) -> Result<Response, reqwest::Error> {
    log::debug!("{} {}", method, url);

    let mut req = client
        .request(method, url)
        .header(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    if let Some(body) = body {
        req = req.body(body);
    }
    let res = req.send().await?;

    // Fetch results
    let final_url = res.url().clone();
    let status = res.status();
    let status_text = status.canonical_reason().unwrap_or("Unknown").to_string();

    // The body of a failed response is informational only, so an unreadable one becomes empty
    let body = match res.bytes().await {
        Ok(bytes) => bytes.to_vec(),
        Err(e) if !status.is_success() => {
            log::debug!("cannot read body of {} response from {}: {}", status, final_url, e);
            Vec::new()
        }
        Err(e) => return Err(e),
    };

    Ok(Response {
        url: final_url,
        status: status.as_u16(),
        status_text,
        body,
    })
}
