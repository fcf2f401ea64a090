//! Target URL resolution.
//!
//! The part of the inbound path below the mount prefix is joined onto the
//! caller's `X-Proxy-Target` base with WHATWG relative resolution, then the
//! inbound query pairs are appended in order.

use thiserror::Error;
use url::{form_urlencoded, Url};

/// Failure to produce an absolute target URL.
#[derive(Debug, Error)]
pub enum TargetError {
    #[error("Missing X-Proxy-Target header")]
    Missing,

    #[error("Invalid proxy target URL")]
    Invalid(#[source] url::ParseError),
}

/// Split the inbound path into the segments below `mount_path`.
///
/// Empty segments are dropped so the joined suffix stays a path-relative
/// reference.
pub fn path_suffix<'a>(path: &'a str, mount_path: &str) -> Vec<&'a str> {
    let mount = mount_path.trim_end_matches('/');
    let rest = path.strip_prefix(mount).unwrap_or(path);
    rest.split('/').filter(|s| !s.is_empty()).collect()
}

/// Resolve the target URL for one request.
pub fn resolve_target(
    base: Option<&str>,
    suffix: &[&str],
    query: Option<&str>,
) -> Result<Url, TargetError> {
    let base = base.filter(|b| !b.is_empty()).ok_or(TargetError::Missing)?;
    let base = Url::parse(base).map_err(TargetError::Invalid)?;
    let mut target = base.join(&suffix.join("/")).map_err(TargetError::Invalid)?;

    if let Some(query) = query.filter(|q| !q.is_empty()) {
        let mut pairs = target.query_pairs_mut();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            pairs.append_pair(&key, &value);
        }
    }

    Ok(target)
}
