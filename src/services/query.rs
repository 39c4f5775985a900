//! URL and query-string helpers.
//!
//! Application URLs are paths like `/create?rtk=abc`. They are parsed against a
//! fixed application root so the `url` crate can do the heavy lifting, and
//! rendered back as paths when they stay on that root.

use url::form_urlencoded;
use url::Url;

use crate::types::errors::UrlError;
use crate::types::navigation::QueryParams;

const APP_ROOT: &str = "http://app.local/";

fn malformed(url: &str, reason: impl ToString) -> UrlError {
    UrlError::Malformed {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}

fn root() -> Result<Url, UrlError> {
    Url::parse(APP_ROOT).map_err(|e| malformed(APP_ROOT, e))
}

/// A parsed application URL.
#[derive(Debug, Clone, PartialEq)]
pub struct AppUrl {
    inner: Url,
}

impl AppUrl {
    /// Parses an absolute path (or a full URL) against the application root.
    pub fn parse(url: &str) -> Result<Self, UrlError> {
        let inner = root()?.join(url).map_err(|e| malformed(url, e))?;
        Ok(Self { inner })
    }

    /// Percent-encoded path, always starting with `/`.
    pub fn path(&self) -> &str {
        self.inner.path()
    }

    /// All query parameters. On duplicate keys the first occurrence wins.
    pub fn query_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        for (key, value) in self.inner.query_pairs() {
            params
                .entry(key.into_owned())
                .or_insert_with(|| value.into_owned());
        }
        params
    }

    pub fn query_param(&self, key: &str) -> Option<String> {
        self.inner
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    pub fn set_query_params(&mut self, params: &QueryParams) {
        if params.is_empty() {
            self.inner.set_query(None);
        } else {
            self.inner.set_query(Some(&encode_query(params)));
        }
    }

    /// Replaces the path, keeping the query and fragment.
    pub fn set_path(&mut self, path: &str) {
        self.inner.set_path(path);
    }

    /// `path?query#fragment` for URLs on the application root, the full URL otherwise.
    pub fn to_href(&self) -> String {
        let on_root = root()
            .map(|r| r.origin() == self.inner.origin())
            .unwrap_or(false);
        if !on_root {
            return self.inner.to_string();
        }
        let mut href = self.inner.path().to_string();
        if let Some(query) = self.inner.query().filter(|q| !q.is_empty()) {
            href.push('?');
            href.push_str(query);
        }
        if let Some(fragment) = self.inner.fragment() {
            href.push('#');
            href.push_str(fragment);
        }
        href
    }
}

/// Form-encodes query parameters in key order.
pub fn encode_query(params: &QueryParams) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter())
        .finish()
}

/// Reads one query parameter from a URL. Empty values count as absent.
pub fn query_param(url: &str, key: &str) -> Result<Option<String>, UrlError> {
    Ok(AppUrl::parse(url)?
        .query_param(key)
        .filter(|value| !value.is_empty()))
}

/// Overlays `params` onto the URL's own query parameters.
pub fn merge_query(url: &str, params: &QueryParams) -> Result<String, UrlError> {
    let mut parsed = AppUrl::parse(url)?;
    let mut query = parsed.query_params();
    query.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
    parsed.set_query_params(&query);
    Ok(parsed.to_href())
}

/// Percent-encodes one path segment.
fn encode_segment(segment: &str) -> Result<String, UrlError> {
    let mut url = root()?;
    url.path_segments_mut()
        .map_err(|_| malformed(segment, "application root cannot hold segments"))?
        .clear()
        .push(segment);
    Ok(url.path().trim_start_matches('/').to_string())
}

/// Resolves router commands to a path.
///
/// A first command starting with `/` makes the result absolute; otherwise the
/// commands are appended to `relative_to`. Commands may hold several segments
/// (`"items/7"`); `.` and `..` are resolved.
pub fn resolve_commands(commands: &[String], relative_to: &str) -> Result<String, UrlError> {
    let absolute = commands.first().is_some_and(|c| c.starts_with('/'));

    let mut segments: Vec<String> = Vec::new();
    if !absolute {
        let base = AppUrl::parse(relative_to)?;
        segments.extend(
            base.path()
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        );
    }

    for command in commands {
        for part in command.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                segment => segments.push(encode_segment(segment)?),
            }
        }
    }

    let path = format!("/{}", segments.join("/"));
    Ok(AppUrl::parse(&path)?.path().to_string())
}
