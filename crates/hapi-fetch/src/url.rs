//! HAPI request URL construction.
//!
//! Query strings are form-encoded, except that `:` and `,` are left as they
//! are: they appear in every timestamp and parameter list, and URLs such as
//! `data?dataset=X&start=2020-01-01T00:00:00Z&parameters=a,b` stay readable
//! while remaining legal request URIs.

use hapi_types::{HapiEndpoint, HapiError};
use reqwest::Url;

/// Builds the URL of an endpoint below a service base URL.
///
/// # Errors
///
/// Returns [`HapiError::Format`] if the base URL cannot carry a path.
///
/// # Example
///
/// ```
/// use hapi_fetch::url::query_url;
/// use hapi_types::HapiEndpoint;
/// use reqwest::Url;
///
/// let base = Url::parse("https://example.org/hapi/").unwrap();
/// let url = query_url(
///     &base,
///     HapiEndpoint::Data,
///     &[("dataset", "ACE"), ("start", "2020-01-01T00:00Z"), ("parameters", "Bx,By")],
/// )
/// .unwrap();
/// assert_eq!(
///     url.as_str(),
///     "https://example.org/hapi/data?dataset=ACE&start=2020-01-01T00:00Z&parameters=Bx,By"
/// );
/// ```
pub fn query_url<K, V>(
    base: &Url,
    endpoint: HapiEndpoint,
    params: &[(K, V)],
) -> Result<Url, HapiError>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut url = base.clone();
    url.set_query(None);
    url.path_segments_mut()
        .map_err(|()| HapiError::Format(format!("cannot use {base} as a service URL")))?
        .pop_if_empty()
        .push(endpoint.as_str());
    set_query_params(&mut url, params);
    Ok(url)
}

/// Replaces the query of `url` with the given parameters, in order.
pub fn set_query_params<K, V>(url: &mut Url, params: &[(K, V)])
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    if params.is_empty() {
        url.set_query(None);
        return;
    }
    url.query_pairs_mut()
        .clear()
        .extend_pairs(params.iter().map(|(k, v)| (k.as_ref(), v.as_ref())));
    let readable = url
        .query()
        .map(|q| q.replace("%3A", ":").replace("%2C", ","));
    url.set_query(readable.as_deref());
}

/// Returns a copy of `template` carrying the given query parameters.
#[must_use]
pub fn with_query_params<K, V>(template: &Url, params: &[(K, V)]) -> Url
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut url = template.clone();
    set_query_params(&mut url, params);
    url
}

/// Returns the decoded query parameters of a URL, in order.
#[must_use]
pub fn query_params(url: &Url) -> Vec<(String, String)> {
    url.query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Returns the endpoint named by the last path segment of a URL.
#[must_use]
pub fn endpoint_of(url: &Url) -> Option<HapiEndpoint> {
    url.path_segments()?
        .rev()
        .find(|s| !s.is_empty())
        .and_then(HapiEndpoint::from_segment)
}

/// Returns the dataset named by a request URL under either naming convention.
#[must_use]
pub fn dataset_of(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == "dataset" || k == "id")
        .map(|(_, v)| v.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.org/hapi").unwrap()
    }

    #[test]
    fn test_query_url_keeps_colons_and_commas() {
        let url = query_url(
            &base(),
            HapiEndpoint::Data,
            &[
                ("dataset", "OMNI_HRO"),
                ("start", "2020-01-01T00:00:00Z"),
                ("stop", "2020-01-02T00:00:00Z"),
                ("parameters", "BX,BY"),
            ],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.org/hapi/data?dataset=OMNI_HRO&start=2020-01-01T00:00:00Z\
             &stop=2020-01-02T00:00:00Z&parameters=BX,BY"
        );
    }

    #[test]
    fn test_query_url_escapes_other_characters() {
        let url = query_url(&base(), HapiEndpoint::Info, &[("dataset", "a&b c")]).unwrap();
        assert_eq!(url.as_str(), "https://example.org/hapi/info?dataset=a%26b+c");
        let params = query_params(&url);
        assert_eq!(params, vec![("dataset".to_string(), "a&b c".to_string())]);
    }

    #[test]
    fn test_query_url_no_params() {
        let base = Url::parse("https://example.org/hapi/").unwrap();
        let url = query_url::<&str, &str>(&base, HapiEndpoint::Catalog, &[]).unwrap();
        assert_eq!(url.as_str(), "https://example.org/hapi/catalog");
    }

    #[test]
    fn test_with_query_params_round_trip() {
        let template = Url::parse("https://example.org/hapi/data?dataset=X&start=a&stop=b").unwrap();
        let mut params = query_params(&template);
        params[1].1 = "2021-06-01T12:00:00Z".to_string();
        let url = with_query_params(&template, &params);
        assert_eq!(
            url.as_str(),
            "https://example.org/hapi/data?dataset=X&start=2021-06-01T12:00:00Z&stop=b"
        );
    }

    #[test]
    fn test_endpoint_and_dataset() {
        let url = Url::parse("https://example.org/hapi/data?id=ACE&time.min=x").unwrap();
        assert_eq!(endpoint_of(&url), Some(HapiEndpoint::Data));
        assert_eq!(dataset_of(&url).as_deref(), Some("ACE"));
        let url = Url::parse("https://example.org/hapi/").unwrap();
        assert_eq!(endpoint_of(&url), None);
    }
}
