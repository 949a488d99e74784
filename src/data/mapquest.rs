//! MapQuest radius search client
//!
//! Looks up points of interest within ten miles of a site's postal code. The
//! API key travels as a secret query parameter, so it is sent to MapQuest but
//! never becomes part of the cache key or the cache file.

use serde::Deserialize;
use url::Url;

use super::{non_empty, DataError, NationalSite, NearbyPlace};
use crate::cache::CacheStore;
use crate::fetch::{FetchError, Fetcher, Request};

/// Base URL for the MapQuest radius search API
const MAPQUEST_RADIUS_URL: &str = "http://www.mapquestapi.com/search/v2/radius";

/// Search radius in miles
const SEARCH_RADIUS: u32 = 10;

/// Maximum number of places requested
const MAX_MATCHES: u32 = 10;

/// Radius search response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RadiusResponse {
    #[serde(default)]
    results_count: usize,
    #[serde(default)]
    search_results: Vec<SearchResult>,
}

/// A single search hit
#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    name: String,
    #[serde(default)]
    fields: ResultFields,
}

/// Business listing fields of a search hit
#[derive(Debug, Default, Deserialize)]
struct ResultFields {
    #[serde(default)]
    group_sic_code_name: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    city: Option<String>,
}

/// Builds the radius search request for a postal code
///
/// # Arguments
/// * `zip_code` - Search origin
/// * `api_key` - MapQuest key, sent on the wire only
pub fn radius_request(zip_code: &str, api_key: &str) -> Result<Request, DataError> {
    let mut url = Url::parse(MAPQUEST_RADIUS_URL)
        .map_err(|source| FetchError::InvalidUrl {
            url: MAPQUEST_RADIUS_URL.to_string(),
            source,
        })?;
    url.query_pairs_mut()
        .append_pair("origin", zip_code)
        .append_pair("radius", &SEARCH_RADIUS.to_string())
        .append_pair("maxMatches", &MAX_MATCHES.to_string())
        .append_pair("ambiguities", "ignore")
        .append_pair("outFormat", "json");

    Ok(Request::new(url.as_str()).with_secret_query("key", api_key))
}

/// Fetches places near `site`
///
/// # Returns
/// * `Ok(None)` - The site has no zip code to search from
/// * `Ok(Some(places))` - Places found, possibly none
/// * `Err(DataError)` - No API key, or the fetch or parse failed
pub async fn get_nearby_places<F: Fetcher>(
    store: &mut CacheStore<F>,
    site: &NationalSite,
    api_key: Option<&str>,
) -> Result<Option<Vec<NearbyPlace>>, DataError> {
    let Some(zip_code) = site.zip_code.as_deref() else {
        return Ok(None);
    };
    let api_key = api_key.ok_or(DataError::MissingApiKey)?;

    let request = radius_request(zip_code, api_key)?;
    let body = store.fetch_or_get(&request).await?;
    parse_nearby_places(&body).map(Some)
}

/// Parses a radius search response body
///
/// At most `resultsCount` places are returned. Blank fields are `None`.
pub fn parse_nearby_places(body: &str) -> Result<Vec<NearbyPlace>, DataError> {
    let response: RadiusResponse = serde_json::from_str(body)?;

    let places = response
        .search_results
        .into_iter()
        .take(response.results_count)
        .map(|result| NearbyPlace {
            name: result.name.trim().to_string(),
            category: non_empty(result.fields.group_sic_code_name),
            address: non_empty(result.fields.address),
            city: non_empty(result.fields.city),
        })
        .collect();

    Ok(places)
}
