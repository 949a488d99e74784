//! National Park Service site scraper
//!
//! Builds the state index from the nps.gov home page, lists the sites on a
//! state page, and extracts contact details from each site page. Pages are
//! fetched through the response cache; parsing is done by the `parse_*`
//! functions so it can be exercised without the network.

use scraper::{ElementRef, Html, Selector};

use super::{non_empty, DataError, NationalSite, StateIndex};
use crate::cache::CacheStore;
use crate::fetch::Fetcher;

/// Base URL of the NPS website; listing hrefs are relative to it
pub const NPS_BASE_URL: &str = "https://www.nps.gov";

/// Parses a static CSS selector
fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("invalid selector")
}

/// Trimmed text content of an element
fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Trimmed text of the first descendant of `parent` matching `css`
fn first_text(parent: ElementRef<'_>, css: &'static str) -> Option<String> {
    non_empty(parent.select(&selector(css)).next().map(text_of))
}

/// Fetches the NPS home page and maps each state name to its page URL
///
/// Keys are lower-cased state names, e.g.
/// `"michigan" -> "https://www.nps.gov/state/mi/index.htm"`.
pub async fn build_state_index<F: Fetcher>(
    store: &mut CacheStore<F>,
) -> Result<StateIndex, DataError> {
    let html = store.fetch_url(NPS_BASE_URL).await?;
    parse_state_index(&html)
}

/// Fetches a state page and scrapes every site listed on it, in page order
pub async fn get_sites_for_state<F: Fetcher>(
    store: &mut CacheStore<F>,
    state_url: &str,
) -> Result<Vec<NationalSite>, DataError> {
    let html = store.fetch_url(state_url).await?;
    let links = parse_site_links(&html)?;
    tracing::debug!(state_url, sites = links.len(), "parsed state page");

    let mut sites = Vec::with_capacity(links.len());
    for link in links {
        sites.push(get_site_instance(store, &link).await?);
    }
    Ok(sites)
}

/// Fetches a single site page and extracts its details
pub async fn get_site_instance<F: Fetcher>(
    store: &mut CacheStore<F>,
    site_url: &str,
) -> Result<NationalSite, DataError> {
    let html = store.fetch_url(site_url).await?;
    parse_site(&html)
}

/// Extracts the state dropdown from the NPS home page
pub fn parse_state_index(html: &str) -> Result<StateIndex, DataError> {
    let document = Html::parse_document(html);
    let menu = document
        .select(&selector("ul.dropdown-menu.SearchBar-keywordSearch"))
        .next()
        .ok_or(DataError::MissingElement("ul.dropdown-menu.SearchBar-keywordSearch"))?;

    let index = menu
        .select(&selector("a[href]"))
        .filter_map(|link| {
            let href = link.value().attr("href")?;
            let name = text_of(link).to_lowercase();
            (!name.is_empty()).then(|| (name, format!("{NPS_BASE_URL}{href}")))
        })
        .collect();

    Ok(index)
}

/// Extracts the absolute site page URLs from a state page
pub fn parse_site_links(html: &str) -> Result<Vec<String>, DataError> {
    let document = Html::parse_document(html);
    let list = document
        .select(&selector("ul#list_parks"))
        .next()
        .ok_or(DataError::MissingElement("ul#list_parks"))?;

    let link_selector = selector("div.list_left a[href]");
    let links = list
        .select(&selector("li.clearfix"))
        .filter_map(|item| item.select(&link_selector).next())
        .filter_map(|link| link.value().attr("href"))
        .map(|href| format!("{NPS_BASE_URL}{href}"))
        .collect();

    Ok(links)
}

/// Extracts name, designation and contact details from a site page
///
/// Only the name is required. The address and zip code come from the
/// `p.adr` block and are both absent when that block is missing.
pub fn parse_site(html: &str) -> Result<NationalSite, DataError> {
    let document = Html::parse_document(html);

    let title = document
        .select(&selector("div.Hero-titleContainer"))
        .next()
        .ok_or(DataError::MissingElement("div.Hero-titleContainer"))?;
    let name = first_text(title, "a").ok_or(DataError::MissingElement("div.Hero-titleContainer a"))?;
    let category = first_text(title, "span.Hero-designation");

    let vcard = document.select(&selector("div.vcard")).next();
    let adr = vcard.and_then(|card| card.select(&selector("p.adr")).next());

    let (address, zip_code) = match adr {
        Some(adr) => {
            let locality = first_text(adr, r#"span[itemprop="addressLocality"]"#);
            let region = first_text(adr, r#"span[itemprop="addressRegion"]"#);
            let address = match (locality, region) {
                (Some(city), Some(state)) => Some(format!("{city}, {state}")),
                (city, state) => city.or(state),
            };
            (address, first_text(adr, "span.postal-code"))
        }
        None => (None, None),
    };

    let phone = vcard.and_then(|card| first_text(card, "span.tel"));

    Ok(NationalSite {
        name,
        category,
        address,
        zip_code,
        phone,
    })
}
