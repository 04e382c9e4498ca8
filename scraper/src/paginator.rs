//! Listing pages: search parameters, page count discovery and link collection.

use std::collections::HashSet;
use std::sync::LazyLock;

use reqwest::Url;
use scraper::{Html, Selector};
use tracing::{info, warn};

use crate::config::SearchConfig;
use crate::error::{ExtractError, ScrapeError};
use crate::fetcher::PageFetcher;

pub const ITEMS_ON_PAGE: usize = 20;

static PAGER_SPANS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.pager > span").expect("valid selector"));
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").expect("valid selector"));
static ITEM_BODY: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.vacancy-serp-item-body__main-info").expect("valid selector")
});
static SUITABLE_ITEM_LINK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"span[data-page-analytics-event="vacancy_search_suitable_item"] a"#)
        .expect("valid selector")
});

/// Query parameters of a search results page. `page` is omitted for the first request.
pub fn search_params(config: &SearchConfig, page: Option<usize>) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("L_save_area", "true".to_string()),
        ("text", config.search_text.clone()),
        ("excluded_text", String::new()),
    ];
    params.extend(config.areas.iter().map(|area| ("area", area.clone())));
    params.extend([
        ("salary", String::new()),
        ("experience", "doesNotMatter".to_string()),
        ("order_by", "relevance".to_string()),
        ("search_period", "0".to_string()),
        ("currency_code", config.currency.clone()),
        ("items_on_page", ITEMS_ON_PAGE.to_string()),
    ]);
    if let Some(page) = page {
        params.push(("page", page.to_string()));
    }
    params
}

/// Total number of result pages, read from the last entry of the pager.
///
/// `Ok(None)` when the page has no pager, i.e. all results fit on one page.
pub fn parse_page_count(document: &Html) -> Result<Option<usize>, ExtractError> {
    let Some(last) = document.select(&PAGER_SPANS).last() else {
        return Ok(None);
    };
    let anchor = last
        .select(&ANCHOR)
        .next()
        .ok_or(ExtractError::MissingElement("pager link"))?;
    let text = anchor.text().collect::<String>();
    let text = text.trim();

    text.parse::<usize>()
        .map(Some)
        .map_err(|_| ExtractError::InvalidPageCount(text.to_string()))
}

/// Pages to visit: the configured limit when it is set and fits, otherwise every page.
pub fn effective_page_count(total: usize, limit: usize) -> usize {
    if limit != 0 && limit <= total {
        limit
    } else {
        total
    }
}

/// Detail page links of one listing page, in document order, query strings stripped.
pub fn parse_vacancy_links(document: &Html, base: Option<&Url>) -> Vec<String> {
    document
        .select(&ITEM_BODY)
        .filter_map(|item| {
            let href = item.select(&SUITABLE_ITEM_LINK).next()?.value().attr("href")?;
            Some(normalize_link(href, base))
        })
        .collect()
}

fn normalize_link(href: &str, base: Option<&Url>) -> String {
    let path = href.split('?').next().unwrap_or(href);
    if path.starts_with("http") {
        return path.to_string();
    }
    base.and_then(|base| base.join(path).ok())
        .map(|url| url.to_string())
        .unwrap_or_else(|| path.to_string())
}

/// Walks the search results and returns every vacancy link found, deduplicated,
/// in page order then document order.
pub fn collect_links(
    fetcher: &impl PageFetcher,
    config: &SearchConfig,
) -> Result<Vec<String>, ScrapeError> {
    let base = Url::parse(&config.search_url).ok();

    let first_params = search_params(config, None);
    let Some(first_page) = fetcher.fetch(&config.search_url, Some(first_params.as_slice()))? else {
        warn!(url = %config.search_url, "First search page unavailable, no links collected");
        return Ok(Vec::new());
    };

    let total = match parse_page_count(&first_page) {
        Ok(Some(total)) => total,
        Ok(None) => 1,
        Err(e) => {
            warn!(error = %e, "Could not read page count, reading first page only");
            1
        }
    };
    let page_count = effective_page_count(total, config.page_limit);

    info!(total, page_count, "Collecting vacancy links");

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for index in 0..page_count {
        let params = search_params(config, Some(index));
        let Some(page) = fetcher.fetch(&config.search_url, Some(params.as_slice()))? else {
            warn!(page = index, "Listing page unavailable, skipping");
            continue;
        };

        let page_links = parse_vacancy_links(&page, base.as_ref());
        let before = links.len();
        links.extend(
            page_links
                .into_iter()
                .filter(|link| seen.insert(link.clone())),
        );

        info!(
            page = index + 1,
            of = page_count,
            found = links.len() - before,
            total = links.len(),
            "Listing page processed"
        );
    }

    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Params;
    use std::cell::RefCell;

    fn listing_page(pages: usize, ids: &[u32]) -> String {
        let pager = if pages > 1 {
            let mut spans = String::new();
            for n in 1..=pages {
                spans.push_str(&format!(
                    r#"<span class="pager-item"><a href="?page={}"><span>{}</span></a></span>"#,
                    n - 1,
                    n
                ));
            }
            format!(r#"<div class="pager">{spans}</div>"#)
        } else {
            String::new()
        };

        let items: String = ids
            .iter()
            .map(|id| {
                format!(
                    r#"<div class="vacancy-serp-item">
                         <div class="vacancy-serp-item-body__main-info">
                           <span data-page-analytics-event="vacancy_search_suitable_item">
                             <a href="https://spb.hh.ru/vacancy/{id}?from=vacancy_search_list&query=python">Vacancy {id}</a>
                           </span>
                         </div>
                       </div>"#
                )
            })
            .collect();

        format!("<html><body>{items}{pager}</body></html>")
    }

    /// Serves canned listing pages keyed by the `page` parameter and records every call.
    struct FakeFetcher {
        pages: Vec<Option<String>>,
        first: Option<String>,
        calls: RefCell<Vec<Option<String>>>,
    }

    impl FakeFetcher {
        fn new(first: Option<String>, pages: Vec<Option<String>>) -> Self {
            Self {
                pages,
                first,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl PageFetcher for FakeFetcher {
        fn fetch(&self, _url: &str, params: Option<&Params>) -> Result<Option<Html>, ScrapeError> {
            let page = params
                .and_then(|p| p.iter().find(|(k, _)| *k == "page"))
                .map(|(_, v)| v.clone());
            self.calls.borrow_mut().push(page.clone());

            let body = match page {
                None => self.first.clone(),
                Some(n) => self.pages.get(n.parse::<usize>().unwrap()).cloned().flatten(),
            };
            Ok(body.map(|b| Html::parse_document(&b)))
        }
    }

    #[test]
    fn test_search_params() {
        let config = SearchConfig::new("Python");
        let params = search_params(&config, None);

        assert!(params.contains(&("text", "Python".to_string())));
        assert!(params.contains(&("experience", "doesNotMatter".to_string())));
        assert!(params.contains(&("order_by", "relevance".to_string())));
        assert!(params.contains(&("search_period", "0".to_string())));
        assert!(params.contains(&("currency_code", "RUR".to_string())));
        assert!(params.contains(&("items_on_page", "20".to_string())));
        assert_eq!(params.iter().filter(|(k, _)| *k == "area").count(), 2);
        assert!(params.iter().all(|(k, _)| *k != "page"));

        let params = search_params(&config, Some(3));
        assert_eq!(params.last(), Some(&("page", "3".to_string())));
    }

    #[test]
    fn test_parse_page_count() {
        let doc = Html::parse_document(&listing_page(7, &[1]));
        assert_eq!(parse_page_count(&doc), Ok(Some(7)));
    }

    #[test]
    fn test_parse_page_count_without_pager() {
        let doc = Html::parse_document(&listing_page(1, &[1]));
        assert_eq!(parse_page_count(&doc), Ok(None));
    }

    #[test]
    fn test_parse_page_count_not_a_number() {
        let doc = Html::parse_document(
            r##"<div class="pager"><span><a href="#"><span>дальше</span></a></span></div>"##,
        );
        assert_eq!(
            parse_page_count(&doc),
            Err(ExtractError::InvalidPageCount("дальше".to_string()))
        );
    }

    #[test]
    fn test_effective_page_count_bounds() {
        assert_eq!(effective_page_count(40, 0), 40);
        assert_eq!(effective_page_count(40, 10), 10);
        assert_eq!(effective_page_count(40, 40), 40);
        assert_eq!(effective_page_count(5, 10), 5);

        for total in 0..30 {
            for limit in 0..30 {
                let count = effective_page_count(total, limit);
                assert!(count <= total);
                if limit != 0 {
                    assert!(count <= limit);
                }
            }
        }
    }

    #[test]
    fn test_parse_vacancy_links_strips_query() {
        let doc = Html::parse_document(&listing_page(1, &[11, 12, 13]));
        assert_eq!(
            parse_vacancy_links(&doc, None),
            vec![
                "https://spb.hh.ru/vacancy/11",
                "https://spb.hh.ru/vacancy/12",
                "https://spb.hh.ru/vacancy/13",
            ]
        );
    }

    #[test]
    fn test_parse_vacancy_links_relative_href() {
        let doc = Html::parse_document(
            r#"<div class="vacancy-serp-item-body__main-info">
                 <span data-page-analytics-event="vacancy_search_suitable_item">
                   <a href="/vacancy/77?query=rust">Rust</a>
                 </span>
               </div>
               <div class="vacancy-serp-item-body__main-info"><span>no link here</span></div>"#,
        );
        let base = Url::parse("https://spb.hh.ru/search/vacancy").unwrap();
        assert_eq!(
            parse_vacancy_links(&doc, Some(&base)),
            vec!["https://spb.hh.ru/vacancy/77"]
        );
    }

    #[test]
    fn test_collect_links_preserves_order() {
        let fetcher = FakeFetcher::new(
            Some(listing_page(3, &[1, 2])),
            vec![
                Some(listing_page(3, &[1, 2])),
                Some(listing_page(3, &[3, 4])),
                Some(listing_page(3, &[5])),
            ],
        );
        let config = SearchConfig::new("Python").with_page_limit(0);

        let links = collect_links(&fetcher, &config).unwrap();
        let ids: Vec<_> = links
            .iter()
            .map(|l| l.rsplit('/').next().unwrap())
            .collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);

        let calls = fetcher.calls.borrow();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0], None);
        assert_eq!(calls[3], Some("2".to_string()));
    }

    #[test]
    fn test_collect_links_respects_limit() {
        let fetcher = FakeFetcher::new(
            Some(listing_page(3, &[1])),
            vec![
                Some(listing_page(3, &[1])),
                Some(listing_page(3, &[2])),
                Some(listing_page(3, &[3])),
            ],
        );
        let config = SearchConfig::new("Python").with_page_limit(2);

        let links = collect_links(&fetcher, &config).unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(fetcher.calls.borrow().len(), 3);
    }

    #[test]
    fn test_collect_links_skips_missing_page() {
        let fetcher = FakeFetcher::new(
            Some(listing_page(3, &[1])),
            vec![
                Some(listing_page(3, &[1])),
                None,
                Some(listing_page(3, &[3])),
            ],
        );
        let config = SearchConfig::new("Python").with_page_limit(0);

        let links = collect_links(&fetcher, &config).unwrap();
        assert_eq!(
            links,
            vec!["https://spb.hh.ru/vacancy/1", "https://spb.hh.ru/vacancy/3"]
        );
    }

    #[test]
    fn test_collect_links_deduplicates() {
        let fetcher = FakeFetcher::new(
            Some(listing_page(2, &[1, 2])),
            vec![
                Some(listing_page(2, &[1, 2])),
                Some(listing_page(2, &[2, 3])),
            ],
        );
        let config = SearchConfig::new("Python").with_page_limit(0);

        let links = collect_links(&fetcher, &config).unwrap();
        assert_eq!(links.len(), 3);
    }

    #[test]
    fn test_collect_links_first_page_missing() {
        let fetcher = FakeFetcher::new(None, vec![]);
        let config = SearchConfig::new("Python");

        assert!(collect_links(&fetcher, &config).unwrap().is_empty());
        assert_eq!(fetcher.calls.borrow().len(), 1);
    }
}
