//! Vacancy detail page extraction and filtering.

use std::sync::LazyLock;

use common::{Vacancy, VacancyInfo};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, error, warn};

use crate::config::SearchConfig;
use crate::error::ExtractError;

/// Salary text used when the vacancy does not state one.
pub const SALARY_BY_AGREEMENT: &str = "по договоренности";

const FOREIGN_CURRENCIES: [&str; 2] = ["$", "€"];

static SALARY: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"div[data-qa="vacancy-salary"]"#).expect("valid selector")
});
static DESCRIPTION_CLASS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.vacancy-description").expect("valid selector"));
static DESCRIPTION_QA: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"div[data-qa="vacancy-description"]"#).expect("valid selector")
});
static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").expect("valid selector"));
static COMPANY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.vacancy-company-name").expect("valid selector"));
static LOCATION: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        r#"span[data-qa="vacancy-view-raw-address"], p[data-qa="vacancy-view-raw-address"],
           span[data-qa="vacancy-view-location"], p[data-qa="vacancy-view-location"]"#,
    )
    .expect("valid selector")
});

static SALARY_FROM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\P{L})от\s*(\d[\d\s]*\d|\d)").expect("valid regex"));
static SALARY_TO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\P{L})до\s*(\d[\d\s]*\d|\d)").expect("valid regex"));
static CURRENCY_SYMBOL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[₽$€]").expect("valid regex"));

fn select_first<'a>(document: &'a Html, selector: &Selector) -> Option<ElementRef<'a>> {
    document.select(selector).next()
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect()
}

fn amount(re: &Regex, text: &str) -> Option<String> {
    let captured = re.captures(text)?.get(1)?.as_str();
    Some(captured.chars().filter(|c| !c.is_whitespace()).collect())
}

/// Normalizes the salary block of a detail page.
///
/// `"100000-150000 ₽"` for a range, `"от 100000 ₽"` / `"до 150000 ₽"` for an open
/// bound, [`SALARY_BY_AGREEMENT`] when the page has no salary block.
pub fn extract_salary(document: &Html) -> Result<String, ExtractError> {
    let Some(block) = select_first(document, &SALARY) else {
        return Ok(SALARY_BY_AGREEMENT.to_string());
    };
    let text = text_of(block);

    let symbol = CURRENCY_SYMBOL
        .find(&text)
        .map(|m| m.as_str())
        .ok_or_else(|| ExtractError::MissingCurrency(text.trim().to_string()))?;

    match (amount(&SALARY_FROM, &text), amount(&SALARY_TO, &text)) {
        (Some(from), Some(to)) => Ok(format!("{from}-{to} {symbol}")),
        (Some(from), None) => Ok(format!("от {from} {symbol}")),
        (None, Some(to)) => Ok(format!("до {to} {symbol}")),
        (None, None) => Err(ExtractError::MissingAmount(text.trim().to_string())),
    }
}

/// True when no keywords are configured or any of them occurs in `description`,
/// ignoring case.
pub fn matches_keywords(description: &str, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return true;
    }
    let description = description.to_lowercase();
    keywords
        .iter()
        .any(|keyword| description.contains(&keyword.to_lowercase()))
}

/// True when the currency filter is off or the salary is paid in `$` or `€`.
pub fn passes_currency_filter(salary: &str, currency_only: bool) -> bool {
    !currency_only || FOREIGN_CURRENCIES.iter().any(|c| salary.contains(c))
}

fn description(document: &Html) -> Option<String> {
    let mut found = None;
    for selector in [&*DESCRIPTION_CLASS, &*DESCRIPTION_QA] {
        if let Some(element) = select_first(document, selector) {
            let text = text_of(element);
            if !text.trim().is_empty() {
                return Some(text);
            }
            found.get_or_insert(text);
        }
    }
    found
}

fn company(document: &Html) -> Option<String> {
    let text = text_of(select_first(document, &COMPANY)?);
    Some(text.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn city(document: &Html) -> Option<String> {
    let text = text_of(select_first(document, &LOCATION)?);
    let city = text.split(',').next().unwrap_or_default();
    Some(city.trim().to_string())
}

/// Reads title, company and city, then applies the keyword filter to the description.
///
/// `Ok(None)` means the page was read but no keyword matched.
pub fn extract_info(
    document: &Html,
    keywords: &[String],
) -> Result<Option<VacancyInfo>, ExtractError> {
    let description = description(document).ok_or(ExtractError::MissingElement("description"))?;
    let title = select_first(document, &TITLE)
        .map(|h1| text_of(h1).trim().to_string())
        .ok_or(ExtractError::MissingElement("title"))?;
    let company = company(document).ok_or(ExtractError::MissingElement("company name"))?;
    let city = city(document).ok_or(ExtractError::MissingElement("city"))?;

    if !matches_keywords(&description, keywords) {
        return Ok(None);
    }

    Ok(Some(VacancyInfo {
        title,
        company,
        city,
    }))
}

/// Builds the output record for one detail page, or `None` if the page is
/// filtered out or cannot be read. Failures are logged and never propagate.
pub fn extract_vacancy(link: &str, document: &Html, config: &SearchConfig) -> Option<Vacancy> {
    let salary = match extract_salary(document) {
        Ok(salary) => salary,
        Err(e) => {
            warn!(%link, error = %e, "Skipping vacancy with unreadable salary");
            return None;
        }
    };

    if !passes_currency_filter(&salary, config.currency_only) {
        debug!(%link, %salary, "Salary currency filtered out");
        return None;
    }

    match extract_info(document, &config.keywords) {
        Ok(Some(info)) => {
            debug!(%link, title = %info.title, "Vacancy matched");
            Some(Vacancy::new(link.to_string(), salary, info))
        }
        Ok(None) => {
            debug!(%link, "No keyword in description");
            None
        }
        Err(e) => {
            error!(%link, error = %e, "Failed to extract vacancy info");
            None
        }
    }
}
