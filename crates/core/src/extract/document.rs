use scraper::{ElementRef, Html, Selector};

use crate::domain::sections::{CompanySections, FieldMap, RawPeriod};
use crate::domain::snapshot::FinancialSnapshot;
use crate::extract::error::{isolate, SectionError};
use crate::extract::normalize::{normalize_key, normalize_str};
use crate::extract::sources;
use crate::ingest::CompanyPages;

const DEFAULT_MAX_PERIODS: usize = 8;
const TOP_RATIOS_ID: &str = "top-ratios";

/// Extract a snapshot from one parsed company page. Never fails; sections that
/// cannot be read come back empty.
pub fn extract(document: &Html, company_name: &str) -> FinancialSnapshot {
    Extractor::default().extract(document, company_name)
}

/// Parse fetched pages and extract. Shareholding is read from the investors
/// page when it carries the section, otherwise from the main page.
pub fn extract_pages(pages: &CompanyPages, company_name: &str) -> FinancialSnapshot {
    Extractor::default().extract_pages(pages, company_name)
}

#[derive(Debug, Clone)]
pub struct Extractor {
    max_periods: usize,
}

impl Default for Extractor {
    fn default() -> Self {
        Self {
            max_periods: DEFAULT_MAX_PERIODS,
        }
    }
}

#[derive(Debug, Default)]
struct OverviewSection {
    name: Option<String>,
    fields: FieldMap,
}

#[derive(Debug, Default)]
struct DocumentsSection {
    announcements: Vec<String>,
    credit_ratings: Vec<String>,
}

impl Extractor {
    pub fn with_max_periods(max_periods: usize) -> Self {
        Self { max_periods }
    }

    pub fn extract(&self, document: &Html, company_name: &str) -> FinancialSnapshot {
        sources::build_snapshot(self.extract_sections(document, None, company_name))
    }

    pub fn extract_pages(&self, pages: &CompanyPages, company_name: &str) -> FinancialSnapshot {
        let main = Html::parse_document(&pages.company_html);
        let investors = pages.investors_html.as_deref().map(Html::parse_document);

        let mut sections = self.extract_sections(&main, investors.as_ref(), company_name);
        sections.company_url = Some(pages.url.clone());
        sources::build_snapshot(sections)
    }

    pub fn extract_sections(
        &self,
        document: &Html,
        investors: Option<&Html>,
        company_name: &str,
    ) -> CompanySections {
        let mut out = CompanySections::new(company_name);

        let overview = isolate("overview", overview(document));
        out.display_name = overview.name;
        out.basic_data = overview.fields;

        out.quarterly_results = isolate("quarters", self.quarterly_results(document));
        out.financial_ratios = isolate("ratios", financial_ratios(document));

        out.shareholding_pattern = match investors.map(shareholding_pattern) {
            Some(Ok(fields)) if !fields.is_empty() => fields,
            Some(Err(err)) => {
                tracing::debug!(error = %err, "investors page unusable; trying main page");
                isolate("shareholding", shareholding_pattern(document))
            }
            _ => isolate("shareholding", shareholding_pattern(document)),
        };

        let documents = isolate("documents", documents(document));
        out.announcements = documents.announcements;
        out.credit_ratings = documents.credit_ratings;

        out
    }

    fn quarterly_results(&self, document: &Html) -> Result<Vec<RawPeriod>, SectionError> {
        const SECTION: &str = "quarters";
        let table = document
            .select(&selector(SECTION, "section#quarters table")?)
            .next()
            .ok_or(SectionError::Missing(SECTION))?;

        let headers: Vec<String> = table
            .select(&selector(SECTION, "thead th")?)
            .map(text_of)
            .collect();
        if headers.is_empty() {
            return Err(SectionError::malformed(SECTION, "table has no header row"));
        }

        let cell = selector(SECTION, "td")?;
        let mut out = Vec::new();
        for row in table.select(&selector(SECTION, "tbody tr")?) {
            let cells: Vec<String> = row.select(&cell).map(text_of).collect();
            if cells.len() < headers.len() {
                tracing::debug!(
                    expected = headers.len(),
                    got = cells.len(),
                    "skipping short quarterly row"
                );
                continue;
            }

            let mut period = RawPeriod {
                label: cells[0].clone(),
                values: FieldMap::new(),
            };
            for (header, value) in headers.iter().zip(cells.iter()).skip(1) {
                let key = normalize_key(header);
                if key.is_empty() {
                    continue;
                }
                period.values.insert(key, normalize_str(value));
            }
            out.push(period);

            if out.len() >= self.max_periods {
                break;
            }
        }

        Ok(out)
    }
}

fn overview(document: &Html) -> Result<OverviewSection, SectionError> {
    const SECTION: &str = "overview";
    let mut out = OverviewSection {
        name: document
            .select(&selector(SECTION, "h1")?)
            .map(text_of)
            .find(|s| !s.is_empty()),
        fields: FieldMap::new(),
    };

    // Header price: the first number outside the key-ratios list.
    let header_price = document
        .select(&selector(SECTION, "span.number")?)
        .find(|el| !inside_id(el, TOP_RATIOS_ID));
    if let Some(price) = header_price {
        out.fields
            .insert("current_price".to_string(), normalize_str(&text_of(price)));
    }

    let ratios = document
        .select(&selector(SECTION, "#top-ratios")?)
        .next();
    if let Some(ratios) = ratios {
        let name_sel = selector(SECTION, "span.name")?;
        let value_sel = selector(SECTION, "span.number")?;
        for item in ratios.select(&selector(SECTION, "li")?) {
            let (Some(name), Some(value)) =
                (item.select(&name_sel).next(), item.select(&value_sel).next())
            else {
                continue;
            };
            let key = normalize_key(&text_of(name));
            if !key.is_empty() {
                out.fields.insert(key, normalize_str(&text_of(value)));
            }
        }
    }

    if out.name.is_none() && out.fields.is_empty() {
        return Err(SectionError::Missing(SECTION));
    }
    Ok(out)
}

fn financial_ratios(document: &Html) -> Result<FieldMap, SectionError> {
    const SECTION: &str = "ratios";
    let section = document
        .select(&selector(SECTION, "section#ratios")?)
        .next()
        .ok_or(SectionError::Missing(SECTION))?;
    name_value_rows(SECTION, section, 0)
}

fn shareholding_pattern(document: &Html) -> Result<FieldMap, SectionError> {
    const SECTION: &str = "shareholding";
    let section = document
        .select(&selector(SECTION, "section#shareholding")?)
        .next()
        .ok_or(SectionError::Missing(SECTION))?;
    let table = section
        .select(&selector(SECTION, "table")?)
        .next()
        .ok_or_else(|| SectionError::malformed(SECTION, "no table"))?;
    // First row is the header.
    name_value_rows(SECTION, table, 1)
}

fn documents(document: &Html) -> Result<DocumentsSection, SectionError> {
    const SECTION: &str = "documents";
    let section = document
        .select(&selector(SECTION, "section#documents")?)
        .next()
        .ok_or(SectionError::Missing(SECTION))?;

    let list = |css: &str| -> Result<Vec<String>, SectionError> {
        Ok(section
            .select(&selector(SECTION, css)?)
            .map(text_of)
            .filter(|s| !s.is_empty())
            .collect())
    };

    Ok(DocumentsSection {
        announcements: list(".announcements li")?,
        credit_ratings: list(".credit-ratings li")?,
    })
}

/// Rows of `<td>name</td><td>value</td>`; rows with fewer than two cells are ignored.
fn name_value_rows(
    section: &'static str,
    root: ElementRef<'_>,
    skip: usize,
) -> Result<FieldMap, SectionError> {
    let cell = selector(section, "td")?;
    let mut out = FieldMap::new();
    for row in root.select(&selector(section, "tr")?).skip(skip) {
        let cells: Vec<String> = row.select(&cell).take(2).map(text_of).collect();
        if cells.len() < 2 {
            continue;
        }
        let key = normalize_key(&cells[0]);
        if !key.is_empty() {
            out.insert(key, normalize_str(&cells[1]));
        }
    }
    Ok(out)
}

fn selector(section: &'static str, css: &str) -> Result<Selector, SectionError> {
    Selector::parse(css)
        .map_err(|e| SectionError::malformed(section, format!("invalid selector `{css}`: {e:?}")))
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn inside_id(el: &ElementRef<'_>, id: &str) -> bool {
    el.ancestors()
        .filter_map(|node| node.value().as_element())
        .any(|e| e.id() == Some(id))
}
