//! Filtering and pagination of bike records.
//!
//! Records are the backend's JSON objects; only the fields used for
//! filtering are read (`bikeBrand`, `manufacturingYear`, `engineNumber`,
//! `chassisNumber`, `createdAt`).

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;

use super::date_range::DateRangeFilter;
use super::paging::{page_slice, total_pages, visible_pages};

/// Bikes per page in the dashboard list.
pub const BIKES_PER_PAGE: usize = 5;

/// Sibling pages shown on each side of the current page.
const PAGE_SIBLINGS: u32 = 2;

#[derive(Debug, Clone, Default)]
pub struct BikeFilter {
    /// Brand id; `None` or `"all"` matches every brand
    pub brand: Option<String>,
    pub year: Option<i64>,
    /// Case-insensitive search over engine and chassis numbers
    pub search: Option<String>,
    pub range: DateRangeFilter,
}

fn created_at(bike: &Value) -> Option<Option<NaiveDateTime>> {
    let raw = bike.get("createdAt")?.as_str()?;
    Some(
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|d| d.with_timezone(&Local).naive_local()),
    )
}

fn field_contains(bike: &Value, field: &str, needle: &str) -> bool {
    bike.get(field)
        .and_then(Value::as_str)
        .is_some_and(|v| v.to_lowercase().contains(needle))
}

fn year_of(bike: &Value) -> Option<i64> {
    let year = bike.get("manufacturingYear")?;
    year.as_i64()
        .or_else(|| year.as_str().and_then(|s| s.trim().parse().ok()))
}

impl BikeFilter {
    pub fn matches(&self, bike: &Value, today: NaiveDate) -> bool {
        let brand_match = match self.brand.as_deref() {
            Some(brand) if brand != "all" => {
                bike.get("bikeBrand").and_then(Value::as_str) == Some(brand)
            }
            _ => true,
        };

        let year_match = self.year.is_none_or(|y| year_of(bike) == Some(y));

        let search_match = match self.search.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => {
                let q = q.to_lowercase();
                field_contains(bike, "engineNumber", &q) || field_contains(bike, "chassisNumber", &q)
            }
            _ => true,
        };

        let date_match = match (self.range, created_at(bike)) {
            (DateRangeFilter::All, _) => true,
            // Records without a creation date are never filtered out
            (_, None) => true,
            (_, Some(None)) => false,
            (range, Some(Some(at))) => range.contains(today, at),
        };

        brand_match && year_match && search_match && date_match
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BikePage {
    pub items: Vec<Value>,
    /// Matching records across all pages
    pub total: usize,
    pub page: u32,
    pub total_pages: usize,
    pub pages: Vec<u32>,
}

/// Filter `bikes` and cut out one page.
pub fn bike_page(bikes: &[Value], filter: &BikeFilter, page: u32, today: NaiveDate) -> BikePage {
    let matching: Vec<&Value> = bikes.iter().filter(|b| filter.matches(b, today)).collect();
    let total_pages = total_pages(matching.len(), BIKES_PER_PAGE);

    BikePage {
        items: page_slice(&matching, page as usize, BIKES_PER_PAGE)
            .iter()
            .map(|b| (*b).clone())
            .collect(),
        total: matching.len(),
        page,
        total_pages,
        pages: visible_pages(page, u32::try_from(total_pages).unwrap_or(u32::MAX), PAGE_SIBLINGS),
    }
}
