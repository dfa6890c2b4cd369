//! Opportunity listing: CMS query construction, in-memory filtering for what
//! the delivery API cannot express, sorting and page slicing.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::models::{Cause, Location, Opportunity, Organizer};
use crate::services::contentstack::{ContentSource, EntryQuery};
use crate::services::query_parser::city_facet;
use crate::utils::error::AppError;
use crate::utils::validation::parse_flag;

pub const OPPORTUNITY_CONTENT_TYPE: &str = "opportunity";
pub const CMS_FETCH_LIMIT: u32 = 100;
pub const DEFAULT_PAGE_SIZE: u32 = 12;
pub const MAX_PAGE_SIZE: u32 = 50;

const OPPORTUNITY_REFERENCES: [&str; 3] = ["causes", "location", "organizer"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFilter {
    Today,
    Tomorrow,
    ThisWeekend,
    ThisWeek,
    ThisMonth,
    Upcoming,
    Past,
}

impl FromStr for DateFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "today" => Ok(DateFilter::Today),
            "tomorrow" => Ok(DateFilter::Tomorrow),
            "this_weekend" | "weekend" => Ok(DateFilter::ThisWeekend),
            "this_week" | "week" => Ok(DateFilter::ThisWeek),
            "this_month" | "month" => Ok(DateFilter::ThisMonth),
            "upcoming" | "future" => Ok(DateFilter::Upcoming),
            "past" => Ok(DateFilter::Past),
            other => Err(format!("unknown date filter '{}'", other)),
        }
    }
}

/// Inclusive day range; an open end means "no upper bound".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    fn days(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    pub fn overlaps(&self, first_day: NaiveDate, last_day: NaiveDate) -> bool {
        last_day >= self.start && self.end.map_or(true, |end| first_day <= end)
    }
}

impl DateFilter {
    /// Window this filter selects, or `None` for [`DateFilter::Past`], which is
    /// not a window but "finished before today".
    pub fn range(self, today: NaiveDate) -> Option<DateRange> {
        let range = match self {
            DateFilter::Today => DateRange::days(today, today),
            DateFilter::Tomorrow => {
                let tomorrow = today + Duration::days(1);
                DateRange::days(tomorrow, tomorrow)
            }
            DateFilter::ThisWeekend => {
                let saturday = match today.weekday() {
                    Weekday::Sun => today - Duration::days(1),
                    weekday => {
                        today + Duration::days(5 - i64::from(weekday.num_days_from_monday()))
                    }
                };
                DateRange::days(saturday, saturday + Duration::days(1))
            }
            DateFilter::ThisWeek => {
                let to_sunday = 6 - i64::from(today.weekday().num_days_from_monday());
                DateRange::days(today, today + Duration::days(to_sunday))
            }
            DateFilter::ThisMonth => DateRange::days(today, last_day_of_month(today)),
            DateFilter::Upcoming => DateRange {
                start: today,
                end: None,
            },
            DateFilter::Past => return None,
        };
        Some(range)
    }

    pub fn matches(self, opportunity: &Opportunity, today: NaiveDate) -> bool {
        match self.range(today) {
            Some(range) => range.overlaps(opportunity.start_date, opportunity.last_day()),
            None => opportunity.last_day() < today,
        }
    }
}

fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(date)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    DateAsc,
    DateDesc,
    Newest,
    Title,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "date" | "date_asc" | "soonest" => Ok(SortOrder::DateAsc),
            "date_desc" | "latest" => Ok(SortOrder::DateDesc),
            "newest" | "recent" => Ok(SortOrder::Newest),
            "title" | "alphabetical" => Ok(SortOrder::Title),
            other => Err(format!("unknown sort order '{}'", other)),
        }
    }
}

/// Raw `GET /api/opportunities` query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpportunityParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub cause: Option<String>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub date: Option<String>,
    #[serde(rename = "virtual")]
    pub is_virtual: Option<String>,
    #[serde(alias = "q")]
    pub search: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpportunityQuery {
    pub page: u32,
    pub limit: u32,
    pub cause: Option<String>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub date: Option<DateFilter>,
    pub is_virtual: Option<bool>,
    pub search: Option<String>,
    pub sort: SortOrder,
}

impl Default for OpportunityQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            cause: None,
            location: None,
            city: None,
            date: None,
            is_virtual: None,
            search: None,
            sort: SortOrder::default(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "all")
}

/// Page (1-based) and page size from raw query values. Anything
/// unparseable falls back to the defaults.
pub fn parse_paging(page: Option<&str>, limit: Option<&str>) -> (u32, u32) {
    let page = page
        .and_then(|p| p.trim().parse::<u32>().ok())
        .unwrap_or(1)
        .max(1);
    let limit = limit
        .and_then(|l| l.trim().parse::<u32>().ok())
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    (page, limit)
}

impl OpportunityQuery {
    /// Unparseable paging numbers fall back to defaults; unknown filter
    /// keywords are rejected.
    pub fn from_params(params: OpportunityParams) -> Result<Self, AppError> {
        let (page, limit) = parse_paging(params.page.as_deref(), params.limit.as_deref());

        let date = non_empty(params.date)
            .map(|d| d.parse::<DateFilter>())
            .transpose()
            .map_err(AppError::ValidationError)?;
        let sort = non_empty(params.sort)
            .map(|s| s.parse::<SortOrder>())
            .transpose()
            .map_err(AppError::ValidationError)?
            .unwrap_or_default();

        let is_virtual = parse_flag("virtual", params.is_virtual.as_deref())?;

        Ok(Self {
            page,
            limit,
            cause: non_empty(params.cause).map(|c| c.to_lowercase()),
            location: non_empty(params.location).map(|l| l.to_lowercase()),
            city: non_empty(params.city).map(|c| city_facet(&c)),
            date,
            is_virtual,
            search: non_empty(params.search),
            sort,
        })
    }

    /// The part of the filter the delivery API evaluates itself.
    pub fn to_cms_query(&self) -> Option<Value> {
        let mut query = Map::new();
        if let Some(is_virtual) = self.is_virtual {
            query.insert("is_virtual".to_string(), json!(is_virtual));
        }
        if let Some(search) = &self.search {
            query.insert(
                "title".to_string(),
                json!({ "$regex": escape_regex(search), "$options": "i" }),
            );
        }
        (!query.is_empty()).then_some(Value::Object(query))
    }
}

fn escape_regex(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if "\\.+*?()|[]{}^$".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub fn apply_filters(
    opportunities: Vec<Opportunity>,
    query: &OpportunityQuery,
    today: NaiveDate,
) -> Vec<Opportunity> {
    let city = query.city.as_deref().map(city_facet);
    let mut filtered: Vec<Opportunity> = opportunities
        .into_iter()
        .filter(|opp| {
            query.location.as_deref().map_or(true, |slug| {
                opp.location
                    .as_ref()
                    .is_some_and(|l| l.slug.eq_ignore_ascii_case(slug))
            })
        })
        .filter(|opp| {
            city.as_deref().map_or(true, |city| {
                opp.location.as_ref().is_some_and(|l| l.city_key() == city)
            })
        })
        .filter(|opp| query.cause.as_deref().map_or(true, |slug| opp.has_cause(slug)))
        .filter(|opp| query.date.map_or(true, |date| date.matches(opp, today)))
        .collect();

    sort_opportunities(&mut filtered, query.sort);
    filtered
}

pub fn sort_opportunities(opportunities: &mut [Opportunity], order: SortOrder) {
    match order {
        SortOrder::DateAsc => opportunities.sort_by(|a, b| {
            a.start_date
                .cmp(&b.start_date)
                .then_with(|| a.title.cmp(&b.title))
        }),
        SortOrder::DateDesc => opportunities.sort_by(|a, b| {
            b.start_date
                .cmp(&a.start_date)
                .then_with(|| a.title.cmp(&b.title))
        }),
        SortOrder::Newest => {
            opportunities.sort_by_key(|o| std::cmp::Reverse(o.created_at.unwrap_or(DateTime::<Utc>::MIN_UTC)))
        }
        SortOrder::Title => opportunities.sort_by_cached_key(|o| o.title.to_lowercase()),
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: usize,
    pub total_pages: u32,
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

/// 1-based page slice; pages past the end come back empty.
pub fn paginate<T>(items: Vec<T>, page: u32, limit: u32) -> Page<T> {
    let page = page.max(1);
    let limit = limit.max(1);
    let total = items.len();
    let total_pages = total.div_ceil(limit as usize) as u32;
    let start = (page as usize - 1).saturating_mul(limit as usize);

    Page {
        items: items.into_iter().skip(start).take(limit as usize).collect(),
        pagination: Pagination {
            page,
            limit,
            total,
            total_pages,
            has_more: page < total_pages,
        },
    }
}

fn into_models<T, E, F>(entries: Vec<Value>, kind: &str, convert: F) -> Vec<T>
where
    F: Fn(Value) -> Result<T, E>,
    E: std::fmt::Display,
{
    entries
        .into_iter()
        .filter_map(|entry| {
            let uid = entry
                .get("uid")
                .and_then(Value::as_str)
                .unwrap_or("<unknown>")
                .to_string();
            convert(entry)
                .map_err(|e| warn!(kind, uid = %uid, error = %e, "Skipping unusable CMS entry"))
                .ok()
        })
        .collect()
}

#[derive(Clone)]
pub struct OpportunityService {
    source: Arc<dyn ContentSource>,
}

impl OpportunityService {
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        Self { source }
    }

    pub async fn list(
        &self,
        query: &OpportunityQuery,
        today: NaiveDate,
    ) -> Result<Page<Opportunity>, AppError> {
        let fetched = self.fetch(query.to_cms_query(), CMS_FETCH_LIMIT, 0).await?;
        let filtered = apply_filters(fetched.0, query, today);
        Ok(paginate(filtered, query.page, query.limit))
    }

    /// Returns the converted entries plus the CMS total count.
    async fn fetch(
        &self,
        cms_query: Option<Value>,
        limit: u32,
        skip: u32,
    ) -> Result<(Vec<Opportunity>, u64), AppError> {
        let entry_query = EntryQuery {
            query: cms_query,
            include: OPPORTUNITY_REFERENCES.to_vec(),
            limit: Some(limit),
            skip: (skip > 0).then_some(skip),
            include_count: true,
            variant: None,
        };
        let page = self
            .source
            .entries(OPPORTUNITY_CONTENT_TYPE, &entry_query)
            .await?;
        let count = page.count.unwrap_or(page.entries.len() as u64);
        Ok((
            into_models(page.entries, OPPORTUNITY_CONTENT_TYPE, Opportunity::from_entry),
            count,
        ))
    }

    async fn find_one(&self, cms_query: Value) -> Result<Option<Opportunity>, AppError> {
        let (found, _) = self.fetch(Some(cms_query), 1, 0).await?;
        Ok(found.into_iter().next())
    }

    pub async fn by_slug(&self, slug: &str) -> Result<Opportunity, AppError> {
        let slug = slug.trim().to_lowercase();
        let query = json!({
            "$or": [
                { "slug": slug },
                { "url": format!("/opportunities/{}", slug) }
            ]
        });
        self.find_one(query)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Opportunity '{}' was not found", slug)))
    }

    pub async fn by_uid(&self, uid: &str) -> Result<Option<Opportunity>, AppError> {
        self.find_one(json!({ "uid": uid })).await
    }

    /// Every published opportunity, walking the delivery API in pages.
    pub async fn all(&self) -> Result<Vec<Opportunity>, AppError> {
        let mut all = Vec::new();
        let mut skip = 0;
        loop {
            let (batch, total) = self.fetch(None, CMS_FETCH_LIMIT, skip).await?;
            all.extend(batch);
            skip += CMS_FETCH_LIMIT;
            if u64::from(skip) >= total {
                break;
            }
        }
        Ok(all)
    }

    async fn taxonomy(&self, content_type: &str) -> Result<Vec<Value>, AppError> {
        let query = EntryQuery {
            limit: Some(CMS_FETCH_LIMIT),
            ..EntryQuery::default()
        };
        Ok(self.source.entries(content_type, &query).await?.entries)
    }

    pub async fn causes(&self) -> Result<Vec<Cause>, AppError> {
        let mut causes = into_models(self.taxonomy("cause").await?, "cause", Cause::from_entry);
        causes.sort_by_cached_key(|c| c.title.to_lowercase());
        Ok(causes)
    }

    pub async fn locations(&self) -> Result<Vec<Location>, AppError> {
        let mut locations =
            into_models(self.taxonomy("location").await?, "location", Location::from_entry);
        locations.sort_by_cached_key(|l| l.name.to_lowercase());
        Ok(locations)
    }

    pub async fn organizers(&self) -> Result<Vec<Organizer>, AppError> {
        let mut organizers =
            into_models(self.taxonomy("organizer").await?, "organizer", Organizer::from_entry);
        organizers.sort_by_cached_key(|o| o.name.to_lowercase());
        Ok(organizers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn opp(uid: &str, start: &str, end: Option<&str>) -> Opportunity {
        Opportunity::from_entry(json!({
            "uid": uid,
            "title": format!("Event {}", uid),
            "start_date": start,
            "end_date": end,
        }))
        .unwrap()
    }

    fn with_place(mut o: Opportunity, location_slug: &str, city: &str, cause: &str) -> Opportunity {
        o.location = Some(Location {
            uid: format!("loc-{}", location_slug),
            name: location_slug.to_string(),
            slug: location_slug.to_string(),
            city: Some(city.to_string()),
            state: None,
        });
        o.causes = vec![Cause {
            uid: format!("cause-{}", cause),
            title: cause.to_string(),
            slug: cause.to_string(),
            color: None,
        }];
        o
    }

    // 2025-06-11 is a Wednesday.
    const WED: (i32, u32, u32) = (2025, 6, 11);

    #[test]
    fn test_weekend_spans_saturday_to_sunday() {
        let today = date(WED.0, WED.1, WED.2);
        let range = DateFilter::ThisWeekend.range(today).unwrap();
        assert_eq!(range.start, date(2025, 6, 14));
        assert_eq!(range.end, Some(date(2025, 6, 15)));
        assert_eq!(range.start.weekday(), Weekday::Sat);
    }

    #[test]
    fn test_weekend_from_saturday_and_sunday() {
        let saturday = date(2025, 6, 14);
        assert_eq!(
            DateFilter::ThisWeekend.range(saturday).unwrap(),
            DateRange::days(saturday, date(2025, 6, 15))
        );

        let sunday = date(2025, 6, 15);
        assert_eq!(
            DateFilter::ThisWeekend.range(sunday).unwrap(),
            DateRange::days(saturday, sunday)
        );
    }

    #[test]
    fn test_week_and_month_ranges() {
        let today = date(WED.0, WED.1, WED.2);
        assert_eq!(
            DateFilter::ThisWeek.range(today).unwrap().end,
            Some(date(2025, 6, 15))
        );
        assert_eq!(
            DateFilter::ThisMonth.range(today).unwrap().end,
            Some(date(2025, 6, 30))
        );
        assert_eq!(
            DateFilter::ThisMonth.range(date(2025, 12, 3)).unwrap().end,
            Some(date(2025, 12, 31))
        );
        assert_eq!(
            DateFilter::ThisMonth.range(date(2024, 2, 10)).unwrap().end,
            Some(date(2024, 2, 29))
        );
    }

    #[test]
    fn test_weekend_boundaries() {
        let today = date(WED.0, WED.1, WED.2);
        let friday = opp("fri", "2025-06-13", None);
        let sunday = opp("sun", "2025-06-15", None);
        let monday = opp("mon", "2025-06-16", None);
        let fri_to_sat = opp("span", "2025-06-13", Some("2025-06-14"));

        assert!(!DateFilter::ThisWeekend.matches(&friday, today));
        assert!(DateFilter::ThisWeekend.matches(&sunday, today));
        assert!(!DateFilter::ThisWeekend.matches(&monday, today));
        assert!(DateFilter::ThisWeekend.matches(&fri_to_sat, today));
    }

    #[test]
    fn test_past_and_upcoming_are_complementary() {
        let today = date(WED.0, WED.1, WED.2);
        let finished = opp("done", "2025-06-01", Some("2025-06-10"));
        let ongoing = opp("ongoing", "2025-06-01", Some("2025-06-11"));
        let single_today = opp("today", "2025-06-11", None);

        for o in [&finished, &ongoing, &single_today] {
            assert_ne!(
                DateFilter::Past.matches(o, today),
                DateFilter::Upcoming.matches(o, today),
                "{} must be exactly one of past/upcoming",
                o.uid
            );
        }
        assert!(DateFilter::Past.matches(&finished, today));
        assert!(DateFilter::Upcoming.matches(&ongoing, today));
        assert!(DateFilter::Today.matches(&single_today, today));
        assert!(!DateFilter::Tomorrow.matches(&single_today, today));
    }

    #[test]
    fn test_date_filter_parsing() {
        assert_eq!("this-weekend".parse::<DateFilter>(), Ok(DateFilter::ThisWeekend));
        assert_eq!("PAST".parse::<DateFilter>(), Ok(DateFilter::Past));
        assert!("someday".parse::<DateFilter>().is_err());
    }

    #[test]
    fn test_query_from_params() {
        let query = OpportunityQuery::from_params(OpportunityParams {
            page: Some("0".into()),
            limit: Some("500".into()),
            cause: Some("Environment".into()),
            location: Some("all".into()),
            date: Some("upcoming".into()),
            is_virtual: Some("true".into()),
            search: Some("  beach  ".into()),
            sort: Some("title".into()),
            ..OpportunityParams::default()
        })
        .unwrap();

        assert_eq!(query.page, 1);
        assert_eq!(query.limit, MAX_PAGE_SIZE);
        assert_eq!(query.cause.as_deref(), Some("environment"));
        assert_eq!(query.location, None);
        assert_eq!(query.date, Some(DateFilter::Upcoming));
        assert_eq!(query.is_virtual, Some(true));
        assert_eq!(query.search.as_deref(), Some("beach"));
        assert_eq!(query.sort, SortOrder::Title);
    }

    #[test]
    fn test_query_defaults_and_rejections() {
        let query = OpportunityQuery::from_params(OpportunityParams {
            page: Some("abc".into()),
            ..OpportunityParams::default()
        })
        .unwrap();
        assert_eq!(query, OpportunityQuery::default());
        assert!(query.to_cms_query().is_none());

        let err = OpportunityQuery::from_params(OpportunityParams {
            date: Some("yesterday".into()),
            ..OpportunityParams::default()
        })
        .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        assert!(OpportunityQuery::from_params(OpportunityParams {
            is_virtual: Some("maybe".into()),
            ..OpportunityParams::default()
        })
        .is_err());
    }

    #[test]
    fn test_cms_query_escapes_regex() {
        let query = OpportunityQuery {
            is_virtual: Some(false),
            search: Some("C++ (basics)".to_string()),
            ..OpportunityQuery::default()
        };
        assert_eq!(
            query.to_cms_query().unwrap(),
            json!({
                "is_virtual": false,
                "title": { "$regex": "C\\+\\+ \\(basics\\)", "$options": "i" }
            })
        );
    }

    #[test]
    fn test_apply_filters_location_cause_and_sort() {
        let today = date(WED.0, WED.1, WED.2);
        let items = vec![
            with_place(opp("b", "2025-06-20", None), "juhu", "Mumbai", "environment"),
            with_place(opp("a", "2025-06-18", None), "juhu", "Mumbai", "environment"),
            with_place(opp("c", "2025-06-19", None), "koregaon", "Pune", "environment"),
            with_place(opp("d", "2025-06-17", None), "juhu", "Mumbai", "education"),
        ];

        let query = OpportunityQuery {
            location: Some("JUHU".to_string()),
            cause: Some("environment".to_string()),
            ..OpportunityQuery::default()
        };
        let uids: Vec<_> = apply_filters(items.clone(), &query, today)
            .into_iter()
            .map(|o| o.uid)
            .collect();
        assert_eq!(uids, vec!["a", "b"]);

        let query = OpportunityQuery {
            city: Some("pune".to_string()),
            ..OpportunityQuery::default()
        };
        assert_eq!(apply_filters(items.clone(), &query, today).len(), 1);

        let query = OpportunityQuery {
            sort: SortOrder::DateDesc,
            ..OpportunityQuery::default()
        };
        let uids: Vec<_> = apply_filters(items, &query, today)
            .into_iter()
            .map(|o| o.uid)
            .collect();
        assert_eq!(uids, vec!["b", "c", "a", "d"]);
    }

    #[test]
    fn test_city_filter_matches_aliased_cms_city() {
        let today = date(WED.0, WED.1, WED.2);
        let items = vec![
            with_place(opp("a", "2025-06-18", None), "cubbon", "Bangalore", "community"),
            with_place(opp("b", "2025-06-19", None), "juhu", "Bombay", "environment"),
            with_place(opp("c", "2025-06-20", None), "koregaon", "Pune", "environment"),
        ];

        let parsed = crate::services::query_parser::parse_search_query("food drive in bangalore");
        let query = OpportunityQuery {
            city: parsed.city,
            ..OpportunityQuery::default()
        };
        let uids: Vec<_> = apply_filters(items.clone(), &query, today)
            .into_iter()
            .map(|o| o.uid)
            .collect();
        assert_eq!(uids, vec!["a"]);

        let query = OpportunityQuery::from_params(OpportunityParams {
            city: Some("Mumbai".into()),
            ..OpportunityParams::default()
        })
        .unwrap();
        assert_eq!(apply_filters(items, &query, today).len(), 1);
    }

    #[test]
    fn test_newest_sort_puts_undated_last() {
        let mut older = opp("older", "2025-06-20", None);
        older.created_at = Some("2025-01-01T00:00:00Z".parse().unwrap());
        let mut newer = opp("newer", "2025-06-20", None);
        newer.created_at = Some("2025-05-01T00:00:00Z".parse().unwrap());
        let undated = opp("undated", "2025-06-20", None);

        let mut items = vec![undated, older, newer];
        sort_opportunities(&mut items, SortOrder::Newest);
        let uids: Vec<_> = items.iter().map(|o| o.uid.as_str()).collect();
        assert_eq!(uids, vec!["newer", "older", "undated"]);
    }

    #[test]
    fn test_pagination_math() {
        let items: Vec<u32> = (1..=25).collect();

        let first = paginate(items.clone(), 1, 10);
        assert_eq!(first.items, (1..=10).collect::<Vec<_>>());
        assert_eq!(first.pagination.total, 25);
        assert_eq!(first.pagination.total_pages, 3);
        assert!(first.pagination.has_more);

        let last = paginate(items.clone(), 3, 10);
        assert_eq!(last.items, vec![21, 22, 23, 24, 25]);
        assert!(!last.pagination.has_more);

        let beyond = paginate(items, 9, 10);
        assert!(beyond.items.is_empty());
        assert!(!beyond.pagination.has_more);

        let empty = paginate(Vec::<u32>::new(), 1, 10);
        assert_eq!(empty.pagination.total_pages, 0);
        assert!(!empty.pagination.has_more);
    }
}
