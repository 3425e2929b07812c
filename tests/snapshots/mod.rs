//! Snapshot tests using insta
//!
//! Whole report templates rendered with a fixed set of filters.

use chrono::NaiveDate;
use insta::assert_snapshot;
use sqlreport::{detect, extract, render_at, PathOperator, SubstitutionParams};

const PAGE_VIEWS: &str = "SELECT url_path, COUNT(*) AS views
FROM `team-analytics.umami_views.event`
WHERE website_id = '{{website_id}}'
  [[ AND {{url_sti}} ]]
  [[ AND {{created_at}} ]]
GROUP BY url_path
ORDER BY views DESC
LIMIT {{limit}}";

const SESSIONS_BY_PAGE: &str = "SELECT COUNT(DISTINCT session_id) AS sessions
FROM `team-analytics.umami_views.session`
WHERE website_id = {{website_id}}
  AND hostname = {{nettside}}
  AND entry_path = [[ {{url_sti}} -- ]] '/'
  [[ AND {{created_at}} ]]";

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn params() -> SubstitutionParams {
    SubstitutionParams::new()
        .with_website_id("35abb2b7-3f97-42ce-931b-cf547d40d967")
        .with_site_domain("www.nav.no")
        .with_url_path("/soknad")
        .with_path_operator(PathOperator::StartsWith)
        .with_date_range(Some(date("2024-01-01")), Some(date("2024-01-31")))
        .with_variable("limit", "10")
        .with_project("team-analytics")
}

fn snapshot_render(template: &str, params: &SubstitutionParams) -> String {
    render_at(template, params, date("2024-03-15")).sql
}

#[test]
fn snapshot_page_views_all_filters() {
    assert_snapshot!(snapshot_render(PAGE_VIEWS, &params()), @r"
    SELECT url_path, COUNT(*) AS views
    FROM `team-analytics.umami_views.event`
    WHERE website_id = '35abb2b7-3f97-42ce-931b-cf547d40d967'
      AND url_path LIKE '/soknad%'
      AND `team-analytics.umami_views.event`.created_at BETWEEN TIMESTAMP('2024-01-01') AND TIMESTAMP('2024-01-31T23:59:59')
    GROUP BY url_path
    ORDER BY views DESC
    LIMIT 10
    ");
}

#[test]
fn snapshot_page_views_no_path_filter() {
    let params = params().with_url_path("/").with_variable("limit", "all");
    let sql = snapshot_render(PAGE_VIEWS, &params);
    let lines: Vec<&str> = sql.lines().map(str::trim_end).filter(|l| !l.is_empty()).collect();
    assert_snapshot!(lines.join("\n"), @r"
    SELECT url_path, COUNT(*) AS views
    FROM `team-analytics.umami_views.event`
    WHERE website_id = '35abb2b7-3f97-42ce-931b-cf547d40d967'
      AND `team-analytics.umami_views.event`.created_at BETWEEN TIMESTAMP('2024-01-01') AND TIMESTAMP('2024-01-31T23:59:59')
    GROUP BY url_path
    ORDER BY views DESC
    LIMIT 'all'
    ");
}

#[test]
fn snapshot_sessions_by_page() {
    assert_snapshot!(snapshot_render(SESSIONS_BY_PAGE, &params()), @r"
    SELECT COUNT(DISTINCT session_id) AS sessions
    FROM `team-analytics.umami_views.session`
    WHERE website_id = '35abb2b7-3f97-42ce-931b-cf547d40d967'
      AND hostname = 'www.nav.no'
      AND entry_path = '/soknad'
      AND `team-analytics.umami_views.session`.created_at BETWEEN TIMESTAMP('2024-01-01') AND TIMESTAMP('2024-01-31T23:59:59')
    ");
}

#[test]
fn snapshot_unfilled_template() {
    assert_snapshot!(snapshot_render(SESSIONS_BY_PAGE, &SubstitutionParams::new()), @r"
    SELECT COUNT(DISTINCT session_id) AS sessions
    FROM `team-analytics.umami_views.session`
    WHERE website_id = {{website_id}}
      AND hostname = {{nettside}}
      AND entry_path = '/'
      AND `umami_views.session`.created_at BETWEEN TIMESTAMP('2024-02-14') AND TIMESTAMP('2024-03-15T23:59:59')
    ");
}

#[test]
fn snapshot_detection() {
    let flags = detect(PAGE_VIEWS);
    assert_snapshot!(format!("{:?}", flags), @r#"DetectionFlags { has_date_filter: true, has_url_path_filter: true, has_website_id_placeholder: true, has_site_domain_placeholder: false, custom_variable_names: ["limit"] }"#);
}

#[test]
fn snapshot_extraction_of_rendered_sql() {
    let filters = extract(&snapshot_render(PAGE_VIEWS, &params()));
    assert_snapshot!(format!("{:?}", filters), @"ParsedFilters { website_id: Some(\"35abb2b7-3f97-42ce-931b-cf547d40d967\"), date_range: Some(ParsedDateRange { from: 2024-01-01, to: 2024-01-31 }), url_path: None }");
}
