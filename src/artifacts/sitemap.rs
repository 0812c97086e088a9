// src/artifacts/sitemap.rs

//! Sitemap XML from components with a `sitemap` strategy.

use std::fmt::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use globset::GlobSet;
use serde_json::Value;

use crate::config::SitemapStrategy;
use crate::pipeline::GroupData;

pub const DEFAULT_CHANGEFREQ: &str = "weekly";
pub const DEFAULT_PRIORITY: f64 = 0.8;

const CHANGEFREQS: [&str; 7] = [
    "always", "hourly", "daily", "weekly", "monthly", "yearly", "never",
];

#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub route: String,
    pub changefreq: String,
    pub priority: f64,
}

/// One entry per item carrying a string `strategy.property`.
///
/// `changefreq` and `priority` are read from the item's `metadata` or `data`
/// object when present and valid.
pub fn collect_sitemap_entries(strategy: &SitemapStrategy, data: &GroupData) -> Vec<SitemapEntry> {
    let mut entries = Vec::new();
    for value in data.values() {
        let Value::Array(items) = value else {
            continue;
        };
        for item in items {
            let Some(route) = item.get(&strategy.property).and_then(Value::as_str) else {
                continue;
            };
            let changefreq = item_meta(item, "changefreq")
                .and_then(Value::as_str)
                .filter(|f| CHANGEFREQS.contains(f))
                .unwrap_or(DEFAULT_CHANGEFREQ)
                .to_string();
            let priority = item_meta(item, "priority")
                .and_then(Value::as_f64)
                .map(|p| p.clamp(0.0, 1.0))
                .unwrap_or(DEFAULT_PRIORITY);
            entries.push(SitemapEntry {
                route: route.to_string(),
                changefreq,
                priority,
            });
        }
    }
    entries
}

fn item_meta<'a>(item: &'a Value, key: &str) -> Option<&'a Value> {
    ["metadata", "data"]
        .iter()
        .find_map(|section| item.get(*section).and_then(|m| m.get(key)))
}

/// Render the `<urlset>` document. Routes matching `exclude` are left out.
pub fn render_sitemap(
    entries: &[SitemapEntry],
    base_url: &str,
    exclude: Option<&GlobSet>,
    lastmod: DateTime<Utc>,
) -> String {
    let lastmod = lastmod.to_rfc3339_opts(SecondsFormat::Millis, true);
    let mut out = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for entry in entries {
        if exclude.is_some_and(|set| set.is_match(&entry.route)) {
            continue;
        }
        let loc = join_url(base_url, &entry.route);
        let _ = write!(
            out,
            "  <url>\n    <loc>{}</loc>\n    <lastmod>{}</lastmod>\n    <changefreq>{}</changefreq>\n    <priority>{:.1}</priority>\n  </url>\n",
            escape_xml(&loc),
            lastmod,
            entry.changefreq,
            entry.priority
        );
    }
    out.push_str("</urlset>\n");
    out
}

fn join_url(base: &str, route: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        route.trim_start_matches('/')
    )
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
