// tests/artifacts.rs

mod common;

use std::path::Path;

use autoload::artifacts::manifest::{ManifestConfig, inject_manifest_link, render_manifest};
use autoload::artifacts::sitemap::{SitemapEntry, collect_sitemap_entries, render_sitemap};
use autoload::artifacts::types::{TypeDeclaration, collect_type_values, render_type_declarations};
use autoload::artifacts::write_if_changed;
use autoload::cli::LogLevel;
use autoload::config::{SitemapStrategy, TypesStrategy};
use autoload::fs::FileSystem;
use autoload::fs::mock::MockFileSystem;
use autoload::logging::resolve_level;
use autoload::pipeline::GroupData;
use autoload::resolve::patterns::build_globset;
use chrono::{TimeZone, Utc};
use common::TestResult;
use serde_json::json;

fn group_data(value: serde_json::Value) -> GroupData {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

#[test]
fn type_values_are_distinct_and_in_first_seen_order() {
    let strategy = TypesStrategy {
        name: "RouteName".to_string(),
        property: "route".to_string(),
    };
    let data = group_data(json!({
        "views": [{"route": "/home"}, {"route": "/about"}, {"route": 3}],
        "drafts": [{"route": "/home"}, {"route": "/draft"}, {"title": "no route"}],
    }));

    let decl = collect_type_values("routes", &strategy, &data);

    assert_eq!(decl.name, "RouteName");
    assert_eq!(decl.values, ["/home", "/about", "/draft"]);
}

#[test]
fn type_declarations_render_unions_and_never() {
    let decls = [
        TypeDeclaration {
            name: "RouteName".to_string(),
            values: vec!["/home".to_string(), "/it's".to_string()],
        },
        TypeDeclaration {
            name: "Empty".to_string(),
            values: Vec::new(),
        },
    ];

    assert_eq!(
        render_type_declarations(&decls),
        "export type RouteName = '/home' | '/it\\'s';\n\nexport type Empty = never;\n"
    );
}

#[test]
fn sitemap_entries_read_overrides_from_metadata() {
    let strategy = SitemapStrategy {
        property: "route".to_string(),
    };
    let data = group_data(json!({
        "views": [
            {"route": "/home", "metadata": {"changefreq": "daily", "priority": 1.0}},
            {"route": "/about", "data": {"changefreq": "sometimes", "priority": 7}},
            {"path": "no-route.tsx"}
        ]
    }));

    let entries = collect_sitemap_entries(&strategy, &data);

    assert_eq!(
        entries,
        [
            SitemapEntry {
                route: "/home".to_string(),
                changefreq: "daily".to_string(),
                priority: 1.0,
            },
            SitemapEntry {
                route: "/about".to_string(),
                changefreq: "weekly".to_string(),
                priority: 1.0,
            },
        ]
    );
}

#[test]
fn sitemap_document_joins_base_url_and_skips_excluded() -> TestResult {
    let entries = [
        SitemapEntry {
            route: "/".to_string(),
            changefreq: "weekly".to_string(),
            priority: 0.8,
        },
        SitemapEntry {
            route: "/admin/users".to_string(),
            changefreq: "weekly".to_string(),
            priority: 0.8,
        },
        SitemapEntry {
            route: "/q&a".to_string(),
            changefreq: "monthly".to_string(),
            priority: 0.5,
        },
    ];
    let exclude = build_globset(&["/admin/**".to_string()])?;
    let lastmod = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single().ok_or("bad date")?;

    let xml = render_sitemap(&entries, "https://example.com/", Some(&exclude), lastmod);

    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset"));
    assert!(xml.contains("<loc>https://example.com/</loc>"));
    assert!(xml.contains("<loc>https://example.com/q&amp;a</loc>"));
    assert!(xml.contains("<lastmod>2024-05-01T12:00:00.000Z</lastmod>"));
    assert!(xml.contains("<priority>0.5</priority>"));
    assert!(!xml.contains("admin"));
    assert_eq!(xml.matches("<url>").count(), 2);
    assert!(xml.ends_with("</urlset>\n"));
    Ok(())
}

#[test]
fn manifest_renders_only_document_fields() -> TestResult {
    let cfg: ManifestConfig = toml::from_str(
        r#"
name = "Example"
shortName = "Ex"
output = "app.webmanifest"

[[icons]]
src = "/icon.png"
sizes = "192x192"
type = "image/png"
"#,
    )?;

    let doc: serde_json::Value = serde_json::from_str(&render_manifest(&cfg)?)?;

    assert_eq!(cfg.output, "app.webmanifest");
    assert_eq!(doc["short_name"], "Ex");
    assert_eq!(doc["start_url"], "/");
    assert_eq!(doc["icons"][0]["type"], "image/png");
    assert!(doc.get("output").is_none());
    assert!(doc.get("description").is_none());
    Ok(())
}

#[test]
fn manifest_link_is_injected_once() {
    let html = "<html>\n<head>\n</head>\n<body></body>\n</html>\n";

    let once = inject_manifest_link(html, "manifest.webmanifest");
    let twice = inject_manifest_link(&once, "manifest.webmanifest");

    assert!(once.contains("  <link rel=\"manifest\" href=\"/manifest.webmanifest\">\n</head>"));
    assert_eq!(once, twice);
    assert_eq!(inject_manifest_link("<p>no head</p>", "m.json"), "<p>no head</p>");
}

#[test]
fn artifacts_are_written_only_when_content_differs() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_dir("/project/src");
    let path = Path::new("/project/src/autogen.d.ts");

    assert!(write_if_changed(&fs, path, "export type A = 'a';\n")?);
    assert!(!write_if_changed(&fs, path, "export type A = 'a';\n")?);
    assert!(write_if_changed(&fs, path, "export type A = 'b';\n")?);
    assert_eq!(fs.read_to_string(path)?, "export type A = 'b';\n");
    Ok(())
}

#[test]
fn log_level_prefers_cli_then_config_then_env() {
    use tracing::Level;

    assert_eq!(
        resolve_level(Some(LogLevel::Trace), Some(LogLevel::Warn), Some("error".into())),
        Level::TRACE
    );
    assert_eq!(
        resolve_level(None, Some(LogLevel::Warn), Some("error".into())),
        Level::WARN
    );
    assert_eq!(resolve_level(None, None, Some(" Debug ".into())), Level::DEBUG);
    assert_eq!(resolve_level(None, None, Some("loud".into())), Level::INFO);
    assert_eq!(resolve_level(None, None, None), Level::INFO);
}
