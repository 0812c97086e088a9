// tests/generator_pipeline.rs

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::anyhow;
use autoload::config::{ComponentConfig, FileMatchConfig, GroupConfig};
use autoload::errors::AutoloadError;
use autoload::generator::CollectionGenerator;
use autoload::pipeline::{AggregateFn, DataSourceFn, TransformFn};
use autoload::types::{BuildContext, Metadata, TransformErrorPolicy};
use common::{MockProject, TestResult, init_tracing, pages_project, routes_component};
use serde_json::{Value, json};

async fn generator_for(
    project: &MockProject,
    component: ComponentConfig,
) -> Result<CollectionGenerator, AutoloadError> {
    CollectionGenerator::initialize(
        component,
        project.shared_fs(),
        &project.root(),
        TransformErrorPolicy::FailFast,
    )
    .await
}

#[tokio::test]
async fn transform_sees_each_resolved_item() -> TestResult {
    init_tracing();
    let project = MockProject::new().with_file("src/lib/a.ts", "export {}");
    let upper = TransformFn::new(|mut item, _ctx| {
        let path = item["path"].as_str().unwrap_or_default().to_uppercase();
        item["upper"] = Value::String(path);
        Ok(item)
    });
    let component = ComponentConfig::new("lib").with_group(
        GroupConfig::files("modules", FileMatchConfig::new("src/lib", ["*.ts"])).with_transform(upper),
    );

    let mut generator = generator_for(&project, component).await?;
    let data = generator.data(&BuildContext::dev()).await?;

    let items = data["modules"].as_array().ok_or("modules is not an array")?;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["path"], "a.ts");
    assert_eq!(items[0]["upper"], "A.TS");
    assert_eq!(items[0]["uri"], "/src/lib/a.ts");
    Ok(())
}

#[tokio::test]
async fn groups_lists_files_in_discovery_order_and_appends_new_ones() -> TestResult {
    let project = pages_project();
    let mut generator = generator_for(&project, routes_component()).await?;
    let ctx = BuildContext::dev();

    let paths: Vec<String> = generator.groups(&ctx).into_iter().map(|f| f.path).collect();
    assert_eq!(paths, ["about.tsx", "home.tsx"]);

    let contact = project.write("src/pages/contact.tsx", "");
    assert!(generator.add_file(&contact));

    let files = generator.groups(&ctx);
    assert_eq!(files.len(), 3);
    assert_eq!(files[2].path, "contact.tsx");
    assert_eq!(files[2].uri, "/src/pages/contact.tsx");
    Ok(())
}

#[tokio::test]
async fn production_uris_are_content_addressed_under_prefix() -> TestResult {
    let project = pages_project();
    let component = ComponentConfig::new("routes").with_group(GroupConfig::files(
        "views",
        FileMatchConfig::new("src/pages", ["*.tsx"]).with_prefix("/assets/"),
    ));
    let mut generator = generator_for(&project, component).await?;

    let files = generator.groups(&BuildContext::production());
    for file in &files {
        assert!(file.uri.starts_with("/assets/"), "uri: {}", file.uri);
        assert!(file.uri.ends_with(".js"));
        assert_eq!(file.uri.len(), "/assets/".len() + 32 + ".js".len());
    }
    assert_ne!(files[0].uri, files[1].uri);

    let data = generator.data(&BuildContext::production()).await?;
    assert_eq!(data["views"][0]["uri"], Value::String(files[0].uri.clone()));
    Ok(())
}

#[tokio::test]
async fn later_groups_see_earlier_group_output() -> TestResult {
    let project = pages_project();
    let count_views = TransformFn::new(|mut item, ctx| {
        let seen = ctx
            .data
            .get("views")
            .and_then(Value::as_array)
            .map(|v| v.len())
            .unwrap_or(0);
        item["views_seen"] = json!(seen);
        Ok(item)
    });
    let component = routes_component().with_group(
        GroupConfig::source("meta", DataSourceFn::constant(json!({ "title": "Site" })))
            .with_transform(count_views),
    );

    let mut generator = generator_for(&project, component).await?;
    let data = generator.data(&BuildContext::dev()).await?;

    assert_eq!(data["meta"][0]["views_seen"], 2);
    assert_eq!(data["meta"][0]["title"], "Site");
    Ok(())
}

#[tokio::test]
async fn aggregate_replaces_group_value_after_transforms() -> TestResult {
    let project = pages_project();
    let names = AggregateFn::new(|items| {
        let mut paths: Vec<Value> = items.into_iter().map(|i| i["path"].clone()).collect();
        paths.reverse();
        Ok(json!({ "count": paths.len(), "paths": paths }))
    });
    let component = ComponentConfig::new("routes").with_group(
        GroupConfig::files("views", FileMatchConfig::new("src/pages", ["*.tsx"])).with_aggregate(names),
    );

    let mut generator = generator_for(&project, component).await?;
    let data = generator.data(&BuildContext::dev()).await?;

    assert_eq!(data["views"], json!({ "count": 2, "paths": ["home.tsx", "about.tsx"] }));
    Ok(())
}

#[tokio::test]
async fn data_is_memoized_until_files_change() -> TestResult {
    let project = pages_project();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let counting = TransformFn::new(move |item, _ctx| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(item)
    });
    let component = ComponentConfig::new("routes").with_group(
        GroupConfig::files("views", FileMatchConfig::new("src/pages", ["*.tsx"])).with_transform(counting),
    );
    let mut generator = generator_for(&project, component).await?;
    let ctx = BuildContext::dev();

    let first = generator.data(&ctx).await?;
    let second = generator.data(&ctx).await?;
    assert_eq!(first, second);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let contact = project.write("src/pages/contact.tsx", "");
    generator.add_file(&contact);
    let third = generator.data(&ctx).await?;
    assert_eq!(third["views"].as_array().map(Vec::len), Some(3));
    assert_eq!(calls.load(Ordering::SeqCst), 5);
    Ok(())
}

#[tokio::test]
async fn data_source_arrays_become_item_lists() -> TestResult {
    let project = MockProject::new();
    let component = ComponentConfig::new("site")
        .with_group(GroupConfig::source(
            "links",
            DataSourceFn::constant(json!([{ "href": "/a" }, { "href": "/b" }])),
        ))
        .with_group(GroupConfig::source(
            "config",
            DataSourceFn::new(|| Ok(json!({ "lang": "en" }))),
        ));

    let mut generator = generator_for(&project, component).await?;
    let data = generator.data(&BuildContext::dev()).await?;

    assert_eq!(data["links"], json!([{ "href": "/a" }, { "href": "/b" }]));
    assert_eq!(data["config"], json!([{ "lang": "en" }]));
    Ok(())
}

#[tokio::test]
async fn failing_producer_fails_initialization() {
    let project = MockProject::new();
    let component = ComponentConfig::new("site").with_group(GroupConfig::source(
        "broken",
        DataSourceFn::new(|| Err(anyhow!("upstream unavailable"))),
    ));

    let result = generator_for(&project, component).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn name_in_context_filters_to_one_group() -> TestResult {
    let project = pages_project().with_file("src/blog/first.md", "# first");
    let component = routes_component().with_group(GroupConfig::files(
        "posts",
        FileMatchConfig::new("src/blog", ["*.md"]),
    ));
    let mut generator = generator_for(&project, component).await?;

    let all = generator.data(&BuildContext::dev()).await?;
    let keys: Vec<&str> = all.keys().map(String::as_str).collect();
    assert_eq!(keys, ["views", "posts"]);

    let posts = generator.data(&BuildContext::dev().with_name("posts")).await?;
    let keys: Vec<&str> = posts.keys().map(String::as_str).collect();
    assert_eq!(keys, ["posts"]);

    let whole = generator.data(&BuildContext::dev().with_name("routes")).await?;
    assert_eq!(whole, all);
    Ok(())
}

#[tokio::test]
async fn fail_fast_transform_reports_group_and_index() -> TestResult {
    let project = pages_project();
    let picky = TransformFn::new(|item, _ctx| {
        if item["path"] == "home.tsx" {
            Err(anyhow!("cannot handle home"))
        } else {
            Ok(item)
        }
    });
    let component = ComponentConfig::new("routes").with_group(
        GroupConfig::files("views", FileMatchConfig::new("src/pages", ["*.tsx"])).with_transform(picky),
    );
    let mut generator = generator_for(&project, component).await?;

    match generator.data(&BuildContext::dev()).await {
        Err(AutoloadError::TransformError { group, index, message }) => {
            assert_eq!(group, "views");
            assert_eq!(index, 1);
            assert!(message.contains("cannot handle home"));
        }
        other => panic!("expected TransformError, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn skip_and_log_drops_failing_items() -> TestResult {
    let project = pages_project();
    let picky = TransformFn::new(|item, _ctx| {
        if item["path"] == "home.tsx" {
            Err(anyhow!("cannot handle home"))
        } else {
            Ok(item)
        }
    });
    let component = ComponentConfig::new("routes").with_group(
        GroupConfig::files("views", FileMatchConfig::new("src/pages", ["*.tsx"])).with_transform(picky),
    );
    let mut generator = CollectionGenerator::initialize(
        component,
        project.shared_fs(),
        &project.root(),
        TransformErrorPolicy::SkipAndLog,
    )
    .await?;

    let data = generator.data(&BuildContext::dev()).await?;

    assert_eq!(data["views"].as_array().map(Vec::len), Some(1));
    assert_eq!(data["views"][0]["path"], "about.tsx");
    Ok(())
}

#[tokio::test]
async fn code_exports_each_group_and_a_default() -> TestResult {
    let project = pages_project().with_file("src/blog/first.md", "");
    let component = routes_component().with_group(GroupConfig::files(
        "blog-posts",
        FileMatchConfig::new("src/blog", ["*.md"]),
    ));
    let mut generator = generator_for(&project, component).await?;

    let code = generator.code(&BuildContext::dev()).await?;

    assert!(code.contains("export const views = ["), "code:\n{code}");
    assert!(code.contains("export const blog_posts = ["), "code:\n{code}");
    assert!(code.contains("\"path\": \"about.tsx\""));
    assert!(code.ends_with("export default {\n  views,\n  \"blog-posts\": blog_posts,\n};\n"));

    let single = generator
        .code(&BuildContext::dev().with_name("views"))
        .await?;
    assert!(single.ends_with("export default views;\n"));
    assert!(!single.contains("blog_posts"));
    Ok(())
}

#[tokio::test]
async fn custom_template_is_used_for_its_group() -> TestResult {
    let project = pages_project();
    let component = ComponentConfig::new("routes").with_group(
        GroupConfig::files("views", FileMatchConfig::new("src/pages", ["*.tsx"]))
            .with_template("export const {key} = Object.freeze({{ data }});"),
    );
    let mut generator = generator_for(&project, component).await?;

    let code = generator.code(&BuildContext::dev()).await?;

    assert!(code.starts_with("export const views = Object.freeze(["), "code:\n{code}");
    Ok(())
}

#[tokio::test]
async fn deferred_import_metadata_renders_as_lazy_loader() -> TestResult {
    let project = pages_project();
    let mut meta = serde_json::Map::new();
    meta.insert(
        "layout".to_string(),
        serde_json::to_value(Metadata::deferred("./layouts/main.tsx", "MainLayout"))?,
    );
    meta.insert("section".to_string(), json!("docs"));
    let component = ComponentConfig::new("routes").with_group(GroupConfig::files(
        "views",
        FileMatchConfig::new("src/pages", ["home.tsx"]).with_data(meta),
    ));
    let mut generator = generator_for(&project, component).await?;

    let data = generator.data(&BuildContext::dev()).await?;
    assert_eq!(data["views"][0]["data"]["section"], "docs");
    assert_eq!(data["views"][0]["data"]["layout"]["kind"], "deferred_import");

    let code = generator.code(&BuildContext::dev()).await?;
    assert!(
        code.contains(
            "\"layout\": () => import(\"./layouts/main.tsx\").then((m) => m[\"MainLayout\"])"
        ),
        "code:\n{code}"
    );
    Ok(())
}

#[tokio::test]
async fn reloading_sources_invalidates_memoized_data() -> TestResult {
    let project = MockProject::new();
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    let component = ComponentConfig::new("site").with_group(GroupConfig::source(
        "build",
        DataSourceFn::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(json!({ "run": n }))
        }),
    ));
    let mut generator = generator_for(&project, component).await?;
    let ctx = BuildContext::dev();

    assert_eq!(generator.data(&ctx).await?["build"], json!([{ "run": 1 }]));

    generator.reload_sources().await?;

    assert_eq!(runs.load(Ordering::SeqCst), 2);
    assert_eq!(generator.data(&ctx).await?["build"], json!([{ "run": 2 }]));
    Ok(())
}

#[derive(Debug)]
struct KeysOnly;

impl autoload::generator::ContentGenerator for KeysOnly {
    fn generate(
        &self,
        data: &autoload::pipeline::GroupData,
        ctx: &BuildContext,
    ) -> autoload::errors::Result<String> {
        let keys: Vec<&str> = data.keys().map(String::as_str).collect();
        Ok(format!("// production={}\nexport const keys = {:?};\n", ctx.production, keys))
    }
}

#[tokio::test]
async fn content_generator_can_be_replaced() -> TestResult {
    let project = pages_project();
    let mut generator = generator_for(&project, routes_component())
        .await?
        .with_content_generator(Box::new(KeysOnly));

    let code = generator.code(&BuildContext::production()).await?;

    assert_eq!(code, "// production=true\nexport const keys = [\"views\"];\n");
    Ok(())
}

#[tokio::test]
async fn data_source_resolver_keeps_previous_data_when_a_producer_fails() -> TestResult {
    use autoload::resolve::DataSourceResolver;

    let fail = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let flag = Arc::clone(&fail);
    let groups = [
        GroupConfig::source("links", DataSourceFn::constant(json!(["/a"]))),
        GroupConfig::source(
            "flaky",
            DataSourceFn::new(move || {
                if flag.load(Ordering::SeqCst) {
                    Err(anyhow!("offline"))
                } else {
                    Ok(json!({ "ok": true }))
                }
            }),
        ),
        GroupConfig::files("views", FileMatchConfig::new("src/pages", ["*.tsx"])),
    ];
    let mut resolver = DataSourceResolver::new(&groups);

    resolver.initialize().await?;
    assert_eq!(resolver.version(), 2);
    let names: Vec<&str> = resolver.all_data().keys().map(String::as_str).collect();
    assert_eq!(names, ["flaky", "links"]);

    fail.store(true, Ordering::SeqCst);
    let err = resolver.initialize().await.expect_err("flaky producer fails");
    assert!(matches!(err, AutoloadError::ResolutionError { ref group, .. } if group == "flaky"));
    assert_eq!(resolver.version(), 2);
    assert_eq!(resolver.data("flaky"), Some(&json!({ "ok": true })));
    Ok(())
}

#[tokio::test]
async fn find_group_knows_component_and_group_names() -> TestResult {
    let project = pages_project();
    let generator = generator_for(&project, routes_component()).await?;

    assert!(generator.find_group("routes"));
    assert!(generator.find_group("views"));
    assert!(!generator.find_group("posts"));
    assert!(generator.has_file(&project.path("src/pages/home.tsx")));
    Ok(())
}
