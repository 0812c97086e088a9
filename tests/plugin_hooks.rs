// tests/plugin_hooks.rs

mod common;

use std::sync::Arc;

use autoload::artifacts::manifest::ManifestConfig;
use autoload::config::model::SitemapSettings;
use autoload::config::{ComponentConfig, FileMatchConfig, GroupConfig, SitemapStrategy, Strategy};
use autoload::engine::Orchestrator;
use autoload::host::plugin::HOT_ACCEPT_SNIPPET;
use autoload::host::{AutoloadPlugin, EmittedAsset};
use autoload::pipeline::builtins::route_transform;
use common::{ConfigFileBuilder, MockProject, RecordingHost, RecordingSink, TestResult, init_tracing, pages_project};

const MAIN: &str = "/project/src/main.ts";
const MAIN_SOURCE: &str = "import routes from \"virtual:routes\";\nimport { render } from \"./render\";\n\nrender(routes);\n";

fn routes_component() -> ComponentConfig {
    ComponentConfig::new("routes")
        .with_strategy(Strategy {
            sitemap: Some(SitemapStrategy {
                property: "route".to_string(),
            }),
            ..Strategy::default()
        })
        .with_group(
            GroupConfig::files("views", FileMatchConfig::new("src/pages", ["*.tsx"]))
                .with_transform(route_transform()),
        )
}

async fn plugin_for(
    project: &MockProject,
    builder: ConfigFileBuilder,
) -> Result<(AutoloadPlugin, RecordingSink), Box<dyn std::error::Error>> {
    init_tracing();
    let sink = RecordingSink::new();
    let mut orch = Orchestrator::new(
        builder.with_component(routes_component()).build(),
        project.shared_fs(),
        Arc::new(sink.clone()),
    )
    .await?;
    orch.init().await?;
    Ok((AutoloadPlugin::new(orch), sink))
}

#[tokio::test]
async fn resolve_id_prefixes_known_virtual_ids_only() -> TestResult {
    let project = pages_project();
    let (plugin, _) = plugin_for(&project, ConfigFileBuilder::new(project.root())).await?;

    assert_eq!(
        plugin.resolve_id("virtual:views").await.as_deref(),
        Some("\0virtual:views")
    );
    assert_eq!(
        plugin.resolve_id("virtual:routes").await.as_deref(),
        Some("\0virtual:routes")
    );
    assert!(plugin.resolve_id("virtual:unknown").await.is_none());
    assert!(plugin.resolve_id("./routes").await.is_none());
    Ok(())
}

#[tokio::test]
async fn load_renders_component_and_group_modules() -> TestResult {
    let project = pages_project();
    let (plugin, _) = plugin_for(&project, ConfigFileBuilder::new(project.root())).await?;

    let group = plugin
        .load("\0virtual:views", false)
        .await?
        .ok_or("views did not load")?;
    assert!(group.contains("export const views = ["));
    assert!(group.contains("\"route\": \"/home\""));
    assert!(group.ends_with("export default views;\n"));

    let component = plugin
        .load("\0virtual:routes", true)
        .await?
        .ok_or("routes did not load")?;
    assert!(component.contains("export const views = ["));
    assert!(component.contains(".js\""), "production uris are digests");

    assert!(plugin.load("virtual:views", false).await?.is_none());
    assert!(plugin.load("\0virtual:nope", false).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn transform_records_imports_and_appends_hot_accept() -> TestResult {
    let project = pages_project();
    let (plugin, _) = plugin_for(&project, ConfigFileBuilder::new(project.root())).await?;
    let host = RecordingHost::new();

    let out = plugin
        .transform_importer(MAIN_SOURCE, MAIN, &host)
        .await
        .ok_or("main.ts should be transformed")?;

    assert!(out.starts_with(MAIN_SOURCE));
    assert!(out.ends_with(HOT_ACCEPT_SNIPPET));
    let imports: Vec<String> = plugin.imports_of(MAIN).await.into_iter().collect();
    assert_eq!(imports, ["virtual:routes"]);

    let mut watched = host.watched();
    watched.sort();
    assert_eq!(
        watched,
        [
            project.path("src/pages/about.tsx"),
            project.path("src/pages/home.tsx")
        ]
    );

    let again = plugin
        .transform_importer(&out, MAIN, &host)
        .await
        .ok_or("still imports a synthetic module")?;
    assert_eq!(again.matches(HOT_ACCEPT_SNIPPET).count(), 1);
    Ok(())
}

#[tokio::test]
async fn transform_skips_unrelated_modules() -> TestResult {
    let project = pages_project();
    let (plugin, _) = plugin_for(&project, ConfigFileBuilder::new(project.root())).await?;
    let host = RecordingHost::new();

    assert!(
        plugin
            .transform_importer("import x from \"./x\";", MAIN, &host)
            .await
            .is_none()
    );
    assert!(
        plugin
            .transform_importer(MAIN_SOURCE, "\0virtual:routes", &host)
            .await
            .is_none()
    );
    assert!(
        plugin
            .transform_importer(MAIN_SOURCE, "/project/src/style.css", &host)
            .await
            .is_none()
    );
    assert!(host.watched().is_empty());
    Ok(())
}

#[tokio::test]
async fn hot_update_invalidates_and_notifies_importers_of_the_file_module() -> TestResult {
    let project = pages_project();
    let (plugin, sink) = plugin_for(&project, ConfigFileBuilder::new(project.root())).await?;
    let host = RecordingHost::new();
    plugin
        .transform_importer("import { views } from 'virtual:views';\n", MAIN, &host)
        .await;

    let affected = plugin
        .handle_hot_update(&project.path("src/pages/home.tsx"))
        .await;

    assert_eq!(affected, [MAIN]);
    assert_eq!(sink.invalidations(), vec![vec![MAIN.to_string()]]);
    let notifications = sink.notifications();
    assert_eq!(notifications.len(), 1, "clients are told to reload");
    assert_eq!(notifications[0].modules, [MAIN]);

    let untracked = plugin.handle_hot_update(&project.path("README.md")).await;
    assert!(untracked.is_empty());
    assert_eq!(sink.notifications().len(), 1);
    Ok(())
}

#[tokio::test]
async fn build_start_emits_chunks_modules_and_types() -> TestResult {
    let project = pages_project();
    let builder = ConfigFileBuilder::new(project.root()).with_types("src/autogen.d.ts");
    let (plugin, _) = plugin_for(&project, builder).await?;
    let host = RecordingHost::new();

    let summary = plugin.build_start(&host).await?;

    assert_eq!(summary.chunks, 2);
    assert_eq!(summary.modules, 2);
    let emitted = host.emitted();
    let chunks: Vec<&EmittedAsset> = emitted
        .iter()
        .filter(|a| matches!(a, EmittedAsset::Chunk { .. }))
        .collect();
    for chunk in &chunks {
        let name = chunk.file_name();
        assert!(!name.starts_with('/'));
        assert!(name.ends_with(".js"));
        assert_eq!(name.len(), 32 + ".js".len());
    }
    assert!(host.asset_source("virtual/routes.js").is_some());
    let views = host.asset_source("virtual/views.js").ok_or("views module missing")?;
    assert!(views.ends_with("export default views;\n"));
    Ok(())
}

#[tokio::test]
async fn close_bundle_writes_sitemap_and_manifest() -> TestResult {
    let project = pages_project();
    let builder = ConfigFileBuilder::new(project.root()).with_settings(|s| {
        s.sitemap = Some(SitemapSettings {
            output: "sitemap.xml".to_string(),
            base_url: "https://example.com/".to_string(),
            exclude: vec!["/about".to_string()],
        });
        s.manifest = Some(ManifestConfig {
            name: Some("Example".to_string()),
            ..ManifestConfig::default()
        });
    });
    let (plugin, _) = plugin_for(&project, builder).await?;
    let host = RecordingHost::new();

    plugin.close_bundle(&host).await?;

    let sitemap = host.asset_source("sitemap.xml").ok_or("no sitemap")?;
    assert!(sitemap.contains("<loc>https://example.com/home</loc>"), "{sitemap}");
    assert!(!sitemap.contains("/about"));
    assert!(sitemap.contains("<priority>0.8</priority>"));

    let manifest = host
        .asset_source("manifest.webmanifest")
        .ok_or("no manifest")?;
    let doc: serde_json::Value = serde_json::from_str(&manifest)?;
    assert_eq!(doc["name"], "Example");
    assert_eq!(doc["display"], "standalone");
    assert!(doc.get("output").is_none());
    Ok(())
}

#[tokio::test]
async fn index_html_gets_manifest_link_when_configured() -> TestResult {
    let project = pages_project();
    let html = "<html><head><title>x</title></head><body></body></html>";

    let (without, _) = plugin_for(&project, ConfigFileBuilder::new(project.root())).await?;
    assert_eq!(without.transform_index_html(html).await, html);

    let builder = ConfigFileBuilder::new(project.root())
        .with_settings(|s| s.manifest = Some(ManifestConfig::default()));
    let (with, _) = plugin_for(&project, builder).await?;
    let out = with.transform_index_html(html).await;
    assert!(out.contains("<link rel=\"manifest\" href=\"/manifest.webmanifest\">\n</head>"));
    Ok(())
}

#[tokio::test]
async fn file_changes_run_a_cycle_through_the_plugin() -> TestResult {
    let project = pages_project();
    let (plugin, sink) = plugin_for(&project, ConfigFileBuilder::new(project.root())).await?;

    let contact = project.write("src/pages/contact.tsx", "");
    let report = plugin.on_files_changed(&[contact]).await;

    assert!(report.changed.contains("virtual:views"));
    assert_eq!(sink.notifications().len(), 1);
    let code = plugin
        .load("\0virtual:views", false)
        .await?
        .ok_or("views did not load")?;
    assert!(code.contains("\"route\": \"/contact\""));
    Ok(())
}

#[test]
fn fs_host_writes_chunks_and_assets_under_out_dir() -> TestResult {
    use autoload::fs::{FileSystem, RealFileSystem};
    use autoload::host::{FsHost, HostAdapter};

    let dir = tempfile::tempdir()?;
    let source = dir.path().join("home.tsx");
    std::fs::write(&source, "export default 1;\n")?;
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let host = FsHost::new(dir.path().join("dist"), fs);

    host.emit_asset(EmittedAsset::Chunk {
        source: source.clone(),
        file_name: "abc.js".to_string(),
    })?;
    host.emit_asset(EmittedAsset::Asset {
        file_name: "virtual/routes.js".to_string(),
        source: "export default {};\n".to_string(),
    })?;
    host.watch_file(&source);
    host.watch_file(&source);

    let out = host.out_dir();
    assert_eq!(std::fs::read_to_string(out.join("abc.js"))?, "export default 1;\n");
    assert_eq!(
        std::fs::read_to_string(out.join("virtual/routes.js"))?,
        "export default {};\n"
    );
    assert_eq!(host.watched(), [source]);

    let missing = host.emit_asset(EmittedAsset::Chunk {
        source: dir.path().join("gone.tsx"),
        file_name: "gone.js".to_string(),
    });
    assert!(missing.is_err());
    Ok(())
}
