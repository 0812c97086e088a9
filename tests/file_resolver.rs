// tests/file_resolver.rs

mod common;

use autoload::config::{FileMatchConfig, GroupConfig};
use autoload::errors::AutoloadError;
use autoload::resolve::FileResolver;
use common::{TestResult, init_tracing, pages_project, views_group};

fn sorted_paths(resolver: &FileResolver, group: &str) -> Vec<String> {
    let mut paths: Vec<String> = resolver
        .group_files(group)
        .unwrap_or_default()
        .into_iter()
        .map(|f| f.path)
        .collect();
    paths.sort();
    paths
}

#[test]
fn initial_scan_then_added_file_is_picked_up() -> TestResult {
    init_tracing();
    let project = pages_project();
    let mut resolver = FileResolver::new(project.shared_fs(), &project.root(), &[views_group()])?;
    resolver.initialize()?;

    assert_eq!(sorted_paths(&resolver, "views"), ["about.tsx", "home.tsx"]);

    let contact = project.write("src/pages/contact.tsx", "export default 1;");
    let accepted = resolver.add_file(&contact);

    assert_eq!(accepted, ["views"]);
    assert!(resolver.has_file(&contact));
    assert_eq!(
        sorted_paths(&resolver, "views"),
        ["about.tsx", "contact.tsx", "home.tsx"]
    );
    Ok(())
}

#[test]
fn resolved_file_carries_uri_and_absolute_path() -> TestResult {
    let project = pages_project();
    let mut resolver = FileResolver::new(project.shared_fs(), &project.root(), &[views_group()])?;
    resolver.initialize()?;

    let files = resolver.group_files("views").unwrap_or_default();
    let home = files
        .iter()
        .find(|f| f.path == "home.tsx")
        .ok_or("home.tsx not resolved")?;
    assert_eq!(home.uri, "src/pages/home.tsx");
    assert_eq!(home.file, project.path("src/pages/home.tsx"));
    Ok(())
}

#[test]
fn add_then_remove_restores_previous_state() -> TestResult {
    let project = pages_project();
    let mut resolver = FileResolver::new(project.shared_fs(), &project.root(), &[views_group()])?;
    resolver.initialize()?;
    let before = sorted_paths(&resolver, "views");
    let version_before = resolver.versions()["views"];

    let draft = project.write("src/pages/draft.tsx", "");
    resolver.add_file(&draft);
    let removed = resolver.remove_file(&draft);

    assert_eq!(removed, ["views"]);
    assert!(!resolver.has_file(&draft));
    assert_eq!(sorted_paths(&resolver, "views"), before);
    assert!(resolver.versions()["views"] > version_before);
    Ok(())
}

#[test]
fn non_matching_and_ignored_files_are_rejected() -> TestResult {
    let project = pages_project();
    let mut resolver = FileResolver::new(project.shared_fs(), &project.root(), &[views_group()])?;
    resolver.initialize()?;

    let notes = project.write("src/pages/notes.md", "# notes");
    let hidden = project.write("src/pages/.draft.tsx", "");
    let outside = project.write("src/other/page.tsx", "");

    assert!(resolver.add_file(&notes).is_empty());
    assert!(resolver.add_file(&hidden).is_empty());
    assert!(resolver.add_file(&outside).is_empty());
    assert!(resolver.remove_file(&outside).is_empty());
    assert_eq!(resolver.file_count(), 2);
    Ok(())
}

#[test]
fn single_star_does_not_cross_directories() -> TestResult {
    let project = pages_project().with_file("src/pages/blog/post.tsx", "");
    let group = GroupConfig::files("top", FileMatchConfig::new("src/pages", ["*.tsx"]));
    let mut resolver = FileResolver::new(project.shared_fs(), &project.root(), &[group])?;
    resolver.initialize()?;

    assert_eq!(sorted_paths(&resolver, "top"), ["about.tsx", "home.tsx"]);
    Ok(())
}

#[test]
fn ignore_patterns_exclude_matches() -> TestResult {
    let project = pages_project().with_file("src/pages/home.test.tsx", "");
    let group = GroupConfig::files(
        "views",
        FileMatchConfig::new("src/pages", ["**/*.tsx"]).with_ignore(["**/*.test.tsx"]),
    );
    let mut resolver = FileResolver::new(project.shared_fs(), &project.root(), &[group])?;
    resolver.initialize()?;

    assert_eq!(sorted_paths(&resolver, "views"), ["about.tsx", "home.tsx"]);
    Ok(())
}

#[test]
fn a_file_can_belong_to_several_groups() -> TestResult {
    let project = pages_project().with_dir("src/pages/blog");
    let groups = [
        GroupConfig::files("all", FileMatchConfig::new("src/pages", ["**/*.tsx"])),
        GroupConfig::files("blog", FileMatchConfig::new("src/pages/blog", ["*.tsx"])),
    ];
    let mut resolver = FileResolver::new(project.shared_fs(), &project.root(), &groups)?;
    resolver.initialize()?;

    let post = project.write("src/pages/blog/post.tsx", "");
    let mut accepted = resolver.add_file(&post);
    accepted.sort();

    assert_eq!(accepted, ["all", "blog"]);
    assert_eq!(sorted_paths(&resolver, "blog"), ["post.tsx"]);
    assert!(sorted_paths(&resolver, "all").contains(&"blog/post.tsx".to_string()));
    Ok(())
}

#[test]
fn missing_directory_is_a_resolution_error() -> TestResult {
    let project = pages_project();
    let group = GroupConfig::files("docs", FileMatchConfig::new("src/docs", ["**/*.md"]));
    let mut resolver = FileResolver::new(project.shared_fs(), &project.root(), &[group])?;

    match resolver.initialize() {
        Err(AutoloadError::ResolutionError { group, message }) => {
            assert_eq!(group, "docs");
            assert!(message.contains("does not exist"), "message: {message}");
        }
        other => panic!("expected ResolutionError, got {other:?}"),
    }
    Ok(())
}

#[test]
fn invalid_glob_is_a_config_error() {
    let project = pages_project();
    let group = GroupConfig::files("bad", FileMatchConfig::new("src/pages", ["[unclosed"]));

    let result = FileResolver::new(project.shared_fs(), &project.root(), &[group]);

    assert!(matches!(result, Err(AutoloadError::ConfigError(_))));
}
