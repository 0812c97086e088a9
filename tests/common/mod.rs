#![allow(dead_code)]

use autoload::config::{ComponentConfig, FileMatchConfig, GroupConfig};

pub use autoload_test_utils::builders::{ConfigFileBuilder, MockProject, files_component};
pub use autoload_test_utils::init_tracing;
pub use autoload_test_utils::recording::{RecordingHost, RecordingSink};
pub use autoload_test_utils::with_timeout;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// `src/pages` with `home.tsx` and `about.tsx`.
pub fn pages_project() -> MockProject {
    MockProject::new()
        .with_file("src/pages/home.tsx", "export default function Home() {}")
        .with_file("src/pages/about.tsx", "export default function About() {}")
}

/// Group `views` over `src/pages/**/*.tsx`.
pub fn views_group() -> GroupConfig {
    GroupConfig::files("views", FileMatchConfig::new("src/pages", ["**/*.tsx"]))
}

/// Component `routes` with the `views` group.
pub fn routes_component() -> ComponentConfig {
    ComponentConfig::new("routes").with_group(views_group())
}
