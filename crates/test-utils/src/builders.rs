#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use autoload::config::{ComponentConfig, ConfigFile, FileMatchConfig, GroupConfig, Settings};
use autoload::fs::FileSystem;
use autoload::fs::mock::MockFileSystem;

/// Root used by every mock project.
pub const MOCK_ROOT: &str = "/project";

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    settings: Settings,
    components: Vec<ComponentConfig>,
}

impl ConfigFileBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let settings = Settings {
            root_dir: root.into(),
            ..Settings::default()
        };
        Self {
            settings,
            components: Vec::new(),
        }
    }

    pub fn with_component(mut self, component: ComponentConfig) -> Self {
        self.components.push(component);
        self
    }

    pub fn with_types(mut self, path: &str) -> Self {
        self.settings.export.types = Some(path.to_string());
        self
    }

    pub fn with_settings(mut self, edit: impl FnOnce(&mut Settings)) -> Self {
        edit(&mut self.settings);
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::new_unchecked(self.settings, self.components)
    }
}

/// A component with one file group.
pub fn files_component(component: &str, group: &str, directory: &str, pattern: &str) -> ComponentConfig {
    ComponentConfig::new(component).with_group(GroupConfig::files(
        group,
        FileMatchConfig::new(directory, [pattern]),
    ))
}

/// In-memory project rooted at [`MOCK_ROOT`].
#[derive(Debug, Clone, Default)]
pub struct MockProject {
    pub fs: MockFileSystem,
}

impl MockProject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> PathBuf {
        PathBuf::from(MOCK_ROOT)
    }

    /// Absolute path of a project-relative path.
    pub fn path(&self, rel: &str) -> PathBuf {
        Path::new(MOCK_ROOT).join(rel)
    }

    pub fn with_file(self, rel: &str, content: &str) -> Self {
        self.fs.add_file(self.path(rel), content);
        self
    }

    pub fn with_dir(self, rel: &str) -> Self {
        self.fs.add_dir(self.path(rel));
        self
    }

    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.path(rel);
        self.fs.add_file(&path, content);
        path
    }

    pub fn remove(&self, rel: &str) -> PathBuf {
        let path = self.path(rel);
        self.fs
            .remove_file(&path)
            .expect("mock file should exist before removal");
        path
    }

    pub fn remove_dir(&self, rel: &str) -> PathBuf {
        let path = self.path(rel);
        self.fs
            .remove_dir_all(&path)
            .expect("mock directory should exist before removal");
        path
    }

    pub fn read(&self, rel: &str) -> Option<String> {
        self.fs.read_to_string(&self.path(rel)).ok()
    }

    pub fn shared_fs(&self) -> Arc<dyn FileSystem> {
        Arc::new(self.fs.clone())
    }
}
