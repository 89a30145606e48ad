use crate::category::{Categories, Category};
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use url::Url;

/// The name of the project file [`Config::from_directory`] looks for.
pub const PROJECT_FILE: &str = "blognav.yaml";

#[derive(Deserialize)]
struct PostsDirectory(PathBuf);
impl Default for PostsDirectory {
    fn default() -> Self {
        PostsDirectory(PathBuf::from("posts"))
    }
}

#[derive(Deserialize)]
struct Project {
    pub posts_url: Url,

    #[serde(default)]
    pub posts_directory: PostsDirectory,

    #[serde(default)]
    pub categories: Vec<Category>,
}

pub struct Config {
    /// The base URL post page paths are built from.
    pub posts_url: Url,

    /// Where the post sources live.
    pub posts_source_directory: PathBuf,

    /// The known categories. Records in any other category are rejected.
    pub categories: Categories,
}

impl Config {
    /// Finds `blognav.yaml` in `dir` or the nearest parent directory that has
    /// one and loads it.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let dir = dir
            .canonicalize()
            .with_context(|| format!("Resolving project directory `{}`", dir.display()))?;
        for ancestor in dir.ancestors() {
            let path = ancestor.join(PROJECT_FILE);
            if path.exists() {
                return Config::from_project_file(&path)
                    .with_context(|| format!("Loading configuration `{}`", path.display()));
            }
        }
        Err(anyhow!(
            "Could not find `{}` in `{}` or any parent directory",
            PROJECT_FILE,
            dir.display()
        ))
    }

    pub fn from_project_file(path: &Path) -> Result<Config> {
        let file = File::open(path)
            .with_context(|| format!("Opening project file `{}`", path.display()))?;
        let project: Project = serde_yaml::from_reader(file)?;
        match path.parent() {
            None => Err(anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )),
            Some(project_root) => Config::from_project(project, project_root),
        }
    }

    /// Parses a project file's contents. Relative paths resolve against
    /// `project_root`.
    pub fn from_yaml(yaml: &str, project_root: &Path) -> Result<Config> {
        Config::from_project(serde_yaml::from_str(yaml)?, project_root)
    }

    fn from_project(project: Project, project_root: &Path) -> Result<Config> {
        let categories = if project.categories.is_empty() {
            Categories::default()
        } else {
            Categories::new(project.categories)?
        };
        Ok(Config {
            posts_url: project.posts_url,
            posts_source_directory: project_root.join(project.posts_directory.0),
            categories,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_directory_searches_parents() -> Result<()> {
        let config = Config::from_directory(Path::new("./testdata/project/nested/deeper"))?;
        assert_eq!(config.posts_url.as_str(), "https://example.org/posts/");
        assert!(config
            .posts_source_directory
            .ends_with("testdata/project/posts"));

        let names: Vec<&str> = config.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["tech", "game"]);
        assert_eq!(config.categories.resolve("game")?.label, "game");
        Ok(())
    }

    #[test]
    fn test_defaults() -> Result<()> {
        let config = Config::from_yaml("posts_url: https://example.org/blog/\n", Path::new("/site"))?;
        assert_eq!(config.posts_source_directory, PathBuf::from("/site/posts"));
        assert_eq!(config.categories, Categories::default());
        Ok(())
    }

    #[test]
    fn test_posts_directory_override() -> Result<()> {
        let yaml = "posts_url: https://example.org/\nposts_directory: content/blog\n";
        let config = Config::from_yaml(yaml, Path::new("/site"))?;
        assert_eq!(
            config.posts_source_directory,
            PathBuf::from("/site/content/blog")
        );
        Ok(())
    }

    #[test]
    fn test_duplicate_categories() {
        let yaml = "posts_url: https://example.org/\ncategories:\n  - name: tech\n  - name: tech\n";
        let err = Config::from_yaml(yaml, Path::new("/site")).err().unwrap();
        assert!(err.to_string().contains("`tech`"));
    }

    #[test]
    fn test_missing_posts_url() {
        assert!(Config::from_yaml("categories: []\n", Path::new("/site")).is_err());
    }
}
