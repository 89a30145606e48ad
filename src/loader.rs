//! Loads [`PostRecord`]s from the frontmatter of the markdown documents in a
//! posts directory. Only frontmatter is read; post bodies are left to
//! whatever renders the site.

use crate::post::PostRecord;
use serde::Deserialize;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;
use walkdir::WalkDir;

const FENCE: &str = "---";
const MARKDOWN_EXTENSION: &str = "md";
const BUNDLE_INDEX: &str = "index.md";
const BYTE_ORDER_MARK: char = '\u{feff}';

/// Reads [`PostRecord`]s from source files.
pub struct Loader<'a> {
    /// `posts_url` is the base URL for post pages. A record's `path` is
    /// `{posts_url}/{post_id}.html`.
    posts_url: &'a Url,
}

impl<'a> Loader<'a> {
    /// Constructs a new loader. See fields on [`Loader`] for argument
    /// descriptions.
    pub fn new(posts_url: &'a Url) -> Loader<'a> {
        Loader { posts_url }
    }

    /// Walks `source_directory` for markdown files (extension `.md`) and
    /// returns a record for each one that starts with YAML frontmatter, in
    /// file-name order. Files without frontmatter aren't posts and are
    /// skipped. A post file is structured as follows:
    ///
    /// ```md
    /// ---
    /// title: Hello, world!
    /// date: 2021-04-16
    /// type: frontend
    /// ---
    /// # Hello
    /// ```
    ///
    /// `Title`, `Date` and `category`/`Category` are accepted as key
    /// spellings too. A directory containing an `index.md` is a post bundle
    /// whose page is named after the directory; the bundle's other files,
    /// markdown included, belong to that post and aren't posts themselves.
    /// Two documents mapping onto the same page URL are an error.
    pub fn load(&self, source_directory: &Path) -> Result<Vec<PostRecord>> {
        let mut records: Vec<PostRecord> = Vec::new();
        let mut sources: HashMap<String, PathBuf> = HashMap::new();
        let walker =
            WalkDir::new(source_directory).sort_by(|a, b| a.file_name().cmp(b.file_name()));
        for result in walker {
            let entry = result?;
            if !entry.file_type().is_file()
                || entry.path().extension() != Some(OsStr::new(MARKDOWN_EXTENSION))
            {
                continue;
            }
            let relative_path = entry
                .path()
                .strip_prefix(source_directory)
                .map_err(|_| InvalidFileNameError(entry.path().to_owned()))?;
            if in_bundle(source_directory, relative_path) {
                debug!(path = %relative_path.display(), "bundle file, skipping");
                continue;
            }
            if let Some(record) = self.load_record(entry.path(), relative_path)? {
                if let Some(first) = sources.insert(record.path.clone(), relative_path.to_owned()) {
                    return Err(Error::DuplicatePath {
                        path: record.path,
                        first,
                        second: relative_path.to_owned(),
                    });
                }
                records.push(record);
            }
        }

        debug!(
            directory = %source_directory.display(),
            posts = records.len(),
            "loaded post records"
        );
        Ok(records)
    }

    fn load_record(&self, path: &Path, relative_path: &Path) -> Result<Option<PostRecord>> {
        match self._load_record(path, relative_path) {
            Ok(record) => Ok(record),
            Err(e) => Err(Error::Annotated(
                format!("loading post `{}`", relative_path.display()),
                Box::new(e),
            )),
        }
    }

    fn _load_record(&self, path: &Path, relative_path: &Path) -> Result<Option<PostRecord>> {
        use std::io::Read;
        let mut contents = String::new();
        File::open(path)?.read_to_string(&mut contents)?;

        let frontmatter = match frontmatter(&contents)? {
            Some(yaml) => yaml,
            None => {
                debug!(path = %relative_path.display(), "no frontmatter, skipping");
                return Ok(None);
            }
        };
        let frontmatter: Frontmatter = serde_yaml::from_str(frontmatter)?;

        Ok(Some(PostRecord {
            title: frontmatter.title,
            date: frontmatter.date,
            category: frontmatter.category,
            path: self.page_url(relative_path)?.to_string(),
        }))
    }

    /// Maps a source file's path relative to the posts directory onto its
    /// page URL: `foo/bar.md` becomes `{posts_url}/foo/bar.html` and the
    /// bundle `foo/index.md` becomes `{posts_url}/foo.html`. Segments are
    /// percent-encoded, so `#`, `?` and spaces in file names stay part of
    /// the path. `posts_url` is treated as a directory with or without a
    /// trailing slash.
    fn page_url(&self, relative_path: &Path) -> Result<Url> {
        let invalid = || InvalidFileNameError(relative_path.to_owned());
        let stem = match relative_path.parent() {
            Some(parent) if relative_path.ends_with(BUNDLE_INDEX) && parent != Path::new("") => {
                parent.to_owned()
            }
            _ => relative_path.with_extension(""),
        };

        let mut segments = Vec::new();
        for component in stem.components() {
            segments.push(component.as_os_str().to_str().ok_or_else(invalid)?);
        }
        let (file_name, directories) = segments.split_last().ok_or_else(invalid)?;

        let mut url = self.posts_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::CannotBeABase(self.posts_url.clone()))?
            .pop_if_empty()
            .extend(directories)
            .push(&format!("{}.html", file_name));
        Ok(url)
    }
}

/// Reports whether `relative_path` sits inside a post bundle other than the
/// one it is the `index.md` of.
fn in_bundle(source_directory: &Path, relative_path: &Path) -> bool {
    let own_bundle = if relative_path.ends_with(BUNDLE_INDEX) {
        relative_path.parent()
    } else {
        None
    };
    relative_path
        .ancestors()
        .skip(1)
        .filter(|dir| !dir.as_os_str().is_empty() && Some(*dir) != own_bundle)
        .any(|dir| source_directory.join(dir).join(BUNDLE_INDEX).is_file())
}

/// Returns the YAML between the opening and closing `---` fences, or `None`
/// if `input` doesn't open with a fence. A leading byte-order mark is
/// ignored.
fn frontmatter(input: &str) -> Result<Option<&str>> {
    let input = input.strip_prefix(BYTE_ORDER_MARK).unwrap_or(input);
    if !input.starts_with(FENCE) {
        return Ok(None);
    }
    let yaml_start = FENCE.len();
    match input[yaml_start..].find(&format!("\n{}", FENCE)) {
        None => Err(Error::FrontmatterMissingEndFence),
        // include the newline so the YAML ends on a line break
        Some(offset) => Ok(Some(&input[yaml_start..yaml_start + offset + 1])),
    }
}

#[derive(Deserialize, Clone)]
struct Frontmatter {
    /// The title of the post.
    #[serde(alias = "Title")]
    title: String,

    /// The date of the post.
    #[serde(alias = "Date")]
    date: String,

    /// The category of the post.
    #[serde(alias = "type", alias = "Category")]
    category: String,
}

#[derive(Debug)]
pub struct InvalidFileNameError(PathBuf);

impl fmt::Display for InvalidFileNameError {
    /// Displays an [`InvalidFileNameError`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid file name: {:?}", &self.0)
    }
}

impl std::error::Error for InvalidFileNameError {}

/// Represents the result of a [`PostRecord`]-load operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading [`PostRecord`]s.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post source file opens a frontmatter fence (`---`) but
    /// never closes it.
    FrontmatterMissingEndFence,

    /// Returned when there was an error parsing the frontmatter as YAML.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when there is a problem building a post's URL.
    UrlParse(url::ParseError),

    /// Returned for other I/O errors.
    Io(std::io::Error),

    /// Returned for WalkDir I/O errors.
    WalkDir(walkdir::Error),

    /// Returned when a source file name isn't valid UTF-8.
    InvalidFileName(InvalidFileNameError),

    /// Returned when `posts_url` can't have path segments (e.g. `mailto:`).
    CannotBeABase(Url),

    /// Returned when two source files map onto the same page URL, e.g.
    /// `foo.md` and `foo/index.md`.
    DuplicatePath {
        path: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontmatterMissingEndFence => {
                write!(f, "Missing closing `---`")
            }
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::UrlParse(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
            Error::InvalidFileName(err) => err.fmt(f),
            Error::CannotBeABase(url) => {
                write!(f, "posts URL `{}` can't have a path", url)
            }
            Error::DuplicatePath {
                path,
                first,
                second,
            } => write!(
                f,
                "`{}` and `{}` both map onto `{}`",
                first.display(),
                second.display(),
                path
            ),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FrontmatterMissingEndFence => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::UrlParse(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::InvalidFileName(err) => Some(err),
            Error::CannotBeABase(_) => None,
            Error::DuplicatePath { .. } => None,
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<InvalidFileNameError> for Error {
    fn from(err: InvalidFileNameError) -> Error {
        Error::InvalidFileName(err)
    }
}

impl From<url::ParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. It allows us to use
    /// the `?` operator for URL parsing and joining functions.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator while walking the posts directory.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
