use crate::config::IconConfig;
use crate::icon::{IconRegistration, IconSource};
use std::collections::HashSet;
use std::fs::DirEntry;
use std::path::{Path, PathBuf};

/// Name of the directory looked for under each XDG data directory.
pub const DATA_SUBDIRECTORY: &str = "svg-icons";

/// Directories holding SVG icons laid out as `<dir>/<name>.svg` or `<dir>/<variant>/<name>.svg`.
///
/// By default, that is `$HOME/.local/share/svg-icons` followed by `svg-icons` in each of
/// `$XDG_DATA_DIRS`. Directories are searched in order, and the first one to provide a given
/// `(name, variant)` wins.
///
/// # Example
///
/// ```
/// use icon_registry::{FileTransport, IconRegistry, SearchDirectories};
///
/// let dirs = SearchDirectories::default().append(["/opt/app/icons"]);
/// let manifest = dirs.find_icon_locations().into_config(Some("outlined"));
/// let icons = IconRegistry::with_configs(FileTransport::new(), [&manifest]).unwrap();
/// assert_eq!(icons.default_variant().as_deref(), Some("outlined"));
/// ```
#[derive(Debug, Clone)]
pub struct SearchDirectories {
    pub dirs: Vec<PathBuf>,
}

impl SearchDirectories {
    pub fn default() -> Self {
        <Self as Default>::default()
    }

    /// Add a list of directories to this `SearchDirectories`, after the existing ones.
    pub fn append<I, P>(mut self, directories: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.dirs.extend(directories.into_iter().map(Into::into));
        self
    }

    pub fn find_icon_locations(&self) -> IconLocations {
        let mut seen = HashSet::new();
        let mut icons = Vec::new();

        for base_dir in &self.dirs {
            let (files, variant_dirs) = sorted_entries(base_dir);

            // top-level icons have no variant
            let top_level = files.iter().filter_map(|entry| IconFile::from_path(&entry.path(), None));

            let variants = variant_dirs.iter().flat_map(|dir| {
                let variant = dir.file_name().to_string_lossy().into_owned();
                let (files, _) = sorted_entries(&dir.path());

                files
                    .into_iter()
                    .filter_map(move |entry| IconFile::from_path(&entry.path(), Some(variant.as_str())))
                    .collect::<Vec<_>>()
            });

            for icon in top_level.chain(variants) {
                if seen.insert((icon.name.clone(), icon.variant.clone())) {
                    icons.push(icon);
                } else {
                    #[cfg(feature = "log")]
                    log::debug!("skipping {:?}: already provided by an earlier directory", icon.path);
                }
            }
        }

        IconLocations { icons }
    }
}

/// Lists a directory's files and subdirectories, each sorted by name.
/// Unreadable directories and entries are skipped.
fn sorted_entries(dir: &Path) -> (Vec<DirEntry>, Vec<DirEntry>) {
    let mut entries: Vec<_> = dir
        .read_dir()
        .into_iter()
        .flatten() // unreadable directory -> no entries
        .flatten() // remove Err entries
        .filter_map(|entry| Some((entry.file_type().ok()?, entry)))
        .collect();
    entries.sort_by_key(|(_, entry)| entry.file_name());

    let (files, dirs): (Vec<_>, Vec<_>) = entries.into_iter().partition(|(ft, _)| ft.is_file());
    let dirs = dirs.into_iter().filter(|(ft, _)| ft.is_dir());

    (
        files.into_iter().map(|(_, entry)| entry).collect(),
        dirs.map(|(_, entry)| entry).collect(),
    )
}

/// An SVG file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconFile {
    pub name: String,
    pub variant: Option<String>,
    pub path: PathBuf,
}

impl IconFile {
    /// Returns `None` unless `path` has an `svg` extension (any case) and a UTF-8 file stem.
    pub fn from_path(path: &Path, variant: Option<&str>) -> Option<IconFile> {
        let ext = path.extension()?.to_str()?;
        if !ext.eq_ignore_ascii_case("svg") {
            return None;
        }

        let name = path.file_stem()?.to_str()?.trim();
        if name.is_empty() {
            return None;
        }

        Some(IconFile {
            name: name.to_owned(),
            variant: variant.map(str::to_owned),
            path: path.to_owned(),
        })
    }

    /// A registration loading this file through [crate::FileTransport].
    pub fn registration(&self) -> IconRegistration {
        IconRegistration {
            name: self.name.clone(),
            source: IconSource::url(self.path.to_string_lossy()),
            variant: self.variant.clone(),
            aliases: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IconLocations {
    pub icons: Vec<IconFile>,
}

impl IconLocations {
    pub fn find(&self, name: &str, variant: Option<&str>) -> Option<&IconFile> {
        self.icons
            .iter()
            .find(|icon| icon.name == name && icon.variant.as_deref() == variant)
    }

    pub fn registrations(&self) -> Vec<IconRegistration> {
        self.icons.iter().map(IconFile::registration).collect()
    }

    /// A config registering every icon found, with `default_variant` if given.
    pub fn into_config(self, default_variant: Option<&str>) -> IconConfig {
        IconConfig {
            default_variant: default_variant.map(str::to_owned),
            icons: self.registrations(),
            ..IconConfig::default()
        }
    }
}

/// Anything that turns into an iterator of things that can become paths, can be turned into a `SearchDirectories`.
impl<I, P> From<I> for SearchDirectories
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    fn from(value: I) -> Self {
        let dirs = value.into_iter().map(Into::into).collect();

        SearchDirectories { dirs }
    }
}

impl Default for SearchDirectories {
    fn default() -> Self {
        let xdg = xdg::BaseDirectories::new();

        let mut directories = vec![];

        if let Some(home) = std::env::home_dir() {
            directories.push(home.join(".local/share").join(DATA_SUBDIRECTORY));
        }

        xdg.data_dirs
            .into_iter()
            .map(|data_dir| data_dir.join(DATA_SUBDIRECTORY))
            .for_each(|dir| directories.push(dir));

        directories.into()
    }
}
