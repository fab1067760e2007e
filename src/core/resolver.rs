use std::path::{Component, Path, PathBuf};

/// Maps source files to dotted module names relative to a project root
#[derive(Debug, Clone)]
pub struct ModuleResolver {
    root: PathBuf,
    package_init: String,
}

impl ModuleResolver {
    pub fn new<P: AsRef<Path>>(root: P, package_init: &str) -> Self {
        Self {
            root: absolutize(root.as_ref()),
            package_init: package_init.to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Dotted module name of `file`.
    ///
    /// Files outside the root resolve against their own directory, so only
    /// the bare stem remains. A package initializer takes the name of its
    /// directory.
    pub fn resolve<P: AsRef<Path>>(&self, file: P) -> String {
        let absolute = absolutize(file.as_ref());
        let relative = match absolute.strip_prefix(&self.root) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => absolute
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_default(),
        };

        let directories: Vec<String> = relative
            .parent()
            .map(|parent| {
                parent
                    .components()
                    .filter_map(|component| match component {
                        Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let stem = relative
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        if stem == self.package_init {
            directories.join(".")
        } else if directories.is_empty() {
            stem
        } else {
            format!("{}.{}", directories.join("."), stem)
        }
    }

    /// Path of `file` relative to the root, or its base name when it lies outside
    pub fn relative_path<P: AsRef<Path>>(&self, file: P) -> String {
        let absolute = absolutize(file.as_ref());
        match absolute.strip_prefix(&self.root) {
            Ok(relative) => relative.to_string_lossy().into_owned(),
            Err(_) => file
                .as_ref()
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }
}

/// Absolute, lexically normalized form of `path`. Symlinks are not resolved.
pub fn absolutize(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
