use std::path::{Path, PathBuf};
use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;
use tracing::{debug, info, warn};

use crate::config::{Config, WalkConfig};
use crate::error::{PymetaError, Result};
use super::languages::{LanguageExtractor, PythonExtractor};
use super::model::{FileLocation, FileRecord, Metadata, ModuleGroups, ProjectRecord};
use super::resolver::{absolutize, ModuleResolver};

/// Drives extraction over a single file or a whole directory tree
pub struct ProjectAnalyzer {
    resolver: ModuleResolver,
    extractor: Box<dyn LanguageExtractor>,
    walk: WalkConfig,
    max_file_size: usize,
}

impl ProjectAnalyzer {
    pub fn new<P: AsRef<Path>>(config: &Config, root: P) -> Result<Self> {
        let extractor = PythonExtractor::new(&config.extraction)?;

        Ok(Self {
            resolver: ModuleResolver::new(root, &config.extraction.package_init),
            extractor: Box::new(extractor),
            walk: config.walk.clone(),
            max_file_size: config.extraction.max_file_size,
        })
    }

    pub fn resolver(&self) -> &ModuleResolver {
        &self.resolver
    }

    /// A source file yields its record directly; a directory yields every
    /// source file below it, grouped by module
    pub fn analyze<P: AsRef<Path>>(&mut self, path: P) -> Result<Metadata> {
        let path = path.as_ref();

        if path.is_file() && self.is_source_file(path) {
            Ok(Metadata::File(self.analyze_file(path)))
        } else if path.is_dir() {
            Ok(Metadata::Project(self.analyze_directory(path)?))
        } else {
            Err(PymetaError::InvalidInput(path.to_path_buf()))
        }
    }

    /// Extract one file. Failures degrade to a record without declarations.
    pub fn analyze_file<P: AsRef<Path>>(&mut self, file_path: P) -> FileRecord {
        self.process_file(file_path.as_ref()).0
    }

    /// The file's record, and whether it was read and parsed successfully
    fn process_file(&mut self, path: &Path) -> (FileRecord, bool) {
        let location = FileLocation {
            path: self.resolver.relative_path(path),
            module: self.resolver.resolve(path),
        };

        match self.extract_file(path, location.clone()) {
            Ok(record) => (record, true),
            Err(e) => {
                warn!("Error processing file {}: {}", path.display(), e);
                (FileRecord::empty(location), false)
            }
        }
    }

    fn extract_file(&mut self, path: &Path, location: FileLocation) -> Result<FileRecord> {
        let metadata = std::fs::metadata(path)?;
        if metadata.len() > self.max_file_size as u64 {
            return Err(PymetaError::FileTooLarge {
                path: path.to_path_buf(),
                limit: self.max_file_size,
            });
        }

        let source = String::from_utf8(std::fs::read(path)?)?;
        self.extractor.extract(&source, location)
    }

    /// Extract every source file below `dir` and bucket the records by module
    pub fn analyze_directory<P: AsRef<Path>>(&mut self, dir: P) -> Result<ProjectRecord> {
        let dir = dir.as_ref();
        let files = self.discover(dir)?;
        debug!(
            "Discovered {} {} files under {}",
            files.len(),
            self.extractor.language_name(),
            dir.display()
        );

        let mut groups = ModuleGroups::new();
        let mut failed = 0;
        for file in &files {
            let (record, parsed) = self.process_file(file);
            if !parsed {
                failed += 1;
            }
            groups.insert(record);
        }

        if groups.is_empty() {
            warn!("No {} files found under {}", self.extractor.language_name(), dir.display());
        }
        for module in groups.modules() {
            if let Some(bucket) = groups.get(module) {
                debug!("Module {}: {} files", module, bucket.len());
            }
        }

        info!(
            "Analyzed {} files in {} modules ({} failed)",
            files.len(),
            groups.len(),
            failed
        );

        let name = absolutize(dir)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string());

        Ok(ProjectRecord {
            name,
            files: groups.into_files(),
        })
    }

    /// Source files below `dir`, sorted by file name at every level
    fn discover(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut overrides = OverrideBuilder::new(dir);
        for pattern in &self.walk.exclude {
            overrides
                .add(&format!("!{}", pattern))
                .map_err(|e| PymetaError::Config(format!("invalid exclude pattern {}: {}", pattern, e)))?;
        }
        let overrides = overrides
            .build()
            .map_err(|e| PymetaError::Config(e.to_string()))?;

        let walker = WalkBuilder::new(dir)
            .standard_filters(self.walk.respect_ignore_files)
            .hidden(!self.walk.include_hidden)
            .follow_links(self.walk.follow_links)
            .overrides(overrides)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            let path = entry.path();
            if entry.file_type().is_some_and(|t| t.is_file()) && self.is_source_file(path) {
                files.push(path.to_path_buf());
            }
        }

        Ok(files)
    }

    fn is_source_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extractor.file_extensions().contains(&ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, relative: &str, content: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn analyzer(root: &Path) -> ProjectAnalyzer {
        ProjectAnalyzer::new(&Config::default(), root).unwrap()
    }

    #[test]
    fn test_single_file_returns_bare_record() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "app/util.py", "def f(x): return 1\n");

        match analyzer(dir.path()).analyze(&file).unwrap() {
            Metadata::File(record) => {
                assert_eq!(record.module, "app.util");
                assert_eq!(record.path, Path::new("app").join("util.py").to_string_lossy());
                assert_eq!(record.functions[0].name, "f");
            }
            other => panic!("expected a file record, got {:?}", other),
        }
    }

    #[test]
    fn test_directory_walk_is_sorted_and_named() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("shop");
        write(&project, "zeta.py", "def z():\n    pass\n");
        write(&project, "alpha.py", "def a():\n    pass\n");
        write(&project, "orders/__init__.py", "");
        write(&project, "orders/models.py", "class Order:\n    id: int\n");
        write(&project, "README.md", "# not python\n");

        let record = analyzer(&project).analyze_directory(&project).unwrap();

        assert_eq!(record.name, "shop");
        let modules: Vec<_> = record.files.iter().map(|f| f.module.as_str()).collect();
        assert_eq!(modules, vec!["alpha", "orders", "orders.models", "zeta"]);
    }

    #[test]
    fn test_files_sharing_a_module_are_concatenated() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "a/b.py", "def from_file():\n    pass\n");
        write(root, "a/b/__init__.py", "def from_package():\n    pass\n");
        write(root, "c.py", "def other():\n    pass\n");

        let record = analyzer(root).analyze_directory(root).unwrap();

        let entries: Vec<_> = record
            .files
            .iter()
            .map(|f| (f.module.as_str(), f.functions[0].name.as_str()))
            .collect();
        // "a/b" sorts before "a/b.py", so the package initializer comes first
        assert_eq!(
            entries,
            vec![("a.b", "from_package"), ("a.b", "from_file"), ("c", "other")]
        );
    }

    #[test]
    fn test_broken_file_yields_empty_record_and_walk_continues() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "pkg/bad.py", "def broken(:\n    pass\n");
        write(root, "pkg/good.py", "def fine():\n    return 'ok'\n");
        fs::write(root.join("pkg/binary.py"), [0xff, 0xfe, 0x00, 0x81]).unwrap();

        let record = analyzer(root).analyze_directory(root).unwrap();
        assert_eq!(record.files.len(), 3);

        let bad = record.files.iter().find(|f| f.module == "pkg.bad").unwrap();
        assert!(bad.is_empty());
        assert_eq!(bad.path, Path::new("pkg").join("bad.py").to_string_lossy());

        let binary = record.files.iter().find(|f| f.module == "pkg.binary").unwrap();
        assert!(binary.is_empty());

        let good = record.files.iter().find(|f| f.module == "pkg.good").unwrap();
        assert_eq!(good.functions[0].return_types, vec!["str"]);
    }

    #[test]
    fn test_oversized_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "big.py", "def f():\n    pass\n");

        let mut config = Config::default();
        config.extraction.max_file_size = 4;
        let mut analyzer = ProjectAnalyzer::new(&config, dir.path()).unwrap();

        let record = analyzer.analyze_file(&file);
        assert_eq!(record.module, "big");
        assert!(record.is_empty());
    }

    #[test]
    fn test_exclude_patterns() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "src/keep.py", "");
        write(root, "build/generated.py", "");

        let mut config = Config::default();
        config.walk.exclude = vec!["build/**".to_string()];
        let mut analyzer = ProjectAnalyzer::new(&config, root).unwrap();

        let record = analyzer.analyze_directory(root).unwrap();
        let modules: Vec<_> = record.files.iter().map(|f| f.module.as_str()).collect();
        assert_eq!(modules, vec!["src.keep"]);
    }

    #[test]
    fn test_invalid_inputs_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let text = write(dir.path(), "notes.txt", "hello");
        let mut analyzer = analyzer(dir.path());

        assert!(matches!(analyzer.analyze(&text), Err(PymetaError::InvalidInput(_))));
        assert!(matches!(
            analyzer.analyze(dir.path().join("missing.py")),
            Err(PymetaError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_file_outside_root_uses_stem() {
        let root = tempfile::tempdir().unwrap();
        let elsewhere = tempfile::tempdir().unwrap();
        let file = write(elsewhere.path(), "tools/run.py", "def go():\n    pass\n");

        let record = analyzer(root.path()).analyze_file(&file);
        assert_eq!(record.module, "run");
        assert_eq!(record.path, "run.py");
        assert_eq!(record.functions[0].name, "go");
    }
}
