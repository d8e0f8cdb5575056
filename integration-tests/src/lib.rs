use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

mod test_binary_main;
pub use test_binary_main::test_binary_main;

fn exe_name(name: &str) -> String {
    format!("{}{}", name, std::env::consts::EXE_SUFFIX)
}

fn write_file(path: &Path, contents: impl AsRef<[u8]>) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

/// A scratch directory holding a copy of the test binary and its canned responses.
pub struct Workdir {
    dir: tempfile::TempDir,
}

impl Workdir {
    const TARGET_BINARY_NAME: &'static str = "test-binary";

    /// `binary` must be copied rather than linked: the test binary finds its canned responses
    /// next to its own resolved path.
    pub fn new(binary: &Path) -> Self {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::copy(binary, dir.path().join(exe_name(Self::TARGET_BINARY_NAME))).unwrap();
        Self { dir }
    }

    pub fn with_exit_status(self, key: &str, exit_status: i32) -> Self {
        self.with_file(&format!("exit-status.{}", key), exit_status.to_string())
    }

    pub fn with_stdout(self, key: &str, stdout: impl AsRef<[u8]>) -> Self {
        self.with_file(&format!("stdout.{}", key), stdout)
    }

    pub fn with_stderr(self, key: &str, stderr: impl AsRef<[u8]>) -> Self {
        self.with_file(&format!("stderr.{}", key), stderr)
    }

    /// Makes the binary create `relative` in its working directory when called with `key`.
    pub fn with_output_file(self, key: &str, relative: &str, contents: impl AsRef<[u8]>) -> Self {
        write_file(
            &self.path().join(format!("output.{}", key)).join(relative),
            contents,
        );
        self
    }

    pub fn with_file(self, name: &str, contents: impl AsRef<[u8]>) -> Self {
        write_file(&self.path().join(name), contents);
        self
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn test_binary(&self) -> PathBuf {
        self.dir.path().join(exe_name(Self::TARGET_BINARY_NAME))
    }

    /// Argument lines of every call so far, oldest first.
    pub fn invocations(&self) -> Vec<String> {
        match std::fs::read_to_string(self.path().join("invocations")) {
            Ok(invocations) => invocations.lines().map(|s| s.to_owned()).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn assert_invocations(&self, expected: &[&str]) -> &Self {
        assert_eq!(self.invocations(), expected);
        self
    }

    /// Standard input of the last call that received any.
    pub fn stdin(&self) -> String {
        std::fs::read_to_string(self.path().join("stdin")).unwrap_or_default()
    }
}

/// A site checkout, a web root and a configuration file in one scratch directory.
pub struct Site {
    dir: tempfile::TempDir,
}

impl Site {
    pub fn new() -> Self {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("repo")).unwrap();
        std::fs::create_dir(dir.path().join("www")).unwrap();
        Self { dir }
    }

    pub fn repository(&self) -> PathBuf {
        self.dir.path().join("repo")
    }

    pub fn web_root(&self) -> PathBuf {
        self.dir.path().join("www")
    }

    pub fn config_file(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    pub fn with_repository_file(self, relative: &str, contents: impl AsRef<[u8]>) -> Self {
        write_file(&self.repository().join(relative), contents);
        self
    }

    pub fn with_web_root_file(self, relative: &str, contents: impl AsRef<[u8]>) -> Self {
        write_file(&self.web_root().join(relative), contents);
        self
    }

    /// Writes a configuration pointing at this site, `git` and `build` followed by `extra`.
    pub fn with_config(self, git: &Workdir, build: &Workdir, extra: &str) -> Self {
        let config = format!(
            "repository = {:?}\n\
             web-root = {:?}\n\
             git-binary = {:?}\n\
             build-command = [{:?}, \"build\"]\n\
             {}\n",
            self.repository().display().to_string(),
            self.web_root().display().to_string(),
            git.test_binary().display().to_string(),
            build.test_binary().display().to_string(),
            extra
        );
        write_file(&self.config_file(), config);
        self
    }

    pub fn repository_file(&self, relative: &str) -> String {
        std::fs::read_to_string(self.repository().join(relative)).unwrap()
    }

    /// Every file below the web root with its contents, keyed by relative path.
    pub fn web_root_files(&self) -> BTreeMap<String, String> {
        let mut files = BTreeMap::new();
        collect_files(&self.web_root(), "", &mut files);
        files
    }
}

impl Default for Site {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_files(dir: &Path, prefix: &str, files: &mut BTreeMap<String, String>) {
    for entry in std::fs::read_dir(dir).unwrap() {
        let entry = entry.unwrap();
        let name = format!("{}{}", prefix, entry.file_name().to_string_lossy());
        if entry.file_type().unwrap().is_dir() {
            collect_files(&entry.path(), &format!("{}/", name), files);
        } else {
            files.insert(name, std::fs::read_to_string(entry.path()).unwrap());
        }
    }
}
