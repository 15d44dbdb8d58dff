use std::path::PathBuf;

/// How to launch one supervised binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    /// Name used in logs, events and errors
    pub name: String,
    /// Absolute path, path relative to `working_dir`, or a bare name looked up on `PATH`
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub env: Vec<(String, String)>,
    /// Line written to stdin to request a graceful stop. SIGTERM is used when absent.
    pub stop_command: Option<String>,
}

impl ProcessSpec {
    pub fn new(name: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            env: Vec::new(),
            stop_command: None,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn with_stop_command(mut self, command: impl Into<String>) -> Self {
        self.stop_command = Some(command.into());
        self
    }

    /// Locate the executable, or `None` if it cannot be found.
    pub(crate) fn resolve_program(&self) -> Option<PathBuf> {
        let program = &self.program;

        if program.is_absolute() {
            return is_executable(program).then(|| program.clone());
        }

        if program.components().count() > 1 {
            let base = match &self.working_dir {
                Some(dir) => dir.clone(),
                None => std::env::current_dir().ok()?,
            };
            let candidate = base.join(program);
            return is_executable(&candidate).then_some(candidate);
        }

        if let Some(dir) = &self.working_dir {
            let candidate = dir.join(program);
            if is_executable(&candidate) {
                return Some(candidate);
            }
        }

        let path = std::env::var_os("PATH")?;
        std::env::split_paths(&path)
            .map(|dir| dir.join(program))
            .find(|candidate| is_executable(candidate))
    }
}

#[cfg(unix)]
fn is_executable(path: &std::path::Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &std::path::Path) -> bool {
    path.is_file()
}
