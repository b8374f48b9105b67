//! Shader hot reload
//!
//! The controller owns a vertex/fragment source pair, the last modification
//! timestamps it observed for each, and the currently active compiled program.
//! Once per frame the render loop calls [`ShaderReloadController::poll_and_maybe_reload`],
//! which re-reads both timestamps and recompiles only when one is strictly
//! newer than what was stored. No hashing, no debounce, no filesystem-event
//! subscription; the dirty check is the raw timestamp comparison, so rapid
//! successive saves inside the same timestamp granularity can be missed.
//!
//! A failed compile is never fatal: the previous program (if any) stays
//! active and the diagnostic is stored for display. The next save that
//! advances a timestamp retries automatically.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::ReloadError;

/// The shader-compiler collaborator, injected so the controller can be
/// exercised without a GL context. `release` is called exactly once for every
/// program handed out by `compile` that gets replaced or dropped.
pub trait ShaderCompiler {
    type Program;

    fn compile(&mut self, vert_src: &str, frag_src: &str) -> Result<Self::Program, ReloadError>;
    fn release(&mut self, program: Self::Program);
}

pub struct ShaderReloadController<C: ShaderCompiler> {
    compiler: C,
    vert_path: PathBuf,
    frag_path: PathBuf,
    vert_mtime: Option<SystemTime>,
    frag_mtime: Option<SystemTime>,
    program: Option<C::Program>,
    error: String,
}

impl<C: ShaderCompiler> ShaderReloadController<C> {
    /// Records the initial paths without loading anything; call [`reload`]
    /// (or let the first poll do it) to get a program.
    ///
    /// [`reload`]: ShaderReloadController::reload
    pub fn new(compiler: C, vert_path: impl Into<PathBuf>, frag_path: impl Into<PathBuf>) -> Self {
        Self {
            compiler,
            vert_path: vert_path.into(),
            frag_path: frag_path.into(),
            vert_mtime: None,
            frag_mtime: None,
            program: None,
            error: String::new(),
        }
    }

    /// Record new source locations. Does not trigger a reload; the call site
    /// decides whether to reload immediately or let the next poll pick it up.
    pub fn set_paths(&mut self, vert_path: impl Into<PathBuf>, frag_path: impl Into<PathBuf>) {
        self.vert_path = vert_path.into();
        self.frag_path = frag_path.into();
    }

    pub fn vert_path(&self) -> &Path {
        &self.vert_path
    }

    pub fn frag_path(&self) -> &Path {
        &self.frag_path
    }

    /// The active compiled program, or `None` if nothing has compiled yet.
    pub fn current_shader(&self) -> Option<&C::Program> {
        self.program.as_ref()
    }

    /// The most recent reload failure, or `""` if the last attempt succeeded.
    pub fn current_error(&self) -> &str {
        &self.error
    }

    /// Attempt a full recompile from the current paths.
    ///
    /// Stores the files' modification timestamps as observed (successful or
    /// not), so the poll only retries once a file changes again. On success
    /// the old program is released and replaced in a single swap; on failure
    /// the previous program stays active and the message is stored.
    pub fn reload(&mut self) {
        self.error.clear();
        match self.try_reload() {
            Ok(program) => {
                if let Some(old) = self.program.replace(program) {
                    self.compiler.release(old);
                }
            }
            Err(e) => {
                self.error = e.to_string();
            }
        }
    }

    /// Per-frame dirty check: reload when either file's timestamp is strictly
    /// newer than the stored one (or was never observed). Returns whether a
    /// reload was attempted.
    pub fn poll_and_maybe_reload(&mut self) -> bool {
        if self.is_dirty() {
            self.reload();
            true
        } else {
            false
        }
    }

    fn is_dirty(&self) -> bool {
        newer_than(&self.vert_path, self.vert_mtime) || newer_than(&self.frag_path, self.frag_mtime)
    }

    fn try_reload(&mut self) -> Result<C::Program, ReloadError> {
        self.vert_mtime = Some(file_mtime(&self.vert_path)?);
        self.frag_mtime = Some(file_mtime(&self.frag_path)?);

        let vert_src = read_source(&self.vert_path)?;
        let frag_src = read_source(&self.frag_path)?;

        self.compiler.compile(&vert_src, &frag_src)
    }
}

impl<C: ShaderCompiler> Drop for ShaderReloadController<C> {
    fn drop(&mut self) {
        if let Some(program) = self.program.take() {
            self.compiler.release(program);
        }
    }
}

fn file_mtime(path: &Path) -> Result<SystemTime, ReloadError> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| ReloadError::Io { path: path.to_path_buf(), source: e })
}

fn read_source(path: &Path) -> Result<String, ReloadError> {
    fs::read_to_string(path).map_err(|e| ReloadError::Io { path: path.to_path_buf(), source: e })
}

// An unreadable file is "not newer": the poll stays quiet until the path
// becomes readable again, at which point its fresh mtime triggers a reload.
fn newer_than(path: &Path, stored: Option<SystemTime>) -> bool {
    match (fs::metadata(path).and_then(|m| m.modified()), stored) {
        (Ok(current), Some(stored)) => current > stored,
        (Ok(_), None) => true,
        (Err(_), _) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShaderStage;
    use std::cell::RefCell;
    use std::fs::OpenOptions;
    use std::rc::Rc;
    use std::time::Duration;

    const BAD_MARKER: &str = "!bad";

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct FakeProgram(u32);

    #[derive(Default)]
    struct CompilerLog {
        compiles: usize,
        released: Vec<u32>,
    }

    /// Compiles anything not containing `!bad`; records activity in a shared log.
    struct FakeCompiler {
        log: Rc<RefCell<CompilerLog>>,
        next_id: u32,
    }

    impl FakeCompiler {
        fn new() -> (Self, Rc<RefCell<CompilerLog>>) {
            let log = Rc::new(RefCell::new(CompilerLog::default()));
            (Self { log: log.clone(), next_id: 0 }, log)
        }
    }

    impl ShaderCompiler for FakeCompiler {
        type Program = FakeProgram;

        fn compile(&mut self, vert_src: &str, frag_src: &str) -> Result<FakeProgram, ReloadError> {
            self.log.borrow_mut().compiles += 1;
            if vert_src.contains(BAD_MARKER) {
                return Err(ReloadError::Compile {
                    stage: ShaderStage::Vertex,
                    log: "0:1: syntax error".into(),
                });
            }
            if frag_src.contains(BAD_MARKER) {
                return Err(ReloadError::Compile {
                    stage: ShaderStage::Fragment,
                    log: "0:1: syntax error".into(),
                });
            }
            self.next_id += 1;
            Ok(FakeProgram(self.next_id))
        }

        fn release(&mut self, program: FakeProgram) {
            self.log.borrow_mut().released.push(program.0);
        }
    }

    fn write_at(path: &Path, contents: &str, mtime: SystemTime) {
        fs::write(path, contents).unwrap();
        let f = OpenOptions::new().write(true).open(path).unwrap();
        f.set_modified(mtime).unwrap();
    }

    fn setup(vert: &str, frag: &str) -> (tempfile::TempDir, PathBuf, PathBuf, SystemTime) {
        let dir = tempfile::tempdir().unwrap();
        let t0 = SystemTime::now();
        let vert_path = dir.path().join("demo.vert");
        let frag_path = dir.path().join("demo.frag");
        write_at(&vert_path, vert, t0);
        write_at(&frag_path, frag, t0);
        (dir, vert_path, frag_path, t0)
    }

    fn current_id<C: ShaderCompiler<Program = FakeProgram>>(
        c: &ShaderReloadController<C>,
    ) -> Option<u32> {
        c.current_shader().map(|p| p.0)
    }

    #[test]
    fn valid_pair_reloads_cleanly() {
        let (_dir, vert, frag, _) = setup("void main(){}", "void main(){}");
        let (compiler, log) = FakeCompiler::new();
        let mut c = ShaderReloadController::new(compiler, vert, frag);

        c.reload();
        assert!(c.current_shader().is_some());
        assert_eq!(c.current_error(), "");
        assert_eq!(log.borrow().compiles, 1);
    }

    #[test]
    fn set_paths_does_not_reload() {
        let (_dir, vert, frag, _) = setup("void main(){}", "void main(){}");
        let (compiler, log) = FakeCompiler::new();
        let mut c = ShaderReloadController::new(compiler, "old.vert", "old.frag");

        c.set_paths(&vert, &frag);
        assert_eq!(log.borrow().compiles, 0);
        assert!(c.current_shader().is_none());
    }

    #[test]
    fn first_load_failure_leaves_no_shader() {
        let (_dir, vert, frag, _) = setup("void main(){}", "!bad");
        let (compiler, _log) = FakeCompiler::new();
        let mut c = ShaderReloadController::new(compiler, vert, frag);

        c.reload();
        assert!(c.current_shader().is_none());
        assert!(c.current_error().contains("fragment shader compile error"));
    }

    #[test]
    fn missing_file_is_nonfatal() {
        let dir = tempfile::tempdir().unwrap();
        let vert = dir.path().join("demo.vert");
        write_at(&vert, "void main(){}", SystemTime::now());
        let (compiler, log) = FakeCompiler::new();
        let mut c = ShaderReloadController::new(compiler, vert, dir.path().join("nope.frag"));

        c.reload();
        assert!(c.current_shader().is_none());
        assert!(c.current_error().contains("unable to load shader"));
        // Never reached the compiler.
        assert_eq!(log.borrow().compiles, 0);
    }

    #[test]
    fn invalid_fragment_keeps_previous_program() {
        let (_dir, vert, frag, t0) = setup("void main(){}", "void main(){}");
        let (compiler, log) = FakeCompiler::new();
        let mut c = ShaderReloadController::new(compiler, vert, frag.clone());

        c.reload();
        let first = current_id(&c).unwrap();

        write_at(&frag, "!bad", t0 + Duration::from_secs(2));
        c.reload();

        assert!(!c.current_error().is_empty());
        assert_eq!(current_id(&c), Some(first));
        assert!(log.borrow().released.is_empty());
    }

    #[test]
    fn poll_is_quiet_without_changes() {
        let (_dir, vert, frag, _) = setup("void main(){}", "void main(){}");
        let (compiler, log) = FakeCompiler::new();
        let mut c = ShaderReloadController::new(compiler, vert, frag);

        c.reload();
        assert!(!c.poll_and_maybe_reload());
        assert!(!c.poll_and_maybe_reload());
        assert_eq!(log.borrow().compiles, 1);
    }

    #[test]
    fn poll_reloads_once_on_newer_timestamp() {
        let (_dir, vert, frag, t0) = setup("void main(){}", "void main(){}");
        let (compiler, log) = FakeCompiler::new();
        let mut c = ShaderReloadController::new(compiler, vert, frag.clone());

        c.reload();
        let first = current_id(&c).unwrap();

        write_at(&frag, "void main(){ }", t0 + Duration::from_secs(2));
        assert!(c.poll_and_maybe_reload());
        assert!(!c.poll_and_maybe_reload());

        assert_eq!(log.borrow().compiles, 2);
        let second = current_id(&c).unwrap();
        assert_ne!(first, second);
        assert_eq!(log.borrow().released, vec![first]);
    }

    #[test]
    fn break_then_fix_round_trip() {
        let (_dir, vert, frag, t0) = setup("void main(){}", "void main(){}");
        let (compiler, log) = FakeCompiler::new();
        let mut c = ShaderReloadController::new(compiler, vert, frag.clone());

        c.reload();
        let first = current_id(&c).unwrap();
        assert_eq!(c.current_error(), "");

        // Save a broken fragment: old program stays up, error is surfaced.
        write_at(&frag, "!bad", t0 + Duration::from_secs(2));
        assert!(c.poll_and_maybe_reload());
        assert!(!c.current_error().is_empty());
        assert_eq!(current_id(&c), Some(first));

        // Fix and resave: error clears, program swaps, old handle released.
        write_at(&frag, "void main(){ }", t0 + Duration::from_secs(4));
        assert!(c.poll_and_maybe_reload());
        assert_eq!(c.current_error(), "");
        assert_ne!(current_id(&c), Some(first));
        assert_eq!(log.borrow().released, vec![first]);
    }

    #[test]
    fn first_poll_loads_when_nothing_observed_yet() {
        let (_dir, vert, frag, _) = setup("void main(){}", "void main(){}");
        let (compiler, _log) = FakeCompiler::new();
        let mut c = ShaderReloadController::new(compiler, vert, frag);

        assert!(c.poll_and_maybe_reload());
        assert!(c.current_shader().is_some());
    }

    #[test]
    fn drop_releases_active_program() {
        let (_dir, vert, frag, _) = setup("void main(){}", "void main(){}");
        let (compiler, log) = FakeCompiler::new();
        {
            let mut c = ShaderReloadController::new(compiler, vert, frag);
            c.reload();
        }
        assert_eq!(log.borrow().released, vec![1]);
    }
}
