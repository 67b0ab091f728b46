//! Test doubles and fixtures shared by the unit tests.

use anyhow::Result;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context as LayerContext, SubscriberExt};
use tracing_subscriber::Layer;

use crate::artifact::{LocalDirectories, ZipArchiver};
use crate::config::PackagingConfig;
use crate::env::MapEnv;
use crate::pipeline::{Layout, PackagingContext};
use crate::process::{Cmd, CommandRunner};
use crate::stages::flatpak::ManifestFetcher;

type Hook = Box<dyn Fn(&Cmd) -> Result<()>>;

/// Records every command; an optional hook simulates the tool's effects.
pub(crate) struct RecordingRunner {
    calls: RefCell<Vec<Cmd>>,
    hook: Option<Hook>,
}

impl RecordingRunner {
    pub(crate) fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            hook: None,
        }
    }

    pub(crate) fn with_hook(hook: impl Fn(&Cmd) -> Result<()> + 'static) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            hook: Some(Box::new(hook)),
        }
    }

    pub(crate) fn calls(&self) -> Vec<Cmd> {
        self.calls.borrow().clone()
    }

    pub(crate) fn argvs(&self) -> Vec<Vec<String>> {
        self.calls.borrow().iter().map(Cmd::argv).collect()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, cmd: &Cmd) -> Result<()> {
        self.calls.borrow_mut().push(cmd.clone());
        match &self.hook {
            Some(hook) => hook(cmd),
            None => Ok(()),
        }
    }
}

/// Serves a fixed manifest body and remembers requested URLs.
#[derive(Default)]
pub(crate) struct StaticFetcher {
    pub(crate) body: String,
    pub(crate) requested: RefCell<Vec<String>>,
}

impl ManifestFetcher for StaticFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        self.requested.borrow_mut().push(url.to_string());
        Ok(self.body.clone())
    }
}

/// A temporary project directory plus the collaborators a stage needs.
pub(crate) struct Fixture {
    pub(crate) temp: TempDir,
    pub(crate) config: PackagingConfig,
    pub(crate) runner: RecordingRunner,
    pub(crate) env: MapEnv,
    pub(crate) fetcher: StaticFetcher,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        Self {
            temp: TempDir::new().expect("temp dir"),
            config: PackagingConfig::default(),
            runner: RecordingRunner::new(),
            env: MapEnv::new(),
            fetcher: StaticFetcher::default(),
        }
    }

    pub(crate) fn project(&self) -> &Path {
        self.temp.path()
    }

    pub(crate) fn layout(&self) -> Layout {
        Layout::resolve(self.project(), &self.config.paths)
    }

    pub(crate) fn ctx(&self) -> PackagingContext<'_> {
        PackagingContext {
            layout: self.layout(),
            config: &self.config,
            runner: &self.runner,
            dirs: &LocalDirectories,
            archiver: &ZipArchiver,
            env: &self.env,
            fetcher: &self.fetcher,
        }
    }
}

/// Write `contents` to `root/rel`, creating parents.
pub(crate) fn write(root: &Path, rel: &str, contents: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("parent")).expect("create parent");
    fs::write(&path, contents).expect("write file");
    path
}

/// Empty executable named like a host command, found by `which`.
pub(crate) fn stub_tool(dir: &Path, name: &str) -> PathBuf {
    let filename = if cfg!(windows) {
        format!("{name}.exe")
    } else {
        name.to_string()
    };
    let path = write(dir, &filename, "");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
    }
    path
}

#[derive(Clone, Default)]
struct LogCapture(Arc<Mutex<Vec<(Level, String)>>>);

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: LayerContext<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.0
            .lock()
            .expect("log capture poisoned")
            .push((*event.metadata().level(), visitor.0));
    }
}

#[derive(Default)]
struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

/// Run `f` with a scoped subscriber and return the events it emitted.
pub(crate) fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, Vec<(Level, String)>) {
    let capture = LogCapture::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    let result = tracing::subscriber::with_default(subscriber, f);
    let logs = capture.0.lock().expect("log capture poisoned").clone();
    (result, logs)
}

pub(crate) fn warnings(logs: &[(Level, String)]) -> Vec<&str> {
    logs.iter()
        .filter(|(level, _)| *level == Level::WARN)
        .map(|(_, msg)| msg.as_str())
        .collect()
}
