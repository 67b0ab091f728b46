//! Flatpak build from the published manifest, pointed at the local tree.

use anyhow::{Context, Result};
use serde_yaml::{Mapping, Value};
use std::io::Write;
use std::path::Path;

use crate::pipeline::PackagingContext;
use crate::process::Cmd;

/// Downloads the manifest template.
pub trait ManifestFetcher {
    fn fetch(&self, url: &str) -> Result<String>;
}

/// [`ManifestFetcher`] over HTTP(S).
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("creating HTTP client")?;
        Ok(Self { client })
    }
}

impl ManifestFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("requesting {url}"))?
            .error_for_status()
            .with_context(|| format!("downloading {url}"))?;
        response
            .text()
            .with_context(|| format!("reading response body from {url}"))
    }
}

/// Replace the `sources` of one module with a single local directory source.
///
/// The module is picked by `name` when `module` is given, otherwise the last
/// module defined inline is used. Everything else in the manifest is kept.
pub fn rewrite_manifest(template: &str, module: Option<&str>, project_dir: &Path) -> Result<String> {
    let mut manifest: Value =
        serde_yaml::from_str(template).context("parsing flatpak manifest")?;

    let modules = manifest
        .get_mut("modules")
        .and_then(Value::as_sequence_mut)
        .context("flatpak manifest has no 'modules' list")?;

    let target = match module {
        Some(name) => modules
            .iter_mut()
            .filter_map(Value::as_mapping_mut)
            .find(|m| m.get("name").and_then(Value::as_str) == Some(name))
            .with_context(|| format!("flatpak manifest has no module named '{name}'"))?,
        None => modules
            .iter_mut()
            .rev()
            .find_map(Value::as_mapping_mut)
            .context("flatpak manifest defines no inline module")?,
    };

    let mut source = Mapping::new();
    source.insert("type".into(), "dir".into());
    source.insert(
        "path".into(),
        Value::String(project_dir.to_string_lossy().into_owned()),
    );
    target.insert("sources".into(), Value::Sequence(vec![Value::Mapping(source)]));

    serde_yaml::to_string(&manifest).context("serializing flatpak manifest")
}

/// Fetch, rewrite and build. The rewritten manifest lives in a temporary file
/// inside the project directory for the duration of the build only.
pub fn build_flatpak(ctx: &PackagingContext<'_>) -> Result<()> {
    let config = &ctx.config.flatpak;
    let project_dir = &ctx.layout.project_dir;

    tracing::info!("Fetching flatpak manifest from {}", config.manifest_url);
    let template = ctx
        .fetcher
        .fetch(&config.manifest_url)
        .context("fetching the flatpak manifest template")?;
    let manifest = rewrite_manifest(&template, config.module.as_deref(), project_dir)?;

    let mut file = tempfile::Builder::new()
        .prefix(&format!("{}.", config.app_id))
        .suffix(".yml")
        .tempfile_in(project_dir)
        .with_context(|| format!("creating manifest file in '{}'", project_dir.display()))?;
    file.write_all(manifest.as_bytes())
        .and_then(|()| file.flush())
        .with_context(|| format!("writing '{}'", file.path().display()))?;

    let cmd = Cmd::new("flatpak-builder")
        .arg("--user")
        .arg(format!("--install-deps-from={}", config.remote))
        .arg("--force-clean")
        .arg_path(&ctx.layout.project_path(&config.build_dir))
        .arg_path(file.path());
    ctx.runner.run(&cmd).context("building the flatpak")?;
    tracing::info!("Flatpak {} built", config.app_id);
    Ok(())
}
