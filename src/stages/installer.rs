//! NSIS installer through CPack (Windows targets).

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::pipeline::PackagingContext;
use crate::process::Cmd;
use crate::request::BuildType;

/// Subdirectory of the build directory CPack writes into.
pub const CPACK_OUTPUT_DIR: &str = "installer";

const INSTALLER_EXTENSION: &str = "exe";

pub fn cpack_command(ctx: &PackagingContext<'_>, build_type: BuildType) -> Cmd {
    Cmd::new("cpack")
        .args(["-G", "NSIS", "-C", build_type.cmake_name(), "-B", CPACK_OUTPUT_DIR])
        .current_dir(&ctx.layout.build_dir)
}

/// Run CPack and move the produced installer into the installers directory.
///
/// CPack is expected to produce exactly one `.exe`; when several exist the
/// first in name order is taken. Producing none is not fatal: a warning is
/// logged and `None` returned.
pub fn make_installer(ctx: &PackagingContext<'_>, build_type: BuildType) -> Result<Option<PathBuf>> {
    ctx.runner
        .run(&cpack_command(ctx, build_type))
        .context("creating the NSIS installer")?;

    let output_dir = ctx.layout.build_dir.join(CPACK_OUTPUT_DIR);
    let produced = ctx.dirs.files_in(&output_dir)?.into_iter().find(|path| {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(INSTALLER_EXTENSION))
    });

    let Some(produced) = produced else {
        tracing::warn!(
            "cpack finished but no .{INSTALLER_EXTENSION} was found in {}",
            output_dir.display()
        );
        return Ok(None);
    };
    let Some(name) = produced.file_name() else {
        return Ok(None);
    };

    let installers_dir = &ctx.layout.installers_dir;
    ctx.dirs.ensure(installers_dir, false)?;
    let destination = installers_dir.join(name);
    ctx.dirs.move_file(&produced, &destination)?;
    tracing::info!("Installer created: {}", destination.display());
    Ok(Some(destination))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::Cmd;
    use crate::testing::{capture_logs, warnings, write, Fixture, RecordingRunner};
    use std::fs;
    use std::path::Path;

    fn cpack_produces(files: &'static [&'static str]) -> RecordingRunner {
        RecordingRunner::with_hook(move |cmd: &Cmd| {
            if cmd.program() == "cpack" {
                let out = cmd.cwd().unwrap().join(CPACK_OUTPUT_DIR);
                for file in files {
                    write(&out, file, "installer bytes");
                }
            }
            Ok(())
        })
    }

    #[test]
    fn single_installer_is_relocated() {
        let mut fixture = Fixture::new();
        fixture.runner = cpack_produces(&["QPDFTools-3.1.0-win64.exe"]);
        let layout = fixture.layout();

        let installer = make_installer(&fixture.ctx(), BuildType::Release)
            .unwrap()
            .expect("installer path");

        assert_eq!(
            installer,
            layout.installers_dir.join("QPDFTools-3.1.0-win64.exe")
        );
        assert!(installer.is_file());
        assert!(!layout
            .build_dir
            .join("installer/QPDFTools-3.1.0-win64.exe")
            .exists());

        let calls = fixture.runner.calls();
        assert_eq!(calls[0].cwd(), Some(layout.build_dir.as_path()));
        assert_eq!(
            calls[0].argv(),
            ["cpack", "-G", "NSIS", "-C", "Release", "-B", "installer"]
        );
    }

    #[test]
    fn missing_installer_warns_and_returns_none() {
        let fixture = Fixture::new();

        let (result, logs) = capture_logs(|| make_installer(&fixture.ctx(), BuildType::Release));

        assert!(result.unwrap().is_none());
        assert_eq!(warnings(&logs).len(), 1);
        assert!(!fixture.layout().installers_dir.exists());
    }

    #[test]
    fn installers_dir_is_additive() {
        let mut fixture = Fixture::new();
        fixture.runner = cpack_produces(&["QPDFTools-3.1.1-win64.exe", "zz-extra.exe"]);
        let layout = fixture.layout();
        let previous = write(&layout.installers_dir, "QPDFTools-3.1.0-win64.exe", "old");

        let installer = make_installer(&fixture.ctx(), BuildType::Release)
            .unwrap()
            .unwrap();

        assert!(previous.is_file());
        assert_eq!(
            installer.file_name().unwrap(),
            Path::new("QPDFTools-3.1.1-win64.exe")
        );
        assert_eq!(fs::read_dir(&layout.installers_dir).unwrap().count(), 2);
    }

    #[test]
    fn cpack_failure_is_fatal() {
        let mut fixture = Fixture::new();
        fixture.runner = RecordingRunner::with_hook(|_| anyhow::bail!("exit status: 1"));

        assert!(make_installer(&fixture.ctx(), BuildType::Release).is_err());
    }
}
