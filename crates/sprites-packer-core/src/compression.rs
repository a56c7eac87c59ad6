//! `basisu` subprocess wrapper.
//!
//! The binary is picked from a static table keyed by host OS and architecture.
//! Hosts missing from the table fail with `UnsupportedPlatform` before any
//! process is spawned.

use std::ffi::OsString;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::BasisOptions;
use crate::error::{Result, SpritePackerError};

/// Overrides the directory holding the per-platform `basisu` binaries.
pub const TOOLS_DIR_ENV: &str = "SPRITES_PACKER_TOOLS_DIR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Linux,
    MacOs,
    Windows,
}

impl Os {
    pub fn as_str(&self) -> &'static str {
        match self {
            Os::Linux => "linux",
            Os::MacOs => "darwin",
            Os::Windows => "win",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    X64,
    Arm64,
}

impl Arch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::X64 => "x64",
            Arch::Arm64 => "arm64",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub os: Os,
    pub arch: Arch,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os.as_str(), self.arch.as_str())
    }
}

impl Platform {
    /// Platform of the running host.
    pub fn current() -> Result<Self> {
        Self::from_target(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Maps Rust target names (`std::env::consts::{OS, ARCH}`) to a platform.
    pub fn from_target(os: &str, arch: &str) -> Result<Self> {
        let unsupported = || SpritePackerError::UnsupportedPlatform {
            os: os.to_string(),
            arch: arch.to_string(),
        };
        let os_tag = match os {
            "linux" => Os::Linux,
            "macos" => Os::MacOs,
            "windows" => Os::Windows,
            _ => return Err(unsupported()),
        };
        let arch_tag = match arch {
            "x86_64" => Arch::X64,
            "aarch64" => Arch::Arm64,
            _ => return Err(unsupported()),
        };
        Ok(Self {
            os: os_tag,
            arch: arch_tag,
        })
    }
}

/// Path of the `basisu` binary for `platform`, relative to the tools directory.
pub fn basisu_relative_path(platform: Platform) -> Result<&'static str> {
    match (platform.os, platform.arch) {
        (Os::MacOs, Arch::Arm64) => Ok("darwin/arm64/basisu"),
        (Os::MacOs, Arch::X64) => Ok("darwin/x64/basisu"),
        (Os::Linux, Arch::Arm64) => Ok("linux/arm64/basisu"),
        (Os::Linux, Arch::X64) => Ok("linux/x64/basisu"),
        (Os::Windows, Arch::X64) => Ok("win/x64/basisu.exe"),
        (os, arch) => Err(SpritePackerError::UnsupportedPlatform {
            os: os.as_str().to_string(),
            arch: arch.as_str().to_string(),
        }),
    }
}

/// Tools directory: explicit option, then `SPRITES_PACKER_TOOLS_DIR`, then `<exe dir>/bin`.
pub fn default_tools_dir(options: &BasisOptions) -> Result<PathBuf> {
    if let Some(dir) = &options.tools_dir {
        return Ok(dir.clone());
    }
    if let Some(dir) = std::env::var_os(TOOLS_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    let exe = std::env::current_exe()?;
    let base = exe.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok(base.join("bin"))
}

#[derive(Debug, Clone)]
pub struct BasisCompressor {
    executable: PathBuf,
    options: BasisOptions,
}

impl BasisCompressor {
    /// Resolves the binary for the running host.
    pub fn resolve(options: &BasisOptions) -> Result<Self> {
        let platform = Platform::current()?;
        let relative = basisu_relative_path(platform)?;
        let executable = default_tools_dir(options)?.join(relative);
        debug!(%platform, ?executable, "resolved basisu");
        Ok(Self::with_executable(executable, options.clone()))
    }

    pub fn with_executable(executable: impl Into<PathBuf>, options: BasisOptions) -> Self {
        Self {
            executable: executable.into(),
            options,
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Command-line arguments for compressing `input` into `output`.
    pub fn args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        let quality = self.options.quality.max(1);
        let level = self.options.compression_level.min(6);
        let mut args: Vec<OsString> = vec![
            "-file".into(),
            input.into(),
            "-output_file".into(),
            output.into(),
            "-q".into(),
            quality.to_string().into(),
            "-comp_level".into(),
            level.to_string().into(),
        ];
        if self.options.linear {
            args.push("-linear".into());
        }
        args
    }

    /// Runs the compressor and waits for it, bounded by the configured timeout.
    pub fn compress(&self, input: &Path, output: &Path) -> Result<()> {
        make_executable(&self.executable);
        let mut cmd = Command::new(&self.executable);
        cmd.args(self.args(input, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        let child = cmd
            .spawn()
            .map_err(|source| SpritePackerError::CompressorSpawn {
                path: self.executable.clone(),
                source,
            })?;
        let timeout = Duration::from_secs(self.options.timeout_secs);
        let (status, stderr) = wait_with_timeout(child, timeout, &self.executable)?;
        if !status.success() {
            return Err(SpritePackerError::CompressorFailed {
                exit_code: status.code().unwrap_or(-1),
                stderr,
            });
        }
        info!(
            input = %input.file_name().unwrap_or_default().to_string_lossy(),
            "compression completed"
        );
        Ok(())
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)) {
        debug!(?path, error = %e, "could not set executable bit");
    }
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) {}

/// Drains a child pipe on its own thread until EOF.
fn spawn_pipe_reader<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn wait_with_timeout(
    mut child: Child,
    timeout: Duration,
    executable: &Path,
) -> Result<(ExitStatus, String)> {
    let stderr_reader = child.stderr.take().map(spawn_pipe_reader);
    let start = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    // the reader is left detached: grandchildren may still hold the pipe
                    return Err(SpritePackerError::CompressorTimeout {
                        timeout_secs: timeout.as_secs(),
                    });
                }
                thread::sleep(Duration::from_millis(50));
            }
            Err(source) => {
                let _ = child.kill();
                return Err(SpritePackerError::CompressorSpawn {
                    path: executable.to_path_buf(),
                    source,
                });
            }
        }
    };
    let stderr = stderr_reader
        .and_then(|h| h.join().ok())
        .unwrap_or_default();
    Ok((status, stderr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn platform_table() {
        let p = Platform::from_target("linux", "x86_64").unwrap();
        assert_eq!(basisu_relative_path(p).unwrap(), "linux/x64/basisu");
        let p = Platform::from_target("macos", "aarch64").unwrap();
        assert_eq!(basisu_relative_path(p).unwrap(), "darwin/arm64/basisu");
        let p = Platform::from_target("windows", "x86_64").unwrap();
        assert_eq!(basisu_relative_path(p).unwrap(), "win/x64/basisu.exe");
        assert_eq!(p.to_string(), "win-x64");
    }

    #[test]
    fn unmapped_platforms_are_configuration_errors() {
        let p = Platform::from_target("windows", "aarch64").unwrap();
        let err = basisu_relative_path(p).unwrap_err();
        assert!(matches!(err, SpritePackerError::UnsupportedPlatform { .. }));
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = Platform::from_target("freebsd", "x86_64").unwrap_err();
        assert!(matches!(err, SpritePackerError::UnsupportedPlatform { ref os, .. } if os == "freebsd"));
        assert!(Platform::from_target("linux", "riscv64").is_err());
    }

    #[test]
    fn args_follow_options() {
        let opts = BasisOptions {
            quality: 128,
            compression_level: 3,
            linear: true,
            ..Default::default()
        };
        let c = BasisCompressor::with_executable("basisu", opts);
        let args = c.args(Path::new("in.png"), Path::new("out.basis"));
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec![
                "-file", "in.png", "-output_file", "out.basis", "-q", "128", "-comp_level", "3",
                "-linear"
            ]
        );
    }

    #[test]
    fn default_args_omit_linear() {
        let c = BasisCompressor::with_executable("basisu", BasisOptions::default());
        let args = c.args(Path::new("a"), Path::new("b"));
        assert_eq!(args.len(), 8);
        assert_eq!(args[5], OsString::from("255"));
        assert_eq!(args[7], OsString::from("1"));
    }

    #[test]
    fn missing_binary_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let c = BasisCompressor::with_executable(dir.path().join("nope"), BasisOptions::default());
        let err = c
            .compress(&dir.path().join("a.png"), &dir.path().join("a.basis"))
            .unwrap_err();
        assert!(matches!(err, SpritePackerError::CompressorSpawn { .. }));
        assert_eq!(err.kind(), ErrorKind::Collaborator);
    }

    #[cfg(unix)]
    fn script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-basisu");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_reported_with_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let exe = script(dir.path(), "echo boom 1>&2\nexit 3");
        let c = BasisCompressor::with_executable(exe, BasisOptions::default());
        let err = c
            .compress(&dir.path().join("a.png"), &dir.path().join("a.basis"))
            .unwrap_err();
        match err {
            SpritePackerError::CompressorFailed { exit_code, stderr } => {
                assert_eq!(exit_code, 3);
                assert!(stderr.contains("boom"));
            }
            other => panic!("expected CompressorFailed, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn large_stderr_output_is_still_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let exe = script(
            dir.path(),
            "head -c 200000 /dev/zero | tr '\\0' 'x' 1>&2\nexit 1",
        );
        let opts = BasisOptions {
            timeout_secs: 30,
            ..Default::default()
        };
        let c = BasisCompressor::with_executable(exe, opts);
        let started = Instant::now();
        let err = c
            .compress(&dir.path().join("a.png"), &dir.path().join("a.basis"))
            .unwrap_err();
        match err {
            SpritePackerError::CompressorFailed { exit_code, stderr } => {
                assert_eq!(exit_code, 1);
                assert_eq!(stderr.len(), 200_000);
            }
            other => panic!("expected CompressorFailed, got {other:?}"),
        }
        assert!(started.elapsed() < Duration::from_secs(30));
    }

    #[cfg(unix)]
    #[test]
    fn hanging_tool_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let exe = script(dir.path(), "sleep 10");
        let opts = BasisOptions {
            timeout_secs: 1,
            ..Default::default()
        };
        let c = BasisCompressor::with_executable(exe, opts);
        let err = c
            .compress(&dir.path().join("a.png"), &dir.path().join("a.basis"))
            .unwrap_err();
        assert!(matches!(err, SpritePackerError::CompressorTimeout { timeout_secs: 1 }));
    }

    #[cfg(unix)]
    #[test]
    fn successful_run_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        // $2 is the input, $4 the output
        let exe = script(dir.path(), "cp \"$2\" \"$4\"");
        let input = dir.path().join("in.png");
        std::fs::write(&input, b"data").unwrap();
        let output = dir.path().join("out.basis");
        let c = BasisCompressor::with_executable(exe, BasisOptions::default());
        c.compress(&input, &output).unwrap();
        assert_eq!(std::fs::read(&output).unwrap(), b"data");
    }
}
