/// System information panel: host, OS, CPU, memory and free text.
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use tokio::process::Command;
use tokio::time;
use tracing::debug;

use crate::error::Result;
use crate::render::surface::Surface;
use crate::render::text::{FontSpec, TextLayout};
use crate::widgets::geometry::ColorTriple;
use crate::widgets::Widget;

const NO_INFOS: &str = "No infos found...";
const NO_ADAPTER: &str = "No adapter found";
/// Minimum lines reserved for the panel when stacking widgets.
const INFO_LINES: f64 = 6.0;
const QUOTE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryStats {
    pub total_mb: u64,
    pub available_mb: u64,
}

/// Where the panel reads its facts from.
#[derive(Debug, Clone)]
pub struct InfoSources {
    pub cpuinfo: PathBuf,
    pub meminfo: PathBuf,
    /// Directory of network adapters, consulted when no network text is configured.
    pub net_dir: PathBuf,
    pub network: Option<String>,
    pub quote_command: Option<String>,
    /// The quote command is killed after this long.
    pub quote_timeout: Duration,
}

impl Default for InfoSources {
    fn default() -> Self {
        Self {
            cpuinfo: PathBuf::from("/proc/cpuinfo"),
            meminfo: PathBuf::from("/proc/meminfo"),
            net_dir: PathBuf::from("/sys/class/net"),
            network: None,
            quote_command: None,
            quote_timeout: QUOTE_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InfoSnapshot {
    pub host_name: String,
    pub architecture: String,
    pub os_version: String,
    pub cpu_model: String,
    pub memory: Option<MemoryStats>,
    pub extra_text: String,
}

/// Value of the first `model name` line.
pub fn parse_cpu_model(cpuinfo: &str) -> String {
    cpuinfo
        .lines()
        .find(|line| line.starts_with("model name"))
        .and_then(|line| line.split_once(':'))
        .map(|(_, value)| value.trim().to_string())
        .unwrap_or_default()
}

fn meminfo_kb(line: &str, key: &str) -> Option<u64> {
    let rest = line.strip_prefix(key)?;
    rest.split_whitespace().next()?.parse().ok()
}

pub fn parse_meminfo(meminfo: &str) -> Option<MemoryStats> {
    let mut total = None;
    let mut available = None;
    for line in meminfo.lines() {
        if let Some(kb) = meminfo_kb(line, "MemTotal:") {
            total = Some(kb);
        } else if let Some(kb) = meminfo_kb(line, "MemAvailable:") {
            available = Some(kb);
        }
        if total.is_some() && available.is_some() {
            break;
        }
    }
    Some(MemoryStats {
        total_mb: total? / 1024,
        available_mb: available? / 1024,
    })
}

pub fn memory_summary(stats: Option<MemoryStats>) -> String {
    match stats {
        Some(MemoryStats { total_mb, available_mb }) if total_mb > 0 => {
            let used = total_mb.saturating_sub(available_mb);
            let pct = (used as f64 * 100.0 / total_mb as f64).round() as u64;
            format!("{used}MB used of {total_mb}MB is {pct}%")
        }
        _ => NO_INFOS.to_string(),
    }
}

fn read_trimmed(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(s) => Some(s.trim().to_string()),
        Err(e) => {
            debug!("Could not read {}: {}", path.display(), e);
            None
        }
    }
}

/// First wired adapter (name starting with `e`) as `name speed duplex state`.
pub fn network_summary(net_dir: &Path) -> String {
    let entries = match fs::read_dir(net_dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Could not list {}: {}", net_dir.display(), e);
            return NO_ADAPTER.to_string();
        }
    };
    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with('e'))
        .collect();
    names.sort();

    let Some(name) = names.into_iter().next() else {
        return NO_ADAPTER.to_string();
    };
    let adapter = net_dir.join(&name);
    let speed = read_trimmed(&adapter.join("speed"))
        .and_then(|s| s.parse::<u32>().ok())
        .map(|mbit| {
            if mbit >= 1000 {
                format!("{}G", mbit / 1000)
            } else {
                format!("{mbit}M")
            }
        })
        .unwrap_or_default();
    let duplex = read_trimmed(&adapter.join("duplex")).unwrap_or_default();
    let state = read_trimmed(&adapter.join("operstate")).unwrap_or_default();

    [name, speed, duplex, state]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

async fn run_quote(command: &str, timeout: Duration) -> Option<String> {
    let mut parts = command.split_whitespace();
    let program = parts.next()?;
    let output = Command::new(program).args(parts).kill_on_drop(true).output();
    match time::timeout(timeout, output).await {
        Ok(Ok(output)) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
        }
        Ok(Ok(output)) => {
            debug!("Quote command '{}' exited with {}", command, output.status);
            None
        }
        Ok(Err(e)) => {
            debug!("Could not run quote command '{}': {}", command, e);
            None
        }
        Err(_) => {
            debug!("Quote command '{}' timed out after {:?}", command, timeout);
            None
        }
    }
}

#[cfg(unix)]
fn host_facts() -> (String, String, String) {
    let host_name = match nix::unistd::gethostname() {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(e) => {
            debug!("gethostname failed: {}", e);
            String::new()
        }
    };
    match nix::sys::utsname::uname() {
        Ok(uts) => (
            host_name,
            uts.machine().to_string_lossy().into_owned(),
            format!(
                "{} {}",
                uts.sysname().to_string_lossy(),
                uts.release().to_string_lossy()
            ),
        ),
        Err(e) => {
            debug!("uname failed: {}", e);
            (host_name, String::new(), String::new())
        }
    }
}

#[cfg(not(unix))]
fn host_facts() -> (String, String, String) {
    let host_name = std::env::var("COMPUTERNAME").unwrap_or_default();
    (
        host_name,
        std::env::consts::ARCH.to_string(),
        std::env::consts::OS.to_string(),
    )
}

impl InfoSnapshot {
    /// Collect facts; anything unavailable degrades to an empty line or fallback text.
    pub async fn gather(sources: &InfoSources) -> Self {
        let (host_name, architecture, os_version) = host_facts();
        let cpu_model = read_trimmed(&sources.cpuinfo)
            .map(|s| parse_cpu_model(&s))
            .unwrap_or_default();
        let memory = read_trimmed(&sources.meminfo).and_then(|s| parse_meminfo(&s));

        let network = match &sources.network {
            Some(text) => text.clone(),
            None => network_summary(&sources.net_dir),
        };
        let quote = match sources.quote_command.as_deref() {
            Some(command) => run_quote(command, sources.quote_timeout).await.unwrap_or_default(),
            None => String::new(),
        };
        let extra_text = [network, quote]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        Self {
            host_name,
            architecture,
            os_version,
            cpu_model,
            memory,
            extra_text,
        }
    }

    /// Panel text, one fact per line, extra text last.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for line in [
            &self.host_name,
            &self.architecture,
            &self.os_version,
            &self.cpu_model,
            &memory_summary(self.memory),
        ] {
            text.push_str(line);
            text.push('\n');
        }
        text.push_str(&self.extra_text);
        text
    }
}

#[derive(Debug, Clone)]
pub struct InfoWidget {
    pub font: FontSpec,
    pub color: ColorTriple,
    pub sources: InfoSources,
    /// Facts drawn by the next frame, updated by `refresh`.
    pub snapshot: InfoSnapshot,
}

impl InfoWidget {
    pub fn new(font: FontSpec, color: ColorTriple, sources: InfoSources) -> Self {
        Self {
            font,
            color,
            sources,
            snapshot: InfoSnapshot::default(),
        }
    }

    pub async fn refresh(&mut self) {
        self.snapshot = InfoSnapshot::gather(&self.sources).await;
    }

    pub fn render<S: Surface>(surface: &mut S, font: &FontSpec, snapshot: &InfoSnapshot) -> Result<()> {
        let mut layout = surface.create_layout();
        layout.set_font(font);
        layout.set_text(&snapshot.text());
        surface.move_to(0.0, 0.0);
        surface.show_layout(&layout)
    }
}

impl Widget for InfoWidget {
    fn name(&self) -> &'static str {
        "info"
    }

    fn height<S: Surface>(&self, surface: &S, _now: &DateTime<FixedOffset>) -> Result<f64> {
        let mut layout = surface.create_layout();
        layout.set_font(&self.font);
        layout.set_text("M");
        let reserved = INFO_LINES * layout.pixel_size().1 as f64;
        layout.set_text(&self.snapshot.text());
        Ok(reserved.max(layout.pixel_size().1 as f64))
    }

    fn draw<S: Surface>(&self, surface: &mut S, _now: &DateTime<FixedOffset>) -> Result<()> {
        surface.set_source_rgb(self.color.red(), self.color.green(), self.color.blue());
        Self::render(surface, &self.font, &self.snapshot)
    }
}
