//! Console and rotating JSON-file logging driven by [`LoggingConfig`].
//!
//! Every non-`default` key names a subsystem (a tracing target prefix such as
//! `users_info` or `api_ingress`) with its own levels and, optionally, its own
//! file. The `default` section receives everything no subsystem claims.

use crate::config::{LoggingConfig, Section};
use std::{
    io::{IsTerminal, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};
use parking_lot::Mutex;
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::filter::{FilterFn, Targets};
use tracing_subscriber::fmt;

const DEFAULT_MAX_SIZE_MB: u64 = 100;
const DEFAULT_MAX_BACKUPS: usize = 3;
const DEFAULT_SECTION: &str = "default";

/// `None` means the sink is switched off. Unknown names fall back to info.
fn parse_tracing_level(s: &str) -> Option<Level> {
    match s.trim().to_ascii_lowercase().as_str() {
        "off" | "none" => None,
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => Some(Level::INFO),
    }
}

/// `target` is `prefix` itself or a path below it (`prefix::...`).
fn matches_crate_prefix(target: &str, prefix: &str) -> bool {
    target
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

type CrateFilter = FilterFn<Box<dyn Fn(&tracing::Metadata<'_>) -> bool + Send + Sync + 'static>>;

/// Passes events at or above `max_level` whose target no subsystem claims.
fn unclaimed_filter(subsystems: Vec<String>, max_level: Level) -> CrateFilter {
    FilterFn::new(Box::new(move |meta: &tracing::Metadata<'_>| {
        meta.level() <= &max_level
            && !subsystems
                .iter()
                .any(|s| matches_crate_prefix(meta.target(), s))
    }))
}

// -------- config view --------

/// Sections split into the catch-all and the named subsystems.
struct LogPlan<'a> {
    default: Option<&'a Section>,
    subsystems: Vec<(&'a str, &'a Section)>,
}

impl<'a> LogPlan<'a> {
    fn new(cfg: &'a LoggingConfig) -> Self {
        let mut subsystems: Vec<_> = cfg
            .iter()
            .filter(|(name, _)| name.as_str() != DEFAULT_SECTION)
            .map(|(name, section)| (name.as_str(), section))
            .collect();
        subsystems.sort_by_key(|(name, _)| *name);

        Self {
            default: cfg.get(DEFAULT_SECTION),
            subsystems,
        }
    }

    fn subsystem_names(&self) -> Vec<String> {
        self.subsystems.iter().map(|(n, _)| n.to_string()).collect()
    }

    fn targets_by(&self, level_of: impl Fn(&Section) -> Option<&str>) -> Targets {
        self.subsystems
            .iter()
            .filter_map(|(name, section)| {
                level_of(*section)
                    .and_then(parse_tracing_level)
                    .map(|lvl| (*name, LevelFilter::from_level(lvl)))
            })
            .fold(
                Targets::new().with_default(LevelFilter::OFF),
                |targets, (name, lvl)| targets.with_target(name, lvl),
            )
    }

    fn console_targets(&self) -> Targets {
        self.targets_by(|s| Some(s.console_level.as_str()))
    }

    /// Subsystems without a file of their own stay off the file sinks.
    fn file_targets(&self) -> Targets {
        self.targets_by(|s| (!s.file.trim().is_empty()).then_some(s.file_level.as_str()))
    }
}

// -------- rotating file sinks --------

#[derive(Clone)]
struct RotWriter(Arc<Mutex<FileRotate<AppendTimestamp>>>);

impl Write for RotWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0.lock().flush()
    }
}

/// Writer for one event; `None` discards the bytes.
struct RoutedWriter(Option<RotWriter>);

impl Write for RoutedWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.as_mut().map_or(Ok(buf.len()), |w| w.write(buf))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0.as_mut().map_or(Ok(()), |w| w.flush())
    }
}

/// Picks the file for an event by target. The longest matching subsystem
/// prefix wins; unmatched targets go to the default file.
#[derive(Clone, Default)]
struct MultiFileRouter {
    default: Option<RotWriter>,
    /// Sorted by prefix length, longest first.
    by_prefix: Vec<(String, RotWriter)>,
}

impl MultiFileRouter {
    fn build(plan: &LogPlan<'_>, base_dir: &Path) -> Self {
        let mut by_prefix: Vec<_> = plan
            .subsystems
            .iter()
            .filter_map(|(name, section)| {
                file_writer_for(name, section, base_dir).map(|w| (name.to_string(), w))
            })
            .collect();
        by_prefix.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()));

        Self {
            default: plan
                .default
                .and_then(|s| file_writer_for(DEFAULT_SECTION, s, base_dir)),
            by_prefix,
        }
    }

    fn resolve_for(&self, target: &str) -> Option<RotWriter> {
        self.by_prefix
            .iter()
            .find(|(prefix, _)| matches_crate_prefix(target, prefix))
            .map(|(_, w)| w.clone())
            .or_else(|| self.default.clone())
    }
}

impl<'a> fmt::MakeWriter<'a> for MultiFileRouter {
    type Writer = RoutedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        RoutedWriter(self.default.clone())
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        RoutedWriter(self.resolve_for(meta.target()))
    }
}

/// Relative log paths live under the server home dir.
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

fn open_rotating(log_path: &Path, max_bytes: usize, max_files: usize) -> std::io::Result<RotWriter> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let rot = FileRotate::new(
        log_path,
        AppendTimestamp::default(FileLimit::MaxFiles(max_files)),
        ContentLimit::BytesSurpassed(max_bytes),
        Compression::None,
        #[cfg(unix)]
        None,
    );
    Ok(RotWriter(Arc::new(Mutex::new(rot))))
}

fn file_writer_for(label: &str, section: &Section, base_dir: &Path) -> Option<RotWriter> {
    if section.file.trim().is_empty() {
        return None;
    }

    let max_mb = section.max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB);
    let max_bytes = usize::try_from(max_mb.saturating_mul(1024 * 1024)).unwrap_or(usize::MAX);
    let max_files = section.max_backups.unwrap_or(DEFAULT_MAX_BACKUPS);
    let log_path = resolve_log_path(&section.file, base_dir);

    open_rotating(&log_path, max_bytes, max_files)
        .map_err(|e| {
            // No subscriber yet, stderr is the only place this can go.
            eprintln!(
                "Failed to open log file for '{label}' at {}: {e}",
                log_path.display()
            );
        })
        .ok()
}

// -------- public init --------

/// Install the global subscriber described by `cfg`, resolving relative log
/// files against `base_dir` (the server home dir).
///
/// Console output is human-readable and colored on a terminal; files get one
/// JSON object per line. An empty config falls back to plain console output.
/// Only the first call in a process installs anything.
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry};

    // `log` records from dependencies must reach tracing too
    let _ = tracing_log::LogTracer::init();

    if cfg.is_empty() {
        let _ = fmt()
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .try_init();
        return;
    }

    let plan = LogPlan::new(cfg);
    let router = MultiFileRouter::build(&plan, base_dir);
    let ansi = std::io::stdout().is_terminal();

    let console_subsystems = fmt::layer()
        .with_ansi(ansi)
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(plan.console_targets());

    let console_default = plan
        .default
        .and_then(|s| parse_tracing_level(&s.console_level))
        .map(|lvl| {
            fmt::layer()
                .with_ansi(ansi)
                .with_target(true)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_filter(unclaimed_filter(plan.subsystem_names(), lvl))
        });

    let file_subsystems = (!router.by_prefix.is_empty()).then(|| {
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_writer(router.clone())
            .with_filter(plan.file_targets())
    });

    let file_default = plan
        .default
        .filter(|_| router.default.is_some())
        .and_then(|s| parse_tracing_level(&s.file_level))
        .map(|lvl| {
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_target(true)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_writer(router.clone())
                .with_filter(unclaimed_filter(plan.subsystem_names(), lvl))
        });

    let _ = Registry::default()
        .with(console_subsystems)
        .with(console_default)
        .with(file_subsystems)
        .with(file_default)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_logging_config;
    use tempfile::tempdir;

    fn section(file: &str, file_level: &str) -> Section {
        Section {
            console_level: "info".into(),
            file: file.into(),
            file_level: file_level.into(),
            max_backups: Some(2),
            max_size_mb: Some(1),
        }
    }

    #[test]
    fn level_names() {
        for (raw, expected) in [
            ("trace", Some(Level::TRACE)),
            ("DEBUG", Some(Level::DEBUG)),
            (" warning ", Some(Level::WARN)),
            ("Error", Some(Level::ERROR)),
            ("off", None),
            ("none", None),
            ("loud", Some(Level::INFO)),
            ("", Some(Level::INFO)),
        ] {
            assert_eq!(parse_tracing_level(raw), expected, "{raw:?}");
        }
    }

    #[test]
    fn subsystem_prefix_matching() {
        assert!(matches_crate_prefix("users_info", "users_info"));
        assert!(matches_crate_prefix("users_info::api::rest", "users_info"));
        assert!(!matches_crate_prefix("users_info_extra", "users_info"));
        assert!(!matches_crate_prefix("api_ingress", "users_info"));
    }

    #[test]
    fn plan_separates_default_from_subsystems() {
        let mut cfg = default_logging_config();
        cfg.insert("users_info".into(), section("logs/users.log", "debug"));
        cfg.insert("api_ingress".into(), section("", "debug"));

        let plan = LogPlan::new(&cfg);

        assert!(plan.default.is_some());
        assert_eq!(plan.subsystem_names(), vec!["api_ingress", "users_info"]);
    }

    #[test]
    fn relative_log_paths_land_under_home() {
        let tmp = tempdir().unwrap();

        let resolved = resolve_log_path("logs/users-server.log", tmp.path());
        assert_eq!(resolved, tmp.path().join("logs/users-server.log"));

        let abs = tmp.path().join("elsewhere.log");
        assert_eq!(resolve_log_path(abs.to_str().unwrap(), Path::new("/unused")), abs);
    }

    #[test]
    fn opening_a_log_file_creates_its_directory() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("a/b/users.log");

        let mut writer = open_rotating(&path, 64 * 1024, 2).unwrap();
        writer.write_all(b"{\"msg\":\"hello\"}\n").unwrap();
        writer.flush().unwrap();

        assert!(path.parent().unwrap().is_dir());
        assert!(std::fs::read_to_string(&path).unwrap().contains("hello"));
    }

    #[test]
    fn longest_subsystem_prefix_wins() {
        let tmp = tempdir().unwrap();
        let mut cfg = default_logging_config();
        cfg.insert("users_info".into(), section("logs/users.log", "debug"));
        cfg.insert("users_info::api".into(), section("logs/users-api.log", "debug"));

        let plan = LogPlan::new(&cfg);
        let router = MultiFileRouter::build(&plan, tmp.path());

        assert_eq!(router.by_prefix[0].0, "users_info::api");
        assert!(router.resolve_for("users_info::api::rest").is_some());
        assert!(router.resolve_for("users_info::domain").is_some());
        // unclaimed targets fall back to the default file
        assert!(router.resolve_for("hyper::proto").is_some());
    }

    #[test]
    fn empty_file_names_disable_file_sinks() {
        let tmp = tempdir().unwrap();
        let mut cfg = LoggingConfig::new();
        cfg.insert("default".into(), section("", "debug"));
        cfg.insert("users_info".into(), section("  ", "debug"));

        let plan = LogPlan::new(&cfg);
        let router = MultiFileRouter::build(&plan, tmp.path());

        assert!(router.default.is_none());
        assert!(router.by_prefix.is_empty());
        assert!(router.resolve_for("users_info").is_none());

        let mut sink = RoutedWriter(None);
        assert_eq!(sink.write(b"dropped").unwrap(), 7);
    }
}
