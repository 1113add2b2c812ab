//! Layered configuration for the users server: built-in defaults, then a YAML
//! file, then `APP__*` environment variables (`APP__SERVER__PORT=9000`).

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "APP__";
const DEFAULT_SUBDIR: &str = ".users-server";
const DEFAULT_LOG_FILE: &str = "logs/users-server.log";

/// Process configuration: typed global sections plus a per-module bag that
/// each module deserializes on its own (see [`AppConfig::module_config`]).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    /// `None` when neither the file nor the environment mention logging.
    pub logging: Option<LoggingConfig>,
    /// Directory of `<module>.yaml` files merged into `modules` after loading.
    #[serde(default)]
    pub modules_dir: Option<String>,
    #[serde(default)]
    pub modules: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Base for relative log paths. Absolute after loading.
    pub home_dir: String,
    pub host: String,
    pub port: u16,
}

/// Subsystem name → logging section. `"default"` catches every target not
/// claimed by another entry.
pub type LoggingConfig = HashMap<String, Section>;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Section {
    /// "trace" | "debug" | "info" | "warn" | "error" | "off"
    pub console_level: String,
    /// Relative paths resolve against `server.home_dir`; empty disables the file sink.
    pub file: String,
    #[serde(default)]
    pub file_level: String,
    #[serde(default)]
    pub max_backups: Option<usize>,
    #[serde(default)]
    pub max_size_mb: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            home_dir: String::new(),
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// `host:port` as handed to the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parsed listen address; fails for hostnames and malformed hosts.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let raw = self.bind_addr();
        raw.parse()
            .with_context(|| format!("Invalid bind address '{raw}'"))
    }
}

/// Console at info, JSON file at debug under `logs/` in the home dir.
pub fn default_logging_config() -> LoggingConfig {
    HashMap::from([(
        "default".to_string(),
        Section {
            console_level: "info".to_string(),
            file: DEFAULT_LOG_FILE.to_string(),
            file_level: "debug".to_string(),
            max_backups: Some(3),
            max_size_mb: Some(100),
        },
    )])
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: Some(default_logging_config()),
            modules_dir: None,
            modules: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Defaults → YAML file → environment. The file must exist.
    pub fn load_layered<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        use figment::{
            providers::{Env, Format, Serialized, Yaml},
            Figment,
        };

        let config_path = config_path.as_ref();
        // figment treats a missing file as an empty source
        if !config_path.is_file() {
            anyhow::bail!("config file not found: {}", config_path.display());
        }

        let base = AppConfig {
            logging: None,
            ..Default::default()
        };

        let config: AppConfig = Figment::new()
            .merge(Serialized::defaults(base))
            .merge(Yaml::file(config_path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to parse yaml config {}", config_path.display()))?;

        config.finish()
    }

    /// [`AppConfig::load_layered`] when a path is given, built-in defaults otherwise.
    pub fn load_or_default<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_layered(path),
            None => Self::default().finish(),
        }
    }

    /// Resolve and create the home dir, then pull in `modules_dir` files.
    fn finish(mut self) -> Result<Self> {
        let home = resolve_home_dir(&self.server.home_dir)
            .context("Failed to resolve server.home_dir")?;
        std::fs::create_dir_all(&home)
            .with_context(|| format!("Failed to create home_dir {}", home.display()))?;
        self.server.home_dir = home.to_string_lossy().into_owned();

        if let Some(dir) = &self.modules_dir {
            merge_module_files(&mut self.modules, Path::new(dir))?;
        }
        Ok(self)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config to YAML")
    }

    /// Typed view of one entry of the module bag; a missing entry yields `T::default()`.
    pub fn module_config<T>(&self, module_name: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        self.modules.get(module_name).map_or_else(
            || Ok(T::default()),
            |raw| {
                serde_json::from_value(raw.clone())
                    .with_context(|| format!("Invalid config for module '{module_name}'"))
            },
        )
    }

    pub fn bind_addr(&self) -> String {
        self.server.bind_addr()
    }

    /// `--port` replaces the configured port; each `-v` raises the default
    /// console level one step (debug, then trace).
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(port) = args.port {
            self.server.port = port;
        }

        let level = match args.verbose {
            0 => return,
            1 => "debug",
            _ => "trace",
        };
        if let Some(section) = self
            .logging
            .get_or_insert_with(default_logging_config)
            .get_mut("default")
        {
            section.console_level = level.to_string();
        }
    }
}

/// Command line arguments the config layer cares about.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub port: Option<u16>,
    pub verbose: u8,
}

fn user_home() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

/// "" → `$HOME/.users-server`, "~/x" → `$HOME/x`, relative → under the cwd.
fn resolve_home_dir(raw: &str) -> Result<PathBuf> {
    let raw = raw.trim();
    let path = match raw {
        "" => user_home()
            .context("HOME is not set; configure server.home_dir explicitly")?
            .join(DEFAULT_SUBDIR),
        _ => match raw.strip_prefix("~/") {
            Some(rest) => user_home()
                .context("HOME is not set; cannot expand '~'")?
                .join(rest),
            None => PathBuf::from(raw),
        },
    };

    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Each `<name>.yaml`/`<name>.yml` becomes `modules[<name>]`, replacing an
/// inline entry of the same name. A missing directory is not an error.
fn merge_module_files(bag: &mut HashMap<String, serde_json::Value>, dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }

    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read modules_dir {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if !path.is_file() || !is_yaml {
            continue;
        }

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let value: serde_yaml::Value = serde_yaml::from_str(&raw)
            .with_context(|| format!("Failed to parse yaml module file {}", path.display()))?;
        bag.insert(name.to_string(), serde_json::to_value(value)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    /// Writes `config.yaml` with `server.home_dir` pinned inside the temp dir.
    fn write_config(tmp: &TempDir, rest: &str) -> PathBuf {
        let home = tmp.path().join("home").to_string_lossy().replace('\\', "/");
        let path = tmp.path().join("config.yaml");
        fs::write(&path, format!("server:\n  home_dir: \"{home}\"\n{rest}")).unwrap();
        path
    }

    #[test]
    fn defaults_listen_on_all_interfaces_8080() {
        let config = AppConfig::default();

        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
        assert_eq!(
            config.server.socket_addr().unwrap(),
            "0.0.0.0:8080".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(config.server.home_dir, "");
        assert!(config.modules.is_empty());

        let default = &config.logging.as_ref().unwrap()["default"];
        assert_eq!(default.console_level, "info");
        assert_eq!(default.file, "logs/users-server.log");
    }

    #[test]
    fn partial_server_section_keeps_other_defaults() {
        let tmp = tempdir().unwrap();
        let path = write_config(&tmp, "  port: 9090\n");

        let config = AppConfig::load_layered(&path).unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.logging.is_none());
        assert!(tmp.path().join("home").is_dir());
        assert!(Path::new(&config.server.home_dir).is_absolute());
    }

    #[test]
    fn logging_sections_are_read_from_yaml() {
        let tmp = tempdir().unwrap();
        let path = write_config(
            &tmp,
            r#"
logging:
  default:
    console_level: warn
    file: ""
  users_info:
    console_level: debug
    file: "logs/users.log"
    max_backups: 5
"#,
        );

        let logging = AppConfig::load_layered(&path).unwrap().logging.unwrap();

        assert_eq!(logging["default"].console_level, "warn");
        assert!(logging["default"].file.is_empty());
        assert_eq!(logging["users_info"].max_backups, Some(5));
        assert_eq!(logging["users_info"].max_size_mb, None);
    }

    #[test]
    fn missing_file_and_bad_yaml_are_errors() {
        let err = AppConfig::load_layered("/nonexistent/users-server.yaml").unwrap_err();
        assert!(err.to_string().contains("config file not found"));

        let tmp = tempdir().unwrap();
        let path = tmp.path().join("broken.yaml");
        fs::write(&path, "server: [unclosed").unwrap();
        let err = AppConfig::load_layered(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse yaml config"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let tmp = tempdir().unwrap();
        assert!(AppConfig::load_layered(write_config(&tmp, "  bogus: 1\n")).is_err());
        assert!(AppConfig::load_layered(write_config(&tmp, "database:\n  url: x\n")).is_err());
    }

    #[test]
    fn relative_home_dir_resolves_under_cwd() {
        let resolved = resolve_home_dir("var/users").unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("var/users"));

        let absolute = tempdir().unwrap();
        assert_eq!(
            resolve_home_dir(absolute.path().to_str().unwrap()).unwrap(),
            absolute.path()
        );
    }

    #[test]
    fn socket_addr_rejects_hostnames() {
        let server = ServerConfig {
            host: "localhost".to_string(),
            ..Default::default()
        };
        let err = server.socket_addr().unwrap_err();
        assert!(err.to_string().contains("Invalid bind address 'localhost:8080'"));
    }

    #[test]
    fn cli_port_and_verbosity() {
        for (verbose, expected) in [(0, "info"), (1, "debug"), (2, "trace"), (5, "trace")] {
            let mut config = AppConfig::default();
            config.apply_cli_overrides(&CliArgs {
                port: Some(3000),
                verbose,
                ..Default::default()
            });

            assert_eq!(config.server.port, 3000);
            assert_eq!(config.logging.unwrap()["default"].console_level, expected);
        }
    }

    #[test]
    fn verbosity_installs_default_logging_when_absent() {
        let mut config = AppConfig {
            logging: None,
            ..Default::default()
        };
        config.apply_cli_overrides(&CliArgs {
            verbose: 1,
            ..Default::default()
        });
        assert_eq!(config.logging.unwrap()["default"].console_level, "debug");
    }

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(deny_unknown_fields)]
    struct FlagsConfig {
        #[serde(default)]
        strict_not_found: bool,
    }

    #[test]
    fn module_config_defaults_and_reads_entries() {
        let mut config = AppConfig::default();
        assert_eq!(
            config.module_config::<FlagsConfig>("users_info").unwrap(),
            FlagsConfig::default()
        );

        config.modules.insert(
            "users_info".to_string(),
            serde_json::json!({ "strict_not_found": true }),
        );
        assert!(
            config
                .module_config::<FlagsConfig>("users_info")
                .unwrap()
                .strict_not_found
        );

        config
            .modules
            .insert("users_info".to_string(), serde_json::json!({ "typo": true }));
        let err = config.module_config::<FlagsConfig>("users_info").unwrap_err();
        assert!(err.to_string().contains("Invalid config for module 'users_info'"));
    }

    #[test]
    fn modules_dir_files_replace_inline_entries() {
        let tmp = tempdir().unwrap();
        let modules_dir = tmp.path().join("modules.d");
        fs::create_dir_all(&modules_dir).unwrap();
        fs::write(modules_dir.join("users_info.yaml"), "skip_seed: true\n").unwrap();
        fs::write(modules_dir.join("notes.txt"), "ignored").unwrap();

        let path = write_config(
            &tmp,
            &format!(
                r#"
modules_dir: "{}"
modules:
  api_ingress:
    base_path: "/v1"
  users_info:
    strict_not_found: true
"#,
                modules_dir.to_string_lossy().replace('\\', "/")
            ),
        );

        let config = AppConfig::load_layered(&path).unwrap();

        assert_eq!(config.modules["api_ingress"]["base_path"], "/v1");
        assert_eq!(config.modules["users_info"], serde_json::json!({ "skip_seed": true }));
        assert!(!config.modules.contains_key("notes"));
    }

    #[test]
    fn yaml_dump_loads_back() {
        let config = AppConfig::default();
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("port: 8080"));

        let back: AppConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.server.port, 8080);
        assert!(back.logging.unwrap().contains_key("default"));
    }
}
