//! Settings for launching and connecting to the simulator.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How to launch the simulator and reach its TraCI server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulatorConfig {
    /// The simulator executable, e.g. `sumo` or `sumo-gui`.
    pub binary: String,
    /// The scenario configuration file passed with `-c`.
    pub config_path: PathBuf,
    /// Extra flags passed to the simulator on startup.
    pub startup_flags: Vec<String>,
    /// The environment variable holding the simulator's installation root.
    pub home_var: String,
    /// The host the TraCI server listens on. A free port is looked for on this host too.
    pub host: String,
    /// The TraCI port; a free port is picked when unset.
    pub port: Option<u16>,
    /// How many times to retry connecting after the first attempt fails.
    pub connect_retries: u32,
    /// The pause between connection attempts, in ms.
    pub retry_delay_ms: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            binary: "sumo-gui".into(),
            config_path: "Sample.sumocfg".into(),
            startup_flags: vec!["--start".into(), "--quit-on-end".into()],
            home_var: "SUMO_HOME".into(),
            host: "127.0.0.1".into(),
            port: None,
            connect_retries: 60,
            retry_delay_ms: 1000,
        }
    }
}

impl SimulatorConfig {
    /// Parses a configuration from TOML. Missing keys take their default values.
    pub fn from_toml_str(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Reads a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text).map_err(|source| Error::Config {
            path: path.to_owned(),
            source,
        })
    }

    /// Gets the simulator installation root from the environment.
    pub fn check_environment(&self) -> Result<PathBuf> {
        std::env::var_os(&self.home_var)
            .filter(|home| !home.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| Error::MissingEnvironment(self.home_var.clone()))
    }

    /// Picks the executable to spawn: the copy under `<home>/bin` if there is one,
    /// otherwise the bare name so that it is looked up on `PATH`.
    pub fn resolve_binary(&self, home: &Path) -> PathBuf {
        let name = Path::new(&self.binary);
        if name.components().count() > 1 {
            return name.to_owned();
        }
        let installed = home
            .join("bin")
            .join(format!("{}{}", self.binary, std::env::consts::EXE_SUFFIX));
        if installed.is_file() {
            installed
        } else {
            name.to_owned()
        }
    }

    /// The arguments to launch the simulator with, serving TraCI on `port`.
    pub fn command_args(&self, port: u16) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-c".into(), self.config_path.clone().into()];
        args.extend(self.startup_flags.iter().map(OsString::from));
        args.push("--remote-port".into());
        args.push(port.to_string().into());
        args
    }

    /// The pause between connection attempts.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_the_sample_scenario() {
        let config = SimulatorConfig::default();
        assert_eq!(config.binary, "sumo-gui");
        assert_eq!(config.config_path, PathBuf::from("Sample.sumocfg"));
        assert_eq!(config.home_var, "SUMO_HOME");
        assert_eq!(
            config.command_args(8813),
            ["-c", "Sample.sumocfg", "--start", "--quit-on-end", "--remote-port", "8813"]
                .map(OsString::from)
                .to_vec()
        );
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = SimulatorConfig::from_toml_str(
            r#"
            binary = "sumo"
            config_path = "grid/grid.sumocfg"
            port = 9000
            "#,
        )
        .unwrap();
        assert_eq!(config.binary, "sumo");
        assert_eq!(config.config_path, PathBuf::from("grid/grid.sumocfg"));
        assert_eq!(config.port, Some(9000));
        assert_eq!(config.startup_flags, SimulatorConfig::default().startup_flags);
        assert_eq!(config.connect_retries, 60);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(SimulatorConfig::from_toml_str("binnary = \"sumo\"").is_err());
    }

    #[test]
    fn load_reports_the_offending_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = \"not a number\"").unwrap();
        match SimulatorConfig::load(file.path()) {
            Err(Error::Config { path, .. }) => assert_eq!(path, file.path()),
            other => panic!("expected a config error, got {:?}", other),
        }
    }

    #[test]
    fn missing_home_is_fatal() {
        let config = SimulatorConfig {
            home_var: "TRAFFIC_OBSERVER_TEST_UNSET_HOME".into(),
            ..Default::default()
        };
        let err = config.check_environment().unwrap_err();
        assert!(matches!(err, Error::MissingEnvironment(_)));
        assert_eq!(
            err.to_string(),
            "Please declare the environment variable 'TRAFFIC_OBSERVER_TEST_UNSET_HOME'"
        );
    }

    #[test]
    fn home_is_read_from_the_environment() {
        std::env::set_var("TRAFFIC_OBSERVER_TEST_HOME", "/opt/sumo");
        let config = SimulatorConfig {
            home_var: "TRAFFIC_OBSERVER_TEST_HOME".into(),
            ..Default::default()
        };
        assert_eq!(config.check_environment().unwrap(), PathBuf::from("/opt/sumo"));
    }

    #[test]
    fn binary_prefers_the_installation() {
        let home = tempfile::tempdir().unwrap();
        let config = SimulatorConfig {
            binary: "sumo".into(),
            ..Default::default()
        };
        assert_eq!(config.resolve_binary(home.path()), PathBuf::from("sumo"));

        std::fs::create_dir(home.path().join("bin")).unwrap();
        let installed = home
            .path()
            .join("bin")
            .join(format!("sumo{}", std::env::consts::EXE_SUFFIX));
        std::fs::write(&installed, b"").unwrap();
        assert_eq!(config.resolve_binary(home.path()), installed);
    }
}
