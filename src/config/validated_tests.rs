//! Tests for configuration merging and validation.

use std::time::Duration;

use super::cli::Cli;
use super::error::ConfigError;
use super::toml::TomlConfig;
use super::validated::{ValidatedConfig, write_default_config};
use crate::modulate::{InvalidArgument, Options};

fn cli(args: &[&str]) -> Cli {
    let mut argv = vec!["modulate"];
    argv.extend_from_slice(args);
    Cli::parse_from_iter(argv)
}

fn toml(content: &str) -> TomlConfig {
    TomlConfig::parse(content).unwrap()
}

mod defaults {
    use super::*;

    #[test]
    fn no_sources_use_defaults() {
        let config = ValidatedConfig::from_raw(&cli(&[]), None).unwrap();

        assert_eq!(config.options.wait(), Duration::from_millis(500));
        assert!(!config.options.immediate());
        assert_eq!(
            config.options.max_cache_size(),
            Options::DEFAULT_MAX_CACHE_SIZE
        );
        assert!(config.options.max_wait().is_none());
        assert_eq!(config.work, Duration::ZERO);
        assert!(!config.verbose);
    }

    #[test]
    fn empty_debounce_section_uses_default_wait() {
        let toml = toml("[debounce]");
        let config = ValidatedConfig::from_raw(&cli(&[]), Some(&toml)).unwrap();

        assert_eq!(config.options.wait(), Duration::from_millis(500));
    }
}

mod priority {
    use super::*;

    #[test]
    fn toml_values_are_used() {
        let toml = toml(
            r"
            [debounce]
            wait = 100
            max_cache_size = 4
            max_wait = 300

            [demo]
            work = 25
        ",
        );
        let config = ValidatedConfig::from_raw(&cli(&[]), Some(&toml)).unwrap();

        assert_eq!(config.options.wait(), Duration::from_millis(100));
        assert_eq!(config.options.max_cache_size(), 4);
        assert_eq!(config.options.max_wait(), Some(Duration::from_millis(300)));
        assert_eq!(config.work, Duration::from_millis(25));
    }

    #[test]
    fn cli_overrides_toml() {
        let toml = toml(
            r"
            [debounce]
            wait = 100
            max_cache_size = 4
            max_wait = 300

            [demo]
            work = 25
        ",
        );
        let cli = cli(&[
            "--wait",
            "200",
            "--max-cache-size",
            "9",
            "--max-wait",
            "400",
            "--work",
            "5",
        ]);
        let config = ValidatedConfig::from_raw(&cli, Some(&toml)).unwrap();

        assert_eq!(config.options.wait(), Duration::from_millis(200));
        assert_eq!(config.options.max_cache_size(), 9);
        assert_eq!(config.options.max_wait(), Some(Duration::from_millis(400)));
        assert_eq!(config.work, Duration::from_millis(5));
    }

    #[test]
    fn cli_overrides_camel_case_toml_keys() {
        let toml = toml(
            r"
            [debounce]
            wait = 100
            maxCacheSize = 4
            maxWait = 300
        ",
        );
        let cli = cli(&["--max-cache-size", "2", "--max-wait", "150"]);
        let config = ValidatedConfig::from_raw(&cli, Some(&toml)).unwrap();

        assert_eq!(config.options.max_cache_size(), 2);
        assert_eq!(config.options.max_wait(), Some(Duration::from_millis(150)));
    }

    #[test]
    fn immediate_from_either_source() {
        let from_toml = toml(
            r"
            [debounce]
            immediate = true
        ",
        );
        let config = ValidatedConfig::from_raw(&cli(&[]), Some(&from_toml)).unwrap();
        assert!(config.options.immediate());

        let config = ValidatedConfig::from_raw(&cli(&["--immediate"]), None).unwrap();
        assert!(config.options.immediate());
    }

    #[test]
    fn verbose_comes_from_cli() {
        let config = ValidatedConfig::from_raw(&cli(&["-v"]), None).unwrap();
        assert!(config.verbose);
    }
}

mod validation {
    use super::*;

    fn invalid(result: Result<ValidatedConfig, ConfigError>) -> InvalidArgument {
        match result {
            Err(ConfigError::InvalidOptions(reason)) => reason,
            other => panic!("expected invalid options, got {other:?}"),
        }
    }

    #[test]
    fn negative_cli_wait_is_rejected() {
        let result = ValidatedConfig::from_raw(&cli(&["--wait", "-1"]), None);
        assert_eq!(invalid(result), InvalidArgument::Wait);
    }

    #[test]
    fn non_finite_cli_values_map_to_their_field() {
        let result = ValidatedConfig::from_raw(&cli(&["--max-wait", "inf"]), None);
        assert_eq!(invalid(result), InvalidArgument::MaxWait);

        let result = ValidatedConfig::from_raw(&cli(&["--max-cache-size", "NaN"]), None);
        assert_eq!(invalid(result), InvalidArgument::MaxCacheSize);
    }

    #[test]
    fn max_wait_below_wait_is_rejected() {
        let result =
            ValidatedConfig::from_raw(&cli(&["--wait", "300", "--max-wait", "100"]), None);
        assert_eq!(invalid(result), InvalidArgument::MaxWaitBelowWait);
    }

    #[test]
    fn non_boolean_immediate_in_toml_is_rejected() {
        let toml = toml(
            r#"
            [debounce]
            immediate = "yes"
        "#,
        );
        let result = ValidatedConfig::from_raw(&cli(&[]), Some(&toml));
        assert_eq!(invalid(result), InvalidArgument::Immediate);
    }

    #[test]
    fn cli_immediate_does_not_hide_malformed_toml_value() {
        let toml = toml(
            r#"
            [debounce]
            immediate = "yes"
        "#,
        );
        let result = ValidatedConfig::from_raw(&cli(&["--immediate"]), Some(&toml));
        assert_eq!(invalid(result), InvalidArgument::Immediate);
    }

    #[test]
    fn non_numeric_wait_in_toml_is_rejected() {
        let toml = toml(
            r#"
            [debounce]
            wait = "soon"
        "#,
        );
        let result = ValidatedConfig::from_raw(&cli(&[]), Some(&toml));
        assert_eq!(invalid(result), InvalidArgument::Wait);
    }

    #[test]
    fn unknown_debounce_key_is_rejected() {
        let toml = toml(
            r"
            [debounce]
            wait = 100
            leading = true
        ",
        );
        let result = ValidatedConfig::from_raw(&cli(&[]), Some(&toml));

        match result {
            Err(ConfigError::UnknownOption { key }) => assert_eq!(key, "leading"),
            other => panic!("expected unknown option, got {other:?}"),
        }
    }
}

mod display {
    use super::*;

    #[test]
    fn display_summarises_options() {
        let cli = cli(&["--wait", "100", "--max-wait", "250", "--work", "7"]);
        let config = ValidatedConfig::from_raw(&cli, None).unwrap();

        assert_eq!(
            config.to_string(),
            "Config { wait: 100ms, immediate: false, max_cache_size: 100, max_wait: 250ms, work: 7ms }"
        );
    }

    #[test]
    fn display_without_max_wait() {
        let config = ValidatedConfig::from_raw(&cli(&[]), None).unwrap();
        assert!(config.to_string().contains("max_wait: none"));
    }
}

mod loading {
    use std::io::Write;
    use tempfile::{NamedTempFile, tempdir};

    use super::*;

    #[test]
    fn load_reads_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[debounce]\nwait = 75").unwrap();

        let path = file.path().to_string_lossy().into_owned();
        let config = ValidatedConfig::load(&cli(&["-c", &path])).unwrap();

        assert_eq!(config.options.wait(), Duration::from_millis(75));
    }

    #[test]
    fn load_without_config_file() {
        let config = ValidatedConfig::load(&cli(&["--wait", "30"])).unwrap();
        assert_eq!(config.options.wait(), Duration::from_millis(30));
    }

    #[test]
    fn load_missing_file_fails() {
        let result = ValidatedConfig::load(&cli(&["-c", "missing_modulate_12345.toml"]));
        assert!(matches!(result, Err(ConfigError::FileRead { .. })));
    }

    #[test]
    fn written_default_config_loads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("modulate.toml");

        write_default_config(&path).unwrap();

        let path_str = path.to_string_lossy().into_owned();
        let config = ValidatedConfig::load(&cli(&["-c", &path_str])).unwrap();
        assert_eq!(config.options.wait(), Duration::from_millis(500));
    }

    #[test]
    fn write_to_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("modulate.toml");

        let result = write_default_config(&path);
        assert!(matches!(result, Err(ConfigError::FileWrite { .. })));
    }
}
