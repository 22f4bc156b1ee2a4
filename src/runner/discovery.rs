//! Test target discovery for external fan-out

use crate::{
    defaults::{TEST_FILE_PREFIX, TEST_FILE_SUFFIX},
    error::{AppError, Result},
    models::RunConfig,
};
use std::path::Path;

/// Units of work and shared options for an external fan-out run
#[derive(Debug, Clone, PartialEq)]
pub struct FanoutPlan {
    /// One job per target
    pub targets: Vec<String>,
    /// Options passed to every job
    pub options: Vec<String>,
}

/// Build the fan-out plan: explicit targets from the runner arguments when
/// given, otherwise every test file under the configured test directory.
pub fn plan_fanout(config: &RunConfig) -> Result<FanoutPlan> {
    let (explicit, mut options) = split_runner_args(&config.runner_args);

    let targets = if explicit.is_empty() {
        discover_tests(&config.runner.test_dir)?
    } else {
        explicit
    };

    if targets.is_empty() {
        return Err(AppError::discovery(format!(
            "no {}*{} files found under {}",
            TEST_FILE_PREFIX,
            TEST_FILE_SUFFIX,
            config.runner.test_dir.display()
        )));
    }

    if options.is_empty() {
        options = crate::defaults::DEFAULT_RUNNER_ARGS
            .iter()
            .map(|&s| s.to_string())
            .collect();
    }

    Ok(FanoutPlan { targets, options })
}

/// Runner options whose value is the following argument
const OPTIONS_WITH_VALUE: &[&str] = &[
    "-k", "-m", "-c", "-p", "-o", "-W", "-n", "-r",
    "--deselect", "--rootdir", "--ignore", "--ignore-glob", "--confcutdir",
    "--basetemp", "--junitxml", "--junit-xml", "--junit-prefix", "--tb",
    "--maxfail", "--durations", "--capture", "--import-mode", "--override-ini",
    "--config-file", "--log-level", "--log-file", "--log-cli-level", "--log-format",
    "--cov", "--cov-report", "--cov-config", "--dist", "--numprocesses",
    "--maxprocesses", "--timeout", "--reruns", "--html", "--report-log",
];

/// Separate explicit test targets from options, keeping the order of each.
/// The value of an option such as `--deselect x.py::t` stays with its option.
pub fn split_runner_args(args: &[String]) -> (Vec<String>, Vec<String>) {
    let mut targets = Vec::new();
    let mut options = Vec::new();
    let mut expects_value = false;

    for arg in args {
        if expects_value {
            options.push(arg.clone());
            expects_value = false;
        } else if arg.starts_with('-') {
            expects_value = takes_value(arg);
            options.push(arg.clone());
        } else if is_target(arg) {
            targets.push(arg.clone());
        } else {
            options.push(arg.clone());
        }
    }

    (targets, options)
}

/// `--opt=value` and `-kexpr` carry their value inline
fn takes_value(option: &str) -> bool {
    !option.contains('=') && OPTIONS_WITH_VALUE.contains(&option)
}

/// A target is a test path, optionally followed by a `::node` selector
fn is_target(arg: &str) -> bool {
    let path_part = arg.split("::").next().unwrap_or(arg);
    path_part.ends_with(TEST_FILE_SUFFIX) || Path::new(path_part).exists()
}

/// Recursively collect `test_*.py` files under `dir`, sorted.
/// A missing directory yields no targets. Hidden directories, `__pycache__`
/// and symlinked directories are not entered.
pub fn discover_tests(dir: &Path) -> Result<Vec<String>> {
    let mut found = Vec::new();
    if dir.is_dir() {
        collect(dir, &mut found)?;
    }
    found.sort();
    Ok(found)
}

fn collect(dir: &Path, found: &mut Vec<String>) -> Result<()> {
    let unreadable =
        |e: std::io::Error| AppError::discovery(format!("cannot read test directory {}: {}", dir.display(), e));

    for entry in std::fs::read_dir(dir).map_err(unreadable)? {
        let entry = entry.map_err(unreadable)?;
        let file_type = entry.file_type().map_err(unreadable)?;
        let name = entry.file_name();
        let name = name.to_string_lossy();

        if file_type.is_dir() {
            if !skip_directory(&name) {
                collect(&entry.path(), found)?;
            }
            continue;
        }

        if file_type.is_symlink() && entry.path().is_dir() {
            continue;
        }

        if name.starts_with(TEST_FILE_PREFIX) && name.ends_with(TEST_FILE_SUFFIX) {
            found.push(entry.path().to_string_lossy().into_owned());
        }
    }

    Ok(())
}

fn skip_directory(name: &str) -> bool {
    name.starts_with('.') || name == "__pycache__"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Endpoint;
    use std::fs;
    use tempfile::TempDir;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn config_with_dir(dir: &Path) -> RunConfig {
        let mut config = RunConfig::new(vec![Endpoint::new("localhost", 8080)], "token");
        config.runner.test_dir = dir.to_path_buf();
        config
    }

    #[test]
    fn test_discovery_is_recursive_and_sorted() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("forms")).unwrap();
        fs::write(dir.path().join("test_page.py"), "").unwrap();
        fs::write(dir.path().join("forms/test_acroform.py"), "").unwrap();
        fs::write(dir.path().join("pdf_assertions.py"), "").unwrap();
        fs::write(dir.path().join("test_notes.txt"), "").unwrap();

        let found = discover_tests(dir.path()).unwrap();
        assert_eq!(found.len(), 2);
        assert!(found[0].ends_with("forms/test_acroform.py"));
        assert!(found[1].ends_with("test_page.py"));
    }

    #[test]
    fn test_missing_directory_finds_nothing() {
        let found = discover_tests(Path::new("/no/such/test/dir")).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_split_runner_args() {
        let (targets, options) = split_runner_args(&strings(&[
            "-x",
            "tests/e2e/test_page.py::test_delete",
            "-k",
            "smoke",
            "tests/e2e/test_form.py",
        ]));

        assert_eq!(targets, strings(&["tests/e2e/test_page.py::test_delete", "tests/e2e/test_form.py"]));
        assert_eq!(options, strings(&["-x", "-k", "smoke"]));
    }

    #[test]
    fn test_option_values_stay_with_their_option() {
        let (targets, options) = split_runner_args(&strings(&[
            "--deselect",
            "tests/e2e/test_page.py::test_slow",
            "--rootdir",
            ".",
            "-c",
            "pytest.ini",
        ]));

        assert!(targets.is_empty());
        assert_eq!(
            options,
            strings(&["--deselect", "tests/e2e/test_page.py::test_slow", "--rootdir", ".", "-c", "pytest.ini"])
        );
    }

    #[test]
    fn test_inline_option_values_do_not_consume_targets() {
        let (targets, options) = split_runner_args(&strings(&[
            "--rootdir=.",
            "tests/e2e/test_form.py",
            "-x",
            "tests/e2e/test_page.py",
        ]));

        assert_eq!(targets, strings(&["tests/e2e/test_form.py", "tests/e2e/test_page.py"]));
        assert_eq!(options, strings(&["--rootdir=.", "-x"]));
    }

    #[test]
    fn test_plan_with_only_deselected_tests_discovers_the_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("test_page.py"), "").unwrap();
        fs::write(dir.path().join("test_form.py"), "").unwrap();

        let mut config = config_with_dir(dir.path());
        config.runner_args = strings(&["--deselect", "test_page.py::test_slow"]);

        let plan = plan_fanout(&config).unwrap();
        assert_eq!(plan.targets.len(), 2);
        assert_eq!(plan.options, strings(&["--deselect", "test_page.py::test_slow"]));
    }

    #[test]
    fn test_discovery_skips_hidden_and_cache_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".venv/lib")).unwrap();
        fs::create_dir_all(dir.path().join("__pycache__")).unwrap();
        fs::write(dir.path().join(".venv/lib/test_vendored.py"), "").unwrap();
        fs::write(dir.path().join("__pycache__/test_cached.py"), "").unwrap();
        fs::write(dir.path().join("test_page.py"), "").unwrap();

        let found = discover_tests(dir.path()).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("test_page.py"));
    }

    #[cfg(unix)]
    #[test]
    fn test_discovery_does_not_follow_directory_symlinks() {
        let dir = TempDir::new().unwrap();
        let tests = dir.path().join("tests");
        fs::create_dir_all(&tests).unwrap();
        fs::write(tests.join("test_a.py"), "").unwrap();
        std::os::unix::fs::symlink(&tests, tests.join("loop")).unwrap();

        let found = discover_tests(&tests).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("tests/test_a.py"));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_is_discovery_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir_all(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users can read the directory anyway
        let readable = fs::read_dir(&locked).is_ok();
        let result = discover_tests(dir.path());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        if !readable {
            assert!(matches!(result.unwrap_err(), AppError::Discovery(_)));
        }
    }

    #[test]
    fn test_plan_uses_explicit_targets() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("test_ignored.py"), "").unwrap();

        let mut config = config_with_dir(dir.path());
        config.runner_args = strings(&["test_only.py", "-x"]);

        let plan = plan_fanout(&config).unwrap();
        assert_eq!(plan.targets, strings(&["test_only.py"]));
        assert_eq!(plan.options, strings(&["-x"]));
    }

    #[test]
    fn test_plan_discovers_and_defaults_options() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("test_a.py"), "").unwrap();
        fs::write(dir.path().join("test_b.py"), "").unwrap();

        let plan = plan_fanout(&config_with_dir(dir.path())).unwrap();
        assert_eq!(plan.targets.len(), 2);
        assert_eq!(plan.options, strings(&["-v"]));
    }

    #[test]
    fn test_plan_with_no_targets_is_discovery_error() {
        let dir = TempDir::new().unwrap();
        let error = plan_fanout(&config_with_dir(dir.path())).unwrap_err();
        assert!(matches!(error, AppError::Discovery(_)));
    }
}
