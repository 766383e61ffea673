//! Handler functions for config CLI commands.
//!
//! Implements `interject config {path,show,get,set,init,export}` and the
//! TOML dotted-key helpers they share.

use crate::cli::ConfigAction;
use interject_core::config::ENV_PREFIX;
use interject_core::{Error, RegistryConfig, Result};
use std::path::PathBuf;

// ============================================================================
// Command dispatch
// ============================================================================

/// Handle a config subcommand.
///
/// Receives the raw `--config` path (not a loaded config) because some
/// commands (path, init) work before a config file exists.
pub fn handle_config_command(config_path: Option<&str>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Path => cmd_config_path(config_path),
        ConfigAction::Show => {
            let config = RegistryConfig::load(config_path)?;
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
        ConfigAction::Get { key } => cmd_config_get(config_path, &key),
        ConfigAction::Set { key, value } => cmd_config_set(config_path, &key, &value),
        ConfigAction::Init { file, force } => cmd_config_init(file.as_deref(), force),
        ConfigAction::Export { docker_env } => {
            let config = RegistryConfig::load(config_path)?;
            cmd_config_export(&config, docker_env)
        }
    }
}

// ============================================================================
// Command handlers
// ============================================================================

fn cmd_config_path(config_path: Option<&str>) -> Result<()> {
    match RegistryConfig::resolve_config_path(config_path) {
        Some(path) => {
            println!("{}", path.display());
            if !path.exists() {
                eprintln!("(file does not exist; run `interject config init` to create it)");
            }
            Ok(())
        }
        None => Err(Error::config(
            "Could not determine config directory for this platform",
        )),
    }
}

fn cmd_config_get(config_path: Option<&str>, key: &str) -> Result<()> {
    let value = lookup(config_path, key)?;
    println!("{}", format_toml_value(&value));
    Ok(())
}

/// Look up a dotted key in the effective configuration.
fn lookup(config_path: Option<&str>, key: &str) -> Result<toml::Value> {
    let config = RegistryConfig::load(config_path)?;
    let value = toml::Value::try_from(&config).map_err(|e| Error::config(e.to_string()))?;
    get_nested_value(&value, key)
        .cloned()
        .ok_or_else(|| Error::config(format!("Key '{key}' not found in configuration")))
}

fn cmd_config_set(config_path: Option<&str>, key: &str, value: &str) -> Result<()> {
    let path = RegistryConfig::resolve_config_path(config_path)
        .ok_or_else(|| Error::config("Could not determine config directory"))?;

    if !path.exists() {
        return Err(Error::config(format!(
            "Config file does not exist at {}. Run `interject config init` first.",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(&path)?;
    let mut doc: toml::Value = toml::from_str(&content)
        .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))?;

    set_nested_value(&mut doc, key, parse_value(value))?;

    let toml_str = toml::to_string_pretty(&doc).map_err(|e| Error::config(e.to_string()))?;
    // Reject edits that no longer deserialize, e.g. a string depth.
    toml::from_str::<RegistryConfig>(&toml_str)
        .map_err(|e| Error::config(format!("Invalid value for '{key}': {e}")))?;
    std::fs::write(&path, toml_str)?;

    println!("Set {key} = {value} in {}", path.display());
    Ok(())
}

fn cmd_config_init(file: Option<&str>, force: bool) -> Result<()> {
    let path = match file {
        Some(p) => PathBuf::from(p),
        None => RegistryConfig::default_config_path()
            .ok_or_else(|| Error::config("Could not determine config directory"))?,
    };

    if path.exists() && !force {
        return Err(Error::config(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let toml_str = RegistryConfig::default().to_toml_string()?;
    std::fs::write(&path, &toml_str)?;

    println!("Config file created at {}", path.display());
    Ok(())
}

fn cmd_config_export(config: &RegistryConfig, docker_env: bool) -> Result<()> {
    for (key, value) in to_env_vars(config)? {
        if docker_env {
            println!("--env {key}={value}");
        } else {
            println!("{key}={value}");
        }
    }
    Ok(())
}

/// Flatten a config into `INTERJECT_<SECTION>_<FIELD>` pairs, sorted by name.
pub fn to_env_vars(config: &RegistryConfig) -> Result<Vec<(String, String)>> {
    let value = toml::Value::try_from(config).map_err(|e| Error::config(e.to_string()))?;
    let mut vars = Vec::new();
    flatten(&value, ENV_PREFIX, &mut vars);
    vars.sort();
    Ok(vars)
}

fn flatten(value: &toml::Value, prefix: &str, out: &mut Vec<(String, String)>) {
    match value {
        toml::Value::Table(table) => {
            for (key, child) in table {
                let name = format!("{prefix}_{}", key.to_uppercase());
                flatten(child, &name, out);
            }
        }
        other => out.push((prefix.to_string(), format_toml_value(other))),
    }
}

// ============================================================================
// TOML dotted-key helpers
// ============================================================================

/// Navigate a dotted key path in a TOML value tree.
fn get_nested_value<'a>(value: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    key.split('.')
        .try_fold(value, |current, part| current.as_table()?.get(part))
}

/// Set a value at a dotted key path, creating intermediate tables as needed.
fn set_nested_value(root: &mut toml::Value, key: &str, value: toml::Value) -> Result<()> {
    let (parents, last) = match key.rsplit_once('.') {
        Some((parents, last)) => (Some(parents), last),
        None => (None, key),
    };
    if last.is_empty() {
        return Err(Error::config("Empty key path"));
    }

    let mut current = root;
    for part in parents.into_iter().flat_map(|p| p.split('.')) {
        let table = current
            .as_table_mut()
            .ok_or_else(|| Error::config("Cannot navigate into a non-table value"))?;
        current = table
            .entry(part)
            .or_insert(toml::Value::Table(toml::map::Map::new()));
    }

    current
        .as_table_mut()
        .ok_or_else(|| Error::config("Cannot set key on a non-table value"))?
        .insert(last.to_string(), value);
    Ok(())
}

/// Parse a string value into a TOML value, auto-detecting the type.
///
/// Priority: bool, integer, float, string.
fn parse_value(s: &str) -> toml::Value {
    if let Ok(b) = s.parse::<bool>() {
        return toml::Value::Boolean(b);
    }
    if let Ok(i) = s.parse::<i64>() {
        return toml::Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return toml::Value::Float(f);
    }
    toml::Value::String(s.to_string())
}

/// Format a TOML value for display on stdout.
fn format_toml_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Datetime(dt) => dt.to_string(),
        toml::Value::Array(_) | toml::Value::Table(_) => {
            toml::to_string_pretty(value).unwrap_or_else(|_| format!("{value:?}"))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn write_default(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, RegistryConfig::default().to_toml_string().unwrap()).unwrap();
        path
    }

    // ------------------------------------------------------------------------
    // path / show / get
    // ------------------------------------------------------------------------

    #[test]
    fn test_cmd_config_path_explicit() {
        assert!(cmd_config_path(Some("/explicit/config.toml")).is_ok());
    }

    #[test]
    fn test_handle_config_show() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_default(&dir);
        let result = handle_config_command(path.to_str(), ConfigAction::Show);
        assert!(result.is_ok());
    }

    #[test]
    fn test_lookup_nested_key() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[resolution]\nmax_depth = 12\n").unwrap();

        let value = lookup(path.to_str(), "resolution.max_depth").unwrap();
        assert_eq!(value, toml::Value::Integer(12));
        assert!(cmd_config_get(path.to_str(), "name").is_ok());
    }

    #[test]
    fn test_cmd_config_get_missing_key() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_default(&dir);

        let result = cmd_config_get(path.to_str(), "nonexistent.key");
        assert!(result.unwrap_err().to_string().contains("not found"));
    }

    // ------------------------------------------------------------------------
    // set
    // ------------------------------------------------------------------------

    #[test]
    fn test_cmd_config_set_nested_key() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_default(&dir);

        cmd_config_set(path.to_str(), "resolution.max_depth", "9").unwrap();
        cmd_config_set(path.to_str(), "aop.enabled_by_default", "true").unwrap();

        let config = RegistryConfig::load(path.to_str()).unwrap();
        assert_eq!(config.resolution.max_depth, 9);
        assert!(config.aop.enabled_by_default);
    }

    #[test]
    fn test_cmd_config_set_rejects_invalid_value() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_default(&dir);

        let result = cmd_config_set(path.to_str(), "resolution.max_depth", "deep");
        assert!(result.unwrap_err().to_string().contains("Invalid value"));

        let config = RegistryConfig::load(path.to_str()).unwrap();
        assert_eq!(config.resolution.max_depth, RegistryConfig::default().resolution.max_depth);
    }

    #[test]
    fn test_cmd_config_set_missing_file() {
        let result = cmd_config_set(Some("/nonexistent/config.toml"), "name", "value");
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    // ------------------------------------------------------------------------
    // init
    // ------------------------------------------------------------------------

    #[test]
    fn test_cmd_config_init_creates_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("interject").join("config.toml");

        cmd_config_init(path.to_str(), false).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("[resolution]"));
        assert!(content.contains("[aop]"));
    }

    #[test]
    fn test_cmd_config_init_no_overwrite() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "existing").unwrap();

        let result = cmd_config_init(path.to_str(), false);
        assert!(result.unwrap_err().to_string().contains("already exists"));
    }

    #[test]
    fn test_cmd_config_init_force_overwrites() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "old content").unwrap();

        cmd_config_init(path.to_str(), true).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("max_depth"));
    }

    // ------------------------------------------------------------------------
    // export
    // ------------------------------------------------------------------------

    #[test]
    fn test_to_env_vars() {
        let config = RegistryConfig::default().with_max_depth(7);
        let vars = to_env_vars(&config).unwrap();
        assert!(vars.contains(&("INTERJECT_NAME".to_string(), "interject".to_string())));
        assert!(vars.contains(&("INTERJECT_RESOLUTION_MAX_DEPTH".to_string(), "7".to_string())));
        assert!(vars.contains(&(
            "INTERJECT_AOP_ENABLED_BY_DEFAULT".to_string(),
            "false".to_string()
        )));
        assert!(cmd_config_export(&config, true).is_ok());
    }

    // ------------------------------------------------------------------------
    // Dotted-key helpers
    // ------------------------------------------------------------------------

    #[test]
    fn test_get_nested_value() {
        let val: toml::Value = toml::from_str("top = 1\n[resolution]\nmax_depth = 3").unwrap();
        assert_eq!(get_nested_value(&val, "top"), Some(&toml::Value::Integer(1)));
        assert_eq!(
            get_nested_value(&val, "resolution.max_depth"),
            Some(&toml::Value::Integer(3))
        );
        assert!(get_nested_value(&val, "resolution.missing").is_none());
        assert!(get_nested_value(&val, "top.below").is_none());
    }

    #[test]
    fn test_set_nested_value_creates_tables() {
        let mut val = toml::Value::Table(toml::map::Map::new());
        set_nested_value(&mut val, "a.b.c", toml::Value::Integer(1)).unwrap();
        assert_eq!(get_nested_value(&val, "a.b.c"), Some(&toml::Value::Integer(1)));
    }

    #[test]
    fn test_set_nested_value_errors() {
        let mut val: toml::Value = toml::from_str("name = \"x\"").unwrap();
        assert!(set_nested_value(&mut val, "name.inner", toml::Value::Integer(1)).is_err());
        assert!(set_nested_value(&mut val, "a.", toml::Value::Integer(1)).is_err());
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("true"), toml::Value::Boolean(true));
        assert_eq!(parse_value("42"), toml::Value::Integer(42));
        assert_eq!(parse_value("1.5"), toml::Value::Float(1.5));
        assert_eq!(parse_value("hello"), toml::Value::String("hello".into()));
    }

    #[test]
    fn test_format_toml_value() {
        assert_eq!(format_toml_value(&toml::Value::String("s".into())), "s");
        assert_eq!(format_toml_value(&toml::Value::Boolean(false)), "false");
    }
}
