//! Integration tests for configuration loading
//!
//! Tests that verify:
//! 1. `config/default.toml` matches the built-in defaults
//! 2. Environment variables override file values
//! 3. `user.toml` overrides `default.toml`

use std::fs;
use std::path::PathBuf;

use serial_test::serial;
use visimask::config::AppConfig;
use visimask_mask::SquareMaskStyle;

/// Empty scratch directory for config files
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("visimask-config-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
#[serial]
fn test_default_file_matches_builtin_defaults() {
    let config = AppConfig::load().unwrap();
    let defaults = AppConfig::default();

    assert_eq!(config.window.title, defaults.window.title);
    assert_eq!(config.input.move_speed, defaults.input.move_speed);
    assert_eq!(config.mask.darken_factor, defaults.mask.darken_factor);
    assert_eq!(config.mask.depth_bias, defaults.mask.depth_bias);
    assert_eq!(config.post.levels, defaults.post.levels);
    assert_eq!(config.post.threshold, defaults.post.threshold);
    assert_eq!(config.post.scale, defaults.post.scale);
    assert_eq!(config.secondary.depth_resolution, defaults.secondary.depth_resolution);
    assert_eq!(config.texture.checkerboard, defaults.texture.checkerboard);
}

#[test]
#[serial]
fn test_env_override() {
    std::env::set_var("VM_WINDOW__TITLE", "Test From Env");
    let config = AppConfig::load().unwrap();
    std::env::remove_var("VM_WINDOW__TITLE");
    assert_eq!(config.window.title, "Test From Env");
}

#[test]
#[serial]
fn test_env_override_nested_section() {
    std::env::set_var("VM_MASK__SQUARE_STYLE", "binary");
    std::env::set_var("VM_SCENE__NAME", "showcase");
    let config = AppConfig::load().unwrap();
    std::env::remove_var("VM_MASK__SQUARE_STYLE");
    std::env::remove_var("VM_SCENE__NAME");

    assert_eq!(config.mask.square_style, SquareMaskStyle::Binary);
    assert_eq!(config.scene.name, "showcase");
}

#[test]
#[serial]
fn test_user_config_overrides_default() {
    let dir = scratch_dir("user");
    fs::write(dir.join("default.toml"), "[window]\ntitle = \"from default\"\nwidth = 800\n").unwrap();
    fs::write(dir.join("user.toml"), "[window]\ntitle = \"from user\"\n").unwrap();

    let config = AppConfig::load_from(&dir).unwrap();
    assert_eq!(config.window.title, "from user");
    assert_eq!(config.window.width, 800);
    // Sections absent from both files keep their defaults
    assert_eq!(config.post.levels, 4.0);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
#[serial]
fn test_missing_directory_yields_defaults() {
    let config = AppConfig::load_from("does/not/exist").unwrap();
    assert_eq!(config.window.width, 1280);
    assert_eq!(config.scene.name, "playground");
}

#[test]
#[serial]
fn test_invalid_value_is_an_error() {
    let dir = scratch_dir("invalid");
    fs::write(dir.join("default.toml"), "[window]\nwidth = \"wide\"\n").unwrap();

    let err = AppConfig::load_from(&dir).unwrap_err();
    assert!(err.to_string().starts_with("Configuration error"));

    let _ = fs::remove_dir_all(&dir);
}
