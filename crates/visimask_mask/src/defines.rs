//! Shader feature flags
//!
//! Defines select `#ifdef` branches when a shader is composed. Two materials
//! with the same set defines share a compiled variant.

use std::collections::BTreeMap;

/// Named boolean feature flags
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShaderDefines {
    flags: BTreeMap<String, bool>,
}

impl ShaderDefines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a flag; returns whether the value changed
    pub fn set(&mut self, name: &str, value: bool) -> bool {
        match self.flags.get_mut(name) {
            Some(v) if *v == value => false,
            Some(v) => {
                *v = value;
                true
            }
            None => {
                self.flags.insert(name.to_string(), value);
                true
            }
        }
    }

    /// Builder variant of [`set`](Self::set)
    pub fn with(mut self, name: &str, value: bool) -> Self {
        self.set(name, value);
        self
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    /// Names of all flags that are on, sorted
    pub fn active(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().filter(|(_, on)| **on).map(|(k, _)| k.as_str())
    }

    /// Deterministic key identifying the shader variant
    ///
    /// Only flags that are on contribute, so an explicit `false` and an
    /// absent flag produce the same key.
    pub fn variant_key(&self) -> String {
        let active: Vec<&str> = self.active().collect();
        if active.is_empty() {
            "default".to_string()
        } else {
            active.join("+")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_reports_change() {
        let mut d = ShaderDefines::new();
        assert!(d.set("A", true));
        assert!(!d.set("A", true));
        assert!(d.set("A", false));
        assert!(!d.is_set("A"));
    }

    #[test]
    fn test_variant_key_is_sorted_and_ignores_off_flags() {
        let a = ShaderDefines::new().with("B", true).with("A", true).with("C", false);
        let b = ShaderDefines::new().with("A", true).with("B", true);
        assert_eq!(a.variant_key(), "A+B");
        assert_eq!(a.variant_key(), b.variant_key());
    }

    #[test]
    fn test_empty_key() {
        assert_eq!(ShaderDefines::new().variant_key(), "default");
    }
}
