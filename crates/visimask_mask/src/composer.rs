//! WGSL composition for plugin materials
//!
//! Composition runs in two steps:
//!
//! 1. Every `//#inject NAME` line of the base shader is replaced by the code
//!    each plugin provides for that [`InjectionPoint`], in plugin order.
//!    `PLUGIN_GROUP` inside plugin code becomes the plugin's bind group index.
//! 2. A line-based preprocessor evaluates `#ifdef`, `#ifndef`, `#else` and
//!    `#endif` against the material's [`ShaderDefines`]. Directives nest.

use std::fmt;

use crate::defines::ShaderDefines;
use crate::plugin::{InjectionPoint, MaterialPlugin, PluginMaterial};

/// Placeholder replaced by a plugin's bind group index
pub const PLUGIN_GROUP_TOKEN: &str = "PLUGIN_GROUP";

const INJECT_PREFIX: &str = "//#inject";

/// Errors raised while composing a shader
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeError {
    /// `//#inject` names a point that does not exist
    UnknownInjectionPoint { line: usize, name: String },
    /// A plugin provides code for a point the base shader lacks
    MissingInjectionPoint { plugin: &'static str, point: &'static str },
    /// More plugins than bind groups available
    TooManyPlugins { count: usize, max: usize },
    /// `#ifdef`/`#ifndef` without a name
    MissingDefineName { line: usize },
    /// `#else` or `#endif` with no open block
    UnbalancedDirective { line: usize, directive: String },
    /// Second `#else` in one block
    DuplicateElse { line: usize },
    /// Block still open at end of source
    UnterminatedIfdef { line: usize },
    /// Any other `#` directive
    UnknownDirective { line: usize, directive: String },
}

impl fmt::Display for ComposeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComposeError::UnknownInjectionPoint { line, name } => {
                write!(f, "line {}: unknown injection point '{}'", line, name)
            }
            ComposeError::MissingInjectionPoint { plugin, point } => {
                write!(f, "plugin {} injects into {}, which the base shader lacks", plugin, point)
            }
            ComposeError::TooManyPlugins { count, max } => {
                write!(f, "{} plugins attached but only {} bind groups available", count, max)
            }
            ComposeError::MissingDefineName { line } => {
                write!(f, "line {}: conditional directive without a define name", line)
            }
            ComposeError::UnbalancedDirective { line, directive } => {
                write!(f, "line {}: '{}' without matching #ifdef", line, directive)
            }
            ComposeError::DuplicateElse { line } => write!(f, "line {}: second #else in block", line),
            ComposeError::UnterminatedIfdef { line } => {
                write!(f, "line {}: conditional block is never closed", line)
            }
            ComposeError::UnknownDirective { line, directive } => {
                write!(f, "line {}: unknown directive '{}'", line, directive)
            }
        }
    }
}

impl std::error::Error for ComposeError {}

/// Builds shader source for plugin materials from a base shader
#[derive(Clone, Debug)]
pub struct ShaderComposer {
    base: String,
    first_plugin_group: u32,
    max_plugins: usize,
}

impl ShaderComposer {
    /// Plugins use bind groups 2 and 3 by default (0 = frame, 1 = object)
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into(), first_plugin_group: 2, max_plugins: 2 }
    }

    pub fn with_plugin_groups(mut self, first: u32, max_plugins: usize) -> Self {
        self.first_plugin_group = first;
        self.max_plugins = max_plugins;
        self
    }

    pub fn first_plugin_group(&self) -> u32 {
        self.first_plugin_group
    }

    pub fn max_plugins(&self) -> usize {
        self.max_plugins
    }

    /// Bind group index of the plugin at `index` in plugin order
    pub fn plugin_group(&self, index: usize) -> u32 {
        self.first_plugin_group + index as u32
    }

    /// Compose the final WGSL for `material` using its current defines
    pub fn compose(&self, material: &PluginMaterial) -> Result<String, ComposeError> {
        let injected = self.inject(material.plugins())?;
        preprocess(&injected, material.defines())
    }

    /// Step 1 only: splice plugin code into the base shader
    pub fn inject(&self, plugins: &[Box<dyn MaterialPlugin>]) -> Result<String, ComposeError> {
        if plugins.len() > self.max_plugins {
            return Err(ComposeError::TooManyPlugins { count: plugins.len(), max: self.max_plugins });
        }

        let mut found = Vec::new();
        let mut out = String::with_capacity(self.base.len() * 2);

        for (i, line) in self.base.lines().enumerate() {
            let trimmed = line.trim();
            let Some(rest) = trimmed.strip_prefix(INJECT_PREFIX) else {
                out.push_str(line);
                out.push('\n');
                continue;
            };

            let name = rest.trim();
            let point = InjectionPoint::from_marker(name).ok_or_else(|| {
                ComposeError::UnknownInjectionPoint { line: i + 1, name: name.to_string() }
            })?;
            found.push(point);

            for (index, plugin) in plugins.iter().enumerate() {
                if let Some(code) = plugin.custom_code(point) {
                    let group = self.plugin_group(index).to_string();
                    out.push_str(&code.replace(PLUGIN_GROUP_TOKEN, &group));
                    if !code.ends_with('\n') {
                        out.push('\n');
                    }
                }
            }
        }

        for plugin in plugins {
            for point in InjectionPoint::ALL {
                if plugin.custom_code(point).is_some() && !found.contains(&point) {
                    return Err(ComposeError::MissingInjectionPoint {
                        plugin: plugin.class_name(),
                        point: point.marker(),
                    });
                }
            }
        }

        Ok(out)
    }
}

struct Block {
    opened_at: usize,
    parent_active: bool,
    condition: bool,
    in_else: bool,
}

impl Block {
    fn active(&self) -> bool {
        self.parent_active && (self.condition != self.in_else)
    }
}

/// Resolve conditional directives against `defines`
///
/// Lines inside inactive branches are dropped; directive lines are never
/// emitted.
pub fn preprocess(source: &str, defines: &ShaderDefines) -> Result<String, ComposeError> {
    let mut out = String::with_capacity(source.len());
    let mut stack: Vec<Block> = Vec::new();

    for (i, line) in source.lines().enumerate() {
        let line_no = i + 1;
        let active = stack.last().map_or(true, Block::active);
        let trimmed = line.trim_start();

        let Some(directive) = trimmed.strip_prefix('#') else {
            if active {
                out.push_str(line);
                out.push('\n');
            }
            continue;
        };

        let mut parts = directive.split_whitespace();
        let keyword = parts.next().unwrap_or("");
        match keyword {
            "ifdef" | "ifndef" => {
                let name = parts.next().ok_or(ComposeError::MissingDefineName { line: line_no })?;
                let set = defines.is_set(name);
                stack.push(Block {
                    opened_at: line_no,
                    parent_active: active,
                    condition: if keyword == "ifdef" { set } else { !set },
                    in_else: false,
                });
            }
            "else" => {
                let block = stack.last_mut().ok_or_else(|| ComposeError::UnbalancedDirective {
                    line: line_no,
                    directive: "#else".to_string(),
                })?;
                if block.in_else {
                    return Err(ComposeError::DuplicateElse { line: line_no });
                }
                block.in_else = true;
            }
            "endif" => {
                stack.pop().ok_or_else(|| ComposeError::UnbalancedDirective {
                    line: line_no,
                    directive: "#endif".to_string(),
                })?;
            }
            other => {
                return Err(ComposeError::UnknownDirective {
                    line: line_no,
                    directive: format!("#{}", other),
                });
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(ComposeError::UnterminatedIfdef { line: open.opened_at });
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uniforms::ShaderParameterSink;
    use std::any::Any;

    fn defines(names: &[&str]) -> ShaderDefines {
        let mut d = ShaderDefines::new();
        for n in names {
            d.set(n, true);
        }
        d
    }

    #[test]
    fn test_ifdef_else() {
        let src = "a\n#ifdef X\nb\n#else\nc\n#endif\nd\n";
        assert_eq!(preprocess(src, &defines(&["X"])).unwrap(), "a\nb\nd\n");
        assert_eq!(preprocess(src, &defines(&[])).unwrap(), "a\nc\nd\n");
    }

    #[test]
    fn test_ifndef() {
        let src = "#ifndef X\nyes\n#endif\n";
        assert_eq!(preprocess(src, &defines(&[])).unwrap(), "yes\n");
        assert_eq!(preprocess(src, &defines(&["X"])).unwrap(), "");
    }

    #[test]
    fn test_nested_blocks_respect_parent() {
        let src = "#ifdef A\n#ifdef B\nab\n#else\na\n#endif\n#else\n#ifdef B\nb\n#endif\nnone\n#endif\n";
        assert_eq!(preprocess(src, &defines(&["A", "B"])).unwrap(), "ab\n");
        assert_eq!(preprocess(src, &defines(&["A"])).unwrap(), "a\n");
        assert_eq!(preprocess(src, &defines(&["B"])).unwrap(), "b\nnone\n");
        assert_eq!(preprocess(src, &defines(&[])).unwrap(), "none\n");
    }

    #[test]
    fn test_indented_directives() {
        let src = "    #ifdef X\n    x\n    #endif\n";
        assert_eq!(preprocess(src, &defines(&["X"])).unwrap(), "    x\n");
    }

    #[test]
    fn test_directive_errors() {
        let d = defines(&[]);
        assert_eq!(
            preprocess("#endif\n", &d),
            Err(ComposeError::UnbalancedDirective { line: 1, directive: "#endif".into() })
        );
        assert_eq!(
            preprocess("x\n#else\n", &d),
            Err(ComposeError::UnbalancedDirective { line: 2, directive: "#else".into() })
        );
        assert_eq!(preprocess("#ifdef A\n", &d), Err(ComposeError::UnterminatedIfdef { line: 1 }));
        assert_eq!(
            preprocess("#ifdef A\n#else\n#else\n#endif\n", &d),
            Err(ComposeError::DuplicateElse { line: 3 })
        );
        assert_eq!(preprocess("#ifdef\n#endif\n", &d), Err(ComposeError::MissingDefineName { line: 1 }));
        assert_eq!(
            preprocess("#define X\n", &d),
            Err(ComposeError::UnknownDirective { line: 1, directive: "#define".into() })
        );
    }

    struct Snippet {
        code: &'static str,
        point: InjectionPoint,
    }

    impl MaterialPlugin for Snippet {
        fn class_name(&self) -> &'static str {
            "Snippet"
        }
        fn is_enabled(&self) -> bool {
            true
        }
        fn prepare_defines(&self, _: &mut ShaderDefines) {}
        fn bind_for_draw(&self, _: &mut dyn ShaderParameterSink) {}
        fn custom_code(&self, point: InjectionPoint) -> Option<&'static str> {
            (point == self.point).then_some(self.code)
        }
        fn take_defines_dirty(&mut self) -> bool {
            false
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn snippet(code: &'static str, point: InjectionPoint) -> Box<dyn MaterialPlugin> {
        Box::new(Snippet { code, point })
    }

    #[test]
    fn test_inject_in_plugin_order_with_groups() {
        let composer = ShaderComposer::new("top\n    //#inject CUSTOM_VERTEX_DEFINITIONS\nbottom\n");
        let plugins = vec![
            snippet("@group(PLUGIN_GROUP) first", InjectionPoint::VertexDefinitions),
            snippet("@group(PLUGIN_GROUP) second\n", InjectionPoint::VertexDefinitions),
        ];
        assert_eq!(
            composer.inject(&plugins).unwrap(),
            "top\n@group(2) first\n@group(3) second\nbottom\n"
        );
    }

    #[test]
    fn test_empty_marker_is_removed() {
        let composer = ShaderComposer::new("a\n//#inject CUSTOM_VARYINGS\nb\n");
        assert_eq!(composer.inject(&[]).unwrap(), "a\nb\n");
    }

    #[test]
    fn test_unknown_marker() {
        let composer = ShaderComposer::new("a\n//#inject CUSTOM_WHATEVER\n");
        assert_eq!(
            composer.inject(&[]),
            Err(ComposeError::UnknownInjectionPoint { line: 2, name: "CUSTOM_WHATEVER".into() })
        );
    }

    #[test]
    fn test_missing_marker_for_plugin_code() {
        let composer = ShaderComposer::new("no markers\n");
        let plugins = vec![snippet("x", InjectionPoint::Varyings)];
        assert_eq!(
            composer.inject(&plugins),
            Err(ComposeError::MissingInjectionPoint { plugin: "Snippet", point: "CUSTOM_VARYINGS" })
        );
    }

    #[test]
    fn test_too_many_plugins() {
        let composer = ShaderComposer::new("").with_plugin_groups(2, 1);
        let plugins = vec![
            snippet("a", InjectionPoint::Varyings),
            snippet("b", InjectionPoint::Varyings),
        ];
        assert_eq!(composer.inject(&plugins), Err(ComposeError::TooManyPlugins { count: 2, max: 1 }));
    }
}
