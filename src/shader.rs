//! GLSL to SPIR-V compilation.
//!
//! Sources are compiled at startup from string literals. A failure carries the
//! compiler output prefixed with the numbered source so line references in the
//! log can be matched up.

use std::fmt;
use std::io::{Cursor, Read};

use gfx_hal::pso;

use crate::error::ShaderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

impl From<ShaderStage> for glsl_to_spirv::ShaderType {
    fn from(stage: ShaderStage) -> Self {
        match stage {
            ShaderStage::Vertex => glsl_to_spirv::ShaderType::Vertex,
            ShaderStage::Fragment => glsl_to_spirv::ShaderType::Fragment,
        }
    }
}

/// Compiles one stage to SPIR-V words.
pub fn compile(source: &str, stage: ShaderStage) -> Result<Vec<u32>, ShaderError> {
    let mut file = glsl_to_spirv::compile(source, stage.into()).map_err(|log| {
        ShaderError::Compile {
            stage,
            log: format_diagnostic(source, &log),
        }
    })?;

    let mut buf = vec![];
    file.read_to_end(&mut buf)
        .map_err(|source| ShaderError::Spirv { stage, source })?;
    let words = pso::read_spirv(Cursor::new(&buf[..]))
        .map_err(|source| ShaderError::Spirv { stage, source })?;

    log::debug!("compiled {} shader ({} words)", stage, words.len());
    Ok(words)
}

/// Numbers each source line and appends the compiler log.
pub fn format_diagnostic(source: &str, log: &str) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let width = lines.len().max(1).to_string().len();

    let numbered = lines
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{:>width$}: {}", i + 1, line, width = width))
        .collect::<Vec<_>>()
        .join("\n");

    let log = log.trim_end();
    match (numbered.is_empty(), log.is_empty()) {
        (true, true) => "no diagnostic output".to_string(),
        (true, false) => log.to_string(),
        (false, true) => numbered,
        (false, false) => format!("{}\n\n{}", numbered, log),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ORANGE_FRAGMENT_SHADER, RED_FRAGMENT_SHADER, VERTEX_SHADER};

    const SPIRV_MAGIC: u32 = 0x0723_0203;

    // `void main();` declares a prototype, leaving the body at global scope.
    const STRAY_SEMICOLON_FRAGMENT: &str = "#version 450
layout (location = 0) out vec4 FragColor;
void main();
{
    FragColor = vec4(1.0, 0.5, 0.2, 1.0);
}
";

    #[test]
    fn builtin_sources_compile() {
        for (source, stage) in &[
            (VERTEX_SHADER, ShaderStage::Vertex),
            (ORANGE_FRAGMENT_SHADER, ShaderStage::Fragment),
            (RED_FRAGMENT_SHADER, ShaderStage::Fragment),
        ] {
            let words = compile(source, *stage).expect("builtin shader should compile");
            assert_eq!(words[0], SPIRV_MAGIC);
        }
    }

    #[test]
    fn invalid_source_produces_diagnostic() {
        let err = compile("#version 450\nvoid main() { nope }\n", ShaderStage::Vertex)
            .expect_err("garbage must not compile");
        match err {
            ShaderError::Compile { stage, log } => {
                assert_eq!(stage, ShaderStage::Vertex);
                assert!(!log.is_empty());
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn stray_semicolon_is_rejected() {
        let err = compile(STRAY_SEMICOLON_FRAGMENT, ShaderStage::Fragment).unwrap_err();
        assert!(err.to_string().starts_with("fragment shader failed to compile"));
    }

    #[test]
    fn diagnostic_numbers_source_lines() {
        let text = format_diagnostic("a\nb", "ERROR: 0:2: bad\n");
        assert_eq!(text, "1: a\n2: b\n\nERROR: 0:2: bad");
    }

    #[test]
    fn diagnostic_pads_line_numbers() {
        let source = (0..10).map(|_| "x").collect::<Vec<_>>().join("\n");
        let text = format_diagnostic(&source, "");
        assert!(text.starts_with(" 1: x"));
        assert!(text.ends_with("10: x"));
    }

    #[test]
    fn diagnostic_is_never_empty() {
        assert!(!format_diagnostic("", "").is_empty());
        assert_eq!(format_diagnostic("", "log"), "log");
    }
}
