use thiserror::Error;

use crate::shader::ShaderStage;

/// Fatal failures while bringing up the window and the graphics device.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("graphics backend is not supported on this system")]
    UnsupportedBackend,
    #[error("failed to create a surface: {0}")]
    Surface(String),
    #[error("no graphics adapter found")]
    NoAdapter,
    #[error("no queue family can present and draw to the window")]
    NoQueueFamily,
    #[error("failed to open device: {0}")]
    Device(String),
    /// A GPU object needed before the first frame could not be created.
    #[error("can't create {what}: {reason}")]
    Resource { what: &'static str, reason: String },
}

impl InitError {
    pub(crate) fn resource<E: std::fmt::Debug>(what: &'static str, err: E) -> Self {
        InitError::Resource {
            what,
            reason: format!("{:?}", err),
        }
    }
}

/// Diagnostics from building the shader program. Never fatal.
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("{stage} shader produced unreadable SPIR-V: {source}")]
    Spirv {
        stage: ShaderStage,
        #[source]
        source: std::io::Error,
    },
    #[error("{stage} shader module rejected by the device: {reason}")]
    Module { stage: ShaderStage, reason: String },
    #[error("shader program failed to link: {0}")]
    Link(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_error_names_the_object() {
        let err = InitError::resource("render pass", "OutOfMemory");
        let msg = err.to_string();
        assert!(msg.contains("render pass"));
        assert!(msg.contains("OutOfMemory"));
    }

    #[test]
    fn compile_error_keeps_the_log() {
        let err = ShaderError::Compile {
            stage: ShaderStage::Fragment,
            log: "ERROR: 0:3: '{' : syntax error".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("fragment shader"));
        assert!(msg.contains("syntax error"));
    }
}
