//! Renderer seam.
//!
//! Turning [`TemplateData`] into source text is left to a [`Renderer`]. The
//! bundled [`JsonRenderer`] writes the data itself, which external template
//! engines can consume.

use std::io::Write;

use crate::emitter::TemplateData;
use crate::error::CodegenResult;

/// Renders template data to an output stream.
pub trait Renderer {
    /// Write the rendered output.
    fn render(&self, data: &TemplateData, out: &mut dyn Write) -> CodegenResult<()>;
}

/// Serializes template data as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer {
    pretty: bool,
}

impl JsonRenderer {
    /// Compact output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Indented output.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Renderer for JsonRenderer {
    fn render(&self, data: &TemplateData, out: &mut dyn Write) -> CodegenResult<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut *out, data)?;
        } else {
            serde_json::to_writer(&mut *out, data)?;
        }
        out.write_all(b"\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use indexmap::IndexMap;

    use crate::snapshot::DatabaseKind;

    fn data() -> TemplateData {
        TemplateData {
            database: DatabaseKind::Sqlite,
            imports: BTreeMap::new(),
            tables: IndexMap::new(),
        }
    }

    #[test]
    fn test_json_renderer() {
        let mut out = Vec::new();
        JsonRenderer::new().render(&data(), &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"database\":\"sqlite\",\"imports\":{},\"tables\":{}}\n"
        );
    }

    #[test]
    fn test_pretty_json_renderer() {
        let mut out = Vec::new();
        JsonRenderer::pretty().render(&data(), &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("\n  \"database\": \"sqlite\""));
    }
}
