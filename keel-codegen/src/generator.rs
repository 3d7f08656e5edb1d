//! Generation orchestration.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::GeneratorConfig;
use crate::emitter::{TemplateData, emit};
use crate::error::CodegenResult;
use crate::introspect::Introspector;
use crate::render::{JsonRenderer, Renderer};
use crate::resolver::resolve;
use crate::snapshot::{SchemaSnapshot, SnapshotOptions};

/// Reads a schema and produces model template data.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    /// Create a generator from configuration.
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// Load the configuration from a TOML file.
    pub fn from_config(path: impl AsRef<Path>) -> CodegenResult<Self> {
        Ok(Self::new(GeneratorConfig::load(path)?))
    }

    /// The configuration.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Snapshot, introspect, resolve and emit.
    pub fn template_data(&self, source: &mut dyn SchemaSnapshot) -> CodegenResult<TemplateData> {
        let filter = self.config.table_filter()?;
        let database = self
            .config
            .database
            .driver
            .unwrap_or_else(|| source.database_kind());

        let options = SnapshotOptions {
            include_views: self.config.models.include_views,
            schema: self.config.database.schema.clone(),
        };
        let schema = source.snapshot(&options)?;
        debug!(tables = schema.tables.len(), %database, "read schema snapshot");

        let metadata = Introspector::new(database)
            .snake_case(self.config.models.snake_case)
            .column_types(&self.config.models.column_types)
            .introspect(&schema);

        let resolved = resolve(&metadata, &filter)?;
        Ok(emit(database, &resolved, &metadata.model_names))
    }

    /// Render the template data to a byte buffer.
    pub fn render(
        &self,
        source: &mut dyn SchemaSnapshot,
        renderer: &dyn Renderer,
    ) -> CodegenResult<Vec<u8>> {
        let data = self.template_data(source)?;
        let mut buffer = Vec::new();
        renderer.render(&data, &mut buffer)?;
        Ok(buffer)
    }

    /// Generate into the configured output path.
    ///
    /// Nothing is written unless resolution and rendering succeed.
    pub fn generate(
        &self,
        source: &mut dyn SchemaSnapshot,
        renderer: &dyn Renderer,
    ) -> CodegenResult<PathBuf> {
        let output = self.config.output.path.clone();
        let buffer = self.render(source, renderer)?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&output, buffer)?;
        info!(path = %output.display(), "generated models");
        Ok(output)
    }

    /// Renderer matching the output configuration.
    pub fn default_renderer(&self) -> JsonRenderer {
        if self.config.output.pretty {
            JsonRenderer::pretty()
        } else {
            JsonRenderer::new()
        }
    }
}
