//! Output formatters for resolved configurations and metadata.

use clap::ValueEnum;
use comfy_table::{Cell, Table};
use serde_json::json;
use spatial_entity_core::{
    FunctionKind, MetadataBundle, MetadataDriver, ResolvedConfiguration,
};

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter {
    /// Format a resolved configuration.
    fn format_resolved(&self, resolved: &ResolvedConfiguration) -> String;

    /// Format loaded mapping metadata.
    fn format_metadata(&self, bundle: &MetadataBundle) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

fn path_list(paths: &[std::path::PathBuf]) -> Vec<String> {
    paths.iter().map(|p| p.display().to_string()).collect()
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_resolved(&self, resolved: &ResolvedConfiguration) -> String {
        let driver = resolved.metadata_driver();
        let proxy = resolved.proxy();

        let mut table = Table::new();
        table.set_header(vec!["Setting", "Value"]);
        table.add_row(vec![Cell::new("mode"), Cell::new(resolved.mode())]);
        table.add_row(vec![
            Cell::new("domains"),
            Cell::new(resolved.domains().join(", ")),
        ]);
        table.add_row(vec![Cell::new("driver"), Cell::new(driver.kind())]);
        table.add_row(vec![
            Cell::new("mapping paths"),
            Cell::new(path_list(driver.paths()).join("\n")),
        ]);
        table.add_row(vec![
            Cell::new("cache"),
            Cell::new(resolved.metadata_cache().kind()),
        ]);
        table.add_row(vec![
            Cell::new("proxy dir"),
            Cell::new(proxy.directory.display()),
        ]);
        table.add_row(vec![Cell::new("proxy namespace"), Cell::new(&proxy.namespace)]);
        table.add_row(vec![
            Cell::new("auto-generate proxies"),
            Cell::new(proxy.auto_generate),
        ]);
        table.add_row(vec![
            Cell::new("custom types"),
            Cell::new(resolved.types().custom_names().join(", ")),
        ]);
        for kind in FunctionKind::ALL {
            let names: Vec<&str> = resolved.functions().functions(kind).map(|(n, _)| n).collect();
            if !names.is_empty() {
                table.add_row(vec![
                    Cell::new(format!("{kind} functions")),
                    Cell::new(names.join(", ")),
                ]);
            }
        }
        table.to_string()
    }

    fn format_metadata(&self, bundle: &MetadataBundle) -> String {
        if bundle.is_empty() {
            return "No entities".to_string();
        }

        let mut output = String::new();
        for entity in &bundle.entities {
            if !output.is_empty() {
                output.push_str("\n\n");
            }
            output.push_str(&format!("{} ({})\n", entity.name, entity.table));

            let mut table = Table::new();
            table.set_header(vec!["Field", "Column", "Type", "Nullable", "Id"]);
            for field in &entity.fields {
                table.add_row(vec![
                    Cell::new(&field.name),
                    Cell::new(&field.column),
                    Cell::new(&field.field_type),
                    Cell::new(field.nullable),
                    Cell::new(entity.is_identity(&field.name)),
                ]);
            }
            output.push_str(&table.to_string());
        }
        output
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_resolved(&self, resolved: &ResolvedConfiguration) -> String {
        let driver = resolved.metadata_driver();
        let proxy = resolved.proxy();
        let functions: serde_json::Map<String, serde_json::Value> = FunctionKind::ALL
            .into_iter()
            .map(|kind| {
                let entries: serde_json::Map<String, serde_json::Value> = resolved
                    .functions()
                    .functions(kind)
                    .map(|(name, handler)| (name.to_string(), json!(handler)))
                    .collect();
                (kind.to_string(), serde_json::Value::Object(entries))
            })
            .collect();

        let value = json!({
            "mode": resolved.mode().to_string(),
            "domains": resolved.domains(),
            "driver": driver.kind().as_str(),
            "mapping_paths": path_list(driver.paths()),
            "cache": resolved.metadata_cache().kind().to_string(),
            "proxy": {
                "directory": proxy.directory.display().to_string(),
                "namespace": proxy.namespace,
                "auto_generate": proxy.auto_generate,
            },
            "custom_types": resolved.types().custom_names(),
            "functions": functions,
        });
        serde_json::to_string_pretty(&value).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }

    fn format_metadata(&self, bundle: &MetadataBundle) -> String {
        serde_json::to_string_pretty(bundle).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }
}
