use serde_json::{json, Value};
use std::fmt::Write;

use crate::cli::OutputFormat;
use crate::database::models::CategoryNode;

/// Output a success message in the appropriate format
pub fn output_success(output_format: OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });
            if let (Some(target), Some(Value::Object(extra))) = (response.as_object_mut(), data) {
                target.extend(extra);
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Indented outline, one category per line
pub fn render_tree(root: &CategoryNode) -> String {
    let mut out = String::new();
    let mut stack = vec![(root, 0usize)];
    while let Some((node, level)) = stack.pop() {
        let _ = writeln!(out, "{}{} ({})", "  ".repeat(level), node.name, node.category_id);
        for child in node.children.iter().rev() {
            stack.push((child, level + 1));
        }
    }
    out
}
