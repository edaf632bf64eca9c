use tabled::Table;

use crate::{error, registry::ToolRegistry};

/// Prints the registered tools, as a table or as the JSON served on `GET /tools`.
pub fn list_tools(json: bool) {
    let registry = ToolRegistry::default();

    if json {
        match serde_json::to_string_pretty(registry.tools()) {
            Ok(out) => println!("{}", out),
            Err(e) => error!("Failed to render tool registry: {}", e),
        }
        return;
    }

    let table = Table::new(registry.table_rows());
    println!("{}", table);
}
