use luasense_api::models::VariableInfo;
use luasense_core::ServiceConfig;
use luasense_core::catalog::load_catalog_or_empty;
use luasense_lua::VariableTableBuilder;
use std::path::PathBuf;
use tabled::{Table, Tabled, settings::Style};

#[derive(Tabled)]
struct VariableRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    type_name: String,
    #[tabled(rename = "Scope")]
    scope: &'static str,
    #[tabled(rename = "Line")]
    line: usize,
    #[tabled(rename = "History")]
    history: String,
}

impl VariableRow {
    fn from_info(info: &VariableInfo) -> Self {
        let history = info
            .chain_type_history
            .iter()
            .flat_map(|entry| {
                entry
                    .positions
                    .iter()
                    .map(move |p| {
                        let arrow = if p.result_only { "⇒" } else { "→" };
                        format!("{}:{}{}{}", entry.line, p.column, arrow, p.type_name)
                    })
            })
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            name: info.name.clone(),
            type_name: if info.type_name.is_empty() {
                "-".to_string()
            } else {
                info.type_name.clone()
            },
            scope: info.scope.as_str(),
            line: info.declaration_line,
            history,
        }
    }
}

pub fn run(config: ServiceConfig, file: PathBuf, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(&file)?;
    let catalog = load_catalog_or_empty(config.catalog_path.as_deref())?;
    let (table, stats) = VariableTableBuilder::new(&catalog).build_with_stats(&text);

    if json {
        println!("{}", serde_json::to_string_pretty(&table.sorted())?);
        return Ok(());
    }

    let rows: Vec<VariableRow> = table.sorted().into_iter().map(VariableRow::from_info).collect();
    if rows.is_empty() {
        println!("No variables found.");
    } else {
        println!("{}", Table::new(&rows).with(Style::psql()));
    }
    println!(
        "{} variables, {} inference passes, {} left untyped",
        table.len(),
        stats.inference_passes,
        stats.untyped_remaining
    );
    Ok(())
}
