use comfy_table::{Table, presets::UTF8_FULL};
use subgrapher_deploy::DeploymentPlan;
use subgrapher_manifest::ManifestDocument;

/// Print a success message with a green checkmark
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        eprintln!("{} {}", console::style("✓").green().bold(), format!($($arg)*))
    };
}

/// Print an error message with a red cross, including the full error chain
#[macro_export]
macro_rules! error {
    ($err:expr) => {{
        eprintln!("{} {}", console::style("✗").red().bold(), $err);

        let err_ref = &$err;
        for cause in err_ref.chain().skip(1) {
            eprintln!(
                "  {} {}",
                console::style("→").dim(),
                console::style(cause).dim()
            );
        }
    }};
}

/// Data sources of a manifest, one row each.
pub fn data_source_table(document: &ManifestDocument) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Data source", "Network", "Address", "Start block", "Handlers"]);

    for data_source in &document.data_sources {
        table.add_row(vec![
            data_source.name.clone(),
            data_source.network.to_string(),
            data_source.source.address.to_string(),
            data_source.source.start_block.to_string(),
            data_source
                .mapping
                .event_handlers
                .iter()
                .map(|binding| binding.handler.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        ]);
    }
    for template in &document.templates {
        table.add_row(vec![
            format!("{} (template)", template.name),
            template.network.to_string(),
            "-".to_string(),
            "-".to_string(),
            template.mapping.event_handlers.len().to_string(),
        ]);
    }

    table
}

/// The decisions a pipeline run ended with.
pub fn plan_table(plan: &DeploymentPlan) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Decision", "Value"]);
    for (name, value) in plan.summary() {
        table.add_row(vec![name.to_string(), value]);
    }
    table
}

#[cfg(test)]
mod tests {
    use subgrapher_deploy::NetworkSelection;

    use super::*;

    #[test]
    fn test_plan_table_masks_the_token() {
        let plan = DeploymentPlan::default()
            .with_team("kwenta")
            .with_access_token("hunter2")
            .with_network(NetworkSelection::All);

        let rendered = plan_table(&plan).to_string();
        assert!(rendered.contains("kwenta"));
        assert!(rendered.contains("All"));
        assert!(!rendered.contains("hunter2"));
    }
}
