//! Report rendering for the CLI

use crate::error::Result;
use crate::estimator::{EstimateReport, EstimateWarning};
use comfy_table::{Cell, CellAlignment, Color, Table};
use console::style;

/// Cost above which a line is highlighted
const HIGH_COST_THRESHOLD: f64 = 100.0;

pub fn render_json(report: &EstimateReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn render_table(report: &EstimateReport) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Type", "ID", "Region", "Detail", "Monthly"]);

    for annotated in &report.resources {
        let r = &annotated.resource;
        let region = r.effective_region().unwrap_or_else(|| "-".to_string());
        let detail = match (r.size_gb, r.variant()) {
            (Some(size), Some(v)) => format!("{} {}GB", v, size),
            (Some(size), None) => format!("{}GB", size),
            (None, Some(v)) => v.to_string(),
            (None, None) => "-".to_string(),
        };

        let cost = Cell::new(format!("${:.2}", annotated.monthly_cost))
            .set_alignment(CellAlignment::Right);
        let cost = if annotated.monthly_cost >= HIGH_COST_THRESHOLD {
            cost.fg(Color::Red)
        } else if annotated.monthly_cost == 0.0 {
            cost.fg(Color::DarkGrey)
        } else {
            cost
        };

        table.add_row(vec![
            Cell::new(r.kind.as_str()),
            Cell::new(&r.id),
            Cell::new(region),
            Cell::new(detail),
            cost,
        ]);
    }

    let mut out = table.to_string();
    out.push_str(&format!(
        "\n\nTOTAL: ${:.2}/month ({} resources, {} pricing)\n",
        report.total,
        report.resources.len(),
        report.pricing_mode
    ));

    if !report.warnings.is_empty() {
        out.push_str(&format!("\n{}\n", style("WARNINGS:").yellow().bold()));
        for warning in &report.warnings {
            out.push_str(&format!("  - {}\n", describe(warning)));
        }
    }

    out
}

fn describe(warning: &EstimateWarning) -> String {
    match warning {
        EstimateWarning::InvalidPricingMode { value } => {
            format!("invalid pricing mode '{}', used static pricing", value)
        }
        EstimateWarning::DuplicateResource { kind, id } => {
            format!("duplicate {} {} dropped", kind, id)
        }
        EstimateWarning::LiveLookupFailed { kind, id, region, .. } => format!(
            "live price unavailable for {} {} ({}), used static pricing",
            kind,
            id,
            region.as_deref().unwrap_or("no region")
        ),
        EstimateWarning::UnknownKind { kind, id } => {
            format!("unknown kind {} for {}, costed at $0.00", kind, id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::PricingMode;
    use crate::resources::{AnnotatedResource, Resource};

    fn report() -> EstimateReport {
        EstimateReport {
            pricing_mode: PricingMode::Static,
            resources: vec![AnnotatedResource {
                resource: Resource::new("EBS", "vol-1")
                    .with_size_gb(10.0)
                    .with_volume_type("gp3")
                    .with_availability_zone("us-east-1a"),
                monthly_cost: 1.0,
            }],
            total: 1.0,
            warnings: vec![EstimateWarning::UnknownKind {
                kind: "FOO".to_string(),
                id: "x".to_string(),
            }],
        }
    }

    #[test]
    fn test_render_table() {
        let out = render_table(&report());
        assert!(out.contains("vol-1"));
        assert!(out.contains("us-east-1"));
        assert!(out.contains("$1.00"));
        assert!(out.contains("TOTAL: $1.00/month"));
        assert!(out.contains("unknown kind FOO"));
    }

    #[test]
    fn test_render_json() {
        let json = render_json(&report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total"], serde_json::json!(1.0));
        assert_eq!(value["pricing_mode"], serde_json::json!("static"));
        assert_eq!(value["resources"][0]["monthly_cost"], serde_json::json!(1.0));
        assert_eq!(value["warnings"][0]["warning"], serde_json::json!("unknown_kind"));
    }
}
