//! Human-readable text output formatter

use crate::error::Result;
use crate::format::{OutputFormatter, Report};

/// Text formatter - outputs a summary plus one line per hit
pub struct TextFormatter;

impl OutputFormatter for TextFormatter {
    fn name(&self) -> &str {
        "text"
    }

    fn description(&self) -> &str {
        "Human-readable text"
    }

    fn format(&self, report: &Report) -> Result<String> {
        let mut output = String::new();

        // Header
        output.push_str(&format!("geoquery results ({})\n", report.id));
        output.push_str(&format!("Collection: {} (field: {})\n", report.collection, report.field));
        output.push_str(&format!(
            "Center: ({:.6}, {:.6})\n",
            report.center.lat, report.center.lng
        ));
        output.push_str(&format!("Radius: {} km\n", report.radius_km));
        output.push_str(&format!("Cells: {}\n\n", report.cells.join(", ")));

        if report.hits.is_empty() {
            output.push_str("No hits\n");
            return Ok(output);
        }

        output.push_str(&format!("Hits ({}):\n", report.hits.len()));
        let width = report.hits.iter().map(|h| h.id().len()).max().unwrap_or(0);
        for hit in &report.hits {
            output.push_str(&format!(
                "  {:<width$}  {:>10.3} km  {:>8.2}°\n",
                hit.id(),
                hit.distance(),
                hit.bearing(),
                width = width
            ));
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::tests::sample_report;

    #[test]
    fn test_text_format() {
        let output = TextFormatter.format(&sample_report()).unwrap();

        assert!(output.contains("geoquery results"));
        assert!(output.contains("Center: (40.500000, -80.000000)"));
        assert!(output.contains("Radius: 5 km"));
        assert!(output.contains("Hits (2):"));
        assert!(output.contains("0.200 km"));
        assert!(output.contains("90.00°"));
    }

    #[test]
    fn test_text_format_empty() {
        let mut report = sample_report();
        report.hits.clear();
        let output = TextFormatter.format(&report).unwrap();
        assert!(output.contains("No hits"));
    }

    #[test]
    fn test_text_formatter_info() {
        let formatter = TextFormatter;
        assert_eq!(formatter.name(), "text");
        assert!(!formatter.description().is_empty());
    }
}
