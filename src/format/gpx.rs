//! GPX output formatter

use crate::error::{Error, Result};
use crate::format::{OutputFormatter, Report};
use crate::query::field::FieldPath;

/// GPX formatter - outputs the center and every hit as waypoints
pub struct GpxFormatter;

/// Escape the five XML special characters
fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

impl OutputFormatter for GpxFormatter {
    fn name(&self) -> &str {
        "gpx"
    }

    fn description(&self) -> &str {
        "GPX waypoint file"
    }

    fn format(&self, report: &Report) -> Result<String> {
        let field = FieldPath::new(&report.field)?;
        let mut gpx = String::new();

        // XML header
        gpx.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        gpx.push('\n');
        gpx.push_str(r#"<gpx version="1.1" creator="geoquery">"#);
        gpx.push('\n');

        // Metadata
        gpx.push_str("  <metadata>\n");
        gpx.push_str(&format!(
            "    <name>{} within {} km</name>\n",
            escape(&report.collection),
            report.radius_km
        ));
        gpx.push_str(&format!("    <time>{}</time>\n", report.timestamp.to_rfc3339()));
        gpx.push_str("  </metadata>\n");

        // Center waypoint
        gpx.push_str(&format!(
            r#"  <wpt lat="{}" lon="{}">"#,
            report.center.lat, report.center.lng
        ));
        gpx.push('\n');
        gpx.push_str("    <name>Center</name>\n");
        gpx.push_str(&format!(
            "    <desc>Query center, radius: {} km</desc>\n",
            report.radius_km
        ));
        gpx.push_str("  </wpt>\n");

        for hit in &report.hits {
            let coords = field.coords(&hit.document).ok_or_else(|| {
                Error::InvalidArgument(format!("Hit {} has no geopoint under {}", hit.id(), field))
            })?;
            gpx.push_str(&format!(r#"  <wpt lat="{}" lon="{}">"#, coords.lat, coords.lng));
            gpx.push('\n');
            gpx.push_str(&format!("    <name>{}</name>\n", escape(hit.id())));
            gpx.push_str(&format!(
                "    <desc>{:.3} km at {:.1}°</desc>\n",
                hit.distance(),
                hit.bearing()
            ));
            if let Some(geohash) = field.geohash(&hit.document) {
                gpx.push_str(&format!("    <cmt>{}</cmt>\n", escape(geohash)));
            }
            gpx.push_str("  </wpt>\n");
        }

        gpx.push_str("</gpx>\n");
        Ok(gpx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::tests::sample_report;

    #[test]
    fn test_gpx_format() {
        let output = GpxFormatter.format(&sample_report()).unwrap();

        assert!(output.contains(r#"<?xml version="1.0""#));
        assert!(output.contains(r#"<gpx version="1.1""#));
        assert!(output.contains(r#"<wpt lat="40.5" lon="-80">"#));
        assert!(output.contains("<name>Center</name>"));
        assert!(output.contains("<name>b</name>"));
        assert!(output.contains("1.000 km at 90.0°"));
        assert!(output.contains("</gpx>"));
        assert_eq!(output.matches("<wpt").count(), 3);
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"a<b>&"c'"#), "a&lt;b&gt;&amp;&quot;c&apos;");
    }

    #[test]
    fn test_gpx_formatter_info() {
        let formatter = GpxFormatter;
        assert_eq!(formatter.name(), "gpx");
        assert!(!formatter.description().is_empty());
    }
}
