//! Diagram grammars and output formats understood by Kroki.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A diagram grammar supported by the rendering service.
///
/// The wire identifier (see [`DiagramType::as_str`]) is the first path
/// segment of the render URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramType {
    ActDiag,
    BlockDiag,
    C4PlantUml,
    D2,
    Dbml,
    Ditaa,
    Excalidraw,
    GraphViz,
    #[default]
    Mermaid,
    Nomnoml,
    NwDiag,
    Pikchr,
    PlantUml,
    SeqDiag,
    Structurizr,
    Svgbob,
    TikZ,
    Umlet,
    Vega,
    VegaLite,
    WaveDrom,
    WireViz,
}

impl DiagramType {
    /// Every supported grammar, in display order.
    pub const ALL: [DiagramType; 22] = [
        DiagramType::ActDiag,
        DiagramType::BlockDiag,
        DiagramType::C4PlantUml,
        DiagramType::D2,
        DiagramType::Dbml,
        DiagramType::Ditaa,
        DiagramType::Excalidraw,
        DiagramType::GraphViz,
        DiagramType::Mermaid,
        DiagramType::Nomnoml,
        DiagramType::NwDiag,
        DiagramType::Pikchr,
        DiagramType::PlantUml,
        DiagramType::SeqDiag,
        DiagramType::Structurizr,
        DiagramType::Svgbob,
        DiagramType::TikZ,
        DiagramType::Umlet,
        DiagramType::Vega,
        DiagramType::VegaLite,
        DiagramType::WaveDrom,
        DiagramType::WireViz,
    ];

    /// Identifier used in the render URL.
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagramType::ActDiag => "actdiag",
            DiagramType::BlockDiag => "blockdiag",
            DiagramType::C4PlantUml => "c4plantuml",
            DiagramType::D2 => "d2",
            DiagramType::Dbml => "dbml",
            DiagramType::Ditaa => "ditaa",
            DiagramType::Excalidraw => "excalidraw",
            DiagramType::GraphViz => "graphviz",
            DiagramType::Mermaid => "mermaid",
            DiagramType::Nomnoml => "nomnoml",
            DiagramType::NwDiag => "nwdiag",
            DiagramType::Pikchr => "pikchr",
            DiagramType::PlantUml => "plantuml",
            DiagramType::SeqDiag => "seqdiag",
            DiagramType::Structurizr => "structurizr",
            DiagramType::Svgbob => "svgbob",
            DiagramType::TikZ => "tikz",
            DiagramType::Umlet => "umlet",
            DiagramType::Vega => "vega",
            DiagramType::VegaLite => "vegalite",
            DiagramType::WaveDrom => "wavedrom",
            DiagramType::WireViz => "wireviz",
        }
    }

    /// Human-readable name, as shown by `kroki --list-types`.
    pub fn display_name(&self) -> &'static str {
        match self {
            DiagramType::ActDiag => "ActDiag",
            DiagramType::BlockDiag => "BlockDiag",
            DiagramType::C4PlantUml => "C4 PlantUML",
            DiagramType::D2 => "D2",
            DiagramType::Dbml => "DBML",
            DiagramType::Ditaa => "Ditaa",
            DiagramType::Excalidraw => "Excalidraw",
            DiagramType::GraphViz => "GraphViz",
            DiagramType::Mermaid => "Mermaid",
            DiagramType::Nomnoml => "Nomnoml",
            DiagramType::NwDiag => "NwDiag",
            DiagramType::Pikchr => "Pikchr",
            DiagramType::PlantUml => "PlantUML",
            DiagramType::SeqDiag => "SeqDiag",
            DiagramType::Structurizr => "Structurizr",
            DiagramType::Svgbob => "Svgbob",
            DiagramType::TikZ => "TikZ",
            DiagramType::Umlet => "UMLet",
            DiagramType::Vega => "Vega",
            DiagramType::VegaLite => "Vega-Lite",
            DiagramType::WaveDrom => "WaveDrom",
            DiagramType::WireViz => "WireViz",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            DiagramType::ActDiag => "Activity diagrams",
            DiagramType::BlockDiag => "BlockDiag diagrams",
            DiagramType::C4PlantUml => "C4 model diagrams",
            DiagramType::D2 => "D2 declarative diagrams",
            DiagramType::Dbml => "Database markup language",
            DiagramType::Ditaa => "Ditaa ASCII art diagrams",
            DiagramType::Excalidraw => "Excalidraw diagrams",
            DiagramType::GraphViz => "GraphViz DOT diagrams",
            DiagramType::Mermaid => "Mermaid diagrams (flowcharts, sequence, gantt, etc.)",
            DiagramType::Nomnoml => "Nomnoml UML diagrams",
            DiagramType::NwDiag => "Network diagrams",
            DiagramType::Pikchr => "Pikchr diagrams",
            DiagramType::PlantUml => "PlantUML diagrams",
            DiagramType::SeqDiag => "Sequence diagrams",
            DiagramType::Structurizr => "Structurizr diagrams",
            DiagramType::Svgbob => "Svgbob ASCII art",
            DiagramType::TikZ => "TikZ diagrams",
            DiagramType::Umlet => "UMLet diagrams",
            DiagramType::Vega => "Vega visualization",
            DiagramType::VegaLite => "Vega-Lite visualization",
            DiagramType::WaveDrom => "WaveDrom digital timing diagrams",
            DiagramType::WireViz => "WireViz cable diagrams",
        }
    }
}

impl fmt::Display for DiagramType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiagramType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        DiagramType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unsupported diagram type '{s}'"))
    }
}

/// Rendered output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Svg,
    Pdf,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Png, OutputFormat::Svg, OutputFormat::Pdf];

    /// Identifier used in the render URL; doubles as the file extension.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
            OutputFormat::Pdf => "pdf",
        }
    }

    /// MIME type of artifacts in this format.
    pub fn mime_type(&self) -> &'static str {
        mime_type_for(self.as_str())
    }

    /// Whether the service returns this format as text (SVG is UTF-8 XML).
    pub fn is_textual(&self) -> bool {
        matches!(self, OutputFormat::Svg)
    }

    /// Suggested file name for an artifact in this format.
    pub fn file_name(&self) -> String {
        format!("diagram.{}", self.as_str())
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "svg" => Ok(OutputFormat::Svg),
            "pdf" => Ok(OutputFormat::Pdf),
            other => Err(format!("Unsupported output format '{other}'")),
        }
    }
}

/// MIME type for a format identifier. Total: unknown formats map to
/// `application/octet-stream`.
pub fn mime_type_for(format: &str) -> &'static str {
    match format {
        "png" => "image/png",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_mapping_is_fixed_and_total() {
        assert_eq!(mime_type_for("png"), "image/png");
        assert_eq!(mime_type_for("svg"), "image/svg+xml");
        assert_eq!(mime_type_for("pdf"), "application/pdf");
        assert_eq!(mime_type_for("jpeg"), "application/octet-stream");
        assert_eq!(mime_type_for(""), "application/octet-stream");
        assert_eq!(mime_type_for("PNG"), "application/octet-stream");
    }

    #[test]
    fn every_type_round_trips_through_its_identifier() {
        for t in DiagramType::ALL {
            assert_eq!(t.as_str().parse::<DiagramType>().unwrap(), t);
        }
    }

    #[test]
    fn type_parse_is_case_insensitive_and_rejects_unknown() {
        assert_eq!("Mermaid".parse::<DiagramType>().unwrap(), DiagramType::Mermaid);
        assert_eq!(" vegalite ".parse::<DiagramType>().unwrap(), DiagramType::VegaLite);
        assert!("flowchart".parse::<DiagramType>().is_err());
    }

    #[test]
    fn format_helpers() {
        assert_eq!(OutputFormat::Svg.file_name(), "diagram.svg");
        assert!(OutputFormat::Svg.is_textual());
        assert!(!OutputFormat::Png.is_textual());
        assert_eq!(OutputFormat::Pdf.mime_type(), "application/pdf");
        assert!("gif".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn serde_uses_wire_identifiers() {
        let json = serde_json::to_string(&DiagramType::C4PlantUml).unwrap();
        assert_eq!(json, "\"c4plantuml\"");
        let json = serde_json::to_string(&DiagramType::VegaLite).unwrap();
        assert_eq!(json, "\"vegalite\"");
        let f: OutputFormat = serde_json::from_str("\"svg\"").unwrap();
        assert_eq!(f, OutputFormat::Svg);
    }
}
