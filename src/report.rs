use paramesh::{CompilationVerbose, MeshItem, RunMetrics, TransformMode};
use std::collections::BTreeMap;
use std::path::Path;

/// SGR attributes the summary uses.
#[derive(Clone, Copy)]
enum Style {
    Bold,
    Dim,
    Green,
    Yellow,
    Blue,
    Cyan,
    Gray,
}

impl Style {
    fn sgr(self) -> u8 {
        match self {
            Style::Bold => 1,
            Style::Dim => 2,
            Style::Green => 32,
            Style::Yellow => 33,
            Style::Blue => 34,
            Style::Cyan => 36,
            Style::Gray => 90,
        }
    }
}

/// Styles text only when the terminal asked for color.
struct Palette {
    enabled: bool,
}

impl Palette {
    fn apply(&self, style: Style, text: impl Into<String>) -> String {
        let text = text.into();
        if self.enabled { format!("\x1b[{}m{text}\x1b[0m", style.sgr()) } else { text }
    }

    fn section(&self, title: &str) -> String {
        self.apply(Style::Gray, format!("━━━ {title} ━━━"))
    }
}

pub fn print_run(target: &Path, res: &CompilationVerbose, location: &Path, color: bool) {
    let palette = Palette { enabled: color };
    let details = &res.details;
    println!(
        "\n{}",
        palette.apply(
            Style::Bold,
            palette.apply(Style::Cyan, format!("⚙  Compiling: {} ({})", target.display(), res.document.meta.format)),
        )
    );

    println!("\n{}", palette.section("Mesh"));
    println!(
        "  {} items  │  {} vertices  │  {} transformed",
        palette.apply(Style::Blue, details.items.to_string()),
        palette.apply(Style::Blue, details.vertices.to_string()),
        if details.transformed > 0 {
            palette.apply(Style::Green, format!("✓ {}", details.transformed))
        } else {
            palette.apply(Style::Dim, format!("✗ {}", details.transformed))
        },
    );

    println!("\n{}", palette.section("Transforms"));
    print_transforms(res, &palette);

    println!("\n{}", palette.section("Timing"));
    println!(
        "  Total: {}  │  Read: {}  │  Transform: {}",
        palette.apply(Style::Green, format!("{:?}", details.total)),
        palette.apply(Style::Cyan, format!("{:?}", details.read)),
        palette.apply(Style::Dim, format!("{:?}", details.transform)),
    );

    let location = location.display().to_string();
    println!("\n  {} {}", palette.apply(Style::Dim, "Written to"), palette.apply(Style::Bold, location));
    println!();
}

fn print_transforms(res: &CompilationVerbose, palette: &Palette) {
    let details = &res.details;
    println!("  {} {}", palette.apply(Style::Dim, "mode:"), palette.apply(Style::Blue, details.mode.to_string()));

    if details.sources.is_empty() {
        println!("  {}", palette.apply(Style::Dim, empty_hint(details)));
        return;
    }

    let counts = transform_counts(&res.document.data);
    for source in &details.sources {
        let (label, hits) = match details.mode {
            TransformMode::Dynamic => {
                let hits = counts
                    .iter()
                    .filter(|(key, _)| param_of(key) == Some(source.as_str()))
                    .map(|(_, n)| n)
                    .sum::<usize>();
                (format!("${source}"), hits)
            }
            TransformMode::Declarative => (source.clone(), counts.get(source.as_str()).copied().unwrap_or(0)),
        };
        println!(
            "  {} {} {}",
            palette.apply(Style::Cyan, label),
            palette.apply(Style::Dim, "│"),
            if hits > 0 {
                palette.apply(Style::Yellow, format!("{hits} transforms"))
            } else {
                palette.apply(Style::Dim, "no vertex affected")
            }
        );
    }
}

fn empty_hint(details: &RunMetrics) -> &'static str {
    match details.mode {
        TransformMode::Dynamic => "no parameters",
        TransformMode::Declarative => "no perturbed meshes and no rules; output is the plain mesh",
    }
}

/// Number of vertices carrying each transformation key.
fn transform_counts(data: &[MeshItem]) -> BTreeMap<&str, usize> {
    let mut counts = BTreeMap::new();
    for vertex in data.iter().filter_map(MeshItem::as_vertex) {
        for key in vertex.transformations.keys() {
            *counts.entry(key.as_str()).or_insert(0) += 1;
        }
    }
    counts
}

/// `"z_by_height"` -> `Some("height")`.
fn param_of(key: &str) -> Option<&str> {
    key.split_once("_by_").map(|(_, param)| param)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_wraps_only_when_enabled() {
        assert_eq!(Palette { enabled: false }.apply(Style::Cyan, "x"), "x");
        assert_eq!(Palette { enabled: true }.apply(Style::Cyan, "x"), "\x1b[36mx\x1b[0m");
        assert_eq!(Palette { enabled: true }.section("Mesh"), "\x1b[90m━━━ Mesh ━━━\x1b[0m");
    }

    #[test]
    fn transform_keys_name_their_parameter() {
        assert_eq!(param_of("z_by_height"), Some("height"));
        assert_eq!(param_of("paint"), None);
    }
}
