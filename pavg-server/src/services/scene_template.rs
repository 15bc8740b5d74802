//! Scene prompt, response cleanup, and the built-in fallback document
//!
//! Everything here is pure string work so it can be tested without a model.

use serde::Serialize;
use std::fmt::Write as _;

/// Number of manifest entries quoted literally in the prompt
pub const PROMPT_PATH_LIMIT: usize = 20;

/// Photos per row in the fallback grid
const GRID_COLUMNS: usize = 5;
const GRID_ORIGIN_X: f64 = -10.0;
const GRID_SPACING_X: f64 = 3.0;
const GRID_ORIGIN_Z: f64 = -5.0;
const GRID_SPACING_Z: f64 = 4.0;
const EYE_HEIGHT: f64 = 1.6;

/// One copied photo as referenced from the scene document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    /// Display name of the source collection
    pub collection: String,
    pub filename: String,
    /// Path relative to the scene document (`<scene>_assets/<folder>/<file>`)
    pub path: String,
}

/// Build the generation request sent to the model
pub fn build_prompt(collection_names: &[String], manifest: &[ManifestEntry]) -> String {
    let mut photo_lines = String::new();
    for (idx, entry) in manifest.iter().take(PROMPT_PATH_LIMIT).enumerate() {
        let _ = writeln!(photo_lines, "{}: {} - {}", idx, entry.collection, entry.path);
    }
    if manifest.len() > PROMPT_PATH_LIMIT {
        let _ = writeln!(
            photo_lines,
            "... and {} more photos",
            manifest.len() - PROMPT_PATH_LIMIT
        );
    }

    format!(
        "Create a complete A-Frame HTML page for an immersive VR art gallery.

REQUIREMENTS:
1. The gallery should display {count} photos from these collections: {collections}
2. Art style inspiration: Light, warm summer Tuscan aesthetic. Airy, 80s vibe.
3. Use warm, soft lighting with peachy/golden tones
4. Include geometric shapes (spheres, toruses, cones, pyramids) as artistic elements throughout the space
5. Create multiple rooms or areas, one for each collection if possible
6. Use textured walls (consider stucco, marble, or painted textures)
7. Add ambient particle effects or subtle animations for atmosphere
8. Position the camera at a comfortable standing height (1.6m)
9. Include WASD movement controls and look-around with mouse/VR headset

PHOTO PATHS (use these exact paths in your src attributes):
{photo_lines}
TECHNICAL REQUIREMENTS:
- Complete, valid HTML5 document
- Include A-Frame CDN (latest version)
- Use <a-image> entities for photos with proper positioning
- Photos should be arranged on walls at eye level (1.6m height)
- Space photos 2-3 meters apart
- Use <a-sky> for background with warm gradient color
- Add <a-plane> for floor with subtle texture
- Include geometric decorative elements positioned throughout
- Use <a-light> entities for warm ambient and point lighting
- Add smooth movement controls
- Include some 80s geometric patterns or shapes as decoration
- Make the gallery feel spacious and airy

Generate ONLY the complete HTML code, no explanations or markdown formatting.",
        count = manifest.len(),
        collections = collection_names.join(", "),
        photo_lines = photo_lines,
    )
}

/// Remove a wrapping Markdown code fence, keeping only its interior
///
/// The opening fence line may carry a language tag (```` ```html ````).
/// Text without a fence is returned trimmed.
pub fn strip_code_fence(text: &str) -> String {
    let Some(open) = text.find("```") else {
        return text.trim().to_string();
    };

    let after_open = &text[open + 3..];
    // Only the language tag is dropped; content on the fence line is kept.
    let tag_len = after_open
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '+'))
        .unwrap_or(after_open.len());
    let body = &after_open[tag_len..];
    let body = body.strip_prefix("\r\n").or_else(|| body.strip_prefix('\n')).unwrap_or(body);

    let interior = match body.find("```") {
        Some(close) => &body[..close],
        None => body,
    };
    interior.trim().to_string()
}

/// Grid cell of the `index`-th photo: `(column, row)`
pub fn grid_cell(index: usize) -> (usize, usize) {
    (index % GRID_COLUMNS, index / GRID_COLUMNS)
}

/// Deterministic A-Frame scene used when the model is unavailable
pub fn fallback_document(manifest: &[ManifestEntry]) -> String {
    let mut photos = String::new();
    for (idx, entry) in manifest.iter().enumerate() {
        let (column, row) = grid_cell(idx);
        let x = GRID_ORIGIN_X + GRID_SPACING_X * column as f64;
        let z = GRID_ORIGIN_Z - GRID_SPACING_Z * row as f64;
        let _ = write!(
            photos,
            "\n        <a-image src=\"{}\" title=\"{}\" width=\"2\" height=\"1.5\" position=\"{} {} {}\"></a-image>",
            escape_attr(&entry.path),
            escape_attr(&entry.collection),
            x,
            EYE_HEIGHT,
            z
        );
    }

    format!(
        r##"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Photo Gallery VR</title>
    <meta name="description" content="Immersive Photo Gallery">
    <script src="https://aframe.io/releases/1.5.0/aframe.min.js"></script>
</head>
<body>
    <a-scene>
        <a-sky color="#FFE5CC"></a-sky>

        <a-light type="ambient" color="#FFD9B3" intensity="0.8"></a-light>
        <a-light type="point" position="0 5 0" color="#FFB380" intensity="0.6"></a-light>

        <a-plane position="0 0 0" rotation="-90 0 0" width="40" height="40" color="#F5DEB3"></a-plane>
{photos}

        <a-sphere position="5 2 -3" radius="0.3" color="#FFB380" opacity="0.7"></a-sphere>
        <a-torus position="-5 2.5 -6" radius="0.5" radius-tubular="0.1" color="#FFC9A3"></a-torus>
        <a-cone position="8 0 -8" radius-bottom="0.5" radius-top="0" height="2" color="#FFD4AD"></a-cone>

        <a-entity id="rig" position="0 1.6 5">
            <a-camera wasd-controls look-controls></a-camera>
        </a-entity>
    </a-scene>
</body>
</html>
"##,
        photos = photos
    )
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(n: usize) -> Vec<ManifestEntry> {
        (0..n)
            .map(|i| ManifestEntry {
                collection: "Trip".to_string(),
                filename: format!("p{:02}.jpg", i),
                path: format!("scene_assets/Trip/p{:02}.jpg", i),
            })
            .collect()
    }

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    fn assert_structurally_valid(doc: &str) {
        assert!(doc.starts_with("<!DOCTYPE html>"));
        for tag in ["html", "head", "body", "a-scene", "a-entity"] {
            assert_eq!(
                count(doc, &format!("<{}", tag)),
                count(doc, &format!("</{}>", tag)),
                "unbalanced <{}>",
                tag
            );
        }
        assert_eq!(count(doc, "<a-image"), count(doc, "</a-image>"));
        assert_eq!(count(doc, "<a-light"), 2);
        assert!(doc.contains("wasd-controls look-controls"));
    }

    #[test]
    fn test_fallback_for_zero_one_and_many_photos() {
        for n in [0, 1, 27] {
            let doc = fallback_document(&manifest(n));
            assert_structurally_valid(&doc);
            assert_eq!(count(&doc, "<a-image"), n, "photo elements for {}", n);
        }
    }

    #[test]
    fn test_fallback_grid_wraps_every_five() {
        let doc = fallback_document(&manifest(27));
        // index 0 → (0,0), index 4 → (4,0), index 5 → (0,1), index 26 → (1,5)
        assert!(doc.contains("src=\"scene_assets/Trip/p00.jpg\" title=\"Trip\" width=\"2\" height=\"1.5\" position=\"-10 1.6 -5\""));
        assert!(doc.contains("p04.jpg\" title=\"Trip\" width=\"2\" height=\"1.5\" position=\"2 1.6 -5\""));
        assert!(doc.contains("p05.jpg\" title=\"Trip\" width=\"2\" height=\"1.5\" position=\"-10 1.6 -9\""));
        assert!(doc.contains("p26.jpg\" title=\"Trip\" width=\"2\" height=\"1.5\" position=\"-7 1.6 -25\""));
    }

    #[test]
    fn test_grid_cell() {
        assert_eq!(grid_cell(0), (0, 0));
        assert_eq!(grid_cell(4), (4, 0));
        assert_eq!(grid_cell(5), (0, 1));
        assert_eq!(grid_cell(26), (1, 5));
    }

    #[test]
    fn test_fallback_escapes_attribute_values() {
        let entries = vec![ManifestEntry {
            collection: "Tom & \"Jerry\"".to_string(),
            filename: "a\"b.jpg".to_string(),
            path: "s_assets/c/a\"b.jpg".to_string(),
        }];
        let doc = fallback_document(&entries);
        assert!(doc.contains("src=\"s_assets/c/a&quot;b.jpg\""));
        assert!(doc.contains("title=\"Tom &amp; &quot;Jerry&quot;\""));
    }

    #[test]
    fn test_prompt_lists_at_most_twenty_paths() {
        let prompt = build_prompt(&["Trip".to_string()], &manifest(27));
        assert!(prompt.contains("display 27 photos from these collections: Trip"));
        assert!(prompt.contains("19: Trip - scene_assets/Trip/p19.jpg"));
        assert!(!prompt.contains("p20.jpg"));
        assert!(prompt.contains("... and 7 more photos"));
    }

    #[test]
    fn test_prompt_without_overflow_has_no_summary() {
        let prompt = build_prompt(&["A".to_string(), "B".to_string()], &manifest(3));
        assert!(prompt.contains("collections: A, B"));
        assert!(prompt.contains("2: Trip - scene_assets/Trip/p02.jpg"));
        assert!(!prompt.contains("more photos"));
    }

    #[test]
    fn test_strip_code_fence_with_language_tag() {
        let text = "Here you go:\n```html\n<!DOCTYPE html>\n<html></html>\n```\nEnjoy!";
        assert_eq!(strip_code_fence(text), "<!DOCTYPE html>\n<html></html>");
    }

    #[test]
    fn test_strip_code_fence_without_language_tag() {
        let text = "```\n<html></html>\n```";
        assert_eq!(strip_code_fence(text), "<html></html>");
    }

    #[test]
    fn test_strip_code_fence_keeps_content_on_fence_line() {
        let text = "```html <!DOCTYPE html>\n<html></html>\n```";
        assert_eq!(strip_code_fence(text), "<!DOCTYPE html>\n<html></html>");

        let untagged = "```<html></html>```";
        assert_eq!(strip_code_fence(untagged), "<html></html>");
    }

    #[test]
    fn test_strip_code_fence_passes_plain_text() {
        assert_eq!(strip_code_fence("  <html></html>\n"), "<html></html>");
    }

    #[test]
    fn test_strip_code_fence_unterminated() {
        assert_eq!(strip_code_fence("```html\n<html></html>"), "<html></html>");
    }
}
