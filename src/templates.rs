//! Presentation templates for posts. The share page resolves a post's
//! template id against this table; unknown ids fall back to the first entry.

/// Page background: a flat CSS color or a tiled pattern image served from
/// the frontend's public assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    Color(&'static str),
    Image(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct Template {
    pub id: &'static str,
    pub name: &'static str,
    pub background: Background,
    pub color: &'static str,
    pub heading_color: &'static str,
}

pub const TEMPLATES: &[Template] = &[
    Template {
        id: "light",
        name: "Minimal Light",
        background: Background::Color("#FFFFFF"),
        color: "#1f2d37",
        heading_color: "#111827",
    },
    Template {
        id: "dark",
        name: "Cozy Dark",
        background: Background::Color("#1f2d37"),
        color: "#d1d5db",
        heading_color: "#f9fafb",
    },
    Template {
        id: "leaves",
        name: "Lush Leaves",
        background: Background::Image("/patterns/leaves.png"),
        color: "#1f2d37",
        heading_color: "#111827",
    },
    Template {
        id: "purple-sky",
        name: "Purple Sky",
        background: Background::Image("/patterns/Purple-sky.png"),
        color: "#FFFFFF",
        heading_color: "#FFFFFF",
    },
    Template {
        id: "beach",
        name: "Beach",
        background: Background::Image("/patterns/ocean.png"),
        color: "#1f2d37",
        heading_color: "#111827",
    },
];

/// Resolve a template id, falling back to the first template for unknown or
/// stale ids rather than failing the page.
pub fn lookup(id: &str) -> &'static Template {
    TEMPLATES
        .iter()
        .find(|t| t.id == id)
        .unwrap_or(&TEMPLATES[0])
}

impl Template {
    /// CSS value for the body background.
    pub fn background_css(&self) -> String {
        match self.background {
            Background::Color(c) => c.to_string(),
            Background::Image(path) => format!("url({})", path),
        }
    }

    pub fn has_background_image(&self) -> bool {
        matches!(self.background, Background::Image(_))
    }
}

/// Escape user text for interpolation into rendered HTML.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaping_neutralizes_markup() {
        assert_eq!(
            escape_html("<script>alert('x')</script>"),
            "&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"
        );
        assert_eq!(escape_html("Tom & Jerry \"duo\""), "Tom &amp; Jerry &quot;duo&quot;");
        assert_eq!(escape_html("plain text"), "plain text");
    }

    #[test]
    fn lookup_known_and_unknown_ids() {
        assert_eq!(lookup("dark").name, "Cozy Dark");
        assert_eq!(lookup("beach").background_css(), "url(/patterns/ocean.png)");
        assert_eq!(lookup("no-such-template").id, "light");
        assert_eq!(lookup("").id, "light");
    }

    #[test]
    fn background_css_forms() {
        assert_eq!(lookup("light").background_css(), "#FFFFFF");
        assert!(lookup("leaves").has_background_image());
        assert!(!lookup("dark").has_background_image());
    }
}
