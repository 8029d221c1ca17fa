//! Default content and editor language policy keyed by file extension.
//!
//! # Invariants
//! - Both mappings are total: any input, including `""` and names without a
//!   dot, yields a defined value.
//! - Extension matching is case-insensitive.
//! - The extension is the text after the last `.`; a name without `.` has
//!   no extension.

use serde::{Deserialize, Serialize};

const JAVASCRIPT_TEMPLATE: &str = "// New JavaScript file\nconsole.log(\"Hello, world!\");";
const TYPESCRIPT_TEMPLATE: &str = "// New TypeScript file\nconsole.log(\"Hello, world!\");";
const PYTHON_TEMPLATE: &str = "# New Python file\nprint(\"Hello, world!\")";
const HTML_TEMPLATE: &str = "<!DOCTYPE html>\n<html>\n<head>\n  <title>New Page</title>\n</head>\n<body>\n  <h1>Hello, world!</h1>\n</body>\n</html>";
const CSS_TEMPLATE: &str = "/* New CSS file */\nbody {\n  font-family: sans-serif;\n}";
const MARKDOWN_TEMPLATE: &str = "# New Markdown File\n\nStart writing your documentation here...";
const FALLBACK_TEMPLATE: &str = "// New file\n";

/// Editor language identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageTag {
    JavaScript,
    TypeScript,
    Python,
    Html,
    Css,
    Markdown,
    Json,
    Plaintext,
}

impl LanguageTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Python => "python",
            Self::Html => "html",
            Self::Css => "css",
            Self::Markdown => "markdown",
            Self::Json => "json",
            Self::Plaintext => "plaintext",
        }
    }
}

/// Returns the lowercase text after the last `.` of `filename`.
///
/// A name without a dot is its own extension, so a bare `js` dispatches like
/// `index.js`. An empty result means there is no extension.
pub fn extension_of(filename: &str) -> Option<String> {
    let extension = filename
        .rsplit_once('.')
        .map_or(filename, |(_, extension)| extension);
    Some(extension.to_ascii_lowercase()).filter(|extension| !extension.is_empty())
}

/// Returns the editor language for `filename`.
pub fn language_of(filename: &str) -> LanguageTag {
    match extension_of(filename).as_deref() {
        Some("js" | "jsx") => LanguageTag::JavaScript,
        Some("ts" | "tsx") => LanguageTag::TypeScript,
        Some("py") => LanguageTag::Python,
        Some("html") => LanguageTag::Html,
        Some("css") => LanguageTag::Css,
        Some("md") => LanguageTag::Markdown,
        Some("json") => LanguageTag::Json,
        _ => LanguageTag::Plaintext,
    }
}

/// Returns starter content for a newly created `filename`.
pub fn default_content(filename: &str) -> &'static str {
    match extension_of(filename).as_deref() {
        Some("js" | "jsx") => JAVASCRIPT_TEMPLATE,
        Some("ts" | "tsx") => TYPESCRIPT_TEMPLATE,
        Some("py") => PYTHON_TEMPLATE,
        Some("html") => HTML_TEMPLATE,
        Some("css") => CSS_TEMPLATE,
        Some("md") => MARKDOWN_TEMPLATE,
        _ => FALLBACK_TEMPLATE,
    }
}
