//! Allow-list of files worth sending downstream.
//!
//! Keeps source code, markup and build/config files. Images, archives, binaries and other
//! assets are skipped before any content is fetched.

/// Conventional filenames accepted regardless of extension (compared lowercased).
pub const ALLOWED_FILE_NAMES: &[&str] = &[
    "dockerfile",
    "makefile",
    "readme.md",
    "license",
    "changelog.md",
];

/// Accepted suffixes (compared against the lowercased base name).
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    // code
    ".go", ".py", ".js", ".ts", ".java", ".c", ".cpp", ".cs", ".rb", ".rs", ".php",
    // web
    ".html", ".htm", ".css", ".scss", ".sass", ".json", ".xml",
    // markup & config
    ".md", ".txt", ".sh", ".yml", ".yaml", ".ini", ".cfg", ".toml", ".env", ".dockerfile",
    // build
    ".gradle", ".makefile", ".mk", ".bat", ".ps1",
    // templates
    ".ejs", ".hbs", ".pug", ".jinja", ".njk",
];

/// Whether the file at `path` (a repository path or a full URL) belongs in the corpus.
pub fn is_allowed_path(path: &str) -> bool {
    let base = path.rsplit('/').next().unwrap_or(path).to_lowercase();
    if base.is_empty() {
        return false;
    }
    ALLOWED_FILE_NAMES.contains(&base.as_str())
        || ALLOWED_EXTENSIONS.iter().any(|ext| base.ends_with(ext))
}
