//! Skill artifact materialization.
//!
//! A document-worthy pattern becomes a markdown skill file named after
//! its canonical text. Materialization is idempotent and never overwrites
//! an existing file — curator edits outlive the pipeline.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::DetectedPattern;
use crate::{Error, Result};

/// Maximum slug length for generated filenames.
const MAX_SLUG_LEN: usize = 60;

/// Outcome of a materialization attempt.
#[derive(Debug, Clone)]
pub struct SkillOutcome {
    /// Path of the skill file.
    pub path: PathBuf,
    /// Whether the file already existed and was left untouched.
    pub existed: bool,
}

/// Slugifies text into a filesystem-safe identifier.
///
/// Lowercases, maps every non-alphanumeric run to one dash, trims, and
/// caps the length. Empty input slugs to "pattern".
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len().min(MAX_SLUG_LEN));
    let mut last_dash = true;

    for c in text.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }

    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "pattern".to_string()
    } else {
        slug
    }
}

/// Materializes a pattern as a markdown skill document.
///
/// If a file by the slugified name already exists in `skills_dir` it is
/// left untouched and reported as `existed: true`; otherwise the rendered
/// document is written.
///
/// # Errors
///
/// Returns an error if the skills directory cannot be created or the file
/// cannot be written.
pub fn create_learned_skill(
    pattern: &DetectedPattern,
    skills_dir: &Path,
) -> Result<SkillOutcome> {
    fs::create_dir_all(skills_dir).map_err(|e| Error::operation("create_skills_dir", e))?;

    let slug = slugify(&pattern.error);
    let path = skills_dir.join(format!("{slug}.md"));

    if path.exists() {
        tracing::debug!(path = %path.display(), "skill already materialized, leaving as-is");
        return Ok(SkillOutcome {
            path,
            existed: true,
        });
    }

    let document = render_skill(pattern, &slug);
    fs::write(&path, document).map_err(|e| Error::storage("write_skill", &path, e))?;

    tracing::info!(path = %path.display(), frequency = pattern.frequency, "skill materialized");
    Ok(SkillOutcome {
        path,
        existed: false,
    })
}

/// Renders the skill document body.
fn render_skill(pattern: &DetectedPattern, slug: &str) -> String {
    let mut doc = String::new();

    let _ = writeln!(doc, "# {slug}");
    let _ = writeln!(doc);
    let _ = writeln!(doc, "{}", pattern.error);
    let _ = writeln!(doc);
    let _ = writeln!(
        doc,
        "Observed {} times between {} and {}.",
        pattern.frequency, pattern.first_seen, pattern.last_seen
    );

    if !pattern.keywords.is_empty() {
        let _ = writeln!(doc);
        let _ = writeln!(doc, "## Triggers");
        let _ = writeln!(doc);
        let _ = writeln!(doc, "{}", pattern.keywords.join(", "));
    }

    let _ = writeln!(doc);
    let _ = writeln!(doc, "## Resolution");
    let _ = writeln!(doc);
    let _ = writeln!(doc, "{}", pattern.suggested_resolution);

    if !pattern.examples.is_empty() {
        let _ = writeln!(doc);
        let _ = writeln!(doc, "## Examples");
        for example in &pattern.examples {
            let _ = writeln!(doc);
            let _ = writeln!(doc, "**Before:**");
            let _ = writeln!(doc);
            let _ = writeln!(doc, "```\n{}\n```", example.before);
            let _ = writeln!(doc);
            let _ = writeln!(doc, "**After:**");
            let _ = writeln!(doc);
            let _ = writeln!(doc, "```\n{}\n```", example.after);
        }
    }

    if !pattern.related.is_empty() {
        let _ = writeln!(doc);
        let _ = writeln!(doc, "## Related");
        let _ = writeln!(doc);
        for related in &pattern.related {
            let related_slug = slugify(related);
            let _ = writeln!(doc, "- [{related}]({related_slug}.md)");
        }
    }

    doc
}
