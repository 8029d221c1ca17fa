//! Starter files shown for a project that has no stored files yet.
//!
//! Seed ids are UUID v5 values derived from the project id and file name, so
//! the seed set of a project is identical on every call.

use crate::model::file::ProjectFile;
use crate::model::project::Project;
use uuid::Uuid;

const SEED_NAMESPACE: Uuid = Uuid::NAMESPACE_URL;

const INDEX_JS_CONTENT: &str = r#"// Welcome to CodeConnect!
// This is your collaborative development platform

console.log("Hello, CodeConnect!");

function greet(name) {
  return `Hello, ${name}! Welcome to your project.`;
}

// Start building something amazing
const message = greet("Developer");
console.log(message);
"#;

const README_TEMPLATE: &str = r#"# {project}

Welcome to your new project on CodeConnect!

## Getting Started

This is a collaborative development platform where you can:

- Create and edit files
- Work with your team in real-time
- Organize your projects efficiently

## Features

- Clean, minimalistic interface
- Browser code editor integration
- Team collaboration
- File management

Start editing files to see the magic happen!
"#;

/// Returns the deterministic seed set for `project`.
///
/// Seed timestamps reuse the project creation time.
pub fn seed_files(project: &Project) -> Vec<ProjectFile> {
    let readme = README_TEMPLATE.replace("{project}", &project.name);
    [("index.js", INDEX_JS_CONTENT.to_string()), ("README.md", readme)]
        .into_iter()
        .map(|(name, content)| {
            ProjectFile::with_content(
                seed_file_id(&project.id, name),
                project.id.clone(),
                name,
                content,
                project.created_at,
            )
        })
        .collect()
}

/// Derives the stable id of a seed file.
pub fn seed_file_id(project_id: &str, name: &str) -> String {
    Uuid::new_v5(
        &SEED_NAMESPACE,
        format!("codeconnect:seed:{project_id}:{name}").as_bytes(),
    )
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::seed_files;
    use crate::model::language::LanguageTag;
    use crate::model::project::Project;

    #[test]
    fn seed_set_is_deterministic_per_project() {
        let project = Project::new("org-1", "Demo", None, 5);
        let other = Project::new("org-1", "Demo", None, 5);

        let first = seed_files(&project);
        assert_eq!(first, seed_files(&project));
        assert_ne!(first[0].id, seed_files(&other)[0].id);
    }

    #[test]
    fn seed_set_contains_script_and_readme() {
        let project = Project::new("org-1", "Demo", None, 5);
        let seeds = seed_files(&project);

        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0].path, "/index.js");
        assert_eq!(seeds[0].language, LanguageTag::JavaScript);
        assert_eq!(seeds[1].path, "/README.md");
        assert!(seeds[1]
            .content
            .as_deref()
            .is_some_and(|content| content.starts_with("# Demo")));
        assert!(seeds.iter().all(|file| file.created_at == 5));
    }
}
