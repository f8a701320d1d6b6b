use std::path::{Path, PathBuf};

pub const PROJECTS_DIR_NAME: &str = "projects";

#[must_use]
pub fn projects_dir(data_root: &Path) -> PathBuf {
    data_root.join(PROJECTS_DIR_NAME)
}

#[must_use]
pub fn project_archive_path(data_root: &Path, project_id: &str) -> PathBuf {
    projects_dir(data_root).join(format!("{}.json", fs_safe_name(project_id)))
}

/// Project ids come from the application layer and may contain characters
/// the filesystem rejects; map anything outside a conservative set to '_'.
fn fs_safe_name(id: &str) -> String {
    id.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => c,
            _ => '_',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_path_sanitizes_project_id() {
        let path = project_archive_path(Path::new("/data"), "my novel/draft");
        assert_eq!(path, PathBuf::from("/data/projects/my_novel_draft.json"));
    }
}
