use std::path::{Path, PathBuf};

pub const INDEX_DIR_NAME: &str = "index";
pub const MENTIONS_FILE_NAME: &str = "mentions.json";
pub const STATE_FILE_NAME: &str = "state.json";
pub const LOCK_FILE_NAME: &str = "index.lock";

#[must_use]
pub fn index_dir_for_project(data_root: &Path, project_id: &str) -> PathBuf {
    data_root.join(INDEX_DIR_NAME).join(fs_safe_name(project_id))
}

#[must_use]
pub fn mentions_path_for_project(data_root: &Path, project_id: &str) -> PathBuf {
    index_dir_for_project(data_root, project_id).join(MENTIONS_FILE_NAME)
}

#[must_use]
pub fn state_path_for_project(data_root: &Path, project_id: &str) -> PathBuf {
    index_dir_for_project(data_root, project_id).join(STATE_FILE_NAME)
}

#[must_use]
pub fn lock_path_for_project(data_root: &Path, project_id: &str) -> PathBuf {
    index_dir_for_project(data_root, project_id).join(LOCK_FILE_NAME)
}

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
    fn index_paths_are_project_scoped_and_sanitized() {
        let root = Path::new("/data");
        assert_eq!(
            mentions_path_for_project(root, "draft one"),
            PathBuf::from("/data/index/draft_one/mentions.json")
        );
        assert_eq!(
            state_path_for_project(root, "draft one"),
            PathBuf::from("/data/index/draft_one/state.json")
        );
    }
}
