//! Default output file names. Timestamps use local time.

use std::path::PathBuf;

use chrono::{DateTime, Local};

const TIMESTAMP: &str = "%Y%m%d_%H%M%S";

/// `projects_export_YYYYMMDD_HHMMSS.json`
#[must_use]
pub fn default_export_path(now: DateTime<Local>) -> PathBuf {
    PathBuf::from(format!("projects_export_{}.json", now.format(TIMESTAMP)))
}

/// `project_mapping_YYYYMMDD_HHMMSS.json`
#[must_use]
pub fn default_mapping_path(now: DateTime<Local>) -> PathBuf {
    PathBuf::from(format!("project_mapping_{}.json", now.format(TIMESTAMP)))
}

/// `issue_links_YYYYMMDD_HHMMSS.json`
#[must_use]
pub fn default_link_mapping_path(now: DateTime<Local>) -> PathBuf {
    PathBuf::from(format!("issue_links_{}.json", now.format(TIMESTAMP)))
}

#[must_use]
pub fn default_issues_path(project_number: Option<u64>) -> PathBuf {
    match project_number {
        Some(_) => PathBuf::from("issues_with_projects.csv"),
        None => PathBuf::from("all_issues.csv"),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn timestamped_names() {
        let now = Local.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            default_export_path(now),
            PathBuf::from("projects_export_20250102_030405.json")
        );
        assert_eq!(
            default_mapping_path(now),
            PathBuf::from("project_mapping_20250102_030405.json")
        );
    }
}
