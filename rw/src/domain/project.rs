//! Tracked project definition

use std::fmt;

use serde::{Deserialize, Serialize};

/// One upstream project whose releases are watched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedProject {
    /// Owner or namespace (e.g. `CesiumGS`)
    pub owner: String,

    /// Project name within the owner (e.g. `cesium`)
    pub name: String,

    /// Human-readable name used in notifications
    #[serde(rename = "display-name")]
    pub display_name: String,
}

impl TrackedProject {
    pub fn new(owner: impl Into<String>, name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            display_name: display_name.into(),
        }
    }

    /// Key under which this project's tag is checkpointed
    pub fn key(&self) -> &str {
        &self.name
    }

    /// `owner/name` form used in URLs and logs
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for TrackedProject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}/{})", self.display_name, self.owner, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_and_slug() {
        let project = TrackedProject::new("CesiumGS", "cesium", "CesiumJS");
        assert_eq!(project.key(), "cesium");
        assert_eq!(project.slug(), "CesiumGS/cesium");
        assert_eq!(project.to_string(), "CesiumJS (CesiumGS/cesium)");
    }

    #[test]
    fn test_deserialize_kebab_case() {
        let yaml = "owner: CesiumGS\nname: cesium-unreal\ndisplay-name: Cesium Unreal\n";
        let project: TrackedProject = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(project, TrackedProject::new("CesiumGS", "cesium-unreal", "Cesium Unreal"));
    }
}
