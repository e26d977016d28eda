use serde::{Deserialize, Serialize};

/// `data` of the system-info reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    #[serde(rename = "esp-idf")]
    pub esp_idf: VersionInfo,
    pub esp32_firmware: FirmwareBuild,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
}

/// Controller application build information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareBuild {
    pub version: String,
    #[serde(default)]
    pub compile_date: String,
    #[serde(default)]
    pub compile_time: String,
}

/// Network parameters: `data` of the get reply and of the set request.
///
/// Absent fields are left unchanged by a set request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

/// `data` of the list-files reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileList {
    #[serde(default)]
    pub list_files: Vec<FileEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    pub size: u64,
    /// Path under the controller's file server; absent for directories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl FileList {
    /// Total size in bytes of all listed entries.
    pub fn total_size(&self) -> u64 {
        self.list_files.iter().map(|entry| entry.size).sum()
    }
}
