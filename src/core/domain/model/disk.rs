//! Physical disk payloads from `/nodes/{node}/disks/list` and
//! `/nodes/{node}/disks/smart`.

use crate::core::domain::value_object::serde_helpers::{lenient, lenient_f64, lenient_string, lenient_u64};
use serde::{Deserialize, Serialize};

/// WWN placeholder reported by disks without a world wide name.
pub const WWN_UNKNOWN: &str = "unknown";

/// Disk technology as reported in the `type` field of the disk list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiskType {
    Ssd,
    Nvme,
    Hdd,
    Usb,
    Other,
}

impl DiskType {
    pub fn from_api(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "ssd" => DiskType::Ssd,
            "nvme" => DiskType::Nvme,
            "hdd" => DiskType::Hdd,
            "usb" => DiskType::Usb,
            _ => DiskType::Other,
        }
    }

    /// Wear level is only meaningful on flash.
    pub fn reports_wearout(&self) -> bool {
        matches!(self, DiskType::Ssd | DiskType::Nvme)
    }

    /// Spindle speed is only meaningful on rotating media.
    pub fn reports_rpm(&self) -> bool {
        !matches!(self, DiskType::Ssd | DiskType::Nvme | DiskType::Usb)
    }
}

/// One entry of the node disk list.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct DiskListItem {
    /// Device node, e.g. `/dev/sda`.
    #[serde(default, deserialize_with = "lenient_string")]
    pub devpath: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub wwn: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub by_id_link: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub serial: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub vendor: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub model: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub disk_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub size: Option<u64>,
    /// SMART overall verdict (`PASSED`, `OK`, ...).
    #[serde(default, deserialize_with = "lenient_string")]
    pub health: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rpm: Option<f64>,
    /// Wear level in percent as reported; `"N/A"` on disks that do not report it.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub wearout: Option<f64>,
}

impl DiskListItem {
    /// The identifier least likely to change across reboots: by-id link,
    /// serial, WWN, then device path.
    pub fn stable_id(&self) -> Option<&str> {
        self.by_id_link
            .as_deref()
            .or(self.serial.as_deref())
            .or(self.wwn.as_deref().filter(|wwn| *wwn != WWN_UNKNOWN))
            .or(self.devpath.as_deref())
    }

    /// True when `disk_id` names this disk by device path, WWN, by-id link or
    /// serial.
    pub fn matches(&self, disk_id: &str) -> bool {
        let wwn = self.wwn.as_deref().filter(|wwn| *wwn != WWN_UNKNOWN);
        [
            self.devpath.as_deref(),
            wwn,
            self.by_id_link.as_deref(),
            self.serial.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|candidate| candidate == disk_id)
    }

    pub fn kind(&self) -> Option<DiskType> {
        self.disk_type.as_deref().map(DiskType::from_api)
    }
}

/// Response of `/nodes/{node}/disks/smart?disk={devpath}`.
///
/// ATA disks report a structured attribute table; NVMe and some SAS disks
/// report smartctl text (`type == "text"`).
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct SmartData {
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub data_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub health: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub attributes: Option<Vec<SmartAttribute>>,
}

impl SmartData {
    pub fn is_text(&self) -> bool {
        self.data_type.as_deref() == Some("text")
    }
}

/// One SMART attribute in the shape shared by both payload forms.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct SmartAttribute {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    /// Raw value as printed by smartctl (`"34 (Min/Max 20/60)"`).
    #[serde(default, deserialize_with = "lenient_string")]
    pub raw: Option<String>,
    /// Normalized value.
    #[serde(default, deserialize_with = "lenient_string")]
    pub value: Option<String>,
}
