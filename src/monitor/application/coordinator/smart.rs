//! SMART metric extraction.
//!
//! Reports arrive either as an attribute table or as smartctl text. Text is
//! turned into the same attribute shape line by line, then metrics are picked
//! by attribute id. Anything that does not parse is left out rather than
//! guessed.

use crate::core::domain::model::disk::{SmartAttribute, SmartData};

pub const ATTR_POWER_ON_HOURS: u64 = 9;
pub const ATTR_POWER_CYCLES: u64 = 12;
pub const ATTR_UNEXPECTED_POWER_LOSS: u64 = 174;
pub const ATTR_AIRFLOW_TEMPERATURE: u64 = 190;
pub const ATTR_TEMPERATURE: u64 = 194;
pub const ATTR_LIFE_LEFT: u64 = 231;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmartMetrics {
    pub temperature: Option<i64>,
    pub temperature_air: Option<i64>,
    pub power_cycles: Option<u64>,
    pub power_hours: Option<u64>,
    pub life_left: Option<u64>,
    pub power_loss: Option<u64>,
}

impl SmartMetrics {
    pub fn from_report(report: &SmartData) -> Self {
        if report.is_text() {
            let attributes = report.text.as_deref().map(parse_text).unwrap_or_default();
            Self::from_attributes(&attributes)
        } else {
            Self::from_attributes(report.attributes.as_deref().unwrap_or_default())
        }
    }

    /// The first parseable value of each id wins.
    pub fn from_attributes(attributes: &[SmartAttribute]) -> Self {
        let mut metrics = Self::default();
        for attribute in attributes {
            let Some(id) = attribute.id else {
                continue;
            };
            let raw = attribute.raw.as_deref().unwrap_or_default();
            match id {
                ATTR_TEMPERATURE => {
                    metrics.temperature = metrics.temperature.or_else(|| first_token(raw))
                }
                ATTR_AIRFLOW_TEMPERATURE => {
                    metrics.temperature_air = metrics.temperature_air.or_else(|| first_token(raw))
                }
                ATTR_POWER_ON_HOURS => {
                    metrics.power_hours = metrics.power_hours.or_else(|| power_on_hours(raw))
                }
                ATTR_POWER_CYCLES => {
                    metrics.power_cycles = metrics.power_cycles.or_else(|| whole(raw))
                }
                ATTR_UNEXPECTED_POWER_LOSS => {
                    metrics.power_loss = metrics.power_loss.or_else(|| whole(raw))
                }
                ATTR_LIFE_LEFT => {
                    metrics.life_left = metrics
                        .life_left
                        .or_else(|| attribute.value.as_deref().and_then(whole))
                }
                _ => {}
            }
        }
        metrics
    }
}

/// Parses smartctl text into attributes.
///
/// Each `name: value` line becomes one attribute. Well-known NVMe labels map
/// to their ATA ids; otherwise a value of the form `{id} {raw...}` carries its
/// own id. Lines with neither get id 0 and are ignored downstream.
pub fn parse_text(text: &str) -> Vec<SmartAttribute> {
    text.lines()
        .filter_map(|line| {
            let (name, rest) = line.split_once(':')?;
            let name = name.trim();
            let value = rest.split(':').next().unwrap_or_default().trim().replace(',', "");
            let (id, raw) = match label_id(name) {
                Some(id) => (id, value),
                None => embedded_id(&value).unwrap_or((0, value)),
            };
            Some(SmartAttribute {
                id: Some(id),
                name: Some(name.to_string()),
                raw: Some(raw),
                value: None,
            })
        })
        .collect()
}

fn label_id(name: &str) -> Option<u64> {
    match name {
        "Temperature" => Some(ATTR_TEMPERATURE),
        "Power Cycles" => Some(ATTR_POWER_CYCLES),
        "Power On Hours" => Some(ATTR_POWER_ON_HOURS),
        _ => None,
    }
}

/// Splits `"194 34 (Min/Max 20/60)"` into `(194, "34 (Min/Max 20/60)")`.
/// A lone number is a value, not an id.
fn embedded_id(value: &str) -> Option<(u64, String)> {
    let (id, raw) = value.split_once(char::is_whitespace)?;
    let id = id.parse().ok()?;
    let raw = raw.trim();
    (!raw.is_empty()).then(|| (id, raw.to_string()))
}

fn first_token<T: std::str::FromStr>(raw: &str) -> Option<T> {
    raw.split_whitespace().next()?.parse().ok()
}

fn whole(raw: &str) -> Option<u64> {
    raw.trim().parse().ok()
}

/// `"12345h+10m+02s"`, `"12345 (5 23 0)"` and `"12345"` all give 12345.
fn power_on_hours(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    let head = match raw.split_once('h') {
        Some((hours, _)) => hours,
        None => raw.split_whitespace().next()?,
    };
    head.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ata_style_text_line() {
        let attributes = parse_text("Temperature_Celsius: 194 34 (Min/Max 20/60)");
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes[0].id, Some(194));
        assert_eq!(attributes[0].raw.as_deref(), Some("34 (Min/Max 20/60)"));
        assert_eq!(SmartMetrics::from_attributes(&attributes).temperature, Some(34));
    }

    #[test]
    fn test_nvme_text_report() {
        let text = "SMART/Health Information (NVMe Log 0x02)\n\
                    Critical Warning: 0x00\n\
                    Temperature: 41 Celsius\n\
                    Available Spare: 100%\n\
                    Power Cycles: 1,024\n\
                    Power On Hours: 8,760\n\
                    Unsafe Shutdowns: 12\n";
        let report = SmartData {
            data_type: Some("text".to_string()),
            text: Some(text.to_string()),
            ..Default::default()
        };
        let metrics = SmartMetrics::from_report(&report);
        assert_eq!(metrics.temperature, Some(41));
        assert_eq!(metrics.power_cycles, Some(1024));
        assert_eq!(metrics.power_hours, Some(8760));
        assert_eq!(metrics.power_loss, None);
    }

    #[test]
    fn test_attribute_table() {
        let attributes: Vec<SmartAttribute> = serde_json::from_value(serde_json::json!([
            {"id": 9, "name": "Power_On_Hours", "raw": "12345h+10m+02s", "value": "86"},
            {"id": "12", "name": "Power_Cycle_Count", "raw": "77", "value": "100"},
            {"id": 190, "name": "Airflow_Temperature_Cel", "raw": "30 (Min/Max 18/44)"},
            {"id": 231, "name": "SSD_Life_Left", "raw": "0", "value": "95"},
            {"id": 174, "name": "Unexpect_Power_Loss_Ct", "raw": "3"}
        ]))
        .unwrap();
        let metrics = SmartMetrics::from_attributes(&attributes);
        assert_eq!(metrics.power_hours, Some(12345));
        assert_eq!(metrics.power_cycles, Some(77));
        assert_eq!(metrics.temperature_air, Some(30));
        assert_eq!(metrics.life_left, Some(95));
        assert_eq!(metrics.power_loss, Some(3));
        assert_eq!(metrics.temperature, None);
    }

    #[test]
    fn test_unparseable_values_stay_unknown() {
        let attributes = vec![SmartAttribute {
            id: Some(ATTR_TEMPERATURE),
            name: Some("Temperature_Celsius".to_string()),
            raw: Some("n/a".to_string()),
            value: None,
        }];
        assert_eq!(SmartMetrics::from_attributes(&attributes), SmartMetrics::default());
        assert_eq!(power_on_hours("5 (0 12 0)"), Some(5));
    }
}
