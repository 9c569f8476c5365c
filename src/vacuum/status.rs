use serde::{Deserialize, Serialize};
use strum::{Display, FromRepr};

/// Appliance state codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromRepr)]
#[strum(serialize_all = "snake_case")]
#[repr(i64)]
pub enum VacuumState {
    Starting = 1,
    ChargerDisconnected = 2,
    Idle = 3,
    RemoteControlActive = 4,
    Cleaning = 5,
    ReturningHome = 6,
    ManualMode = 7,
    Charging = 8,
    ChargingProblem = 9,
    Paused = 10,
    SpotCleaning = 11,
    Error = 12,
    ShuttingDown = 13,
    Updating = 14,
    Docking = 15,
    GoingToTarget = 16,
    ZonedCleaning = 17,
    SegmentCleaning = 18,
    EmptyingTheBin = 22,
    WashingTheMop = 23,
    GoingToWashTheMop = 26,
    InCall = 28,
    Mapping = 29,
    ChargingComplete = 100,
    DeviceOffline = 101,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromRepr)]
#[strum(serialize_all = "snake_case")]
#[repr(i64)]
pub enum VacuumError {
    #[strum(to_string = "none")]
    NoError = 0,
    LidarBlocked = 1,
    BumperStuck = 2,
    WheelsSuspended = 3,
    CliffSensorError = 4,
    MainBrushJammed = 5,
    SideBrushJammed = 6,
    WheelsJammed = 7,
    RobotTrapped = 8,
    NoDustbin = 9,
    LowBattery = 12,
    ChargingError = 13,
    BatteryError = 14,
    WallSensorDirty = 15,
    RobotTilted = 16,
    SideBrushError = 17,
    FanError = 18,
    VerticalBumperPressed = 21,
    DockLocatorError = 22,
    ReturnToDockFail = 23,
    NogoZoneDetected = 24,
    VibrariseJammed = 27,
    RobotOnCarpet = 28,
    FilterBlocked = 29,
    InvisibleWallDetected = 30,
    CannotCrossCarpet = 31,
    InternalError = 32,
}

/// Suction level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromRepr)]
#[strum(serialize_all = "snake_case")]
#[repr(i64)]
pub enum FanPower {
    Quiet = 101,
    Balanced = 102,
    Turbo = 103,
    Max = 104,
    Off = 105,
    Custom = 106,
    MaxPlus = 108,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromRepr)]
#[strum(serialize_all = "snake_case")]
#[repr(i64)]
pub enum MopMode {
    Standard = 300,
    Deep = 301,
    Custom = 302,
    DeepPlus = 303,
    Fast = 304,
}

const UNKNOWN: &str = "unknown";

/// Name for a reported code, `"unknown"` when missing or unrecognized
fn code_name<T: std::fmt::Display>(
    code: Option<i64>,
    from_repr: fn(i64) -> Option<T>,
) -> String {
    code.and_then(from_repr)
        .map(|known| known.to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Status payload as the appliance sends it (`get_status` result entry)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStatus {
    pub state: Option<i64>,
    pub battery: Option<u8>,
    /// Seconds
    pub clean_time: Option<u64>,
    /// Square millimetres
    pub clean_area: Option<u64>,
    pub error_code: Option<i64>,
    pub fan_power: Option<i64>,
    pub mop_mode: Option<i64>,
    pub in_cleaning: Option<i64>,
    pub water_box_status: Option<i64>,
    pub dock_type: Option<i64>,
}

/// Status with appliance codes translated to names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub state_name: String,
    pub battery: Option<u8>,
    pub clean_time: Option<u64>,
    pub square_meter_clean_area: Option<f64>,
    pub error_code_name: String,
    pub fan_power_name: String,
    pub mop_mode_name: String,
}

impl From<RawStatus> for DeviceStatus {
    fn from(raw: RawStatus) -> Self {
        Self {
            state_name: code_name(raw.state, VacuumState::from_repr),
            battery: raw.battery,
            clean_time: raw.clean_time,
            square_meter_clean_area: raw
                .clean_area
                .map(|mm2| (mm2 as f64 / 100_000.0).round() / 10.0),
            error_code_name: code_name(raw.error_code, VacuumError::from_repr),
            fan_power_name: code_name(raw.fan_power, FanPower::from_repr),
            mop_mode_name: code_name(raw.mop_mode, MopMode::from_repr),
        }
    }
}

/// Normalized status handed back to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub state: String,
    pub battery: Option<u8>,
    pub clean_time: Option<u64>,
    pub clean_area: Option<f64>,
    pub error: String,
    pub fan_speed: String,
    pub mop_mode: String,
    pub docked: bool,
}

impl From<DeviceStatus> for StatusReport {
    fn from(status: DeviceStatus) -> Self {
        let docked = status.state_name == VacuumState::Charging.to_string();
        Self {
            state: status.state_name,
            battery: status.battery,
            clean_time: status.clean_time,
            clean_area: status.square_meter_clean_area,
            error: status.error_code_name,
            fan_speed: status.fan_power_name,
            mop_mode: status.mop_mode_name,
            docked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_raw_status() {
        let raw: RawStatus = serde_json::from_value(json!({
            "msg_ver": 2,
            "state": 8,
            "battery": 100,
            "clean_time": 1830,
            "clean_area": 31_260_000,
            "error_code": 0,
            "fan_power": 102,
            "mop_mode": 300,
            "in_cleaning": 0
        }))
        .unwrap();

        let status = DeviceStatus::from(raw);
        assert_eq!(status.state_name, "charging");
        assert_eq!(status.battery, Some(100));
        assert_eq!(status.clean_time, Some(1830));
        assert_eq!(status.square_meter_clean_area, Some(31.3));
        assert_eq!(status.error_code_name, "none");
        assert_eq!(status.fan_power_name, "balanced");
        assert_eq!(status.mop_mode_name, "standard");
    }

    #[test]
    fn test_code_names() {
        assert_eq!(VacuumState::from_repr(26).unwrap().to_string(), "going_to_wash_the_mop");
        assert_eq!(VacuumState::from_repr(100).unwrap().to_string(), "charging_complete");
        assert_eq!(VacuumError::from_repr(0).unwrap().to_string(), "none");
        assert_eq!(VacuumError::from_repr(24).unwrap().to_string(), "nogo_zone_detected");
        assert_eq!(FanPower::from_repr(108).unwrap().to_string(), "max_plus");
        assert_eq!(MopMode::from_repr(303).unwrap().to_string(), "deep_plus");

        // Gaps in the code ranges stay unknown
        assert_eq!(VacuumState::from_repr(19), None);
        assert_eq!(VacuumError::from_repr(10), None);
        assert_eq!(FanPower::from_repr(107), None);
    }

    #[test]
    fn test_unknown_codes() {
        let status = DeviceStatus::from(RawStatus {
            state: Some(999),
            fan_power: Some(7),
            ..Default::default()
        });
        assert_eq!(status.state_name, "unknown");
        assert_eq!(status.fan_power_name, "unknown");
        assert_eq!(status.error_code_name, "unknown");
        assert_eq!(status.square_meter_clean_area, None);
    }

    #[test]
    fn test_docked_only_when_charging() {
        let mut status = DeviceStatus::from(RawStatus {
            state: Some(8),
            battery: Some(80),
            ..Default::default()
        });
        let report = StatusReport::from(status.clone());
        assert!(report.docked);
        assert_eq!(report.state, "charging");
        assert_eq!(report.battery, Some(80));

        for state in ["charging_complete", "cleaning", "returning_home", "docking"] {
            status.state_name = state.to_string();
            assert!(!StatusReport::from(status.clone()).docked, "{}", state);
        }
    }

    #[test]
    fn test_report_serializes_with_caller_field_names() {
        let report = StatusReport::from(DeviceStatus {
            state_name: "cleaning".to_string(),
            battery: Some(64),
            clean_time: Some(600),
            square_meter_clean_area: Some(12.5),
            error_code_name: "none".to_string(),
            fan_power_name: "turbo".to_string(),
            mop_mode_name: "deep".to_string(),
        });

        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({
                "state": "cleaning",
                "battery": 64,
                "clean_time": 600,
                "clean_area": 12.5,
                "error": "none",
                "fan_speed": "turbo",
                "mop_mode": "deep",
                "docked": false
            })
        );
    }
}
