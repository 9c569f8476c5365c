use serde_json::{json, Value};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Command used for room-targeted cleaning.
pub const SEGMENT_CLEAN: &str = "app_segment_clean";

/// Repeat count sent with every segment clean.
pub const SEGMENT_CLEAN_REPEAT: u32 = 1;

/// Parameterless commands the assistant knows how to issue.
///
/// The session manager passes command names through untouched; this list
/// only feeds tool schemas and CLI help.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum BasicCommand {
    AppCharge,
    AppStartWash,
    AppStopWash,
    AppStart,
    AppStop,
    AppPause,
    AppStartCollectDust,
    AppStopCollectDust,
    GetRoomMapping,
}

impl BasicCommand {
    pub fn description(&self) -> &'static str {
        match self {
            BasicCommand::AppCharge => "sends the vacuum back to the dock",
            BasicCommand::AppStartWash => "starts washing the mop while docked",
            BasicCommand::AppStopWash => "stops washing the mop while docked",
            BasicCommand::AppStart => "starts a general vacuuming and mopping job",
            BasicCommand::AppStop => "stops the current vacuuming and mopping job",
            BasicCommand::AppPause => "pauses the current vacuuming and mopping job",
            BasicCommand::AppStartCollectDust => "starts emptying the dust bin",
            BasicCommand::AppStopCollectDust => "stops emptying the dust bin",
            BasicCommand::GetRoomMapping => "gets the list of rooms on the map",
        }
    }

    pub fn names() -> Vec<&'static str> {
        BasicCommand::iter().map(<&'static str>::from).collect()
    }
}

/// Build the `app_segment_clean` parameter list.
pub fn segment_clean_params(segments: &[u32]) -> Value {
    json!([{ "segments": segments, "repeat": SEGMENT_CLEAN_REPEAT }])
}
