pub mod api;
pub mod command;
pub mod connection;
pub mod rooms;
pub mod session;
pub mod status;
pub mod types;

pub use api::{ApiError, CloudApi, RoborockWebApi};
pub use command::{BasicCommand, SEGMENT_CLEAN};
pub use connection::{
    DeviceConnection, DeviceConnector, RpcBridgeConnection, RpcBridgeConnector, TransportError,
};
pub use rooms::{Room, RoomMap, UnknownRoom};
pub use session::{ConnectError, DeviceSessionManager, SessionError};
pub use status::{
    DeviceStatus, FanPower, MopMode, RawStatus, StatusReport, VacuumError, VacuumState,
};
pub use types::{DeviceData, HomeData, UserData};
