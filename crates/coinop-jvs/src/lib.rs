//! Serial I/O chain for cabinet controls.
//!
//! A host polls a daisy chain of I/O nodes over a shared serial line. Frames
//! carry a sync byte, a destination node, a length, a command body, and a
//! mod-256 checksum; sync and escape byte values inside the body are escaped
//! on the wire. Nodes get their addresses assigned at bus reset, farthest
//! node first, mirroring the sense-line daisy chain of the real cabling.
//!
//! [`JvsHost`] owns the chain and the staged request buffer, [`JvsNode`] is
//! the capability contract a node implements, and [`JvsIoBoard`] is the
//! standard two-player board.

#![forbid(unsafe_code)]

mod board;
mod framing;
mod host;
mod node;

pub use board::{
    JvsIoBoard, PlayerSwitch, SystemSwitch, ANALOG_CHANNELS, COIN_COUNTER_MODULUS, COIN_SLOTS,
    PLAYER_COUNT, SWITCHES_PER_PLAYER,
};
pub use framing::{
    checksum, decode_frame, frame_encoded, frame_raw, FrameError, BROADCAST, ESCAPE, HOST_NODE,
    SYNC,
};
pub use host::JvsHost;
pub use node::{
    JvsNode, CMD_CMD_REV, CMD_COIN_ADD, CMD_COIN_SUB, CMD_COMM_VER, CMD_FUNCTION_LIST,
    CMD_JVS_REV, CMD_READ_ANALOGS, CMD_READ_COINS, CMD_READ_ID, CMD_READ_SWITCHES, CMD_RESET,
    CMD_RESET_ARG, CMD_SET_ADDRESS, CMD_WRITE_OUTPUTS, REPORT_NORMAL, REPORT_PARAM_COUNT,
    REPORT_PARAM_DATA, STATUS_CHECKSUM_ERROR, STATUS_NORMAL, STATUS_OVERFLOW,
    STATUS_UNKNOWN_COMMAND,
};
