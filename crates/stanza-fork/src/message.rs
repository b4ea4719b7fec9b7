//! Tagged IPC messages.

use serde::{Deserialize, Serialize};

/// Bumped on any change to the frame layout. Frames carrying another
/// version are rejected by the coordinator instead of being guessed at.
pub const PROTOCOL_VERSION: u32 = 1;

/// One message on a worker's stream.
///
/// Workers send any number of `TaskDone` frames, in task order, followed by
/// exactly one `ProcessDone` frame.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PoolMessage<T, A> {
    TaskDone { version: u32, payload: T },
    ProcessDone { version: u32, payload: A },
}

impl<T, A> PoolMessage<T, A> {
    pub fn task_done(payload: T) -> Self {
        PoolMessage::TaskDone {
            version: PROTOCOL_VERSION,
            payload,
        }
    }

    pub fn process_done(payload: A) -> Self {
        PoolMessage::ProcessDone {
            version: PROTOCOL_VERSION,
            payload,
        }
    }

    pub fn version(&self) -> u32 {
        match self {
            PoolMessage::TaskDone { version, .. } | PoolMessage::ProcessDone { version, .. } => {
                *version
            }
        }
    }
}
