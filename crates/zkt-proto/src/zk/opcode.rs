//! Request opcodes. See `ZooDefs.java` for the numbering.

use crate::error::DecodeError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    Connect,
    Create,
    Delete,
    Exists,
    GetData,
    SetData,
    GetAcl,
    SetAcl,
    GetChildren,
    Sync,
    Ping,
    GetChildren2,
    Check,
    Multi,
    Create2,
    Reconfig,
    SetAuth,
    SetWatches,
    Close,
}

impl OpCode {
    pub fn code(self) -> i32 {
        match self {
            OpCode::Connect => 0,
            OpCode::Create => 1,
            OpCode::Delete => 2,
            OpCode::Exists => 3,
            OpCode::GetData => 4,
            OpCode::SetData => 5,
            OpCode::GetAcl => 6,
            OpCode::SetAcl => 7,
            OpCode::GetChildren => 8,
            OpCode::Sync => 9,
            OpCode::Ping => 11,
            OpCode::GetChildren2 => 12,
            OpCode::Check => 13,
            OpCode::Multi => 14,
            OpCode::Create2 => 15,
            OpCode::Reconfig => 16,
            OpCode::SetAuth => 100,
            OpCode::SetWatches => 101,
            OpCode::Close => -11,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OpCode::Connect => "Connect",
            OpCode::Create => "Create",
            OpCode::Delete => "Delete",
            OpCode::Exists => "Exists",
            OpCode::GetData => "GetData",
            OpCode::SetData => "SetData",
            OpCode::GetAcl => "GetAcl",
            OpCode::SetAcl => "SetAcl",
            OpCode::GetChildren => "GetChildren",
            OpCode::Sync => "Sync",
            OpCode::Ping => "Ping",
            OpCode::GetChildren2 => "GetChildren2",
            OpCode::Check => "Check",
            OpCode::Multi => "Multi",
            OpCode::Create2 => "Create2",
            OpCode::Reconfig => "Reconfig",
            OpCode::SetAuth => "SetAuth",
            OpCode::SetWatches => "SetWatches",
            OpCode::Close => "Close",
        }
    }

    /// Operations that mutate the tree (or may, in Multi's case).
    pub fn is_write(self) -> bool {
        matches!(
            self,
            OpCode::Create
                | OpCode::Create2
                | OpCode::Delete
                | OpCode::SetData
                | OpCode::SetAcl
                | OpCode::Multi
                | OpCode::Reconfig
        )
    }

    /// Operations whose wire body starts with a path string.
    pub fn has_path(self) -> bool {
        !matches!(
            self,
            OpCode::Connect
                | OpCode::SetWatches
                | OpCode::Ping
                | OpCode::SetAuth
                | OpCode::Multi
                | OpCode::Close
                | OpCode::Reconfig
        )
    }

    /// Read operations that carry a watch flag after the path.
    pub fn reads_watch(self) -> bool {
        matches!(
            self,
            OpCode::Exists | OpCode::GetData | OpCode::GetChildren | OpCode::GetChildren2
        )
    }
}

impl TryFrom<i32> for OpCode {
    type Error = DecodeError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(OpCode::Connect),
            1 => Ok(OpCode::Create),
            2 => Ok(OpCode::Delete),
            3 => Ok(OpCode::Exists),
            4 => Ok(OpCode::GetData),
            5 => Ok(OpCode::SetData),
            6 => Ok(OpCode::GetAcl),
            7 => Ok(OpCode::SetAcl),
            8 => Ok(OpCode::GetChildren),
            9 => Ok(OpCode::Sync),
            11 => Ok(OpCode::Ping),
            12 => Ok(OpCode::GetChildren2),
            13 => Ok(OpCode::Check),
            14 => Ok(OpCode::Multi),
            15 => Ok(OpCode::Create2),
            16 => Ok(OpCode::Reconfig),
            100 => Ok(OpCode::SetAuth),
            101 => Ok(OpCode::SetWatches),
            -11 => Ok(OpCode::Close),
            other => Err(DecodeError::UnknownOpCode(other)),
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}
