use std::fmt;

/// Added to a request id to form its reply id.
pub const REPLY_FLAG: u32 = 0x80;

/// Known control-channel messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageId {
    SystemInfo,
    Esp32Reset,
    /// Reset of the companion microcontroller that runs the AYAB firmware.
    Ra4m1Reset,
    GetNetworkParams,
    SetNetworkParams,
    ListFiles,
    DeleteFiles,
}

/// Classification of an `id` seen on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireId {
    Request(MessageId),
    Reply(MessageId),
    Unknown(u32),
}

impl MessageId {
    pub const ALL: [MessageId; 7] = [
        MessageId::SystemInfo,
        MessageId::Esp32Reset,
        MessageId::Ra4m1Reset,
        MessageId::GetNetworkParams,
        MessageId::SetNetworkParams,
        MessageId::ListFiles,
        MessageId::DeleteFiles,
    ];

    /// Request id sent by the host.
    pub const fn request_id(self) -> u32 {
        match self {
            Self::SystemInfo => 1,
            Self::Esp32Reset => 2,
            Self::Ra4m1Reset => 3,
            Self::GetNetworkParams => 16,
            Self::SetNetworkParams => 17,
            Self::ListFiles => 32,
            Self::DeleteFiles => 33,
        }
    }

    /// Reply id, or `None` for requests the controller never answers.
    pub const fn reply_id(self) -> Option<u32> {
        match self {
            Self::Esp32Reset | Self::Ra4m1Reset => None,
            other => Some(other.request_id() + REPLY_FLAG),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::SystemInfo => "system-info",
            Self::Esp32Reset => "esp32-reset",
            Self::Ra4m1Reset => "ra4m1-reset",
            Self::GetNetworkParams => "get-network-params",
            Self::SetNetworkParams => "set-network-params",
            Self::ListFiles => "list-files",
            Self::DeleteFiles => "delete-files",
        }
    }

    /// Look up a message by its kebab-case name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }

    /// Classify a wire id as a request or reply of a known message.
    pub fn from_wire(id: u32) -> WireId {
        for message in Self::ALL {
            if message.request_id() == id {
                return WireId::Request(message);
            }
            if message.reply_id() == Some(id) {
                return WireId::Reply(message);
            }
        }
        WireId::Unknown(id)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_table() {
        assert_eq!(MessageId::SystemInfo.request_id(), 1);
        assert_eq!(MessageId::SystemInfo.reply_id(), Some(129));
        assert_eq!(MessageId::GetNetworkParams.reply_id(), Some(144));
        assert_eq!(MessageId::SetNetworkParams.reply_id(), Some(145));
        assert_eq!(MessageId::ListFiles.reply_id(), Some(160));
        assert_eq!(MessageId::DeleteFiles.reply_id(), Some(161));
        assert_eq!(MessageId::Esp32Reset.reply_id(), None);
        assert_eq!(MessageId::Ra4m1Reset.request_id(), 3);
    }

    #[test]
    fn request_ids_stay_below_reply_flag() {
        for id in MessageId::ALL {
            assert!(id.request_id() < REPLY_FLAG, "{id}");
        }
    }

    #[test]
    fn classify_wire_ids() {
        assert_eq!(MessageId::from_wire(1), WireId::Request(MessageId::SystemInfo));
        assert_eq!(MessageId::from_wire(129), WireId::Reply(MessageId::SystemInfo));
        assert_eq!(MessageId::from_wire(161), WireId::Reply(MessageId::DeleteFiles));
        assert_eq!(MessageId::from_wire(130), WireId::Unknown(130));
        assert_eq!(MessageId::from_wire(999), WireId::Unknown(999));
    }

    #[test]
    fn names_round_trip() {
        for id in MessageId::ALL {
            assert_eq!(MessageId::from_name(id.name()), Some(id));
        }
        assert_eq!(MessageId::from_name("nope"), None);
    }
}
