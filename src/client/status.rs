use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum LoadStatus {
    #[default]
    Idle = 0,
    Loading = 1,
    Loaded = 2,
    Failed = 3,
}

impl LoadStatus {
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(LoadStatus::Idle),
            1 => Some(LoadStatus::Loading),
            2 => Some(LoadStatus::Loaded),
            3 => Some(LoadStatus::Failed),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            LoadStatus::Idle => "idle",
            LoadStatus::Loading => "loading",
            LoadStatus::Loaded => "loaded",
            LoadStatus::Failed => "failed",
        }
    }

    pub const fn is_loading(self) -> bool {
        matches!(self, LoadStatus::Loading)
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for LoadStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for LoadStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u8::deserialize(deserializer)?;
        LoadStatus::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown load status {code}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

/// Status plus the latest request issued for it. Completions for any other
/// request are stale and must be dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Slot {
    status: LoadStatus,
    latest: Option<RequestId>,
}

impl Slot {
    pub fn status(&self) -> LoadStatus {
        self.status
    }

    pub fn begin(&mut self, request: RequestId) {
        self.status = LoadStatus::Loading;
        self.latest = Some(request);
    }

    pub fn accepts(&self, request: RequestId) -> bool {
        self.latest == Some(request)
    }

    pub fn finish(&mut self, status: LoadStatus) {
        self.status = status;
    }

    pub fn settle(&mut self, status: LoadStatus) {
        self.status = status;
        self.latest = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_wire_values() {
        let all = [LoadStatus::Idle, LoadStatus::Loading, LoadStatus::Loaded, LoadStatus::Failed];
        for (code, status) in all.into_iter().enumerate() {
            assert_eq!(status.code() as usize, code);
            assert_eq!(LoadStatus::from_code(code as u8), Some(status));
        }
        assert_eq!(LoadStatus::from_code(4), None);
        assert_eq!(serde_json::to_string(&LoadStatus::Failed).unwrap(), "3");
        assert!(serde_json::from_str::<LoadStatus>("9").is_err());
    }

    #[test]
    fn slot_only_accepts_latest_request() {
        let mut slot = Slot::default();
        assert!(!slot.accepts(RequestId(1)));

        slot.begin(RequestId(1));
        slot.begin(RequestId(2));
        assert!(slot.status().is_loading());
        assert!(!slot.accepts(RequestId(1)));
        assert!(slot.accepts(RequestId(2)));

        slot.settle(LoadStatus::Loaded);
        assert!(!slot.accepts(RequestId(2)));
    }
}
