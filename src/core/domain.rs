//! Identifiers and small domain enums.
//!
//! Priority: low, medium, high, critical (default medium)
//! LabelColor: fixed palette
//! ViewMode: which board view the workspace shows
//! CardKind: task, story, epic, bug
//! RetroCategory: went_well, to_improve, action

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Fresh random identifier.
            pub fn generate() -> Self {
                let uuid = Uuid::new_v4().simple().to_string();
                Self(format!(concat!($prefix, "-{}"), &uuid[..12]))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({:?})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self::new(raw)
            }
        }
    };
}

string_id!(
    /// Stable project identifier, unique within the workspace.
    ProjectId,
    "prj"
);
string_id!(
    /// Card identifier, unique within its project.
    CardId,
    "card"
);
string_id!(
    /// Column identifier; `backlog` is reserved for the sentinel.
    ColumnId,
    "col"
);
string_id!(RetroBoardId, "retro");
string_id!(RetroItemId, "item");

impl ColumnId {
    pub const BACKLOG: &'static str = "backlog";

    /// Sentinel column for cards that are not on the board.
    pub fn backlog() -> Self {
        Self::new(Self::BACKLOG)
    }

    pub fn is_backlog(&self) -> bool {
        self.0 == Self::BACKLOG
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

crate::enum_str! {
    impl Priority {
        variants {
            Low => ["low"],
            Medium => ["medium", "med", "normal"],
            High => ["high"],
            Critical => ["critical", "urgent"],
        }
    }
}

impl Priority {
    /// Legacy documents stored priority as 0 (critical) ..= 3 (low).
    pub fn from_legacy_rank(rank: i64) -> Option<Self> {
        match rank {
            0 => Some(Self::Critical),
            1 => Some(Self::High),
            2 => Some(Self::Medium),
            3 => Some(Self::Low),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelColor {
    #[default]
    Gray,
    Red,
    Orange,
    Yellow,
    Green,
    Teal,
    Blue,
    Purple,
    Pink,
}

crate::enum_str! {
    impl LabelColor {
        variants {
            Gray => ["gray", "grey"],
            Red => ["red"],
            Orange => ["orange"],
            Yellow => ["yellow"],
            Green => ["green"],
            Teal => ["teal", "cyan"],
            Blue => ["blue"],
            Purple => ["purple", "violet"],
            Pink => ["pink"],
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Board,
    List,
    Backlog,
    Retro,
    Timeline,
}

crate::enum_str! {
    impl ViewMode {
        variants {
            Board => ["board", "kanban"],
            List => ["list"],
            Backlog => ["backlog"],
            Retro => ["retro", "retrospective"],
            Timeline => ["timeline", "roadmap"],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    Task,
    Story,
    Epic,
    Bug,
}

crate::enum_str! {
    impl CardKind {
        variants {
            Task => ["task"],
            Story => ["story", "user_story"],
            Epic => ["epic"],
            Bug => ["bug", "defect"],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetroCategory {
    WentWell,
    ToImprove,
    Action,
}

crate::enum_str! {
    impl RetroCategory {
        variants {
            WentWell => ["went_well", "wentwell", "good"],
            ToImprove => ["to_improve", "toimprove", "improve", "bad"],
            Action => ["action", "action_item", "actions"],
        }
    }
}
