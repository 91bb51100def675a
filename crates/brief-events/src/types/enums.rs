//! Closed value sets stored as text columns.

use serde::{Deserialize, Serialize};

macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $(
                $(#[doc = $doc:literal])*
                $variant:ident => $wire:literal
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[doc = $doc])*
                #[serde(rename = $wire)]
                $variant,
            )*
        }

        impl $name {
            /// All values in definition order.
            pub const ALL: &'static [Self] = &[$(Self::$variant,)*];

            /// Stored / wire string.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)*
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)*
                    _ => Err(format!("invalid {}: {s}", stringify!($name))),
                }
            }
        }

        impl rusqlite::types::ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
                Ok(rusqlite::types::ToSqlOutput::from(self.as_str()))
            }
        }

        impl rusqlite::types::FromSql for $name {
            fn column_result(
                value: rusqlite::types::ValueRef<'_>,
            ) -> rusqlite::types::FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: String| rusqlite::types::FromSqlError::Other(e.into()))
            }
        }
    };
}

text_enum! {
    /// Work-in-progress category a block belongs to.
    Lane {
        /// Long-term direction.
        Vision => "vision",
        /// Concrete objectives.
        Goals => "goals",
        /// Being worked on now.
        Current => "current",
        /// Up next.
        Next => "next",
        /// Background material.
        Context => "context",
    }
}

text_enum! {
    /// Block lifecycle state.
    BlockStatus {
        /// No progress yet.
        NotStarted => "not_started",
        /// Partially done.
        InProgress => "in_progress",
        /// Done.
        Completed => "completed",
        /// Waiting on something.
        Blocked => "blocked",
        /// Abandoned.
        Cancelled => "cancelled",
    }
}

impl BlockStatus {
    /// Status implied by a progress percentage.
    #[must_use]
    pub fn from_progress(progress: u8) -> Self {
        match progress {
            0 => Self::NotStarted,
            100..=u8::MAX => Self::Completed,
            _ => Self::InProgress,
        }
    }
}

text_enum! {
    /// Block priority.
    Priority {
        /// Low.
        Low => "low",
        /// Medium.
        Medium => "medium",
        /// High.
        High => "high",
        /// Urgent.
        Urgent => "urgent",
    }
}

text_enum! {
    /// Kind of captured context.
    ContextType {
        /// A choice that was made.
        Decision => "decision",
        /// Something learned.
        Insight => "insight",
        /// Something in the way.
        Blocker => "blocker",
        /// How a problem was solved.
        Solution => "solution",
        /// Pointer to outside material.
        Reference => "reference",
        /// Free-form note.
        Note => "note",
    }
}

text_enum! {
    /// Kind of GitHub object.
    ProviderType {
        /// Pull request.
        Pr => "pr",
        /// Issue.
        Issue => "issue",
        /// Commit.
        Commit => "commit",
        /// Release.
        Release => "release",
        /// Pull request comment.
        PrComment => "pr_comment",
    }
}

text_enum! {
    /// Assistant work session state.
    SessionStatus {
        /// Running.
        Active => "active",
        /// Finished.
        Ended => "ended",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_from_progress() {
        assert_eq!(BlockStatus::from_progress(0), BlockStatus::NotStarted);
        assert_eq!(BlockStatus::from_progress(1), BlockStatus::InProgress);
        assert_eq!(BlockStatus::from_progress(99), BlockStatus::InProgress);
        assert_eq!(BlockStatus::from_progress(100), BlockStatus::Completed);
    }

    #[test]
    fn serde_matches_as_str() {
        for lane in Lane::ALL {
            assert_eq!(serde_json::to_value(lane).unwrap(), lane.as_str());
        }
        for status in BlockStatus::ALL {
            assert_eq!(serde_json::to_value(status).unwrap(), status.as_str());
        }
        for t in ProviderType::ALL {
            assert_eq!(serde_json::to_value(t).unwrap(), t.as_str());
        }
    }

    #[test]
    fn from_str_round_trips() {
        for p in Priority::ALL {
            assert_eq!(p.as_str().parse::<Priority>().unwrap(), *p);
        }
        for t in ContextType::ALL {
            assert_eq!(t.as_str().parse::<ContextType>().unwrap(), *t);
        }
    }

    #[test]
    fn from_str_rejects_unknown() {
        let err = "someday".parse::<Lane>().unwrap_err();
        assert!(err.contains("Lane"));
    }

    #[test]
    fn sql_round_trip() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let back: SessionStatus = conn
            .query_row("SELECT ?1", [SessionStatus::Ended], |row| row.get(0))
            .unwrap();
        assert_eq!(back, SessionStatus::Ended);

        let bad: rusqlite::Result<Lane> = conn.query_row("SELECT 'later'", [], |row| row.get(0));
        assert!(bad.is_err());
    }
}
