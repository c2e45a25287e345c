/// Declares a string-backed identifier newtype
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the string representation
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

pub mod board;
pub mod card;
pub mod filter;
pub mod sorting;
pub mod stats;

pub use board::{Board, BoardId, BoardSettings, Column, ColumnId, Label, User};
pub use card::{Card, CardId, CardPatch, NewCard, Priority, Subtask};
pub use filter::{apply_filters, column_view, CardFilters};
pub use sorting::{sort_cards, SortField, SortOrder};
pub use stats::BoardStats;
