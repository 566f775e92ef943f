use serde::{Deserialize, Serialize};

/// Error returned when a wire string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {field} value: {value}")]
pub struct InvalidEnum {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

// Who authored a transcript message.
str_enum!(ChatRole {
    Operator => "operator",
    Assistant => "assistant",
});

// Role names understood by the chat-completion endpoint.
str_enum!(WireRole {
    System => "system",
    User => "user",
    Assistant => "assistant",
});

str_enum!(PlanOperation {
    List => "list",
    Create => "create",
    Update => "update",
    Delete => "delete",
});

str_enum!(PatientOperation {
    List => "list",
    Create => "create",
    Delete => "delete",
    RecordVisit => "record_visit",
    VisitHistory => "visit_history",
    Extract => "extract",
});

impl From<ChatRole> for WireRole {
    fn from(role: ChatRole) -> Self {
        match role {
            ChatRole::Operator => WireRole::User,
            ChatRole::Assistant => WireRole::Assistant,
        }
    }
}
