//! Replies printed for each script command
//!
//! Rendering follows redis-cli conventions so transcripts read familiarly.

/// Reply to a single command
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Status line: OK, PONG
    Status(String),
    /// Error: (error) message
    Error(String),
    /// Integer: (integer) 42
    Integer(i64),
    /// Boolean: true / false
    Bool(bool),
    /// Free text, printed as-is
    Text(String),
    /// Ordered list of strings
    List(Vec<String>),
    /// Absent value: (nil)
    Nil,
}

impl Reply {
    /// The plain OK status
    pub fn ok() -> Self {
        Reply::Status("OK".to_string())
    }

    /// Is this an error reply?
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }

    /// Render for a terminal or transcript
    pub fn render(&self) -> String {
        match self {
            Reply::Status(s) => s.clone(),
            Reply::Error(e) => format!("(error) {}", e),
            Reply::Integer(i) => format!("(integer) {}", i),
            Reply::Bool(b) => b.to_string(),
            Reply::Text(t) => t.clone(),
            Reply::List(items) if items.is_empty() => "(empty list)".to_string(),
            Reply::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| format!("{}) {}", i + 1, item))
                .collect::<Vec<_>>()
                .join("\n"),
            Reply::Nil => "(nil)".to_string(),
        }
    }
}
