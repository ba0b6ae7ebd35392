//! Ticket status vocabulary
//!
//! The backend stores status as free text and different clients have written
//! English, Spanish, capitalized and snake_case variants. Everything funnels
//! through [`TicketStatus::parse`]; display labels are always the lowercase
//! Spanish forms.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a claim or request
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum TicketStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Rejected,
    /// Anything outside the known vocabulary, kept verbatim
    Other(String),
}

impl TicketStatus {
    /// The known states, in lifecycle order
    pub const KNOWN: [TicketStatus; 4] = [
        TicketStatus::Pending,
        TicketStatus::InProgress,
        TicketStatus::Completed,
        TicketStatus::Rejected,
    ];

    /// Map any backend spelling onto the canonical state
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "pending" | "pendiente" => TicketStatus::Pending,
            "in progress" | "en proceso" => TicketStatus::InProgress,
            "completed" | "completado" => TicketStatus::Completed,
            "rejected" | "rechazado" => TicketStatus::Rejected,
            _ => TicketStatus::Other(raw.to_string()),
        }
    }

    /// Lowercase Spanish label shown in lists and pills
    pub fn label(&self) -> &str {
        match self {
            TicketStatus::Pending => "pendiente",
            TicketStatus::InProgress => "en proceso",
            TicketStatus::Completed => "completado",
            TicketStatus::Rejected => "rechazado",
            TicketStatus::Other(raw) => raw,
        }
    }

    /// Spelling written back to the backend
    pub fn wire(&self) -> &str {
        match self {
            TicketStatus::Pending => "Pendiente",
            TicketStatus::InProgress => "En Proceso",
            TicketStatus::Completed => "Completado",
            TicketStatus::Rejected => "Rechazado",
            TicketStatus::Other(raw) => raw,
        }
    }

    /// Key used by the reports endpoint counters
    pub fn report_key(&self) -> Option<&'static str> {
        match self {
            TicketStatus::Pending => Some("pendiente"),
            TicketStatus::InProgress => Some("en_proceso"),
            TicketStatus::Completed => Some("completado"),
            TicketStatus::Rejected => Some("rechazado"),
            TicketStatus::Other(_) => None,
        }
    }

    /// CSS classes of the status pill
    pub fn pill_class(&self) -> &'static str {
        match self {
            TicketStatus::Pending => "bg-yellow-100 text-yellow-800",
            TicketStatus::InProgress => "bg-blue-100 text-blue-800",
            TicketStatus::Completed => "bg-green-100 text-green-800",
            TicketStatus::Rejected => "bg-red-100 text-red-800",
            TicketStatus::Other(_) => "bg-gray-100 text-gray-800",
        }
    }

    /// Forward transition offered to admins; none once completed or rejected.
    /// Nothing stops a direct API caller from skipping steps.
    pub fn next(&self) -> Option<TicketStatus> {
        match self {
            TicketStatus::Pending => Some(TicketStatus::InProgress),
            TicketStatus::InProgress => Some(TicketStatus::Completed),
            _ => None,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, TicketStatus::Completed | TicketStatus::Rejected)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TicketStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TicketStatus::parse(s))
    }
}

impl Serialize for TicketStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire())
    }
}

/// `null` reads the same as a missing field
impl<'de> Deserialize<'de> for TicketStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .map(|raw| TicketStatus::parse(&raw))
            .unwrap_or_default())
    }
}
