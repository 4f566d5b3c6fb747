//! Domain types consumed by the renderers and the assembly service.
//!
//! Everything in this module is read-only to the subsystem: participants and
//! events are loaded elsewhere and only borrowed here long enough to produce
//! a document.

use std::collections::BTreeSet;

use chrono::NaiveDate;

/// Opaque participant identifier.
pub type EntityId = u64;

/// The authoritative set of participants allowed to appear in an artifact for
/// a given event.  The caller computes it (registration status, permissions)
/// and passes it explicitly with each request.
pub type EligibleSet = BTreeSet<EntityId>;

/// Reference to the event a document is generated for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventRef {
    pub id: u64,
    pub name: String,
}

impl EventRef {
    /// Creates an event reference.
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Returns a sanitized, lowercase form of the event name suitable for use
    /// as a filename component.  Falls back to `"event"` when nothing of the
    /// name survives sanitization.
    pub fn slug(&self) -> String {
        let mut slug = String::new();
        let mut last_dash = false;

        for ch in self.name.trim().chars() {
            if ch.is_ascii_alphanumeric() {
                slug.push(ch.to_ascii_lowercase());
                last_dash = false;
            } else if (ch.is_whitespace() || ch == '-' || ch == '_') && !last_dash && !slug.is_empty()
            {
                slug.push('-');
                last_dash = true;
            }
        }

        let slug = slug.trim_matches('-');
        if slug.is_empty() {
            "event".to_string()
        } else {
            slug.to_string()
        }
    }
}

/// A participant record as loaded by the surrounding application.
#[derive(Clone, Debug, PartialEq)]
pub struct Participant {
    pub id: EntityId,
    pub display_name: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    pub organisation: Option<String>,
    pub allergies: String,
    pub annotation: String,
}

impl Participant {
    /// Returns the participant name in the requested badge format.
    ///
    /// [`NameFormat::WithOrganisation`] degrades to the plain display name
    /// when no organisation is recorded, so a badge never prints an empty
    /// name line.
    pub fn formatted_name(&self, format: NameFormat) -> String {
        match format {
            NameFormat::Display => self.display_name.clone(),
            NameFormat::FirstLast => format!("{} {}", self.first_name, self.last_name),
            NameFormat::WithOrganisation => match self.organisation.as_deref() {
                Some(organisation) => format!("{} ({})", self.display_name, organisation),
                None => self.display_name.clone(),
            },
        }
    }
}

/// Selects which name fields are printed on a badge and in which form.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NameFormat {
    /// The participant's display name.  This is the documented fallback for
    /// unknown format parameters.
    #[default]
    Display,
    /// First and last name from the profile.
    FirstLast,
    /// Display name qualified with the organisation.
    WithOrganisation,
}

impl NameFormat {
    /// Parses a request parameter, falling back to [`NameFormat::Display`]
    /// for unknown values rather than rendering blank badges.
    pub fn from_param(param: &str) -> Self {
        match param {
            "first_last" => Self::FirstLast,
            "with_organisation" => Self::WithOrganisation,
            _ => Self::Display,
        }
    }
}

/// Display options for badge sheets.
#[derive(Clone, Debug, Default)]
pub struct BadgeOptions {
    pub name_format: NameFormat,
    /// Color the organisation line with a per-organisation palette color.
    pub show_color: bool,
    /// Print the organisation underneath the name.
    pub show_organisation: bool,
    /// Raw bytes of an uploaded logo image, embedded on every card.
    pub logo: Option<Vec<u8>>,
}

impl BadgeOptions {
    /// Creates options with all toggles off and no logo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the name format and returns the updated options.
    pub fn with_name_format(mut self, name_format: NameFormat) -> Self {
        self.name_format = name_format;
        self
    }

    /// Enables organisation color coding and returns the updated options.
    pub fn with_color(mut self, show_color: bool) -> Self {
        self.show_color = show_color;
        self
    }

    /// Enables the organisation line and returns the updated options.
    pub fn with_organisation(mut self, show_organisation: bool) -> Self {
        self.show_organisation = show_organisation;
        self
    }

    /// Sets the logo image bytes and returns the updated options.
    pub fn with_logo(mut self, logo: impl Into<Option<Vec<u8>>>) -> Self {
        self.logo = logo.into();
        self
    }
}
