//! CAMEO event-code classification.
//!
//! Two stateless lookups: the broad category an event code belongs to, and
//! whether the event type promotes or suppresses democratic participation.
//! Both are plain table lookups over the constants below.

use serde::{Deserialize, Serialize};
use std::fmt;

// ── Code tables ───────────────────────────────────────────────────────────────

/// Event codes read as promoting democratic participation.
pub const PROMOTES_DEMOCRACY: &[i64] = &[
    1041, // demand leadership change
    1042, // demand policy change
    1043, // demand rights
    1044, // demand change in institutions or regime
    133,  // threaten political dissent (by civilians)
    141,  // demonstrate or rally
    1411, // demonstrate for leadership change
    1412, // demonstrate for policy change
    1414, // demonstrate for change in institutions
    1413, // demonstrate for human rights
    142,  // general hunger strike
    1423, // hunger strike for human rights
    1421, // hunger strike for leadership change
    1422, // hunger strike for policy change
    1424, // hunger strike for change in institutions
    143,  // general strike
    1431, // strike for leadership change
    1432, // strike for policy change
    1434, // strike for change in institutions
    1433, // strike or boycott for human rights
    1441, // obstruction for leadership change
    1442, // obstruction for policy change
    1444, // obstruction for institutional change
    1443, // obstruction for human rights
    1451, // riot for leadership change
    1452, // riot for policy change
    1454, // riot for institutional change
    1453, // riot for human rights
    1033, // demand humanitarian aid
    104,  // demand political reform
    1122, // accuse of human rights abuses
    1124, // accuse of war crimes
    113,  // rally opposition against
    1312, // threaten a boycott or strike
];

/// Event codes read as suppressing democratic participation.
pub const SUPPRESSES_DEMOCRACY: &[i64] = &[
    1052, // demand easing of political dissent
    1321, // threaten with restrictions on political freedoms
    1322, // threaten to ban political parties or politicians
    1323, // threaten curfew
    1324, // threaten martial law
    137,  // threaten with repression
    1382, // threaten occupation
    1385, // threaten unconventional mass violence
    153,  // mobilize military or police power upon civilians
    1822, // torture
    201,  // mass expulsion
    202,  // mass killings
    203,  // ethnic cleansing
];

/// Two-digit root codes that get their own category; everything else is
/// [`EventCategory::Other`].
pub const CATEGORY_PREFIXES: &[&str] = &["10", "11", "13", "14", "15", "18", "20"];

// ── EventCategory ─────────────────────────────────────────────────────────────

/// Broad event category derived from the root of a CAMEO code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventCategory {
    Demands,
    Disapproval,
    Threat,
    Protest,
    Force,
    Assault,
    MassViolence,
    Other,
}

impl EventCategory {
    /// Resolve a two-digit root code. Unknown roots map to `Other`.
    pub fn from_prefix(prefix: &str) -> Self {
        match prefix {
            "10" => EventCategory::Demands,
            "11" => EventCategory::Disapproval,
            "13" => EventCategory::Threat,
            "14" => EventCategory::Protest,
            "15" => EventCategory::Force,
            "18" => EventCategory::Assault,
            "20" => EventCategory::MassViolence,
            _ => EventCategory::Other,
        }
    }

    /// The category key: the two-digit root, or `"Other"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Demands => "10",
            EventCategory::Disapproval => "11",
            EventCategory::Threat => "13",
            EventCategory::Protest => "14",
            EventCategory::Force => "15",
            EventCategory::Assault => "18",
            EventCategory::MassViolence => "20",
            EventCategory::Other => "Other",
        }
    }

    /// Human-readable label used on charts.
    pub fn label(&self) -> &'static str {
        match self {
            EventCategory::Demands => "Demands",
            EventCategory::Disapproval => "Disapproval",
            EventCategory::Threat => "Threat",
            EventCategory::Protest => "Protest",
            EventCategory::Force => "Force",
            EventCategory::Assault => "Assault",
            EventCategory::MassViolence => "Mass Violence",
            EventCategory::Other => "Other",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of `event_code`, judged on the first two characters of its
/// string form.
pub fn category_of(event_code: impl fmt::Display) -> EventCategory {
    let code = event_code.to_string();
    match code.get(..2) {
        Some(prefix) if CATEGORY_PREFIXES.contains(&prefix) => EventCategory::from_prefix(prefix),
        _ => EventCategory::Other,
    }
}

// ── Orientation ───────────────────────────────────────────────────────────────

/// Effect of an event type on democratic participation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Promotes,
    Suppresses,
    Neutral,
}

impl Orientation {
    /// `+1`, `-1` or `0`.
    pub fn sign(&self) -> i8 {
        match self {
            Orientation::Promotes => 1,
            Orientation::Suppresses => -1,
            Orientation::Neutral => 0,
        }
    }
}

/// Anything that can stand in for a numeric CAMEO code.
pub trait AsEventCode {
    /// The integer value of the code, or `None` when it has none.
    fn as_event_code(&self) -> Option<i64>;
}

macro_rules! impl_as_event_code_int {
    ($($t:ty),*) => {
        $(impl AsEventCode for $t {
            fn as_event_code(&self) -> Option<i64> {
                i64::try_from(*self).ok()
            }
        })*
    };
}

impl_as_event_code_int!(i16, i32, i64, u16, u32, u64, usize);

/// Float codes (as left behind by numeric column loaders) count only when
/// they hold a whole number.
impl AsEventCode for f64 {
    fn as_event_code(&self) -> Option<i64> {
        let whole = self.is_finite() && self.fract() == 0.0 && self.abs() < i64::MAX as f64;
        whole.then_some(*self as i64)
    }
}

impl AsEventCode for &str {
    fn as_event_code(&self) -> Option<i64> {
        self.trim().parse().ok()
    }
}

impl AsEventCode for String {
    fn as_event_code(&self) -> Option<i64> {
        self.as_str().as_event_code()
    }
}

impl AsEventCode for &String {
    fn as_event_code(&self) -> Option<i64> {
        self.as_str().as_event_code()
    }
}

/// Classify `event_code` against the promoting and suppressing tables.
///
/// String codes are read as base-10 integers, so `"0133"` and `133` agree.
/// Codes in neither table, and strings that are not integers, are neutral.
pub fn democracy_orientation(event_code: impl AsEventCode) -> Orientation {
    let Some(code) = event_code.as_event_code() else {
        return Orientation::Neutral;
    };
    if PROMOTES_DEMOCRACY.contains(&code) {
        Orientation::Promotes
    } else if SUPPRESSES_DEMOCRACY.contains(&code) {
        Orientation::Suppresses
    } else {
        Orientation::Neutral
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
