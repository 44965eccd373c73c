//! Key text handling for command descriptors.
//!
//! Descriptors carry their bindings as an alternation of chord strings such as
//! `"F5 | Ctrl+Enter"`. The registry stores the raw text for display and uses
//! the parsed [`KeyChord`]s only to answer "which commands claim this chord".

use std::fmt;
use std::str::FromStr;

// ── Modifiers ───────────────────────────────────────────────────

/// Canonical modifier order used for display and comparison.
const MODIFIER_ORDER: [&str; 4] = ["Ctrl", "Alt", "Shift", "Meta"];

fn canonical_modifier(raw: &str) -> Option<&'static str> {
    match raw.to_ascii_lowercase().as_str() {
        "ctrl" | "control" | "cmdorctrl" => Some("Ctrl"),
        "alt" | "option" => Some("Alt"),
        "shift" => Some("Shift"),
        "meta" | "cmd" | "command" | "super" | "win" => Some("Meta"),
        _ => None,
    }
}

// ── KeyChord ────────────────────────────────────────────────────

/// One key combination, e.g. `Ctrl+Shift+S`. Modifiers are kept in canonical
/// order and the key is compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyChord {
    modifiers: Vec<&'static str>,
    key: String,
}

impl KeyChord {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn modifiers(&self) -> &[&'static str] {
        &self.modifiers
    }
}

impl FromStr for KeyChord {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("Empty key chord".to_string());
        }

        // `Ctrl++` and `Ctrl+-` bind the plus/minus keys themselves.
        let (head, key) = match trimmed.strip_suffix("++") {
            Some(head) => (head, "+".to_string()),
            None => match trimmed.rsplit_once('+') {
                Some((head, key)) if !key.trim().is_empty() => (head, key.trim().to_string()),
                Some(_) => return Err(format!("Key chord \"{trimmed}\" has no key")),
                None => ("", trimmed.to_string()),
            },
        };

        let mut modifiers = Vec::new();
        for part in head.split('+').map(str::trim).filter(|p| !p.is_empty()) {
            let modifier = canonical_modifier(part)
                .ok_or_else(|| format!("Unknown modifier \"{part}\" in \"{trimmed}\""))?;
            if !modifiers.contains(&modifier) {
                modifiers.push(modifier);
            }
        }
        modifiers.sort_by_key(|m| MODIFIER_ORDER.iter().position(|o| o == m));

        let key = if key.chars().count() == 1 {
            key.to_ascii_uppercase()
        } else {
            // Named keys: normalise casing ("enter" → "Enter", "f5" → "F5").
            let mut chars = key.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
            })
        };

        Ok(Self { modifiers, key })
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for m in &self.modifiers {
            write!(f, "{m}+")?;
        }
        write!(f, "{}", self.key)
    }
}

// ── KeyText ─────────────────────────────────────────────────────

/// The raw key text of a descriptor plus its parsed chords.
///
/// Unparseable alternatives are kept in the raw text (for display) but never
/// match a chord.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyText {
    raw: String,
    chords: Vec<KeyChord>,
}

impl KeyText {
    pub fn parse(raw: &str) -> Self {
        let chords = raw
            .split('|')
            .filter_map(|alt| alt.parse::<KeyChord>().ok())
            .collect();
        Self {
            raw: raw.trim().to_string(),
            chords,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn chords(&self) -> &[KeyChord] {
        &self.chords
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn contains(&self, chord: &KeyChord) -> bool {
        self.chords.iter().any(|c| c == chord)
    }
}

impl fmt::Display for KeyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
