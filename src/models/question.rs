// src/models/question.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// One of the four answer slots of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionKey {
    A,
    B,
    C,
    D,
}

impl OptionKey {
    pub const ALL: [OptionKey; 4] = [OptionKey::A, OptionKey::B, OptionKey::C, OptionKey::D];

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionKey::A => "A",
            OptionKey::B => "B",
            OptionKey::C => "C",
            OptionKey::D => "D",
        }
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(OptionKey::A),
            "B" => Ok(OptionKey::B),
            "C" => Ok(OptionKey::C),
            "D" => Ok(OptionKey::D),
            other => Err(format!("unknown option '{}'", other)),
        }
    }
}

/// A question as served to the student (the correct option is never sent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,

    /// Question text. May contain backtick-delimited code spans.
    pub text: String,

    /// Optional image URL shown under the text.
    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub option_a: String,
    #[serde(default)]
    pub option_b: String,
    #[serde(default)]
    pub option_c: String,
    #[serde(default)]
    pub option_d: String,
}

impl Question {
    pub fn option(&self, key: OptionKey) -> &str {
        match key {
            OptionKey::A => &self.option_a,
            OptionKey::B => &self.option_b,
            OptionKey::C => &self.option_c,
            OptionKey::D => &self.option_d,
        }
    }

    pub fn options(&self) -> [(OptionKey, &str); 4] {
        OptionKey::ALL.map(|key| (key, self.option(key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_key_parses_case_insensitively() {
        assert_eq!("b".parse::<OptionKey>(), Ok(OptionKey::B));
        assert_eq!(" D ".parse::<OptionKey>(), Ok(OptionKey::D));
        assert!("E".parse::<OptionKey>().is_err());
    }

    #[test]
    fn question_reads_backend_shape() {
        let q: Question = serde_json::from_value(serde_json::json!({
            "id": 7,
            "text": "What does `Vec::new` allocate?",
            "optionA": "Nothing",
            "optionB": "One page",
            "optionC": "16 bytes",
            "optionD": "Depends"
        }))
        .unwrap();

        assert_eq!(q.id, 7);
        assert!(q.image.is_none());
        assert_eq!(q.option(OptionKey::A), "Nothing");
        assert_eq!(q.options()[3], (OptionKey::D, "Depends"));
    }
}
