use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum VariantError {
    #[error("malformed variant {text:?}: must have at least 3 characters")]
    TooShort { text: String },
    #[error("malformed variant {text:?}: only ASCII residues are supported")]
    NonAscii { text: String },
    #[error("malformed variant {text:?}: position {position:?} is not a non-negative integer")]
    InvalidPosition { text: String, position: String },
}

/// A single amino-acid substitution, e.g. `V171R`.
/// The position is signed so that coordinate shifts can be applied freely; any lower bound is checked by the caller.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Variant {
    /// The wild-type residue
    wild_type: u8,
    /// The position of the residue, 1-based in whatever coordinate system produced it
    position: i64,
    /// The substituted residue
    mutant: u8,
}

impl Variant {
    /// Constructor
    /// # Arguments
    /// * `wild_type` - the reference residue
    /// * `position` - 1-based position of the substitution
    /// * `mutant` - the residue after substitution
    pub fn new(wild_type: u8, position: i64, mutant: u8) -> Self {
        Self { wild_type, position, mutant }
    }

    /// Returns a copy of this variant with `offset` added to the position, or None if the new position overflows.
    /// Negative offsets are allowed and no lower bound is enforced.
    pub fn shift(&self, offset: i64) -> Option<Self> {
        let position = self.position.checked_add(offset)?;
        Some(Self {
            position,
            ..*self
        })
    }

    /// Returns a copy of this variant placed at a new position, keeping both residues.
    pub fn with_position(&self, position: i64) -> Self {
        Self {
            position,
            ..*self
        }
    }

    /// True if the wild-type residue equals the mutant residue, i.e. the substitution is a no-op.
    pub fn is_pseudo_synonymous(&self) -> bool {
        self.wild_type == self.mutant
    }

    // getters
    pub fn wild_type(&self) -> u8 {
        self.wild_type
    }

    pub fn position(&self) -> i64 {
        self.position
    }

    pub fn mutant(&self) -> u8 {
        self.mutant
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.wild_type as char, self.position, self.mutant as char)
    }
}

impl FromStr for Variant {
    type Err = VariantError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if !text.is_ascii() {
            return Err(VariantError::NonAscii { text: text.to_string() });
        }

        let bytes = text.as_bytes();
        if bytes.len() < 3 {
            return Err(VariantError::TooShort { text: text.to_string() });
        }

        // str::parse would also accept a leading '+', so check the digits ourselves
        let middle = &text[1..text.len() - 1];
        let invalid_position = || VariantError::InvalidPosition {
            text: text.to_string(),
            position: middle.to_string()
        };
        if !middle.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid_position());
        }
        let position: i64 = middle.parse().map_err(|_| invalid_position())?;

        Ok(Self {
            wild_type: bytes[0],
            position,
            mutant: bytes[bytes.len() - 1]
        })
    }
}

impl Serialize for Variant {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Variant {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let variant: Variant = "V171R".parse().unwrap();
        assert_eq!(variant, Variant::new(b'V', 171, b'R'));
        assert_eq!(variant.wild_type(), b'V');
        assert_eq!(variant.position(), 171);
        assert_eq!(variant.mutant(), b'R');

        // minimal length and a zero position are both fine
        assert_eq!("A0C".parse::<Variant>().unwrap(), Variant::new(b'A', 0, b'C'));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("V1".parse::<Variant>(), Err(VariantError::TooShort { text: "V1".to_string() }));
        assert_eq!("".parse::<Variant>(), Err(VariantError::TooShort { text: "".to_string() }));
        assert!(matches!("VxR".parse::<Variant>(), Err(VariantError::InvalidPosition { .. })));
        assert!(matches!("V-1R".parse::<Variant>(), Err(VariantError::InvalidPosition { .. })));
        assert!(matches!("V+1R".parse::<Variant>(), Err(VariantError::InvalidPosition { .. })));
        assert!(matches!("V1.5R".parse::<Variant>(), Err(VariantError::InvalidPosition { .. })));
        assert!(matches!("synonymous".parse::<Variant>(), Err(VariantError::InvalidPosition { .. })));
        assert!(matches!("Vé1R".parse::<Variant>(), Err(VariantError::NonAscii { .. })));
    }

    #[test]
    fn test_round_trip() {
        for text in ["V171R", "A1C", "W10000G", "M0M"] {
            let variant: Variant = text.parse().unwrap();
            assert_eq!(variant.to_string(), text);
            assert_eq!(variant.to_string().parse::<Variant>().unwrap(), variant);
        }
    }

    #[test]
    fn test_shift() {
        let variant = Variant::new(b'V', 1, b'R');
        assert_eq!(variant.shift(24), Some(Variant::new(b'V', 25, b'R')));
        assert_eq!(variant.shift(0), Some(variant));

        // no lower bound here, these are the caller's problem
        let negative = variant.shift(-3).unwrap();
        assert_eq!(negative.position(), -2);
        assert_eq!(negative.to_string(), "V-2R");
    }

    #[test]
    fn test_shift_overflow() {
        let variant: Variant = "A9223372036854775807C".parse().unwrap();
        assert_eq!(variant.position(), i64::MAX);
        assert_eq!(variant.shift(4), None);
        assert_eq!(variant.shift(-1), Some(Variant::new(b'A', i64::MAX - 1, b'C')));
        assert_eq!(Variant::new(b'A', i64::MIN, b'C').shift(-1), None);
    }

    #[test]
    fn test_pseudo_synonymous() {
        assert!(Variant::new(b'A', 5, b'A').is_pseudo_synonymous());
        assert!(!Variant::new(b'A', 5, b'C').is_pseudo_synonymous());
    }

    #[test]
    fn test_serde_csv() {
        #[derive(Deserialize, Serialize)]
        struct Row {
            #[serde(rename = "Variant")]
            variant: Variant
        }

        let mut writer = csv::Writer::from_writer(vec![]);
        writer.serialize(Row { variant: Variant::new(b'K', 12, b'E') }).unwrap();
        let data = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(data, "Variant\nK12E\n");

        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let rows: Vec<Row> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows[0].variant, Variant::new(b'K', 12, b'E'));

        let mut reader = csv::Reader::from_reader("Variant\nK\n".as_bytes());
        let bad: Result<Vec<Row>, _> = reader.deserialize().collect();
        assert!(bad.is_err());
    }
}
