// src/utils/id_generator.rs
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdType {
    Trip,
    Child,
    Driver,
    Parent,
    Teacher,
    Operator,
    Alert,
}

impl IdType {
    pub fn to_prefix(&self) -> &'static str {
        match self {
            IdType::Trip => "T",
            IdType::Child => "C",
            IdType::Driver => "D",
            IdType::Parent => "P",
            IdType::Teacher => "TE",
            IdType::Operator => "OP",
            IdType::Alert => "A",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "T" => Some(IdType::Trip),
            "C" => Some(IdType::Child),
            "D" => Some(IdType::Driver),
            "P" => Some(IdType::Parent),
            "TE" => Some(IdType::Teacher),
            "OP" => Some(IdType::Operator),
            "A" => Some(IdType::Alert),
            _ => None,
        }
    }
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_prefix())
    }
}

const SUFFIX_LEN: usize = 8;

const ID_ALPHABET: [char; 36] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H',
    'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];

pub struct IdGenerator;

impl IdGenerator {
    /// Generate a unique ID with format: {prefix}_{8 uppercase alphanumerics},
    /// e.g. `T_VWV8LW2Q`.
    pub fn generate(id_type: IdType) -> String {
        format!("{}_{}", id_type.to_prefix(), nanoid::nanoid!(SUFFIX_LEN, &ID_ALPHABET))
    }

    /// Mint the 4-digit boarding PIN. Zero-padded, so "0042" is valid.
    pub fn generate_pin(rng: &mut impl Rng) -> String {
        format!("{:04}", rng.random_range(0..10_000u32))
    }

    /// Parse an ID to extract its components.
    pub fn parse_id(id: &str) -> Option<ParsedId> {
        let (prefix, suffix) = id.split_once('_')?;
        if suffix.len() != SUFFIX_LEN || !suffix.chars().all(|c| ID_ALPHABET.contains(&c)) {
            return None;
        }
        Some(ParsedId {
            id_type: IdType::from_prefix(prefix)?,
            suffix: suffix.to_string(),
        })
    }

    /// Validate that an ID matches the expected format and type.
    pub fn validate_id(id: &str, expected_type: Option<IdType>) -> bool {
        match Self::parse_id(id) {
            Some(parsed) => match expected_type {
                Some(expected) => parsed.id_type == expected,
                None => true,
            },
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedId {
    pub id_type: IdType,
    pub suffix: String,
}

#[derive(Debug, thiserror::Error)]
pub enum IdError {
    #[error("Invalid ID format")]
    InvalidFormat,

    #[error("Unknown ID type: {0}")]
    UnknownType(String),
}

// Integration with the models
pub trait WithGeneratedId {
    fn set_generated_id(&mut self, id_type: IdType);

    fn with_generated_id(mut self, id_type: IdType) -> Self
    where
        Self: Sized,
    {
        self.set_generated_id(id_type);
        self
    }
}

impl WithGeneratedId for crate::models::trip::Trip {
    fn set_generated_id(&mut self, id_type: IdType) {
        self.id = IdGenerator::generate(id_type);
    }
}

impl WithGeneratedId for crate::models::child::Child {
    fn set_generated_id(&mut self, id_type: IdType) {
        self.id = IdGenerator::generate(id_type);
    }
}

impl WithGeneratedId for crate::models::driver::Driver {
    fn set_generated_id(&mut self, id_type: IdType) {
        self.id = IdGenerator::generate(id_type);
    }
}
