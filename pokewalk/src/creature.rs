use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

const LEGENDARY: [&str; 4] = ["articuno", "zapdos", "moltres", "mewtwo"];
const MYTHICAL: [&str; 1] = ["mew"];
const RARE_TYPES: [&str; 3] = ["dragon", "ghost", "psychic"];

/// A catalog entry: something that can appear in an encounter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Species {
    pub name: String,
    #[serde(default)]
    pub sprite: String,
    /// Normalized, comma separated type tags (`"water,ice"`).
    #[serde(rename = "type", deserialize_with = "deserialize_types", default)]
    #[schemars(with = "String")]
    pub types: String,
}

impl Species {
    pub fn new(name: impl Into<String>, sprite: impl Into<String>, types: &[&str]) -> Self {
        Self {
            name: name.into(),
            sprite: sprite.into(),
            types: normalize_types(types.iter().copied()),
        }
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        split_tags(&self.types)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags().any(|t| t.eq_ignore_ascii_case(tag))
    }

    pub fn tier(&self) -> Tier {
        Tier::of(self)
    }
}

/// A captured creature record. Quantity is never 0; the record is removed instead.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Creature {
    pub name: String,
    #[serde(default)]
    pub sprite: String,
    #[serde(rename = "type", deserialize_with = "deserialize_types", default)]
    #[schemars(with = "String")]
    pub types: String,
    pub quantity: u32,
}

impl Creature {
    pub fn from_species(species: &Species) -> Self {
        Self {
            name: species.name.clone(),
            sprite: species.sprite.clone(),
            types: species.types.clone(),
            quantity: 1,
        }
    }

    pub fn species(&self) -> Species {
        Species {
            name: self.name.clone(),
            sprite: self.sprite.clone(),
            types: self.types.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Tier {
    Legendary,
    Mythical,
    RareType,
    Common,
}

impl Tier {
    pub fn of(species: &Species) -> Self {
        let name = species.name.to_ascii_lowercase();
        if LEGENDARY.contains(&name.as_str()) || species.has_tag("legendary") {
            Tier::Legendary
        } else if MYTHICAL.contains(&name.as_str()) || species.has_tag("mythical") {
            Tier::Mythical
        } else if RARE_TYPES.iter().any(|tag| species.has_tag(tag)) {
            Tier::RareType
        } else {
            Tier::Common
        }
    }

    pub fn base_difficulty(self) -> f64 {
        match self {
            Tier::Legendary => 0.95,
            Tier::Mythical => 0.90,
            Tier::RareType => 0.85,
            Tier::Common => 0.70,
        }
    }

    pub fn floor(self) -> f64 {
        match self {
            Tier::Legendary => 0.05,
            Tier::Mythical => 0.10,
            Tier::RareType => 0.15,
            Tier::Common => 0.30,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tier::Legendary => "Legendary",
            Tier::Mythical => "Mythical",
            Tier::RareType => "Rare",
            Tier::Common => "Common",
        }
    }
}

pub fn split_tags(types: &str) -> impl Iterator<Item = &str> {
    types.split(',').map(str::trim).filter(|tag| !tag.is_empty())
}

pub fn normalize_types<'a>(tags: impl IntoIterator<Item = &'a str>) -> String {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        for part in split_tags(tag) {
            let part = part.to_ascii_lowercase();
            if !out.contains(&part) {
                out.push(part);
            }
        }
    }
    out.join(",")
}

/// Display form of a catalog name (`mr-mime` -> `Mr Mime`).
pub fn display_name(name: &str) -> String {
    name.split(['-', ' '])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => format!("{}{}", first.to_ascii_uppercase(), chars.as_str()),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TypesRepr {
    One(String),
    Many(Vec<String>),
}

/// Accepts either `"water,ice"` or `["water", "ice"]`.
pub fn deserialize_types<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match TypesRepr::deserialize(deserializer)? {
        TypesRepr::One(types) => normalize_types([types.as_str()]),
        TypesRepr::Many(types) => normalize_types(types.iter().map(String::as_str)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tier_by_name_and_tag() {
        assert_eq!(Species::new("Mewtwo", "", &["psychic"]).tier(), Tier::Legendary);
        assert_eq!(Species::new("mew", "", &["psychic"]).tier(), Tier::Mythical);
        assert_eq!(
            Species::new("celebi", "", &["grass", "mythical"]).tier(),
            Tier::Mythical
        );
        assert_eq!(Species::new("gastly", "", &["ghost", "poison"]).tier(), Tier::RareType);
        assert_eq!(Species::new("pidgey", "", &["normal", "flying"]).tier(), Tier::Common);
    }

    #[test]
    fn types_normalize_from_string_or_array() {
        let one: Species =
            serde_json::from_str(r#"{"name":"lapras","sprite":"s","type":"Water, Ice"}"#)
                .expect("string form");
        let many: Species =
            serde_json::from_str(r#"{"name":"lapras","sprite":"s","type":["water","ice"]}"#)
                .expect("array form");

        assert_eq!(one.types, "water,ice");
        assert_eq!(one, many);
    }

    #[test]
    fn types_serialize_as_delimited_string() {
        let creature = Creature::from_species(&Species::new("geodude", "g.png", &["rock", "ground"]));
        let json = serde_json::to_value(&creature).expect("json");
        assert_eq!(json["type"], "rock,ground");
        assert_eq!(json["quantity"], 1);
    }

    #[test]
    fn display_name_capitalizes_parts() {
        assert_eq!(display_name("mr-mime"), "Mr Mime");
        assert_eq!(display_name("pikachu"), "Pikachu");
    }
}
