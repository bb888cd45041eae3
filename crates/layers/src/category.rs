use serde::{Deserialize, Serialize};

/// Point-of-interest class. Each category owns one independently togglable layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    RestStop,
    ChargingStation,
    SpringWater,
    Wifi,
    Countryside,
    Campground,
    Campsite,
    AutoCamp,
    Fishing,
    Beach,
    Favorite,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::RestStop,
        Category::ChargingStation,
        Category::SpringWater,
        Category::Wifi,
        Category::Countryside,
        Category::Campground,
        Category::Campsite,
        Category::AutoCamp,
        Category::Fishing,
        Category::Beach,
        Category::Favorite,
    ];

    /// Categories whose records arrive after startup rather than being bundled.
    pub fn is_async(self) -> bool {
        matches!(self, Category::SpringWater | Category::Favorite)
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::RestStop => "Rest stop",
            Category::ChargingStation => "EV charging station",
            Category::SpringWater => "Spring water",
            Category::Wifi => "Public Wi-Fi",
            Category::Countryside => "Rural experience village",
            Category::Campground => "Campground",
            Category::Campsite => "Campsite",
            Category::AutoCamp => "Auto camp",
            Category::Fishing => "Fishing spot",
            Category::Beach => "Beach",
            Category::Favorite => "Favorite",
        }
    }

    /// Wire name, identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::RestStop => "restStop",
            Category::ChargingStation => "chargingStation",
            Category::SpringWater => "springWater",
            Category::Wifi => "wifi",
            Category::Countryside => "countryside",
            Category::Campground => "campground",
            Category::Campsite => "campsite",
            Category::AutoCamp => "autoCamp",
            Category::Fishing => "fishing",
            Category::Beach => "beach",
            Category::Favorite => "favorite",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl std::fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown category '{}'", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl std::str::FromStr for Category {
    type Err = UnknownCategory;

    /// Accepts the wire name or a kebab/snake-case spelling (`rest-stop`, `rest_stop`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().to_ascii_lowercase() == normalized)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::Category;

    #[test]
    fn wire_name_matches_serde() {
        for category in Category::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.as_str()));
        }
    }

    #[test]
    fn parses_cli_spellings() {
        assert_eq!("rest-stop".parse::<Category>(), Ok(Category::RestStop));
        assert_eq!("spring_water".parse::<Category>(), Ok(Category::SpringWater));
        assert_eq!("autoCamp".parse::<Category>(), Ok(Category::AutoCamp));
        assert!("lighthouse".parse::<Category>().is_err());
    }

    #[test]
    fn only_fetched_categories_are_async() {
        let asynchronous: Vec<_> = Category::ALL.into_iter().filter(|c| c.is_async()).collect();
        assert_eq!(asynchronous, vec![Category::SpringWater, Category::Favorite]);
    }
}
