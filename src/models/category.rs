use serde::{Deserialize, Serialize};

/// Trade a service, booking or provider belongs to. Serialized as its
/// customer-facing display name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    #[serde(rename = "AC & Appliance Repair")]
    AcAppliance,
    #[serde(rename = "Home Cleaning")]
    Cleaning,
    #[serde(rename = "Plumbing")]
    Plumbing,
    #[serde(rename = "Electrician")]
    Electrician,
    #[serde(rename = "Painting & Renovation")]
    Painting,
    #[serde(rename = "Men's Salon & Massage")]
    BeautyMen,
    #[serde(rename = "Beauty & Spa")]
    BeautyWomen,
    #[serde(rename = "Pest Control")]
    PestControl,
    #[serde(rename = "Carpentry")]
    Carpentry,
    #[serde(rename = "Car Rental & Taxi")]
    CarRental,
    #[serde(rename = "Daily Labour")]
    Labour,
    #[serde(rename = "Mistri (Mason)")]
    Mistri,
    #[serde(rename = "House Helper (Bai)")]
    HouseHelper,
    #[serde(rename = "Welding & Fabrication")]
    Welding,
    #[serde(rename = "Ceiling & Wall Panels")]
    RoofPanel,
}

impl Category {
    pub const ALL: [Category; 15] = [
        Category::AcAppliance,
        Category::Cleaning,
        Category::Plumbing,
        Category::Electrician,
        Category::Painting,
        Category::BeautyMen,
        Category::BeautyWomen,
        Category::PestControl,
        Category::Carpentry,
        Category::CarRental,
        Category::Labour,
        Category::Mistri,
        Category::HouseHelper,
        Category::Welding,
        Category::RoofPanel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::AcAppliance => "AC & Appliance Repair",
            Category::Cleaning => "Home Cleaning",
            Category::Plumbing => "Plumbing",
            Category::Electrician => "Electrician",
            Category::Painting => "Painting & Renovation",
            Category::BeautyMen => "Men's Salon & Massage",
            Category::BeautyWomen => "Beauty & Spa",
            Category::PestControl => "Pest Control",
            Category::Carpentry => "Carpentry",
            Category::CarRental => "Car Rental & Taxi",
            Category::Labour => "Daily Labour",
            Category::Mistri => "Mistri (Mason)",
            Category::HouseHelper => "House Helper (Bai)",
            Category::Welding => "Welding & Fabrication",
            Category::RoofPanel => "Ceiling & Wall Panels",
        }
    }

    /// Exact match against the canonical names. No trimming or case folding:
    /// free-form text that merely resembles a category is not a category.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_exact() {
        assert_eq!(Category::parse("Plumbing"), Some(Category::Plumbing));
        assert_eq!(Category::parse("plumbing"), None);
        assert_eq!(Category::parse(" Plumbing"), None);
        assert_eq!(Category::parse("leaky faucet issue"), None);
    }

    #[test]
    fn test_serde_uses_display_name() {
        let json = serde_json::to_string(&Category::Welding).unwrap();
        assert_eq!(json, "\"Welding & Fabrication\"");
        let back: Category = serde_json::from_str("\"Men's Salon & Massage\"").unwrap();
        assert_eq!(back, Category::BeautyMen);
    }

    #[test]
    fn test_as_str_matches_parse_for_all() {
        for c in Category::ALL {
            assert_eq!(Category::parse(c.as_str()), Some(c));
        }
    }
}
