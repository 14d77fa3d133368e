use serde::{Deserialize, Serialize};

/// A cost bucket of the estimate ledger.
///
/// The set is closed; every summary carries exactly these seven lines plus the
/// derived tax and overhead lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Awg,
    Conduit,
    Misc,
    Equipment,
    Labor,
    LowVoltage,
    Permits,
}

impl Category {
    /// All categories in ledger order.
    pub const ALL: [Category; 7] = [
        Category::Awg,
        Category::Conduit,
        Category::Misc,
        Category::Equipment,
        Category::Labor,
        Category::LowVoltage,
        Category::Permits,
    ];

    /// Field prefix used in persisted and wire records (`low_voltage_subtotal`).
    pub fn key(&self) -> &'static str {
        match self {
            Self::Awg => "awg",
            Self::Conduit => "conduit",
            Self::Misc => "misc",
            Self::Equipment => "equipment",
            Self::Labor => "labor",
            Self::LowVoltage => "low_voltage",
            Self::Permits => "permits",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Awg => "AWG",
            Self::Conduit => "Conduit",
            Self::Misc => "Miscellaneous",
            Self::Equipment => "Equipment",
            Self::Labor => "Labor",
            Self::LowVoltage => "Low Voltage",
            Self::Permits => "Permits",
        }
    }

    /// Accepts the record key as well as the hyphenated form used by form ids
    /// (`low-voltage`). Case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "awg" => Some(Self::Awg),
            "conduit" => Some(Self::Conduit),
            "misc" | "miscellaneous" => Some(Self::Misc),
            "equipment" => Some(Self::Equipment),
            "labor" => Some(Self::Labor),
            "low_voltage" | "low-voltage" | "lowvoltage" => Some(Self::LowVoltage),
            "permits" => Some(Self::Permits),
            _ => None,
        }
    }

    /// Material categories carry the sales tax entered on their stage.
    pub fn is_material(&self) -> bool {
        matches!(
            self,
            Self::Awg | Self::Conduit | Self::Misc | Self::Equipment
        )
    }
}

impl std::fmt::Display for Category {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_accepts_key_and_hyphenated_forms() {
        assert_eq!(Category::parse("low_voltage"), Some(Category::LowVoltage));
        assert_eq!(Category::parse("low-voltage"), Some(Category::LowVoltage));
        assert_eq!(Category::parse(" AWG "), Some(Category::Awg));
        assert_eq!(Category::parse("miscellaneous"), Some(Category::Misc));
    }

    #[test]
    fn parse_rejects_unknown() {
        assert_eq!(Category::parse("tax"), None);
        assert_eq!(Category::parse(""), None);
    }

    #[test]
    fn key_round_trips_through_parse() {
        for category in Category::ALL {
            assert_eq!(Category::parse(category.key()), Some(category));
        }
    }

    #[test]
    fn material_categories() {
        let materials: Vec<_> = Category::ALL.into_iter().filter(Category::is_material).collect();

        assert_eq!(
            materials,
            vec![Category::Awg, Category::Conduit, Category::Misc, Category::Equipment]
        );
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Category::LowVoltage).unwrap();

        assert_eq!(json, "\"low_voltage\"");
    }
}
