//! Mappings from provider condition codes to conditions and icons, and city
//! name cleanup for lookups.

use crate::types::Condition;

const DEFAULT_CITY: &str = "Istanbul";

/// Maps a provider condition code. Unknown codes read as clear.
#[must_use]
pub fn condition_from_code(code: u32) -> Condition {
    match code {
        1003 | 1006 | 1009 => Condition::Clouds,
        1030 => Condition::Mist,
        1135 | 1147 => Condition::Fog,
        1150 | 1153 | 1168 | 1171 => Condition::Drizzle,
        1063 | 1069 | 1072 | 1180..=1207 | 1240..=1252 => Condition::Rain,
        1066 | 1114 | 1117 | 1210..=1237 | 1255..=1264 => Condition::Snow,
        1087 | 1273..=1282 => Condition::Thunderstorm,
        _ => Condition::Clear,
    }
}

/// Icon name for a condition code, by day or night.
#[must_use]
pub fn icon_for(code: u32, is_day: bool) -> &'static str {
    match code {
        1003 if is_day => "partly-sunny",
        1003 => "cloudy-night",
        1006 => "cloud",
        1009 | 1030 | 1135 | 1147 => "cloudy",
        1063 | 1150..=1207 | 1240..=1252 => "rainy",
        1066 | 1069 | 1114 | 1117 | 1210..=1237 | 1255..=1264 => "snow",
        1072 | 1087 | 1273..=1282 => "thunderstorm",
        _ if is_day => "sunny",
        _ => "moon",
    }
}

fn fold_turkish(c: char) -> char {
    match c {
        'ç' => 'c',
        'Ç' => 'C',
        'ğ' => 'g',
        'Ğ' => 'G',
        'ı' => 'i',
        'İ' => 'I',
        'ö' => 'o',
        'Ö' => 'O',
        'ş' => 's',
        'Ş' => 'S',
        'ü' => 'u',
        'Ü' => 'U',
        other => other,
    }
}

/// Folds Turkish letters to ASCII and capitalises the first letter, so
/// `"İZMİR"`, `"izmir"` and `"İzmir"` all become `"Izmir"`. Blank input
/// yields Istanbul.
#[must_use]
pub fn clean_city_name(name: &str) -> String {
    let folded: String = name.trim().chars().map(fold_turkish).collect();
    let mut chars = folded.chars();
    match chars.next() {
        None => DEFAULT_CITY.to_owned(),
        Some(first) => first
            .to_uppercase()
            .chain(chars.as_str().to_lowercase().chars())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_map_to_conditions() {
        assert_eq!(condition_from_code(1000), Condition::Clear);
        assert_eq!(condition_from_code(1009), Condition::Clouds);
        assert_eq!(condition_from_code(1030), Condition::Mist);
        assert_eq!(condition_from_code(1147), Condition::Fog);
        assert_eq!(condition_from_code(1153), Condition::Drizzle);
        assert_eq!(condition_from_code(1195), Condition::Rain);
        assert_eq!(condition_from_code(1069), Condition::Rain);
        assert_eq!(condition_from_code(1225), Condition::Snow);
        assert_eq!(condition_from_code(1264), Condition::Snow);
        assert_eq!(condition_from_code(1279), Condition::Thunderstorm);
        assert_eq!(condition_from_code(4242), Condition::Clear);
    }

    #[test]
    fn icons_follow_day_and_night() {
        assert_eq!(icon_for(1000, true), "sunny");
        assert_eq!(icon_for(1000, false), "moon");
        assert_eq!(icon_for(1003, true), "partly-sunny");
        assert_eq!(icon_for(1003, false), "cloudy-night");
        assert_eq!(icon_for(1135, true), "cloudy");
        assert_eq!(icon_for(1183, false), "rainy");
        assert_eq!(icon_for(1069, true), "snow");
        assert_eq!(icon_for(1072, true), "thunderstorm");
        assert_eq!(icon_for(9999, false), "moon");
    }

    #[test]
    fn city_names_are_folded_and_capitalised() {
        assert_eq!(clean_city_name("İzmir"), "Izmir");
        assert_eq!(clean_city_name("  istanbul "), "Istanbul");
        assert_eq!(clean_city_name("ISTANBUL"), "Istanbul");
        assert_eq!(clean_city_name("Çanakkale"), "Canakkale");
        assert_eq!(clean_city_name("şanlıurfa"), "Sanliurfa");
        assert_eq!(clean_city_name(""), "Istanbul");
        assert_eq!(clean_city_name("   "), "Istanbul");
    }
}
