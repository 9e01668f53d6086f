/// City and parish names the directories print as location headers. Used
/// to keep noise-classification from discarding lines that open with a
/// known place name.
pub static CITY_NAMES: &[&str] = &[
    "Asarum",
    "Alfvesta",
    "Rimbo",
    "Herrljunga",
    "Kopenhamn",
    "Kungsor",
    "Karlskrona",
    "Saltsjobaden",
    "Sundbyberg",
    "Harene",
    "Stockholms",
    "Haga",
    "Skon",
    "Hoby",
    "Bracke",
    "Ahus",
    "Svardsjo",
    "Vinslof",
    "Hogsby",
    "Ekby",
    "Billeberga",
    "Mellosa",
    "Morlunda",
    "Stockholm",
    "Hvena",
    "Kyrkefalla",
    "Sandby",
    "Lidingo",
    "Liljeholmen",
    "Stentorp",
    "Alno",
    "Stockholms stad",
    "Botkyrka",
    "Goteborg",
    "Sthlm",
    "Kyrkhult",
    "Hjortsberga",
    "Visby",
    "Hogran",
    "Voxna",
    "Loos",
    "Orgryte",
    "Smedsasen",
    "Malilla",
    "Finja",
    "Hassleholm",
    "Perstorp",
    "Farlof",
    "Glimakra",
    "Hjarsa",
    "Brosarp",
    "Hastveda",
    "Elmhult",
    "Asheda",
    "Bjuf",
    "Raus",
    "Skraflinge",
    "Korpilombolo",
    "Jukkasjarvi",
    "Morko",
    "Bettna",
    "Oxelosund",
    "Vrena",
    "By",
    "Tranemo",
    "Nasby",
    "Almby",
    "Eggby",
];

pub fn is_city(token: &str) -> bool {
    CITY_NAMES.contains(&token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_membership() {
        assert!(is_city("Stockholm"));
        assert!(is_city("Saltsjobaden"));
        assert!(!is_city("Andersson"));
    }
}
