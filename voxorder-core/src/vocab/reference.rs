//! Reference Turkish vocabulary shipped as the default tables.

use std::collections::BTreeMap;

use super::{Status, StatusEntry};

pub const PREPARED_VARIANTS: &[&str] = &["hazır", "hazırlandı", "tamam", "ok"];

pub const DELIVERED_VARIANTS: &[&str] = &["teslim", "edildi", "teslimedildi", "gönderildi", "çıktı"];

const NUMBER_WORDS: &[(&str, &str)] = &[
    ("sıfır", "0"),
    ("bir", "1"),
    ("iki", "2"),
    ("üç", "3"),
    ("dört", "4"),
    ("beş", "5"),
    ("altı", "6"),
    ("yedi", "7"),
    ("sekiz", "8"),
    ("dokuz", "9"),
    ("on", "10"),
    ("yirmi", "20"),
    ("otuz", "30"),
    ("kırk", "40"),
    ("elli", "50"),
    ("altmış", "60"),
    ("yetmiş", "70"),
    ("seksen", "80"),
    ("doksan", "90"),
    ("yüz", "100"),
    ("bin", "1000"),
];

const ALPHA_CODES: &[(&str, &str)] = &[
    ("ankara", "A"),
    ("bursa", "B"),
    ("ceyhan", "C"),
    ("denizli", "D"),
];

pub fn status_entries() -> Vec<StatusEntry> {
    vec![
        StatusEntry::new(Status::Preparing, 20, "Hazırlanıyor", &[]),
        StatusEntry::new(Status::Prepared, 30, "Hazır", PREPARED_VARIANTS),
        StatusEntry::new(Status::Delivered, 40, "Teslim Edildi", DELIVERED_VARIANTS),
    ]
}

pub fn number_words() -> BTreeMap<String, String> {
    to_table(NUMBER_WORDS)
}

pub fn alpha_codes() -> BTreeMap<String, String> {
    to_table(ALPHA_CODES)
}

fn to_table(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(word, canonical)| (word.to_string(), canonical.to_string()))
        .collect()
}
