// Region keys used for equity-file URLs and report map keys.

/// California's 58 counties, as normalized region keys.
pub const CALIFORNIA_COUNTIES: [&str; 58] = [
    "alameda",
    "alpine",
    "amador",
    "butte",
    "calaveras",
    "colusa",
    "contra_costa",
    "del_norte",
    "el_dorado",
    "fresno",
    "glenn",
    "humboldt",
    "imperial",
    "inyo",
    "kern",
    "kings",
    "lake",
    "lassen",
    "los_angeles",
    "madera",
    "marin",
    "mariposa",
    "mendocino",
    "merced",
    "modoc",
    "mono",
    "monterey",
    "napa",
    "nevada",
    "orange",
    "placer",
    "plumas",
    "riverside",
    "sacramento",
    "san_benito",
    "san_bernardino",
    "san_diego",
    "san_francisco",
    "san_joaquin",
    "san_luis_obispo",
    "san_mateo",
    "santa_barbara",
    "santa_clara",
    "santa_cruz",
    "shasta",
    "sierra",
    "siskiyou",
    "solano",
    "sonoma",
    "stanislaus",
    "sutter",
    "tehama",
    "trinity",
    "tulare",
    "tuolumne",
    "ventura",
    "yolo",
    "yuba",
];

/// Normalize a display name ("San Luis Obispo") to a region key ("san_luis_obispo").
pub fn region_key(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}
