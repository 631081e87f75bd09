// src/geo/gazetteer.rs
//! Static reference data: known places with coordinates and coarse regions.
//!
//! Declaration order matters. Places keep it as the tie-break between equally
//! frequent matches; regions and their keywords are checked in this order and
//! the first substring hit wins.

use crate::ingest::types::Coordinates;

#[derive(Debug, Clone, Copy)]
pub struct Place {
    pub name: &'static str,
    pub coords: Coordinates,
}

const fn place(name: &'static str, lat: f64, lon: f64) -> Place {
    Place {
        name,
        coords: Coordinates::new(lat, lon),
    }
}

/// South-west and north-east corners.
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub south_west: Coordinates,
    pub north_east: Coordinates,
}

impl Bounds {
    pub fn contains(&self, c: Coordinates) -> bool {
        (self.south_west.lat..=self.north_east.lat).contains(&c.lat)
            && (self.south_west.lon..=self.north_east.lon).contains(&c.lon)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Region {
    pub id: &'static str,
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    pub bounds: Bounds,
}

const fn bounds(s: f64, w: f64, n: f64, e: f64) -> Bounds {
    Bounds {
        south_west: Coordinates::new(s, w),
        north_east: Coordinates::new(n, e),
    }
}

pub static PLACES: &[Place] = &[
    // Europe
    place("London", 51.5074, -0.1278),
    place("Paris", 48.8566, 2.3522),
    place("Berlin", 52.5200, 13.4050),
    place("Moscow", 55.7558, 37.6173),
    place("Madrid", 40.4168, -3.7038),
    place("Rome", 41.9028, 12.4964),
    place("Brussels", 50.8503, 4.3517),
    place("Amsterdam", 52.3676, 4.9041),
    place("Vienna", 48.2082, 16.3738),
    place("Kiev", 50.4501, 30.5234),
    place("Warsaw", 52.2297, 21.0122),
    // Americas
    place("Washington", 38.9072, -77.0369),
    place("New York", 40.7128, -74.0060),
    place("Los Angeles", 34.0522, -118.2437),
    place("Toronto", 43.6532, -79.3832),
    place("Mexico City", 19.4326, -99.1332),
    place("Buenos Aires", -34.6037, -58.3816),
    place("São Paulo", -23.5505, -46.6333),
    place("Brasilia", -15.8267, -47.9218),
    // Asia
    place("Beijing", 39.9042, 116.4074),
    place("Tokyo", 35.6762, 139.6503),
    place("Delhi", 28.7041, 77.1025),
    place("Seoul", 37.5665, 126.9780),
    place("Shanghai", 31.2304, 121.4737),
    place("Mumbai", 19.0760, 72.8777),
    place("Bangkok", 13.7563, 100.5018),
    place("Singapore", 1.3521, 103.8198),
    place("Jakarta", -6.2088, 106.8456),
    place("Manila", 14.5995, 120.9842),
    place("Taipei", 25.0330, 121.5654),
    place("Hong Kong", 22.3193, 114.1694),
    // Africa
    place("Cairo", 30.0444, 31.2357),
    place("Lagos", 6.5244, 3.3792),
    place("Nairobi", -1.2921, 36.8219),
    place("Johannesburg", -26.2041, 28.0473),
    place("Cape Town", -33.9249, 18.4241),
    place("Addis Ababa", 9.0320, 38.7469),
    // Middle East
    place("Tel Aviv", 32.0853, 34.7818),
    place("Jerusalem", 31.7683, 35.2137),
    place("Baghdad", 33.3152, 44.3661),
    place("Tehran", 35.6892, 51.3890),
    place("Riyadh", 24.7136, 46.6753),
    place("Damascus", 33.5138, 36.2765),
    place("Beirut", 33.8938, 35.5018),
    place("Istanbul", 41.0082, 28.9784),
    place("Dubai", 25.2048, 55.2708),
    place("Ankara", 39.9334, 32.8597),
    // Oceania
    place("Sydney", -33.8688, 151.2093),
    place("Melbourne", -37.8136, 144.9631),
    place("Auckland", -36.8485, 174.7633),
    // Conflict areas
    place("Gaza", 31.5, 34.45),
    place("West Bank", 32.0, 35.25),
    place("Crimea", 45.0, 34.0),
    place("Taiwan", 23.7, 121.0),
    place("Kashmir", 34.0, 76.0),
    place("Donbas", 48.0, 38.0),
];

pub static REGIONS: &[Region] = &[
    Region {
        id: "europe",
        name: "Europe",
        keywords: &[
            "europe", "european", "eu", "brussels", "london", "paris", "berlin", "madrid", "rome",
            "moscow", "ukraine", "russia", "poland", "germany", "france", "uk", "spain", "italy",
        ],
        bounds: bounds(35.0, -10.0, 71.0, 40.0),
    },
    Region {
        id: "americas",
        name: "Americas",
        keywords: &[
            "america", "us", "usa", "united states", "canada", "mexico", "brazil", "argentina",
            "washington", "new york", "toronto", "buenos aires", "latin america",
        ],
        bounds: bounds(-55.0, -170.0, 75.0, -30.0),
    },
    Region {
        id: "asia",
        name: "Asia",
        keywords: &[
            "asia", "china", "japan", "india", "korea", "beijing", "tokyo", "delhi", "seoul",
            "thailand", "vietnam", "singapore", "indonesia", "pakistan",
        ],
        bounds: bounds(-10.0, 60.0, 55.0, 150.0),
    },
    Region {
        id: "africa",
        name: "Africa",
        keywords: &[
            "africa", "african", "egypt", "nigeria", "south africa", "kenya", "ethiopia", "cairo",
            "lagos", "nairobi", "johannesburg",
        ],
        bounds: bounds(-35.0, -20.0, 37.0, 52.0),
    },
    Region {
        id: "middle-east",
        name: "Middle East",
        keywords: &[
            "middle east", "israel", "palestine", "syria", "iraq", "iran", "saudi", "lebanon",
            "jordan", "turkey", "gulf", "tel aviv", "baghdad", "tehran", "riyadh", "damascus",
        ],
        bounds: bounds(12.0, 34.0, 42.0, 63.0),
    },
    Region {
        id: "oceania",
        name: "Oceania",
        keywords: &["australia", "new zealand", "sydney", "melbourne", "auckland", "pacific"],
        bounds: bounds(-47.0, 110.0, -10.0, 180.0),
    },
];

pub fn place_by_name(name: &str) -> Option<&'static Place> {
    PLACES.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

pub fn region_by_id(id: &str) -> Option<&'static Region> {
    REGIONS.iter().find(|r| r.id == id)
}
