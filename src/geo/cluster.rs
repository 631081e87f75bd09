// src/geo/cluster.rs
//! Great-circle distance and greedy proximity clustering for map markers.

use serde::Serialize;

use crate::ingest::types::{Coordinates, NewsItem};

pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const DEFAULT_CLUSTER_KM: f64 = 500.0;

/// Haversine distance in kilometres.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Anything that can be pinned on the map.
pub trait Locatable {
    fn anchor(&self) -> Option<Coordinates>;

    fn place_name(&self) -> Option<&str> {
        None
    }
}

impl Locatable for NewsItem {
    fn anchor(&self) -> Option<Coordinates> {
        self.primary_location.as_ref().map(|l| l.coords)
    }

    fn place_name(&self) -> Option<&str> {
        self.primary_location.as_ref().map(|l| l.name.as_str())
    }
}

impl<T: Locatable + ?Sized> Locatable for &T {
    fn anchor(&self) -> Option<Coordinates> {
        (**self).anchor()
    }

    fn place_name(&self) -> Option<&str> {
        (**self).place_name()
    }
}

impl Locatable for Coordinates {
    fn anchor(&self) -> Option<Coordinates> {
        Some(*self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Cluster<'a, T> {
    /// Anchor of the member that opened the cluster.
    pub center: Coordinates,
    pub location: Option<String>,
    pub members: Vec<&'a T>,
}

impl<T> Cluster<'_, T> {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Greedy single pass: the first unclustered item opens a cluster and absorbs
/// every later unclustered item whose anchor is strictly closer than `max_km`
/// to that opening item. Membership depends on input order, and chains are not
/// followed (A–B close, B–C close, A–C far puts C elsewhere). Items without an
/// anchor are skipped.
pub fn cluster_by_location<T: Locatable>(items: &[T], max_km: f64) -> Vec<Cluster<'_, T>> {
    let mut clustered = vec![false; items.len()];
    let mut out = Vec::new();

    for i in 0..items.len() {
        if clustered[i] {
            continue;
        }
        let Some(center) = items[i].anchor() else {
            continue;
        };
        clustered[i] = true;

        let mut members = vec![&items[i]];
        for j in (i + 1)..items.len() {
            if clustered[j] {
                continue;
            }
            let Some(p) = items[j].anchor() else {
                continue;
            };
            if haversine_km(center, p) < max_km {
                clustered[j] = true;
                members.push(&items[j]);
            }
        }

        out.push(Cluster {
            center,
            location: items[i].place_name().map(str::to_string),
            members,
        });
    }
    out
}
