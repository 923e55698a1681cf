//! Coordinate reference systems and the WGS84 → UTM projection used to get
//! metric coordinates.

use std::fmt;
use std::str::FromStr;

use geo::Coord;

use crate::Error;

/// Coordinate reference system of an input layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Crs {
    /// Longitude/latitude in degrees on a datum that agrees with WGS84 to
    /// within about a metre (EPSG:4326, 4269, 4258, ...)
    Geographic(u32),
    /// WGS84 / UTM zone, metres
    Utm { zone: u8, north: bool },
    /// Any other projected, metric CRS known by its EPSG code
    Projected(u32),
}

/// Geographic CRS treated as WGS84 when projecting to UTM. Datums that
/// differ by more than a few metres (ED50, NAD27, OSGB36, ...) are absent.
const GEOGRAPHIC_CODES: &[u32] = &[
    4326, // WGS 84
    4269, // NAD83
    4258, // ETRS89
    4674, // SIRGAS 2000
    4283, // GDA94
    7844, // GDA2020
    4617, // NAD83(CSRS)
    4167, // NZGD2000
    4612, // JGD2000
    6668, // JGD2011
    4490, // CGCS2000
    4148, // Hartebeesthoek94
    4019, // Unknown datum based upon the GRS 1980 ellipsoid
];

/// Metric projected CRS accepted without reprojection
const PROJECTED_RANGES: &[(u32, u32)] = &[
    (2056, 2056),   // CH1903+ / LV95
    (2154, 2154),   // RGF93 / Lambert-93
    (2193, 2193),   // NZGD2000 / NZTM
    (3006, 3006),   // SWEREF99 TM
    (3034, 3035),   // ETRS89 / LCC and LAEA Europe
    (3067, 3067),   // ETRS89 / TM35FIN
    (3310, 3310),   // NAD83 / California Albers
    (3395, 3395),   // WGS 84 / World Mercator
    (3577, 3577),   // GDA94 / Australian Albers
    (3857, 3857),   // WGS 84 / Pseudo-Mercator
    (5070, 5070),   // NAD83 / Conus Albers
    (7846, 7859),   // GDA2020 / MGA zones
    (25828, 25838), // ETRS89 / UTM zones
    (26901, 26923), // NAD83 / UTM zones
    (27700, 27700), // OSGB 1936 / British National Grid
    (28348, 28358), // GDA94 / MGA zones
    (28992, 28992), // Amersfoort / RD New
    (31467, 31469), // DHDN / Gauss-Kruger zones
    (31978, 31985), // SIRGAS 2000 / UTM zones
];

impl Crs {
    /// WGS84 longitude/latitude
    pub const WGS84: Crs = Crs::Geographic(4326);

    /// Classifies an EPSG code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for codes that are neither a known
    /// geographic CRS nor a known metric projection.
    pub fn from_epsg(code: u32) -> Result<Self, Error> {
        match code {
            32601..=32660 => Ok(Crs::Utm {
                zone: (code - 32600) as u8,
                north: true,
            }),
            32701..=32760 => Ok(Crs::Utm {
                zone: (code - 32700) as u8,
                north: false,
            }),
            _ if GEOGRAPHIC_CODES.contains(&code) => Ok(Crs::Geographic(code)),
            _ if PROJECTED_RANGES
                .iter()
                .any(|&(first, last)| (first..=last).contains(&code)) =>
            {
                Ok(Crs::Projected(code))
            }
            _ => Err(Error::InvalidConfig(format!(
                "EPSG:{code} is not a known geographic or metric projected CRS"
            ))),
        }
    }

    pub fn epsg(&self) -> u32 {
        match *self {
            Crs::Geographic(code) | Crs::Projected(code) => code,
            Crs::Utm { zone, north: true } => 32600 + u32::from(zone),
            Crs::Utm { zone, north: false } => 32700 + u32::from(zone),
        }
    }

    pub fn is_projected(&self) -> bool {
        !matches!(self, Crs::Geographic(_))
    }

    /// UTM zone whose central meridian is closest to the given location.
    ///
    /// `zone = floor((lon + 180) / 6) + 1`, northern hemisphere for `lat >= 0`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn utm_for(lon: f64, lat: f64) -> Self {
        let zone = (((lon + 180.0) / 6.0).floor() + 1.0).clamp(1.0, 60.0) as u8;
        Crs::Utm {
            zone,
            north: lat >= 0.0,
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

impl FromStr for Crs {
    type Err = Error;

    /// Accepts `EPSG:32633`, `epsg:4326`, `urn:ogc:def:crs:EPSG::32633`
    /// and the OGC `CRS84` names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let upper = trimmed.to_ascii_uppercase();
        if upper == "CRS84" || upper.ends_with(":CRS84") {
            return Ok(Crs::WGS84);
        }

        let code = upper
            .rsplit(':')
            .next()
            .filter(|_| upper.contains("EPSG"))
            .and_then(|code| code.parse::<u32>().ok())
            .ok_or_else(|| Error::InvalidConfig(format!("Unrecognised CRS name '{trimmed}'")))?;

        Crs::from_epsg(code)
    }
}

const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;
const UTM_K0: f64 = 0.9996;
const UTM_FALSE_EASTING: f64 = 500_000.0;
const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Forward Transverse Mercator projection for one UTM zone
/// (Krüger series to third order in `n`, sub-millimetre inside the zone).
#[derive(Debug, Clone, Copy)]
pub struct UtmProjection {
    central_meridian: f64,
    false_northing: f64,
    rectifying_radius: f64,
    alpha: [f64; 3],
    e_factor: f64,
}

impl UtmProjection {
    pub fn new(zone: u8, north: bool) -> Self {
        let n = WGS84_F / (2.0 - WGS84_F);
        let n2 = n * n;
        let n3 = n2 * n;
        let rectifying_radius = WGS84_A / (1.0 + n) * (1.0 + n2 / 4.0 + n2 * n2 / 64.0);
        let alpha = [
            n / 2.0 - 2.0 / 3.0 * n2 + 5.0 / 16.0 * n3,
            13.0 / 48.0 * n2 - 3.0 / 5.0 * n3,
            61.0 / 240.0 * n3,
        ];

        Self {
            central_meridian: (f64::from(zone) * 6.0 - 183.0).to_radians(),
            false_northing: if north { 0.0 } else { UTM_FALSE_NORTHING_SOUTH },
            rectifying_radius,
            alpha,
            e_factor: 2.0 * n.sqrt() / (1.0 + n),
        }
    }

    /// Projects a `(lon, lat)` coordinate in degrees to `(easting, northing)` metres.
    pub fn forward(&self, lonlat: Coord<f64>) -> Coord<f64> {
        let phi = lonlat.y.to_radians();
        let dlambda = lonlat.x.to_radians() - self.central_meridian;

        let sin_phi = phi.sin();
        let t = (sin_phi.atanh() - self.e_factor * (self.e_factor * sin_phi).atanh()).sinh();
        let xi = t.atan2(dlambda.cos());
        let eta = (dlambda.sin() / (1.0 + t * t).sqrt()).atanh();

        let mut easting = eta;
        let mut northing = xi;
        for (j, alpha) in self.alpha.iter().enumerate() {
            let k = 2.0 * (j as f64 + 1.0);
            easting += alpha * (k * xi).cos() * (k * eta).sinh();
            northing += alpha * (k * xi).sin() * (k * eta).cosh();
        }

        Coord {
            x: UTM_FALSE_EASTING + UTM_K0 * self.rectifying_radius * easting,
            y: self.false_northing + UTM_K0 * self.rectifying_radius * northing,
        }
    }
}

/// Transformation from a layer's CRS into the working CRS
#[derive(Debug, Clone, Copy)]
pub enum Reprojection {
    Identity,
    ToUtm(UtmProjection),
}

impl Reprojection {
    /// Resolves how to move coordinates from `from` into `to`.
    pub fn between(layer: &str, from: Crs, to: Crs) -> Result<Self, Error> {
        match (from, to) {
            _ if from == to => Ok(Reprojection::Identity),
            (Crs::Geographic(_), Crs::Utm { zone, north }) => {
                Ok(Reprojection::ToUtm(UtmProjection::new(zone, north)))
            }
            _ => Err(Error::UnsupportedReprojection {
                layer: layer.to_string(),
                from: from.to_string(),
                to: to.to_string(),
            }),
        }
    }

    pub fn apply(&self, coord: Coord<f64>) -> Coord<f64> {
        match self {
            Reprojection::Identity => coord,
            Reprojection::ToUtm(projection) => projection.forward(coord),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_crs_names() {
        assert_eq!("EPSG:4326".parse::<Crs>().unwrap(), Crs::WGS84);
        assert_eq!(
            "urn:ogc:def:crs:EPSG::32633".parse::<Crs>().unwrap(),
            Crs::Utm {
                zone: 33,
                north: true
            }
        );
        assert_eq!(
            "epsg:32719".parse::<Crs>().unwrap(),
            Crs::Utm {
                zone: 19,
                north: false
            }
        );
        assert_eq!(
            "urn:ogc:def:crs:OGC:1.3:CRS84".parse::<Crs>().unwrap(),
            Crs::WGS84
        );
        assert_eq!("EPSG:3857".parse::<Crs>().unwrap(), Crs::Projected(3857));
        assert!("not a crs".parse::<Crs>().is_err());
    }

    #[test]
    fn epsg_round_trip() {
        for code in [4326, 4269, 32601, 32660, 32701, 32760, 2056, 25833] {
            assert_eq!(Crs::from_epsg(code).unwrap().epsg(), code);
        }
    }

    #[test]
    fn other_geographic_datums_are_not_metric() {
        for name in ["EPSG:4269", "EPSG:4258", "urn:ogc:def:crs:EPSG::4674"] {
            let crs = name.parse::<Crs>().unwrap();
            assert!(matches!(crs, Crs::Geographic(_)), "{name}");
            assert!(!crs.is_projected(), "{name}");
        }
        let utm = Crs::utm_for(-77.0, 38.9);
        assert!(matches!(
            Reprojection::between("points", Crs::Geographic(4269), utm),
            Ok(Reprojection::ToUtm(_))
        ));
    }

    #[test]
    fn unknown_epsg_codes_are_rejected() {
        for code in [0, 4230, 4267, 9999, 123_456] {
            assert!(
                matches!(Crs::from_epsg(code), Err(Error::InvalidConfig(_))),
                "EPSG:{code}"
            );
        }
        assert!("EPSG:4267".parse::<Crs>().is_err());
    }

    #[test]
    fn utm_zone_selection() {
        assert_eq!(
            Crs::utm_for(13.4, 52.5),
            Crs::Utm {
                zone: 33,
                north: true
            }
        );
        assert_eq!(
            Crs::utm_for(-70.6, -33.4),
            Crs::Utm {
                zone: 19,
                north: false
            }
        );
        assert_eq!(
            Crs::utm_for(-180.0, 0.0),
            Crs::Utm {
                zone: 1,
                north: true
            }
        );
        assert_eq!(
            Crs::utm_for(180.0, 0.0),
            Crs::Utm {
                zone: 60,
                north: true
            }
        );
    }

    #[test]
    fn central_meridian_on_equator_is_false_origin() {
        let projection = UtmProjection::new(31, true);
        let projected = projection.forward(Coord { x: 3.0, y: 0.0 });
        assert!((projected.x - 500_000.0).abs() < 1e-6);
        assert!(projected.y.abs() < 1e-6);
    }

    #[test]
    fn northing_at_45_degrees_matches_scaled_meridian_arc() {
        let projection = UtmProjection::new(32, true);
        let projected = projection.forward(Coord { x: 9.0, y: 45.0 });
        assert!((projected.x - 500_000.0).abs() < 1e-6);
        assert!((projected.y - 4_982_950.4).abs() < 1.0);
    }

    #[test]
    fn southern_hemisphere_uses_false_northing() {
        let projection = UtmProjection::new(31, false);
        let projected = projection.forward(Coord { x: 3.0, y: -1.0 });
        assert!(projected.y < 10_000_000.0);
        assert!(projected.y > 9_800_000.0);
    }

    #[test]
    fn easting_is_symmetric_about_central_meridian() {
        let projection = UtmProjection::new(33, true);
        let east = projection.forward(Coord { x: 16.0, y: 50.0 });
        let west = projection.forward(Coord { x: 14.0, y: 50.0 });
        assert!(((east.x - 500_000.0) + (west.x - 500_000.0)).abs() < 1e-6);
        assert!((east.y - west.y).abs() < 1e-6);
    }

    #[test]
    fn unsupported_reprojection_is_an_error() {
        let err = Reprojection::between("network", Crs::Projected(2056), Crs::Projected(3857));
        assert!(matches!(err, Err(Error::UnsupportedReprojection { .. })));
        assert!(matches!(
            Reprojection::between("network", Crs::Projected(2056), Crs::Projected(2056)),
            Ok(Reprojection::Identity)
        ));
    }
}
